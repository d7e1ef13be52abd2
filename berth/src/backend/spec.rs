//! Process spec translation.
//!
//! Maps a portable [`ProcessSpec`] onto the OCI process template the
//! container was created with.

use crate::capability::ProcessSpec;
use berth_shared::constants::process as process_const;
use berth_shared::{BerthError, BerthResult, RuntimeError};
use oci_spec::runtime::{BoxBuilder, Process as ProcessTemplate, Spec};
use std::path::PathBuf;

/// Clone the process template out of a container spec.
pub(crate) fn base_template(container_spec: &Spec) -> BerthResult<ProcessTemplate> {
    container_spec
        .process()
        .clone()
        .ok_or_else(|| BerthError::SpecInvalid {
            op: "container spec",
            source: RuntimeError::InvalidArgument("spec has no process template".into()),
        })
}

/// Apply `spec` to `template`.
///
/// - argv becomes the program path followed by `spec.args`
/// - `spec.env` is appended after the inherited environment
/// - cwd is `spec.dir`, or `/` when unset
/// - a TTY request sets `terminal` and, when sized, the console size
pub(crate) fn apply_process_spec(
    spec: &ProcessSpec,
    template: &mut ProcessTemplate,
) -> BerthResult<()> {
    if spec.path.is_empty() {
        return Err(BerthError::InvalidInput("empty process path".into()));
    }

    let mut args = Vec::with_capacity(spec.args.len() + 1);
    args.push(spec.path.clone());
    args.extend(spec.args.iter().cloned());
    template.set_args(Some(args));

    let mut env = template.env().clone().unwrap_or_default();
    env.extend(spec.env.iter().cloned());
    template.set_env(Some(env));

    let cwd = if spec.dir.is_empty() {
        process_const::DEFAULT_CWD
    } else {
        spec.dir.as_str()
    };
    template.set_cwd(PathBuf::from(cwd));

    if let Some(tty) = &spec.tty {
        template.set_terminal(Some(true));

        if let Some(size) = tty.window_size {
            let console = BoxBuilder::default()
                .width(u64::from(size.columns))
                .height(u64::from(size.rows))
                .build()
                .map_err(|e| BerthError::SpecInvalid {
                    op: "console size",
                    source: RuntimeError::InvalidArgument(e.to_string()),
                })?;
            template.set_console_size(Some(console));
        }
    }

    Ok(())
}
