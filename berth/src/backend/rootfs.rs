//! Working directory setup inside the container rootfs.

use crate::options::RootfsOptions;
use async_trait::async_trait;
use berth_shared::{RuntimeError, RuntimeResult};
use nix::unistd::{Gid, Uid, chown};
use oci_spec::runtime::Spec;
use std::fs::DirBuilder;
use std::io;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Component, Path, PathBuf};

/// Prepares a process working directory relative to a container's rootfs.
///
/// Called before any process is created; an error aborts the run.
#[async_trait]
pub trait RootfsManager: Send + Sync {
    async fn setup_cwd(&self, container_spec: &Spec, cwd: &Path) -> RuntimeResult<()>;
}

/// Rootfs manager for containers whose rootfs is a host directory.
///
/// Missing directories are created with the configured mode and handed to
/// the process user. Existing directories are left untouched. The rootfs
/// content is untrusted, so no symlink below the root is ever followed.
#[derive(Debug, Clone)]
pub struct HostRootfsManager {
    mode: u32,
}

impl HostRootfsManager {
    pub fn new(mode: u32) -> Self {
        Self { mode }
    }

    pub fn from_options(options: &RootfsOptions) -> Self {
        Self::new(options.cwd_mode)
    }
}

impl Default for HostRootfsManager {
    fn default() -> Self {
        Self::from_options(&RootfsOptions::default())
    }
}

#[async_trait]
impl RootfsManager for HostRootfsManager {
    async fn setup_cwd(&self, container_spec: &Spec, cwd: &Path) -> RuntimeResult<()> {
        let root = container_spec
            .root()
            .as_ref()
            .map(|r| r.path().clone())
            .ok_or_else(|| RuntimeError::InvalidArgument("container spec has no root".into()))?;

        if !root.is_absolute() {
            return Err(RuntimeError::InvalidArgument(format!(
                "rootfs path must be absolute, got: {}",
                root.display()
            )));
        }

        let (uid, gid) = container_spec
            .process()
            .as_ref()
            .map(|p| (p.user().uid(), p.user().gid()))
            .unwrap_or((0, 0));

        let parts = relative_components(cwd)?;
        let mode = self.mode;

        tokio::task::spawn_blocking(move || create_below(root, &parts, mode, uid, gid))
            .await
            .map_err(|e| RuntimeError::Internal(format!("cwd setup task: {}", e)))?
    }
}

/// Components of `cwd` below the rootfs; `..` is rejected.
fn relative_components(cwd: &Path) -> RuntimeResult<Vec<PathBuf>> {
    let mut parts = Vec::new();
    for component in cwd.components() {
        match component {
            Component::RootDir | Component::CurDir => {}
            Component::Normal(part) => parts.push(PathBuf::from(part)),
            Component::ParentDir | Component::Prefix(_) => {
                return Err(RuntimeError::InvalidArgument(format!(
                    "working directory escapes rootfs: {}",
                    cwd.display()
                )));
            }
        }
    }
    Ok(parts)
}

/// Walk `parts` below `root` one component at a time, creating what is
/// missing. Every existing component is inspected without following it.
fn create_below(
    root: PathBuf,
    parts: &[PathBuf],
    mode: u32,
    uid: u32,
    gid: u32,
) -> RuntimeResult<()> {
    if !root.is_dir() {
        return Err(RuntimeError::InvalidArgument(format!(
            "rootfs is not a directory: {}",
            root.display()
        )));
    }

    let mut current = root;
    for part in parts {
        current.push(part);

        match std::fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {
                return Err(RuntimeError::InvalidArgument(format!(
                    "working directory traverses a symlink: {}",
                    current.display()
                )));
            }
            Ok(meta) if meta.is_dir() => continue,
            Ok(_) => {
                return Err(RuntimeError::InvalidArgument(format!(
                    "working directory component is not a directory: {}",
                    current.display()
                )));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        // Fails with EEXIST if something appeared since the check; never follows it.
        DirBuilder::new().mode(mode).create(&current)?;
        hand_over(&current, uid, gid)?;

        tracing::debug!(path = %current.display(), uid, gid, "created working directory");
    }

    Ok(())
}

fn hand_over(path: &Path, uid: u32, gid: u32) -> RuntimeResult<()> {
    // Ownership already matches when the adapter runs as the process user.
    if Uid::effective().as_raw() == uid && Gid::effective().as_raw() == gid {
        return Ok(());
    }

    chown(path, Some(Uid::from_raw(uid)), Some(Gid::from_raw(gid)))
        .map_err(|e| RuntimeError::Io(io::Error::from(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use oci_spec::runtime::{ProcessBuilder, RootBuilder, SpecBuilder, UserBuilder};
    use std::os::unix::fs::{PermissionsExt, symlink};
    use tempfile::TempDir;

    fn spec_for(root: &Path) -> Spec {
        let user = UserBuilder::default()
            .uid(Uid::effective().as_raw())
            .gid(Gid::effective().as_raw())
            .build()
            .unwrap();
        let process = ProcessBuilder::default().user(user).build().unwrap();
        SpecBuilder::default()
            .root(RootBuilder::default().path(root).build().unwrap())
            .process(process)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_creates_missing_directories() {
        let rootfs = TempDir::new().unwrap();
        let manager = HostRootfsManager::default();

        manager
            .setup_cwd(&spec_for(rootfs.path()), Path::new("/tmp/build/src"))
            .await
            .unwrap();

        let created = rootfs.path().join("tmp/build/src");
        assert!(created.is_dir());
        let mode = std::fs::metadata(&created).unwrap().permissions().mode();
        // umask may clear bits but never adds them
        assert_eq!(mode & 0o777 & !0o755, 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_setup_on_single_threaded_runtime() {
        let rootfs = TempDir::new().unwrap();

        HostRootfsManager::default()
            .setup_cwd(&spec_for(rootfs.path()), Path::new("/workspace"))
            .await
            .unwrap();

        assert!(rootfs.path().join("workspace").is_dir());
    }

    #[tokio::test]
    async fn test_existing_directory_is_untouched() {
        let rootfs = TempDir::new().unwrap();
        let existing = rootfs.path().join("workspace");
        std::fs::create_dir(&existing).unwrap();
        std::fs::set_permissions(&existing, std::fs::Permissions::from_mode(0o700)).unwrap();

        HostRootfsManager::new(0o755)
            .setup_cwd(&spec_for(rootfs.path()), Path::new("/workspace"))
            .await
            .unwrap();

        let mode = std::fs::metadata(&existing).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[tokio::test]
    async fn test_root_cwd_is_noop() {
        let rootfs = TempDir::new().unwrap();
        HostRootfsManager::default()
            .setup_cwd(&spec_for(rootfs.path()), Path::new("/"))
            .await
            .unwrap();
        assert_eq!(std::fs::read_dir(rootfs.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_symlinked_component_is_not_followed() {
        let rootfs = TempDir::new().unwrap();
        let host = TempDir::new().unwrap();
        symlink(host.path(), rootfs.path().join("tmp")).unwrap();

        let err = HostRootfsManager::default()
            .setup_cwd(&spec_for(rootfs.path()), Path::new("/tmp/escaped"))
            .await
            .unwrap_err();

        assert!(matches!(err, RuntimeError::InvalidArgument(_)));
        assert!(err.to_string().contains("symlink"));
        assert!(!host.path().join("escaped").exists());
    }

    #[tokio::test]
    async fn test_symlinked_leaf_is_not_accepted() {
        let rootfs = TempDir::new().unwrap();
        let host = TempDir::new().unwrap();
        symlink(host.path(), rootfs.path().join("work")).unwrap();

        let err = HostRootfsManager::default()
            .setup_cwd(&spec_for(rootfs.path()), Path::new("/work"))
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_file_component_rejected() {
        let rootfs = TempDir::new().unwrap();
        std::fs::write(rootfs.path().join("etc"), b"").unwrap();

        let err = HostRootfsManager::default()
            .setup_cwd(&spec_for(rootfs.path()), Path::new("/etc/app"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[tokio::test]
    async fn test_parent_dir_rejected() {
        let rootfs = TempDir::new().unwrap();
        let err = HostRootfsManager::default()
            .setup_cwd(&spec_for(rootfs.path()), Path::new("/tmp/../../etc"))
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_relative_root_rejected() {
        let err = HostRootfsManager::default()
            .setup_cwd(&spec_for(Path::new("rootfs")), Path::new("/tmp"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("must be absolute"));
    }

    #[tokio::test]
    async fn test_missing_root_rejected() {
        let rootfs = TempDir::new().unwrap();
        let mut spec = spec_for(rootfs.path());
        spec.set_root(None);

        let err = HostRootfsManager::default()
            .setup_cwd(&spec, Path::new("/tmp"))
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidArgument(_)));
    }
}
