//! Process identifier generation.

use berth_shared::{BerthError, BerthResult};

/// Source of identifiers for processes run without one.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> BerthResult<String>;
}

/// Random UUID v4 identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> BerthResult<String> {
        Ok(uuid::Uuid::new_v4().to_string())
    }
}

/// The caller's id when set, otherwise a fresh one from `generator`.
///
/// An empty generated id is unrecoverable for the operation.
pub(crate) fn process_id(requested: &str, generator: &dyn IdGenerator) -> BerthResult<String> {
    if !requested.is_empty() {
        return Ok(requested.to_string());
    }

    let id = generator.generate()?;
    if id.is_empty() {
        return Err(BerthError::IdGeneration(
            "generator returned an empty identifier".into(),
        ));
    }
    Ok(id)
}
