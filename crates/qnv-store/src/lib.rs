//! `qnv-store`: checkpoint persistence.
//!
//! A container holds named groups, each group holds named [`Dataset`]s.
//! Writers either overwrite in place or, with [`WriteMode::AvoidCollision`],
//! move to the first free name `group0`, `group1`, ... when any requested
//! dataset already exists in the group.
//!
//! Two stores are provided:
//!
//! - [`JsonStore`]: one JSON file per container, replaced atomically on
//!   every write. Floats reload bit-identically.
//! - [`MemoryStore`]: in-process, for tests and dry runs.

pub mod dataset;
pub mod error;
mod json_store;
mod memory;

pub use dataset::{AttrValue, Attributes, Dataset};
pub use error::{StoreError, StoreResult};
pub use json_store::JsonStore;
pub use memory::MemoryStore;

use tracing::warn;

/// How a write treats existing datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace existing datasets of the same name.
    Overwrite,
    /// Move to a fresh group name instead of replacing anything.
    AvoidCollision,
}

/// Synchronous checkpoint storage.
pub trait CheckpointStore {
    /// Write `datasets` into `group` and return the group actually used.
    fn write_snapshot(
        &mut self,
        group: &str,
        datasets: &[(&str, Dataset)],
        mode: WriteMode,
    ) -> StoreResult<String>;

    /// Read one dataset.
    fn read(&self, group: &str, name: &str) -> StoreResult<Option<Dataset>>;

    /// Whether `group/name` exists.
    fn contains(&self, group: &str, name: &str) -> bool;

    /// Whether `group` exists.
    fn contains_group(&self, group: &str) -> bool;

    /// Group names, sorted.
    fn groups(&self) -> Vec<String>;

    /// Dataset names within a group, sorted.
    fn datasets(&self, group: &str) -> Vec<String>;
}

/// Upper bound on collision suffixes tried before giving up.
const MAX_SUFFIX: usize = 1 << 20;

pub(crate) fn check_name(name: &str) -> StoreResult<()> {
    if name.is_empty() || name.contains('/') {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Pick the group to write into.
pub(crate) fn resolve_group(
    group: &str,
    names: &[&str],
    mode: WriteMode,
    contains: impl Fn(&str, &str) -> bool,
) -> StoreResult<String> {
    check_name(group)?;
    for name in names {
        check_name(name)?;
    }
    let taken = |g: &str| names.iter().any(|n| contains(g, n));

    if mode == WriteMode::Overwrite || !taken(group) {
        return Ok(group.to_string());
    }
    for j in 0..MAX_SUFFIX {
        let candidate = format!("{group}{j}");
        if !taken(&candidate) {
            warn!(
                requested = group,
                resolved = %candidate,
                "group already holds these datasets, writing to a new group"
            );
            return Ok(candidate);
        }
    }
    Err(StoreError::NamesExhausted(group.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_suffixes() {
        let existing = ["run/obs", "run0/obs", "run1/other"];
        let contains = |g: &str, n: &str| existing.contains(&format!("{g}/{n}").as_str());

        assert_eq!(
            resolve_group("run", &["obs"], WriteMode::AvoidCollision, contains).unwrap(),
            "run1"
        );
        assert_eq!(
            resolve_group("run", &["obs"], WriteMode::Overwrite, contains).unwrap(),
            "run"
        );
        assert_eq!(
            resolve_group("fresh", &["obs"], WriteMode::AvoidCollision, contains).unwrap(),
            "fresh"
        );
    }

    #[test]
    fn test_invalid_names() {
        let none = |_: &str, _: &str| false;
        assert!(matches!(
            resolve_group("", &["obs"], WriteMode::Overwrite, none),
            Err(StoreError::InvalidName(_))
        ));
        assert!(matches!(
            resolve_group("run", &["a/b"], WriteMode::Overwrite, none),
            Err(StoreError::InvalidName(_))
        ));
    }
}
