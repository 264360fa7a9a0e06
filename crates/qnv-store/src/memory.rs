//! In-memory checkpoint container (no persistence).

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::StoreResult;
use crate::{CheckpointStore, WriteMode, resolve_group};

/// In-memory store. Contents are lost when it is dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    groups: FxHashMap<String, BTreeMap<String, Dataset>>,
    writes: usize,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snapshot writes so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl CheckpointStore for MemoryStore {
    fn write_snapshot(
        &mut self,
        group: &str,
        datasets: &[(&str, Dataset)],
        mode: WriteMode,
    ) -> StoreResult<String> {
        let names: Vec<&str> = datasets.iter().map(|(n, _)| *n).collect();
        let resolved = resolve_group(group, &names, mode, |g, n| self.contains(g, n))?;

        let entry = self.groups.entry(resolved.clone()).or_default();
        for (name, dataset) in datasets {
            entry.insert((*name).to_string(), dataset.clone());
        }
        self.writes += 1;
        debug!(group = %resolved, writes = self.writes, "snapshot stored in memory");
        Ok(resolved)
    }

    fn read(&self, group: &str, name: &str) -> StoreResult<Option<Dataset>> {
        Ok(self.groups.get(group).and_then(|g| g.get(name)).cloned())
    }

    fn contains(&self, group: &str, name: &str) -> bool {
        self.groups.get(group).is_some_and(|g| g.contains_key(name))
    }

    fn contains_group(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    fn groups(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.keys().cloned().collect();
        names.sort();
        names
    }

    fn datasets(&self, group: &str) -> Vec<String> {
        self.groups
            .get(group)
            .map(|g| g.keys().cloned().collect())
            .unwrap_or_default()
    }
}
