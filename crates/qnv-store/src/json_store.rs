//! JSON file-backed checkpoint container.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::StoreResult;
use crate::{CheckpointStore, WriteMode, resolve_group};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Container {
    groups: BTreeMap<String, BTreeMap<String, Dataset>>,
}

/// A checkpoint container stored as a single JSON file.
///
/// The whole container is kept in memory. Every write serializes it to a
/// sibling temporary file and renames that over the container, so readers
/// see either the previous or the new snapshot.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    container: Container,
}

impl JsonStore {
    /// Open the container at `path`, creating parent directories. A missing
    /// file is an empty container.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let container = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Container::default(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), groups = container.groups.len(), "opened checkpoint container");
        Ok(Self { path, container })
    }

    /// Location of the container file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, container: &Container) -> StoreResult<()> {
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        let json = serde_json::to_vec(container)?;
        let mut file = fs::File::create(&tmp)?;
        file.write_all(&json)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl CheckpointStore for JsonStore {
    fn write_snapshot(
        &mut self,
        group: &str,
        datasets: &[(&str, Dataset)],
        mode: WriteMode,
    ) -> StoreResult<String> {
        let names: Vec<&str> = datasets.iter().map(|(n, _)| *n).collect();
        let resolved = resolve_group(group, &names, mode, |g, n| self.contains(g, n))?;

        // The in-memory view only changes once the file holds the snapshot.
        let mut next = self.container.clone();
        let entry = next.groups.entry(resolved.clone()).or_default();
        for (name, dataset) in datasets {
            entry.insert((*name).to_string(), dataset.clone());
        }
        self.persist(&next)?;
        self.container = next;

        info!(
            path = %self.path.display(),
            group = %resolved,
            datasets = datasets.len(),
            "checkpoint written"
        );
        Ok(resolved)
    }

    fn read(&self, group: &str, name: &str) -> StoreResult<Option<Dataset>> {
        Ok(self
            .container
            .groups
            .get(group)
            .and_then(|g| g.get(name))
            .cloned())
    }

    fn contains(&self, group: &str, name: &str) -> bool {
        self.container
            .groups
            .get(group)
            .is_some_and(|g| g.contains_key(name))
    }

    fn contains_group(&self, group: &str) -> bool {
        self.container.groups.contains_key(group)
    }

    fn groups(&self) -> Vec<String> {
        self.container.groups.keys().cloned().collect()
    }

    fn datasets(&self, group: &str) -> Vec<String> {
        self.container
            .groups
            .get(group)
            .map(|g| g.keys().cloned().collect())
            .unwrap_or_default()
    }
}
