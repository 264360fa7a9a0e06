//! Inspect command implementation.

use std::path::Path;

use anyhow::Result;
use console::style;
use qnv_store::{CheckpointStore, JsonStore};

/// Execute the inspect command.
pub fn execute(path: &Path, group: Option<&str>) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    let store = JsonStore::open(path)?;

    let groups = match group {
        Some(g) if store.contains_group(g) => vec![g.to_string()],
        Some(g) => anyhow::bail!("No group '{g}' in {}", path.display()),
        None => store.groups(),
    };

    if groups.is_empty() {
        println!("{} is empty", style(path.display()).green());
        return Ok(());
    }

    for g in &groups {
        println!("{}", style(g).cyan().bold());
        for name in store.datasets(g) {
            let Some(ds) = store.read(g, &name)? else {
                continue;
            };
            let filled = ds
                .attr("filled")
                .map_or_else(|| "?".to_string(), ToString::to_string);
            println!("  {name:<12} shape {:?}, filled {filled}", ds.shape());
            if group.is_some() {
                for (key, value) in ds.attrs() {
                    println!("    {}: {value}", style(key).dim());
                }
            }
        }
    }
    Ok(())
}
