//! Sample command implementation.

use anyhow::Result;
use qnv_system::{FieldDirection, sample_spin_graph};

/// Execute the sample command.
pub fn execute(
    sites: usize,
    seed: u64,
    direction: FieldDirection,
    min_dist: f64,
    max_dist: f64,
    format: &str,
) -> Result<()> {
    let graph = sample_spin_graph(direction, min_dist, max_dist, sites, seed)?;

    let rendered = match format.to_lowercase().as_str() {
        "json" => serde_json::to_string_pretty(&graph)?,
        "yaml" | "yml" => serde_yaml_ng::to_string(&graph)?,
        other => anyhow::bail!("Unknown format: '{other}'. Available: json, yaml"),
    };
    println!("{rendered}");
    Ok(())
}
