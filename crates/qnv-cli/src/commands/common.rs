//! Shared helpers for CLI commands.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use qnv_dynamics::{RunConfig, Trajectory};

/// Load, override, and validate a run configuration.
pub fn load_config(path: &Path) -> Result<RunConfig> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    RunConfig::from_file(path).with_context(|| format!("Failed to load config: {}", path.display()))
}

/// Print the final values of a finished run.
pub fn print_trajectory(traj: &Trajectory, container: &Path) {
    println!(
        "\n{} {} points up to t = {:.4}",
        style("✓").green().bold(),
        traj.len(),
        traj.times.last().copied().unwrap_or(0.0)
    );

    for (row, label) in traj.labels.iter().enumerate() {
        let first = traj.observables.row(row).first().copied().unwrap_or(0.0);
        let last = traj.observables.row(row).last().copied().unwrap_or(0.0);
        println!(
            "  {}: {:>+9.5} -> {:>+9.5}",
            style(label).cyan(),
            first,
            last
        );
    }

    if let Some(group) = &traj.group {
        println!(
            "\n  Saved to {} (group {})",
            style(container.display()).green(),
            style(group).yellow()
        );
    }
}
