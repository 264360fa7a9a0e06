//! Run command implementation.

use std::path::{Path, PathBuf};

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use qnv_dynamics::EvolutionEngine;
use qnv_store::JsonStore;
use qnv_system::NvSystem;
use tracing::info;

use super::common::{load_config, print_trajectory};

/// Execute the run command.
pub fn execute(
    config_path: &Path,
    data_dir: Option<PathBuf>,
    seed: Option<u64>,
    group: Option<String>,
    quiet: bool,
) -> Result<()> {
    println!(
        "{} Running {}",
        style("→").cyan().bold(),
        style(config_path.display()).green()
    );

    let mut config = load_config(config_path)?;
    if let Some(dir) = data_dir {
        config.output.data_dir = dir;
    }
    if let Some(seed) = seed {
        config.output.seed = seed;
    }
    if let Some(group) = group {
        config.output.group = group;
    }
    config.validate()?;

    let system = NvSystem::new(config.system.clone())?;
    println!(
        "  System: {} spins, energy scale {:.6}",
        system.n_sites(),
        system.energy_scale()
    );

    let engine = EvolutionEngine::new(&system, config.building_blocks()?, config.drive_params())?;
    let program = config.program.to_program();
    println!(
        "  Program: {} with {} blocks, {} steps",
        style(program.mode()).yellow(),
        engine.blocks().len(),
        program.n_steps()
    );

    let psi = system.initial_state(config.initial_axis()?)?;
    let observables = system.magnetization(&config.observable_axes()?)?;

    let container = config.output.container_path();
    let mut store = JsonStore::open(&container)?;
    info!(path = %container.display(), "opened checkpoint container");

    let bar = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(program.n_steps() as u64)
    };
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let traj = engine.evolve_observed(
        &psi,
        &program,
        &observables,
        &config.run_options(),
        Some(&mut store),
        |report| {
            bar.set_position(report.completed as u64);
            bar.set_message(format!("t = {:.3}, {} points", report.elapsed, report.points));
        },
    )?;
    bar.finish_and_clear();

    print_trajectory(&traj, &container);
    Ok(())
}
