//! Template command implementation.

use std::collections::BTreeMap;

use anyhow::Result;
use qnv_dynamics::config::{DriveConfig, OutputConfig, ProgramConfig};
use qnv_dynamics::sequence::RawBlock;
use qnv_dynamics::RunConfig;
use qnv_system::SystemConfig;

/// Execute the template command.
pub fn execute(sites: usize) -> Result<()> {
    let config = RunConfig {
        system: SystemConfig::with_sites(sites),
        drive: DriveConfig {
            rabi_freq: 1.5,
            noise: Some(0.01),
            ..DriveConfig::default()
        },
        blocks: vec![RawBlock {
            elements: vec![("dd".to_string(), 0.2), ("x".to_string(), 0.5)],
            repetitions: 1,
        }],
        program: ProgramConfig::Periodic { n_steps: 100 },
        initial_state: "z".to_string(),
        observables: vec!["x".to_string(), "y".to_string(), "z".to_string()],
        output: OutputConfig {
            save_every: 10,
            extra: BTreeMap::new(),
            ..OutputConfig::default()
        },
    };
    config.validate()?;
    print!("{}", config.to_yaml()?);
    Ok(())
}
