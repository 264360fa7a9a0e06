//! End-to-end tests of the `qnv` binary.
//!
//! Every test runs the compiled binary in a scratch directory with the
//! `QNV_*` overrides cleared.

use std::path::Path;
use std::process::{Command, Output};

use qnv_dynamics::RunConfig;
use qnv_store::{AttrValue, CheckpointStore, JsonStore};

fn qnv(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_qnv"))
        .args(args)
        .env_remove("QNV_DATA_DIR")
        .env_remove("QNV_SAVE_EVERY")
        .env_remove("QNV_SEED")
        .env_remove("QNV_LOG_FORMAT")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to spawn qnv")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn write_config(dir: &Path, extra: &str) -> std::path::PathBuf {
    let yaml = format!(
        "\
system:
  n_sites: 3
drive:
  rabi_freq: 1.5
  noise: 0.02
blocks:
  - elements: [[dd, 0.2], [x, 0.5]]
program:
  mode: periodic
  n_steps: 3
output:
  data_dir: {}
  file_name: cli
  group: dtc
  save_every: 2
{extra}",
        dir.display()
    );
    let path = dir.join("run.yaml");
    std::fs::write(&path, yaml).unwrap();
    path
}

// ============================================================================
// version / template
// ============================================================================

#[test]
fn test_version() {
    let out = qnv(&["version"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("QNV"));
    assert!(stdout(&out).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_template_is_a_valid_config() {
    let out = qnv(&["template", "-n", "5"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let config = RunConfig::from_yaml_str(&stdout(&out)).unwrap();
    assert_eq!(config.system.n_sites, 5);
    assert_eq!(config.building_blocks().unwrap().len(), 1);
}

#[test]
fn test_unknown_subcommand() {
    let out = qnv(&["evolve"]);
    assert!(!out.status.success());
}

// ============================================================================
// sample
// ============================================================================

#[test]
fn test_sample_json() {
    let out = qnv(&["sample", "-n", "3", "--seed", "4"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let graph: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(graph["positions"].as_array().unwrap().len(), 3);
    assert_eq!(graph["z_couplings"].as_array().unwrap().len(), 3);

    let again = qnv(&["sample", "-n", "3", "--seed", "4"]);
    assert_eq!(stdout(&out), stdout(&again));
}

#[test]
fn test_sample_yaml_and_direction() {
    let out = qnv(&["sample", "-n", "2", "-d", "x", "-f", "yaml"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("direction: x"));
}

#[test]
fn test_sample_errors() {
    let out = qnv(&["sample", "-n", "2", "-f", "toml"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Unknown format"));

    let out = qnv(&["sample", "-n", "2", "-d", "w"]);
    assert!(!out.status.success());

    let out = qnv(&["sample", "-n", "3", "--min-dist", "25", "--max-dist", "30"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("only 1 could be placed"));
}

// ============================================================================
// run / inspect
// ============================================================================

#[test]
fn test_run_writes_checkpoints() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    let config = config.to_str().unwrap();

    let out = qnv(&["run", "-c", config, "--quiet"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("4 points"));

    let store = JsonStore::open(dir.path().join("cli.json")).unwrap();
    assert_eq!(store.groups(), vec!["dtc"]);
    let obs = store.read("dtc", "observables").unwrap().unwrap();
    assert_eq!(obs.shape(), &[3, 4]);
    assert_eq!(obs.attr("filled"), Some(&AttrValue::Int(4)));
    assert_eq!(obs.attr("mode"), Some(&AttrValue::Text("periodic".into())));

    let out = qnv(&["run", "-c", config, "--quiet", "--seed", "9"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let store = JsonStore::open(dir.path().join("cli.json")).unwrap();
    assert_eq!(store.groups(), vec!["dtc", "dtc0"]);
    let obs = store.read("dtc0", "observables").unwrap().unwrap();
    assert_eq!(obs.attr("run_seed"), Some(&AttrValue::Int(9)));

    let out = qnv(&["inspect", dir.path().join("cli.json").to_str().unwrap()]);
    assert!(out.status.success());
    let listing = stdout(&out);
    assert!(listing.contains("dtc0"));
    assert!(listing.contains("observables"));
}

#[test]
fn test_run_overrides_output() {
    let dir = tempfile::tempdir().unwrap();
    let other = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");

    let out = qnv(&[
        "run",
        "-c",
        config.to_str().unwrap(),
        "-q",
        "--data-dir",
        other.path().to_str().unwrap(),
        "-g",
        "sweep",
    ]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(!dir.path().join("cli.json").exists());

    let store = JsonStore::open(other.path().join("cli.json")).unwrap();
    assert!(store.contains_group("sweep"));

    let out = qnv(&[
        "inspect",
        other.path().join("cli.json").to_str().unwrap(),
        "-g",
        "sweep",
    ]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("system_size"));
}

#[test]
fn test_run_rejects_bad_input() {
    let dir = tempfile::tempdir().unwrap();

    let out = qnv(&["run", "-c", dir.path().join("missing.yaml").to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("File not found"));

    let config = write_config(dir.path(), "").to_string_lossy().into_owned();
    std::fs::write(
        &config,
        std::fs::read_to_string(&config)
            .unwrap()
            .replace("[x, 0.5]", "[w, 0.5]"),
    )
    .unwrap();
    let out = qnv(&["run", "-c", &config, "-q"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("building block 0"));
    assert!(!dir.path().join("cli.json").exists());
}

#[test]
fn test_inspect_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("none.json");
    let out = qnv(&["inspect", missing.to_str().unwrap()]);
    assert!(!out.status.success());

    let config = write_config(dir.path(), "");
    assert!(qnv(&["run", "-c", config.to_str().unwrap(), "-q"]).status.success());
    let out = qnv(&["inspect", dir.path().join("cli.json").to_str().unwrap(), "-g", "nope"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("No group 'nope'"));
}
