//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - driven dynamics of dipolar spin clusters",
        style("QNV").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qnv-ops       Sparse spin operators and propagators");
    println!("  qnv-system    Cluster sampling and Hamiltonian assembly");
    println!("  qnv-dynamics  Pulse-sequence compilation and evolution");
    println!("  qnv-store     Checkpoint containers");
    println!("  qnv-cli       Command-line interface");
    println!();
    println!("License: {}", style("Apache-2.0").dim());
}
