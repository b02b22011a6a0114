//! qrun demo suite
//!
//! This crate bundles small textbook algorithms and runs them end to end on
//! a remote QPU through the qrun stack:
//!
//! - **Bell state**: the two-qubit entanglement baseline
//! - **Grover's search**: one round over four candidates
//! - **Deutsch–Jozsa**: constant-oracle detection
//! - **QFT** and **phase estimation**: Fourier-basis circuits
//! - **Random numbers**: 24 Hadamard-measured qubits per shot
//! - **Teleportation**: the sender's Bell measurement
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use qrun_adapter_qcloud::QCloudBackend;
//! use qrun_demos::{circuits::Algorithm, runner};
//! use qrun_hal::QrunConfig;
//!
//! let config = QrunConfig::load(None)?;
//! let backend = Arc::new(QCloudBackend::from_config(&config.backend)?);
//! let report = runner::run(Algorithm::Bell, backend, &config, None).await?;
//! println!("{:?}", report.distribution);
//! ```

pub mod circuits;
pub mod runner;

use console::style;

use qrun_hal::Counts;

/// Print a demo header.
pub fn print_header(title: &str) {
    println!();
    println!("{}", style("═".repeat(60)).cyan());
    println!("{}", style(format!("  {title}")).cyan().bold());
    println!("{}", style("═".repeat(60)).cyan());
    println!();
}

/// Print a demo section.
pub fn print_section(title: &str) {
    println!();
    println!("{}", style(format!("▶ {title}")).green().bold());
    println!("{}", style("─".repeat(40)).dim());
}

/// Print a result line.
pub fn print_result(label: &str, value: impl std::fmt::Display) {
    println!("  {} {}", style(format!("{label}:")).dim(), value);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("ℹ").blue(), message);
}

/// Print counts as a bar chart, most frequent first, showing at most
/// `limit` rows.
pub fn print_histogram(counts: &Counts, limit: usize) {
    let total = counts.total_shots().max(1);
    for (bitstring, &count) in counts.sorted().into_iter().take(limit) {
        let fraction = count as f64 / total as f64;
        let bar = "█".repeat((fraction * 40.0).round() as usize);
        println!(
            "  {} {:>6} {:>6.2}% {}",
            style(bitstring).bold(),
            count,
            fraction * 100.0,
            style(bar).cyan()
        );
    }
    if counts.len() > limit {
        println!("  {}", style(format!("… {} more outcome(s)", counts.len() - limit)).dim());
    }
}
