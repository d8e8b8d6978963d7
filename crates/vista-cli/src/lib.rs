//! CLI logic for the Vista scenario runner.
//!
//! The binary replays a page scenario through the diagram enhancer over an
//! in-memory page and writes a TOML report of the resulting diagram states.

pub mod error_adapter;
pub mod report;
pub mod scenario;

mod args;
mod config;
mod replay;

pub use args::Args;
pub use replay::replay;

use std::fs;

use log::{info, warn};

use vista::VistaError;

use scenario::Scenario;

/// Run the Vista CLI application
///
/// This function replays the scenario file through the enhancer and writes
/// the resulting report to the output file.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `VistaError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Scenario parsing errors
/// - Steps referring to unknown diagrams
pub fn run(args: &Args) -> Result<(), VistaError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing scenario"
    );

    // Load configuration
    let app_config = config::load_config(args.config.as_ref())?;

    // Read and parse the scenario
    let source = fs::read_to_string(&args.input)?;
    let scenario = Scenario::from_toml(&source)?;

    let report = replay(&scenario, app_config)?;
    for failure in report.failures() {
        warn!(failure = failure.as_str(); "Enhancer reported a failure");
    }

    fs::write(&args.output, report.to_toml()?)?;

    info!(
        output_file = args.output,
        diagrams = report.diagrams().len();
        "Report exported successfully"
    );

    Ok(())
}
