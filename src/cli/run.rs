use std::path::Path;
use std::sync::Arc;

use crate::cli::commands::RunArgs;
use crate::cli::render::print_event;
use crate::config::{load_settings, RunnerConfig};
use crate::errors::KeyrunError;
use crate::runner::{CommandTool, RunEvent, Runner};
use tracing::info;

/// Run the lifecycle and return the process exit code. Errors are only
/// returned for problems detected before the run starts.
pub async fn handle_run(args: RunArgs, quiet: bool) -> Result<i32, KeyrunError> {
    let file_settings = load_settings(args.paths.settings.as_deref(), Path::new(".")).await?;
    let config = RunnerConfig::from_settings(file_settings.merge(args.to_settings()))?;

    if !quiet {
        println!("🚀 Starting evaluation runner...");
    }

    let tool = CommandTool::from_config(&config);
    let runner = Runner::new(config, tool)
        .with_events(Arc::new(move |event: &RunEvent| print_event(event, quiet)));
    let report = runner.run().await;

    info!(
        phase = %report.phase_reached,
        elapsed_ms = report.elapsed.as_millis() as u64,
        succeeded = report.succeeded(),
        "Run finished"
    );
    Ok(report.exit_code(args.strict))
}
