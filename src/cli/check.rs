use std::path::Path;

use crate::cli::commands::CheckArgs;
use crate::cli::render::render_check;
use crate::config::{load_settings, RunnerConfig};
use crate::errors::KeyrunError;
use crate::runner::check;

pub async fn handle_check(args: CheckArgs) -> Result<i32, KeyrunError> {
    let file_settings = load_settings(args.paths.settings.as_deref(), Path::new(".")).await?;
    let config = RunnerConfig::from_settings(file_settings.merge(args.paths.to_settings()))?;

    let report = check(&config).await;
    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| KeyrunError::Settings(format!("Failed to encode report: {}", e)))?;
        println!("{}", json);
    } else {
        println!("{}", render_check(&report));
    }

    Ok(if report.is_ready() { 0 } else { 2 })
}
