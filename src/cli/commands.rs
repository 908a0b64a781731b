use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::RunnerSettings;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

#[derive(Parser)]
#[command(
    name = "keyrun",
    version,
    long_version = LONG_VERSION,
    about = "Run promptfoo evaluations with an API key injected from .env",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Arguments for the default `run` command
    #[command(flatten)]
    pub run: RunArgs,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inject the key, run the evaluation, delete the temporary config (default)
    Run(RunArgs),
    /// Check that the key and placeholder can be found, without running anything
    Check(CheckArgs),
}

#[derive(Args, Clone, Debug, Default)]
pub struct PathArgs {
    /// Environment file holding the API key [default: .env]
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Source promptfoo config [default: promptfooconfig.yaml]
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Temporary config path, deleted after the run [default: temp_promptfooconfig.yaml]
    #[arg(long)]
    pub temp_config: Option<PathBuf>,

    /// Name of the key to read from the environment file [default: GROQ_API_KEY]
    #[arg(long)]
    pub key_name: Option<String>,

    /// Token in the config replaced by the key [default: process.env.<KEY_NAME>]
    #[arg(long)]
    pub placeholder: Option<String>,

    /// YAML settings file [default: keyrun.yaml if present]
    #[arg(long)]
    pub settings: Option<PathBuf>,
}

impl PathArgs {
    pub fn to_settings(&self) -> RunnerSettings {
        RunnerSettings {
            env_file: self.env_file.clone(),
            config: self.config.clone(),
            temp_config: self.temp_config.clone(),
            key_name: self.key_name.clone(),
            placeholder: self.placeholder.clone(),
            ..Default::default()
        }
    }
}

#[derive(Args, Clone, Debug, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// Let the evaluation tool use its response cache (omits --no-cache)
    #[arg(long)]
    pub cache: bool,

    /// Exit non-zero when any phase fails
    #[arg(long)]
    pub strict: bool,

    /// Extra arguments passed to the evaluation tool after `--`
    #[arg(last = true)]
    pub tool_args: Vec<String>,
}

impl RunArgs {
    pub fn to_settings(&self) -> RunnerSettings {
        RunnerSettings {
            no_cache: self.cache.then_some(false),
            extra_args: (!self.tool_args.is_empty()).then(|| self.tool_args.clone()),
            ..self.paths.to_settings()
        }
    }
}

#[derive(Args, Clone, Debug, Default)]
pub struct CheckArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
