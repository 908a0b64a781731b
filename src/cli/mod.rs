pub mod check;
pub mod commands;
pub mod render;
pub mod run;

pub use commands::{Cli, Commands};
