use console::style;

use crate::runner::check::CheckReport;
use crate::runner::RunEvent;

/// Whether a rendered line belongs on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Render a run event as styled terminal output. Returns `None` for lines
/// suppressed in quiet mode.
pub fn render_event(event: &RunEvent, quiet: bool) -> Option<(Stream, String)> {
    let line = match event {
        RunEvent::CredentialLoaded { env_file, key_name } => (
            Stream::Stdout,
            format!(
                "{} Loaded {} from {}",
                style("✓").green(),
                style(key_name).cyan(),
                env_file.display(),
            ),
        ),
        RunEvent::PlaceholderMissing { source_config, placeholder } => (
            Stream::Stderr,
            format!(
                "{} {} does not contain {}; using it unchanged",
                style("⚠").yellow(),
                source_config.display(),
                style(placeholder).yellow(),
            ),
        ),
        RunEvent::ConfigMaterialized { temp_config, replacements } => {
            if quiet {
                return None;
            }
            (
                Stream::Stdout,
                format!(
                    "{} Generated temporary config {} ({} replacement{})",
                    style("📝").dim(),
                    style(temp_config.display()).dim(),
                    replacements,
                    if *replacements == 1 { "" } else { "s" },
                ),
            )
        }
        RunEvent::ToolStarting { command } => {
            if quiet {
                return None;
            }
            (
                Stream::Stdout,
                format!("{} Running {}", style("▶").green().bold(), style(command).white().bold()),
            )
        }
        RunEvent::ToolPassed => (
            Stream::Stdout,
            format!("{} Evaluation completed", style("✓").green()),
        ),
        RunEvent::ToolFailed { code } => {
            let detail = code
                .map(|c| format!(" (exit code {})", c))
                .unwrap_or_default();
            (
                Stream::Stderr,
                format!("{} Tests finished with some failures{}", style("⚠").yellow(), detail),
            )
        }
        RunEvent::ToolInterrupted => (
            Stream::Stderr,
            format!("{} Evaluation interrupted", style("⚠").yellow()),
        ),
        RunEvent::RunFailed { error_type, message } => (
            Stream::Stderr,
            format!(
                "{} Critical error [{}]: {}",
                style("✗").red(),
                style(error_type).red().bold(),
                style(message).red(),
            ),
        ),
        RunEvent::CleanupRemoved { .. } => (
            Stream::Stdout,
            format!("{} Cleanup: temporary config file deleted", style("🧹").dim()),
        ),
        RunEvent::CleanupFailed { temp_config, message } => (
            Stream::Stderr,
            format!(
                "{} Cleanup failed: {}\n  {} still contains the API key; delete it manually",
                style("✗").red(),
                style(message).red(),
                style(temp_config.display()).red().bold(),
            ),
        ),
    };
    Some(line)
}

pub fn print_event(event: &RunEvent, quiet: bool) {
    match render_event(event, quiet) {
        Some((Stream::Stdout, line)) => println!("{}", line),
        Some((Stream::Stderr, line)) => eprintln!("{}", line),
        None => {}
    }
}

pub fn render_check(report: &CheckReport) -> String {
    let mut lines = Vec::new();

    match (&report.credential_hint, &report.credential_error) {
        (Some(hint), _) => lines.push(format!(
            "{} {} found in {} ({})",
            style("✓").green(),
            style(&report.key_name).cyan(),
            report.env_file.display(),
            style(hint).dim(),
        )),
        (None, Some(err)) => lines.push(format!("{} {}", style("✗").red(), style(err).red())),
        (None, None) => {}
    }

    match (report.placeholder_occurrences, &report.config_error) {
        (Some(0), _) => lines.push(format!(
            "{} {} does not contain {}",
            style("⚠").yellow(),
            report.source_config.display(),
            style(&report.placeholder).yellow(),
        )),
        (Some(n), _) => lines.push(format!(
            "{} {} contains {} {} occurrence{}",
            style("✓").green(),
            report.source_config.display(),
            n,
            style(&report.placeholder).cyan(),
            if n == 1 { "" } else { "s" },
        )),
        (None, Some(err)) => lines.push(format!("{} {}", style("✗").red(), style(err).red())),
        (None, None) => {}
    }

    if report.stale_temp_config {
        lines.push(format!(
            "{} stale {} exists and may contain a key; it is removed on the next run",
            style("⚠").yellow(),
            report.temp_config.display(),
        ));
    }

    let verdict = if report.is_ready() {
        format!("{}", style("Ready to run").green().bold())
    } else {
        format!("{}", style("Not ready").red().bold())
    };
    lines.push(verdict);
    lines.join("\n")
}
