//! Colorful console output for solve activity.

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::time::Duration;

use crate::dispatch::Backend;
use crate::solver::{NoResult, SolveOutcome};

/// ASCII art banner for server startup.
pub fn print_banner() {
    let banner = r#"
   ___        _   _           _
  / _ \ _ __ | |_(_)_ __ ___ (_)_______ _ __
 | | | | '_ \| __| | '_ ` _ \| |_  / _ \ '__|
 | |_| | |_) | |_| | | | | | | |/ /  __/ |
  \___/| .__/ \__|_|_| |_| |_|_/___\___|_|
       |_|
"#;
    println!("{}", banner.cyan().bold());
    println!(
        "  {} {}\n",
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black(),
        "TSPTW Optimizer API".bright_cyan()
    );
}

/// Prints the solver executables the server dispatches to.
pub fn print_config(vroom: &str, or_tools: &str, jsprit: &str, tmp_dir: &str) {
    for (label, value) in [
        ("fast", vroom),
        ("primary", or_tools),
        ("fallback", jsprit),
        ("tmp dir", tmp_dir),
    ] {
        println!(
            "{} {} {} {} ({})",
            timestamp().bright_black(),
            "INFO".bright_green(),
            "[Config]".bright_cyan(),
            label.white().bold(),
            value.yellow()
        );
    }
}

/// Prints a "Solve started" line.
pub fn print_solve_started(nodes: usize, rests: usize, backend: Backend) {
    println!(
        "{} {} {} Solve started: nodes ({}), rest windows ({}), backend ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Solver]".bright_cyan(),
        nodes.to_formatted_string(&Locale::en).bright_yellow(),
        rests.to_formatted_string(&Locale::en).bright_yellow(),
        backend.as_str().bright_magenta()
    );
}

/// Prints a "Solve ended" line with the outcome.
pub fn print_solve_ended(elapsed: Duration, backend: Backend, outcome: &SolveOutcome) {
    let status = match outcome {
        SolveOutcome::Solved(result) => format!(
            "✓ {} visits",
            result.visit_count().to_formatted_string(&Locale::en)
        )
        .bright_green()
        .bold()
        .to_string(),
        SolveOutcome::NoResult(reason) => format!("✗ {}", describe(reason))
            .bright_red()
            .bold()
            .to_string(),
    };

    println!(
        "{} {} {} Solve ended: time spent ({}), backend ({}), {}",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Solver]".bright_cyan(),
        format_duration(elapsed).yellow(),
        backend.as_str().bright_magenta(),
        status
    );
}

fn describe(reason: &NoResult) -> String {
    match reason {
        NoResult::SolverProcessFailed { code: Some(code) } => format!("solver exited with {}", code),
        NoResult::SolverProcessFailed { code: None } => "solver killed by signal".to_string(),
        NoResult::SolverTimedOut => "solver timed out".to_string(),
        NoResult::EmptyResult => "no solution".to_string(),
    }
}

/// Formats a duration nicely.
fn format_duration(d: Duration) -> String {
    let total_ms = d.as_millis();
    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", d.as_secs_f64())
    } else {
        let mins = total_ms / 60_000;
        let secs = (total_ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

/// Returns a timestamp string.
fn timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| format!("{}.{:03}", d.as_secs(), d.subsec_millis()))
        .unwrap_or_else(|_| "0.000".to_string())
}
