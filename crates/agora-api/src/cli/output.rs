//! Terminal rendering shared by the CLI commands.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use agora_core::service::ProgressReporter;
use agora_types::conversation::ProgressStage;
use agora_types::notice::{Notice, NoticeKind};

/// Print a notice as styled text, or as JSON with `--json`.
pub fn print_notice(notice: &Notice, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(notice)?);
        return Ok(());
    }
    println!();
    println!("{}", render_notice(notice));
    println!();
    Ok(())
}

/// Styled multi-line rendering of a notice.
pub fn render_notice(notice: &Notice) -> String {
    let marker = match notice.kind {
        NoticeKind::Success => style("✓").green().bold(),
        NoticeKind::Info => style("i").blue().bold(),
        NoticeKind::Failure => style("✗").red().bold(),
    };
    let mut lines = vec![format!("  {} {}", marker, style(&notice.title).bold())];
    if !notice.description.is_empty() {
        for line in notice.description.lines() {
            lines.push(format!("    {line}"));
        }
    }
    for field in &notice.fields {
        lines.push(format!(
            "    {}  {}",
            style(format!("{}:", field.name)).bold(),
            field.value
        ));
    }
    lines.join("\n")
}

/// Seconds with two decimals, e.g. `1.23s`.
pub fn format_latency(latency: Duration) -> String {
    format!("{:.2}s", latency.as_secs_f64())
}

/// A spinner whose message follows the stages of a running conversation.
pub struct SpinnerProgress {
    bar: ProgressBar,
}

impl SpinnerProgress {
    /// A hidden spinner when `quiet` (e.g. with `--json`).
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            bar.set_style(spinner_style);
        }
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for SpinnerProgress {
    fn report(&self, stage: ProgressStage) {
        self.bar.set_message(stage_message(&stage));
    }
}

impl Drop for SpinnerProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

fn stage_message(stage: &ProgressStage) -> String {
    match stage {
        ProgressStage::CreatingAgents { count: 1 } => "Creating agent...".to_string(),
        ProgressStage::CreatingAgents { count } => format!("Creating {count} agents..."),
        ProgressStage::GeneratingResponses => "Generating responses...".to_string(),
        ProgressStage::Completed { stats } => {
            format!("Done: {} messages", stats.message_count)
        }
    }
}
