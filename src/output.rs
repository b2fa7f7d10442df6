use colored::Colorize;

use crate::pipeline::{FileOutcome, RunReport};

/// Renders the per-file outcome report.
pub struct ReportRenderer {
    show_colors: bool,
}

impl ReportRenderer {
    pub fn new(show_colors: bool) -> Self {
        Self { show_colors }
    }

    pub fn render(&self, report: &RunReport) {
        for file in &report.files {
            let path = file.path.display();
            match &file.outcome {
                FileOutcome::Unchanged => {
                    println!("{} {}", self.dim("unchanged"), path);
                }
                FileOutcome::Written => {
                    println!("{} {}", self.green("written"), path);
                }
                FileOutcome::WouldWrite => {
                    println!("{} {}", self.yellow("would write"), path);
                }
                FileOutcome::Failed(message) => {
                    println!("{} {}: {}", self.red("failed"), path, message);
                }
            }

            for change in &file.changes {
                println!("  {} -> {}", self.dim(&change.before), change.after);
            }
            for warning in &file.warnings {
                println!("  {} {}", self.yellow("warning:"), warning);
            }
        }

        let changed = report.total_changes();
        if changed > 0 {
            println!();
            println!(
                "{} requirement{} frozen across {} file{}",
                changed,
                if changed == 1 { "" } else { "s" },
                report.files.len(),
                if report.files.len() == 1 { "" } else { "s" },
            );
        }
    }

    fn green(&self, text: &str) -> String {
        if self.show_colors {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }

    fn yellow(&self, text: &str) -> String {
        if self.show_colors {
            text.yellow().to_string()
        } else {
            text.to_string()
        }
    }

    fn red(&self, text: &str) -> String {
        if self.show_colors {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.show_colors {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }
}
