use anyhow::Result;
use colored::Colorize;
use std::fs;

use sitekit::{BackupReport, Host, StepOutcome, backup};

use crate::Context;
use crate::ui;

/// Sub-step failures are reported but do not fail the command.
pub fn run(ctx: &Context, host: &Host<'_>, domain: &str) -> Result<()> {
    let report = backup(host, domain)?;
    print_report(ctx, &report);
    Ok(())
}

pub(crate) fn print_report(ctx: &Context, report: &BackupReport) {
    if !ctx.quiet {
        ui::section("Backup");
        for step in &report.steps {
            match &step.outcome {
                StepOutcome::Captured => println!("  {} {}", "✓".green(), step.name),
                StepOutcome::Absent if ctx.verbose > 0 => {
                    println!("  {} {} {}", "-".dimmed(), step.name, "(not present)".dimmed());
                }
                StepOutcome::Absent => {}
                StepOutcome::Failed(reason) => {
                    println!("  {} {}: {}", "✗".red(), step.name, reason);
                }
            }
        }
    }

    match &report.archive {
        Some(archive) => {
            let size = fs::metadata(archive)
                .map(|m| ui::format_size(m.len()))
                .unwrap_or_else(|_| "unknown size".to_string());
            ui::success(&format!("Archive: {} ({size})", archive.display()));
        }
        None => ui::warn("The backup archive could not be written"),
    }
    if !report.is_complete() {
        ui::warn("Backup is incomplete, see the failed steps above");
    }
}
