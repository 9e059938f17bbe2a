use anyhow::{Context as _, Result};
use dialoguer::Confirm;

use sitekit::{DeleteOptions, Host, delete};

use crate::Context;
use crate::cli::DeleteArgs;
use crate::ui;

pub fn run(ctx: &Context, host: &Host<'_>, args: &DeleteArgs) -> Result<()> {
    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete {} with its account, files and database? A backup is taken first",
                args.domain
            ))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;

        if !confirmed {
            ui::info("Aborted, nothing was changed");
            return Ok(());
        }
    }

    let options = DeleteOptions {
        allow_partial_backup: args.allow_partial_backup,
    };
    let report = delete(host, &args.domain, options)?;

    super::backup::print_report(ctx, &report.backup);
    if !ctx.quiet {
        ui::section("Removed");
        if report.removed.is_empty() {
            ui::dim("nothing left to remove");
        }
        for item in &report.removed {
            ui::dim(item);
        }
    }
    Ok(())
}
