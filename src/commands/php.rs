use anyhow::Result;

use sitekit::{Host, PhpChange, change_php_version};

use crate::Context;
use crate::cli::PhpArgs;
use crate::ui;

pub fn run(ctx: &Context, host: &Host<'_>, args: &PhpArgs) -> Result<()> {
    let change = change_php_version(host, &args.domain, &args.php)?;
    if ctx.quiet {
        return Ok(());
    }

    if let PhpChange::Changed {
        from,
        pool_file,
        pool_moved,
        old_restarted,
        ..
    } = &change
    {
        ui::kv("Previous version", &from.to_string());
        let verb = if *pool_moved { "moved to" } else { "created at" };
        ui::kv("Pool", &format!("{verb} {}", pool_file.display()));
        if !old_restarted {
            ui::dim(&format!("PHP {from} is not running; it was not restarted"));
        }
    }
    Ok(())
}
