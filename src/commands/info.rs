use anyhow::Result;

use sitekit::{Host, SiteSource, resolve};

use crate::Context;
use crate::ui;

/// Resolve a site and print it. Read-only.
pub fn run(_ctx: &Context, host: &Host<'_>, domain: &str, json: bool) -> Result<()> {
    let site = resolve(host, domain)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&site)?);
        return Ok(());
    }

    ui::header(&site.domain);
    super::print_site(&site);
    ui::kv("Home", &site.home_dir.display().to_string());
    ui::kv("App", site.app_type.as_str());
    if let Some(created) = site.created_at {
        ui::kv("Created", &created.to_string());
    }
    if let Some(updated) = site.php_version_updated_at {
        ui::kv("PHP changed", &updated.to_string());
    }
    match site.source {
        SiteSource::Record => ui::dim("from the site record"),
        SiteSource::Inferred => ui::dim("inferred from home directory and PHP-FPM pools (no record)"),
    }
    Ok(())
}
