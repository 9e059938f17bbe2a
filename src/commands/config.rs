use anyhow::Result;
use std::path::Path;

use sitekit::template::Template;

use crate::Context;
use crate::ui;

pub fn run(ctx: &Context, path: &Path) -> Result<()> {
    let source = if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found, using defaults)", path.display())
    };
    if !ctx.quiet {
        ui::dim(&format!("# {source}"));
    }
    print!("{}", ctx.config.to_toml()?);

    if !ctx.quiet {
        let templates = ctx.config.templates();
        ui::section("Templates");
        for template in Template::ALL {
            let source = templates
                .override_file(template)
                .map_or_else(|| "built-in".to_string(), |p| p.display().to_string());
            ui::kv(template.file_name(), &source);
        }
    }
    Ok(())
}
