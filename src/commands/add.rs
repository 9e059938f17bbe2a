use anyhow::{Context as _, Result};
use dialoguer::Input;

use sitekit::{Host, ProvisionReport, ProvisionRequest, provision};
use sitekit::ops::provision::SSH_PORT;

use crate::Context;
use crate::cli::AddArgs;
use crate::ui;

pub fn run(ctx: &Context, host: &Host<'_>, args: AddArgs) -> Result<()> {
    let domain = match args.domain {
        Some(domain) => domain,
        None => Input::<String>::new()
            .with_prompt("Domain")
            .interact_text()
            .context("Failed to read domain")?,
    };

    let request = ProvisionRequest {
        domain,
        username: args.user,
        password: args.password,
        php_version: args.php,
        app_type: args.app.into(),
    };
    let report = provision(host, request)?;
    print_handover(ctx, &report);
    Ok(())
}

/// Everything the site owner needs, printed once.
fn print_handover(ctx: &Context, report: &ProvisionReport) {
    let site = &report.site;
    ui::header(&format!("Site {} is ready", site.domain));

    ui::section("SFTP");
    ui::kv("Host", &report.ip.to_string());
    ui::kv("Port", &SSH_PORT.to_string());
    ui::kv("User", &site.username);
    ui::kv("Password", &report.account_password);
    ui::kv("Document root", &site.document_root.display().to_string());

    ui::section("MySQL");
    ui::kv("Database", &report.database.name);
    ui::kv("User", &report.database.user);
    ui::kv("Password", &report.database.password);
    ui::kv("phpMyAdmin", &report.phpmyadmin_url(ctx.config.phpmyadmin_port));

    ui::section("SSL");
    ui::dim("A self-signed certificate is installed. Once DNS points here, run:");
    println!();
    println!("{}", report.certbot_command(&ctx.config.site.admin_email));
    println!();

    ui::dim(&format!(
        "PHP {} on {}, record saved to {}",
        site.php_version,
        report.web_server,
        report.record_path.display()
    ));
}
