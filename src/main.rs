mod cli;
mod commands;
mod config;
mod paths;
mod privilege;
mod progress;
mod ui;

use anyhow::{Context as _, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::Config;
use progress::ConsoleProgress;
use sitekit::{Host, HttpPublicIp, SystemAccounts, SystemRunner, WebServer};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config: Config,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        report_error(&e);
        std::process::exit(1);
    }
}

/// Log and print a fatal error, noting when earlier steps were left in place.
fn report_error(e: &anyhow::Error) {
    let kind = e.downcast_ref::<sitekit::Error>().map(sitekit::Error::kind);
    match kind {
        Some(kind) => log::error!("{}: {e:#}", kind.label()),
        None => log::error!("{e:#}"),
    }
    ui::error(&format!("{e:#}"));
    if kind.is_some_and(|k| k.may_have_mutated()) {
        ui::dim("Steps completed before the failure were left in place; fix the cause and re-run.");
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Command::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "okpanel", &mut io::stdout());
        return Ok(());
    }

    let config_path = paths::config_file(cli.config.as_deref());
    let config = Config::load(&config_path)?;
    init_logging(&config.log_file, cli.verbose, cli.quiet);

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config,
    };

    if matches!(cli.command, Command::Config) {
        return commands::config::run(&ctx, &config_path);
    }

    privilege::require_root()?;
    log::debug!("okpanel {} (config {})", env!("CARGO_PKG_VERSION"), config_path.display());

    let runner = SystemRunner;
    let accounts = SystemAccounts;
    let public_ip = HttpPublicIp::new(&ctx.config.ip_lookup_url);
    let progress = ConsoleProgress::new(ctx.quiet);

    let mut host = Host::new(ctx.config.paths.clone(), &runner, &accounts, &public_ip)
        .with_settings(ctx.config.site.clone())
        .with_templates(ctx.config.templates())
        .with_progress(&progress);

    // Only add and delete touch web server config, so only they load the choice.
    if matches!(cli.command, Command::Add(_) | Command::Delete(_)) {
        let server = match cli.web_server {
            Some(arg) => WebServer::from(arg),
            None => sitekit::webserver::load_or_detect(&ctx.config.webserver_file, &runner)
                .with_context(|| {
                    format!(
                        "Could not determine the web server (cache {})",
                        ctx.config.webserver_file.display()
                    )
                })?,
        };
        log::debug!("Web server: {server}");
        host = host.with_web_server(server);
    }

    match cli.command {
        Command::Add(args) => commands::add::run(&ctx, &host, args),
        Command::Php(args) => commands::php::run(&ctx, &host, &args),
        Command::Backup { domain } => commands::backup::run(&ctx, &host, &domain),
        Command::Delete(args) => commands::delete::run(&ctx, &host, &args),
        Command::Info { domain, json } => commands::info::run(&ctx, &host, &domain, json),
        Command::Config | Command::Completions { .. } => Ok(()),
    }
}

/// Log to the configured file, or to stderr when it cannot be opened.
fn init_logging(log_file: &Path, verbose: u8, quiet: bool) {
    let level = if quiet {
        log::LevelFilter::Error
    } else {
        match verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).format(|buf, record| {
        writeln!(
            buf,
            "[{}] {} {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.args()
        )
    });

    let file = OpenOptions::new().create(true).append(true).open(log_file);
    match file {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file))).init();
        }
        Err(e) => {
            builder.target(env_logger::Target::Stderr).init();
            log::warn!("Cannot open log file {}: {e}; logging to stderr", log_file.display());
        }
    }
}
