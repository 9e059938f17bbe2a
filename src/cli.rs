use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

use sitekit::{AppType, WebServer};

#[derive(Parser)]
#[command(name = "okpanel")]
#[command(version)]
#[command(about = "Provision and manage PHP sites on an Nginx/Apache + PHP-FPM + MySQL host", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors and suppress progress lines
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (defaults to $OKPANEL_CONFIG, then /etc/okpanel/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Web server to manage, overriding the cached or detected choice
    #[arg(long, global = true, value_enum)]
    pub web_server: Option<WebServerArg>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a site: account, PHP-FPM pool, vhost, database and TLS certificate
    Add(AddArgs),

    /// Move a site to another PHP version
    Php(PhpArgs),

    /// Archive a site's files, database and configuration
    Backup {
        /// Site domain
        domain: String,
    },

    /// Back up a site, then remove everything it owns
    Delete(DeleteArgs),

    /// Show what is known about a site
    Info {
        /// Site domain
        domain: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Site commands
// ============================================================================

#[derive(Parser)]
pub struct AddArgs {
    /// Site domain (prompted for when omitted)
    #[arg(short, long)]
    pub domain: Option<String>,

    /// Linux account that owns the site
    #[arg(short, long = "user")]
    pub user: String,

    /// Account password (generated when omitted)
    #[arg(short, long)]
    pub password: Option<String>,

    /// PHP version as MAJOR.MINOR (newest installed when omitted)
    #[arg(long = "php", value_name = "VERSION")]
    pub php: Option<String>,

    /// Application type, selects the vhost template
    #[arg(long, value_enum, default_value_t = AppArg::Wp)]
    pub app: AppArg,
}

#[derive(Parser)]
pub struct PhpArgs {
    /// Site domain
    #[arg(short, long)]
    pub domain: String,

    /// Target PHP version as MAJOR.MINOR
    #[arg(long = "php", value_name = "VERSION")]
    pub php: String,
}

#[derive(Parser)]
pub struct DeleteArgs {
    /// Site domain
    pub domain: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Delete even when some backup steps failed
    #[arg(long)]
    pub allow_partial_backup: bool,
}

// ============================================================================
// Value enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WebServerArg {
    Nginx,
    Apache,
}

impl From<WebServerArg> for WebServer {
    fn from(arg: WebServerArg) -> Self {
        match arg {
            WebServerArg::Nginx => Self::Nginx,
            WebServerArg::Apache => Self::Apache,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AppArg {
    Wp,
    Laravel,
}

impl From<AppArg> for AppType {
    fn from(arg: AppArg) -> Self {
        match arg {
            AppArg::Wp => Self::Wp,
            AppArg::Laravel => Self::Laravel,
        }
    }
}
