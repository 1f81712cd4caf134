use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use kehati_core::{ExportFormat, Page};

/// kehati-probe - exercise a Taman Kehati backend from the terminal
#[derive(Parser, Debug)]
#[command(name = "kehati-probe")]
#[command(version)]
#[command(about = "Diagnostic client for the Taman Kehati API", long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides KEHATI_BASE_URL)
    #[arg(short = 'u', long = "base-url")]
    pub base_url: Option<String>,

    /// Directory for the persisted token (overrides KEHATI_TOKEN_DIR)
    #[arg(long = "token-dir")]
    pub token_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Log in with the password grant and keep the token
    Login { username: String, password: String },
    /// Show the user behind the current token
    Me,
    /// Forget the stored token (no request is sent)
    Logout,
    /// List parks
    Parks(PageArgs),
    /// List plant collection records
    Collections(PageArgs),
    /// List users (super admin only)
    Users(PageArgs),
    /// Fetch an export document
    Export {
        #[arg(value_enum)]
        format: ExportKind,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Login, fetch the current user, then list a few parks and collections
    Flow { username: String, password: String },
}

impl Command {
    /// Label used in success and failure reports.
    pub fn label(&self) -> &'static str {
        match self {
            Command::Login { .. } => "Login",
            Command::Me => "Get current user",
            Command::Logout => "Logout",
            Command::Parks(_) => "List Taman Kehati",
            Command::Collections(_) => "List Koleksi Tumbuhan",
            Command::Users(_) => "List Users",
            Command::Export { .. } => "Export",
            Command::Flow { .. } => "Full API flow",
        }
    }

    pub fn needs_network(&self) -> bool {
        !matches!(self, Command::Logout)
    }
}

#[derive(clap::Args, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageArgs {
    #[arg(long, default_value_t = 0)]
    pub skip: u32,
    #[arg(long, default_value_t = 10)]
    pub limit: u32,
}

impl From<PageArgs> for Page {
    fn from(args: PageArgs) -> Self {
        Page::new(args.skip, args.limit)
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    /// Darwin Core records
    Dwc,
    Geojson,
}

impl From<ExportKind> for ExportFormat {
    fn from(kind: ExportKind) -> Self {
        match kind {
            ExportKind::Dwc => ExportFormat::DarwinCore,
            ExportKind::Geojson => ExportFormat::GeoJson,
        }
    }
}
