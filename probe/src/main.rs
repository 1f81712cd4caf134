mod args;
mod commands;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use kehati_core::{ApiClient, ApiConfig};
use tracing_subscriber::EnvFilter;

use crate::args::Cli;

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ApiConfig::from_env().context("reading KEHATI_* configuration")?;
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }
    if let Some(dir) = cli.token_dir {
        config.token_dir = Some(dir);
    }

    let label = cli.command.label();
    if cli.command.needs_network() && !config.use_real_api {
        anyhow::bail!("real API calls are disabled; set KEHATI_USE_REAL_API=true to run '{label}'");
    }

    tracing::info!(base_url = %config.base_url, "running {label}");
    let api = ApiClient::from_config(&config);

    match commands::execute(&api, &cli.command) {
        Ok(result) => {
            println!("✓ {label} succeeded!\n");
            println!("{}", serde_json::to_string_pretty(&result)?);
            if api.tokens().get().is_some() && !api.tokens().is_persistent() {
                tracing::warn!("token is held in memory only; set KEHATI_TOKEN_DIR to keep it between runs");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("✗ {label} failed!\n");
            eprintln!("{}", commands::describe_failure(&err));
            Ok(ExitCode::FAILURE)
        }
    }
}
