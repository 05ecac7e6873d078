//! canopy command-line entry point.

use anyhow::{Context, Result, bail};
use canopy::{
    build::{build_site, print_tree},
    cli::{Cli, Commands},
    config::SiteConfig,
    log,
    render::{BuildError, CancelToken},
};
use clap::Parser;
use std::{path::Path, process::ExitCode};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.downcast_ref::<BuildError>().is_some_and(BuildError::is_cancelled) => {
            log!("build"; "cancelled");
            ExitCode::from(130)
        }
        Err(err) => {
            log!("error"; "{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Build { .. } => {
            let cancel = CancelToken::new();
            let handler = cancel.clone();
            ctrlc::set_handler(move || handler.cancel())
                .context("Failed to install Ctrl-C handler")?;
            build_site(&config, &cancel).map(|_| ())
        }
        Commands::Tree => print_tree(&config),
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    if !config_path.exists() {
        bail!("Config file not found: {}", config_path.display());
    }

    let mut config = SiteConfig::from_path(&config_path)?;
    config.update_with_cli(cli);
    config.validate()?;
    Ok(config)
}
