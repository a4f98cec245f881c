//! Sociogram CLI entry point.

use clap::Parser;

use sociogram::cli::{commands, handle_error, Cli, Commands};
use sociogram::infrastructure::config::ConfigLoader;
use sociogram::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    // Keep the guard alive so buffered file logs are flushed on exit.
    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Init(args) => commands::init::execute(args, &config, cli.json).await,
        Commands::Catalog(args) => commands::catalog::execute(args, &config, cli.json).await,
        Commands::Survey(args) => commands::survey::execute(args, &config, cli.json).await,
        Commands::Form(args) => commands::form::execute(args, &config, cli.json).await,
        Commands::Submit(args) => commands::submit::execute(args, &config, cli.json).await,
        Commands::Progress(args) => commands::progress::execute(args, &config, cli.json).await,
        Commands::Analyze(args) => commands::analyze::execute(args, &config, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
