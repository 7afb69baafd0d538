use clap::Parser;
use docchat::cli::handlers::*;
use docchat::cli::output::print_error;
use docchat::cli::Cli;
use docchat::cli::Commands;
use docchat::config::AppConfig;
use docchat::Result;
use tracing::info;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match cli.config.as_deref() {
        Some(path) => AppConfig::load_from(Some(path))?,
        None => AppConfig::load()?,
    };

    // Initialize logging
    docchat::logging::init_logging_with_config(&config.logging, cli.verbose)?;
    info!("Configuration loaded successfully");

    // Execute the requested command
    match cli.command {
        Commands::Serve { host, port, no_cors } => {
            handle_serve_api(&config, host, port, no_cors).await?;
        }
        Commands::Ingest { paths, reset } => {
            handle_ingest(&config, paths, reset).await?;
        }
        Commands::Queries { question } => {
            handle_queries(&config, question).await?;
        }
        Commands::Ask { question } => {
            handle_ask(&config, question).await?;
        }
        Commands::Config => {
            handle_config_command(&config).await?;
        }
    }

    Ok(())
}
