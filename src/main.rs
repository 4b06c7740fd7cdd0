use anyhow::{Context, Result};
use clap::Parser;
use recruit_gateway::environment::GatewayConfig;
use recruit_gateway::start_web_server;
use recruit_gateway::token_cli::{handle_token_command, Cli, Command};
use std::fs::OpenOptions;
use tracing::info;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILE: &str = "/tmp/recruit-gateway.log";
const DEFAULT_LOG_FILTER: &str = "recruit_gateway=info,rocket=warn";

fn init_logging() -> Result<()> {
    let path = std::env::var("GATEWAY_LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true) // Clear file on startup
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(true)
                .with_span_list(false),
        )
        .with(filter)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Token { action } => handle_token_command(action),
        Command::Serve => {
            let config = GatewayConfig::load()?;
            info!(
                "Environment: {}",
                std::env::var("GATEWAY_ENV").unwrap_or_else(|_| "local".to_string())
            );
            start_web_server(config).await
        }
    }
}
