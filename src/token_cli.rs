// src/token_cli.rs
use crate::auth::{AuthConfig, Claims};
use crate::environment::GatewayConfig;
use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "recruit-gateway")]
#[command(about = "Tool-invocation gateway for the recruitment platform")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP gateway (default)
    Serve,
    /// Issue or inspect development tokens
    Token {
        #[command(subcommand)]
        action: TokenCommand,
    },
}

#[derive(Subcommand)]
pub enum TokenCommand {
    /// Sign a token for a tenant
    Issue {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        subject: String,
        #[arg(long, default_value_t = 24)]
        ttl_hours: i64,
    },
    /// Verify a token and print its claims
    Inspect { token: String },
}

pub fn handle_token_command(command: TokenCommand) -> Result<()> {
    let config = GatewayConfig::load()?;
    let auth = AuthConfig::from_settings(&config.auth)
        .context("Token commands need the JWT secret in the environment")?;

    match command {
        TokenCommand::Issue {
            tenant,
            subject,
            ttl_hours,
        } => {
            let token = auth.issue_token(&subject, &tenant, ttl_hours)?;
            info!("Issued token for {} in tenant {} ({}h)", subject, tenant, ttl_hours);
            println!("{}", token);
        }

        TokenCommand::Inspect { token } => {
            let claims = auth.verify_token(&token)?;
            println!("{}", describe_claims(&claims));
        }
    }

    Ok(())
}

fn describe_claims(claims: &Claims) -> String {
    let expires = Utc
        .timestamp_opt(claims.exp as i64, 0)
        .single()
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| claims.exp.to_string());

    let mut lines = vec![
        format!("Subject: {}", claims.sub),
        format!("Tenant:  {}", claims.tenant_id),
        format!("Expires: {}", expires),
    ];
    if let Some(issuer) = &claims.iss {
        lines.push(format!("Issuer:  {}", issuer));
    }
    lines.join("\n")
}
