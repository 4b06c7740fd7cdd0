// src/environment.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Gateway configuration for one environment (`local` or `production`).
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub chat: ChatSettings,
    pub services: ServicesConfig,
    #[serde(default)]
    pub agent: Option<AgentSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// Name of the environment variable holding the HS256 signing secret.
    #[serde(default = "default_jwt_secret_env")]
    pub jwt_secret_env: String,
    #[serde(default)]
    pub issuer: Option<String>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret_env: default_jwt_secret_env(),
            issuer: None,
        }
    }
}

impl AuthSettings {
    pub fn jwt_secret(&self) -> Result<String> {
        std::env::var(&self.jwt_secret_env).with_context(|| {
            format!(
                "{} environment variable not set (JWT signing secret)",
                self.jwt_secret_env
            )
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatSettings {
    /// Environment variable with the shared service token used by the chat surface.
    #[serde(default)]
    pub service_token_env: Option<String>,
}

impl ChatSettings {
    /// Missing variable means the chat surface calls downstream without credentials.
    pub fn service_token(&self) -> Option<String> {
        self.service_token_env
            .as_ref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|token| !token.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceEndpoint {
    pub base_url: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ServiceEndpoint {
    pub fn timeout_or(&self, default_secs: u64) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(default_secs))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServicesConfig {
    pub jobs: ServiceEndpoint,
    pub candidates: ServiceEndpoint,
    pub matching: ServiceEndpoint,
    pub meetings: ServiceEndpoint,
    pub reports: ServiceEndpoint,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentSettings {
    pub engine_url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    pub model: String,
    /// Public address of this gateway's raw tool surface, handed to the engine.
    pub tool_server_url: String,
    #[serde(default = "default_tool_server_label")]
    pub tool_server_label: String,
    #[serde(default)]
    pub max_turns: Option<usize>,
    #[serde(default = "default_decision_timeout_secs")]
    pub decision_timeout_secs: u64,
    #[serde(default = "default_engine_timeout_secs")]
    pub engine_timeout_secs: u64,
}

impl AgentSettings {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok()
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: GatewayConfig,
    production: GatewayConfig,
}

fn default_port() -> u16 {
    8000
}

fn default_jwt_secret_env() -> String {
    "GATEWAY_JWT_SECRET".to_string()
}

fn default_api_key_env() -> String {
    "GENERATION_API_KEY".to_string()
}

fn default_tool_server_label() -> String {
    "recruit".to_string()
}

fn default_decision_timeout_secs() -> u64 {
    300
}

fn default_engine_timeout_secs() -> u64 {
    120
}

impl GatewayConfig {
    /// Load configuration for the current environment.
    pub fn load() -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        let config_path = std::env::var("GATEWAY_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        if !config_path.exists() {
            anyhow::bail!(
                "{} not found. Server cannot start without configuration.",
                config_path.display()
            );
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let mut config = Self::from_yaml_str(&content, &environment)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        if let Ok(port) = std::env::var("ROCKET_PORT") {
            config.port = port
                .parse::<u16>()
                .map_err(|_| anyhow::anyhow!("ROCKET_PORT must be a valid port number"))?;
        }

        Ok(config)
    }

    /// Parse a config file body and select one environment's section.
    pub fn from_yaml_str(content: &str, environment: &str) -> Result<Self> {
        let config_file: ConfigFile =
            serde_yaml::from_str(content).context("Invalid gateway configuration")?;

        Ok(match environment {
            "production" => config_file.production,
            _ => config_file.local,
        })
    }

    fn get_environment() -> String {
        std::env::var("GATEWAY_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }
}
