use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::DEFAULT_BASE_URL;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_MAX_TRANSACTIONS: usize = 10_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub agent: AgentConfig,
    pub payments: PaymentsConfig,
    pub pricing: PricingConfig,
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Externally visible base URL, used for discovery and payment resources
    pub public_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub name: String,
    pub description: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentsConfig {
    pub enabled: bool,
    pub facilitator_url: String,
    pub pay_to: String,
    pub network: String,
    /// Token contract the prices are denominated in (USDC on base-sepolia)
    pub asset: String,
    pub max_timeout_seconds: u64,
}

/// Entrypoint prices in the asset's smallest unit (micro-USDC)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub convert: u64,
    pub rates: u64,
    pub historical: u64,
    pub timeseries: u64,
    pub report: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub enabled: bool,
    /// Settled payments kept in memory; the oldest are dropped past this
    pub max_transactions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8787,
            public_url: None,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "fxrates".to_string(),
            description: "Currency exchange rates, conversions and rate statistics, paid per call"
                .to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            facilitator_url: "https://x402.org/facilitator".to_string(),
            pay_to: String::new(),
            network: "base-sepolia".to_string(),
            asset: "0x036CbD53842c5426634e7929541eC2318f3dCF7e".to_string(),
            max_timeout_seconds: 60,
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            convert: 1_000,
            rates: 2_000,
            historical: 2_000,
            timeseries: 5_000,
            report: 10_000,
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_transactions: DEFAULT_MAX_TRANSACTIONS,
        }
    }
}

impl Config {
    /// Public base URL, falling back to the bind address
    pub fn public_url(&self) -> String {
        match &self.server.public_url {
            Some(url) if !url.trim().is_empty() => url.trim_end_matches('/').to_string(),
            _ => format!("http://{}:{}", self.server.bind, self.server.port),
        }
    }

    /// Apply `FXRATES_*` environment overrides on top of the file values
    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        if let Some(bind) = env_str("FXRATES_BIND") {
            self.server.bind = bind;
        }
        if let Some(port) = env_str("FXRATES_PORT") {
            self.server.port = parse_port(&port)?;
        }
        if let Some(url) = env_str("FXRATES_PUBLIC_URL") {
            self.server.public_url = Some(url);
        }
        if let Some(url) = env_str("FXRATES_UPSTREAM_URL") {
            self.upstream.base_url = url;
        }
        if let Some(enabled) = env_bool("FXRATES_PAYMENTS_ENABLED") {
            self.payments.enabled = enabled;
        }
        if let Some(url) = env_str("FXRATES_FACILITATOR_URL") {
            self.payments.facilitator_url = url;
        }
        if let Some(pay_to) = env_str("FXRATES_PAY_TO") {
            self.payments.pay_to = pay_to;
        }
        if let Some(network) = env_str("FXRATES_NETWORK") {
            self.payments.network = network;
        }
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.payments.enabled && self.payments.pay_to.trim().is_empty() {
            anyhow::bail!("payments are enabled but no pay_to address is configured");
        }
        Ok(())
    }
}

fn env_str(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_port(value: &str) -> anyhow::Result<u16> {
    value
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid FXRATES_PORT '{}': {}", value, e))
}

fn env_bool(name: &str) -> Option<bool> {
    env_str(name).map(|s| matches!(s.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn get_config_path(path: Option<&Path>) -> PathBuf {
    match path {
        Some(path) => path.to_path_buf(),
        None => env_str("FXRATES_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
    }
}

/// Read a config file. A missing file yields the defaults.
pub fn load_config_file(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let config_str = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&config_str)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
    Ok(config)
}

/// Defaults, then the config file, then environment overrides
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config_path = get_config_path(path);
    let mut config = load_config_file(&config_path)?;
    config.apply_env()?;
    config.validate()?;
    Ok(config)
}

pub fn save_config(config: &Config, path: &Path) -> anyhow::Result<()> {
    let config_str = toml::to_string_pretty(config)?;
    fs::write(path, config_str)?;
    Ok(())
}
