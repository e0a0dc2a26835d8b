//! Application configuration
//!
//! Loaded in layers: built-in defaults, then an optional TOML file, then
//! `VEGANFLOW_*` environment variables, then validation.

use crate::error::{Result, VeganFlowError};
use crate::negotiation::{StrategyPolicy, DEFAULT_MAX_CONCURRENT_SESSIONS, MAX_RETRIES_PER_VENDOR};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "veganflow.toml";

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub transport: TransportConfig,
    pub negotiation: NegotiationConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CatalogConfig {
    /// JSON catalog snapshot; the demo store is used when unset
    pub seed_path: Option<PathBuf>,
    /// Base URL of the vendor hub the demo vendors are mounted on
    pub vendor_hub_url: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransportConfig {
    pub timeout_ms: u64,
    /// 0 or 1; anything higher is rejected by validation
    pub retries_per_vendor: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NegotiationConfig {
    pub last_vendor_max_premium: Option<Decimal>,
    pub max_concurrent_sessions: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// URL vendors advertise in their agent cards
    pub public_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = VeganFlowError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(VeganFlowError::InvalidConfig {
                key: "logging.format".to_string(),
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig {
                seed_path: None,
                vendor_hub_url: "http://127.0.0.1:8080".to_string(),
            },
            transport: TransportConfig {
                timeout_ms: 5_000,
                retries_per_vendor: MAX_RETRIES_PER_VENDOR,
            },
            negotiation: NegotiationConfig {
                last_vendor_max_premium: None,
                max_concurrent_sessions: DEFAULT_MAX_CONCURRENT_SESSIONS,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                public_url: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Compact,
            },
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = resolve_config_path(options.config_path.as_deref()) {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options
                .config_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(VeganFlowError::Configuration(format!(
                "config file not found: {}",
                expected.display()
            )));
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(catalog) = patch.catalog {
            if let Some(seed_path) = catalog.seed_path {
                self.catalog.seed_path = Some(seed_path);
            }
            if let Some(url) = catalog.vendor_hub_url {
                self.catalog.vendor_hub_url = url;
            }
        }

        if let Some(transport) = patch.transport {
            if let Some(timeout_ms) = transport.timeout_ms {
                self.transport.timeout_ms = timeout_ms;
            }
            if let Some(retries) = transport.retries_per_vendor {
                self.transport.retries_per_vendor = retries;
            }
        }

        if let Some(negotiation) = patch.negotiation {
            if let Some(premium) = negotiation.last_vendor_max_premium {
                self.negotiation.last_vendor_max_premium = Some(premium);
            }
            if let Some(max) = negotiation.max_concurrent_sessions {
                self.negotiation.max_concurrent_sessions = max;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(public_url) = server.public_url {
                self.server.public_url = Some(public_url);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = read_env("VEGANFLOW_CATALOG_SEED_PATH") {
            self.catalog.seed_path = Some(PathBuf::from(value));
        }
        if let Some(value) = read_env("VEGANFLOW_VENDOR_HUB_URL") {
            self.catalog.vendor_hub_url = value;
        }

        if let Some(value) = read_env("VEGANFLOW_TRANSPORT_TIMEOUT_MS") {
            self.transport.timeout_ms = parse_env("VEGANFLOW_TRANSPORT_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = read_env("VEGANFLOW_RETRIES_PER_VENDOR") {
            self.transport.retries_per_vendor = parse_env("VEGANFLOW_RETRIES_PER_VENDOR", &value)?;
        }

        if let Some(value) = read_env("VEGANFLOW_LAST_VENDOR_MAX_PREMIUM") {
            self.negotiation.last_vendor_max_premium =
                Some(parse_env("VEGANFLOW_LAST_VENDOR_MAX_PREMIUM", &value)?);
        }
        if let Some(value) = read_env("VEGANFLOW_MAX_CONCURRENT_SESSIONS") {
            self.negotiation.max_concurrent_sessions =
                parse_env("VEGANFLOW_MAX_CONCURRENT_SESSIONS", &value)?;
        }

        if let Some(value) = read_env("VEGANFLOW_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("VEGANFLOW_PORT") {
            self.server.port = parse_env("VEGANFLOW_PORT", &value)?;
        }
        if let Some(value) = read_env("VEGANFLOW_PUBLIC_URL") {
            self.server.public_url = Some(value);
        }

        if let Some(value) = read_env("VEGANFLOW_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("VEGANFLOW_LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, value: String| {
            Err(VeganFlowError::InvalidConfig {
                key: key.to_string(),
                value,
            })
        };

        let hub = &self.catalog.vendor_hub_url;
        if !(hub.starts_with("http://") || hub.starts_with("https://")) {
            return invalid("catalog.vendor_hub_url", hub.clone());
        }
        if self.transport.timeout_ms == 0 {
            return invalid("transport.timeout_ms", "0".to_string());
        }
        let retries = self.transport.retries_per_vendor;
        if retries > MAX_RETRIES_PER_VENDOR {
            return invalid("transport.retries_per_vendor", retries.to_string());
        }
        if let Some(premium) = self.negotiation.last_vendor_max_premium {
            if premium < Decimal::ZERO {
                return invalid("negotiation.last_vendor_max_premium", premium.to_string());
            }
        }
        if self.negotiation.max_concurrent_sessions == 0 {
            return invalid("negotiation.max_concurrent_sessions", "0".to_string());
        }
        if self.server.bind_address.trim().is_empty() {
            return invalid("server.bind_address", String::new());
        }
        if self.logging.level.trim().is_empty() {
            return invalid("logging.level", String::new());
        }

        Ok(())
    }

    pub fn transport_timeout(&self) -> Duration {
        Duration::from_millis(self.transport.timeout_ms)
    }

    /// Strategy knobs for the coordinator
    pub fn policy(&self) -> StrategyPolicy {
        StrategyPolicy {
            last_vendor_max_premium: self.negotiation.last_vendor_max_premium,
            retries_per_vendor: self.transport.retries_per_vendor,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }

    /// URL the hub is reachable at, defaulting to the bind address
    pub fn public_url(&self) -> String {
        self.server
            .public_url
            .clone()
            .unwrap_or_else(|| format!("http://{}", self.bind_addr()))
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then(|| path.to_path_buf());
    }

    let default = PathBuf::from(DEFAULT_CONFIG_FILE);
    default.exists().then_some(default)
}

fn read_patch(path: &Path) -> Result<ConfigPatch> {
    let raw = fs::read_to_string(path)?;
    toml::from_str::<ConfigPatch>(&raw).map_err(|e| {
        VeganFlowError::Configuration(format!("could not parse {}: {e}", path.display()))
    })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse::<T>().map_err(|_| VeganFlowError::InvalidConfig {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    catalog: Option<CatalogPatch>,
    transport: Option<TransportPatch>,
    negotiation: Option<NegotiationPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    seed_path: Option<PathBuf>,
    vendor_hub_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TransportPatch {
    timeout_ms: Option<u64>,
    retries_per_vendor: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct NegotiationPatch {
    last_vendor_max_premium: Option<Decimal>,
    max_concurrent_sessions: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    public_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
