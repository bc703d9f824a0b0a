use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

pub mod market;
pub use market::{
    CapacityReferenceConfig, MarketConfig, SpecialMode, StatMode, StatType, StatisticDefinition,
};

/// Log output format for the tracing subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "plain" | "text" => Ok(LogFormat::Plain),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow::anyhow!("Unknown log format: {}", other)),
        }
    }
}

/// Process-level settings for the replay binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub environment: String,
    pub log_format: LogFormat,
    /// Market configuration file used when a scenario does not embed one
    pub config_path: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Ok(Settings {
            environment: env::var("AUCTION_ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            log_format: env::var("AUCTION_LOG_FORMAT")
                .unwrap_or_else(|_| "plain".to_string())
                .parse()?,
            config_path: env::var("AUCTION_CONFIG_PATH").ok().map(PathBuf::from),
        })
    }
}
