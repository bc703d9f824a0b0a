pub mod config;
pub mod constants;
pub mod error;
pub mod metrics;
pub mod models;
pub mod scenario;
pub mod services;
pub mod telemetry;

pub use config::MarketConfig;
pub use error::{AuctionError, BidError, ConfigError};
pub use services::{Market, SharedMarket};
