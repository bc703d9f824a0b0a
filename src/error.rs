use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuctionError>;

/// Error codes for categorizing errors
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCode {
    // Configuration errors (1xxx)
    #[serde(rename = "CFG_1001")]
    InvalidPriceCap,
    #[serde(rename = "CFG_1002")]
    InvalidPeriod,
    #[serde(rename = "CFG_1003")]
    InvalidLatency,
    #[serde(rename = "CFG_1004")]
    InvalidFixedQuantity,
    #[serde(rename = "CFG_1005")]
    InvalidStatistic,
    #[serde(rename = "CFG_1006")]
    InvalidInitialStdev,
    #[serde(rename = "CFG_1007")]
    ConfigLoadFailed,

    // Bid errors (2xxx)
    #[serde(rename = "BID_2001")]
    DuplicateBid,
    #[serde(rename = "BID_2002")]
    StaleMarket,
    #[serde(rename = "BID_2003")]
    FutureMarket,
    #[serde(rename = "BID_2004")]
    InvalidBid,

    // Engine errors (3xxx)
    #[serde(rename = "ENG_3001")]
    QueueOverflow,
}

impl ErrorCode {
    /// Get numeric code
    pub fn code(&self) -> u16 {
        match self {
            // Configuration
            ErrorCode::InvalidPriceCap => 1001,
            ErrorCode::InvalidPeriod => 1002,
            ErrorCode::InvalidLatency => 1003,
            ErrorCode::InvalidFixedQuantity => 1004,
            ErrorCode::InvalidStatistic => 1005,
            ErrorCode::InvalidInitialStdev => 1006,
            ErrorCode::ConfigLoadFailed => 1007,

            // Bids
            ErrorCode::DuplicateBid => 2001,
            ErrorCode::StaleMarket => 2002,
            ErrorCode::FutureMarket => 2003,
            ErrorCode::InvalidBid => 2004,

            // Engine
            ErrorCode::QueueOverflow => 3001,
        }
    }

    /// Get human-readable message
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidPriceCap => "Market price cap must be positive",
            ErrorCode::InvalidPeriod => "Market clearing period must be positive",
            ErrorCode::InvalidLatency => "Market latency cannot be negative",
            ErrorCode::InvalidFixedQuantity => {
                "One-sided market cannot use a negative fixed quantity"
            }
            ErrorCode::InvalidStatistic => "Statistic definition is invalid",
            ErrorCode::InvalidInitialStdev => "Initial standard deviation cannot be negative",
            ErrorCode::ConfigLoadFailed => "Market configuration could not be loaded",

            ErrorCode::DuplicateBid => "A bid with this id already exists in the open market",
            ErrorCode::StaleMarket => "Bid targets a market that has already cleared",
            ErrorCode::FutureMarket => "Bidding into future markets is not supported",
            ErrorCode::InvalidBid => "Bid price or quantity is invalid",

            ErrorCode::QueueOverflow => {
                "Latency queue is full; latency is undersized relative to the period"
            }
        }
    }

    /// Whether the error must stop the market
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ErrorCode::DuplicateBid
                | ErrorCode::StaleMarket
                | ErrorCode::FutureMarket
                | ErrorCode::InvalidBid
        )
    }
}

/// Errors raised while validating a market configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("price_cap must be > 0, got {0}")]
    NonPositivePriceCap(f64),

    #[error("period must be > 0, got {0}")]
    NonPositivePeriod(i64),

    #[error("latency cannot be negative, got {0}")]
    NegativeLatency(i64),

    #[error("one-sided market is using a negative fixed quantity ({0})")]
    NegativeFixedQuantity(f64),

    #[error("statistic '{name}' has a non-positive interval ({interval})")]
    NonPositiveStatisticInterval { name: String, interval: i64 },

    #[error("init_stdev cannot be negative, got {0}")]
    NegativeInitialStdev(f64),

    #[error("failed to load market configuration: {0}")]
    Load(String),
}

impl ConfigError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::NonPositivePriceCap(_) => ErrorCode::InvalidPriceCap,
            ConfigError::NonPositivePeriod(_) => ErrorCode::InvalidPeriod,
            ConfigError::NegativeLatency(_) => ErrorCode::InvalidLatency,
            ConfigError::NegativeFixedQuantity(_) => ErrorCode::InvalidFixedQuantity,
            ConfigError::NonPositiveStatisticInterval { .. } => ErrorCode::InvalidStatistic,
            ConfigError::NegativeInitialStdev(_) => ErrorCode::InvalidInitialStdev,
            ConfigError::Load(_) => ErrorCode::ConfigLoadFailed,
        }
    }
}

impl From<::config::ConfigError> for ConfigError {
    fn from(err: ::config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}

/// Errors returned to a bidder; the market keeps running
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BidError {
    #[error("bid '{bid_id}' already submitted to market {market_id}; set rebid to replace it")]
    DuplicateBid { bid_id: String, market_id: u64 },

    #[error("bid '{bid_id}' targets market {bid_market_id}, which cleared before open market {open_market_id}")]
    StaleMarket {
        bid_id: String,
        bid_market_id: u64,
        open_market_id: u64,
    },

    #[error("bid '{bid_id}' targets future market {bid_market_id}; open market is {open_market_id}")]
    FutureMarket {
        bid_id: String,
        bid_market_id: u64,
        open_market_id: u64,
    },

    #[error("bid '{bid_id}' is invalid: {reason}")]
    InvalidBid { bid_id: String, reason: String },
}

impl BidError {
    pub fn code(&self) -> ErrorCode {
        match self {
            BidError::DuplicateBid { .. } => ErrorCode::DuplicateBid,
            BidError::StaleMarket { .. } => ErrorCode::StaleMarket,
            BidError::FutureMarket { .. } => ErrorCode::FutureMarket,
            BidError::InvalidBid { .. } => ErrorCode::InvalidBid,
        }
    }

    /// Short label used as a metrics dimension
    pub fn reason(&self) -> &'static str {
        match self {
            BidError::DuplicateBid { .. } => "duplicate",
            BidError::StaleMarket { .. } => "stale_market",
            BidError::FutureMarket { .. } => "future_market",
            BidError::InvalidBid { .. } => "invalid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuctionError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Bid rejected: {0}")]
    Bid(#[from] BidError),

    #[error("Latency queue overflow: all {capacity} slots hold unpublished frames")]
    QueueOverflow { capacity: usize },
}

impl AuctionError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AuctionError::Config(err) => err.code(),
            AuctionError::Bid(err) => err.code(),
            AuctionError::QueueOverflow { .. } => ErrorCode::QueueOverflow,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.code().is_fatal()
    }
}
