//! Engine constants and configuration defaults.
//!
//! This module centralizes hardcoded values and magic numbers
//! so tie-break offsets and defaults live in one place.

/// Clearing algorithm constants
pub mod clearing {
    /// Offset applied to a bid price so the published price does not trigger that bid
    pub const BID_OFFSET: f64 = 0.0001;

    /// Inferred quantities closer to zero than this are treated as zero
    pub const QUANTITY_TOLERANCE: f64 = 0.001;
}

/// Market configuration defaults
pub mod defaults {
    /// Default price cap ($/MWh style units, whatever the bidders use)
    pub const PRICE_CAP: f64 = 9999.0;

    /// Default clearing period in seconds
    pub const PERIOD_SECS: i64 = 300;

    /// Default interpolation factor for uncrossed curves
    pub const CLEARING_SCALAR: f64 = 0.5;

    /// First market id handed to bidders
    pub const INITIAL_MARKET_ID: u64 = 1;
}

/// Latency queue sizing
pub mod latency {
    /// Slots added on top of ceil(latency / period)
    pub const EXTRA_SLOTS: usize = 2;
}

/// Statistic history sizing
pub mod statistics {
    /// Slots added on top of ceil(longest_interval / period)
    pub const EXTRA_SLOTS: usize = 2;
}
