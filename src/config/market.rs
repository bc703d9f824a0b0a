use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::constants::{defaults, latency, statistics};
use crate::error::ConfigError;

/// How the auction treats the two sides of the market
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialMode {
    /// Regular two-sided double auction
    #[default]
    #[serde(alias = "MD_NONE")]
    None,
    /// Only sellers bid; demand is fixed by fixed_price or fixed_quantity
    #[serde(alias = "MD_SELLERS")]
    SellersOnly,
    /// Only buyers bid; supply is fixed by fixed_price or fixed_quantity
    #[serde(alias = "MD_BUYERS")]
    BuyersOnly,
    /// Sellers bid against a fixed buyer side
    #[serde(alias = "MD_FIXED_SELLER")]
    FixedSeller,
    /// Buyers bid against a fixed seller side
    #[serde(alias = "MD_FIXED_BUYER")]
    FixedBuyer,
}

impl SpecialMode {
    /// True for every mode that clears one curve against fixed_price / fixed_quantity
    pub fn is_one_sided(&self) -> bool {
        !matches!(self, SpecialMode::None)
    }
}

/// Which sample a statistic window ends on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatMode {
    /// Window ends on the price cleared this cycle
    #[default]
    #[serde(alias = "ST_CURR")]
    Current,
    /// Window ends on the price cleared the cycle before
    #[serde(alias = "ST_PAST")]
    Past,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatType {
    #[serde(alias = "SY_MEAN")]
    Mean,
    #[serde(alias = "SY_STDEV")]
    StdDev,
}

/// A rolling price statistic published to bidders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticDefinition {
    pub name: String,
    #[serde(default)]
    pub mode: StatMode,
    pub stat_type: StatType,
    /// Sampling window in seconds; rounded down to a multiple of the period
    pub interval: i64,
}

/// Backstop offer from the bulk system (e.g. a wholesale LMP signal)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityReferenceConfig {
    pub name: String,
    /// Positive: offer to sell this much at the reference price.
    /// Negative: bid to buy |quantity| at the reference price. Zero: no offer.
    #[serde(default)]
    pub max_bid_quantity: f64,
}

/// Immutable per-market configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub name: String,
    pub price_cap: f64,
    /// Clearing period in seconds
    pub period: i64,
    /// Delay between clearing and publication, in seconds
    pub latency: i64,
    pub special_mode: SpecialMode,
    pub fixed_price: f64,
    pub fixed_quantity: f64,
    /// Interpolation factor between best seller and best buyer when curves never cross
    pub clearing_scalar: f64,
    pub init_price: f64,
    pub init_stdev: f64,
    pub ignore_pricecap: bool,
    pub ignore_failedmarket: bool,
    /// Overrides every computed mean when set
    pub future_mean_price: Option<f64>,
    pub capacity_reference: Option<CapacityReferenceConfig>,
    pub statistics: Vec<StatisticDefinition>,
    pub initial_market_id: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            name: "market".to_string(),
            price_cap: defaults::PRICE_CAP,
            period: defaults::PERIOD_SECS,
            latency: 0,
            special_mode: SpecialMode::None,
            fixed_price: 0.0,
            fixed_quantity: 0.0,
            clearing_scalar: defaults::CLEARING_SCALAR,
            init_price: 0.0,
            init_stdev: 0.0,
            ignore_pricecap: false,
            ignore_failedmarket: false,
            future_mean_price: None,
            capacity_reference: None,
            statistics: Vec::new(),
            initial_market_id: defaults::INITIAL_MARKET_ID,
        }
    }
}

impl MarketConfig {
    /// Load a market configuration from a file, with `AUCTION_*` environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .add_source(
                ::config::Environment::with_prefix("AUCTION")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut market: MarketConfig = settings.try_deserialize()?;
        market.validate()?;
        info!(
            "Loaded market configuration '{}' from {}",
            market.name,
            path.display()
        );
        Ok(market)
    }

    /// Check fatal errors and normalise recoverable ones in place
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.price_cap.is_nan() || self.price_cap <= 0.0 {
            return Err(ConfigError::NonPositivePriceCap(self.price_cap));
        }
        if self.period <= 0 {
            return Err(ConfigError::NonPositivePeriod(self.period));
        }
        if self.latency < 0 {
            return Err(ConfigError::NegativeLatency(self.latency));
        }
        if self.init_stdev < 0.0 {
            return Err(ConfigError::NegativeInitialStdev(self.init_stdev));
        }

        if self.special_mode.is_one_sided() {
            if self.fixed_quantity < 0.0 {
                return Err(ConfigError::NegativeFixedQuantity(self.fixed_quantity));
            }
            if self.fixed_price != 0.0 && self.fixed_quantity != 0.0 {
                warn!(
                    "Market {}: fixed_price and fixed_quantity are both set, only fixed_price will be used",
                    self.name
                );
            }
            if self.fixed_price == 0.0 && self.fixed_quantity == 0.0 {
                warn!(
                    "Market {}: {:?} mode has neither fixed_price nor fixed_quantity, every cycle will clear Null",
                    self.name, self.special_mode
                );
            }
        }

        if !(self.clearing_scalar > 0.0 && self.clearing_scalar < 1.0) {
            warn!(
                "Market {}: clearing_scalar {} outside (0, 1), using {}",
                self.name,
                self.clearing_scalar,
                defaults::CLEARING_SCALAR
            );
            self.clearing_scalar = defaults::CLEARING_SCALAR;
        }

        for stat in &mut self.statistics {
            if stat.interval <= 0 {
                return Err(ConfigError::NonPositiveStatisticInterval {
                    name: stat.name.clone(),
                    interval: stat.interval,
                });
            }
            if stat.interval < self.period {
                warn!(
                    "Statistic {} samples faster than the market clears and will be filled with immediate data",
                    stat.name
                );
            }
            let remainder = stat.interval % self.period;
            if remainder != 0 {
                let rounded = (stat.interval - remainder).max(self.period);
                warn!(
                    "Statistic {} interval {}s is not a multiple of the {}s period, rounding to {}s",
                    stat.name, stat.interval, self.period, rounded
                );
                stat.interval = rounded;
            }
        }

        Ok(())
    }

    /// Number of clearing periods a statistic window spans
    pub fn statistic_window(&self, stat: &StatisticDefinition) -> usize {
        (stat.interval / self.period).max(1) as usize
    }

    /// Latency queue capacity: ceil(latency / period) + 2
    pub fn latency_slots(&self) -> usize {
        ceil_div(self.latency, self.period) + latency::EXTRA_SLOTS
    }

    /// Statistic history capacity: ceil(longest interval / period) + 2, or 1 without statistics
    pub fn history_slots(&self) -> usize {
        match self.statistics.iter().map(|s| s.interval).max() {
            Some(longest) if longest > 0 => {
                ceil_div(longest, self.period) + statistics::EXTRA_SLOTS
            }
            _ => 1,
        }
    }
}

fn ceil_div(numerator: i64, denominator: i64) -> usize {
    if numerator <= 0 {
        return 0;
    }
    ((numerator + denominator - 1) / denominator) as usize
}
