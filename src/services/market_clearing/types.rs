use serde::{Deserialize, Serialize};

use super::surplus::SurplusSummary;
use crate::models::Side;

/// Simulated time in seconds
pub type SimTime = i64;

/// How a clearing cycle resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearingType {
    /// Nothing cleared
    Null,
    /// Mandatory (price-capped) quantity could not be served
    Failure,
    /// Price lies between the last accepted buyer and seller
    PriceSplit,
    Exact,
    /// A seller's quantity bound the trade
    SellerBound,
    /// A buyer's quantity bound the trade
    BuyerBound,
}

impl ClearingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClearingType::Null => "null",
            ClearingType::Failure => "failure",
            ClearingType::PriceSplit => "price_split",
            ClearingType::Exact => "exact",
            ClearingType::SellerBound => "seller_bound",
            ClearingType::BuyerBound => "buyer_bound",
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, ClearingType::SellerBound | ClearingType::BuyerBound)
    }
}

/// Raw result of walking the two curves
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearingOutcome {
    pub price: f64,
    pub quantity: f64,
    pub clearing_type: ClearingType,
    /// Side whose bid sets the price on a bound outcome
    pub marginal_side: Option<Side>,
}

impl ClearingOutcome {
    pub fn new(price: f64, quantity: f64, clearing_type: ClearingType) -> Self {
        Self {
            price,
            quantity,
            clearing_type,
            marginal_side: None,
        }
    }

    pub fn with_marginal_side(mut self, side: Side) -> Self {
        self.marginal_side = Some(side);
        self
    }
}

/// Partial acceptance of the bids sitting exactly at the clearing price
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarginalAllocation {
    pub quantity: f64,
    pub total: f64,
    pub fraction: f64,
}

/// Result of one clearing cycle, immutable once built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearedFrame {
    pub market_id: u64,
    pub start_time: SimTime,
    pub end_time: SimTime,
    pub clearing_price: f64,
    pub clearing_quantity: f64,
    pub clearing_type: ClearingType,
    pub marginal_quantity: f64,
    pub marginal_total: f64,
    pub marginal_frac: f64,
    pub buyer_count: usize,
    pub seller_count: usize,
    pub seller_min_price: f64,
    pub buyer_unresponsive_total: f64,
    pub capacity_reference_unresponsive: f64,
    /// Statistic values in configuration order, captured when the frame cleared
    pub statistics: Vec<f64>,
    pub surplus: SurplusSummary,
}

impl ClearedFrame {
    /// Placeholder frame published before the first clear
    pub fn initial(init_price: f64, statistics: Vec<f64>) -> Self {
        Self {
            market_id: 0,
            start_time: 0,
            end_time: 0,
            clearing_price: init_price,
            clearing_quantity: 0.0,
            clearing_type: ClearingType::Null,
            marginal_quantity: 0.0,
            marginal_total: 0.0,
            marginal_frac: 0.0,
            buyer_count: 0,
            seller_count: 0,
            seller_min_price: 0.0,
            buyer_unresponsive_total: 0.0,
            capacity_reference_unresponsive: 0.0,
            statistics,
            surplus: SurplusSummary::default(),
        }
    }
}

/// Snapshot published to bidding agents after each clear
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketOutput {
    pub clear_price: f64,
    pub mean: f64,
    pub stdev: f64,
    pub market_id: u64,
    pub price_cap: f64,
}
