use serde::{Deserialize, Serialize};

use crate::error::BidError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

/// Reported on/off state of the device behind a bid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BidState {
    On,
    Off,
    #[default]
    Unknown,
}

/// A bid accepted into the open market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub side: Side,
    pub participant_id: String,
    pub price: f64,
    pub quantity: f64,
    pub state: BidState,
    pub bid_id: String,
}

impl Bid {
    pub fn new(
        side: Side,
        participant_id: impl Into<String>,
        price: f64,
        quantity: f64,
        state: BidState,
    ) -> Self {
        let participant_id = participant_id.into();
        Self {
            side,
            bid_id: participant_id.clone(),
            participant_id,
            price,
            quantity,
            state,
        }
    }
}

/// A bid as sent by an external agent, tagged with the market it targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidSubmission {
    pub side: Side,
    pub participant_id: String,
    pub price: f64,
    pub quantity: f64,
    #[serde(default)]
    pub state: BidState,
    pub bid_id: String,
    pub market_id: u64,
    /// Replace an earlier bid with the same bid_id instead of rejecting
    #[serde(default)]
    pub rebid: bool,
}

impl BidSubmission {
    /// Reject non-finite prices and negative or non-finite quantities
    pub fn validate(&self) -> Result<(), BidError> {
        let reason = if !self.price.is_finite() {
            Some(format!("price {} is not finite", self.price))
        } else if !self.quantity.is_finite() {
            Some(format!("quantity {} is not finite", self.quantity))
        } else if self.quantity < 0.0 {
            Some(format!("quantity {} is negative", self.quantity))
        } else {
            None
        };

        match reason {
            Some(reason) => Err(BidError::InvalidBid {
                bid_id: self.bid_id.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }

    pub fn into_bid(self) -> Bid {
        Bid {
            side: self.side,
            participant_id: self.participant_id,
            price: self.price,
            quantity: self.quantity,
            state: self.state,
            bid_id: self.bid_id,
        }
    }
}
