use serde::{Deserialize, Serialize};

use crate::models::{Bid, BidState, Side};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveEntry {
    pub price: f64,
    pub quantity: f64,
    pub participant_id: String,
    pub state: BidState,
}

/// Sorted bids for one side of the market.
///
/// Buy curves are ordered by descending price, sell curves by ascending
/// price. Bids at equal prices keep their insertion order. The on/off/unknown
/// tallies always add up to `total`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    side: Side,
    entries: Vec<CurveEntry>,
    total: f64,
    total_on: f64,
    total_off: f64,
    total_unknown: f64,
}

impl Curve {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            entries: Vec::new(),
            total: 0.0,
            total_on: 0.0,
            total_off: 0.0,
            total_unknown: 0.0,
        }
    }

    /// Insert a bid in price order. Zero-quantity bids are skipped and return false.
    pub fn add_bid(
        &mut self,
        price: f64,
        quantity: f64,
        participant_id: impl Into<String>,
        state: BidState,
    ) -> bool {
        if quantity == 0.0 {
            return false;
        }

        let position = match self.side {
            Side::Buy => self.entries.partition_point(|e| e.price >= price),
            Side::Sell => self.entries.partition_point(|e| e.price <= price),
        };
        self.entries.insert(
            position,
            CurveEntry {
                price,
                quantity,
                participant_id: participant_id.into(),
                state,
            },
        );

        self.total += quantity;
        match state {
            BidState::On => self.total_on += quantity,
            BidState::Off => self.total_off += quantity,
            BidState::Unknown => self.total_unknown += quantity,
        }
        true
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CurveEntry] {
        &self.entries
    }

    pub fn price(&self, index: usize) -> f64 {
        self.entries[index].price
    }

    pub fn quantity(&self, index: usize) -> f64 {
        self.entries[index].quantity
    }

    /// Best price on this side, if any bid exists
    pub fn best_price(&self) -> Option<f64> {
        self.entries.first().map(|e| e.price)
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn total_on(&self) -> f64 {
        self.total_on
    }

    pub fn total_off(&self) -> f64 {
        self.total_off
    }

    pub fn total_unknown(&self) -> f64 {
        self.total_unknown
    }

    /// Running quantity sum in curve order
    pub fn cumulative_quantities(&self) -> Vec<f64> {
        self.entries
            .iter()
            .scan(0.0, |acc, e| {
                *acc += e.quantity;
                Some(*acc)
            })
            .collect()
    }

    /// Total quantity bid at exactly `price`
    pub fn quantity_at(&self, price: f64) -> f64 {
        self.entries
            .iter()
            .filter(|e| e.price == price)
            .map(|e| e.quantity)
            .sum()
    }
}

/// Build one side's curve from an unordered bid set
pub fn build_curve<'a, I>(side: Side, bids: I) -> Curve
where
    I: IntoIterator<Item = &'a Bid>,
{
    let mut curve = Curve::new(side);
    for bid in bids.into_iter().filter(|b| b.side == side) {
        curve.add_bid(bid.price, bid.quantity, bid.participant_id.clone(), bid.state);
    }
    curve
}
