use super::curve::Curve;
use super::types::{ClearingOutcome, MarginalAllocation};
use crate::models::Side;

/// Share of the bids at the clearing price that actually clears.
///
/// Only bound outcomes have a marginal bidder; everything else reports zeros.
pub fn prorate(outcome: &ClearingOutcome, buyers: &Curve, sellers: &Curve) -> MarginalAllocation {
    if !outcome.clearing_type.is_bound() {
        return MarginalAllocation::default();
    }
    let Some(side) = outcome.marginal_side else {
        return MarginalAllocation::default();
    };

    let curve = match side {
        Side::Buy => buyers,
        Side::Sell => sellers,
    };
    let price = outcome.price;
    let better = |p: f64| match side {
        Side::Buy => p > price,
        Side::Sell => p < price,
    };

    let subtotal: f64 = curve
        .entries()
        .iter()
        .take_while(|e| better(e.price))
        .map(|e| e.quantity)
        .sum();
    let total: f64 = curve
        .entries()
        .iter()
        .skip_while(|e| better(e.price))
        .take_while(|e| e.price == price)
        .map(|e| e.quantity)
        .sum();

    let quantity = outcome.quantity - subtotal;
    let fraction = if total > 0.0 {
        (quantity / total).clamp(0.0, 1.0)
    } else {
        0.0
    };

    MarginalAllocation {
        quantity,
        total,
        fraction,
    }
}
