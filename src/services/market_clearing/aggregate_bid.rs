use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::curve::Curve;

/// Summary of a buyer curve as a fixed block plus a fitted cost polynomial
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateBuyerBid {
    pub unresponsive_price: f64,
    /// Quantity bid at the highest price
    pub unresponsive_quantity: f64,
    pub responsive_max_quantity: f64,
    /// 0 when there are no responsive bids, else 1 or 2
    pub degree: u8,
    pub c2: f64,
    pub c1: f64,
}

/// Fit cumulative responsive cost against cumulative responsive quantity,
/// through the origin: linear for up to two bids, quadratic beyond.
pub fn aggregate_buyer_bid(buyers: &Curve) -> AggregateBuyerBid {
    let Some(top) = buyers.best_price() else {
        return AggregateBuyerBid::default();
    };

    let entries = buyers.entries();
    let split = entries.partition_point(|e| e.price == top);
    let unresponsive_quantity: f64 = entries[..split].iter().map(|e| e.quantity).sum();

    let responsive = &entries[split..];
    let mut bid = AggregateBuyerBid {
        unresponsive_price: top,
        unresponsive_quantity,
        ..Default::default()
    };
    if responsive.is_empty() {
        return bid;
    }

    let mut cumulative_quantity = Vec::with_capacity(responsive.len());
    let mut cumulative_cost = Vec::with_capacity(responsive.len());
    let (mut quantity, mut cost) = (0.0, 0.0);
    for entry in responsive {
        quantity += entry.quantity;
        cost += entry.price * entry.quantity;
        cumulative_quantity.push(quantity);
        cumulative_cost.push(cost);
    }
    bid.responsive_max_quantity = quantity;

    if responsive.len() <= 2 {
        let qq: f64 = cumulative_quantity.iter().map(|q| q * q).sum();
        let qc: f64 = cumulative_quantity
            .iter()
            .zip(&cumulative_cost)
            .map(|(q, c)| q * c)
            .sum();
        bid.degree = 1;
        bid.c1 = if qq > 0.0 { qc / qq } else { 0.0 };
        return bid;
    }

    let n = cumulative_quantity.len();
    let design = DMatrix::from_fn(n, 2, |row, col| match col {
        0 => cumulative_quantity[row] * cumulative_quantity[row],
        _ => cumulative_quantity[row],
    });
    let target = DVector::from_vec(cumulative_cost);

    match design.svd(true, true).solve(&target, 1e-12) {
        Ok(coefficients) => {
            bid.degree = 2;
            bid.c2 = coefficients[0];
            bid.c1 = coefficients[1];
        }
        Err(e) => {
            warn!("Quadratic fit of the buyer curve failed: {}", e);
        }
    }

    bid
}
