use serde::{Deserialize, Serialize};
use tracing::debug;

use super::curve::Curve;

/// Welfare split of one clearing cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SurplusSummary {
    pub consumer_surplus: f64,
    /// Consumer surplus per responsive buyer at or above the clearing price
    pub average_consumer_surplus: f64,
    pub supplier_surplus: f64,
    /// Supplier surplus earned serving price-capped (unresponsive) buyers
    pub unresponsive_supplier_surplus: f64,
}

/// Compute surplus at `price`. Sellers serve capped buyers first, then responsive ones.
pub fn calculate(buyers: &Curve, sellers: &Curve, price: f64, price_cap: f64) -> SurplusSummary {
    let mut summary = SurplusSummary::default();
    let mut granted_unresponsive = 0.0;
    let mut granted_responsive = 0.0;
    let mut responsive_buyers = 0usize;

    for entry in buyers.entries().iter().filter(|e| e.price >= price) {
        if entry.price == price_cap {
            granted_unresponsive += entry.quantity;
        } else {
            granted_responsive += entry.quantity;
            responsive_buyers += 1;
            summary.consumer_surplus += (entry.price - price) * entry.quantity;
        }
    }
    if responsive_buyers > 0 {
        summary.average_consumer_surplus = summary.consumer_surplus / responsive_buyers as f64;
    }

    for entry in sellers.entries().iter().take_while(|e| e.price <= price) {
        let margin = price - entry.price;
        let mut available = entry.quantity;

        let to_unresponsive = available.min(granted_unresponsive);
        summary.unresponsive_supplier_surplus += margin * to_unresponsive;
        granted_unresponsive -= to_unresponsive;
        available -= to_unresponsive;

        let to_responsive = available.min(granted_responsive);
        summary.supplier_surplus += margin * to_responsive;
        granted_responsive -= to_responsive;

        if granted_unresponsive == 0.0 && granted_responsive == 0.0 {
            break;
        }
    }

    if granted_responsive > 0.0 {
        debug!(
            "Responsive demand of {:.4} above the clearing price was not covered by sellers",
            granted_responsive
        );
    }

    summary
}
