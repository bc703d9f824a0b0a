use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::curve::Curve;
use crate::config::{MarketConfig, SpecialMode};
use crate::constants::clearing::QUANTITY_TOLERANCE;
use crate::models::{Bid, BidState, Side};

/// Latest price and total load reported by the bulk system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacityReference {
    pub price: f64,
    pub quantity: f64,
}

/// Buyer and seller curves ready for clearing
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedCurves {
    pub buyers: Curve,
    pub sellers: Curve,
    /// Must-serve load inferred from the capacity reference (0 when none was added)
    pub unresponsive_quantity: f64,
}

/// Collect the cycle's bids into curves, adding the capacity-reference backstop
/// offer and the inferred unresponsive load bid where configured.
///
/// The unresponsive load bid is synthesized in every mode but FixedBuyer. In
/// SellersOnly and FixedSeller the buyer curve never clears, so the bid only
/// feeds the frame's `buyer_unresponsive_total` and
/// `capacity_reference_unresponsive` reporting.
pub fn aggregate(
    config: &MarketConfig,
    bids: &[Bid],
    reference: Option<CapacityReference>,
) -> AggregatedCurves {
    let cap = config.price_cap;
    let mut buyers = Curve::new(Side::Buy);
    let mut sellers = Curve::new(Side::Sell);
    let mut ignored = 0usize;

    for bid in bids {
        let ignore = match config.special_mode {
            SpecialMode::SellersOnly | SpecialMode::FixedSeller => bid.side == Side::Buy,
            SpecialMode::BuyersOnly | SpecialMode::FixedBuyer => bid.side == Side::Sell,
            SpecialMode::None => false,
        };
        if ignore {
            ignored += 1;
            continue;
        }

        let price = bid.price.clamp(-cap, cap);
        let curve = match bid.side {
            Side::Buy => &mut buyers,
            Side::Sell => &mut sellers,
        };
        curve.add_bid(price, bid.quantity, bid.participant_id.clone(), bid.state);
    }

    if ignored > 0 {
        match config.special_mode {
            SpecialMode::FixedSeller | SpecialMode::FixedBuyer => warn!(
                "Market {}: ignored {} bids from the fixed side in {:?} mode",
                config.name, ignored, config.special_mode
            ),
            _ => debug!(
                "Market {}: ignored {} opposite-side bids in {:?} mode",
                config.name, ignored, config.special_mode
            ),
        }
    }

    let mut unresponsive_quantity = 0.0;

    if let Some(reference) = reference {
        if config.special_mode == SpecialMode::None {
            add_backstop_offer(config, reference, &mut buyers, &mut sellers);
        }

        if config.special_mode != SpecialMode::FixedBuyer {
            unresponsive_quantity = add_unresponsive_load(config, reference, &mut buyers);
        }
    }

    AggregatedCurves {
        buyers,
        sellers,
        unresponsive_quantity,
    }
}

fn add_backstop_offer(
    config: &MarketConfig,
    reference: CapacityReference,
    buyers: &mut Curve,
    sellers: &mut Curve,
) {
    let Some(backstop) = &config.capacity_reference else {
        return;
    };
    let price = reference.price.clamp(-config.price_cap, config.price_cap);

    if backstop.max_bid_quantity > 0.0 {
        sellers.add_bid(price, backstop.max_bid_quantity, backstop.name.clone(), BidState::On);
    } else if backstop.max_bid_quantity < 0.0 {
        buyers.add_bid(price, -backstop.max_bid_quantity, backstop.name.clone(), BidState::On);
    }
}

/// Infer load that did not bid and add it as a buy bid at the price cap
fn add_unresponsive_load(
    config: &MarketConfig,
    reference: CapacityReference,
    buyers: &mut Curve,
) -> f64 {
    let unresponsive = reference.quantity - buyers.total_on() - buyers.total_unknown() / 2.0;

    if buyers.total_unknown() > QUANTITY_TOLERANCE {
        warn!(
            "Market {}: {:.3} of buyer quantity has an unknown state, assuming half is on",
            config.name,
            buyers.total_unknown()
        );
    }

    if unresponsive < -QUANTITY_TOLERANCE {
        warn!(
            "Market {}: capacity reference load {:.3} is below the responsive load already bid ({:.3} on, {:.3} unknown)",
            config.name,
            reference.quantity,
            buyers.total_on(),
            buyers.total_unknown()
        );
        return 0.0;
    }

    if unresponsive > QUANTITY_TOLERANCE {
        let name = config
            .capacity_reference
            .as_ref()
            .map(|c| format!("{}_unresponsive", c.name))
            .unwrap_or_else(|| "unresponsive".to_string());
        buyers.add_bid(config.price_cap, unresponsive, name, BidState::On);
        return unresponsive;
    }

    0.0
}
