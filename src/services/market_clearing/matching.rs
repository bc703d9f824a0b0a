use super::curve::Curve;
use super::types::{ClearingOutcome, ClearingType};
use crate::config::{MarketConfig, SpecialMode};
use crate::constants::clearing::BID_OFFSET;
use crate::models::Side;

/// Clear the buyer curve against the seller curve under the market's mode.
///
/// The returned price is always inside `[-price_cap, price_cap]`.
pub fn clear_curves(buyers: &Curve, sellers: &Curve, config: &MarketConfig) -> ClearingOutcome {
    let mut outcome = match config.special_mode {
        SpecialMode::SellersOnly | SpecialMode::FixedSeller => clear_one_sided(sellers, config),
        SpecialMode::BuyersOnly | SpecialMode::FixedBuyer => clear_one_sided(buyers, config),
        SpecialMode::None => clear_two_sided(buyers, sellers, config),
    };

    outcome.price = outcome.price.clamp(-config.price_cap, config.price_cap);
    outcome
}

/// Walk a single curve against the configured fixed price or fixed quantity
fn clear_one_sided(curve: &Curve, config: &MarketConfig) -> ClearingOutcome {
    let side = curve.side();
    let reaches = |price: f64, limit: f64| match side {
        Side::Sell => price <= limit,
        Side::Buy => price >= limit,
    };
    let unmatched_price = match curve.best_price() {
        Some(best) => offset_away(best, side),
        None => 0.0,
    };

    if config.fixed_price != 0.0 {
        let quantity: f64 = curve
            .entries()
            .iter()
            .take_while(|e| reaches(e.price, config.fixed_price))
            .map(|e| e.quantity)
            .sum();

        return if quantity > 0.0 {
            ClearingOutcome::new(config.fixed_price, quantity, ClearingType::Exact)
        } else {
            ClearingOutcome::new(unmatched_price, 0.0, ClearingType::Null)
        };
    }

    if config.fixed_quantity > 0.0 {
        let target = config.fixed_quantity;
        let mut cleared = 0.0;
        for entry in curve.entries() {
            cleared += entry.quantity;
            if cleared > target {
                let bound = match side {
                    Side::Sell => ClearingType::SellerBound,
                    Side::Buy => ClearingType::BuyerBound,
                };
                return ClearingOutcome::new(entry.price, target, bound).with_marginal_side(side);
            }
            if cleared == target {
                return ClearingOutcome::new(entry.price, target, ClearingType::Exact);
            }
        }
        return ClearingOutcome::new(unmatched_price, 0.0, ClearingType::Failure);
    }

    ClearingOutcome::new(unmatched_price, 0.0, ClearingType::Null)
}

/// Price just outside a side's best bid, so publishing it does not trigger that bid
fn offset_away(price: f64, side: Side) -> f64 {
    match side {
        Side::Sell => price - BID_OFFSET,
        Side::Buy => price + BID_OFFSET,
    }
}

/// State left behind by the two-curve walk
struct Walk {
    /// Next unconsumed buyer / seller index
    i: usize,
    j: usize,
    clear_quantity: f64,
    a: f64,
    b: f64,
    check: bool,
    last_bound: Option<(ClearingType, Side)>,
}

fn walk_curves(buyers: &Curve, sellers: &Curve, cap: f64) -> Walk {
    let mut walk = Walk {
        i: 0,
        j: 0,
        clear_quantity: 0.0,
        a: cap,
        b: -cap,
        check: false,
        last_bound: None,
    };
    let mut demand = 0.0;
    let mut supply = 0.0;

    while walk.i < buyers.len()
        && walk.j < sellers.len()
        && buyers.price(walk.i) >= sellers.price(walk.j)
    {
        let buy_quantity = demand + buyers.quantity(walk.i);
        let sell_quantity = supply + sellers.quantity(walk.j);

        if buy_quantity > sell_quantity {
            // seller used up; the buyer still standing sets the price
            supply = sell_quantity;
            walk.clear_quantity = sell_quantity;
            walk.a = buyers.price(walk.i);
            walk.b = walk.a;
            walk.j += 1;
            walk.check = false;
            walk.last_bound = Some((ClearingType::SellerBound, Side::Buy));
        } else if buy_quantity < sell_quantity {
            demand = buy_quantity;
            walk.clear_quantity = buy_quantity;
            walk.a = sellers.price(walk.j);
            walk.b = walk.a;
            walk.i += 1;
            walk.check = false;
            walk.last_bound = Some((ClearingType::BuyerBound, Side::Sell));
        } else {
            demand = buy_quantity;
            supply = sell_quantity;
            walk.clear_quantity = buy_quantity;
            walk.a = buyers.price(walk.i);
            walk.b = sellers.price(walk.j);
            walk.i += 1;
            walk.j += 1;
            walk.check = true;
        }
    }

    walk
}

fn clear_two_sided(buyers: &Curve, sellers: &Curve, config: &MarketConfig) -> ClearingOutcome {
    let cap = config.price_cap;
    let walk = walk_curves(buyers, sellers, cap);

    if walk.clear_quantity == 0.0 {
        return uncrossed(buyers, sellers, config);
    }

    let outcome = classify(&walk, buyers, sellers, cap);

    let unresponsive_buy = buyers.quantity_at(cap);
    let unresponsive_sell = sellers.quantity_at(-cap);
    let quantity = walk.clear_quantity;

    if quantity < unresponsive_buy {
        ClearingOutcome::new(cap, quantity, ClearingType::Failure)
    } else if quantity < unresponsive_sell {
        ClearingOutcome::new(-cap, quantity, ClearingType::Failure)
    } else if quantity == unresponsive_buy && quantity == unresponsive_sell {
        ClearingOutcome::new(0.0, quantity, ClearingType::PriceSplit)
    } else {
        outcome
    }
}

/// Nothing cleared: publish a price that sits just outside whatever was bid
fn uncrossed(buyers: &Curve, sellers: &Curve, config: &MarketConfig) -> ClearingOutcome {
    let cap = config.price_cap;
    let price = match (buyers.best_price(), sellers.best_price()) {
        (None, None) => 0.0,
        (Some(buy), None) => buy + BID_OFFSET,
        (None, Some(sell)) => sell - BID_OFFSET,
        (Some(buy), Some(sell)) => {
            if sell == cap {
                buy + BID_OFFSET
            } else if sell == -cap {
                sell - BID_OFFSET
            } else {
                sell + (buy - sell) * config.clearing_scalar
            }
        }
    };
    ClearingOutcome::new(price, 0.0, ClearingType::Null)
}

fn classify(walk: &Walk, buyers: &Curve, sellers: &Curve, cap: f64) -> ClearingOutcome {
    let quantity = walk.clear_quantity;

    if !walk.check {
        return match walk.last_bound {
            Some((clearing_type, side)) => {
                ClearingOutcome::new(walk.a, quantity, clearing_type).with_marginal_side(side)
            }
            None => ClearingOutcome::new(walk.a, quantity, ClearingType::Exact),
        };
    }

    let (a, b) = (walk.a, walk.b);
    let next_buy = (walk.i < buyers.len()).then(|| buyers.price(walk.i));
    let next_sell = (walk.j < sellers.len()).then(|| sellers.price(walk.j));

    let settle = || {
        if a == b {
            ClearingOutcome::new(a, quantity, ClearingType::Exact)
        } else {
            let price = split_price(a, b, next_buy, next_sell, cap);
            ClearingOutcome::new(price, quantity, ClearingType::PriceSplit)
        }
    };
    let seller_bound = || {
        ClearingOutcome::new(b, quantity, ClearingType::SellerBound).with_marginal_side(Side::Sell)
    };
    let buyer_bound = || {
        ClearingOutcome::new(a, quantity, ClearingType::BuyerBound).with_marginal_side(Side::Buy)
    };

    match (next_buy, next_sell) {
        (None, None) => settle(),
        (None, Some(sell)) => {
            if b == sell {
                seller_bound()
            } else {
                settle()
            }
        }
        (Some(buy), None) => {
            if a == buy {
                buyer_bound()
            } else {
                settle()
            }
        }
        (Some(buy), Some(sell)) => match (a == buy, b == sell) {
            (true, false) => buyer_bound(),
            (false, true) => seller_bound(),
            _ => settle(),
        },
    }
}

/// Resolve the price when the last accepted buyer and seller prices differ
fn split_price(a: f64, b: f64, next_buy: Option<f64>, next_sell: Option<f64>, cap: f64) -> f64 {
    let avg = (a + b) / 2.0;
    let d_high = next_buy.unwrap_or(a);
    let d_low = next_sell.unwrap_or(b);

    if a == cap && b != -cap {
        if d_high > b {
            d_high + BID_OFFSET
        } else {
            b
        }
    } else if b == -cap && a != cap {
        if d_low < a {
            d_low - BID_OFFSET
        } else {
            a
        }
    } else if a == cap && b == -cap {
        match (next_buy, next_sell) {
            (None, None) => 0.0,
            (Some(buy), None) => buy + BID_OFFSET,
            (None, Some(sell)) => sell - BID_OFFSET,
            (Some(buy), Some(sell)) => (buy + sell) / 2.0,
        }
    } else if next_buy == Some(a) {
        a
    } else if next_sell == Some(b) {
        b
    } else if next_buy.is_some_and(|buy| avg < buy) {
        d_high + BID_OFFSET
    } else if next_sell.is_some_and(|sell| avg > sell) {
        d_low - BID_OFFSET
    } else {
        avg
    }
}
