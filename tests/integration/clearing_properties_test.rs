// Property tests for the clearing algorithm over random bid sets

use grid_auction::config::{MarketConfig, SpecialMode};
use grid_auction::models::{Bid, BidState, Side};
use grid_auction::services::market_clearing::{aggregator, marginal, matching};
use proptest::prelude::*;

const PRICE_CAP: f64 = 500.0;

fn arb_state() -> impl Strategy<Value = BidState> {
    prop_oneof![Just(BidState::On), Just(BidState::Off), Just(BidState::Unknown)]
}

fn arb_price() -> impl Strategy<Value = f64> {
    prop_oneof![
        4 => (-20i32..=80).prop_map(|p| p as f64 * 0.5),
        1 => Just(PRICE_CAP),
        1 => Just(-PRICE_CAP),
        1 => -1000.0f64..1000.0,
    ]
}

fn arb_bid(side: Side) -> impl Strategy<Value = Bid> {
    (arb_price(), 0u32..200, arb_state(), 0u32..10_000).prop_map(
        move |(price, quantity, state, id)| {
            Bid::new(side, format!("p{}", id), price, quantity as f64 * 0.25, state)
        },
    )
}

fn arb_bids() -> impl Strategy<Value = Vec<Bid>> {
    (
        prop::collection::vec(arb_bid(Side::Buy), 0..12),
        prop::collection::vec(arb_bid(Side::Sell), 0..12),
    )
        .prop_map(|(mut buys, sells)| {
            buys.extend(sells);
            buys
        })
}

fn arb_mode() -> impl Strategy<Value = (SpecialMode, f64, f64)> {
    prop_oneof![
        Just((SpecialMode::None, 0.0, 0.0)),
        (1u32..60).prop_map(|p| (SpecialMode::SellersOnly, p as f64, 0.0)),
        (1u32..60).prop_map(|q| (SpecialMode::BuyersOnly, 0.0, q as f64)),
        (1u32..60).prop_map(|p| (SpecialMode::FixedSeller, p as f64, 0.0)),
        (1u32..60).prop_map(|q| (SpecialMode::FixedBuyer, 0.0, q as f64)),
    ]
}

proptest! {
    #[test]
    fn clearing_price_stays_within_cap(
        bids in arb_bids(),
        (special_mode, fixed_price, fixed_quantity) in arb_mode(),
        reference in prop::option::of((-600.0f64..600.0, 0.0f64..100.0)),
    ) {
        let config = MarketConfig {
            price_cap: PRICE_CAP,
            special_mode,
            fixed_price,
            fixed_quantity,
            ..Default::default()
        };
        let reference = reference.map(|(price, quantity)| aggregator::CapacityReference { price, quantity });

        let curves = aggregator::aggregate(&config, &bids, reference);
        let outcome = matching::clear_curves(&curves.buyers, &curves.sellers, &config);

        prop_assert!(outcome.price >= -PRICE_CAP && outcome.price <= PRICE_CAP);
        prop_assert!(outcome.quantity >= 0.0);

        let allocation = marginal::prorate(&outcome, &curves.buyers, &curves.sellers);
        prop_assert!((0.0..=1.0).contains(&allocation.fraction));
    }

    #[test]
    fn two_sided_quantity_never_exceeds_either_curve(bids in arb_bids()) {
        let config = MarketConfig {
            price_cap: PRICE_CAP,
            ..Default::default()
        };
        let curves = aggregator::aggregate(&config, &bids, None);
        let outcome = matching::clear_curves(&curves.buyers, &curves.sellers, &config);

        prop_assert!(outcome.quantity <= curves.buyers.total() + 1e-9);
        prop_assert!(outcome.quantity <= curves.sellers.total() + 1e-9);
    }

    #[test]
    fn curve_state_tally_partitions_total(bids in arb_bids()) {
        let config = MarketConfig {
            price_cap: PRICE_CAP,
            ..Default::default()
        };
        let curves = aggregator::aggregate(&config, &bids, None);

        for curve in [&curves.buyers, &curves.sellers] {
            let parts = curve.total_on() + curve.total_off() + curve.total_unknown();
            prop_assert!((curve.total() - parts).abs() < 1e-6);
            prop_assert!(curve.entries().iter().all(|e| e.quantity > 0.0));
        }
    }
}
