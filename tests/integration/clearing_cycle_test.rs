// Clearing Cycle Integration Test
// Drives a Market through complete submit -> clear -> publish cycles:
// 1. Two-sided clearing outcomes and marginal proration
// 2. Capacity reference backstop and unresponsive load
// 3. One-sided modes
// 4. Bid bookkeeping across market ids

use grid_auction::config::{CapacityReferenceConfig, MarketConfig, SpecialMode};
use grid_auction::models::{BidState, BidSubmission, Side};
use grid_auction::services::market_clearing::ClearingType;
use grid_auction::{BidError, Market};

const EPS: f64 = 1e-9;

fn setup_market(config: MarketConfig) -> Market {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_test_writer()
        .try_init();

    Market::new(config).expect("Failed to create market")
}

fn bid(market: &Market, side: Side, id: &str, price: f64, quantity: f64) -> BidSubmission {
    BidSubmission {
        side,
        participant_id: id.to_string(),
        price,
        quantity,
        state: BidState::On,
        bid_id: id.to_string(),
        market_id: market.market_id(),
        rebid: false,
    }
}

fn submit(market: &mut Market, side: Side, id: &str, price: f64, quantity: f64) {
    let submission = bid(market, side, id, price, quantity);
    market.submit_bid(submission).expect("bid accepted");
}

#[test]
fn test_lone_buyer_clears_null_above_its_price() {
    let mut market = setup_market(MarketConfig::default());
    submit(&mut market, Side::Buy, "house_1", 20.0, 50.0);

    let frame = market.clear(0).expect("clear");
    assert_eq!(frame.clearing_type, ClearingType::Null);
    assert!((frame.clearing_price - 20.0001).abs() < EPS);
    assert_eq!(frame.clearing_quantity, 0.0);
    assert_eq!(frame.marginal_frac, 0.0);
}

#[test]
fn test_lone_seller_clears_null_below_its_price() {
    let mut market = setup_market(MarketConfig::default());
    submit(&mut market, Side::Sell, "gen_1", 10.0, 50.0);

    let frame = market.clear(0).expect("clear");
    assert_eq!(frame.clearing_type, ClearingType::Null);
    assert!((frame.clearing_price - 9.9999).abs() < EPS);
    assert_eq!(frame.clearing_quantity, 0.0);
}

#[test]
fn test_seller_exhausted_cycle_prorates_the_buyer() {
    let mut market = setup_market(MarketConfig::default());
    submit(&mut market, Side::Sell, "gen_1", 5.0, 30.0);
    submit(&mut market, Side::Buy, "house_1", 7.0, 50.0);

    let frame = market.clear(0).expect("clear");
    assert_eq!(frame.clearing_type, ClearingType::SellerBound);
    assert_eq!(frame.clearing_price, 7.0);
    assert_eq!(frame.clearing_quantity, 30.0);
    assert_eq!(frame.marginal_quantity, 30.0);
    assert_eq!(frame.marginal_total, 50.0);
    assert!((frame.marginal_frac - 0.6).abs() < EPS);

    // consumer gets nothing at its own price, supplier earns (7 - 5) * 30
    assert_eq!(frame.surplus.consumer_surplus, 0.0);
    assert!((frame.surplus.supplier_surplus - 60.0).abs() < EPS);
}

#[test]
fn test_equal_quantities_split_the_price() {
    let mut market = setup_market(MarketConfig::default());
    submit(&mut market, Side::Sell, "gen_1", 10.0, 100.0);
    submit(&mut market, Side::Buy, "house_1", 15.0, 100.0);

    let frame = market.clear(0).expect("clear");
    assert_eq!(frame.clearing_type, ClearingType::PriceSplit);
    assert!((frame.clearing_price - 12.5).abs() < EPS);
    assert_eq!(frame.clearing_quantity, 100.0);
    assert_eq!(frame.marginal_quantity, 0.0);
    assert_eq!(frame.marginal_frac, 0.0);
}

#[test]
fn test_capacity_reference_backstop_supplies_unresponsive_load() {
    let config = MarketConfig {
        price_cap: 1000.0,
        capacity_reference: Some(CapacityReferenceConfig {
            name: "substation_lmp".to_string(),
            max_bid_quantity: 500.0,
        }),
        ..Default::default()
    };
    let mut market = setup_market(config);
    submit(&mut market, Side::Buy, "hvac_1", 40.0, 5.0);
    submit(&mut market, Side::Buy, "hvac_2", 20.0, 5.0);
    market.set_capacity_reference(30.0, 100.0);

    let frame = market.clear(0).expect("clear");

    // 100 total load - 10 responsive on = 90 unresponsive at the cap
    assert!((frame.capacity_reference_unresponsive - 90.0).abs() < EPS);
    assert!((frame.buyer_unresponsive_total - 90.0).abs() < EPS);
    assert_eq!(frame.seller_count, 1);
    assert_eq!(frame.buyer_count, 3);
    assert_eq!(frame.seller_min_price, 30.0);

    // backstop sells 95 at 30; hvac_2 at 20 stays out
    assert_eq!(frame.clearing_type, ClearingType::BuyerBound);
    assert_eq!(frame.clearing_price, 30.0);
    assert!((frame.clearing_quantity - 95.0).abs() < EPS);
    assert!((frame.marginal_frac - 0.19).abs() < EPS);
}

#[test]
fn test_unserved_unresponsive_load_is_a_failure() {
    let config = MarketConfig {
        price_cap: 1000.0,
        ..Default::default()
    };
    let mut market = setup_market(config);
    submit(&mut market, Side::Sell, "gen_1", 25.0, 40.0);
    market.set_capacity_reference(30.0, 100.0);

    let frame = market.clear(0).expect("clear");
    assert_eq!(frame.clearing_type, ClearingType::Failure);
    assert_eq!(frame.clearing_price, 1000.0);
    assert_eq!(frame.clearing_quantity, 40.0);
    assert_eq!(market.current_output().clear_price, 1000.0);
}

#[test]
fn test_sellers_only_market_with_fixed_quantity() {
    let config = MarketConfig {
        special_mode: SpecialMode::SellersOnly,
        fixed_quantity: 60.0,
        ..Default::default()
    };
    let mut market = setup_market(config);
    submit(&mut market, Side::Sell, "gen_cheap", 10.0, 50.0);
    submit(&mut market, Side::Sell, "gen_mid", 20.0, 50.0);
    submit(&mut market, Side::Sell, "gen_peak", 40.0, 50.0);

    let frame = market.clear(0).expect("clear");
    assert_eq!(frame.clearing_type, ClearingType::SellerBound);
    assert_eq!(frame.clearing_price, 20.0);
    assert_eq!(frame.clearing_quantity, 60.0);
    assert_eq!(frame.marginal_quantity, 10.0);
    assert!((frame.marginal_frac - 0.2).abs() < EPS);
}

#[test]
fn test_fixed_buyer_market_ignores_sellers() {
    let config = MarketConfig {
        special_mode: SpecialMode::FixedBuyer,
        fixed_price: 25.0,
        ..Default::default()
    };
    let mut market = setup_market(config);
    submit(&mut market, Side::Buy, "house_1", 30.0, 5.0);
    submit(&mut market, Side::Buy, "house_2", 20.0, 5.0);
    submit(&mut market, Side::Sell, "gen_1", 1.0, 500.0);

    let frame = market.clear(0).expect("clear");
    assert_eq!(frame.clearing_type, ClearingType::Exact);
    assert_eq!(frame.clearing_price, 25.0);
    assert_eq!(frame.clearing_quantity, 5.0);
    assert_eq!(frame.seller_count, 0);
}

#[test]
fn test_bids_are_scoped_to_their_market_id() {
    let mut market = setup_market(MarketConfig::default());
    submit(&mut market, Side::Sell, "gen_1", 10.0, 100.0);
    submit(&mut market, Side::Buy, "house_1", 15.0, 100.0);
    let stale = bid(&market, Side::Buy, "house_2", 15.0, 10.0);

    market.clear(0).expect("first clear");
    assert_eq!(market.market_id(), 2);
    assert!(matches!(
        market.submit_bid(stale),
        Err(BidError::StaleMarket { .. })
    ));

    // the same bid id is free again in the new market
    submit(&mut market, Side::Buy, "house_1", 12.0, 10.0);
    let frame = market.clear(300).expect("second clear");
    assert_eq!(frame.market_id, 2);
    assert_eq!(frame.clearing_type, ClearingType::Null);
    assert_eq!(market.past_frame().market_id, 1);
}

#[test]
fn test_current_output_is_idempotent() {
    let mut market = setup_market(MarketConfig {
        init_price: 18.0,
        init_stdev: 3.0,
        ..Default::default()
    });

    let initial = market.current_output();
    assert_eq!(initial.clear_price, 18.0);
    assert_eq!(initial.mean, 18.0);
    assert_eq!(initial.stdev, 3.0);
    assert_eq!(initial.price_cap, 9999.0);

    submit(&mut market, Side::Sell, "gen_1", 10.0, 100.0);
    submit(&mut market, Side::Buy, "house_1", 15.0, 100.0);
    market.clear(0).expect("clear");

    let first = market.current_output();
    let second = market.current_output();
    assert_eq!(first, second);
    assert_eq!(first.market_id, 1);
}
