// Latency and Statistics Integration Test
// Covers delayed publication of cleared frames through the latency queue
// and the rolling price statistics published with each frame.

use grid_auction::config::{MarketConfig, StatMode, StatType, StatisticDefinition};
use grid_auction::models::{BidState, BidSubmission, Side};
use grid_auction::services::market_clearing::ClearingType;
use grid_auction::{AuctionError, Market};

const PERIOD: i64 = 300;

fn setup_market(config: MarketConfig) -> Market {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    Market::new(config).expect("Failed to create market")
}

fn statistic(name: &str, mode: StatMode, stat_type: StatType, interval: i64) -> StatisticDefinition {
    StatisticDefinition {
        name: name.to_string(),
        mode,
        stat_type,
        interval,
    }
}

/// Submit a crossing pair that clears exactly at `price`
fn submit_exact(market: &mut Market, price: f64) {
    for (side, id) in [(Side::Sell, "gen_1"), (Side::Buy, "house_1")] {
        market
            .submit_bid(BidSubmission {
                side,
                participant_id: id.to_string(),
                price,
                quantity: 10.0,
                state: BidState::On,
                bid_id: id.to_string(),
                market_id: market.market_id(),
                rebid: false,
            })
            .expect("bid accepted");
    }
}

#[test]
fn test_frame_is_hidden_until_latency_elapses() {
    let mut market = setup_market(MarketConfig {
        period: PERIOD,
        latency: 600,
        init_price: 5.0,
        ..Default::default()
    });

    submit_exact(&mut market, 20.0);
    let frame = market.clear(0).expect("clear at 0");
    assert_eq!(frame.market_id, 0, "initial frame still current");
    assert_eq!(market.current_output().clear_price, 5.0);
    assert_eq!(market.queued_frames(), 1);

    submit_exact(&mut market, 30.0);
    let frame = market.clear(300).expect("clear at 300");
    assert_eq!(frame.market_id, 0);
    assert_eq!(market.queued_frames(), 2);

    // the frame cleared at 0 starts at 0 + 600
    submit_exact(&mut market, 40.0);
    let frame = market.clear(600).expect("clear at 600");
    assert_eq!(frame.market_id, 1);
    assert_eq!(frame.start_time, 600);
    assert_eq!(frame.end_time, 900);
    assert_eq!(frame.clearing_price, 20.0);
    assert_eq!(market.current_output().clear_price, 20.0);
    assert_eq!(market.past_frame().market_id, 0);
    assert_eq!(market.queued_frames(), 2);
}

#[test]
fn test_steady_clearing_keeps_queue_within_capacity() {
    let mut market = setup_market(MarketConfig {
        period: PERIOD,
        latency: 450,
        ..Default::default()
    });

    for cycle in 0..20 {
        submit_exact(&mut market, 10.0 + cycle as f64);
        market.clear(cycle * PERIOD).expect("queue never overflows");
    }
    // frames cleared at t <= 19 * 300 - 450 have been published
    assert_eq!(market.current_frame().market_id, 18);
    assert_eq!(market.current_frame().start_time, 17 * PERIOD + 450);
}

#[test]
fn test_queue_overflow_is_fatal_and_leaves_market_untouched() {
    let mut market = setup_market(MarketConfig {
        period: PERIOD,
        latency: 300,
        ..Default::default()
    });

    // clearing repeatedly at the same instant never lets a frame start
    market.clear(0).expect("first");
    market.clear(0).expect("second");
    submit_exact(&mut market, 12.0);
    let samples = market.total_samples();
    let market_id = market.market_id();

    let err = market.clear(0).expect_err("third clear overflows");
    assert_eq!(err, AuctionError::QueueOverflow { capacity: 3 });
    assert!(err.is_fatal());
    assert_eq!(market.total_samples(), samples);
    assert_eq!(market.market_id(), market_id);
    assert_eq!(market.open_bids().len(), 2);
}

#[test]
fn test_identical_prices_give_mean_and_zero_stdev() {
    let mut market = setup_market(MarketConfig {
        period: PERIOD,
        init_price: 50.0,
        init_stdev: 7.0,
        statistics: vec![
            statistic("mean_15min", StatMode::Current, StatType::Mean, 900),
            statistic("stdev_15min", StatMode::Current, StatType::StdDev, 900),
        ],
        ..Default::default()
    });
    let output = market.current_output();
    assert_eq!((output.mean, output.stdev), (50.0, 7.0));

    submit_exact(&mut market, 22.0);
    market.clear(0).expect("clear");
    let output = market.current_output();
    // window still holds two seed samples and stdev waits for a full window
    assert!((output.mean - (50.0 + 50.0 + 22.0) / 3.0).abs() < 1e-9);
    assert_eq!(output.stdev, 7.0);

    for cycle in 1..4 {
        submit_exact(&mut market, 22.0);
        market.clear(cycle * PERIOD).expect("clear");
    }
    let output = market.current_output();
    assert!((output.mean - 22.0).abs() < 1e-9);
    assert_eq!(output.stdev, 0.0);
}

#[test]
fn test_statistics_travel_with_delayed_frames() {
    let mut market = setup_market(MarketConfig {
        period: PERIOD,
        latency: 300,
        init_price: 0.0,
        statistics: vec![statistic("last", StatMode::Current, StatType::Mean, 300)],
        ..Default::default()
    });

    submit_exact(&mut market, 10.0);
    market.clear(0).expect("clear");
    assert_eq!(market.current_output().mean, 0.0);

    submit_exact(&mut market, 20.0);
    market.clear(300).expect("clear");
    // the frame cleared at 0 is now current along with its own statistics
    let output = market.current_output();
    assert_eq!(output.clear_price, 10.0);
    assert_eq!(output.mean, 10.0);
    assert_eq!(output.market_id, 1);
}

#[test]
fn test_failed_markets_are_skipped_when_configured() {
    let mut market = setup_market(MarketConfig {
        period: PERIOD,
        price_cap: 100.0,
        ignore_failedmarket: true,
        statistics: vec![statistic("mean_10min", StatMode::Current, StatType::Mean, 600)],
        ..Default::default()
    });

    submit_exact(&mut market, 30.0);
    market.clear(0).expect("clear");

    market
        .submit_bid(BidSubmission {
            side: Side::Sell,
            participant_id: "gen_1".to_string(),
            price: 10.0,
            quantity: 5.0,
            state: BidState::On,
            bid_id: "gen_1".to_string(),
            market_id: market.market_id(),
            rebid: false,
        })
        .expect("sell");
    market.set_capacity_reference(40.0, 50.0);
    let frame = market.clear(PERIOD).expect("clear");
    assert_eq!(frame.clearing_type, ClearingType::Failure);

    assert_eq!(market.current_output().mean, 30.0);
}
