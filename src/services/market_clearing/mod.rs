pub mod aggregate_bid;
pub mod aggregator;
pub mod curve;
pub mod latency;
pub mod marginal;
pub mod matching;
pub mod statistics;
pub mod surplus;
pub mod types;

use std::mem;

use tracing::{debug, info, instrument, warn};

pub use aggregate_bid::AggregateBuyerBid;
pub use aggregator::{AggregatedCurves, CapacityReference};
pub use curve::{Curve, CurveEntry};
pub use latency::LatencyQueue;
pub use statistics::StatisticsEngine;
pub use surplus::SurplusSummary;
pub use types::*;

use crate::config::{MarketConfig, SpecialMode};
use crate::error::{BidError, Result};
use crate::metrics;
use crate::models::{Bid, BidSubmission};

/// One double-auction market for a single commodity.
///
/// Bids accumulate between clears; `clear` consumes them, updates the
/// statistics and moves frames through the latency queue in one call.
#[derive(Debug, Clone)]
pub struct Market {
    config: MarketConfig,
    market_id: u64,
    bids: Vec<Bid>,
    capacity_reference: Option<CapacityReference>,
    current_frame: ClearedFrame,
    past_frame: ClearedFrame,
    latency_queue: LatencyQueue,
    statistics: StatisticsEngine,
}

impl Market {
    pub fn new(mut config: MarketConfig) -> Result<Self> {
        config.validate()?;

        let statistics = StatisticsEngine::new(&config);
        let initial = ClearedFrame::initial(config.init_price, statistics.values().to_vec());

        info!(
            "🏛️ Market {} ready: cap={}, period={}s, latency={}s, mode={:?}",
            config.name, config.price_cap, config.period, config.latency, config.special_mode
        );

        Ok(Self {
            market_id: config.initial_market_id,
            latency_queue: LatencyQueue::new(config.latency_slots()),
            bids: Vec::new(),
            capacity_reference: None,
            past_frame: initial.clone(),
            current_frame: initial,
            statistics,
            config,
        })
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    /// Id of the market currently accepting bids
    pub fn market_id(&self) -> u64 {
        self.market_id
    }

    pub fn open_bids(&self) -> &[Bid] {
        &self.bids
    }

    pub fn current_frame(&self) -> &ClearedFrame {
        &self.current_frame
    }

    pub fn past_frame(&self) -> &ClearedFrame {
        &self.past_frame
    }

    pub fn queued_frames(&self) -> usize {
        self.latency_queue.len()
    }

    pub fn total_samples(&self) -> u64 {
        self.statistics.total_samples()
    }

    /// Accept a bid into the open market, or replace one when `rebid` is set
    pub fn submit_bid(&mut self, submission: BidSubmission) -> std::result::Result<(), BidError> {
        let result = self.try_accept(submission);
        if let Err(e) = &result {
            warn!("Market {}: {}", self.config.name, e);
            metrics::track_bid_rejected(e.reason());
        }
        result
    }

    fn try_accept(&mut self, submission: BidSubmission) -> std::result::Result<(), BidError> {
        submission.validate()?;

        if submission.market_id < self.market_id {
            return Err(BidError::StaleMarket {
                bid_id: submission.bid_id,
                bid_market_id: submission.market_id,
                open_market_id: self.market_id,
            });
        }
        if submission.market_id > self.market_id {
            return Err(BidError::FutureMarket {
                bid_id: submission.bid_id,
                bid_market_id: submission.market_id,
                open_market_id: self.market_id,
            });
        }

        let existing = self.bids.iter().position(|b| b.bid_id == submission.bid_id);
        let rebid = submission.rebid;
        let side = submission.side;
        let bid = submission.into_bid();

        match existing {
            Some(_) if !rebid => {
                return Err(BidError::DuplicateBid {
                    bid_id: bid.bid_id,
                    market_id: self.market_id,
                });
            }
            Some(index) => {
                debug!("Market {}: bid {} replaced", self.config.name, bid.bid_id);
                self.bids[index] = bid;
            }
            None => {
                debug!(
                    "Market {}: {} bid {} accepted ({} @ {})",
                    self.config.name,
                    side.as_str(),
                    bid.bid_id,
                    bid.quantity,
                    bid.price
                );
                self.bids.push(bid);
            }
        }

        metrics::track_bid_accepted(side.as_str());
        Ok(())
    }

    /// Latest price and total load from the bulk system.
    ///
    /// Non-finite values are dropped and the previous reference stays in place.
    pub fn set_capacity_reference(&mut self, price: f64, quantity: f64) {
        if !price.is_finite() || !quantity.is_finite() {
            warn!(
                "Market {}: ignoring non-finite capacity reference {} @ {}",
                self.config.name, quantity, price
            );
            return;
        }
        debug!(
            "Market {}: capacity reference set to {} @ {}",
            self.config.name, quantity, price
        );
        self.capacity_reference = Some(CapacityReference { price, quantity });
    }

    /// Curves the open bids would clear against right now
    pub fn aggregate_curves(&self) -> AggregatedCurves {
        aggregator::aggregate(&self.config, &self.bids, self.capacity_reference)
    }

    /// Open buyer curve summarised for a bulk-market bid
    pub fn aggregate_buyer_bid(&self) -> AggregateBuyerBid {
        aggregate_bid::aggregate_buyer_bid(&self.aggregate_curves().buyers)
    }

    /// Move every queued frame whose start time has been reached into current
    pub fn advance(&mut self, now: SimTime) -> usize {
        let mut published = 0;
        while let Some(frame) = self.latency_queue.pop_ready(now) {
            self.install(frame);
            published += 1;
        }
        metrics::track_latency_queue_depth(self.latency_queue.len());
        published
    }

    fn install(&mut self, frame: ClearedFrame) {
        info!(
            "📢 Market {} publishing frame {}: price={:.4}, quantity={:.4}, type={}",
            self.config.name,
            frame.market_id,
            frame.clearing_price,
            frame.clearing_quantity,
            frame.clearing_type.as_str()
        );
        self.past_frame = mem::replace(&mut self.current_frame, frame);
    }

    /// Clear the open market at simulated time `now` and return the current frame.
    ///
    /// With a latency the returned frame is the one whose start time has been
    /// reached, not necessarily the one cleared by this call. A full latency
    /// queue is fatal and leaves the open bids and statistics untouched.
    #[instrument(skip(self), fields(market = %self.config.name, market_id = self.market_id))]
    pub fn clear(&mut self, now: SimTime) -> Result<ClearedFrame> {
        let curves = self.aggregate_curves();
        let outcome = matching::clear_curves(&curves.buyers, &curves.sellers, &self.config);
        let marginal = marginal::prorate(&outcome, &curves.buyers, &curves.sellers);
        let surplus = match self.config.special_mode {
            SpecialMode::None => surplus::calculate(
                &curves.buyers,
                &curves.sellers,
                outcome.price,
                self.config.price_cap,
            ),
            _ => SurplusSummary::default(),
        };

        let mut statistics = self.statistics.clone();
        statistics.record(outcome.price, outcome.clearing_type);

        let start_time = now + self.config.latency;
        let frame = ClearedFrame {
            market_id: self.market_id,
            start_time,
            end_time: start_time + self.config.period,
            clearing_price: outcome.price,
            clearing_quantity: outcome.quantity,
            clearing_type: outcome.clearing_type,
            marginal_quantity: marginal.quantity,
            marginal_total: marginal.total,
            marginal_frac: marginal.fraction,
            buyer_count: curves.buyers.len(),
            seller_count: curves.sellers.len(),
            seller_min_price: curves.sellers.best_price().unwrap_or(0.0),
            buyer_unresponsive_total: curves.buyers.quantity_at(self.config.price_cap),
            capacity_reference_unresponsive: curves.unresponsive_quantity,
            statistics: statistics.values().to_vec(),
            surplus,
        };

        info!(
            "⚡ Market {} cleared: type={}, price={:.4}, quantity={:.4}, buyers={}, sellers={}",
            self.market_id,
            outcome.clearing_type.as_str(),
            outcome.price,
            outcome.quantity,
            frame.buyer_count,
            frame.seller_count
        );

        if self.config.latency > 0 {
            self.advance(now);
            self.latency_queue.enqueue(frame)?;
            metrics::track_latency_queue_depth(self.latency_queue.len());
        } else {
            self.install(frame);
        }

        self.statistics = statistics;
        self.bids.clear();
        self.market_id += 1;
        metrics::track_clearing(outcome.clearing_type.as_str(), outcome.price, outcome.quantity);

        Ok(self.current_frame.clone())
    }

    /// Snapshot of what bidders see for the next cycle
    pub fn current_output(&self) -> MarketOutput {
        let values = &self.current_frame.statistics;
        MarketOutput {
            clear_price: self.current_frame.clearing_price,
            mean: self.statistics.published_mean(values),
            stdev: self.statistics.published_stdev(values),
            market_id: self.current_frame.market_id,
            price_cap: self.config.price_cap,
        }
    }
}
