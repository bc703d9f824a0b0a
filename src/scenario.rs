use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::MarketConfig;
use crate::models::{BidState, BidSubmission, Side};
use crate::services::market_clearing::{CapacityReference, ClearedFrame, MarketOutput, SimTime};
use crate::services::Market;

/// Recorded sequence of clearing cycles to drive a market offline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Market configuration; a config file passed on the command line takes precedence
    #[serde(default)]
    pub market: Option<MarketConfig>,
    /// Wall-clock time of simulated t=0, used to annotate output
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    pub cycles: Vec<Cycle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cycle {
    pub time: SimTime,
    #[serde(default)]
    pub capacity_reference: Option<CapacityReference>,
    #[serde(default)]
    pub bids: Vec<ScenarioBid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioBid {
    pub side: Side,
    pub participant_id: String,
    pub price: f64,
    pub quantity: f64,
    #[serde(default)]
    pub state: BidState,
    /// Defaults to the participant id
    #[serde(default)]
    pub bid_id: Option<String>,
    #[serde(default)]
    pub rebid: bool,
}

impl ScenarioBid {
    fn into_submission(self, market_id: u64) -> BidSubmission {
        BidSubmission {
            bid_id: self.bid_id.unwrap_or_else(|| self.participant_id.clone()),
            side: self.side,
            participant_id: self.participant_id,
            price: self.price,
            quantity: self.quantity,
            state: self.state,
            market_id,
            rebid: self.rebid,
        }
    }
}

/// One line of replay output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayRecord {
    pub time: SimTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wall_clock: Option<DateTime<Utc>>,
    pub frame: ClearedFrame,
    pub output: MarketOutput,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub cycles: usize,
    pub bids_accepted: usize,
    pub bids_rejected: usize,
}

impl Scenario {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        let scenario: Scenario = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse scenario {}", path.display()))?;
        Ok(scenario)
    }
}

/// Drive a fresh market through every cycle, writing one JSON record per clear
pub fn replay<W: Write>(scenario: Scenario, config: MarketConfig, out: &mut W) -> Result<ReplaySummary> {
    let mut market = Market::new(config).context("Invalid market configuration")?;
    let mut summary = ReplaySummary::default();
    let start = scenario.start;

    for cycle in scenario.cycles {
        if let Some(reference) = cycle.capacity_reference {
            market.set_capacity_reference(reference.price, reference.quantity);
        }

        for bid in cycle.bids {
            match market.submit_bid(bid.into_submission(market.market_id())) {
                Ok(()) => summary.bids_accepted += 1,
                Err(_) => summary.bids_rejected += 1,
            }
        }

        let frame = market
            .clear(cycle.time)
            .with_context(|| format!("Clearing failed at t={}", cycle.time))?;
        let record = ReplayRecord {
            time: cycle.time,
            wall_clock: start.map(|s| s + Duration::seconds(cycle.time)),
            frame,
            output: market.current_output(),
        };
        serde_json::to_writer(&mut *out, &record)?;
        writeln!(out)?;
        summary.cycles += 1;
    }

    if summary.bids_rejected > 0 {
        warn!("{} bids were rejected during replay", summary.bids_rejected);
    }
    info!(
        "✅ Replay finished: {} cycles, {} bids accepted",
        summary.cycles, summary.bids_accepted
    );
    Ok(summary)
}
