use std::sync::Arc;

use tokio::sync::Mutex;

use super::market_clearing::{ClearedFrame, Market, MarketOutput, SimTime};
use crate::error::{BidError, Result};
use crate::models::BidSubmission;

/// Cloneable handle serialising access to one market across tasks
#[derive(Clone, Debug)]
pub struct SharedMarket {
    inner: Arc<Mutex<Market>>,
}

impl SharedMarket {
    pub fn new(market: Market) -> Self {
        Self {
            inner: Arc::new(Mutex::new(market)),
        }
    }

    pub async fn submit_bid(&self, submission: BidSubmission) -> std::result::Result<(), BidError> {
        self.inner.lock().await.submit_bid(submission)
    }

    pub async fn set_capacity_reference(&self, price: f64, quantity: f64) {
        self.inner.lock().await.set_capacity_reference(price, quantity);
    }

    pub async fn clear(&self, now: SimTime) -> Result<ClearedFrame> {
        self.inner.lock().await.clear(now)
    }

    pub async fn current_output(&self) -> MarketOutput {
        self.inner.lock().await.current_output()
    }

    pub async fn market_id(&self) -> u64 {
        self.inner.lock().await.market_id()
    }
}
