use ::metrics::{counter, gauge, histogram};

/// Track an accepted bid
pub fn track_bid_accepted(side: &str) {
    counter!("auction_bids_total", "side" => side.to_string()).increment(1);
}

/// Track a rejected bid
pub fn track_bid_rejected(reason: &str) {
    counter!("auction_bids_rejected_total", "reason" => reason.to_string()).increment(1);
}

/// Track a completed clearing cycle
pub fn track_clearing(clearing_type: &str, price: f64, quantity: f64) {
    counter!("auction_clearings_total", "type" => clearing_type.to_string()).increment(1);
    histogram!("auction_clearing_price").record(price);
    histogram!("auction_clearing_quantity").record(quantity);
}

/// Track frames waiting in the latency queue
pub fn track_latency_queue_depth(depth: usize) {
    gauge!("auction_latency_queue_depth").set(depth as f64);
}
