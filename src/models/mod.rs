// Data models shared by the clearing engine and its callers

pub mod bid;

pub use bid::{Bid, BidState, BidSubmission, Side};
