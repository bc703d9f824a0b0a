pub mod market_clearing;
pub mod shared_market;

pub use market_clearing::Market;
pub use shared_market::SharedMarket;
