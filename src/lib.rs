//! Client-side trade modelling for a brokerage simulator's web interface.
//!
//! Stock and option orders are assembled from typed value objects, validated,
//! and rendered into the exact form fields and query parameters the
//! simulator's trade pages expect. Before a submission the per-session
//! anti-forgery token is scraped from the trade page, under a shared rate
//! limit that protects the remote site.
//!
//! ```text
//! TradeRequest ──► Trade ──► TradeGateway::prepare ──► form_data() + query_params()
//!   (strings)     (typed)     (validate + formToken)     (wire payload)
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`metrics`]: Counters and latency histograms
//! - [`ratelimit`]: Sliding-window limiter shared across trades
//! - [`session`]: Authenticated transport, routes and token scraping
//! - [`trading`]: Value objects, the trade composite and the gateway

pub mod config;
pub mod error;
pub mod metrics;
pub mod ratelimit;
pub mod session;
pub mod trading;

pub use config::Config;
pub use error::{Result, SimError};
pub use ratelimit::{Quota, RateLimiter};
pub use trading::{
    OptionContract, OrderDuration, OrderType, SecurityType, Trade, TradeDirection, TradeGateway,
};
