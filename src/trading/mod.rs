//! Trading module: order value objects, the trade composite and its gateway.
//!
//! This module handles:
//! - Direction, order type and duration value objects with their wire encodings
//! - The `Trade` composite and the payload derived from it
//! - Rate-limited validation and form-token acquisition

pub mod direction;
pub mod duration;
pub mod gateway;
pub mod order_type;
pub mod payload;
pub mod trade;

use once_cell::sync::Lazy;
use regex::Regex;

pub use direction::TradeDirection;
pub use duration::OrderDuration;
pub use gateway::TradeGateway;
pub use order_type::{OrderType, TrailingStop};
pub use payload::{FormValue, Payload};
pub use trade::{Instrument, OptionContract, SecurityType, Trade, TradeRequest};

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Fold a closed-set choice to its canonical key: trimmed, whitespace runs
/// replaced by `_`, uppercased.
pub(crate) fn normalize_choice(input: &str) -> String {
    WHITESPACE_RUN
        .replace_all(input.trim(), "_")
        .to_uppercase()
}
