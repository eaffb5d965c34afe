//! Unified error types for the simulator trade client.

use std::time::Duration;

use thiserror::Error;

use crate::trading::SecurityType;

/// Unified error type for the simulator trade client.
#[derive(Error, Debug)]
pub enum SimError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Trade construction or validation error.
    #[error("trade error: {0}")]
    Trade(#[from] TradeError),

    /// Session, routing or page-scraping error.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Rate limiter refused to wait any longer.
    #[error("rate limit error: {0}")]
    RateLimit(#[from] RateLimitError),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while building or validating a trade.
///
/// All of these are local and synchronous. None of them is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TradeError {
    /// Direction string is not one of the supported trade types.
    #[error("invalid trade type '{0}'")]
    InvalidTradeType(String),

    /// Order type name or its parameters are not acceptable.
    #[error("invalid order type '{name}': {reason}")]
    InvalidOrderType {
        /// Normalized order type name.
        name: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Order-type string could not be resolved to a variant.
    #[error("'{input}' is not a valid order type: {reason}")]
    UnparseableOrderType {
        /// The raw input string.
        input: String,
        /// Reason for failure.
        reason: String,
    },

    /// Duration string is not one of the supported order durations.
    #[error("invalid order duration '{0}'")]
    InvalidOrderDuration(String),

    /// The trade as a whole must not be submitted.
    #[error("invalid trade: {0}")]
    InvalidTrade(String),
}

/// Errors from the authenticated session boundary.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Transport-level failure.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("GET {url} returned HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Session is missing or has expired.
    #[error("session is not authenticated: {0}")]
    Unauthenticated(String),

    /// Route name not known to the resolver.
    #[error("unknown route '{0}'")]
    UnknownRoute(String),

    /// Base URL or route path could not be joined.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Trade page did not contain the anti-forgery token where expected.
    #[error("form token not found on {security_type} trade page")]
    TokenNotFound {
        /// Which trade page was scraped.
        security_type: SecurityType,
    },
}

/// Rate limiter errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    /// Admission would have required waiting longer than allowed.
    #[error("rate limit wait of {required:?} exceeds max wait {max_wait:?}")]
    WaitExceeded {
        /// How long the caller would have had to wait.
        required: Duration,
        /// Configured ceiling.
        max_wait: Duration,
    },
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, SimError>;
