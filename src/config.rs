//! Application configuration loaded from environment variables.

use std::time::Duration;

use serde::Deserialize;

use crate::error::SessionError;
use crate::ratelimit::{Quota, RateLimiter, DEFAULT_CALLS, DEFAULT_PERIOD};
use crate::session::routes::{Routes, DEFAULT_BASE_URL};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Simulator ===
    /// Simulator site root.
    #[serde(default = "default_base_url")]
    pub sim_base_url: String,

    /// Raw `Cookie` header value of a logged-in browser session.
    #[serde(default)]
    pub sim_auth_cookie: Option<String>,

    /// Per-request HTTP timeout in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    // === Rate Limiting ===
    /// Calls admitted per window.
    #[serde(default = "default_rate_limit_calls")]
    pub rate_limit_calls: u32,

    /// Window length in seconds.
    #[serde(default = "default_rate_limit_period_secs")]
    pub rate_limit_period_secs: u64,

    /// Give up instead of waiting longer than this (unbounded when unset).
    #[serde(default)]
    pub rate_limit_max_wait_ms: Option<u64>,

    // === Logging ===
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

/// Longest accepted rate-limit window (one day).
pub const MAX_RATE_LIMIT_PERIOD_SECS: u64 = 86_400;

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

fn default_rate_limit_calls() -> u32 {
    DEFAULT_CALLS
}

fn default_rate_limit_period_secs() -> u64 {
    DEFAULT_PERIOD.as_secs()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sim_base_url: default_base_url(),
            sim_auth_cookie: None,
            http_timeout_ms: default_http_timeout_ms(),
            rate_limit_calls: default_rate_limit_calls(),
            rate_limit_period_secs: default_rate_limit_period_secs(),
            rate_limit_max_wait_ms: None,
            rust_log: default_log_level(),
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.rate_limit_calls == 0 {
            return Err("RATE_LIMIT_CALLS must be at least 1".to_string());
        }

        if self.rate_limit_period_secs == 0 {
            return Err("RATE_LIMIT_PERIOD_SECS must be at least 1".to_string());
        }

        if self.rate_limit_period_secs > MAX_RATE_LIMIT_PERIOD_SECS {
            return Err(format!(
                "RATE_LIMIT_PERIOD_SECS must be at most {}",
                MAX_RATE_LIMIT_PERIOD_SECS
            ));
        }

        if self.http_timeout_ms == 0 {
            return Err("HTTP_TIMEOUT_MS must be positive".to_string());
        }

        if let Err(e) = Routes::new(&self.sim_base_url) {
            return Err(format!("SIM_BASE_URL is not a valid url: {}", e));
        }

        Ok(())
    }

    /// Rate-limit quota, falling back to the default for a zero call count.
    pub fn quota(&self) -> Quota {
        Quota::per_period(
            self.rate_limit_calls,
            Duration::from_secs(self.rate_limit_period_secs),
        )
        .unwrap_or_default()
    }

    /// Build the limiter described by this configuration.
    pub fn rate_limiter(&self) -> RateLimiter {
        let limiter = RateLimiter::new(self.quota());
        match self.rate_limit_max_wait_ms {
            Some(ms) => limiter.with_max_wait(Duration::from_millis(ms)),
            None => limiter,
        }
    }

    pub fn routes(&self) -> Result<Routes, SessionError> {
        Routes::new(&self.sim_base_url)
    }

    /// Tracing filter directives: `simtrader=debug` when verbose, otherwise `RUST_LOG`.
    pub fn log_directives(&self, verbose: bool) -> String {
        if verbose || self.verbose {
            "simtrader=debug,info".to_string()
        } else {
            self.rust_log.clone()
        }
    }

    /// Check if an auth cookie is configured.
    pub fn has_auth_cookie(&self) -> bool {
        self.sim_auth_cookie
            .as_deref()
            .is_some_and(|cookie| !cookie.trim().is_empty())
    }
}
