//! Authenticated transport to the simulator.

use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::header::COOKIE;
use reqwest::StatusCode;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::Config;
use crate::error::SessionError;
use crate::metrics;

/// An authenticated GET against the simulator.
///
/// Network errors, expired sessions and non-success statuses all surface as
/// [`SessionError`]; callers treat them as fatal for the current trade.
pub trait Session: Send + Sync {
    /// Fetch the raw HTML at `url`.
    fn get(&self, url: &Url) -> impl Future<Output = Result<String, SessionError>> + Send;
}

/// Cookie-authenticated HTTP session.
///
/// Logging in is out of scope: the session is handed a cookie obtained
/// elsewhere (e.g. copied from a browser).
#[derive(Debug, Clone)]
pub struct SimulatorSession {
    /// HTTP client for page requests.
    http: reqwest::Client,
    /// Raw `Cookie` header value.
    auth_cookie: Option<String>,
}

impl SimulatorSession {
    /// Create a session from config.
    pub fn new(config: &Config) -> Result<Self, SessionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.http_timeout_ms))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self::with_client(http, config.sim_auth_cookie.clone()))
    }

    pub fn with_client(http: reqwest::Client, auth_cookie: Option<String>) -> Self {
        Self { http, auth_cookie }
    }

    /// Check if a cookie is configured. Says nothing about whether it is still valid.
    pub fn has_credentials(&self) -> bool {
        self.auth_cookie
            .as_deref()
            .is_some_and(|cookie| !cookie.trim().is_empty())
    }
}

impl Session for SimulatorSession {
    #[instrument(skip(self), fields(url = %url))]
    async fn get(&self, url: &Url) -> Result<String, SessionError> {
        let cookie = self
            .auth_cookie
            .as_deref()
            .filter(|cookie| !cookie.trim().is_empty())
            .ok_or_else(|| SessionError::Unauthenticated("no auth cookie configured".to_string()))?;

        let start = Instant::now();
        let response = self
            .http
            .get(url.clone())
            .header(COOKIE, cookie)
            .send()
            .await?;
        metrics::record_http_latency(start, url.path());

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(status = %status, "Session rejected by simulator");
            return Err(SessionError::Unauthenticated(format!("HTTP {}", status)));
        }

        if !status.is_success() {
            return Err(SessionError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Expired sessions are redirected to the login page with a 200.
        let final_url = response.url().clone();
        if final_url.path().to_ascii_lowercase().contains("login") {
            warn!(redirected_to = %final_url, "Session redirected to login");
            return Err(SessionError::Unauthenticated(format!(
                "redirected to {}",
                final_url
            )));
        }

        let body = response.text().await?;
        debug!(bytes = body.len(), "Fetched page");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_require_non_blank_cookie() {
        let http = reqwest::Client::new();
        assert!(SimulatorSession::with_client(http.clone(), Some("UI4=abc".to_string()))
            .has_credentials());
        assert!(!SimulatorSession::with_client(http.clone(), Some("  ".to_string()))
            .has_credentials());
        assert!(!SimulatorSession::with_client(http, None).has_credentials());
    }

    #[tokio::test]
    async fn get_without_cookie_fails_before_network() {
        let session = SimulatorSession::with_client(reqwest::Client::new(), None);
        let url = Url::parse("https://sim.invalid/simulator/trade/tradestock.aspx").unwrap();
        let err = session.get(&url).await.unwrap_err();
        assert!(matches!(err, SessionError::Unauthenticated(_)));
    }
}
