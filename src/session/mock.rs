//! In-memory session for tests.
//!
//! Serves canned pages by URL, records every request and can simulate an
//! expired session or HTTP failures without touching the network.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use url::Url;

use super::client::Session;
use super::routes::{Route, Routes};
use crate::error::SessionError;

/// Canned response for one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockPage {
    /// 200 with this body.
    Html(String),
    /// Non-success HTTP status.
    Status(u16),
}

/// Mock session for testing.
#[derive(Debug, Clone)]
pub struct MockSession {
    /// Pages by absolute URL.
    pages: Arc<Mutex<HashMap<String, MockPage>>>,
    /// Every URL requested, in order.
    requests: Arc<Mutex<Vec<Url>>>,
    /// Whether requests succeed at all.
    authenticated: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockSession {
    /// Create an authenticated mock session with no pages.
    pub fn new() -> Self {
        Self {
            pages: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            authenticated: true,
        }
    }

    /// A session whose every request fails as unauthenticated.
    pub fn unauthenticated() -> Self {
        Self {
            authenticated: false,
            ..Self::new()
        }
    }

    /// Serve minimal stock and option trade pages carrying the given tokens.
    pub fn with_trade_pages(routes: &Routes, stock_token: &str, option_token: &str) -> Self {
        let session = Self::new();
        if let Ok(url) = routes.url(Route::TradeStock) {
            session.set_page(&url, stock_trade_page(stock_token));
        }
        if let Ok(url) = routes.url(Route::TradeOption) {
            session.set_page(&url, option_trade_page(option_token));
        }
        session
    }

    /// Serve `html` for `url`.
    pub fn set_page(&self, url: &Url, html: impl Into<String>) {
        lock(&self.pages).insert(url.to_string(), MockPage::Html(html.into()));
    }

    /// Answer `url` with a non-success status.
    pub fn set_status(&self, url: &Url, status: u16) {
        lock(&self.pages).insert(url.to_string(), MockPage::Status(status));
    }

    /// URLs requested so far.
    pub fn requests(&self) -> Vec<Url> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Clear all pages and recorded requests.
    pub fn clear(&self) {
        lock(&self.pages).clear();
        lock(&self.requests).clear();
    }
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for MockSession {
    async fn get(&self, url: &Url) -> Result<String, SessionError> {
        lock(&self.requests).push(url.clone());

        if !self.authenticated {
            return Err(SessionError::Unauthenticated(
                "mock session is logged out".to_string(),
            ));
        }

        let page = lock(&self.pages).get(url.as_str()).cloned();
        match page {
            Some(MockPage::Html(body)) => Ok(body),
            Some(MockPage::Status(status)) => Err(SessionError::Status {
                url: url.to_string(),
                status,
            }),
            None => Err(SessionError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// Minimal stock trade page with the token where the simulator puts it.
pub fn stock_trade_page(token: &str) -> String {
    format!(
        r#"<html><body><div class="group"><form id="orderForm" method="post">
<input type="text" name="symbolTextbox" value="" />
<input type="hidden" name="formToken" value="{}" />
</form></div></body></html>"#,
        token
    )
}

/// Minimal option trade page with the token where the simulator puts it.
pub fn option_trade_page(token: &str) -> String {
    format!(
        r#"<html><body><form name="simOptTrade" method="post"><div class="group">
<input type="text" name="txNumContracts" value="" />
<input type="hidden" name="formToken" value="{}" />
</div></form></body></html>"#,
        token
    )
}
