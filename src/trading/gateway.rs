//! Rate-limited validation and form-token acquisition.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::trade::Trade;
use crate::error::Result;
use crate::metrics;
use crate::ratelimit::RateLimiter;
use crate::session::{extract_form_token, Route, Routes, Session};

/// Everything needed to get a trade ready for submission.
///
/// Validation and token fetches share the injected limiter. Gateways built
/// from clones of the same `Arc<RateLimiter>` draw on one quota.
#[derive(Debug, Clone)]
pub struct TradeGateway<S> {
    session: S,
    routes: Routes,
    limiter: Arc<RateLimiter>,
}

impl<S: Session> TradeGateway<S> {
    pub fn new(session: S, routes: Routes, limiter: Arc<RateLimiter>) -> Self {
        Self {
            session,
            routes,
            limiter,
        }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Validate a trade, waiting for rate-limit capacity first.
    #[instrument(skip(self, trade), fields(symbol = %trade.symbol(), direction = %trade.direction()))]
    pub async fn validate(&self, trade: &Trade) -> Result<()> {
        self.limiter.acquire().await?;

        match trade.validate() {
            Ok(()) => {
                metrics::inc_trades_validated();
                debug!("Trade is valid");
                Ok(())
            }
            Err(e) => {
                metrics::inc_trades_rejected();
                warn!(error = %e, "Trade failed validation");
                Err(e.into())
            }
        }
    }

    /// Fetch the anti-forgery token from the trade page for this trade's security type.
    #[instrument(skip(self, trade), fields(security_type = %trade.security_type()))]
    pub async fn fetch_form_token(&self, trade: &Trade) -> Result<String> {
        self.limiter.acquire().await?;

        let url = self.routes.url(Route::for_security(trade.security_type()))?;
        let token = self
            .session
            .get(&url)
            .await
            .and_then(|html| extract_form_token(&html, trade.security_type()));

        match token {
            Ok(token) => {
                metrics::inc_form_tokens_fetched();
                debug!("Fetched form token");
                Ok(token)
            }
            Err(e) => {
                metrics::inc_form_token_failures();
                warn!(error = %e, "Failed to fetch form token");
                Err(e.into())
            }
        }
    }

    /// Validate the trade, fetch a token and attach it.
    ///
    /// On error the trade is left without a new token and must not be submitted.
    #[instrument(skip(self, trade), fields(symbol = %trade.symbol()))]
    pub async fn prepare(&self, trade: &mut Trade) -> Result<()> {
        self.validate(trade).await?;
        let token = self.fetch_form_token(trade).await?;
        trade.set_form_token(token);
        info!(
            security_type = %trade.security_type(),
            quantity = trade.quantity(),
            order_type = %trade.order_type(),
            "Trade ready for submission"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SessionError, SimError, TradeError};
    use crate::ratelimit::Quota;
    use crate::session::MockSession;
    use crate::trading::{OptionContract, TradeDirection};
    use rust_decimal_macros::dec;
    use std::time::Duration;
    use tokio::time::Instant;

    fn mock_gateway(session: MockSession) -> TradeGateway<MockSession> {
        TradeGateway::new(session, Routes::default(), Arc::new(RateLimiter::default()))
    }

    fn option_contract() -> OptionContract {
        OptionContract {
            base_symbol: "AAPL".to_string(),
            ask: dec!(2.10),
            bid: dec!(2.00),
            contract_name: "AAPL240119P00180000".to_string(),
            contract_type: "p".to_string(),
        }
    }

    #[tokio::test]
    async fn prepare_attaches_security_specific_token() {
        let session = MockSession::with_trade_pages(&Routes::default(), "stock-tok", "option-tok");
        let gateway = mock_gateway(session.clone());

        let mut stock = Trade::stock("AAPL", 10, TradeDirection::buy());
        gateway.prepare(&mut stock).await.unwrap();
        assert_eq!(stock.form_token(), Some("stock-tok"));

        let mut option = Trade::option(option_contract(), 1, TradeDirection::sell_to_close());
        gateway.prepare(&mut option).await.unwrap();
        assert_eq!(option.form_token(), Some("option-tok"));

        let requested: Vec<String> = session.requests().iter().map(|u| u.path().to_string()).collect();
        assert_eq!(
            requested,
            vec![
                "/simulator/trade/tradestock.aspx".to_string(),
                "/simulator/trade/tradeoption.aspx".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn invalid_trade_never_reaches_the_session() {
        let session = MockSession::with_trade_pages(&Routes::default(), "s", "o");
        let gateway = mock_gateway(session.clone());

        let mut trade = Trade::stock("AAPL", 10, TradeDirection::buy_to_open());
        let err = gateway.prepare(&mut trade).await.unwrap_err();

        assert!(matches!(err, SimError::Trade(TradeError::InvalidTrade(_))));
        assert_eq!(session.request_count(), 0);
        assert_eq!(trade.form_token(), None);
    }

    #[tokio::test]
    async fn token_errors_propagate_unwrapped() {
        let gateway = mock_gateway(MockSession::unauthenticated());
        let trade = Trade::stock("AAPL", 10, TradeDirection::buy());
        assert!(matches!(
            gateway.fetch_form_token(&trade).await,
            Err(SimError::Session(SessionError::Unauthenticated(_)))
        ));

        let session = MockSession::new();
        let url = Routes::default().url(Route::TradeStock).unwrap();
        session.set_page(&url, "<html><body>maintenance</body></html>");
        let gateway = mock_gateway(session);
        assert!(matches!(
            gateway.fetch_form_token(&trade).await,
            Err(SimError::Session(SessionError::TokenNotFound { .. }))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn seventh_validation_blocks_until_window_frees() {
        let gateway = mock_gateway(MockSession::new());
        let trade = Trade::stock("AAPL", 10, TradeDirection::buy());
        let start = Instant::now();

        for _ in 0..6 {
            gateway.validate(&trade).await.unwrap();
            tokio::time::advance(Duration::from_millis(700)).await;
        }
        assert!(start.elapsed() < Duration::from_secs(5));

        gateway.validate(&trade).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn validation_and_token_fetch_share_the_quota() {
        let limiter = Arc::new(RateLimiter::new(
            Quota::per_period(2, Duration::from_secs(30)).unwrap(),
        ));
        let routes = Routes::default();
        let session = MockSession::with_trade_pages(&routes, "s", "o");
        let first = TradeGateway::new(session.clone(), routes.clone(), Arc::clone(&limiter));
        let second = TradeGateway::new(session, routes, Arc::clone(&limiter));

        let trade = Trade::stock("AAPL", 10, TradeDirection::buy());
        let start = Instant::now();
        first.validate(&trade).await.unwrap();
        second.fetch_form_token(&trade).await.unwrap();
        assert_eq!(limiter.available().await, 0);

        first.validate(&trade).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn max_wait_surfaces_as_rate_limit_error() {
        let limiter = RateLimiter::new(Quota::per_period(1, Duration::from_secs(30)).unwrap())
            .with_max_wait(Duration::from_secs(1));
        let gateway = TradeGateway::new(MockSession::new(), Routes::default(), Arc::new(limiter));
        let trade = Trade::stock("AAPL", 10, TradeDirection::buy());

        gateway.validate(&trade).await.unwrap();
        assert!(matches!(
            gateway.validate(&trade).await,
            Err(SimError::RateLimit(_))
        ));
    }
}
