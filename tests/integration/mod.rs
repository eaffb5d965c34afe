//! Integration tests for the simulator trade client.
//!
//! Most tests run against `MockSession`. The live test requires a valid
//! SIM_AUTH_COOKIE environment variable.
//! Run with: cargo test --test integration -- --ignored

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use simtrader::config::Config;
use simtrader::error::{SimError, TradeError};
use simtrader::ratelimit::{Quota, RateLimiter};
use simtrader::session::{MockSession, Route, Routes, SimulatorSession};
use simtrader::trading::{
    FormValue, OptionContract, OrderDuration, OrderType, Trade, TradeDirection, TradeGateway,
    TradeRequest,
};

fn option_contract() -> OptionContract {
    OptionContract {
        base_symbol: "TSLA".to_string(),
        ask: dec!(3.40),
        bid: dec!(3.25),
        contract_name: "TSLA240621C00200000".to_string(),
        contract_type: "c".to_string(),
    }
}

/// Stock order from raw strings through to a submission-ready form.
#[tokio::test]
async fn stock_trade_from_strings_is_prepared() {
    let routes = Routes::default();
    let session = MockSession::with_trade_pages(&routes, "stk-9f2c", "opt-unused");
    let gateway = TradeGateway::new(session.clone(), routes, Arc::new(RateLimiter::default()));

    let request: TradeRequest = serde_json::from_str(
        r#"{
            "instrument": {"security_type": "stock", "symbol": "AAPL"},
            "quantity": 10,
            "direction": "buy",
            "order_type": "Limit $187.50",
            "duration": "Day Order",
            "send_email": false
        }"#,
    )
    .unwrap();
    let mut trade = request.into_trade().unwrap();
    gateway.prepare(&mut trade).await.unwrap();

    let pairs = trade.form_pairs();
    let expected: Vec<(String, String)> = [
        ("Price", "Limit"),
        ("durationTypeDropDown", "1"),
        ("formToken", "stk-9f2c"),
        ("isShowMax", "0"),
        ("limitPriceTextBox", "187.50"),
        ("quantityTextbox", "10"),
        ("selectedValue", ""),
        ("sendConfirmationEmailCheckBox", "0"),
        ("stopPriceTextBox", ""),
        ("symbolTextbox", "AAPL"),
        ("tStopPRCTextBox", ""),
        ("tStopVALTextBox", ""),
        ("transactionTypeDropDown", "1"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    assert_eq!(pairs, expected);
    assert!(trade.query_pairs().is_empty());
    assert_eq!(session.request_count(), 1);
}

/// Option order: contract identity lands in query parameters.
#[tokio::test]
async fn option_trade_is_prepared_with_query_params() {
    let routes = Routes::default();
    let session = MockSession::with_trade_pages(&routes, "stk", "opt-77");
    let gateway = TradeGateway::new(session.clone(), routes.clone(), Arc::new(RateLimiter::default()));

    let mut trade = Trade::option(option_contract(), 2, TradeDirection::new("Buy To Open").unwrap())
        .with_order_type(OrderType::trailing_stop(None, Some(dec!(5))).unwrap())
        .with_duration(OrderDuration::day_order());
    gateway.prepare(&mut trade).await.unwrap();

    let form = trade.form_data();
    assert_eq!(form.get("ddlAction"), Some(&FormValue::Int(1)));
    assert_eq!(form.get("txNumContracts"), Some(&FormValue::Int(2)));
    assert_eq!(form.get("tStopPRCTextBox"), Some(&FormValue::Decimal(dec!(5))));
    assert_eq!(form.get("tStopVALTextBox"), Some(&FormValue::Null));
    assert_eq!(form.get("formToken"), Some(&FormValue::from("opt-77")));

    let query = trade.query_params();
    assert_eq!(query.get("msym"), Some(&FormValue::from("TSLA")));
    assert_eq!(query.get("sym"), Some(&FormValue::from("TSLA240621C00200000")));
    assert_eq!(query.get("ap"), Some(&FormValue::Decimal(dec!(3.40))));
    assert_eq!(query.get("bid"), Some(&FormValue::Decimal(dec!(3.25))));
    assert_eq!(query.get("t"), Some(&FormValue::from("c")));

    assert_eq!(session.requests(), vec![routes.url(Route::TradeOption).unwrap()]);
}

/// A stock trade with an option-only direction can be built but not prepared.
#[tokio::test]
async fn mismatched_direction_is_rejected_before_any_request() {
    let routes = Routes::default();
    let session = MockSession::with_trade_pages(&routes, "s", "o");
    let gateway = TradeGateway::new(session.clone(), routes, Arc::new(RateLimiter::default()));

    let mut trade = Trade::stock("AAPL", 10, TradeDirection::buy_to_open());
    let err = gateway.prepare(&mut trade).await.unwrap_err();

    match err {
        SimError::Trade(TradeError::InvalidTrade(message)) => {
            assert!(message.contains("BUY,SELL,SELL_SHORT,BUY_TO_COVER"), "{}", message)
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(session.request_count(), 0);
}

/// Two gateways over one limiter share the process-wide quota.
#[tokio::test(start_paused = true)]
async fn gateways_share_one_rate_limit() {
    let limiter = Arc::new(RateLimiter::new(Quota::default()));
    let routes = Routes::default();
    let session = MockSession::with_trade_pages(&routes, "s", "o");
    let stock_desk = TradeGateway::new(session.clone(), routes.clone(), Arc::clone(&limiter));
    let option_desk = TradeGateway::new(session, routes, Arc::clone(&limiter));

    let stock = Trade::stock("AAPL", 1, TradeDirection::buy());
    let option = Trade::option(option_contract(), 1, TradeDirection::sell_to_close());
    let start = tokio::time::Instant::now();

    for _ in 0..3 {
        stock_desk.validate(&stock).await.unwrap();
        option_desk.validate(&option).await.unwrap();
    }
    assert!(start.elapsed() < Duration::from_secs(1));

    // Seventh call overall, through either gateway, waits out the window.
    option_desk.fetch_form_token(&option).await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(30));
}

/// Fetch a real form token from the simulator.
#[tokio::test]
#[ignore = "requires SIM_AUTH_COOKIE and network access"]
async fn test_live_form_token() {
    let config = match Config::load() {
        Ok(config) if config.has_auth_cookie() => config,
        _ => {
            println!("Skipping: SIM_AUTH_COOKIE not set");
            return;
        }
    };

    let gateway = TradeGateway::new(
        SimulatorSession::new(&config).unwrap(),
        config.routes().unwrap(),
        Arc::new(config.rate_limiter()),
    );
    let trade = Trade::stock("AAPL", 1, TradeDirection::buy());

    match gateway.fetch_form_token(&trade).await {
        Ok(token) => {
            assert!(!token.is_empty(), "token should not be empty");
            let prefix: String = token.chars().take(8).collect();
            println!("Form token: {}...", prefix);
        }
        Err(e) => println!("Token fetch failed (session may have expired): {}", e),
    }
}
