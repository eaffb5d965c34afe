//! The trade composite: instrument identity plus direction, order type and
//! duration, and the wire payload derived from them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::direction::TradeDirection;
use super::duration::OrderDuration;
use super::order_type::OrderType;
use super::payload::{FormValue, Payload};
use crate::error::TradeError;

/// Always-present form fields.
const SHOW_MAX_FIELD: &str = "isShowMax";
const SEND_EMAIL_FIELD: &str = "sendConfirmationEmailCheckBox";
/// Anti-forgery token field.
pub const FORM_TOKEN_FIELD: &str = "formToken";

// Stock form fields.
const STOCK_SYMBOL_FIELD: &str = "symbolTextbox";
const STOCK_QUANTITY_FIELD: &str = "quantityTextbox";
const STOCK_SELECTED_VALUE_FIELD: &str = "selectedValue";

// Option form and query fields.
const OPTION_QUANTITY_FIELD: &str = "txNumContracts";
const OPTION_SYMBOL_PARAM: &str = "msym";
const OPTION_ASK_PARAM: &str = "ap";
const OPTION_BID_PARAM: &str = "bid";
const OPTION_CONTRACT_PARAM: &str = "sym";
const OPTION_CONTRACT_TYPE_PARAM: &str = "t";

/// Kind of security being traded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SecurityType {
    /// Equity.
    Stock,
    /// Listed option contract.
    Option,
}

/// An option contract as described by the simulator's option chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionContract {
    /// Underlying symbol.
    pub base_symbol: String,
    /// Ask price.
    pub ask: Decimal,
    /// Bid price.
    pub bid: Decimal,
    /// Full contract name.
    pub contract_name: String,
    /// Contract type as reported by the chain (call/put code).
    pub contract_type: String,
}

/// What is being traded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "security_type", rename_all = "lowercase")]
pub enum Instrument {
    /// A stock, identified by its ticker.
    Stock {
        /// Ticker symbol.
        symbol: String,
    },
    /// An option contract.
    Option(OptionContract),
}

impl Instrument {
    pub fn security_type(&self) -> SecurityType {
        match self {
            Instrument::Stock { .. } => SecurityType::Stock,
            Instrument::Option(_) => SecurityType::Option,
        }
    }

    /// Ticker for stocks, underlying symbol for options.
    pub fn symbol(&self) -> &str {
        match self {
            Instrument::Stock { symbol } => symbol,
            Instrument::Option(contract) => &contract.base_symbol,
        }
    }
}

/// A single intended order.
///
/// The trade stores only typed components. The form payload and query
/// parameters are derived on every call to [`Trade::form_data`] and
/// [`Trade::query_params`], so reassigning a component can never leave a
/// stale field behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trade {
    instrument: Instrument,
    quantity: u32,
    direction: TradeDirection,
    order_type: OrderType,
    duration: OrderDuration,
    send_email: bool,
    form_token: Option<String>,
}

impl Trade {
    /// Create a stock trade: market order, good till cancelled, confirmation email on.
    pub fn stock(symbol: impl Into<String>, quantity: u32, direction: TradeDirection) -> Self {
        Self::new(
            Instrument::Stock {
                symbol: symbol.into(),
            },
            quantity,
            direction,
        )
    }

    /// Create an option trade with the same defaults as [`Trade::stock`].
    pub fn option(contract: OptionContract, quantity: u32, direction: TradeDirection) -> Self {
        Self::new(Instrument::Option(contract), quantity, direction)
    }

    pub fn new(instrument: Instrument, quantity: u32, direction: TradeDirection) -> Self {
        Self {
            instrument,
            quantity,
            direction,
            order_type: OrderType::default(),
            duration: OrderDuration::default(),
            send_email: true,
            form_token: None,
        }
    }

    /// Set order type.
    pub fn with_order_type(mut self, order_type: OrderType) -> Self {
        self.order_type = order_type;
        self
    }

    /// Set duration.
    pub fn with_duration(mut self, duration: OrderDuration) -> Self {
        self.duration = duration;
        self
    }

    /// Set whether the simulator sends a confirmation email.
    pub fn with_send_email(mut self, send_email: bool) -> Self {
        self.send_email = send_email;
        self
    }

    pub fn security_type(&self) -> SecurityType {
        self.instrument.security_type()
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn symbol(&self) -> &str {
        self.instrument.symbol()
    }

    /// The option contract, if this is an option trade.
    pub fn contract(&self) -> Option<&OptionContract> {
        match &self.instrument {
            Instrument::Option(contract) => Some(contract),
            Instrument::Stock { .. } => None,
        }
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn direction(&self) -> TradeDirection {
        self.direction
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn duration(&self) -> OrderDuration {
        self.duration
    }

    pub fn send_email(&self) -> bool {
        self.send_email
    }

    pub fn form_token(&self) -> Option<&str> {
        self.form_token.as_deref()
    }

    /// Set the ticker (stock) or underlying symbol (option).
    pub fn set_symbol(&mut self, symbol: impl Into<String>) {
        match &mut self.instrument {
            Instrument::Stock { symbol: current } => *current = symbol.into(),
            Instrument::Option(contract) => contract.base_symbol = symbol.into(),
        }
    }

    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }

    pub fn set_direction(&mut self, direction: TradeDirection) {
        self.direction = direction;
    }

    pub fn set_order_type(&mut self, order_type: OrderType) {
        self.order_type = order_type;
    }

    pub fn set_duration(&mut self, duration: OrderDuration) {
        self.duration = duration;
    }

    pub fn set_send_email(&mut self, send_email: bool) {
        self.send_email = send_email;
    }

    /// Attach the anti-forgery token scraped from the trade page.
    pub fn set_form_token(&mut self, token: impl Into<String>) {
        self.form_token = Some(token.into());
    }

    /// Check the trade can be submitted.
    ///
    /// Any error means the trade must not be submitted; there is no partial recovery.
    pub fn validate(&self) -> Result<(), TradeError> {
        if self.quantity == 0 {
            return Err(TradeError::InvalidTrade(
                "quantity must be a positive integer, got 0".to_string(),
            ));
        }

        if self.symbol().trim().is_empty() {
            return Err(TradeError::InvalidTrade(format!(
                "a {} trade requires a symbol",
                self.security_type()
            )));
        }

        let security_type = self.security_type();
        if !self.direction.is_allowed_for(security_type) {
            let allowed = TradeDirection::allowed_for(security_type)
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            let article = match security_type {
                SecurityType::Stock => "A",
                SecurityType::Option => "An",
            };
            return Err(TradeError::InvalidTrade(format!(
                "{} {}'s trade type must be one of the following: {}. Got {}",
                article, security_type, allowed, self.direction
            )));
        }

        Ok(())
    }

    /// Form fields for submission.
    pub fn form_data(&self) -> Payload {
        let mut payload = Payload::new();
        payload.insert(SHOW_MAX_FIELD, 0i64);
        payload.insert(SEND_EMAIL_FIELD, i64::from(self.send_email));

        match &self.instrument {
            Instrument::Stock { symbol } => {
                payload.insert(STOCK_SYMBOL_FIELD, symbol.as_str());
                payload.insert(STOCK_QUANTITY_FIELD, self.quantity);
                payload.insert(STOCK_SELECTED_VALUE_FIELD, FormValue::Null);
            }
            Instrument::Option(_) => {
                payload.insert(OPTION_QUANTITY_FIELD, self.quantity);
            }
        }

        payload.merge([self.direction.form_field()]);
        payload.merge(self.order_type.form_fields());
        payload.merge([self.duration.form_field()]);

        if let Some(token) = &self.form_token {
            payload.insert(FORM_TOKEN_FIELD, token.as_str());
        }

        payload
    }

    /// Query parameters for the trade page URL. Empty for stocks.
    pub fn query_params(&self) -> Payload {
        let mut params = Payload::new();
        if let Instrument::Option(contract) = &self.instrument {
            params.insert(OPTION_SYMBOL_PARAM, contract.base_symbol.as_str());
            params.insert(OPTION_ASK_PARAM, contract.ask);
            params.insert(OPTION_BID_PARAM, contract.bid);
            params.insert(OPTION_CONTRACT_PARAM, contract.contract_name.as_str());
            params.insert(OPTION_CONTRACT_TYPE_PARAM, contract.contract_type.as_str());
        }
        params
    }

    pub fn form_pairs(&self) -> Vec<(String, String)> {
        self.form_data().to_pairs()
    }

    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query_params().to_pairs()
    }
}

fn default_true() -> bool {
    true
}

/// Trade parameters as raw strings, e.g. from a CLI or a JSON document.
///
/// Direction, order type and duration are coerced through their parsers by
/// [`TradeRequest::into_trade`].
#[derive(Debug, Clone, Deserialize)]
pub struct TradeRequest {
    /// Stock or option identity.
    pub instrument: Instrument,
    /// Shares or contracts.
    pub quantity: u32,
    /// Direction such as `"buy"` or `"Buy To Open"`.
    pub direction: String,
    /// Order type string such as `"LIMIT 10"`. Market when absent.
    #[serde(default)]
    pub order_type: Option<String>,
    /// Duration such as `"day order"`. Good till cancelled when absent.
    #[serde(default)]
    pub duration: Option<String>,
    /// Send confirmation email.
    #[serde(default = "default_true")]
    pub send_email: bool,
}

impl TradeRequest {
    /// Parse every string component and build the trade.
    pub fn into_trade(self) -> Result<Trade, TradeError> {
        let direction = TradeDirection::new(&self.direction)?;
        let order_type = match self.order_type.as_deref() {
            Some(order_type) => order_type.parse()?,
            None => OrderType::default(),
        };
        let duration = match self.duration.as_deref() {
            Some(duration) => OrderDuration::new(duration)?,
            None => OrderDuration::default(),
        };

        Ok(Trade::new(self.instrument, self.quantity, direction)
            .with_order_type(order_type)
            .with_duration(duration)
            .with_send_email(self.send_email))
    }
}
