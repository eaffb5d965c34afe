//! Trade direction (the side of the position a trade opens, closes or covers).

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, IntoEnumIterator};

use super::normalize_choice;
use super::payload::FormValue;
use super::SecurityType;
use crate::error::TradeError;

/// Form field carrying a stock trade's direction.
pub const STOCK_DIRECTION_FIELD: &str = "transactionTypeDropDown";
/// Form field carrying an option trade's direction.
pub const OPTION_DIRECTION_FIELD: &str = "ddlAction";

/// Closed set of trade directions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeDirection {
    /// Open or add to a long stock position.
    Buy,
    /// Reduce or close a long stock position.
    Sell,
    /// Open a short stock position.
    SellShort,
    /// Close a short stock position.
    BuyToCover,
    /// Open an option position.
    BuyToOpen,
    /// Close an option position.
    SellToClose,
}

impl TradeDirection {
    /// Resolve a direction from free-form input such as `"buy"`,
    /// `"Buy To Open"` or `"sell_short"`.
    pub fn new(input: &str) -> Result<Self, TradeError> {
        let normalized = normalize_choice(input);
        Self::iter()
            .find(|direction| direction.as_ref() == normalized)
            .ok_or(TradeError::InvalidTradeType(normalized))
    }

    pub fn buy() -> Self {
        Self::Buy
    }

    pub fn sell() -> Self {
        Self::Sell
    }

    pub fn sell_short() -> Self {
        Self::SellShort
    }

    pub fn buy_to_cover() -> Self {
        Self::BuyToCover
    }

    pub fn buy_to_open() -> Self {
        Self::BuyToOpen
    }

    pub fn sell_to_close() -> Self {
        Self::SellToClose
    }

    /// The single form field and value this direction contributes.
    pub fn form_field(&self) -> (&'static str, FormValue) {
        let (field, code) = match self {
            TradeDirection::Buy => (STOCK_DIRECTION_FIELD, 1),
            TradeDirection::Sell => (STOCK_DIRECTION_FIELD, 2),
            TradeDirection::SellShort => (STOCK_DIRECTION_FIELD, 3),
            TradeDirection::BuyToCover => (STOCK_DIRECTION_FIELD, 4),
            TradeDirection::BuyToOpen => (OPTION_DIRECTION_FIELD, 1),
            TradeDirection::SellToClose => (OPTION_DIRECTION_FIELD, 2),
        };
        (field, FormValue::Int(code))
    }

    /// The security type this direction can be traded on.
    pub fn security_type(&self) -> SecurityType {
        match self {
            TradeDirection::Buy
            | TradeDirection::Sell
            | TradeDirection::SellShort
            | TradeDirection::BuyToCover => SecurityType::Stock,
            TradeDirection::BuyToOpen | TradeDirection::SellToClose => SecurityType::Option,
        }
    }

    /// Check if this direction is legal for the given security type.
    pub fn is_allowed_for(&self, security_type: SecurityType) -> bool {
        self.security_type() == security_type
    }

    /// All directions legal for a security type, in wire-code order.
    pub fn allowed_for(security_type: SecurityType) -> Vec<TradeDirection> {
        Self::iter()
            .filter(|direction| direction.is_allowed_for(security_type))
            .collect()
    }
}

impl FromStr for TradeDirection {
    type Err = TradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(TradeDirection::new("buy").unwrap(), TradeDirection::Buy);
        assert_eq!(TradeDirection::new("Buy To Open").unwrap(), TradeDirection::BuyToOpen);
        assert_eq!(TradeDirection::new("sell_short").unwrap(), TradeDirection::SellShort);
        assert_eq!(TradeDirection::new("  buy   to cover ").unwrap(), TradeDirection::BuyToCover);
        assert_eq!("Sell To Close".parse::<TradeDirection>().unwrap(), TradeDirection::SellToClose);
    }

    #[test]
    fn rejects_unknown_direction() {
        let err = TradeDirection::new("hold").unwrap_err();
        assert_eq!(err, TradeError::InvalidTradeType("HOLD".to_string()));
        assert!(TradeDirection::new("").is_err());
        assert!(TradeDirection::new("buy-to-open").is_err());
    }

    #[test]
    fn wire_encoding_matches_form() {
        assert_eq!(
            TradeDirection::buy().form_field(),
            ("transactionTypeDropDown", FormValue::Int(1))
        );
        assert_eq!(
            TradeDirection::buy_to_cover().form_field(),
            ("transactionTypeDropDown", FormValue::Int(4))
        );
        assert_eq!(TradeDirection::sell_to_close().form_field(), ("ddlAction", FormValue::Int(2)));
    }

    #[test]
    fn allowed_directions_per_security_type() {
        assert_eq!(
            TradeDirection::allowed_for(SecurityType::Stock),
            vec![
                TradeDirection::Buy,
                TradeDirection::Sell,
                TradeDirection::SellShort,
                TradeDirection::BuyToCover
            ]
        );
        assert_eq!(
            TradeDirection::allowed_for(SecurityType::Option),
            vec![TradeDirection::BuyToOpen, TradeDirection::SellToClose]
        );
    }

    #[test]
    fn display_is_normalized_name() {
        assert_eq!(TradeDirection::SellShort.to_string(), "SELL_SHORT");
    }
}
