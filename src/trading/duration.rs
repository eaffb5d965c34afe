//! Order lifetime policy.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, IntoEnumIterator};

use super::normalize_choice;
use super::payload::FormValue;
use crate::error::TradeError;

/// Form field carrying the order duration.
pub const DURATION_FIELD: &str = "durationTypeDropDown";

/// Order duration.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderDuration {
    /// Expires at the end of the trading day.
    DayOrder,
    /// Stays open until filled or cancelled.
    #[default]
    GoodTillCancelled,
}

impl OrderDuration {
    /// Resolve a duration from input such as `"day order"` or `"GOOD_TILL_CANCELLED"`.
    pub fn new(input: &str) -> Result<Self, TradeError> {
        let normalized = normalize_choice(input);
        Self::iter()
            .find(|duration| duration.as_ref() == normalized)
            .ok_or(TradeError::InvalidOrderDuration(normalized))
    }

    pub fn day_order() -> Self {
        Self::DayOrder
    }

    pub fn good_till_cancelled() -> Self {
        Self::GoodTillCancelled
    }

    /// The form field and value this duration contributes.
    pub fn form_field(&self) -> (&'static str, FormValue) {
        let code = match self {
            OrderDuration::DayOrder => 1,
            OrderDuration::GoodTillCancelled => 2,
        };
        (DURATION_FIELD, FormValue::Int(code))
    }
}

impl FromStr for OrderDuration {
    type Err = TradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
