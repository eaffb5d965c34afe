//! Order execution style and its price parameters.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use super::payload::FormValue;
use crate::error::TradeError;

/// Form field naming the selected order type.
pub const ORDER_TYPE_FIELD: &str = "Price";
/// Limit price field.
pub const LIMIT_PRICE_FIELD: &str = "limitPriceTextBox";
/// Stop price field.
pub const STOP_PRICE_FIELD: &str = "stopPriceTextBox";
/// Trailing stop percentage field.
pub const TRAILING_PERCENT_FIELD: &str = "tStopPRCTextBox";
/// Trailing stop dollar amount field.
pub const TRAILING_DOLLAR_FIELD: &str = "tStopVALTextBox";

/// How far a trailing stop follows the market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrailingStop {
    /// Fixed dollar distance.
    Dollars(Decimal),
    /// Percentage distance.
    Percent(Decimal),
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderType {
    /// Execute at the prevailing price.
    #[default]
    Market,
    /// Execute at `price` or better.
    Limit {
        /// Limit price.
        price: Decimal,
    },
    /// Becomes a market order once `price` trades.
    Stop {
        /// Stop price.
        price: Decimal,
    },
    /// Stop that trails the market by a fixed amount or percentage.
    TrailingStop(TrailingStop),
}

impl OrderType {
    /// Build an order type from a variant name and its optional parameters.
    ///
    /// Names are title-cased before lookup, except that anything containing
    /// `trailingstop` (ignoring case and `_`, `-`, whitespace) resolves to
    /// `TrailingStop`.
    pub fn new(
        name: &str,
        price: Option<Decimal>,
        percent: Option<Decimal>,
    ) -> Result<Self, TradeError> {
        let name = resolve_name(name);
        match name.as_str() {
            "Market" => Ok(Self::market()),
            "Limit" => price
                .ok_or_else(|| invalid(&name, "a limit price is required"))
                .and_then(Self::limit),
            "Stop" => price
                .ok_or_else(|| invalid(&name, "a stop price is required"))
                .and_then(Self::stop),
            "TrailingStop" => Self::trailing_stop(price, percent),
            _ => Err(invalid(&name, "unknown order type")),
        }
    }

    pub fn market() -> Self {
        Self::Market
    }

    pub fn limit(price: Decimal) -> Result<Self, TradeError> {
        ensure_positive("Limit", price)?;
        Ok(Self::Limit { price })
    }

    pub fn stop(price: Decimal) -> Result<Self, TradeError> {
        ensure_positive("Stop", price)?;
        Ok(Self::Stop { price })
    }

    /// Trailing stop by dollar amount or percentage, exactly one of which must be given.
    pub fn trailing_stop(
        price: Option<Decimal>,
        percent: Option<Decimal>,
    ) -> Result<Self, TradeError> {
        let trail = match (price, percent) {
            (Some(price), None) => TrailingStop::Dollars(price),
            (None, Some(percent)) => TrailingStop::Percent(percent),
            (Some(_), Some(_)) => {
                return Err(invalid(
                    "TrailingStop",
                    "must only pick either percent or dollar amount for trailing stop",
                ))
            }
            (None, None) => {
                return Err(invalid(
                    "TrailingStop",
                    "must enter either a percent or dollar amount for trailing stop",
                ))
            }
        };
        let (TrailingStop::Dollars(amount) | TrailingStop::Percent(amount)) = trail;
        ensure_positive("TrailingStop", amount)?;
        Ok(Self::TrailingStop(trail))
    }

    /// Canonical variant name, as sent in the `Price` field.
    pub fn name(&self) -> &'static str {
        match self {
            OrderType::Market => "Market",
            OrderType::Limit { .. } => "Limit",
            OrderType::Stop { .. } => "Stop",
            OrderType::TrailingStop(_) => "TrailingStop",
        }
    }

    /// All five order-type form fields. Price fields the variant does not use are null.
    pub fn form_fields(&self) -> [(&'static str, FormValue); 5] {
        let mut limit = FormValue::Null;
        let mut stop = FormValue::Null;
        let mut trailing_percent = FormValue::Null;
        let mut trailing_dollar = FormValue::Null;

        match *self {
            OrderType::Market => {}
            OrderType::Limit { price } => limit = price.into(),
            OrderType::Stop { price } => stop = price.into(),
            OrderType::TrailingStop(TrailingStop::Percent(pct)) => trailing_percent = pct.into(),
            OrderType::TrailingStop(TrailingStop::Dollars(amount)) => {
                trailing_dollar = amount.into()
            }
        }

        [
            (ORDER_TYPE_FIELD, FormValue::from(self.name())),
            (LIMIT_PRICE_FIELD, limit),
            (STOP_PRICE_FIELD, stop),
            (TRAILING_PERCENT_FIELD, trailing_percent),
            (TRAILING_DOLLAR_FIELD, trailing_dollar),
        ]
    }
}

fn invalid(name: &str, reason: &str) -> TradeError {
    TradeError::InvalidOrderType {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn ensure_positive(name: &str, amount: Decimal) -> Result<(), TradeError> {
    if amount <= Decimal::ZERO {
        return Err(invalid(name, &format!("amount must be positive, got {}", amount)));
    }
    Ok(())
}

fn resolve_name(input: &str) -> String {
    let compact: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .collect::<String>()
        .to_lowercase();
    if compact.contains("trailingstop") {
        return "TrailingStop".to_string();
    }
    title_case(input)
}

fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// One numeric argument of an order-type string.
enum Amount {
    Plain(Decimal),
    Dollars(Decimal),
    Percent(Decimal),
}

fn parse_amount(arg: &str) -> Result<Amount, String> {
    let parse = |digits: &str| {
        digits
            .parse::<Decimal>()
            .map_err(|e| format!("'{}' is not a number: {}", arg, e))
    };
    if let Some(digits) = arg.strip_suffix('%') {
        Ok(Amount::Percent(parse(digits)?))
    } else if let Some(digits) = arg.strip_prefix('$') {
        Ok(Amount::Dollars(parse(digits)?))
    } else {
        Ok(Amount::Plain(parse(arg)?))
    }
}

fn single_price(variant: &str, args: &[&str]) -> Result<Decimal, String> {
    match args {
        [arg] => match parse_amount(arg)? {
            Amount::Plain(price) | Amount::Dollars(price) => Ok(price),
            Amount::Percent(_) => Err(format!("{} takes a price, not a percentage", variant)),
        },
        _ => Err(format!("{} takes exactly one price, got {} arguments", variant, args.len())),
    }
}

fn trailing_amounts(args: &[&str]) -> Result<(Option<Decimal>, Option<Decimal>), String> {
    if args.is_empty() || args.len() > 2 {
        return Err(format!(
            "TRAILING_STOP takes one or two arguments, got {}",
            args.len()
        ));
    }

    let mut price = None;
    let mut percent = None;
    let mut positional = 0;
    for arg in args {
        let (slot, value, label) = match parse_amount(arg)? {
            Amount::Dollars(value) => (&mut price, value, "price"),
            Amount::Percent(value) => (&mut percent, value, "percentage"),
            // Positional order is (price, percent).
            Amount::Plain(value) => {
                positional += 1;
                if positional == 1 {
                    (&mut price, value, "price")
                } else {
                    (&mut percent, value, "percentage")
                }
            }
        };
        if slot.replace(value).is_some() {
            return Err(format!("TRAILING_STOP given more than one {}", label));
        }
    }
    Ok((price, percent))
}

impl FromStr for OrderType {
    type Err = TradeError;

    /// Parse `"<VARIANT> <args...>"`, e.g. `"LIMIT 10"`, `"TRAILING_STOP 2%"`
    /// or the display form `"Stop $5"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unparseable = |reason: String| TradeError::UnparseableOrderType {
            input: s.to_string(),
            reason,
        };

        let mut tokens = s.split_whitespace();
        let variant = tokens
            .next()
            .ok_or_else(|| unparseable("empty order type".to_string()))?;
        let args: Vec<&str> = tokens.collect();

        let key = variant.to_uppercase().replace(['_', '-'], "");
        let built = match key.as_str() {
            "MARKET" if args.is_empty() => Ok(OrderType::market()),
            "MARKET" => return Err(unparseable("MARKET takes no arguments".to_string())),
            "LIMIT" => OrderType::limit(single_price("LIMIT", &args).map_err(unparseable)?),
            "STOP" => OrderType::stop(single_price("STOP", &args).map_err(unparseable)?),
            "TRAILINGSTOP" => {
                let (price, percent) = trailing_amounts(&args).map_err(unparseable)?;
                OrderType::trailing_stop(price, percent)
            }
            _ => return Err(unparseable(format!("unknown order type '{}'", variant))),
        };

        built.map_err(|e| unparseable(e.to_string()))
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => f.write_str("Market"),
            OrderType::Limit { price } | OrderType::Stop { price } => {
                write!(f, "{} ${}", self.name(), price)
            }
            OrderType::TrailingStop(TrailingStop::Dollars(amount)) => {
                write!(f, "{} ${}", self.name(), amount)
            }
            OrderType::TrailingStop(TrailingStop::Percent(pct)) => {
                write!(f, "{} {}%", self.name(), pct)
            }
        }
    }
}
