//! Named routes on the simulator site.

use std::str::FromStr;

use strum::{AsRefStr, Display, EnumString};
use url::Url;

use crate::error::SessionError;
use crate::trading::SecurityType;

/// Default simulator host.
pub const DEFAULT_BASE_URL: &str = "https://www.investopedia.com";

/// Trade pages the client reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Route {
    /// Stock order entry page.
    TradeStock,
    /// Option order entry page.
    TradeOption,
}

impl Route {
    /// Order entry page for a security type.
    pub fn for_security(security_type: SecurityType) -> Self {
        match security_type {
            SecurityType::Stock => Route::TradeStock,
            SecurityType::Option => Route::TradeOption,
        }
    }

    /// Path relative to the site root.
    pub fn path(&self) -> &'static str {
        match self {
            Route::TradeStock => "/simulator/trade/tradestock.aspx",
            Route::TradeOption => "/simulator/trade/tradeoption.aspx",
        }
    }
}

/// Resolves route names to absolute URLs. Pure lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes {
    base: Url,
}

impl Routes {
    pub fn new(base_url: &str) -> Result<Self, SessionError> {
        Ok(Self {
            base: Url::parse(base_url)?,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for a route.
    pub fn url(&self, route: Route) -> Result<Url, SessionError> {
        Ok(self.base.join(route.path())?)
    }

    /// Absolute URL for a route name such as `"tradestock"`.
    pub fn route(&self, name: &str) -> Result<Url, SessionError> {
        let route =
            Route::from_str(name).map_err(|_| SessionError::UnknownRoute(name.to_string()))?;
        self.url(route)
    }
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            base: Url::parse(DEFAULT_BASE_URL).expect("valid default base url"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_named_routes() {
        let routes = Routes::new("https://sim.example.com/").unwrap();
        assert_eq!(
            routes.route("tradestock").unwrap().as_str(),
            "https://sim.example.com/simulator/trade/tradestock.aspx"
        );
        assert_eq!(
            routes.route("tradeoption").unwrap().as_str(),
            "https://sim.example.com/simulator/trade/tradeoption.aspx"
        );
    }

    #[test]
    fn unknown_route_is_an_error() {
        let routes = Routes::default();
        assert!(matches!(
            routes.route("portfolio"),
            Err(SessionError::UnknownRoute(name)) if name == "portfolio"
        ));
    }

    #[test]
    fn route_per_security_type() {
        assert_eq!(Route::for_security(SecurityType::Stock), Route::TradeStock);
        assert_eq!(Route::for_security(SecurityType::Option).to_string(), "tradeoption");
    }

    #[test]
    fn rejects_malformed_base() {
        assert!(matches!(Routes::new("not a url"), Err(SessionError::InvalidUrl(_))));
    }
}
