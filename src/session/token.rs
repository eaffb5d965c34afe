//! Anti-forgery token extraction from the trade pages.
//!
//! Locations are fixed by the simulator's markup:
//! - option page: `form[name=simOptTrade]` → `div.group` → `input[name=formToken]`
//! - stock page: `div.group` → `form[id=orderForm]` → `input[name=formToken]`

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::SessionError;
use crate::trading::SecurityType;

/// Name of the hidden input carrying the token.
pub const FORM_TOKEN_INPUT: &str = "formToken";

static OPTION_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<form\b[^>]*\sname\s*=\s*["']simOptTrade["'][^>]*>(.*?)</form>"#)
        .expect("valid regex")
});

static ORDER_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<form\b[^>]*\sid\s*=\s*["']orderForm["'][^>]*>(.*?)</form>"#)
        .expect("valid regex")
});

static GROUP_DIV: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<div\b[^>]*\sclass\s*=\s*["']group["'][^>]*>"#).expect("valid regex")
});

static DIV_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(/?)div\b[^>]*>").expect("valid regex"));

static INPUT_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<input\b[^>]*>").expect("valid regex"));

static NAME_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)\sname\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).expect("valid regex")
});

static VALUE_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)\svalue\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).expect("valid regex")
});

static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:#([0-9]{1,7})|#[xX]([0-9a-fA-F]{1,6})|(quot|apos|amp|lt|gt));")
        .expect("valid regex")
});

/// Pull the form token out of a trade page.
pub fn extract_form_token(html: &str, security_type: SecurityType) -> Result<String, SessionError> {
    let token = match security_type {
        SecurityType::Option => option_token(html),
        SecurityType::Stock => stock_token(html),
    };
    token.ok_or(SessionError::TokenNotFound { security_type })
}

fn option_token(html: &str) -> Option<String> {
    OPTION_FORM
        .captures_iter(html)
        .filter_map(|form| form.get(1))
        .find_map(|body| {
            let body = body.as_str();
            GROUP_DIV
                .find_iter(body)
                .find_map(|group| token_input(div_body(body, group.end())))
        })
}

fn stock_token(html: &str) -> Option<String> {
    GROUP_DIV.find_iter(html).find_map(|group| {
        let form = ORDER_FORM.captures(div_body(html, group.end()))?;
        token_input(form.get(1)?.as_str())
    })
}

/// Contents of the div whose opening tag ends at `start`, up to its matching
/// close tag (or the end of the document when unclosed).
fn div_body(html: &str, start: usize) -> &str {
    let rest = &html[start..];
    let mut depth = 0usize;
    for tag in DIV_TAG.captures_iter(rest) {
        let closing = tag.get(1).is_some_and(|slash| !slash.as_str().is_empty());
        if !closing {
            depth += 1;
        } else if depth == 0 {
            return tag.get(0).map_or(rest, |m| &rest[..m.start()]);
        } else {
            depth -= 1;
        }
    }
    rest
}

fn token_input(fragment: &str) -> Option<String> {
    INPUT_TAG.find_iter(fragment).find_map(|input| {
        let tag = input.as_str();
        if attribute(&NAME_ATTR, tag)? != FORM_TOKEN_INPUT {
            return None;
        }
        attribute(&VALUE_ATTR, tag).map(decode_entities)
    })
}

fn attribute<'a>(pattern: &Regex, tag: &'a str) -> Option<&'a str> {
    let captures = pattern.captures(tag)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .or_else(|| captures.get(3))
        .map(|m| m.as_str())
}

fn decode_entities(value: &str) -> String {
    ENTITY
        .replace_all(value, |caps: &regex::Captures<'_>| {
            let code = match (caps.get(1), caps.get(2), caps.get(3)) {
                (Some(dec), _, _) => dec.as_str().parse().ok(),
                (_, Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
                (_, _, Some(name)) => match name.as_str() {
                    "quot" => Some(u32::from('"')),
                    "apos" => Some(u32::from('\'')),
                    "amp" => Some(u32::from('&')),
                    "lt" => Some(u32::from('<')),
                    _ => Some(u32::from('>')),
                },
                _ => None,
            };
            code.and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
