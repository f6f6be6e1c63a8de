//! Attribute value validators.
//!
//! String validators applied to a list or set attribute check every element.

use ipnet::IpNet;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::net::IpAddr;
use std::str::FromStr;

static DEFAULT_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("Invalid default format regex"));
static ADDRESS_NAME_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_./:-]+$").expect("Invalid address name regex"));
static INTERFACE_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9/.:-]+$").expect("Invalid interface regex"));
static DNS_NAME_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._-]+$").expect("Invalid dns name regex"));

/// Character set allowed in a name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StringFormat {
    /// Letters, digits, dashes and underscores
    Default,
    /// [`StringFormat::Default`] plus `.`, `/` and `:`
    AddressName,
    /// Interface names like `ge-0/0/0.0`
    Interface,
    /// Host names
    DnsName,
}

impl StringFormat {
    fn regex(&self) -> &'static Regex {
        match self {
            StringFormat::Default => &DEFAULT_FORMAT,
            StringFormat::AddressName => &ADDRESS_NAME_FORMAT,
            StringFormat::Interface => &INTERFACE_FORMAT,
            StringFormat::DnsName => &DNS_NAME_FORMAT,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            StringFormat::Default => "letters, numbers, dashes and underscores",
            StringFormat::AddressName => "letters, numbers, dashes, underscores, dots, slashes and colons",
            StringFormat::Interface => "letters, numbers, dashes, dots, slashes and colons",
            StringFormat::DnsName => "letters, numbers, dashes, underscores and dots",
        }
    }
}

/// Validator attached to an attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "args")]
pub enum Validator {
    StringLengthBetween(usize, usize),
    StringFormat(StringFormat),
    StringDoubleQuoteExclusion,
    StringSpaceExclusion,
    StringOneOf(&'static [&'static str]),
    StringNoneOf(&'static [&'static str]),
    StringCidr,
    StringCidrNetwork,
    StringIpAddress,
    StringWildcardNetwork,
    Int64Between(i64, i64),
    BoolTrue,
    ValueLengthAtLeast(usize),
}

impl Validator {
    /// Check `value`, returning a description of the problem on failure.
    ///
    /// Values of a type the validator does not apply to are accepted; type
    /// mismatches are reported by the schema.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        match (self, value) {
            (Validator::ValueLengthAtLeast(min), Value::Array(items)) => {
                if items.len() < *min {
                    return Err(format!(
                        "list must contain at least {} elements, got: {}",
                        min,
                        items.len()
                    ));
                }
                Ok(())
            }
            (Validator::Int64Between(min, max), Value::Number(n)) => match n.as_i64() {
                Some(v) if v >= *min && v <= *max => Ok(()),
                _ => Err(format!(
                    "value must be between {} and {}, got: {}",
                    min, max, n
                )),
            },
            (Validator::BoolTrue, Value::Bool(b)) => {
                if *b {
                    Ok(())
                } else {
                    Err("value must be true or null, got: false".to_string())
                }
            }
            (_, Value::String(s)) => self.validate_str(s),
            (_, Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .try_for_each(|s| self.validate_str(s)),
            _ => Ok(()),
        }
    }

    fn validate_str(&self, s: &str) -> Result<(), String> {
        match self {
            Validator::StringLengthBetween(min, max) => {
                let len = s.chars().count();
                if len < *min || len > *max {
                    return Err(format!(
                        "string length must be between {} and {}, got: {}",
                        min, max, len
                    ));
                }
            }
            Validator::StringFormat(format) => {
                if !format.regex().is_match(s) {
                    return Err(format!(
                        "'{}' must only contain {}",
                        s,
                        format.describe()
                    ));
                }
            }
            Validator::StringDoubleQuoteExclusion => {
                if s.contains('"') {
                    return Err(format!("'{}' must not contain double quote", s));
                }
            }
            Validator::StringSpaceExclusion => {
                if s.contains(' ') {
                    return Err(format!("'{}' must not contain space", s));
                }
            }
            Validator::StringOneOf(values) => {
                if !values.contains(&s) {
                    return Err(format!(
                        "value must be one of: [{}], got: \"{}\"",
                        values.join(" "),
                        s
                    ));
                }
            }
            Validator::StringNoneOf(values) => {
                if values.contains(&s) {
                    return Err(format!(
                        "value must be none of: [{}], got: \"{}\"",
                        values.join(" "),
                        s
                    ));
                }
            }
            Validator::StringCidr => {
                parse_cidr(s)?;
            }
            Validator::StringCidrNetwork => {
                let net = parse_cidr(s)?;
                if net.trunc() != net {
                    return Err(format!(
                        "'{}' is not a network address, expected {}",
                        s,
                        net.trunc()
                    ));
                }
            }
            Validator::StringIpAddress => {
                IpAddr::from_str(s).map_err(|_| format!("'{}' is not a valid IP address", s))?;
            }
            Validator::StringWildcardNetwork => {
                let (addr, mask) = s
                    .split_once('/')
                    .ok_or_else(|| format!("'{}' is not a wildcard network (address/mask)", s))?;
                match (IpAddr::from_str(addr), IpAddr::from_str(mask)) {
                    (Ok(IpAddr::V4(_)), Ok(IpAddr::V4(_))) | (Ok(IpAddr::V6(_)), Ok(IpAddr::V6(_))) => {}
                    _ => {
                        return Err(format!(
                            "'{}' is not a wildcard network (address/mask)",
                            s
                        ))
                    }
                }
            }
            Validator::Int64Between(..) | Validator::BoolTrue | Validator::ValueLengthAtLeast(_) => {}
        }
        Ok(())
    }
}

fn parse_cidr(s: &str) -> Result<IpNet, String> {
    IpNet::from_str(s).map_err(|_| format!("'{}' is not a valid CIDR", s))
}
