//! Shape checks for operator-supplied values.
//!
//! Shared by the dialogs (to re-prompt) and the state model setters (to refuse
//! writes), so both layers agree on what is well formed.

use std::net::Ipv4Addr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::error::ValidationError;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*(?::(?P<port>\d{1,5}))?(?:/[^\s]*)?$")
        .expect("valid url regex")
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});

static TOS_SENTENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^I, [^<>]+, read and agreed with the terms and conditions above\.$")
        .expect("valid tos regex")
});

/// Example acceptance sentence shown to the operator.
pub const TOS_SENTENCE_TEMPLATE: &str =
    "I, <first name> <last name>, read and agreed with the terms and conditions above.";

pub fn validate_url(url: &str) -> Result<(), ValidationError> {
    let port_ok = |caps: &regex::Captures<'_>| {
        caps.name("port")
            .is_none_or(|port| port.as_str().parse::<u16>().is_ok())
    };
    match URL_RE.captures(url) {
        Some(caps) if port_ok(&caps) => Ok(()),
        _ => Err(ValidationError::Url(url.to_string())),
    }
}

/// Dotted-quad IPv4 only; leading zeros and octets above 255 are rejected.
pub fn validate_ip(ip: &str) -> Result<(), ValidationError> {
    let octets_ok = ip
        .split('.')
        .all(|o| !o.is_empty() && (o == "0" || !o.starts_with('0')));
    match ip.parse::<Ipv4Addr>() {
        Ok(_) if octets_ok => Ok(()),
        _ => Err(ValidationError::Ip(ip.to_string())),
    }
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::Email(email.to_string()))
    }
}

pub fn validate_tos_acceptance(sentence: &str) -> Result<(), ValidationError> {
    if TOS_SENTENCE_RE.is_match(sentence.trim()) {
        Ok(())
    } else {
        Err(ValidationError::TosAcceptance)
    }
}

/// Parse a strictly positive token amount.
pub fn parse_amount(raw: &str) -> Result<Decimal, ValidationError> {
    let value: Decimal = raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::Amount(format!("'{raw}' is not a number")))?;
    validate_amount(value)?;
    Ok(value)
}

pub fn validate_amount(value: Decimal) -> Result<(), ValidationError> {
    if value <= Decimal::ZERO {
        return Err(ValidationError::Amount(format!(
            "{value} must be greater than zero"
        )));
    }
    Ok(())
}
