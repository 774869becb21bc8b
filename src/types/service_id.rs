// ABOUTME: DNS-compatible service identifier validation.
// ABOUTME: Ensures service ids follow RFC 1123 label requirements.

use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceIdError {
    #[error("service id cannot be empty")]
    Empty,

    #[error("service id exceeds maximum length of 63 characters")]
    TooLong,

    #[error("service id cannot start with a hyphen")]
    StartsWithHyphen,

    #[error("service id cannot end with a hyphen")]
    EndsWithHyphen,

    #[error("service id must be lowercase")]
    NotLowercase,

    #[error("invalid character in service id: '{0}'")]
    InvalidChar(char),
}

/// Identifies a service on the platform. RFC 1123 label rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceId(String);

impl ServiceId {
    pub fn new(value: &str) -> Result<Self, ServiceIdError> {
        if value.is_empty() {
            return Err(ServiceIdError::Empty);
        }

        if value.len() > 63 {
            return Err(ServiceIdError::TooLong);
        }

        if value.starts_with('-') {
            return Err(ServiceIdError::StartsWithHyphen);
        }

        if value.ends_with('-') {
            return Err(ServiceIdError::EndsWithHyphen);
        }

        for c in value.chars() {
            if c.is_ascii_uppercase() {
                return Err(ServiceIdError::NotLowercase);
            }
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' {
                return Err(ServiceIdError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ServiceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}
