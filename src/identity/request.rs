//! Inbound identify request and its validated form.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Raw identify request as received at the boundary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl IdentifyRequest {
    pub fn new(email: Option<String>, phone_number: Option<String>) -> Self {
        Self {
            email,
            phone_number,
        }
    }

    /// Trim both identifiers, treat blanks as absent, and require at least one.
    pub fn validate(&self) -> Result<Identifiers, ValidationError> {
        let email = normalize(self.email.as_deref());
        let phone_number = normalize(self.phone_number.as_deref());
        if email.is_none() && phone_number.is_none() {
            return Err(ValidationError::MissingIdentifier);
        }
        Ok(Identifiers {
            email,
            phone_number,
        })
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validated identifier pair; at least one side is present.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifiers {
    email: Option<String>,
    phone_number: Option<String>,
}

impl Identifiers {
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }
}
