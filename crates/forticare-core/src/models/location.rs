use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::de::null_default;

/// Postal location attached to a product registration.
///
/// Empty fields are left out of the wire form. Two locations are equal when
/// address, postal code and country code match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "String::is_empty")]
    pub company: String,
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "String::is_empty")]
    pub address: String,
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "String::is_empty")]
    pub city: String,
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "String::is_empty")]
    pub state_or_province: String,
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "String::is_empty")]
    pub country_code: String,
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "String::is_empty")]
    pub postal_code: String,
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "String::is_empty")]
    pub phone: String,
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "String::is_empty")]
    pub fax: String,
}

impl Location {
    pub fn new(
        address: impl Into<String>,
        postal_code: impl Into<String>,
        country_code: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            postal_code: postal_code.into(),
            country_code: country_code.into(),
            ..Default::default()
        }
    }

    pub fn company(mut self, company: impl Into<String>) -> Self {
        self.company = company.into();
        self
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    pub fn state_or_province(mut self, state: impl Into<String>) -> Self {
        self.state_or_province = state.into();
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn fax(mut self, fax: impl Into<String>) -> Self {
        self.fax = fax.into();
        self
    }

    /// JSON object with only the non-empty fields
    pub fn to_wire(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Default::default()))
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
            && self.postal_code == other.postal_code
            && self.country_code == other.country_code
    }
}

impl Eq for Location {}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
        self.postal_code.hash(state);
        self.country_code.hash(state);
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Location({}, {}, {} {} {})",
            self.address, self.city, self.state_or_province, self.country_code, self.postal_code
        )
    }
}
