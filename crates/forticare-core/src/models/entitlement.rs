use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::de::{null_default, optional_date_time};

/// A FlexVM entitlement listed by `/entitlements/list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    #[serde(default, deserialize_with = "null_default")]
    pub config_id: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub account_id: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub serial_number: String,
    #[serde(default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(default, deserialize_with = "optional_date_time")]
    pub start_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "optional_date_time")]
    pub end_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "null_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_default")]
    pub token: String,
    #[serde(default, deserialize_with = "null_default")]
    pub token_status: String,
}

impl Entitlement {
    pub fn is_expired(&self) -> bool {
        self.status.eq_ignore_ascii_case("EXPIRED")
    }
}
