//! Lenient deserializers for FortiCare payloads.
//!
//! The API sends `null` for empty lists and strings, pads some descriptions
//! with trailing spaces, and uses both `2021-09-23T00:00:00` and
//! `2021-12-21T10:41:26.153` for timestamps.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};

/// Accepted timestamp layout; fractional seconds are optional.
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Deserialize `null` as `T::default()`
pub fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize a string with surrounding whitespace removed; `null` is empty
pub fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|s| s.trim().to_string()).unwrap_or_default())
}

/// Deserialize an optional timestamp; `null` and `""` are `None`
pub fn optional_date_time<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDateTime::parse_from_str(s.trim(), DATE_TIME_FORMAT)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
