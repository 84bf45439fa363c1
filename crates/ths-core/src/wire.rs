//! Lenient number decoding for payloads coming from the remote API.
//!
//! The backend is not consistent about numeric fields: the same `stockQuantity`
//! may arrive as `12`, `12.0` or `"12"`. Every numeric field on the wire goes
//! through [`NumberLike`] so the rest of the crate only sees proper numbers.

use serde::de::{self, Deserializer, Visitor};
use std::fmt;

/// A JSON scalar that should be read as a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct NumberLike(pub f64);

struct NumberLikeVisitor;

impl<'de> Visitor<'de> for NumberLikeVisitor {
    type Value = NumberLike;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(NumberLike(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(NumberLike(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(NumberLike(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(NumberLike(if v { 1.0 } else { 0.0 }))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            return Ok(NumberLike(0.0));
        }
        trimmed
            .parse::<f64>()
            .map(NumberLike)
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(NumberLike(0.0))
    }
}

impl<'de> de::Deserialize<'de> for NumberLike {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NumberLikeVisitor)
    }
}

/// Reads an integer that may have been sent as a float or a string.
pub(crate) fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let NumberLike(v) = de::Deserialize::deserialize(deserializer)?;
    if !v.is_finite() {
        return Err(de::Error::custom("non-finite number"));
    }
    Ok(v.round() as i64)
}

/// Same as [`lenient_i64`] for optional fields (`null` stays `None`).
pub(crate) fn lenient_opt_i64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i64>, D::Error> {
    let raw: Option<NumberLike> = de::Deserialize::deserialize(deserializer)?;
    Ok(raw.filter(|n| n.0.is_finite()).map(|n| n.0.round() as i64))
}

/// Reads a boolean flag that the backend stores as 0/1.
pub(crate) fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let NumberLike(v) = de::Deserialize::deserialize(deserializer)?;
    Ok(v != 0.0)
}

/// Reads a text field that may be `null` or a bare number (barcodes often are).
pub(crate) fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let raw: Option<serde_json::Value> = de::Deserialize::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}
