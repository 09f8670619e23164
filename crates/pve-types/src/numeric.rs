// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::convert::Infallible;
use std::fmt::Display;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A boolean carried on the wire as the digit `1` or `0`.
///
/// Decoding never fails: `1` and `true` are true, and every other value,
/// including ones that are not booleans at all, is false.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug)]
pub struct NumericBool(pub bool);

impl NumericBool {
    pub fn parse_lenient(s: &str) -> bool {
        matches!(s, "1" | "true")
    }

    #[inline]
    pub const fn get(&self) -> bool {
        self.0
    }
}

impl From<bool> for NumericBool {
    fn from(b: bool) -> Self {
        Self(b)
    }
}

impl From<NumericBool> for bool {
    fn from(b: NumericBool) -> Self {
        b.0
    }
}

impl FromStr for NumericBool {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Self::parse_lenient(s)))
    }
}

impl Display for NumericBool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(if self.0 { "1" } else { "0" })
    }
}

impl Serialize for NumericBool {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(u8::from(self.0))
    }
}

struct NumericBoolVisitor;

impl<'de> de::Visitor<'de> for NumericBoolVisitor {
    type Value = NumericBool;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("a boolean, 0 or 1")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(NumericBool(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(NumericBool(v == 1))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(NumericBool(v == 1))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(NumericBool(v == 1.0))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(NumericBool(NumericBool::parse_lenient(v)))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(NumericBool(false))
    }
}

impl<'d> Deserialize<'d> for NumericBool {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'d>,
    {
        deserializer.deserialize_any(NumericBoolVisitor)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlexibleIntError {
    #[error("cannot parse integer from an empty string")]
    Empty,

    #[error("cannot parse integer {0:?}: unsupported numeric format")]
    Format(String),

    #[error("cannot parse integer {0:?}: value out of range")]
    Range(String),
}

/// A signed 64-bit integer that the API sometimes sends quoted, and sometimes
/// in floating-point or scientific notation.
///
/// Non-integral values are truncated toward zero.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct FlexibleInt(pub i64);

impl FlexibleInt {
    #[inline]
    pub const fn get(&self) -> i64 {
        self.0
    }

    fn from_f64(v: f64, input: &str) -> Result<Self, FlexibleIntError> {
        // i64::MAX is not representable as f64; the bound below is 2^63.
        const LIMIT: f64 = 9_223_372_036_854_775_808.0;
        let truncated = v.trunc();
        if !truncated.is_finite() || truncated >= LIMIT || truncated < -LIMIT
        {
            return Err(FlexibleIntError::Range(input.to_string()));
        }
        Ok(Self(truncated as i64))
    }
}

impl From<i64> for FlexibleInt {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

impl FromStr for FlexibleInt {
    type Err = FlexibleIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(FlexibleIntError::Empty);
        }
        if let Ok(v) = i64::from_str(s) {
            return Ok(Self(v));
        }
        // Reject the spellings f64 accepts that are not numerals.
        if !s.bytes().all(|b| {
            b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-')
        }) {
            return Err(FlexibleIntError::Format(s.to_string()));
        }
        match f64::from_str(s) {
            Ok(v) => Self::from_f64(v, s),
            Err(_) => Err(FlexibleIntError::Format(s.to_string())),
        }
    }
}

impl Display for FlexibleInt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for FlexibleInt {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(self.0)
    }
}

struct FlexibleIntVisitor;

impl<'de> de::Visitor<'de> for FlexibleIntVisitor {
    type Value = FlexibleInt;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("an integer, optionally quoted")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(FlexibleInt(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        i64::try_from(v).map(FlexibleInt).map_err(|_| {
            E::invalid_value(de::Unexpected::Unsigned(v), &self)
        })
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        FlexibleInt::from_f64(v, &v.to_string()).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        FlexibleInt::from_str(v).map_err(E::custom)
    }
}

impl<'d> Deserialize<'d> for FlexibleInt {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'d>,
    {
        deserializer.deserialize_any(FlexibleIntVisitor)
    }
}
