// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt::Display;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const KIB: u64 = 1024;
const MIB: u64 = KIB * 1024;
const GIB: u64 = MIB * 1024;
const TIB: u64 = GIB * 1024;

/// Units from largest to smallest, with the suffix each is printed with.
const UNITS: &[(u64, char)] = &[(TIB, 'T'), (GIB, 'G'), (MIB, 'M'), (KIB, 'K')];

/// Fractional digits beyond this cannot be scaled without overflowing the
/// intermediate integer arithmetic.
const MAX_FRACTION_DIGITS: usize = 20;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseSizeError {
    #[error("cannot parse disk size {0:?}")]
    Syntax(String),

    #[error("unknown unit {suffix:?} in disk size {input:?}")]
    Unit { input: String, suffix: String },

    #[error("disk size {0:?} has too many fractional digits")]
    Precision(String),

    #[error("disk size {0:?} does not fit in 64 bits")]
    Overflow(String),
}

/// A disk size in bytes.
///
/// Parses from the `<number>[unit]` notation used by the API: the number may
/// carry a fractional part, and the unit is one of `K`, `M`, `G` or `T`,
/// optionally followed by `B` or `iB`, in any case. Every unit is a binary
/// multiple. Fractional byte counts are rounded up.
///
/// `Display` produces the short human form (`1234` bytes is `1.21K`), which is
/// lossy; [`DiskSize::to_exact_string`] produces a form that parses back to the
/// same byte count.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct DiskSize(u64);

impl DiskSize {
    pub const fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    pub const fn from_megabytes(megabytes: u64) -> Self {
        Self(megabytes.saturating_mul(MIB))
    }

    pub const fn from_gigabytes(gigabytes: u64) -> Self {
        Self(gigabytes.saturating_mul(GIB))
    }

    #[inline]
    pub const fn bytes(&self) -> u64 {
        self.0
    }

    /// Whole mebibytes, rounded down.
    #[inline]
    pub const fn in_megabytes(&self) -> u64 {
        self.0 / MIB
    }

    /// Whole gibibytes, rounded down.
    #[inline]
    pub const fn in_gigabytes(&self) -> u64 {
        self.0 / GIB
    }

    /// Formats the size using the largest unit that divides it evenly.
    pub fn to_exact_string(&self) -> String {
        for &(unit, suffix) in UNITS {
            if self.0 >= unit && self.0 % unit == 0 {
                return format!("{}{}", self.0 / unit, suffix);
            }
        }
        self.0.to_string()
    }
}

impl From<u64> for DiskSize {
    fn from(bytes: u64) -> Self {
        Self(bytes)
    }
}

impl From<DiskSize> for u64 {
    fn from(size: DiskSize) -> Self {
        size.0
    }
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

impl FromStr for DiskSize {
    type Err = ParseSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let syntax = || ParseSizeError::Syntax(s.to_string());
        let overflow = || ParseSizeError::Overflow(s.to_string());

        let (whole, rest) = split_digits(s);
        if whole.is_empty() {
            return Err(syntax());
        }
        let (fraction, suffix) = match rest.strip_prefix('.') {
            Some(rest) => match split_digits(rest) {
                ("", _) => return Err(syntax()),
                split => split,
            },
            None => ("", rest),
        };

        let multiplier = match suffix.to_ascii_lowercase().as_str() {
            "" => 1,
            "k" | "kb" | "kib" => KIB,
            "m" | "mb" | "mib" => MIB,
            "g" | "gb" | "gib" => GIB,
            "t" | "tb" | "tib" => TIB,
            _ => {
                return Err(ParseSizeError::Unit {
                    input: s.to_string(),
                    suffix: suffix.to_string(),
                })
            }
        };
        if fraction.len() > MAX_FRACTION_DIGITS {
            return Err(ParseSizeError::Precision(s.to_string()));
        }

        let whole: u128 = whole.parse().map_err(|_| overflow())?;
        let mut bytes =
            whole.checked_mul(u128::from(multiplier)).ok_or_else(overflow)?;
        if !fraction.is_empty() {
            let scale = 10u128.pow(fraction.len() as u32);
            let numerator: u128 = fraction.parse().map_err(|_| syntax())?;
            let partial = (numerator * u128::from(multiplier)).div_ceil(scale);
            bytes = bytes.checked_add(partial).ok_or_else(overflow)?;
        }

        u64::try_from(bytes).map(DiskSize).map_err(|_| overflow())
    }
}

impl Display for DiskSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Some(&(unit, suffix)) =
            UNITS.iter().find(|(unit, _)| self.0 >= *unit)
        else {
            return write!(f, "{}", self.0);
        };

        // Hundredths of the unit, rounded up.
        let hundredths =
            (u128::from(self.0) * 100).div_ceil(u128::from(unit));
        let (whole, frac) = (hundredths / 100, hundredths % 100);
        if frac == 0 {
            write!(f, "{}{}", whole, suffix)
        } else if frac % 10 == 0 {
            write!(f, "{}.{}{}", whole, frac / 10, suffix)
        } else {
            write!(f, "{}.{:02}{}", whole, frac, suffix)
        }
    }
}

impl Serialize for DiskSize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_exact_string())
    }
}

struct DiskSizeVisitor;

impl<'de> de::Visitor<'de> for DiskSizeVisitor {
    type Value = DiskSize;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("a byte count or a size string such as \"8G\"")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(DiskSize(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        u64::try_from(v).map(DiskSize).map_err(|_| {
            E::invalid_value(de::Unexpected::Signed(v), &self)
        })
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        DiskSize::from_str(v).map_err(E::custom)
    }
}

impl<'d> Deserialize<'d> for DiskSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'d>,
    {
        deserializer.deserialize_any(DiskSizeVisitor)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;
    use serde_test::{
        assert_de_tokens, assert_de_tokens_error, assert_tokens, Token,
    };

    const PARSE_CASES: &[(&str, Result<u64, ()>)] = &[
        ("0", Ok(0)),
        ("1001", Ok(1001)),
        ("1K", Ok(1024)),
        ("1kb", Ok(1024)),
        ("1KiB", Ok(1024)),
        ("8G", Ok(8589934592)),
        ("8gib", Ok(8589934592)),
        ("2M", Ok(2097152)),
        ("1.5M", Ok(1572864)),
        ("1.21K", Ok(1240)),
        ("0.1", Ok(1)),
        ("1T", Ok(1099511627776)),
        ("16777216T", Err(())),
        ("", Err(())),
        ("G", Err(())),
        ("8X", Err(())),
        ("1.G", Err(())),
        (".5G", Err(())),
        ("-1", Err(())),
        ("8 G", Err(())),
        ("1.2.3", Err(())),
    ];

    #[test]
    fn disk_size_from_str() {
        for (input, expected) in PARSE_CASES {
            match DiskSize::from_str(input) {
                Ok(size) => assert_eq!(
                    Ok(size.bytes()),
                    *expected,
                    "unexpected parse of {:?}",
                    input
                ),
                Err(_) => assert!(
                    expected.is_err(),
                    "Expected {:?} to parse",
                    input
                ),
            }
        }
    }

    #[test]
    fn disk_size_human_format() {
        let cases: &[(u64, &str)] = &[
            (0, "0"),
            (1001, "1001"),
            (1023, "1023"),
            (1024, "1K"),
            (1234, "1.21K"),
            (1536, "1.5K"),
            (2097152, "2M"),
            (8589934592, "8G"),
            (1099511627776, "1T"),
            (1024 * TIB, "1024T"),
        ];
        for (bytes, expected) in cases {
            assert_eq!(DiskSize::from_bytes(*bytes).to_string(), *expected);
        }
    }

    #[test]
    fn disk_size_exact_format() {
        let cases: &[(u64, &str)] = &[
            (0, "0"),
            (1234, "1234"),
            (1536, "1536"),
            (2048, "2K"),
            (1572864, "1536K"),
            (8589934592, "8G"),
        ];
        for (bytes, expected) in cases {
            assert_eq!(
                DiskSize::from_bytes(*bytes).to_exact_string(),
                *expected
            );
        }
    }

    #[test]
    fn disk_size_unit_helpers() {
        let size = DiskSize::from_gigabytes(3);
        assert_eq!(size.bytes(), 3 * GIB);
        assert_eq!(size.in_gigabytes(), 3);
        assert_eq!(size.in_megabytes(), 3072);
        assert_eq!(DiskSize::from_megabytes(1536).in_gigabytes(), 1);
    }

    #[test]
    fn disk_size_serialization() {
        assert_tokens(&DiskSize::from_gigabytes(8), &[Token::Str("8G")]);
        assert_tokens(&DiskSize::from_bytes(1234), &[Token::Str("1234")]);
        assert_de_tokens(&DiskSize::from_bytes(4096), &[Token::U64(4096)]);
        assert_de_tokens(&DiskSize::from_bytes(1240), &[Token::Str("1.21K")]);

        assert_de_tokens_error::<DiskSize>(
            &[Token::I64(-1)],
            "invalid value: integer `-1`, \
             expected a byte count or a size string such as \"8G\"",
        );
    }

    proptest! {
        #[test]
        fn exact_format_round_trips(bytes in any::<u64>()) {
            let size = DiskSize::from_bytes(bytes);
            let exact = size.to_exact_string();
            prop_assert_eq!(exact.parse::<DiskSize>(), Ok(size));
        }

        #[test]
        fn human_format_never_rounds_down(bytes in 0u64..(1 << 50)) {
            let size = DiskSize::from_bytes(bytes);
            let reparsed: DiskSize = size.to_string().parse().unwrap();
            prop_assert!(reparsed >= size);
        }
    }
}
