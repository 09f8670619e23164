// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Codecs for the scalar values carried inside an attribute list.

use std::str::FromStr;

use pve_types::{DiskSize, NumericBool};

use crate::error::ValueError;
use crate::grammar;

/// A type that can appear as the value half of a `key=value` token.
pub trait PropertyValue: Sized {
    fn parse_value(s: &str) -> Result<Self, ValueError>;

    fn format_value(&self) -> String;

    /// Whether a required field holding this value should count as missing.
    fn is_blank(&self) -> bool {
        false
    }

    /// A formatted list item that would be split apart when parsed again.
    fn ambiguous_item(&self) -> Option<String> {
        None
    }
}

impl PropertyValue for String {
    fn parse_value(s: &str) -> Result<Self, ValueError> {
        Ok(s.to_string())
    }

    fn format_value(&self) -> String {
        self.clone()
    }

    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

/// Booleans never fail to parse: see [`NumericBool`].
impl PropertyValue for bool {
    fn parse_value(s: &str) -> Result<Self, ValueError> {
        Ok(NumericBool::parse_lenient(s))
    }

    fn format_value(&self) -> String {
        NumericBool(*self).to_string()
    }
}

macro_rules! integer_value {
    ($($t:ty),*) => {
        $(
            impl PropertyValue for $t {
                fn parse_value(s: &str) -> Result<Self, ValueError> {
                    <$t>::from_str(s).map_err(ValueError::Integer)
                }

                fn format_value(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

integer_value!(u8, u16, u32, u64, i32, i64);

impl PropertyValue for f64 {
    fn parse_value(s: &str) -> Result<Self, ValueError> {
        let v = f64::from_str(s).map_err(ValueError::Float)?;
        if !v.is_finite() {
            return Err(ValueError::NotFinite);
        }
        Ok(v)
    }

    fn format_value(&self) -> String {
        self.to_string()
    }
}

/// Sizes are written in their exact form so that re-parsing is lossless.
impl PropertyValue for DiskSize {
    fn parse_value(s: &str) -> Result<Self, ValueError> {
        Ok(DiskSize::from_str(s)?)
    }

    fn format_value(&self) -> String {
        self.to_exact_string()
    }
}

/// Vectors are secondary lists.
impl<T: PropertyValue> PropertyValue for Vec<T> {
    fn parse_value(s: &str) -> Result<Self, ValueError> {
        grammar::split_list(s).into_iter().map(T::parse_value).collect()
    }

    fn format_value(&self) -> String {
        grammar::join_list(self.iter().map(T::format_value))
    }

    fn is_blank(&self) -> bool {
        self.is_empty()
    }

    fn ambiguous_item(&self) -> Option<String> {
        self.iter()
            .map(T::format_value)
            .find(|item| item.contains(grammar::SECONDARY_SEPARATOR))
    }
}

/// Implements [`PropertyValue`] for a fieldless enum deriving strum's
/// `EnumString`, `Display` and `VariantNames`.
macro_rules! choice_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl $crate::value::PropertyValue for $t {
                fn parse_value(
                    s: &str,
                ) -> Result<Self, $crate::error::ValueError> {
                    <$t as std::str::FromStr>::from_str(s).map_err(|_| {
                        $crate::error::ValueError::Choice(
                            <$t as strum::VariantNames>::VARIANTS,
                        )
                    })
                }

                fn format_value(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}
pub(crate) use choice_value;

#[cfg(test)]
mod test {
    use super::*;

    #[derive(
        Clone,
        Copy,
        Debug,
        PartialEq,
        Eq,
        strum::EnumString,
        strum::Display,
        strum::VariantNames,
    )]
    #[strum(serialize_all = "lowercase")]
    enum Flavor {
        Vanilla,
        Chocolate,
    }
    choice_value!(Flavor);

    #[test]
    fn booleans_are_lenient() {
        assert_eq!(bool::parse_value("1"), Ok(true));
        assert_eq!(bool::parse_value("true"), Ok(true));
        assert_eq!(bool::parse_value("0"), Ok(false));
        assert_eq!(bool::parse_value("nope"), Ok(false));
        assert_eq!(true.format_value(), "1");
        assert_eq!(false.format_value(), "0");
    }

    #[test]
    fn integers_and_floats() {
        assert_eq!(u32::parse_value("42"), Ok(42));
        assert!(matches!(u32::parse_value("-1"), Err(ValueError::Integer(_))));
        assert!(matches!(u16::parse_value("70000"), Err(ValueError::Integer(_))));
        assert_eq!(f64::parse_value("1.5"), Ok(1.5));
        assert_eq!(f64::parse_value("inf"), Err(ValueError::NotFinite));
        assert_eq!(2.0f64.format_value(), "2");
        assert_eq!(0.25f64.format_value(), "0.25");
    }

    #[test]
    fn sizes_use_exact_form() {
        let size = DiskSize::parse_value("1.21K").unwrap();
        assert_eq!(size.bytes(), 1240);
        assert_eq!(size.format_value(), "1240");
        assert_eq!(DiskSize::from_gigabytes(8).format_value(), "8G");
        assert!(matches!(
            DiskSize::parse_value("8Q"),
            Err(ValueError::Size(_))
        ));
    }

    #[test]
    fn secondary_lists() {
        assert_eq!(Vec::<u16>::parse_value("10;20;30"), Ok(vec![10, 20, 30]));
        assert_eq!(Vec::<u16>::parse_value(""), Ok(vec![]));
        assert!(Vec::<u16>::parse_value("10;x").is_err());
        assert_eq!(vec![1u16, 2].format_value(), "1;2");
        assert!(Vec::<String>::new().is_blank());
    }

    #[test]
    fn list_items_with_separator_are_ambiguous() {
        let flags = vec!["+aes".to_string(), "+a;+b".to_string()];
        assert_eq!(flags.ambiguous_item(), Some("+a;+b".to_string()));
        assert_eq!(vec![1u16, 2].ambiguous_item(), None);
        assert_eq!("a;b".to_string().ambiguous_item(), None);
    }

    #[test]
    fn choices() {
        assert_eq!(Flavor::parse_value("chocolate"), Ok(Flavor::Chocolate));
        assert_eq!(Flavor::Vanilla.format_value(), "vanilla");
        let err = Flavor::parse_value("mint").unwrap_err();
        assert_eq!(err.to_string(), "expected one of: vanilla, chocolate");
    }
}
