// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The table-driven record codec.
//!
//! A record type describes itself with a static table of [`Field`]s (wire
//! key, whether it is required, whether it may be written bare, and a pair of
//! decode/encode functions) and a static list of cross-field [`Rule`]s. The
//! engine in this module does the rest: tokenizing, routing each token to its
//! field, duplicate detection, required-field checks, rule evaluation, and
//! assembling the canonical encoding in table order.

use serde_derive::{Deserialize, Serialize};

use crate::error::{PropertyError, ValueError};
use crate::grammar::{self, Shape, Token};

/// Whether, and how, a field may be written without its key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Positional {
    /// Always written as `key=value`.
    Never,
    /// Accepted bare as the first token; written as `key=value`.
    Accepted,
    /// Accepted bare, and written bare ahead of every other token.
    Preferred,
    /// Accepted bare, and written bare only if no other field is present.
    WhenAlone,
}

/// One row of a record's field table.
pub struct Field<R> {
    pub key: &'static str,
    pub required: bool,
    pub positional: Positional,
    pub decode: fn(&mut R, &str) -> Result<(), ValueError>,
    /// Returns `None` when the field is absent.
    pub encode: fn(&R) -> Option<String>,
    /// Returns a list item that would not survive re-parsing.
    pub ambiguous: fn(&R) -> Option<String>,
}

/// A cross-field constraint, checked after decode and before encode.
pub enum Rule<R> {
    /// While `antecedent` holds, the boolean field `consequent_key` is
    /// implied true. Decoding fills it in when absent; an explicit false is a
    /// contradiction. Encoding omits it when it would be redundant.
    Implies {
        name: &'static str,
        antecedent_key: &'static str,
        consequent_key: &'static str,
        antecedent: fn(&R) -> bool,
        consequent: fn(&R) -> Option<bool>,
        imply: fn(&mut R),
    },

    /// Exactly one of the listed fields must be present.
    ExactlyOne { name: &'static str, keys: &'static [&'static str] },
}

impl<R: PropertyRecord> Rule<R> {
    fn check(&self, record: &R) -> Result<(), PropertyError> {
        match self {
            Rule::Implies {
                name,
                antecedent_key,
                consequent_key,
                antecedent,
                consequent,
                ..
            } => {
                if antecedent(record) && consequent(record) == Some(false) {
                    return Err(PropertyError::ContradictingFields {
                        record: R::NAME,
                        rule: *name,
                        detail: format!(
                            "{} implies {}, which is explicitly disabled",
                            antecedent_key, consequent_key
                        ),
                    });
                }
            }
            Rule::ExactlyOne { name, keys } => {
                let present: Vec<&str> = keys
                    .iter()
                    .copied()
                    .filter(|key| field_present(record, key))
                    .collect();
                match present.len() {
                    1 => {}
                    0 => {
                        return Err(PropertyError::MissingRequiredField {
                            record: R::NAME,
                            field: keys.join(" or "),
                        })
                    }
                    _ => {
                        return Err(PropertyError::ContradictingFields {
                            record: R::NAME,
                            rule: *name,
                            detail: format!(
                                "only one of {} may be set",
                                present.join(", ")
                            ),
                        })
                    }
                }
            }
        }
        Ok(())
    }

    /// Encoding additionally requires an implied field to be filled in, as
    /// decoding leaves it.
    fn check_filled(&self, record: &R) -> Result<(), PropertyError> {
        if let Rule::Implies {
            antecedent_key,
            consequent_key,
            antecedent,
            consequent,
            ..
        } = self
        {
            if antecedent(record) && consequent(record).is_none() {
                return Err(PropertyError::MissingRequiredField {
                    record: R::NAME,
                    field: format!(
                        "{} (implied by {})",
                        consequent_key, antecedent_key
                    ),
                });
            }
        }
        Ok(())
    }

    fn normalize(&self, record: &mut R) {
        if let Rule::Implies { antecedent, consequent, imply, .. } = self {
            if antecedent(record) && consequent(record).is_none() {
                imply(record);
            }
        }
    }

    fn makes_redundant(&self, record: &R, key: &str) -> bool {
        match self {
            Rule::Implies { consequent_key, antecedent, consequent, .. } => {
                *consequent_key == key
                    && antecedent(record)
                    && consequent(record) == Some(true)
            }
            Rule::ExactlyOne { .. } => false,
        }
    }
}

fn field_present<R: PropertyRecord>(record: &R, key: &str) -> bool {
    R::field(key).is_some_and(|field| (field.encode)(record).is_some())
}

/// A configuration record with a property-string encoding.
pub trait PropertyRecord: Clone + Default + 'static {
    /// Record type name used in error messages.
    const NAME: &'static str;

    /// Fields in canonical encode order. At most one field may accept a
    /// positional value.
    const FIELDS: &'static [Field<Self>];

    const RULES: &'static [Rule<Self>] = &[];

    /// Rewrites a key that is not in the field table into canonical tokens.
    fn expand_alias(
        _key: &str,
        _value: &str,
    ) -> Option<Vec<(&'static str, String)>> {
        None
    }

    /// Called once every token has been applied, before rules are checked.
    fn finish_decode(&mut self, _shape: Shape) {}

    fn field(key: &str) -> Option<&'static Field<Self>> {
        Self::FIELDS.iter().find(|field| field.key == key)
    }

    fn decode(input: &str) -> Result<Self, PropertyError> {
        Decoder::new().decode(input)
    }

    fn encode(&self) -> Result<String, PropertyError> {
        encode_record(self)
    }
}

/// What to do with a key that no field claims.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFields {
    #[default]
    Reject,
    Ignore,
}

/// Decodes attribute lists into records.
#[derive(Clone, Copy, Debug, Default)]
pub struct Decoder {
    unknown_fields: UnknownFields,
}

impl Decoder {
    pub const fn new() -> Self {
        Self { unknown_fields: UnknownFields::Reject }
    }

    pub const fn unknown_fields(mut self, policy: UnknownFields) -> Self {
        self.unknown_fields = policy;
        self
    }

    pub fn decode<R: PropertyRecord>(
        &self,
        input: &str,
    ) -> Result<R, PropertyError> {
        let tokens = grammar::tokenize(R::NAME, input)?;
        let shape = Shape::of(&tokens);
        let mut record = R::default();
        let mut seen = Vec::with_capacity(tokens.len());

        for token in &tokens {
            let Some(key) = token.key else {
                let field = R::FIELDS
                    .iter()
                    .find(|field| field.positional != Positional::Never)
                    .ok_or_else(|| PropertyError::MalformedToken {
                        record: R::NAME,
                        token: token.value.to_string(),
                        reason: "positional value not accepted",
                    })?;
                assign(&mut record, &mut seen, field, token.value)?;
                continue;
            };

            if let Some(field) = R::field(key) {
                assign(&mut record, &mut seen, field, token.value)?;
            } else if let Some(expanded) = R::expand_alias(key, token.value) {
                for (key, value) in expanded {
                    let field = R::field(key).ok_or_else(|| {
                        PropertyError::UnknownField {
                            record: R::NAME,
                            key: key.to_string(),
                            value: value.clone(),
                        }
                    })?;
                    assign(&mut record, &mut seen, field, &value)?;
                }
            } else if self.unknown_fields == UnknownFields::Reject {
                return Err(PropertyError::UnknownField {
                    record: R::NAME,
                    key: key.to_string(),
                    value: token.value.to_string(),
                });
            }
        }

        for field in R::FIELDS.iter().filter(|field| field.required) {
            if !seen.contains(&field.key) || (field.encode)(&record).is_none()
            {
                return Err(PropertyError::MissingRequiredField {
                    record: R::NAME,
                    field: field.key.to_string(),
                });
            }
        }

        record.finish_decode(shape);
        for rule in R::RULES {
            rule.check(&record)?;
            rule.normalize(&mut record);
        }
        Ok(record)
    }
}

fn assign<R: PropertyRecord>(
    record: &mut R,
    seen: &mut Vec<&'static str>,
    field: &'static Field<R>,
    value: &str,
) -> Result<(), PropertyError> {
    if seen.contains(&field.key) {
        return Err(PropertyError::MalformedToken {
            record: R::NAME,
            token: format!("{}={}", field.key, value),
            reason: "field given more than once",
        });
    }
    (field.decode)(record, value).map_err(|source| {
        PropertyError::TypeMismatch {
            record: R::NAME,
            key: field.key,
            value: value.to_string(),
            source,
        }
    })?;
    seen.push(field.key);
    Ok(())
}

/// Encodes a record in canonical field order.
pub fn encode_record<R: PropertyRecord>(
    record: &R,
) -> Result<String, PropertyError> {
    for rule in R::RULES {
        rule.check(record)?;
        rule.check_filled(record)?;
    }

    let mut values = Vec::with_capacity(R::FIELDS.len());
    for field in R::FIELDS {
        match (field.encode)(record) {
            Some(value) => {
                if !R::RULES
                    .iter()
                    .any(|rule| rule.makes_redundant(record, field.key))
                {
                    values.push((field, value));
                }
            }
            None if field.required => {
                return Err(PropertyError::MissingRequiredField {
                    record: R::NAME,
                    field: field.key.to_string(),
                })
            }
            None => {}
        }
    }

    let alone = values.len() == 1;
    let mut tokens = Vec::with_capacity(values.len());
    for (field, value) in &values {
        if value.contains(grammar::PRIMARY_SEPARATOR) {
            return Err(PropertyError::MalformedToken {
                record: R::NAME,
                token: format!("{}={}", field.key, value),
                reason: "value contains the list separator",
            });
        }
        if let Some(item) = (field.ambiguous)(record) {
            return Err(PropertyError::MalformedToken {
                record: R::NAME,
                token: format!("{}={}", field.key, item),
                reason: "list item contains the item separator",
            });
        }
        let bare = match field.positional {
            Positional::Preferred => true,
            Positional::WhenAlone => alone,
            Positional::Never | Positional::Accepted => false,
        };
        // A bare value must not be mistaken for a pair or for nothing.
        if bare
            && !value.is_empty()
            && !value.contains(grammar::KEY_VALUE_SEPARATOR)
        {
            tokens.insert(0, Token::positional(value));
        } else {
            tokens.push(Token::pair(field.key, value));
        }
    }
    Ok(grammar::assemble(tokens))
}

/// Builds a [`Field`] from a struct member.
///
/// `field!("key" => member)` maps an `Option<T>` member; absence is `None`.
/// `field!(required "key" => member)` maps a plain `T` member; a blank value
/// (see [`PropertyValue::is_blank`]) counts as absent. Either form may end
/// with `, accepted`, `, preferred` or `, when_alone` to allow the field to
/// be written positionally.
///
/// [`PropertyValue::is_blank`]: crate::value::PropertyValue::is_blank
macro_rules! field {
    (required $key:literal => $member:ident $(, $pos:ident)?) => {
        $crate::record::Field {
            key: $key,
            required: true,
            positional: $crate::record::field!(@pos $($pos)?),
            decode: |r, v| {
                r.$member = $crate::value::PropertyValue::parse_value(v)?;
                Ok(())
            },
            encode: |r| {
                if $crate::value::PropertyValue::is_blank(&r.$member) {
                    None
                } else {
                    Some($crate::value::PropertyValue::format_value(&r.$member))
                }
            },
            ambiguous: |r| {
                $crate::value::PropertyValue::ambiguous_item(&r.$member)
            },
        }
    };
    ($key:literal => $member:ident $(, $pos:ident)?) => {
        $crate::record::Field {
            key: $key,
            required: false,
            positional: $crate::record::field!(@pos $($pos)?),
            decode: |r, v| {
                r.$member =
                    Some($crate::value::PropertyValue::parse_value(v)?);
                Ok(())
            },
            encode: |r| {
                r.$member
                    .as_ref()
                    .map($crate::value::PropertyValue::format_value)
            },
            ambiguous: |r| {
                r.$member
                    .as_ref()
                    .and_then($crate::value::PropertyValue::ambiguous_item)
            },
        }
    };
    (@pos) => { $crate::record::Positional::Never };
    (@pos accepted) => { $crate::record::Positional::Accepted };
    (@pos preferred) => { $crate::record::Positional::Preferred };
    (@pos when_alone) => { $crate::record::Positional::WhenAlone };
}
pub(crate) use field;

/// Gives a record `FromStr` and serde impls that go through its property
/// string, for use where records sit inside JSON documents.
macro_rules! property_string {
    ($($t:ty),* $(,)?) => {
        $(
            impl std::str::FromStr for $t {
                type Err = $crate::error::PropertyError;
                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    <$t as $crate::record::PropertyRecord>::decode(s)
                }
            }

            impl serde::Serialize for $t {
                fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
                where
                    S: serde::Serializer,
                {
                    let s = $crate::record::PropertyRecord::encode(self)
                        .map_err(serde::ser::Error::custom)?;
                    serializer.serialize_str(&s)
                }
            }

            impl<'d> serde::Deserialize<'d> for $t {
                fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
                where
                    D: serde::Deserializer<'d>,
                {
                    let s = <String as serde::Deserialize>::deserialize(
                        deserializer,
                    )?;
                    <$t as $crate::record::PropertyRecord>::decode(&s)
                        .map_err(serde::de::Error::custom)
                }
            }
        )*
    };
}
pub(crate) use property_string;
