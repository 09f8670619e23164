// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Errors raised while decoding or encoding property strings.

use pve_types::ParseSizeError;
use thiserror::Error;

/// Failure to interpret one value as its field's primitive type.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("expected an integer")]
    Integer(#[source] std::num::ParseIntError),

    #[error("expected a number")]
    Float(#[source] std::num::ParseFloatError),

    #[error("expected a finite number")]
    NotFinite,

    #[error(transparent)]
    Size(#[from] ParseSizeError),

    #[error("expected one of: {}", .0.join(", "))]
    Choice(&'static [&'static str]),
}

/// The five ways a property string can fail to decode or encode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedToken,
    UnknownField,
    TypeMismatch,
    ContradictingFields,
    MissingRequiredField,
}

/// A decode or encode failure, tagged with the record type it occurred in.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PropertyError {
    #[error("{record}: malformed token {token:?}: {reason}")]
    MalformedToken { record: &'static str, token: String, reason: &'static str },

    #[error("{record}: unknown field {key:?} (value {value:?})")]
    UnknownField { record: &'static str, key: String, value: String },

    #[error("{record}: invalid value {value:?} for field {key:?}")]
    TypeMismatch {
        record: &'static str,
        key: &'static str,
        value: String,
        #[source]
        source: ValueError,
    },

    #[error("{record}: {rule}: {detail}")]
    ContradictingFields {
        record: &'static str,
        rule: &'static str,
        detail: String,
    },

    #[error("{record}: missing required field {field}")]
    MissingRequiredField { record: &'static str, field: String },
}

impl PropertyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedToken { .. } => ErrorKind::MalformedToken,
            Self::UnknownField { .. } => ErrorKind::UnknownField,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::ContradictingFields { .. } => ErrorKind::ContradictingFields,
            Self::MissingRequiredField { .. } => {
                ErrorKind::MissingRequiredField
            }
        }
    }

    /// Name of the record type the error was raised for.
    pub fn record(&self) -> &'static str {
        match self {
            Self::MalformedToken { record, .. }
            | Self::UnknownField { record, .. }
            | Self::TypeMismatch { record, .. }
            | Self::ContradictingFields { record, .. }
            | Self::MissingRequiredField { record, .. } => record,
        }
    }
}

/// A failure attributed to one key of a configuration document.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SlotError {
    #[error("{key}: {source}")]
    Record {
        key: String,
        #[source]
        source: PropertyError,
    },

    #[error("{key}: invalid value {value:?}")]
    Value {
        key: String,
        value: String,
        #[source]
        source: ValueError,
    },

    #[error("{key}: slot index exceeds the limit of {limit} for this family")]
    OutOfRange { key: String, limit: u32 },

    #[error("{key}: expected a string value")]
    NotAString { key: String },
}

impl SlotError {
    pub fn key(&self) -> &str {
        match self {
            Self::Record { key, .. }
            | Self::Value { key, .. }
            | Self::OutOfRange { key, .. }
            | Self::NotAString { key } => key,
        }
    }
}
