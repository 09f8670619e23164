// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reading records out of a JSON configuration document.

use serde_json::{Map, Value};
use slog::Logger;

use crate::collection::{SlotCodec, SlotCollection, SlotFamily};
use crate::error::SlotError;
use crate::record::{Decoder, PropertyRecord};
use crate::value::PropertyValue;

/// Pulls individual keys out of a configuration document, collecting a
/// [`SlotError`] for each key that fails instead of stopping.
///
/// With fail-fast set, the first failure ends reading: every later call
/// returns nothing.
pub struct DocumentReader<'a> {
    document: &'a Map<String, Value>,
    decoder: Decoder,
    fail_fast: bool,
    log: Logger,
    errors: Vec<SlotError>,
}

impl<'a> DocumentReader<'a> {
    pub fn new(document: &'a Map<String, Value>, log: &Logger) -> Self {
        Self {
            document,
            decoder: Decoder::new(),
            fail_fast: false,
            log: log.clone(),
            errors: Vec::new(),
        }
    }

    pub fn decoder(mut self, decoder: Decoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    fn stopped(&self) -> bool {
        self.fail_fast && !self.errors.is_empty()
    }

    fn fail(&mut self, err: SlotError) {
        slog::warn!(self.log, "failed to decode key";
            "key" => err.key(),
            "error" => %err
        );
        self.errors.push(err);
    }

    /// The string value of `key`, if present.
    pub fn string(&mut self, key: &str) -> Option<String> {
        if self.stopped() {
            return None;
        }
        match self.document.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            _ => {
                self.fail(SlotError::NotAString { key: key.to_string() });
                None
            }
        }
    }

    /// Decodes the record stored under `key`, if present.
    pub fn record<R: PropertyRecord>(&mut self, key: &str) -> Option<R> {
        let value = self.string(key)?;
        match self.decoder.decode(&value) {
            Ok(record) => Some(record),
            Err(source) => {
                self.fail(SlotError::Record { key: key.to_string(), source });
                None
            }
        }
    }

    /// Parses the plain value stored under `key`, if present.
    pub fn value<T: PropertyValue>(&mut self, key: &str) -> Option<T> {
        let value = self.string(key)?;
        match T::parse_value(&value) {
            Ok(v) => Some(v),
            Err(source) => {
                self.fail(SlotError::Value {
                    key: key.to_string(),
                    value,
                    source,
                });
                None
            }
        }
    }

    /// Decodes every slot of `family`.
    pub fn slots<R: PropertyRecord>(
        &mut self,
        family: SlotFamily,
    ) -> SlotCollection<R> {
        if self.stopped() {
            return SlotCollection::new(family);
        }
        let decoded = SlotCodec::new(family)
            .with_logger(&self.log)
            .decoder(self.decoder)
            .fail_fast(self.fail_fast)
            .decode_document(self.document);
        self.errors.extend(decoded.errors);
        decoded.collection
    }

    /// Failures collected so far, in the order they were hit.
    pub fn finish(self) -> Vec<SlotError> {
        self.errors
    }
}
