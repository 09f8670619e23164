// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Numbered record slots (`net0`, `scsi3`, `ipconfig1`, ...).
//!
//! A configuration document carries repeatable devices as top-level keys
//! made of a family prefix and a decimal index. [`SlotCodec`] picks the keys
//! belonging to one family out of a document, decodes each slot on its own,
//! and collects failures per key rather than giving up on the first one.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use slog::Logger;
use strum::IntoEnumIterator;

use crate::error::SlotError;
use crate::record::{Decoder, PropertyRecord};

/// A repeatable device family and its slot key prefix.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum SlotFamily {
    Net,
    Ide,
    Sata,
    Scsi,
    Virtio,
    HostPci,
    Usb,
    Numa,
    IpConfig,
    Virtiofs,
    Serial,
    Audio,
    Mp,
    Dev,
}

impl SlotFamily {
    pub fn prefix(&self) -> &'static str {
        self.into()
    }

    /// Number of slots the API allows; valid indices are `0..limit`.
    pub const fn limit(&self) -> u32 {
        match self {
            Self::Net => 32,
            Self::Ide => 4,
            Self::Sata => 6,
            Self::Scsi => 31,
            Self::Virtio => 16,
            Self::HostPci => 16,
            Self::Usb => 14,
            Self::Numa => 8,
            Self::IpConfig => 32,
            Self::Virtiofs => 10,
            Self::Serial => 4,
            Self::Audio => 1,
            Self::Mp => 256,
            Self::Dev => 256,
        }
    }

    /// Whether slots of this family hold [`StorageDevice`]s.
    ///
    /// [`StorageDevice`]: crate::records::StorageDevice
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Ide | Self::Sata | Self::Scsi | Self::Virtio)
    }

    pub fn storage() -> impl Iterator<Item = SlotFamily> {
        Self::iter().filter(Self::is_storage)
    }

    /// Index encoded in `key`, if `key` is the full prefix followed by a
    /// decimal number without leading zeros. The index is not range checked;
    /// one too large for `u32` is reported as `u32::MAX`.
    pub fn slot_index(&self, key: &str) -> Option<u32> {
        let digits = key.strip_prefix(self.prefix())?;
        if digits.is_empty()
            || !digits.bytes().all(|b| b.is_ascii_digit())
            || (digits.len() > 1 && digits.starts_with('0'))
        {
            return None;
        }
        Some(digits.parse().unwrap_or(u32::MAX))
    }

    pub fn slot_key(&self, index: u32) -> String {
        format!("{}{}", self.prefix(), index)
    }

    /// Family and index of a slot key, for any family.
    pub fn parse_key(key: &str) -> Option<(SlotFamily, u32)> {
        Self::iter()
            .find_map(|family| family.slot_index(key).map(|idx| (family, idx)))
    }

    fn check_index(&self, key: &str, index: u32) -> Result<(), SlotError> {
        if index >= self.limit() {
            return Err(SlotError::OutOfRange {
                key: key.to_string(),
                limit: self.limit(),
            });
        }
        Ok(())
    }
}

/// One occupied slot.
///
/// A disabled slot is kept so the record survives a round trip, but it is
/// left out when the collection is encoded.
#[derive(Clone, Debug, PartialEq)]
pub struct Slot<R> {
    pub record: R,
    pub enabled: bool,
}

/// The occupied slots of one family. Gaps between indices are allowed.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotCollection<R> {
    family: SlotFamily,
    slots: BTreeMap<u32, Slot<R>>,
}

impl<R: PropertyRecord> SlotCollection<R> {
    pub fn new(family: SlotFamily) -> Self {
        Self { family, slots: BTreeMap::new() }
    }

    pub fn family(&self) -> SlotFamily {
        self.family
    }

    /// Stores an enabled record at `index`, returning the record it replaced.
    pub fn insert(
        &mut self,
        index: u32,
        record: R,
    ) -> Result<Option<R>, SlotError> {
        self.family.check_index(&self.family.slot_key(index), index)?;
        let old = self.slots.insert(index, Slot { record, enabled: true });
        Ok(old.map(|slot| slot.record))
    }

    pub fn remove(&mut self, index: u32) -> Option<R> {
        self.slots.remove(&index).map(|slot| slot.record)
    }

    pub fn get(&self, index: u32) -> Option<&R> {
        self.slots.get(&index).map(|slot| &slot.record)
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut R> {
        self.slots.get_mut(&index).map(|slot| &mut slot.record)
    }

    /// Marks a slot enabled or disabled. Returns false if the slot is empty.
    pub fn set_enabled(&mut self, index: u32, enabled: bool) -> bool {
        match self.slots.get_mut(&index) {
            Some(slot) => {
                slot.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn is_enabled(&self, index: u32) -> bool {
        self.slots.get(&index).is_some_and(|slot| slot.enabled)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Every occupied slot in index order, enabled or not.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Slot<R>)> {
        self.slots.iter().map(|(idx, slot)| (*idx, slot))
    }

    /// Enabled slots in index order, with their keys.
    pub fn active(&self) -> impl Iterator<Item = (String, &R)> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.enabled)
            .map(|(idx, slot)| (self.family.slot_key(*idx), &slot.record))
    }

    /// Encodes the enabled slots as `(key, value)` pairs in index order.
    pub fn encode(&self) -> Result<Vec<(String, String)>, SlotError> {
        SlotCodec::new(self.family).encode(self)
    }
}

/// Result of decoding a family's slots out of a document.
#[derive(Clone, Debug)]
pub struct SlotDecode<R> {
    pub collection: SlotCollection<R>,
    /// Failures for individual keys, in the order they were encountered.
    pub errors: Vec<SlotError>,
}

/// Decodes and encodes the slots of one family.
#[derive(Clone)]
pub struct SlotCodec {
    family: SlotFamily,
    decoder: Decoder,
    fail_fast: bool,
    log: Logger,
}

impl SlotCodec {
    pub fn new(family: SlotFamily) -> Self {
        Self {
            family,
            decoder: Decoder::new(),
            fail_fast: false,
            log: Logger::root(slog::Discard, slog::o!()),
        }
    }

    pub fn with_logger(mut self, log: &Logger) -> Self {
        self.log = log.new(slog::o!("family" => self.family.prefix()));
        self
    }

    pub fn decoder(mut self, decoder: Decoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Stop at the first failing slot instead of collecting every failure.
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn family(&self) -> SlotFamily {
        self.family
    }

    /// Decodes the slots found among `(key, value)` pairs. Keys that are not
    /// slots of this family are ignored.
    pub fn decode<'a, R, I>(&self, pairs: I) -> SlotDecode<R>
    where
        R: PropertyRecord,
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.decode_entries(
            pairs.into_iter().map(|(key, value)| (key, Some(value))),
        )
    }

    /// Decodes the slots found in a JSON configuration document.
    pub fn decode_document<R: PropertyRecord>(
        &self,
        document: &Map<String, Value>,
    ) -> SlotDecode<R> {
        self.decode_entries(
            document.iter().map(|(key, value)| (key.as_str(), value.as_str())),
        )
    }

    fn decode_entries<'a, R, I>(&self, entries: I) -> SlotDecode<R>
    where
        R: PropertyRecord,
        I: Iterator<Item = (&'a str, Option<&'a str>)>,
    {
        let mut collection = SlotCollection::new(self.family);
        let mut errors = Vec::new();

        for (key, value) in entries {
            let Some(index) = self.family.slot_index(key) else {
                continue;
            };
            match self.decode_slot(key, index, value) {
                Ok(record) => {
                    collection
                        .slots
                        .insert(index, Slot { record, enabled: true });
                }
                Err(err) => {
                    slog::warn!(self.log, "failed to decode slot";
                        "key" => key,
                        "error" => %err
                    );
                    errors.push(err);
                    if self.fail_fast {
                        break;
                    }
                }
            }
        }

        SlotDecode { collection, errors }
    }

    fn decode_slot<R: PropertyRecord>(
        &self,
        key: &str,
        index: u32,
        value: Option<&str>,
    ) -> Result<R, SlotError> {
        self.family.check_index(key, index)?;
        let value =
            value.ok_or_else(|| SlotError::NotAString { key: key.to_string() })?;
        self.decoder
            .decode(value)
            .map_err(|source| SlotError::Record { key: key.to_string(), source })
    }

    /// Encodes the enabled slots of `collection` in index order.
    pub fn encode<R: PropertyRecord>(
        &self,
        collection: &SlotCollection<R>,
    ) -> Result<Vec<(String, String)>, SlotError> {
        let mut pairs = Vec::with_capacity(collection.len());
        for (index, slot) in collection.iter() {
            let key = self.family.slot_key(index);
            if !slot.enabled {
                slog::debug!(self.log, "skipping disabled slot"; "key" => &key);
                continue;
            }
            match slot.record.encode() {
                Ok(value) => pairs.push((key, value)),
                Err(source) => return Err(SlotError::Record { key, source }),
            }
        }
        Ok(pairs)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;
    use crate::records::{NetworkDevice, NicModel, StorageDevice};

    #[test]
    fn slot_keys_match_the_full_prefix() {
        const CASES: &[(&str, Option<(SlotFamily, u32)>)] = &[
            ("scsi0", Some((SlotFamily::Scsi, 0))),
            ("scsi30", Some((SlotFamily::Scsi, 30))),
            ("scsihw", None),
            ("scsi", None),
            ("scsi01", None),
            ("virtio3", Some((SlotFamily::Virtio, 3))),
            ("virtiofs3", Some((SlotFamily::Virtiofs, 3))),
            ("hostpci1", Some((SlotFamily::HostPci, 1))),
            ("ipconfig0", Some((SlotFamily::IpConfig, 0))),
            ("mp12", Some((SlotFamily::Mp, 12))),
            ("dev0", Some((SlotFamily::Dev, 0))),
            ("device0", None),
            ("net-1", None),
            ("efidisk0", None),
            ("memory", None),
        ];
        for (key, expected) in CASES {
            assert_eq!(SlotFamily::parse_key(key), *expected, "key {}", key);
        }
        assert_eq!(SlotFamily::Scsi.slot_index("virtio0"), None);
        assert_eq!(SlotFamily::Net.slot_index("net99999999999"), Some(u32::MAX));
        assert_eq!(SlotFamily::HostPci.slot_key(2), "hostpci2");
    }

    #[test]
    fn storage_families() {
        let storage: Vec<_> = SlotFamily::storage().collect();
        assert_eq!(
            storage,
            vec![
                SlotFamily::Ide,
                SlotFamily::Sata,
                SlotFamily::Scsi,
                SlotFamily::Virtio
            ]
        );
    }

    #[test]
    fn decode_collects_errors_per_slot() {
        let pairs = [
            ("scsi0", "local-lvm:vm-100-disk-0,size=8G"),
            ("scsihw", "virtio-scsi-pci"),
            ("scsi2", "size=8G"),
            ("scsi5", "local-lvm:vm-100-disk-1,iothread=1"),
            ("scsi31", "local-lvm:vm-100-disk-9"),
            ("net0", "virtio=AA:BB:CC:DD:EE:FF"),
        ];
        let decoded: SlotDecode<StorageDevice> =
            SlotCodec::new(SlotFamily::Scsi).decode(pairs);

        let indices: Vec<u32> =
            decoded.collection.iter().map(|(idx, _)| idx).collect();
        assert_eq!(indices, vec![0, 5]);

        assert_eq!(decoded.errors.len(), 2);
        assert_eq!(decoded.errors[0].key(), "scsi2");
        assert!(matches!(
            &decoded.errors[0],
            SlotError::Record { source, .. }
                if source.kind() == ErrorKind::MissingRequiredField
        ));
        assert_eq!(
            decoded.errors[1],
            SlotError::OutOfRange { key: "scsi31".to_string(), limit: 31 }
        );
    }

    #[test]
    fn fail_fast_stops_at_first_error() {
        let pairs = [("net0", "bridge=vmbr0"), ("net1", "model=e1000")];
        let decoded: SlotDecode<NetworkDevice> =
            SlotCodec::new(SlotFamily::Net).fail_fast(true).decode(pairs);
        assert_eq!(decoded.errors.len(), 1);
        assert!(decoded.collection.is_empty());
    }

    #[test]
    fn decode_document_rejects_non_strings() {
        let document = serde_json::json!({
            "net0": "virtio=AA:BB:CC:DD:EE:FF,bridge=vmbr0",
            "net1": 17,
            "name": "web",
        });
        let Value::Object(document) = document else {
            panic!("expected an object");
        };
        let decoded: SlotDecode<NetworkDevice> =
            SlotCodec::new(SlotFamily::Net).decode_document(&document);
        assert_eq!(decoded.collection.len(), 1);
        assert_eq!(
            decoded.errors,
            vec![SlotError::NotAString { key: "net1".to_string() }]
        );
    }

    #[test]
    fn disabled_slots_are_not_encoded() {
        let mut nics = SlotCollection::new(SlotFamily::Net);
        nics.insert(0, NetworkDevice::new(NicModel::Virtio)).unwrap();
        nics.insert(2, NetworkDevice::new(NicModel::E1000)).unwrap();
        assert!(nics.set_enabled(0, false));
        assert!(!nics.set_enabled(1, false));
        assert!(!nics.is_enabled(0));

        assert_eq!(
            nics.encode().unwrap(),
            vec![("net2".to_string(), "model=e1000".to_string())]
        );
        // Still present, still round-trippable.
        assert_eq!(nics.get(0).unwrap().encode().unwrap(), "model=virtio");
        assert_eq!(nics.len(), 2);
    }

    #[test]
    fn insert_checks_the_family_limit() {
        let mut audio = SlotCollection::<NetworkDevice>::new(SlotFamily::Audio);
        let err = audio.insert(1, NetworkDevice::default()).unwrap_err();
        assert_eq!(err, SlotError::OutOfRange { key: "audio1".to_string(), limit: 1 });
    }
}
