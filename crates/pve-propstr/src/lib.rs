// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property-string codec for VM and container configuration records.
//!
//! The management API encodes most device settings as compact attribute
//! lists such as `local-lvm:vm-100-disk-0,size=32G,ssd=1`. This crate turns
//! those strings into typed records and back again:
//!
//! - [`grammar`] tokenizes and assembles attribute lists.
//! - [`value`] parses and formats the individual values.
//! - [`record`] drives a record type's field table and cross-field rules.
//! - [`records`] has one type per configuration key.
//! - [`collection`] handles numbered slots (`net0`, `scsi3`, ...).
//! - [`hardware`] decodes a whole VM or container configuration document.
//!
//! Decoding then encoding a record always yields its canonical form, and a
//! canonical form decodes back to an equal record.

pub mod classify;
pub mod collection;
pub mod document;
pub mod error;
pub mod grammar;
pub mod hardware;
pub mod record;
pub mod records;
pub mod value;

pub use collection::{Slot, SlotCodec, SlotCollection, SlotDecode, SlotFamily};
pub use error::{ErrorKind, PropertyError, SlotError, ValueError};
pub use hardware::{
    ContainerDecode, ContainerHardware, DiskSlot, HardwareDecode,
    HardwareDecoder, VmHardware,
};
pub use record::{Decoder, PropertyRecord, UnknownFields};
