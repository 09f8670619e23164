// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Storage-backed records: disks, EFI variable stores and TPM state.

use std::path::Path;
use std::str::FromStr;

use pve_types::DiskSize;

use crate::grammar::Shape;
use crate::record::{field, property_string, Field, PropertyRecord};
use crate::value::choice_value;

/// On-disk image formats.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::Display,
    strum::VariantNames,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ImageFormat {
    Raw,
    Qcow2,
    Qcow,
    Qed,
    Cow,
    Vmdk,
    Cloop,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::Display,
    strum::VariantNames,
)]
#[strum(serialize_all = "lowercase")]
pub enum Media {
    Cdrom,
    Disk,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::Display,
    strum::VariantNames,
)]
#[strum(serialize_all = "lowercase")]
pub enum CacheMode {
    None,
    Writethrough,
    Writeback,
    Unsafe,
    Directsync,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::Display,
    strum::VariantNames,
)]
#[strum(serialize_all = "lowercase")]
pub enum DiscardMode {
    On,
    Ignore,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::Display,
    strum::VariantNames,
)]
#[strum(serialize_all = "snake_case")]
pub enum AioMode {
    Native,
    Threads,
    IoUring,
}

choice_value!(ImageFormat, Media, CacheMode, DiscardMode, AioMode);

/// A disk attached on an `ide`, `sata`, `scsi` or `virtio` slot.
///
/// `file` is the volume reference, either `<datastore>:<path>` or an absolute
/// host path. A freshly requested volume is written `<datastore>:<size>`,
/// with the size in GiB, until the server allocates it.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct StorageDevice {
    pub file: String,
    pub format: Option<ImageFormat>,
    pub media: Option<Media>,
    pub size: Option<DiskSize>,
    pub aio: Option<AioMode>,
    pub backup: Option<bool>,
    pub iops_rd: Option<u64>,
    pub iops_wr: Option<u64>,
    pub iops_rd_max: Option<u64>,
    pub iops_wr_max: Option<u64>,
    pub iothread: Option<bool>,
    pub serial: Option<String>,
    pub ssd: Option<bool>,
    pub discard: Option<DiscardMode>,
    pub cache: Option<CacheMode>,
    pub mbps_rd_max: Option<f64>,
    pub mbps_wr_max: Option<f64>,
    pub mbps_rd: Option<f64>,
    pub mbps_wr: Option<f64>,
    pub replicate: Option<bool>,
}

impl StorageDevice {
    pub fn new(file: impl Into<String>) -> Self {
        Self { file: file.into(), ..Default::default() }
    }

    /// Copies every tuning attribute that `other` sets onto `self`, leaving
    /// the volume reference and format alone. Returns whether anything
    /// changed.
    pub fn merge_with(&mut self, other: &StorageDevice) -> bool {
        fn update<T: Clone + PartialEq>(
            dst: &mut Option<T>,
            src: &Option<T>,
        ) -> bool {
            match src {
                Some(v) if dst.as_ref() != Some(v) => {
                    *dst = Some(v.clone());
                    true
                }
                _ => false,
            }
        }

        let mut updated = update(&mut self.aio, &other.aio);
        updated |= update(&mut self.backup, &other.backup);
        updated |= update(&mut self.mbps_rd_max, &other.mbps_rd_max);
        updated |= update(&mut self.mbps_wr_max, &other.mbps_wr_max);
        updated |= update(&mut self.cache, &other.cache);
        updated |= update(&mut self.discard, &other.discard);
        updated |= update(&mut self.iothread, &other.iothread);
        updated |= update(&mut self.iops_rd, &other.iops_rd);
        updated |= update(&mut self.iops_wr, &other.iops_wr);
        updated |= update(&mut self.media, &other.media);
        updated |= update(&mut self.iops_rd_max, &other.iops_rd_max);
        updated |= update(&mut self.iops_wr_max, &other.iops_wr_max);
        updated |= update(&mut self.mbps_rd, &other.mbps_rd);
        updated |= update(&mut self.mbps_wr, &other.mbps_wr);
        updated |= update(&mut self.replicate, &other.replicate);
        updated |= update(&mut self.ssd, &other.ssd);
        updated |= update(&mut self.serial, &other.serial);
        updated
    }
}

impl PropertyRecord for StorageDevice {
    const NAME: &'static str = "storage device";
    const FIELDS: &'static [Field<Self>] = &[
        field!(required "file" => file, accepted),
        field!("format" => format),
        field!("media" => media),
        field!("size" => size),
        field!("aio" => aio),
        field!("backup" => backup),
        field!("iops_rd" => iops_rd),
        field!("iops_wr" => iops_wr),
        field!("iops_rd_max" => iops_rd_max),
        field!("iops_wr_max" => iops_wr_max),
        field!("iothread" => iothread),
        field!("serial" => serial),
        field!("ssd" => ssd),
        field!("discard" => discard),
        field!("cache" => cache),
        field!("mbps_rd_max" => mbps_rd_max),
        field!("mbps_wr_max" => mbps_wr_max),
        field!("mbps_rd" => mbps_rd),
        field!("mbps_wr" => mbps_wr),
        field!("replicate" => replicate),
    ];

    /// A bare datastore volume with a recognizable extension also tells us
    /// its format, unless one was given explicitly.
    fn finish_decode(&mut self, shape: Shape) {
        if !shape.has_positional() || self.format.is_some() {
            return;
        }
        let Some((_, path)) = self.file.split_once(':') else {
            return;
        };
        self.format = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ImageFormat::from_str(ext).ok());
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::Display,
    strum::VariantNames,
)]
#[strum(ascii_case_insensitive)]
pub enum EfiType {
    #[strum(serialize = "2m")]
    Small,
    #[strum(serialize = "4m")]
    Large,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::Display,
    strum::VariantNames,
)]
pub enum TpmVersion {
    #[strum(serialize = "v1.2")]
    V1_2,
    #[strum(serialize = "v2.0")]
    V2_0,
}

choice_value!(EfiType, TpmVersion);

/// The `efidisk0` volume holding UEFI variables.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct EfiDisk {
    pub file: String,
    pub format: Option<ImageFormat>,
    pub efitype: Option<EfiType>,
    pub pre_enrolled_keys: Option<bool>,
    pub size: Option<DiskSize>,
}

impl PropertyRecord for EfiDisk {
    const NAME: &'static str = "EFI disk";
    const FIELDS: &'static [Field<Self>] = &[
        field!(required "file" => file, accepted),
        field!("format" => format),
        field!("efitype" => efitype),
        field!("pre-enrolled-keys" => pre_enrolled_keys),
        field!("size" => size),
    ];
}

/// The `tpmstate0` volume backing a virtual TPM.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct TpmState {
    pub file: String,
    pub version: Option<TpmVersion>,
    pub size: Option<DiskSize>,
}

impl PropertyRecord for TpmState {
    const NAME: &'static str = "TPM state";
    const FIELDS: &'static [Field<Self>] = &[
        field!(required "file" => file, accepted),
        field!("version" => version),
        field!("size" => size),
    ];
}

property_string!(StorageDevice, EfiDisk, TpmState);
