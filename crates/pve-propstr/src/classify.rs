// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Facts derived from slot keys and volume references.

use crate::records::{Media, StorageDevice};

/// The interface a slot key belongs to: its leading run of non-digits.
///
/// `scsi2` gives `scsi`; a key with no digits is returned whole.
pub fn interface_class(slot_key: &str) -> &str {
    match slot_key.find(|c: char| c.is_ascii_digit()) {
        Some(idx) => &slot_key[..idx],
        None => slot_key,
    }
}

/// A volume reference split into its parts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VolumeReference<'a> {
    /// Datastore the volume lives on; `None` for an absolute host path.
    pub datastore_id: Option<&'a str>,
    /// Path of the volume, or `None` while the volume is still only a size
    /// request (`local-lvm:8`).
    pub path: Option<&'a str>,
}

impl VolumeReference<'_> {
    pub fn is_allocated(&self) -> bool {
        self.path.is_some()
    }
}

/// Splits `<datastore>:<path>` on its first `:`.
pub fn split_volume_reference(file: &str) -> VolumeReference<'_> {
    match file.split_once(':') {
        None => VolumeReference { datastore_id: None, path: Some(file) },
        Some((datastore_id, rest)) => {
            let unallocated = rest.bytes().all(|b| b.is_ascii_digit());
            VolumeReference {
                datastore_id: Some(datastore_id),
                path: (!unallocated).then_some(rest),
            }
        }
    }
}

impl StorageDevice {
    pub fn volume(&self) -> VolumeReference<'_> {
        split_volume_reference(&self.file)
    }

    pub fn datastore_id(&self) -> Option<&str> {
        self.volume().datastore_id
    }

    pub fn path_in_datastore(&self) -> Option<&str> {
        self.volume().path
    }

    /// Whether the volume follows the naming of volumes created for VM
    /// `vm_id`: `vm-<id>-...` on block storage, `<id>/vm-<id>-...` on
    /// directory storage. Unallocated volumes belong to no VM.
    pub fn is_owned_by(&self, vm_id: u32) -> bool {
        let Some(path) = self.path_in_datastore() else {
            return false;
        };
        let block = format!("vm-{}-", vm_id);
        let directory = format!("{}/vm-{}-", vm_id, vm_id);
        path.starts_with(&block) || path.starts_with(&directory)
    }

    /// Whether this is the cloud-init drive generated for VM `vm_id`.
    pub fn is_cloud_init_drive(&self, vm_id: u32) -> bool {
        self.media == Some(Media::Cdrom)
            && self.file.contains(&format!("vm-{}-cloudinit", vm_id))
    }
}
