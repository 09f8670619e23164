// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The decoded hardware of one VM or container.
//!
//! [`VmHardware`] holds every property-string valued key of a VM
//! configuration document as a typed record, and [`ContainerHardware`] does
//! the same for containers. Keys holding plain scalars (`memory`, `cores`,
//! `hostname`, ...) are not their concern and are skipped.

use serde_json::{Map, Value};
use slog::Logger;

use crate::classify::interface_class;
use crate::collection::{SlotCollection, SlotFamily};
use crate::document::DocumentReader;
use crate::error::{PropertyError, SlotError};
use crate::record::{Decoder, PropertyRecord};
use crate::records::*;

/// A storage slot together with its key.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiskSlot<'a> {
    pub family: SlotFamily,
    pub index: u32,
    pub device: &'a StorageDevice,
    pub enabled: bool,
}

impl DiskSlot<'_> {
    pub fn key(&self) -> String {
        self.family.slot_key(self.index)
    }

    /// Interface class of the slot, e.g. `scsi`.
    pub fn interface(&self) -> String {
        interface_class(&self.key()).to_string()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VmHardware {
    pub ide: SlotCollection<StorageDevice>,
    pub sata: SlotCollection<StorageDevice>,
    pub scsi: SlotCollection<StorageDevice>,
    pub virtio: SlotCollection<StorageDevice>,
    pub net: SlotCollection<NetworkDevice>,
    pub hostpci: SlotCollection<PciDevice>,
    pub usb: SlotCollection<UsbDevice>,
    pub numa: SlotCollection<NumaNode>,
    pub serial: SlotCollection<SerialDevice>,
    pub virtiofs: SlotCollection<VirtiofsShare>,
    pub audio: SlotCollection<AudioDevice>,

    pub cpu: Option<CpuEmulation>,
    pub efi_disk: Option<EfiDisk>,
    pub tpm_state: Option<TpmState>,
    pub smbios: Option<Smbios>,
    pub boot: Option<BootOrder>,
    pub startup: Option<StartupOrder>,
    pub agent: Option<AgentSettings>,
    pub vga: Option<VgaDevice>,
    pub watchdog: Option<WatchdogDevice>,
    pub rng: Option<RngDevice>,
    pub shared_memory: Option<SharedMemory>,
    pub spice_enhancements: Option<SpiceEnhancements>,
    pub cloud_init: Option<CloudInitConfig>,
}

impl Default for VmHardware {
    fn default() -> Self {
        Self {
            ide: SlotCollection::new(SlotFamily::Ide),
            sata: SlotCollection::new(SlotFamily::Sata),
            scsi: SlotCollection::new(SlotFamily::Scsi),
            virtio: SlotCollection::new(SlotFamily::Virtio),
            net: SlotCollection::new(SlotFamily::Net),
            hostpci: SlotCollection::new(SlotFamily::HostPci),
            usb: SlotCollection::new(SlotFamily::Usb),
            numa: SlotCollection::new(SlotFamily::Numa),
            serial: SlotCollection::new(SlotFamily::Serial),
            virtiofs: SlotCollection::new(SlotFamily::Virtiofs),
            audio: SlotCollection::new(SlotFamily::Audio),
            cpu: None,
            efi_disk: None,
            tpm_state: None,
            smbios: None,
            boot: None,
            startup: None,
            agent: None,
            vga: None,
            watchdog: None,
            rng: None,
            shared_memory: None,
            spice_enhancements: None,
            cloud_init: None,
        }
    }
}

/// The property-string valued keys of a container configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct ContainerHardware {
    pub rootfs: Option<RootFs>,
    pub mount_points: SlotCollection<MountPoint>,
    pub net: SlotCollection<ContainerNetwork>,
    pub devices: SlotCollection<DeviceNode>,
    pub features: Option<ContainerFeatures>,
    pub startup: Option<StartupOrder>,
}

impl Default for ContainerHardware {
    fn default() -> Self {
        Self {
            rootfs: None,
            mount_points: SlotCollection::new(SlotFamily::Mp),
            net: SlotCollection::new(SlotFamily::Net),
            devices: SlotCollection::new(SlotFamily::Dev),
            features: None,
            startup: None,
        }
    }
}

/// Result of decoding a container configuration document.
#[derive(Clone, Debug)]
pub struct ContainerDecode {
    pub hardware: ContainerHardware,
    pub errors: Vec<SlotError>,
}

/// Result of decoding a configuration document.
#[derive(Clone, Debug)]
pub struct HardwareDecode {
    pub hardware: VmHardware,
    /// One entry per key that failed to decode.
    pub errors: Vec<SlotError>,
}

/// Options for decoding a configuration document into [`VmHardware`].
#[derive(Clone)]
pub struct HardwareDecoder {
    decoder: Decoder,
    fail_fast: bool,
    log: Logger,
}

impl Default for HardwareDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareDecoder {
    pub fn new() -> Self {
        Self {
            decoder: Decoder::new(),
            fail_fast: false,
            log: Logger::root(slog::Discard, slog::o!()),
        }
    }

    pub fn with_logger(mut self, log: &Logger) -> Self {
        self.log = log.new(slog::o!("component" => "hardware"));
        self
    }

    pub fn decoder(mut self, decoder: Decoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn decode(&self, document: &Map<String, Value>) -> HardwareDecode {
        let mut reader = DocumentReader::new(document, &self.log)
            .decoder(self.decoder)
            .fail_fast(self.fail_fast);

        let hardware = VmHardware {
            ide: reader.slots(SlotFamily::Ide),
            sata: reader.slots(SlotFamily::Sata),
            scsi: reader.slots(SlotFamily::Scsi),
            virtio: reader.slots(SlotFamily::Virtio),
            net: reader.slots(SlotFamily::Net),
            hostpci: reader.slots(SlotFamily::HostPci),
            usb: reader.slots(SlotFamily::Usb),
            numa: reader.slots(SlotFamily::Numa),
            serial: reader.slots(SlotFamily::Serial),
            virtiofs: reader.slots(SlotFamily::Virtiofs),
            audio: reader.slots(SlotFamily::Audio),
            cpu: reader.record("cpu"),
            efi_disk: reader.record("efidisk0"),
            tpm_state: reader.record("tpmstate0"),
            smbios: reader.record("smbios1"),
            boot: reader.record("boot"),
            startup: reader.record("startup"),
            agent: reader.record("agent"),
            vga: reader.record("vga"),
            watchdog: reader.record("watchdog"),
            rng: reader.record("rng0"),
            shared_memory: reader.record("ivshmem"),
            spice_enhancements: reader.record("spice_enhancements"),
            cloud_init: CloudInitConfig::read(&mut reader),
        };

        let errors = reader.finish();
        slog::debug!(self.log, "decoded configuration document";
            "keys" => document.len(),
            "errors" => errors.len()
        );
        HardwareDecode { hardware, errors }
    }

    pub fn decode_container(
        &self,
        document: &Map<String, Value>,
    ) -> ContainerDecode {
        let mut reader = DocumentReader::new(document, &self.log)
            .decoder(self.decoder)
            .fail_fast(self.fail_fast);

        let hardware = ContainerHardware {
            rootfs: reader.record("rootfs"),
            mount_points: reader.slots(SlotFamily::Mp),
            net: reader.slots(SlotFamily::Net),
            devices: reader.slots(SlotFamily::Dev),
            features: reader.record("features"),
            startup: reader.record("startup"),
        };

        let errors = reader.finish();
        slog::debug!(self.log, "decoded container document";
            "keys" => document.len(),
            "errors" => errors.len()
        );
        ContainerDecode { hardware, errors }
    }
}

fn encode_single<R: PropertyRecord>(
    pairs: &mut Vec<(String, String)>,
    key: &str,
    record: &Option<R>,
) -> Result<(), SlotError> {
    if let Some(record) = record {
        let value = record.encode().map_err(|source: PropertyError| {
            SlotError::Record { key: key.to_string(), source }
        })?;
        pairs.push((key.to_string(), value));
    }
    Ok(())
}

impl VmHardware {
    /// Decodes a configuration document with default options.
    pub fn decode(document: &Map<String, Value>) -> HardwareDecode {
        HardwareDecoder::new().decode(document)
    }

    pub fn storage(
        &self,
        family: SlotFamily,
    ) -> Option<&SlotCollection<StorageDevice>> {
        match family {
            SlotFamily::Ide => Some(&self.ide),
            SlotFamily::Sata => Some(&self.sata),
            SlotFamily::Scsi => Some(&self.scsi),
            SlotFamily::Virtio => Some(&self.virtio),
            _ => None,
        }
    }

    /// Every storage slot, grouped by interface and in index order.
    pub fn disks(&self) -> Vec<DiskSlot<'_>> {
        SlotFamily::storage()
            .filter_map(|family| self.storage(family))
            .flat_map(|collection| {
                collection.iter().map(move |(index, slot)| DiskSlot {
                    family: collection.family(),
                    index,
                    device: &slot.record,
                    enabled: slot.enabled,
                })
            })
            .collect()
    }

    /// Storage slots whose interface class is `class` (`scsi`, `virtio`, ...).
    pub fn disks_by_interface(&self, class: &str) -> Vec<DiskSlot<'_>> {
        self.disks()
            .into_iter()
            .filter(|disk| disk.interface() == class)
            .collect()
    }

    /// Storage slots holding volumes created for VM `vm_id`, excluding its
    /// cloud-init drive.
    pub fn owned_disks(&self, vm_id: u32) -> Vec<DiskSlot<'_>> {
        self.disks()
            .into_iter()
            .filter(|disk| {
                disk.device.is_owned_by(vm_id)
                    && !disk.device.is_cloud_init_drive(vm_id)
            })
            .collect()
    }

    pub fn cloud_init_drive(&self, vm_id: u32) -> Option<DiskSlot<'_>> {
        self.disks()
            .into_iter()
            .find(|disk| disk.device.is_cloud_init_drive(vm_id))
    }

    /// Encodes every active device as `(key, value)` pairs.
    pub fn encode(&self) -> Result<Vec<(String, String)>, SlotError> {
        let mut pairs = Vec::new();

        encode_single(&mut pairs, "cpu", &self.cpu)?;
        pairs.extend(self.numa.encode()?);
        encode_single(&mut pairs, "efidisk0", &self.efi_disk)?;
        encode_single(&mut pairs, "tpmstate0", &self.tpm_state)?;
        for family in SlotFamily::storage() {
            if let Some(collection) = self.storage(family) {
                pairs.extend(collection.encode()?);
            }
        }
        pairs.extend(self.net.encode()?);
        pairs.extend(self.hostpci.encode()?);
        pairs.extend(self.usb.encode()?);
        pairs.extend(self.serial.encode()?);
        pairs.extend(self.audio.encode()?);
        pairs.extend(self.virtiofs.encode()?);
        encode_single(&mut pairs, "smbios1", &self.smbios)?;
        encode_single(&mut pairs, "boot", &self.boot)?;
        encode_single(&mut pairs, "startup", &self.startup)?;
        encode_single(&mut pairs, "agent", &self.agent)?;
        encode_single(&mut pairs, "vga", &self.vga)?;
        encode_single(&mut pairs, "watchdog", &self.watchdog)?;
        encode_single(&mut pairs, "rng0", &self.rng)?;
        encode_single(&mut pairs, "ivshmem", &self.shared_memory)?;
        encode_single(
            &mut pairs,
            "spice_enhancements",
            &self.spice_enhancements,
        )?;
        if let Some(cloud_init) = &self.cloud_init {
            pairs.extend(cloud_init.encode()?);
        }

        Ok(pairs)
    }
}

impl ContainerHardware {
    /// Decodes a container configuration document with default options.
    pub fn decode(document: &Map<String, Value>) -> ContainerDecode {
        HardwareDecoder::new().decode_container(document)
    }

    /// Mount points holding volumes created for container `ct_id`.
    pub fn owned_mount_points(
        &self,
        ct_id: u32,
    ) -> Vec<(String, &MountPoint)> {
        self.mount_points
            .iter()
            .filter(|(_, slot)| slot.record.is_owned_by(ct_id))
            .map(|(index, slot)| (SlotFamily::Mp.slot_key(index), &slot.record))
            .collect()
    }

    /// Encodes every active device as `(key, value)` pairs.
    pub fn encode(&self) -> Result<Vec<(String, String)>, SlotError> {
        let mut pairs = Vec::new();
        encode_single(&mut pairs, "rootfs", &self.rootfs)?;
        pairs.extend(self.mount_points.encode()?);
        pairs.extend(self.net.encode()?);
        pairs.extend(self.devices.encode()?);
        encode_single(&mut pairs, "features", &self.features)?;
        encode_single(&mut pairs, "startup", &self.startup)?;
        Ok(pairs)
    }
}
