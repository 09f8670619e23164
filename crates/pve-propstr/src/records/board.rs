// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Machine-wide settings: firmware tables, boot and startup ordering, the
//! guest agent, and the display.

use crate::record::{field, property_string, Field, PropertyRecord};
use crate::value::choice_value;

/// SMBIOS type 1 fields (`smbios1`).
///
/// When `base64` is set the string fields hold base64 text, which may end in
/// `=` padding.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct Smbios {
    pub base64: Option<bool>,
    pub family: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial: Option<String>,
    pub sku: Option<String>,
    pub uuid: Option<String>,
    pub version: Option<String>,
}

impl PropertyRecord for Smbios {
    const NAME: &'static str = "SMBIOS settings";
    const FIELDS: &'static [Field<Self>] = &[
        field!("base64" => base64),
        field!("family" => family),
        field!("manufacturer" => manufacturer),
        field!("product" => product),
        field!("serial" => serial),
        field!("sku" => sku),
        field!("uuid" => uuid),
        field!("version" => version),
    ];
}

/// The `boot` key: device keys tried in order.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct BootOrder {
    pub order: Option<Vec<String>>,
}

impl BootOrder {
    pub fn new<I, S>(devices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { order: Some(devices.into_iter().map(Into::into).collect()) }
    }
}

impl PropertyRecord for BootOrder {
    const NAME: &'static str = "boot order";
    const FIELDS: &'static [Field<Self>] = &[field!("order" => order)];
}

/// The `startup` key: position and delays (in seconds) for host boot and
/// shutdown.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct StartupOrder {
    pub order: Option<u32>,
    pub up: Option<u32>,
    pub down: Option<u32>,
}

impl PropertyRecord for StartupOrder {
    const NAME: &'static str = "startup order";
    const FIELDS: &'static [Field<Self>] = &[
        field!("order" => order),
        field!("up" => up),
        field!("down" => down),
    ];
}

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
pub enum AgentType {
    Virtio,
    Isa,
}

choice_value!(AgentType);

/// The `agent` key.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct AgentSettings {
    pub enabled: Option<bool>,
    pub fstrim_cloned_disks: Option<bool>,
    pub agent_type: Option<AgentType>,
}

impl PropertyRecord for AgentSettings {
    const NAME: &'static str = "agent settings";
    const FIELDS: &'static [Field<Self>] = &[
        field!("enabled" => enabled, accepted),
        field!("fstrim_cloned_disks" => fstrim_cloned_disks),
        field!("type" => agent_type),
    ];
}

/// The `vga` key.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct VgaDevice {
    /// Display adapter, e.g. `std`, `virtio`, `qxl` or `serial0`.
    pub vga_type: Option<String>,
    /// MiB.
    pub memory: Option<u32>,
}

impl PropertyRecord for VgaDevice {
    const NAME: &'static str = "VGA device";
    const FIELDS: &'static [Field<Self>] = &[
        field!("type" => vga_type, accepted),
        field!("memory" => memory),
    ];
}

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
pub enum VideoStreaming {
    Off,
    All,
    Filter,
}

choice_value!(VideoStreaming);

/// The `spice_enhancements` key.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct SpiceEnhancements {
    pub foldersharing: Option<bool>,
    pub videostreaming: Option<VideoStreaming>,
}

impl PropertyRecord for SpiceEnhancements {
    const NAME: &'static str = "SPICE enhancements";
    const FIELDS: &'static [Field<Self>] = &[
        field!("foldersharing" => foldersharing),
        field!("videostreaming" => videostreaming),
    ];
}

property_string!(
    Smbios,
    BootOrder,
    StartupOrder,
    AgentSettings,
    VgaDevice,
    SpiceEnhancements,
);

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn smbios_values_keep_padding() {
        const INPUT: &str = "base64=1,manufacturer=UHJveG1veA==,\
                             uuid=5b0f6a92-6c5a-4d8e-9d4c-0f3bd5c0e7a1";
        let smbios = Smbios::decode(INPUT).unwrap();
        assert_eq!(smbios.base64, Some(true));
        assert_eq!(smbios.manufacturer.as_deref(), Some("UHJveG1veA=="));
        assert_eq!(smbios.encode().unwrap(), INPUT);
    }

    #[test]
    fn boot_and_startup_order() {
        let boot = BootOrder::decode("order=scsi0;ide2;net0").unwrap();
        assert_eq!(boot, BootOrder::new(["scsi0", "ide2", "net0"]));
        assert_eq!(boot.encode().unwrap(), "order=scsi0;ide2;net0");

        let startup = StartupOrder::decode("order=2,up=30,down=60").unwrap();
        assert_eq!(
            startup,
            StartupOrder { order: Some(2), up: Some(30), down: Some(60) }
        );
        assert_eq!(
            StartupOrder::decode("up=-5").unwrap_err().kind(),
            ErrorKind::TypeMismatch
        );
    }

    #[test]
    fn agent_accepts_bare_enable_flag() {
        let agent = AgentSettings::decode("1,fstrim_cloned_disks=1,type=isa")
            .unwrap();
        assert_eq!(
            agent,
            AgentSettings {
                enabled: Some(true),
                fstrim_cloned_disks: Some(true),
                agent_type: Some(AgentType::Isa),
            }
        );
        assert_eq!(
            agent.encode().unwrap(),
            "enabled=1,fstrim_cloned_disks=1,type=isa"
        );
        assert_eq!(
            AgentSettings::decode("1,type=serial").unwrap_err().kind(),
            ErrorKind::TypeMismatch
        );
    }

    #[test]
    fn empty_values_decode_to_empty_records() {
        assert_eq!(VgaDevice::decode("").unwrap(), VgaDevice::default());
        assert_eq!(VgaDevice::default().encode().unwrap(), "");
        assert_eq!(Smbios::decode("  ").unwrap(), Smbios::default());
    }

    #[test]
    fn vga_and_spice() {
        let vga = VgaDevice::decode("qxl,memory=32").unwrap();
        assert_eq!(vga.vga_type.as_deref(), Some("qxl"));
        assert_eq!(vga.memory, Some(32));
        assert_eq!(vga.encode().unwrap(), "type=qxl,memory=32");

        let spice =
            SpiceEnhancements::decode("foldersharing=1,videostreaming=filter")
                .unwrap();
        assert_eq!(spice.videostreaming, Some(VideoStreaming::Filter));
        assert_eq!(
            spice.encode().unwrap(),
            "foldersharing=1,videostreaming=filter"
        );
    }
}
