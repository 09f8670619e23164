// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Auxiliary emulated devices.

use crate::record::{field, property_string, Field, PropertyRecord};
use crate::value::choice_value;

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
pub enum WatchdogModel {
    I6300esb,
    Ib700,
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
pub enum WatchdogAction {
    Reset,
    Shutdown,
    Poweroff,
    Pause,
    Debug,
    None,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    strum::EnumString,
    strum::Display,
    strum::VariantNames,
)]
pub enum AudioModel {
    #[default]
    #[strum(serialize = "ich9-intel-hda")]
    Ich9IntelHda,
    #[strum(serialize = "intel-hda")]
    IntelHda,
    #[strum(serialize = "AC97")]
    Ac97,
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
pub enum AudioDriver {
    Spice,
    None,
}

choice_value!(WatchdogModel, WatchdogAction, AudioModel, AudioDriver);

/// The `watchdog` key.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct WatchdogDevice {
    pub model: Option<WatchdogModel>,
    /// What the host does when the guest stops petting the watchdog.
    pub action: Option<WatchdogAction>,
}

impl PropertyRecord for WatchdogDevice {
    const NAME: &'static str = "watchdog";
    const FIELDS: &'static [Field<Self>] = &[
        field!("model" => model, accepted),
        field!("action" => action),
    ];
}

/// The `rng0` key.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct RngDevice {
    /// Host entropy source, e.g. `/dev/urandom`.
    pub source: String,
    /// Bytes of entropy allowed per `period`.
    pub max_bytes: Option<u32>,
    /// Milliseconds.
    pub period: Option<u32>,
}

impl PropertyRecord for RngDevice {
    const NAME: &'static str = "RNG device";
    const FIELDS: &'static [Field<Self>] = &[
        field!(required "source" => source, accepted),
        field!("max_bytes" => max_bytes),
        field!("period" => period),
    ];
}

/// The `ivshmem` key: an inter-VM shared memory region.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct SharedMemory {
    /// MiB.
    pub size: u64,
    pub name: Option<String>,
}

impl PropertyRecord for SharedMemory {
    const NAME: &'static str = "shared memory";
    const FIELDS: &'static [Field<Self>] = &[
        field!(required "size" => size),
        field!("name" => name),
    ];
}

/// An `audio<N>` device.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct AudioDevice {
    pub device: AudioModel,
    pub driver: Option<AudioDriver>,
}

impl PropertyRecord for AudioDevice {
    const NAME: &'static str = "audio device";
    const FIELDS: &'static [Field<Self>] = &[
        field!(required "device" => device),
        field!("driver" => driver),
    ];
}

/// A `serial<N>` port: a host device path or `socket`.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct SerialDevice {
    pub path: String,
}

impl SerialDevice {
    pub fn socket() -> Self {
        Self { path: "socket".to_string() }
    }
}

impl PropertyRecord for SerialDevice {
    const NAME: &'static str = "serial device";
    const FIELDS: &'static [Field<Self>] =
        &[field!(required "path" => path, preferred)];
}

property_string!(
    WatchdogDevice,
    RngDevice,
    SharedMemory,
    AudioDevice,
    SerialDevice,
);

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn watchdog() {
        let wd = WatchdogDevice::decode("i6300esb,action=poweroff").unwrap();
        assert_eq!(wd.model, Some(WatchdogModel::I6300esb));
        assert_eq!(wd.action, Some(WatchdogAction::Poweroff));
        assert_eq!(wd.encode().unwrap(), "model=i6300esb,action=poweroff");

        assert_eq!(WatchdogDevice::decode("").unwrap(), WatchdogDevice::default());
        assert_eq!(
            WatchdogDevice::decode("model=i8042").unwrap_err().kind(),
            ErrorKind::TypeMismatch
        );
    }

    #[test]
    fn rng_and_shared_memory() {
        let rng =
            RngDevice::decode("/dev/urandom,max_bytes=1024,period=1000").unwrap();
        assert_eq!(rng.source, "/dev/urandom");
        assert_eq!(
            rng.encode().unwrap(),
            "source=/dev/urandom,max_bytes=1024,period=1000"
        );
        assert_eq!(
            RngDevice::decode("period=1000").unwrap_err().kind(),
            ErrorKind::MissingRequiredField
        );

        let shm = SharedMemory::decode("size=64,name=looking-glass").unwrap();
        assert_eq!(shm.size, 64);
        assert_eq!(shm.name.as_deref(), Some("looking-glass"));
        assert_eq!(
            SharedMemory::decode("name=x").unwrap_err().kind(),
            ErrorKind::MissingRequiredField
        );
    }

    #[test]
    fn audio_device() {
        let audio = AudioDevice::decode("device=AC97,driver=spice").unwrap();
        assert_eq!(audio.device, AudioModel::Ac97);
        assert_eq!(audio.encode().unwrap(), "device=AC97,driver=spice");
        assert_eq!(
            AudioDevice::decode("driver=none").unwrap_err().kind(),
            ErrorKind::MissingRequiredField
        );
        assert_eq!(
            AudioDevice::decode("device=sb16").unwrap_err().kind(),
            ErrorKind::TypeMismatch
        );
    }

    #[test]
    fn serial_path_is_bare() {
        let serial = SerialDevice::decode("socket").unwrap();
        assert_eq!(serial, SerialDevice::socket());
        assert_eq!(serial.encode().unwrap(), "socket");

        let keyed = SerialDevice::decode("path=/dev/ttyS0").unwrap();
        assert_eq!(keyed.encode().unwrap(), "/dev/ttyS0");
    }
}
