// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Record types for each property-string valued configuration key.

mod board;
mod cloud_init;
mod container;
mod cpu;
mod devices;
mod disk;
mod network;
mod passthrough;
mod virtiofs;

pub use board::{
    AgentSettings, AgentType, BootOrder, Smbios, SpiceEnhancements,
    StartupOrder, VgaDevice, VideoStreaming,
};
pub use cloud_init::{
    CloudInitConfig, CloudInitFiles, CloudInitType, IpConfig, SshKeys,
};
pub use container::{
    ContainerFeatures, ContainerNetwork, DeviceNode, InterfaceType,
    MountOption, MountPoint, RootFs,
};
pub use cpu::{CpuEmulation, NumaNode, NumaPolicy};
pub use devices::{
    AudioDevice, AudioDriver, AudioModel, RngDevice, SerialDevice,
    SharedMemory, WatchdogAction, WatchdogDevice, WatchdogModel,
};
pub use disk::{
    AioMode, CacheMode, DiscardMode, EfiDisk, EfiType, ImageFormat, Media,
    StorageDevice, TpmState, TpmVersion,
};
pub use network::{NetworkDevice, NicModel};
pub use passthrough::{PciDevice, UsbDevice};
pub use virtiofs::{VirtiofsCache, VirtiofsShare};
