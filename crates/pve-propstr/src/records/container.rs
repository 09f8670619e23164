// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Records of container configuration documents: the root filesystem,
//! mount points, network interfaces, device nodes and feature switches.
//!
//! Container startup ordering uses the same `startup` record as VMs,
//! [`StartupOrder`](super::StartupOrder).

use pve_types::DiskSize;

use crate::classify::{split_volume_reference, VolumeReference};
use crate::record::{field, property_string, Field, PropertyRecord};
use crate::value::choice_value;

/// Options passed to `mount(8)` for a container volume.
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
pub enum MountOption {
    Noatime,
    Nodev,
    Noexec,
    Nosuid,
}

choice_value!(MountOption);

/// The `rootfs` key.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct RootFs {
    pub volume: String,
    pub acl: Option<bool>,
    pub mountoptions: Option<Vec<MountOption>>,
    pub quota: Option<bool>,
    pub replicate: Option<bool>,
    pub ro: Option<bool>,
    pub shared: Option<bool>,
    pub size: Option<DiskSize>,
}

impl RootFs {
    pub fn new(volume: impl Into<String>) -> Self {
        Self { volume: volume.into(), ..Default::default() }
    }
}

impl PropertyRecord for RootFs {
    const NAME: &'static str = "root filesystem";
    const FIELDS: &'static [Field<Self>] = &[
        field!(required "volume" => volume, preferred),
        field!("acl" => acl),
        field!("mountoptions" => mountoptions),
        field!("quota" => quota),
        field!("replicate" => replicate),
        field!("ro" => ro),
        field!("shared" => shared),
        field!("size" => size),
    ];
}

/// An `mp<N>` mount point: a storage volume or a host directory (a bind
/// mount) mounted at `mp` inside the container.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct MountPoint {
    pub volume: String,
    pub mp: String,
    pub acl: Option<bool>,
    pub backup: Option<bool>,
    pub mountoptions: Option<Vec<MountOption>>,
    pub quota: Option<bool>,
    pub replicate: Option<bool>,
    pub ro: Option<bool>,
    pub shared: Option<bool>,
    pub size: Option<DiskSize>,
}

impl MountPoint {
    pub fn new(volume: impl Into<String>, mp: impl Into<String>) -> Self {
        Self { volume: volume.into(), mp: mp.into(), ..Default::default() }
    }

    /// Whether the volume is a host path rather than a storage volume.
    pub fn is_bind_mount(&self) -> bool {
        self.volume.starts_with('/')
    }
}

impl PropertyRecord for MountPoint {
    const NAME: &'static str = "mount point";
    const FIELDS: &'static [Field<Self>] = &[
        field!(required "volume" => volume, preferred),
        field!(required "mp" => mp),
        field!("acl" => acl),
        field!("backup" => backup),
        field!("mountoptions" => mountoptions),
        field!("quota" => quota),
        field!("replicate" => replicate),
        field!("ro" => ro),
        field!("shared" => shared),
        field!("size" => size),
    ];
}

/// Whether a container volume path follows the naming of volumes created
/// for container `ct_id`.
fn owned_volume(volume: VolumeReference<'_>, ct_id: u32) -> bool {
    let Some(path) = volume.path else {
        return false;
    };
    [
        format!("vm-{}-", ct_id),
        format!("subvol-{}-", ct_id),
        format!("{}/vm-{}-", ct_id, ct_id),
    ]
    .iter()
    .any(|prefix| path.starts_with(prefix.as_str()))
}

impl RootFs {
    pub fn volume(&self) -> VolumeReference<'_> {
        split_volume_reference(&self.volume)
    }

    pub fn is_owned_by(&self, ct_id: u32) -> bool {
        owned_volume(self.volume(), ct_id)
    }
}

impl MountPoint {
    pub fn volume(&self) -> VolumeReference<'_> {
        split_volume_reference(&self.volume)
    }

    /// Bind mounts belong to no container.
    pub fn is_owned_by(&self, ct_id: u32) -> bool {
        !self.is_bind_mount() && owned_volume(self.volume(), ct_id)
    }
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
#[strum(serialize_all = "lowercase")]
pub enum InterfaceType {
    #[default]
    Veth,
}

choice_value!(InterfaceType);

/// A container `net<N>` interface. Unlike a VM NIC it is named inside the
/// guest and carries its own IP settings.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct ContainerNetwork {
    /// Interface name inside the container, e.g. `eth0`.
    pub name: String,
    pub bridge: Option<String>,
    pub firewall: Option<bool>,
    pub gw: Option<String>,
    pub gw6: Option<String>,
    pub hwaddr: Option<String>,
    /// `dhcp`, `manual` or a CIDR address.
    pub ip: Option<String>,
    /// `auto`, `dhcp`, `manual` or a CIDR address.
    pub ip6: Option<String>,
    pub link_down: Option<bool>,
    pub mtu: Option<u16>,
    /// MB/s.
    pub rate: Option<f64>,
    pub tag: Option<u16>,
    pub trunks: Option<Vec<u16>>,
    pub interface_type: Option<InterfaceType>,
}

impl ContainerNetwork {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }
}

impl PropertyRecord for ContainerNetwork {
    const NAME: &'static str = "container network interface";
    const FIELDS: &'static [Field<Self>] = &[
        field!(required "name" => name),
        field!("bridge" => bridge),
        field!("firewall" => firewall),
        field!("gw" => gw),
        field!("gw6" => gw6),
        field!("hwaddr" => hwaddr),
        field!("ip" => ip),
        field!("ip6" => ip6),
        field!("link_down" => link_down),
        field!("mtu" => mtu),
        field!("rate" => rate),
        field!("tag" => tag),
        field!("trunks" => trunks),
        field!("type" => interface_type),
    ];
}

/// The `features` key.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct ContainerFeatures {
    pub fuse: Option<bool>,
    pub keyctl: Option<bool>,
    pub mknod: Option<bool>,
    /// Filesystem types the container may mount, e.g. `nfs` or `cifs`.
    pub mount: Option<Vec<String>>,
    pub nesting: Option<bool>,
}

impl PropertyRecord for ContainerFeatures {
    const NAME: &'static str = "container features";
    const FIELDS: &'static [Field<Self>] = &[
        field!("fuse" => fuse),
        field!("keyctl" => keyctl),
        field!("mknod" => mknod),
        field!("mount" => mount),
        field!("nesting" => nesting),
    ];
}

/// A `dev<N>` host device node passed into the container.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct DeviceNode {
    pub path: String,
    pub deny_write: Option<bool>,
    pub gid: Option<u32>,
    /// Octal access mode, e.g. `0660`.
    pub mode: Option<String>,
    pub uid: Option<u32>,
}

impl DeviceNode {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), ..Default::default() }
    }
}

impl PropertyRecord for DeviceNode {
    const NAME: &'static str = "device node";
    const FIELDS: &'static [Field<Self>] = &[
        field!(required "path" => path, preferred),
        field!("deny-write" => deny_write),
        field!("gid" => gid),
        field!("mode" => mode),
        field!("uid" => uid),
    ];
}

property_string!(RootFs, MountPoint, ContainerNetwork, ContainerFeatures);
property_string!(DeviceNode);
