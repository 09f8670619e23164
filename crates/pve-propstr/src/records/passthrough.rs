// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host devices passed through to the guest.
//!
//! Both kinds name their device either directly by host id or indirectly
//! through a cluster-wide resource mapping, never both.

use crate::record::{field, property_string, Field, PropertyRecord, Rule};

/// A `hostpci<N>` device.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct PciDevice {
    /// Host PCI ids such as `0000:81:00.4`, or `81:00` for all functions.
    pub host: Option<Vec<String>>,
    pub mapping: Option<String>,
    pub mdev: Option<String>,
    pub pcie: Option<bool>,
    pub rombar: Option<bool>,
    pub romfile: Option<String>,
    pub x_vga: Option<bool>,
}

impl PropertyRecord for PciDevice {
    const NAME: &'static str = "PCI device";
    const FIELDS: &'static [Field<Self>] = &[
        field!("host" => host, accepted),
        field!("mapping" => mapping),
        field!("mdev" => mdev),
        field!("pcie" => pcie),
        field!("rombar" => rombar),
        field!("romfile" => romfile),
        field!("x-vga" => x_vga),
    ];
    const RULES: &'static [Rule<Self>] = &[Rule::ExactlyOne {
        name: "host device or mapping",
        keys: &["host", "mapping"],
    }];
}

/// A `usb<N>` device.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct UsbDevice {
    /// `<vendor>:<product>`, `<bus>-<port>`, or `spice`.
    pub host: Option<String>,
    pub mapping: Option<String>,
    pub usb3: Option<bool>,
}

impl PropertyRecord for UsbDevice {
    const NAME: &'static str = "USB device";
    const FIELDS: &'static [Field<Self>] = &[
        field!("host" => host, accepted),
        field!("mapping" => mapping),
        field!("usb3" => usb3),
    ];
    const RULES: &'static [Rule<Self>] = &[Rule::ExactlyOne {
        name: "host device or mapping",
        keys: &["host", "mapping"],
    }];
}

property_string!(PciDevice, UsbDevice);
