// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::str::FromStr;

use crate::record::{field, property_string, Field, PropertyRecord};
use crate::value::choice_value;

/// Emulated NIC models.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::Display,
    strum::VariantNames,
)]
pub enum NicModel {
    #[strum(serialize = "e1000")]
    E1000,
    #[strum(serialize = "e1000-82540em")]
    E1000_82540em,
    #[strum(serialize = "e1000-82544gc")]
    E1000_82544gc,
    #[strum(serialize = "e1000-82545em")]
    E1000_82545em,
    #[strum(serialize = "e1000e")]
    E1000e,
    #[strum(serialize = "i82551")]
    I82551,
    #[strum(serialize = "i82557b")]
    I82557b,
    #[strum(serialize = "i82559er")]
    I82559er,
    #[strum(serialize = "ne2k_isa")]
    Ne2kIsa,
    #[strum(serialize = "ne2k_pci")]
    Ne2kPci,
    #[strum(serialize = "pcnet")]
    Pcnet,
    #[strum(serialize = "rtl8139")]
    Rtl8139,
    #[default]
    #[strum(serialize = "virtio")]
    Virtio,
    #[strum(serialize = "vmxnet3")]
    Vmxnet3,
}

choice_value!(NicModel);

/// A `net<N>` interface.
///
/// The API writes the model and MAC address as a single `<model>=<mac>`
/// token (`virtio=BC:24:11:2E:C5:01`); that form is accepted and decodes to
/// the separate `model` and `macaddr` fields.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct NetworkDevice {
    pub model: NicModel,
    pub bridge: Option<String>,
    pub firewall: Option<bool>,
    pub link_down: Option<bool>,
    pub macaddr: Option<String>,
    pub queues: Option<u16>,
    /// Rate limit in MB/s.
    pub rate: Option<f64>,
    pub tag: Option<u16>,
    pub mtu: Option<u16>,
    pub trunks: Option<Vec<u16>>,
}

impl NetworkDevice {
    pub fn new(model: NicModel) -> Self {
        Self { model, ..Default::default() }
    }
}

impl PropertyRecord for NetworkDevice {
    const NAME: &'static str = "network device";
    const FIELDS: &'static [Field<Self>] = &[
        field!(required "model" => model),
        field!("bridge" => bridge),
        field!("firewall" => firewall),
        field!("link_down" => link_down),
        field!("macaddr" => macaddr),
        field!("queues" => queues),
        field!("rate" => rate),
        field!("tag" => tag),
        field!("mtu" => mtu),
        field!("trunks" => trunks),
    ];

    fn expand_alias(
        key: &str,
        value: &str,
    ) -> Option<Vec<(&'static str, String)>> {
        let model = NicModel::from_str(key).ok()?;
        Some(vec![("model", model.to_string()), ("macaddr", value.to_string())])
    }
}

property_string!(NetworkDevice);
