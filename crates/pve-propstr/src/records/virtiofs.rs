// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::record::{field, property_string, Field, PropertyRecord, Rule};
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
pub enum VirtiofsCache {
    Auto,
    Always,
    Never,
    Metadata,
}

choice_value!(VirtiofsCache);

/// A `virtiofs<N>` directory share.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct VirtiofsShare {
    /// Id of the cluster-wide directory mapping to share.
    pub dirid: String,
    pub cache: Option<VirtiofsCache>,
    pub direct_io: Option<bool>,
    /// Enabling ACLs forces extended attributes on.
    pub expose_acl: Option<bool>,
    pub expose_xattr: Option<bool>,
}

impl VirtiofsShare {
    pub fn new(dirid: impl Into<String>) -> Self {
        Self { dirid: dirid.into(), ..Default::default() }
    }

    /// Turns on ACLs along with the extended attributes they need.
    pub fn with_acl(self) -> Self {
        Self { expose_acl: Some(true), expose_xattr: Some(true), ..self }
    }
}

impl PropertyRecord for VirtiofsShare {
    const NAME: &'static str = "virtiofs share";
    const FIELDS: &'static [Field<Self>] = &[
        field!(required "dirid" => dirid, accepted),
        field!("cache" => cache),
        field!("direct-io" => direct_io),
        field!("expose-acl" => expose_acl),
        field!("expose-xattr" => expose_xattr),
    ];
    const RULES: &'static [Rule<Self>] = &[Rule::Implies {
        name: "ACL support requires extended attributes",
        antecedent_key: "expose-acl",
        consequent_key: "expose-xattr",
        antecedent: |r| r.expose_acl == Some(true),
        consequent: |r| r.expose_xattr,
        imply: |r| r.expose_xattr = Some(true),
    }];
}

property_string!(VirtiofsShare);
