// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cloud-init settings.
//!
//! The API spreads cloud-init over several top-level keys of the VM
//! configuration. [`CloudInitConfig`] gathers them in one place.

use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet};

use crate::collection::{SlotCollection, SlotFamily};
use crate::document::DocumentReader;
use crate::error::SlotError;
use crate::record::{field, property_string, Field, PropertyRecord};
use crate::value::choice_value;

/// The `cicustom` key: snippet volumes replacing the generated files.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct CloudInitFiles {
    pub meta: Option<String>,
    pub network: Option<String>,
    pub user: Option<String>,
    pub vendor: Option<String>,
}

impl PropertyRecord for CloudInitFiles {
    const NAME: &'static str = "cloud-init files";
    const FIELDS: &'static [Field<Self>] = &[
        field!("meta" => meta),
        field!("network" => network),
        field!("user" => user),
        field!("vendor" => vendor),
    ];
}

/// An `ipconfig<N>` entry, addressing the guest's N-th interface.
///
/// `ip` and `ip6` are CIDR addresses or `dhcp` (`auto`/`dhcp` for IPv6).
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct IpConfig {
    pub gw: Option<String>,
    pub gw6: Option<String>,
    pub ip: Option<String>,
    pub ip6: Option<String>,
}

impl PropertyRecord for IpConfig {
    const NAME: &'static str = "IP configuration";
    const FIELDS: &'static [Field<Self>] = &[
        field!("gw" => gw),
        field!("gw6" => gw6),
        field!("ip" => ip),
        field!("ip6" => ip6),
    ];
}

property_string!(CloudInitFiles, IpConfig);

/// Characters left alone when escaping SSH keys: the unreserved set of
/// RFC 3986.
const SSH_KEYS_ESCAPE: &AsciiSet = &percent_encoding::NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Authorized SSH public keys.
///
/// On the wire the keys are joined with newlines and percent-encoded as a
/// whole, with spaces written `%20`.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct SshKeys(pub Vec<String>);

impl SshKeys {
    /// Decodes the wire form. `+` is read as a space; an empty value is an
    /// empty list.
    pub fn from_wire(s: &str) -> Self {
        let spaced = s.replace('+', " ");
        let decoded = percent_decode_str(&spaced).decode_utf8_lossy();
        let trimmed = decoded.trim();
        if trimmed.is_empty() {
            return Self::default();
        }
        Self(trimmed.split('\n').map(str::to_string).collect())
    }

    pub fn to_wire(&self) -> String {
        utf8_percent_encode(&self.0.join("\n"), SSH_KEYS_ESCAPE).to_string()
    }
}

impl fmt::Display for SshKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

/// Which datasource format the generated cloud-init drive uses.
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
pub enum CloudInitType {
    ConfigDrive2,
    NoCloud,
    OpenNebula,
}

choice_value!(CloudInitType);

/// Every cloud-init setting of one VM.
#[derive(Clone, Debug, PartialEq)]
pub struct CloudInitConfig {
    pub files: Option<CloudInitFiles>,
    pub ip_configs: SlotCollection<IpConfig>,
    pub nameserver: Option<String>,
    pub password: Option<String>,
    pub search_domain: Option<String>,
    pub ssh_keys: Option<SshKeys>,
    pub ci_type: Option<CloudInitType>,
    pub username: Option<String>,
}

impl Default for CloudInitConfig {
    fn default() -> Self {
        Self {
            files: None,
            ip_configs: SlotCollection::new(SlotFamily::IpConfig),
            nameserver: None,
            password: None,
            search_domain: None,
            ssh_keys: None,
            ci_type: None,
            username: None,
        }
    }
}

impl CloudInitConfig {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Reads the cloud-init keys of a configuration document. Returns
    /// `None` if the document has none.
    pub fn read(reader: &mut DocumentReader<'_>) -> Option<Self> {
        let config = Self {
            files: reader.record("cicustom"),
            ip_configs: reader.slots(SlotFamily::IpConfig),
            nameserver: reader.string("nameserver"),
            password: reader.string("cipassword"),
            search_domain: reader.string("searchdomain"),
            ssh_keys: reader.string("sshkeys").map(|s| SshKeys::from_wire(&s)),
            ci_type: reader.value("citype"),
            username: reader.string("ciuser"),
        };
        (!config.is_empty()).then_some(config)
    }

    /// Encodes the settings as `(key, value)` pairs in API order. A present
    /// record is written even when its value is empty.
    pub fn encode(&self) -> Result<Vec<(String, String)>, SlotError> {
        let mut pairs = Vec::new();

        if let Some(files) = &self.files {
            let value = files.encode().map_err(|source| SlotError::Record {
                key: "cicustom".to_string(),
                source,
            })?;
            pairs.push(("cicustom".to_string(), value));
        }

        pairs.extend(self.ip_configs.encode()?);

        let mut push = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                pairs.push((key.to_string(), value));
            }
        };
        push("nameserver", self.nameserver.clone());
        push("cipassword", self.password.clone());
        push("searchdomain", self.search_domain.clone());
        push("sshkeys", self.ssh_keys.as_ref().map(SshKeys::to_wire));
        push("citype", self.ci_type.map(|t| t.to_string()));
        push("ciuser", self.username.clone());

        Ok(pairs)
    }
}
