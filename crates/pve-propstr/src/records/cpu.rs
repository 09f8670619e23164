// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::record::{field, property_string, Field, PropertyRecord};
use crate::value::choice_value;

/// The `cpu` key.
///
/// A lone CPU type is written bare (`x86-64-v4`); as soon as any other
/// field is present the type is written as `cputype=...`.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct CpuEmulation {
    pub cputype: String,
    /// Feature flags, each prefixed with `+` or `-`.
    pub flags: Option<Vec<String>>,
    pub hidden: Option<bool>,
    pub hv_vendor_id: Option<String>,
}

impl CpuEmulation {
    pub fn new(cputype: impl Into<String>) -> Self {
        Self { cputype: cputype.into(), ..Default::default() }
    }
}

impl PropertyRecord for CpuEmulation {
    const NAME: &'static str = "CPU emulation";
    const FIELDS: &'static [Field<Self>] = &[
        field!(required "cputype" => cputype, when_alone),
        field!("flags" => flags),
        field!("hidden" => hidden),
        field!("hv-vendor-id" => hv_vendor_id),
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
pub enum NumaPolicy {
    Preferred,
    Bind,
    Interleave,
}

choice_value!(NumaPolicy);

/// A `numa<N>` guest NUMA node.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct NumaNode {
    /// CPU ids or ranges (`0-3`) belonging to this node.
    pub cpus: Vec<String>,
    pub hostnodes: Option<Vec<String>>,
    /// MiB.
    pub memory: Option<f64>,
    pub policy: Option<NumaPolicy>,
}

impl PropertyRecord for NumaNode {
    const NAME: &'static str = "NUMA node";
    const FIELDS: &'static [Field<Self>] = &[
        field!(required "cpus" => cpus),
        field!("hostnodes" => hostnodes),
        field!("memory" => memory),
        field!("policy" => policy),
    ];
}

property_string!(CpuEmulation, NumaNode);

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn lone_cputype_is_bare() {
        let cpu = CpuEmulation::decode("x86-64-v4").unwrap();
        assert_eq!(cpu, CpuEmulation::new("x86-64-v4"));
        assert_eq!(cpu.encode().unwrap(), "x86-64-v4");

        // The keyed form of a lone type normalizes to the bare form.
        let keyed = CpuEmulation::decode("cputype=host").unwrap();
        assert_eq!(keyed.encode().unwrap(), "host");
    }

    #[test]
    fn cputype_with_options_is_keyed() {
        const INPUT: &str = "cputype=x86-64-v4,flags=+avx;+sse,hidden=1";
        let cpu = CpuEmulation::decode(INPUT).unwrap();
        assert_eq!(
            cpu,
            CpuEmulation {
                cputype: "x86-64-v4".to_string(),
                flags: Some(vec!["+avx".to_string(), "+sse".to_string()]),
                hidden: Some(true),
                hv_vendor_id: None,
            }
        );
        assert_eq!(cpu.encode().unwrap(), INPUT);

        let positional = CpuEmulation::decode("kvm64,hidden=1").unwrap();
        assert_eq!(positional.encode().unwrap(), "cputype=kvm64,hidden=1");
    }

    #[test]
    fn empty_flag_list_is_kept() {
        let cpu = CpuEmulation::decode("cputype=host,flags=").unwrap();
        assert_eq!(cpu.flags, Some(vec![]));
        assert_eq!(cpu.encode().unwrap(), "cputype=host,flags=");
    }

    #[test]
    fn flag_containing_separator_is_rejected() {
        let cpu = CpuEmulation {
            flags: Some(vec!["+a;+b".to_string()]),
            ..CpuEmulation::new("host")
        };
        let err = cpu.encode().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedToken);
        assert_eq!(
            err.to_string(),
            "CPU emulation: malformed token \"flags=+a;+b\": \
             list item contains the item separator"
        );
    }

    #[test]
    fn cpu_errors() {
        let cases: &[(&str, ErrorKind)] = &[
            ("", ErrorKind::MissingRequiredField),
            ("hidden=1", ErrorKind::MissingRequiredField),
            ("host,cputype=kvm64", ErrorKind::MalformedToken),
            ("host,turbo=1", ErrorKind::UnknownField),
        ];
        for (input, kind) in cases {
            let err = CpuEmulation::decode(input).unwrap_err();
            assert_eq!(err.kind(), *kind, "decoding {:?}", input);
        }
        assert_eq!(
            CpuEmulation::default().encode().unwrap_err().kind(),
            ErrorKind::MissingRequiredField
        );
    }

    #[test]
    fn numa_node() {
        const INPUT: &str = "cpus=0-3;8-11,hostnodes=0,memory=4096,policy=bind";
        let node = NumaNode::decode(INPUT).unwrap();
        assert_eq!(node.cpus, vec!["0-3".to_string(), "8-11".to_string()]);
        assert_eq!(node.hostnodes, Some(vec!["0".to_string()]));
        assert_eq!(node.memory, Some(4096.0));
        assert_eq!(node.policy, Some(NumaPolicy::Bind));
        assert_eq!(node.encode().unwrap(), INPUT);

        let err = NumaNode::decode("memory=1024").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredField);
        let err = NumaNode::decode("cpus=0,policy=random").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }
}
