// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decodes a full VM configuration, as returned by the config endpoint, and
//! checks that re-encoding it is stable.

use pve_propstr::records::{
    CacheMode, CloudInitType, DiscardMode, NicModel, SshKeys,
};
use pve_propstr::{
    Decoder, DiskSlot, ErrorKind, HardwareDecoder, SlotError, UnknownFields, VmHardware,
};
use pve_types::DiskSize;
use serde_json::{Map, Value};

const CONFIG: &str = r#"{
    "data": {
        "agent": "1,fstrim_cloned_disks=1",
        "boot": "order=scsi0;ide2;net0",
        "cicustom": "user=local:snippets/user-131.yaml",
        "ciuser": "ops",
        "citype": "nocloud",
        "cores": 4,
        "cpu": "cputype=x86-64-v3,flags=+aes;+pdpe1gb",
        "digest": "3f1b6f3a4c0ad2b0e8f5dbbc0d1df5d1a0b8e2c7",
        "efidisk0": "local-lvm:vm-131-disk-1,efitype=4m,pre-enrolled-keys=1,size=4M",
        "hostpci0": "host=0000:81:00.0,pcie=1,rombar=0",
        "ide2": "local-lvm:vm-131-cloudinit,media=cdrom",
        "ipconfig0": "ip=10.20.0.31/24,gw=10.20.0.1",
        "ipconfig1": "ip6=auto",
        "machine": "q35",
        "memory": "8192",
        "name": "db01",
        "nameserver": "10.20.0.2",
        "net0": "virtio=BC:24:11:5A:0C:31,bridge=vmbr0,firewall=1,tag=20",
        "net1": "model=vmxnet3,bridge=vmbr1,link_down=1",
        "numa": 1,
        "numa0": "cpus=0-1,hostnodes=0,memory=4096,policy=bind",
        "numa1": "cpus=2-3,hostnodes=1,memory=4096,policy=bind",
        "ostype": "l26",
        "rng0": "source=/dev/urandom,max_bytes=1024,period=1000",
        "scsi0": "local-lvm:vm-131-disk-0,cache=writeback,discard=on,iothread=1,size=64G,ssd=1",
        "scsi1": "nfs-backup:131/vm-131-disk-2.qcow2,backup=0,size=200G",
        "scsi2": "local-lvm:vm-90-disk-0,size=10G",
        "scsihw": "virtio-scsi-single",
        "serial0": "socket",
        "smbios1": "uuid=0c8f6e2a-1d4e-4c35-9b8e-2f7b3c6d9a10",
        "sockets": 1,
        "sshkeys": "ssh-ed25519%20AAAAC3NzaC1lZDI1NTE5AAAAIHb0%20ops%40bastion",
        "tpmstate0": "local-lvm:vm-131-disk-3,size=4M,version=v2.0",
        "vga": "serial0",
        "virtiofs0": "shared-data,cache=always,expose-acl=1",
        "vmgenid": "a0e1b2c3-d4e5-4f60-8a7b-9c0d1e2f3a4b"
    }
}"#;

fn config() -> Map<String, Value> {
    let mut root: Map<String, Value> =
        serde_json::from_str(CONFIG).expect("valid JSON");
    match root.remove("data") {
        Some(Value::Object(data)) => data,
        other => panic!("unexpected data member: {:?}", other),
    }
}

#[test]
fn decodes_every_device() {
    let decoded = VmHardware::decode(&config());
    assert!(decoded.errors.is_empty(), "errors: {:?}", decoded.errors);
    let hw = decoded.hardware;

    let cpu = hw.cpu.as_ref().unwrap();
    assert_eq!(cpu.cputype, "x86-64-v3");
    assert_eq!(
        cpu.flags.as_deref(),
        Some(&["+aes".to_string(), "+pdpe1gb".to_string()][..])
    );

    let root = hw.scsi.get(0).unwrap();
    assert_eq!(root.cache, Some(CacheMode::Writeback));
    assert_eq!(root.discard, Some(DiscardMode::On));
    assert_eq!(root.size, Some(DiskSize::from_gigabytes(64)));

    assert_eq!(hw.net.len(), 2);
    assert_eq!(hw.net.get(0).unwrap().model, NicModel::Virtio);
    assert_eq!(hw.net.get(1).unwrap().link_down, Some(true));
    assert_eq!(hw.numa.len(), 2);
    assert_eq!(hw.hostpci.len(), 1);
    assert_eq!(hw.serial.len(), 1);

    let share = hw.virtiofs.get(0).unwrap();
    assert_eq!(share.dirid, "shared-data");
    assert_eq!(share.expose_xattr, Some(true));

    let ci = hw.cloud_init.as_ref().unwrap();
    assert_eq!(ci.ip_configs.len(), 2);
    assert_eq!(ci.ci_type, Some(CloudInitType::NoCloud));
    assert_eq!(
        ci.ssh_keys,
        Some(SshKeys(vec![
            "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIHb0 ops@bastion".to_string()
        ]))
    );
}

fn keys(disks: Vec<DiskSlot<'_>>) -> Vec<String> {
    disks.iter().map(DiskSlot::key).collect()
}

#[test]
fn classifies_disks() {
    let hw = VmHardware::decode(&config()).hardware;

    assert_eq!(keys(hw.disks()), vec!["ide2", "scsi0", "scsi1", "scsi2"]);
    assert_eq!(keys(hw.disks_by_interface("scsi")), vec!["scsi0", "scsi1", "scsi2"]);
    assert_eq!(keys(hw.owned_disks(131)), vec!["scsi0", "scsi1"]);
    assert_eq!(hw.cloud_init_drive(131).map(|d| d.key()), Some("ide2".to_string()));

    let imported = hw.scsi.get(2).unwrap();
    assert_eq!(imported.datastore_id(), Some("local-lvm"));
    assert!(!imported.is_owned_by(131));
    assert!(imported.is_owned_by(90));
}

#[test]
fn reencoding_is_stable() {
    let hw = VmHardware::decode(&config()).hardware;
    let pairs = hw.encode().unwrap();

    let document: Map<String, Value> = pairs
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    let again = VmHardware::decode(&document);
    assert!(again.errors.is_empty(), "errors: {:?}", again.errors);
    assert_eq!(again.hardware, hw);
    assert_eq!(again.hardware.encode().unwrap(), pairs);

    // Canonical forms of a few keys.
    let lookup = |key: &str| {
        pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    };
    assert_eq!(
        lookup("scsi0"),
        Some("file=local-lvm:vm-131-disk-0,size=64G,iothread=1,ssd=1,discard=on,cache=writeback")
    );
    assert_eq!(
        lookup("scsi1"),
        Some("file=nfs-backup:131/vm-131-disk-2.qcow2,format=qcow2,size=200G,backup=0")
    );
    assert_eq!(lookup("serial0"), Some("socket"));
    assert_eq!(lookup("virtiofs0"), Some("dirid=shared-data,cache=always,expose-acl=1"));
    assert_eq!(lookup("vga"), Some("type=serial0"));
    assert_eq!(lookup("memory"), None);
}

#[test]
fn bad_keys_do_not_hide_good_ones() {
    let mut document = config();
    document.insert("net1".to_string(), Value::from("model=token-ring"));
    document.insert("scsi40".to_string(), Value::from("local-lvm:vm-131-disk-9"));
    document.insert("cpu".to_string(), Value::from("host,turbo=1"));

    let decoded = VmHardware::decode(&document);
    let keys: Vec<&str> = decoded.errors.iter().map(SlotError::key).collect();
    assert_eq!(keys, vec!["scsi40", "net1", "cpu"]);
    assert!(matches!(
        &decoded.errors[1],
        SlotError::Record { source, .. } if source.kind() == ErrorKind::TypeMismatch
    ));
    assert_eq!(decoded.hardware.net.len(), 1);
    assert_eq!(decoded.hardware.scsi.len(), 3);
    assert!(decoded.hardware.cpu.is_none());

    let lenient = HardwareDecoder::new()
        .decoder(Decoder::new().unknown_fields(UnknownFields::Ignore))
        .decode(&document);
    let keys: Vec<&str> = lenient.errors.iter().map(SlotError::key).collect();
    assert_eq!(keys, vec!["scsi40", "net1"]);
    assert_eq!(lenient.hardware.cpu.map(|cpu| cpu.cputype), Some("host".to_string()));
}
