// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use pve_propstr::records::*;
use pve_propstr::{
    ContainerHardware, Decoder, HardwareDecoder, PropertyRecord,
    UnknownFields, VmHardware,
};
use pve_types::DiskSize;
use serde_json::{Map, Value};
use slog::{o, Drain, Level, Logger};

mod config;

#[derive(Debug, Parser)]
#[clap(about, version)]
/// Decode, re-encode and inspect VM and container property strings
struct Opt {
    /// TOML configuration file
    #[clap(short, long, action)]
    config: Option<PathBuf>,

    /// Enable debugging
    #[clap(short, long, action)]
    debug: bool,

    /// Drop unknown keys instead of failing
    #[clap(long, action)]
    ignore_unknown: bool,

    /// Stop at the first key that fails to decode
    #[clap(long, action)]
    fail_fast: bool,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Decode a property string and print the record
    Decode {
        /// Record type of the value
        #[clap(short, long, value_enum)]
        kind: RecordKind,

        #[clap(action)]
        value: String,
    },

    /// Decode, re-encode and decode again, failing if anything changed
    Roundtrip {
        /// Record type of the value
        #[clap(short, long, value_enum)]
        kind: RecordKind,

        #[clap(action)]
        value: String,
    },

    /// Show a size in bytes and in both of its string forms
    Size {
        /// A byte count or a size such as `1.5G`
        #[clap(action)]
        value: String,
    },

    /// Decode a whole VM or container configuration document (JSON)
    Inspect {
        #[clap(action)]
        path: PathBuf,

        /// Classify disks (or mount points) as seen by this guest id
        #[clap(long, action)]
        vm_id: Option<u32>,

        /// The document describes a container rather than a VM
        #[clap(long, action)]
        container: bool,
    },
}

/// Record types that can be named on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum RecordKind {
    Disk,
    Efidisk,
    Tpmstate,
    Net,
    Hostpci,
    Usb,
    Numa,
    Cpu,
    Virtiofs,
    Ivshmem,
    Watchdog,
    Rng,
    Smbios,
    Audio,
    Boot,
    Startup,
    Spice,
    Agent,
    Vga,
    Serial,
    Cicustom,
    Ipconfig,
    Rootfs,
    Mp,
    CtNet,
    Features,
    Dev,
}

/// Runs `$body` with `$r` naming the record type selected by `$kind`.
macro_rules! with_record {
    ($kind:expr, $r:ident => $body:expr) => {
        match $kind {
            RecordKind::Disk => { type $r = StorageDevice; $body }
            RecordKind::Efidisk => { type $r = EfiDisk; $body }
            RecordKind::Tpmstate => { type $r = TpmState; $body }
            RecordKind::Net => { type $r = NetworkDevice; $body }
            RecordKind::Hostpci => { type $r = PciDevice; $body }
            RecordKind::Usb => { type $r = UsbDevice; $body }
            RecordKind::Numa => { type $r = NumaNode; $body }
            RecordKind::Cpu => { type $r = CpuEmulation; $body }
            RecordKind::Virtiofs => { type $r = VirtiofsShare; $body }
            RecordKind::Ivshmem => { type $r = SharedMemory; $body }
            RecordKind::Watchdog => { type $r = WatchdogDevice; $body }
            RecordKind::Rng => { type $r = RngDevice; $body }
            RecordKind::Smbios => { type $r = Smbios; $body }
            RecordKind::Audio => { type $r = AudioDevice; $body }
            RecordKind::Boot => { type $r = BootOrder; $body }
            RecordKind::Startup => { type $r = StartupOrder; $body }
            RecordKind::Spice => { type $r = SpiceEnhancements; $body }
            RecordKind::Agent => { type $r = AgentSettings; $body }
            RecordKind::Vga => { type $r = VgaDevice; $body }
            RecordKind::Serial => { type $r = SerialDevice; $body }
            RecordKind::Cicustom => { type $r = CloudInitFiles; $body }
            RecordKind::Ipconfig => { type $r = IpConfig; $body }
            RecordKind::Rootfs => { type $r = RootFs; $body }
            RecordKind::Mp => { type $r = MountPoint; $body }
            RecordKind::CtNet => { type $r = ContainerNetwork; $body }
            RecordKind::Features => { type $r = ContainerFeatures; $body }
            RecordKind::Dev => { type $r = DeviceNode; $body }
        }
    };
}

fn build_logger(level: Level) -> Logger {
    let main_drain = if atty::is(atty::Stream::Stderr) {
        let decorator = slog_term::TermDecorator::new().stderr().build();
        let drain = slog_term::FullFormat::new(decorator).build().fuse();
        slog_async::Async::new(drain)
            .overflow_strategy(slog_async::OverflowStrategy::Block)
            .build_no_guard()
    } else {
        let drain =
            slog_bunyan::with_name("pve-propstr-cli", std::io::stderr())
                .build()
                .fuse();
        slog_async::Async::new(drain)
            .overflow_strategy(slog_async::OverflowStrategy::Block)
            .build_no_guard()
    };

    let filtered_main = slog::LevelFilter::new(main_drain, level);
    Logger::root(filtered_main.fuse(), o!())
}

fn decode_record<R>(decoder: &Decoder, input: &str) -> anyhow::Result<()>
where
    R: PropertyRecord + Debug,
{
    let record: R = decoder
        .decode(input)
        .with_context(|| format!("failed to decode {:?}", input))?;
    println!("{:#?}", record);
    println!("canonical: {}", record.encode()?);
    Ok(())
}

fn roundtrip_record<R>(decoder: &Decoder, input: &str) -> anyhow::Result<()>
where
    R: PropertyRecord + Debug + PartialEq,
{
    let first: R = decoder
        .decode(input)
        .with_context(|| format!("failed to decode {:?}", input))?;
    let encoded = first.encode()?;
    let second: R = decoder
        .decode(&encoded)
        .with_context(|| format!("failed to decode {:?}", encoded))?;
    if first != second {
        bail!(
            "{} changed after re-encoding as {:?}:\n{:#?}\n{:#?}",
            R::NAME,
            encoded,
            first,
            second
        );
    }
    let again = second.encode()?;
    if again != encoded {
        bail!("encoding is not stable: {:?} then {:?}", encoded, again);
    }
    println!("{}", encoded);
    Ok(())
}

fn show_size(value: &str) -> anyhow::Result<()> {
    let size = DiskSize::from_str(value)
        .with_context(|| format!("invalid size {:?}", value))?;
    println!("bytes: {}", size.bytes());
    println!("human: {}", size);
    println!("exact: {}", size.to_exact_string());
    Ok(())
}

fn read_document(path: &Path) -> anyhow::Result<Map<String, Value>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut document: Value = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    // Accept the API's response envelope as well as the bare object.
    if let Some(data) = document.get_mut("data") {
        document = data.take();
    }
    let Value::Object(document) = document else {
        bail!("{} does not hold a JSON object", path.display());
    };
    Ok(document)
}

fn report_errors(
    errors: &[pve_propstr::SlotError],
    log: &Logger,
) -> anyhow::Result<()> {
    if errors.is_empty() {
        return Ok(());
    }
    for err in errors {
        eprintln!("error: {}", err);
    }
    slog::debug!(log, "inspection finished with errors";
        "count" => errors.len()
    );
    Err(anyhow!("{} key(s) failed to decode", errors.len()))
}

fn inspect_container(
    document: &Map<String, Value>,
    ct_id: Option<u32>,
    decoder: HardwareDecoder,
    log: &Logger,
) -> anyhow::Result<()> {
    let decoded = decoder.decode_container(document);
    let hardware: &ContainerHardware = &decoded.hardware;

    for (key, value) in hardware.encode()? {
        println!("{}: {}", key, value);
    }

    if let Some(id) = ct_id {
        let owned = hardware.owned_mount_points(id);
        println!();
        println!(
            "owned mount points: {}",
            owned
                .iter()
                .map(|(key, _)| key.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    report_errors(&decoded.errors, log)
}

fn inspect(
    document: &Map<String, Value>,
    vm_id: Option<u32>,
    decoder: HardwareDecoder,
    log: &Logger,
) -> anyhow::Result<()> {
    let decoded = decoder.decode(document);
    let hardware: &VmHardware = &decoded.hardware;

    for (key, value) in hardware.encode()? {
        println!("{}: {}", key, value);
    }

    let disks = hardware.disks();
    if !disks.is_empty() {
        println!();
        println!(
            "{:<10} {:<8} {:<16} {:<40} {}",
            "SLOT", "IFACE", "DATASTORE", "PATH", "ROLE"
        );
    }
    for disk in &disks {
        let volume = disk.device.volume();
        let role = match vm_id {
            Some(id) if disk.device.is_cloud_init_drive(id) => "cloud-init",
            Some(id) if disk.device.is_owned_by(id) => "owned",
            Some(_) if !volume.is_allocated() => "unallocated",
            Some(_) => "foreign",
            None => "-",
        };
        println!(
            "{:<10} {:<8} {:<16} {:<40} {}",
            disk.key(),
            disk.interface(),
            volume.datastore_id.unwrap_or("-"),
            volume.path.unwrap_or("-"),
            role
        );
    }

    report_errors(&decoded.errors, log)
}

fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();

    let mut cfg = match &opt.config {
        Some(path) => config::parse(path).with_context(|| {
            format!("failed to parse config {}", path.display())
        })?,
        None => config::Config::default(),
    };
    if opt.ignore_unknown {
        cfg.decode.unknown_fields = UnknownFields::Ignore;
    }
    if opt.fail_fast {
        cfg.decode.fail_fast = true;
    }
    let level = if opt.debug { Level::Debug } else { cfg.log.level()? };

    let log = build_logger(level);
    slog::debug!(log, "configuration loaded"; "config" => ?cfg);

    let decoder = Decoder::new().unknown_fields(cfg.decode.unknown_fields);

    match opt.cmd {
        Command::Decode { kind, value } => {
            with_record!(kind, R => decode_record::<R>(&decoder, &value))
        }
        Command::Roundtrip { kind, value } => {
            with_record!(kind, R => roundtrip_record::<R>(&decoder, &value))
        }
        Command::Size { value } => show_size(&value),
        Command::Inspect { path, vm_id, container } => {
            let document = read_document(&path)?;
            let hardware = HardwareDecoder::new()
                .with_logger(&log)
                .decoder(decoder)
                .fail_fast(cfg.decode.fail_fast);
            if container {
                inspect_container(&document, vm_id, hardware, &log)
            } else {
                inspect(&document, vm_id, hardware, &log)
            }
        }
    }
}
