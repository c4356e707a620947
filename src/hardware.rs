//! Hardware environment detection
//!
//! Firmware mode comes straight from sysfs. The rest are parsers over text
//! the steps read (`/proc/cpuinfo`, `/proc/meminfo`, the dynamic loader's
//! `--help`, `systemd-detect-virt`), kept pure so they can be tested on
//! captured output.

use std::fmt;
use std::path::Path;

use crate::types::Hypervisor;

/// Firmware the live system booted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FirmwareMode {
    Uefi,
    Bios,
}

impl FirmwareMode {
    pub fn is_uefi(self) -> bool {
        matches!(self, Self::Uefi)
    }
}

impl fmt::Display for FirmwareMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uefi => write!(f, "UEFI"),
            Self::Bios => write!(f, "BIOS"),
        }
    }
}

/// `/sys/firmware/efi` exists only when booted through UEFI.
pub fn detect_firmware_mode() -> FirmwareMode {
    if Path::new("/sys/firmware/efi").exists() {
        tracing::info!("UEFI firmware detected");
        FirmwareMode::Uefi
    } else {
        tracing::info!("BIOS firmware detected (/sys/firmware/efi not found)");
        FirmwareMode::Bios
    }
}

/// CPU vendor, for picking a microcode package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuVendor {
    Intel,
    Amd,
}

impl CpuVendor {
    pub fn microcode_package(self) -> &'static str {
        match self {
            Self::Intel => "intel-ucode",
            Self::Amd => "amd-ucode",
        }
    }
}

/// Vendor from the first `vendor_id` line of `/proc/cpuinfo`
pub fn parse_cpu_vendor(cpuinfo: &str) -> Option<CpuVendor> {
    let vendor = cpuinfo
        .lines()
        .find(|line| line.starts_with("vendor_id"))?
        .split_once(':')?
        .1
        .trim();
    match vendor {
        "GenuineIntel" => Some(CpuVendor::Intel),
        "AuthenticAMD" => Some(CpuVendor::Amd),
        _ => None,
    }
}

/// `MemTotal` in KiB from `/proc/meminfo`
pub fn parse_mem_total_kib(meminfo: &str) -> Option<u64> {
    meminfo
        .lines()
        .find_map(|line| line.strip_prefix("MemTotal:"))?
        .split_whitespace()
        .next()?
        .parse()
        .ok()
}

/// Highest x86-64 micro-architecture level the loader will search
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IsaLevel {
    Baseline,
    V3,
    V4,
}

/// Parse `ld-linux-x86-64.so.2 --help`, which lists lines such as
/// `x86-64-v3 (supported, searched)`.
pub fn parse_isa_level(loader_help: &str) -> IsaLevel {
    let supported = |level: &str| {
        loader_help
            .lines()
            .any(|line| line.contains(level) && line.contains("supported, searched"))
    };
    if supported("x86-64-v4") {
        IsaLevel::V4
    } else if supported("x86-64-v3") {
        IsaLevel::V3
    } else {
        IsaLevel::Baseline
    }
}

/// Map `systemd-detect-virt` output to a hypervisor with guest tools.
/// `none` and unknown platforms yield `None`.
pub fn parse_hypervisor(detect_virt: &str) -> Option<Hypervisor> {
    detect_virt.trim().parse().ok()
}
