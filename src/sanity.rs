//! Pre-flight checks run before the TUI takes the terminal
//!
//! Running without root is fatal unless `--dry-run` is given. Missing tools
//! only produce a warning: the step that needs one fails on its own and the
//! menu carries on.

use std::env;
use std::path::{Path, PathBuf};

/// Tools the installation steps call, with the package that provides them
pub const REQUIRED_TOOLS: &[(&str, &str)] = &[
    ("lsblk", "util-linux"),
    ("sgdisk", "gptfdisk"),
    ("partprobe", "parted"),
    ("mkfs.fat", "dosfstools"),
    ("mkfs.btrfs", "btrfs-progs"),
    ("cryptsetup", "cryptsetup"),
    ("pacstrap", "arch-install-scripts"),
    ("arch-chroot", "arch-install-scripts"),
    ("genfstab", "arch-install-scripts"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightReport {
    pub is_root: bool,
    pub missing_tools: Vec<&'static str>,
}

impl PreflightReport {
    pub fn is_ok(&self) -> bool {
        self.is_root && self.missing_tools.is_empty()
    }
}

/// First executable named `name` in `path` (a `PATH`-style list)
pub fn find_in_path(name: &str, path: &str) -> Option<PathBuf> {
    env::split_paths(path)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

pub fn verify_environment() -> PreflightReport {
    let path = env::var("PATH").unwrap_or_default();
    let missing_tools = REQUIRED_TOOLS
        .iter()
        .filter(|(tool, _)| find_in_path(tool, &path).is_none())
        .map(|(tool, _)| *tool)
        .collect();

    PreflightReport {
        is_root: nix::unistd::geteuid().is_root(),
        missing_tools,
    }
}

fn package_for(tool: &str) -> &'static str {
    REQUIRED_TOOLS
        .iter()
        .find(|(name, _)| *name == tool)
        .map(|(_, package)| *package)
        .unwrap_or("unknown")
}

/// Lines printed to stderr for a failed check
pub fn describe(report: &PreflightReport) -> Vec<String> {
    let mut lines = Vec::new();
    if !report.is_root {
        lines.push("Root privileges are required to partition drives and install packages.".into());
        lines.push("  Run again as root, or pass --dry-run to look around safely.".into());
    }
    if !report.missing_tools.is_empty() {
        lines.push("Some tools used by the installer were not found:".into());
        for tool in &report.missing_tools {
            lines.push(format!("  {} (pacman -S {})", tool, package_for(tool)));
        }
    }
    lines
}

/// Check the environment, print problems, and exit when running without
/// root outside a dry run.
pub fn run_preflight_checks(dry_run: bool) {
    tracing::debug!("Running pre-flight checks");
    let report = verify_environment();
    if report.is_ok() {
        tracing::info!("Pre-flight checks passed");
        return;
    }

    for tool in &report.missing_tools {
        tracing::warn!(tool, "Required tool not found");
    }
    eprintln!("archbtrfs: pre-flight check");
    for line in describe(&report) {
        eprintln!("{}", line);
    }

    if !report.is_root && !dry_run {
        tracing::error!("Not running as root, exiting");
        std::process::exit(1);
    }
}
