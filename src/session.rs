//! Installer session context
//!
//! Everything a step may touch is reachable from [`Session`]: the console,
//! the command runner, the settings and the state earlier steps left
//! behind (the chosen drive and the partition layout). Nothing else is
//! shared between steps.

use anyhow::Result;
use std::path::PathBuf;

use crate::command::{CommandResult, CommandRunner, CommandSpec, WriteMode};
use crate::config::Settings;
use crate::console::Console;
use crate::hardware::FirmwareMode;

/// A whole disk as reported by `lsblk -dpno NAME,SIZE,MODEL`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDevice {
    pub path: String,
    pub size: String,
    pub model: String,
}

impl BlockDevice {
    /// Menu label, e.g. `/dev/sda  500G  Samsung SSD`
    pub fn label(&self) -> String {
        if self.model.is_empty() {
            format!("{}  {}", self.path, self.size)
        } else {
            format!("{}  {}  {}", self.path, self.size, self.model)
        }
    }
}

/// Partitions produced by "Format Partitions"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskLayout {
    pub drive: String,
    pub esp: String,
    pub root_partition: String,
    /// `root_partition`, or the opened LUKS mapping
    pub root_device: String,
    pub encrypted: bool,
    pub compress: bool,
}

pub struct Session<'a> {
    pub console: &'a mut dyn Console,
    pub runner: &'a mut dyn CommandRunner,
    pub settings: &'a Settings,
    pub firmware: FirmwareMode,
    pub drive: Option<BlockDevice>,
    pub layout: Option<DiskLayout>,
}

impl<'a> Session<'a> {
    pub fn new(
        console: &'a mut dyn Console,
        runner: &'a mut dyn CommandRunner,
        settings: &'a Settings,
        firmware: FirmwareMode,
    ) -> Self {
        Self {
            console,
            runner,
            settings,
            firmware,
            drive: None,
            layout: None,
        }
    }

    pub fn target_root(&self) -> String {
        self.settings.target_root.display().to_string()
    }

    /// Path inside the installed system, resolved on the host
    pub fn target_path(&self, path: &str) -> PathBuf {
        self.settings.target_path(path)
    }

    /// Make `spec` act on the installed system
    pub fn in_target(&self, spec: CommandSpec) -> CommandSpec {
        if self.settings.targets_live_system() {
            spec
        } else {
            let root = self.target_root();
            spec.wrapped_in("arch-chroot", &[&root])
        }
    }

    pub fn run(&mut self, spec: CommandSpec) -> Result<CommandResult> {
        Ok(self.runner.run(&spec)?)
    }

    pub fn run_checked(&mut self, spec: CommandSpec) -> Result<CommandResult> {
        Ok(self.runner.run_checked(&spec)?)
    }

    pub fn run_in_target(&mut self, spec: CommandSpec) -> Result<CommandResult> {
        let spec = self.in_target(spec);
        self.run(spec)
    }

    pub fn run_in_target_checked(&mut self, spec: CommandSpec) -> Result<CommandResult> {
        let spec = self.in_target(spec);
        self.run_checked(spec)
    }

    /// `pacman -S --needed` inside the target
    pub fn install_packages<S: AsRef<str>>(&mut self, packages: &[S]) -> Result<()> {
        if packages.is_empty() {
            return Ok(());
        }
        let spec = CommandSpec::new("pacman")
            .args(["-S", "--noconfirm", "--needed"])
            .args(packages.iter().map(|p| p.as_ref().to_string()));
        self.run_in_target_checked(spec)?;
        tracing::info!(count = packages.len(), "installed packages");
        Ok(())
    }

    /// `systemctl enable` inside the target
    pub fn enable_services(&mut self, units: &[&str]) -> Result<()> {
        if units.is_empty() {
            return Ok(());
        }
        let spec = CommandSpec::new("systemctl").arg("enable").args(units.iter().copied());
        self.run_in_target_checked(spec)?;
        Ok(())
    }

    /// Whether `package` is installed in the target
    pub fn package_installed(&mut self, package: &str) -> Result<bool> {
        let spec = CommandSpec::new("pacman").args(["-Qq", package]).read_only();
        Ok(self.run_in_target(spec)?.success())
    }

    pub fn write_target_file(&mut self, path: &str, contents: &str, mode: WriteMode) -> Result<()> {
        let path = self.target_path(path);
        self.runner.write_file(&path, contents, mode)?;
        Ok(())
    }

    pub fn read_target_file(&mut self, path: &str) -> Result<String> {
        let path = self.target_path(path);
        Ok(self.runner.read_file(&path)?)
    }

    /// Prompt for a secret twice until both entries match and are strong.
    ///
    /// `noun` is "password" or "passphrase". `None` when the operator
    /// cancels either prompt.
    pub fn prompt_new_secret(&mut self, noun: &str, subject: &str) -> Result<Option<String>> {
        loop {
            let Some(first) = self.console.read_secret(&format!("Enter {} {}:", noun, subject))?
            else {
                return Ok(None);
            };
            let Some(second) = self.console.read_secret(&format!("Confirm {}:", noun))? else {
                return Ok(None);
            };
            if first != second {
                self.console
                    .error(&format!("{}s do not match!", capitalize(noun)))?;
                continue;
            }
            let missing = crate::validation::password_weaknesses(&first);
            if !missing.is_empty() {
                self.console.warning(&format!(
                    "{} is too weak. It needs {}.",
                    capitalize(noun),
                    missing.join(", ")
                ))?;
                continue;
            }
            return Ok(Some(first));
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
