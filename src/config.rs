//! Runtime settings
//!
//! Paths and a handful of strings the steps use. Everything has a built-in
//! default; a JSON file passed with `--config` may override any subset.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::InstallerError;
use crate::types::{ADDITIONAL_PACKAGES, ESSENTIAL_PACKAGES};

/// Installer settings that can be saved/loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where the new system is mounted
    pub target_root: PathBuf,
    /// Append-only record of every command and its output
    pub command_log: PathBuf,
    /// Name of the opened LUKS mapping
    pub luks_mapper: String,
    /// Size of the EFI system partition, in sgdisk notation
    pub esp_size: String,
    /// Filesystem label for the btrfs root
    pub root_label: String,
    /// Locale written to locale.gen and locale.conf
    pub locale: String,
    /// Host pinged by "Check current connection"
    pub connectivity_host: String,
    /// Packages passed to pacstrap
    pub essential_packages: Vec<String>,
    /// Checklist offered by "Install additional packages"
    pub additional_packages: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_root: PathBuf::from("/mnt"),
            command_log: PathBuf::from("install_log.txt"),
            luks_mapper: "cryptroot".to_string(),
            esp_size: "+512M".to_string(),
            root_label: "archroot".to_string(),
            locale: "en_US.UTF-8".to_string(),
            connectivity_host: "archlinux.org".to_string(),
            essential_packages: ESSENTIAL_PACKAGES.iter().map(|s| s.to_string()).collect(),
            additional_packages: ADDITIONAL_PACKAGES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file, filling missing keys with defaults
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        let settings: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;
        Ok(settings)
    }

    /// Save settings to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write settings file: {}", path.display()))?;
        Ok(())
    }

    /// Check values the steps rely on
    pub fn validate(&self) -> crate::error::Result<()> {
        if !self.target_root.is_absolute() {
            return Err(InstallerError::config(format!(
                "target_root must be an absolute path, got {}",
                self.target_root.display()
            )));
        }
        if self.luks_mapper.is_empty() || self.luks_mapper.contains('/') {
            return Err(InstallerError::config(format!(
                "luks_mapper must be a plain name, got {:?}",
                self.luks_mapper
            )));
        }
        if !self.esp_size.starts_with('+') {
            return Err(InstallerError::config(format!(
                "esp_size must be relative (e.g. +512M), got {:?}",
                self.esp_size
            )));
        }
        if self.essential_packages.is_empty() {
            return Err(InstallerError::config("essential_packages cannot be empty"));
        }
        let bad: Vec<&String> = self
            .essential_packages
            .iter()
            .chain(&self.additional_packages)
            .filter(|p| !crate::validation::is_valid_package_name(p))
            .collect();
        if !bad.is_empty() {
            return Err(InstallerError::config(format!(
                "invalid package names: {:?}",
                bad
            )));
        }
        if !self.locale.contains('.') {
            return Err(InstallerError::config(format!(
                "locale must include a charset (e.g. en_US.UTF-8), got {:?}",
                self.locale
            )));
        }
        Ok(())
    }

    /// `path` (absolute inside the new system) resolved under the target root
    pub fn target_path(&self, path: &str) -> PathBuf {
        self.target_root.join(path.trim_start_matches('/'))
    }

    /// True when steps act on the running system directly
    pub fn targets_live_system(&self) -> bool {
        self.target_root == Path::new("/")
    }
}
