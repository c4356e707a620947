//! Typed choices offered by the installer
//!
//! Package sets live next to the enum variant that selects them so the
//! menus, the steps and the tests all read from one table.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Packages installed by "Install essential packages"
pub const ESSENTIAL_PACKAGES: &[&str] = &["base", "linux", "linux-firmware", "btrfs-progs"];

/// Checklist offered by "Install additional packages", all preselected
pub const ADDITIONAL_PACKAGES: &[&str] = &[
    "btrfs-progs",
    "grub",
    "grub-btrfs",
    "rsync",
    "efibootmgr",
    "snapper",
    "reflector",
    "snap-pac",
    "zram-generator",
    "sudo",
    "micro",
    "git",
    "neofetch",
    "zsh",
    "man-db",
    "man-pages",
    "texinfo",
    "samba",
    "chromium",
    "nano",
];

/// A btrfs subvolume and where it is mounted in the new system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subvolume {
    pub name: &'static str,
    pub mount_point: &'static str,
}

/// Subvolume layout, root first
pub const SUBVOLUMES: &[Subvolume] = &[
    Subvolume { name: "@", mount_point: "/" },
    Subvolume { name: "@home", mount_point: "/home" },
    Subvolume { name: "@log", mount_point: "/var/log" },
    Subvolume { name: "@pkg", mount_point: "/var/cache/pacman/pkg" },
    Subvolume { name: "@.snapshots", mount_point: "/.snapshots" },
];

/// Kernel flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum Kernel {
    #[default]
    Linux,
    LinuxLts,
    LinuxZen,
    LinuxHardened,
}

impl Kernel {
    /// Kernel package plus its headers
    pub fn packages(self) -> Vec<String> {
        let name = self.to_string();
        let headers = format!("{}-headers", name);
        vec![name, headers]
    }
}

/// Desktop environment offered by the desktop step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
pub enum DesktopEnvironment {
    #[strum(serialize = "KDE Plasma")]
    Kde,
    #[strum(serialize = "GNOME")]
    Gnome,
}

impl DesktopEnvironment {
    pub fn packages(self) -> &'static [&'static str] {
        match self {
            Self::Kde => &[
                "plasma-meta",
                "kde-utilities",
                "kde-system",
                "kde-graphics",
                "dolphin-plugins",
                "sddm",
                "sddm-kcm",
            ],
            Self::Gnome => &["gnome", "gnome-extra", "gdm"],
        }
    }

    /// Display manager unit enabled after install
    pub fn display_manager(self) -> &'static str {
        match self {
            Self::Kde => "sddm",
            Self::Gnome => "gdm",
        }
    }
}

/// Packages added when the operator asks for Xorg
pub const XORG_PACKAGES: &[&str] = &["xorg-server", "xorg-apps"];

/// Boot loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
pub enum Bootloader {
    #[strum(serialize = "GRUB")]
    Grub,
    #[strum(serialize = "rEFInd")]
    Refind,
    #[strum(serialize = "systemd-boot")]
    SystemdBoot,
}

impl Bootloader {
    /// GRUB is the only loader here that also boots legacy BIOS machines
    pub fn requires_uefi(self) -> bool {
        !matches!(self, Self::Grub)
    }
}

/// Optional sections of the stock pacman.conf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum PacmanRepo {
    Multilib,
    MultilibTesting,
    CoreTesting,
    ExtraTesting,
}

/// Hypervisor reported by `systemd-detect-virt`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Hypervisor {
    Kvm,
    Qemu,
    Vmware,
    Oracle,
    Microsoft,
}

impl Hypervisor {
    pub fn guest_packages(self) -> &'static [&'static str] {
        match self {
            Self::Kvm | Self::Qemu => &["qemu-guest-agent"],
            Self::Vmware => &["open-vm-tools"],
            Self::Oracle => &["virtualbox-guest-utils"],
            Self::Microsoft => &["hyperv"],
        }
    }

    pub fn guest_services(self) -> &'static [&'static str] {
        match self {
            Self::Kvm | Self::Qemu => &["qemu-guest-agent"],
            Self::Vmware => &["vmtoolsd", "vmware-vmblock-fuse"],
            Self::Oracle => &["vboxservice"],
            Self::Microsoft => &["hv_fcopy_daemon", "hv_kvp_daemon", "hv_vss_daemon"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_kernel_packages() {
        assert_eq!(
            Kernel::LinuxZen.packages(),
            vec!["linux-zen".to_string(), "linux-zen-headers".to_string()]
        );
        let names: Vec<String> = Kernel::iter().map(|k| k.to_string()).collect();
        assert_eq!(names, ["linux", "linux-lts", "linux-zen", "linux-hardened"]);
    }

    #[test]
    fn test_subvolume_layout() {
        assert_eq!(SUBVOLUMES[0].name, "@");
        assert_eq!(SUBVOLUMES[0].mount_point, "/");
        assert_eq!(SUBVOLUMES.len(), 5);
        assert!(SUBVOLUMES.iter().all(|s| s.name.starts_with('@')));
    }

    #[test]
    fn test_bootloader_firmware_requirements() {
        assert!(!Bootloader::Grub.requires_uefi());
        assert!(Bootloader::Refind.requires_uefi());
        assert!(Bootloader::SystemdBoot.requires_uefi());
    }

    #[test]
    fn test_repo_section_names() {
        assert_eq!(PacmanRepo::Multilib.to_string(), "multilib");
        assert_eq!(PacmanRepo::CoreTesting.to_string(), "core-testing");
    }

    #[test]
    fn test_hypervisor_parse() {
        assert_eq!("oracle".parse::<Hypervisor>(), Ok(Hypervisor::Oracle));
        assert!("none".parse::<Hypervisor>().is_err());
        assert_eq!(Hypervisor::Vmware.guest_services().len(), 2);
    }

    #[test]
    fn test_desktop_display_manager_is_installed() {
        for de in DesktopEnvironment::iter() {
            assert!(de.packages().contains(&de.display_manager()));
        }
    }
}
