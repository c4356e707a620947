//! Installation steps and the menus that reach them
//!
//! Each step is a plain function over [`crate::session::Session`]. The
//! menu builders below are the only place that decides order and labels.

pub mod bootloader;
pub mod disk;
pub mod network;
pub mod packages;
pub mod repos;
pub mod services;
pub mod system;

use crate::menu::{Menu, MenuItem};

pub fn main_menu() -> Menu {
    Menu::new(
        "Arch Linux BTRFS Installer",
        vec![
            MenuItem::submenu("Install Filesystem", filesystem_menu),
            MenuItem::step("Install essential packages", packages::install_essential_packages),
            MenuItem::step("Configure fstab", disk::configure_fstab),
            MenuItem::step("Chroot into system", system::chroot_into_system),
            MenuItem::step("Set time zone", system::set_time_zone),
            MenuItem::step("Localization", system::localization),
            MenuItem::submenu("Network configuration", network_menu),
            MenuItem::step("Set hostname", system::set_hostname),
            MenuItem::step("Set root password", system::set_root_password),
            MenuItem::step("Create a new user", system::create_user),
            MenuItem::step("Kernel Selector", packages::select_kernel),
            MenuItem::step("Install additional packages", packages::install_additional_packages),
            MenuItem::step("Install custom packages", packages::install_custom_packages),
            MenuItem::step(
                "Desktop Environment Installation",
                packages::install_desktop_environment,
            ),
            MenuItem::step("Display Services Menu", services::display_services_menu),
            MenuItem::step("Enable necessary services", services::enable_necessary_services),
            MenuItem::step("Setup zRAM", system::setup_zram),
            MenuItem::step("Configure pacman repositories", repos::configure_pacman_repos),
            MenuItem::step("Setup Chaotic-AUR", repos::setup_chaotic_aur),
            MenuItem::step("Setup CachyOS Repository", repos::setup_cachyos_repo),
            MenuItem::step(
                "Install microcode and guest tools",
                system::install_microcode_and_guest_tools,
            ),
            MenuItem::back("Quit"),
        ],
    )
}

pub fn filesystem_menu() -> Menu {
    Menu::new(
        "Install Filesystem",
        vec![
            MenuItem::step("Choose Drive", disk::choose_drive),
            MenuItem::step("Format Partitions", disk::format_partitions),
            MenuItem::step("Create Subvolumes", disk::create_subvolumes),
            MenuItem::step("Mount File System", disk::mount_filesystem),
            MenuItem::submenu("Install Bootloader", bootloader_menu),
            MenuItem::back("Exit"),
        ],
    )
    .with_hint("Use ↑/↓ to navigate, Enter to select, Esc or q to go back")
}

pub fn bootloader_menu() -> Menu {
    Menu::new(
        "Install Bootloader",
        vec![
            MenuItem::step("GRUB", bootloader::install_grub),
            MenuItem::step("rEFInd", bootloader::install_refind),
            MenuItem::step("systemd-boot", bootloader::install_systemd_boot),
            MenuItem::back("Exit"),
        ],
    )
    .with_hint("Use ↑/↓ to navigate, Enter to select, Esc or q to go back")
}

pub fn network_menu() -> Menu {
    Menu::new(
        "Network configuration",
        vec![
            MenuItem::step("Wired connection", network::wired_connection),
            MenuItem::step("Wi-Fi connection", network::wifi_connection),
            MenuItem::step("Check current connection", network::check_connection),
            MenuItem::back("Return"),
        ],
    )
    .with_hint("Use ↑/↓ to navigate, Enter to select, Esc or q to go back")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::MenuAction;

    #[test]
    fn test_every_menu_ends_with_back() {
        for menu in [main_menu(), filesystem_menu(), bootloader_menu(), network_menu()] {
            let last = menu.items.last().expect("menu has items");
            assert!(matches!(last.action, MenuAction::Back), "{}", menu.title);
            let backs = menu
                .items
                .iter()
                .filter(|item| matches!(item.action, MenuAction::Back))
                .count();
            assert_eq!(backs, 1, "{}", menu.title);
        }
    }

    #[test]
    fn test_main_menu_order() {
        let labels = main_menu().labels();
        assert_eq!(labels.first(), Some(&"Install Filesystem"));
        assert_eq!(labels.last(), Some(&"Quit"));
        assert_eq!(labels.len(), 22);
    }

    #[test]
    fn test_filesystem_menu_order() {
        assert_eq!(
            filesystem_menu().labels(),
            [
                "Choose Drive",
                "Format Partitions",
                "Create Subvolumes",
                "Mount File System",
                "Install Bootloader",
                "Exit"
            ]
        );
    }
}
