//! Property-based tests
//!
//! Invariants of the validators, partition naming, pacman.conf editing
//! and the enum string forms.

use proptest::prelude::*;
use std::str::FromStr;
use strum::IntoEnumIterator;

use archbtrfs::menu::{Key, MenuState};
use archbtrfs::steps::disk::partition_path;
use archbtrfs::steps::repos::{enable_repo_section, section_enabled};
use archbtrfs::types::{Hypervisor, Kernel, PacmanRepo};
use archbtrfs::validation::{
    PASSWORD_SPECIALS, is_strong_password, is_valid_hostname, is_valid_username,
    parse_package_list, password_weaknesses,
};

// =============================================================================
// Passwords
// =============================================================================

proptest! {
    /// Strong exactly when no rule is broken
    #[test]
    fn strength_agrees_with_weaknesses(password in "\\PC{0,20}") {
        prop_assert_eq!(is_strong_password(&password), password_weaknesses(&password).is_empty());
    }

    /// Any password built from one character of each class plus padding is strong
    #[test]
    fn composed_password_is_strong(
        upper in "[A-Z]",
        lower in "[a-z]",
        digit in "[0-9]",
        special in prop::sample::select(PASSWORD_SPECIALS.chars().collect::<Vec<_>>()),
        padding in "[a-z]{4,12}",
    ) {
        let password = format!("{}{}{}{}{}", upper, lower, digit, special, padding);
        prop_assert!(is_strong_password(&password));
    }

    /// Shorter than eight characters is never strong
    #[test]
    fn short_password_is_weak(password in "\\PC{0,7}") {
        prop_assert!(!is_strong_password(&password));
    }
}

// =============================================================================
// Hostnames and usernames
// =============================================================================

proptest! {
    /// Well-formed dotted names are accepted, with or without one trailing dot
    #[test]
    fn dotted_hostname_is_valid(
        labels in prop::collection::vec("[a-z0-9]([a-z0-9-]{0,20}[a-z0-9])?", 1..5),
        trailing_dot in any::<bool>(),
    ) {
        let mut name = labels.join(".");
        if trailing_dot {
            name.push('.');
        }
        prop_assert!(is_valid_hostname(&name));
    }

    /// A label starting or ending with a hyphen is rejected
    #[test]
    fn hyphen_edge_label_is_invalid(label in "[a-z]{1,10}", leading in any::<bool>()) {
        let bad = if leading { format!("-{}", label) } else { format!("{}-", label) };
        let name = format!("host.{}", bad);
        prop_assert!(!is_valid_hostname(&name));
    }

    /// Anything longer than 255 characters is rejected
    #[test]
    fn overlong_hostname_is_invalid(extra in 1usize..50) {
        let name = "a".repeat(63) + "." + &"b".repeat(63) + "." + &"c".repeat(63) + "." + &"d".repeat(63 + extra);
        prop_assert!(!is_valid_hostname(&name));
    }

    #[test]
    fn username_never_contains_uppercase(name in "[a-z_][a-z0-9_-]{0,10}[A-Z][a-z]{0,5}") {
        prop_assert!(!is_valid_username(&name));
    }
}

// =============================================================================
// Package lists
// =============================================================================

proptest! {
    /// Valid names come back unchanged and in order, whatever the spacing
    #[test]
    fn package_list_preserves_order(
        names in prop::collection::vec("[a-z0-9][a-z0-9+_.-]{0,15}", 0..8),
        sep in "[ \t]{1,3}",
    ) {
        let input = names.join(&sep);
        prop_assert_eq!(parse_package_list(&input), Ok(names));
    }

    /// One bad name makes the whole list fail and is reported
    #[test]
    fn package_list_reports_invalid(good in "[a-z]{1,8}", bad in "[A-Z;|&]{1,5}") {
        let input = format!("{} {}", good, bad);
        prop_assert_eq!(parse_package_list(&input), Err(vec![bad]));
    }
}

// =============================================================================
// Partitions and menus
// =============================================================================

proptest! {
    #[test]
    fn partition_path_separator(name in "[a-z]{2,6}", digit in 0u32..10, n in 1u32..9) {
        let plain = format!("/dev/{}", name);
        prop_assert_eq!(partition_path(&plain, n), format!("{}{}", plain, n));

        let numbered = format!("/dev/{}{}", name, digit);
        prop_assert_eq!(partition_path(&numbered, n), format!("{}p{}", numbered, n));
    }

    /// Arbitrary Up/Down sequences keep the selection in range
    #[test]
    fn menu_selection_stays_in_range(len in 1usize..30, downs in prop::collection::vec(any::<bool>(), 0..100)) {
        let mut state = MenuState::new(len);
        for down in downs {
            state.handle_key(if down { Key::Down } else { Key::Up }, false);
            prop_assert!(state.selected() < len);
        }
    }
}

// =============================================================================
// pacman.conf editing
// =============================================================================

fn repo_strategy() -> impl Strategy<Value = PacmanRepo> {
    prop::sample::select(PacmanRepo::iter().collect::<Vec<_>>())
}

const CONF: &str = "[options]\nArchitecture = auto\n\n\
#[core-testing]\n#Include = /etc/pacman.d/mirrorlist\n\n\
[core]\nInclude = /etc/pacman.d/mirrorlist\n\n\
#[extra-testing]\n#Include = /etc/pacman.d/mirrorlist\n\n\
[extra]\nInclude = /etc/pacman.d/mirrorlist\n\n\
#[multilib-testing]\n#Include = /etc/pacman.d/mirrorlist\n\n\
#[multilib]\n#Include = /etc/pacman.d/mirrorlist\n";

proptest! {
    /// Enabling a repository makes it enabled, and a second pass changes nothing
    #[test]
    fn enabling_repo_is_idempotent(repo in repo_strategy()) {
        let name = repo.to_string();
        prop_assert!(!section_enabled(CONF, &name));

        let edited = enable_repo_section(CONF, &name).expect("section present");
        prop_assert!(section_enabled(&edited, &name));
        prop_assert!(enable_repo_section(&edited, &name).is_none());
        prop_assert!(section_enabled(&edited, "core"));
    }
}

// =============================================================================
// Enum string forms
// =============================================================================

#[test]
fn kernel_names_round_trip() {
    for kernel in Kernel::iter() {
        let name = kernel.to_string();
        assert_eq!(Kernel::from_str(&name).ok(), Some(kernel));
        assert_eq!(kernel.packages(), vec![name.clone(), format!("{}-headers", name)]);
    }
}

#[test]
fn hypervisor_names_match_detect_virt() {
    for name in ["kvm", "qemu", "vmware", "oracle", "microsoft"] {
        assert!(Hypervisor::from_str(name).is_ok(), "{}", name);
    }
    assert!(Hypervisor::from_str("none").is_err());
}
