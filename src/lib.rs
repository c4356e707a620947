//! archbtrfs library
//!
//! Menu-driven installer for Arch Linux on btrfs. The binary wires a
//! [`ui::TuiConsole`] and a [`command::SystemRunner`] into a
//! [`session::Session`] and hands it to [`app::run`].

pub mod app;
pub mod cli;
pub mod command;
pub mod config;
pub mod console;
pub mod error;
pub mod hardware;
pub mod menu;
pub mod process_guard;
pub mod sanity;
pub mod session;
pub mod steps;
pub mod theme;
pub mod types;
pub mod ui;
pub mod validation;

pub use command::{CommandResult, CommandRunner, CommandSpec, SystemRunner, WriteMode};
pub use config::Settings;
pub use console::{Console, MenuView, Severity};
pub use error::{InstallerError, Result};
pub use hardware::FirmwareMode;
pub use menu::{Key, Menu, MenuItem};
pub use process_guard::{ChildRegistry, CommandProcessGroup, ProcessGuard};
pub use session::{BlockDevice, DiskLayout, Session};
pub use types::{Bootloader, DesktopEnvironment, Hypervisor, Kernel, PacmanRepo};
