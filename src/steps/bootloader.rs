//! Boot loader installation

use anyhow::Result;

use crate::command::CommandSpec;
use crate::session::Session;
use crate::steps::disk::require_layout;
use crate::types::Bootloader;

/// Commands that install `loader`, run inside the target.
///
/// `drive` is only used for BIOS GRUB, which writes to the disk's boot
/// area instead of the ESP.
pub fn install_commands(
    loader: Bootloader,
    uefi: bool,
    drive: &str,
) -> Vec<CommandSpec> {
    let pacman = |packages: &[&str]| {
        CommandSpec::new("pacman")
            .args(["-S", "--noconfirm", "--needed"])
            .args(packages.iter().copied())
    };
    match (loader, uefi) {
        (Bootloader::Grub, true) => vec![
            pacman(&["grub", "efibootmgr"]),
            CommandSpec::new("grub-install").args([
                "--target=x86_64-efi",
                "--efi-directory=/boot",
                "--bootloader-id=GRUB",
            ]),
            CommandSpec::new("grub-mkconfig").args(["-o", "/boot/grub/grub.cfg"]),
        ],
        (Bootloader::Grub, false) => vec![
            pacman(&["grub"]),
            CommandSpec::new("grub-install").args(["--target=i386-pc", drive]),
            CommandSpec::new("grub-mkconfig").args(["-o", "/boot/grub/grub.cfg"]),
        ],
        (Bootloader::Refind, _) => vec![
            pacman(&["refind", "efibootmgr"]),
            CommandSpec::new("refind-install"),
        ],
        (Bootloader::SystemdBoot, _) => vec![
            CommandSpec::new("bootctl").args(["--esp-path=/boot", "install"]),
        ],
    }
}

fn install(session: &mut Session<'_>, loader: Bootloader) -> Result<()> {
    let uefi = session.firmware.is_uefi();
    if loader.requires_uefi() && !uefi {
        session.console.error(&format!(
            "{} requires UEFI, but this system booted in {} mode.",
            loader, session.firmware
        ))?;
        return Ok(());
    }

    let drive = if uefi {
        String::new()
    } else {
        match require_layout(session)? {
            Some(layout) => layout.drive,
            None => return Ok(()),
        }
    };

    for spec in install_commands(loader, uefi, &drive) {
        session.run_in_target_checked(spec)?;
    }
    tracing::info!(%loader, firmware = %session.firmware, "bootloader installed");
    session
        .console
        .success(&format!("{} installed ({}).", loader, session.firmware))?;
    Ok(())
}

pub fn install_grub(session: &mut Session<'_>) -> Result<()> {
    install(session, Bootloader::Grub)
}

pub fn install_refind(session: &mut Session<'_>) -> Result<()> {
    install(session, Bootloader::Refind)
}

pub fn install_systemd_boot(session: &mut Session<'_>) -> Result<()> {
    install(session, Bootloader::SystemdBoot)
}
