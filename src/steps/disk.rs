//! Drive selection, partitioning, encryption, subvolumes and mounts

use anyhow::Result;

use crate::command::{CommandSpec, WriteMode};
use crate::hardware::FirmwareMode;
use crate::session::{BlockDevice, DiskLayout, Session};
use crate::types::SUBVOLUMES;

/// Parse `lsblk -dpno NAME,SIZE,MODEL`. The model may contain spaces and
/// may be missing.
pub fn parse_lsblk(output: &str) -> Vec<BlockDevice> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let path = fields.next()?;
            let size = fields.next().unwrap_or_default();
            let model = fields.collect::<Vec<_>>().join(" ");
            Some(BlockDevice {
                path: path.to_string(),
                size: size.to_string(),
                model,
            })
        })
        .collect()
}

/// Device node of partition `number` on `drive`. Names ending in a digit
/// (`nvme0n1`, `mmcblk0`, `loop0`) take a `p` separator.
pub fn partition_path(drive: &str, number: u32) -> String {
    if drive.ends_with(|c: char| c.is_ascii_digit()) {
        format!("{}p{}", drive, number)
    } else {
        format!("{}{}", drive, number)
    }
}

/// Mount options for a subvolume
pub fn mount_options(subvolume: &str, compress: bool) -> String {
    if compress {
        format!("compress=zstd,subvol={}", subvolume)
    } else {
        format!("subvol={}", subvolume)
    }
}

/// `sgdisk` arguments creating the partition table.
///
/// UEFI gets an ESP and the root. BIOS puts a 1 MiB BIOS boot partition
/// (`ef02`) first, which GRUB needs to embed its core image on GPT.
pub fn partition_table_args(firmware: FirmwareMode, esp_size: &str) -> Vec<String> {
    let mut partitions = Vec::new();
    if !firmware.is_uefi() {
        partitions.push(("+1M".to_string(), "ef02"));
    }
    partitions.push((esp_size.to_string(), "ef00"));
    partitions.push(("0".to_string(), "8300"));

    partitions
        .iter()
        .enumerate()
        .flat_map(|(i, (end, code))| {
            let number = i + 1;
            [
                "-n".to_string(),
                format!("{}:0:{}", number, end),
                "-t".to_string(),
                format!("{}:{}", number, code),
            ]
        })
        .collect()
}

/// Layout for steps run without formatting in this session: the standard
/// scheme on the selected drive.
fn layout_for(drive: &BlockDevice, firmware: FirmwareMode) -> DiskLayout {
    let esp_number = if firmware.is_uefi() { 1 } else { 2 };
    let root_partition = partition_path(&drive.path, esp_number + 1);
    DiskLayout {
        drive: drive.path.clone(),
        esp: partition_path(&drive.path, esp_number),
        root_device: root_partition.clone(),
        root_partition,
        encrypted: false,
        compress: true,
    }
}

/// Disk steps never act on the running system. Returns `true` after
/// telling the operator when the target root is `/`.
pub(crate) fn refuse_live_target(session: &mut Session<'_>) -> Result<bool> {
    if !session.settings.targets_live_system() {
        return Ok(false);
    }
    session.console.error(
        "The target root is the running system (/). Set target_root to a mount point such as /mnt.",
    )?;
    Ok(true)
}

/// Current layout, or `None` (after telling the operator) without a drive
pub(crate) fn require_layout(session: &mut Session<'_>) -> Result<Option<DiskLayout>> {
    let Some(drive) = session.drive.clone() else {
        session.console.error("No drive selected!")?;
        return Ok(None);
    };
    Ok(Some(match &session.layout {
        Some(layout) if layout.drive == drive.path => layout.clone(),
        _ => layout_for(&drive, session.firmware),
    }))
}

pub fn choose_drive(session: &mut Session<'_>) -> Result<()> {
    let output = session.run_checked(
        CommandSpec::new("lsblk")
            .args(["-dpno", "NAME,SIZE,MODEL"])
            .read_only(),
    )?;
    let drives = parse_lsblk(&output.stdout);

    if drives.is_empty() {
        session.drive = None;
        session.console.error("No drives detected!")?;
        return Ok(());
    }

    let labels: Vec<String> = drives.iter().map(BlockDevice::label).collect();
    if let Some(index) = session.console.select("Select a drive", &labels)? {
        let drive = drives[index].clone();
        tracing::info!(drive = %drive.path, "drive selected");
        session
            .console
            .success(&format!("Selected drive: {}", drive.label()))?;
        session.drive = Some(drive);
    }
    Ok(())
}

pub fn format_partitions(session: &mut Session<'_>) -> Result<()> {
    let Some(drive) = session.drive.clone() else {
        session.console.error("No drive selected!")?;
        return Ok(());
    };
    if refuse_live_target(session)? {
        return Ok(());
    }

    let question = format!(
        "This will ERASE ALL DATA on {}. Continue? (y/n)",
        drive.label()
    );
    if !session.console.confirm(&question)? {
        session.console.info("Operation cancelled.")?;
        return Ok(());
    }

    let encrypt = session
        .console
        .confirm("Encrypt the root partition with LUKS? (y/n)")?;
    let compress = session
        .console
        .confirm("Enable zstd compression for btrfs? (y/n)")?;

    let mut layout = layout_for(&drive, session.firmware);
    layout.compress = compress;

    // Collected up front so a cancel leaves the disk untouched.
    let passphrase = if encrypt {
        let subject = format!("for {}", layout.root_partition);
        match session.prompt_new_secret("passphrase", &subject)? {
            Some(passphrase) => Some(passphrase),
            None => {
                session.console.info("Operation cancelled.")?;
                return Ok(());
            }
        }
    } else {
        None
    };

    let root = session.target_root();
    session.run(CommandSpec::new("umount").args(["-R", &root]))?;
    // A mapping left open by an earlier pass keeps the partition busy.
    let previous = session.layout.take();
    if previous.is_some_and(|layout| layout.encrypted) {
        let mapper = session.settings.luks_mapper.clone();
        let closed = session.run(CommandSpec::new("cryptsetup").args(["close", mapper.as_str()]))?;
        if !closed.success() {
            tracing::warn!(mapper = %mapper, "cryptsetup close failed, continuing");
        }
    }

    session.run_checked(CommandSpec::new("sgdisk").args(["--zap-all", &drive.path]))?;
    let esp_size = session.settings.esp_size.clone();
    session.run_checked(
        CommandSpec::new("sgdisk")
            .args(partition_table_args(session.firmware, &esp_size))
            .arg(&drive.path),
    )?;
    let reread = session.run(CommandSpec::new("partprobe").arg(&drive.path))?;
    if !reread.success() {
        tracing::warn!(drive = %drive.path, "partprobe failed, continuing");
    }

    session.run_checked(CommandSpec::new("mkfs.fat").args(["-F", "32", &layout.esp]))?;

    if let Some(passphrase) = passphrase {
        layout.root_device = setup_encryption(session, &layout.root_partition, &passphrase)?;
        layout.encrypted = true;
    }

    let label = session.settings.root_label.clone();
    session.run_checked(CommandSpec::new("mkfs.btrfs").args([
        "-f",
        "-L",
        &label,
        &layout.root_device,
    ]))?;

    tracing::info!(?layout, "drive formatted");
    let summary = format!(
        "Formatted {}: EFI on {}, btrfs on {}{}.",
        drive.path,
        layout.esp,
        layout.root_device,
        if layout.encrypted { " (LUKS)" } else { "" }
    );
    session.layout = Some(layout);
    session.console.success(&summary)?;
    Ok(())
}

/// LUKS-format `partition` and open it. Returns the mapped device.
pub fn setup_encryption(
    session: &mut Session<'_>,
    partition: &str,
    passphrase: &str,
) -> Result<String> {
    let mapper = session.settings.luks_mapper.clone();
    session.run_checked(
        CommandSpec::new("cryptsetup")
            .args(["luksFormat", "--type", "luks2", "--batch-mode", "--key-file=-"])
            .arg(partition)
            .stdin(passphrase),
    )?;
    session.run_checked(
        CommandSpec::new("cryptsetup")
            .args(["open", "--key-file=-", partition, &mapper])
            .stdin(passphrase),
    )?;
    tracing::info!(partition, mapper = %mapper, "encrypted partition opened");
    Ok(format!("/dev/mapper/{}", mapper))
}

pub fn create_subvolumes(session: &mut Session<'_>) -> Result<()> {
    let Some(layout) = require_layout(session)? else {
        return Ok(());
    };
    if refuse_live_target(session)? {
        return Ok(());
    }
    let root = session.target_root();

    session.run(CommandSpec::new("umount").args(["-R", &root]))?;
    session.run_checked(CommandSpec::new("mount").args([&layout.root_device, &root]))?;
    for subvolume in SUBVOLUMES {
        let path = format!("{}/{}", root.trim_end_matches('/'), subvolume.name);
        session.run_checked(CommandSpec::new("btrfs").args(["subvolume", "create", &path]))?;
    }
    session.run_checked(CommandSpec::new("umount").arg(&root))?;

    let names: Vec<&str> = SUBVOLUMES.iter().map(|s| s.name).collect();
    session
        .console
        .success(&format!("Created subvolumes: {}", names.join(" ")))?;
    Ok(())
}

pub fn mount_filesystem(session: &mut Session<'_>) -> Result<()> {
    let Some(layout) = require_layout(session)? else {
        return Ok(());
    };
    if refuse_live_target(session)? {
        return Ok(());
    }
    let root = session.target_root();

    session.run(CommandSpec::new("umount").args(["-R", &root]))?;
    for subvolume in SUBVOLUMES {
        let target = if subvolume.mount_point == "/" {
            root.clone()
        } else {
            let target = session.target_path(subvolume.mount_point).display().to_string();
            session.run_checked(CommandSpec::new("mkdir").args(["-p", &target]))?;
            target
        };
        session.run_checked(CommandSpec::new("mount").args([
            "-o",
            &mount_options(subvolume.name, layout.compress),
            &layout.root_device,
            &target,
        ]))?;
    }

    let boot = session.target_path("/boot").display().to_string();
    session.run_checked(CommandSpec::new("mkdir").args(["-p", &boot]))?;
    session.run_checked(CommandSpec::new("mount").args([&layout.esp, &boot]))?;

    session
        .console
        .success(&format!("File system mounted at {}.", root))?;
    Ok(())
}

pub fn configure_fstab(session: &mut Session<'_>) -> Result<()> {
    let root = session.target_root();
    let output =
        session.run_checked(CommandSpec::new("genfstab").args(["-U", &root]).read_only())?;
    if output.stdout.trim().is_empty() {
        session
            .console
            .warning("genfstab found no mounted file systems. Mount the file system first.")?;
        return Ok(());
    }
    session.write_target_file("/etc/fstab", &output.stdout, WriteMode::Append)?;
    session.console.success("fstab generated.")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lsblk() {
        let output = "/dev/sda 465.8G Samsung SSD 860 EVO\n\n/dev/nvme0n1   1.8T\n";
        let drives = parse_lsblk(output);
        assert_eq!(drives.len(), 2);
        assert_eq!(drives[0].path, "/dev/sda");
        assert_eq!(drives[0].size, "465.8G");
        assert_eq!(drives[0].model, "Samsung SSD 860 EVO");
        assert_eq!(drives[1].model, "");
        assert_eq!(drives[1].label(), "/dev/nvme0n1  1.8T");
    }

    #[test]
    fn test_parse_lsblk_empty() {
        assert!(parse_lsblk("").is_empty());
        assert!(parse_lsblk("\n  \n").is_empty());
    }

    #[test]
    fn test_partition_path() {
        assert_eq!(partition_path("/dev/sda", 2), "/dev/sda2");
        assert_eq!(partition_path("/dev/vdb", 1), "/dev/vdb1");
        assert_eq!(partition_path("/dev/nvme0n1", 1), "/dev/nvme0n1p1");
        assert_eq!(partition_path("/dev/mmcblk0", 2), "/dev/mmcblk0p2");
    }

    #[test]
    fn test_mount_options() {
        assert_eq!(mount_options("@", true), "compress=zstd,subvol=@");
        assert_eq!(mount_options("@home", false), "subvol=@home");
    }

    #[test]
    fn test_default_layout() {
        let drive = BlockDevice {
            path: "/dev/nvme0n1".into(),
            size: "1T".into(),
            model: String::new(),
        };
        let layout = layout_for(&drive, FirmwareMode::Uefi);
        assert_eq!(layout.esp, "/dev/nvme0n1p1");
        assert_eq!(layout.root_device, "/dev/nvme0n1p2");
        assert!(!layout.encrypted);

        let layout = layout_for(&drive, FirmwareMode::Bios);
        assert_eq!(layout.esp, "/dev/nvme0n1p2");
        assert_eq!(layout.root_partition, "/dev/nvme0n1p3");
    }

    #[test]
    fn test_partition_table_args() {
        assert_eq!(
            partition_table_args(FirmwareMode::Uefi, "+512M").join(" "),
            "-n 1:0:+512M -t 1:ef00 -n 2:0:0 -t 2:8300"
        );
        assert_eq!(
            partition_table_args(FirmwareMode::Bios, "+1G").join(" "),
            "-n 1:0:+1M -t 1:ef02 -n 2:0:+1G -t 2:ef00 -n 3:0:0 -t 3:8300"
        );
    }
}
