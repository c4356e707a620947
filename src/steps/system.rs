//! Configuration of the installed system: clock, locale, identity,
//! accounts, swap and firmware packages

use anyhow::Result;

use crate::command::{CommandSpec, WriteMode};
use crate::hardware::{parse_cpu_vendor, parse_hypervisor, parse_mem_total_kib};
use crate::session::Session;
use crate::validation::{is_valid_hostname, is_valid_timezone, is_valid_username};

pub fn chroot_into_system(session: &mut Session<'_>) -> Result<()> {
    if session.settings.targets_live_system() {
        session
            .console
            .warning("The target root is the running system; there is nothing to chroot into.")?;
        return Ok(());
    }

    let spec = CommandSpec::new("arch-chroot").arg(session.target_root());
    session.console.suspend()?;
    let status = session.runner.run_interactive(&spec);
    session.console.resume()?;

    match status? {
        Some(0) => session.console.info("Left the chroot.")?,
        Some(code) => session
            .console
            .warning(&format!("The chroot shell exited with code {}.", code))?,
        None => session
            .console
            .warning("The chroot shell was killed by a signal.")?,
    }
    Ok(())
}

fn detect_timezone(session: &mut Session<'_>) -> Result<Option<String>> {
    let output = session.run(
        CommandSpec::new("timedatectl")
            .args(["show", "--property=Timezone", "--value"])
            .read_only(),
    )?;
    let tz = output.stdout.trim();
    Ok((output.success() && is_valid_timezone(tz)).then(|| tz.to_string()))
}

pub fn set_time_zone(session: &mut Session<'_>) -> Result<()> {
    let detected = detect_timezone(session)?;
    let use_detected = match &detected {
        Some(tz) => session
            .console
            .confirm(&format!("Detected time zone {}. Use it? (y/n)", tz))?,
        None => false,
    };

    let timezone = match detected {
        Some(tz) if use_detected => tz,
        _ => loop {
            let Some(input) = session
                .console
                .read_line("Enter time zone (e.g. Europe/Berlin):")?
            else {
                return Ok(());
            };
            let input = input.trim().to_string();
            if !is_valid_timezone(&input) {
                session
                    .console
                    .error(&format!("{:?} is not a valid time zone name.", input))?;
                continue;
            }
            let zonefile = format!("/usr/share/zoneinfo/{}", input);
            let check = CommandSpec::new("test")
                .args(["-f", zonefile.as_str()])
                .read_only();
            let exists = session.run_in_target(check)?.success();
            if !exists {
                session
                    .console
                    .error(&format!("Unknown time zone: {}", input))?;
                continue;
            }
            break input;
        },
    };

    let zonefile = format!("/usr/share/zoneinfo/{}", timezone);
    session.run_in_target_checked(
        CommandSpec::new("ln").args(["-sf", zonefile.as_str(), "/etc/localtime"]),
    )?;
    session.run_in_target_checked(CommandSpec::new("hwclock").arg("--systohc"))?;
    session
        .console
        .success(&format!("Time zone set to {}.", timezone))?;
    Ok(())
}

/// Line for `/etc/locale.gen`, e.g. `en_US.UTF-8 UTF-8`
pub fn locale_gen_line(locale: &str) -> String {
    let charset = locale.split_once('.').map_or("UTF-8", |(_, charset)| charset);
    format!("{} {}\n", locale, charset)
}

pub fn localization(session: &mut Session<'_>) -> Result<()> {
    let locale = session.settings.locale.clone();
    session.write_target_file("/etc/locale.gen", &locale_gen_line(&locale), WriteMode::Append)?;
    session.run_in_target_checked(CommandSpec::new("locale-gen"))?;
    session.write_target_file(
        "/etc/locale.conf",
        &format!("LANG={}\n", locale),
        WriteMode::Overwrite,
    )?;
    session
        .console
        .success(&format!("Locale set to {}.", locale))?;
    Ok(())
}

/// `/etc/hosts` for a freshly named machine
pub fn hosts_file(hostname: &str) -> String {
    format!(
        "127.0.0.1\tlocalhost\n::1\t\tlocalhost\n127.0.1.1\t{0}.localdomain\t{0}\n",
        hostname.trim_end_matches('.')
    )
}

pub fn set_hostname(session: &mut Session<'_>) -> Result<()> {
    let hostname = loop {
        let Some(input) = session.console.read_line("Enter hostname:")? else {
            return Ok(());
        };
        let input = input.trim().to_string();
        if is_valid_hostname(&input) {
            break input;
        }
        session.console.error(
            "Invalid hostname. Use letters, digits and hyphens; each label 1-63 characters, \
             not starting or ending with a hyphen.",
        )?;
    };

    session.write_target_file("/etc/hostname", &format!("{}\n", hostname), WriteMode::Overwrite)?;
    session.write_target_file("/etc/hosts", &hosts_file(&hostname), WriteMode::Overwrite)?;
    session
        .console
        .success(&format!("Hostname set to {}.", hostname))?;
    Ok(())
}

fn chpasswd(user: &str, password: &str) -> CommandSpec {
    CommandSpec::new("chpasswd").stdin(format!("{}:{}\n", user, password))
}

pub fn set_root_password(session: &mut Session<'_>) -> Result<()> {
    loop {
        let Some(password) = session.prompt_new_secret("password", "for root")? else {
            return Ok(());
        };
        let result = session.run_in_target(chpasswd("root", &password))?;
        if result.success() {
            session.console.success("Root password set.")?;
            return Ok(());
        }
        session.console.error(&format!(
            "Failed to set the root password: {}",
            result.stderr.trim()
        ))?;
    }
}

pub fn create_user(session: &mut Session<'_>) -> Result<()> {
    'username: loop {
        let Some(input) = session.console.read_line("Enter username:")? else {
            return Ok(());
        };
        let username = input.trim().to_string();
        if !is_valid_username(&username) {
            session.console.error(
                "Invalid username. Use lowercase letters, digits, '_' and '-', \
                 starting with a letter or '_' (at most 32 characters).",
            )?;
            continue;
        }

        let exists = session
            .run_in_target(CommandSpec::new("id").arg(&username).read_only())?
            .success();
        if exists {
            session
                .console
                .error(&format!("User {} already exists.", username))?;
            continue;
        }

        let mut account_created = false;
        loop {
            let subject = format!("for {}", username);
            let Some(password) = session.prompt_new_secret("password", &subject)? else {
                return Ok(());
            };

            if !account_created {
                let useradd = CommandSpec::new("useradd")
                    .args(["-m", "-G", "wheel", "-s", "/bin/bash"])
                    .arg(&username);
                let created = session.run_in_target(useradd)?;
                if !created.success() {
                    session.console.error(&format!(
                        "Failed to create user {}: {}",
                        username,
                        created.stderr.trim()
                    ))?;
                    continue 'username;
                }
                account_created = true;
            }

            let result = session.run_in_target(chpasswd(&username, &password))?;
            if result.success() {
                session
                    .console
                    .success(&format!("User {} created.", username))?;
                return Ok(());
            }
            session.console.error(&format!(
                "Failed to set the password for {}: {}",
                username,
                result.stderr.trim()
            ))?;
        }
    }
}

/// Files written by the zRAM step, as (path, contents, mode)
pub fn zram_files(mem_total_kib: u64) -> Vec<(&'static str, String, WriteMode)> {
    let size_kib = mem_total_kib / 2;
    vec![
        ("/etc/modules-load.d/zram.conf", "zram\n".to_string(), WriteMode::Overwrite),
        (
            "/etc/modprobe.d/zram.conf",
            "options zram num_devices=1\n".to_string(),
            WriteMode::Overwrite,
        ),
        (
            "/etc/udev/rules.d/99-zram.rules",
            format!(
                "KERNEL==\"zram0\", ATTR{{disksize}}=\"{}K\", RUN=\"/usr/bin/mkswap -U clear /dev/%k\", TAG+=\"systemd\"\n",
                size_kib
            ),
            WriteMode::Overwrite,
        ),
        (
            "/etc/fstab",
            "/dev/zram0\tnone\tswap\tdefaults,pri=100\t0 0\n".to_string(),
            WriteMode::Append,
        ),
    ]
}

pub fn setup_zram(session: &mut Session<'_>) -> Result<()> {
    let meminfo = session.runner.read_file(std::path::Path::new("/proc/meminfo"))?;
    let Some(mem_total) = parse_mem_total_kib(&meminfo) else {
        session
            .console
            .error("Could not read total memory from /proc/meminfo.")?;
        return Ok(());
    };

    for (path, contents, mode) in zram_files(mem_total) {
        session.write_target_file(path, &contents, mode)?;
    }
    session.console.success(&format!(
        "zRAM swap configured ({} MiB).",
        mem_total / 2 / 1024
    ))?;
    Ok(())
}

pub fn install_microcode_and_guest_tools(session: &mut Session<'_>) -> Result<()> {
    let mut report = Vec::new();

    let cpuinfo = session.runner.read_file(std::path::Path::new("/proc/cpuinfo"))?;
    match parse_cpu_vendor(&cpuinfo) {
        Some(vendor) => {
            session.install_packages(&[vendor.microcode_package()])?;
            report.push(format!("Installed {}.", vendor.microcode_package()));
        }
        None => report.push("Unknown CPU vendor; no microcode installed.".to_string()),
    }

    // Exits non-zero and prints "none" on bare metal.
    let virt = session.run(CommandSpec::new("systemd-detect-virt").read_only())?;
    match parse_hypervisor(&virt.stdout) {
        Some(hypervisor) => {
            session.install_packages(hypervisor.guest_packages())?;
            session.enable_services(hypervisor.guest_services())?;
            report.push(format!(
                "Installed {} guest tools: {}.",
                hypervisor,
                hypervisor.guest_packages().join(" ")
            ));
        }
        None => report.push("No supported hypervisor detected.".to_string()),
    }

    session.console.success(&report.join("\n"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_gen_line() {
        assert_eq!(locale_gen_line("en_US.UTF-8"), "en_US.UTF-8 UTF-8\n");
        assert_eq!(locale_gen_line("de_DE.ISO-8859-1"), "de_DE.ISO-8859-1 ISO-8859-1\n");
        assert_eq!(locale_gen_line("C"), "C UTF-8\n");
    }

    #[test]
    fn test_hosts_file() {
        let hosts = hosts_file("archbox");
        assert!(hosts.contains("127.0.1.1\tarchbox.localdomain\tarchbox"));
        assert!(hosts.starts_with("127.0.0.1\tlocalhost"));
    }

    #[test]
    fn test_zram_files_use_half_of_memory() {
        let files = zram_files(8_000_000);
        assert_eq!(files.len(), 4);
        let (path, rule, _) = &files[2];
        assert_eq!(*path, "/etc/udev/rules.d/99-zram.rules");
        assert!(rule.contains("ATTR{disksize}=\"4000000K\""));
        assert!(rule.contains("TAG+=\"systemd\""));
        assert_eq!(files[3].2, WriteMode::Append);
    }
}
