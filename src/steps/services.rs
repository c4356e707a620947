//! systemd unit management for the installed system

use anyhow::Result;

use crate::command::CommandSpec;
use crate::session::Session;

/// A service unit file and whether it is enabled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    pub name: String,
    pub enabled: bool,
}

/// Parse `systemctl list-unit-files --type=service --no-legend`.
///
/// Only units in the `enabled` or `disabled` state can be toggled; static,
/// masked, generated and template units are dropped.
pub fn parse_unit_files(output: &str) -> Vec<ServiceEntry> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let name = fields.next()?;
            let state = fields.next()?;
            if !name.ends_with(".service") || name.contains("@.") {
                return None;
            }
            match state {
                "enabled" => Some(true),
                "disabled" => Some(false),
                _ => None,
            }
            .map(|enabled| ServiceEntry {
                name: name.to_string(),
                enabled,
            })
        })
        .collect()
}

/// Units to enable and to disable so `entries` match `wanted`
pub fn service_changes(entries: &[ServiceEntry], wanted: &[bool]) -> (Vec<String>, Vec<String>) {
    let mut enable = Vec::new();
    let mut disable = Vec::new();
    for (entry, &want) in entries.iter().zip(wanted) {
        match (entry.enabled, want) {
            (false, true) => enable.push(entry.name.clone()),
            (true, false) => disable.push(entry.name.clone()),
            _ => {}
        }
    }
    (enable, disable)
}

pub fn display_services_menu(session: &mut Session<'_>) -> Result<()> {
    let root_flag = format!("--root={}", session.target_root());
    let listing = session.run_checked(
        CommandSpec::new("systemctl")
            .arg(&root_flag)
            .args(["list-unit-files", "--type=service", "--no-legend", "--no-pager"])
            .read_only(),
    )?;
    let entries = parse_unit_files(&listing.stdout);
    if entries.is_empty() {
        session.console.info("No services found.")?;
        return Ok(());
    }

    let names: Vec<String> = entries.iter().map(|e| e.name.clone()).collect();
    let current: Vec<bool> = entries.iter().map(|e| e.enabled).collect();
    let Some(wanted) = session.console.toggle_list(
        "Services (Space toggles, Enter applies, Esc discards)",
        &names,
        &current,
    )?
    else {
        session.console.info("No changes made.")?;
        return Ok(());
    };

    let (enable, disable) = service_changes(&entries, &wanted);
    if enable.is_empty() && disable.is_empty() {
        session.console.info("No changes made.")?;
        return Ok(());
    }

    if !enable.is_empty() {
        session.run_checked(
            CommandSpec::new("systemctl")
                .arg(&root_flag)
                .arg("enable")
                .args(enable.iter().cloned()),
        )?;
    }
    if !disable.is_empty() {
        session.run_checked(
            CommandSpec::new("systemctl")
                .arg(&root_flag)
                .arg("disable")
                .args(disable.iter().cloned()),
        )?;
    }

    session.console.success(&format!(
        "Enabled {} and disabled {} service(s).",
        enable.len(),
        disable.len()
    ))?;
    Ok(())
}

/// (package that must be installed, unit to enable)
const NECESSARY_SERVICES: &[(&str, &str)] = &[
    ("networkmanager", "NetworkManager"),
    ("plasma-meta", "sddm"),
    ("gdm", "gdm"),
];

pub fn enable_necessary_services(session: &mut Session<'_>) -> Result<()> {
    let mut units = Vec::new();
    for &(package, unit) in NECESSARY_SERVICES {
        if session.package_installed(package)? {
            units.push(unit);
        } else {
            tracing::debug!(package, unit, "package not installed, skipping unit");
        }
    }

    if units.is_empty() {
        session
            .console
            .warning("None of networkmanager, plasma-meta or gdm is installed.")?;
        return Ok(());
    }

    session.enable_services(&units)?;
    session
        .console
        .success(&format!("Enabled: {}", units.join(", ")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
NetworkManager.service                 enabled  enabled
sshd.service                           disabled disabled
systemd-journald.service               static   -
getty@.service                         enabled  enabled
dbus-org.freedesktop.nm.service        alias    -
bluetooth.service                      disabled disabled
";

    #[test]
    fn test_parse_unit_files() {
        let entries = parse_unit_files(LISTING);
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            ["NetworkManager.service", "sshd.service", "bluetooth.service"]
        );
        assert!(entries[0].enabled);
        assert!(!entries[1].enabled);
    }

    #[test]
    fn test_service_changes_only_reports_differences() {
        let entries = parse_unit_files(LISTING);
        let (enable, disable) = service_changes(&entries, &[false, true, false]);
        assert_eq!(enable, ["sshd.service"]);
        assert_eq!(disable, ["NetworkManager.service"]);

        let (enable, disable) = service_changes(&entries, &[true, false, false]);
        assert!(enable.is_empty());
        assert!(disable.is_empty());
    }
}
