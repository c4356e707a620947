//! Network configuration on the live system

use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;

use crate::command::CommandSpec;
use crate::session::Session;

const DEFAULT_WIFI_INTERFACE: &str = "wlan0";

static SSID_LINE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*SSID: (.+?)\s*$").ok());

/// First wireless interface in `iw dev` output
pub fn parse_wifi_interface(iw_dev: &str) -> Option<String> {
    iw_dev
        .lines()
        .find_map(|line| line.trim().strip_prefix("Interface "))
        .map(|name| name.trim().to_string())
}

/// Distinct SSIDs from `iw dev <if> scan`, in scan order. Hidden
/// networks (empty or NUL-padded names) are skipped.
pub fn parse_ssids(scan: &str) -> Vec<String> {
    let Some(re) = SSID_LINE.as_ref() else {
        return Vec::new();
    };
    let mut ssids: Vec<String> = Vec::new();
    for caps in scan.lines().filter_map(|line| re.captures(line)) {
        let ssid = &caps[1];
        if ssid.starts_with("\\x00") || ssids.iter().any(|s| s == ssid) {
            continue;
        }
        ssids.push(ssid.to_string());
    }
    ssids
}

pub fn wired_connection(session: &mut Session<'_>) -> Result<()> {
    session.console.info(
        "Wired connections are configured automatically by the live environment.\n\
         Make sure the cable is plugged in, then use \"Check current connection\".",
    )?;
    Ok(())
}

fn wifi_interface(session: &mut Session<'_>) -> Result<String> {
    let output = session.run(CommandSpec::new("iw").arg("dev").read_only())?;
    Ok(parse_wifi_interface(&output.stdout).unwrap_or_else(|| {
        tracing::warn!("no wireless interface reported, assuming {}", DEFAULT_WIFI_INTERFACE);
        DEFAULT_WIFI_INTERFACE.to_string()
    }))
}

pub fn wifi_connection(session: &mut Session<'_>) -> Result<()> {
    let interface = wifi_interface(session)?;
    let scan = session.run_checked(
        CommandSpec::new("iw")
            .args(["dev", interface.as_str(), "scan"])
            .read_only(),
    )?;
    let ssids = parse_ssids(&scan.stdout);
    if ssids.is_empty() {
        session.console.info("No Wi-Fi networks found.")?;
        return Ok(());
    }

    let Some(index) = session.console.select("Select a Wi-Fi network", &ssids)? else {
        return Ok(());
    };
    let ssid = &ssids[index];
    let Some(passphrase) = session
        .console
        .read_secret(&format!("Enter passphrase for {}:", ssid))?
    else {
        return Ok(());
    };

    let result = session.run(
        CommandSpec::new("iwctl")
            .arg("--passphrase")
            .secret_arg(passphrase)
            .args(["station", interface.as_str(), "connect", ssid.as_str()]),
    )?;
    if result.success() {
        session
            .console
            .success(&format!("Connected to {}.", ssid))?;
    } else {
        session.console.error(&format!(
            "Failed to connect to {}: {}",
            ssid,
            result.stderr.trim()
        ))?;
    }
    Ok(())
}

pub fn check_connection(session: &mut Session<'_>) -> Result<()> {
    let host = session.settings.connectivity_host.clone();
    let result = session.run(
        CommandSpec::new("ping")
            .args(["-c", "1", "-W", "5", host.as_str()])
            .read_only(),
    )?;
    if result.success() {
        session
            .console
            .success(&format!("Internet connection is working ({} reachable).", host))?;
    } else {
        session
            .console
            .error(&format!("No internet connection ({} unreachable).", host))?;
    }
    Ok(())
}
