//! pacman repository configuration: stock optional sections, Chaotic-AUR
//! and CachyOS

use anyhow::Result;
use strum::IntoEnumIterator;

use crate::command::{CommandSpec, WriteMode};
use crate::hardware::{IsaLevel, parse_isa_level};
use crate::session::Session;
use crate::types::PacmanRepo;

const PACMAN_CONF: &str = "/etc/pacman.conf";
const KEYSERVER: &str = "keyserver.ubuntu.com";

const CHAOTIC_KEY: &str = "3056513887B78AEB";
const CHAOTIC_PACKAGES: &[&str] = &[
    "https://cdn-mirror.chaotic.cx/chaotic-aur/chaotic-keyring.pkg.tar.zst",
    "https://cdn-mirror.chaotic.cx/chaotic-aur/chaotic-mirrorlist.pkg.tar.zst",
];

const CACHYOS_KEY: &str = "F3B607488DB35A47";
const CACHYOS_MIRROR: &str = "https://mirror.cachyos.org/repo/x86_64/cachyos";
const CACHYOS_PACKAGES: &[&str] = &[
    "cachyos-keyring-3-1-any.pkg.tar.zst",
    "cachyos-mirrorlist-17-1-any.pkg.tar.zst",
    "cachyos-v3-mirrorlist-17-1-any.pkg.tar.zst",
    "cachyos-v4-mirrorlist-5-1-any.pkg.tar.zst",
    "pacman-6.0.2-13-x86_64.pkg.tar.zst",
];

fn section_header(line: &str) -> Option<&str> {
    line.trim().strip_prefix('[')?.strip_suffix(']')
}

fn commented_section_header(line: &str) -> Option<&str> {
    section_header(line.trim().strip_prefix('#')?)
}

/// Whether `[name]` is an active section
pub fn section_enabled(conf: &str, name: &str) -> bool {
    conf.lines().any(|line| section_header(line) == Some(name))
}

/// Uncomment `#[name]` and the commented option lines directly below it.
///
/// Returns `None` when the section is already active or not present.
pub fn enable_repo_section(conf: &str, name: &str) -> Option<String> {
    if section_enabled(conf, name) {
        return None;
    }
    let mut found = false;
    let mut in_section = false;
    let mut out = Vec::new();
    for line in conf.lines() {
        if commented_section_header(line) == Some(name) {
            found = true;
            in_section = true;
            out.push(line.trim().trim_start_matches('#').trim_start().to_string());
            continue;
        }
        if in_section {
            let body = line.trim().trim_start_matches('#').trim_start();
            let is_option = ["Include", "Server", "SigLevel"]
                .iter()
                .any(|key| body.starts_with(key));
            if line.trim().starts_with('#') && is_option {
                out.push(body.to_string());
                continue;
            }
            in_section = false;
        }
        out.push(line.to_string());
    }
    found.then(|| {
        let mut text = out.join("\n");
        if conf.ends_with('\n') {
            text.push('\n');
        }
        text
    })
}

/// Text for a repository section
pub fn repo_section(name: &str, include: &str) -> String {
    format!("[{}]\nInclude = {}\n", name, include)
}

/// Append `sections` not yet present to the end of `conf`
pub fn append_sections(conf: &str, sections: &[(&str, &str)]) -> Option<String> {
    let missing: Vec<String> = sections
        .iter()
        .filter(|(name, _)| !section_enabled(conf, name))
        .map(|(name, include)| repo_section(name, include))
        .collect();
    if missing.is_empty() {
        return None;
    }
    let mut text = conf.to_string();
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    for section in missing {
        text.push('\n');
        text.push_str(&section);
    }
    Some(text)
}

/// Insert `sections` not yet present right before `[core]`, so they take
/// priority over the Arch repositories. Falls back to appending.
pub fn insert_sections_before_core(conf: &str, sections: &[(&str, &str)]) -> Option<String> {
    let missing: Vec<String> = sections
        .iter()
        .filter(|(name, _)| !section_enabled(conf, name))
        .map(|(name, include)| repo_section(name, include))
        .collect();
    if missing.is_empty() {
        return None;
    }
    let Some(core_line) = conf.lines().position(|line| section_header(line) == Some("core"))
    else {
        return append_sections(conf, sections);
    };

    let mut out: Vec<String> = conf.lines().map(String::from).collect();
    let block: Vec<String> = missing
        .join("\n")
        .lines()
        .map(String::from)
        .chain([String::new()])
        .collect();
    out.splice(core_line..core_line, block);
    let mut text = out.join("\n");
    if conf.ends_with('\n') {
        text.push('\n');
    }
    Some(text)
}

/// CachyOS sections for the supported ISA level, highest priority first
pub fn cachyos_sections(level: IsaLevel) -> Vec<(&'static str, &'static str)> {
    let mut sections = Vec::new();
    // v4 also gets the v3 sections.
    if level == IsaLevel::V4 {
        sections.push(("cachyos-v4", "/etc/pacman.d/cachyos-v4-mirrorlist"));
    }
    if matches!(level, IsaLevel::V3 | IsaLevel::V4) {
        sections.push(("cachyos-v3", "/etc/pacman.d/cachyos-v3-mirrorlist"));
        sections.push(("cachyos-core-v3", "/etc/pacman.d/cachyos-v3-mirrorlist"));
        sections.push(("cachyos-extra-v3", "/etc/pacman.d/cachyos-v3-mirrorlist"));
    }
    sections.push(("cachyos", "/etc/pacman.d/cachyos-mirrorlist"));
    sections
}

fn refresh_databases(session: &mut Session<'_>) -> Result<()> {
    session.run_in_target_checked(CommandSpec::new("pacman").arg("-Sy"))?;
    Ok(())
}

fn import_key(session: &mut Session<'_>, key: &str) -> Result<()> {
    session.run_in_target_checked(
        CommandSpec::new("pacman-key").args(["--recv-key", key, "--keyserver", KEYSERVER]),
    )?;
    session.run_in_target_checked(CommandSpec::new("pacman-key").args(["--lsign-key", key]))?;
    Ok(())
}

pub fn configure_pacman_repos(session: &mut Session<'_>) -> Result<()> {
    let conf = session.read_target_file(PACMAN_CONF)?;
    let repos: Vec<PacmanRepo> = PacmanRepo::iter().collect();
    let names: Vec<String> = repos.iter().map(ToString::to_string).collect();
    let current: Vec<bool> = names.iter().map(|name| section_enabled(&conf, name)).collect();

    let Some(wanted) = session.console.toggle_list(
        "Repositories (Space toggles, Enter applies)",
        &names,
        &current,
    )?
    else {
        session.console.info("No changes made.")?;
        return Ok(());
    };

    let mut updated = conf.clone();
    let mut enabled = Vec::new();
    let mut missing = Vec::new();
    for (name, (&want, &was)) in names.iter().zip(wanted.iter().zip(&current)) {
        if !want || was {
            continue;
        }
        match enable_repo_section(&updated, name) {
            Some(text) => {
                updated = text;
                enabled.push(name.as_str());
            }
            None => missing.push(name.as_str()),
        }
    }

    if !missing.is_empty() {
        session.console.warning(&format!(
            "No commented section found in {} for: {}",
            PACMAN_CONF,
            missing.join(", ")
        ))?;
    }
    if enabled.is_empty() {
        session.console.info("No repositories enabled.")?;
        return Ok(());
    }

    session.write_target_file(PACMAN_CONF, &updated, WriteMode::Overwrite)?;
    refresh_databases(session)?;
    session
        .console
        .success(&format!("Enabled repositories: {}", enabled.join(", ")))?;
    Ok(())
}

pub fn setup_chaotic_aur(session: &mut Session<'_>) -> Result<()> {
    import_key(session, CHAOTIC_KEY)?;
    session.run_in_target_checked(
        CommandSpec::new("pacman")
            .args(["-U", "--noconfirm"])
            .args(CHAOTIC_PACKAGES.iter().copied()),
    )?;

    let conf = session.read_target_file(PACMAN_CONF)?;
    if let Some(updated) =
        append_sections(&conf, &[("chaotic-aur", "/etc/pacman.d/chaotic-mirrorlist")])
    {
        session.write_target_file(PACMAN_CONF, &updated, WriteMode::Overwrite)?;
    }
    refresh_databases(session)?;
    session.console.success("Chaotic-AUR repository configured.")?;
    Ok(())
}

pub fn setup_cachyos_repo(session: &mut Session<'_>) -> Result<()> {
    let loader = session.run(
        CommandSpec::new("/lib/ld-linux-x86-64.so.2")
            .arg("--help")
            .read_only(),
    )?;
    let level = parse_isa_level(&loader.stdout);
    tracing::info!(?level, "detected x86-64 ISA level");

    import_key(session, CACHYOS_KEY)?;
    session.run_in_target_checked(
        CommandSpec::new("pacman")
            .args(["-U", "--noconfirm"])
            .args(
                CACHYOS_PACKAGES
                    .iter()
                    .map(|file| format!("{}/{}", CACHYOS_MIRROR, file)),
            ),
    )?;

    let conf = session.read_target_file(PACMAN_CONF)?;
    let sections = cachyos_sections(level);
    if let Some(updated) = insert_sections_before_core(&conf, &sections) {
        session.write_target_file(PACMAN_CONF, &updated, WriteMode::Overwrite)?;
    }
    refresh_databases(session)?;

    let names: Vec<&str> = sections.iter().map(|(name, _)| *name).collect();
    session.console.success(&format!(
        "CachyOS repositories configured: {}",
        names.join(", ")
    ))?;
    Ok(())
}
