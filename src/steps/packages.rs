//! Package installation steps

use anyhow::Result;
use strum::IntoEnumIterator;

use crate::command::CommandSpec;
use crate::session::Session;
use crate::types::{DesktopEnvironment, Kernel, XORG_PACKAGES};
use crate::validation::parse_package_list;

pub fn install_essential_packages(session: &mut Session<'_>) -> Result<()> {
    let root = session.target_root();
    let packages = session.settings.essential_packages.clone();
    session.run_checked(
        CommandSpec::new("pacstrap")
            .args(["-K", root.as_str()])
            .args(packages.iter().cloned()),
    )?;
    session.console.success(&format!(
        "Installed essential packages into {}: {}",
        root,
        packages.join(" ")
    ))?;
    Ok(())
}

pub fn select_kernel(session: &mut Session<'_>) -> Result<()> {
    let kernels: Vec<Kernel> = Kernel::iter().collect();
    let labels: Vec<String> = kernels.iter().map(ToString::to_string).collect();
    let Some(index) = session.console.select("Select a kernel", &labels)? else {
        return Ok(());
    };
    let kernel = kernels[index];
    session.install_packages(&kernel.packages())?;
    session
        .console
        .success(&format!("Installed the {} kernel.", kernel))?;
    Ok(())
}

pub fn install_additional_packages(session: &mut Session<'_>) -> Result<()> {
    let packages = session.settings.additional_packages.clone();
    let initial = vec![true; packages.len()];
    let Some(chosen) = session.console.toggle_list(
        "Additional packages (Space toggles, Enter installs)",
        &packages,
        &initial,
    )?
    else {
        session.console.info("No packages installed.")?;
        return Ok(());
    };

    let selected: Vec<&String> = packages
        .iter()
        .zip(&chosen)
        .filter_map(|(package, &on)| on.then_some(package))
        .collect();
    if selected.is_empty() {
        session.console.info("No packages selected.")?;
        return Ok(());
    }

    session.install_packages(&selected)?;
    session
        .console
        .success(&format!("Installed {} packages.", selected.len()))?;
    Ok(())
}

pub fn install_custom_packages(session: &mut Session<'_>) -> Result<()> {
    let Some(input) = session
        .console
        .read_line("Enter package names separated by spaces:")?
    else {
        return Ok(());
    };

    let packages = match parse_package_list(&input) {
        Ok(packages) => packages,
        Err(invalid) => {
            session
                .console
                .error(&format!("Invalid package names: {}", invalid.join(" ")))?;
            return Ok(());
        }
    };
    if packages.is_empty() {
        session.console.info("No packages entered.")?;
        return Ok(());
    }

    session.install_packages(&packages)?;
    session
        .console
        .success(&format!("Installed: {}", packages.join(" ")))?;
    Ok(())
}

pub fn install_desktop_environment(session: &mut Session<'_>) -> Result<()> {
    let desktops: Vec<DesktopEnvironment> = DesktopEnvironment::iter().collect();
    let labels: Vec<String> = desktops.iter().map(ToString::to_string).collect();
    let Some(index) = session
        .console
        .select("Select a desktop environment", &labels)?
    else {
        return Ok(());
    };
    let desktop = desktops[index];

    session.install_packages(desktop.packages())?;
    session.enable_services(&[desktop.display_manager()])?;

    let xorg = session.console.confirm("Install Xorg as well? (y/n)")?;
    if xorg {
        session.install_packages(XORG_PACKAGES)?;
    }

    session.console.success(&format!(
        "{} installed{}; {} enabled.",
        desktop,
        if xorg { " with Xorg" } else { "" },
        desktop.display_manager()
    ))?;
    Ok(())
}
