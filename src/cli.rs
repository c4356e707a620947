use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// archbtrfs - Arch Linux installer for btrfs systems
#[derive(Parser, Debug)]
#[command(name = "archbtrfs")]
#[command(about = "Menu-driven Arch Linux installer with a btrfs subvolume layout")]
#[command(version)]
pub struct Cli {
    /// Dry-run mode: show what would be executed without making changes.
    ///
    /// Commands that only read the system (lsblk, iw scan, ping) still run
    /// so menus have real data. Everything else is written to the command
    /// log and skipped.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// JSON settings file overriding the built-in defaults
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Application log
    #[arg(long, default_value = "archbtrfs.log")]
    pub log_file: PathBuf,

    /// Command log, overrides the settings file
    #[arg(long)]
    pub command_log: Option<PathBuf>,

    /// Go straight to the main menu
    #[arg(long)]
    pub skip_intro: bool,

    /// Log filter used when RUST_LOG is not set (e.g. info, debug)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a settings file and exit
    ValidateConfig {
        /// Path to the settings file
        path: PathBuf,
    },
    /// Print the effective settings as JSON and exit
    PrintConfig,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_no_args() {
        let cli = Cli::try_parse_from(["archbtrfs"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.dry_run);
        assert!(!cli.skip_intro);
        assert_eq!(cli.log_file, PathBuf::from("archbtrfs.log"));
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "archbtrfs",
            "--dry-run",
            "--config",
            "/etc/archbtrfs.json",
            "--command-log",
            "/tmp/commands.txt",
            "--skip-intro",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert!(cli.dry_run);
        assert!(cli.skip_intro);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/archbtrfs.json")));
        assert_eq!(cli.command_log, Some(PathBuf::from("/tmp/commands.txt")));
        assert_eq!(cli.log_level, "debug");
    }

    #[test]
    fn test_cli_validate_config() {
        let cli = Cli::try_parse_from(["archbtrfs", "validate-config", "settings.json"]).unwrap();
        match cli.command {
            Some(Commands::ValidateConfig { path }) => {
                assert_eq!(path, PathBuf::from("settings.json"))
            }
            other => panic!("Expected ValidateConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_print_config_with_global_flag() {
        let cli = Cli::try_parse_from(["archbtrfs", "print-config", "--config", "a.json"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::PrintConfig)));
        assert_eq!(cli.config, Some(PathBuf::from("a.json")));
    }

    #[test]
    fn test_cli_rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["archbtrfs", "install"]).is_err());
    }
}
