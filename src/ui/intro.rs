//! Welcome screen shown before the main menu

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::theme::{Colors, Styles};

const BANNER: &[&str] = &[
    "    _             _       ____ _____ ____  _____ ____  ",
    "   / \\   _ __ ___| |__   | __ )_   _|  _ \\|  ___/ ___| ",
    "  / _ \\ | '__/ __| '_ \\  |  _ \\ | | | |_) | |_  \\___ \\ ",
    " / ___ \\| | | (__| | | | | |_) || | |  _ <|  _|  ___) |",
    "/_/   \\_\\_|  \\___|_| |_| |____/ |_| |_| \\_\\_|   |____/ ",
];

pub const FEATURES: &[&str] = &[
    "Interactive drive selection from connected devices",
    "Optional LUKS encryption of the root partition",
    "Btrfs with optional zstd compression",
    "Subvolume layout: @, @home, @log, @pkg, @.snapshots",
    "Essential, additional and custom package installation",
    "Time zone, locale, hostname and account setup",
    "Wired and Wi-Fi network setup",
    "KDE Plasma or GNOME desktop installation",
    "zRAM swap, service management and pacman repositories",
    "Chaotic-AUR and CachyOS repositories",
    "Kernel, microcode and VM guest tool installation",
];

pub const GUIDELINES: &[&str] = &[
    "Navigate with the arrow keys and press Enter to select.",
    "Follow the on-screen prompts carefully.",
    "Make sure the network is up before installing packages.",
    "Run from an Arch Linux live environment as root.",
    "Back up important data before touching drives or partitions.",
];

pub const DISCLAIMER: &str =
    "Use this installer at your own risk. Formatting a drive destroys everything on it.";

pub fn render_intro(f: &mut Frame, dry_run: bool) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(BANNER.len() as u16 + 1), // Banner
            Constraint::Min(5),                          // Body
            Constraint::Length(1),                       // Prompt
        ])
        .split(area);

    let banner: Vec<Line> = BANNER
        .iter()
        .map(|line| Line::from(Span::styled(*line, Style::default().fg(Colors::PRIMARY))))
        .collect();
    f.render_widget(
        Paragraph::new(banner).alignment(Alignment::Center),
        chunks[0],
    );

    let mut body = vec![
        Line::from("Welcome to the Arch Linux BTRFS installer."),
        Line::from(""),
        Line::from(Span::styled("Features", Styles::title())),
    ];
    body.extend(FEATURES.iter().map(|f| Line::from(format!("  - {}", f))));
    body.push(Line::from(""));
    body.push(Line::from(Span::styled("Guidelines", Styles::title())));
    body.extend(
        GUIDELINES
            .iter()
            .enumerate()
            .map(|(i, g)| Line::from(format!("  {}. {}", i + 1, g))),
    );
    body.push(Line::from(""));
    body.push(Line::from(Span::styled(
        DISCLAIMER,
        Style::default().fg(Colors::WARNING),
    )));
    if dry_run {
        body.push(Line::from(""));
        body.push(Line::from(Span::styled(
            "DRY RUN: commands that change the system are logged, not executed.",
            Styles::dry_run_badge(),
        )));
    }

    f.render_widget(
        Paragraph::new(body)
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: false }),
        chunks[1],
    );
    f.render_widget(
        Paragraph::new("Press Enter to continue to the main menu, q to quit")
            .style(Styles::hint())
            .alignment(Alignment::Center),
        chunks[2],
    );
}
