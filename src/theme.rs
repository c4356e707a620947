//! Colors and styles for the TUI
//!
//! Widgets take their colors from here rather than hardcoding them.

use ratatui::style::{Color, Modifier, Style};

use crate::console::Severity;

pub struct Colors;

impl Colors {
    /// Default foreground text color
    pub const FG_PRIMARY: Color = Color::White;

    /// Secondary/muted text color
    pub const FG_SECONDARY: Color = Color::Gray;

    /// Dialog background
    pub const BG_DIALOG: Color = Color::Rgb(20, 20, 30);

    /// Borders, titles, the banner
    pub const PRIMARY: Color = Color::Cyan;

    /// Hints and emphasis
    pub const SECONDARY: Color = Color::Yellow;

    pub const SUCCESS: Color = Color::Green;
    pub const WARNING: Color = Color::Yellow;
    pub const ERROR: Color = Color::Red;
    pub const INFO: Color = Color::Cyan;

    /// Highlighted menu entry: black on white
    pub const SELECTED_BG: Color = Color::White;
    pub const SELECTED_FG: Color = Color::Black;

    /// Checked entry in a toggle list
    pub const CHECKED: Color = Color::LightGreen;
}

pub struct Styles;

impl Styles {
    pub fn title() -> Style {
        Style::default()
            .fg(Colors::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn hint() -> Style {
        Style::default().fg(Colors::SECONDARY)
    }

    pub fn item() -> Style {
        Style::default().fg(Colors::FG_PRIMARY)
    }

    pub fn selected() -> Style {
        Style::default()
            .bg(Colors::SELECTED_BG)
            .fg(Colors::SELECTED_FG)
            .add_modifier(Modifier::BOLD)
    }

    pub fn dialog() -> Style {
        Style::default().bg(Colors::BG_DIALOG).fg(Colors::FG_PRIMARY)
    }

    pub fn dry_run_badge() -> Style {
        Style::default()
            .fg(Colors::SELECTED_FG)
            .bg(Colors::WARNING)
            .add_modifier(Modifier::BOLD)
    }
}

/// Border color and title for a message dialog
pub fn severity_style(severity: Severity) -> (Color, &'static str) {
    match severity {
        Severity::Info => (Colors::INFO, " Info "),
        Severity::Success => (Colors::SUCCESS, " Done "),
        Severity::Warning => (Colors::WARNING, " Warning "),
        Severity::Error => (Colors::ERROR, " Error "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_is_black_on_white() {
        let style = Styles::selected();
        assert_eq!(style.fg, Some(Color::Black));
        assert_eq!(style.bg, Some(Color::White));
    }

    #[test]
    fn test_severity_colors_differ() {
        let (error, _) = severity_style(Severity::Error);
        let (success, _) = severity_style(Severity::Success);
        assert_ne!(error, success);
    }
}
