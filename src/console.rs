//! Operator interaction seam
//!
//! Steps and the menu loop only talk to the terminal through [`Console`].
//! [`crate::ui::TuiConsole`] is the ratatui implementation; tests drive the
//! same code with a scripted console.

use crate::error::Result;
use crate::menu::Key;

/// Tone of a message dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Snapshot of a menu for drawing
#[derive(Debug, Clone, Copy)]
pub struct MenuView<'a> {
    pub title: &'a str,
    pub items: &'a [&'a str],
    pub selected: usize,
    pub hint: &'a str,
}

pub trait Console {
    /// Draw a menu with the selected entry highlighted
    fn draw_menu(&mut self, view: &MenuView<'_>) -> Result<()>;

    /// Block until the next key
    fn read_key(&mut self) -> Result<Key>;

    /// Single choice. `None` when cancelled.
    fn select(&mut self, title: &str, options: &[String]) -> Result<Option<usize>>;

    /// Checklist starting from `initial`. `None` when cancelled.
    fn toggle_list(
        &mut self,
        title: &str,
        options: &[String],
        initial: &[bool],
    ) -> Result<Option<Vec<bool>>>;

    /// Yes/no question. Only `y` or `Y` answers yes.
    fn confirm(&mut self, question: &str) -> Result<bool>;

    /// Free text. `None` when cancelled.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Masked text. `None` when cancelled.
    fn read_secret(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Dismissible message
    fn show_message(&mut self, severity: Severity, text: &str) -> Result<()>;

    /// Hand the terminal to a child process
    fn suspend(&mut self) -> Result<()>;

    /// Take the terminal back after [`Console::suspend`]
    fn resume(&mut self) -> Result<()>;

    fn info(&mut self, text: &str) -> Result<()> {
        self.show_message(Severity::Info, text)
    }

    fn success(&mut self, text: &str) -> Result<()> {
        self.show_message(Severity::Success, text)
    }

    fn warning(&mut self, text: &str) -> Result<()> {
        self.show_message(Severity::Warning, text)
    }

    fn error(&mut self, text: &str) -> Result<()> {
        self.show_message(Severity::Error, text)
    }
}
