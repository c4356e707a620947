//! ratatui implementation of [`Console`]

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{Frame, Terminal, backend::CrosstermBackend};

use super::dialogs;
use super::intro::render_intro;
use super::prompt::{LineEditor, PromptOutcome, SelectState, ToggleState, confirm_answer};
use crate::console::{Console, MenuView, Severity};
use crate::error::{InstallerError, Result};
use crate::menu::Key;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Last menu drawn, kept so dialogs appear on top of it
#[derive(Debug, Clone)]
struct MenuSnapshot {
    title: String,
    items: Vec<String>,
    selected: usize,
    hint: String,
}

pub struct TuiConsole {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    dry_run: bool,
    last_menu: Option<MenuSnapshot>,
    active: bool,
}

fn terminal_error(context: &str, err: io::Error) -> InstallerError {
    InstallerError::terminal(format!("{}: {}", context, err))
}

fn map_key(event: KeyEvent) -> Key {
    match event.code {
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Esc,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Char(' ') => Key::Space,
        KeyCode::Char(c) => Key::Char(c),
        _ => Key::Other,
    }
}

impl TuiConsole {
    /// Switch the terminal to raw mode on the alternate screen
    pub fn new(dry_run: bool) -> Result<Self> {
        terminal::enable_raw_mode().map_err(|e| terminal_error("Failed to enable raw mode", e))?;
        execute!(io::stdout(), EnterAlternateScreen, cursor::Hide)
            .map_err(|e| terminal_error("Failed to enter alternate screen", e))?;
        let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
            .map_err(|e| terminal_error("Failed to create terminal", e))?;

        tracing::debug!("Terminal initialised");
        Ok(Self {
            terminal,
            dry_run,
            last_menu: None,
            active: true,
        })
    }

    /// Give the terminal back to the shell. Safe to call more than once.
    pub fn restore(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        let _ = terminal::disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, cursor::Show);
        tracing::debug!("Terminal restored");
    }

    /// Welcome screen. `false` when the operator quits instead.
    pub fn show_intro(&mut self) -> Result<bool> {
        loop {
            let dry_run = self.dry_run;
            self.draw(|f| render_intro(f, dry_run))?;
            match self.read_key()? {
                Key::Enter => return Ok(true),
                Key::Char('q') | Key::Char('Q') | Key::Esc => return Ok(false),
                _ => {}
            }
        }
    }

    fn draw(&mut self, render: impl FnOnce(&mut Frame)) -> Result<()> {
        self.terminal
            .draw(render)
            .map(|_| ())
            .map_err(|e| terminal_error("Failed to draw", e))
    }

    /// Draw a dialog over the last menu
    fn draw_over_menu(&mut self, dialog: impl FnOnce(&mut Frame)) -> Result<()> {
        let dry_run = self.dry_run;
        let menu = self.last_menu.clone();
        self.draw(|f| {
            if let Some(menu) = &menu {
                let items: Vec<&str> = menu.items.iter().map(String::as_str).collect();
                let view = MenuView {
                    title: &menu.title,
                    items: &items,
                    selected: menu.selected,
                    hint: &menu.hint,
                };
                dialogs::render_menu(f, &view, dry_run);
            }
            dialog(f);
        })
    }

    fn edit_line(&mut self, prompt: &str, masked: bool) -> Result<Option<String>> {
        let mut editor = LineEditor::new();
        loop {
            let shown = editor.display(masked);
            self.draw_over_menu(|f| dialogs::render_input(f, prompt, &shown))?;
            let key = self.read_key()?;
            match editor.handle_key(key) {
                PromptOutcome::Pending => {}
                PromptOutcome::Done(text) => return Ok(Some(text)),
                PromptOutcome::Cancelled => return Ok(None),
            }
        }
    }
}

impl Console for TuiConsole {
    fn draw_menu(&mut self, view: &MenuView<'_>) -> Result<()> {
        self.last_menu = Some(MenuSnapshot {
            title: view.title.to_string(),
            items: view.items.iter().map(|s| s.to_string()).collect(),
            selected: view.selected,
            hint: view.hint.to_string(),
        });
        let dry_run = self.dry_run;
        self.draw(|f| dialogs::render_menu(f, view, dry_run))
    }

    fn read_key(&mut self) -> Result<Key> {
        loop {
            let ready =
                event::poll(POLL_INTERVAL).map_err(|e| terminal_error("Failed to poll", e))?;
            if !ready {
                continue;
            }
            match event::read().map_err(|e| terminal_error("Failed to read event", e))? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    // Raw mode swallows Ctrl+C, so deliver it as the signal
                    if key.modifiers.contains(KeyModifiers::CONTROL)
                        && matches!(key.code, KeyCode::Char('c'))
                    {
                        tracing::info!("Ctrl+C pressed");
                        let _ = nix::sys::signal::raise(nix::sys::signal::Signal::SIGINT);
                        continue;
                    }
                    return Ok(map_key(key));
                }
                Event::Resize(_, _) => return Ok(Key::Resize),
                _ => {}
            }
        }
    }

    fn select(&mut self, title: &str, options: &[String]) -> Result<Option<usize>> {
        if options.is_empty() {
            return Ok(None);
        }
        let mut state = SelectState::new(options.len());
        loop {
            let selected = state.selected();
            self.draw_over_menu(|f| dialogs::render_select(f, title, options, selected))?;
            let key = self.read_key()?;
            match state.handle_key(key) {
                PromptOutcome::Pending => {}
                PromptOutcome::Done(index) => return Ok(Some(index)),
                PromptOutcome::Cancelled => return Ok(None),
            }
        }
    }

    fn toggle_list(
        &mut self,
        title: &str,
        options: &[String],
        initial: &[bool],
    ) -> Result<Option<Vec<bool>>> {
        let mut state = ToggleState::new(initial);
        loop {
            let selected = state.selected();
            let checked = state.checked().to_vec();
            self.draw_over_menu(|f| {
                dialogs::render_toggle(f, title, options, &checked, selected)
            })?;
            let key = self.read_key()?;
            match state.handle_key(key) {
                PromptOutcome::Pending => {}
                PromptOutcome::Done(checked) => return Ok(Some(checked)),
                PromptOutcome::Cancelled => return Ok(None),
            }
        }
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        loop {
            self.draw_over_menu(|f| dialogs::render_confirm(f, question))?;
            let key = self.read_key()?;
            if let Some(answer) = confirm_answer(key) {
                tracing::debug!(question, answer, "Confirmation");
                return Ok(answer);
            }
        }
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.edit_line(prompt, false)
    }

    fn read_secret(&mut self, prompt: &str) -> Result<Option<String>> {
        self.edit_line(prompt, true)
    }

    fn show_message(&mut self, severity: Severity, text: &str) -> Result<()> {
        match severity {
            Severity::Error => tracing::warn!("{}", text),
            _ => tracing::info!("{}", text),
        }
        loop {
            self.draw_over_menu(|f| dialogs::render_message(f, severity, text))?;
            if self.read_key()? != Key::Resize {
                return Ok(());
            }
        }
    }

    fn suspend(&mut self) -> Result<()> {
        execute!(io::stdout(), LeaveAlternateScreen, cursor::Show)
            .map_err(|e| terminal_error("Failed to leave alternate screen", e))?;
        terminal::disable_raw_mode().map_err(|e| terminal_error("Failed to disable raw mode", e))
    }

    fn resume(&mut self) -> Result<()> {
        terminal::enable_raw_mode().map_err(|e| terminal_error("Failed to enable raw mode", e))?;
        execute!(io::stdout(), EnterAlternateScreen, cursor::Hide)
            .map_err(|e| terminal_error("Failed to enter alternate screen", e))?;
        self.terminal
            .clear()
            .map_err(|e| terminal_error("Failed to clear terminal", e))
    }
}

impl Drop for TuiConsole {
    fn drop(&mut self) {
        self.restore();
    }
}
