//! Key handling for the interactive prompts
//!
//! Drawing lives in [`super::dialogs`]; these types only decide what a key
//! does, so the same logic is tested without a terminal.

use crate::menu::{Key, MenuOutcome, MenuState};

/// Result of feeding one key to a prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome<T> {
    Pending,
    Done(T),
    Cancelled,
}

/// Single-choice list. Reuses menu navigation.
#[derive(Debug, Clone)]
pub struct SelectState {
    cursor: MenuState,
}

impl SelectState {
    pub fn new(len: usize) -> Self {
        Self {
            cursor: MenuState::new(len),
        }
    }

    pub fn selected(&self) -> usize {
        self.cursor.selected()
    }

    pub fn handle_key(&mut self, key: Key) -> PromptOutcome<usize> {
        match self.cursor.handle_key(key, true) {
            MenuOutcome::Activate(index) => PromptOutcome::Done(index),
            MenuOutcome::Exit => PromptOutcome::Cancelled,
            MenuOutcome::Redraw | MenuOutcome::Ignored => PromptOutcome::Pending,
        }
    }
}

/// Checklist: Space toggles, Enter or `q` confirms, Esc cancels
#[derive(Debug, Clone)]
pub struct ToggleState {
    cursor: MenuState,
    checked: Vec<bool>,
}

impl ToggleState {
    pub fn new(initial: &[bool]) -> Self {
        Self {
            cursor: MenuState::new(initial.len()),
            checked: initial.to_vec(),
        }
    }

    pub fn selected(&self) -> usize {
        self.cursor.selected()
    }

    pub fn checked(&self) -> &[bool] {
        &self.checked
    }

    pub fn handle_key(&mut self, key: Key) -> PromptOutcome<Vec<bool>> {
        match key {
            Key::Up => self.cursor.move_up(),
            Key::Down => self.cursor.move_down(),
            Key::Space => {
                if let Some(flag) = self.checked.get_mut(self.cursor.selected()) {
                    *flag = !*flag;
                }
            }
            Key::Enter | Key::Char('q') => return PromptOutcome::Done(self.checked.clone()),
            Key::Esc => return PromptOutcome::Cancelled,
            _ => {}
        }
        PromptOutcome::Pending
    }
}

/// Single-line text entry
#[derive(Debug, Clone, Default)]
pub struct LineEditor {
    buffer: String,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// What to draw: the text itself, or one `*` per character
    pub fn display(&self, masked: bool) -> String {
        if masked {
            "*".repeat(self.buffer.chars().count())
        } else {
            self.buffer.clone()
        }
    }

    pub fn handle_key(&mut self, key: Key) -> PromptOutcome<String> {
        match key {
            Key::Char(c) => self.buffer.push(c),
            Key::Space => self.buffer.push(' '),
            Key::Backspace => {
                self.buffer.pop();
            }
            Key::Enter => return PromptOutcome::Done(std::mem::take(&mut self.buffer)),
            Key::Esc => return PromptOutcome::Cancelled,
            _ => {}
        }
        PromptOutcome::Pending
    }
}

/// Only `y`/`Y` is yes; every other key (except a resize) is no.
pub fn confirm_answer(key: Key) -> Option<bool> {
    match key {
        Key::Char('y') | Key::Char('Y') => Some(true),
        Key::Resize => None,
        _ => Some(false),
    }
}
