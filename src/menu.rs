//! Data-driven menus
//!
//! A [`Menu`] is an ordered list of labels bound to actions. Navigation
//! state lives in [`MenuState`], which only ever holds a valid index.

use crate::session::Session;

/// Keys the installer reacts to, independent of the terminal backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Enter,
    Esc,
    Space,
    Backspace,
    Char(char),
    Resize,
    Other,
}

/// A step bound to a menu entry
pub type StepFn = fn(&mut Session<'_>) -> anyhow::Result<()>;

/// What activating an entry does
#[derive(Clone, Copy)]
pub enum MenuAction {
    Step(StepFn),
    Submenu(fn() -> Menu),
    /// Leave this menu ("Quit", "Exit", "Return")
    Back,
}

impl std::fmt::Debug for MenuAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Step(_) => f.write_str("Step"),
            Self::Submenu(_) => f.write_str("Submenu"),
            Self::Back => f.write_str("Back"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MenuItem {
    pub label: &'static str,
    pub action: MenuAction,
}

impl MenuItem {
    pub fn step(label: &'static str, step: StepFn) -> Self {
        Self {
            label,
            action: MenuAction::Step(step),
        }
    }

    pub fn submenu(label: &'static str, build: fn() -> Menu) -> Self {
        Self {
            label,
            action: MenuAction::Submenu(build),
        }
    }

    pub fn back(label: &'static str) -> Self {
        Self {
            label,
            action: MenuAction::Back,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Menu {
    pub title: &'static str,
    pub items: Vec<MenuItem>,
    /// Footer hint
    pub hint: &'static str,
}

impl Menu {
    pub fn new(title: &'static str, items: Vec<MenuItem>) -> Self {
        Self {
            title,
            items,
            hint: "Use ↑/↓ to navigate, Enter to select, q to quit",
        }
    }

    pub fn with_hint(mut self, hint: &'static str) -> Self {
        self.hint = hint;
        self
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.items.iter().map(|item| item.label).collect()
    }
}

/// What the loop should do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOutcome {
    /// Selection or screen changed; draw again
    Redraw,
    /// Key has no meaning here
    Ignored,
    /// Run the entry at this index
    Activate(usize),
    /// Leave the menu
    Exit,
}

/// Selected index into a menu of `len` entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuState {
    selected: usize,
    len: usize,
}

impl MenuState {
    pub fn new(len: usize) -> Self {
        Self { selected: 0, len }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.len {
            self.selected += 1;
        }
    }

    /// Translate a key. `nested` menus also leave on Esc.
    pub fn handle_key(&mut self, key: Key, nested: bool) -> MenuOutcome {
        match key {
            Key::Up => {
                self.move_up();
                MenuOutcome::Redraw
            }
            Key::Down => {
                self.move_down();
                MenuOutcome::Redraw
            }
            Key::Enter if self.is_empty() => MenuOutcome::Ignored,
            Key::Enter => MenuOutcome::Activate(self.selected),
            Key::Char('q') | Key::Char('Q') => MenuOutcome::Exit,
            Key::Esc if nested => MenuOutcome::Exit,
            Key::Resize => MenuOutcome::Redraw,
            _ => MenuOutcome::Ignored,
        }
    }
}
