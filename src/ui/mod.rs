//! Terminal user interface
//!
//! - `layout` - geometry of menus and dialogs
//! - `prompt` - key handling for select, checklist, text and yes/no prompts
//! - `dialogs` - frame rendering
//! - `intro` - welcome screen
//! - `tui` - the ratatui [`crate::console::Console`]

pub mod dialogs;
pub mod intro;
pub mod layout;
pub mod prompt;
mod tui;

pub use tui::TuiConsole;
