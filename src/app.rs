//! Menu loop
//!
//! Each menu runs a small state machine:
//!
//! ```text
//! Rendering -> AwaitingInput -> (Rendering | Dispatching | Exiting)
//! Dispatching -> Rendering | Exiting
//! ```
//!
//! Step failures stop at the dispatch boundary: they are logged, shown to
//! the operator and the menu is drawn again. Only terminal failures end
//! the loop with an error.

use crate::console::MenuView;
use crate::error::{InstallerError, Result};
use crate::menu::{Menu, MenuAction, MenuOutcome, MenuState, StepFn};
use crate::session::Session;
use crate::steps;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Rendering,
    AwaitingInput,
    Dispatching(usize),
    Exiting,
}

/// Run the main menu until the operator quits
pub fn run(session: &mut Session<'_>) -> Result<()> {
    run_menu(session, &steps::main_menu(), false)
}

/// Run `menu` until it is left. `nested` menus also leave on Esc.
pub fn run_menu(session: &mut Session<'_>, menu: &Menu, nested: bool) -> Result<()> {
    let labels = menu.labels();
    let mut state = MenuState::new(menu.items.len());
    let mut phase = Phase::Rendering;
    tracing::debug!(menu = menu.title, "entering menu");

    loop {
        phase = match phase {
            Phase::Rendering => {
                session.console.draw_menu(&MenuView {
                    title: menu.title,
                    items: &labels,
                    selected: state.selected(),
                    hint: menu.hint,
                })?;
                Phase::AwaitingInput
            }
            Phase::AwaitingInput => {
                let key = session.console.read_key()?;
                match state.handle_key(key, nested) {
                    MenuOutcome::Redraw => Phase::Rendering,
                    MenuOutcome::Ignored => Phase::AwaitingInput,
                    MenuOutcome::Activate(index) => Phase::Dispatching(index),
                    MenuOutcome::Exit => Phase::Exiting,
                }
            }
            Phase::Dispatching(index) => {
                let item = &menu.items[index];
                match item.action {
                    MenuAction::Back => Phase::Exiting,
                    MenuAction::Submenu(build) => {
                        run_menu(session, &build(), true)?;
                        Phase::Rendering
                    }
                    MenuAction::Step(step) => {
                        dispatch(session, item.label, step)?;
                        Phase::Rendering
                    }
                }
            }
            Phase::Exiting => {
                tracing::debug!(menu = menu.title, "leaving menu");
                return Ok(());
            }
        };
    }
}

/// Run one step, turning its failure into a message
fn dispatch(session: &mut Session<'_>, label: &str, step: StepFn) -> Result<()> {
    tracing::info!(step = label, "running step");
    let Err(err) = step(session) else {
        tracing::info!(step = label, "step finished");
        return Ok(());
    };

    if let Some(InstallerError::Terminal(msg)) = err.downcast_ref::<InstallerError>() {
        return Err(InstallerError::terminal(msg.clone()));
    }

    let detail = format!("{:#}", err).replace('\n', " ");
    tracing::error!(step = label, error = %detail, "step failed");
    session
        .console
        .error(&format!("{} failed: {}", label, detail))
}
