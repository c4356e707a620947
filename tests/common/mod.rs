//! Test doubles shared by the integration tests
//!
//! `ScriptedConsole` answers prompts from a queue and records what the
//! installer showed; `RecordingRunner` records commands and file writes
//! and returns canned results instead of spawning anything.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use archbtrfs::command::{CommandResult, CommandRunner, CommandSpec, WriteMode};
use archbtrfs::console::{Console, MenuView, Severity};
use archbtrfs::error::{InstallerError, Result};
use archbtrfs::menu::Key;

// ============================================================================
// Scripted console
// ============================================================================

/// One scripted operator action
#[derive(Debug, Clone)]
pub enum Answer {
    Key(Key),
    Select(Option<usize>),
    Toggle(Option<Vec<bool>>),
    Confirm(bool),
    Line(Option<String>),
}

/// A drawn menu: title and highlighted row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draw {
    pub title: String,
    pub selected: usize,
}

#[derive(Debug, Default)]
pub struct ScriptedConsole {
    script: VecDeque<Answer>,
    pub draws: Vec<Draw>,
    pub messages: Vec<(Severity, String)>,
    pub prompts: Vec<String>,
    pub suspended: usize,
}

impl ScriptedConsole {
    pub fn new(script: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn keys(keys: &[Key]) -> Self {
        Self::new(keys.iter().copied().map(Answer::Key))
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    pub fn has_message(&self, severity: Severity, needle: &str) -> bool {
        self.messages
            .iter()
            .any(|(s, text)| *s == severity && text.contains(needle))
    }

    fn next(&mut self, asked: &str) -> Answer {
        self.prompts.push(asked.to_string());
        match self.script.pop_front() {
            Some(answer) => answer,
            None => panic!("script exhausted at prompt: {}", asked),
        }
    }
}

impl Console for ScriptedConsole {
    fn draw_menu(&mut self, view: &MenuView<'_>) -> Result<()> {
        self.draws.push(Draw {
            title: view.title.to_string(),
            selected: view.selected,
        });
        Ok(())
    }

    /// Quits once the script runs out, so menu loops always end
    fn read_key(&mut self) -> Result<Key> {
        match self.script.pop_front() {
            Some(Answer::Key(key)) => Ok(key),
            Some(other) => panic!("expected a key press, script has {:?}", other),
            None => Ok(Key::Char('q')),
        }
    }

    fn select(&mut self, title: &str, _options: &[String]) -> Result<Option<usize>> {
        match self.next(title) {
            Answer::Select(choice) => Ok(choice),
            other => panic!("select {:?}: script has {:?}", title, other),
        }
    }

    fn toggle_list(
        &mut self,
        title: &str,
        _options: &[String],
        _initial: &[bool],
    ) -> Result<Option<Vec<bool>>> {
        match self.next(title) {
            Answer::Toggle(choice) => Ok(choice),
            other => panic!("toggle {:?}: script has {:?}", title, other),
        }
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        match self.next(question) {
            Answer::Confirm(yes) => Ok(yes),
            other => panic!("confirm {:?}: script has {:?}", question, other),
        }
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.next(prompt) {
            Answer::Line(text) => Ok(text),
            other => panic!("line {:?}: script has {:?}", prompt, other),
        }
    }

    fn read_secret(&mut self, prompt: &str) -> Result<Option<String>> {
        self.read_line(prompt)
    }

    fn show_message(&mut self, severity: Severity, text: &str) -> Result<()> {
        self.messages.push((severity, text.to_string()));
        Ok(())
    }

    fn suspend(&mut self) -> Result<()> {
        self.suspended += 1;
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Recording runner
// ============================================================================

#[derive(Debug, Clone)]
struct Response {
    needle: String,
    exit_code: i32,
    stdout: String,
    stderr: String,
}

/// Command runner that never spawns a process.
///
/// A command gets the first response whose needle occurs in its display
/// form, otherwise an empty success.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    responses: Vec<Response>,
    pub commands: Vec<CommandSpec>,
    pub interactive: Vec<CommandSpec>,
    pub writes: Vec<(PathBuf, String, WriteMode)>,
    pub files: HashMap<PathBuf, String>,
    pub dry_run: bool,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, needle: &str, exit_code: i32, stdout: &str) -> Self {
        self.responses.push(Response {
            needle: needle.to_string(),
            exit_code,
            stdout: stdout.to_string(),
            stderr: String::new(),
        });
        self
    }

    pub fn fail(mut self, needle: &str, stderr: &str) -> Self {
        self.responses.push(Response {
            needle: needle.to_string(),
            exit_code: 1,
            stdout: String::new(),
            stderr: stderr.to_string(),
        });
        self
    }

    pub fn with_file(mut self, path: &str, contents: &str) -> Self {
        self.files.insert(PathBuf::from(path), contents.to_string());
        self
    }

    /// Display form of every command run so far
    pub fn lines(&self) -> Vec<String> {
        self.commands.iter().map(CommandSpec::display).collect()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.lines().iter().filter(|l| l.contains(needle)).count()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&mut self, spec: &CommandSpec) -> Result<CommandResult> {
        let command = spec.display();
        self.commands.push(spec.clone());
        if self.dry_run && !spec.is_read_only() {
            return Ok(CommandResult::skipped(command));
        }
        let result = match self.responses.iter().find(|r| command.contains(&r.needle)) {
            Some(r) => CommandResult {
                command,
                stdout: r.stdout.clone(),
                stderr: r.stderr.clone(),
                exit_code: Some(r.exit_code),
            },
            None => CommandResult::skipped(command),
        };
        Ok(result)
    }

    fn run_interactive(&mut self, spec: &CommandSpec) -> Result<Option<i32>> {
        self.interactive.push(spec.clone());
        Ok(Some(0))
    }

    fn write_file(&mut self, path: &Path, contents: &str, mode: WriteMode) -> Result<()> {
        self.writes
            .push((path.to_path_buf(), contents.to_string(), mode));
        if self.dry_run {
            return Ok(());
        }
        let entry = self.files.entry(path.to_path_buf()).or_default();
        match mode {
            WriteMode::Overwrite => *entry = contents.to_string(),
            WriteMode::Append => entry.push_str(contents),
        }
        Ok(())
    }

    fn read_file(&mut self, path: &Path) -> Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            InstallerError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not scripted", path.display()),
            ))
        })
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

// ============================================================================
// Session helper
// ============================================================================

/// Build a UEFI session over the doubles, run `f`, and hand the doubles
/// back for inspection.
pub fn with_session<R>(
    console: &mut ScriptedConsole,
    runner: &mut dyn CommandRunner,
    settings: &archbtrfs::Settings,
    setup: impl FnOnce(&mut archbtrfs::Session<'_>),
    f: impl FnOnce(&mut archbtrfs::Session<'_>) -> R,
) -> R {
    let mut session = archbtrfs::Session::new(
        console,
        runner,
        settings,
        archbtrfs::FirmwareMode::Uefi,
    );
    setup(&mut session);
    f(&mut session)
}

pub fn drive(path: &str) -> archbtrfs::BlockDevice {
    archbtrfs::BlockDevice {
        path: path.to_string(),
        size: "50G".to_string(),
        model: "QEMU HARDDISK".to_string(),
    }
}
