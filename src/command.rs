//! External command execution
//!
//! Steps describe commands as a [`CommandSpec`] (program plus argument
//! vector, never a shell string) and hand them to a [`CommandRunner`].
//! [`SystemRunner`] is the real implementation: it spawns the program in
//! its own process group, feeds secrets on stdin, captures both output
//! streams and appends everything to the command log.
//!
//! A non-zero exit is not an error at this layer. The caller decides,
//! usually through [`CommandResult::ensure_success`].

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use crate::error::{InstallerError, Result};
use crate::process_guard::{self, CommandProcessGroup};

const REDACTED: &str = "********";

/// A program invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    secret_args: Vec<usize>,
    stdin: Option<String>,
    read_only: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Argument that must never reach a log
    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.secret_args.push(self.args.len());
        self.args.push(arg.into());
        self
    }

    /// Data written to the child's stdin, then closed. Never logged.
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Query with no side effects; still executed in dry-run mode
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Prefix the invocation with another program, e.g. `arch-chroot /mnt`
    pub fn wrapped_in(self, program: &str, leading: &[&str]) -> Self {
        let offset = leading.len() + 1;
        let mut args: Vec<String> = leading.iter().map(|s| s.to_string()).collect();
        args.push(self.program);
        args.extend(self.args);
        Self {
            program: program.to_string(),
            args,
            secret_args: self.secret_args.iter().map(|i| i + offset).collect(),
            stdin: self.stdin,
            read_only: self.read_only,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_stdin(&self) -> Option<&str> {
        self.stdin.as_deref()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Command line for logs and messages, secrets replaced
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for (i, arg) in self.args.iter().enumerate() {
            line.push(' ');
            if self.secret_args.contains(&i) {
                line.push_str(REDACTED);
            } else if arg.is_empty() || arg.contains(char::is_whitespace) {
                line.push_str(&format!("{:?}", arg));
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}

/// Captured outcome of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Redacted command line
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    /// `None` when the child was killed by a signal
    pub exit_code: Option<i32>,
}

impl CommandResult {
    /// Successful empty result, used for skipped commands
    pub fn skipped(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            stdout: String::new(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn status_text(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit code {}", code),
            None => "killed by signal".to_string(),
        }
    }

    /// Convert a failed run into [`InstallerError::CommandFailed`]
    pub fn ensure_success(self) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }
        let status = self.status_text();
        let stderr = self.stderr.trim();
        let stderr = stderr.lines().last().unwrap_or("no error output").to_string();
        Err(InstallerError::CommandFailed {
            command: self.command,
            status,
            stderr,
        })
    }
}

/// How [`CommandRunner::write_file`] treats existing content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Overwrite,
    Append,
}

/// Everything steps do to the system goes through this trait
pub trait CommandRunner {
    /// Run to completion, capturing output
    fn run(&mut self, spec: &CommandSpec) -> Result<CommandResult>;

    /// Run attached to the terminal. The console must be suspended first.
    fn run_interactive(&mut self, spec: &CommandSpec) -> Result<Option<i32>>;

    fn write_file(&mut self, path: &Path, contents: &str, mode: WriteMode) -> Result<()>;

    fn read_file(&mut self, path: &Path) -> Result<String>;

    /// Run and require exit code 0
    fn run_checked(&mut self, spec: &CommandSpec) -> Result<CommandResult> {
        self.run(spec)?.ensure_success()
    }

    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Spawns real processes and records them in the command log
#[derive(Debug, Clone)]
pub struct SystemRunner {
    log_path: PathBuf,
    dry_run: bool,
}

impl SystemRunner {
    pub fn new(log_path: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            log_path: log_path.into(),
            dry_run,
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    fn append_log(&self, record: &str) {
        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .and_then(|mut file| file.write_all(record.as_bytes()));
        if let Err(err) = written {
            tracing::warn!(path = %self.log_path.display(), %err, "could not append to command log");
        }
    }

    fn log_result(&self, result: &CommandResult) {
        self.append_log(&format_record(result));
    }
}

/// One command log entry
pub fn format_record(result: &CommandResult) -> String {
    let mut record = format!("$ {}\n[{}]\n", result.command, result.status_text());
    if !result.stdout.is_empty() {
        record.push_str(&result.stdout);
        if !result.stdout.ends_with('\n') {
            record.push('\n');
        }
    }
    if !result.stderr.is_empty() {
        record.push_str("--- stderr ---\n");
        record.push_str(&result.stderr);
        if !result.stderr.ends_with('\n') {
            record.push('\n');
        }
    }
    record.push('\n');
    record
}

fn exit_code(status: ExitStatus) -> Option<i32> {
    if let Some(sig) = status.signal() {
        tracing::debug!(signal = sig, "child terminated by signal");
    }
    status.code()
}

impl CommandRunner for SystemRunner {
    fn run(&mut self, spec: &CommandSpec) -> Result<CommandResult> {
        let line = spec.display();

        if self.dry_run && !spec.is_read_only() {
            tracing::info!(command = %line, "[DRY RUN] skipped");
            self.append_log(&format!("[DRY RUN] $ {}\n\n", line));
            return Ok(CommandResult::skipped(line));
        }

        tracing::info!(command = %line, "running");

        let mut child = Command::new(spec.program())
            .args(spec.get_args())
            .stdin(if spec.get_stdin().is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .in_new_process_group()
            .spawn()
            .map_err(|e| InstallerError::spawn(spec.program(), e))?;

        let pid = child.id();
        process_guard::track(pid);

        if let (Some(input), Some(mut pipe)) = (spec.get_stdin(), child.stdin.take()) {
            if let Err(err) = pipe.write_all(input.as_bytes()) {
                tracing::warn!(command = %line, %err, "child closed stdin early");
            }
        }

        let output = child.wait_with_output();
        process_guard::untrack(pid);
        let output = output?;

        let result = CommandResult {
            command: line,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: exit_code(output.status),
        };

        self.log_result(&result);
        if result.success() {
            tracing::debug!(command = %result.command, "command succeeded");
        } else {
            tracing::warn!(
                command = %result.command,
                status = %result.status_text(),
                stderr = %result.stderr.trim(),
                "command failed"
            );
        }
        Ok(result)
    }

    fn run_interactive(&mut self, spec: &CommandSpec) -> Result<Option<i32>> {
        let line = spec.display();
        if self.dry_run && !spec.is_read_only() {
            tracing::info!(command = %line, "[DRY RUN] skipped interactive command");
            self.append_log(&format!("[DRY RUN] $ {}\n\n", line));
            return Ok(Some(0));
        }

        tracing::info!(command = %line, "running interactively");
        self.append_log(&format!("$ {} (interactive)\n", line));
        let status = {
            let _passthrough = process_guard::Passthrough::begin();
            Command::new(spec.program())
                .args(spec.get_args())
                .status()
                .map_err(|e| InstallerError::spawn(spec.program(), e))?
        };
        let code = exit_code(status);
        self.append_log(&format!(
            "[{}]\n\n",
            code.map_or("killed by signal".to_string(), |c| format!("exit code {}", c))
        ));
        Ok(code)
    }

    fn write_file(&mut self, path: &Path, contents: &str, mode: WriteMode) -> Result<()> {
        let verb = match mode {
            WriteMode::Overwrite => "write",
            WriteMode::Append => "append",
        };
        if self.dry_run {
            tracing::info!(path = %path.display(), "[DRY RUN] skipped {}", verb);
            self.append_log(&format!("[DRY RUN] {} {}\n{}\n", verb, path.display(), contents));
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(mode == WriteMode::Append)
            .truncate(mode == WriteMode::Overwrite)
            .open(path)?;
        file.write_all(contents.as_bytes())?;

        tracing::info!(path = %path.display(), bytes = contents.len(), "{} file", verb);
        self.append_log(&format!("# {} {}\n{}\n", verb, path.display(), contents));
        Ok(())
    }

    fn read_file(&mut self, path: &Path) -> Result<String> {
        Ok(fs::read_to_string(path)?)
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn runner(dir: &TempDir, dry_run: bool) -> SystemRunner {
        SystemRunner::new(dir.path().join("install_log.txt"), dry_run)
    }

    fn log_contents(runner: &SystemRunner) -> String {
        fs::read_to_string(runner.log_path()).unwrap_or_default()
    }

    #[test]
    fn test_display_quotes_and_redacts() {
        let spec = CommandSpec::new("iwctl")
            .arg("--passphrase")
            .secret_arg("hunter2!")
            .args(["station", "wlan0", "connect", "My Network"]);
        assert_eq!(
            spec.display(),
            r#"iwctl --passphrase ******** station wlan0 connect "My Network""#
        );
    }

    #[test]
    fn test_wrapped_in_keeps_redaction() {
        let spec = CommandSpec::new("tool")
            .secret_arg("s3cret")
            .wrapped_in("arch-chroot", &["/mnt"]);
        assert_eq!(spec.program(), "arch-chroot");
        assert_eq!(spec.get_args(), ["/mnt", "tool", "s3cret"]);
        assert_eq!(spec.display(), "arch-chroot /mnt tool ********");
    }

    #[test]
    fn test_captures_stdout_and_logs() {
        let dir = TempDir::new().expect("tempdir");
        let mut runner = runner(&dir, false);
        let result = runner
            .run(&CommandSpec::new("echo").arg("hello"))
            .expect("run echo");
        assert!(result.success());
        assert_eq!(result.stdout, "hello\n");

        let log = log_contents(&runner);
        assert!(log.contains("$ echo hello"));
        assert!(log.contains("[exit code 0]"));
        assert!(log.contains("hello"));
    }

    #[test]
    fn test_log_is_appended_across_commands() {
        let dir = TempDir::new().expect("tempdir");
        let mut runner = runner(&dir, false);
        runner.run(&CommandSpec::new("echo").arg("first")).expect("first");
        runner.run(&CommandSpec::new("echo").arg("second")).expect("second");
        let log = log_contents(&runner);
        let first = log.find("$ echo first").expect("first entry");
        let second = log.find("$ echo second").expect("second entry");
        assert!(first < second);
    }

    #[test]
    fn test_nonzero_exit_is_returned_not_raised() {
        let dir = TempDir::new().expect("tempdir");
        let mut runner = runner(&dir, false);
        let result = runner.run(&CommandSpec::new("false")).expect("run false");
        assert!(!result.success());
        assert_eq!(result.exit_code, Some(1));

        let err = result.ensure_success().expect_err("should fail");
        assert!(matches!(err, InstallerError::CommandFailed { .. }));
        assert!(log_contents(&runner).contains("[exit code 1]"));
    }

    #[test]
    fn test_stdin_is_fed_and_not_logged() {
        let dir = TempDir::new().expect("tempdir");
        let mut runner = runner(&dir, false);
        let result = runner
            .run(&CommandSpec::new("wc").arg("-c").stdin("root:Secret1!"))
            .expect("run wc");
        assert_eq!(result.stdout.trim(), "13");
        assert!(!log_contents(&runner).contains("Secret1!"));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let dir = TempDir::new().expect("tempdir");
        let mut runner = runner(&dir, false);
        let err = runner
            .run(&CommandSpec::new("definitely-not-a-real-program-xyz"))
            .expect_err("spawn should fail");
        assert!(matches!(err, InstallerError::Spawn { .. }));
    }

    #[test]
    fn test_interactive_run_is_logged() {
        let dir = TempDir::new().expect("tempdir");
        let mut runner = runner(&dir, false);
        let code = runner
            .run_interactive(&CommandSpec::new("true"))
            .expect("run true");
        assert_eq!(code, Some(0));
        assert!(log_contents(&runner).contains("$ true (interactive)"));
    }

    #[test]
    fn test_dry_run_skips_mutations_but_runs_queries() {
        let dir = TempDir::new().expect("tempdir");
        let mut runner = runner(&dir, true);
        let marker = dir.path().join("marker");

        let result = runner
            .run(&CommandSpec::new("touch").arg(marker.to_string_lossy()))
            .expect("dry run");
        assert!(result.success());
        assert!(!marker.exists());

        let query = runner
            .run(&CommandSpec::new("echo").arg("listed").read_only())
            .expect("query");
        assert_eq!(query.stdout, "listed\n");

        runner
            .write_file(&marker, "data", WriteMode::Overwrite)
            .expect("dry write");
        assert!(!marker.exists());
        assert!(log_contents(&runner).contains("[DRY RUN] $ touch"));
    }

    #[test]
    fn test_write_file_modes() {
        let dir = TempDir::new().expect("tempdir");
        let mut runner = runner(&dir, false);
        let path = dir.path().join("etc").join("hostname");

        runner.write_file(&path, "first\n", WriteMode::Overwrite).expect("write");
        runner.write_file(&path, "second\n", WriteMode::Append).expect("append");
        assert_eq!(runner.read_file(&path).expect("read"), "first\nsecond\n");

        runner.write_file(&path, "third\n", WriteMode::Overwrite).expect("overwrite");
        assert_eq!(runner.read_file(&path).expect("read"), "third\n");
    }

    #[test]
    fn test_ensure_success_reports_last_stderr_line() {
        let result = CommandResult {
            command: "mount /dev/sda2 /mnt".into(),
            stdout: String::new(),
            stderr: "warning\nmount: /mnt: special device does not exist.\n".into(),
            exit_code: Some(32),
        };
        let err = result.ensure_success().expect_err("fails");
        assert_eq!(
            err.to_string(),
            "mount /dev/sda2 /mnt failed (exit code 32): mount: /mnt: special device does not exist."
        );
    }
}
