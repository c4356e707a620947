//! Child process lifecycle
//!
//! Every non-interactive command runs as the leader of its own process
//! group with a parent-death signal armed, and its PID is kept in a global
//! registry while it runs. If the installer receives SIGINT, SIGTERM or
//! SIGHUP (or the [`ProcessGuard`] is dropped) each registered group gets
//! SIGTERM, then SIGKILL after a grace period. A half-finished `sgdisk` or
//! `cryptsetup` never outlives the installer.

use nix::libc;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

static CHILD_REGISTRY: OnceLock<Arc<Mutex<ChildRegistry>>> = OnceLock::new();

/// Set while an interactive child owns the terminal
static PASSTHROUGH_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Grace period used when the guard is dropped
pub const DROP_GRACE: Duration = Duration::from_secs(5);

/// Grace period used from the signal thread
pub const SIGNAL_GRACE: Duration = Duration::from_secs(3);

/// PIDs of running child process groups
#[derive(Debug, Default)]
pub struct ChildRegistry {
    pids: HashSet<u32>,
    terminated: bool,
}

impl ChildRegistry {
    /// Shared registry used by the command runner and signal thread
    pub fn global() -> Arc<Mutex<ChildRegistry>> {
        CHILD_REGISTRY
            .get_or_init(|| Arc::new(Mutex::new(ChildRegistry::default())))
            .clone()
    }

    pub fn register(&mut self, pid: u32) {
        self.pids.insert(pid);
        tracing::debug!(pid, "registered child");
    }

    pub fn unregister(&mut self, pid: u32) {
        self.pids.remove(&pid);
        tracing::debug!(pid, "unregistered child");
    }

    pub fn count(&self) -> usize {
        self.pids.len()
    }

    /// SIGTERM every tracked group, wait up to `grace`, SIGKILL survivors.
    ///
    /// Runs at most once per registry.
    pub fn terminate_all(&mut self, grace: Duration) {
        if self.terminated {
            return;
        }
        self.terminated = true;

        if self.pids.is_empty() {
            return;
        }

        let pids: Vec<u32> = self.pids.drain().collect();
        tracing::info!(count = pids.len(), "terminating child processes");

        for &pid in &pids {
            signal_group_or_pid(pid, Signal::SIGTERM);
        }

        let start = Instant::now();
        while start.elapsed() < grace {
            if pids.iter().all(|&pid| !is_process_alive(pid)) {
                tracing::info!("all child processes exited");
                return;
            }
            std::thread::sleep(Duration::from_millis(100));
        }

        for &pid in pids.iter().filter(|&&pid| is_process_alive(pid)) {
            tracing::warn!(pid, "child ignored SIGTERM, sending SIGKILL");
            signal_group_or_pid(pid, Signal::SIGKILL);
        }
    }
}

/// Register `pid` with the global registry
pub fn track(pid: u32) {
    if let Ok(mut registry) = ChildRegistry::global().lock() {
        registry.register(pid);
    }
}

/// Remove `pid` from the global registry
pub fn untrack(pid: u32) {
    if let Ok(mut registry) = ChildRegistry::global().lock() {
        registry.unregister(pid);
    }
}

// Negative PID addresses the whole group led by `pid`.
fn signal_group_or_pid(pid: u32, sig: Signal) {
    let raw = pid as i32;
    if let Err(group_err) = signal::kill(Pid::from_raw(-raw), sig) {
        tracing::debug!(pid, %group_err, "group signal failed, signalling pid");
        if let Err(err) = signal::kill(Pid::from_raw(raw), sig) {
            tracing::warn!(pid, %err, signal = ?sig, "failed to signal child");
        }
    }
}

/// Alive means it exists and is neither a zombie nor dead.
fn is_process_alive(pid: u32) -> bool {
    if signal::kill(Pid::from_raw(pid as i32), None).is_err() {
        return false;
    }
    match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Ok(stat) => stat
            .rsplit_once(')')
            .and_then(|(_, rest)| rest.split_whitespace().next())
            .is_none_or(|state| !matches!(state, "Z" | "X")),
        Err(_) => true,
    }
}

/// Terminates every registered child when dropped
pub struct ProcessGuard {
    registry: Arc<Mutex<ChildRegistry>>,
}

impl ProcessGuard {
    pub fn new() -> Self {
        Self {
            registry: ChildRegistry::global(),
        }
    }
}

impl Default for ProcessGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if let Ok(mut registry) = self.registry.lock() {
            registry.terminate_all(DROP_GRACE);
        }
    }
}

/// Marks the terminal as handed to an interactive child until dropped.
///
/// Ctrl+C typed at that child reaches the whole foreground process group,
/// the installer included. While a passthrough is active the installer
/// leaves SIGINT to the child.
pub struct Passthrough {
    _private: (),
}

impl Passthrough {
    pub fn begin() -> Self {
        PASSTHROUGH_ACTIVE.store(true, Ordering::SeqCst);
        tracing::debug!("terminal passthrough started");
        Self { _private: () }
    }
}

impl Drop for Passthrough {
    fn drop(&mut self) {
        PASSTHROUGH_ACTIVE.store(false, Ordering::SeqCst);
        tracing::debug!("terminal passthrough ended");
    }
}

pub fn passthrough_active() -> bool {
    PASSTHROUGH_ACTIVE.load(Ordering::SeqCst)
}

/// Whether the signal thread should act on `sig`
pub fn is_fatal_signal(sig: i32, passthrough: bool) -> bool {
    !(sig == signal_hook::consts::signal::SIGINT && passthrough)
}

/// Spawn a thread that cleans up children on SIGINT, SIGTERM or SIGHUP and
/// exits with `128 + signal`. SIGINT is ignored during a [`Passthrough`].
pub fn init_signal_handlers() -> Result<(), std::io::Error> {
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;

    std::thread::spawn(move || {
        for sig in signals.forever() {
            if !is_fatal_signal(sig, passthrough_active()) {
                tracing::debug!(signal = sig, "interrupt left to the interactive child");
                continue;
            }
            tracing::info!(signal = sig, "received termination signal");
            if let Ok(mut registry) = ChildRegistry::global().lock() {
                registry.terminate_all(SIGNAL_GRACE);
            }
            let _ = crossterm::terminal::disable_raw_mode();
            let _ = crossterm::execute!(
                std::io::stdout(),
                crossterm::terminal::LeaveAlternateScreen
            );
            std::process::exit(128 + sig);
        }
    });

    Ok(())
}

/// Run a `Command` as the leader of a fresh process group.
pub trait CommandProcessGroup {
    fn in_new_process_group(&mut self) -> &mut Self;
}

impl CommandProcessGroup for std::process::Command {
    fn in_new_process_group(&mut self) -> &mut Self {
        use std::os::unix::process::CommandExt;
        // SAFETY: only async-signal-safe calls (setpgid, prctl) run between
        // fork and exec.
        unsafe {
            self.pre_exec(|| {
                nix::unistd::setpgid(Pid::from_raw(0), Pid::from_raw(0))
                    .map_err(std::io::Error::from)?;
                if libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM) == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    fn reap(child: &mut std::process::Child, timeout: Duration) -> bool {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if let Ok(Some(_)) = child.try_wait() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn test_register_unregister() {
        let mut registry = ChildRegistry::default();
        registry.register(1234);
        registry.register(5678);
        registry.register(1234);
        assert_eq!(registry.count(), 2);
        registry.unregister(1234);
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_terminate_all_kills_process_group() {
        let mut child = Command::new("sleep")
            .arg("60")
            .in_new_process_group()
            .spawn()
            .expect("spawn sleep");

        let mut registry = ChildRegistry::default();
        registry.register(child.id());
        assert!(is_process_alive(child.id()));

        registry.terminate_all(Duration::from_millis(500));
        assert!(reap(&mut child, Duration::from_secs(2)));
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_terminate_all_runs_once() {
        let mut registry = ChildRegistry::default();
        registry.register(999_999);
        registry.terminate_all(Duration::from_millis(10));
        assert!(registry.terminated);

        registry.register(999_998);
        registry.terminate_all(Duration::from_millis(10));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_reaped_process_is_not_alive() {
        let mut child = Command::new("true").spawn().expect("spawn true");
        let pid = child.id();
        child.wait().expect("wait");
        assert!(!is_process_alive(pid));
    }

    #[test]
    fn test_new_process_group_sets_pgid() {
        let mut child = Command::new("sleep")
            .arg("5")
            .in_new_process_group()
            .spawn()
            .expect("spawn sleep");
        let pid = Pid::from_raw(child.id() as i32);
        let pgid = nix::unistd::getpgid(Some(pid)).expect("getpgid");
        assert_eq!(pgid, pid);
        let _ = child.kill();
        let _ = child.wait();
    }

    #[test]
    fn test_interrupt_ignored_only_during_passthrough() {
        use signal_hook::consts::signal::{SIGINT, SIGTERM};

        assert!(is_fatal_signal(SIGINT, false));
        assert!(!is_fatal_signal(SIGINT, true));
        assert!(is_fatal_signal(SIGTERM, true));

        let passthrough = Passthrough::begin();
        assert!(passthrough_active());
        drop(passthrough);
    }
}
