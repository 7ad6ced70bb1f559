//! Child process tracking for external tools.
//!
//! Tools are spawned in their own process group and registered here while
//! they run. If buildgate receives SIGINT, SIGTERM or SIGHUP, every
//! registered group gets SIGTERM, then SIGKILL after a grace period.

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

static CHILD_REGISTRY: OnceLock<Mutex<ChildRegistry>> = OnceLock::new();

/// PIDs (and process group ids) of running tools
#[derive(Debug, Default)]
pub struct ChildRegistry {
    pids: HashSet<u32>,
}

impl ChildRegistry {
    pub fn global() -> &'static Mutex<ChildRegistry> {
        CHILD_REGISTRY.get_or_init(|| Mutex::new(ChildRegistry::default()))
    }

    pub fn register(&mut self, pid: u32) {
        self.pids.insert(pid);
        tracing::debug!("Registered tool process PID {}", pid);
    }

    pub fn unregister(&mut self, pid: u32) {
        self.pids.remove(&pid);
        tracing::debug!("Unregistered tool process PID {}", pid);
    }

    pub fn count(&self) -> usize {
        self.pids.len()
    }

    /// SIGTERM every tracked group, wait up to `grace_period`, SIGKILL the rest
    pub fn terminate_all(&mut self, grace_period: Duration) {
        if self.pids.is_empty() {
            return;
        }

        tracing::info!("Terminating {} tool process(es)", self.pids.len());
        for &pid in &self.pids {
            signal_group_or_process(pid, Signal::SIGTERM);
        }

        let deadline = Instant::now() + grace_period;
        while Instant::now() < deadline {
            if self.pids.iter().all(|&pid| !is_process_alive(pid)) {
                self.pids.clear();
                return;
            }
            std::thread::sleep(Duration::from_millis(50));
        }

        for &pid in &self.pids {
            if is_process_alive(pid) {
                tracing::warn!("Process group {} ignored SIGTERM, sending SIGKILL", pid);
                signal_group_or_process(pid, Signal::SIGKILL);
            }
        }
        self.pids.clear();
    }
}

/// Signal the group led by `pid`; fall back to the process alone.
fn signal_group_or_process(pid: u32, sig: Signal) {
    let raw = pid as i32;
    if let Err(e) = signal::kill(Pid::from_raw(-raw), sig) {
        tracing::debug!("Group signal {:?} to {} failed: {}", sig, pid, e);
        if let Err(e) = signal::kill(Pid::from_raw(raw), sig) {
            tracing::warn!("Failed to send {:?} to PID {}: {}", sig, pid, e);
        }
    }
}

/// Exists and is not a zombie
fn is_process_alive(pid: u32) -> bool {
    if signal::kill(Pid::from_raw(pid as i32), None).is_err() {
        return false;
    }
    match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        // state is the field after the parenthesised command name
        Ok(stat) => stat
            .rsplit_once(')')
            .and_then(|(_, rest)| rest.split_whitespace().next())
            .map(|state| !matches!(state, "Z" | "X"))
            .unwrap_or(true),
        Err(_) => true,
    }
}

/// Install handlers for SIGINT, SIGTERM and SIGHUP that stop running tools
/// and exit with `128 + signal`.
pub fn init_signal_handlers() -> Result<(), std::io::Error> {
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;

    std::thread::spawn(move || {
        if let Some(sig) = signals.forever().next() {
            tracing::info!("Received signal {}, stopping tools", sig);
            if let Ok(mut registry) = ChildRegistry::global().lock() {
                registry.terminate_all(Duration::from_secs(3));
            }
            std::process::exit(128 + sig);
        }
    });

    Ok(())
}

/// Extension trait for `std::process::Command`
pub trait CommandProcessGroup {
    /// Run the command as leader of a new process group
    fn in_new_process_group(&mut self) -> &mut Self;
}

impl CommandProcessGroup for std::process::Command {
    fn in_new_process_group(&mut self) -> &mut Self {
        use std::os::unix::process::CommandExt;
        self.process_group(0)
    }
}
