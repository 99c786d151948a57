//! Managed child processes: spawn, track, terminate.
//!
//! Each managed service runs as an independent OS-level process; the
//! orchestrator shares nothing with it but the pid and, for the backend, an
//! HTTP health endpoint. The table is mutated only by the coordinating
//! task. Termination tolerates pids that already exited, so teardown is
//! idempotent and safe to run at any point in the sequence.

use std::fmt;
use std::path::Path;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Grace period for children to exit after SIGTERM before they are killed.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Lifecycle state of a managed process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Starting,
    Running,
    HealthUnknown,
    Healthy,
    Unhealthy,
    Stopped,
    Failed,
}

impl ProcessState {
    /// Terminal states receive no termination signal during cleanup.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessState::Stopped | ProcessState::Failed)
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessState::Starting => "starting",
            ProcessState::Running => "running",
            ProcessState::HealthUnknown => "health unknown",
            ProcessState::Healthy => "healthy",
            ProcessState::Unhealthy => "unhealthy",
            ProcessState::Stopped => "stopped",
            ProcessState::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// A long-running child whose lifecycle the orchestrator owns.
///
/// The record exists iff the child was actually spawned and has not yet
/// been confirmed stopped; it is discarded when the orchestrator exits.
#[derive(Debug)]
pub struct ManagedProcess {
    pub name: String,
    pub pid: u32,
    pub command: String,
    pub state: ProcessState,
    child: Option<Child>,
}

/// Spawn a managed process in the given working directory and record it as
/// `Starting`. The child handle is retained so the process can be reaped.
pub fn spawn(name: &str, program: &Path, args: &[String], cwd: &Path) -> Result<ManagedProcess> {
    let mut cmd = Command::new(program);
    cmd.args(args).current_dir(cwd);

    let child = cmd.spawn().map_err(|e| Error::Spawn {
        name: name.to_string(),
        reason: e.to_string(),
    })?;

    let pid = child.id().ok_or_else(|| Error::Spawn {
        name: name.to_string(),
        reason: "exited before a pid could be read".to_string(),
    })?;

    let command = format!("{} {}", program.display(), args.join(" "));
    debug!("spawned {} (pid {}): {}", name, pid, command);

    Ok(ManagedProcess {
        name: name.to_string(),
        pid,
        command,
        state: ProcessState::Starting,
        child: Some(child),
    })
}

/// Check whether a pid refers to a live process (signal 0 probe).
pub fn process_alive(pid: u32) -> bool {
    unsafe { libc::kill(pid as i32, 0) == 0 }
}

/// Send SIGTERM to a pid. A missing or already-exited process is tolerated
/// silently so teardown stays idempotent.
pub fn terminate(pid: u32) {
    let rc = unsafe { libc::kill(pid as i32, libc::SIGTERM) };
    if rc != 0 {
        debug!("pid {} already gone", pid);
    }
}

/// Process-wide table of managed processes, owned by the coordinating task.
#[derive(Debug, Default)]
pub struct ProcessTable {
    entries: Vec<ManagedProcess>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a spawned process. Must be called immediately after spawn,
    /// before any health check, so cleanup sees every live child.
    pub fn register(&mut self, process: ManagedProcess) {
        self.entries.push(process);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, name: &str) -> Option<&ManagedProcess> {
        self.entries.iter().find(|p| p.name == name)
    }

    pub fn set_state(&mut self, name: &str, state: ProcessState) {
        if let Some(process) = self.entries.iter_mut().find(|p| p.name == name) {
            debug!("{}: {} -> {}", name, process.state, state);
            process.state = state;
        }
    }

    /// Pids of tracked entries whose process is still alive.
    pub fn live_pids(&self) -> Vec<u32> {
        self.entries
            .iter()
            .filter(|p| process_alive(p.pid))
            .map(|p| p.pid)
            .collect()
    }

    /// Poll tracked children without blocking. Returns the name of the
    /// first process observed to have exited on its own, after marking it
    /// `Stopped`.
    pub fn poll_exited(&mut self) -> Option<String> {
        for process in self.entries.iter_mut() {
            if process.state.is_terminal() {
                continue;
            }
            let exited = match process.child.as_mut() {
                Some(child) => matches!(child.try_wait(), Ok(Some(_))),
                None => !process_alive(process.pid),
            };
            if exited {
                process.state = ProcessState::Stopped;
                return Some(process.name.clone());
            }
        }
        None
    }

    /// Terminate every tracked process and drain the table.
    ///
    /// Each entry in a non-terminal state is sent SIGTERM; children are
    /// then reaped, with a kill fallback after the grace period. Missing
    /// or already-exited pids are tolerated silently. After this returns,
    /// no tracked entry with a live pid remains.
    pub async fn terminate_all(&mut self) {
        for process in self.entries.iter().filter(|p| !p.state.is_terminal()) {
            debug!("terminating {} (pid {})", process.name, process.pid);
            terminate(process.pid);
        }

        for mut process in self.entries.drain(..) {
            let Some(mut child) = process.child.take() else {
                continue;
            };
            match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
                Ok(Ok(status)) => {
                    debug!("{} exited with {}", process.name, status);
                }
                Ok(Err(e)) => {
                    debug!("waiting for {} failed: {}", process.name, e);
                }
                Err(_) => {
                    warn!(
                        "{} did not exit within {:?}; killing",
                        process.name, SHUTDOWN_GRACE
                    );
                    let _ = child.kill().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn spawn_sleep(name: &str) -> ManagedProcess {
        let cwd = std::env::temp_dir();
        spawn(
            name,
            &PathBuf::from("/bin/sleep"),
            &["30".to_string()],
            &cwd,
        )
        .unwrap()
    }

    #[test]
    fn test_spawn_failure_reports_the_name() {
        let err = spawn(
            "backend",
            &PathBuf::from("/no/such/program"),
            &[],
            &std::env::temp_dir(),
        )
        .unwrap_err();
        match err {
            Error::Spawn { name, .. } => assert_eq!(name, "backend"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(ProcessState::Stopped.is_terminal());
        assert!(ProcessState::Failed.is_terminal());
        assert!(!ProcessState::Starting.is_terminal());
        assert!(!ProcessState::Healthy.is_terminal());
    }

    #[test]
    fn test_terminate_tolerates_bogus_pid() {
        // Far above any default pid_max; must not panic or error.
        terminate(4_000_000);
    }

    #[tokio::test]
    async fn test_vacuous_cleanup_is_error_free() {
        let mut table = ProcessTable::new();
        table.terminate_all().await;
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_terminate_all_leaves_no_live_pids() {
        let mut table = ProcessTable::new();
        let backend = spawn_sleep("backend");
        let frontend = spawn_sleep("frontend");
        let pids = [backend.pid, frontend.pid];
        table.register(backend);
        table.register(frontend);
        assert_eq!(table.live_pids().len(), 2);

        table.terminate_all().await;

        assert!(table.is_empty());
        for pid in pids {
            assert!(!process_alive(pid), "pid {pid} still alive after cleanup");
        }
    }

    #[tokio::test]
    async fn test_terminate_all_is_idempotent() {
        let mut table = ProcessTable::new();
        table.register(spawn_sleep("backend"));
        table.terminate_all().await;
        // second run sees an empty table and must be a silent no-op
        table.terminate_all().await;
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_poll_exited_observes_a_dead_child() {
        let mut table = ProcessTable::new();
        let short = spawn(
            "short",
            &PathBuf::from("/bin/sleep"),
            &["0".to_string()],
            &std::env::temp_dir(),
        )
        .unwrap();
        table.register(short);

        // give the child a moment to exit
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(table.poll_exited(), Some("short".to_string()));
        assert_eq!(table.get("short").unwrap().state, ProcessState::Stopped);
        // already marked terminal: not reported twice
        assert_eq!(table.poll_exited(), None);
    }
}
