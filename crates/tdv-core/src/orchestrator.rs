//! The startup/shutdown orchestrator.
//!
//! One coordinating task runs the ordered sequence; each managed service
//! runs as an independent OS-level child process. A shutdown listener is
//! armed before anything is spawned, and its signal is observed at the
//! `select!` points of the coordinating task -- teardown never runs in
//! signal context. A signal that arrives during a blocking step (e.g. a
//! slow dependency install) is observed at the next await point; the
//! in-flight installer itself is not cancelled.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use colored::Colorize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::compose::{self, DependencyServiceStatus};
use crate::config::Config;
use crate::error::Result;
use crate::health;
use crate::prereq;
use crate::process::{self, ProcessState, ProcessTable};
use crate::provision;
use crate::seed::{self, Seeded};
use crate::state::RuntimeState;

/// Interval of the liveness tick over tracked pids in the ready phase.
const LIVENESS_INTERVAL: Duration = Duration::from_secs(2);

/// Coarse-grained state of the startup sequence. Single writer (the
/// coordinating task); consulted during teardown to scope cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    CheckingPrereqs,
    ProvisioningEnv,
    InstallingDeps,
    SeedingConfig,
    StartingDependencies,
    StartingBackend,
    AwaitingBackendHealth,
    StartingFrontend,
    Ready,
    ShuttingDown,
    Terminated,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::CheckingPrereqs => "checking prerequisites",
            Phase::ProvisioningEnv => "provisioning environment",
            Phase::InstallingDeps => "installing dependencies",
            Phase::SeedingConfig => "seeding config",
            Phase::StartingDependencies => "starting dependency services",
            Phase::StartingBackend => "starting backend",
            Phase::AwaitingBackendHealth => "awaiting backend health",
            Phase::StartingFrontend => "starting frontend",
            Phase::Ready => "ready",
            Phase::ShuttingDown => "shutting down",
            Phase::Terminated => "terminated",
        };
        write!(f, "{s}")
    }
}

/// The development-environment supervisor.
///
/// Owns the process table and the phase machine; both are mutated only by
/// the coordinating task that drives [`Orchestrator::run`].
pub struct Orchestrator {
    config: Config,
    root: PathBuf,
    phase: Phase,
    table: ProcessTable,
    services: Option<DependencyServiceStatus>,
}

impl Orchestrator {
    pub fn new(config: Config, root: PathBuf) -> Self {
        Self {
            config,
            root,
            phase: Phase::CheckingPrereqs,
            table: ProcessTable::new(),
            services: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run the full sequence, block until a shutdown signal or an
    /// unexpected child exit, then tear everything down.
    ///
    /// `Ok(())` is a clean shutdown (exit 0); any fatal provisioning,
    /// spawn, or health failure tears down whatever was started and
    /// propagates (exit 1).
    pub async fn run(&mut self) -> Result<()> {
        // Armed before any child is spawned.
        let mut shutdown = arm_shutdown_listener();

        let startup = {
            let sequence = self.start_sequence();
            tokio::pin!(sequence);
            tokio::select! {
                result = &mut sequence => Some(result),
                _ = shutdown.changed() => None,
            }
        };

        match startup {
            Some(Ok(())) => {
                self.print_summary();
                self.wait_for_shutdown(&mut shutdown).await;
            }
            Some(Err(e)) => {
                self.teardown().await;
                return Err(e);
            }
            None => {
                println!();
                println!("{}", "Interrupted during startup".yellow());
            }
        }

        println!("{}", "Shutting down...".cyan());
        self.teardown().await;
        println!("{}", "✓ Development environment stopped".green());
        Ok(())
    }

    /// The ordered start sequence: steps 1-4 run to completion or abort
    /// the whole run; step 5 spawns the children and health-gates the
    /// backend.
    async fn start_sequence(&mut self) -> Result<()> {
        println!(
            "{}",
            "Starting Sentient Trader development environment"
                .cyan()
                .bold()
        );
        println!("{}", "─".repeat(50));

        self.set_phase(Phase::CheckingPrereqs);
        prereq::check_requirements()?;
        println!("  {} prerequisites", "✓".green());

        self.set_phase(Phase::ProvisioningEnv);
        let venv = provision::ensure_venv(&self.root, &self.config)?;
        println!(
            "  {} virtualenv {}",
            "✓".green(),
            if venv.created { "created" } else { "ready" }
        );

        self.set_phase(Phase::InstallingDeps);
        provision::install_deps(&venv, &self.root, &self.config)?;
        println!("  {} dependencies installed", "✓".green());

        self.set_phase(Phase::SeedingConfig);
        match seed::ensure_env_file(&self.root, &self.config)? {
            Seeded::Created => {
                println!(
                    "  {} {} seeded from {}",
                    "○".yellow(),
                    self.config.paths.env_file,
                    self.config.paths.env_template
                );
                println!("    edit it before secrets-dependent features will work");
            }
            Seeded::Existing => {
                println!("  {} {} present", "✓".green(), self.config.paths.env_file);
            }
        }

        self.set_phase(Phase::StartingDependencies);
        let status = compose::services_up(&self.root, &self.config);
        self.services = Some(status);
        match status {
            DependencyServiceStatus::Started => {
                println!("  {} dependency services started", "✓".green());
            }
            DependencyServiceStatus::ManualRequired => {
                println!(
                    "  {} compose unavailable; start dependency services manually:",
                    "○".yellow()
                );
                for (name, endpoint) in compose::expected_endpoints(&self.config) {
                    println!("      {name} -> {endpoint}");
                }
            }
        }

        self.set_phase(Phase::StartingBackend);
        let backend = process::spawn(
            "backend",
            &venv.bin("uvicorn"),
            &self.backend_args(),
            &self.root,
        )?;
        println!("  {} backend started (pid {})", "✓".green(), backend.pid);
        self.table.register(backend);

        self.set_phase(Phase::AwaitingBackendHealth);
        self.table.set_state("backend", ProcessState::HealthUnknown);
        let url = self.config.backend_health_url();
        match health::await_ready("backend", &url, &self.config.probe).await {
            Ok(result) => {
                self.table.set_state("backend", ProcessState::Healthy);
                println!(
                    "  {} backend healthy ({} attempt(s))",
                    "✓".green(),
                    result.attempt
                );
            }
            Err(e) => {
                self.table.set_state("backend", ProcessState::Failed);
                return Err(e);
            }
        }

        self.set_phase(Phase::StartingFrontend);
        let frontend = process::spawn(
            "frontend",
            &venv.bin("streamlit"),
            &self.frontend_args(),
            &self.root,
        )?;
        println!("  {} frontend started (pid {})", "✓".green(), frontend.pid);
        self.table.register(frontend);
        tokio::time::sleep(Duration::from_secs(self.config.frontend.settle_secs)).await;
        self.table.set_state("frontend", ProcessState::Running);

        self.persist_state()?;
        Ok(())
    }

    /// Ready-phase wait: suspend until a shutdown signal arrives or a
    /// tracked child exits underneath us.
    async fn wait_for_shutdown(&mut self, shutdown: &mut watch::Receiver<bool>) {
        self.set_phase(Phase::Ready);
        let mut tick = tokio::time::interval(LIVENESS_INTERVAL);
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    println!();
                    info!("shutdown signal received");
                    return;
                }
                _ = tick.tick() => {
                    if let Some(name) = self.table.poll_exited() {
                        println!();
                        println!("{}", format!("✗ {name} exited unexpectedly").red());
                        return;
                    }
                }
            }
        }
    }

    /// The cleanup handler. Idempotent: only table entries that exist at
    /// call time are terminated; earlier non-process steps (virtualenv,
    /// seeded config) are not compensated.
    pub async fn teardown(&mut self) {
        self.set_phase(Phase::ShuttingDown);

        if !self.table.is_empty() {
            self.table.terminate_all().await;
        }

        if self.services == Some(DependencyServiceStatus::Started) {
            compose::services_down(&self.root, &self.config);
        }

        RuntimeState::remove(&self.config.state_dir(&self.root));
        self.set_phase(Phase::Terminated);
    }

    fn backend_args(&self) -> Vec<String> {
        let mut args = vec![
            self.config.backend.app.clone(),
            "--host".to_string(),
            self.config.backend.host.clone(),
            "--port".to_string(),
            self.config.backend.port.to_string(),
        ];
        if self.config.backend.reload {
            args.push("--reload".to_string());
        }
        args
    }

    fn frontend_args(&self) -> Vec<String> {
        vec![
            "run".to_string(),
            self.config.frontend.script.clone(),
            "--server.port".to_string(),
            self.config.frontend.port.to_string(),
            "--server.headless".to_string(),
            "true".to_string(),
        ]
    }

    fn persist_state(&self) -> Result<()> {
        let state = RuntimeState {
            backend_pid: self.table.get("backend").map(|p| p.pid),
            frontend_pid: self.table.get("frontend").map(|p| p.pid),
            compose_started: self.services == Some(DependencyServiceStatus::Started),
            started_at: Some(chrono::Utc::now()),
        };
        state.save(&self.config.state_dir(&self.root))
    }

    fn print_summary(&self) {
        println!();
        println!("{}", "✓ Development environment ready".green().bold());
        println!("  Frontend:  {}", self.config.frontend_url());
        println!("  Backend:   {}", self.config.backend_url());
        println!("  API docs:  {}/docs", self.config.backend_url());
        for (name, endpoint) in compose::expected_endpoints(&self.config) {
            println!("  {:<9} {}", format!("{name}:"), endpoint);
        }
        println!();
        println!("  Press Ctrl+C to stop");
    }

    fn set_phase(&mut self, phase: Phase) {
        debug!("phase: {} -> {}", self.phase, phase);
        self.phase = phase;
    }
}

/// Spawn the shutdown listener and return the receiving side.
///
/// The listener task turns SIGINT/SIGTERM into a watch notification; all
/// actual teardown happens on the coordinating task.
fn arm_shutdown_listener() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = tx.send(true);
    });
    rx
}

/// Resolve when an interrupt or termination signal arrives.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {}", e);
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn orchestrator_in(dir: &Path) -> Orchestrator {
        Orchestrator::new(Config::default(), dir.to_path_buf())
    }

    #[tokio::test]
    async fn test_vacuous_teardown_before_any_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let mut orchestrator = orchestrator_in(dir.path());

        orchestrator.teardown().await;

        assert_eq!(orchestrator.phase(), Phase::Terminated);
        assert!(orchestrator.table.is_empty());
    }

    #[tokio::test]
    async fn test_teardown_terminates_every_tracked_process() {
        let dir = tempfile::tempdir().unwrap();
        let mut orchestrator = orchestrator_in(dir.path());

        let backend = process::spawn(
            "backend",
            Path::new("/bin/sleep"),
            &["30".to_string()],
            dir.path(),
        )
        .unwrap();
        let frontend = process::spawn(
            "frontend",
            Path::new("/bin/sleep"),
            &["30".to_string()],
            dir.path(),
        )
        .unwrap();
        let pids = [backend.pid, frontend.pid];
        orchestrator.table.register(backend);
        orchestrator.table.register(frontend);

        orchestrator.teardown().await;

        assert_eq!(orchestrator.phase(), Phase::Terminated);
        assert!(orchestrator.table.is_empty());
        for pid in pids {
            assert!(!process::process_alive(pid));
        }
    }

    #[tokio::test]
    async fn test_teardown_removes_the_state_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut orchestrator = orchestrator_in(dir.path());
        let state_dir = orchestrator.config.state_dir(dir.path());

        RuntimeState::default().save(&state_dir).unwrap();
        assert!(RuntimeState::load(&state_dir).unwrap().is_some());

        orchestrator.teardown().await;
        assert!(RuntimeState::load(&state_dir).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_teardown_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut orchestrator = orchestrator_in(dir.path());
        orchestrator.teardown().await;
        orchestrator.teardown().await;
        assert_eq!(orchestrator.phase(), Phase::Terminated);
    }

    #[test]
    fn test_backend_args_follow_config() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator_in(dir.path());
        let args = orchestrator.backend_args();
        assert_eq!(
            args,
            vec!["app.main:app", "--host", "0.0.0.0", "--port", "8000", "--reload"]
        );
    }

    #[test]
    fn test_frontend_args_follow_config() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator_in(dir.path());
        let args = orchestrator.frontend_args();
        assert_eq!(args[0], "run");
        assert_eq!(args[1], "streamlit_app.py");
        assert!(args.contains(&"8501".to_string()));
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::CheckingPrereqs.to_string(), "checking prerequisites");
        assert_eq!(Phase::AwaitingBackendHealth.to_string(), "awaiting backend health");
        assert_eq!(Phase::Terminated.to_string(), "terminated");
    }
}
