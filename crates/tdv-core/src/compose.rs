//! Dependency service management via docker compose.
//!
//! Postgres and redis are external collaborators, not part of this system.
//! Starting them is a soft dependency: when no compose tool is available or
//! `up` fails, the operator gets the expected endpoints for manual startup
//! and the sequence continues. Teardown is best-effort.

use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

use crate::config::Config;

/// Outcome of the dependency-service step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyServiceStatus {
    /// Services were brought up in detached mode via the compose tool.
    Started,
    /// No compose tool, or `up` failed. The operator must start the
    /// services out-of-band; the sequence continues regardless.
    ManualRequired,
}

/// Resolve the compose invocation: `docker-compose` if installed, otherwise
/// the `docker compose` plugin. None when neither is available.
pub fn compose_program() -> Option<Vec<String>> {
    if which::which("docker-compose").is_ok() {
        return Some(vec!["docker-compose".to_string()]);
    }
    if which::which("docker").is_ok() {
        return Some(vec!["docker".to_string(), "compose".to_string()]);
    }
    None
}

fn run_compose(program: &[String], root: &Path, compose_file: &str, args: &[&str]) -> bool {
    let mut cmd = Command::new(&program[0]);
    cmd.args(&program[1..])
        .arg("-f")
        .arg(compose_file)
        .args(args)
        .current_dir(root);

    match cmd.output() {
        Ok(output) => {
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                warn!("compose {:?} failed: {}", args, stderr.trim());
            }
            output.status.success()
        }
        Err(e) => {
            warn!("failed to run compose {:?}: {}", args, e);
            false
        }
    }
}

/// Bring the declared services up in detached mode.
pub fn services_up(root: &Path, config: &Config) -> DependencyServiceStatus {
    let Some(program) = compose_program() else {
        warn!("no compose tool found; dependency services need manual startup");
        return DependencyServiceStatus::ManualRequired;
    };

    if run_compose(&program, root, &config.services.compose_file, &["up", "-d"]) {
        DependencyServiceStatus::Started
    } else {
        DependencyServiceStatus::ManualRequired
    }
}

/// Tear the services down. Best-effort: failure is ignored.
pub fn services_down(root: &Path, config: &Config) {
    let Some(program) = compose_program() else {
        debug!("no compose tool found; nothing to tear down");
        return;
    };

    run_compose(&program, root, &config.services.compose_file, &["down"]);
}

/// Check whether the compose stack reports running services.
/// None when no compose tool is available.
pub fn services_running(root: &Path, config: &Config) -> Option<bool> {
    let program = compose_program()?;
    Some(run_compose(
        &program,
        root,
        &config.services.compose_file,
        &["ps"],
    ))
}

/// Expected connection endpoints, for manual-startup advisories and status
/// output.
pub fn expected_endpoints(config: &Config) -> Vec<(&'static str, String)> {
    vec![
        (
            "postgres",
            format!("localhost:{}", config.services.postgres_port),
        ),
        ("redis", format!("localhost:{}", config.services.redis_port)),
    ]
}
