//! Stop command: out-of-band teardown from persisted state.
//!
//! Mirrors the teardown half of `start` for a stack whose orchestrator is
//! no longer attached to this terminal: signal the recorded pids, bring
//! the dependency services down, and remove the state file. Every step is
//! tolerant -- an already-exited pid or a failed compose down is not an
//! error.

use anyhow::Result;
use colored::Colorize;
use tdv_core::state::RuntimeState;
use tdv_core::{Config, compose, process};

pub async fn execute(config: &Config) -> Result<()> {
    let root = std::env::current_dir()?;
    let state_dir = config.state_dir(&root);

    let Some(state) = RuntimeState::load(&state_dir)? else {
        println!("{}", "Development environment is not running".yellow());
        return Ok(());
    };

    println!("{}", "Stopping development environment...".cyan());

    for (name, pid) in [
        ("backend", state.backend_pid),
        ("frontend", state.frontend_pid),
    ] {
        if let Some(pid) = pid {
            process::terminate(pid);
            println!("  {} {} (pid {}) signalled", "✓".green(), name, pid);
        }
    }

    if state.compose_started {
        compose::services_down(&root, config);
        println!("  {} dependency services stopped", "✓".green());
    }

    RuntimeState::remove(&state_dir);
    println!("{}", "✓ Development environment stopped".green());

    Ok(())
}
