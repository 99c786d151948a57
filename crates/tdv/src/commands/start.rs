//! Start command: the full orchestration sequence.
//!
//! Blocks in the ready phase until an interrupt or termination signal,
//! then tears down every spawned process. Exit 0 on clean shutdown, exit 1
//! on any fatal provisioning, spawn, or health-check failure.

use anyhow::Result;
use tdv_core::Config;
use tdv_core::orchestrator::Orchestrator;

pub async fn execute(config: &Config) -> Result<()> {
    let root = std::env::current_dir()?;
    let mut orchestrator = Orchestrator::new(config.clone(), root);
    orchestrator.run().await?;
    Ok(())
}
