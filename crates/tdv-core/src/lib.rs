//! tdv-core - Core library for the Sentient Trader development CLI
//!
//! This crate implements the development-environment orchestrator:
//!
//! - **prereq**: required-tool checks
//! - **provision**: virtualenv creation and dependency install
//! - **seed**: local `.env` seeding from the versioned template
//! - **compose**: dependency services (postgres, redis) via docker compose
//! - **process**: managed child processes (spawn, track, terminate)
//! - **health**: readiness probing against HTTP health endpoints
//! - **orchestrator**: the ordered start sequence and signal-driven cleanup
//! - **state**: persisted runtime state for out-of-band `stop`/`status`

pub mod compose;
pub mod config;
pub mod error;
pub mod health;
pub mod orchestrator;
pub mod prereq;
pub mod process;
pub mod provision;
pub mod seed;
pub mod state;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
