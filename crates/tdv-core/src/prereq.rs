//! Prerequisite checks for the host toolchain.

use tracing::debug;

use crate::error::{Error, Result};

/// Tools that must be invocable before provisioning can start.
pub const REQUIRED_TOOLS: &[&str] = &["python3", "pip3"];

/// Verify every required tool is installed.
///
/// Fails fast on the first missing tool -- absence of a tool is not
/// transient, so there is no retry and the whole sequence aborts.
pub fn check_requirements() -> Result<()> {
    check_tools(REQUIRED_TOOLS)
}

/// Verify an explicit tool list (split out for testing).
pub fn check_tools(tools: &[&str]) -> Result<()> {
    for tool in tools {
        match which::which(tool) {
            Ok(path) => debug!("found {} at {:?}", tool, path),
            Err(_) => {
                return Err(Error::MissingTool {
                    tool: tool.to_string(),
                });
            }
        }
    }
    Ok(())
}
