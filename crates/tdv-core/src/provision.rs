//! Virtualenv provisioning and dependency installation.
//!
//! Both operations are idempotent at the step level: an existing virtualenv
//! is a success no-op, and rerunning the installer against an already
//! satisfied manifest is cheap. Partial installs are not rolled back.

use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};

/// Handle to the project's isolated Python environment.
#[derive(Debug, Clone)]
pub struct Venv {
    root: PathBuf,
    /// Whether this call created the environment (false: already existed)
    pub created: bool,
}

impl Venv {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to an executable inside the environment.
    pub fn bin(&self, exe: &str) -> PathBuf {
        #[cfg(unix)]
        {
            self.root.join("bin").join(exe)
        }
        #[cfg(windows)]
        {
            self.root.join("Scripts").join(exe)
        }
    }
}

/// Ensure the virtualenv exists at the configured path.
///
/// Re-running with an existing environment is a no-op that still succeeds.
/// Creation failure is fatal.
pub fn ensure_venv(root: &Path, config: &Config) -> Result<Venv> {
    let venv_dir = root.join(&config.paths.venv_dir);

    if venv_dir.exists() {
        debug!("virtualenv already present at {}", venv_dir.display());
        return Ok(Venv {
            root: venv_dir,
            created: false,
        });
    }

    info!("creating virtualenv at {}", venv_dir.display());
    let output = Command::new("python3")
        .args(["-m", "venv"])
        .arg(&venv_dir)
        .output()
        .map_err(|e| Error::Provision(format!("failed to run python3 -m venv: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Provision(stderr.trim().to_string()));
    }

    Ok(Venv {
        root: venv_dir,
        created: true,
    })
}

/// Install the declared dependency set into the environment.
///
/// The installer's output streams to the operator. A non-zero installer
/// status propagates as a fatal error; whatever was installed stays.
pub fn install_deps(venv: &Venv, root: &Path, config: &Config) -> Result<()> {
    let manifest = root.join(&config.paths.requirements);
    if !manifest.exists() {
        return Err(Error::DependencyInstall(format!(
            "manifest not found: {}",
            manifest.display()
        )));
    }

    let pip = venv.bin("pip");
    info!("installing dependencies from {}", manifest.display());
    let status = Command::new(&pip)
        .arg("install")
        .arg("-r")
        .arg(&manifest)
        .current_dir(root)
        .status()
        .map_err(|e| Error::DependencyInstall(format!("failed to run pip: {e}")))?;

    if !status.success() {
        return Err(Error::DependencyInstall(format!(
            "pip exited with {status}"
        )));
    }

    Ok(())
}
