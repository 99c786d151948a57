//! Configuration for tdv.
//!
//! Configuration is loaded from `tdv.toml` in the project root when present,
//! with defaults matching the stock Sentient Trader layout. Every field has
//! a default, so a project without a config file works out of the box.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend (FastAPI/uvicorn) settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Frontend (Streamlit) settings
    #[serde(default)]
    pub frontend: FrontendConfig,

    /// Dependency services (postgres, redis)
    #[serde(default)]
    pub services: ServicesConfig,

    /// Backend readiness probe policy
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Project file layout
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// ASGI application path passed to uvicorn
    #[serde(default = "default_backend_app")]
    pub app: String,

    /// Bind host for uvicorn
    #[serde(default = "default_backend_host")]
    pub host: String,

    #[serde(default = "default_backend_port")]
    pub port: u16,

    /// Health endpoint path, probed during startup
    #[serde(default = "default_backend_health_path")]
    pub health_path: String,

    /// Run uvicorn with --reload
    #[serde(default = "default_true")]
    pub reload: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendConfig {
    /// Streamlit entry script
    #[serde(default = "default_frontend_script")]
    pub script: String,

    #[serde(default = "default_frontend_port")]
    pub port: u16,

    /// Streamlit's internal health endpoint (informational only; the
    /// frontend is launched fire-and-forget)
    #[serde(default = "default_frontend_health_path")]
    pub health_path: String,

    /// Fixed settle delay after launch, in seconds
    #[serde(default = "default_settle_secs")]
    pub settle_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Compose file declaring the dependency services
    #[serde(default = "default_compose_file")]
    pub compose_file: String,

    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,

    #[serde(default = "default_redis_port")]
    pub redis_port: u16,
}

/// Backend readiness probe policy.
///
/// The stock configuration issues a single probe after a fixed warm-up
/// delay. Raising `attempts` turns this into a bounded retry loop with
/// `interval_secs` spacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Warm-up delay before the first probe, in seconds
    #[serde(default = "default_warmup_secs")]
    pub warmup_secs: u64,

    /// Maximum probe attempts (values below 1 are treated as 1)
    #[serde(default = "default_probe_attempts")]
    pub attempts: u32,

    /// Delay between probe attempts, in seconds
    #[serde(default = "default_probe_interval_secs")]
    pub interval_secs: u64,

    /// Per-probe HTTP timeout, in seconds
    #[serde(default = "default_probe_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Isolated Python environment directory
    #[serde(default = "default_venv_dir")]
    pub venv_dir: String,

    /// Dependency manifest
    #[serde(default = "default_requirements")]
    pub requirements: String,

    /// Local config file (generated, git-ignored)
    #[serde(default = "default_env_file")]
    pub env_file: String,

    /// Versioned template the local config is seeded from
    #[serde(default = "default_env_template")]
    pub env_template: String,

    /// Runtime state directory (git-ignored)
    #[serde(default = "default_state_dir")]
    pub state_dir: String,
}

impl Config {
    /// Load configuration from `tdv.toml` in the current directory, falling
    /// back to defaults when the file is absent.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("tdv.toml"))
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Base URL the backend is reachable at from the host.
    pub fn backend_url(&self) -> String {
        format!("http://localhost:{}", self.backend.port)
    }

    /// Full URL of the backend health endpoint.
    pub fn backend_health_url(&self) -> String {
        format!("{}{}", self.backend_url(), self.backend.health_path)
    }

    /// Base URL the frontend is reachable at from the host.
    pub fn frontend_url(&self) -> String {
        format!("http://localhost:{}", self.frontend.port)
    }

    /// Full URL of the frontend health endpoint.
    pub fn frontend_health_url(&self) -> String {
        format!("{}{}", self.frontend_url(), self.frontend.health_path)
    }

    /// Runtime state directory under the given project root.
    pub fn state_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.paths.state_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            frontend: FrontendConfig::default(),
            services: ServicesConfig::default(),
            probe: ProbeConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            app: default_backend_app(),
            host: default_backend_host(),
            port: default_backend_port(),
            health_path: default_backend_health_path(),
            reload: default_true(),
        }
    }
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            script: default_frontend_script(),
            port: default_frontend_port(),
            health_path: default_frontend_health_path(),
            settle_secs: default_settle_secs(),
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            compose_file: default_compose_file(),
            postgres_port: default_postgres_port(),
            redis_port: default_redis_port(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            warmup_secs: default_warmup_secs(),
            attempts: default_probe_attempts(),
            interval_secs: default_probe_interval_secs(),
            timeout_secs: default_probe_timeout_secs(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            venv_dir: default_venv_dir(),
            requirements: default_requirements(),
            env_file: default_env_file(),
            env_template: default_env_template(),
            state_dir: default_state_dir(),
        }
    }
}

// Default value functions
fn default_backend_app() -> String {
    "app.main:app".to_string()
}

fn default_backend_host() -> String {
    "0.0.0.0".to_string()
}

fn default_backend_port() -> u16 {
    8000
}

fn default_backend_health_path() -> String {
    "/health".to_string()
}

fn default_frontend_script() -> String {
    "streamlit_app.py".to_string()
}

fn default_frontend_port() -> u16 {
    8501
}

fn default_frontend_health_path() -> String {
    "/_stcore/health".to_string()
}

fn default_settle_secs() -> u64 {
    3
}

fn default_compose_file() -> String {
    "docker-compose.yml".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_redis_port() -> u16 {
    6379
}

fn default_warmup_secs() -> u64 {
    5
}

fn default_probe_attempts() -> u32 {
    1
}

fn default_probe_interval_secs() -> u64 {
    2
}

fn default_probe_timeout_secs() -> u64 {
    5
}

fn default_venv_dir() -> String {
    "venv".to_string()
}

fn default_requirements() -> String {
    "requirements.txt".to_string()
}

fn default_env_file() -> String {
    ".env".to_string()
}

fn default_env_template() -> String {
    ".env.example".to_string()
}

fn default_state_dir() -> String {
    ".tdv".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stock_layout() {
        let config = Config::default();

        assert_eq!(config.backend.port, 8000);
        assert_eq!(config.backend.health_path, "/health");
        assert_eq!(config.frontend.port, 8501);
        assert_eq!(config.frontend.health_path, "/_stcore/health");
        assert_eq!(config.services.postgres_port, 5432);
        assert_eq!(config.services.redis_port, 6379);
        assert_eq!(config.paths.venv_dir, "venv");
        assert_eq!(config.paths.requirements, "requirements.txt");
        assert_eq!(config.paths.env_file, ".env");
        assert_eq!(config.paths.env_template, ".env.example");
    }

    #[test]
    fn test_single_probe_is_the_default_policy() {
        let config = Config::default();
        assert_eq!(config.probe.attempts, 1);
        assert_eq!(config.probe.warmup_secs, 5);
    }

    #[test]
    fn test_urls() {
        let config = Config::default();
        assert_eq!(config.backend_url(), "http://localhost:8000");
        assert_eq!(
            config.backend_health_url(),
            "http://localhost:8000/health"
        );
        assert_eq!(
            config.frontend_health_url(),
            "http://localhost:8501/_stcore/health"
        );
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/tdv.toml")).unwrap();
        assert_eq!(config.backend.port, 8000);
    }

    #[test]
    fn test_load_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tdv.toml");
        std::fs::write(
            &path,
            "[probe]\nattempts = 5\ninterval_secs = 1\n\n[backend]\nport = 9000\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.probe.attempts, 5);
        assert_eq!(config.probe.interval_secs, 1);
        assert_eq!(config.backend.port, 9000);
        // untouched sections fall back to defaults
        assert_eq!(config.frontend.port, 8501);
        assert_eq!(config.probe.warmup_secs, 5);
    }

    #[test]
    fn test_load_invalid_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tdv.toml");
        std::fs::write(&path, "backend = \"not a table\"").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }
}
