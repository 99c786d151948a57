//! Local config seeding.
//!
//! The managed processes read their settings from a local `.env` file that
//! is git-ignored. On first start it is seeded from the versioned template;
//! an existing file is never overwritten, so operator edits survive reruns.

use std::path::Path;
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};

/// Outcome of the seeding step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seeded {
    /// The local config was created from the template this run. The
    /// operator must edit it before secrets-dependent features work.
    Created,
    /// The local config already existed and was left untouched.
    Existing,
}

/// Copy the template into place iff the local config is absent.
pub fn ensure_env_file(root: &Path, config: &Config) -> Result<Seeded> {
    let env_file = root.join(&config.paths.env_file);
    if env_file.exists() {
        return Ok(Seeded::Existing);
    }

    let template = root.join(&config.paths.env_template);
    if !template.exists() {
        return Err(Error::ConfigSeed(format!(
            "template not found: {}",
            template.display()
        )));
    }

    std::fs::copy(&template, &env_file)
        .map_err(|e| Error::ConfigSeed(format!("failed to copy template: {e}")))?;
    info!("seeded {} from {}", env_file.display(), template.display());
    Ok(Seeded::Created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeds_from_template_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        std::fs::write(dir.path().join(".env.example"), "SECRET_KEY=changeme\n").unwrap();

        let outcome = ensure_env_file(dir.path(), &config).unwrap();
        assert_eq!(outcome, Seeded::Created);
        let content = std::fs::read_to_string(dir.path().join(".env")).unwrap();
        assert_eq!(content, "SECRET_KEY=changeme\n");
    }

    #[test]
    fn test_never_overwrites_an_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        std::fs::write(dir.path().join(".env.example"), "SECRET_KEY=changeme\n").unwrap();
        std::fs::write(dir.path().join(".env"), "SECRET_KEY=operator-edited\n").unwrap();

        let outcome = ensure_env_file(dir.path(), &config).unwrap();
        assert_eq!(outcome, Seeded::Existing);
        let content = std::fs::read_to_string(dir.path().join(".env")).unwrap();
        assert_eq!(content, "SECRET_KEY=operator-edited\n");
    }

    #[test]
    fn test_missing_template_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();

        let err = ensure_env_file(dir.path(), &config).unwrap_err();
        assert!(matches!(err, Error::ConfigSeed(_)));
        assert!(err.to_string().contains(".env.example"));
    }
}
