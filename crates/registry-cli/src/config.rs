//! Configuration file discovery.

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use registry_srv::RegistryConfig;

/// Default config file location for this platform.
pub fn default_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("org", "netregistry", "registry")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    Ok(dirs.config_dir().join("config.toml"))
}

/// `explicit` if given, otherwise the platform default.
pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_path(),
    }
}

/// Load the file at `path` (defaults if missing), apply `DR_*` overrides
/// from the environment, and validate.
pub fn load(path: &Path) -> Result<RegistryConfig> {
    let mut config = RegistryConfig::load(path)
        .with_context(|| format!("loading {}", path.display()))?;
    config.apply_env()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn explicit_path_wins() {
        let path = Path::new("/tmp/custom.toml");
        assert_eq!(resolve_path(Some(path)).unwrap(), path);
    }

    #[test]
    fn load_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "auto_approve = true\n[challenge]\nbase_difficulty = 12").unwrap();
        let config = load(file.path()).unwrap();
        assert!(config.auto_approve);
        assert_eq!(config.challenge.base_difficulty, 12);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[challenge]\nttl_secs = 0").unwrap();
        assert!(load(file.path()).is_err());
    }
}
