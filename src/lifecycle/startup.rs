//! Startup orchestration.
//!
//! # Responsibilities
//! - Preflight: refuse to start on an unusable configuration or storage root
//! - Create the storage directories before traffic is accepted
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Directory creation is idempotent; an existing directory is success

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::{validate_config, GatewayConfig, StorageConfig};

/// Fatal startup failure.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} exists but is not a directory", path.display())]
    NotADirectory { path: PathBuf },
}

/// Create `root/name` (with parents) for every name. Existing directories are left alone.
pub fn ensure_directories<I, S>(root: &Path, names: I) -> Result<(), StartupError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<Path>,
{
    for name in names {
        let path = root.join(name.as_ref());
        match fs::create_dir_all(&path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Directory ready");
            }
            Err(_) if path.is_dir() => {}
            Err(_) if path.exists() => {
                return Err(StartupError::NotADirectory { path });
            }
            Err(source) => {
                return Err(StartupError::CreateDirectory { path, source });
            }
        }
    }
    Ok(())
}

/// Create the configured database, static and workflows directories.
pub fn ensure_storage(storage: &StorageConfig) -> Result<(), StartupError> {
    ensure_directories(&storage.root, storage.directory_names())?;
    tracing::info!(
        root = %storage.root.display(),
        directories = ?storage.directory_names(),
        "Storage directories ready"
    );
    Ok(())
}

/// Returns `true` if the service has what it needs to start.
///
/// Every unmet requirement is logged, not just the first.
pub fn check_requirements(config: &GatewayConfig) -> bool {
    let mut ok = true;

    if let Err(errors) = validate_config(config) {
        for error in &errors {
            tracing::error!(error = %error, "Invalid configuration");
        }
        ok = false;
    }

    if let Err(reason) = storage_root_usable(&config.storage.root) {
        tracing::error!(root = %config.storage.root.display(), reason, "Storage root unusable");
        ok = false;
    }

    ok
}

fn storage_root_usable(root: &Path) -> Result<(), &'static str> {
    if root.exists() {
        if !root.is_dir() {
            return Err("not a directory");
        }
        return writable(root);
    }

    // The root will be created; its closest existing ancestor must allow that.
    let ancestor = root
        .ancestors()
        .skip(1)
        .find(|p| p.as_os_str().is_empty() || p.exists());
    match ancestor {
        Some(p) if p.as_os_str().is_empty() => Ok(()),
        Some(p) if p.is_dir() => writable(p),
        Some(_) => Err("parent is not a directory"),
        None => Err("no existing parent"),
    }
}

fn writable(dir: &Path) -> Result<(), &'static str> {
    match fs::metadata(dir) {
        Ok(meta) if meta.permissions().readonly() => Err("read-only"),
        Ok(_) => Ok(()),
        Err(_) => Err("metadata unavailable"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_expected_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            root: tmp.path().to_path_buf(),
            ..StorageConfig::default()
        };

        ensure_storage(&storage).unwrap();

        assert!(tmp.path().join("database").is_dir());
        assert!(tmp.path().join("static").is_dir());
        assert!(tmp.path().join("workflows").is_dir());
    }

    #[test]
    fn is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        ensure_directories(tmp.path(), ["database", "static", "workflows"]).unwrap();
        ensure_directories(tmp.path(), ["database", "static", "workflows"]).unwrap();
        assert!(tmp.path().join("database").is_dir());
    }

    #[test]
    fn creates_missing_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("nested").join("root");
        ensure_directories(&root, ["workflows"]).unwrap();
        assert!(root.join("workflows").is_dir());
    }

    #[test]
    fn file_in_the_way_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("static"), b"not a dir").unwrap();

        let err = ensure_directories(tmp.path(), ["database", "static"]).unwrap_err();
        assert!(matches!(err, StartupError::NotADirectory { ref path } if path.ends_with("static")));
        assert!(tmp.path().join("database").is_dir());
    }

    #[test]
    fn requirements_met_for_default_config_in_temp_root() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = GatewayConfig::default();
        config.storage.root = tmp.path().join("not-yet-created");
        assert!(check_requirements(&config));
    }

    #[test]
    fn requirements_fail_on_invalid_config() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = GatewayConfig::default();
        config.storage.root = tmp.path().to_path_buf();
        config.cors.allowed_origins = vec!["*".into()];
        assert!(!check_requirements(&config));
    }

    #[test]
    fn requirements_fail_when_root_is_a_file() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut config = GatewayConfig::default();
        config.storage.root = tmp.path().to_path_buf();
        assert!(!check_requirements(&config));
    }
}
