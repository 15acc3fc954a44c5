use std::path::{Path, PathBuf};

/// Writes rendered Dockerfile text to `path`.
///
/// Parent directories are created as needed. An existing file is only
/// replaced when `force` is set.
pub fn write_dockerfile(path: &Path, content: &str, force: bool) -> Result<(), OutputError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| OutputError::CreateDir {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    if path.exists() && !force {
        return Err(OutputError::AlreadyExists(path.to_path_buf()));
    }

    std::fs::write(path, content).map_err(|e| OutputError::Write {
        path: path.to_path_buf(),
        source: e,
    })?;

    tracing::debug!(path = %path.display(), bytes = content.len(), "wrote dockerfile");
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("failed to create directory {path}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0} already exists; pass --force to overwrite")]
    AlreadyExists(PathBuf),
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
