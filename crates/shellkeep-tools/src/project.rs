use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("project root does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("project root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("could not determine the current directory: {0}")]
    Io(#[from] std::io::Error),
}

/// The directory a fresh shell starts in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    root_dir: PathBuf,
}

impl Project {
    pub fn new(root_dir: impl Into<PathBuf>) -> Result<Self, ProjectError> {
        let root_dir = validate(root_dir.into())?;
        Ok(Self { root_dir })
    }

    /// Use the process working directory as the root
    pub fn current() -> Result<Self, ProjectError> {
        Self::new(std::env::current_dir()?)
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Point the project at another directory. On error the old root stays.
    pub fn set_root_dir(&mut self, root_dir: impl Into<PathBuf>) -> Result<(), ProjectError> {
        self.root_dir = validate(root_dir.into())?;
        Ok(())
    }
}

fn validate(path: PathBuf) -> Result<PathBuf, ProjectError> {
    if !path.exists() {
        return Err(ProjectError::NotFound(path));
    }
    if !path.is_dir() {
        return Err(ProjectError::NotADirectory(path));
    }
    Ok(path)
}
