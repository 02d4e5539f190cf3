use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Directories under the project root that mods must never write into.
const FORBIDDEN_DIRS: &[&str] = &[".git", "node_modules"];

/// Project safety checks to prevent mods from editing files outside the
/// target project.
#[derive(Debug, Clone)]
pub struct ProjectGuard {
    /// Absolute, canonical path to the project root
    project_root: PathBuf,
    /// Paths under the root that are off limits
    forbidden_paths: Vec<PathBuf>,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Path is outside project: {path} (project: {project})")]
    OutsideProject { path: PathBuf, project: PathBuf },

    #[error("Path is in forbidden directory: {path} (forbidden: {forbidden})")]
    ForbiddenPath { path: PathBuf, forbidden: PathBuf },

    #[error("Failed to canonicalize path: {0}")]
    Canonicalize(#[from] std::io::Error),
}

impl ProjectGuard {
    /// Create a new project guard with the given root.
    ///
    /// The project root is canonicalized to handle symlinks correctly.
    pub fn new(project_root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let project_root = project_root.as_ref().canonicalize()?;
        let forbidden_paths = FORBIDDEN_DIRS
            .iter()
            .map(|dir| project_root.join(dir))
            .collect();

        Ok(Self {
            project_root,
            forbidden_paths,
        })
    }

    /// Check if a path is safe to edit.
    ///
    /// Relative paths are resolved against the project root. The file does
    /// not need to exist yet (resource mods may create it); its nearest
    /// existing ancestor is canonicalized instead.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        };

        let resolved = resolve_existing_prefix(&absolute)?;
        self.check_resolved(&resolved)?;
        Ok(resolved)
    }

    fn check_resolved(&self, resolved: &Path) -> Result<(), SafetyError> {
        if !resolved.starts_with(&self.project_root) {
            return Err(SafetyError::OutsideProject {
                path: resolved.to_path_buf(),
                project: self.project_root.clone(),
            });
        }

        for forbidden in &self.forbidden_paths {
            if resolved.starts_with(forbidden) {
                return Err(SafetyError::ForbiddenPath {
                    path: resolved.to_path_buf(),
                    forbidden: forbidden.clone(),
                });
            }
        }

        Ok(())
    }

    /// Get the project root.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }
}

/// Canonicalize the longest existing ancestor of `path` and re-append the
/// remaining components. `..` in the missing tail is resolved lexically.
fn resolve_existing_prefix(path: &Path) -> Result<PathBuf, SafetyError> {
    let components: Vec<Component<'_>> = path.components().collect();
    let mut split = components.len();
    while split > 1 && !components[..split].iter().collect::<PathBuf>().exists() {
        split -= 1;
    }

    let existing: PathBuf = components[..split].iter().collect();
    let mut resolved = existing.canonicalize()?;
    for component in &components[split..] {
        match component {
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(name) => resolved.push(name),
            _ => {}
        }
    }
    Ok(resolved)
}
