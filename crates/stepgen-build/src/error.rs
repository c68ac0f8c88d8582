/// Step generation error types
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Invalid pattern '{pattern}': {error}")]
    InvalidPattern {
        pattern: String,
        error: Box<regex::Error>,
    },

    #[error("Invalid target configuration: {0}")]
    InvalidTarget(String),

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("Project not found: {project}")]
    ProjectNotFound { project: String },

    #[error("Project '{project}' has no configuration for target {target}")]
    MissingConfiguration { project: String, target: String },

    #[error(
        "Configuration {target} of project '{project}' was finalized before dependency resolution"
    )]
    UnresolvedConfiguration { project: String, target: String },

    #[error("Source root not found: {0}")]
    SourceRootNotFound(PathBuf),

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl BuildError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }

    /// Create an invalid pattern error
    pub fn invalid_pattern(pattern: impl Into<String>, error: regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            error: Box::new(error),
        }
    }

    /// Create a project not found error
    pub fn project_not_found(project: impl Into<String>) -> Self {
        Self::ProjectNotFound {
            project: project.into(),
        }
    }

    /// Create an unresolved configuration error
    pub fn unresolved(project: impl Into<String>, target: impl ToString) -> Self {
        Self::UnresolvedConfiguration {
            project: project.into(),
            target: target.to_string(),
        }
    }
}
