use crate::infrastructure::directory::FsError;
use crate::infrastructure::ports::HostError;

/// Failure taxonomy at the lifecycle boundary.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("World not found: {0}")]
    NotFound(String),

    #[error("World already exists: {0}")]
    AlreadyExists(String),

    /// The world is live and could not be vacated or unloaded.
    #[error("World is in use: {0}")]
    InUse(String),

    #[error("File operation failed: {0}")]
    Io(#[source] FsError),

    #[error("Host rejected the operation: {0}")]
    HostRejected(String),

    #[error("Host is unavailable: {0}")]
    HostUnavailable(#[from] HostError),
}

impl From<FsError> for LifecycleError {
    fn from(e: FsError) -> Self {
        match e {
            FsError::NotFound(path) => Self::NotFound(path.display().to_string()),
            FsError::AlreadyExists(path) => Self::AlreadyExists(path.display().to_string()),
            other => Self::Io(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn fs_collisions_map_to_boundary_variants() {
        let missing: LifecycleError = FsError::NotFound(PathBuf::from("worlds/a")).into();
        let taken: LifecycleError = FsError::AlreadyExists(PathBuf::from("worlds/b")).into();
        let worker: LifecycleError = FsError::Worker("join".into()).into();

        assert!(matches!(missing, LifecycleError::NotFound(ref p) if p.ends_with('a')));
        assert!(matches!(taken, LifecycleError::AlreadyExists(_)));
        assert!(matches!(worker, LifecycleError::Io(FsError::Worker(_))));
    }
}
