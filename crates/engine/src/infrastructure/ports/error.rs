//! Error types for port operations.

/// Failures reaching the host thread itself (not refusals by the host).
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The dedicated host thread could not be started.
    #[error("Failed to start host thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The host thread has shut down; no task can run anymore.
    #[error("Host thread has stopped")]
    Stopped,

    /// A task panicked while running on the host thread.
    #[error("Host task panicked: {0}")]
    TaskPanicked(String),
}
