use std::time::Duration;

use worldkeeper_domain::{WorldHandle, WorldName};

use super::LifecycleError;

/// Result of [`super::WorldLifecycle::create`], carrying how long it took.
#[derive(Debug)]
pub struct CreationResult {
    pub outcome: Result<WorldHandle, LifecycleError>,
    pub elapsed: Duration,
}

impl CreationResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn handle(&self) -> Option<&WorldHandle> {
        self.outcome.as_ref().ok()
    }

    /// `"850ms"` under one second, `"2.35s"` otherwise.
    pub fn formatted_time(&self) -> String {
        if self.elapsed < Duration::from_secs(1) {
            format!("{}ms", self.elapsed.as_millis())
        } else {
            format!("{:.2}s", self.elapsed.as_secs_f64())
        }
    }
}

/// Outcome of auto-loading every stored world at startup.
#[derive(Debug, Default)]
pub struct LoadAllSummary {
    pub requested: usize,
    pub loaded: Vec<WorldName>,
    pub failed: Vec<(WorldName, LifecycleError)>,
}

/// Drift between the world container and the metadata store.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// World directories with no metadata entry.
    pub untracked: Vec<WorldName>,
    /// Metadata entries whose directory is gone.
    pub missing: Vec<WorldName>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.untracked.is_empty() && self.missing.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_after(elapsed: Duration) -> CreationResult {
        CreationResult {
            outcome: Err(LifecycleError::HostRejected("test".into())),
            elapsed,
        }
    }

    #[test]
    fn formatted_time_switches_units_at_one_second() {
        assert_eq!(result_after(Duration::from_millis(850)).formatted_time(), "850ms");
        assert_eq!(result_after(Duration::from_millis(2500)).formatted_time(), "2.50s");
        assert_eq!(result_after(Duration::from_secs(1)).formatted_time(), "1.00s");
    }

    #[test]
    fn failed_creation_has_no_handle() {
        let result = result_after(Duration::ZERO);
        assert!(!result.is_success());
        assert!(result.handle().is_none());
    }
}
