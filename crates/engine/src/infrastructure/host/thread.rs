//! The single privileged host thread.
//!
//! The host's world registry is not safe for concurrent mutation, so it is moved
//! onto one dedicated OS thread that drains a task queue. Worker-pool code
//! reaches it only through [`HostThread::run`], which returns a future resolving
//! to the task's result.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;
use std::thread::JoinHandle;

use tokio::sync::{mpsc, oneshot};

use crate::infrastructure::ports::{HostError, WorldRegistry};

/// Name of the dedicated host thread (visible in logs and debuggers).
pub const HOST_THREAD_NAME: &str = "world-host";

thread_local! {
    static ON_HOST_THREAD: Cell<bool> = const { Cell::new(false) };
}

/// Whether the current thread is a host thread.
pub fn is_host_thread() -> bool {
    ON_HOST_THREAD.with(Cell::get)
}

/// Panics unless called from the host thread.
///
/// Every registry implementation calls this at the top of each method.
#[track_caller]
pub fn assert_host_thread() {
    assert!(
        is_host_thread(),
        "world registry accessed outside the host thread (from {:?})",
        std::thread::current().name()
    );
}

type HostTask = Box<dyn FnOnce(&mut dyn WorldRegistry) + Send + 'static>;

enum HostMessage {
    Run(HostTask),
    Stop,
}

/// Handle to the host thread's task queue.
pub struct HostThread {
    sender: mpsc::UnboundedSender<HostMessage>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl HostThread {
    /// Move `registry` onto a freshly spawned host thread.
    pub fn spawn(registry: Box<dyn WorldRegistry>) -> Result<Self, HostError> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<HostMessage>();

        let join = std::thread::Builder::new()
            .name(HOST_THREAD_NAME.to_string())
            .spawn(move || {
                ON_HOST_THREAD.with(|flag| flag.set(true));
                let mut registry = registry;
                while let Some(message) = receiver.blocking_recv() {
                    match message {
                        HostMessage::Run(task) => task(registry.as_mut()),
                        HostMessage::Stop => break,
                    }
                }
                tracing::debug!("Host thread stopped");
            })
            .map_err(HostError::Spawn)?;

        Ok(Self {
            sender,
            join: Mutex::new(Some(join)),
        })
    }

    /// Run `task` on the host thread and wait for its result.
    ///
    /// Tasks run one at a time in submission order. A panicking task is
    /// reported as [`HostError::TaskPanicked`] and does not take the thread down.
    pub async fn run<R, F>(&self, task: F) -> Result<R, HostError>
    where
        F: FnOnce(&mut dyn WorldRegistry) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply, result) = oneshot::channel();
        let task: HostTask = Box::new(move |registry| {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| task(registry)));
            // The caller may have stopped waiting; nothing to do then.
            let _ = reply.send(outcome.map_err(panic_message));
        });

        self.sender
            .send(HostMessage::Run(task))
            .map_err(|_| HostError::Stopped)?;

        match result.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(message)) => {
                tracing::error!(panic = %message, "Host task panicked");
                Err(HostError::TaskPanicked(message))
            }
            Err(_) => Err(HostError::Stopped),
        }
    }

    /// Stop the host thread after already queued tasks have run.
    ///
    /// Idempotent. Blocks the calling thread until the host thread exits, so
    /// async callers should use [`HostThread::shutdown`].
    pub fn stop(&self) {
        let _ = self.sender.send(HostMessage::Stop);
        let join = match self.join.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(join) = join {
            if join.join().is_err() {
                tracing::error!("Host thread terminated with a panic");
            }
        }
    }

    /// Async variant of [`HostThread::stop`].
    pub async fn shutdown(self: &std::sync::Arc<Self>) {
        let host = self.clone();
        if tokio::task::spawn_blocking(move || host.stop()).await.is_err() {
            tracing::error!("Failed to join host thread");
        }
    }
}

impl Drop for HostThread {
    fn drop(&mut self) {
        let _ = self.sender.send(HostMessage::Stop);
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
