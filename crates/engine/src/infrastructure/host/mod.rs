//! Host thread and registry adapters.

mod headless;
mod thread;

pub use headless::HeadlessRegistry;
pub use thread::{assert_host_thread, is_host_thread, HostThread, HOST_THREAD_NAME};
