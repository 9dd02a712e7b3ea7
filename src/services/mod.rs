mod client_config;
mod instance;
mod prober;

pub use client_config::ClientConfig;
pub use instance::Instance;
pub use prober::{DEFAULT_POLL_INTERVAL, ObjectStorageProbe, Probe, Prober};
