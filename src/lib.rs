//! Ephemeral local cloud emulator for tests.
//!
//! ```no_run
//! use std::time::Duration;
//! use stackbox::{Instance, with_services};
//!
//! let instance = Instance::new([with_services(["sqs"])])?;
//! if let Err(err) = instance.wait(Duration::from_secs(20)) {
//!     instance.close()?;
//!     return Err(err);
//! }
//!
//! let config = instance.config();
//! let sqs = config.resolve_endpoint("sqs")?;
//! println!("sqs at {}", sqs.url);
//!
//! instance.close()?;
//! # Ok::<(), stackbox::Error>(())
//! ```

pub mod domain;
pub mod error;
pub mod infra;
pub mod services;

// Make test_support available for integration tests
pub mod test_support;

pub use domain::{
    Container, ContainerRuntime, Credentials, Endpoint, EndpointRouter, PortTable, StackConfig,
    StackOption, with_credentials, with_host, with_image, with_region, with_services,
};
pub use error::{Error, Result};
pub use infra::{CliRuntime, StackFile};
pub use services::{ClientConfig, Instance, Probe, Prober};
