pub mod down;
pub mod services;
pub mod up;

pub use down::DownOptions;
pub use up::UpOptions;

use anyhow::Result;
use stackbox::infra::config::load_stack_file;
use stackbox::{CliRuntime, ContainerRuntime, StackFile};
use std::path::Path;
use std::sync::Arc;

/// Settings shared by every subcommand.
pub struct Context {
    pub file: StackFile,
    pub runtime: Arc<dyn ContainerRuntime>,
}

impl Context {
    /// `--runtime` wins over `[runtime] binary`, which wins over detection.
    pub fn load(config: Option<&Path>, runtime: Option<String>) -> Result<Self> {
        let file = load_stack_file(config)?;
        let runtime = match runtime.or_else(|| file.runtime.binary.clone()) {
            Some(binary) => CliRuntime::new(binary),
            None => CliRuntime::detect(),
        };

        Ok(Self {
            file,
            runtime: Arc::new(runtime),
        })
    }
}
