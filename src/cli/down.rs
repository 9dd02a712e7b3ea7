use super::Context;
use anyhow::{Context as _, Result};
use clap::Args;
use stackbox::Container;
use tracing::info;

#[derive(Args, Debug)]
pub struct DownOptions {
    /// Container id printed by `stackbox up` (STACKBOX_CONTAINER)
    #[arg(env = "STACKBOX_CONTAINER")]
    pub container: String,
}

pub fn run(options: DownOptions, ctx: &Context) -> Result<()> {
    let container = Container::new(options.container);

    ctx.runtime
        .purge_container(&container)
        .with_context(|| format!("purging {}", container.short_id()))?;

    info!(container = container.short_id(), "emulator purged");
    Ok(())
}
