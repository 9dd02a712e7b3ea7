use super::Context;
use anyhow::{Context as _, Result};
use clap::Args;
use stackbox::{
    ClientConfig, Instance, StackOption, with_host, with_image, with_region, with_services,
};
use std::time::Duration;
use tracing::warn;

#[derive(Args, Debug, Default)]
pub struct UpOptions {
    /// Host address clients should use, e.g. http://127.0.0.1
    #[arg(long)]
    pub host: Option<String>,

    /// Region reported to clients
    #[arg(long)]
    pub region: Option<String>,

    /// Services to enable (comma separated); s3 is always added
    #[arg(long, value_delimiter = ',')]
    pub services: Option<Vec<String>>,

    /// Emulator image
    #[arg(long)]
    pub image: Option<String>,

    /// Readiness budget in seconds (default: [wait] timeout_secs or 20)
    #[arg(long)]
    pub wait_secs: Option<u64>,
}

impl UpOptions {
    /// File options first, flags after, so flags win.
    fn stack_options(&self, ctx: &Context) -> Vec<StackOption> {
        let mut options = ctx.file.to_options();

        if let Some(host) = &self.host {
            options.push(with_host(host.clone()));
        }
        if let Some(region) = &self.region {
            options.push(with_region(region.clone()));
        }
        if let Some(services) = &self.services {
            options.push(with_services(services.iter().cloned()));
        }
        if let Some(image) = &self.image {
            options.push(with_image(image.clone()));
        }

        options
    }

    fn budget(&self, ctx: &Context) -> Duration {
        self.wait_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| ctx.file.wait_timeout())
    }
}

pub fn run(options: UpOptions, ctx: &Context) -> Result<()> {
    let instance = Instance::with_runtime(ctx.runtime.clone(), options.stack_options(ctx))
        .context("starting emulator")?;

    if let Err(err) = instance.wait(options.budget(ctx)) {
        let id = instance.container().short_id().to_string();
        if let Err(close_err) = instance.close() {
            warn!(container = %id, error = %close_err, "could not purge emulator after failed wait");
        }
        return Err(err).context("waiting for emulator");
    }

    print!(
        "{}",
        render_exports(instance.container().id(), instance.services(), &instance.config())
    );
    Ok(())
}

/// Shell `export` lines describing a running emulator.
fn render_exports(container_id: &str, services: &[String], config: &ClientConfig) -> String {
    let mut out = format!("export STACKBOX_CONTAINER={}\n", shell_quote(container_id));

    for (name, value) in config.env_vars() {
        out.push_str(&format!("export {name}={}\n", shell_quote(&value)));
    }

    let mut seen: Vec<&str> = Vec::new();
    for service in services {
        if seen.contains(&service.as_str()) {
            continue;
        }
        seen.push(service);

        match config.resolve_endpoint(service) {
            Ok(endpoint) => out.push_str(&format!(
                "export {}={}\n",
                endpoint_var(service),
                shell_quote(&endpoint.url)
            )),
            Err(err) => warn!(service = %service, error = %err, "no endpoint"),
        }
    }

    out
}

/// `streams.dynamodb` becomes `STACKBOX_ENDPOINT_STREAMS_DYNAMODB`.
fn endpoint_var(service: &str) -> String {
    let suffix: String = service
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("STACKBOX_ENDPOINT_{suffix}")
}

fn shell_quote(value: &str) -> String {
    if !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:".contains(c))
    {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', r"'\''"))
}
