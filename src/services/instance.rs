use crate::domain::endpoint::container_ports;
use crate::domain::{
    Container, ContainerRuntime, Endpoint, EndpointRouter, LaunchSpec, MANAGED_LABEL, Settings,
    StackConfig, StackOption,
};
use crate::error::{Error, Result};
use crate::infra::CliRuntime;
use crate::services::{ClientConfig, ObjectStorageProbe, Prober};
use reqwest::blocking::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A running emulator container and the settings it was launched with.
///
/// There is no `Drop` cleanup: every `Instance` must be handed to
/// [`Instance::close`] exactly once, on success and error paths alike, or the
/// container keeps running.
#[derive(Debug)]
pub struct Instance {
    config: StackConfig,
    runtime: Arc<dyn ContainerRuntime>,
    container: Container,
    router: Arc<EndpointRouter>,
    http_client: Client,
    prober: Prober,
}

impl Instance {
    /// Launches a new emulator on the auto-detected container runtime.
    pub fn new<I>(options: I) -> Result<Self>
    where
        I: IntoIterator<Item = StackOption>,
    {
        Self::with_runtime(Arc::new(CliRuntime::detect()), options)
    }

    /// Launches a new emulator on `runtime`.
    pub fn with_runtime<I>(runtime: Arc<dyn ContainerRuntime>, options: I) -> Result<Self>
    where
        I: IntoIterator<Item = StackOption>,
    {
        let mut settings = Settings::from_options(options)?;
        let directive = settings.service_directive();
        let config = settings.finalize();

        let http_client = Client::builder()
            .build()
            .map_err(|e| Error::provisioning("http client", e))?;

        runtime
            .ping()
            .map_err(|e| Error::provisioning("runtime", e))?;

        let env = [directive];
        let ports = container_ports();
        let spec = LaunchSpec {
            image: config.image(),
            env: &env,
            ports: &ports,
            labels: &[MANAGED_LABEL],
        };

        info!(image = config.image(), services = ?config.services(), "launching emulator");
        let container = runtime
            .run_container(&spec)
            .map_err(|e| Error::provisioning("launch", e))?;

        let published = match runtime.published_ports(&container) {
            Ok(published) => published,
            Err(err) => {
                // The caller never sees this container, so nobody else can remove it.
                if let Err(purge_err) = runtime.purge_container(&container) {
                    warn!(container = container.short_id(), error = %purge_err, "purge after failed port lookup failed");
                }
                return Err(Error::provisioning("ports", err));
            }
        };

        info!(
            container = container.short_id(),
            published = published.len(),
            "emulator launched"
        );

        let router = Arc::new(EndpointRouter::new(config.host(), published));

        Ok(Self {
            config,
            runtime,
            container,
            router,
            http_client,
            prober: Prober::default(),
        })
    }

    /// Overrides the readiness poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.prober = Prober::new(interval);
        self
    }

    /// Blocks until object storage answers or `max` elapses.
    ///
    /// A timeout leaves the container running; the caller still owns `close`.
    pub fn wait(&self, max: Duration) -> Result<()> {
        let mut probe = ObjectStorageProbe::from_config(&self.config())?;
        info!(url = probe.url(), budget = ?max, "waiting for emulator");
        self.prober.wait(&mut probe, max)
    }

    /// Client configuration pointing at this emulator.
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(
            self.config.credentials().clone(),
            self.config.region(),
            self.http_client.clone(),
            self.router.clone(),
        )
    }

    /// Shortcut for `config().resolve_endpoint(service)`.
    pub fn endpoint(&self, service: &str) -> Result<Endpoint> {
        self.router.resolve(service, self.config.region())
    }

    pub fn settings(&self) -> &StackConfig {
        &self.config
    }

    pub fn services(&self) -> &[String] {
        self.config.services()
    }

    pub fn region(&self) -> &str {
        self.config.region()
    }

    pub fn host(&self) -> &str {
        self.config.host()
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn runtime(&self) -> &Arc<dyn ContainerRuntime> {
        &self.runtime
    }

    /// Purges the container. Errors are returned, not retried.
    pub fn close(self) -> Result<()> {
        info!(container = self.container.short_id(), "purging emulator");
        self.runtime
            .purge_container(&self.container)
            .map_err(|source| Error::Teardown {
                container: self.container.id().to_string(),
                source,
            })
    }
}
