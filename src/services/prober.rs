use crate::domain::OBJECT_STORAGE_SERVICE;
use crate::error::{Error, Result};
use crate::services::ClientConfig;
use anyhow::bail;
use reqwest::blocking::Client;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Upper bound for a single probe request, so a half-open socket cannot eat
/// the whole budget.
const PROBE_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// A side-effect-free readiness check.
pub trait Probe {
    fn probe(&mut self) -> anyhow::Result<()>;
}

impl<F> Probe for F
where
    F: FnMut() -> anyhow::Result<()>,
{
    fn probe(&mut self) -> anyhow::Result<()> {
        self()
    }
}

/// Lists buckets on the emulated object storage endpoint.
#[derive(Debug, Clone)]
pub struct ObjectStorageProbe {
    client: Client,
    url: String,
}

impl ObjectStorageProbe {
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let endpoint = config.resolve_endpoint(OBJECT_STORAGE_SERVICE)?;
        Ok(Self {
            client: config.http_client().clone(),
            url: format!("{}/", endpoint.url),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Probe for ObjectStorageProbe {
    fn probe(&mut self) -> anyhow::Result<()> {
        let response = self
            .client
            .get(&self.url)
            .timeout(PROBE_REQUEST_TIMEOUT)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            bail!("object storage answered {status}");
        }
        Ok(())
    }
}

/// Fixed-interval poll loop with a caller-owned budget.
#[derive(Debug, Clone, Copy)]
pub struct Prober {
    interval: Duration,
}

impl Prober {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Probes until success or until `max` has elapsed after a failure.
    ///
    /// Every probe failure is treated as transient. A zero budget gives up on
    /// the first failure without sleeping.
    pub fn wait<P: Probe + ?Sized>(&self, probe: &mut P, max: Duration) -> Result<()> {
        let start = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;

            match probe.probe() {
                Ok(()) => {
                    info!(attempts, elapsed = ?start.elapsed(), "emulator ready");
                    return Ok(());
                }
                Err(err) => {
                    let waited = start.elapsed();
                    if waited >= max {
                        return Err(Error::ReadinessTimeout { waited, attempts });
                    }
                    debug!(attempt = attempts, error = %err, "emulator not ready yet");
                    thread::sleep(self.interval);
                }
            }
        }
    }
}

impl Default for Prober {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    const FAST: Duration = Duration::from_millis(10);

    #[test]
    fn test_success_on_first_attempt() {
        let mut calls = 0;
        let mut probe = || -> anyhow::Result<()> {
            calls += 1;
            Ok(())
        };

        Prober::new(FAST).wait(&mut probe, Duration::ZERO).unwrap();
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_zero_budget_never_sleeps() {
        let mut probe = || -> anyhow::Result<()> { Err(anyhow!("connection refused")) };

        let start = Instant::now();
        let err = Prober::new(Duration::from_secs(5))
            .wait(&mut probe, Duration::ZERO)
            .unwrap_err();

        assert!(matches!(err, Error::ReadinessTimeout { attempts: 1, .. }));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_always_failing_probe_respects_budget() {
        let budget = Duration::from_millis(100);
        let mut calls: u32 = 0;
        let mut probe = || -> anyhow::Result<()> {
            calls += 1;
            Err(anyhow!("not yet"))
        };

        let start = Instant::now();
        let err = Prober::new(FAST).wait(&mut probe, budget).unwrap_err();

        assert!(start.elapsed() >= budget);
        match err {
            Error::ReadinessTimeout { waited, attempts } => {
                assert!(waited >= budget);
                assert_eq!(attempts, calls);
            }
            other => panic!("unexpected error {other}"),
        }
        // ceil(100 / 10) + 1
        assert!(calls <= 11, "too many attempts: {calls}");
    }

    #[test]
    fn test_succeeds_on_nth_attempt() {
        let mut calls = 0;
        let mut probe = || -> anyhow::Result<()> {
            calls += 1;
            if calls < 4 { Err(anyhow!("starting")) } else { Ok(()) }
        };

        let start = Instant::now();
        Prober::new(FAST)
            .wait(&mut probe, Duration::from_secs(5))
            .unwrap();

        assert_eq!(calls, 4);
        assert!(start.elapsed() >= FAST * 3);
    }

    #[test]
    fn test_default_interval() {
        assert_eq!(Prober::default().interval(), Duration::from_millis(500));
    }
}
