use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the emulator lifecycle.
///
/// Every variant is returned to the caller; none are logged and dropped.
/// Only `Configuration` is guaranteed to leave no container behind, so a
/// caller holding an [`Instance`](crate::Instance) must still call `close`
/// after a `ReadinessTimeout`.
#[derive(Debug, Error)]
pub enum Error {
    /// An option failed validation. Raised before any container exists.
    #[error("invalid option: {0}")]
    Configuration(String),

    /// The runtime could not be reached or the emulator could not be launched.
    #[error("failed to provision emulator ({stage})")]
    Provisioning {
        stage: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// Object storage never answered within the caller's budget.
    #[error("emulator failed to respond in time (waited {waited:?}, {attempts} attempt(s))")]
    ReadinessTimeout { waited: Duration, attempts: u32 },

    /// Removing the container failed.
    #[error("failed to purge container {container}")]
    Teardown {
        container: String,
        #[source]
        source: anyhow::Error,
    },

    /// A routed service whose container port has no published host port.
    #[error("service {service} routes to container port {port}, which is not published")]
    UnpublishedPort { service: String, port: u16 },

    /// The fallback resolver could not produce an endpoint.
    #[error("cannot resolve endpoint: {0}")]
    Resolve(String),
}

impl Error {
    pub(crate) fn provisioning(stage: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Provisioning {
            stage,
            source: source.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ReadinessTimeout { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_mentions_attempts() {
        let err = Error::ReadinessTimeout {
            waited: Duration::from_secs(2),
            attempts: 5,
        };
        assert!(err.is_timeout());
        assert!(err.to_string().contains("5 attempt(s)"));
    }

    #[test]
    fn test_provisioning_keeps_source() {
        let err = Error::provisioning("launch", anyhow::anyhow!("daemon down"));
        assert!(!err.is_timeout());
        let source = std::error::Error::source(&err).expect("source");
        assert_eq!(source.to_string(), "daemon down");
    }
}
