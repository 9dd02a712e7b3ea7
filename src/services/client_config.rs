use crate::domain::{Credentials, Endpoint, EndpointRouter};
use crate::error::Result;
use reqwest::blocking::Client;
use std::sync::Arc;

/// Everything a downstream API client needs to talk to the emulator.
///
/// A snapshot: building one does no I/O, and every field is fixed once built.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    credentials: Credentials,
    region: String,
    http_client: Client,
    endpoint_resolver: Arc<EndpointRouter>,
}

impl ClientConfig {
    pub fn new(
        credentials: Credentials,
        region: impl Into<String>,
        http_client: Client,
        endpoint_resolver: Arc<EndpointRouter>,
    ) -> Self {
        Self {
            credentials,
            region: region.into(),
            http_client,
            endpoint_resolver,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub fn endpoint_resolver(&self) -> &Arc<EndpointRouter> {
        &self.endpoint_resolver
    }

    /// Resolves `service` for the configured region.
    pub fn resolve_endpoint(&self, service: &str) -> Result<Endpoint> {
        self.endpoint_resolver.resolve(service, &self.region)
    }

    /// Standard SDK environment variables for child processes.
    pub fn env_vars(&self) -> Vec<(&'static str, String)> {
        let mut vars = vec![
            ("AWS_ACCESS_KEY_ID", self.credentials.access_key.clone()),
            ("AWS_SECRET_ACCESS_KEY", self.credentials.secret_key.clone()),
            ("AWS_REGION", self.region.clone()),
            ("AWS_DEFAULT_REGION", self.region.clone()),
        ];
        if !self.credentials.session_token.is_empty() {
            vars.push(("AWS_SESSION_TOKEN", self.credentials.session_token.clone()));
        }
        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PortTable;
    use crate::domain::endpoint::SIGNING_REGION_PLACEHOLDER;

    fn config(credentials: Credentials) -> ClientConfig {
        let ports: PortTable = [(4576, 41000)].into_iter().collect();
        let router = Arc::new(EndpointRouter::new("http://localhost", ports));
        ClientConfig::new(credentials, "eu-west-1", Client::new(), router)
    }

    #[test]
    fn test_resolve_uses_configured_region() {
        let config = config(Credentials::default());

        let sqs = config.resolve_endpoint("sqs").unwrap();
        assert_eq!(sqs.url, "http://localhost:41000");
        assert_eq!(sqs.signing_region, SIGNING_REGION_PLACEHOLDER);

        let athena = config.resolve_endpoint("athena").unwrap();
        assert_eq!(athena.url, "https://athena.eu-west-1.amazonaws.com");
    }

    #[test]
    fn test_env_vars() {
        let vars = config(Credentials::default()).env_vars();
        assert!(vars.contains(&("AWS_ACCESS_KEY_ID", "key".to_string())));
        assert!(vars.contains(&("AWS_REGION", "eu-west-1".to_string())));
        assert!(vars.contains(&("AWS_SESSION_TOKEN", "session".to_string())));
    }

    #[test]
    fn test_env_vars_skip_empty_session() {
        let vars = config(Credentials::new("a", "b", "")).env_vars();
        assert!(vars.iter().all(|(name, _)| *name != "AWS_SESSION_TOKEN"));
    }
}
