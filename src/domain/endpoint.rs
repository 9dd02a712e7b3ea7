use super::PortTable;
use crate::error::{Error, Result};

/// Signing region handed out for emulator endpoints. The emulator does not
/// validate it, so it is deliberately distinct from the configured region.
pub const SIGNING_REGION_PLACEHOLDER: &str = "test-signing-region";

/// Logical service name to emulator container port.
///
/// `es` and `elasticsearch` point at different ports. Both entries are kept as
/// the emulator exposes them; clients must pass the exact name their SDK uses.
/// Step Functions (4585) has no entry and resolves through the fallback.
pub static SERVICE_PORTS: &[(&str, u16)] = &[
    ("apigateway", 4567),
    ("kinesis", 4568),
    ("dynamodb", 4569),
    ("streams.dynamodb", 4570),
    ("elasticsearch", 4571),
    ("s3", 4572),
    ("firehose", 4573),
    ("lambda", 4574),
    ("sns", 4575),
    ("sqs", 4576),
    ("redshift", 4577),
    ("es", 4578),
    ("ses", 4579),
    ("route53", 4580),
    ("cloudformation", 4581),
    ("cloudwatch", 4582),
    ("ssm", 4583),
    ("secretsmanager", 4584),
    ("logs", 4586),
    ("events", 4587),
    ("sts", 4592),
    ("iam", 4593),
    ("ec2", 4597),
];

/// Container port the emulator serves `service` on, if it is routed locally.
pub fn container_port(service: &str) -> Option<u16> {
    SERVICE_PORTS
        .iter()
        .find(|(name, _)| *name == service)
        .map(|(_, port)| *port)
}

/// Every container port in the table, in table order.
pub fn container_ports() -> Vec<u16> {
    SERVICE_PORTS.iter().map(|(_, port)| *port).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub signing_region: String,
}

/// Resolver used for services the table does not route.
pub type FallbackResolver = fn(service: &str, region: &str) -> Result<Endpoint>;

const GLOBAL_SERVICES: &[&str] = &["iam", "route53", "cloudfront"];

/// Public endpoints for services the emulator table does not cover.
pub fn default_resolver(service: &str, region: &str) -> Result<Endpoint> {
    if service.is_empty() {
        return Err(Error::Resolve("service name is empty".into()));
    }
    if region.is_empty() {
        return Err(Error::Resolve(format!("no region given for {service}")));
    }

    let china = region.starts_with("cn-");
    let suffix = if china { "amazonaws.com.cn" } else { "amazonaws.com" };

    if GLOBAL_SERVICES.contains(&service) {
        let signing_region = if china { "cn-north-1" } else { "us-east-1" };
        return Ok(Endpoint {
            url: format!("https://{service}.{suffix}"),
            signing_region: signing_region.to_string(),
        });
    }

    if service == "s3" && region == "us-east-1" {
        return Ok(Endpoint {
            url: format!("https://s3.{suffix}"),
            signing_region: region.to_string(),
        });
    }

    Ok(Endpoint {
        url: format!("https://{service}.{region}.{suffix}"),
        signing_region: region.to_string(),
    })
}

/// Maps logical service names to endpoints on a running emulator.
///
/// Built only after launch, from the container's finalized port table.
#[derive(Debug, Clone)]
pub struct EndpointRouter {
    host: String,
    ports: PortTable,
    fallback: FallbackResolver,
}

impl EndpointRouter {
    pub fn new(host: impl Into<String>, ports: PortTable) -> Self {
        Self {
            host: host.into(),
            ports,
            fallback: default_resolver,
        }
    }

    pub fn with_fallback(mut self, fallback: FallbackResolver) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn resolve(&self, service: &str, region: &str) -> Result<Endpoint> {
        let Some(port) = container_port(service) else {
            return (self.fallback)(service, region);
        };

        let host_port = self
            .ports
            .host_port(port)
            .ok_or_else(|| Error::UnpublishedPort {
                service: service.to_string(),
                port,
            })?;

        Ok(Endpoint {
            url: format!("{}:{host_port}", self.host),
            signing_region: SIGNING_REGION_PLACEHOLDER.to_string(),
        })
    }
}
