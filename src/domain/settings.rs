use crate::error::{Error, Result};
use url::Url;

/// Logical name of the object storage service. Readiness probing depends on it,
/// so it is always part of the enabled set.
pub const OBJECT_STORAGE_SERVICE: &str = "s3";

pub const DEFAULT_HOST: &str = "http://localhost";
pub const DEFAULT_REGION: &str = "us-east-1";
/// Pinned because later releases answer only on the edge port 4566 and no
/// longer listen on the per-service ports in `SERVICE_PORTS`, so readiness
/// checks against the `s3` port would never succeed.
pub const DEFAULT_IMAGE: &str = "localstack/localstack:0.10.9";
pub const DEFAULT_ACCESS_KEY: &str = "key";
pub const DEFAULT_SECRET_KEY: &str = "secret";
pub const DEFAULT_SESSION_TOKEN: &str = "session";

/// Environment variable the emulator reads its enabled services from.
pub const SERVICES_ENV: &str = "SERVICES";

/// Static credential triple handed to clients.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
    pub session_token: String,
}

impl Credentials {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            session_token: session_token.into(),
        }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new(DEFAULT_ACCESS_KEY, DEFAULT_SECRET_KEY, DEFAULT_SESSION_TOKEN)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .finish()
    }
}

/// A single construction option. Options are applied in order; later ones
/// overwrite earlier ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackOption {
    Host(String),
    Credentials(Credentials),
    Region(String),
    /// Replaces, never merges with, the current list.
    Services(Vec<String>),
    Image(String),
}

pub fn with_host(host: impl Into<String>) -> StackOption {
    StackOption::Host(host.into())
}

pub fn with_credentials(
    access_key: impl Into<String>,
    secret_key: impl Into<String>,
    session_token: impl Into<String>,
) -> StackOption {
    StackOption::Credentials(Credentials::new(access_key, secret_key, session_token))
}

pub fn with_region(region: impl Into<String>) -> StackOption {
    StackOption::Region(region.into())
}

pub fn with_services<I, S>(services: I) -> StackOption
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    StackOption::Services(services.into_iter().map(Into::into).collect())
}

pub fn with_image(image: impl Into<String>) -> StackOption {
    StackOption::Image(image.into())
}

impl StackOption {
    pub fn apply(self, draft: &mut Settings) -> Result<()> {
        match self {
            Self::Host(host) => {
                validate_host(&host)?;
                draft.host = Some(host);
            }
            Self::Credentials(credentials) => {
                if credentials.access_key.is_empty() || credentials.secret_key.is_empty() {
                    return Err(Error::Configuration(
                        "access key and secret key must not be empty".into(),
                    ));
                }
                draft.credentials = Some(credentials);
            }
            Self::Region(region) => {
                if region.is_empty()
                    || !region.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
                {
                    return Err(Error::Configuration(format!("invalid region '{region}'")));
                }
                draft.region = Some(region);
            }
            Self::Services(services) => {
                for name in &services {
                    if name.is_empty() || name.contains(',') || name.chars().any(char::is_whitespace)
                    {
                        return Err(Error::Configuration(format!(
                            "invalid service name '{name}'"
                        )));
                    }
                }
                draft.services = services;
            }
            Self::Image(image) => {
                if image.trim().is_empty() {
                    return Err(Error::Configuration("image must not be empty".into()));
                }
                draft.image = Some(image);
            }
        }
        Ok(())
    }
}

fn validate_host(host: &str) -> Result<()> {
    let url = Url::parse(host)
        .map_err(|e| Error::Configuration(format!("host '{host}' is not a URL: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Configuration(format!(
            "host '{host}' must use http or https"
        )));
    }
    // Url drops a scheme-default port, so ":80" only shows up in the raw string.
    if url.port().is_some() || has_explicit_port(host) {
        return Err(Error::Configuration(format!(
            "host '{host}' must be a bare scheme://host without a port"
        )));
    }
    // Url normalizes a bare authority to path "/", so reject a trailing slash
    // on the raw string rather than on the parsed path.
    if url.path() != "/" || host.ends_with('/') || url.query().is_some() {
        return Err(Error::Configuration(format!(
            "host '{host}' must not carry a path or query"
        )));
    }
    Ok(())
}

/// True when the raw authority ends in `:<digits>`. Bracketed IPv6 literals
/// are only inspected after the closing `]`.
fn has_explicit_port(host: &str) -> bool {
    let rest = host.split_once("://").map_or(host, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let tail = authority.rsplit_once(']').map_or(authority, |(_, tail)| tail);

    tail.rsplit_once(':')
        .is_some_and(|(_, port)| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
}

/// Draft state while options are being applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    host: Option<String>,
    credentials: Option<Credentials>,
    region: Option<String>,
    services: Vec<String>,
    image: Option<String>,
}

impl Settings {
    pub fn from_options<I>(options: I) -> Result<Self>
    where
        I: IntoIterator<Item = StackOption>,
    {
        let mut draft = Self::default();
        for option in options {
            option.apply(&mut draft)?;
        }
        Ok(draft)
    }

    /// Appends object storage if the caller left it out. Duplicates already in
    /// the list are kept as-is.
    pub fn ensure_object_storage(&mut self) {
        if !self.services.iter().any(|s| s == OBJECT_STORAGE_SERVICE) {
            self.services.push(OBJECT_STORAGE_SERVICE.to_string());
        }
    }

    /// `SERVICES=<csv>` directive for the emulator, with object storage included.
    pub fn service_directive(&mut self) -> String {
        self.ensure_object_storage();
        format!("{SERVICES_ENV}={}", self.services.join(","))
    }

    /// Applies the fallback values to every unset field.
    pub fn finalize(mut self) -> StackConfig {
        self.ensure_object_storage();
        StackConfig {
            host: self.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            credentials: self.credentials.unwrap_or_default(),
            region: self.region.unwrap_or_else(|| DEFAULT_REGION.to_string()),
            services: self.services,
            image: self.image.unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
        }
    }
}

/// Finalized settings. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackConfig {
    host: String,
    credentials: Credentials,
    region: String,
    services: Vec<String>,
    image: String,
}

impl StackConfig {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn services(&self) -> &[String] {
        &self.services
    }

    pub fn image(&self) -> &str {
        &self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_no_options() {
        let config = Settings::from_options([]).unwrap().finalize();
        assert_eq!(config.host(), DEFAULT_HOST);
        assert_eq!(config.region(), DEFAULT_REGION);
        assert_eq!(config.image(), DEFAULT_IMAGE);
        assert_eq!(config.credentials(), &Credentials::default());
        assert_eq!(config.services(), &["s3".to_string()]);
    }

    #[test]
    fn test_object_storage_appended_after_explicit_services() {
        let mut settings = Settings::from_options([with_services(["sqs"])]).unwrap();
        assert_eq!(settings.service_directive(), "SERVICES=sqs,s3");

        let config = settings.finalize();
        assert_eq!(config.services(), &["sqs".to_string(), "s3".to_string()]);
    }

    #[test]
    fn test_object_storage_not_duplicated_when_present() {
        let mut settings = Settings::from_options([with_services(["s3", "sns"])]).unwrap();
        assert_eq!(settings.service_directive(), "SERVICES=s3,sns");
    }

    #[test]
    fn test_caller_duplicates_are_tolerated() {
        let mut settings = Settings::from_options([with_services(["sqs", "sqs"])]).unwrap();
        assert_eq!(settings.service_directive(), "SERVICES=sqs,sqs,s3");
    }

    #[test]
    fn test_last_write_wins() {
        let config = Settings::from_options([
            with_region("eu-west-1"),
            with_services(["sqs"]),
            with_region("ap-south-1"),
            with_services(["dynamodb"]),
        ])
        .unwrap()
        .finalize();

        assert_eq!(config.region(), "ap-south-1");
        assert_eq!(
            config.services(),
            &["dynamodb".to_string(), "s3".to_string()]
        );
    }

    #[test]
    fn test_credentials_set_together() {
        let config = Settings::from_options([with_credentials("AKIA", "shh", "")])
            .unwrap()
            .finalize();
        assert_eq!(config.credentials().access_key, "AKIA");
        assert_eq!(config.credentials().secret_key, "shh");
        // An explicit empty token is kept, not replaced by the sentinel.
        assert_eq!(config.credentials().session_token, "");
    }

    #[test]
    fn test_default_image_is_pinned() {
        let (repository, tag) = DEFAULT_IMAGE.split_once(':').expect("tagged image");
        assert_eq!(repository, "localstack/localstack");
        assert!(tag.starts_with("0.10."), "{tag} may not serve per-service ports");
    }

    #[test]
    fn test_empty_secret_rejected() {
        let err = Settings::from_options([with_credentials("AKIA", "", "tok")]).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_host_validation() {
        assert!(Settings::from_options([with_host("http://127.0.0.1")]).is_ok());
        assert!(Settings::from_options([with_host("https://docker.internal")]).is_ok());
        assert!(Settings::from_options([with_host("http://[::1]")]).is_ok());

        for mixed in ["http://LOCALHOST", "HTTP://localhost", "http://Docker.Internal"] {
            let config = Settings::from_options([with_host(mixed)])
                .unwrap_or_else(|e| panic!("{mixed} rejected: {e}"))
                .finalize();
            assert_eq!(config.host(), mixed);
        }

        for bad in [
            "localhost",
            "ftp://localhost",
            "http://localhost:4566",
            "http://localhost:80",
            "HTTP://LOCALHOST:80",
            "https://Docker.Internal:443",
            "http://[::1]:80",
            "http://localhost/",
            "http://localhost/api",
        ] {
            let err = Settings::from_options([with_host(bad)]).unwrap_err();
            assert!(matches!(err, Error::Configuration(_)), "{bad} accepted");
        }
    }

    #[test]
    fn test_invalid_service_name_rejected() {
        for bad in ["", "s3,sqs", "sq s"] {
            let err = Settings::from_options([with_services([bad])]).unwrap_err();
            assert!(matches!(err, Error::Configuration(_)), "{bad:?} accepted");
        }
    }

    #[test]
    fn test_invalid_region_rejected() {
        assert!(Settings::from_options([with_region("")]).is_err());
        assert!(Settings::from_options([with_region("us east")]).is_err());
    }

    #[test]
    fn test_error_aborts_remaining_options() {
        let result = Settings::from_options([with_image(" "), with_region("eu-west-1")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let shown = format!("{:?}", Credentials::new("AKIA", "topsecret", "tok"));
        assert!(shown.contains("AKIA"));
        assert!(!shown.contains("topsecret"));
        assert!(!shown.contains("tok\""));
    }
}
