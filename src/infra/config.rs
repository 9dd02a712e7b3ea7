use crate::domain::{StackOption, settings};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_NAME: &str = "stackbox.toml";
pub const DEFAULT_WAIT_SECS: u64 = 20;

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RuntimeSection {
    pub binary: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CredentialsSection {
    pub access_key: String,
    pub secret_key: String,
    #[serde(default)]
    pub session_token: String,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StackSection {
    pub host: Option<String>,
    pub region: Option<String>,
    pub image: Option<String>,
    pub services: Option<Vec<String>>,
    pub credentials: Option<CredentialsSection>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WaitSection {
    pub timeout_secs: Option<u64>,
}

/// Contents of `stackbox.toml`.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StackFile {
    #[serde(default)]
    pub runtime: RuntimeSection,
    #[serde(default)]
    pub stack: StackSection,
    #[serde(default)]
    pub wait: WaitSection,
}

impl StackFile {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("parsing stackbox.toml")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        Self::parse(&content).with_context(|| format!("in {:?}", path))
    }

    /// Merges another file into self. Values present in `other` win.
    pub fn merge(&mut self, other: StackFile) {
        if let Some(binary) = other.runtime.binary {
            self.runtime.binary = Some(binary);
        }
        if let Some(host) = other.stack.host {
            self.stack.host = Some(host);
        }
        if let Some(region) = other.stack.region {
            self.stack.region = Some(region);
        }
        if let Some(image) = other.stack.image {
            self.stack.image = Some(image);
        }
        if let Some(services) = other.stack.services {
            self.stack.services = Some(services);
        }
        if let Some(credentials) = other.stack.credentials {
            self.stack.credentials = Some(credentials);
        }
        if let Some(timeout) = other.wait.timeout_secs {
            self.wait.timeout_secs = Some(timeout);
        }
    }

    /// Options in a fixed order. Validation happens when they are applied.
    pub fn to_options(&self) -> Vec<StackOption> {
        let mut options = Vec::new();

        if let Some(host) = &self.stack.host {
            options.push(settings::with_host(host.clone()));
        }
        if let Some(creds) = &self.stack.credentials {
            options.push(settings::with_credentials(
                creds.access_key.clone(),
                creds.secret_key.clone(),
                creds.session_token.clone(),
            ));
        }
        if let Some(region) = &self.stack.region {
            options.push(settings::with_region(region.clone()));
        }
        if let Some(services) = &self.stack.services {
            options.push(settings::with_services(services.iter().cloned()));
        }
        if let Some(image) = &self.stack.image {
            options.push(settings::with_image(image.clone()));
        }

        options
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait.timeout_secs.unwrap_or(DEFAULT_WAIT_SECS))
    }
}

/// `~/.config/stackbox/stackbox.toml`, shared by every project of the user.
pub fn global_config_path() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
        .join(".config/stackbox")
        .join(DEFAULT_CONFIG_NAME)
}

pub fn local_config_path() -> PathBuf {
    PathBuf::from("./").join(DEFAULT_CONFIG_NAME)
}

/// Layers the global file, then `./stackbox.toml`, then `explicit`. Missing
/// global or local files are skipped; a missing explicit file is an error.
pub fn load_stack_file(explicit: Option<&Path>) -> Result<StackFile> {
    load_layered(&global_config_path(), &local_config_path(), explicit)
}

fn load_layered(global: &Path, local: &Path, explicit: Option<&Path>) -> Result<StackFile> {
    let mut file = StackFile::default();

    for path in [global, local] {
        if path.exists() {
            file.merge(StackFile::load(path)?);
        }
    }

    if let Some(path) = explicit {
        file.merge(StackFile::load(path)?);
    }

    Ok(file)
}
