use crate::domain::{Container, ContainerRuntime, LaunchSpec, PortTable};
use anyhow::{Context, Result, bail};
use std::ffi::OsStr;
use std::process::{Command, Output, Stdio};
use tracing::debug;

/// Overrides runtime auto-detection (`docker` or `podman`).
pub const RUNTIME_ENV: &str = "STACKBOX_RUNTIME";

const CANDIDATES: &[&str] = &["docker", "podman"];

/// Drives a Docker-compatible CLI (`docker` or `podman`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliRuntime {
    binary: String,
}

impl CliRuntime {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn docker() -> Self {
        Self::new("docker")
    }

    pub fn podman() -> Self {
        Self::new("podman")
    }

    /// Picks `$STACKBOX_RUNTIME` if set, else the first installed candidate,
    /// else docker so the error later names a familiar binary.
    pub fn detect() -> Self {
        if let Ok(binary) = std::env::var(RUNTIME_ENV) {
            if !binary.trim().is_empty() {
                return Self::new(binary.trim());
            }
        }

        CANDIDATES
            .iter()
            .find(|candidate| is_installed(candidate))
            .map(|candidate| Self::new(*candidate))
            .unwrap_or_else(Self::docker)
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn run_args(spec: &LaunchSpec) -> Vec<String> {
        let mut args: Vec<String> = vec!["run".into(), "-d".into()];

        for label in spec.labels {
            args.push("--label".into());
            args.push((*label).into());
        }

        for env in spec.env {
            args.push("-e".into());
            args.push(env.clone());
        }

        for port in spec.ports {
            args.push("-p".into());
            args.push(port.to_string());
        }

        args.push(spec.image.into());
        args
    }

    fn output<I, S>(&self, args: I, context: &str) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("{context} ({} not runnable)", self.binary))
    }

    fn checked<I, S>(&self, args: I, context: &str) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = self.output(args, context)?;
        ensure_success(&self.binary, &output, context)?;
        Ok(output)
    }
}

impl Default for CliRuntime {
    fn default() -> Self {
        Self::detect()
    }
}

impl ContainerRuntime for CliRuntime {
    fn ping(&self) -> Result<()> {
        self.checked(["version"], "contacting container runtime")
            .map(|_| ())
    }

    fn run_container(&self, spec: &LaunchSpec) -> Result<Container> {
        let args = Self::run_args(spec);
        debug!(binary = %self.binary, ?args, "launching container");

        let output = self.checked(&args, &format!("launching {}", spec.image))?;
        let id = String::from_utf8_lossy(&output.stdout)
            .lines()
            .last()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        if id.is_empty() {
            bail!("{} run printed no container id", self.binary);
        }

        Ok(Container::new(id))
    }

    fn published_ports(&self, container: &Container) -> Result<PortTable> {
        let output = self.checked(
            ["port", container.id()],
            &format!("reading published ports of {}", container.short_id()),
        )?;
        parse_port_listing(&String::from_utf8_lossy(&output.stdout))
    }

    fn purge_container(&self, container: &Container) -> Result<()> {
        self.checked(
            ["rm", "-f", "-v", container.id()],
            &format!("removing container {}", container.short_id()),
        )
        .map(|_| ())
    }
}

/// Parses `docker port <id>` output:
///
/// ```text
/// 4572/tcp -> 0.0.0.0:32768
/// 4572/tcp -> [::]:32768
/// ```
///
/// Non-TCP bindings are skipped.
pub fn parse_port_listing(listing: &str) -> Result<PortTable> {
    let mut table = PortTable::new();

    for line in listing.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (container_side, host_side) = line
            .split_once(" -> ")
            .with_context(|| format!("unexpected port line '{line}'"))?;

        let (port, proto) = container_side
            .split_once('/')
            .unwrap_or((container_side, "tcp"));
        if proto != "tcp" {
            continue;
        }

        let container_port: u16 = port
            .parse()
            .with_context(|| format!("bad container port in '{line}'"))?;
        let host_port: u16 = host_side
            .rsplit_once(':')
            .map(|(_, p)| p)
            .with_context(|| format!("no host port in '{line}'"))?
            .parse()
            .with_context(|| format!("bad host port in '{line}'"))?;

        table.insert(container_port, host_port);
    }

    Ok(table)
}

fn is_installed(binary: &str) -> bool {
    Command::new(binary)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn ensure_success(binary: &str, output: &Output, context: &str) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    bail!(
        "{binary} returned {} while {context}: {}",
        output.status,
        stderr.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port_listing() {
        let listing = "\
4572/tcp -> 0.0.0.0:32768
4572/tcp -> [::]:32768
4576/tcp -> 0.0.0.0:32770
4576/udp -> 0.0.0.0:40000
";
        let table = parse_port_listing(listing).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.host_port(4572), Some(32768));
        assert_eq!(table.host_port(4576), Some(32770));
    }

    #[test]
    fn test_parse_empty_listing() {
        assert!(parse_port_listing("\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_port_listing("4572/tcp 32768").is_err());
        assert!(parse_port_listing("abc/tcp -> 0.0.0.0:1").is_err());
        assert!(parse_port_listing("4572/tcp -> 0.0.0.0").is_err());
    }

    #[test]
    fn test_run_args() {
        let env = vec!["SERVICES=sqs,s3".to_string()];
        let spec = LaunchSpec {
            image: "localstack/localstack",
            env: &env,
            ports: &[4572, 4576],
            labels: &["stackbox.managed=true"],
        };

        assert_eq!(
            CliRuntime::run_args(&spec),
            vec![
                "run",
                "-d",
                "--label",
                "stackbox.managed=true",
                "-e",
                "SERVICES=sqs,s3",
                "-p",
                "4572",
                "-p",
                "4576",
                "localstack/localstack",
            ]
        );
    }

    #[test]
    fn test_missing_binary_is_error() {
        let runtime = CliRuntime::new("stackbox-no-such-runtime");
        assert!(runtime.ping().is_err());
        assert!(runtime.purge_container(&Container::new("abc")).is_err());
    }
}
