//! Container runtime backed by the `docker` command-line client.

use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use localstack_common::config::HarnessConfig;
use localstack_common::error::{HarnessError, Result};
use localstack_common::types::{ContainerId, generate_container_name};
use tokio::process::Command;

use super::ContainerRuntime;
use crate::logs::LogOutput;
use crate::resource::ResourceConfig;

/// Drives containers through the docker CLI.
///
/// Every invocation is bounded by the configured command timeout and the
/// child process is killed if the calling future is dropped.
#[derive(Debug, Clone)]
pub struct DockerCliRuntime {
    config: HarnessConfig,
}

impl DockerCliRuntime {
    /// Creates a runtime using the given settings.
    #[must_use]
    pub const fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    /// Returns the settings in use.
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Returns the timeout applied to a docker invocation. Pulls get the
    /// pull timeout, every other subcommand the command timeout.
    #[must_use]
    pub fn timeout_for(&self, args: &[String]) -> Duration {
        match args.first().map(String::as_str) {
            Some("pull") => self.config.pull_timeout(),
            _ => self.config.command_timeout(),
        }
    }

    async fn ensure_image(&self, image: &str) -> Result<()> {
        let inspect = [
            "image".to_string(),
            "inspect".into(),
            "--format".into(),
            "{{.Id}}".into(),
            image.to_string(),
        ];
        match self.run(&inspect, "docker image inspect").await {
            Ok(_) => {
                tracing::debug!(image, "image present locally");
                Ok(())
            }
            Err(HarnessError::Command { .. }) => {
                tracing::info!(image, timeout = ?self.config.pull_timeout(), "pulling image");
                let _ = self.run(&pull_args(image), "docker pull").await?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn run(&self, args: &[String], description: &str) -> Result<Output> {
        let timeout = self.timeout_for(args);
        let mut command = Command::new(&self.config.docker_binary);
        let _ = command.args(args).stdin(Stdio::null()).kill_on_drop(true);

        tracing::debug!(command = description, ?args, "running docker command");
        let output = match tokio::time::timeout(timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(HarnessError::Spawn {
                    command: description.to_owned(),
                    source,
                });
            }
            Err(_) => {
                return Err(HarnessError::CommandTimeout {
                    command: description.to_owned(),
                    timeout,
                });
            }
        };

        if output.status.success() {
            Ok(output)
        } else {
            Err(HarnessError::Command {
                command: description.to_owned(),
                message: failure_message(&output),
            })
        }
    }
}

#[async_trait]
impl ContainerRuntime for DockerCliRuntime {
    async fn create(&self, config: &ResourceConfig) -> Result<ContainerId> {
        let args = create_args(config)?;
        if let Some(image) = args.last() {
            self.ensure_image(image).await?;
        }
        let output = self.run(&args, "docker create").await?;
        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if id.is_empty() {
            return Err(HarnessError::Command {
                command: "docker create".into(),
                message: "no container id returned".into(),
            });
        }
        tracing::info!(id = %id, image = config.image().unwrap_or_default(), "container created");
        Ok(ContainerId::new(id))
    }

    async fn start(&self, id: &ContainerId) -> Result<()> {
        let _ = self
            .run(&["start".into(), id.to_string()], "docker start")
            .await?;
        tracing::info!(id = %id, "container started");
        Ok(())
    }

    async fn stop(&self, id: &ContainerId) -> Result<()> {
        let _ = self
            .run(&["stop".into(), id.to_string()], "docker stop")
            .await?;
        tracing::info!(id = %id, "container stopped");
        Ok(())
    }

    async fn remove(&self, id: &ContainerId) -> Result<()> {
        let args = ["rm".into(), "--force".into(), "--volumes".into(), id.to_string()];
        match self.run(&args, "docker rm").await {
            Ok(_) => {
                tracing::info!(id = %id, "container removed");
                Ok(())
            }
            Err(HarnessError::Command { message, .. }) if is_missing_container(&message) => {
                tracing::debug!(id = %id, "container already gone");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn logs(&self, id: &ContainerId) -> Result<LogOutput> {
        let output = self
            .run(&["logs".into(), id.to_string()], "docker logs")
            .await?;
        Ok(LogOutput::from_bytes(&output.stdout, &output.stderr))
    }

    async fn mapped_port(&self, id: &ContainerId, container_port: u16) -> Result<u16> {
        let args = ["port".into(), id.to_string(), format!("{container_port}/tcp")];
        let output = self.run(&args, "docker port").await?;
        parse_port_output(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            HarnessError::NotFound {
                kind: "port mapping",
                id: format!("{id}:{container_port}"),
            }
        })
    }

    fn host(&self) -> String {
        let docker_host = std::env::var("DOCKER_HOST").ok();
        resolve_host(self.config.host_override.as_deref(), docker_host.as_deref())
    }

    fn is_available(&self) -> bool {
        which::which(&self.config.docker_binary).is_ok()
    }
}

/// Builds the `docker create` argument list for a configuration.
///
/// # Errors
///
/// Returns an error if the configuration has no image.
pub fn create_args(config: &ResourceConfig) -> Result<Vec<String>> {
    let image = config
        .image()
        .filter(|image| !image.trim().is_empty())
        .ok_or_else(|| HarnessError::invalid("an image reference is required"))?;

    let name = config
        .name()
        .map_or_else(generate_container_name, str::to_string);
    let mut args = vec!["create".to_string(), "--name".to_string(), name];

    for (key, value) in config.labels() {
        args.push("--label".into());
        args.push(format!("{key}={value}"));
    }
    for (key, value) in config.environment() {
        args.push("--env".into());
        args.push(format!("{key}={value}"));
    }
    for binding in config.port_bindings() {
        args.push("--publish".into());
        args.push(binding.publish_arg());
    }
    args.push(image.to_string());
    Ok(args)
}

/// Builds the `docker pull` argument list for an image.
#[must_use]
pub fn pull_args(image: &str) -> Vec<String> {
    vec!["pull".to_string(), image.to_string()]
}

/// Extracts the host port from `docker port` output.
///
/// Output lists one `address:port` per line, e.g. `0.0.0.0:49153` and
/// `[::]:49153`; the first parsable port wins.
#[must_use]
pub fn parse_port_output(stdout: &str) -> Option<u16> {
    stdout
        .lines()
        .filter_map(|line| line.trim().rsplit_once(':'))
        .find_map(|(_, port)| port.parse().ok())
}

/// Picks the host published ports are reachable on.
///
/// An explicit override wins, then the host of a `tcp://` `DOCKER_HOST`,
/// then `localhost`.
#[must_use]
pub fn resolve_host(host_override: Option<&str>, docker_host: Option<&str>) -> String {
    if let Some(host) = host_override.filter(|h| !h.trim().is_empty()) {
        return host.trim().to_string();
    }
    docker_host
        .and_then(|url| url.strip_prefix("tcp://"))
        .map(|rest| rest.split(['/', '?']).next().unwrap_or(rest))
        .map(|authority| authority.rsplit_once(':').map_or(authority, |(host, _)| host))
        .filter(|host| !host.is_empty())
        .map_or_else(|| "localhost".to_string(), str::to_string)
}

fn failure_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr.to_string()
    }
}

fn is_missing_container(message: &str) -> bool {
    message.contains("No such container")
}

#[cfg(test)]
mod tests {
    use localstack_common::types::PortBinding;

    use super::*;

    #[test]
    fn create_args_include_env_labels_and_ports() {
        let config = ResourceConfig::new()
            .with_image("localstack/localstack:1.3.1")
            .with_name("ls-test")
            .with_env("USE_SSL", "false")
            .with_env("SERVICES", "s3,sqs")
            .with_label("managed", "true")
            .with_port_binding(PortBinding::dynamic(4566));

        let args = create_args(&config).expect("args");
        assert_eq!(
            args,
            vec![
                "create",
                "--name",
                "ls-test",
                "--label",
                "managed=true",
                "--env",
                "SERVICES=s3,sqs",
                "--env",
                "USE_SSL=false",
                "--publish",
                "4566",
                "localstack/localstack:1.3.1",
            ]
        );
    }

    #[test]
    fn create_args_generate_a_name_when_unset() {
        let config = ResourceConfig::new().with_image("busybox");
        let args = create_args(&config).expect("args");
        assert_eq!(args[1], "--name");
        assert!(args[2].starts_with("localstack-"));
        assert_eq!(args.last().map(String::as_str), Some("busybox"));
    }

    #[test]
    fn create_args_require_an_image() {
        let err = create_args(&ResourceConfig::new()).unwrap_err();
        assert!(matches!(err, HarnessError::ConfigurationInvalid { .. }));
    }

    #[test]
    fn pull_uses_its_own_timeout() {
        let runtime = DockerCliRuntime::new(HarnessConfig {
            command_timeout_secs: 30,
            pull_timeout_secs: 1200,
            ..HarnessConfig::default()
        });
        let pull = pull_args("localstack/localstack:1.3.1");
        assert_eq!(pull, vec!["pull", "localstack/localstack:1.3.1"]);
        assert_eq!(runtime.timeout_for(&pull), Duration::from_secs(1200));

        let create = create_args(&ResourceConfig::new().with_image("localstack/localstack:1.3.1"))
            .expect("args");
        assert_eq!(runtime.timeout_for(&create), Duration::from_secs(30));
        assert_eq!(runtime.timeout_for(&["logs".to_string(), "abc".to_string()]), Duration::from_secs(30));
    }

    #[test]
    fn parse_port_output_handles_ipv4_and_ipv6() {
        assert_eq!(parse_port_output("0.0.0.0:49153\n[::]:49153\n"), Some(49153));
        assert_eq!(parse_port_output("[::]:54321\n"), Some(54321));
    }

    #[test]
    fn parse_port_output_rejects_garbage() {
        assert_eq!(parse_port_output(""), None);
        assert_eq!(parse_port_output("Error: No public port '4566/tcp'"), None);
    }

    #[test]
    fn resolve_host_prefers_override() {
        assert_eq!(
            resolve_host(Some("docker.internal"), Some("tcp://10.0.0.2:2375")),
            "docker.internal"
        );
    }

    #[test]
    fn resolve_host_uses_tcp_docker_host() {
        assert_eq!(resolve_host(None, Some("tcp://10.0.0.2:2375")), "10.0.0.2");
        assert_eq!(resolve_host(None, Some("tcp://dockerd")), "dockerd");
    }

    #[test]
    fn resolve_host_falls_back_to_localhost() {
        assert_eq!(resolve_host(None, None), "localhost");
        assert_eq!(resolve_host(Some("  "), Some("unix:///var/run/docker.sock")), "localhost");
    }

    #[test]
    fn missing_container_messages_are_recognised() {
        assert!(is_missing_container("Error: No such container: abc123"));
        assert!(!is_missing_container("permission denied"));
    }
}
