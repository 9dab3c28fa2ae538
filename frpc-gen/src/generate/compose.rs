// SPDX-License-Identifier: AGPL-3.0-or-later
//! `docker-compose.yml` records and serialisation

use std::borrow::Cow;
use std::fmt;

use super::{one_line, ServerNames};
use crate::config::{DeploymentConfig, ProxyDefaults, Server};

/// Service every generated frpc client depends on
pub const PREAMBLE_SERVICE: &str = "shadowsocks";

/// Where the generated config file is mounted inside the frpc container
const FRPC_CONFIG_MOUNT: &str = "/etc/frp/frpc.toml";

/// Value side of an environment binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvValue {
    /// Fixed value
    Literal(String),
    /// `${var:-default}`, resolved by the compose runtime
    Fallback { var: String, default: String },
}

/// One `KEY=value` entry of a service's `environment` list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvBinding {
    pub key: String,
    pub value: EnvValue,
}

impl EnvBinding {
    pub fn literal(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: EnvValue::Literal(value.into()),
        }
    }

    pub fn fallback(
        key: impl Into<String>,
        var: impl Into<String>,
        default: impl ToString,
    ) -> Self {
        Self {
            key: key.into(),
            value: EnvValue::Fallback {
                var: var.into(),
                default: default.to_string(),
            },
        }
    }
}

impl fmt::Display for EnvBinding {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            EnvValue::Literal(value) => {
                write!(formatter, "{}={}", self.key, escape_dollar(value))
            }
            EnvValue::Fallback { var, default } => write!(
                formatter,
                "{}=${{{}:-{}}}",
                self.key,
                var,
                escape_dollar(default)
            ),
        }
    }
}

/// A single compose service block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeService {
    /// Comment line emitted above the service key
    pub comment: Option<String>,
    pub name: String,
    pub image: String,
    pub container_name: String,
    pub restart: String,
    pub network_mode: String,
    pub environment: Vec<EnvBinding>,
    pub volumes: Vec<String>,
    pub command: Vec<String>,
    pub depends_on: Vec<String>,
}

impl ComposeService {
    /// The fixed shadowsocks service every frpc client forwards to
    pub fn shadowsocks(proxy: &ProxyDefaults) -> Self {
        Self {
            comment: None,
            name: PREAMBLE_SERVICE.to_string(),
            image: "shadowsocks/shadowsocks-libev".to_string(),
            container_name: "shadowsocks-raw".to_string(),
            restart: "always".to_string(),
            network_mode: "host".to_string(),
            environment: vec![
                EnvBinding::fallback("SERVER_PORT", "SERVER_PORT", proxy.local_port),
                EnvBinding::literal("SERVER_ADDR", "127.0.0.1"),
                EnvBinding::literal("METHOD", "chacha20-ietf-poly1305"),
                EnvBinding::literal("PASSWORD", "HELLOWORLD"),
            ],
            volumes: Vec::new(),
            command: Vec::new(),
            depends_on: Vec::new(),
        }
    }

    /// The frpc client service for one server
    ///
    /// Server address, port and token fall back to the record's literal
    /// values when the per-server environment variable is unset.
    pub fn frpc(server: &Server, proxy: &ProxyDefaults, deployment: &DeploymentConfig) -> Self {
        let names = ServerNames::for_server(server);
        let comment = match &server.description {
            Some(description) => one_line(description),
            None => format!("{} FRP client", server.name),
        };

        Self {
            comment: Some(comment),
            name: names.service.clone(),
            image: deployment.frpc_image.clone(),
            container_name: names.container.clone(),
            restart: deployment.restart_policy.clone(),
            network_mode: deployment.network_mode.clone(),
            environment: vec![
                EnvBinding::fallback(
                    "FRP_SERVER_ADDR",
                    names.env_var("SERVER_ADDR"),
                    &server.address,
                ),
                EnvBinding::fallback(
                    "FRP_SERVER_PORT",
                    names.env_var("SERVER_PORT"),
                    server.port,
                ),
                EnvBinding::fallback(
                    "FRP_AUTH_TOKEN",
                    names.env_var("AUTH_TOKEN"),
                    &server.auth_token,
                ),
                EnvBinding::fallback("SERVER_PORT", "SERVER_PORT", proxy.local_port),
                EnvBinding::fallback("FRP_REMOTE_PORT", "FRP_REMOTE_PORT", proxy.remote_port),
            ],
            volumes: vec![format!("./{}:{}", names.config_file, FRPC_CONFIG_MOUNT)],
            command: vec!["-c".to_string(), FRPC_CONFIG_MOUNT.to_string()],
            depends_on: vec![PREAMBLE_SERVICE.to_string()],
        }
    }
}

impl fmt::Display for ComposeService {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(comment) = &self.comment {
            writeln!(formatter, "  # {}", comment)?;
        }
        writeln!(formatter, "  {}:", yaml_scalar(&self.name))?;
        writeln!(formatter, "    image: {}", yaml_scalar(&self.image))?;
        writeln!(
            formatter,
            "    container_name: {}",
            yaml_scalar(&self.container_name)
        )?;
        writeln!(formatter, "    restart: {}", yaml_scalar(&self.restart))?;
        writeln!(formatter, "    network_mode: {}", yaml_quoted(&self.network_mode))?;

        if !self.environment.is_empty() {
            writeln!(formatter, "    environment:")?;
            for binding in &self.environment {
                writeln!(formatter, "      - {}", yaml_scalar(&binding.to_string()))?;
            }
        }

        if !self.volumes.is_empty() {
            writeln!(formatter, "    volumes:")?;
            for volume in &self.volumes {
                writeln!(formatter, "      - {}", yaml_scalar(volume))?;
            }
        }

        if !self.command.is_empty() {
            let args: Vec<String> = self.command.iter().map(|arg| yaml_quoted(arg)).collect();
            writeln!(formatter, "    command: [{}]", args.join(", "))?;
        }

        if !self.depends_on.is_empty() {
            writeln!(formatter, "    depends_on:")?;
            for dependency in &self.depends_on {
                writeln!(formatter, "      - {}", yaml_scalar(dependency))?;
            }
        }

        Ok(())
    }
}

/// The composed deployment descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeFile {
    pub services: Vec<ComposeService>,
}

impl ComposeFile {
    /// Preamble service followed by one frpc service per server, in order
    pub fn build<'a>(
        servers: impl IntoIterator<Item = &'a Server>,
        proxy: &ProxyDefaults,
        deployment: &DeploymentConfig,
    ) -> Self {
        let mut services = vec![ComposeService::shadowsocks(proxy)];
        services.extend(
            servers
                .into_iter()
                .map(|server| ComposeService::frpc(server, proxy, deployment)),
        );
        Self { services }
    }

    /// Keys of every service in the file
    pub fn service_names(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.name.as_str()).collect()
    }
}

impl fmt::Display for ComposeFile {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(formatter, "services:")?;
        for service in &self.services {
            writeln!(formatter, "{}", service)?;
        }
        Ok(())
    }
}

// `$` starts an interpolation in compose files. `}` cannot be escaped inside
// `${VAR:-default}`, so config validation rejects it in fallback values.
fn escape_dollar(value: &str) -> Cow<'_, str> {
    if value.contains('$') {
        Cow::Owned(value.replace('$', "$$"))
    } else {
        Cow::Borrowed(value)
    }
}

/// Plain YAML scalar when unambiguous, double-quoted otherwise
fn yaml_scalar(value: &str) -> Cow<'_, str> {
    if needs_quoting(value) {
        Cow::Owned(yaml_quoted(value))
    } else {
        Cow::Borrowed(value)
    }
}

fn needs_quoting(value: &str) -> bool {
    let Some(first) = value.chars().next() else {
        return true;
    };

    if "-?:,[]{}#&*!|>'\"%@`".contains(first) {
        return true;
    }

    value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace)
        || value.ends_with(':')
        || value.contains(": ")
        || value.contains(" #")
        || value.chars().any(char::is_control)
}

fn yaml_quoted(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy() -> ProxyDefaults {
        ProxyDefaults {
            local_port: 1080,
            remote_port: 6000,
        }
    }

    fn deployment() -> DeploymentConfig {
        DeploymentConfig {
            frpc_image: "snowdreamtech/frpc".to_string(),
            restart_policy: "unless-stopped".to_string(),
            network_mode: "host".to_string(),
        }
    }

    fn server(name: &str, description: Option<&str>) -> Server {
        Server {
            name: name.to_string(),
            address: "5.6.7.8".to_string(),
            port: 7001,
            auth_token: "u".to_string(),
            description: description.map(str::to_string),
            enabled: true,
        }
    }

    #[test]
    fn test_named_service_block() {
        let service = ComposeService::frpc(&server("eu", None), &proxy(), &deployment());
        let expected = "  # eu FRP client
  frpc-eu:
    image: snowdreamtech/frpc
    container_name: frpc-eu
    restart: unless-stopped
    network_mode: \"host\"
    environment:
      - FRP_SERVER_ADDR=${FRP_EU_SERVER_ADDR:-5.6.7.8}
      - FRP_SERVER_PORT=${FRP_EU_SERVER_PORT:-7001}
      - FRP_AUTH_TOKEN=${FRP_EU_AUTH_TOKEN:-u}
      - SERVER_PORT=${SERVER_PORT:-1080}
      - FRP_REMOTE_PORT=${FRP_REMOTE_PORT:-6000}
    volumes:
      - ./frpc-eu.toml:/etc/frp/frpc.toml
    command: [\"-c\", \"/etc/frp/frpc.toml\"]
    depends_on:
      - shadowsocks
";
        assert_eq!(service.to_string(), expected);
    }

    #[test]
    fn test_default_service_is_unprefixed() {
        let service = ComposeService::frpc(
            &server("default", Some("Primary relay")),
            &proxy(),
            &deployment(),
        );
        let text = service.to_string();
        assert!(text.starts_with("  # Primary relay\n  frpc:\n"));
        assert!(text.contains("container_name: frpc\n"));
        assert!(text.contains("- FRP_SERVER_ADDR=${FRP_SERVER_ADDR:-5.6.7.8}\n"));
        assert!(text.contains("- ./frpc.toml:/etc/frp/frpc.toml\n"));
    }

    #[test]
    fn test_preamble_block() {
        let expected = "  shadowsocks:
    image: shadowsocks/shadowsocks-libev
    container_name: shadowsocks-raw
    restart: always
    network_mode: \"host\"
    environment:
      - SERVER_PORT=${SERVER_PORT:-1080}
      - SERVER_ADDR=127.0.0.1
      - METHOD=chacha20-ietf-poly1305
      - PASSWORD=HELLOWORLD
";
        assert_eq!(ComposeService::shadowsocks(&proxy()).to_string(), expected);
    }

    #[test]
    fn test_compose_file_layout() {
        let servers = vec![server("default", None), server("eu", None)];
        let compose = ComposeFile::build(&servers, &proxy(), &deployment());

        assert_eq!(compose.service_names(), vec!["shadowsocks", "frpc", "frpc-eu"]);

        let text = compose.to_string();
        assert!(text.starts_with("services:\n  shadowsocks:\n"));
        assert!(text.contains("PASSWORD=HELLOWORLD\n\n  # default FRP client\n  frpc:\n"));
        assert!(text.ends_with("      - shadowsocks\n\n"));
    }

    #[test]
    fn test_token_with_dollar_is_escaped() {
        let mut record = server("eu", None);
        record.auth_token = "pa$$word".to_string();
        let text = ComposeService::frpc(&record, &proxy(), &deployment()).to_string();
        assert!(text.contains("- FRP_AUTH_TOKEN=${FRP_EU_AUTH_TOKEN:-pa$$$$word}\n"));
    }

    #[test]
    fn test_ambiguous_values_are_quoted() {
        let mut record = server("eu", None);
        record.auth_token = "abc #def".to_string();
        let text = ComposeService::frpc(&record, &proxy(), &deployment()).to_string();
        assert!(text.contains("- \"FRP_AUTH_TOKEN=${FRP_EU_AUTH_TOKEN:-abc #def}\"\n"));
    }

    #[test]
    fn test_multiline_description_stays_on_comment_line() {
        let service = ComposeService::frpc(
            &server("jp", Some("Tokyo\nedge")),
            &proxy(),
            &deployment(),
        );
        assert!(service.to_string().starts_with("  # Tokyo edge\n  frpc-jp:\n"));
    }

    #[test]
    fn test_yaml_scalar() {
        assert_eq!(yaml_scalar("host"), "host");
        assert_eq!(yaml_scalar("./a.toml:/etc/frp/frpc.toml"), "./a.toml:/etc/frp/frpc.toml");
        assert_eq!(yaml_scalar(""), "\"\"");
        assert_eq!(yaml_scalar("*anchor"), "\"*anchor\"");
        assert_eq!(yaml_scalar("key: value"), "\"key: value\"");
        assert_eq!(yaml_quoted("a\"b\\c"), "\"a\\\"b\\\\c\"");
    }
}
