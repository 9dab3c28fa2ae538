// SPDX-License-Identifier: AGPL-3.0-or-later
//! Loading and validation of `frp-servers.json`
//!
//! The document is parsed into permissive raw records first and then
//! converted into fully-typed [`Server`] values by an explicit validation
//! pass, so a server record lacking a required key is reported by name
//! before anything is rendered or written.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use crate::error::{GenError, Result};

/// Default configuration file name, resolved against the working directory
pub const DEFAULT_CONFIG_FILE: &str = "frp-servers.json";

/// Server name that suppresses name-prefixing in generated identifiers
pub const DEFAULT_SERVER_NAME: &str = "default";

/// Fully validated configuration document
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Remote frps servers, in document order
    pub servers: Vec<Server>,

    /// Shared shadowsocks port settings
    pub proxy: ProxyDefaults,

    /// Settings applied to every generated compose service
    pub deployment: DeploymentConfig,
}

/// A remote frps server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    /// Unique identifier, used in filenames and environment-variable prefixes
    pub name: String,

    /// Server address
    pub address: String,

    /// Server bind port
    pub port: u16,

    /// frps authentication token
    pub auth_token: String,

    /// Human-readable description
    pub description: Option<String>,

    /// Whether output is generated for this server
    pub enabled: bool,
}

/// Shared local/remote port settings for the shadowsocks service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ProxyDefaults {
    /// Port shadowsocks listens on locally
    pub local_port: u16,

    /// Port exposed on the frps side
    pub remote_port: u16,
}

/// Container settings for generated frpc services
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeploymentConfig {
    /// frpc image reference
    pub frpc_image: String,

    /// Compose restart policy
    pub restart_policy: String,

    /// Compose network mode
    pub network_mode: String,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    servers: Vec<RawServer>,
    shadowsocks: ProxyDefaults,
    docker: DeploymentConfig,
}

#[derive(Debug, Deserialize)]
struct RawServer {
    name: Option<String>,
    addr: Option<String>,
    port: Option<u16>,
    token: Option<String>,
    description: Option<String>,
    enabled: Option<bool>,
}

impl RawServer {
    fn validate(self, index: usize) -> Result<Server> {
        let name = self.name.ok_or_else(|| GenError::MissingField {
            server: format!("#{}", index),
            field: "name",
        })?;

        let missing = |field: &'static str| GenError::MissingField {
            server: name.clone(),
            field,
        };

        let address = self.addr.ok_or_else(|| missing("addr"))?;
        let port = self.port.ok_or_else(|| missing("port"))?;
        let auth_token = self.token.ok_or_else(|| missing("token"))?;

        // `}` would end the `${VAR:-default}` fallback early in docker-compose.yml
        for (field, value) in [("addr", &address), ("token", &auth_token)] {
            if value.contains('}') {
                return Err(GenError::UnsupportedValue {
                    server: name.clone(),
                    field,
                    reason: "'}' cannot appear in a compose fallback default",
                });
            }
        }

        Ok(Server {
            name,
            address,
            port,
            auth_token,
            description: self.description,
            enabled: self.enabled.unwrap_or(true),
        })
    }
}

impl RawConfig {
    fn validate(self) -> Result<Config> {
        let servers = self
            .servers
            .into_iter()
            .enumerate()
            .map(|(index, raw)| raw.validate(index))
            .collect::<Result<Vec<_>>>()?;

        let mut seen = HashSet::new();
        for server in servers.iter().filter(|s| s.enabled) {
            if !seen.insert(server.name.as_str()) {
                return Err(GenError::DuplicateServer {
                    name: server.name.clone(),
                });
            }
        }

        Ok(Config {
            servers,
            proxy: self.shadowsocks,
            deployment: self.docker,
        })
    }
}

impl Config {
    /// Load configuration from a JSON file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The validated configuration, or an error naming the file when it is
    /// absent or malformed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(GenError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        let config = Self::parse(&contents, &path.display().to_string())?;
        debug!(
            path = %path.display(),
            servers = config.servers.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(contents: &str) -> Result<Self> {
        Self::parse(contents, "configuration")
    }

    /// Syntax and schema errors become `InvalidConfig` tagged with `origin`
    fn parse(contents: &str, origin: &str) -> Result<Self> {
        let raw: RawConfig =
            serde_json::from_str(contents).map_err(|e| GenError::InvalidConfig {
                path: origin.to_string(),
                message: e.to_string(),
            })?;
        raw.validate()
    }

    /// Servers whose `enabled` flag is absent or true, in document order
    pub fn enabled_servers(&self) -> impl Iterator<Item = &Server> {
        self.servers.iter().filter(|server| server.enabled)
    }
}

impl Server {
    /// Whether this is the sentinel `default` server
    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_SERVER_NAME
    }
}
