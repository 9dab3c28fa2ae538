// SPDX-License-Identifier: AGPL-3.0-or-later
//! Output artifact records
//!
//! Each generated file is modelled as a small record with its own
//! serialiser: [`ComposeFile`] for `docker-compose.yml` and [`EnvTemplate`]
//! for `.env.example`. [`ServerNames`] derives every per-server identifier.

mod compose;
mod env_file;

pub use compose::{ComposeFile, ComposeService, EnvBinding, EnvValue, PREAMBLE_SERVICE};
pub use env_file::{EnvEntry, EnvSection, EnvTemplate};

use crate::config::{Server, DEFAULT_SERVER_NAME};

/// Identifiers derived from a server name
///
/// The sentinel `default` name yields unprefixed identifiers (`frpc`,
/// `frpc.toml`, `FRP_SERVER_ADDR`); any other name `n` yields `frpc-n`,
/// `frpc-n.toml` and `FRP_N_SERVER_ADDR`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerNames {
    /// Compose service key
    pub service: String,
    /// Container name
    pub container: String,
    /// Generated frpc config file name
    pub config_file: String,
    /// Uppercased name, `None` for the default server
    pub env_prefix: Option<String>,
}

impl ServerNames {
    /// Derive identifiers from a raw server name
    pub fn from_name(name: &str) -> Self {
        if name == DEFAULT_SERVER_NAME {
            return Self {
                service: "frpc".to_string(),
                container: "frpc".to_string(),
                config_file: "frpc.toml".to_string(),
                env_prefix: None,
            };
        }

        Self {
            service: format!("frpc-{}", name),
            container: format!("frpc-{}", name),
            config_file: format!("frpc-{}.toml", name),
            env_prefix: Some(name.to_uppercase()),
        }
    }

    /// Derive identifiers for a server record
    pub fn for_server(server: &Server) -> Self {
        Self::from_name(&server.name)
    }

    /// Environment variable holding `key` for this server, e.g.
    /// `FRP_EU_SERVER_ADDR` or `FRP_SERVER_ADDR`
    pub fn env_var(&self, key: &str) -> String {
        match &self.env_prefix {
            Some(prefix) => format!("FRP_{}_{}", prefix, key),
            None => format!("FRP_{}", key),
        }
    }
}

/// Collapse line breaks (`\n`, `\r\n` and lone `\r`) so a description fits
/// on one comment line
pub(crate) fn one_line(text: &str) -> String {
    text.split(|c: char| c == '\n' || c == '\r')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names() {
        let names = ServerNames::from_name("default");
        assert_eq!(names.service, "frpc");
        assert_eq!(names.container, "frpc");
        assert_eq!(names.config_file, "frpc.toml");
        assert_eq!(names.env_prefix, None);
        assert_eq!(names.env_var("SERVER_ADDR"), "FRP_SERVER_ADDR");
    }

    #[test]
    fn test_named_server() {
        let names = ServerNames::from_name("eu");
        assert_eq!(names.service, "frpc-eu");
        assert_eq!(names.container, "frpc-eu");
        assert_eq!(names.config_file, "frpc-eu.toml");
        assert_eq!(names.env_prefix.as_deref(), Some("EU"));
        assert_eq!(names.env_var("AUTH_TOKEN"), "FRP_EU_AUTH_TOKEN");
    }

    #[test]
    fn test_sentinel_is_case_sensitive() {
        let names = ServerNames::from_name("Default");
        assert_eq!(names.config_file, "frpc-Default.toml");
        assert_eq!(names.env_var("SERVER_PORT"), "FRP_DEFAULT_SERVER_PORT");
    }

    #[test]
    fn test_one_line() {
        assert_eq!(one_line("Tokyo\nedge node"), "Tokyo edge node");
        assert_eq!(one_line("plain"), "plain");
        assert_eq!(one_line("trailing\r\n"), "trailing");
        assert_eq!(one_line("Osaka\rbackup"), "Osaka backup");
        assert_eq!(one_line("a\r\n\rb"), "a b");
    }
}
