// SPDX-License-Identifier: AGPL-3.0-or-later
//! `.env.example` records and serialisation

use std::borrow::Cow;
use std::fmt;

use super::{one_line, ServerNames};
use crate::config::{ProxyDefaults, Server};

const HEADER: &str = "# FRP Multi-Location Environment Variables";
const SHARED_COMMENT: &str = "# Shadowsocks configuration";

/// A single `KEY=value` assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvEntry {
    pub key: String,
    pub value: String,
}

impl EnvEntry {
    pub fn new(key: impl Into<String>, value: impl ToString) -> Self {
        Self {
            key: key.into(),
            value: value.to_string(),
        }
    }
}

impl fmt::Display for EnvEntry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}={}", self.key, env_value(&self.value))
    }
}

/// Per-server block: a description comment and its assignments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSection {
    pub comment: String,
    pub entries: Vec<EnvEntry>,
    /// Emit the assignments as `# KEY=value` reference lines
    pub commented_out: bool,
}

impl EnvSection {
    /// Block for one server
    ///
    /// The default server's values are already the compose fallbacks, so its
    /// lines are informational only. Other servers get live `FRP_<NAME>_*`
    /// assignments.
    pub fn for_server(server: &Server) -> Self {
        let names = ServerNames::for_server(server);
        let comment = match (&server.description, server.is_default()) {
            (Some(description), _) => one_line(description),
            (None, true) => "Default FRP server".to_string(),
            (None, false) => format!("{} FRP server", server.name),
        };

        Self {
            comment,
            entries: vec![
                EnvEntry::new(names.env_var("SERVER_ADDR"), &server.address),
                EnvEntry::new(names.env_var("SERVER_PORT"), server.port),
                EnvEntry::new(names.env_var("AUTH_TOKEN"), &server.auth_token),
            ],
            commented_out: server.is_default(),
        }
    }

    fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!("# {}", self.comment)];
        for entry in &self.entries {
            if self.commented_out {
                lines.push(format!("# {}", entry));
            } else {
                lines.push(entry.to_string());
            }
        }
        lines
    }
}

/// The environment-variable template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvTemplate {
    /// Shared shadowsocks defaults
    pub shared: Vec<EnvEntry>,
    pub sections: Vec<EnvSection>,
}

impl EnvTemplate {
    /// Build the template for the given (already filtered) servers
    pub fn build<'a>(servers: impl IntoIterator<Item = &'a Server>, proxy: &ProxyDefaults) -> Self {
        Self {
            shared: vec![
                EnvEntry::new("SERVER_PORT", proxy.local_port),
                EnvEntry::new("FRP_REMOTE_PORT", proxy.remote_port),
            ],
            sections: servers.into_iter().map(EnvSection::for_server).collect(),
        }
    }
}

impl fmt::Display for EnvTemplate {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = vec![HEADER.to_string(), SHARED_COMMENT.to_string()];
        lines.extend(self.shared.iter().map(ToString::to_string));
        lines.push(String::new());

        for section in &self.sections {
            lines.extend(section.lines());
            lines.push(String::new());
        }

        write!(formatter, "{}", lines.join("\n"))
    }
}

/// Quote values a dotenv parser would otherwise split, truncate or expand
///
/// Values containing `$` are single-quoted so `$NAME` is taken literally;
/// when that is impossible the `$` is backslash-escaped inside double quotes.
fn env_value(value: &str) -> Cow<'_, str> {
    let has_dollar = value.contains('$');
    if has_dollar && !value.contains('\'') && !value.contains('\n') {
        return Cow::Owned(format!("'{}'", value));
    }

    let needs_quotes = has_dollar
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '#' | '"' | '\'' | '\\'));

    if !needs_quotes {
        return Cow::Borrowed(value);
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '$' => quoted.push_str("\\$"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    Cow::Owned(quoted)
}
