// SPDX-License-Identifier: AGPL-3.0-or-later
//! frpc template loading and per-server rendering

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::Server;
use crate::error::{GenError, Result};

/// Default template file name, resolved against the working directory
pub const DEFAULT_TEMPLATE_FILE: &str = "frpc_template.toml";

/// Token replaced with the server name
pub const LOCATION_PLACEHOLDER: &str = "{LOCATION}";

/// Raw frpc template text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    path: PathBuf,
    text: String,
}

impl Template {
    /// Load a template from a file
    ///
    /// The content is opaque here; only existence and readability are checked.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(GenError::TemplateNotFound {
                path: path.display().to_string(),
            });
        }

        let text = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), bytes = text.len(), "Loaded template");

        Ok(Self {
            path: path.to_path_buf(),
            text,
        })
    }

    /// Build a template from in-memory text
    pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Raw template text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the template contains the location placeholder
    pub fn has_placeholder(&self) -> bool {
        self.text.contains(LOCATION_PLACEHOLDER)
    }

    /// Reject templates without the location placeholder
    pub fn require_placeholder(&self) -> Result<()> {
        if self.has_placeholder() {
            return Ok(());
        }
        Err(GenError::PlaceholderMissing {
            path: self.path.display().to_string(),
            placeholder: LOCATION_PLACEHOLDER,
        })
    }

    /// Render the frpc config for one server
    ///
    /// Every occurrence of the placeholder is replaced with the server name.
    /// A template without the placeholder is returned unchanged.
    pub fn render(&self, server: &Server) -> String {
        self.text.replace(LOCATION_PLACEHOLDER, &server.name)
    }

    /// Path the template was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }
}
