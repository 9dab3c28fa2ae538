// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for frpc-gen

use thiserror::Error;

/// Result type alias for frpc-gen operations
pub type Result<T> = std::result::Result<T, GenError>;

/// Errors that can occur while loading inputs or writing generated files
#[derive(Error, Debug)]
pub enum GenError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration file is not valid JSON or does not match the schema
    #[error("Error parsing {path}: {message}")]
    InvalidConfig { path: String, message: String },

    /// A server record lacks a required key
    #[error("Server '{server}' is missing required field '{field}'")]
    MissingField { server: String, field: &'static str },

    /// A server value cannot be represented in the generated files
    #[error("Server '{server}' field '{field}' is not supported: {reason}")]
    UnsupportedValue {
        server: String,
        field: &'static str,
        reason: &'static str,
    },

    /// Two enabled servers share a name
    #[error("Duplicate enabled server name: {name}")]
    DuplicateServer { name: String },

    /// Template file not found
    #[error("Template file not found: {path}")]
    TemplateNotFound { path: String },

    /// Template does not contain the location placeholder (strict mode only)
    #[error("Template '{path}' does not contain the {placeholder} placeholder")]
    PlaceholderMissing {
        path: String,
        placeholder: &'static str,
    },

    /// Failed to write a generated file
    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error wrapper
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
