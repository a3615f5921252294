// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Errors that belong to a single component (argument resolution, integration
//! lookup, callable failures) live next to that component; this enum covers
//! the failures that abort an operation outright.

use thiserror::Error;

use crate::args::ArgumentError;
use crate::integration::LookupError;

#[derive(Error, Debug)]
pub enum FlowgateError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Action not found: {0}")]
    ActionNotFound(String),

    #[error("Action '{0}' has no trigger to deliver data to")]
    NoTrigger(String),

    #[error("Cycle detected in argument references: {0}")]
    ReferenceCycle(String),

    #[error(
        "Cannot initialize action '{action}': {integration}/{operation} is device-bound but no device was provided"
    )]
    DeviceRequired {
        action: String,
        integration: String,
        operation: String,
    },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A construction-time problem retained on an action, condition or
/// transform. Never fatal by itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Argument(#[from] ArgumentError),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, FlowgateError>;
