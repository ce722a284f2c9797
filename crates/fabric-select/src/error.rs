//! Error types for fabric interface selection.

use thiserror::Error;

use crate::class::NetDevClass;

/// Result type alias for fabric selection operations.
pub type FabricResult<T> = Result<T, FabricError>;

/// Errors that can occur while selecting or looking up fabric interfaces.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FabricError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no suitable fabric interface found of type \"{}\"", class_label(.class))]
    NoSuitableInterface { class: Option<NetDevClass> },

    #[error("fabric interface {0:?} not found")]
    InterfaceNotFound(String),

    #[error("fabric interface {interface:?} doesn't have requested domain {domain:?}")]
    DomainNotFound { interface: String, domain: String },

    #[error("fabric interface {interface:?} doesn't support provider {provider:?}")]
    ProviderNotFound { interface: String, provider: String },

    /// A single candidate failed its address check. Logged and skipped
    /// during selection, never returned from `get_device`.
    #[error("fabric interface {interface} failed liveness check: {reason}")]
    Liveness { interface: String, reason: String },

    #[error("fabric inventory is uninitialized")]
    Uninitialized,
}

fn class_label(class: &Option<NetDevClass>) -> &'static str {
    class.as_ref().map_or("ANY", NetDevClass::label)
}

impl FabricError {
    /// Whether this error means a search completed without a match.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FabricError::NoSuitableInterface { .. }
                | FabricError::InterfaceNotFound(_)
                | FabricError::DomainNotFound { .. }
                | FabricError::ProviderNotFound { .. }
        )
    }
}

/// Errors raised while loading the agent configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("agent config validation failed: {0}")]
    Invalid(String),

    #[error(transparent)]
    Fabric(#[from] FabricError),
}
