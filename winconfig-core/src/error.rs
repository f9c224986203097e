//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

// Re-export library error type
pub use winconfig_provider::ProviderError;

use crate::types::Operation;

fn template_suffix(template: Option<&String>) -> String {
    template
        .map(|t| format!(" for template '{t}'"))
        .unwrap_or_default()
}

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Declaration rejected before any remote call
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A resource the declaration depends on does not exist
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// The host could not be reached, timed out or refused authentication
    #[error("Remote communication error: {0}")]
    RemoteCommunication(ProviderError),

    /// Remote state changed between planning and applying
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The certificate authority refused the request
    #[error("Certificate issuance failed{}: {detail}", template_suffix(.template.as_ref()))]
    Issuance {
        template: Option<String>,
        detail: String,
    },

    /// Session used before `open()` or after `close()`
    #[error("Session is closed")]
    SessionClosed,

    /// The session was built without a backend the operation needs
    #[error("No {0} configured for this session")]
    MissingBackend(&'static str),

    /// An operation failed part way through an apply
    #[error(
        "Apply failed at '{failed}' after {} completed operation(s): {source}",
        .completed.len()
    )]
    ApplyFailed {
        completed: Vec<Operation>,
        failed: Box<Operation>,
        source: Box<CoreError>,
    },

    /// Provider error (converting from library)
    #[error("{0}")]
    Provider(ProviderError),
}

impl From<ProviderError> for CoreError {
    fn from(err: ProviderError) -> Self {
        if err.is_communication_failure() {
            return Self::RemoteCommunication(err);
        }
        match err {
            ProviderError::EnrollmentRejected {
                template,
                raw_message,
                ..
            } => Self::Issuance {
                template,
                detail: raw_message,
            },
            ProviderError::ZoneNotFound { zone, .. } => Self::NotFound { kind: "zone", name: zone },
            ProviderError::StoreNotFound { store, .. } => Self::NotFound {
                kind: "certificate store",
                name: store,
            },
            other => Self::Provider(other),
        }
    }
}

impl CoreError {
    /// Whether it is expected behavior (bad declaration, missing resource, refusal),
    /// used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method simultaneously when new variants are added.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::ValidationError(_)
            | Self::NotFound { .. }
            | Self::Conflict(_)
            | Self::Issuance { .. } => true,
            Self::Provider(e) => e.is_expected(),
            Self::ApplyFailed { source, .. } => source.is_expected(),
            Self::RemoteCommunication(_) | Self::SessionClosed | Self::MissingBackend(_) => false,
        }
    }

    /// The underlying error of an [`ApplyFailed`](Self::ApplyFailed), or `self`.
    pub fn root_cause(&self) -> &CoreError {
        match self {
            Self::ApplyFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Shortcut for a [`ValidationError`](Self::ValidationError).
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
