use serde::{Deserialize, Serialize};

/// Unified error type for all remote DNS server, certificate store and
/// certificate authority operations.
///
/// Each variant carries a `host` field identifying the managed Windows host
/// that produced the error, plus variant-specific context. All variants are
/// serializable for structured error reporting.
///
/// # Communication Failures
///
/// The following variants mean the remote host could not be talked to at all,
/// as opposed to the host answering with a refusal:
/// - [`NetworkError`](Self::NetworkError): transport-level failure
/// - [`Timeout`](Self::Timeout): no response within the operation timeout
/// - [`InvalidCredentials`](Self::InvalidCredentials): authentication rejected
///
/// None of them are retried by this crate; retry policy belongs to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum ProviderError {
    /// A transport-level error occurred (connection refused, reset, TLS failure, etc.).
    NetworkError {
        /// Host that produced the error.
        host: String,
        /// Error details.
        detail: String,
    },

    /// The remote call returned no response within the operation timeout.
    Timeout {
        /// Host that produced the error.
        host: String,
        /// Error details.
        detail: String,
    },

    /// The remote host rejected the session credentials.
    InvalidCredentials {
        /// Host that produced the error.
        host: String,
        /// Original error message from the remote host, if available.
        raw_message: Option<String>,
    },

    /// The authenticated principal lacks permission for the requested operation.
    PermissionDenied {
        /// Host that produced the error.
        host: String,
        /// Original error message from the remote host, if available.
        raw_message: Option<String>,
    },

    /// The specified DNS zone does not exist on the server.
    ZoneNotFound {
        /// Host that produced the error.
        host: String,
        /// Zone name that was not found.
        zone: String,
        /// Original error message from the remote host, if available.
        raw_message: Option<String>,
    },

    /// A DNS zone with the same name already exists on the server.
    ZoneExists {
        /// Host that produced the error.
        host: String,
        /// Name of the conflicting zone.
        zone: String,
        /// Original error message from the remote host, if available.
        raw_message: Option<String>,
    },

    /// The specified DNS record does not exist.
    RecordNotFound {
        /// Host that produced the error.
        host: String,
        /// Fully qualified name of the record.
        record: String,
        /// Original error message from the remote host, if available.
        raw_message: Option<String>,
    },

    /// A DNS record with identical name, type and data already exists.
    RecordExists {
        /// Host that produced the error.
        host: String,
        /// Fully qualified name of the conflicting record.
        record: String,
        /// Original error message from the remote host, if available.
        raw_message: Option<String>,
    },

    /// The certificate store does not exist or cannot be opened.
    StoreNotFound {
        /// Host that produced the error.
        host: String,
        /// Store path, e.g. `LocalMachine\My`.
        store: String,
        /// Original error message from the remote host, if available.
        raw_message: Option<String>,
    },

    /// The certificate authority refused the enrollment request.
    ///
    /// `raw_message` always carries the authority's own disposition message.
    EnrollmentRejected {
        /// Host that produced the error.
        host: String,
        /// Requested certificate template, if any.
        template: Option<String>,
        /// Disposition message returned by the authority.
        raw_message: String,
    },

    /// A request parameter was rejected by the remote host.
    InvalidParameter {
        /// Host that produced the error.
        host: String,
        /// Name of the invalid parameter.
        param: String,
        /// Description of what's wrong.
        detail: String,
    },

    /// Failed to parse data returned by the remote host.
    ParseError {
        /// Host that produced the error.
        host: String,
        /// Details about the parse failure.
        detail: String,
    },

    /// An unrecognized error from the remote host.
    ///
    /// This is a catch-all for error codes not yet mapped to a specific variant.
    Unknown {
        /// Host that produced the error.
        host: String,
        /// Raw error code, if available.
        raw_code: Option<String>,
        /// Raw error message.
        raw_message: String,
    },
}

impl ProviderError {
    /// Whether this is expected behavior (bad input, missing resource, refusal),
    /// used to pick the log level.
    ///
    /// `true` should be logged at `warn`, `false` at `error`.
    /// **Update this method whenever a variant is added.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials { .. }
                | Self::PermissionDenied { .. }
                | Self::ZoneNotFound { .. }
                | Self::ZoneExists { .. }
                | Self::RecordNotFound { .. }
                | Self::RecordExists { .. }
                | Self::StoreNotFound { .. }
                | Self::EnrollmentRejected { .. }
                | Self::InvalidParameter { .. }
        )
    }

    /// Whether the host could not be reached or authenticated against.
    #[must_use]
    pub fn is_communication_failure(&self) -> bool {
        matches!(
            self,
            Self::NetworkError { .. } | Self::Timeout { .. } | Self::InvalidCredentials { .. }
        )
    }

    /// Host that produced the error.
    pub fn host(&self) -> &str {
        match self {
            Self::NetworkError { host, .. }
            | Self::Timeout { host, .. }
            | Self::InvalidCredentials { host, .. }
            | Self::PermissionDenied { host, .. }
            | Self::ZoneNotFound { host, .. }
            | Self::ZoneExists { host, .. }
            | Self::RecordNotFound { host, .. }
            | Self::RecordExists { host, .. }
            | Self::StoreNotFound { host, .. }
            | Self::EnrollmentRejected { host, .. }
            | Self::InvalidParameter { host, .. }
            | Self::ParseError { host, .. }
            | Self::Unknown { host, .. } => host,
        }
    }
}

fn write_with_message(
    f: &mut std::fmt::Formatter<'_>,
    head: std::fmt::Arguments<'_>,
    raw_message: Option<&String>,
) -> std::fmt::Result {
    match raw_message {
        Some(msg) => write!(f, "{head}: {msg}"),
        None => write!(f, "{head}"),
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetworkError { host, detail } => {
                write!(f, "[{host}] Network error: {detail}")
            }
            Self::Timeout { host, detail } => {
                write!(f, "[{host}] Request timeout: {detail}")
            }
            Self::InvalidCredentials { host, raw_message } => write_with_message(
                f,
                format_args!("[{host}] Invalid credentials"),
                raw_message.as_ref(),
            ),
            Self::PermissionDenied { host, raw_message } => write_with_message(
                f,
                format_args!("[{host}] Permission denied"),
                raw_message.as_ref(),
            ),
            Self::ZoneNotFound {
                host,
                zone,
                raw_message,
            } => write_with_message(
                f,
                format_args!("[{host}] Zone '{zone}' not found"),
                raw_message.as_ref(),
            ),
            Self::ZoneExists {
                host,
                zone,
                raw_message,
            } => write_with_message(
                f,
                format_args!("[{host}] Zone '{zone}' already exists"),
                raw_message.as_ref(),
            ),
            Self::RecordNotFound {
                host,
                record,
                raw_message,
            } => write_with_message(
                f,
                format_args!("[{host}] Record '{record}' not found"),
                raw_message.as_ref(),
            ),
            Self::RecordExists {
                host,
                record,
                raw_message,
            } => write_with_message(
                f,
                format_args!("[{host}] Record '{record}' already exists"),
                raw_message.as_ref(),
            ),
            Self::StoreNotFound {
                host,
                store,
                raw_message,
            } => write_with_message(
                f,
                format_args!("[{host}] Certificate store '{store}' not found"),
                raw_message.as_ref(),
            ),
            Self::EnrollmentRejected {
                host,
                template,
                raw_message,
            } => {
                if let Some(template) = template {
                    write!(
                        f,
                        "[{host}] Enrollment rejected for template '{template}': {raw_message}"
                    )
                } else {
                    write!(f, "[{host}] Enrollment rejected: {raw_message}")
                }
            }
            Self::InvalidParameter {
                host,
                param,
                detail,
            } => {
                write!(f, "[{host}] Invalid parameter '{param}': {detail}")
            }
            Self::ParseError { host, detail } => {
                write!(f, "[{host}] Parse error: {detail}")
            }
            Self::Unknown {
                host, raw_message, ..
            } => {
                write!(f, "[{host}] {raw_message}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// Convenience type alias for `Result<T, ProviderError>`.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Raw error as reported by the remote management interface, before classification.
#[derive(Debug, Clone, Default)]
pub struct RawRemoteError {
    /// Native error code (Win32 / HRESULT), decimal or `0x`-prefixed hex.
    pub code: Option<String>,
    /// Original error message.
    pub message: String,
}

impl RawRemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    fn numeric_code(&self) -> Option<u32> {
        let code = self.code.as_deref()?.trim();
        if let Some(hex) = code
            .strip_prefix("0x")
            .or_else(|| code.strip_prefix("0X"))
        {
            u32::from_str_radix(hex, 16).ok()
        } else {
            // HRESULTs are sometimes rendered as negative i32 values.
            code.parse::<u32>()
                .ok()
                .or_else(|| code.parse::<i32>().ok().map(i32::cast_unsigned))
        }
    }
}

/// Extra context used when mapping a raw error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Zone involved in the failed call.
    pub zone: Option<String>,
    /// Record FQDN involved in the failed call.
    pub record: Option<String>,
    /// Store path involved in the failed call.
    pub store: Option<String>,
    /// Certificate template involved in the failed call.
    pub template: Option<String>,
}

/// `DNS_ERROR_ZONE_DOES_NOT_EXIST`
const DNS_ERROR_ZONE_DOES_NOT_EXIST: u32 = 9601;
/// `DNS_ERROR_ZONE_ALREADY_EXISTS`
const DNS_ERROR_ZONE_ALREADY_EXISTS: u32 = 9609;
/// `DNS_ERROR_RECORD_DOES_NOT_EXIST`
const DNS_ERROR_RECORD_DOES_NOT_EXIST: u32 = 9701;
/// `DNS_ERROR_RECORD_ALREADY_EXISTS`
const DNS_ERROR_RECORD_ALREADY_EXISTS: u32 = 9711;
const ERROR_ACCESS_DENIED: u32 = 5;
const ERROR_LOGON_FAILURE: u32 = 1326;
/// `CERTSRV_E_TEMPLATE_DENIED`
const CERTSRV_E_TEMPLATE_DENIED: u32 = 0x8009_4012;
/// `CERTSRV_E_UNSUPPORTED_CERT_TYPE`
const CERTSRV_E_UNSUPPORTED_CERT_TYPE: u32 = 0x8009_4800;

/// Maps raw remote errors onto [`ProviderError`].
///
/// Backends implement [`host`](Self::host); the default [`map_error`](Self::map_error)
/// understands the common Win32 / DNS server / certificate services codes and
/// falls back to [`ProviderError::Unknown`].
pub trait RemoteErrorMapper {
    /// Host identifier placed into every mapped error.
    fn host(&self) -> &str;

    fn map_error(&self, raw: RawRemoteError, context: ErrorContext) -> ProviderError {
        let host = self.host().to_string();
        match raw.numeric_code() {
            Some(DNS_ERROR_ZONE_DOES_NOT_EXIST) => ProviderError::ZoneNotFound {
                host,
                zone: context.zone.unwrap_or_default(),
                raw_message: Some(raw.message),
            },
            Some(DNS_ERROR_ZONE_ALREADY_EXISTS) => ProviderError::ZoneExists {
                host,
                zone: context.zone.unwrap_or_default(),
                raw_message: Some(raw.message),
            },
            Some(DNS_ERROR_RECORD_DOES_NOT_EXIST) => ProviderError::RecordNotFound {
                host,
                record: context.record.unwrap_or_default(),
                raw_message: Some(raw.message),
            },
            Some(DNS_ERROR_RECORD_ALREADY_EXISTS) => ProviderError::RecordExists {
                host,
                record: context.record.unwrap_or_default(),
                raw_message: Some(raw.message),
            },
            Some(ERROR_ACCESS_DENIED) => ProviderError::PermissionDenied {
                host,
                raw_message: Some(raw.message),
            },
            Some(ERROR_LOGON_FAILURE) => ProviderError::InvalidCredentials {
                host,
                raw_message: Some(raw.message),
            },
            Some(CERTSRV_E_TEMPLATE_DENIED | CERTSRV_E_UNSUPPORTED_CERT_TYPE) => {
                ProviderError::EnrollmentRejected {
                    host,
                    template: context.template,
                    raw_message: raw.message,
                }
            }
            _ => {
                log::debug!(
                    "[{host}] unmapped remote error code {:?}: {}",
                    raw.code,
                    raw.message
                );
                self.unknown_error(raw)
            }
        }
    }

    /// Shortcut: parse error.
    fn parse_error(&self, detail: impl ToString) -> ProviderError {
        ProviderError::ParseError {
            host: self.host().to_string(),
            detail: detail.to_string(),
        }
    }

    /// Shortcut: unknown error (fallback).
    fn unknown_error(&self, raw: RawRemoteError) -> ProviderError {
        ProviderError::Unknown {
            host: self.host().to_string(),
            raw_code: raw.code,
            raw_message: raw.message,
        }
    }
}
