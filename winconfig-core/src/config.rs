//! 会话配置

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Default per-call timeout, in seconds.
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 60;

/// Immutable configuration carried by a [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Target host, used in logs and error messages.
    pub host: String,
    /// Upper bound for every single remote call.
    pub operation_timeout_secs: u64,
    /// Plan and report without applying anything.
    pub check_mode: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            operation_timeout_secs: DEFAULT_OPERATION_TIMEOUT_SECS,
            check_mode: false,
        }
    }
}

impl SessionConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// 从 JSON 解析并校验
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CoreError::validation(format!("invalid session config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.host.trim().is_empty() {
            return Err(CoreError::validation("session host must not be empty"));
        }
        if self.operation_timeout_secs == 0 {
            return Err(CoreError::validation(
                "operation_timeout_secs must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    #[must_use]
    pub fn with_check_mode(mut self, check_mode: bool) -> Self {
        self.check_mode = check_mode;
        self
    }

    #[must_use]
    pub fn with_operation_timeout_secs(mut self, secs: u64) -> Self {
        self.operation_timeout_secs = secs;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = SessionConfig::from_json(r#"{"host": "dc01.corp.example"}"#).unwrap();
        assert_eq!(config.host, "dc01.corp.example");
        assert_eq!(config.operation_timeout_secs, 60);
        assert!(!config.check_mode);
        assert_eq!(config.operation_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = SessionConfig::from_json(r#"{"host": "dc01", "operation_timeout_secs": 0}"#)
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = SessionConfig::from_json(r#"{"host": "dc01", "retries": 3}"#).unwrap_err();
        assert!(err.to_string().contains("retries"));
    }

    #[test]
    fn rejects_blank_host() {
        assert!(SessionConfig::new("  ").validate().is_err());
    }
}
