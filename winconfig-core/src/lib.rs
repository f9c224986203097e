//! Windows Server 配置协调核心库
//!
//! Idempotent reconciliation of DNS zones, DNS records and CA-issued
//! certificates on a managed Windows host:
//! - Zone reconciliation (`ZoneService`)
//! - Record set reconciliation (`RecordService`)
//! - Certificate reuse / issuance (`CertificateService`)
//! - Read-only DNS queries (`DnsInfoService`)
//!
//! The remote host is reached only through the `winconfig-provider` traits,
//! injected into a [`Session`].

pub mod applier;
pub mod clock;
pub mod config;
pub mod diff;
pub mod error;
pub mod reader;
pub mod reporter;
pub mod services;
pub mod session;
pub mod types;
pub mod validation;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test_utils;

// Re-export common types
pub use config::SessionConfig;
pub use error::{CoreError, CoreResult};
pub use services::{CertificateService, DnsInfoService, RecordService, ZoneService};
pub use session::{Session, SessionBuilder};
