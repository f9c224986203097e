//! # winconfig-provider
//!
//! Remote contracts and data model for reconciling a Windows Server host:
//! DNS zones and records, certificate stores and a certificate authority.
//!
//! The crate does not talk to any host by itself. A backend implements the
//! three async traits over whatever channel reaches the machine, and the
//! reconciliation engine in `winconfig-core` drives them.
//!
//! | Trait | Covers |
//! |-------|--------|
//! | [`DnsServer`] | zones (primary, secondary, stub, forwarder) and their records |
//! | [`CertificateStore`] | listing and importing certificates in a store such as `LocalMachine\My` |
//! | [`CertificateAuthority`] | template-based enrollment |
//!
//! ## Usage
//!
//! ```rust,no_run
//! use winconfig_provider::{DnsServer, RecordFilter, ZoneFilter};
//!
//! async fn dump(server: &dyn DnsServer) -> winconfig_provider::Result<()> {
//!     let all = server
//!         .list_zones_with_records(&ZoneFilter::default(), &RecordFilter::default())
//!         .await?;
//!     for (zone, records) in &all {
//!         println!("{} ({}, {} records)", zone.name, zone.zone_type, records.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Certificates
//!
//! Stores hand back raw DER blobs ([`StoredCertificate`]).
//! [`Certificate::from_stored`] decodes one into a full snapshot: thumbprint,
//! SAN names, key usages, template, rendered extensions and so on.
//!
//! ## Error Handling
//!
//! All remote operations return [`Result<T, ProviderError>`](ProviderError).
//! Backends classify native Windows error codes with [`RemoteErrorMapper`].
//! Nothing in this crate retries.

mod error;
mod traits;
mod types;
mod utils;
mod x509;

// Re-export error types
pub use error::{ErrorContext, ProviderError, RawRemoteError, RemoteErrorMapper, Result};

// Re-export remote contracts
pub use traits::{CertificateAuthority, CertificateStore, DnsServer};

// Re-export types
pub use types::{
    Certificate, CertificateExtension, DnsRecord, DynamicUpdate, EnrollmentRequest,
    IssuedCertificate, ParseEnumError, RecordData, RecordFilter, RecordType, ReplicationScope,
    StoreDescriptor, StoreLocation, StoredCertificate, Zone, ZoneFilter, ZoneType,
    normalize_hostname,
};

// Re-export certificate decoding
pub use x509::{CertificateDecodeError, thumbprint};

// Re-export utils module
pub use utils::datetime;
