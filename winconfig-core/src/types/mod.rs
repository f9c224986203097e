//! Core layer type definitions

mod certificate;
mod info;
mod operation;
mod record;
mod zone;

pub use certificate::{
    CertificateDeclaration, CertificateListReport, CertificateReport, CertificateView,
};
pub use info::{DnsInfoQuery, DnsInfoReport, InfoKind, ZoneInfo};
pub use operation::{Operation, Phase, ReconcilePlan, RecreateReason};
pub use record::{DEFAULT_TTL, DesiredRecordSet, RecordDeclaration, RecordReport, RecordEntry};
pub use zone::{DesiredZone, ResourceState, ZoneDeclaration, ZoneReport, ZoneSnapshot};

// Re-export library types
pub use winconfig_provider::{
    Certificate, CertificateExtension, DnsRecord, DynamicUpdate, EnrollmentRequest, RecordData,
    RecordFilter, RecordType, ReplicationScope, StoreDescriptor, StoreLocation, Zone, ZoneFilter,
    ZoneType,
};
