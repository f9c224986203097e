//! 业务逻辑服务层
//!
//! Each service runs one invocation end to end:
//! validate → read → diff → apply → read back → report.

mod certificate_service;
mod dns_info_service;
mod record_service;
mod zone_service;

pub use certificate_service::CertificateService;
pub use dns_info_service::DnsInfoService;
pub use record_service::RecordService;
pub use zone_service::ZoneService;
