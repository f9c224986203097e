//! 共享测试工具和辅助函数

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use winconfig_provider::{
    DnsRecord, DnsServer, ProviderError, RecordFilter, Result, StoredCertificate, Zone, ZoneFilter,
};

/// 断言 `Option` 为 `Some`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_some {
    ($expr:expr $(,)?) => {{
        let opt = $expr;
        assert!(opt.is_some(), "expected Some(..), got None");
        let Some(val) = opt else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let opt = $expr;
        assert!(opt.is_some(), "{}", format_args!($($msg)+));
        let Some(val) = opt else {
            return;
        };
        val
    }};
}

/// 断言 `Result` 为 `Ok`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let res = $expr;
        assert!(
            res.is_ok(),
            "{}: {res:?}",
            format_args!($($msg)+)
        );
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

/// 读取 testdata/certs 下的证书夹具
pub fn fixture(name: &str) -> Vec<u8> {
    let path = format!("{}/../testdata/certs/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read(&path).unwrap_or_default()
}

/// 包装为存储中的证书条目
pub fn stored(name: &str, has_private_key: bool) -> StoredCertificate {
    StoredCertificate {
        der: fixture(name),
        has_private_key,
        archived: false,
        friendly_name: String::new(),
    }
}

/// 只实现必需方法的内存 DNS 服务器，用于验证 Trait 默认方法
#[derive(Default)]
pub struct InMemoryDnsServer {
    pub zones: Vec<Zone>,
    pub records: HashMap<String, Vec<DnsRecord>>,
    /// 对这些 Zone 的 `list_records` 调用返回错误
    pub failing_zones: Vec<String>,
    pub list_records_calls: Mutex<Vec<String>>,
}

#[async_trait]
impl DnsServer for InMemoryDnsServer {
    fn id(&self) -> &str {
        "dc01"
    }

    async fn list_zones(&self, filter: &ZoneFilter) -> Result<Vec<Zone>> {
        Ok(self
            .zones
            .iter()
            .filter(|z| filter.matches(z))
            .cloned()
            .collect())
    }

    async fn list_records(&self, zone: &str, filter: &RecordFilter) -> Result<Vec<DnsRecord>> {
        if let Ok(mut calls) = self.list_records_calls.lock() {
            calls.push(zone.to_string());
        }
        if self.failing_zones.iter().any(|z| z == zone) {
            return Err(ProviderError::Timeout {
                host: self.id().to_string(),
                detail: format!("Get-DnsServerResourceRecord -ZoneName {zone}"),
            });
        }
        Ok(self
            .records
            .get(zone)
            .map(|rs| rs.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default())
    }

    async fn create_zone(&self, _zone: &Zone) -> Result<()> {
        Ok(())
    }

    async fn modify_zone(&self, _zone: &Zone) -> Result<()> {
        Ok(())
    }

    async fn delete_zone(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    async fn add_record(&self, _record: &DnsRecord) -> Result<()> {
        Ok(())
    }

    async fn update_record(&self, _record: &DnsRecord) -> Result<()> {
        Ok(())
    }

    async fn remove_record(&self, _record: &DnsRecord) -> Result<()> {
        Ok(())
    }
}
