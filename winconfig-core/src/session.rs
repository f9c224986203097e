//! 会话 - 持有远端后端与配置
//!
//! A [`Session`] replaces any notion of a global connection: it is built once
//! with the backends for one host, opened, handed to services, and closed.
//! It keeps no reconciliation state between invocations.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use winconfig_provider::{CertificateAuthority, CertificateStore, DnsServer, ProviderError};

use crate::clock::{Clock, SystemClock};
use crate::config::SessionConfig;
use crate::error::{CoreError, CoreResult};

/// 会话构建器
pub struct SessionBuilder {
    config: SessionConfig,
    dns_server: Option<Arc<dyn DnsServer>>,
    certificate_store: Option<Arc<dyn CertificateStore>>,
    certificate_authority: Option<Arc<dyn CertificateAuthority>>,
    clock: Arc<dyn Clock>,
}

impl SessionBuilder {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            dns_server: None,
            certificate_store: None,
            certificate_authority: None,
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn dns_server(mut self, server: Arc<dyn DnsServer>) -> Self {
        self.dns_server = Some(server);
        self
    }

    #[must_use]
    pub fn certificate_store(mut self, store: Arc<dyn CertificateStore>) -> Self {
        self.certificate_store = Some(store);
        self
    }

    #[must_use]
    pub fn certificate_authority(mut self, authority: Arc<dyn CertificateAuthority>) -> Self {
        self.certificate_authority = Some(authority);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 校验配置并创建（未打开的）会话
    pub fn build(self) -> CoreResult<Session> {
        self.config.validate()?;
        Ok(Session {
            config: self.config,
            dns_server: self.dns_server,
            certificate_store: self.certificate_store,
            certificate_authority: self.certificate_authority,
            clock: self.clock,
            open: AtomicBool::new(false),
        })
    }
}

/// 会话
///
/// Safe to share (`Arc<Session>`) between concurrent invocations. Every remote
/// call goes through [`Session::call`], which enforces the operation timeout.
pub struct Session {
    config: SessionConfig,
    dns_server: Option<Arc<dyn DnsServer>>,
    certificate_store: Option<Arc<dyn CertificateStore>>,
    certificate_authority: Option<Arc<dyn CertificateAuthority>>,
    clock: Arc<dyn Clock>,
    open: AtomicBool,
}

impl Session {
    #[must_use]
    pub fn builder(config: SessionConfig) -> SessionBuilder {
        SessionBuilder::new(config)
    }

    pub fn open(&self) {
        if !self.open.swap(true, Ordering::SeqCst) {
            log::debug!("Session opened for {}", self.config.host);
        }
    }

    pub fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            log::debug!("Session closed for {}", self.config.host);
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    pub fn check_mode(&self) -> bool {
        self.config.check_mode
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn ensure_open(&self) -> CoreResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(CoreError::SessionClosed)
        }
    }

    pub fn dns_server(&self) -> CoreResult<&Arc<dyn DnsServer>> {
        self.dns_server
            .as_ref()
            .ok_or(CoreError::MissingBackend("DNS server"))
    }

    pub fn certificate_store(&self) -> CoreResult<&Arc<dyn CertificateStore>> {
        self.certificate_store
            .as_ref()
            .ok_or(CoreError::MissingBackend("certificate store"))
    }

    pub fn certificate_authority(&self) -> CoreResult<&Arc<dyn CertificateAuthority>> {
        self.certificate_authority
            .as_ref()
            .ok_or(CoreError::MissingBackend("certificate authority"))
    }

    /// 执行一次远端调用
    ///
    /// Fails with [`CoreError::SessionClosed`] on a closed session, and with
    /// [`CoreError::RemoteCommunication`] when the call outlives the operation
    /// timeout. Provider errors are classified through `From<ProviderError>`.
    pub async fn call<T, F>(&self, what: &str, fut: F) -> CoreResult<T>
    where
        F: Future<Output = winconfig_provider::Result<T>>,
    {
        self.ensure_open()?;
        let timeout = self.config.operation_timeout();
        match tokio::time::timeout(timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                if e.is_expected() {
                    log::warn!("{what} failed: {e}");
                } else {
                    log::error!("{what} failed: {e}");
                }
                Err(e.into())
            }
            Err(_) => {
                log::error!(
                    "{what} did not complete within {}s on {}",
                    timeout.as_secs(),
                    self.config.host
                );
                Err(CoreError::RemoteCommunication(ProviderError::Timeout {
                    host: self.config.host.clone(),
                    detail: format!("{what} did not complete within {}s", timeout.as_secs()),
                }))
            }
        }
    }
}
