//! DNS resolution checks
//!
//! Answers one question: does a domain currently resolve to this server?
//! Lookup errors mean "not resolved" — propagation delay is an expected,
//! recoverable condition, never a deployment failure.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::errors::DeployerError;

/// DNS lookup backend
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve a host name to its addresses
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, DeployerError>;
}

/// System resolver backed by the OS lookup path
pub struct SystemResolver;

#[async_trait]
impl Resolver for SystemResolver {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, DeployerError> {
        let addrs = tokio::net::lookup_host(format!("{}:80", host))
            .await
            .map_err(|e| DeployerError::DomainError(format!("DNS lookup failed for {}: {}", host, e)))?;

        let mut ips: Vec<IpAddr> = addrs.map(|a| a.ip()).collect();
        ips.dedup();
        Ok(ips)
    }
}

/// Result of a DNS pointing check
#[derive(Debug, Clone, Serialize)]
pub struct DnsCheck {
    /// Whether the expected IP was among the resolved addresses
    pub resolved: bool,

    /// All addresses the domain currently resolves to
    pub ips: Vec<IpAddr>,
}

/// Checks whether domains point at this server
pub struct DnsChecker {
    resolver: Arc<dyn Resolver>,
}

impl DnsChecker {
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self { resolver }
    }

    /// Check whether `domain` resolves to `expected_ip`.
    ///
    /// Any lookup error (timeout, NXDOMAIN, resolver unavailable) yields
    /// `resolved: false` with an empty address list.
    pub async fn check(&self, domain: &str, expected_ip: IpAddr) -> DnsCheck {
        match self.resolver.lookup(domain).await {
            Ok(ips) => {
                let resolved = ips.contains(&expected_ip);
                debug!("DNS check for {}: resolved={} ips={:?}", domain, resolved, ips);
                DnsCheck { resolved, ips }
            }
            Err(e) => {
                debug!("DNS check for {} treated as unresolved: {}", domain, e);
                DnsCheck {
                    resolved: false,
                    ips: Vec::new(),
                }
            }
        }
    }

    /// Shorthand for callers that only care about the boolean outcome
    pub async fn resolves(&self, domain: &str, expected_ip: IpAddr) -> bool {
        self.check(domain, expected_ip).await.resolved
    }
}
