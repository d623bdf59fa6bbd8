//! Website models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Publish status of a website
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    Draft,
    Published,
    Error,
}

/// DNS pointing status of a website's domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DnsStatus {
    Pending,
    Resolved,
}

/// TLS certificate status of a website's domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsStatus {
    Pending,
    Active,
}

/// A user's website record
///
/// Owned by the surrounding application; the orchestrator mutates the
/// publish/dns/tls fields only after a deploy or undeploy completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Website {
    /// Unique website ID
    pub id: String,

    /// Domain in display form (may contain non-ASCII labels)
    pub domain: String,

    /// Generated site content (opaque HTML blob)
    pub content: String,

    /// Current publish status
    pub publish_status: PublishStatus,

    /// Current DNS pointing status
    pub dns_status: DnsStatus,

    /// Current TLS status
    pub tls_status: TlsStatus,

    /// When the site was last successfully deployed
    pub deployed_at: Option<DateTime<Utc>>,
}

impl Website {
    /// Create a new draft website
    pub fn new(id: impl Into<String>, domain: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            domain: domain.into(),
            content: content.into(),
            publish_status: PublishStatus::Draft,
            dns_status: DnsStatus::Pending,
            tls_status: TlsStatus::Pending,
            deployed_at: None,
        }
    }
}
