//! Deployment models
//!
//! A deployment record is created at the start of every deploy attempt and
//! never deleted; it is the audit trail and the rollback source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::{generate_uuid, sha256_hash};

/// Deployment status
///
/// Transitions are one-directional; no status regresses except the explicit
/// rollback annotation on a completed deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    /// Record created, pipeline not yet started
    Pending,

    /// Pipeline in progress
    Deploying,

    /// Pipeline finished, site is live
    Completed,

    /// Pipeline aborted by a fatal step failure
    Failed,

    /// A later rollback re-published an earlier snapshot over this one
    RolledBack,
}

impl DeploymentStatus {
    /// Whether a transition to `next` is allowed
    pub fn can_transition(&self, next: DeploymentStatus) -> bool {
        matches!(
            (self, next),
            (DeploymentStatus::Pending, DeploymentStatus::Deploying)
                | (DeploymentStatus::Deploying, DeploymentStatus::Completed)
                | (DeploymentStatus::Deploying, DeploymentStatus::Failed)
                | (DeploymentStatus::Completed, DeploymentStatus::RolledBack)
        )
    }
}

/// A single deployment attempt for a website
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    /// Unique deployment ID
    pub id: String,

    /// Website this deployment belongs to
    pub website_id: String,

    /// Target domain in canonical (ASCII-compatible) form
    pub domain: String,

    /// Current status
    pub status: DeploymentStatus,

    /// Directory the site content was materialized into
    pub server_path: String,

    /// Site content as deployed, kept so a later rollback can re-publish
    /// these exact bytes
    pub content_snapshot: String,

    /// SHA256 digest of the content snapshot
    pub content_digest: String,

    /// Human-readable trace of the steps taken, append-only
    pub log: String,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
}

impl Deployment {
    /// Create a new pending deployment
    pub fn new(
        website_id: impl Into<String>,
        domain: impl Into<String>,
        server_path: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        let content = content.into();
        Self {
            id: generate_uuid(),
            website_id: website_id.into(),
            domain: domain.into(),
            status: DeploymentStatus::Pending,
            server_path: server_path.into(),
            content_digest: sha256_hash(content.as_bytes()),
            content_snapshot: content,
            log: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition to a new status, rejecting anything not in the table
    pub fn transition(&mut self, next: DeploymentStatus) -> Result<(), String> {
        if !self.status.can_transition(next) {
            return Err(format!(
                "Invalid transition: {:?} -> {:?}",
                self.status, next
            ));
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Append a timestamped line to the deployment log
    pub fn append_log(&mut self, line: &str) {
        let stamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        self.log.push_str(&format!("[{}] {}\n", stamp, line));
        self.updated_at = Utc::now();
    }
}
