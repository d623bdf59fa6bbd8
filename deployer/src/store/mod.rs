//! Record store interface
//!
//! The persistence engine behind websites and deployments lives in the
//! surrounding application; the orchestrator consumes it through this trait
//! so tests (and embedders without a database) can substitute their own.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::DeployerError;
use crate::models::deployment::Deployment;
use crate::models::website::Website;

/// CRUD over website and deployment records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load a website by ID
    async fn get_website(&self, website_id: &str) -> Result<Option<Website>, DeployerError>;

    /// Insert a website record
    async fn insert_website(&self, website: &Website) -> Result<(), DeployerError>;

    /// Persist changes to an existing website record
    async fn update_website(&self, website: &Website) -> Result<(), DeployerError>;

    /// Find the website whose domain normalizes to the given canonical form
    async fn find_website_by_domain(
        &self,
        canonical_domain: &str,
    ) -> Result<Option<Website>, DeployerError>;

    /// Load a deployment by ID
    async fn get_deployment(&self, deployment_id: &str)
        -> Result<Option<Deployment>, DeployerError>;

    /// Insert a deployment record
    async fn insert_deployment(&self, deployment: &Deployment) -> Result<(), DeployerError>;

    /// Persist changes to an existing deployment record
    async fn update_deployment(&self, deployment: &Deployment) -> Result<(), DeployerError>;

    /// Most recent deployments for a website, newest first
    async fn recent_deployments(
        &self,
        website_id: &str,
        limit: usize,
    ) -> Result<Vec<Deployment>, DeployerError>;

    /// Most recent completed deployment for a website created strictly
    /// before the given instant
    async fn latest_completed_before(
        &self,
        website_id: &str,
        before: DateTime<Utc>,
    ) -> Result<Option<Deployment>, DeployerError>;
}
