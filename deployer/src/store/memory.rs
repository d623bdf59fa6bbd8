//! In-memory record store

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::normalize;
use crate::errors::DeployerError;
use crate::models::deployment::{Deployment, DeploymentStatus};
use crate::models::website::Website;
use crate::store::RecordStore;

/// A record store backed by in-process maps
///
/// Used by tests and by embedders that have not wired a database yet.
#[derive(Default)]
pub struct MemoryStore {
    websites: RwLock<HashMap<String, Website>>,
    deployments: RwLock<Vec<Deployment>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get_website(&self, website_id: &str) -> Result<Option<Website>, DeployerError> {
        Ok(self.websites.read().await.get(website_id).cloned())
    }

    async fn insert_website(&self, website: &Website) -> Result<(), DeployerError> {
        self.websites
            .write()
            .await
            .insert(website.id.clone(), website.clone());
        Ok(())
    }

    async fn update_website(&self, website: &Website) -> Result<(), DeployerError> {
        let mut websites = self.websites.write().await;
        if !websites.contains_key(&website.id) {
            return Err(DeployerError::StoreError(format!(
                "No website with id {}",
                website.id
            )));
        }
        websites.insert(website.id.clone(), website.clone());
        Ok(())
    }

    async fn find_website_by_domain(
        &self,
        canonical_domain: &str,
    ) -> Result<Option<Website>, DeployerError> {
        Ok(self
            .websites
            .read()
            .await
            .values()
            .find(|w| normalize(&w.domain) == canonical_domain)
            .cloned())
    }

    async fn get_deployment(
        &self,
        deployment_id: &str,
    ) -> Result<Option<Deployment>, DeployerError> {
        Ok(self
            .deployments
            .read()
            .await
            .iter()
            .find(|d| d.id == deployment_id)
            .cloned())
    }

    async fn insert_deployment(&self, deployment: &Deployment) -> Result<(), DeployerError> {
        self.deployments.write().await.push(deployment.clone());
        Ok(())
    }

    async fn update_deployment(&self, deployment: &Deployment) -> Result<(), DeployerError> {
        let mut deployments = self.deployments.write().await;
        match deployments.iter_mut().find(|d| d.id == deployment.id) {
            Some(existing) => {
                *existing = deployment.clone();
                Ok(())
            }
            None => Err(DeployerError::StoreError(format!(
                "No deployment with id {}",
                deployment.id
            ))),
        }
    }

    async fn recent_deployments(
        &self,
        website_id: &str,
        limit: usize,
    ) -> Result<Vec<Deployment>, DeployerError> {
        let deployments = self.deployments.read().await;
        let mut matching: Vec<Deployment> = deployments
            .iter()
            .filter(|d| d.website_id == website_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn latest_completed_before(
        &self,
        website_id: &str,
        before: DateTime<Utc>,
    ) -> Result<Option<Deployment>, DeployerError> {
        let deployments = self.deployments.read().await;
        Ok(deployments
            .iter()
            .filter(|d| {
                d.website_id == website_id
                    && d.status == DeploymentStatus::Completed
                    && d.created_at < before
            })
            .max_by_key(|d| d.created_at)
            .cloned())
    }
}
