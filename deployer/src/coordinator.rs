//! Deployment coordination
//!
//! Sequences the full deploy pipeline — normalize, materialize, configure
//! the proxy, check DNS, provision TLS — while persisting each deployment's
//! lifecycle and keeping the owning website's status in step. Steps are
//! strictly ordered because each one's input depends on the previous one's
//! side effect: the proxy must point at the site directory before TLS
//! materials are wired in.
//!
//! Filesystem and proxy failures are fatal for the attempt; DNS and
//! certificate failures degrade the outcome but still complete it.

use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::certs::{CertAuthority, CertProvisioner};
use crate::dns::{DnsCheck, DnsChecker, Resolver};
use crate::domain::normalize;
use crate::errors::DeployerError;
use crate::locks::DomainLocks;
use crate::materialize::{materialize, remove_site};
use crate::models::deployment::{Deployment, DeploymentStatus};
use crate::models::website::{DnsStatus, PublishStatus, TlsStatus, Website};
use crate::options::DeployerOptions;
use crate::proxy::{ProxyConfigurator, ProxyDaemon};
use crate::store::RecordStore;

/// Result of a completed deploy or rollback
#[derive(Debug, Clone, Serialize)]
pub struct DeployOutcome {
    /// ID of the deployment record this run created
    pub deployment_id: String,

    /// Canonical domain the site was deployed under
    pub domain: String,

    /// Whether DNS resolution confirmed the domain points here
    pub dns_resolved: bool,

    /// Whether a certificate was issued and the TLS stanza activated
    pub tls_active: bool,

    /// Human-readable summary
    pub message: String,
}

/// Orchestrates website deployments
///
/// Holds its collaborators explicitly so embedders and tests construct it
/// with whatever record store, proxy daemon, resolver and certificate
/// client they need.
pub struct Coordinator {
    options: DeployerOptions,
    store: Arc<dyn RecordStore>,
    configurator: Arc<ProxyConfigurator>,
    dns: DnsChecker,
    certs: CertProvisioner,
    locks: DomainLocks,
}

impl Coordinator {
    pub fn new(
        options: DeployerOptions,
        store: Arc<dyn RecordStore>,
        daemon: Arc<dyn ProxyDaemon>,
        resolver: Arc<dyn Resolver>,
        authority: Arc<dyn CertAuthority>,
    ) -> Self {
        let configurator = Arc::new(ProxyConfigurator::new(options.layout.clone(), daemon));
        let certs = CertProvisioner::new(
            authority,
            configurator.clone(),
            options.contact_email.clone(),
        );
        Self {
            options,
            store,
            configurator,
            dns: DnsChecker::new(resolver),
            certs,
            locks: DomainLocks::new(),
        }
    }

    /// Deploy a website's content to a domain.
    ///
    /// Creates a deployment record, runs the pipeline and marks the record
    /// completed or failed. On failure the website record is left
    /// unmodified so a previously published site is not demoted by a
    /// failed re-deploy.
    pub async fn deploy(
        &self,
        website_id: &str,
        domain: &str,
        content: &str,
    ) -> Result<DeployOutcome, DeployerError> {
        if domain.trim().is_empty() {
            return Err(DeployerError::ValidationError(
                "domain is required".to_string(),
            ));
        }
        let website = self.load_website(website_id).await?;

        let canonical = normalize(domain);
        let _guard = self.locks.acquire(&canonical).await;
        self.deploy_locked(&website, domain, &canonical, content)
            .await
    }

    /// Submit a deploy as a background task.
    ///
    /// The returned handle carries the typed result; failures are also
    /// observable through the persisted deployment record, so callers may
    /// drop the handle and poll `status` instead.
    pub fn deploy_in_background(
        self: Arc<Self>,
        website_id: String,
        domain: String,
        content: String,
    ) -> JoinHandle<Result<DeployOutcome, DeployerError>> {
        let coordinator = self;
        tokio::spawn(async move {
            let result = coordinator.deploy(&website_id, &domain, &content).await;
            if let Err(e) = &result {
                error!("Background deploy of {} failed: {}", domain, e);
            }
            result
        })
    }

    /// Take a domain offline: remove its site files and proxy config,
    /// attempt certificate revocation (non-fatal) and demote the owning
    /// website back to draft.
    pub async fn undeploy(&self, domain: &str) -> Result<String, DeployerError> {
        if domain.trim().is_empty() {
            return Err(DeployerError::ValidationError(
                "domain is required".to_string(),
            ));
        }

        let canonical = normalize(domain);
        let _guard = self.locks.acquire(&canonical).await;
        info!("Undeploying {}", canonical);

        remove_site(&self.options.layout.site_dir(&canonical)).await?;
        self.configurator.remove(&canonical).await?;

        if !self.certs.revoke(&canonical).await {
            warn!("Proceeding despite failed revocation for {}", canonical);
        }

        if let Some(mut website) = self.store.find_website_by_domain(&canonical).await? {
            website.publish_status = PublishStatus::Draft;
            website.dns_status = DnsStatus::Pending;
            website.tls_status = TlsStatus::Pending;
            website.deployed_at = None;
            self.store.update_website(&website).await?;
            info!("Website {} demoted to draft", website.id);
        }

        Ok(format!("{} has been taken offline", canonical))
    }

    /// Most recent deployment records for a website, newest first
    pub async fn status(&self, website_id: &str) -> Result<Vec<Deployment>, DeployerError> {
        self.load_website(website_id).await?;
        self.store
            .recent_deployments(website_id, self.options.status_history_len)
            .await
    }

    /// Check whether a domain currently resolves to the given IP
    pub async fn check_dns(&self, domain: &str, expected_ip: IpAddr) -> DnsCheck {
        self.dns.check(&normalize(domain), expected_ip).await
    }

    /// Re-publish an earlier snapshot over a completed deployment.
    ///
    /// The named deployment must be completed; the content comes from the
    /// most recent completed deployment created strictly before it.
    pub async fn rollback(
        &self,
        website_id: &str,
        deployment_id: &str,
    ) -> Result<DeployOutcome, DeployerError> {
        let website = self.load_website(website_id).await?;

        // First read only resolves the lock key; eligibility is decided on
        // a fresh read below, with the domain lock held, so two concurrent
        // rollbacks of the same deployment cannot both observe it completed
        let domain = self
            .store
            .get_deployment(deployment_id)
            .await?
            .ok_or_else(|| {
                DeployerError::NotFound(format!("No deployment with id {}", deployment_id))
            })?
            .domain;
        let _guard = self.locks.acquire(&domain).await;

        let mut target = self
            .store
            .get_deployment(deployment_id)
            .await?
            .ok_or_else(|| {
                DeployerError::NotFound(format!("No deployment with id {}", deployment_id))
            })?;
        if target.website_id != website_id {
            return Err(DeployerError::ValidationError(format!(
                "Deployment {} does not belong to website {}",
                deployment_id, website_id
            )));
        }
        if target.status != DeploymentStatus::Completed {
            return Err(DeployerError::RollbackError(format!(
                "Deployment {} is not in a rollback-eligible status ({:?})",
                deployment_id, target.status
            )));
        }

        let prior = self
            .store
            .latest_completed_before(website_id, target.created_at)
            .await?
            .ok_or_else(|| {
                DeployerError::RollbackError(
                    "no previous deployment to roll back to".to_string(),
                )
            })?;

        info!(
            "Rolling back website {}: re-publishing deployment {} over {}",
            website_id, prior.id, target.id
        );

        let outcome = self
            .deploy_locked(
                &website,
                &target.domain,
                &target.domain,
                &prior.content_snapshot,
            )
            .await?;

        target.append_log(&format!("rolled back to deployment {}", prior.id));
        target
            .transition(DeploymentStatus::RolledBack)
            .map_err(DeployerError::Internal)?;
        self.store.update_deployment(&target).await?;

        Ok(outcome)
    }

    // ================================ PIPELINE ================================ //

    /// Run a deploy with the domain lock already held
    async fn deploy_locked(
        &self,
        website: &Website,
        display_domain: &str,
        canonical: &str,
        content: &str,
    ) -> Result<DeployOutcome, DeployerError> {
        let site_dir = self.options.layout.site_dir(canonical);
        info!("Deploying website {} to {}", website.id, canonical);

        let mut deployment = Deployment::new(
            &website.id,
            canonical,
            site_dir.display().to_string(),
            content,
        );
        deployment.append_log(&format!(
            "deployment created for {} -> {}",
            display_domain, canonical
        ));
        self.store.insert_deployment(&deployment).await?;

        deployment
            .transition(DeploymentStatus::Deploying)
            .map_err(DeployerError::Internal)?;
        deployment.append_log("starting deployment pipeline");
        self.store.update_deployment(&deployment).await?;

        let (dns_resolved, tls_active) = match self
            .run_pipeline(&mut deployment, canonical, &site_dir, content)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                // Capture the failure into the audit trail before re-raising
                self.fail_deployment(&mut deployment, &e).await;
                return Err(e);
            }
        };

        deployment.append_log(&format!(
            "deployment completed (dns: {}, tls: {})",
            if dns_resolved { "resolved" } else { "pending" },
            if tls_active { "active" } else { "pending" },
        ));
        deployment
            .transition(DeploymentStatus::Completed)
            .map_err(DeployerError::Internal)?;
        self.store.update_deployment(&deployment).await?;

        let mut website = website.clone();
        website.publish_status = PublishStatus::Published;
        website.dns_status = if dns_resolved {
            DnsStatus::Resolved
        } else {
            DnsStatus::Pending
        };
        website.tls_status = if tls_active {
            TlsStatus::Active
        } else {
            TlsStatus::Pending
        };
        website.deployed_at = Some(chrono::Utc::now());
        self.store.update_website(&website).await?;

        let message = format!(
            "Deployment of {} completed (dns: {}, tls: {})",
            canonical,
            if dns_resolved { "resolved" } else { "pending" },
            if tls_active { "active" } else { "pending" },
        );
        info!("{}", message);

        Ok(DeployOutcome {
            deployment_id: deployment.id,
            domain: canonical.to_string(),
            dns_resolved,
            tls_active,
            message,
        })
    }

    /// The sequential pipeline body: materialize, configure, check DNS,
    /// provision TLS. Returns `(dns_resolved, tls_active)`.
    async fn run_pipeline(
        &self,
        deployment: &mut Deployment,
        canonical: &str,
        site_dir: &Path,
        content: &str,
    ) -> Result<(bool, bool), DeployerError> {
        materialize(site_dir, canonical, content).await?;
        deployment.append_log(&format!(
            "site content materialized at {}",
            site_dir.display()
        ));
        self.store.update_deployment(deployment).await?;

        self.configurator.configure(canonical, site_dir, false).await?;
        deployment.append_log("proxy config installed (plain)");
        self.store.update_deployment(deployment).await?;

        let check = self.dns.check(canonical, self.options.server_ip).await;
        if check.resolved {
            deployment.append_log(&format!("dns: {} resolves to this server", canonical));
        } else {
            deployment.append_log(&format!(
                "dns: {} does not resolve here yet, certificate step skipped",
                canonical
            ));
        }
        self.store.update_deployment(deployment).await?;

        let mut tls_active = false;
        if check.resolved {
            tls_active = self.certs.provision(canonical, site_dir).await;
            if tls_active {
                deployment.append_log("tls: certificate issued, proxy switched to https");
            } else {
                deployment.append_log("tls: certificate issuance failed, site remains on http");
            }
            self.store.update_deployment(deployment).await?;
        }

        Ok((check.resolved, tls_active))
    }

    /// Record a fatal pipeline failure on the deployment; the website
    /// record is intentionally left untouched
    async fn fail_deployment(&self, deployment: &mut Deployment, err: &DeployerError) {
        error!("Deployment {} failed: {}", deployment.id, err);
        deployment.append_log(&format!("deployment failed: {}", err));
        if let Err(e) = deployment.transition(DeploymentStatus::Failed) {
            error!("Could not mark deployment {} failed: {}", deployment.id, e);
        }
        if let Err(e) = self.store.update_deployment(deployment).await {
            error!(
                "Could not persist failure of deployment {}: {}",
                deployment.id, e
            );
        }
    }

    async fn load_website(&self, website_id: &str) -> Result<Website, DeployerError> {
        self.store
            .get_website(website_id)
            .await?
            .ok_or_else(|| DeployerError::NotFound(format!("No website with id {}", website_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::SiteLayout;
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    const SERVER_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 10));

    struct OkDaemon;

    #[async_trait]
    impl ProxyDaemon for OkDaemon {
        async fn validate(&self) -> Result<(), DeployerError> {
            Ok(())
        }
        async fn reload(&self) -> Result<(), DeployerError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeResolver {
        ips: Mutex<Vec<IpAddr>>,
    }

    impl FakeResolver {
        async fn point_here(&self) {
            self.ips.lock().await.push(SERVER_IP);
        }
    }

    #[async_trait]
    impl Resolver for FakeResolver {
        async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, DeployerError> {
            let ips = self.ips.lock().await.clone();
            if ips.is_empty() {
                Err(DeployerError::DomainError(format!("NXDOMAIN: {}", host)))
            } else {
                Ok(ips)
            }
        }
    }

    #[derive(Default)]
    struct FakeAuthority {
        obtains: AtomicUsize,
        revokes: AtomicUsize,
        fail_obtain: AtomicBool,
    }

    #[async_trait]
    impl CertAuthority for FakeAuthority {
        async fn obtain(
            &self,
            _primary: &str,
            _alternate: &str,
            _email: &str,
        ) -> Result<(), DeployerError> {
            self.obtains.fetch_add(1, Ordering::SeqCst);
            if self.fail_obtain.load(Ordering::SeqCst) {
                Err(DeployerError::CertError("rate limited".to_string()))
            } else {
                Ok(())
            }
        }

        async fn revoke(&self, _primary: &str) -> Result<(), DeployerError> {
            self.revokes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Harness {
        coordinator: Arc<Coordinator>,
        store: Arc<MemoryStore>,
        resolver: Arc<FakeResolver>,
        authority: Arc<FakeAuthority>,
        root: tempfile::TempDir,
    }

    impl Harness {
        fn layout(&self) -> SiteLayout {
            self.coordinator.options.layout.clone()
        }

        async fn website(&self, id: &str) -> Website {
            self.store.get_website(id).await.unwrap().unwrap()
        }
    }

    async fn harness() -> Harness {
        let root = tempfile::tempdir().unwrap();
        let layout = SiteLayout::new(
            root.path().join("sites"),
            root.path().join("conf.d"),
            root.path().join("certs"),
        );
        let options = DeployerOptions {
            server_ip: SERVER_IP,
            layout,
            ..Default::default()
        };

        let store = Arc::new(MemoryStore::new());
        let resolver = Arc::new(FakeResolver::default());
        let authority = Arc::new(FakeAuthority::default());
        let coordinator = Arc::new(Coordinator::new(
            options,
            store.clone(),
            Arc::new(OkDaemon),
            resolver.clone(),
            authority.clone(),
        ));

        store
            .insert_website(&Website::new("w1", "example.com", "<html>v1</html>"))
            .await
            .unwrap();

        Harness {
            coordinator,
            store,
            resolver,
            authority,
            root,
        }
    }

    #[tokio::test]
    async fn test_deploy_with_dns_and_tls() {
        let h = harness().await;
        h.resolver.point_here().await;

        let outcome = h
            .coordinator
            .deploy("w1", "example.com", "<html>v1</html>")
            .await
            .unwrap();
        assert!(outcome.dns_resolved);
        assert!(outcome.tls_active);

        let index = h.layout().site_dir("example.com").join("index.html");
        assert_eq!(std::fs::read_to_string(index).unwrap(), "<html>v1</html>");

        // Cert issuance rewired the domain onto the TLS stanza
        let stanza =
            std::fs::read_to_string(h.layout().proxy_config_file("example.com")).unwrap();
        assert!(stanza.contains("ssl_certificate"));
        assert_eq!(h.authority.obtains.load(Ordering::SeqCst), 1);

        let website = h.website("w1").await;
        assert_eq!(website.publish_status, PublishStatus::Published);
        assert_eq!(website.dns_status, DnsStatus::Resolved);
        assert_eq!(website.tls_status, TlsStatus::Active);
        assert!(website.deployed_at.is_some());

        let deployment = h.store.recent_deployments("w1", 1).await.unwrap().remove(0);
        assert_eq!(deployment.status, DeploymentStatus::Completed);
        assert!(deployment.log.contains("deployment completed (dns: resolved, tls: active)"));
    }

    #[tokio::test]
    async fn test_deploy_dns_pending_skips_certificate() {
        let h = harness().await;

        let outcome = h
            .coordinator
            .deploy("w1", "example.com", "<html>v1</html>")
            .await
            .unwrap();
        assert!(!outcome.dns_resolved);
        assert!(!outcome.tls_active);
        assert_eq!(h.authority.obtains.load(Ordering::SeqCst), 0);

        // Still published, on the plain stanza
        let website = h.website("w1").await;
        assert_eq!(website.publish_status, PublishStatus::Published);
        assert_eq!(website.dns_status, DnsStatus::Pending);
        assert_eq!(website.tls_status, TlsStatus::Pending);

        let stanza =
            std::fs::read_to_string(h.layout().proxy_config_file("example.com")).unwrap();
        assert!(!stanza.contains("ssl_certificate"));

        let deployment = h.store.recent_deployments("w1", 1).await.unwrap().remove(0);
        assert_eq!(deployment.status, DeploymentStatus::Completed);
    }

    #[tokio::test]
    async fn test_deploy_cert_failure_degrades_not_aborts() {
        let h = harness().await;
        h.resolver.point_here().await;
        h.authority.fail_obtain.store(true, Ordering::SeqCst);

        let outcome = h
            .coordinator
            .deploy("w1", "example.com", "<html>v1</html>")
            .await
            .unwrap();
        assert!(outcome.dns_resolved);
        assert!(!outcome.tls_active);

        let website = h.website("w1").await;
        assert_eq!(website.publish_status, PublishStatus::Published);
        assert_eq!(website.tls_status, TlsStatus::Pending);
    }

    #[tokio::test]
    async fn test_deploy_materialize_failure_marks_failed() {
        let h = harness().await;

        // Occupy the sites path with a regular file so directory creation
        // inside it fails
        std::fs::write(h.root.path().join("sites"), "not a directory").unwrap();

        let before = h.website("w1").await;
        let result = h
            .coordinator
            .deploy("w1", "example.com", "<html>v1</html>")
            .await;
        assert!(matches!(result, Err(DeployerError::MaterializeError(_))));

        let deployment = h.store.recent_deployments("w1", 1).await.unwrap().remove(0);
        assert_eq!(deployment.status, DeploymentStatus::Failed);
        assert!(deployment.log.contains("deployment failed:"));

        // Website record untouched by the failed attempt
        let after = h.website("w1").await;
        assert_eq!(after.publish_status, before.publish_status);
        assert_eq!(after.dns_status, before.dns_status);
        assert!(after.deployed_at.is_none());
    }

    #[tokio::test]
    async fn test_deploy_missing_website() {
        let h = harness().await;
        let result = h.coordinator.deploy("ghost", "example.com", "x").await;
        assert!(matches!(result, Err(DeployerError::NotFound(_))));
        assert!(h.store.recent_deployments("ghost", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deploy_requires_domain() {
        let h = harness().await;
        let result = h.coordinator.deploy("w1", "  ", "x").await;
        assert!(matches!(result, Err(DeployerError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_deploy_in_background_result_observable() {
        let h = harness().await;
        let handle = h.coordinator.clone().deploy_in_background(
            "w1".to_string(),
            "example.com".to_string(),
            "<html>v1</html>".to_string(),
        );

        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(outcome.domain, "example.com");

        let deployments = h.coordinator.status("w1").await.unwrap();
        assert_eq!(deployments.len(), 1);
        assert_eq!(deployments[0].status, DeploymentStatus::Completed);
    }

    #[tokio::test]
    async fn test_status_newest_first() {
        let h = harness().await;
        h.coordinator.deploy("w1", "example.com", "v1").await.unwrap();
        h.coordinator.deploy("w1", "example.com", "v2").await.unwrap();

        let deployments = h.coordinator.status("w1").await.unwrap();
        assert_eq!(deployments.len(), 2);
        assert!(deployments[0].created_at >= deployments[1].created_at);
        assert_eq!(deployments[0].content_snapshot, "v2");
    }

    #[tokio::test]
    async fn test_rollback_without_prior_fails() {
        let h = harness().await;
        let outcome = h
            .coordinator
            .deploy("w1", "example.com", "<html>v1</html>")
            .await
            .unwrap();

        let result = h.coordinator.rollback("w1", &outcome.deployment_id).await;
        match result {
            Err(DeployerError::RollbackError(msg)) => {
                assert!(msg.contains("no previous deployment"));
            }
            other => panic!("expected rollback error, got {:?}", other.map(|o| o.message)),
        }

        // No new deployment record was created by the failed rollback
        assert_eq!(h.coordinator.status("w1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rollback_republishes_prior_snapshot() {
        let h = harness().await;
        h.coordinator.deploy("w1", "example.com", "<html>v1</html>").await.unwrap();
        let second = h
            .coordinator
            .deploy("w1", "example.com", "<html>v2</html>")
            .await
            .unwrap();

        let outcome = h.coordinator.rollback("w1", &second.deployment_id).await.unwrap();
        assert_eq!(outcome.domain, "example.com");

        // The prior snapshot is live again
        let index = h.layout().site_dir("example.com").join("index.html");
        assert_eq!(std::fs::read_to_string(index).unwrap(), "<html>v1</html>");

        // The named deployment carries the annotation
        let target = h
            .store
            .get_deployment(&second.deployment_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(target.status, DeploymentStatus::RolledBack);
        assert!(target.log.contains("rolled back to deployment"));

        // The rollback ran as a fresh deployment
        assert_eq!(h.coordinator.status("w1").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_rollbacks_have_one_winner() {
        let h = harness().await;
        h.coordinator.deploy("w1", "example.com", "<html>v1</html>").await.unwrap();
        let second = h
            .coordinator
            .deploy("w1", "example.com", "<html>v2</html>")
            .await
            .unwrap();

        let spawn_rollback = |id: String| {
            let coordinator = h.coordinator.clone();
            tokio::spawn(async move { coordinator.rollback("w1", &id).await })
        };
        let first_attempt = spawn_rollback(second.deployment_id.clone());
        let second_attempt = spawn_rollback(second.deployment_id.clone());

        let results = [first_attempt.await.unwrap(), second_attempt.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);

        // The loser re-read the target under the domain lock and saw it
        // already rolled back
        let loser = results.iter().find(|r| r.is_err()).unwrap();
        assert!(matches!(loser, Err(DeployerError::RollbackError(_))));

        // Exactly one annotation on the target, none overwritten
        let target = h
            .store
            .get_deployment(&second.deployment_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(target.status, DeploymentStatus::RolledBack);
        assert_eq!(target.log.matches("rolled back to deployment").count(), 1);
    }

    #[tokio::test]
    async fn test_rollback_rejects_failed_target() {
        let h = harness().await;
        h.coordinator.deploy("w1", "example.com", "v1").await.unwrap();

        std::fs::remove_dir_all(h.root.path().join("sites")).unwrap();
        std::fs::write(h.root.path().join("sites"), "not a directory").unwrap();
        let failed = h.coordinator.deploy("w1", "example.com", "v2").await;
        assert!(failed.is_err());

        let failed_id = h.coordinator.status("w1").await.unwrap()[0].id.clone();
        let result = h.coordinator.rollback("w1", &failed_id).await;
        assert!(matches!(result, Err(DeployerError::RollbackError(_))));
    }

    #[tokio::test]
    async fn test_undeploy_removes_artifacts() {
        let h = harness().await;
        h.coordinator.deploy("w1", "example.com", "v1").await.unwrap();
        assert!(h.layout().site_dir("example.com").exists());

        let message = h.coordinator.undeploy("example.com").await.unwrap();
        assert!(message.contains("example.com"));
        assert!(!h.layout().site_dir("example.com").exists());
        assert!(!h.layout().proxy_config_file("example.com").exists());
        assert_eq!(h.authority.revokes.load(Ordering::SeqCst), 1);

        // The owning website is back to draft
        let website = h.website("w1").await;
        assert_eq!(website.publish_status, PublishStatus::Draft);
        assert_eq!(website.dns_status, DnsStatus::Pending);
        assert_eq!(website.tls_status, TlsStatus::Pending);
        assert!(website.deployed_at.is_none());
    }

    #[tokio::test]
    async fn test_check_dns_reports_addresses() {
        let h = harness().await;

        let check = h.coordinator.check_dns("example.com", SERVER_IP).await;
        assert!(!check.resolved);
        assert!(check.ips.is_empty());

        h.resolver.point_here().await;
        let check = h.coordinator.check_dns("example.com", SERVER_IP).await;
        assert!(check.resolved);
        assert_eq!(check.ips, vec![SERVER_IP]);
    }

    #[tokio::test]
    async fn test_deploy_internationalized_domain() {
        let h = harness().await;
        h.store
            .insert_website(&Website::new("w2", "例子.测试", "<html>ok</html>"))
            .await
            .unwrap();

        let outcome = h
            .coordinator
            .deploy("w2", "例子.测试", "<html>ok</html>")
            .await
            .unwrap();

        // The canonical form is pure ASCII punycode labels
        assert!(outcome.domain.split('.').all(|l| l.starts_with("xn--")));

        // Files live under the canonical path and the config references it
        let site_dir = h.layout().site_dir(&outcome.domain);
        assert!(site_dir.join("index.html").exists());
        let stanza =
            std::fs::read_to_string(h.layout().proxy_config_file(&outcome.domain)).unwrap();
        assert!(stanza.contains(&format!("root {};", site_dir.display())));

        // DNS does not point here, so the site is published without TLS
        let website = h.website("w2").await;
        assert_eq!(website.publish_status, PublishStatus::Published);
        assert_eq!(website.dns_status, DnsStatus::Pending);
        assert_eq!(website.tls_status, TlsStatus::Pending);
    }
}
