//! TLS certificate provisioning
//!
//! Wraps the external certificate-authority client. Issuance failure never
//! aborts a deployment: an unencrypted but reachable site beats no site, so
//! `provision` degrades to `false` and the domain stays on the plain stanza
//! with TLS pending.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::errors::DeployerError;
use crate::proxy::ProxyConfigurator;

/// Certificate-authority client interface
#[async_trait]
pub trait CertAuthority: Send + Sync {
    /// Request (or renew) a certificate covering both names
    async fn obtain(
        &self,
        primary_domain: &str,
        alternate_domain: &str,
        contact_email: &str,
    ) -> Result<(), DeployerError>;

    /// Revoke the certificate registered under the given name
    async fn revoke(&self, primary_domain: &str) -> Result<(), DeployerError>;
}

/// The certbot CLI in non-interactive mode
pub struct Certbot;

#[async_trait]
impl CertAuthority for Certbot {
    async fn obtain(
        &self,
        primary_domain: &str,
        alternate_domain: &str,
        contact_email: &str,
    ) -> Result<(), DeployerError> {
        let output = Command::new("certbot")
            .args([
                "certonly",
                "--nginx",
                "--non-interactive",
                "--agree-tos",
                "-m",
                contact_email,
                "-d",
                primary_domain,
                "-d",
                alternate_domain,
            ])
            .output()
            .await
            .map_err(|e| DeployerError::CertError(format!("Failed to run certbot: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DeployerError::CertError(format!(
                "certbot failed for {}: {}",
                primary_domain,
                stderr.trim()
            )));
        }
        Ok(())
    }

    async fn revoke(&self, primary_domain: &str) -> Result<(), DeployerError> {
        let status = Command::new("certbot")
            .args([
                "revoke",
                "--non-interactive",
                "--cert-name",
                primary_domain,
            ])
            .status()
            .await
            .map_err(|e| DeployerError::CertError(format!("Failed to run certbot revoke: {}", e)))?;

        if !status.success() {
            return Err(DeployerError::CertError(format!(
                "certbot revoke failed for {}",
                primary_domain
            )));
        }
        Ok(())
    }
}

/// Provisions certificates and switches domains onto the TLS stanza
pub struct CertProvisioner {
    authority: Arc<dyn CertAuthority>,
    configurator: Arc<ProxyConfigurator>,
    contact_email: String,
}

impl CertProvisioner {
    pub fn new(
        authority: Arc<dyn CertAuthority>,
        configurator: Arc<ProxyConfigurator>,
        contact_email: impl Into<String>,
    ) -> Self {
        Self {
            authority,
            configurator,
            contact_email: contact_email.into(),
        }
    }

    /// Obtain a certificate for the domain and its www alias, then rewire
    /// the proxy onto the TLS stanza.
    ///
    /// Returns `false` on any failure; only called once DNS resolution has
    /// confirmed the domain points at this server.
    pub async fn provision(&self, domain: &str, site_path: &Path) -> bool {
        let www_alias = format!("www.{}", domain);
        info!("Provisioning certificate for {} and {}", domain, www_alias);

        if let Err(e) = self
            .authority
            .obtain(domain, &www_alias, &self.contact_email)
            .await
        {
            error!("Certificate issuance failed for {}: {}", domain, e);
            return false;
        }

        if let Err(e) = self.configurator.configure(domain, site_path, true).await {
            error!("Failed to switch {} onto the TLS stanza: {}", domain, e);
            return false;
        }

        info!("Certificate active for {}", domain);
        true
    }

    /// Revoke the domain's certificate; failure is logged and swallowed
    /// since the proxy no longer serves the domain either way.
    pub async fn revoke(&self, domain: &str) -> bool {
        match self.authority.revoke(domain).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Certificate revocation failed for {}: {}", domain, e);
                false
            }
        }
    }
}
