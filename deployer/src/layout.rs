//! Filesystem layout for deployed sites
//!
//! Every path is a deterministic function of the canonical domain, so two
//! deployments of the same domain always share a location on disk.

use std::path::PathBuf;

/// Filesystem layout for site content, proxy config and certificates
#[derive(Debug, Clone)]
pub struct SiteLayout {
    /// Base directory for materialized site content
    pub sites_dir: PathBuf,

    /// Directory the proxy daemon loads config stanzas from
    pub proxy_config_dir: PathBuf,

    /// Base directory of the certificate store
    pub certs_dir: PathBuf,
}

impl SiteLayout {
    /// Create a new layout rooted at the given directories
    pub fn new(
        sites_dir: impl Into<PathBuf>,
        proxy_config_dir: impl Into<PathBuf>,
        certs_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            sites_dir: sites_dir.into(),
            proxy_config_dir: proxy_config_dir.into(),
            certs_dir: certs_dir.into(),
        }
    }

    /// Directory a domain's site content is materialized into
    pub fn site_dir(&self, canonical_domain: &str) -> PathBuf {
        self.sites_dir.join(canonical_domain)
    }

    /// Proxy config file for a domain
    pub fn proxy_config_file(&self, canonical_domain: &str) -> PathBuf {
        self.proxy_config_dir
            .join(format!("{}.conf", canonical_domain))
    }

    /// Certificate chain path for a domain
    pub fn cert_file(&self, canonical_domain: &str) -> PathBuf {
        self.certs_dir.join(canonical_domain).join("fullchain.pem")
    }

    /// Private key path for a domain
    pub fn key_file(&self, canonical_domain: &str) -> PathBuf {
        self.certs_dir.join(canonical_domain).join("privkey.pem")
    }
}

impl Default for SiteLayout {
    fn default() -> Self {
        Self::new(
            "/var/www/siteforge",
            "/etc/nginx/conf.d",
            "/etc/letsencrypt/live",
        )
    }
}
