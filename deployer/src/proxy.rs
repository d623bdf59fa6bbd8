//! Reverse-proxy configuration
//!
//! Generates nginx server stanzas for deployed domains, installs them into
//! the proxy config directory and drives the validate-then-reload cycle.
//! A config that fails validation never reaches a live reload: the previous
//! file is restored byte-for-byte before the error propagates.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::errors::DeployerError;
use crate::layout::SiteLayout;

/// Static asset extensions served with long-lived caching headers
const CACHED_EXTENSIONS: &str = "css|js|png|jpg|jpeg|gif|ico|svg|webp|woff|woff2|ttf|eot";

/// Hardened cipher list for the TLS stanza
const TLS_CIPHERS: &str = "ECDHE-ECDSA-AES128-GCM-SHA256:ECDHE-RSA-AES128-GCM-SHA256:\
ECDHE-ECDSA-AES256-GCM-SHA384:ECDHE-RSA-AES256-GCM-SHA384:\
ECDHE-ECDSA-CHACHA20-POLY1305:ECDHE-RSA-CHACHA20-POLY1305";

/// Control surface of the running proxy daemon
#[async_trait]
pub trait ProxyDaemon: Send + Sync {
    /// Check the full on-disk configuration for syntax errors
    async fn validate(&self) -> Result<(), DeployerError>;

    /// Signal the running daemon to reload its configuration
    async fn reload(&self) -> Result<(), DeployerError>;
}

/// The real nginx daemon, driven through its CLI
pub struct Nginx;

#[async_trait]
impl ProxyDaemon for Nginx {
    async fn validate(&self) -> Result<(), DeployerError> {
        let output = Command::new("nginx")
            .args(["-t"])
            .output()
            .await
            .map_err(|e| DeployerError::ProxyConfigError(format!("Failed to run nginx -t: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DeployerError::ProxyConfigError(format!(
                "nginx config validation failed: {}",
                stderr.trim()
            )));
        }
        Ok(())
    }

    async fn reload(&self) -> Result<(), DeployerError> {
        let status = Command::new("nginx")
            .args(["-s", "reload"])
            .status()
            .await
            .map_err(|e| {
                DeployerError::ProxyConfigError(format!("Failed to run nginx -s reload: {}", e))
            })?;

        if !status.success() {
            return Err(DeployerError::ProxyConfigError(
                "nginx reload failed".to_string(),
            ));
        }
        Ok(())
    }
}

/// Generates and installs per-domain proxy config stanzas
pub struct ProxyConfigurator {
    layout: SiteLayout,
    daemon: Arc<dyn ProxyDaemon>,
}

impl ProxyConfigurator {
    pub fn new(layout: SiteLayout, daemon: Arc<dyn ProxyDaemon>) -> Self {
        Self { layout, daemon }
    }

    /// Render the config stanza for a domain as text
    pub fn render_config(&self, domain: &str, site_path: &Path, tls: bool) -> String {
        if tls {
            self.render_tls(domain, site_path)
        } else {
            self.render_plain(domain, site_path)
        }
    }

    /// Install the stanza for a domain, validate it and reload the daemon.
    ///
    /// On validation failure the previous config (if any) is restored and
    /// the daemon is never reloaded.
    pub async fn configure(
        &self,
        domain: &str,
        site_path: &Path,
        tls: bool,
    ) -> Result<(), DeployerError> {
        let config_path = self.layout.proxy_config_file(domain);
        info!(
            "Installing proxy config for {} (tls: {}) at {}",
            domain,
            tls,
            config_path.display()
        );

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                DeployerError::ProxyConfigError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        // Keep the previous stanza so a bad candidate can be rolled back
        let previous = fs::read(&config_path).await.ok();

        let stanza = self.render_config(domain, site_path, tls);
        fs::write(&config_path, &stanza).await.map_err(|e| {
            DeployerError::ProxyConfigError(format!(
                "Failed to write {}: {}",
                config_path.display(),
                e
            ))
        })?;

        if let Err(e) = self.daemon.validate().await {
            error!("Proxy config for {} failed validation, restoring previous: {}", domain, e);
            let restore = match previous {
                Some(bytes) => fs::write(&config_path, bytes).await,
                None => fs::remove_file(&config_path).await,
            };
            if let Err(restore_err) = restore {
                error!(
                    "Failed to restore previous config at {}: {}",
                    config_path.display(),
                    restore_err
                );
            }
            return Err(e);
        }

        self.daemon.reload().await?;
        debug!("Proxy config for {} installed and reloaded", domain);
        Ok(())
    }

    /// Remove a domain's config file and reload the daemon
    pub async fn remove(&self, domain: &str) -> Result<(), DeployerError> {
        let config_path = self.layout.proxy_config_file(domain);
        if fs::metadata(&config_path).await.is_ok() {
            fs::remove_file(&config_path).await.map_err(|e| {
                DeployerError::ProxyConfigError(format!(
                    "Failed to remove {}: {}",
                    config_path.display(),
                    e
                ))
            })?;
            info!("Removed proxy config for {}", domain);
        }
        self.daemon.reload().await
    }

    fn render_plain(&self, domain: &str, site_path: &Path) -> String {
        format!(
            r#"server {{
    listen 80;
    listen [::]:80;
    server_name {domain} www.{domain};

    root {root};
    index index.html;

{rules}}}
"#,
            domain = domain,
            root = site_path.display(),
            rules = Self::shared_rules(),
        )
    }

    fn render_tls(&self, domain: &str, site_path: &Path) -> String {
        format!(
            r#"server {{
    listen 80;
    listen [::]:80;
    server_name {domain} www.{domain};
    return 301 https://$host$request_uri;
}}

server {{
    listen 443 ssl http2;
    listen [::]:443 ssl http2;
    server_name {domain} www.{domain};

    ssl_certificate {cert};
    ssl_certificate_key {key};
    ssl_protocols TLSv1.2 TLSv1.3;
    ssl_ciphers {ciphers};
    ssl_prefer_server_ciphers off;

    add_header Strict-Transport-Security "max-age=31536000; includeSubDomains" always;

    root {root};
    index index.html;

{rules}}}
"#,
            domain = domain,
            cert = self.layout.cert_file(domain).display(),
            key = self.layout.key_file(domain).display(),
            ciphers = TLS_CIPHERS,
            root = site_path.display(),
            rules = Self::shared_rules(),
        )
    }

    /// Headers, compression, caching and routing rules shared by both
    /// variants
    fn shared_rules() -> String {
        format!(
            r#"    add_header X-Frame-Options "SAMEORIGIN" always;
    add_header X-Content-Type-Options "nosniff" always;
    add_header Referrer-Policy "strict-origin-when-cross-origin" always;

    gzip on;
    gzip_types text/plain text/css text/xml application/json application/javascript application/xml+rss image/svg+xml;

    location ~* \.({extensions})$ {{
        expires 365d;
        add_header Cache-Control "public, immutable";
    }}

    location / {{
        try_files $uri $uri/ /index.html;
    }}

    location ~ /\. {{
        deny all;
    }}
"#,
            extensions = CACHED_EXTENSIONS,
        )
    }
}
