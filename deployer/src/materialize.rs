//! Site content materialization
//!
//! Writes a generated site's files to the per-domain directory on disk:
//! the HTML document itself, crawler directives and a single-entry sitemap.
//! Any failure here is fatal for the deploy attempt.

use std::path::Path;

use chrono::Utc;
use tokio::fs;
use tracing::{debug, info};

use crate::errors::DeployerError;

/// Name of the primary content document
pub const INDEX_FILE: &str = "index.html";

/// Name of the crawler-directives document
pub const ROBOTS_FILE: &str = "robots.txt";

/// Name of the sitemap document
pub const SITEMAP_FILE: &str = "sitemap.xml";

/// Materialize site content into the given directory.
///
/// Creates the directory (0755), writes `index.html`, `robots.txt` and
/// `sitemap.xml` (0644 each), then re-asserts the directory mode.
pub async fn materialize(
    site_dir: &Path,
    domain: &str,
    content: &str,
) -> Result<(), DeployerError> {
    info!("Materializing site for {} at {}", domain, site_dir.display());

    fs::create_dir_all(site_dir).await.map_err(|e| {
        DeployerError::MaterializeError(format!(
            "Failed to create site directory {}: {}",
            site_dir.display(),
            e
        ))
    })?;
    set_mode(site_dir, 0o755).await?;

    write_site_file(&site_dir.join(INDEX_FILE), content).await?;
    write_site_file(&site_dir.join(ROBOTS_FILE), &render_robots(domain)).await?;
    write_site_file(&site_dir.join(SITEMAP_FILE), &render_sitemap(domain)).await?;

    // File writes can alter the directory mtime/mode on some filesystems
    set_mode(site_dir, 0o755).await?;

    debug!("Site files written for {}", domain);
    Ok(())
}

/// Remove a materialized site directory and all its contents
pub async fn remove_site(site_dir: &Path) -> Result<(), DeployerError> {
    if fs::metadata(site_dir).await.is_ok() {
        fs::remove_dir_all(site_dir).await.map_err(|e| {
            DeployerError::MaterializeError(format!(
                "Failed to remove site directory {}: {}",
                site_dir.display(),
                e
            ))
        })?;
        info!("Removed site directory {}", site_dir.display());
    }
    Ok(())
}

async fn write_site_file(path: &Path, contents: &str) -> Result<(), DeployerError> {
    fs::write(path, contents).await.map_err(|e| {
        DeployerError::MaterializeError(format!("Failed to write {}: {}", path.display(), e))
    })?;
    set_mode(path, 0o644).await
}

/// Set Unix permissions; a no-op on other platforms
async fn set_mode(path: &Path, mode: u32) -> Result<(), DeployerError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let meta = fs::metadata(path).await?;
        let mut perms = meta.permissions();
        perms.set_mode(mode);
        fs::set_permissions(path, perms).await?;
    }
    #[cfg(not(unix))]
    {
        let _ = (path, mode);
    }
    Ok(())
}

fn render_robots(domain: &str) -> String {
    format!(
        "User-agent: *\nAllow: /\n\nSitemap: https://{}/sitemap.xml\n",
        domain
    )
}

fn render_sitemap(domain: &str) -> String {
    let today = Utc::now().format("%Y-%m-%d");
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url>
    <loc>https://{}/</loc>
    <lastmod>{}</lastmod>
  </url>
</urlset>
"#,
        domain, today
    )
}
