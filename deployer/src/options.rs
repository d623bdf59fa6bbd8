//! Orchestrator configuration options

use std::net::{IpAddr, Ipv4Addr};

use crate::layout::SiteLayout;

/// Main orchestrator options
#[derive(Debug, Clone)]
pub struct DeployerOptions {
    /// Public IP address of this server, used for DNS pointing checks
    pub server_ip: IpAddr,

    /// Contact email passed to the certificate authority client
    pub contact_email: String,

    /// Filesystem layout for sites, proxy config and certificates
    pub layout: SiteLayout,

    /// Number of deployment records returned by the status operation
    pub status_history_len: usize,
}

impl Default for DeployerOptions {
    fn default() -> Self {
        Self {
            server_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            contact_email: "ops@siteforge.dev".to_string(),
            layout: SiteLayout::default(),
            status_history_len: 10,
        }
    }
}
