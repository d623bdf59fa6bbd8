//! Siteforge Deployer Library
//!
//! Domain deployment orchestrator: takes a generated site's static content
//! and a target domain and turns it into a live, TLS-secured, reverse-proxied
//! website, tracking deployment history and supporting rollback.

pub mod certs;
pub mod coordinator;
pub mod dns;
pub mod domain;
pub mod errors;
pub mod layout;
pub mod locks;
pub mod logs;
pub mod materialize;
pub mod models;
pub mod options;
pub mod proxy;
pub mod store;
pub mod utils;
