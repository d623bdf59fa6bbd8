//! Persisted record models

pub mod deployment;
pub mod website;
