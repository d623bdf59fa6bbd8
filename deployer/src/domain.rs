//! Domain name normalization
//!
//! Converts user-supplied domain strings (including internationalized
//! labels) into the canonical ASCII-compatible form used for filesystem
//! paths, nginx server names and certificate requests.

use tracing::warn;

/// Normalize a domain to its ASCII-compatible (Punycode) form.
///
/// The domain is split on `.`; labels that are already ASCII pass through
/// unchanged, non-ASCII labels are IDNA-encoded. If any label fails to
/// encode, the raw input is returned unchanged so an otherwise valid name
/// is not blocked by a partial encoding failure.
///
/// Pure and idempotent: `normalize(normalize(d)) == normalize(d)`.
pub fn normalize(raw_domain: &str) -> String {
    if raw_domain.is_ascii() {
        return raw_domain.to_string();
    }

    let mut labels = Vec::new();
    for label in raw_domain.split('.') {
        if label.is_ascii() {
            labels.push(label.to_string());
            continue;
        }
        match idna::domain_to_ascii(label) {
            Ok(encoded) => labels.push(encoded),
            Err(e) => {
                warn!("Failed to encode domain label '{}': {}", label, e);
                return raw_domain.to_string();
            }
        }
    }

    labels.join(".")
}
