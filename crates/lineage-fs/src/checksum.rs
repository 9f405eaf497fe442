//! SHA-256 checksums in the canonical `sha256:<hex>` form
//!
//! Version records carry a checksum of their field map so that identical
//! snapshots can be recognised cheaply and on-disk logs can be audited.

use sha2::{Digest, Sha256};

const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of string content.
pub fn compute_content_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{}{:x}", PREFIX, hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_has_prefix_and_is_stable() {
        let a = compute_content_checksum("{\"steps\":[\"s1\"]}");
        let b = compute_content_checksum("{\"steps\":[\"s1\"]}");
        assert!(a.starts_with("sha256:"));
        assert_eq!(a, b);
    }

    #[test]
    fn checksum_known_value() {
        assert_eq!(
            compute_content_checksum("hello world"),
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn different_snapshots_differ() {
        assert_ne!(
            compute_content_checksum("{\"scm\":\"git\"}"),
            compute_content_checksum("{\"scm\":\"none\"}")
        );
    }
}
