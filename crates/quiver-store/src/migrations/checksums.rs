//! Migration checksums
//!
//! A migration's checksum covers its identity (version, description and
//! dependencies) so renumbering or re-describing an applied migration shows up.

use sha2::{Digest, Sha256};

/// Compute SHA256 checksum of a string
pub fn compute_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Checksum over a migration's identity
pub fn migration_checksum(version: &str, description: &str, dependencies: &[&str]) -> String {
    compute_checksum(&format!("{}:{}:{:?}", version, description, dependencies))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_checksum() {
        let checksum = compute_checksum("SELECT 1");
        assert_eq!(checksum.len(), 64);
    }

    #[test]
    fn test_checksum_changes_with_dependencies() {
        let a = migration_checksum("002", "Manufacturers", &["001"]);
        let b = migration_checksum("002", "Manufacturers", &[]);
        assert_ne!(a, b);
        assert_eq!(a, migration_checksum("002", "Manufacturers", &["001"]));
    }
}
