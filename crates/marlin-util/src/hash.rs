use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of a byte slice, returning a lowercase hex string.
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Stable file name for caching the content behind `location`.
///
/// The extension of the location (`pom`, `xml`, ...) is kept so cache
/// directories stay readable.
pub fn cache_key(location: &str) -> String {
    let digest = sha256_bytes(location.as_bytes());
    match location.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.len() <= 8 && !ext.contains('/') => {
            format!("{digest}.{ext}")
        }
        _ => digest,
    }
}
