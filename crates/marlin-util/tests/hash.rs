use marlin_util::hash::{cache_key, sha256_bytes};

#[test]
fn test_sha256_bytes_empty() {
    let hash = sha256_bytes(b"");
    assert_eq!(
        hash,
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn test_sha256_bytes_hello() {
    let hash = sha256_bytes(b"hello");
    assert_eq!(
        hash,
        "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
}

#[test]
fn test_cache_key_keeps_extension() {
    let key = cache_key("https://repo.example/org/lib/1.0/lib-1.0.pom");
    assert!(key.ends_with(".pom"), "got: {key}");
    assert_eq!(key.len(), 64 + 4);
}

#[test]
fn test_cache_key_deterministic() {
    let a = cache_key("https://repo.example/a/maven-metadata.xml");
    let b = cache_key("https://repo.example/a/maven-metadata.xml");
    assert_eq!(a, b);
}

#[test]
fn test_cache_key_distinguishes_locations() {
    let a = cache_key("https://one.example/lib-1.0.pom");
    let b = cache_key("https://two.example/lib-1.0.pom");
    assert_ne!(a, b);
}

#[test]
fn test_cache_key_without_extension() {
    let key = cache_key("https://repo.example/path/noext");
    assert_eq!(key, sha256_bytes(b"https://repo.example/path/noext"));
}
