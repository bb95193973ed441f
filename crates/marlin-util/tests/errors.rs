use marlin_util::errors::MarlinError;

#[test]
fn test_not_found_display() {
    let err = MarlinError::ArtifactNotFound {
        artifact: "org.example:lib:1.0".to_string(),
        tried: "https://repo.example".to_string(),
    };
    assert_eq!(err.to_string(), "Artifact not found: org.example:lib:1.0");
    assert!(err.is_not_found());
}

#[test]
fn test_retrieval_error_display() {
    let err = MarlinError::ArtifactRetrieval {
        location: "https://repo.example/lib.pom".to_string(),
        message: "HTTP 500".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Failed to retrieve https://repo.example/lib.pom: HTTP 500"
    );
    assert!(!err.is_not_found());
}

#[test]
fn test_parsing_error_joins_messages() {
    let err = MarlinError::DocumentParsing {
        document: "lib-1.0.pom".to_string(),
        errors: vec!["unexpected eof".to_string(), "bad tag".to_string()],
    };
    assert_eq!(
        err.to_string(),
        "Failed to parse lib-1.0.pom: unexpected eof; bad tag"
    );
}

#[test]
fn test_parsing_helper_wraps_single_message() {
    let err = MarlinError::parsing("maven-metadata.xml", "boom");
    match err {
        MarlinError::DocumentParsing { document, errors } => {
            assert_eq!(document, "maven-metadata.xml");
            assert_eq!(errors, vec!["boom".to_string()]);
        }
        other => panic!("unexpected variant: {other}"),
    }
}

#[test]
fn test_cyclic_parent_display() {
    let err = MarlinError::CyclicParent {
        chain: "a:p:1 -> b:p:1 -> a:p:1".to_string(),
    };
    assert!(err.to_string().contains("a:p:1 -> b:p:1"), "got: {err}");
}

#[test]
fn test_io_error_from_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err: MarlinError = io_err.into();
    assert!(matches!(err, MarlinError::Io(_)));
    assert!(err.to_string().contains("I/O error"), "got: {err}");
}
