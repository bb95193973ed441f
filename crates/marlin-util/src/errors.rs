use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all Marlin operations.
#[derive(Debug, Error, Diagnostic)]
pub enum MarlinError {
    /// Every configured repository was tried without finding the artifact.
    #[error("Artifact not found: {artifact}")]
    #[diagnostic(help("Check the coordinate and the configured repositories"))]
    ArtifactNotFound { artifact: String, tried: String },

    /// A fetch failed for a reason other than "not found".
    #[error("Failed to retrieve {location}: {message}")]
    ArtifactRetrieval { location: String, message: String },

    /// A POM or maven-metadata.xml document could not be parsed.
    #[error("Failed to parse {document}: {}", .errors.join("; "))]
    DocumentParsing {
        document: String,
        errors: Vec<String>,
    },

    /// A parent or BOM import chain refers back to itself.
    #[error("Cyclic parent chain: {chain}")]
    #[diagnostic(help("A POM inherits from or imports one of its own descendants"))]
    CyclicParent { chain: String },

    /// A coordinate string does not follow `group:artifact[:version[:classifier]][@type]`.
    #[error("Invalid dependency coordinate: {input}")]
    InvalidCoordinate { input: String },

    /// Invalid or malformed resolver configuration.
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check your marlin.toml for syntax errors"))]
    Config { message: String },

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MarlinError {
    /// Whether this error means "the artifact does not exist here".
    pub fn is_not_found(&self) -> bool {
        matches!(self, MarlinError::ArtifactNotFound { .. })
    }

    pub fn not_found(artifact: impl Into<String>) -> Self {
        MarlinError::ArtifactNotFound {
            artifact: artifact.into(),
            tried: String::new(),
        }
    }

    pub fn parsing(document: impl Into<String>, message: impl Into<String>) -> Self {
        MarlinError::DocumentParsing {
            document: document.into(),
            errors: vec![message.into()],
        }
    }
}

/// Convenience alias used by every fallible Marlin operation.
pub type MarlinResult<T> = std::result::Result<T, MarlinError>;
