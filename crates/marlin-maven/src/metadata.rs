//! maven-metadata.xml parsing for version discovery and SNAPSHOT resolution.
//!
//! The same parser handles both document flavours: the artifact-level file
//! listing every published version, and the version-level file describing
//! the newest timestamped build of a `-SNAPSHOT`.

use quick_xml::events::Event;
use quick_xml::Reader;

use marlin_core::version::{Version, VersionNumber};
use marlin_util::errors::{MarlinError, MarlinResult};

use crate::repository::METADATA_FILE;

/// Parsed `maven-metadata.xml`.
#[derive(Debug, Clone, Default)]
pub struct MavenMetadata {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    /// Newest non-prerelease version, recomputed from `versions`.
    pub latest: Version,
    pub release: Version,
    /// Timestamped file version of the newest snapshot build, or
    /// `x.y-SNAPSHOT` when the document has no timestamp.
    pub snapshot: Version,
    pub versions: Vec<Version>,
    pub timestamp: Option<String>,
    pub build_number: Option<u32>,
    pub last_updated: Option<String>,
}

impl MavenMetadata {
    /// The file version to use for a snapshot's artifacts, if the document
    /// carried a snapshot timestamp.
    pub fn snapshot_file_version(&self) -> Option<String> {
        match (&self.timestamp, self.build_number) {
            (Some(_), Some(_)) if !self.snapshot.is_unknown() => Some(self.snapshot.to_string()),
            _ => None,
        }
    }
}

/// Parse a `maven-metadata.xml` document.
pub fn parse_metadata(xml: &str) -> MarlinResult<MavenMetadata> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut meta = MavenMetadata::default();
    let mut document_version: Option<String> = None;
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).to_string());
                text_buf.clear();
            }
            Ok(Event::Text(ref e)) => {
                text_buf = e
                    .unescape()
                    .map_err(|e| MarlinError::parsing(METADATA_FILE, e.to_string()))?
                    .to_string();
            }
            Ok(Event::End(_)) => {
                let ctx = path.join(">");

                match ctx.as_str() {
                    "metadata>groupId" => meta.group_id = Some(text_buf.clone()),
                    "metadata>artifactId" => meta.artifact_id = Some(text_buf.clone()),
                    "metadata>version" => document_version = Some(text_buf.clone()),
                    "metadata>versioning>latest" | "metadata>latest" => {
                        meta.latest = Version::parse(&text_buf);
                    }
                    "metadata>versioning>release" | "metadata>release" => {
                        meta.release = Version::parse(&text_buf);
                    }
                    "metadata>versioning>versions>version" => {
                        meta.versions.push(Version::parse(&text_buf));
                    }
                    "metadata>versioning>snapshot>timestamp" => {
                        meta.timestamp = Some(text_buf.clone());
                    }
                    "metadata>versioning>snapshot>buildNumber" => {
                        meta.build_number = text_buf.parse().ok();
                    }
                    "metadata>versioning>lastUpdated" => {
                        meta.last_updated = Some(text_buf.clone());
                    }
                    _ => {}
                }

                path.pop();
                text_buf.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(MarlinError::parsing(
                    METADATA_FILE,
                    format!("at position {}: {e}", reader.buffer_position()),
                ));
            }
            _ => {}
        }
    }

    if let Some(latest) = latest_stable(&meta.versions) {
        meta.latest = latest;
    }

    let base = meta
        .versions
        .first()
        .cloned()
        .or_else(|| document_version.as_deref().map(Version::parse));
    if let Some(number) = base.as_ref().and_then(Version::as_number) {
        let qualifier = match (&meta.timestamp, meta.build_number) {
            (Some(ts), Some(build)) => format!("{ts}-{build}"),
            _ => "SNAPSHOT".to_string(),
        };
        meta.snapshot = Version::Number(snapshot_number(number, &qualifier));
    }

    Ok(meta)
}

/// `major(.minor(.revision))` of `base` with `qualifier` attached by `-`.
fn snapshot_number(base: &VersionNumber, qualifier: &str) -> VersionNumber {
    VersionNumber {
        separator: String::new(),
        ..base.clone()
    }
    .with_qualifier(qualifier)
}

/// Maximum of the listed versions after dropping prereleases.
fn latest_stable(versions: &[Version]) -> Option<Version> {
    versions
        .iter()
        .filter(|v| !is_prerelease(v))
        .max_by_key(|v| v.to_generic())
        .cloned()
}

/// Whether the qualifier marks a release candidate, milestone, beta or alpha.
pub fn is_prerelease(version: &Version) -> bool {
    let qualifier = match version {
        Version::Number(n) => n.qualifier.to_ascii_lowercase(),
        Version::Generic(g) => g
            .to_string()
            .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.')
            .trim_start_matches(['-', '_'])
            .to_ascii_lowercase(),
    };
    if qualifier.is_empty() {
        return false;
    }
    qualifier.starts_with("rc")
        || qualifier.starts_with("cr")
        || qualifier.contains("milestone")
        || qualifier.contains("beta")
        || qualifier.contains("alpha")
        || ["m", "b", "a"].iter().any(|p| letter_then_digits(&qualifier, p))
}

/// `m`, `m1`, `b2`, `a10`, optionally followed by a separator and more text.
fn letter_then_digits(qualifier: &str, letter: &str) -> bool {
    let Some(rest) = qualifier.strip_prefix(letter) else {
        return false;
    };
    let digits = rest.trim_start_matches(|c: char| c.is_ascii_digit());
    digits.is_empty() || digits.starts_with(['.', '-', '_'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_artifact_metadata() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>org.jetbrains.kotlinx</groupId>
  <artifactId>kotlinx-coroutines-core</artifactId>
  <versioning>
    <latest>1.8.1</latest>
    <release>1.8.1</release>
    <versions>
      <version>1.7.0</version>
      <version>1.8.0</version>
      <version>1.8.1</version>
    </versions>
    <lastUpdated>20240501120000</lastUpdated>
  </versioning>
</metadata>"#;
        let meta = parse_metadata(xml).unwrap();
        assert_eq!(meta.group_id.as_deref(), Some("org.jetbrains.kotlinx"));
        assert_eq!(meta.artifact_id.as_deref(), Some("kotlinx-coroutines-core"));
        assert_eq!(meta.latest.to_string(), "1.8.1");
        assert_eq!(meta.release.to_string(), "1.8.1");
        assert_eq!(meta.versions.len(), 3);
        assert_eq!(meta.last_updated.as_deref(), Some("20240501120000"));
    }

    #[test]
    fn latest_skips_prereleases() {
        let xml = r#"<metadata><versioning>
            <latest>2.0-beta</latest>
            <versions>
              <version>1.0</version>
              <version>1.1-rc1</version>
              <version>1.2</version>
              <version>2.0-beta</version>
            </versions>
        </versioning></metadata>"#;
        let meta = parse_metadata(xml).unwrap();
        assert_eq!(meta.latest.to_string(), "1.2");
    }

    #[test]
    fn latest_kept_when_every_version_is_prerelease() {
        let xml = r#"<metadata><versioning>
            <latest>1.0-M2</latest>
            <versions><version>1.0-M1</version><version>1.0-M2</version></versions>
        </versioning></metadata>"#;
        assert_eq!(parse_metadata(xml).unwrap().latest.to_string(), "1.0-M2");
    }

    #[test]
    fn parse_snapshot_metadata() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>com.example</groupId>
  <artifactId>my-lib</artifactId>
  <version>1.0-SNAPSHOT</version>
  <versioning>
    <snapshot>
      <timestamp>20240615.143022</timestamp>
      <buildNumber>42</buildNumber>
    </snapshot>
    <lastUpdated>20240615143022</lastUpdated>
  </versioning>
</metadata>"#;
        let meta = parse_metadata(xml).unwrap();
        assert_eq!(meta.timestamp.as_deref(), Some("20240615.143022"));
        assert_eq!(meta.build_number, Some(42));
        assert_eq!(meta.snapshot.to_string(), "1.0-20240615.143022-42");
        assert_eq!(
            meta.snapshot_file_version().as_deref(),
            Some("1.0-20240615.143022-42")
        );
    }

    #[test]
    fn snapshot_without_timestamp() {
        let xml = r#"<metadata><version>2.1.0-SNAPSHOT</version></metadata>"#;
        let meta = parse_metadata(xml).unwrap();
        assert_eq!(meta.snapshot.to_string(), "2.1.0-SNAPSHOT");
        assert_eq!(meta.snapshot_file_version(), None);
    }

    #[test]
    fn malformed_document_is_a_parsing_error() {
        let err = parse_metadata("<metadata><versioning></metadata>").unwrap_err();
        assert!(matches!(err, MarlinError::DocumentParsing { .. }));
    }

    #[test]
    fn prerelease_detection() {
        for v in ["1.0-rc1", "1.0-RC2", "1.0-cr1", "1.0-M1", "1.0-milestone-2", "1.0-beta", "1.0-b3", "1.0-alpha-1", "1.0a1"] {
            assert!(is_prerelease(&Version::parse(v)), "{v}");
        }
        for v in ["1.0", "1.0-jre", "1.0.Final", "1.0-android", "2.0-SNAPSHOT"] {
            assert!(!is_prerelease(&Version::parse(v)), "{v}");
        }
    }
}
