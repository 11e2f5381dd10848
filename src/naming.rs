//! Artifact filenames: `<stem>-<unixMs>.<ext>`.
//!
//! Every export suggests a filename built from a fixed stem, the export time
//! in Unix milliseconds, and the format extension:
//! - `comparison-snapshot-1700000000000.png`
//! - `diffslide-optimized-1700000000000.gif`
//! - `diffslide-video-1700000000000.mp4`
//!
//! Stems may contain dashes, so parsing splits on the *last* dash.

/// Result of parsing a name like `diffslide-video-1700000000000.webm`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedArtifactName {
    pub stem: String,
    pub timestamp_ms: i64,
    pub extension: String,
}

/// Current time in Unix milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Build an artifact filename.
///
/// ```
/// # use diffslide::naming::artifact_filename;
/// assert_eq!(
///     artifact_filename("diffslide-embed", 1700000000000, "html"),
///     "diffslide-embed-1700000000000.html"
/// );
/// ```
pub fn artifact_filename(stem: &str, timestamp_ms: i64, extension: &str) -> String {
    format!("{stem}-{timestamp_ms}.{extension}")
}

/// Parse an artifact filename back into its parts.
///
/// Returns `None` for names that don't follow the convention.
pub fn parse_artifact_name(name: &str) -> Option<ParsedArtifactName> {
    let (base, extension) = name.rsplit_once('.')?;
    let (stem, ts) = base.rsplit_once('-')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }
    let timestamp_ms = ts.parse::<i64>().ok()?;
    Some(ParsedArtifactName {
        stem: stem.to_string(),
        timestamp_ms,
        extension: extension.to_string(),
    })
}

/// RFC 3339 rendering of an artifact timestamp, for summaries.
pub fn format_timestamp(timestamp_ms: i64) -> Option<String> {
    chrono::DateTime::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_name() {
        assert_eq!(
            artifact_filename("comparison-snapshot", 42, "png"),
            "comparison-snapshot-42.png"
        );
    }

    #[test]
    fn parses_dashed_stem() {
        let parsed = parse_artifact_name("diffslide-video-1700000000000.webm").unwrap();
        assert_eq!(
            parsed,
            ParsedArtifactName {
                stem: "diffslide-video".into(),
                timestamp_ms: 1_700_000_000_000,
                extension: "webm".into(),
            }
        );
    }

    #[test]
    fn parse_round_trips_builder() {
        let name = artifact_filename("diffslide-hover", 1234, "html");
        let parsed = parse_artifact_name(&name).unwrap();
        assert_eq!(artifact_filename(&parsed.stem, parsed.timestamp_ms, &parsed.extension), name);
    }

    #[test]
    fn rejects_names_without_timestamp() {
        assert_eq!(parse_artifact_name("diffslide-video.mp4"), None);
        assert_eq!(parse_artifact_name("snapshot"), None);
        assert_eq!(parse_artifact_name("-123.png"), None);
    }

    #[test]
    fn now_is_after_2020() {
        assert!(now_ms() > 1_577_836_800_000);
    }

    #[test]
    fn timestamp_formats_as_utc() {
        assert_eq!(
            format_timestamp(1_700_000_000_000).as_deref(),
            Some("2023-11-14T22:13:20.000Z")
        );
    }
}
