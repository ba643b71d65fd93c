//! Response normalization
//!
//! Backends describe objects with their own field names (`Key`, `Size`,
//! `content-length`, ...). This module turns those raw field maps into the
//! uniform [`Metadata`] record.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::options::{value_as_string, value_as_u64};
use crate::path::{DELIMITER, PathPrefixer, path_info};
use crate::traits::{EntryKind, Metadata};

/// A backend response as a loosely typed field map
pub type RawResponse = Map<String, Value>;

/// Normalized metadata field a backend field maps onto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaField {
    Size,
    Mimetype,
    Metadata,
}

/// Backend field names and the metadata field each one fills
pub const RESULT_MAP: &[(&str, MetaField)] = &[
    ("ContentLength", MetaField::Size),
    ("ContentType", MetaField::Mimetype),
    ("Size", MetaField::Size),
    ("Metadata", MetaField::Metadata),
    ("content-length", MetaField::Size),
    ("content-type", MetaField::Mimetype),
];

const KEY_FIELDS: &[&str] = &["Key", "Prefix"];
const LAST_MODIFIED_FIELDS: &[&str] = &["LastModified", "last-modified"];

/// Normalize a raw backend response.
///
/// `path`, when given, is used as-is; otherwise the path comes from the
/// response's key (or common-prefix) field mapped back to a logical path.
/// A path ending in the delimiter yields a directory record with the
/// delimiter stripped, and the field table is not applied to it.
pub fn normalize_response(
    prefixer: &PathPrefixer,
    response: &RawResponse,
    path: Option<&str>,
) -> Metadata {
    let path = match path {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => KEY_FIELDS
            .iter()
            .find_map(|field| response.get(*field).and_then(Value::as_str))
            .map(|key| prefixer.to_logical(key))
            .unwrap_or_default(),
    };

    let info = path_info(&path);
    let timestamp = LAST_MODIFIED_FIELDS
        .iter()
        .find_map(|field| response.get(*field))
        .and_then(value_timestamp);

    let mut metadata = Metadata {
        kind: EntryKind::File,
        path,
        dirname: info.dirname,
        basename: info.basename,
        filename: info.filename,
        extension: info.extension,
        timestamp,
        mimetype: None,
        size: None,
        metadata: BTreeMap::new(),
    };

    if metadata.path.ends_with(DELIMITER) {
        metadata.kind = EntryKind::Dir;
        metadata.path = metadata.path.trim_end_matches(DELIMITER).to_string();
        return metadata;
    }

    for (field, target) in RESULT_MAP {
        let Some(value) = response.get(*field) else {
            continue;
        };
        match target {
            MetaField::Size => {
                if let Some(size) = value_as_u64(value) {
                    metadata.size = Some(size);
                }
            }
            MetaField::Mimetype => {
                if let Some(mimetype) = value_as_string(value) {
                    metadata.mimetype = Some(mimetype);
                }
            }
            MetaField::Metadata => {
                if let Value::Object(map) = value {
                    metadata.metadata = map
                        .iter()
                        .filter_map(|(k, v)| value_as_string(v).map(|s| (k.clone(), s)))
                        .collect();
                }
            }
        }
    }

    metadata
}

/// Build a raw response from header-style metadata
pub fn response_from_headers(headers: &BTreeMap<String, String>) -> RawResponse {
    headers
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), Value::String(v.clone())))
        .collect()
}

/// Parse a backend timestamp into seconds since the epoch.
///
/// Accepts RFC 3339 (`2024-01-02T03:04:05.000Z`), RFC 2822 / HTTP dates
/// (`Tue, 02 Jan 2024 03:04:05 GMT`) and plain integer seconds.
pub fn parse_timestamp(input: &str) -> Option<i64> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(secs) = input.parse::<i64>() {
        return Some(secs);
    }

    if let Ok(ts) = input.parse::<jiff::Timestamp>() {
        return Some(ts.as_second());
    }

    jiff::fmt::rfc2822::DateTimeParser::new()
        .parse_timestamp(input)
        .ok()
        .map(|ts| ts.as_second())
}

fn value_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => parse_timestamp(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawResponse {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_directory_key_yields_dir() {
        let prefixer = PathPrefixer::new("");
        let response = raw(json!({"Key": "a/b/", "Size": 0}));

        let meta = normalize_response(&prefixer, &response, None);
        assert_eq!(meta.kind, EntryKind::Dir);
        assert_eq!(meta.path, "a/b");
        assert!(meta.size.is_none());
    }

    #[test]
    fn test_common_prefix_field() {
        let prefixer = PathPrefixer::new("root");
        let response = raw(json!({"Prefix": "root/photos/"}));

        let meta = normalize_response(&prefixer, &response, None);
        assert_eq!(meta.kind, EntryKind::Dir);
        assert_eq!(meta.path, "photos");
    }

    #[test]
    fn test_file_fields_are_mapped() {
        let prefixer = PathPrefixer::new("root");
        let response = raw(json!({
            "Key": "root/img/a.png",
            "ContentLength": "2048",
            "ContentType": "image/png",
            "LastModified": "2024-01-02T03:04:05.000Z",
            "Metadata": {"owner": "ops"},
            "ETag": "ignored",
        }));

        let meta = normalize_response(&prefixer, &response, None);
        assert_eq!(meta.kind, EntryKind::File);
        assert_eq!(meta.path, "img/a.png");
        assert_eq!(meta.dirname, "img");
        assert_eq!(meta.basename, "a.png");
        assert_eq!(meta.extension.as_deref(), Some("png"));
        assert_eq!(meta.size, Some(2048));
        assert_eq!(meta.mimetype.as_deref(), Some("image/png"));
        assert_eq!(meta.timestamp, Some(1_704_164_645));
        assert_eq!(meta.metadata.get("owner").map(String::as_str), Some("ops"));
    }

    #[test]
    fn test_supplied_path_wins() {
        let prefixer = PathPrefixer::new("root");
        let response = raw(json!({"Key": "root/other.txt", "Size": 3}));

        let meta = normalize_response(&prefixer, &response, Some("notes.txt"));
        assert_eq!(meta.path, "notes.txt");
        assert_eq!(meta.size, Some(3));
    }

    #[test]
    fn test_header_metadata() {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Length".to_string(), "10".to_string());
        headers.insert("Content-Type".to_string(), "text/plain".to_string());
        headers.insert(
            "Last-Modified".to_string(),
            "Tue, 02 Jan 2024 03:04:05 GMT".to_string(),
        );

        let response = response_from_headers(&headers);
        let meta = normalize_response(&PathPrefixer::default(), &response, Some("d/f.txt"));
        assert_eq!(meta.size, Some(10));
        assert_eq!(meta.mimetype.as_deref(), Some("text/plain"));
        assert_eq!(meta.timestamp, Some(1_704_164_645));
        assert_eq!(meta.dirname, "d");
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp("2024-01-02T03:04:05Z"), Some(1_704_164_645));
        assert_eq!(
            parse_timestamp("Tue, 02 Jan 2024 03:04:05 +0000"),
            Some(1_704_164_645)
        );
        assert_eq!(parse_timestamp("1704164645"), Some(1_704_164_645));
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
