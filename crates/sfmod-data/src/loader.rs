//! Format detection and deserialization for the files the tools read:
//! configuration (RON/TOML/JSON by extension) and game-data JSON.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors raised while reading or writing tool data on disk.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A configured path does not exist.
    #[error("{what} {path} does not exist")]
    MissingPath { path: PathBuf, what: &'static str },

    /// The merge tool was given too few inputs.
    #[error("not enough input files: need at least {required}, got {given}")]
    NotEnoughInputs { required: usize, given: usize },

    /// An icon could not be read or encoded.
    #[error("image error in {file}: {detail}")]
    Image { file: PathBuf, detail: String },

    /// A string-table CSV could not be read.
    #[error("csv error in {file}: {detail}")]
    Csv { file: PathBuf, detail: String },

    /// Output could not be serialized.
    #[error("failed to serialize {file}: {detail}")]
    Serialize { file: PathBuf, detail: String },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(path, format, &content)
}

/// Deserialize `content` as `format`; `path` is only used for error reporting.
pub fn deserialize_str<T: DeserializeOwned>(path: &Path, format: Format, content: &str) -> Result<T, DataError> {
    let parse_error = |detail: String| DataError::Parse {
        file: path.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        count: u32,
    }

    // -----------------------------------------------------------------------
    // Format detection
    // -----------------------------------------------------------------------

    #[test]
    fn detect_known_formats() {
        assert_eq!(detect_format(Path::new("a.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("a.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("dir/a.json")).unwrap(), Format::Json);
    }

    #[test]
    fn detect_unsupported_format() {
        let err = detect_format(Path::new("a.yaml")).unwrap_err();
        assert!(matches!(err, DataError::UnsupportedFormat { .. }));
        assert!(detect_format(Path::new("noext")).is_err());
    }

    // -----------------------------------------------------------------------
    // Deserialization
    // -----------------------------------------------------------------------

    #[test]
    fn deserialize_each_format() {
        let expected = Sample {
            name: "x".into(),
            count: 2,
        };
        let path = Path::new("sample");
        let ron: Sample = deserialize_str(path, Format::Ron, r#"(name: "x", count: 2)"#).unwrap();
        let toml: Sample = deserialize_str(path, Format::Toml, "name = \"x\"\ncount = 2\n").unwrap();
        let json: Sample = deserialize_str(path, Format::Json, r#"{"name": "x", "count": 2}"#).unwrap();
        assert_eq!(ron, expected);
        assert_eq!(toml, expected);
        assert_eq!(json, expected);
    }

    #[test]
    fn parse_errors_name_the_file() {
        let err = deserialize_str::<Sample>(Path::new("bad.json"), Format::Json, "{").unwrap_err();
        match err {
            DataError::Parse { file, .. } => assert_eq!(file, PathBuf::from("bad.json")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = deserialize_file::<Sample>(Path::new("/nonexistent/sfmod/config.json")).unwrap_err();
        assert!(matches!(err, DataError::Io(_)));
    }
}
