//! Error type shared by every stage of the extraction pipeline.
//!
//! Errors fall into two families. Domain failures describe a single asset
//! that cannot be turned into an entity; callers log them and move on to the
//! next asset. Invariant violations mean the dump itself is inconsistent and
//! the run is aborted.

use crate::asset::AssetKind;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while resolving assets into entities.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// No localized string, string-table entry, or raw name could be found.
    #[error("no display name for asset {file}")]
    MissingDisplayName { file: String },

    /// An object reference could not be matched to any indexed file.
    #[error("unresolvable reference '{reference}': {reason}")]
    Unresolvable {
        reference: String,
        reason: &'static str,
    },

    /// An asset was reached through a field that requires a different kind.
    #[error("asset {file} is {found:?}, expected {expected:?}")]
    KindMismatch {
        file: String,
        expected: AssetKind,
        found: AssetKind,
    },

    /// A known string table does not contain the referenced key.
    #[error("string table '{table}' has no key '{key}' (referenced by {file})")]
    MissingTableEntry {
        file: String,
        table: String,
        key: String,
    },

    /// The package source could not load an asset's export records.
    #[error("failed to load package {file}: {detail}")]
    PackageLoad { file: String, detail: String },

    /// The package source could not decode a texture.
    #[error("failed to decode texture {file}: {detail}")]
    TextureDecode { file: String, detail: String },

    /// An export index points past the end of the asset's export records.
    #[error("export index {index} out of range in {file} ({count} exports)")]
    ExportOutOfRange {
        file: String,
        index: usize,
        count: usize,
    },

    /// The asset's structure breaks an assumption every dump must satisfy.
    #[error("malformed asset {file}: {detail}")]
    MalformedAsset { file: String, detail: String },

    /// Following super references did not terminate.
    #[error("super chain of {file} is longer than {limit} assets")]
    SuperChainTooDeep { file: String, limit: usize },
}

impl ExtractError {
    /// True for violations that abort the whole run rather than one asset.
    pub fn is_invariant(&self) -> bool {
        matches!(
            self,
            ExtractError::ExportOutOfRange { .. }
                | ExtractError::MalformedAsset { .. }
                | ExtractError::SuperChainTooDeep { .. }
        )
    }
}

/// Turns a domain failure into a logged skip and passes invariant violations
/// through. `what` names the asset or step for the log line.
pub fn skip_domain<T>(result: Result<T, ExtractError>, what: &str) -> Result<Option<T>, ExtractError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_invariant() => Err(err),
        Err(err) => {
            tracing::warn!(asset = what, error = %err, "skipping asset");
            Ok(None)
        }
    }
}
