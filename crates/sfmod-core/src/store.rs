//! Typed field access over the indexed assets, with super-chain fallback.
//!
//! [`AssetStore`] owns the package source, the index, and the path resolver.
//! Every lookup goes through [`Lookup`], which selects the export record to
//! read and whether the super chain may (or must) answer instead.

use serde_json::Value;

use crate::asset::AssetFile;
use crate::error::ExtractError;
use crate::id::AssetId;
use crate::index::AssetIndex;
use crate::resolver::PathResolver;
use crate::source::PackageSource;
use crate::tree::{self, export_index, reference_path};

/// Longest super chain followed before the dump is declared cyclic.
pub const SUPER_CHAIN_LIMIT: usize = 64;

// ===========================================================================
// Lookup options
// ===========================================================================

/// Which export record of an asset a lookup reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Export {
    /// The resolver's override for this file, else export 0. Class-level
    /// fields (`SuperStruct`, `Class`, `Name`) live here.
    Primary,
    /// The class default object when the primary export declares one,
    /// else the primary export. Configured `Properties` live here.
    DefaultObject,
    /// A fixed export index, used for sub-objects named by a reference.
    Index(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    pub export: Export,
    /// Fall back to the super chain when the local value is absent.
    pub search_super: bool,
    /// Skip the local value and only consult the super chain.
    pub force_super: bool,
}

impl Lookup {
    /// Local class-level field on the primary export.
    pub const PRIMARY: Lookup = Lookup {
        export: Export::Primary,
        search_super: false,
        force_super: false,
    };

    /// Configured property on the default object, inherited when unset.
    pub const PROPERTIES: Lookup = Lookup {
        export: Export::DefaultObject,
        search_super: true,
        force_super: false,
    };

    /// Local field on a specific export.
    pub const fn at(index: usize) -> Lookup {
        Lookup {
            export: Export::Index(index),
            search_super: false,
            force_super: false,
        }
    }

    pub const fn local(self) -> Lookup {
        Lookup {
            search_super: false,
            force_super: false,
            ..self
        }
    }

    pub const fn inherited(self) -> Lookup {
        Lookup {
            search_super: true,
            ..self
        }
    }

    pub const fn super_only(self) -> Lookup {
        Lookup {
            force_super: true,
            ..self
        }
    }
}

// ===========================================================================
// Store
// ===========================================================================

pub struct AssetStore {
    source: Box<dyn PackageSource>,
    index: AssetIndex,
    resolver: PathResolver,
}

impl std::fmt::Debug for AssetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetStore")
            .field("index", &self.index)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl AssetStore {
    /// Scan `source` and take ownership of it.
    pub fn new(source: Box<dyn PackageSource>, base_mod: &str) -> Self {
        let index = AssetIndex::scan(source.files(), base_mod);
        Self {
            source,
            index,
            resolver: PathResolver::new(),
        }
    }

    pub fn index(&self) -> &AssetIndex {
        &self.index
    }

    pub fn source(&self) -> &dyn PackageSource {
        self.source.as_ref()
    }

    pub fn file(&self, id: AssetId) -> &AssetFile {
        self.index.file(id)
    }

    pub fn resolve(&self, reference: &str) -> Result<AssetId, ExtractError> {
        self.resolver.resolve(&self.index, reference)
    }

    /// Resolve a reference to a sub-object: the file plus the export its
    /// numeric suffix names (the file's primary export when it has none).
    pub fn resolve_export(&self, reference: &str) -> Result<(AssetId, usize), ExtractError> {
        let id = self.resolver.resolve_untracked(&self.index, reference)?;
        let export = export_index(reference).unwrap_or_else(|| self.file(id).primary_export());
        self.file(id).export(self.source(), export)?;
        Ok((id, export))
    }

    // -----------------------------------------------------------------------
    // Export selection
    // -----------------------------------------------------------------------

    /// Decode the class default object's export index from
    /// `ClassDefaultObject.ObjectPath`. Absent, non-numeric, or out of range
    /// is a malformed asset.
    pub fn default_object_index(&self, id: AssetId) -> Result<usize, ExtractError> {
        let file = self.file(id);
        let primary = file.export(self.source(), file.primary_export())?;
        let path = tree::select(primary, "ClassDefaultObject.ObjectPath")
            .and_then(Value::as_str)
            .ok_or_else(|| ExtractError::MalformedAsset {
                file: file.path().to_string(),
                detail: "no ClassDefaultObject".into(),
            })?;
        self.checked_default_object(file, path)
    }

    fn checked_default_object(&self, file: &AssetFile, path: &str) -> Result<usize, ExtractError> {
        let index = export_index(path).ok_or_else(|| ExtractError::MalformedAsset {
            file: file.path().to_string(),
            detail: format!("ClassDefaultObject path '{path}' has no export index"),
        })?;
        file.export(self.source(), index)?;
        Ok(index)
    }

    fn export_for(&self, id: AssetId, export: Export) -> Result<usize, ExtractError> {
        let file = self.file(id);
        match export {
            Export::Primary => Ok(file.primary_export()),
            Export::Index(index) => Ok(index),
            Export::DefaultObject => {
                let primary = file.export(self.source(), file.primary_export())?;
                match tree::select(primary, "ClassDefaultObject.ObjectPath").and_then(Value::as_str) {
                    Some(path) => self.checked_default_object(file, path),
                    None => Ok(file.primary_export()),
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Super chain
    // -----------------------------------------------------------------------

    /// The asset `id` inherits from. Native parents and references that do
    /// not resolve mean "no super".
    pub fn super_of(&self, id: AssetId) -> Result<Option<AssetId>, ExtractError> {
        let file = self.file(id);
        if let Some(cached) = file.cached_super() {
            return Ok(cached);
        }
        let primary = file.export(self.source(), file.primary_export())?;
        let reference = tree::select(primary, "Super")
            .or_else(|| tree::select(primary, "SuperStruct"))
            .and_then(reference_path);
        let super_asset = match reference {
            Some(reference) => match self.resolve(reference) {
                Ok(parent) if parent != id => Some(parent),
                Ok(_) => None,
                Err(err) => {
                    tracing::debug!(file = file.path(), error = %err, "super not in index");
                    None
                }
            },
            None => None,
        };
        Ok(file.cache_super(super_asset))
    }

    // -----------------------------------------------------------------------
    // Field lookup
    // -----------------------------------------------------------------------

    /// The value at `path`, honouring the lookup's export and super options.
    pub fn token(&self, id: AssetId, path: &str, lookup: Lookup) -> Result<Option<Value>, ExtractError> {
        if !lookup.force_super {
            if let Some(value) = self.local_token(id, path, lookup.export)? {
                return Ok(Some(value));
            }
            if !lookup.search_super {
                return Ok(None);
            }
        }

        let mut current = self.super_of(id)?;
        let mut depth = 0;
        while let Some(parent) = current {
            depth += 1;
            if depth > SUPER_CHAIN_LIMIT {
                return Err(ExtractError::SuperChainTooDeep {
                    file: self.file(id).path().to_string(),
                    limit: SUPER_CHAIN_LIMIT,
                });
            }
            if let Some(value) = self.local_token(parent, path, lookup.export)? {
                return Ok(Some(value));
            }
            current = self.super_of(parent)?;
        }
        Ok(None)
    }

    fn local_token(&self, id: AssetId, path: &str, export: Export) -> Result<Option<Value>, ExtractError> {
        let index = self.export_for(id, export)?;
        let record = self.file(id).export(self.source(), index)?;
        Ok(tree::select(record, path).cloned())
    }

    pub fn string(&self, id: AssetId, path: &str, lookup: Lookup) -> Result<Option<String>, ExtractError> {
        Ok(self.token(id, path, lookup)?.as_ref().and_then(tree::as_string))
    }

    pub fn int(&self, id: AssetId, path: &str, lookup: Lookup) -> Result<Option<i64>, ExtractError> {
        Ok(self.token(id, path, lookup)?.as_ref().and_then(tree::as_int))
    }

    pub fn double(&self, id: AssetId, path: &str, lookup: Lookup) -> Result<Option<f64>, ExtractError> {
        Ok(self.token(id, path, lookup)?.as_ref().and_then(tree::as_double))
    }

    pub fn bool(&self, id: AssetId, path: &str, lookup: Lookup) -> Result<Option<bool>, ExtractError> {
        Ok(self.token(id, path, lookup)?.as_ref().and_then(tree::as_bool))
    }

    /// The reference path stored at `path` (bare string, object path, or
    /// soft path).
    pub fn reference(&self, id: AssetId, path: &str, lookup: Lookup) -> Result<Option<String>, ExtractError> {
        Ok(self
            .token(id, path, lookup)?
            .as_ref()
            .and_then(reference_path)
            .map(str::to_string))
    }

    /// The entries of the array at `path`; absent or non-array is empty.
    pub fn array(&self, id: AssetId, path: &str, lookup: Lookup) -> Result<Vec<Value>, ExtractError> {
        Ok(match self.token(id, path, lookup)? {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        })
    }

    /// The asset's internal name: the `Name` of its primary export.
    pub fn raw_name(&self, id: AssetId) -> Result<Option<String>, ExtractError> {
        self.string(id, "Name", Lookup::PRIMARY)
    }
}
