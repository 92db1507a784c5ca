//! One physical asset file and its lazily loaded state.

use std::cell::{Cell, OnceCell};
use std::cmp::Ordering;

use serde_json::Value;

use crate::error::ExtractError;
use crate::id::AssetId;
use crate::source::{Package, PackageSource};

/// Structural type of an asset, derived from class-name heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    RecipeDescriptor,
    MachineDescriptor,
    MachineBuildable,
    ItemDescriptor,
    Schematic,
    ResearchTree,
    ResourceNode,
    Texture,
    DataTable,
    GameWorldModule,
    Other,
}

/// A file in the asset index. Identity is (mod, path); everything else is
/// cached on first use and never invalidated.
#[derive(Debug)]
pub struct AssetFile {
    id: AssetId,
    mod_name: String,
    path: String,
    reversed_segments: Vec<String>,
    package: OnceCell<Package>,
    super_asset: OnceCell<Option<AssetId>>,
    kind: OnceCell<AssetKind>,
    export_override: Cell<Option<usize>>,
}

impl AssetFile {
    pub fn new(id: AssetId, mod_name: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let reversed_segments = path_segments(&path).rev().map(str::to_string).collect();
        Self {
            id,
            mod_name: mod_name.into(),
            path,
            reversed_segments,
            package: OnceCell::new(),
            super_asset: OnceCell::new(),
            kind: OnceCell::new(),
            export_override: Cell::new(None),
        }
    }

    pub fn id(&self) -> AssetId {
        self.id
    }

    pub fn mod_name(&self) -> &str {
        &self.mod_name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// File name without directory or extension.
    pub fn stem(&self) -> &str {
        let name = self.reversed_segments.first().map_or("", String::as_str);
        name.rsplit_once('.').map_or(name, |(stem, _)| stem)
    }

    /// Path segments from the file name back to the root.
    pub fn reversed_segments(&self) -> &[String] {
        &self.reversed_segments
    }

    // -----------------------------------------------------------------------
    // Export records
    // -----------------------------------------------------------------------

    /// Load the export records, reading through `source` on first call.
    pub fn load(&self, source: &dyn PackageSource) -> Result<&Package, ExtractError> {
        if let Some(package) = self.package.get() {
            return Ok(package);
        }
        let package = source.load_package(&self.path)?;
        if package.is_empty() {
            return Err(ExtractError::PackageLoad {
                file: self.path.clone(),
                detail: "package has no exports".into(),
            });
        }
        Ok(self.package.get_or_init(|| package))
    }

    /// Export record `index`, failing if the index is out of bounds.
    pub fn export(&self, source: &dyn PackageSource, index: usize) -> Result<&Value, ExtractError> {
        let package = self.load(source)?;
        package.get(index).ok_or_else(|| ExtractError::ExportOutOfRange {
            file: self.path.clone(),
            index,
            count: package.len(),
        })
    }

    /// The export that unqualified lookups read: the override recorded by
    /// the path resolver, else export 0.
    pub fn primary_export(&self) -> usize {
        self.export_override.get().unwrap_or(0)
    }

    pub fn set_export_override(&self, index: usize) {
        self.export_override.set(Some(index));
    }

    // -----------------------------------------------------------------------
    // Memoized derived state
    // -----------------------------------------------------------------------

    pub(crate) fn cached_kind(&self) -> Option<AssetKind> {
        self.kind.get().copied()
    }

    pub(crate) fn cache_kind(&self, kind: AssetKind) -> AssetKind {
        *self.kind.get_or_init(|| kind)
    }

    pub(crate) fn cached_super(&self) -> Option<Option<AssetId>> {
        self.super_asset.get().copied()
    }

    pub(crate) fn cache_super(&self, super_asset: Option<AssetId>) -> Option<AssetId> {
        *self.super_asset.get_or_init(|| super_asset)
    }
}

impl PartialEq for AssetFile {
    fn eq(&self, other: &Self) -> bool {
        self.mod_name == other.mod_name && self.path == other.path
    }
}

impl Eq for AssetFile {}

impl PartialOrd for AssetFile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AssetFile {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.mod_name, &self.path).cmp(&(&other.mod_name, &other.path))
    }
}

/// Non-empty segments of a `/` or `\` separated path.
pub fn path_segments(path: &str) -> impl DoubleEndedIterator<Item = &str> {
    path.split(['/', '\\']).filter(|s| !s.is_empty())
}
