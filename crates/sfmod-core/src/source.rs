//! The boundary between the resolution engine and whatever reads the game's
//! packaged content.
//!
//! Archive reading, decompression, and texture decoding are not done here.
//! A [`PackageSource`] hands the engine already-parsed export records as JSON
//! trees and already-decoded texture bitmaps.

use std::collections::BTreeMap;

use image::RgbaImage;
use serde_json::Value;

use crate::error::ExtractError;

/// The export records of one asset file, in export-index order.
pub type Package = Vec<Value>;

/// The decoded images of one texture export. Texture arrays carry several.
pub type Icon = Vec<RgbaImage>;

/// Supplies the virtual file namespace and per-file content.
pub trait PackageSource {
    /// Every file path in the namespace, `/`-separated, relative to the root.
    fn files(&self) -> Vec<String>;

    /// Load the export records of the asset at `path`.
    fn load_package(&self, path: &str) -> Result<Package, ExtractError>;

    /// Decode the texture stored in export `export` of the asset at `path`.
    fn decode_texture(&self, path: &str, export: usize) -> Result<Icon, ExtractError>;
}

// ===========================================================================
// In-memory source
// ===========================================================================

/// A package source backed by maps, for embedding and tests.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    packages: BTreeMap<String, Package>,
    textures: BTreeMap<(String, usize), Icon>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an asset's export records.
    pub fn insert_package(&mut self, path: impl Into<String>, exports: Package) {
        self.packages.insert(path.into(), exports);
    }

    /// Attach decoded images to export `export` of an asset.
    pub fn insert_texture(&mut self, path: impl Into<String>, export: usize, images: Icon) {
        self.textures.insert((path.into(), export), images);
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl PackageSource for MemorySource {
    fn files(&self) -> Vec<String> {
        self.packages.keys().cloned().collect()
    }

    fn load_package(&self, path: &str) -> Result<Package, ExtractError> {
        self.packages
            .get(path)
            .cloned()
            .ok_or_else(|| ExtractError::PackageLoad {
                file: path.to_string(),
                detail: "no such package".into(),
            })
    }

    fn decode_texture(&self, path: &str, export: usize) -> Result<Icon, ExtractError> {
        self.textures
            .get(&(path.to_string(), export))
            .cloned()
            .ok_or_else(|| ExtractError::TextureDecode {
                file: path.to_string(),
                detail: format!("no image data for export {export}"),
            })
    }
}
