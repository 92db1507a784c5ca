//! Scan of the virtual file namespace into per-mod asset sets.

use std::collections::BTreeMap;

use crate::asset::{AssetFile, path_segments};
use crate::id::AssetId;

/// Extension of binary asset files; everything else in the namespace is
/// ignored by the index.
pub const ASSET_EXTENSION: &str = "uasset";

/// Name of the mod that owns every file outside a `Mods/` directory.
pub const DEFAULT_BASE_MOD: &str = "FactoryGame";

/// Directory segment whose successor names a mod.
const MODS_MARKER: &str = "Mods";

/// All indexed asset files, grouped by owning mod.
#[derive(Debug)]
pub struct AssetIndex {
    base_mod: String,
    files: Vec<AssetFile>,
    mods: BTreeMap<String, Vec<AssetId>>,
}

impl AssetIndex {
    /// Build the index from namespace paths. Files are numbered in
    /// (mod, path) order so ids double as a deterministic ordering.
    pub fn scan<I, S>(paths: I, base_mod: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries: Vec<(String, String)> = paths
            .into_iter()
            .filter_map(|p| {
                let path = p.as_ref().replace('\\', "/");
                is_asset_path(&path).then(|| (owning_mod(&path, base_mod).to_string(), path))
            })
            .collect();
        entries.sort();
        entries.dedup();

        let mut files = Vec::with_capacity(entries.len());
        let mut mods: BTreeMap<String, Vec<AssetId>> = BTreeMap::new();
        for (i, (mod_name, path)) in entries.into_iter().enumerate() {
            let id = AssetId(i as u32);
            mods.entry(mod_name.clone()).or_default().push(id);
            files.push(AssetFile::new(id, mod_name, path));
        }

        for (name, ids) in &mods {
            tracing::info!(mod_name = %name, files = ids.len(), "indexed mod");
        }

        Self {
            base_mod: base_mod.to_string(),
            files,
            mods,
        }
    }

    pub fn base_mod(&self) -> &str {
        &self.base_mod
    }

    /// The file with the given id. Ids only come from this index.
    pub fn file(&self, id: AssetId) -> &AssetFile {
        &self.files[id.0 as usize]
    }

    pub fn files(&self) -> impl Iterator<Item = &AssetFile> {
        self.files.iter()
    }

    /// Mods in name order with their files in path order.
    pub fn mods(&self) -> impl Iterator<Item = (&str, &[AssetId])> {
        self.mods.iter().map(|(name, ids)| (name.as_str(), ids.as_slice()))
    }

    pub fn mod_files(&self, mod_name: &str) -> Option<&[AssetId]> {
        self.mods.get(mod_name).map(Vec::as_slice)
    }

    pub fn has_mod(&self, mod_name: &str) -> bool {
        self.mods.contains_key(mod_name)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn is_asset_path(path: &str) -> bool {
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(ASSET_EXTENSION))
}

/// The mod owning `path`: the directory after a `Mods` segment, else the
/// base mod.
pub fn owning_mod<'a>(path: &'a str, base_mod: &'a str) -> &'a str {
    let segments: Vec<&str> = path_segments(path).collect();
    segments
        .iter()
        .position(|s| *s == MODS_MARKER)
        .filter(|&i| i + 2 < segments.len())
        .map_or(base_mod, |i| segments[i + 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_are_grouped_by_mods_marker() {
        let index = AssetIndex::scan(
            [
                "FactoryGame/Content/FactoryGame/Recipes/Recipe_IronPlate.uasset",
                "FactoryGame/Mods/RefinedPower/Content/Recipes/Recipe_Turbine.uasset",
                "FactoryGame/Mods/RefinedPower/Content/Parts/Desc_Coil.uasset",
            ],
            DEFAULT_BASE_MOD,
        );
        assert_eq!(index.len(), 3);
        assert_eq!(index.mod_files("FactoryGame").unwrap().len(), 1);
        assert_eq!(index.mod_files("RefinedPower").unwrap().len(), 2);
    }

    #[test]
    fn non_asset_files_are_skipped() {
        let index = AssetIndex::scan(
            [
                "FactoryGame/Content/Localization/Items_Data.csv",
                "FactoryGame/Content/A.uexp",
                "FactoryGame/Content/A.uasset",
            ],
            DEFAULT_BASE_MOD,
        );
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn ids_follow_mod_then_path_order() {
        let index = AssetIndex::scan(
            [
                "FactoryGame/Mods/Zeta/B.uasset",
                "FactoryGame/Mods/Alpha/B.uasset",
                "FactoryGame/Mods/Alpha/A.uasset",
            ],
            DEFAULT_BASE_MOD,
        );
        let names: Vec<(&str, &str)> = index
            .files()
            .map(|f| (f.mod_name(), f.stem()))
            .collect();
        assert_eq!(names, vec![("Alpha", "A"), ("Alpha", "B"), ("Zeta", "B")]);
        let mods: Vec<&str> = index.mods().map(|(m, _)| m).collect();
        assert_eq!(mods, vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn mods_directory_needs_a_name_segment() {
        assert_eq!(owning_mod("FactoryGame/Mods/X.uasset", "FactoryGame"), "FactoryGame");
        assert_eq!(owning_mod("FactoryGame/Mods/X/Y.uasset", "FactoryGame"), "X");
    }

    #[test]
    fn duplicate_paths_collapse() {
        let index = AssetIndex::scan(["A/B.uasset", "A\\B.uasset"], DEFAULT_BASE_MOD);
        assert_eq!(index.len(), 1);
    }
}
