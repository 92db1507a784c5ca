//! Object reference → physical asset file.
//!
//! References name assets by their in-game mount path (`/Game/...`,
//! `/<ModName>/...`) or by their dumped package path. Neither matches the
//! indexed file paths exactly, so a reference resolves to the file in the
//! owning mod whose path shares the longest tail with it.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::asset::path_segments;
use crate::error::ExtractError;
use crate::id::AssetId;
use crate::index::{ASSET_EXTENSION, AssetIndex};
use crate::tree::split_suffix;

/// Mount point that aliases the base mod.
const GAME_MOUNT: &str = "Game";

/// Mount point of native classes, which have no asset file.
const SCRIPT_MOUNT: &str = "Script";

/// Memoizing reference resolver. Results are keyed by the reference with
/// its export suffix removed, so `A.0` and `A.3` share one entry.
#[derive(Debug, Default)]
pub struct PathResolver {
    cache: RefCell<HashMap<String, AssetId>>,
}

impl PathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `reference` to an indexed file. A numeric suffix on a fresh
    /// resolution becomes the file's primary export.
    pub fn resolve(&self, index: &AssetIndex, reference: &str) -> Result<AssetId, ExtractError> {
        self.resolve_inner(index, reference, true)
    }

    /// Resolve a reference to a sub-object export. The file's primary
    /// export is left alone.
    pub fn resolve_untracked(&self, index: &AssetIndex, reference: &str) -> Result<AssetId, ExtractError> {
        self.resolve_inner(index, reference, false)
    }

    fn resolve_inner(
        &self,
        index: &AssetIndex,
        reference: &str,
        track_export: bool,
    ) -> Result<AssetId, ExtractError> {
        let (stem, suffix) = split_suffix(reference);
        let key = stem.replace('\\', "/");
        if let Some(&id) = self.cache.borrow().get(&key) {
            return Ok(id);
        }

        let id = best_match(index, &key).map_err(|reason| ExtractError::Unresolvable {
            reference: reference.to_string(),
            reason,
        })?;
        if let Some(export) = suffix.and_then(|s| s.parse::<usize>().ok()) {
            if track_export {
                index.file(id).set_export_override(export);
            }
        }
        tracing::debug!(reference, file = index.file(id).path(), "resolved reference");
        self.cache.borrow_mut().insert(key, id);
        Ok(id)
    }

    /// Number of memoized references.
    pub fn cached(&self) -> usize {
        self.cache.borrow().len()
    }
}

/// The mod a reference points into: a `Mods/<name>` directory, else the
/// mount point (`Game` meaning the base mod).
fn reference_mod<'a>(index: &'a AssetIndex, segments: &[&'a str]) -> Result<&'a str, &'static str> {
    let first = *segments.first().ok_or("empty reference")?;
    if first == SCRIPT_MOUNT {
        return Err("native class has no asset");
    }
    let marked = segments
        .iter()
        .position(|s| *s == "Mods")
        .filter(|&i| i + 2 < segments.len())
        .map(|i| segments[i + 1]);
    if let Some(name) = marked.filter(|name| index.has_mod(name)) {
        return Ok(name);
    }
    if first == GAME_MOUNT {
        return Ok(index.base_mod());
    }
    if index.has_mod(first) {
        return Ok(first);
    }
    Err("unknown mod")
}

fn best_match(index: &AssetIndex, stem: &str) -> Result<AssetId, &'static str> {
    let segments: Vec<&str> = path_segments(stem).collect();
    let mod_name = reference_mod(index, &segments)?;
    let files = index.mod_files(mod_name).ok_or("unknown mod")?;

    let file_name = format!("{}.{ASSET_EXTENSION}", segments.last().ok_or("empty reference")?);
    let query: Vec<&str> = std::iter::once(file_name.as_str())
        .chain(segments.iter().rev().skip(1).copied())
        .collect();

    let mut best: Option<(usize, AssetId)> = None;
    for &id in files {
        let shared = common_prefix(&query, index.file(id).reversed_segments());
        if shared > 0 && best.is_none_or(|(n, _)| shared > n) {
            best = Some((shared, id));
        }
    }
    best.map(|(_, id)| id).ok_or("no file in mod matches")
}

fn common_prefix(query: &[&str], candidate: &[String]) -> usize {
    query
        .iter()
        .zip(candidate)
        .take_while(|(a, b)| a.eq_ignore_ascii_case(b))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::DEFAULT_BASE_MOD;

    fn index() -> AssetIndex {
        AssetIndex::scan(
            [
                "FactoryGame/Content/FactoryGame/Resource/Parts/IronPlate/Desc_IronPlate.uasset",
                "FactoryGame/Content/FactoryGame/Recipes/Recipe_IronPlate.uasset",
                "FactoryGame/Content/FactoryGame/Other/Parts/IronPlate/Desc_IronPlate.uasset",
                "FactoryGame/Mods/RefinedPower/Content/Parts/Desc_IronPlate.uasset",
                "FactoryGame/Mods/RefinedPower/Content/Buildings/Build_Turbine.uasset",
            ],
            DEFAULT_BASE_MOD,
        )
    }

    #[test]
    fn game_mount_resolves_into_base_mod() {
        let index = index();
        let resolver = PathResolver::new();
        let id = resolver
            .resolve(&index, "/Game/FactoryGame/Recipes/Recipe_IronPlate.Recipe_IronPlate_C")
            .unwrap();
        assert_eq!(index.file(id).stem(), "Recipe_IronPlate");
        assert_eq!(index.file(id).mod_name(), "FactoryGame");
    }

    #[test]
    fn longest_tail_wins() {
        let index = index();
        let resolver = PathResolver::new();
        let id = resolver
            .resolve(&index, "/Game/FactoryGame/Resource/Parts/IronPlate/Desc_IronPlate.Desc_IronPlate_C")
            .unwrap();
        assert!(index.file(id).path().contains("/Resource/"));
    }

    #[test]
    fn tie_takes_first_file_in_order() {
        let index = index();
        let resolver = PathResolver::new();
        // Both base-mod plates share only "Parts/IronPlate/Desc_IronPlate".
        let id = resolver
            .resolve(&index, "/Game/Elsewhere/Parts/IronPlate/Desc_IronPlate.0")
            .unwrap();
        assert!(index.file(id).path().contains("/Other/"));
    }

    #[test]
    fn mod_mount_resolves_into_mod() {
        let index = index();
        let resolver = PathResolver::new();
        let id = resolver
            .resolve(&index, "/RefinedPower/Buildings/Build_Turbine.Build_Turbine_C")
            .unwrap();
        assert_eq!(index.file(id).mod_name(), "RefinedPower");
    }

    #[test]
    fn package_paths_with_mods_marker_resolve_into_mod() {
        let index = index();
        let resolver = PathResolver::new();
        let id = resolver
            .resolve(&index, "FactoryGame/Mods/RefinedPower/Content/Parts/Desc_IronPlate.0")
            .unwrap();
        assert_eq!(index.file(id).mod_name(), "RefinedPower");
    }

    #[test]
    fn numeric_suffix_sets_primary_export() {
        let index = index();
        let resolver = PathResolver::new();
        let id = resolver
            .resolve(&index, "FactoryGame/Content/FactoryGame/Recipes/Recipe_IronPlate.2")
            .unwrap();
        assert_eq!(index.file(id).primary_export(), 2);
    }

    #[test]
    fn untracked_resolution_keeps_primary_export() {
        let index = index();
        let resolver = PathResolver::new();
        let id = resolver
            .resolve_untracked(&index, "FactoryGame/Content/FactoryGame/Recipes/Recipe_IronPlate.2")
            .unwrap();
        assert_eq!(index.file(id).primary_export(), 0);
    }

    #[test]
    fn resolution_is_memoized() {
        let index = index();
        let resolver = PathResolver::new();
        let a = resolver.resolve(&index, "/Game/FactoryGame/Recipes/Recipe_IronPlate.0").unwrap();
        let b = resolver.resolve(&index, "/Game/FactoryGame/Recipes/Recipe_IronPlate.4").unwrap();
        assert_eq!(a, b);
        assert_eq!(resolver.cached(), 1);
        // Cached hits do not move the primary export.
        assert_eq!(index.file(a).primary_export(), 0);
    }

    #[test]
    fn unknown_mod_is_unresolvable() {
        let index = index();
        let err = PathResolver::new()
            .resolve(&index, "/NotAMod/Things/Desc_X.Desc_X_C")
            .unwrap_err();
        assert!(matches!(err, ExtractError::Unresolvable { reason: "unknown mod", .. }));
    }

    #[test]
    fn missing_file_is_unresolvable() {
        let index = index();
        let err = PathResolver::new()
            .resolve(&index, "/Game/FactoryGame/Recipes/Recipe_Missing.Recipe_Missing_C")
            .unwrap_err();
        assert!(!err.is_invariant());
    }

    #[test]
    fn native_classes_do_not_resolve() {
        let index = index();
        assert!(
            PathResolver::new()
                .resolve(&index, "/Script/FactoryGame.FGBuildGun")
                .is_err()
        );
    }
}
