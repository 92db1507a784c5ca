//! Structural classification of assets by class-name heuristics.

use crate::asset::AssetKind;
use crate::error::ExtractError;
use crate::id::AssetId;
use crate::store::{AssetStore, Lookup, SUPER_CHAIN_LIMIT};

/// Engine classes whose instances are textures.
const TEXTURE_CLASSES: &[&str] = &["Texture2D", "Texture2DArray", "TextureCube"];

/// Engine classes whose instances are row tables.
const DATA_TABLE_CLASSES: &[&str] = &["DataTable", "CompositeDataTable"];

/// Native game base classes and the asset kind their subclasses have.
fn base_class_kind(class: &str) -> Option<AssetKind> {
    let kind = match class {
        "FGRecipe" => AssetKind::RecipeDescriptor,
        "FGBuildableManufacturer"
        | "FGBuildableManufacturerVariablePower"
        | "FGBuildableGeneratorFuel"
        | "FGBuildableGeneratorNuclear"
        | "FGBuildableGeneratorGeoThermal"
        | "FGBuildableResourceExtractor"
        | "FGBuildableWaterPump"
        | "FGBuildableFrackingExtractor"
        | "FGBuildableFrackingActivator" => AssetKind::MachineBuildable,
        "FGBuildingDescriptor" => AssetKind::MachineDescriptor,
        "FGItemDescriptor"
        | "FGResourceDescriptor"
        | "FGPowerShardDescriptor"
        | "FGItemDescriptorBiomass"
        | "FGEquipmentDescriptor"
        | "FGConsumableDescriptor"
        | "FGAmmoTypeInstantHit"
        | "FGAmmoTypeProjectile"
        | "FGAmmoTypeSpreadshot"
        | "FGItemDescriptorPowerBoosterFuel"
        | "FGItemDescriptorNuclearFuel" => AssetKind::ItemDescriptor,
        "FGSchematic" => AssetKind::Schematic,
        "FGResearchTree" => AssetKind::ResearchTree,
        "FGResourceNode" => AssetKind::ResourceNode,
        _ => return None,
    };
    Some(kind)
}

/// `Class'FGRecipe'` → `FGRecipe`; bare names pass through.
fn class_name(decorated: &str) -> &str {
    match (decorated.find('\''), decorated.rfind('\'')) {
        (Some(open), Some(close)) if close > open => &decorated[open + 1..close],
        _ => decorated,
    }
}

impl AssetStore {
    /// The asset's structural kind, computed once and cached on the file.
    pub fn kind(&self, id: AssetId) -> Result<AssetKind, ExtractError> {
        self.classify(id, 0)
    }

    fn classify(&self, id: AssetId, depth: usize) -> Result<AssetKind, ExtractError> {
        let file = self.file(id);
        if let Some(kind) = file.cached_kind() {
            return Ok(kind);
        }
        if depth > SUPER_CHAIN_LIMIT {
            return Err(ExtractError::SuperChainTooDeep {
                file: file.path().to_string(),
                limit: SUPER_CHAIN_LIMIT,
            });
        }

        let mut kind = self.declared_kind(id)?;
        if kind == AssetKind::Other {
            if let Some(parent) = self.super_of(id)? {
                kind = self.classify(parent, depth + 1)?;
            }
        }
        // World modules derive from a blueprint-only base class, so they are
        // recognised by shape: a root module that lists schematics.
        if kind == AssetKind::Other && self.is_world_module(id)? {
            kind = AssetKind::GameWorldModule;
        }

        tracing::debug!(file = file.path(), ?kind, "classified");
        Ok(file.cache_kind(kind))
    }

    fn declared_kind(&self, id: AssetId) -> Result<AssetKind, ExtractError> {
        let engine_class = match self.string(id, "Class", Lookup::PRIMARY)? {
            Some(class) => Some(class),
            None => self.string(id, "Type", Lookup::PRIMARY)?,
        };
        if let Some(class) = engine_class.as_deref().map(class_name) {
            if TEXTURE_CLASSES.contains(&class) {
                return Ok(AssetKind::Texture);
            }
            if DATA_TABLE_CLASSES.contains(&class) {
                return Ok(AssetKind::DataTable);
            }
        }

        Ok(self
            .string(id, "SuperStruct.ObjectName", Lookup::PRIMARY)?
            .and_then(|name| base_class_kind(class_name(&name)))
            .unwrap_or(AssetKind::Other))
    }

    fn is_world_module(&self, id: AssetId) -> Result<bool, ExtractError> {
        let root = self.bool(id, "Properties.mRootModule", Lookup::PROPERTIES)?;
        Ok(root == Some(true)
            && self
                .token(id, "Properties.mSchematics", Lookup::PROPERTIES)?
                .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::DEFAULT_BASE_MOD;
    use crate::source::MemorySource;
    use serde_json::json;

    fn store_with(exports: &[(&str, serde_json::Value)]) -> AssetStore {
        let mut source = MemorySource::new();
        for (path, export) in exports {
            source.insert_package(*path, vec![export.clone()]);
        }
        AssetStore::new(Box::new(source), DEFAULT_BASE_MOD)
    }

    fn id_of(store: &AssetStore, stem: &str) -> AssetId {
        store
            .index()
            .files()
            .find(|f| f.stem() == stem)
            .map(|f| f.id())
            .unwrap()
    }

    #[test]
    fn class_names_are_unwrapped() {
        assert_eq!(class_name("Class'FGRecipe'"), "FGRecipe");
        assert_eq!(class_name("UScriptClass'Texture2D'"), "Texture2D");
        assert_eq!(class_name("FGRecipe"), "FGRecipe");
    }

    #[test]
    fn engine_class_field_marks_textures_and_tables() {
        let store = store_with(&[
            ("FactoryGame/Content/T_Icon.uasset", json!({"Class": "UScriptClass'Texture2D'"})),
            ("FactoryGame/Content/DT_Sink.uasset", json!({"Type": "DataTable"})),
        ]);
        assert_eq!(store.kind(id_of(&store, "T_Icon")).unwrap(), AssetKind::Texture);
        assert_eq!(store.kind(id_of(&store, "DT_Sink")).unwrap(), AssetKind::DataTable);
    }

    #[test]
    fn super_struct_maps_base_classes() {
        let store = store_with(&[
            (
                "FactoryGame/Content/Recipe_A.uasset",
                json!({"SuperStruct": {"ObjectName": "Class'FGRecipe'"}}),
            ),
            (
                "FactoryGame/Content/Desc_Ore.uasset",
                json!({"SuperStruct": {"ObjectName": "Class'FGResourceDescriptor'"}}),
            ),
            (
                "FactoryGame/Content/Build_Gen.uasset",
                json!({"SuperStruct": {"ObjectName": "Class'FGBuildableGeneratorFuel'"}}),
            ),
        ]);
        assert_eq!(store.kind(id_of(&store, "Recipe_A")).unwrap(), AssetKind::RecipeDescriptor);
        assert_eq!(store.kind(id_of(&store, "Desc_Ore")).unwrap(), AssetKind::ItemDescriptor);
        assert_eq!(store.kind(id_of(&store, "Build_Gen")).unwrap(), AssetKind::MachineBuildable);
    }

    #[test]
    fn unmapped_class_inherits_from_super() {
        let store = store_with(&[
            (
                "FactoryGame/Content/Build_Base.uasset",
                json!({"SuperStruct": {"ObjectName": "Class'FGBuildableManufacturer'"}}),
            ),
            (
                "FactoryGame/Mods/Tiered/Content/Build_Mk2.uasset",
                json!({
                    "SuperStruct": {"ObjectName": "BlueprintGeneratedClass'Build_Base_C'"},
                    "Super": {"ObjectPath": "/Game/Build_Base.0"}
                }),
            ),
        ]);
        assert_eq!(store.kind(id_of(&store, "Build_Mk2")).unwrap(), AssetKind::MachineBuildable);
    }

    #[test]
    fn root_module_with_schematics_is_world_module() {
        let store = store_with(&[
            (
                "FactoryGame/Mods/M/Content/RootGame_M.uasset",
                json!({"Properties": {"mRootModule": true, "mSchematics": [{"ObjectPath": "x.0"}]}}),
            ),
            (
                "FactoryGame/Mods/M/Content/SubModule.uasset",
                json!({"Properties": {"mRootModule": false, "mSchematics": [{"ObjectPath": "x.0"}]}}),
            ),
            (
                "FactoryGame/Mods/M/Content/EmptyRoot.uasset",
                json!({"Properties": {"mRootModule": true}}),
            ),
        ]);
        assert_eq!(store.kind(id_of(&store, "RootGame_M")).unwrap(), AssetKind::GameWorldModule);
        assert_eq!(store.kind(id_of(&store, "SubModule")).unwrap(), AssetKind::Other);
        assert_eq!(store.kind(id_of(&store, "EmptyRoot")).unwrap(), AssetKind::Other);
    }

    #[test]
    fn kind_is_memoized() {
        let store = store_with(&[(
            "FactoryGame/Content/Schematic_1.uasset",
            json!({"SuperStruct": {"ObjectName": "Class'FGSchematic'"}}),
        )]);
        let id = id_of(&store, "Schematic_1");
        assert_eq!(store.kind(id).unwrap(), AssetKind::Schematic);
        assert_eq!(store.file(id).cached_kind(), Some(AssetKind::Schematic));
    }
}
