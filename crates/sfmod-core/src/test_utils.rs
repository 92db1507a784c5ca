//! Fixture builders for unit and integration tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`. Assets are laid
//! out the way asset dumpers emit blueprints: export 0 is the generated
//! class, export 1 its class default object holding `Properties`, and any
//! sub-objects follow from export 2.

use image::{Rgba, RgbaImage};
use serde_json::{Value, json};

use crate::source::{MemorySource, PackageSource};

// ===========================================================================
// Paths and references
// ===========================================================================

/// Base-game content root.
pub const GAME: &str = "FactoryGame/Content/FactoryGame";

/// Content root of a mod.
pub fn mod_root(mod_name: &str) -> String {
    format!("FactoryGame/Mods/{mod_name}/Content")
}

/// Last segment of an extension-less asset path.
pub fn stem(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Package-path reference to an export: `path.N`.
pub fn export_ref(path: &str, export: usize) -> String {
    format!("{path}.{export}")
}

/// Object reference to an asset's generated class.
pub fn class_ref(path: &str) -> Value {
    json!({
        "ObjectName": format!("BlueprintGeneratedClass'{}_C'", stem(path)),
        "ObjectPath": export_ref(path, 0),
    })
}

/// Mount-point soft reference (`/Game/...` or `/<Mod>/...`) to a class.
pub fn soft_ref(path: &str) -> String {
    let mounted = if let Some(rest) = path.strip_prefix("FactoryGame/Content/") {
        format!("/Game/{rest}")
    } else if let Some(rest) = path.strip_prefix("FactoryGame/Mods/") {
        let (mod_name, tail) = rest.split_once('/').unwrap_or((rest, ""));
        let tail = tail.strip_prefix("Content/").unwrap_or(tail);
        format!("/{mod_name}/{tail}")
    } else {
        path.to_string()
    };
    format!("{mounted}.{}_C", stem(path))
}

/// `mDisplayName` with an inline localized string.
pub fn localized(name: &str) -> Value {
    json!({"LocalizedString": name})
}

/// `mDisplayName` pointing into a string table.
pub fn table_name(table: &str, key: &str) -> Value {
    json!({"TableId": format!("/Game/Localization/{table}.{table}"), "Key": key})
}

fn amounts(parts: &[(&str, u32)]) -> Value {
    Value::Array(
        parts
            .iter()
            .map(|(path, amount)| json!({"ItemClass": class_ref(path), "Amount": amount}))
            .collect(),
    )
}

/// A single-pixel icon image.
pub fn pixel(r: u8, g: u8, b: u8) -> RgbaImage {
    RgbaImage::from_pixel(1, 1, Rgba([r, g, b, 255]))
}

// ===========================================================================
// Fixture
// ===========================================================================

/// Accumulates assets into a [`MemorySource`].
#[derive(Debug, Default, Clone)]
pub struct Fixture {
    source: MemorySource,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_source(self) -> MemorySource {
        self.source
    }

    pub fn boxed(self) -> Box<dyn PackageSource> {
        Box::new(self.source)
    }

    /// Raw export records for `path` (extension-less).
    pub fn raw(&mut self, path: &str, exports: Vec<Value>) -> &mut Self {
        self.source.insert_package(format!("{path}.uasset"), exports);
        self
    }

    /// A blueprint deriving from native class `base_class`.
    pub fn blueprint(&mut self, path: &str, base_class: &str, properties: Value) -> &mut Self {
        self.blueprint_with_subobjects(path, base_class, None, properties, Vec::new())
    }

    /// A blueprint deriving from another blueprint asset.
    pub fn child_blueprint(&mut self, path: &str, parent: &str, properties: Value) -> &mut Self {
        let parent_class = format!("BlueprintGeneratedClass'{}_C'", stem(parent));
        self.blueprint_with_subobjects(path, &parent_class, Some(parent), properties, Vec::new())
    }

    /// A blueprint with sub-object exports starting at index 2.
    pub fn blueprint_with_subobjects(
        &mut self,
        path: &str,
        base_class: &str,
        parent: Option<&str>,
        properties: Value,
        subobjects: Vec<Value>,
    ) -> &mut Self {
        let name = stem(path);
        let super_struct = if base_class.contains('\'') {
            base_class.to_string()
        } else {
            format!("Class'{base_class}'")
        };
        let mut class = json!({
            "Type": "BlueprintGeneratedClass",
            "Name": format!("{name}_C"),
            "SuperStruct": {
                "ObjectName": super_struct,
                "ObjectPath": format!("/Script/FactoryGame.{base_class}"),
            },
            "ClassDefaultObject": {
                "ObjectName": format!("{name}_C'Default__{name}_C'"),
                "ObjectPath": export_ref(path, 1),
            },
        });
        if let Some(parent) = parent {
            class["Super"] = class_ref(parent);
        }
        let default_object = json!({
            "Type": format!("{name}_C"),
            "Name": format!("Default__{name}_C"),
            "Properties": properties,
        });
        let mut exports = vec![class, default_object];
        exports.extend(subobjects);
        self.raw(path, exports)
    }

    // -----------------------------------------------------------------------
    // Domain assets
    // -----------------------------------------------------------------------

    /// An item descriptor with a display name and small icon texture.
    pub fn item(&mut self, path: &str, name: &str, extra: Value) -> &mut Self {
        let mut properties = json!({"mDisplayName": localized(name)});
        merge(&mut properties, extra);
        self.blueprint(path, "FGItemDescriptor", properties)
    }

    /// An item descriptor whose small icon is the texture at `icon`.
    pub fn item_with_icon(&mut self, path: &str, name: &str, icon: &str) -> &mut Self {
        self.texture(icon, pixel(200, 100, 50));
        self.item(path, name, json!({"mSmallIcon": class_ref(icon)}))
    }

    /// A texture asset with one decoded image.
    pub fn texture(&mut self, path: &str, image: RgbaImage) -> &mut Self {
        self.raw(
            path,
            vec![json!({"Type": "Texture2D", "Class": "UScriptClass'Texture2D'", "Name": stem(path)})],
        );
        self.source.insert_texture(format!("{path}.uasset"), 0, vec![image]);
        self
    }

    /// A recipe. `name` of `None` leaves `mDisplayName` unset.
    pub fn recipe(
        &mut self,
        path: &str,
        name: Option<&str>,
        produced_in: &[&str],
        ingredients: &[(&str, u32)],
        products: &[(&str, u32)],
        duration: f64,
    ) -> &mut Self {
        let mut properties = json!({
            "mProducedIn": produced_in,
            "mIngredients": amounts(ingredients),
            "mProduct": amounts(products),
            "mManufactoringDuration": duration,
        });
        if let Some(name) = name {
            properties["mDisplayName"] = localized(name);
        }
        self.blueprint(path, "FGRecipe", properties)
    }

    /// A manufacturer buildable with the given extra properties.
    pub fn buildable(&mut self, path: &str, name: &str, extra: Value) -> &mut Self {
        let mut properties = json!({"mDisplayName": localized(name)});
        merge(&mut properties, extra);
        self.blueprint(path, "FGBuildableManufacturer", properties)
    }

    /// A building descriptor for `buildable`, optionally with a small icon.
    pub fn machine_descriptor(&mut self, path: &str, name: &str, buildable: &str, icon: Option<&str>) -> &mut Self {
        let mut properties = json!({
            "mDisplayName": localized(name),
            "mBuildableClass": class_ref(buildable),
        });
        if let Some(icon) = icon {
            self.texture(icon, pixel(10, 20, 30));
            properties["mSmallIcon"] = class_ref(icon);
        }
        self.blueprint(path, "FGBuildingDescriptor", properties)
    }

    /// A schematic whose single unlock sub-object (export 2) lists `recipes`.
    pub fn schematic(&mut self, path: &str, tech_tier: i64, menu_priority: f64, recipes: &[&str]) -> &mut Self {
        let unlock = json!({
            "Type": "BP_UnlockRecipe_C",
            "Name": "BP_UnlockRecipe_C_0",
            "Properties": {
                "mRecipes": recipes.iter().map(|r| class_ref(r)).collect::<Vec<_>>(),
            },
        });
        let properties = json!({
            "mTechTier": tech_tier,
            "mMenuPriority": menu_priority,
            "mUnlocks": [{"ObjectName": "BP_UnlockRecipe_C'BP_UnlockRecipe_C_0'", "ObjectPath": export_ref(path, 2)}],
        });
        self.blueprint_with_subobjects(path, "FGSchematic", None, properties, vec![unlock])
    }

    /// A research tree with one node sub-object per schematic.
    pub fn research_tree(&mut self, path: &str, schematics: &[&str]) -> &mut Self {
        let nodes: Vec<Value> = schematics
            .iter()
            .map(|schematic| {
                json!({
                    "Type": "BPD_ResearchTreeNode_C",
                    "Properties": {
                        "mNodeDataStruct": {
                            "Coordinates_5_A1B2": {"X": 1, "Y": 2},
                            "Schematic_2_C3D4": class_ref(schematic),
                        },
                    },
                })
            })
            .collect();
        let refs: Vec<Value> = (0..nodes.len())
            .map(|i| json!({"ObjectPath": export_ref(path, i + 2)}))
            .collect();
        self.blueprint_with_subobjects(path, "FGResearchTree", None, json!({"mNodes": refs}), nodes)
    }

    /// A sink-points data table.
    pub fn sink_table(&mut self, path: &str, rows: &[(&str, i64)]) -> &mut Self {
        let rows: serde_json::Map<String, Value> = rows
            .iter()
            .map(|(item, points)| {
                (
                    stem(item).to_string(),
                    json!({"ItemClass": class_ref(item), "Points": points, "OverriddenResourceSinkPoints": -1}),
                )
            })
            .collect();
        self.raw(
            path,
            vec![json!({"Type": "DataTable", "Class": "UScriptClass'DataTable'", "Name": stem(path), "Rows": rows})],
        )
    }

    /// A mod's root world module.
    pub fn world_module(
        &mut self,
        path: &str,
        schematics: &[&str],
        research_trees: &[&str],
        sink_table: Option<&str>,
    ) -> &mut Self {
        let mut properties = json!({
            "mRootModule": true,
            "mSchematics": schematics.iter().map(|s| class_ref(s)).collect::<Vec<_>>(),
            "mResearchTrees": research_trees.iter().map(|t| class_ref(t)).collect::<Vec<_>>(),
        });
        if let Some(table) = sink_table {
            properties["mResourceSinkItemPointsTable"] = json!({"AssetPathName": soft_ref(table)});
        }
        self.blueprint(path, "GameWorldModule", properties)
    }

    /// A resource node for the item descriptor at `item`.
    pub fn resource_node(&mut self, path: &str, item: &str, extract_multiplier: Option<f64>) -> &mut Self {
        let mut properties = json!({"mResourceClass": class_ref(item)});
        if let Some(multiplier) = extract_multiplier {
            properties["mExtractMultiplier"] = json!(multiplier);
        }
        self.blueprint(path, "FGResourceNode", properties)
    }
}

/// Shallow-merge the keys of `extra` into `target`.
fn merge(target: &mut Value, extra: Value) {
    if let (Some(target), Value::Object(extra)) = (target.as_object_mut(), extra) {
        target.extend(extra);
    }
}
