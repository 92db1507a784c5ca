//! Unlock-tree walk: world modules → schematics → unlocks → recipes.
//!
//! The first schematic to reach a recipe fixes that recipe's tier. Every
//! tree node is visited at most once per run.

use serde_json::Value;

use crate::asset::AssetKind;
use crate::builder::DEFAULT_TIER;
use crate::entity::{EntityBase, PartAmount, Recipe};
use crate::error::ExtractError;
use crate::extractor::Extractor;
use crate::id::AssetId;
use crate::store::Lookup;
use crate::tree::{self, reference_path};

/// Producer name of resource-node recipes.
pub const MINER_NAME: &str = "Miner";

/// Seconds per batch of a resource-node recipe.
pub const RESOURCE_NODE_DURATION: f64 = 60.0;

/// `major-priority` label of a schematic.
pub fn tier_label(tech_tier: Option<i64>, menu_priority: Option<f64>) -> String {
    format!(
        "{}-{}",
        tech_tier.unwrap_or(1),
        menu_priority.map_or(0, |p| p.trunc() as i64)
    )
}

impl Extractor {
    /// A mod's root module: its sink table, schematics, and research trees.
    pub fn walk_game_world(&mut self, id: AssetId) -> Result<(), ExtractError> {
        if !self.visited.insert(id) {
            return Ok(());
        }
        tracing::info!(module = self.store.file(id).path(), "walking game world module");

        if let Some(table) = self
            .store
            .reference(id, "Properties.mResourceSinkItemPointsTable", Lookup::PROPERTIES)?
        {
            let resolved = self.store.resolve(&table);
            if let Some(table) = self.skip(resolved, &table)? {
                self.load_sink_points(table)?;
            }
        }

        for schematic in self.referenced_assets(id, "Properties.mSchematics")? {
            let result = self.walk_schematic(schematic);
            let path = self.store.file(schematic).path().to_string();
            self.skip(result, &path)?;
        }
        for tree in self.referenced_assets(id, "Properties.mResearchTrees")? {
            let result = self.walk_research_tree(tree);
            let path = self.store.file(tree).path().to_string();
            self.skip(result, &path)?;
        }
        Ok(())
    }

    /// Resolve every reference in an array property, skipping the ones that
    /// do not resolve.
    fn referenced_assets(&mut self, id: AssetId, field: &str) -> Result<Vec<AssetId>, ExtractError> {
        let mut assets = Vec::new();
        for entry in self.store.array(id, field, Lookup::PROPERTIES)? {
            let Some(reference) = reference_path(&entry) else {
                continue;
            };
            let resolved = self.store.resolve(reference);
            if let Some(asset) = self.skip(resolved, reference)? {
                assets.push(asset);
            }
        }
        Ok(assets)
    }

    /// Record every row of a sink-points table. Each table loads once.
    pub fn load_sink_points(&mut self, table: AssetId) -> Result<(), ExtractError> {
        if !self.sinks.begin_table(table) {
            return Ok(());
        }
        let Some(Value::Object(rows)) = self.store.token(table, "Rows", Lookup::PRIMARY)? else {
            tracing::warn!(table = self.store.file(table).path(), "sink table has no rows");
            return Ok(());
        };
        for (row, entry) in rows {
            let Some(reference) = tree::select(&entry, "ItemClass").and_then(reference_path) else {
                continue;
            };
            let points = tree::select(&entry, "Points").and_then(tree::as_int);
            let overridden = tree::select(&entry, "OverriddenResourceSinkPoints").and_then(tree::as_int);
            match self.store.resolve(reference) {
                Ok(item) => self.sinks.record(item, points, overridden),
                Err(err) => tracing::debug!(row = %row, error = %err, "sink row skipped"),
            }
        }
        tracing::debug!(table = self.store.file(table).path(), total = self.sinks.len(), "loaded sink points");
        Ok(())
    }

    /// Build the recipes a schematic unlocks, at the schematic's tier.
    pub fn walk_schematic(&mut self, id: AssetId) -> Result<(), ExtractError> {
        if !self.visited.insert(id) {
            return Ok(());
        }
        let kind = self.store.kind(id)?;
        if kind != AssetKind::Schematic {
            return Err(ExtractError::KindMismatch {
                file: self.store.file(id).path().to_string(),
                expected: AssetKind::Schematic,
                found: kind,
            });
        }
        let tier = tier_label(
            self.store.int(id, "Properties.mTechTier", Lookup::PROPERTIES)?,
            self.store.double(id, "Properties.mMenuPriority", Lookup::PROPERTIES)?,
        );

        for unlock in self.store.array(id, "Properties.mUnlocks", Lookup::PROPERTIES)? {
            let Some(reference) = reference_path(&unlock) else {
                continue;
            };
            let resolved = self.store.resolve_export(reference);
            let Some((holder, export)) = self.skip(resolved, reference)? else {
                continue;
            };
            for entry in self.store.array(holder, "Properties.mRecipes", Lookup::at(export))? {
                let Some(recipe_ref) = reference_path(&entry) else {
                    continue;
                };
                let resolved = self.store.resolve(recipe_ref);
                let Some(recipe) = self.skip(resolved, recipe_ref)? else {
                    continue;
                };
                let result = self.setup_recipe(recipe, &tier);
                let path = self.store.file(recipe).path().to_string();
                self.skip(result, &path)?;
            }
        }
        Ok(())
    }

    /// Walk the schematics hanging off a research tree's nodes.
    pub fn walk_research_tree(&mut self, id: AssetId) -> Result<(), ExtractError> {
        if !self.visited.insert(id) {
            return Ok(());
        }
        for node in self.store.array(id, "Properties.mNodes", Lookup::PROPERTIES)? {
            let Some(reference) = reference_path(&node) else {
                continue;
            };
            let resolved = self.store.resolve_export(reference);
            let Some((holder, export)) = self.skip(resolved, reference)? else {
                continue;
            };
            let Some(Value::Object(data)) =
                self.store.token(holder, "Properties.mNodeDataStruct", Lookup::at(export))?
            else {
                continue;
            };
            // The struct's fields carry generated suffixes; the schematic is
            // the one field holding an object path.
            let Some(schematic_ref) = data.values().find_map(|field| {
                field
                    .get("ObjectPath")
                    .and_then(Value::as_str)
                    .filter(|p| !p.is_empty())
            }) else {
                continue;
            };
            let resolved = self.store.resolve(schematic_ref);
            if let Some(schematic) = self.skip(resolved, schematic_ref)? {
                let result = self.walk_schematic(schematic);
                let path = self.store.file(schematic).path().to_string();
                self.skip(result, &path)?;
            }
        }
        Ok(())
    }

    /// A resource node becomes a mining recipe for its resource.
    pub fn setup_resource_node(&mut self, id: AssetId) -> Result<(), ExtractError> {
        if !self.visited.insert(id) {
            return Ok(());
        }
        let Some(reference) = self
            .store
            .reference(id, "Properties.mResourceClass", Lookup::PROPERTIES)?
        else {
            return Err(ExtractError::Unresolvable {
                reference: self.store.file(id).path().to_string(),
                reason: "resource node names no resource",
            });
        };
        let resource = self.store.resolve(&reference)?;
        let item = self.setup_item(resource, DEFAULT_TIER)?;
        let multiplier = self
            .store
            .double(id, "Properties.mExtractMultiplier", Lookup::PROPERTIES)?
            .unwrap_or(1.0);

        let miner = self.graph.synthetic_machine(EntityBase {
            source: id,
            display_name: MINER_NAME.to_string(),
            tier: Some(DEFAULT_TIER.to_string()),
        });
        let mut recipe = Recipe::new(EntityBase {
            source: id,
            display_name: self.graph.item(item).base.display_name.clone(),
            tier: Some(DEFAULT_TIER.to_string()),
        });
        recipe.duration = Some(RESOURCE_NODE_DURATION);
        recipe.products.push(PartAmount {
            amount: multiplier.round().max(0.0) as u32,
            item,
        });
        recipe.producers.push(miner);
        self.graph.insert_recipe(recipe);
        Ok(())
    }
}
