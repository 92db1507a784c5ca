//! Entity construction: recipes, items, and machines from their assets.
//!
//! Every builder is idempotent per source asset: a second request returns
//! the entity already in the graph. Failures are domain errors for the
//! asset being built; the caller decides whether to skip it.

use crate::asset::AssetKind;
use crate::entity::{
    EntityBase, Item, Machine, MachinePower, PartAmount, Recipe, ResourceForm, push_unique,
};
use crate::error::ExtractError;
use crate::extractor::Extractor;
use crate::id::{AssetId, ItemId, MachineId, RecipeId};
use crate::source::Icon;
use crate::store::Lookup;
use crate::tables::TableLookup;
use crate::tree::{self, reference_path};

/// Producers that mark a recipe as building a machine rather than
/// manufacturing an item.
pub const BUILD_GUN_REFS: &[&str] = &[
    "/Game/FactoryGame/Equipment/BuildGun/BP_BuildGun.BP_BuildGun_C",
    "/Script/FactoryGame.FGBuildGun",
];

/// Hand-crafting producers. Recipes made only here are neither production
/// nor build recipes.
pub const WORKBENCH_REFS: &[&str] = &[
    "/Game/FactoryGame/Buildable/-Shared/WorkBench/BP_WorkshopComponent.BP_WorkshopComponent_C",
    "/Game/FactoryGame/Buildable/-Shared/WorkBench/BP_WorkBenchComponent.BP_WorkBenchComponent_C",
    "/Script/FactoryGame.FGBuildableAutomatedWorkBench",
    "/Game/FactoryGame/Buildable/Factory/AutomatedWorkBench/Build_AutomatedWorkBench.Build_AutomatedWorkBench_C",
];

/// Tier given to entities reached outside the unlock tree.
pub const DEFAULT_TIER: &str = "0-0";

const LIQUID_FORM: &str = "EResourceForm::RF_LIQUID";
const GAS_FORM: &str = "EResourceForm::RF_GAS";

impl Extractor {
    // =======================================================================
    // Names
    // =======================================================================

    /// Display name of an asset: its localized string, else its string-table
    /// entry, else its raw internal name. With `force_super` the inherited
    /// name is preferred over the asset's own.
    pub fn display_name(&self, id: AssetId, force_super: bool) -> Result<String, ExtractError> {
        if force_super {
            if let Some(name) = self.localized_name(id, Lookup::PROPERTIES.super_only())? {
                return Ok(name);
            }
        }
        if let Some(name) = self.localized_name(id, Lookup::PROPERTIES)? {
            return Ok(name);
        }
        self.store
            .raw_name(id)?
            .ok_or_else(|| ExtractError::MissingDisplayName {
                file: self.store.file(id).path().to_string(),
            })
    }

    fn localized_name(&self, id: AssetId, lookup: Lookup) -> Result<Option<String>, ExtractError> {
        if let Some(name) = self
            .store
            .string(id, "Properties.mDisplayName.LocalizedString", lookup)?
        {
            return Ok(Some(name));
        }
        let table = self.store.string(id, "Properties.mDisplayName.TableId", lookup)?;
        let key = self.store.string(id, "Properties.mDisplayName.Key", lookup)?;
        let (Some(table), Some(key)) = (table, key) else {
            return Ok(None);
        };
        match self.strings.lookup(&table, &key) {
            TableLookup::Found(name) => Ok(Some(name.to_string())),
            TableLookup::UnknownTable => Ok(None),
            TableLookup::MissingKey => Err(ExtractError::MissingTableEntry {
                file: self.store.file(id).path().to_string(),
                table,
                key,
            }),
        }
    }

    fn expect_kind(&self, id: AssetId, expected: AssetKind) -> Result<(), ExtractError> {
        let found = self.store.kind(id)?;
        if found == expected {
            Ok(())
        } else {
            Err(ExtractError::KindMismatch {
                file: self.store.file(id).path().to_string(),
                expected,
                found,
            })
        }
    }

    // =======================================================================
    // Recipes
    // =======================================================================

    /// Build the recipe defined by `id`, unlocked at `tier`.
    ///
    /// Returns `None` for recipes that produce nothing in a machine: build
    /// recipes (recorded against their buildable instead) and
    /// workbench-only recipes.
    pub fn setup_recipe(&mut self, id: AssetId, tier: &str) -> Result<Option<RecipeId>, ExtractError> {
        if let Some(existing) = self.graph.recipe_for(id) {
            return Ok(Some(existing));
        }
        if self.graph.is_build_recipe(id) {
            return Ok(None);
        }
        self.expect_kind(id, AssetKind::RecipeDescriptor)?;
        let name = self.display_name(id, false)?;

        let mut producers = Vec::new();
        for entry in self.store.array(id, "Properties.mProducedIn", Lookup::PROPERTIES)? {
            let Some(reference) = reference_path(&entry) else {
                continue;
            };
            if BUILD_GUN_REFS.contains(&reference) {
                self.divert_build_recipe(id, tier)?;
                return Ok(None);
            }
            if WORKBENCH_REFS.contains(&reference) {
                continue;
            }
            let buildable = self.store.resolve(reference)?;
            match self.store.kind(buildable)? {
                AssetKind::MachineBuildable => {}
                // Some mods derive their production buildings from base
                // classes outside the known table; those classify as Other
                // and are accepted as machines.
                AssetKind::Other => {
                    tracing::debug!(file = self.store.file(buildable).path(), "accepting unclassified producer");
                }
                found => {
                    return Err(ExtractError::KindMismatch {
                        file: self.store.file(buildable).path().to_string(),
                        expected: AssetKind::MachineBuildable,
                        found,
                    });
                }
            }
            let machine = self.machine_stub(buildable, tier)?;
            push_unique(&mut producers, machine);
        }
        if producers.is_empty() {
            tracing::debug!(recipe = %name, "no production machine");
            return Ok(None);
        }

        let products = self.part_amounts(id, "Properties.mProduct", tier)?;
        let ingredients = self.part_amounts(id, "Properties.mIngredients", tier)?;

        let direct = Lookup::PROPERTIES.local();
        let mut recipe = Recipe::new(EntityBase {
            source: id,
            display_name: name,
            tier: Some(tier.to_string()),
        });
        recipe.duration = self.store.double(id, "Properties.mManufactoringDuration", direct)?;
        recipe.variable_power_constant =
            self.store.double(id, "Properties.mVariablePowerConsumptionConstant", direct)?;
        recipe.variable_power_factor =
            self.store.double(id, "Properties.mVariablePowerConsumptionFactor", direct)?;

        // Recipes without a display name of their own are named after what
        // they make.
        if self.store.raw_name(id)?.as_deref() == Some(recipe.base.display_name.as_str()) {
            if let Some(first) = products.first() {
                recipe.base.display_name = self.graph.item(first.item).base.display_name.clone();
            }
        }
        recipe.products = products;
        recipe.ingredients = ingredients;
        recipe.producers = producers;

        tracing::debug!(recipe = %recipe.base.display_name, tier, "resolved recipe");
        Ok(Some(self.graph.insert_recipe(recipe)))
    }

    /// Resolve the `(ItemClass, Amount)` entries of a recipe array.
    fn part_amounts(&mut self, id: AssetId, field: &str, tier: &str) -> Result<Vec<PartAmount>, ExtractError> {
        let mut parts = Vec::new();
        for entry in self.store.array(id, field, Lookup::PROPERTIES)? {
            let reference = tree::select(&entry, "ItemClass").and_then(reference_path);
            let amount = tree::select(&entry, "Amount")
                .and_then(tree::as_int)
                .and_then(|a| u32::try_from(a).ok());
            let (Some(reference), Some(amount)) = (reference, amount) else {
                continue;
            };
            let item_asset = self.store.resolve(reference)?;
            let item = self.setup_item(item_asset, tier)?;
            push_unique(&mut parts, PartAmount { amount, item });
        }
        Ok(parts)
    }

    /// A build recipe's product is a machine descriptor; remember which
    /// recipe builds the descriptor's buildable.
    fn divert_build_recipe(&mut self, recipe: AssetId, tier: &str) -> Result<(), ExtractError> {
        let products = self.store.array(recipe, "Properties.mProduct", Lookup::PROPERTIES)?;
        let Some(reference) = products
            .iter()
            .find_map(|e| tree::select(e, "ItemClass").and_then(reference_path))
        else {
            return Ok(());
        };
        let descriptor = self.store.resolve(reference)?;
        let Some(buildable_ref) = self
            .store
            .reference(descriptor, "Properties.mBuildableClass", Lookup::PROPERTIES)?
        else {
            return Ok(());
        };
        let buildable = self.store.resolve(&buildable_ref)?;
        if self.graph.associate_build_recipe(buildable, recipe) {
            tracing::debug!(buildable = self.store.file(buildable).path(), "recorded build recipe");
        }
        // Generators and extractors are never a recipe's producer; their
        // build recipe is what brings them into the graph.
        if self.store.kind(buildable)? == AssetKind::MachineBuildable {
            self.machine_stub(buildable, tier)?;
        }
        Ok(())
    }

    // =======================================================================
    // Items
    // =======================================================================

    /// Build the item described by the descriptor `id`.
    pub fn setup_item(&mut self, id: AssetId, tier: &str) -> Result<ItemId, ExtractError> {
        if let Some(existing) = self.graph.item_for(id) {
            return Ok(existing);
        }
        self.expect_kind(id, AssetKind::ItemDescriptor)?;
        let name = self.display_name(id, false)?;
        let form = match self.store.string(id, "Properties.mForm", Lookup::PROPERTIES)?.as_deref() {
            Some(LIQUID_FORM) => ResourceForm::Liquid,
            Some(GAS_FORM) => ResourceForm::Gas,
            _ => ResourceForm::Solid,
        };
        let icon = self.descriptor_icon(id)?;
        Ok(self.graph.insert_item(Item {
            base: EntityBase {
                source: id,
                display_name: name,
                tier: Some(tier.to_string()),
            },
            sink_points: self.sinks.get(id),
            form,
            icon,
        }))
    }

    /// The small icon of a descriptor, else its big icon. Icons that cannot
    /// be found or decoded are logged and left out.
    fn descriptor_icon(&self, descriptor: AssetId) -> Result<Option<Icon>, ExtractError> {
        if !self.options.decode_icons {
            return Ok(None);
        }
        let reference = match self
            .store
            .reference(descriptor, "Properties.mSmallIcon", Lookup::PROPERTIES)?
        {
            Some(reference) => Some(reference),
            None => self
                .store
                .reference(descriptor, "Properties.mPersistentBigIcon", Lookup::PROPERTIES)?,
        };
        let Some(reference) = reference else {
            tracing::debug!(file = self.store.file(descriptor).path(), "no icon");
            return Ok(None);
        };
        match self.decode_icon(&reference) {
            Ok(icon) => Ok(Some(icon)),
            Err(err) if err.is_invariant() => Err(err),
            Err(err) => {
                tracing::warn!(file = self.store.file(descriptor).path(), error = %err, "icon unavailable");
                Ok(None)
            }
        }
    }

    fn decode_icon(&self, reference: &str) -> Result<Icon, ExtractError> {
        let (texture, export) = self.store.resolve_export(reference)?;
        self.expect_kind(texture, AssetKind::Texture)?;
        let path = self.store.file(texture).path();
        self.store.source().decode_texture(path, export)
    }

    // =======================================================================
    // Machines
    // =======================================================================

    /// Phase one: a named machine keyed by its buildable.
    fn machine_stub(&mut self, buildable: AssetId, tier: &str) -> Result<MachineId, ExtractError> {
        if let Some(existing) = self.graph.machine_for(buildable) {
            return Ok(existing);
        }
        let name = self.display_name(buildable, false)?;
        Ok(self.graph.insert_machine(Machine::new(EntityBase {
            source: buildable,
            display_name: name,
            tier: Some(tier.to_string()),
        })))
    }

    /// Phase two: power, build cost, and icon, once every recipe is known.
    pub fn fill_machine(&mut self, id: MachineId) -> Result<(), ExtractError> {
        let buildable = self.graph.machine(id).base.source;
        let tier = self
            .graph
            .machine(id)
            .base
            .tier
            .clone()
            .unwrap_or_else(|| DEFAULT_TIER.to_string());
        let is_base = self.store.file(buildable).mod_name() == self.store.index().base_mod();
        let name = self.display_name(buildable, is_base)?;

        let mut power = self.read_power(buildable)?;
        if let Some(template) = self.power_template(buildable)? {
            power.fill_from(&self.read_power(template)?);
        }

        let (cost, icon) = match self.graph.build_recipe_for(buildable) {
            Some(recipe) => {
                let cost = self.part_amounts(recipe, "Properties.mIngredients", &tier)?;
                (cost, self.build_recipe_icon(recipe)?)
            }
            None => (Vec::new(), None),
        };

        let machine = self.graph.machine_mut(id);
        machine.base.display_name = name;
        machine.power = power;
        machine.cost = cost;
        machine.icon = icon;
        Ok(())
    }

    fn read_power(&self, asset: AssetId) -> Result<MachinePower, ExtractError> {
        let p = Lookup::PROPERTIES;
        Ok(MachinePower {
            consumption: self.store.double(asset, "Properties.mPowerConsumption", p)?,
            consumption_exponent: self.store.double(asset, "Properties.mPowerConsumptionExponent", p)?,
            production_shard_slots: self.store.int(asset, "Properties.mProductionShardSlotSize", p)?,
            production_shard_multiplier: self
                .store
                .double(asset, "Properties.mProductionShardBoostMultiplier", p)?,
            base_production: self.store.double(asset, "Properties.mBasePowerProduction", p)?,
            base_boost_percentage: self.store.double(asset, "Properties.mBaseBoostPercentage", p)?,
            fueled_boost_percentage: self.fuel_boost(asset)?,
        })
    }

    /// Boost percentage of the buildable's first default fuel.
    fn fuel_boost(&self, asset: AssetId) -> Result<Option<f64>, ExtractError> {
        let Some(reference) = self
            .store
            .reference(asset, "Properties.mDefaultFuelClasses.0", Lookup::PROPERTIES)?
        else {
            return Ok(None);
        };
        match self.store.resolve(&reference) {
            Ok(fuel) => self.store.double(fuel, "Properties.mBoostPercentage", Lookup::PROPERTIES),
            Err(err) => {
                tracing::debug!(reference = %reference, error = %err, "fuel class not indexed");
                Ok(None)
            }
        }
    }

    /// The asset a buildable's power-info sub-object takes its template from.
    fn power_template(&self, buildable: AssetId) -> Result<Option<AssetId>, ExtractError> {
        let Some(reference) = self
            .store
            .reference(buildable, "Properties.mPowerInfo", Lookup::PROPERTIES)?
        else {
            return Ok(None);
        };
        let (holder, export) = self.store.resolve_export(&reference)?;
        match self.store.reference(holder, "Template", Lookup::at(export))? {
            Some(template) => Ok(Some(self.store.resolve(&template)?)),
            None if holder != buildable => Ok(Some(holder)),
            None => Ok(None),
        }
    }

    /// Icon of the machine descriptor a build recipe produces.
    fn build_recipe_icon(&self, recipe: AssetId) -> Result<Option<Icon>, ExtractError> {
        let products = self.store.array(recipe, "Properties.mProduct", Lookup::PROPERTIES)?;
        let Some(reference) = products
            .iter()
            .find_map(|e| tree::select(e, "ItemClass").and_then(reference_path))
        else {
            return Ok(None);
        };
        let descriptor = self.store.resolve(reference)?;
        self.descriptor_icon(descriptor)
    }
}
