//! Projection of the entity graph into per-mod output datasets.

use crate::builder::DEFAULT_TIER;
use crate::entity::{EntityGraph, Item, Machine, PartAmount, Recipe};
use crate::fraction::fraction_string;
use crate::game_data::{GameData, MachineRow, PartAmountRow, PartRow, RecipeRow, insert_disambiguated};
use crate::id::{AssetId, ItemId};
use crate::index::AssetIndex;
use crate::source::Icon;

/// Fluid amounts are stored in thousandths of a cubic metre.
const FLUID_UNIT: f64 = 1000.0;

/// Production-shard power scaling exponent; the game does not expose it.
const PRODUCTION_SHARD_POWER_EXPONENT: &str = "2";

const ALTERNATE_PREFIX: &str = "Alternate";

/// The geothermal generator's minimum output is not in the game data.
const GEOTHERMAL_GENERATOR: &str = "Geothermal Generator";
const GEOTHERMAL_MIN_POWER: &str = "100";

/// Directory segment of seasonal event content.
const FICSMAS_SEGMENT: &str = "/Events/Christmas/";

/// An icon to be written under the mod's icon directory.
#[derive(Debug, Clone)]
pub struct NamedIcon {
    pub name: String,
    pub images: Icon,
}

/// One mod's projected dataset.
#[derive(Debug, Clone)]
pub struct ModOutput {
    pub mod_name: String,
    pub data: GameData,
    pub icons: Vec<NamedIcon>,
}

/// Project every mod in index order. Non-base mods are disambiguated
/// against `baseline`; the base mod has the baseline subtracted instead.
pub fn project(index: &AssetIndex, graph: &EntityGraph, baseline: &GameData) -> Vec<ModOutput> {
    index
        .mods()
        .map(|(mod_name, files)| project_mod(index, graph, baseline, mod_name, files))
        .collect()
}

fn project_mod(
    index: &AssetIndex,
    graph: &EntityGraph,
    baseline: &GameData,
    mod_name: &str,
    files: &[AssetId],
) -> ModOutput {
    let is_base = mod_name == index.base_mod();
    let mut out = ModOutput {
        mod_name: mod_name.to_string(),
        data: GameData::new(),
        icons: Vec::new(),
    };
    let reserve = !is_base;

    for &asset in files {
        if let Some(recipe) = graph.recipe_for(asset) {
            let recipe = graph.recipe(recipe);
            for row in recipe_rows(index, graph, recipe) {
                insert_disambiguated(&mut out.data.recipes, row, reserve.then_some(&baseline.recipes));
            }
            if !is_base {
                for part in recipe.ingredients.iter().chain(&recipe.products) {
                    carry_base_part(index, graph, baseline, &mut out, part.item);
                }
            }
        } else if let Some(machine) = graph.machine_for(asset) {
            let machine = graph.machine(machine);
            let name = insert_disambiguated(
                &mut out.data.machines,
                machine_row(graph, machine),
                reserve.then_some(&baseline.machines),
            );
            push_icon(&mut out.icons, name, machine.icon.as_ref());
            if !is_base {
                for part in &machine.cost {
                    carry_base_part(index, graph, baseline, &mut out, part.item);
                }
            }
        } else if let Some(item) = graph.item_for(asset) {
            let item = graph.item(item);
            let name = insert_disambiguated(&mut out.data.parts, part_row(item), reserve.then_some(&baseline.parts));
            push_icon(&mut out.icons, name, item.icon.as_ref());
        }
    }

    if is_base {
        out.data.subtract(baseline);
        let data = &out.data;
        out.icons
            .retain(|icon| data.parts.contains_name(&icon.name) || data.machines.contains_name(&icon.name));
    }

    tracing::info!(
        mod_name,
        recipes = out.data.recipes.len(),
        machines = out.data.machines.len(),
        parts = out.data.parts.len(),
        icons = out.icons.len(),
        "projected mod"
    );
    out
}

/// A base-game part used by a mod but missing from the baseline ships with
/// the mod.
fn carry_base_part(index: &AssetIndex, graph: &EntityGraph, baseline: &GameData, out: &mut ModOutput, item: ItemId) {
    let item = graph.item(item);
    if index.file(item.base.source).mod_name() != index.base_mod() {
        return;
    }
    let row = part_row(item);
    if baseline.parts.contains(&row) {
        return;
    }
    let name = row.name.clone();
    if out.data.parts.insert(row) {
        push_icon(&mut out.icons, name, item.icon.as_ref());
    }
}

fn push_icon(icons: &mut Vec<NamedIcon>, name: String, icon: Option<&Icon>) {
    if let Some(images) = icon.filter(|images| !images.is_empty()) {
        icons.push(NamedIcon {
            name,
            images: images.clone(),
        });
    }
}

// ===========================================================================
// Rows
// ===========================================================================

fn tier_of(tier: &Option<String>) -> String {
    tier.clone().unwrap_or_else(|| DEFAULT_TIER.to_string())
}

fn part_amount_row(graph: &EntityGraph, part: &PartAmount, sign: f64) -> PartAmountRow {
    let item = graph.item(part.item);
    let mut amount = f64::from(part.amount);
    if item.form.is_fluid() {
        amount /= FLUID_UNIT;
    }
    PartAmountRow {
        part: item.base.display_name.clone(),
        amount: fraction_string(sign * amount),
    }
}

/// One row per producing machine; ingredients negative, products positive.
pub fn recipe_rows(index: &AssetIndex, graph: &EntityGraph, recipe: &Recipe) -> Vec<RecipeRow> {
    let parts: Vec<PartAmountRow> = recipe
        .ingredients
        .iter()
        .map(|p| part_amount_row(graph, p, -1.0))
        .chain(recipe.products.iter().map(|p| part_amount_row(graph, p, 1.0)))
        .collect();

    let (min_power, average_power) = match (recipe.variable_power_constant, recipe.variable_power_factor) {
        (Some(constant), Some(factor)) => (
            Some(fraction_string(constant)),
            Some(fraction_string(constant + factor / 2.0)),
        ),
        _ => (None, None),
    };
    let name = &recipe.base.display_name;
    let alternate = name.starts_with(ALTERNATE_PREFIX).then_some(true);
    let ficsmas = index
        .file(recipe.base.source)
        .path()
        .contains(FICSMAS_SEGMENT)
        .then_some(true);

    recipe
        .producers
        .iter()
        .map(|&machine| RecipeRow {
            name: name.clone(),
            tier: tier_of(&recipe.base.tier),
            machine: graph.machine(machine).base.display_name.clone(),
            batch_time: recipe.duration.map(fraction_string),
            parts: parts.clone(),
            min_power: min_power.clone(),
            average_power: average_power.clone(),
            alternate,
            ficsmas,
        })
        .collect()
}

pub fn machine_row(graph: &EntityGraph, machine: &Machine) -> MachineRow {
    let power = &machine.power;
    let mut row = MachineRow::new(machine.base.display_name.clone(), tier_of(&machine.base.tier));
    row.average_power = power.consumption.map(fraction_string);
    row.overclock_power_exponent = power.consumption_exponent.map(fraction_string);
    row.max_production_shards = power.production_shard_slots;
    row.production_shard_multiplier = power.production_shard_multiplier.map(fraction_string);
    row.production_shard_power_exponent = power
        .production_shard_multiplier
        .map(|_| PRODUCTION_SHARD_POWER_EXPONENT.to_string());
    row.cost = (!machine.cost.is_empty()).then(|| {
        machine
            .cost
            .iter()
            .map(|p| part_amount_row(graph, p, 1.0))
            .collect()
    });
    row.min_power = (machine.base.display_name == GEOTHERMAL_GENERATOR).then(|| GEOTHERMAL_MIN_POWER.to_string());
    row.base_power = power.base_production.map(fraction_string);
    row.base_power_boost = power.base_boost_percentage.map(fraction_string);
    row.fueled_base_power_boost = power.fueled_boost_percentage.map(fraction_string);
    row
}

pub fn part_row(item: &Item) -> PartRow {
    PartRow {
        name: item.base.display_name.clone(),
        tier: tier_of(&item.base.tier),
        sink_points: item.sink_points,
    }
}

/// Union of a baseline and every mod's data, for the modeling tool's single
/// dataset.
pub fn combined(baseline: &GameData, outputs: &[ModOutput]) -> GameData {
    let mut all = baseline.clone();
    for output in outputs {
        all.union_with(&output.data);
    }
    all
}
