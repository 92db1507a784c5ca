//! Resolved entities and the graph that owns them.
//!
//! Entities live in `Vec` arenas indexed by typed ids, with a per-kind map
//! from source asset to id. Each source asset yields at most one entity per
//! kind, and entries are never removed.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::id::{AssetId, ItemId, MachineId, RecipeId};
use crate::source::Icon;

// ===========================================================================
// Entities
// ===========================================================================

/// Fields every entity carries.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityBase {
    pub source: AssetId,
    pub display_name: String,
    /// `major-priority` label from the unlocking schematic.
    pub tier: Option<String>,
}

/// Orders entities by the file they were resolved from.
pub fn by_source(a: &EntityBase, b: &EntityBase) -> Ordering {
    a.source.cmp(&b.source)
}

/// An (amount, item) pair of a recipe or build cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartAmount {
    pub amount: u32,
    pub item: ItemId,
}

#[derive(Debug, Clone)]
pub struct Recipe {
    pub base: EntityBase,
    /// Seconds per batch.
    pub duration: Option<f64>,
    pub variable_power_constant: Option<f64>,
    pub variable_power_factor: Option<f64>,
    pub ingredients: Vec<PartAmount>,
    pub products: Vec<PartAmount>,
    pub producers: Vec<MachineId>,
}

impl Recipe {
    pub fn new(base: EntityBase) -> Self {
        Self {
            base,
            duration: None,
            variable_power_constant: None,
            variable_power_factor: None,
            ingredients: Vec::new(),
            products: Vec::new(),
            producers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MachinePower {
    pub consumption: Option<f64>,
    pub consumption_exponent: Option<f64>,
    pub production_shard_slots: Option<i64>,
    pub production_shard_multiplier: Option<f64>,
    pub base_production: Option<f64>,
    pub base_boost_percentage: Option<f64>,
    pub fueled_boost_percentage: Option<f64>,
}

impl MachinePower {
    /// Fill every unset field from `other`.
    pub fn fill_from(&mut self, other: &MachinePower) {
        fn fill<T: Copy>(slot: &mut Option<T>, value: Option<T>) {
            if slot.is_none() {
                *slot = value;
            }
        }
        fill(&mut self.consumption, other.consumption);
        fill(&mut self.consumption_exponent, other.consumption_exponent);
        fill(&mut self.production_shard_slots, other.production_shard_slots);
        fill(&mut self.production_shard_multiplier, other.production_shard_multiplier);
        fill(&mut self.base_production, other.base_production);
        fill(&mut self.base_boost_percentage, other.base_boost_percentage);
        fill(&mut self.fueled_boost_percentage, other.fueled_boost_percentage);
    }
}

#[derive(Debug, Clone)]
pub struct Machine {
    /// Keyed by the buildable asset.
    pub base: EntityBase,
    pub power: MachinePower,
    pub cost: Vec<PartAmount>,
    pub icon: Option<Icon>,
}

impl Machine {
    pub fn new(base: EntityBase) -> Self {
        Self {
            base,
            power: MachinePower::default(),
            cost: Vec::new(),
            icon: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceForm {
    #[default]
    Solid,
    Liquid,
    Gas,
}

impl ResourceForm {
    pub fn is_fluid(self) -> bool {
        matches!(self, ResourceForm::Liquid | ResourceForm::Gas)
    }
}

#[derive(Debug, Clone)]
pub struct Item {
    pub base: EntityBase,
    pub sink_points: Option<i64>,
    pub form: ResourceForm,
    pub icon: Option<Icon>,
}

/// Insert `value` unless an equal element is already present.
pub fn push_unique<T: PartialEq>(set: &mut Vec<T>, value: T) {
    if !set.contains(&value) {
        set.push(value);
    }
}

// ===========================================================================
// Graph
// ===========================================================================

#[derive(Debug, Default)]
pub struct EntityGraph {
    recipes: Vec<Recipe>,
    recipe_by_asset: HashMap<AssetId, RecipeId>,
    machines: Vec<Machine>,
    machine_by_asset: HashMap<AssetId, MachineId>,
    items: Vec<Item>,
    item_by_asset: HashMap<AssetId, ItemId>,
    /// Buildable asset → recipe asset that builds it.
    build_recipes: HashMap<AssetId, AssetId>,
    build_recipe_assets: HashSet<AssetId>,
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Recipes
    // -----------------------------------------------------------------------

    /// Store a recipe for its source asset. An existing entry is kept.
    pub fn insert_recipe(&mut self, recipe: Recipe) -> RecipeId {
        let source = recipe.base.source;
        if let Some(&id) = self.recipe_by_asset.get(&source) {
            return id;
        }
        let id = RecipeId(self.recipes.len() as u32);
        self.recipes.push(recipe);
        self.recipe_by_asset.insert(source, id);
        id
    }

    pub fn recipe(&self, id: RecipeId) -> &Recipe {
        &self.recipes[id.0 as usize]
    }

    pub fn recipe_for(&self, asset: AssetId) -> Option<RecipeId> {
        self.recipe_by_asset.get(&asset).copied()
    }

    pub fn recipes(&self) -> impl Iterator<Item = (RecipeId, &Recipe)> {
        self.recipes
            .iter()
            .enumerate()
            .map(|(i, r)| (RecipeId(i as u32), r))
    }

    // -----------------------------------------------------------------------
    // Machines
    // -----------------------------------------------------------------------

    /// Store a machine for its buildable asset. An existing entry is kept.
    pub fn insert_machine(&mut self, machine: Machine) -> MachineId {
        let source = machine.base.source;
        if let Some(&id) = self.machine_by_asset.get(&source) {
            return id;
        }
        let id = self.push_machine(machine);
        self.machine_by_asset.insert(source, id);
        id
    }

    /// A machine known only by name, such as the miner of resource nodes.
    /// Reuses an existing synthetic machine with the same name.
    pub fn synthetic_machine(&mut self, base: EntityBase) -> MachineId {
        let existing = self
            .machines
            .iter()
            .enumerate()
            .find(|(i, m)| {
                m.base.display_name == base.display_name
                    && self.machine_by_asset.get(&m.base.source) != Some(&MachineId(*i as u32))
            })
            .map(|(i, _)| MachineId(i as u32));
        match existing {
            Some(id) => id,
            None => self.push_machine(Machine::new(base)),
        }
    }

    fn push_machine(&mut self, machine: Machine) -> MachineId {
        let id = MachineId(self.machines.len() as u32);
        self.machines.push(machine);
        id
    }

    pub fn machine(&self, id: MachineId) -> &Machine {
        &self.machines[id.0 as usize]
    }

    pub fn machine_mut(&mut self, id: MachineId) -> &mut Machine {
        &mut self.machines[id.0 as usize]
    }

    pub fn machine_for(&self, asset: AssetId) -> Option<MachineId> {
        self.machine_by_asset.get(&asset).copied()
    }

    /// Machines keyed by a buildable asset, in insertion order.
    pub fn asset_machines(&self) -> Vec<MachineId> {
        (0..self.machines.len() as u32)
            .map(MachineId)
            .filter(|id| {
                let source = self.machines[id.0 as usize].base.source;
                self.machine_by_asset.get(&source) == Some(id)
            })
            .collect()
    }

    pub fn machines(&self) -> impl Iterator<Item = (MachineId, &Machine)> {
        self.machines
            .iter()
            .enumerate()
            .map(|(i, m)| (MachineId(i as u32), m))
    }

    // -----------------------------------------------------------------------
    // Items
    // -----------------------------------------------------------------------

    pub fn insert_item(&mut self, item: Item) -> ItemId {
        let source = item.base.source;
        if let Some(&id) = self.item_by_asset.get(&source) {
            return id;
        }
        let id = ItemId(self.items.len() as u32);
        self.items.push(item);
        self.item_by_asset.insert(source, id);
        id
    }

    pub fn item(&self, id: ItemId) -> &Item {
        &self.items[id.0 as usize]
    }

    pub fn item_for(&self, asset: AssetId) -> Option<ItemId> {
        self.item_by_asset.get(&asset).copied()
    }

    pub fn items(&self) -> impl Iterator<Item = (ItemId, &Item)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (ItemId(i as u32), item))
    }

    // -----------------------------------------------------------------------
    // Build recipes
    // -----------------------------------------------------------------------

    /// Record that `recipe` builds `buildable`. The first association wins;
    /// returns whether this call recorded it.
    pub fn associate_build_recipe(&mut self, buildable: AssetId, recipe: AssetId) -> bool {
        match self.build_recipes.entry(buildable) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(recipe);
                self.build_recipe_assets.insert(recipe);
                true
            }
        }
    }

    pub fn build_recipe_for(&self, buildable: AssetId) -> Option<AssetId> {
        self.build_recipes.get(&buildable).copied()
    }

    pub fn is_build_recipe(&self, recipe: AssetId) -> bool {
        self.build_recipe_assets.contains(&recipe)
    }

    pub fn counts(&self) -> (usize, usize, usize) {
        (self.recipes.len(), self.machines.len(), self.items.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(source: u32, name: &str) -> EntityBase {
        EntityBase {
            source: AssetId(source),
            display_name: name.into(),
            tier: None,
        }
    }

    #[test]
    fn one_recipe_per_asset() {
        let mut graph = EntityGraph::new();
        let a = graph.insert_recipe(Recipe::new(base(1, "Iron Plate")));
        let b = graph.insert_recipe(Recipe::new(base(1, "Other")));
        assert_eq!(a, b);
        assert_eq!(graph.recipe(a).base.display_name, "Iron Plate");
        assert_eq!(graph.recipe_for(AssetId(1)), Some(a));
    }

    #[test]
    fn synthetic_machines_are_shared_by_name() {
        let mut graph = EntityGraph::new();
        let keyed = graph.insert_machine(Machine::new(base(3, "Miner")));
        let m1 = graph.synthetic_machine(base(10, "Miner"));
        let m2 = graph.synthetic_machine(base(11, "Miner"));
        assert_eq!(m1, m2);
        assert_ne!(m1, keyed);
        assert_eq!(graph.asset_machines(), vec![keyed]);
    }

    #[test]
    fn first_build_recipe_association_wins() {
        let mut graph = EntityGraph::new();
        assert!(graph.associate_build_recipe(AssetId(5), AssetId(1)));
        assert!(!graph.associate_build_recipe(AssetId(5), AssetId(2)));
        assert_eq!(graph.build_recipe_for(AssetId(5)), Some(AssetId(1)));
        assert!(graph.is_build_recipe(AssetId(1)));
        assert!(!graph.is_build_recipe(AssetId(2)));
    }

    #[test]
    fn one_recipe_may_build_several_buildables() {
        let mut graph = EntityGraph::new();
        assert!(graph.associate_build_recipe(AssetId(5), AssetId(1)));
        assert!(graph.associate_build_recipe(AssetId(6), AssetId(1)));
        assert_eq!(graph.build_recipe_for(AssetId(6)), Some(AssetId(1)));
        assert!(graph.is_build_recipe(AssetId(1)));
        assert!(!graph.is_build_recipe(AssetId(5)));
    }

    #[test]
    fn by_source_orders_by_asset() {
        let mut bases = vec![base(4, "b"), base(1, "c"), base(2, "a")];
        bases.sort_by(by_source);
        let names: Vec<&str> = bases.iter().map(|b| b.display_name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn power_fill_keeps_local_values() {
        let mut local = MachinePower {
            consumption: Some(30.0),
            ..Default::default()
        };
        let template = MachinePower {
            consumption: Some(4.0),
            consumption_exponent: Some(1.6),
            ..Default::default()
        };
        local.fill_from(&template);
        assert_eq!(local.consumption, Some(30.0));
        assert_eq!(local.consumption_exponent, Some(1.6));
    }

    #[test]
    fn push_unique_is_a_set_insert() {
        let mut parts = Vec::new();
        let p = PartAmount { amount: 2, item: ItemId(0) };
        push_unique(&mut parts, p);
        push_unique(&mut parts, p);
        assert_eq!(parts.len(), 1);
    }
}
