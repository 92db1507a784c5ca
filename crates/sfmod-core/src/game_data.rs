//! The flat JSON schema read by downstream modeling tools.
//!
//! Collections are insertion-ordered sets keyed by display name. Rows that
//! would share a name are renamed with alternate suffixes instead of being
//! merged.

use std::collections::HashSet;
use std::hash::Hash;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ===========================================================================
// Identity sets
// ===========================================================================

/// Something with a display name and an identity used for de-duplication.
pub trait Named {
    type Key: Clone + Eq + Hash + std::fmt::Debug;

    fn name(&self) -> &str;
    fn set_name(&mut self, name: String);
    fn identity(&self) -> Self::Key;
}

/// Insertion-ordered set keyed by [`Named::identity`].
#[derive(Debug, Clone)]
pub struct IdentitySet<T: Named> {
    items: Vec<T>,
    keys: HashSet<T::Key>,
}

impl<T: Named> Default for IdentitySet<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            keys: HashSet::new(),
        }
    }
}

impl<T: Named> IdentitySet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless an element with the same identity exists.
    pub fn insert(&mut self, item: T) -> bool {
        if self.keys.insert(item.identity()) {
            self.items.push(item);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, item: &T) -> bool {
        self.keys.contains(&item.identity())
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.items.iter().any(|item| item.name() == name)
    }

    /// Drop every element whose identity is in `other`.
    pub fn remove_all_in(&mut self, other: &IdentitySet<T>) {
        self.items.retain(|item| !other.keys.contains(&item.identity()));
        self.keys.retain(|key| !other.keys.contains(key));
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Named + Clone> IdentitySet<T> {
    /// Add clones of `other`'s elements; existing identities are kept.
    pub fn union_with(&mut self, other: &IdentitySet<T>) {
        for item in other.iter() {
            self.insert(item.clone());
        }
    }
}

impl<'a, T: Named> IntoIterator for &'a IdentitySet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Named> FromIterator<T> for IdentitySet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for item in iter {
            set.insert(item);
        }
        set
    }
}

impl<T: Named + Serialize> Serialize for IdentitySet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, T: Named + Deserialize<'de>> Deserialize<'de> for IdentitySet<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Vec::<T>::deserialize(deserializer)?.into_iter().collect())
    }
}

// ===========================================================================
// Alternate names
// ===========================================================================

/// `X` → `X (Alt 1)`, `X (Alt N)` → `X (Alt N+1)`.
pub fn next_alt_name(name: &str) -> String {
    if let Some(open) = name.rfind(" (Alt ") {
        let tail = &name[open + " (Alt ".len()..];
        if let Some(n) = tail.strip_suffix(')').and_then(|n| n.parse::<u32>().ok()) {
            return format!("{} (Alt {})", &name[..open], n + 1);
        }
    }
    format!("{name} (Alt 1)")
}

/// Insert `item`, renaming it with alternate suffixes until its identity
/// collides with neither `set` nor `reserved`. Returns the final name.
pub fn insert_disambiguated<T: Named>(
    set: &mut IdentitySet<T>,
    mut item: T,
    reserved: Option<&IdentitySet<T>>,
) -> String {
    while set.contains(&item) || reserved.is_some_and(|r| r.contains(&item)) {
        let renamed = next_alt_name(item.name());
        item.set_name(renamed);
    }
    let name = item.name().to_string();
    set.insert(item);
    name
}

// ===========================================================================
// Schema
// ===========================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PartAmountRow {
    pub part: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MachineRow {
    pub name: String,
    pub tier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_power: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overclock_power_exponent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_production_shards: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_shard_multiplier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_shard_power_exponent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Vec<PartAmountRow>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_power: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_power: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_power_boost: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fueled_base_power_boost: Option<String>,
}

impl MachineRow {
    pub fn new(name: impl Into<String>, tier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tier: tier.into(),
            average_power: None,
            overclock_power_exponent: None,
            max_production_shards: None,
            production_shard_multiplier: None,
            production_shard_power_exponent: None,
            cost: None,
            min_power: None,
            base_power: None,
            base_power_boost: None,
            fueled_base_power_boost: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PartRow {
    pub name: String,
    pub tier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sink_points: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecipeRow {
    pub name: String,
    pub tier: String,
    pub machine: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_time: Option<String>,
    pub parts: Vec<PartAmountRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_power: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_power: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ficsmas: Option<bool>,
}

/// Multi-machine groupings are passed through untouched; extraction never
/// produces any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiMachineRow(pub serde_json::Value);

macro_rules! named_by_name {
    ($($row:ty),*) => {$(
        impl Named for $row {
            type Key = String;

            fn name(&self) -> &str {
                &self.name
            }

            fn set_name(&mut self, name: String) {
                self.name = name;
            }

            fn identity(&self) -> String {
                self.name.clone()
            }
        }
    )*};
}

named_by_name!(MachineRow, PartRow, RecipeRow);

impl Named for MultiMachineRow {
    type Key = String;

    fn name(&self) -> &str {
        self.0.get("Name").and_then(|n| n.as_str()).unwrap_or("")
    }

    fn set_name(&mut self, name: String) {
        if let Some(map) = self.0.as_object_mut() {
            map.insert("Name".into(), serde_json::Value::String(name));
        }
    }

    fn identity(&self) -> String {
        self.0.to_string()
    }
}

/// One dataset: a mod's extraction output, a baseline, or a merge result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GameData {
    #[serde(default)]
    pub machines: IdentitySet<MachineRow>,
    #[serde(default)]
    pub multi_machines: IdentitySet<MultiMachineRow>,
    #[serde(default)]
    pub parts: IdentitySet<PartRow>,
    #[serde(default)]
    pub recipes: IdentitySet<RecipeRow>,
}

impl GameData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add everything from `other`; on identity collisions `self` wins.
    pub fn union_with(&mut self, other: &GameData) {
        self.machines.union_with(&other.machines);
        self.multi_machines.union_with(&other.multi_machines);
        self.parts.union_with(&other.parts);
        self.recipes.union_with(&other.recipes);
    }

    /// Remove everything whose identity appears in `baseline`.
    pub fn subtract(&mut self, baseline: &GameData) {
        self.machines.remove_all_in(&baseline.machines);
        self.multi_machines.remove_all_in(&baseline.multi_machines);
        self.parts.remove_all_in(&baseline.parts);
        self.recipes.remove_all_in(&baseline.recipes);
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
            && self.multi_machines.is_empty()
            && self.parts.is_empty()
            && self.recipes.is_empty()
    }
}
