//! Lookup tables filled before resolution and read-only afterwards:
//! localization string tables and per-item sink points.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::id::AssetId;

// ===========================================================================
// String tables
// ===========================================================================

/// One localized string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringEntry {
    pub source_string: String,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Outcome of a table-id + key lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLookup<'a> {
    Found(&'a str),
    /// The table id names no loaded table.
    UnknownTable,
    /// The table is loaded but lacks the key.
    MissingKey,
}

/// Table id → key → entry.
#[derive(Debug, Clone, Default)]
pub struct StringTables {
    tables: HashMap<String, HashMap<String, StringEntry>>,
}

impl StringTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_table(&mut self, table: impl Into<String>, entries: HashMap<String, StringEntry>) {
        self.tables.entry(table.into()).or_default().extend(entries);
    }

    pub fn insert(&mut self, table: &str, key: impl Into<String>, source_string: impl Into<String>) {
        self.tables.entry(table.to_string()).or_default().insert(
            key.into(),
            StringEntry {
                source_string: source_string.into(),
                comment: None,
            },
        );
    }

    /// Look up `key` in the table named by `table_id`, which may be a full
    /// object path such as `/Game/Localization/Items_Data.Items_Data`.
    pub fn lookup(&self, table_id: &str, key: &str) -> TableLookup<'_> {
        match self.tables.get(normalize_table_id(table_id)) {
            None => TableLookup::UnknownTable,
            Some(table) => match table.get(key) {
                Some(entry) => TableLookup::Found(&entry.source_string),
                None => TableLookup::MissingKey,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Final path segment without its object suffix.
pub fn normalize_table_id(table_id: &str) -> &str {
    let name = table_id.rsplit(['/', '\\']).next().unwrap_or(table_id);
    name.split('.').next().unwrap_or(name)
}

// ===========================================================================
// Sink points
// ===========================================================================

/// Sink value per item descriptor asset.
#[derive(Debug, Clone, Default)]
pub struct SinkPoints {
    points: HashMap<AssetId, i64>,
    loaded_tables: HashSet<AssetId>,
}

impl SinkPoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a table as loaded. Returns false if it already was.
    pub fn begin_table(&mut self, table: AssetId) -> bool {
        self.loaded_tables.insert(table)
    }

    /// Record a row. A non-negative override replaces the listed points;
    /// an item already recorded keeps its first value.
    pub fn record(&mut self, item: AssetId, points: Option<i64>, overridden: Option<i64>) {
        let effective = overridden.filter(|&p| p >= 0).or(points);
        if let Some(value) = effective {
            self.points.entry(item).or_insert(value);
        }
    }

    pub fn get(&self, item: AssetId) -> Option<i64> {
        self.points.get(&item).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
