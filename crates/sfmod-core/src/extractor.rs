//! The resolution context and the end-to-end extraction run.
//!
//! [`Extractor`] owns every cache of a run: the asset store (with its lazy
//! per-file state and resolver memo), the entity graph, the preloaded lookup
//! tables, and the set of visited unlock-tree nodes. Entity construction
//! lives in `builder`, the unlock-tree walk in `walker`.

use std::collections::HashSet;

use crate::asset::AssetKind;
use crate::entity::EntityGraph;
use crate::error::ExtractError;
use crate::game_data::GameData;
use crate::id::AssetId;
use crate::index::DEFAULT_BASE_MOD;
use crate::project::{ModOutput, project};
use crate::source::PackageSource;
use crate::store::AssetStore;
use crate::tables::{SinkPoints, StringTables};

/// Where the base game keeps its sink-points table.
pub const DEFAULT_SINK_POINTS_TABLE: &str =
    "/Game/FactoryGame/Buildable/Factory/ResourceSink/DT_ResourceSinkPoints.DT_ResourceSinkPoints";

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub base_mod: String,
    /// Sink-points table loaded before any world module is walked.
    pub sink_points_table: Option<String>,
    /// Decode icon textures. Disabling skips all texture work.
    pub decode_icons: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            base_mod: DEFAULT_BASE_MOD.to_string(),
            sink_points_table: Some(DEFAULT_SINK_POINTS_TABLE.to_string()),
            decode_icons: true,
        }
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractReport {
    pub recipes: usize,
    pub machines: usize,
    pub items: usize,
    pub sink_points: usize,
    /// Assets or steps dropped because of a domain failure.
    pub skipped: usize,
}

#[derive(Debug)]
pub struct Extractor {
    pub(crate) store: AssetStore,
    pub(crate) graph: EntityGraph,
    pub(crate) strings: StringTables,
    pub(crate) sinks: SinkPoints,
    pub(crate) visited: HashSet<AssetId>,
    pub(crate) options: ExtractOptions,
    pub(crate) skipped: usize,
}

impl Extractor {
    /// Index `source` and prepare an empty resolution context.
    pub fn new(source: Box<dyn PackageSource>, options: ExtractOptions) -> Self {
        let store = AssetStore::new(source, &options.base_mod);
        Self {
            store,
            graph: EntityGraph::new(),
            strings: StringTables::new(),
            sinks: SinkPoints::new(),
            visited: HashSet::new(),
            options,
            skipped: 0,
        }
    }

    pub fn with_string_tables(mut self, strings: StringTables) -> Self {
        self.strings = strings;
        self
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    pub fn graph(&self) -> &EntityGraph {
        &self.graph
    }

    pub fn sink_points(&self) -> &SinkPoints {
        &self.sinks
    }

    /// Log and count a domain failure; pass invariant violations through.
    pub(crate) fn skip<T>(&mut self, result: Result<T, ExtractError>, what: &str) -> Result<Option<T>, ExtractError> {
        let outcome = crate::error::skip_domain(result, what)?;
        if outcome.is_none() {
            self.skipped += 1;
        }
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Run
    // -----------------------------------------------------------------------

    /// Resolve everything reachable from the base game's schematics and
    /// each mod's world modules and resource nodes, then complete machines.
    pub fn run(&mut self) -> Result<ExtractReport, ExtractError> {
        tracing::info!(files = self.store.index().len(), "starting extraction");

        if let Some(table) = self.options.sink_points_table.clone() {
            match self.store.resolve(&table) {
                Ok(id) => self.load_sink_points(id)?,
                Err(err) => tracing::info!(table = %table, error = %err, "no base sink-points table"),
            }
        }

        let base_files = self
            .store
            .index()
            .mod_files(&self.options.base_mod)
            .map(<[AssetId]>::to_vec)
            .unwrap_or_default();
        for id in base_files {
            if self.kind_of(id)? == Some(AssetKind::Schematic) {
                let result = self.walk_schematic(id);
                let path = self.store.file(id).path().to_string();
                self.skip(result, &path)?;
            }
        }

        let all_files: Vec<AssetId> = self.store.index().files().map(|f| f.id()).collect();
        for id in all_files {
            let result = match self.kind_of(id)? {
                Some(AssetKind::GameWorldModule) => self.walk_game_world(id),
                Some(AssetKind::ResourceNode) => self.setup_resource_node(id),
                _ => continue,
            };
            let path = self.store.file(id).path().to_string();
            self.skip(result, &path)?;
        }

        for machine in self.graph.asset_machines() {
            let result = self.fill_machine(machine);
            let name = self.graph.machine(machine).base.display_name.clone();
            self.skip(result, &name)?;
        }

        let (recipes, machines, items) = self.graph.counts();
        let report = ExtractReport {
            recipes,
            machines,
            items,
            sink_points: self.sinks.len(),
            skipped: self.skipped,
        };
        tracing::info!(
            recipes = report.recipes,
            machines = report.machines,
            items = report.items,
            sink_points = report.sink_points,
            skipped = report.skipped,
            "extraction finished"
        );
        Ok(report)
    }

    /// Classify, treating an unloadable asset as a skip.
    fn kind_of(&mut self, id: AssetId) -> Result<Option<AssetKind>, ExtractError> {
        let result = self.store.kind(id);
        let path = self.store.file(id).path().to_string();
        self.skip(result, &path)
    }

    /// Per-mod output datasets, disambiguated against `baseline`.
    pub fn project(&self, baseline: &GameData) -> Vec<ModOutput> {
        project(self.store.index(), &self.graph, baseline)
    }
}
