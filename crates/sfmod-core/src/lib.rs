//! sfmod core -- asset cross-reference resolution for game-data extraction.
//!
//! This crate turns a bag of dumped game assets into the recipes, machines,
//! and items they describe, and projects those into the flat dataset used by
//! factory-planning tools.
//!
//! # Pipeline
//!
//! 1. **Index** -- [`index::AssetIndex`] groups asset files by owning mod.
//! 2. **Query** -- [`store::AssetStore`] reads typed fields from export
//!    records, falling back along each asset's super chain, and classifies
//!    assets by their base class.
//! 3. **Resolve** -- [`resolver::PathResolver`] matches object references to
//!    the physical file sharing the longest path tail.
//! 4. **Build** -- the [`extractor::Extractor`] walks the unlock tree
//!    (world modules, schematics, research trees, resource nodes) and builds
//!    entities into an [`entity::EntityGraph`], completing machines in a
//!    second pass once every build recipe is known.
//! 5. **Project** -- [`project::project`] emits one [`game_data::GameData`]
//!    per mod, renaming colliding names with `(Alt N)` suffixes.
//!
//! # Errors
//!
//! [`error::ExtractError`] separates per-asset domain failures, which are
//! logged and skipped, from invariant violations, which abort the run.
//!
//! # Key Types
//!
//! - [`source::PackageSource`] -- supplies export records and decoded
//!   textures; [`source::MemorySource`] is the in-memory implementation.
//! - [`tables::StringTables`] / [`tables::SinkPoints`] -- lookup tables
//!   filled before resolution.
//! - [`fraction::fraction_string`] -- exact-fraction rendering of numbers.

pub mod asset;
pub mod builder;
pub mod classify;
pub mod entity;
pub mod error;
pub mod extractor;
pub mod fraction;
pub mod game_data;
pub mod id;
pub mod index;
pub mod project;
pub mod resolver;
pub mod source;
pub mod store;
pub mod tables;
pub mod tree;
pub mod walker;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
