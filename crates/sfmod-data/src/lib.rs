//! SFMod Data -- the filesystem side of the extractor.
//!
//! The resolution engine in `sfmod-core` works against abstract package
//! sources and returns in-memory datasets. This crate supplies the concrete
//! pieces around it:
//!
//! - [`config`] -- extractor settings from RON, TOML, or JSON files.
//! - [`dump`] -- a package source over a directory of dumped assets.
//! - [`string_table`] -- CSV localization tables.
//! - [`output`] -- game-data JSON with timestamped backups, and PNG icons.
//! - [`merge`] -- set-union of game-data files.

pub mod config;
pub mod dump;
pub mod loader;
pub mod merge;
pub mod output;
pub mod string_table;

pub use config::ExtractConfig;
pub use dump::DumpSource;
pub use loader::DataError;
