//! Extractor configuration.

use serde::{Deserialize, Serialize};
use sfmod_core::extractor::{DEFAULT_SINK_POINTS_TABLE, ExtractOptions};
use sfmod_core::index::DEFAULT_BASE_MOD;
use std::path::{Path, PathBuf};

use crate::loader::{DataError, deserialize_file};

/// Settings for one extraction run, read from a `.ron`, `.toml`, or `.json`
/// file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Root of the dumped game content.
    pub game_path: PathBuf,
    /// Per-mod output directories are created here.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_true")]
    pub save_icons: bool,
    /// Base-game dataset that mod output is disambiguated against.
    #[serde(default)]
    pub baseline: Option<PathBuf>,
    #[serde(default = "default_base_mod")]
    pub base_mod: String,
    #[serde(default = "default_sink_points_table")]
    pub sink_points_table: Option<String>,
    #[serde(default)]
    pub write_to_modeler_after_extracting: bool,
    #[serde(default)]
    pub modeler_path: Option<PathBuf>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

fn default_base_mod() -> String {
    DEFAULT_BASE_MOD.to_string()
}

fn default_sink_points_table() -> Option<String> {
    Some(DEFAULT_SINK_POINTS_TABLE.to_string())
}

impl ExtractConfig {
    /// A configuration with every optional setting at its default.
    pub fn new(game_path: impl Into<PathBuf>) -> Self {
        Self {
            game_path: game_path.into(),
            output_dir: default_output_dir(),
            save_icons: true,
            baseline: None,
            base_mod: default_base_mod(),
            sink_points_table: default_sink_points_table(),
            write_to_modeler_after_extracting: false,
            modeler_path: None,
        }
    }

    /// Read a configuration file, format chosen by extension.
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let config: Self = deserialize_file(path)?;
        tracing::debug!(config = %path.display(), game_path = %config.game_path.display(), "loaded config");
        Ok(config)
    }

    /// Check that the paths the run depends on exist.
    pub fn validate(&self) -> Result<(), DataError> {
        if !self.game_path.is_dir() {
            return Err(DataError::MissingPath {
                path: self.game_path.clone(),
                what: "game path",
            });
        }
        if let Some(baseline) = &self.baseline {
            if !baseline.is_file() {
                return Err(DataError::MissingPath {
                    path: baseline.clone(),
                    what: "baseline",
                });
            }
        }
        if self.write_to_modeler_after_extracting {
            let modeler = self.modeler_path.clone().unwrap_or_default();
            if !modeler.is_dir() {
                return Err(DataError::MissingPath {
                    path: modeler,
                    what: "modeler path",
                });
            }
        }
        Ok(())
    }

    /// Engine options for this configuration.
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            base_mod: self.base_mod.clone(),
            sink_points_table: self.sink_points_table.clone(),
            decode_icons: self.save_icons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{Format, deserialize_str};

    fn parse(format: Format, content: &str) -> ExtractConfig {
        deserialize_str(Path::new("config"), format, content).unwrap()
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let config = parse(Format::Toml, "game_path = \"/dump\"\n");
        assert_eq!(config, ExtractConfig::new("/dump"));
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert!(config.save_icons);
        assert_eq!(config.base_mod, "FactoryGame");
        assert_eq!(config.sink_points_table.as_deref(), Some(DEFAULT_SINK_POINTS_TABLE));
    }

    #[test]
    fn every_format_reads_the_same_config() {
        let toml = parse(
            Format::Toml,
            "game_path = \"/dump\"\nsave_icons = false\nwrite_to_modeler_after_extracting = true\nmodeler_path = \"/modeler\"\n",
        );
        let json = parse(
            Format::Json,
            r#"{"game_path": "/dump", "save_icons": false, "write_to_modeler_after_extracting": true, "modeler_path": "/modeler"}"#,
        );
        let ron = parse(
            Format::Ron,
            r#"(game_path: "/dump", save_icons: false, write_to_modeler_after_extracting: true, modeler_path: Some("/modeler"))"#,
        );
        assert_eq!(toml, json);
        assert_eq!(toml, ron);
        assert_eq!(toml.modeler_path, Some(PathBuf::from("/modeler")));
    }

    #[test]
    fn missing_game_path_is_a_parse_error() {
        let err = deserialize_str::<ExtractConfig>(Path::new("c.json"), Format::Json, "{}").unwrap_err();
        assert!(matches!(err, DataError::Parse { .. }));
    }

    #[test]
    fn options_follow_config() {
        let mut config = ExtractConfig::new("/dump");
        config.save_icons = false;
        config.sink_points_table = None;
        config.base_mod = "Base".into();
        let options = config.extract_options();
        assert!(!options.decode_icons);
        assert_eq!(options.sink_points_table, None);
        assert_eq!(options.base_mod, "Base");
    }

    #[test]
    fn validate_checks_paths() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExtractConfig::new(dir.path());
        assert!(config.validate().is_ok());

        let missing = ExtractConfig::new(dir.path().join("nope"));
        assert!(matches!(
            missing.validate(),
            Err(DataError::MissingPath { what: "game path", .. })
        ));

        let mut modeler = ExtractConfig::new(dir.path());
        modeler.write_to_modeler_after_extracting = true;
        assert!(matches!(
            modeler.validate(),
            Err(DataError::MissingPath { what: "modeler path", .. })
        ));
        modeler.modeler_path = Some(dir.path().to_path_buf());
        assert!(modeler.validate().is_ok());
    }
}
