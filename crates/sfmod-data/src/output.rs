//! Writing extraction results: game-data JSON with timestamped backups, and
//! PNG icons.

use chrono::{DateTime, Local};
use rayon::prelude::*;
use sfmod_core::game_data::GameData;
use sfmod_core::project::{ModOutput, NamedIcon, combined};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::loader::{DataError, Format, deserialize_str};

/// Timestamp inserted between a backup's stem and extension.
const BACKUP_TIMESTAMP: &str = "%Y%m%d-%H%M%S";

// ===========================================================================
// Game data
// ===========================================================================

pub fn read_game_data(path: &Path) -> Result<GameData, DataError> {
    let content = fs::read_to_string(path)?;
    deserialize_str(path, Format::Json, &content)
}

/// `dir/stem.ext` → `dir/stem<timestamp>.ext`.
pub fn backup_path(path: &Path, at: DateTime<Local>) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    path.with_file_name(format!("{stem}{}{extension}", at.format(BACKUP_TIMESTAMP)))
}

/// Copy an existing file aside before it is overwritten.
pub fn backup(path: &Path) -> Result<Option<PathBuf>, DataError> {
    if !path.is_file() {
        return Ok(None);
    }
    let target = backup_path(path, Local::now());
    fs::copy(path, &target)?;
    tracing::info!(file = %path.display(), backup = %target.display(), "backed up existing file");
    Ok(Some(target))
}

/// Write `data` as indented JSON, backing up any existing file first.
/// Returns the backup's path, if one was made.
pub fn write_game_data(path: &Path, data: &GameData) -> Result<Option<PathBuf>, DataError> {
    let json = serde_json::to_string_pretty(data).map_err(|e| DataError::Serialize {
        file: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let backup = backup(path)?;
    fs::write(path, json)?;
    tracing::info!(
        file = %path.display(),
        machines = data.machines.len(),
        parts = data.parts.len(),
        recipes = data.recipes.len(),
        "wrote game data"
    );
    Ok(backup)
}

// ===========================================================================
// Icons
// ===========================================================================

/// File name of an entity's icon.
pub fn icon_file_name(name: &str) -> String {
    let name: String = name
        .chars()
        .map(|c| if c == ' ' || c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{name}.png")
}

/// Write the first image of each icon into `dir`. Existing files, and later
/// icons mapping to an already-used file name, are left alone. Returns the
/// number of files written.
pub fn write_icons(dir: &Path, icons: &[NamedIcon]) -> Result<usize, DataError> {
    fs::create_dir_all(dir)?;
    let mut claimed = HashSet::new();
    let jobs: Vec<(PathBuf, &NamedIcon)> = icons
        .iter()
        .filter_map(|icon| {
            let file = dir.join(icon_file_name(&icon.name));
            (claimed.insert(file.clone()) && !file.exists()).then_some((file, icon))
        })
        .collect();

    jobs.par_iter()
        .filter_map(|(file, icon)| icon.images.first().map(|image| (file, image)))
        .map(|(file, image)| {
            image.save(file).map_err(|e| DataError::Image {
                file: file.clone(),
                detail: e.to_string(),
            })
        })
        .collect::<Result<Vec<()>, DataError>>()
        .map(|written| written.len())
}

// ===========================================================================
// Run outputs
// ===========================================================================

/// `<out>/<mod>/game_data_<mod>.json` plus `<out>/<mod>/icons/`, for every
/// mod whose dataset is non-empty. Returns the data files written.
pub fn write_mod_outputs(out_dir: &Path, outputs: &[ModOutput], save_icons: bool) -> Result<Vec<PathBuf>, DataError> {
    let mut written = Vec::new();
    for output in outputs.iter().filter(|o| !o.data.is_empty()) {
        let mod_dir = out_dir.join(&output.mod_name);
        let file = mod_dir.join(format!("game_data_{}.json", output.mod_name));
        write_game_data(&file, &output.data)?;
        if save_icons {
            let count = write_icons(&mod_dir.join("icons"), &output.icons)?;
            tracing::debug!(mod_name = %output.mod_name, icons = count, "wrote icons");
        }
        written.push(file);
    }
    Ok(written)
}

/// Write baseline ∪ every mod's data into the modeling tool's install, with
/// icons under `images/icons/`. Returns the data file.
pub fn write_modeler(
    modeler: &Path,
    baseline: &GameData,
    outputs: &[ModOutput],
    save_icons: bool,
) -> Result<PathBuf, DataError> {
    if !modeler.is_dir() {
        return Err(DataError::MissingPath {
            path: modeler.to_path_buf(),
            what: "modeler path",
        });
    }
    let file = modeler.join("game_data").join("game_data.json");
    write_game_data(&file, &combined(baseline, outputs))?;
    if save_icons {
        let icons: Vec<NamedIcon> = outputs.iter().flat_map(|o| o.icons.iter().cloned()).collect();
        write_icons(&modeler.join("images").join("icons"), &icons)?;
    }
    Ok(file)
}
