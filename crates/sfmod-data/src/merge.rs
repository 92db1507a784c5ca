//! Set-union of game-data files.

use sfmod_core::game_data::GameData;
use std::path::{Path, PathBuf};

use crate::loader::DataError;
use crate::output::{read_game_data, write_game_data};

/// Outcome of a merge.
#[derive(Debug)]
pub struct MergeReport {
    pub data: GameData,
    /// Copy of the previous output, when one existed.
    pub backup: Option<PathBuf>,
}

/// Inputs needed for a merge into `output`: one when it already exists
/// (it takes part in the union), two otherwise.
pub fn required_inputs(output: &Path) -> usize {
    if output.is_file() { 1 } else { 2 }
}

/// Union `inputs` (and an existing `output`) into `output`. Earlier files
/// win identity collisions; an existing output ranks after every input.
pub fn merge(output: &Path, inputs: &[PathBuf]) -> Result<MergeReport, DataError> {
    let required = required_inputs(output);
    if inputs.len() < required {
        return Err(DataError::NotEnoughInputs {
            required,
            given: inputs.len(),
        });
    }

    let mut sources: Vec<&Path> = inputs.iter().map(PathBuf::as_path).collect();
    if output.is_file() {
        sources.push(output);
    }

    let mut data = GameData::new();
    for source in sources {
        let next = read_game_data(source)?;
        tracing::debug!(
            file = %source.display(),
            machines = next.machines.len(),
            parts = next.parts.len(),
            recipes = next.recipes.len(),
            "merging"
        );
        data.union_with(&next);
    }

    let backup = write_game_data(output, &data)?;
    Ok(MergeReport { data, backup })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfmod_core::game_data::{PartRow, RecipeRow};

    fn part(name: &str, tier: &str) -> PartRow {
        PartRow {
            name: name.into(),
            tier: tier.into(),
            sink_points: None,
        }
    }

    fn recipe(name: &str, machine: &str) -> RecipeRow {
        RecipeRow {
            name: name.into(),
            tier: "1-0".into(),
            machine: machine.into(),
            batch_time: Some("2".into()),
            parts: Vec::new(),
            min_power: None,
            average_power: None,
            alternate: None,
            ficsmas: None,
        }
    }

    fn write(dir: &Path, name: &str, data: &GameData) -> PathBuf {
        let path = dir.join(name);
        write_game_data(&path, data).unwrap();
        path
    }

    #[test]
    fn new_output_needs_two_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.json", &GameData::new());
        let err = merge(&dir.path().join("out.json"), &[a]).unwrap_err();
        assert!(matches!(err, DataError::NotEnoughInputs { required: 2, given: 1 }));
    }

    #[test]
    fn existing_output_needs_one_input() {
        let dir = tempfile::tempdir().unwrap();
        let out = write(dir.path(), "out.json", &GameData::new());
        let err = merge(&out, &[]).unwrap_err();
        assert!(matches!(err, DataError::NotEnoughInputs { required: 1, given: 0 }));
    }

    #[test]
    fn union_keeps_first_by_identity() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = GameData::new();
        a.parts.insert(part("Widget", "1-0"));
        a.recipes.insert(recipe("Widget", "Constructor"));
        let mut b = GameData::new();
        b.parts.insert(part("Widget", "9-9"));
        b.parts.insert(part("Gizmo", "2-0"));
        b.recipes.insert(recipe("Widget", "Assembler"));
        let inputs = vec![write(dir.path(), "a.json", &a), write(dir.path(), "b.json", &b)];

        let report = merge(&dir.path().join("out.json"), &inputs).unwrap();
        assert_eq!(report.backup, None);
        assert_eq!(report.data.parts.len(), 2);
        assert_eq!(report.data.parts.iter().next().unwrap().tier, "1-0");
        // Recipes collide by name alone.
        assert_eq!(report.data.recipes.len(), 1);
        assert_eq!(report.data.recipes.iter().next().unwrap().machine, "Constructor");
    }

    #[test]
    fn existing_output_is_merged_and_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        let mut previous = GameData::new();
        previous.parts.insert(part("Old", "1-0"));
        let out = write(dir.path(), "out.json", &previous);
        let mut input = GameData::new();
        input.parts.insert(part("New", "1-0"));
        let input = write(dir.path(), "in.json", &input);

        let report = merge(&out, &[input]).unwrap();
        let backup = report.backup.unwrap();
        assert!(read_game_data(&backup).unwrap().parts.contains_name("Old"));
        let merged = read_game_data(&out).unwrap();
        assert!(merged.parts.contains_name("Old"));
        assert!(merged.parts.contains_name("New"));
        assert_eq!(merged.parts.iter().next().unwrap().name, "New");
    }
}
