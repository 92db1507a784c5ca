//! Localization string tables exported as CSV, one table per file, named by
//! the file stem.

use serde::Deserialize;
use sfmod_core::tables::{StringEntry, StringTables};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::dump::DumpSource;
use crate::loader::DataError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Row {
    key: String,
    source_string: String,
    #[serde(default)]
    comment: Option<String>,
}

/// Read one table. Later rows with a repeated key are ignored.
pub fn read_string_table(path: &Path) -> Result<HashMap<String, StringEntry>, DataError> {
    let csv_error = |e: csv::Error| DataError::Csv {
        file: path.to_path_buf(),
        detail: e.to_string(),
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;
    let mut entries = HashMap::new();
    for row in reader.deserialize::<Row>() {
        let row = row.map_err(csv_error)?;
        entries.entry(row.key).or_insert(StringEntry {
            source_string: row.source_string,
            comment: row.comment.filter(|c| !c.is_empty()),
        });
    }
    Ok(entries)
}

/// Table id of a CSV file: its stem.
pub fn table_id(path: &Path) -> String {
    path.file_stem().unwrap_or_default().to_string_lossy().into_owned()
}

/// Load every table in `files`.
pub fn load_string_tables(files: &[PathBuf]) -> Result<StringTables, DataError> {
    let mut tables = StringTables::new();
    for file in files {
        let entries = read_string_table(file)?;
        tracing::debug!(table = %table_id(file), entries = entries.len(), "loaded string table");
        tables.insert_table(table_id(file), entries);
    }
    tracing::info!(tables = tables.len(), "loaded string tables");
    Ok(tables)
}

/// Load every CSV found anywhere under a dump directory.
pub fn load_dump_string_tables(source: &DumpSource) -> Result<StringTables, DataError> {
    load_string_tables(&source.files_with_extension("csv"))
}
