// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};

use crate::extractors::Record;
use crate::utils::error::StorageError;

pub struct StorageManager {
    base_dir: PathBuf,
}

/// Union of field names across rows, in first-seen order.
pub fn columns(rows: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.to_string());
            }
        }
    }
    columns
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Writes the table as CSV or JSON depending on the file extension.
    /// Columns are the union of all row fields; absent values are left empty.
    pub fn export(&self, rows: &[Record], file_name: &str) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(file_name);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let columns = columns(rows);

        match extension(&file_path).as_deref() {
            Some("csv") => write_csv(&file_path, &columns, rows)?,
            Some("json") => write_json(&file_path, &columns, rows)?,
            other => {
                return Err(StorageError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        }

        tracing::info!(
            "Saved {} rows x {} columns to {}",
            rows.len(),
            columns.len(),
            file_path.display()
        );
        Ok(file_path)
    }

    /// Saves metadata about an exported table next to it, as `<stem>_meta.json`.
    pub fn export_metadata(&self, rows: &[Record], file_name: &str) -> Result<PathBuf, StorageError> {
        let table_path = self.base_dir.join(file_name);
        let stem = table_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "export".to_string());
        let file_path = table_path.with_file_name(format!("{}_meta.json", stem));

        // Create metadata structure
        let metadata = serde_json::json!({
            "table": file_name,
            "row_count": rows.len(),
            "columns": columns(rows),
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, metadata_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved metadata to {}", file_path.display());
        Ok(file_path)
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

fn write_csv(path: &Path, columns: &[String], rows: &[Record]) -> Result<(), StorageError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(columns)?;
    for row in rows {
        writer.write_record(columns.iter().map(|c| row.get(c).unwrap_or("")))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json(path: &Path, columns: &[String], rows: &[Record]) -> Result<(), StorageError> {
    let padded: Vec<Record> = rows
        .iter()
        .map(|row| {
            let mut out = Record::new();
            for column in columns {
                out.set(column.as_str(), row.get(column).map(str::to_string));
            }
            out
        })
        .collect();
    let json = serde_json::to_string_pretty(&padded)
        .map_err(|e| StorageError::SerializationError(e.to_string()))?;
    fs::write(path, json)?;
    Ok(())
}
