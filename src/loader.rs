use crate::data::RawTable;
use crate::error::{Result, ServiceError};
use crate::indicator::{ChartTemplate, Indicator, Metadata};
use anyhow::Context;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const INDICATOR_DIR_PREFIX: &str = "ind_";
pub const METADATA_FILE: &str = "metadata.json";
pub const TEMPLATE_FILE: &str = "data_example.json";
pub const RAW_DATA_FILE: &str = "raw_data.csv";

const MAP_EXTENSIONS: &[&str] = &["", ".json", ".geojson"];

/// Read-only access to the on-disk indicator folders and map shapes.
///
/// Nothing is cached: every call re-reads its files.
#[derive(Debug, Clone)]
pub struct IndicatorStore {
    data_dir: PathBuf,
    maps_dir: PathBuf,
}

impl IndicatorStore {
    pub fn new(data_dir: impl Into<PathBuf>, maps_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            maps_dir: maps_dir.into(),
        }
    }

    fn indicator_dir(&self, id: u64) -> PathBuf {
        self.data_dir.join(format!("{}{}", INDICATOR_DIR_PREFIX, id))
    }

    /// Ids of every `ind_<id>` folder, ascending.
    pub fn list_ids(&self) -> Result<Vec<u64>> {
        let entries = fs::read_dir(&self.data_dir)
            .with_context(|| format!("Failed to list {}", self.data_dir.display()))?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.context("Failed to read directory entry")?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name();
            let id = name
                .to_str()
                .and_then(|n| n.strip_prefix(INDICATOR_DIR_PREFIX))
                .and_then(|n| n.parse::<u64>().ok());
            if let Some(id) = id {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    /// Metadata and chart template only (no raw data).
    pub fn load_descriptor(&self, id: u64) -> Result<(Metadata, ChartTemplate)> {
        let dir = self.indicator_dir(id);
        if !dir.is_dir() {
            return Err(ServiceError::NotFound(format!("indicator {} not found", id)));
        }
        let metadata: Metadata = read_json(&require(&dir, METADATA_FILE)?)?;
        let template = ChartTemplate::new(read_json(&require(&dir, TEMPLATE_FILE)?)?);
        Ok((metadata, template))
    }

    /// All three artifacts. Any missing file is NotFound.
    pub fn load(&self, id: u64) -> Result<Indicator> {
        let dir = self.indicator_dir(id);
        if !dir.is_dir() {
            return Err(ServiceError::NotFound(format!("indicator {} not found", id)));
        }
        let csv_path = require(&dir, RAW_DATA_FILE)?;
        let metadata_path = require(&dir, METADATA_FILE)?;
        let template_path = require(&dir, TEMPLATE_FILE)?;

        let metadata: Metadata = read_json(&metadata_path)?;
        let template = ChartTemplate::new(read_json(&template_path)?);
        let table = RawTable::from_csv_path(&csv_path)?;
        debug!(indicator_id = id, rows = table.len(), columns = table.headers.len(), "indicator loaded");

        Ok(Indicator {
            id,
            metadata,
            template,
            table,
        })
    }

    /// Raw GeoJSON bytes for a named map shape.
    pub fn load_map(&self, name: &str) -> Result<Vec<u8>> {
        let not_found = || ServiceError::NotFound(format!("map '{}' not found", name));
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(not_found());
        }

        let path = MAP_EXTENSIONS
            .iter()
            .map(|ext| self.maps_dir.join(format!("{}{}", name, ext)))
            .find(|p| p.is_file())
            .ok_or_else(not_found)?;

        let bytes = fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(bytes)
    }
}

fn require(dir: &Path, file: &str) -> Result<PathBuf> {
    let path = dir.join(file);
    if path.is_file() {
        Ok(path)
    } else {
        Err(ServiceError::NotFound(format!("{} not found", file)))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let value = serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(value)
}
