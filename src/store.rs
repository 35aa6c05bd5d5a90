//! Saved-chart persistence and change notification
//!
//! Chart definitions are saved to an explicit JSON document with a
//! versioned schema (not an ad hoc blob), and interested parties register
//! callbacks on the store instead of listening on a global event bus:
//! every mutation notifies all subscribers after it is persisted.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ChartError, ChartResult};
use crate::types::{GroupByConfig, SortMode};

/// Version of the on-disk chart store schema
pub const SCHEMA_VERSION: u32 = 1;

/// How a saved chart renders its dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Area,
}

/// A saved chart definition: what to render and how the dataset is
/// grouped and ordered before rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub name: String,
    pub chart_type: ChartType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<GroupByConfig>,
    #[serde(default)]
    pub sort: SortMode,
}

/// Emitted to subscribers after a store mutation has been persisted
#[derive(Debug, Clone, PartialEq)]
pub enum ChartEvent {
    Saved(String),
    Deleted(String),
}

type Listener = Box<dyn Fn(&ChartEvent)>;

/// On-disk document shape
#[derive(Serialize, Deserialize)]
struct StoreFile {
    schema_version: u32,
    charts: Vec<ChartSpec>,
}

/// A file-backed collection of saved charts
pub struct ChartStore {
    path: PathBuf,
    charts: Vec<ChartSpec>,
    listeners: Vec<Listener>,
}

impl std::fmt::Debug for ChartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartStore")
            .field("path", &self.path)
            .field("charts", &self.charts)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ChartStore {
    /// Open a store file, or start empty when the file does not exist.
    /// A document with an unknown schema version is rejected rather than
    /// silently migrated.
    pub fn open(path: impl Into<PathBuf>) -> ChartResult<Self> {
        let path = path.into();
        let charts = if path.exists() {
            let text = fs::read_to_string(&path)?;
            let file: StoreFile = serde_json::from_str(&text)
                .map_err(|e| ChartError::InvalidFileFormat(format!("chart store: {}", e)))?;
            if file.schema_version != SCHEMA_VERSION {
                return Err(ChartError::InvalidFileFormat(format!(
                    "unsupported chart store schema version {} (this build reads version {})",
                    file.schema_version, SCHEMA_VERSION
                )));
            }
            file.charts
        } else {
            Vec::new()
        };
        Ok(Self {
            path,
            charts,
            listeners: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn charts(&self) -> &[ChartSpec] {
        &self.charts
    }

    pub fn get(&self, name: &str) -> Option<&ChartSpec> {
        self.charts.iter().find(|c| c.name == name)
    }

    /// Register a callback invoked after every persisted mutation
    pub fn subscribe(&mut self, listener: impl Fn(&ChartEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Insert or replace a chart by name, persist, then notify
    pub fn save_chart(&mut self, spec: ChartSpec) -> ChartResult<()> {
        let name = spec.name.clone();
        match self.charts.iter_mut().find(|c| c.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.charts.push(spec),
        }
        self.persist()?;
        debug!(chart = %name, "saved chart");
        self.notify(&ChartEvent::Saved(name));
        Ok(())
    }

    /// Delete a chart by name. Returns false when no such chart exists
    /// (nothing is persisted or notified in that case).
    pub fn delete_chart(&mut self, name: &str) -> ChartResult<bool> {
        let before = self.charts.len();
        self.charts.retain(|c| c.name != name);
        if self.charts.len() == before {
            return Ok(false);
        }
        self.persist()?;
        debug!(chart = name, "deleted chart");
        self.notify(&ChartEvent::Deleted(name.to_string()));
        Ok(true)
    }

    fn persist(&self) -> ChartResult<()> {
        let file = StoreFile {
            schema_version: SCHEMA_VERSION,
            charts: self.charts.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn notify(&self, event: &ChartEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}
