//! Snapshot storage.
//!
//! The snapshot is a single pretty-printed JSON file. Writes go through a
//! temporary file in the same directory that is renamed over the target, so
//! the previous snapshot stays intact until the new one is complete.

use crate::graph::{EntityGraph, GraphData, GraphError};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid snapshot: {0}")]
    Graph(#[from] GraphError),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Reads and writes the graph snapshot at a fixed location.
#[derive(Debug, Clone)]
pub struct GraphStore {
    path: PathBuf,
}

impl GraphStore {
    /// Creates a store for the snapshot at `path`. Nothing is touched yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saves the entire graph, replacing any previous snapshot.
    pub fn save_graph(&self, graph: &EntityGraph) -> Result<(), StoreError> {
        self.save_data(&graph.to_data())
    }

    /// Saves a snapshot document, replacing any previous snapshot.
    pub fn save_data(&self, data: &GraphData) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(data)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| StoreError::io(&dir, e))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| StoreError::io(&self.path, e))?;
        tmp.persist(&self.path)
            .map_err(|e| StoreError::io(&self.path, e.error))?;

        debug!("Wrote snapshot to {}", self.path.display());
        Ok(())
    }

    /// Loads the snapshot document, if one exists.
    pub fn load_data(&self) -> Result<Option<GraphData>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    /// Loads the snapshot as a graph, if one exists.
    pub fn load_graph(&self) -> Result<Option<EntityGraph>, StoreError> {
        match self.load_data()? {
            Some(data) => Ok(Some(EntityGraph::from_data(data)?)),
            None => Ok(None),
        }
    }
}
