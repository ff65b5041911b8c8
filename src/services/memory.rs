//! In-memory [`DataLoader`] and [`PersistenceService`] implementations.
//!
//! Used by tests and by embedding applications that already hold their data
//! in memory.
use crate::{
    services::{
        errors::{UpstreamError, UpstreamResult},
        traits::{DataLoader, LoadedRun, PersistenceService},
    },
    workspace::matrix::Workspace,
};
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

/// Loader serving pre-registered runs.
#[derive(Debug, Default)]
pub struct InMemoryLoader {
    runs: HashMap<String, LoadedRun>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, run: impl Into<String>, data: LoadedRun) {
        self.runs.insert(run.into(), data);
    }
}

impl DataLoader for InMemoryLoader {
    fn load(&self, run: &str) -> UpstreamResult<LoadedRun> {
        self.runs.get(run).cloned().ok_or_else(|| UpstreamError::RunNotFound { run: run.to_string() })
    }
}

/// A saved table.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

#[derive(Debug, Default)]
struct StoreInner {
    tables: Vec<(String, StoredTable)>,
    workspaces: HashMap<String, Workspace>,
}

/// Thread-safe store keeping every saved table and workspace.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> UpstreamResult<MutexGuard<'_, StoreInner>> {
        self.inner
            .lock()
            .map_err(|_| UpstreamError::Persistence { reason: "store lock poisoned".to_string() })
    }

    pub fn table(&self, id: &str) -> Option<StoredTable> {
        let inner = self.lock().ok()?;
        let found = inner.tables.iter().find(|(k, _)| k == id).map(|(_, t)| t.clone());
        found
    }

    pub fn workspace(&self, path: &str) -> Option<Workspace> {
        self.lock().ok()?.workspaces.get(path).cloned()
    }

    pub fn table_count(&self) -> usize {
        self.lock().map(|inner| inner.tables.len()).unwrap_or(0)
    }

    /// Paths of all saved workspaces, sorted.
    pub fn workspace_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> =
            self.lock().map(|inner| inner.workspaces.keys().cloned().collect()).unwrap_or_default();
        paths.sort();
        paths
    }
}

impl PersistenceService for MemoryStore {
    fn save_table(&self, columns: &[&str], rows: &[Vec<f64>]) -> UpstreamResult<String> {
        if let Some(bad) = rows.iter().find(|r| r.len() != columns.len()) {
            return Err(UpstreamError::Persistence {
                reason: format!("row has {} values for {} columns", bad.len(), columns.len()),
            });
        }
        let mut inner = self.lock()?;
        let id = format!("table_{}", inner.tables.len());
        let table = StoredTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows.to_vec(),
        };
        inner.tables.push((id.clone(), table));
        Ok(id)
    }

    fn save_workspace(&self, ws: &Workspace, path: &str) -> UpstreamResult<()> {
        if path.is_empty() {
            return Err(UpstreamError::Persistence { reason: "empty output path".to_string() });
        }
        self.lock()?.workspaces.insert(path.to_string(), ws.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::units::XUnit;

    #[test]
    fn memory_store_saves_tables_and_workspaces() {
        let store = MemoryStore::new();
        let id = store.save_table(&["X", "Y"], &[vec![0.1, -0.2]]).unwrap();
        assert_eq!(store.table(&id).unwrap().rows, vec![vec![0.1, -0.2]]);
        assert!(store.save_table(&["X", "Y"], &[vec![1.0]]).is_err());

        let ws = Workspace::new(XUnit::MomentumTransfer, 0.0, Vec::new());
        store.save_workspace(&ws, "out/lab").unwrap();
        assert_eq!(store.workspace_paths(), vec!["out/lab".to_string()]);
    }

    #[test]
    fn loader_reports_missing_runs() {
        let loader = InMemoryLoader::new();
        assert_eq!(
            loader.load("nope").unwrap_err(),
            UpstreamError::RunNotFound { run: "nope".to_string() }
        );
    }
}
