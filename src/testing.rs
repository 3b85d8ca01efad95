//! In-memory change source for tests and local dry runs.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use sync_core::{
    effective_change_time, Batch, CellValue, ChangeFilter, ChangeSource, TableDescriptor,
};

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, Batch>,
    failing: HashSet<String>,
    selects: u32,
}

/// Tables held in memory, filtered exactly like the MySQL statement.
///
/// Clones share the same tables, so a test can keep a handle to mutate
/// rows between runs.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    state: Arc<Mutex<State>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create or replace a table.
    pub fn create_table(&self, name: &str, columns: &[&str]) {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        self.state().tables.insert(name.to_string(), Batch::new(columns));
    }

    pub fn insert(&self, table: &str, row: Vec<CellValue>) -> anyhow::Result<()> {
        let mut state = self.state();
        let batch = state
            .tables
            .get_mut(table)
            .ok_or_else(|| anyhow::anyhow!("Table '{table}' doesn't exist"))?;
        batch.push_row(row)?;
        Ok(())
    }

    /// Make every select on `table` fail.
    pub fn fail_table(&self, table: &str) {
        self.state().failing.insert(table.to_string());
    }

    pub fn clear_failures(&self) {
        self.state().failing.clear();
    }

    pub fn select_calls(&self) -> u32 {
        self.state().selects
    }
}

#[async_trait]
impl ChangeSource for MemorySource {
    fn source_type(&self) -> &'static str {
        "memory"
    }

    async fn select_changes(
        &mut self,
        table: &TableDescriptor,
        filter: &ChangeFilter,
    ) -> anyhow::Result<Batch> {
        let mut state = self.state();
        state.selects += 1;
        if state.failing.contains(&table.name) {
            anyhow::bail!("Lost connection to source while selecting '{}'", table.name);
        }
        let stored = state
            .tables
            .get(&table.name)
            .ok_or_else(|| anyhow::anyhow!("Table '{}' doesn't exist", table.name))?;

        let (modified_idx, created_idx) = stored.validate_change_columns(table)?;
        let mut changed = Vec::new();
        for (index, row) in stored.rows().iter().enumerate() {
            let modified = row[modified_idx].as_datetime();
            let created = row[created_idx].as_datetime();
            if filter.matches(modified, created) {
                changed.push((effective_change_time(modified, created), index));
            }
        }
        // ORDER BY COALESCE(modified, created)
        changed.sort();

        let mut batch = Batch::new(stored.columns().to_vec());
        for (_, index) in changed {
            batch.push_row(stored.rows()[index].clone())?;
        }
        Ok(batch)
    }
}
