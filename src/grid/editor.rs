//! Generic editable grid over one backend resource: string cells with
//! soft-delete and dirty tracking, saved as a null-bearing diff.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::debug;

use crate::api::{ApiError, Session};
use crate::grid::resource::{Column, Resource};

#[derive(Debug, Clone, Default)]
pub struct Row {
    pub cells: Vec<String>,
    pub is_new: bool,
    pub deleted: bool,
}

impl Row {
    fn blank(width: usize) -> Self {
        Row {
            cells: vec![String::new(); width],
            is_new: true,
            deleted: false,
        }
    }

    fn from_cells(cells: Vec<String>) -> Self {
        Row {
            cells,
            is_new: false,
            deleted: false,
        }
    }

    pub fn cell(&self, idx: usize) -> &str {
        self.cells.get(idx).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    NothingToSave,
}

pub struct GridEditor<R: Resource> {
    resource: R,
    rows: Vec<Row>,
    changed: HashSet<usize>,
}

impl<R: Resource> GridEditor<R> {
    pub fn new(resource: R) -> Self {
        Self {
            resource,
            rows: Vec::new(),
            changed: HashSet::new(),
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn columns(&self) -> &'static [Column] {
        self.resource.columns()
    }

    pub fn is_changed(&self, idx: usize) -> bool {
        self.changed.contains(&idx)
    }

    pub fn has_changes(&self) -> bool {
        self.rows
            .iter()
            .enumerate()
            .any(|(idx, row)| self.is_dirty(idx, row))
    }

    fn is_dirty(&self, idx: usize, row: &Row) -> bool {
        row.is_new || row.deleted || self.changed.contains(&idx)
    }

    /// Fetch the full record list, sort ascending by number, rebuild the
    /// rows and drop all dirty state.
    pub async fn load(&mut self, session: &Session) -> Result<(), ApiError> {
        let records: Vec<R::Record> = session.get(self.resource.path()).await?;
        self.apply_records(records);
        Ok(())
    }

    pub fn apply_records(&mut self, mut records: Vec<R::Record>) {
        records.sort_by_key(|record| self.resource.sort_key(record));
        self.rows = records
            .iter()
            .map(|record| Row::from_cells(self.resource.cells(record)))
            .collect();
        self.changed.clear();
        debug!("loaded {} rows for '{}'", self.rows.len(), self.resource.path());
    }

    pub fn edit(&mut self, row: usize, col: usize, value: String) {
        if let Some(r) = self.rows.get_mut(row) {
            if let Some(cell) = r.cells.get_mut(col) {
                *cell = value;
                self.changed.insert(row);
            }
        }
    }

    /// Soft delete: the row stays in memory, the flag drives save-time
    /// serialization and persisted-side deletion.
    pub fn toggle_delete(&mut self, row: usize) {
        if let Some(r) = self.rows.get_mut(row) {
            r.deleted = !r.deleted;
        }
    }

    pub fn add_row(&mut self) {
        self.rows.push(Row::blank(self.resource.columns().len()));
    }

    /// The PUT body covering every new, deleted, or edited row, or
    /// `None` when the grid is clean.
    pub fn build_payload(&self) -> Option<Value> {
        let dirty: Vec<Value> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(idx, row)| self.is_dirty(*idx, row))
            .map(|(_, row)| self.resource.row_payload(row))
            .collect();

        if dirty.is_empty() {
            return None;
        }
        let mut payload = Map::new();
        payload.insert(self.resource.payload_key().to_string(), Value::Array(dirty));
        Some(Value::Object(payload))
    }

    /// PUT the diff, then reload from the backend so the grid reflects
    /// exactly what was persisted. A clean grid issues no request. Any
    /// failure leaves rows and dirty marks untouched.
    pub async fn save(&mut self, session: &Session) -> Result<SaveOutcome, ApiError> {
        let Some(payload) = self.build_payload() else {
            return Ok(SaveOutcome::NothingToSave);
        };
        debug!("saving '{}'", self.resource.path());
        session.put(self.resource.path(), &payload).await?;
        self.changed.clear();
        self.load(session).await?;
        Ok(SaveOutcome::Saved)
    }
}
