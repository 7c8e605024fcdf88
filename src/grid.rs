//! Inline grid editing as an explicit state machine: one cell at a time
//! moves through `Idle -> Editing -> Idle`, with Enter/Tab committing
//! and advancing, Escape discarding, and blur committing in place. The
//! machine is independent of any rendering environment; commits come
//! back to the caller as [`CellCommit`] values for the store accessor.

use crate::models::{
    CampaignMetricDefinition, CampaignStatus, DataType, ScorecardTemplate,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Clone)]
pub struct GridRow {
    /// Measure id for scorecard grids, metric key for campaign grids.
    pub key: String,
    pub label: String,
    pub data_type: DataType,
    pub editable: bool,
}

#[derive(Debug, Clone)]
pub struct GridLayout {
    pub rows: Vec<GridRow>,
    pub week_endings: Vec<NaiveDate>,
}

impl GridLayout {
    /// Editability is resolved here, once: the grid must not be
    /// read-only, a user must be signed in, calculated measures never
    /// take input, and owned measures take input from their owner only.
    pub fn for_template(
        template: &ScorecardTemplate,
        current_user: Option<&str>,
        read_only: bool,
        week_endings: Vec<NaiveDate>,
    ) -> Self {
        let rows = template
            .sections
            .iter()
            .flat_map(|section| section.measures.iter())
            .map(|measure| {
                let ownable = match (&measure.owner_user_id, current_user) {
                    (Some(owner), Some(user)) => owner == user,
                    (Some(_), None) => false,
                    (None, _) => true,
                };
                GridRow {
                    key: measure.id.clone(),
                    label: measure.name.clone(),
                    data_type: measure.data_type,
                    editable: !read_only
                        && current_user.is_some()
                        && !measure.kind.is_calculated()
                        && ownable,
                }
            })
            .collect();
        Self { rows, week_endings }
    }

    pub fn for_campaign(
        metrics: &[CampaignMetricDefinition],
        campaign_status: CampaignStatus,
        current_user: Option<&str>,
        week_endings: Vec<NaiveDate>,
    ) -> Self {
        let editable = campaign_status == CampaignStatus::Active && current_user.is_some();
        let rows = metrics
            .iter()
            .map(|metric| GridRow {
                key: metric.metric_key.clone(),
                label: metric.label.clone(),
                data_type: metric.data_type,
                editable,
            })
            .collect();
        Self { rows, week_endings }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridState {
    Idle,
    Editing { cell: GridCell, draft: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridKey {
    Enter,
    Tab,
    Escape,
}

/// A committed draft, ready for the store accessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellCommit {
    pub row_key: String,
    pub data_type: DataType,
    pub week_ending: NaiveDate,
    pub raw: String,
}

#[derive(Debug)]
pub struct GridController {
    layout: GridLayout,
    values: HashMap<GridCell, String>,
    state: GridState,
}

impl GridController {
    pub fn new(layout: GridLayout) -> Self {
        Self {
            layout,
            values: HashMap::new(),
            state: GridState::Idle,
        }
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn state(&self) -> &GridState {
        &self.state
    }

    pub fn editing_cell(&self) -> Option<GridCell> {
        match &self.state {
            GridState::Editing { cell, .. } => Some(*cell),
            GridState::Idle => None,
        }
    }

    /// Replace the committed-value snapshot the next edit seeds from.
    /// Called after a refetch; an in-flight draft is left alone.
    pub fn set_values(&mut self, values: HashMap<GridCell, String>) {
        self.values = values;
    }

    pub fn set_cell_value(&mut self, cell: GridCell, value: Option<String>) {
        match value {
            Some(value) => {
                self.values.insert(cell, value);
            }
            None => {
                self.values.remove(&cell);
            }
        }
    }

    pub fn is_editable(&self, cell: GridCell) -> bool {
        cell.col < self.layout.week_endings.len()
            && self
                .layout
                .rows
                .get(cell.row)
                .map(|row| row.editable)
                .unwrap_or(false)
    }

    /// Click/activate a cell. Any in-progress edit is committed first
    /// (blur semantics) and returned; the new cell is entered only when
    /// it is editable, with the draft seeded from the existing value.
    pub fn activate(&mut self, cell: GridCell) -> Option<CellCommit> {
        let displaced = self.take_commit();
        if self.is_editable(cell) {
            self.enter_edit(cell);
        }
        displaced
    }

    /// Replace the draft for the cell being edited.
    pub fn input(&mut self, text: &str) {
        if let GridState::Editing { draft, .. } = &mut self.state {
            *draft = text.to_string();
        }
    }

    pub fn press(&mut self, key: GridKey) -> Option<CellCommit> {
        let GridState::Editing { cell, .. } = self.state.clone() else {
            return None;
        };
        match key {
            GridKey::Escape => {
                self.state = GridState::Idle;
                None
            }
            GridKey::Enter => {
                let commit = self.take_commit();
                if let Some(next) = self.next_down(cell) {
                    self.enter_edit(next);
                }
                commit
            }
            GridKey::Tab => {
                let commit = self.take_commit();
                if let Some(next) = self.next_right(cell) {
                    self.enter_edit(next);
                }
                commit
            }
        }
    }

    /// Losing focus commits exactly as Enter does, without navigating.
    pub fn blur(&mut self) -> Option<CellCommit> {
        self.take_commit()
    }

    fn enter_edit(&mut self, cell: GridCell) {
        let draft = self.values.get(&cell).cloned().unwrap_or_default();
        self.state = GridState::Editing { cell, draft };
    }

    fn take_commit(&mut self) -> Option<CellCommit> {
        let state = std::mem::replace(&mut self.state, GridState::Idle);
        let GridState::Editing { cell, draft } = state else {
            return None;
        };
        let row = self.layout.rows.get(cell.row)?;
        let week_ending = *self.layout.week_endings.get(cell.col)?;
        Some(CellCommit {
            row_key: row.key.clone(),
            data_type: row.data_type,
            week_ending,
            raw: draft,
        })
    }

    /// Tab target: the next week-ending, wrapping to the first week of
    /// the next editable row at the last column.
    fn next_right(&self, cell: GridCell) -> Option<GridCell> {
        if cell.col + 1 < self.layout.week_endings.len() {
            return Some(GridCell {
                row: cell.row,
                col: cell.col + 1,
            });
        }
        self.next_editable_row(cell.row)
            .map(|row| GridCell { row, col: 0 })
    }

    /// Enter target: the next editable row in the same column.
    fn next_down(&self, cell: GridCell) -> Option<GridCell> {
        self.next_editable_row(cell.row)
            .map(|row| GridCell { row, col: cell.col })
    }

    fn next_editable_row(&self, after: usize) -> Option<usize> {
        self.layout
            .rows
            .iter()
            .enumerate()
            .skip(after + 1)
            .find(|(_, row)| row.editable)
            .map(|(index, _)| index)
    }
}
