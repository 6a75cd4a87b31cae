//! Resource Table Controller — keeps a rendered table synchronized with a
//! server-side collection.
//!
//! One controller instance is bound to one render target (the terminal
//! analog of the page's table body) and one record kind. A reload is always
//! a full tear-down: the previous snapshot is discarded and rebuilt from the
//! freshly fetched collection view, never diffed or patched. Mutations go
//! delete → confirm → DELETE → reload; the reload runs even though the row
//! is already known deleted, so a concurrent external mutation can never
//! leave the table lying.
//!
//! Reloads are serialized per controller: `reload` takes `&mut self`, so two
//! reloads of the same instance cannot overlap or interleave renders on the
//! shared target. Each completed render carries a monotonic generation
//! number for diagnostics.
//!
//! A reload never panics and never returns an error — a failed fetch renders
//! as a single error row, gets logged, and the command keeps running.

use std::marker::PhantomData;

use log::{debug, warn};

use crate::api::{ApiClient, ApiError};
use crate::model::Record;

/// Fallback shown in place of an absent or empty field value.
pub const MISSING_VALUE: &str = "N/A";

// ---------------------------------------------------------------------------
// Rendered state
// ---------------------------------------------------------------------------

/// One rendered row: the record's identity (which the delete control is
/// bound to) plus one display cell per declared column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    pub id: String,
    pub cells: Vec<String>,
}

/// What a completed reload produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TableView {
    Rows(Vec<RenderedRow>),
    /// Empty collection: exactly one informational row spanning all columns,
    /// so an empty table does not look broken.
    Empty(String),
    /// Fetch or parse failure: exactly one error row spanning all columns.
    Failed(String),
}

/// A full replacement for whatever the target currently displays.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    pub columns: &'static [&'static str],
    pub view: TableView,
    /// Monotonic per-controller reload counter, starting at 1.
    pub generation: u64,
}

/// Where snapshots land. The terminal implementation prints; tests record.
pub trait RenderTarget {
    /// Discard the current display and show `snapshot` instead.
    fn replace(&mut self, snapshot: &TableSnapshot);

    /// Called when a fetch is about to start, so the user sees a pending
    /// state rather than a silently stale table.
    fn pending(&mut self) {}
}

/// User-facing confirmation and notices (the page's confirm/alert analog).
/// Injected per call so a controller never reaches into ambient state.
pub trait Interaction {
    fn confirm(&mut self, question: &str) -> bool;
    fn notify(&mut self, message: &str);
}

/// How a delete attempt ended, for the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// User declined the confirmation; nothing was sent.
    Declined,
    /// Server deleted the record; the table was reloaded.
    Deleted,
    /// Server rejected the delete; table state unchanged.
    Rejected,
    /// Transport-level failure; table state unchanged.
    Failed,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct TableController<'a, R: Record> {
    client: &'a ApiClient,
    target: &'a mut dyn RenderTarget,
    generation: u64,
    _record: PhantomData<R>,
}

impl<'a, R: Record> TableController<'a, R> {
    pub fn new(client: &'a ApiClient, target: &'a mut dyn RenderTarget) -> Self {
        Self {
            client,
            target,
            generation: 0,
            _record: PhantomData,
        }
    }

    /// Generation of the last completed render (0 = never rendered).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Fetch the collection and rebuild the bound target from scratch.
    pub fn reload(&mut self) {
        self.target.pending();
        self.generation += 1;

        let view = match self.client.list::<R>() {
            Ok(records) => view_of(&records),
            Err(err) => {
                warn!("GET {} failed: {err}", R::ENDPOINT);
                TableView::Failed(format!("Could not load {}.", R::NOUN_PLURAL))
            }
        };

        if let TableView::Rows(rows) = &view {
            debug!("reload #{} of {}: {} rows", self.generation, R::ENDPOINT, rows.len());
        }

        self.target.replace(&TableSnapshot {
            columns: R::COLUMNS,
            view,
            generation: self.generation,
        });
    }

    /// Confirmed delete of one record, followed by a reload on success.
    ///
    /// The server's own message is surfaced on both acceptance and rejection;
    /// on rejection or transport failure the table is left untouched (the
    /// collection did not change).
    pub fn delete(&mut self, id: &str, ui: &mut dyn Interaction) -> DeleteOutcome {
        if !ui.confirm(R::DELETE_PROMPT) {
            return DeleteOutcome::Declined;
        }

        match self.client.delete(R::ENDPOINT, id) {
            Ok(message) => {
                ui.notify(&message);
                self.reload();
                DeleteOutcome::Deleted
            }
            Err(err @ ApiError::Rejected { .. }) => {
                warn!("DELETE {}/{id} rejected: {err}", R::ENDPOINT);
                ui.notify(&format!("Error: {err}"));
                DeleteOutcome::Rejected
            }
            Err(err) => {
                warn!("DELETE {}/{id} failed: {err}", R::ENDPOINT);
                ui.notify(&format!("Could not delete the {}.", R::NOUN));
                DeleteOutcome::Failed
            }
        }
    }
}

/// Project one fetched record into its rendered row, applying the
/// missing-value fallback cell by cell.
pub fn row_of<R: Record>(record: &R) -> RenderedRow {
    RenderedRow {
        id: record.id(),
        cells: record
            .cells()
            .into_iter()
            .map(|cell| cell.unwrap_or_else(|| MISSING_VALUE.to_string()))
            .collect(),
    }
}

fn view_of<R: Record>(records: &[R]) -> TableView {
    if records.is_empty() {
        TableView::Empty(format!("No {} found.", R::NOUN_PLURAL))
    } else {
        TableView::Rows(records.iter().map(row_of).collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldSpec, Sensor};

    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Probe {
        id: i64,
        name: Option<String>,
    }

    impl Record for Probe {
        const NOUN: &'static str = "probe";
        const NOUN_PLURAL: &'static str = "probes";
        const ENDPOINT: &'static str = "/api/probes";
        const COLUMNS: &'static [&'static str] = &["ID", "Name"];
        const DELETE_PROMPT: &'static str = "Delete this probe?";
        const FORM_FIELDS: &'static [FieldSpec] =
            &[FieldSpec { key: "name", label: "Name", required: true }];

        fn id(&self) -> String {
            self.id.to_string()
        }

        fn cells(&self) -> Vec<Option<String>> {
            vec![Some(self.id.to_string()), self.name.clone()]
        }
    }

    #[test]
    fn row_of_substitutes_missing_value_fallback() {
        let row = row_of(&Probe { id: 4, name: None });
        assert_eq!(row.id, "4");
        assert_eq!(row.cells, vec!["4".to_string(), MISSING_VALUE.to_string()]);
    }

    #[test]
    fn row_projection_is_order_preserving_bijection() {
        let records = vec![
            Probe { id: 2, name: Some("a".into()) },
            Probe { id: 9, name: Some("b".into()) },
            Probe { id: 5, name: None },
        ];
        let TableView::Rows(rows) = view_of(&records) else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), records.len());
        for (record, row) in records.iter().zip(&rows) {
            assert_eq!(row.id, record.id());
        }
    }

    #[test]
    fn empty_collection_renders_one_placeholder_row() {
        let view = view_of::<Probe>(&[]);
        assert_eq!(view, TableView::Empty("No probes found.".to_string()));
    }

    #[test]
    fn sensor_row_uses_fallback_for_falsy_fields() {
        let sensor: Sensor =
            serde_json::from_str(r#"{"id": 11, "type": "", "id_piece": 3}"#).unwrap();
        let row = row_of(&sensor);
        assert_eq!(row.cells[1], MISSING_VALUE);
        assert_eq!(row.cells[4], "3");
    }
}
