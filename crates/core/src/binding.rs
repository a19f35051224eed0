//! Sequencing of widget query results.
//!
//! Every query issued for a widget gets a monotonically increasing sequence
//! number. A response is applied only while its ticket is the latest one
//! issued for that widget, so an older, slower response can never overwrite
//! the dataset produced by a newer query.

use crate::canvas::Canvas;
use crate::columns::{ColumnRef, TableSchema};
use crate::dataset::{build_dataset, NumericMode};
use crate::error::CoreError;
use crate::query;
use crate::types::{Row, WidgetId};

/// One issued query for one widget.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTicket {
    pub widget_id: WidgetId,
    pub seq: u64,
    pub sql: String,
    /// Bound columns at the time the query was issued.
    pub columns: Vec<ColumnRef>,
}

/// What happened when a response was offered to the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The dataset was replaced with this many points.
    Applied { points: usize },
    /// A newer query was issued after this one; the response was dropped.
    Stale { latest: u64 },
    /// The query failed; the last-known-good dataset was kept.
    Failed,
    /// The widget was deleted while the query was in flight.
    Gone,
}

impl Canvas {
    /// Issue a query for widget `id`.
    ///
    /// Returns `Ok(None)` when the widget can not produce a dataset yet (no
    /// label/numeric pair bound, or a text block). In that case the dataset
    /// is cleared and any in-flight response for the widget becomes stale.
    pub fn issue_query(
        &mut self,
        id: WidgetId,
        catalog: &[TableSchema],
    ) -> Result<Option<QueryTicket>, CoreError> {
        let widget = self.widget(id).ok_or(CoreError::widget_not_found(id))?;
        let columns = widget.bound_columns().to_vec();
        let sql = if widget.has_chartable_pair() {
            query::synthesize(&columns, catalog)?
        } else {
            None
        };

        let seq = self.next_sequence(id);
        match sql {
            Some(sql) => Ok(Some(QueryTicket {
                widget_id: id,
                seq,
                sql,
                columns,
            })),
            None => {
                self.widget_mut(id)?.dataset.clear();
                Ok(None)
            }
        }
    }

    /// Latest sequence number issued for `id`.
    pub fn latest_sequence(&self, id: WidgetId) -> Option<u64> {
        self.sequences.get(&id).copied()
    }

    fn next_sequence(&mut self, id: WidgetId) -> u64 {
        let seq = self.sequences.entry(id).or_insert(0);
        *seq += 1;
        *seq
    }

    /// Offer the result of `ticket` to its widget.
    pub fn apply_result<E>(
        &mut self,
        ticket: &QueryTicket,
        result: Result<Vec<Row>, E>,
        mode: NumericMode,
    ) -> ApplyOutcome {
        let latest = self.latest_sequence(ticket.widget_id).unwrap_or(0);
        let Ok(widget) = self.widget_mut(ticket.widget_id) else {
            return ApplyOutcome::Gone;
        };
        if ticket.seq != latest {
            return ApplyOutcome::Stale { latest };
        }

        match result {
            Ok(rows) => {
                widget.dataset = build_dataset(&ticket.columns, &rows, mode);
                ApplyOutcome::Applied {
                    points: widget.dataset.len(),
                }
            }
            Err(_) => ApplyOutcome::Failed,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
