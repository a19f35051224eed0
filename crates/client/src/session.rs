//! A dashboard editing session.
//!
//! [`DashboardSession`] owns one [`Canvas`] together with the table catalog
//! it binds against and the collaborators it talks to. All canvas mutation
//! goes through `&mut self`, so there is a single writer. Rejected input is
//! reported as an alert notice and remote failures as error toasts; in both
//! cases the canvas keeps its previous state.

use std::sync::Arc;

use chartboard_core::binding::{ApplyOutcome, QueryTicket};
use chartboard_core::canvas::{BindOutcome, Canvas};
use chartboard_core::columns::{ColumnRef, TableSchema};
use chartboard_core::dataset::NumericMode;
use chartboard_core::error::CoreError;
use chartboard_core::geometry::Size;
use chartboard_core::types::{DbId, Row, WidgetId};
use chartboard_core::widget::ChartType;

use crate::api::ApiError;
use crate::binding::{execute_all, execute_ticket};
use crate::collaborators::{DashboardStore, QueryExecutor, SaveDashboard, TableCatalog};
use crate::events::{Notice, NoticeBus};

/// Toast shown after a successful save or update.
pub const SAVED_MESSAGE: &str = "Dashboard saved";

/// Toast shown when persistence fails.
pub const SAVE_FAILED_MESSAGE: &str = "There was an error saving the dashboard";

/// Toast shown when a widget query fails.
pub const QUERY_FAILED_MESSAGE: &str = "There was an error loading data for this chart";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Outcome counts of a refresh across several widgets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub applied: usize,
    pub stale: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RefreshSummary {
    fn record(&mut self, outcome: ApplyOutcome) {
        match outcome {
            ApplyOutcome::Applied { .. } => self.applied += 1,
            ApplyOutcome::Stale { .. } | ApplyOutcome::Gone => self.stale += 1,
            ApplyOutcome::Failed => self.failed += 1,
        }
    }
}

pub struct DashboardSession<B> {
    backend: B,
    notices: Arc<NoticeBus>,
    project_id: DbId,
    dashboard_id: Option<DbId>,
    name: String,
    canvas: Canvas,
    catalog: Vec<TableSchema>,
    numeric_mode: NumericMode,
}

impl<B> DashboardSession<B>
where
    B: TableCatalog + QueryExecutor + DashboardStore,
{
    /// Start a new, empty dashboard for `project_id`.
    pub async fn create(
        backend: B,
        notices: Arc<NoticeBus>,
        project_id: DbId,
        name: impl Into<String>,
        bounds: Size,
    ) -> Result<Self, SessionError> {
        let catalog = backend.list_tables(project_id).await?;
        tracing::info!(project_id, tables = catalog.len(), "Created dashboard session");

        Ok(Self {
            backend,
            notices,
            project_id,
            dashboard_id: None,
            name: name.into(),
            canvas: Canvas::new(bounds),
            catalog,
            numeric_mode: NumericMode::default(),
        })
    }

    /// Open a persisted dashboard for editing.
    pub async fn open(
        backend: B,
        notices: Arc<NoticeBus>,
        dashboard_id: DbId,
        bounds: Size,
    ) -> Result<Self, SessionError> {
        let record = backend.get_dashboard(dashboard_id).await?;
        let catalog = backend.list_tables(record.project_id).await?;
        let name = record.layout.name.clone();
        let canvas = Canvas::hydrate(bounds, record.layout)?;

        tracing::info!(
            dashboard_id,
            project_id = record.project_id,
            widgets = canvas.widgets().len(),
            "Opened dashboard session",
        );

        Ok(Self {
            backend,
            notices,
            project_id: record.project_id,
            dashboard_id: Some(dashboard_id),
            name,
            canvas,
            catalog,
            numeric_mode: NumericMode::default(),
        })
    }

    pub fn with_numeric_mode(mut self, mode: NumericMode) -> Self {
        self.numeric_mode = mode;
        self
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Direct canvas access for pointer dispatch and mode toggles.
    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn dashboard_id(&self) -> Option<DbId> {
        self.dashboard_id
    }

    pub fn project_id(&self) -> DbId {
        self.project_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn catalog(&self) -> &[TableSchema] {
        &self.catalog
    }

    /// Every column in the catalog, as shown in the sidebar.
    pub fn available_columns(&self) -> Vec<ColumnRef> {
        self.catalog.iter().flat_map(|t| t.column_refs()).collect()
    }

    /// Reload the table catalog from the provider.
    pub async fn reload_catalog(&mut self) -> Result<(), SessionError> {
        match self.backend.list_tables(self.project_id).await {
            Ok(catalog) => {
                self.catalog = catalog;
                Ok(())
            }
            Err(e) => {
                tracing::error!(project_id = self.project_id, error = %e, "Failed to load tables");
                self.notices
                    .publish(Notice::error("There was an error loading the available tables"));
                Err(e.into())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Widgets
    // -----------------------------------------------------------------------

    pub fn add_widget(&mut self, chart_type: ChartType) -> Result<WidgetId, SessionError> {
        let id = self.canvas.add_widget(chart_type).map_err(|e| self.reject(e, None))?;
        tracing::debug!(widget_id = id, ?chart_type, "Widget added");
        Ok(id)
    }

    pub fn delete_widget(&mut self, id: WidgetId) -> Result<(), SessionError> {
        self.canvas.delete_widget(id).map_err(|e| self.reject(e, Some(id)))?;
        tracing::debug!(widget_id = id, "Widget deleted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Column binding
    // -----------------------------------------------------------------------

    /// Bind a sidebar column to widget `id` and refresh its dataset.
    pub async fn bind_column(
        &mut self,
        id: WidgetId,
        column: ColumnRef,
    ) -> Result<BindOutcome, SessionError> {
        let outcome = self
            .canvas
            .bind_column(id, column, &self.catalog)
            .map_err(|e| self.reject(e, Some(id)))?;
        if outcome.added {
            self.refresh_widget(id).await?;
        }
        Ok(outcome)
    }

    /// Remove (table, column) from widget `id` and refresh its dataset.
    pub async fn unbind_column(
        &mut self,
        id: WidgetId,
        table: &str,
        column: &str,
    ) -> Result<Option<String>, SessionError> {
        let query = self
            .canvas
            .unbind_column(id, table, column, &self.catalog)
            .map_err(|e| self.reject(e, Some(id)))?;
        self.refresh_widget(id).await?;
        Ok(query)
    }

    // -----------------------------------------------------------------------
    // Data refresh
    // -----------------------------------------------------------------------

    /// Re-run widget `id`'s query and apply the result if it is still current.
    ///
    /// Returns `Ok(None)` when the widget has nothing to query.
    pub async fn refresh_widget(&mut self, id: WidgetId) -> Result<Option<ApplyOutcome>, SessionError> {
        let Some(ticket) = self.issue(id)? else {
            return Ok(None);
        };
        let result = execute_ticket(&self.backend, &ticket).await;
        Ok(Some(self.apply(&ticket, result)))
    }

    /// Re-run every widget's query concurrently.
    ///
    /// A widget whose query can no longer be built (for example after its
    /// tables lost their foreign keys) is reported and counted as failed;
    /// the remaining widgets still refresh.
    pub async fn refresh_all(&mut self) -> RefreshSummary {
        let mut summary = RefreshSummary::default();
        let mut tickets = Vec::new();

        let ids: Vec<WidgetId> = self.canvas.widgets().iter().map(|w| w.id).collect();
        for id in ids {
            match self.issue(id) {
                Ok(Some(ticket)) => tickets.push(ticket),
                Ok(None) => summary.skipped += 1,
                Err(e) => {
                    tracing::warn!(widget_id = id, error = %e, "Skipping widget with unbuildable query");
                    summary.failed += 1;
                }
            }
        }

        let results = execute_all(&self.backend, tickets).await;
        for (ticket, result) in results {
            summary.record(self.apply(&ticket, result));
        }

        tracing::info!(
            applied = summary.applied,
            stale = summary.stale,
            failed = summary.failed,
            skipped = summary.skipped,
            "Dashboard refresh complete",
        );
        summary
    }

    /// Issue a ticket for `id` without running it. Hosts that execute
    /// queries themselves pair this with [`apply`](Self::apply).
    pub fn issue(&mut self, id: WidgetId) -> Result<Option<QueryTicket>, SessionError> {
        self.canvas
            .issue_query(id, &self.catalog)
            .map_err(|e| self.reject(e, Some(id)))
    }

    /// Offer a query result to the canvas, emitting an error toast on failure.
    pub fn apply(&mut self, ticket: &QueryTicket, result: Result<Vec<Row>, ApiError>) -> ApplyOutcome {
        let failed = result.is_err();
        let outcome = self.canvas.apply_result(ticket, result, self.numeric_mode);

        match outcome {
            ApplyOutcome::Applied { points } => {
                tracing::debug!(widget_id = ticket.widget_id, seq = ticket.seq, points, "Dataset updated");
            }
            ApplyOutcome::Stale { latest } => {
                tracing::debug!(
                    widget_id = ticket.widget_id,
                    seq = ticket.seq,
                    latest,
                    failed,
                    "Discarding stale query response",
                );
            }
            ApplyOutcome::Failed => {
                self.notices
                    .publish(Notice::error(QUERY_FAILED_MESSAGE).for_widget(ticket.widget_id));
            }
            ApplyOutcome::Gone => {
                tracing::debug!(widget_id = ticket.widget_id, "Widget deleted before query returned");
            }
        }
        outcome
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Persist the dashboard: create on first save, update afterwards.
    ///
    /// Returns the dashboard id. Failures emit a generic error toast and are
    /// not retried.
    pub async fn save(&mut self) -> Result<DbId, SessionError> {
        let layout = self.canvas.snapshot(self.name.clone());
        layout.validate().map_err(|e| self.reject(e, None))?;
        let request = SaveDashboard {
            project_id: self.project_id,
            layout,
        };

        let result = match self.dashboard_id {
            Some(id) => self.backend.update_dashboard(id, &request).await.map(|_| id),
            None => self.backend.create_dashboard(&request).await,
        };

        match result {
            Ok(id) => {
                tracing::info!(dashboard_id = id, project_id = self.project_id, "Dashboard saved");
                self.dashboard_id = Some(id);
                self.notices.publish(Notice::success(SAVED_MESSAGE));
                Ok(id)
            }
            Err(e) => {
                tracing::error!(
                    dashboard_id = ?self.dashboard_id,
                    project_id = self.project_id,
                    error = %e,
                    "Failed to save dashboard",
                );
                self.notices.publish(Notice::error(SAVE_FAILED_MESSAGE));
                Err(e.into())
            }
        }
    }

    // ---- private helpers ----

    /// Report rejected input to the user and convert it for `?`.
    fn reject(&self, err: CoreError, widget: Option<WidgetId>) -> SessionError {
        tracing::debug!(widget_id = ?widget, error = %err, "Rejected dashboard edit");
        let notice = Notice::alert(err.user_message());
        self.notices.publish(match widget {
            Some(id) => notice.for_widget(id),
            None => notice,
        });
        SessionError::Core(err)
    }
}
