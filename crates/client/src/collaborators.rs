//! External collaborators the dashboard session talks to.
//!
//! Each collaborator is a small trait so the session can run against the
//! HTTP client in production and in-memory fakes in tests.

use std::future::Future;

use chartboard_core::columns::TableSchema;
use chartboard_core::layout::DashboardLayout;
use chartboard_core::types::{DbId, Row};
use serde::{Deserialize, Serialize};

use crate::api::ApiError;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Body sent to the persistence endpoint on create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveDashboard {
    pub project_id: DbId,
    pub layout: DashboardLayout,
}

/// A persisted dashboard as returned by the persistence endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardRecord {
    pub id: DbId,
    pub project_id: DbId,
    pub layout: DashboardLayout,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Source of the draggable columns shown in the sidebar.
pub trait TableCatalog: Send + Sync {
    /// List the synced tables available to `project_id`.
    fn list_tables(
        &self,
        project_id: DbId,
    ) -> impl Future<Output = Result<Vec<TableSchema>, ApiError>> + Send;
}

/// Remote SQL execution against the data-modeling service.
pub trait QueryExecutor: Send + Sync {
    /// Run `sql` and return its rows keyed by column name.
    fn execute_query(&self, sql: &str) -> impl Future<Output = Result<Vec<Row>, ApiError>> + Send;
}

/// Dashboard persistence.
pub trait DashboardStore: Send + Sync {
    /// Store a new dashboard and return its identifier.
    fn create_dashboard(
        &self,
        request: &SaveDashboard,
    ) -> impl Future<Output = Result<DbId, ApiError>> + Send;

    /// Overwrite dashboard `id`. Repeating the same update is harmless.
    fn update_dashboard(
        &self,
        id: DbId,
        request: &SaveDashboard,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn get_dashboard(&self, id: DbId) -> impl Future<Output = Result<DashboardRecord, ApiError>> + Send;
}
