//! Integration tests for the dashboard editing session.
//!
//! Runs [`DashboardSession`] against an in-memory backend that stands in
//! for the table catalog, query execution, and persistence endpoints.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use chrono::Utc;

use chartboard_client::api::ApiError;
use chartboard_client::collaborators::{
    DashboardRecord, DashboardStore, QueryExecutor, SaveDashboard, TableCatalog,
};
use chartboard_client::events::{NoticeBus, NoticeLevel};
use chartboard_client::session::{
    DashboardSession, SessionError, QUERY_FAILED_MESSAGE, SAVED_MESSAGE, SAVE_FAILED_MESSAGE,
};
use chartboard_core::binding::ApplyOutcome;
use chartboard_core::canvas::{DEFAULT_CANVAS_SIZE, MAX_WIDGETS};
use chartboard_core::columns::{ColumnDef, ColumnRef, ForeignKeyRef, TableSchema};
use chartboard_core::dataset::{DataPoint, NumericMode};
use chartboard_core::error::CoreError;
use chartboard_core::geometry::Point;
use chartboard_core::interaction::ModeKind;
use chartboard_core::layout::DashboardLayout;
use chartboard_core::types::{DbId, Row};
use chartboard_core::widget::{ChartType, Widget, JOIN_PATH_REJECTION};

// ---------------------------------------------------------------------------
// Fake backend
// ---------------------------------------------------------------------------

#[derive(Default)]
struct State {
    tables: Vec<TableSchema>,
    responses: Mutex<HashMap<String, Vec<Row>>>,
    executed: Mutex<Vec<String>>,
    fail_queries: AtomicBool,
    fail_saves: AtomicBool,
    next_id: AtomicI64,
    creates: Mutex<Vec<SaveDashboard>>,
    updates: Mutex<Vec<(DbId, SaveDashboard)>>,
    stored: Mutex<Option<DashboardRecord>>,
}

#[derive(Clone, Default)]
struct FakeBackend(Arc<State>);

impl FakeBackend {
    fn with_tables(tables: Vec<TableSchema>) -> Self {
        Self(Arc::new(State {
            tables,
            next_id: AtomicI64::new(100),
            ..Default::default()
        }))
    }

    fn respond(&self, sql: &str, rows: serde_json::Value) {
        let rows: Vec<Row> = serde_json::from_value(rows).unwrap();
        self.0.responses.lock().unwrap().insert(sql.to_string(), rows);
    }

    fn executed(&self) -> Vec<String> {
        self.0.executed.lock().unwrap().clone()
    }

    fn store(&self, record: DashboardRecord) {
        *self.0.stored.lock().unwrap() = Some(record);
    }
}

fn unavailable() -> ApiError {
    ApiError::Status {
        status: 503,
        body: "unavailable".to_string(),
    }
}

impl TableCatalog for FakeBackend {
    async fn list_tables(&self, _project_id: DbId) -> Result<Vec<TableSchema>, ApiError> {
        Ok(self.0.tables.clone())
    }
}

impl QueryExecutor for FakeBackend {
    async fn execute_query(&self, sql: &str) -> Result<Vec<Row>, ApiError> {
        self.0.executed.lock().unwrap().push(sql.to_string());
        if self.0.fail_queries.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self
            .0
            .responses
            .lock()
            .unwrap()
            .get(sql)
            .cloned()
            .unwrap_or_default())
    }
}

impl DashboardStore for FakeBackend {
    async fn create_dashboard(&self, request: &SaveDashboard) -> Result<DbId, ApiError> {
        if self.0.fail_saves.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.0.creates.lock().unwrap().push(request.clone());
        Ok(self.0.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn update_dashboard(&self, id: DbId, request: &SaveDashboard) -> Result<(), ApiError> {
        if self.0.fail_saves.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.0.updates.lock().unwrap().push((id, request.clone()));
        Ok(())
    }

    async fn get_dashboard(&self, id: DbId) -> Result<DashboardRecord, ApiError> {
        self.0
            .stored
            .lock()
            .unwrap()
            .clone()
            .filter(|r| r.id == id)
            .ok_or(ApiError::Status {
                status: 404,
                body: "not found".to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn def(name: &str, data_type: &str, reference: Option<(&str, &str)>) -> ColumnDef {
    ColumnDef {
        column_name: name.to_string(),
        data_type: data_type.to_string(),
        reference: reference.map(|(table, column)| ForeignKeyRef {
            foreign_schema: "public".to_string(),
            foreign_table: table.to_string(),
            foreign_column: column.to_string(),
        }),
    }
}

fn catalog() -> Vec<TableSchema> {
    vec![
        TableSchema {
            schema: "public".to_string(),
            table_name: "sales".to_string(),
            columns: vec![
                def("region", "character varying", None),
                def("total", "bigint", None),
            ],
        },
        TableSchema {
            schema: "public".to_string(),
            table_name: "orders".to_string(),
            columns: vec![
                def("amount", "numeric", None),
                def("customer_id", "bigint", Some(("customers", "id"))),
            ],
        },
        TableSchema {
            schema: "public".to_string(),
            table_name: "customers".to_string(),
            columns: vec![def("id", "bigint", None), def("name", "text", None)],
        },
    ]
}

fn column(table: &str, name: &str) -> ColumnRef {
    catalog()
        .into_iter()
        .find(|t| t.table_name == table)
        .and_then(|t| t.column(name))
        .unwrap()
}

const SALES_SQL: &str = "SELECT region, total FROM public.sales";

async fn new_session(backend: &FakeBackend) -> (DashboardSession<FakeBackend>, Arc<NoticeBus>) {
    let notices = Arc::new(NoticeBus::default());
    let session = DashboardSession::create(
        backend.clone(),
        notices.clone(),
        7,
        "Regional sales",
        DEFAULT_CANVAS_SIZE,
    )
    .await
    .unwrap();
    (session, notices)
}

// ---------------------------------------------------------------------------
// Binding and data
// ---------------------------------------------------------------------------

#[tokio::test]
async fn binding_label_and_numeric_columns_builds_dataset() {
    let backend = FakeBackend::with_tables(catalog());
    backend.respond(
        SALES_SQL,
        serde_json::json!([
            { "region": "US", "total": "100" },
            { "region": "EU", "total": "50" }
        ]),
    );
    let (mut session, _) = new_session(&backend).await;
    let id = session.add_widget(ChartType::Pie).unwrap();

    session.bind_column(id, column("sales", "region")).await.unwrap();
    assert!(backend.executed().is_empty(), "no query before a numeric column");

    let outcome = session.bind_column(id, column("sales", "total")).await.unwrap();
    assert_eq!(outcome.query.as_deref(), Some(SALES_SQL));
    assert_eq!(backend.executed(), vec![SALES_SQL.to_string()]);
    assert_eq!(
        session.canvas().widget(id).unwrap().dataset,
        vec![DataPoint::new("US", 100.0), DataPoint::new("EU", 50.0)]
    );
}

#[tokio::test]
async fn rebinding_an_existing_column_does_not_requery() {
    let backend = FakeBackend::with_tables(catalog());
    let (mut session, _) = new_session(&backend).await;
    let id = session.add_widget(ChartType::VerticalBar).unwrap();

    session.bind_column(id, column("sales", "region")).await.unwrap();
    session.bind_column(id, column("sales", "total")).await.unwrap();
    let again = session.bind_column(id, column("sales", "total")).await.unwrap();

    assert!(!again.added);
    assert_eq!(backend.executed().len(), 1);
    assert_eq!(session.canvas().widget(id).unwrap().bound_columns().len(), 2);
}

#[tokio::test]
async fn cross_table_binding_runs_joined_query() {
    let backend = FakeBackend::with_tables(catalog());
    let (mut session, _) = new_session(&backend).await;
    let id = session.add_widget(ChartType::HorizontalBar).unwrap();

    let sql = "SELECT public.orders.amount AS \"public.orders.amount\", \
               public.customers.name AS \"public.customers.name\" FROM public.orders \
               JOIN public.customers ON public.orders.customer_id = public.customers.id";
    backend.respond(
        sql,
        serde_json::json!([
            { "public.orders.amount": "12.5", "public.customers.name": "Acme" }
        ]),
    );

    session.bind_column(id, column("orders", "amount")).await.unwrap();
    session.bind_column(id, column("customers", "name")).await.unwrap();

    assert_eq!(backend.executed(), vec![sql.to_string()]);
    assert_eq!(
        session.canvas().widget(id).unwrap().dataset,
        vec![DataPoint::new("Acme", 12.5)]
    );
}

#[tokio::test]
async fn foreign_key_column_rejection_raises_alert() {
    let backend = FakeBackend::with_tables(catalog());
    let (mut session, notices) = new_session(&backend).await;
    let mut rx = notices.subscribe();
    let id = session.add_widget(ChartType::Table).unwrap();

    session.bind_column(id, column("customers", "name")).await.unwrap();
    let err = session
        .bind_column(id, column("orders", "customer_id"))
        .await
        .unwrap_err();

    assert_matches!(err, SessionError::Core(CoreError::Validation(_)));
    let notice = rx.recv().await.unwrap();
    assert_eq!(notice.level, NoticeLevel::Alert);
    assert_eq!(notice.message, JOIN_PATH_REJECTION);
    assert_eq!(notice.widget_id, Some(id));
}

#[tokio::test]
async fn failed_query_keeps_previous_dataset_and_toasts() {
    let backend = FakeBackend::with_tables(catalog());
    backend.respond(SALES_SQL, serde_json::json!([{ "region": "US", "total": 3 }]));
    let (mut session, notices) = new_session(&backend).await;
    let id = session.add_widget(ChartType::Donut).unwrap();
    session.bind_column(id, column("sales", "region")).await.unwrap();
    session.bind_column(id, column("sales", "total")).await.unwrap();

    let mut rx = notices.subscribe();
    backend.0.fail_queries.store(true, Ordering::SeqCst);
    let outcome = session.refresh_widget(id).await.unwrap();

    assert_eq!(outcome, Some(ApplyOutcome::Failed));
    assert_eq!(
        session.canvas().widget(id).unwrap().dataset,
        vec![DataPoint::new("US", 3.0)]
    );
    let notice = rx.recv().await.unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, QUERY_FAILED_MESSAGE);
}

#[tokio::test]
async fn out_of_order_responses_keep_newest_dataset() {
    let backend = FakeBackend::with_tables(catalog());
    let (mut session, _) = new_session(&backend).await;
    let id = session.add_widget(ChartType::Pie).unwrap();
    session.bind_column(id, column("sales", "region")).await.unwrap();
    session.bind_column(id, column("sales", "total")).await.unwrap();

    let older = session.issue(id).unwrap().unwrap();
    let newer = session.issue(id).unwrap().unwrap();

    let fresh: Vec<Row> =
        serde_json::from_value(serde_json::json!([{ "region": "EU", "total": 8 }])).unwrap();
    let late: Vec<Row> =
        serde_json::from_value(serde_json::json!([{ "region": "US", "total": 1 }])).unwrap();

    assert_eq!(
        session.apply(&newer, Ok(fresh)),
        ApplyOutcome::Applied { points: 1 }
    );
    assert_matches!(session.apply(&older, Ok(late)), ApplyOutcome::Stale { .. });
    assert_eq!(
        session.canvas().widget(id).unwrap().dataset,
        vec![DataPoint::new("EU", 8.0)]
    );
}

#[tokio::test]
async fn truncate_mode_reproduces_integer_values() {
    let backend = FakeBackend::with_tables(catalog());
    backend.respond(SALES_SQL, serde_json::json!([{ "region": "US", "total": "10.9" }]));
    let (session, _) = new_session(&backend).await;
    let mut session = session.with_numeric_mode(NumericMode::Truncate);
    let id = session.add_widget(ChartType::Pie).unwrap();
    session.bind_column(id, column("sales", "region")).await.unwrap();
    session.bind_column(id, column("sales", "total")).await.unwrap();

    assert_eq!(session.canvas().widget(id).unwrap().dataset[0].value, 10.0);
}

// ---------------------------------------------------------------------------
// Widget cap
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sixth_widget_raises_alert() {
    let backend = FakeBackend::with_tables(catalog());
    let (mut session, notices) = new_session(&backend).await;
    for _ in 0..MAX_WIDGETS {
        session.add_widget(ChartType::Map).unwrap();
    }

    let mut rx = notices.subscribe();
    assert!(session.add_widget(ChartType::Map).is_err());
    assert_eq!(session.canvas().widgets().len(), MAX_WIDGETS);
    assert_eq!(rx.recv().await.unwrap().level, NoticeLevel::Alert);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_save_creates_then_updates() {
    let backend = FakeBackend::with_tables(catalog());
    let (mut session, notices) = new_session(&backend).await;
    let mut rx = notices.subscribe();
    let id = session.add_widget(ChartType::TextBlock).unwrap();
    session.canvas_mut().set_text(id, "Q3 summary").unwrap();
    session.canvas_mut().toggle_mode(id, ModeKind::Dragging).unwrap();

    let created = session.save().await.unwrap();
    assert_eq!(created, 100);
    assert_eq!(session.dashboard_id(), Some(100));
    assert_eq!(rx.recv().await.unwrap().message, SAVED_MESSAGE);

    let updated = session.save().await.unwrap();
    assert_eq!(updated, created);

    let creates = backend.0.creates.lock().unwrap().clone();
    let updates = backend.0.updates.lock().unwrap().clone();
    assert_eq!(creates.len(), 1);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, 100);
    assert_eq!(creates[0].project_id, 7);
    assert_eq!(creates[0].layout.name, "Regional sales");
    assert_eq!(creates[0].layout.widgets[0].text_content(), Some("Q3 summary"));

    let body = serde_json::to_value(&creates[0]).unwrap();
    assert!(body["layout"]["widgets"][0].get("interaction_mode").is_none());
}

#[tokio::test]
async fn failed_save_shows_generic_error() {
    let backend = FakeBackend::with_tables(catalog());
    let (mut session, notices) = new_session(&backend).await;
    let mut rx = notices.subscribe();
    backend.0.fail_saves.store(true, Ordering::SeqCst);

    let err = session.save().await.unwrap_err();
    assert_matches!(err, SessionError::Api(ApiError::Status { status: 503, .. }));
    assert_eq!(session.dashboard_id(), None);

    let notice = rx.recv().await.unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, SAVE_FAILED_MESSAGE);
}

#[tokio::test]
async fn open_hydrates_and_refreshes_every_chart() {
    let backend = FakeBackend::with_tables(catalog());
    backend.respond(SALES_SQL, serde_json::json!([{ "region": "APAC", "total": 42 }]));

    let mut chart = Widget::new(3, ChartType::VerticalBar);
    chart.bind_column(column("sales", "region")).unwrap();
    chart.bind_column(column("sales", "total")).unwrap();
    chart.location = Point::new(240.0, 60.0);
    let text = Widget::new(5, ChartType::TextBlock);

    backend.store(DashboardRecord {
        id: 55,
        project_id: 7,
        layout: DashboardLayout {
            name: "Saved".to_string(),
            widgets: vec![chart, text],
        },
        created_at: Utc::now(),
        updated_at: Utc::now(),
    });

    let notices = Arc::new(NoticeBus::default());
    let mut session = DashboardSession::open(backend.clone(), notices, 55, DEFAULT_CANVAS_SIZE)
        .await
        .unwrap();
    assert_eq!(session.name(), "Saved");
    assert_eq!(session.project_id(), 7);
    assert_eq!(
        session.canvas().widget(3).unwrap().location,
        Point::new(240.0, 60.0)
    );

    let summary = session.refresh_all().await;
    assert_eq!(summary.applied, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(
        session.canvas().widget(3).unwrap().dataset,
        vec![DataPoint::new("APAC", 42.0)]
    );

    // New widgets continue after the highest persisted id.
    assert_eq!(session.add_widget(ChartType::Pie).unwrap(), 6);
}

#[tokio::test]
async fn opening_unknown_dashboard_fails() {
    let backend = FakeBackend::with_tables(catalog());
    let result = DashboardSession::open(
        backend,
        Arc::new(NoticeBus::default()),
        404,
        DEFAULT_CANVAS_SIZE,
    )
    .await;
    let Err(err) = result else {
        panic!("opening an unknown dashboard should fail");
    };
    assert_matches!(err, SessionError::Api(ApiError::Status { status: 404, .. }));
}

#[tokio::test]
async fn unbuildable_widget_does_not_block_other_refreshes() {
    let backend = FakeBackend::with_tables(catalog());
    backend.respond(SALES_SQL, serde_json::json!([{ "region": "US", "total": 9 }]));

    // sales and customers share no foreign key.
    let mut orphaned = Widget::new(1, ChartType::Pie);
    orphaned.bind_column(column("sales", "total")).unwrap();
    orphaned.bind_column(column("customers", "name")).unwrap();
    let mut healthy = Widget::new(2, ChartType::Pie);
    healthy.bind_column(column("sales", "region")).unwrap();
    healthy.bind_column(column("sales", "total")).unwrap();

    backend.store(DashboardRecord {
        id: 9,
        project_id: 7,
        layout: DashboardLayout {
            name: "Mixed".to_string(),
            widgets: vec![orphaned, healthy],
        },
        created_at: Utc::now(),
        updated_at: Utc::now(),
    });

    let notices = Arc::new(NoticeBus::default());
    let mut rx = notices.subscribe();
    let mut session = DashboardSession::open(backend.clone(), notices, 9, DEFAULT_CANVAS_SIZE)
        .await
        .unwrap();

    let summary = session.refresh_all().await;
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.applied, 1);
    assert_eq!(backend.executed(), vec![SALES_SQL.to_string()]);
    assert_eq!(
        session.canvas().widget(2).unwrap().dataset,
        vec![DataPoint::new("US", 9.0)]
    );

    let notice = rx.recv().await.unwrap();
    assert_eq!(notice.level, NoticeLevel::Alert);
    assert_eq!(notice.widget_id, Some(1));
}

#[tokio::test]
async fn available_columns_flatten_catalog() {
    let backend = FakeBackend::with_tables(catalog());
    let (session, _) = new_session(&backend).await;
    let columns = session.available_columns();
    assert_eq!(columns.len(), 6);
    assert!(columns.iter().any(|c| c.same_column("orders", "customer_id")
        && c.reference.is_some()));
}
