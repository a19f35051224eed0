/// Dashboard and project identifiers issued by the persistence service.
pub type DbId = i64;

/// Per-dashboard widget sequence number. Never reused within a session.
pub type WidgetId = i64;

/// One result row from the query service, keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;
