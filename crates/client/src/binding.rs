//! Remote execution of widget query tickets.
//!
//! The canvas issues [`QueryTicket`]s and later decides whether a result is
//! still current; this module only moves SQL to the executor and rows back.

use futures::future::join_all;

use chartboard_core::binding::QueryTicket;
use chartboard_core::types::Row;

use crate::api::ApiError;
use crate::collaborators::QueryExecutor;

/// Execute one ticket.
pub async fn execute_ticket<Q: QueryExecutor>(
    executor: &Q,
    ticket: &QueryTicket,
) -> Result<Vec<Row>, ApiError> {
    tracing::debug!(
        widget_id = ticket.widget_id,
        seq = ticket.seq,
        sql = %ticket.sql,
        "Executing widget query",
    );

    match executor.execute_query(&ticket.sql).await {
        Ok(rows) => {
            tracing::debug!(
                widget_id = ticket.widget_id,
                seq = ticket.seq,
                rows = rows.len(),
                "Widget query returned",
            );
            Ok(rows)
        }
        Err(e) => {
            tracing::warn!(
                widget_id = ticket.widget_id,
                seq = ticket.seq,
                error = %e,
                "Widget query failed",
            );
            Err(e)
        }
    }
}

/// Execute several tickets concurrently. Results come back in ticket order.
pub async fn execute_all<Q: QueryExecutor>(
    executor: &Q,
    tickets: Vec<QueryTicket>,
) -> Vec<(QueryTicket, Result<Vec<Row>, ApiError>)> {
    let results = join_all(tickets.iter().map(|t| execute_ticket(executor, t))).await;
    tickets.into_iter().zip(results).collect()
}
