//! SQL synthesis for a widget's bound columns.
//!
//! [`synthesize`] is stateless: the canvas calls it again after every bind
//! or unbind and nothing is cached between calls.

use crate::columns::{find_table, ColumnRef, TableKey, TableSchema};
use crate::error::CoreError;

/// One foreign-key edge between two tables: `from.column -> to.column`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct JoinEdge {
    from: TableKey,
    from_column: String,
    to: TableKey,
    to_column: String,
}

/// Quote an identifier unless it is a plain lowercase name.
pub fn quote_ident(ident: &str) -> String {
    let plain = !ident.is_empty()
        && !ident.starts_with(|c: char| c.is_ascii_digit())
        && ident
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if plain {
        ident.to_string()
    } else {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }
}

fn qualified_table(key: &TableKey) -> String {
    format!("{}.{}", quote_ident(&key.schema), quote_ident(&key.table))
}

fn qualified_column(key: &TableKey, column: &str) -> String {
    format!("{}.{}", qualified_table(key), quote_ident(column))
}

/// Distinct tables referenced by `bound`, in first-seen order.
fn referenced_tables(bound: &[ColumnRef]) -> Vec<TableKey> {
    let mut tables: Vec<TableKey> = Vec::new();
    for column in bound {
        let key = column.table_key();
        if !tables.contains(&key) {
            tables.push(key);
        }
    }
    tables
}

/// Foreign-key edges declared on `from` that point at `to`.
///
/// Catalog metadata is consulted first; references carried on the bound
/// columns themselves fill in tables the catalog does not describe.
fn edges_from(from: &TableKey, to: &TableKey, bound: &[ColumnRef], catalog: &[TableSchema]) -> Vec<JoinEdge> {
    let columns: Vec<ColumnRef> = match find_table(catalog, from) {
        Some(table) => table.column_refs(),
        None => bound
            .iter()
            .filter(|c| c.table_key() == *from)
            .cloned()
            .collect(),
    };

    let mut edges = Vec::new();
    for column in columns {
        let Some(fk) = &column.reference else {
            continue;
        };
        if fk.foreign_schema != to.schema || fk.foreign_table != to.table {
            continue;
        }
        let edge = JoinEdge {
            from: from.clone(),
            from_column: column.column.clone(),
            to: to.clone(),
            to_column: fk.foreign_column.clone(),
        };
        if !edges.contains(&edge) {
            edges.push(edge);
        }
    }
    edges
}

/// Build a `SELECT` for the given bound columns.
///
/// Returns `Ok(None)` when nothing is bound. With a single table the select
/// list uses bare column names. With several tables the columns are fully
/// qualified, aliased by [`ColumnRef::result_key`], and the tables are chained with `JOIN ... ON` clauses derived
/// from foreign-key metadata. Each table appears exactly once in the
/// FROM/JOIN chain. A table with no foreign-key path to the others is a
/// validation error.
pub fn synthesize(bound: &[ColumnRef], catalog: &[TableSchema]) -> Result<Option<String>, CoreError> {
    let tables = referenced_tables(bound);
    let Some(base) = tables.first() else {
        return Ok(None);
    };

    if tables.len() == 1 {
        let select = bound
            .iter()
            .map(|c| quote_ident(&c.column))
            .collect::<Vec<_>>()
            .join(", ");
        return Ok(Some(format!("SELECT {select} FROM {}", qualified_table(base))));
    }

    let select = bound
        .iter()
        .map(|c| {
            format!(
                "{} AS {}",
                qualified_column(&c.table_key(), &c.column),
                quote_ident(&c.result_key(true)),
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    let mut joined: Vec<TableKey> = vec![base.clone()];
    let mut clauses: Vec<String> = Vec::new();

    // Repeat over every unordered pair until no new table can be attached,
    // so a table listed before its join partner still gets connected.
    loop {
        let mut progressed = false;
        for (i, a) in tables.iter().enumerate() {
            for b in &tables[i + 1..] {
                let mut edges = edges_from(a, b, bound, catalog);
                edges.extend(edges_from(b, a, bound, catalog));

                for edge in edges {
                    let from_joined = joined.contains(&edge.from);
                    let to_joined = joined.contains(&edge.to);
                    let newcomer = match (from_joined, to_joined) {
                        (true, false) => edge.to.clone(),
                        (false, true) => edge.from.clone(),
                        _ => continue,
                    };
                    clauses.push(format!(
                        "JOIN {} ON {} = {}",
                        qualified_table(&newcomer),
                        qualified_column(&edge.from, &edge.from_column),
                        qualified_column(&edge.to, &edge.to_column),
                    ));
                    joined.push(newcomer);
                    progressed = true;
                }
            }
        }
        if !progressed {
            break;
        }
    }

    if let Some(orphan) = tables.iter().find(|t| !joined.contains(t)) {
        return Err(CoreError::Validation(format!(
            "Table {orphan} has no foreign-key path to the other selected tables"
        )));
    }

    let mut sql = format!("SELECT {select} FROM {}", qualified_table(base));
    for clause in clauses {
        sql.push(' ');
        sql.push_str(&clause);
    }
    Ok(Some(sql))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
