//! Column descriptors for synced data-source tables.
//!
//! [`TableSchema`] is the shape returned by the available-tables provider;
//! [`ColumnRef`] is the flattened, immutable descriptor a widget binds to.
//! Declared SQL types map onto chart roles via [`classify_data_type`].

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Declared type sets
// ---------------------------------------------------------------------------

/// Declared types whose values are used as chart labels.
pub const LABEL_TYPES: &[&str] = &[
    "character varying",
    "varchar",
    "character",
    "char",
    "bpchar",
    "text",
    "USER-DEFINED",
];

/// Declared types whose values are plotted as numbers.
pub const NUMERIC_TYPES: &[&str] = &[
    "smallint",
    "bigint",
    "integer",
    "numeric",
    "decimal",
    "real",
    "double precision",
    "smallserial",
    "serial",
    "bigserial",
];

/// The charting role a column plays, derived from its declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Label,
    Numeric,
}

/// Map a declared SQL type onto a chart role.
///
/// Returns `None` for types that are not charted (dates, booleans, json...).
pub fn classify_data_type(data_type: &str) -> Option<ColumnRole> {
    let data_type = data_type.trim();
    if LABEL_TYPES.iter().any(|t| t.eq_ignore_ascii_case(data_type)) {
        Some(ColumnRole::Label)
    } else if NUMERIC_TYPES.iter().any(|t| t.eq_ignore_ascii_case(data_type)) {
        Some(ColumnRole::Numeric)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// Foreign-key metadata attached to a column by the table provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    pub foreign_schema: String,
    pub foreign_table: String,
    pub foreign_column: String,
}

/// A column a widget can bind to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub schema: String,
    pub table: String,
    pub column: String,
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ForeignKeyRef>,
}

impl ColumnRef {
    pub fn new(
        schema: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
        data_type: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            column: column.into(),
            data_type: data_type.into(),
            reference: None,
        }
    }

    pub fn with_reference(
        mut self,
        foreign_schema: impl Into<String>,
        foreign_table: impl Into<String>,
        foreign_column: impl Into<String>,
    ) -> Self {
        self.reference = Some(ForeignKeyRef {
            foreign_schema: foreign_schema.into(),
            foreign_table: foreign_table.into(),
            foreign_column: foreign_column.into(),
        });
        self
    }

    /// Identity used for de-duplication: the (table, column) pair.
    pub fn same_column(&self, table: &str, column: &str) -> bool {
        self.table == table && self.column == column
    }

    pub fn table_key(&self) -> TableKey {
        TableKey {
            schema: self.schema.clone(),
            table: self.table.clone(),
        }
    }

    pub fn role(&self) -> Option<ColumnRole> {
        classify_data_type(&self.data_type)
    }

    /// Key of this column's cell in a result row.
    ///
    /// Single-table selects return bare column names. Joined selects alias
    /// each column as `schema.table.column`, so same-named columns from
    /// different tables stay apart.
    pub fn result_key(&self, joined: bool) -> String {
        if joined {
            format!("{}.{}.{}", self.schema, self.table, self.column)
        } else {
            self.column.clone()
        }
    }
}

/// Whether `bound` draws from more than one table.
pub fn spans_tables(bound: &[ColumnRef]) -> bool {
    bound.split_first().is_some_and(|(first, rest)| {
        rest.iter()
            .any(|c| c.schema != first.schema || c.table != first.table)
    })
}

/// A schema-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableKey {
    pub schema: String,
    pub table: String,
}

impl TableKey {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }
}

impl std::fmt::Display for TableKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// One column as described by the available-tables provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub column_name: String,
    pub data_type: String,
    #[serde(default)]
    pub reference: Option<ForeignKeyRef>,
}

/// One synced table with its columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub schema: String,
    pub table_name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn key(&self) -> TableKey {
        TableKey::new(&self.schema, &self.table_name)
    }

    /// Flatten this table into bindable column descriptors.
    pub fn column_refs(&self) -> Vec<ColumnRef> {
        self.columns
            .iter()
            .map(|c| ColumnRef {
                schema: self.schema.clone(),
                table: self.table_name.clone(),
                column: c.column_name.clone(),
                data_type: c.data_type.clone(),
                reference: c.reference.clone(),
            })
            .collect()
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<ColumnRef> {
        self.column_refs().into_iter().find(|c| c.column == name)
    }
}

/// Find the schema of `key` in a catalog.
pub fn find_table<'a>(catalog: &'a [TableSchema], key: &TableKey) -> Option<&'a TableSchema> {
    catalog
        .iter()
        .find(|t| t.schema == key.schema && t.table_name == key.table)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
