//! Widget model: one chart or text block placed on a dashboard canvas.
//!
//! A [`Widget`] carries only persistent state. Interaction state (dragging,
//! resizing, editing columns) is owned by the canvas so that at most one
//! widget can be in an interaction at a time.

use serde::{Deserialize, Serialize};

use crate::columns::{ColumnRef, ColumnRole, TableKey};
use crate::dataset::DataPoint;
use crate::error::CoreError;
use crate::geometry::{Dimensions, Point};
use crate::types::WidgetId;

/// Message shown when a foreign-key column would duplicate a join path.
pub const JOIN_PATH_REJECTION: &str = "column can not be added to the data model";

// ---------------------------------------------------------------------------
// Chart types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Table,
    Pie,
    Donut,
    VerticalBar,
    HorizontalBar,
    VerticalBarLine,
    StackedBar,
    Multiline,
    Heatmap,
    Bubble,
    StackedArea,
    Map,
    TextBlock,
}

impl ChartType {
    pub const ALL: &'static [ChartType] = &[
        ChartType::Table,
        ChartType::Pie,
        ChartType::Donut,
        ChartType::VerticalBar,
        ChartType::HorizontalBar,
        ChartType::VerticalBarLine,
        ChartType::StackedBar,
        ChartType::Multiline,
        ChartType::Heatmap,
        ChartType::Bubble,
        ChartType::StackedArea,
        ChartType::Map,
        ChartType::TextBlock,
    ];

    /// Text blocks hold free text and never bind columns.
    pub fn binds_columns(self) -> bool {
        self != ChartType::TextBlock
    }
}

// ---------------------------------------------------------------------------
// Widget
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: WidgetId,
    pub chart_type: ChartType,
    #[serde(default)]
    bound_columns: Vec<ColumnRef>,
    #[serde(default)]
    pub dataset: Vec<DataPoint>,
    pub dimensions: Dimensions,
    pub location: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis_label: Option<String>,
}

impl Widget {
    /// A new widget with default dimensions at the canvas origin.
    pub fn new(id: WidgetId, chart_type: ChartType) -> Self {
        Self {
            id,
            chart_type,
            bound_columns: Vec::new(),
            dataset: Vec::new(),
            dimensions: Dimensions::default(),
            location: Point::ORIGIN,
            text_content: (chart_type == ChartType::TextBlock).then(String::new),
            x_axis_label: None,
            y_axis_label: None,
        }
    }

    pub fn bound_columns(&self) -> &[ColumnRef] {
        &self.bound_columns
    }

    pub fn text_content(&self) -> Option<&str> {
        self.text_content.as_deref()
    }

    /// Bind a column to this widget.
    ///
    /// Returns `Ok(true)` when the column was appended and `Ok(false)` when
    /// the (table, column) pair was already bound. Foreign-key columns that
    /// are already represented through a join path are rejected, in either
    /// direction, as are binds on text blocks.
    pub fn bind_column(&mut self, column: ColumnRef) -> Result<bool, CoreError> {
        if !self.chart_type.binds_columns() {
            return Err(CoreError::Validation(
                "Text blocks can not display columns".to_string(),
            ));
        }

        if self
            .bound_columns
            .iter()
            .any(|c| c.same_column(&column.table, &column.column))
        {
            return Ok(false);
        }

        if let Some(fk) = &column.reference {
            let target_bound = self
                .bound_columns
                .iter()
                .any(|c| c.schema == fk.foreign_schema && c.table == fk.foreign_table);
            if target_bound {
                return Err(CoreError::Validation(JOIN_PATH_REJECTION.to_string()));
            }
        }

        let referenced_by_bound = self.bound_columns.iter().any(|c| {
            c.reference.as_ref().is_some_and(|fk| {
                fk.foreign_schema == column.schema
                    && fk.foreign_table == column.table
                    && fk.foreign_column == column.column
            })
        });
        if referenced_by_bound {
            return Err(CoreError::Validation(JOIN_PATH_REJECTION.to_string()));
        }

        self.bound_columns.push(column);
        Ok(true)
    }

    /// Remove every bound entry matching (table, column). Returns how many
    /// entries were removed.
    pub fn unbind_column(&mut self, table: &str, column: &str) -> usize {
        let before = self.bound_columns.len();
        self.bound_columns.retain(|c| !c.same_column(table, column));
        before - self.bound_columns.len()
    }

    /// Distinct tables referenced by the bound columns, in first-seen order.
    pub fn tables(&self) -> Vec<TableKey> {
        let mut tables: Vec<TableKey> = Vec::new();
        for column in &self.bound_columns {
            let key = column.table_key();
            if !tables.contains(&key) {
                tables.push(key);
            }
        }
        tables
    }

    /// `true` once at least one label and one numeric column are bound.
    pub fn has_chartable_pair(&self) -> bool {
        let roles: Vec<ColumnRole> = self.bound_columns.iter().filter_map(|c| c.role()).collect();
        roles.contains(&ColumnRole::Label) && roles.contains(&ColumnRole::Numeric)
    }

    /// Replace the body of a text block.
    pub fn set_text(&mut self, content: impl Into<String>) -> Result<(), CoreError> {
        if self.chart_type != ChartType::TextBlock {
            return Err(CoreError::Validation(
                "Only text blocks carry text content".to_string(),
            ));
        }
        self.text_content = Some(content.into());
        Ok(())
    }

    /// Axis titles emitted back by the chart renderer.
    pub fn set_axis_labels(&mut self, x: Option<String>, y: Option<String>) {
        self.x_axis_label = x;
        self.y_axis_label = y;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
