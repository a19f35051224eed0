//! Persisted dashboard layout.
//!
//! The layout is what the persistence collaborator stores: widgets with
//! their geometry, bound columns, last dataset, and text. Interaction state
//! never appears here.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::canvas::MAX_WIDGETS;
use crate::error::CoreError;
use crate::widget::Widget;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardLayout {
    pub name: String,
    #[serde(default)]
    pub widgets: Vec<Widget>,
}

impl DashboardLayout {
    /// Check the invariants a canvas relies on before hydrating.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation(
                "Dashboard name must not be empty".to_string(),
            ));
        }
        if self.widgets.len() > MAX_WIDGETS {
            return Err(CoreError::Validation(format!(
                "Dashboard has {} widgets, exceeding the maximum of {MAX_WIDGETS}",
                self.widgets.len()
            )));
        }
        let mut seen = HashSet::new();
        for widget in &self.widgets {
            if !seen.insert(widget.id) {
                return Err(CoreError::Conflict(format!(
                    "Widget id {} appears more than once",
                    widget.id
                )));
            }
            if widget.chart_type.binds_columns() {
                if widget.text_content().is_some() {
                    return Err(CoreError::Validation(format!(
                        "Widget {} is a chart and can not hold text",
                        widget.id
                    )));
                }
            } else if !widget.bound_columns().is_empty() {
                return Err(CoreError::Validation(format!(
                    "Widget {} is a text block and can not display columns",
                    widget.id
                )));
            }
        }
        Ok(())
    }
}
