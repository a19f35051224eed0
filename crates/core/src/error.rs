use crate::types::WidgetId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: WidgetId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a missing widget on the canvas.
    pub fn widget_not_found(id: WidgetId) -> Self {
        Self::NotFound {
            entity: "widget",
            id,
        }
    }

    /// Message suitable for showing the user in an alert or toast.
    ///
    /// Validation messages are shown verbatim; everything else is reduced
    /// to a generic sentence.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::Conflict(msg) => msg.clone(),
            Self::NotFound { entity, .. } => format!("The selected {entity} no longer exists"),
            Self::Internal(_) => "Something went wrong, please try again".to_string(),
        }
    }
}
