//! User-facing notices emitted by the dashboard session.
//!
//! [`NoticeBus`] wraps a `tokio::sync::broadcast` channel. The UI layer
//! subscribes and renders alerts as blocking dialogs and the other levels as
//! toasts.

use serde::Serialize;
use tokio::sync::broadcast;

use chartboard_core::types::WidgetId;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Rejected user input; shown as a blocking dialog.
    Alert,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Widget the notice is about, if any.
    pub widget_id: Option<WidgetId>,
}

impl Notice {
    pub fn alert(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Alert,
            message: message.into(),
            widget_id: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
            widget_id: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            widget_id: None,
        }
    }

    pub fn for_widget(mut self, id: WidgetId) -> Self {
        self.widget_id = Some(id);
        self
    }
}

/// In-process fan-out of [`Notice`]s.
pub struct NoticeBus {
    sender: broadcast::Sender<Notice>,
}

impl NoticeBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a notice. Dropped silently when nobody is listening.
    pub fn publish(&self, notice: Notice) {
        let _ = self.sender.send(notice);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }
}

impl Default for NoticeBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
