//! Interaction state and pointer-event routing for the canvas.
//!
//! The canvas holds at most one [`ActiveInteraction`]; every other widget is
//! implicitly idle. Pointer events come from an injected source (a browser
//! bridge, a test vector...) and are routed through [`Canvas::dispatch`], so
//! there is exactly one owner of move/up handling for the whole canvas.

use serde::{Deserialize, Serialize};

use crate::canvas::Canvas;
use crate::error::CoreError;
use crate::geometry::{Handle, Point, ResizeSession};
use crate::types::WidgetId;

// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

/// The observable interaction mode of one widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    #[default]
    None,
    Dragging,
    Resizing,
    EditingColumns,
}

/// A mode a user can switch on from the widget toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    Dragging,
    Resizing,
    EditingColumns,
}

/// Per-widget interaction state. A mode can be armed from the toolbar
/// without a pointer being down yet, hence the optional sessions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionState {
    Dragging { grab_offset: Option<Point> },
    Resizing { session: Option<ResizeSession> },
    EditingColumns,
}

impl InteractionState {
    pub fn armed(kind: ModeKind) -> Self {
        match kind {
            ModeKind::Dragging => Self::Dragging { grab_offset: None },
            ModeKind::Resizing => Self::Resizing { session: None },
            ModeKind::EditingColumns => Self::EditingColumns,
        }
    }

    pub fn kind(&self) -> ModeKind {
        match self {
            Self::Dragging { .. } => ModeKind::Dragging,
            Self::Resizing { .. } => ModeKind::Resizing,
            Self::EditingColumns => ModeKind::EditingColumns,
        }
    }

    pub fn mode(&self) -> InteractionMode {
        match self {
            Self::Dragging { .. } => InteractionMode::Dragging,
            Self::Resizing { .. } => InteractionMode::Resizing,
            Self::EditingColumns => InteractionMode::EditingColumns,
        }
    }

    /// `true` while a pointer is held down on the widget.
    pub fn has_pointer_session(&self) -> bool {
        matches!(
            self,
            Self::Dragging {
                grab_offset: Some(_)
            } | Self::Resizing { session: Some(_) }
        )
    }
}

/// The single widget currently in a non-idle mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveInteraction {
    pub widget: WidgetId,
    pub state: InteractionState,
}

// ---------------------------------------------------------------------------
// Pointer events
// ---------------------------------------------------------------------------

/// Which part of a widget a pointer went down on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "handle", rename_all = "snake_case")]
pub enum PointerTarget {
    Body,
    Handle(Handle),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Down {
        widget: WidgetId,
        target: PointerTarget,
        position: Point,
        /// Rendered height of the widget's chart, used as the resize floor.
        #[serde(default)]
        intrinsic_height: f64,
    },
    Move {
        position: Point,
    },
    Up {
        position: Point,
    },
}

impl Canvas {
    /// Route one pointer event.
    ///
    /// A `Down` on a widget armed for dragging (body) or resizing (handle)
    /// starts a pointer session; a `Down` anywhere else returns every other
    /// widget to idle and selects the target. `Move` and `Up` act on the
    /// active session, if any. Returns the widget whose geometry or mode
    /// changed.
    pub fn dispatch(&mut self, event: PointerEvent) -> Result<Option<WidgetId>, CoreError> {
        match event {
            PointerEvent::Down {
                widget,
                target,
                position,
                intrinsic_height,
            } => {
                let armed = self.active_for(widget).map(|a| a.state.kind());
                match (target, armed) {
                    (PointerTarget::Body, Some(ModeKind::Dragging)) => {
                        self.begin_drag(widget, position)?;
                    }
                    (PointerTarget::Handle(handle), Some(ModeKind::Resizing)) => {
                        self.begin_resize(widget, handle, position, intrinsic_height)?;
                    }
                    _ => {
                        self.select(widget)?;
                        if armed.is_none() {
                            self.clear_interaction();
                        }
                    }
                }
                Ok(Some(widget))
            }
            PointerEvent::Move { position } => Ok(self.pointer_move(position)),
            PointerEvent::Up { position } => {
                self.pointer_move(position);
                Ok(self.pointer_up())
            }
        }
    }

    /// Route every event from `source` in order, stopping at the first error.
    pub fn dispatch_all(
        &mut self,
        source: impl IntoIterator<Item = PointerEvent>,
    ) -> Result<(), CoreError> {
        for event in source {
            self.dispatch(event)?;
        }
        Ok(())
    }

    fn active_for(&self, id: WidgetId) -> Option<&ActiveInteraction> {
        self.active.as_ref().filter(|a| a.widget == id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
