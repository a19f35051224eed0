//! Canvas controller: the widget collection of one dashboard.
//!
//! [`Canvas`] enforces the widget cap, keeps widget ids unique for the
//! lifetime of the canvas, owns the single active interaction, and re-runs
//! query synthesis whenever a widget's bound columns change.

use std::collections::HashMap;

use crate::columns::{ColumnRef, TableSchema};
use crate::error::CoreError;
use crate::geometry::{self, Handle, Point, ResizeSession, Size};
use crate::interaction::{ActiveInteraction, InteractionMode, InteractionState, ModeKind};
use crate::layout::DashboardLayout;
use crate::query;
use crate::types::WidgetId;
use crate::widget::{ChartType, Widget};

/// Maximum number of widgets on one dashboard.
pub const MAX_WIDGETS: usize = 5;

/// Canvas size used when the embedding UI does not report one.
pub const DEFAULT_CANVAS_SIZE: Size = Size {
    width: 1200.0,
    height: 800.0,
};

/// Result of binding a column to a widget.
#[derive(Debug, Clone, PartialEq)]
pub struct BindOutcome {
    /// `false` when the column was already bound.
    pub added: bool,
    /// The widget's freshly synthesized query.
    pub query: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Canvas {
    pub(crate) bounds: Size,
    pub(crate) widgets: Vec<Widget>,
    pub(crate) next_id: WidgetId,
    pub(crate) selected: Option<WidgetId>,
    pub(crate) active: Option<ActiveInteraction>,
    /// Latest query sequence number issued per widget.
    pub(crate) sequences: HashMap<WidgetId, u64>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_SIZE)
    }
}

impl Canvas {
    /// An empty canvas, as shown on the "create dashboard" page.
    pub fn new(bounds: Size) -> Self {
        Self {
            bounds,
            widgets: Vec::new(),
            next_id: 1,
            selected: None,
            active: None,
            sequences: HashMap::new(),
        }
    }

    /// Rebuild a canvas from a persisted layout ("edit dashboard").
    ///
    /// New widgets continue numbering after the highest persisted id.
    /// Widgets saved outside `bounds` are pulled back inside, the same way a
    /// drag is clamped.
    pub fn hydrate(bounds: Size, layout: DashboardLayout) -> Result<Self, CoreError> {
        layout.validate()?;
        let next_id = layout.widgets.iter().map(|w| w.id).max().unwrap_or(0) + 1;
        let mut widgets = layout.widgets;
        for widget in &mut widgets {
            widget.location = geometry::drag(
                widget.location,
                Point::ORIGIN,
                bounds,
                widget.dimensions.frame,
            );
        }
        Ok(Self {
            widgets,
            next_id,
            ..Self::new(bounds)
        })
    }

    /// Serialize the arrangement for persistence. Interaction state is not
    /// part of the snapshot.
    pub fn snapshot(&self, name: impl Into<String>) -> DashboardLayout {
        DashboardLayout {
            name: name.into(),
            widgets: self.widgets.clone(),
        }
    }

    pub fn bounds(&self) -> Size {
        self.bounds
    }

    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    pub fn widget(&self, id: WidgetId) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub(crate) fn widget_mut(&mut self, id: WidgetId) -> Result<&mut Widget, CoreError> {
        self.widgets
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or(CoreError::widget_not_found(id))
    }

    fn ensure_exists(&self, id: WidgetId) -> Result<(), CoreError> {
        self.widget(id)
            .map(|_| ())
            .ok_or(CoreError::widget_not_found(id))
    }

    // -----------------------------------------------------------------------
    // Widget CRUD
    // -----------------------------------------------------------------------

    /// Append a new widget of `chart_type` with default size at the origin.
    ///
    /// Every other widget is returned to idle first.
    pub fn add_widget(&mut self, chart_type: ChartType) -> Result<WidgetId, CoreError> {
        if self.widgets.len() >= MAX_WIDGETS {
            return Err(CoreError::Validation(format!(
                "A dashboard can hold at most {MAX_WIDGETS} widgets"
            )));
        }

        let id = self.next_id;
        self.next_id += 1;
        self.clear_interaction();
        self.widgets.push(Widget::new(id, chart_type));
        Ok(id)
    }

    /// Remove a widget, clearing the selection and interaction it held.
    pub fn delete_widget(&mut self, id: WidgetId) -> Result<Widget, CoreError> {
        let index = self
            .widgets
            .iter()
            .position(|w| w.id == id)
            .ok_or(CoreError::widget_not_found(id))?;

        if self.selected == Some(id) {
            self.selected = None;
        }
        if self.active.is_some_and(|a| a.widget == id) {
            self.active = None;
        }
        self.sequences.remove(&id);
        Ok(self.widgets.remove(index))
    }

    pub fn selected(&self) -> Option<WidgetId> {
        self.selected
    }

    pub fn select(&mut self, id: WidgetId) -> Result<(), CoreError> {
        self.ensure_exists(id)?;
        self.selected = Some(id);
        Ok(())
    }

    pub fn set_text(&mut self, id: WidgetId, content: impl Into<String>) -> Result<(), CoreError> {
        self.widget_mut(id)?.set_text(content)
    }

    pub fn set_axis_labels(
        &mut self,
        id: WidgetId,
        x: Option<String>,
        y: Option<String>,
    ) -> Result<(), CoreError> {
        self.widget_mut(id)?.set_axis_labels(x, y);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Interaction modes
    // -----------------------------------------------------------------------

    pub fn mode_of(&self, id: WidgetId) -> InteractionMode {
        match self.active {
            Some(active) if active.widget == id => active.state.mode(),
            _ => InteractionMode::None,
        }
    }

    /// The widget currently in a non-idle mode, if any.
    pub fn active_widget(&self) -> Option<WidgetId> {
        self.active.map(|a| a.widget)
    }

    pub fn clear_interaction(&mut self) {
        self.active = None;
    }

    /// Switch `mode` on for `id`, returning every other widget to idle.
    /// Toggling the mode that is already on turns it off.
    pub fn toggle_mode(&mut self, id: WidgetId, mode: ModeKind) -> Result<InteractionMode, CoreError> {
        self.ensure_exists(id)?;

        let already_on = self
            .active
            .is_some_and(|a| a.widget == id && a.state.kind() == mode);
        self.active = if already_on {
            None
        } else {
            Some(ActiveInteraction {
                widget: id,
                state: InteractionState::armed(mode),
            })
        };
        Ok(self.mode_of(id))
    }

    /// Start dragging `id` with the pointer at `pointer`.
    pub fn begin_drag(&mut self, id: WidgetId, pointer: Point) -> Result<(), CoreError> {
        let location = self
            .widget(id)
            .ok_or(CoreError::widget_not_found(id))?
            .location;
        self.selected = Some(id);
        self.active = Some(ActiveInteraction {
            widget: id,
            state: InteractionState::Dragging {
                grab_offset: Some(pointer.delta_from(location)),
            },
        });
        Ok(())
    }

    /// Start resizing `id` from `handle`. The opposite corner is pinned here.
    pub fn begin_resize(
        &mut self,
        id: WidgetId,
        handle: Handle,
        pointer: Point,
        intrinsic_height: f64,
    ) -> Result<(), CoreError> {
        let widget = self.widget(id).ok_or(CoreError::widget_not_found(id))?;
        let session = ResizeSession::start(
            handle,
            pointer,
            widget.location,
            widget.dimensions,
            intrinsic_height,
        );
        self.selected = Some(id);
        self.active = Some(ActiveInteraction {
            widget: id,
            state: InteractionState::Resizing {
                session: Some(session),
            },
        });
        Ok(())
    }

    /// Apply a pointer move to the active session. Returns the widget that
    /// changed, or `None` when no pointer session is live.
    pub fn pointer_move(&mut self, pointer: Point) -> Option<WidgetId> {
        let active = self.active?;
        let bounds = self.bounds;
        let widget = self.widgets.iter_mut().find(|w| w.id == active.widget)?;

        match active.state {
            InteractionState::Dragging {
                grab_offset: Some(offset),
            } => {
                widget.location = geometry::drag(pointer, offset, bounds, widget.dimensions.frame);
            }
            InteractionState::Resizing {
                session: Some(session),
            } => {
                let (location, dimensions) = session.update(pointer, bounds);
                widget.location = location;
                widget.dimensions = dimensions;
            }
            _ => return None,
        }
        Some(active.widget)
    }

    /// End the live pointer session, returning its widget to idle.
    ///
    /// Modes armed from the toolbar without a pointer session, and column
    /// editing, are not affected.
    pub fn pointer_up(&mut self) -> Option<WidgetId> {
        let active = self.active?;
        if !active.state.has_pointer_session() {
            return None;
        }
        self.active = None;
        Some(active.widget)
    }

    // -----------------------------------------------------------------------
    // Column binding
    // -----------------------------------------------------------------------

    /// Bind `column` to widget `id` and re-synthesize its query.
    ///
    /// If the new column makes the query impossible to build, the bind is
    /// undone and the error returned, leaving the widget unchanged.
    pub fn bind_column(
        &mut self,
        id: WidgetId,
        column: ColumnRef,
        catalog: &[TableSchema],
    ) -> Result<BindOutcome, CoreError> {
        let (table, name) = (column.table.clone(), column.column.clone());
        let widget = self.widget_mut(id)?;
        let added = widget.bind_column(column)?;

        match query::synthesize(widget.bound_columns(), catalog) {
            Ok(query) => Ok(BindOutcome { added, query }),
            Err(err) => {
                if added {
                    widget.unbind_column(&table, &name);
                }
                Err(err)
            }
        }
    }

    /// Unbind (table, column) from widget `id` and re-synthesize its query.
    ///
    /// The query is built from the remaining columns first. If removing the
    /// column would strand a table with no join path, the error is returned
    /// and the widget keeps every column it had.
    pub fn unbind_column(
        &mut self,
        id: WidgetId,
        table: &str,
        column: &str,
        catalog: &[TableSchema],
    ) -> Result<Option<String>, CoreError> {
        let widget = self.widget_mut(id)?;
        let remaining: Vec<ColumnRef> = widget
            .bound_columns()
            .iter()
            .filter(|c| !c.same_column(table, column))
            .cloned()
            .collect();
        let query = query::synthesize(&remaining, catalog)?;
        widget.unbind_column(table, column);
        Ok(query)
    }

    /// The query widget `id` would run right now.
    pub fn query_for(&self, id: WidgetId, catalog: &[TableSchema]) -> Result<Option<String>, CoreError> {
        let widget = self.widget(id).ok_or(CoreError::widget_not_found(id))?;
        query::synthesize(widget.bound_columns(), catalog)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
