//! Canvas geometry: drag clamping and corner-handle resizing.
//!
//! Everything here is pure coordinate math. The canvas controller owns the
//! widget state and writes the results back; nothing in this module touches
//! a widget directly.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Space kept free at the bottom of the canvas so widgets never slide
/// underneath the canvas chrome.
pub const RESERVED_BOTTOM_MARGIN: f64 = 50.0;

/// Padding added on top of a chart's rendered height when computing the
/// minimum content height during a resize.
pub const CONTENT_PADDING: f64 = 50.0;

/// Narrowest content area a resize may produce.
pub const MIN_CONTENT_WIDTH: f64 = 100.0;

/// Frame and content edge length of a freshly added widget.
pub const DEFAULT_WIDGET_EDGE: f64 = 200.0;

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

/// A position on the canvas, in pixels from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Vector from `origin` to `self`.
    pub fn delta_from(self, origin: Point) -> Point {
        Point::new(self.x - origin.x, self.y - origin.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Outer frame and inner content area of a widget.
///
/// The two are tracked separately because the content area must never
/// shrink below the size its chart actually renders at, while the frame
/// carries the border/header chrome around it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub frame: Size,
    pub content: Size,
}

impl Dimensions {
    pub fn square(edge: f64) -> Self {
        Self {
            frame: Size::new(edge, edge),
            content: Size::new(edge, edge),
        }
    }

    /// Width and height the frame adds around the content.
    pub fn chrome(&self) -> Size {
        Size::new(
            (self.frame.width - self.content.width).max(0.0),
            (self.frame.height - self.content.height).max(0.0),
        )
    }

    fn from_content(content: Size, chrome: Size) -> Self {
        Self {
            frame: Size::new(content.width + chrome.width, content.height + chrome.height),
            content,
        }
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::square(DEFAULT_WIDGET_EDGE)
    }
}

// ---------------------------------------------------------------------------
// Resize handles
// ---------------------------------------------------------------------------

/// The four corner handles of a widget frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Handle {
    pub const ALL: [Handle; 4] = [
        Handle::TopLeft,
        Handle::TopRight,
        Handle::BottomLeft,
        Handle::BottomRight,
    ];

    /// Multipliers applied to the pointer delta `(dx, dy)` to get the
    /// width and height growth for this handle.
    pub fn signs(self) -> (f64, f64) {
        match self {
            Handle::TopLeft => (-1.0, -1.0),
            Handle::TopRight => (1.0, -1.0),
            Handle::BottomLeft => (-1.0, 1.0),
            Handle::BottomRight => (1.0, 1.0),
        }
    }

    /// The corner that stays fixed while this handle is dragged.
    pub fn opposite(self) -> Handle {
        match self {
            Handle::TopLeft => Handle::BottomRight,
            Handle::TopRight => Handle::BottomLeft,
            Handle::BottomLeft => Handle::TopRight,
            Handle::BottomRight => Handle::TopLeft,
        }
    }

    /// `true` when the frame grows towards the left edge of the canvas.
    fn grows_left(self) -> bool {
        matches!(self, Handle::TopLeft | Handle::BottomLeft)
    }

    /// `true` when the frame grows towards the top edge of the canvas.
    fn grows_up(self) -> bool {
        matches!(self, Handle::TopLeft | Handle::TopRight)
    }

    /// Position of this corner on a frame at `location` with `size`.
    pub fn corner_of(self, location: Point, size: Size) -> Point {
        match self {
            Handle::TopLeft => location,
            Handle::TopRight => Point::new(location.x + size.width, location.y),
            Handle::BottomLeft => Point::new(location.x, location.y + size.height),
            Handle::BottomRight => {
                Point::new(location.x + size.width, location.y + size.height)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Drag
// ---------------------------------------------------------------------------

/// Compute the new top-left of a dragged widget.
///
/// `grab_offset` is the pointer position relative to the widget's top-left
/// captured when the drag started. The result keeps the whole frame inside
/// the canvas, leaving [`RESERVED_BOTTOM_MARGIN`] free at the bottom. When
/// the widget is larger than the canvas it is pinned at 0 on that axis.
pub fn drag(pointer: Point, grab_offset: Point, canvas: Size, widget: Size) -> Point {
    let max_x = (canvas.width - widget.width).max(0.0);
    let max_y = (canvas.height - widget.height - RESERVED_BOTTOM_MARGIN).max(0.0);

    Point::new(
        (pointer.x - grab_offset.x).clamp(0.0, max_x),
        (pointer.y - grab_offset.y).clamp(0.0, max_y),
    )
}

// ---------------------------------------------------------------------------
// Resize
// ---------------------------------------------------------------------------

/// Smallest content height allowed for a chart rendered at `intrinsic_height`.
pub fn min_content_height(intrinsic_height: f64) -> f64 {
    intrinsic_height.max(0.0) + CONTENT_PADDING
}

/// Apply a pointer delta to a widget's initial dimensions for `handle`.
///
/// Growth is applied to the content area; the frame keeps the chrome it had
/// when the resize started. Content height never drops below
/// [`min_content_height`] and content width never below
/// [`MIN_CONTENT_WIDTH`].
pub fn resize(handle: Handle, delta: Point, initial: Dimensions, intrinsic_height: f64) -> Dimensions {
    let (sx, sy) = handle.signs();
    let content = Size::new(
        (initial.content.width + sx * delta.x).max(MIN_CONTENT_WIDTH),
        (initial.content.height + sy * delta.y).max(min_content_height(intrinsic_height)),
    );
    Dimensions::from_content(content, initial.chrome())
}

/// State captured when a resize starts.
///
/// The corner opposite the active handle is pinned here exactly once;
/// every subsequent pointer move recomputes the frame's top-left from that
/// pinned corner, so the widget grows away from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeSession {
    pub handle: Handle,
    pub pointer_origin: Point,
    pub initial: Dimensions,
    pub pinned: Point,
    pub intrinsic_height: f64,
}

impl ResizeSession {
    pub fn start(
        handle: Handle,
        pointer: Point,
        location: Point,
        initial: Dimensions,
        intrinsic_height: f64,
    ) -> Self {
        Self {
            handle,
            pointer_origin: pointer,
            initial,
            pinned: handle.opposite().corner_of(location, initial.frame),
            intrinsic_height,
        }
    }

    /// New location and dimensions for the current pointer position.
    ///
    /// The frame is limited to the room between the pinned corner and the
    /// canvas edge it grows towards, but the content floors still win.
    pub fn update(&self, pointer: Point, canvas: Size) -> (Point, Dimensions) {
        let delta = pointer.delta_from(self.pointer_origin);
        let dims = resize(self.handle, delta, self.initial, self.intrinsic_height);
        let chrome = dims.chrome();

        let room_w = if self.handle.grows_left() {
            self.pinned.x
        } else {
            canvas.width - self.pinned.x
        };
        let room_h = if self.handle.grows_up() {
            self.pinned.y
        } else {
            canvas.height - RESERVED_BOTTOM_MARGIN - self.pinned.y
        };

        let mut content = dims.content;
        if dims.frame.width > room_w {
            content.width = (room_w - chrome.width).max(MIN_CONTENT_WIDTH);
        }
        if dims.frame.height > room_h {
            content.height =
                (room_h - chrome.height).max(min_content_height(self.intrinsic_height));
        }
        let dims = Dimensions::from_content(content, chrome);

        let x = if self.handle.grows_left() {
            self.pinned.x - dims.frame.width
        } else {
            self.pinned.x
        };
        let y = if self.handle.grows_up() {
            self.pinned.y - dims.frame.height
        } else {
            self.pinned.y
        };

        (Point::new(x.max(0.0), y.max(0.0)), dims)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
