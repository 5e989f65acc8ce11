//! Pointer-interaction state and screen/diagram coordinate mapping.

use std::fmt;

use crate::history::Geometry;
use crate::model::{ElementId, Position, Rect, RelationshipId, RelationshipType, Size};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    /// Cmd on macOS, Ctrl elsewhere.
    pub command: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        command: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };
}

/// What the pointer is over when an event fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerTarget {
    Canvas,
    Element(ElementId),
    Handle(ElementId, ResizeHandle),
    Relationship(RelationshipId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResizeHandle {
    NW,
    N,
    NE,
    W,
    E,
    SW,
    S,
    SE,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::NW,
        ResizeHandle::N,
        ResizeHandle::NE,
        ResizeHandle::W,
        ResizeHandle::E,
        ResizeHandle::SW,
        ResizeHandle::S,
        ResizeHandle::SE,
    ];

    pub fn has_north(self) -> bool {
        matches!(self, ResizeHandle::N | ResizeHandle::NE | ResizeHandle::NW)
    }

    pub fn has_south(self) -> bool {
        matches!(self, ResizeHandle::S | ResizeHandle::SE | ResizeHandle::SW)
    }

    pub fn has_east(self) -> bool {
        matches!(self, ResizeHandle::E | ResizeHandle::NE | ResizeHandle::SE)
    }

    pub fn has_west(self) -> bool {
        matches!(self, ResizeHandle::W | ResizeHandle::NW | ResizeHandle::SW)
    }

    /// Where the handle sits on `rect`.
    pub fn anchor(self, rect: Rect) -> Position {
        let c = rect.center();
        let x = if self.has_west() {
            rect.left()
        } else if self.has_east() {
            rect.right()
        } else {
            c.x
        };
        let y = if self.has_north() {
            rect.top()
        } else if self.has_south() {
            rect.bottom()
        } else {
            c.y
        };
        Position::new(x, y)
    }
}

/// New position and size after dragging `handle` by `delta` (diagram units).
///
/// North and west handles move the origin and shrink by the same amount.
/// When a dimension would drop below `min_size` it is clamped and the origin
/// recomputed so the opposite edge stays where it started.
pub fn resize_geometry(start: Geometry, handle: ResizeHandle, delta: Position, min_size: f32) -> Geometry {
    let Geometry {
        position: mut pos,
        size: Size {
            mut width,
            mut height,
        },
    } = start;

    if handle.has_east() {
        width = start.size.width + delta.x;
    }
    if handle.has_west() {
        width = start.size.width - delta.x;
        pos.x = start.position.x + delta.x;
    }
    if handle.has_south() {
        height = start.size.height + delta.y;
    }
    if handle.has_north() {
        height = start.size.height - delta.y;
        pos.y = start.position.y + delta.y;
    }

    if width < min_size {
        width = min_size;
        if handle.has_west() {
            pos.x = start.position.x + start.size.width - min_size;
        }
    }
    if height < min_size {
        height = min_size;
        if handle.has_north() {
            pos.y = start.position.y + start.size.height - min_size;
        }
    }

    Geometry {
        position: pos,
        size: Size::new(width, height),
    }
}

/// The one active pointer gesture. Illegal combinations are unrepresentable.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum InteractionMode {
    #[default]
    Idle,
    Dragging {
        element_id: ElementId,
        /// Pointer minus element origin, diagram units.
        pointer_offset: Position,
        /// Every element being moved, with its position when the drag began.
        origins: Vec<(ElementId, Position)>,
    },
    Resizing {
        element_id: ElementId,
        handle: ResizeHandle,
        start: Geometry,
        start_pointer: Position,
    },
    BoxSelecting {
        start: Position,
        current: Position,
    },
    CreatingRelationship {
        source_id: ElementId,
        relationship_type: RelationshipType,
        temp_endpoint: Option<Position>,
    },
}

impl InteractionMode {
    pub fn tag(&self) -> ModeTag {
        match self {
            InteractionMode::Idle => ModeTag::Idle,
            InteractionMode::Dragging { .. } => ModeTag::Dragging,
            InteractionMode::Resizing { .. } => ModeTag::Resizing,
            InteractionMode::BoxSelecting { .. } => ModeTag::BoxSelecting,
            InteractionMode::CreatingRelationship { .. } => ModeTag::CreatingRelationship,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionMode::Idle)
    }

    /// Normalized rubber-band rectangle while box selecting.
    pub fn selection_rect(&self) -> Option<Rect> {
        match self {
            InteractionMode::BoxSelecting { start, current } => {
                Some(Rect::from_min_max(*start, *current))
            }
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModeTag {
    Idle,
    Dragging,
    Resizing,
    BoxSelecting,
    CreatingRelationship,
}

impl fmt::Display for ModeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModeTag::Idle => "idle",
            ModeTag::Dragging => "dragging",
            ModeTag::Resizing => "resizing",
            ModeTag::BoxSelecting => "box selecting",
            ModeTag::CreatingRelationship => "creating relationship",
        })
    }
}

/// Uniform zoom plus canvas scroll. `diagram = (screen + scroll) / scale`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    scale: f32,
    scroll: Position,
    min_scale: f32,
    max_scale: f32,
    step: f32,
}

const DEFAULT_MIN_SCALE: f32 = 0.5;
const DEFAULT_MAX_SCALE: f32 = 2.0;
const DEFAULT_SCALE_STEP: f32 = 0.1;

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1.0, DEFAULT_MIN_SCALE, DEFAULT_MAX_SCALE, DEFAULT_SCALE_STEP)
    }
}

impl Viewport {
    /// Inverted limits are swapped; non-finite or non-positive values fall
    /// back to the defaults.
    pub fn new(scale: f32, min_scale: f32, max_scale: f32, step: f32) -> Self {
        let positive = |v: f32, fallback: f32| if v.is_finite() && v > 0.0 { v } else { fallback };
        let (a, b) = (
            positive(min_scale, DEFAULT_MIN_SCALE),
            positive(max_scale, DEFAULT_MAX_SCALE),
        );
        let (min_scale, max_scale) = if a <= b { (a, b) } else { (b, a) };
        let step = positive(step, DEFAULT_SCALE_STEP);
        let scale = if scale.is_finite() { scale } else { 1.0 };
        Self {
            scale: scale.clamp(min_scale, max_scale),
            scroll: Position::ZERO,
            min_scale,
            max_scale,
            step,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn scroll(&self) -> Position {
        self.scroll
    }

    pub fn to_diagram(&self, screen: Position) -> Position {
        screen.add(self.scroll).scale(1.0 / self.scale)
    }

    pub fn to_screen(&self, diagram: Position) -> Position {
        diagram.scale(self.scale).sub(self.scroll)
    }

    /// Returns true if the scale changed.
    pub fn set_scale(&mut self, scale: f32) -> bool {
        if !scale.is_finite() {
            return false;
        }
        // Round away accumulated step error so repeated zooming lands on exact limits.
        let next = ((scale * 1000.0).round() / 1000.0).clamp(self.min_scale, self.max_scale);
        if next == self.scale {
            return false;
        }
        self.scale = next;
        true
    }

    pub fn zoom_in(&mut self) -> bool {
        self.set_scale(self.scale + self.step)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_scale(self.scale - self.step)
    }

    pub fn set_scroll(&mut self, scroll: Position) -> bool {
        if self.scroll == scroll {
            return false;
        }
        self.scroll = scroll;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn geometry(x: f32, y: f32, w: f32, h: f32) -> Geometry {
        Geometry {
            position: Position::new(x, y),
            size: Size::new(w, h),
        }
    }

    #[test]
    fn south_east_grows_size_only() {
        let g = resize_geometry(
            geometry(100.0, 100.0, 200.0, 100.0),
            ResizeHandle::SE,
            Position::new(30.0, 20.0),
            50.0,
        );
        assert_eq!(g, geometry(100.0, 100.0, 230.0, 120.0));
    }

    #[test]
    fn north_west_moves_origin_and_shrinks() {
        let g = resize_geometry(
            geometry(100.0, 100.0, 200.0, 100.0),
            ResizeHandle::NW,
            Position::new(30.0, 20.0),
            50.0,
        );
        assert_eq!(g, geometry(130.0, 120.0, 170.0, 80.0));
    }

    #[test]
    fn floor_keeps_opposite_edge_fixed() {
        let start = geometry(100.0, 100.0, 200.0, 100.0);
        let g = resize_geometry(start, ResizeHandle::NW, Position::new(500.0, 500.0), 50.0);
        assert_eq!(g.size, Size::new(50.0, 50.0));
        // right edge stays at 300, bottom at 200
        assert_approx_eq!(f32, g.position.x + g.size.width, 300.0);
        assert_approx_eq!(f32, g.position.y + g.size.height, 200.0);

        let g = resize_geometry(start, ResizeHandle::E, Position::new(-500.0, 0.0), 50.0);
        assert_eq!(g, geometry(100.0, 100.0, 50.0, 100.0));
    }

    #[test]
    fn edge_handles_touch_one_axis() {
        let start = geometry(0.0, 0.0, 100.0, 100.0);
        let g = resize_geometry(start, ResizeHandle::N, Position::new(40.0, -10.0), 50.0);
        assert_eq!(g, geometry(0.0, -10.0, 100.0, 110.0));
        let g = resize_geometry(start, ResizeHandle::W, Position::new(-10.0, 40.0), 50.0);
        assert_eq!(g, geometry(-10.0, 0.0, 110.0, 100.0));
    }

    #[test]
    fn handle_anchors() {
        let rect = Rect::from_origin_size(Position::ZERO, Size::new(100.0, 50.0));
        assert_eq!(ResizeHandle::NW.anchor(rect), Position::new(0.0, 0.0));
        assert_eq!(ResizeHandle::S.anchor(rect), Position::new(50.0, 50.0));
        assert_eq!(ResizeHandle::E.anchor(rect), Position::new(100.0, 25.0));
    }

    #[test]
    fn viewport_round_trips_points() {
        let mut viewport = Viewport::default();
        viewport.set_scale(2.0);
        viewport.set_scroll(Position::new(40.0, 10.0));
        let d = viewport.to_diagram(Position::new(160.0, 90.0));
        assert_eq!(d, Position::new(100.0, 50.0));
        assert_eq!(viewport.to_screen(d), Position::new(160.0, 90.0));
    }

    #[test]
    fn zoom_is_clamped_to_limits() {
        let mut viewport = Viewport::default();
        for _ in 0..20 {
            viewport.zoom_in();
        }
        assert_eq!(viewport.scale(), 2.0);
        assert!(!viewport.zoom_in());
        for _ in 0..30 {
            viewport.zoom_out();
        }
        assert_eq!(viewport.scale(), 0.5);
        assert!(!viewport.set_scale(f32::NAN));
    }

    #[test]
    fn inverted_or_bad_limits_are_normalized() {
        let mut viewport = Viewport::new(3.0, 4.0, 0.25, 0.5);
        assert_eq!(viewport.scale(), 3.0);
        viewport.set_scale(10.0);
        assert_eq!(viewport.scale(), 4.0);
        viewport.set_scale(0.0);
        assert_eq!(viewport.scale(), 0.25);

        let mut viewport = Viewport::new(f32::NAN, -1.0, f32::INFINITY, 0.0);
        assert_eq!(viewport.scale(), 1.0);
        assert!(viewport.zoom_in());
        assert_approx_eq!(f32, viewport.scale(), 1.1);
        viewport.set_scale(100.0);
        assert_eq!(viewport.scale(), 2.0);
    }

    #[test]
    fn mode_tags() {
        assert_eq!(InteractionMode::default().tag(), ModeTag::Idle);
        let mode = InteractionMode::BoxSelecting {
            start: Position::new(10.0, 10.0),
            current: Position::new(0.0, 5.0),
        };
        assert_eq!(mode.tag().to_string(), "box selecting");
        assert_eq!(
            mode.selection_rect(),
            Some(Rect::from_min_max(Position::new(0.0, 5.0), Position::new(10.0, 10.0)))
        );
    }
}
