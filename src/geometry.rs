//! Pure geometry used by connectors, hit testing and rubber-band selection.

use crate::model::{Position, Rect};

/// Endpoints of a connector after clipping to the two element borders.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConnectionPoints {
    pub source: Position,
    pub target: Position,
}

/// Point where the ray leaving `rect`'s center in the direction `from -> toward`
/// crosses the rectangle border.
///
/// The dominant axis of the direction picks the edge: a mostly horizontal ray
/// hits the left or right edge, a mostly vertical ray the top or bottom one.
/// The other coordinate is solved from the line equation and clipped to the
/// edge segment. A zero-length direction yields the center.
pub fn intersect_border(rect: Rect, from: Position, toward: Position) -> Position {
    let center = rect.center();
    let dx = toward.x - from.x;
    let dy = toward.y - from.y;
    if dx == 0.0 && dy == 0.0 {
        return center;
    }

    if dx.abs() > dy.abs() {
        let x = if dx > 0.0 { rect.right() } else { rect.left() };
        let y = center.y + dy / dx * (x - center.x);
        Position::new(x, y.clamp(rect.top(), rect.bottom()))
    } else {
        let y = if dy > 0.0 { rect.bottom() } else { rect.top() };
        let x = center.x + dx / dy * (y - center.y);
        Position::new(x.clamp(rect.left(), rect.right()), y)
    }
}

/// Border points for a connector between `source` and `target`.
///
/// With waypoints, each end aims at its nearest waypoint instead of the
/// opposite element's center.
pub fn connection_points(source: Rect, target: Rect, waypoints: &[Position]) -> ConnectionPoints {
    let source_center = source.center();
    let target_center = target.center();
    let source_anchor = waypoints.first().copied().unwrap_or(target_center);
    let target_anchor = waypoints.last().copied().unwrap_or(source_center);
    ConnectionPoints {
        source: intersect_border(source, source_center, source_anchor),
        target: intersect_border(target, target_center, target_anchor),
    }
}

/// Strict overlap test: rectangles that merely touch do not overlap.
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    a.left() < b.right() && a.right() > b.left() && a.top() < b.bottom() && a.bottom() > b.top()
}

pub fn distance_to_segment(p: Position, a: Position, b: Position) -> f32 {
    let ab = b.sub(a);
    let ap = p.sub(a);
    let ab_len2 = ab.x * ab.x + ab.y * ab.y;
    if ab_len2 <= f32::EPSILON {
        return ap.length();
    }
    let t = ((ap.x * ab.x + ap.y * ab.y) / ab_len2).clamp(0.0, 1.0);
    let closest = a.add(ab.scale(t));
    p.sub(closest).length()
}

/// Distance from `p` to the nearest segment of an open polyline.
pub fn distance_to_polyline(p: Position, points: &[Position]) -> f32 {
    match points {
        [] => f32::INFINITY,
        [only] => p.sub(*only).length(),
        _ => points
            .windows(2)
            .map(|pair| distance_to_segment(p, pair[0], pair[1]))
            .fold(f32::INFINITY, f32::min),
    }
}


#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::model::Size;

    fn rect_strategy() -> impl Strategy<Value = Rect> {
        (
            -1000.0f32..1000.0,
            -1000.0f32..1000.0,
            1.0f32..500.0,
            1.0f32..500.0,
        )
            .prop_map(|(x, y, w, h)| Rect::from_origin_size(Position::new(x, y), Size::new(w, h)))
    }

    fn point_strategy() -> impl Strategy<Value = Position> {
        (-2000.0f32..2000.0, -2000.0f32..2000.0).prop_map(|(x, y)| Position::new(x, y))
    }

    /// The border point always lies on the rectangle boundary.
    fn check_border_point_on_boundary(rect: Rect, toward: Position) -> Result<(), TestCaseError> {
        let p = intersect_border(rect, rect.center(), toward);
        if toward == rect.center() {
            return Ok(());
        }
        prop_assert!(p.x >= rect.left() - 1e-3 && p.x <= rect.right() + 1e-3);
        prop_assert!(p.y >= rect.top() - 1e-3 && p.y <= rect.bottom() + 1e-3);
        let on_vertical = approx_eq!(f32, p.x, rect.left(), epsilon = 1e-3)
            || approx_eq!(f32, p.x, rect.right(), epsilon = 1e-3);
        let on_horizontal = approx_eq!(f32, p.y, rect.top(), epsilon = 1e-3)
            || approx_eq!(f32, p.y, rect.bottom(), epsilon = 1e-3);
        prop_assert!(on_vertical || on_horizontal);
        Ok(())
    }

    /// Mirroring two rectangles across a shared horizontal axis swaps endpoints.
    fn check_symmetric_layout_swaps(y: f32, side: f32, gap: f32) -> Result<(), TestCaseError> {
        let a = Rect::from_origin_size(Position::new(0.0, y), Size::new(side, side));
        let b = Rect::from_origin_size(Position::new(side + gap, y), Size::new(side, side));
        let ab = connection_points(a, b, &[]);
        let ba = connection_points(b, a, &[]);
        prop_assert!(approx_eq!(f32, ab.source.x, ba.target.x));
        prop_assert!(approx_eq!(f32, ab.source.y, ba.target.y));
        prop_assert!(approx_eq!(f32, ab.target.x, ba.source.x));
        prop_assert!(approx_eq!(f32, ab.target.y, ba.source.y));
        Ok(())
    }

    /// Overlap is symmetric.
    fn check_overlap_is_symmetric(a: Rect, b: Rect) -> Result<(), TestCaseError> {
        prop_assert_eq!(rects_overlap(a, b), rects_overlap(b, a));
        Ok(())
    }

    proptest! {
        #[test]
        fn border_point_on_boundary(rect in rect_strategy(), toward in point_strategy()) {
            check_border_point_on_boundary(rect, toward)?;
        }

        #[test]
        fn symmetric_layout_swaps(y in -500.0f32..500.0, side in 1.0f32..300.0, gap in 1.0f32..300.0) {
            check_symmetric_layout_swaps(y, side, gap)?;
        }

        #[test]
        fn overlap_is_symmetric(a in rect_strategy(), b in rect_strategy()) {
            check_overlap_is_symmetric(a, b)?;
        }
    }
}
