//! Alignment and distribution planning. Planners only compute moves; the
//! engine turns them into a single undoable command.

use std::fmt;

use crate::history::ElementMove;
use crate::model::{Diagram, Element, ElementId, Position};

/// Moves shorter than this are dropped, so re-aligning an aligned set is a no-op.
const MOVE_EPSILON: f32 = 1e-3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AlignDirection {
    Left,
    Center,
    Right,
    Top,
    Middle,
    Bottom,
}

impl AlignDirection {
    pub const ALL: [AlignDirection; 6] = [
        AlignDirection::Left,
        AlignDirection::Center,
        AlignDirection::Right,
        AlignDirection::Top,
        AlignDirection::Middle,
        AlignDirection::Bottom,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AlignDirection::Left => "Align left",
            AlignDirection::Center => "Align center",
            AlignDirection::Right => "Align right",
            AlignDirection::Top => "Align top",
            AlignDirection::Middle => "Align middle",
            AlignDirection::Bottom => "Align bottom",
        }
    }
}

impl fmt::Display for AlignDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DistributeAxis {
    Horizontal,
    Vertical,
}

fn selected<'a>(diagram: &'a Diagram, ids: &[ElementId]) -> Vec<&'a Element> {
    diagram
        .elements
        .iter()
        .filter(|e| ids.contains(&e.id))
        .collect()
}

fn plan_move(element: &Element, to: Position) -> Option<ElementMove> {
    let m = ElementMove {
        id: element.id,
        from: element.position,
        to,
    };
    (m.to.sub(m.from).length() >= MOVE_EPSILON).then_some(m)
}

/// Moves that align `ids` along `direction`, using the current geometry.
///
/// Left/top snap to the minimum edge, right/bottom to the maximum edge, and
/// center/middle to the mean of the element centers. Fewer than two existing
/// elements produce no moves.
pub fn plan_alignment(
    diagram: &Diagram,
    ids: &[ElementId],
    direction: AlignDirection,
) -> Vec<ElementMove> {
    let items = selected(diagram, ids);
    if items.len() < 2 {
        return Vec::new();
    }
    let n = items.len() as f32;
    let left = items.iter().map(|e| e.bounds().left()).fold(f32::INFINITY, f32::min);
    let right = items
        .iter()
        .map(|e| e.bounds().right())
        .fold(f32::NEG_INFINITY, f32::max);
    let top = items.iter().map(|e| e.bounds().top()).fold(f32::INFINITY, f32::min);
    let bottom = items
        .iter()
        .map(|e| e.bounds().bottom())
        .fold(f32::NEG_INFINITY, f32::max);
    let mean_x = items.iter().map(|e| e.center().x).sum::<f32>() / n;
    let mean_y = items.iter().map(|e| e.center().y).sum::<f32>() / n;

    items
        .into_iter()
        .filter_map(|e| {
            let Position { x, y } = e.position;
            let (w, h) = (e.size.width, e.size.height);
            let to = match direction {
                AlignDirection::Left => Position::new(left, y),
                AlignDirection::Center => Position::new(mean_x - w * 0.5, y),
                AlignDirection::Right => Position::new(right - w, y),
                AlignDirection::Top => Position::new(x, top),
                AlignDirection::Middle => Position::new(x, mean_y - h * 0.5),
                AlignDirection::Bottom => Position::new(x, bottom - h),
            };
            plan_move(e, to)
        })
        .collect()
}

/// Moves that space element centers evenly between the two outermost centers
/// along `axis`. Needs at least three elements.
pub fn plan_distribution(
    diagram: &Diagram,
    ids: &[ElementId],
    axis: DistributeAxis,
) -> Vec<ElementMove> {
    let mut items = selected(diagram, ids);
    if items.len() < 3 {
        return Vec::new();
    }
    let key = |e: &Element| match axis {
        DistributeAxis::Horizontal => e.center().x,
        DistributeAxis::Vertical => e.center().y,
    };
    items.sort_by(|a, b| key(a).total_cmp(&key(b)));
    let (Some(first), Some(last)) = (items.first(), items.last()) else {
        return Vec::new();
    };
    let start = key(first);
    let step = (key(last) - start) / (items.len() - 1) as f32;

    items
        .iter()
        .enumerate()
        .filter_map(|(i, e)| {
            let offset = start + step * i as f32 - key(e);
            let delta = match axis {
                DistributeAxis::Horizontal => Position::new(offset, 0.0),
                DistributeAxis::Vertical => Position::new(0.0, offset),
            };
            plan_move(e, e.position.add(delta))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DiagramId, DiagramKind, ElementType, Size};
    use float_cmp::assert_approx_eq;
    use std::collections::BTreeMap;

    fn diagram(boxes: &[(u64, f32, f32, f32, f32)]) -> Diagram {
        let mut d = Diagram::new(DiagramId(1), "d", DiagramKind::Structure);
        for &(id, x, y, w, h) in boxes {
            d.elements.push(Element {
                id: ElementId(id),
                element_type: ElementType::Part,
                name: format!("E{id}"),
                description: None,
                position: Position::new(x, y),
                size: Size::new(w, h),
                stereotype: None,
                properties: BTreeMap::new(),
            });
        }
        d
    }

    fn apply(d: &mut Diagram, moves: &[ElementMove]) {
        for m in moves {
            if let Some(e) = d.elements.iter_mut().find(|e| e.id == m.id) {
                e.position = m.to;
            }
        }
    }

    const IDS: [ElementId; 3] = [ElementId(1), ElementId(2), ElementId(3)];

    #[test]
    fn left_and_right_snap_to_extreme_edges() {
        let d = diagram(&[(1, 10.0, 0.0, 100.0, 50.0), (2, 40.0, 80.0, 60.0, 50.0)]);
        let left = plan_alignment(&d, &IDS, AlignDirection::Left);
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].to, Position::new(10.0, 80.0));
        let right = plan_alignment(&d, &IDS, AlignDirection::Right);
        // max right edge is 110; element 2 is 60 wide
        assert_eq!(right.len(), 1);
        assert_eq!(right[0].to, Position::new(50.0, 80.0));
    }

    #[test]
    fn center_uses_mean_of_centers_not_bounding_box() {
        let d = diagram(&[
            (1, 0.0, 0.0, 100.0, 50.0),
            (2, 0.0, 100.0, 100.0, 50.0),
            (3, 400.0, 200.0, 100.0, 50.0),
        ]);
        let mut moved = d.clone();
        apply(&mut moved, &plan_alignment(&d, &IDS, AlignDirection::Center));
        // centers 50, 50, 450; the bounding box center would be 250
        let mean = (50.0 + 50.0 + 450.0) / 3.0;
        for e in &moved.elements {
            assert_approx_eq!(f32, e.center().x, mean, epsilon = 1e-3);
        }
    }

    #[test]
    fn aligning_twice_is_a_no_op() {
        let d = diagram(&[
            (1, 13.0, 0.0, 70.0, 50.0),
            (2, 27.5, 100.0, 33.3, 50.0),
            (3, 91.1, 200.0, 120.0, 50.0),
        ]);
        for direction in AlignDirection::ALL {
            let mut once = d.clone();
            apply(&mut once, &plan_alignment(&d, &IDS, direction));
            assert!(
                plan_alignment(&once, &IDS, direction).is_empty(),
                "{direction} moved elements a second time"
            );
        }
    }

    #[test]
    fn single_element_does_not_align() {
        let d = diagram(&[(1, 0.0, 0.0, 10.0, 10.0), (2, 50.0, 50.0, 10.0, 10.0)]);
        assert!(plan_alignment(&d, &[ElementId(1)], AlignDirection::Top).is_empty());
        assert!(plan_alignment(&d, &[ElementId(1), ElementId(9)], AlignDirection::Top).is_empty());
    }

    #[test]
    fn distribute_spaces_centers_evenly() {
        let d = diagram(&[
            (1, 0.0, 0.0, 20.0, 20.0),
            (2, 30.0, 0.0, 20.0, 20.0),
            (3, 190.0, 0.0, 20.0, 20.0),
        ]);
        let moves = plan_distribution(&d, &IDS, DistributeAxis::Horizontal);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].id, ElementId(2));
        assert_eq!(moves[0].to, Position::new(95.0, 0.0));
        assert!(plan_distribution(&d, &IDS[..2], DistributeAxis::Vertical).is_empty());
    }
}
