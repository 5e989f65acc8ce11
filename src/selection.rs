use std::collections::HashSet;

use crate::geometry::rects_overlap;
use crate::model::{Element, ElementId, Rect, RelationshipId};

/// Element and relationship selection. The two are mutually exclusive: every
/// mutator that makes one non-empty empties the other.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    elements: HashSet<ElementId>,
    primary: Option<ElementId>,
    relationship: Option<RelationshipId>,
}

impl Selection {
    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.relationship.is_none()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_multi(&self) -> bool {
        self.elements.len() > 1
    }

    /// Selected element ids in ascending order.
    pub fn element_ids(&self) -> Vec<ElementId> {
        let mut ids: Vec<_> = self.elements.iter().copied().collect();
        ids.sort();
        ids
    }

    /// The single selected element, if exactly one is selected.
    pub fn primary(&self) -> Option<ElementId> {
        self.primary
    }

    pub fn relationship(&self) -> Option<RelationshipId> {
        self.relationship
    }

    pub(crate) fn select_element(&mut self, id: Option<ElementId>) -> bool {
        let next = Selection {
            elements: id.into_iter().collect(),
            primary: id,
            relationship: None,
        };
        self.replace(next)
    }

    pub(crate) fn select_multiple(&mut self, ids: impl IntoIterator<Item = ElementId>) -> bool {
        let elements: HashSet<ElementId> = ids.into_iter().collect();
        let primary = if elements.len() == 1 {
            elements.iter().next().copied()
        } else {
            None
        };
        self.replace(Selection {
            elements,
            primary,
            relationship: None,
        })
    }

    /// Shift-click: add when absent, remove when present.
    pub(crate) fn toggle(&mut self, id: ElementId) -> bool {
        let mut ids = self.elements.clone();
        if !ids.remove(&id) {
            ids.insert(id);
        }
        self.select_multiple(ids)
    }

    pub(crate) fn extend(&mut self, ids: impl IntoIterator<Item = ElementId>) -> bool {
        let mut all = self.elements.clone();
        all.extend(ids);
        self.select_multiple(all)
    }

    pub(crate) fn select_relationship(&mut self, id: Option<RelationshipId>) -> bool {
        self.replace(Selection {
            elements: HashSet::new(),
            primary: None,
            relationship: id,
        })
    }

    pub(crate) fn clear(&mut self) -> bool {
        self.replace(Selection::default())
    }

    /// Drops a deleted element from the selection.
    pub(crate) fn forget_element(&mut self, id: ElementId) -> bool {
        if !self.elements.contains(&id) {
            return false;
        }
        let rest: Vec<_> = self.elements.iter().copied().filter(|e| *e != id).collect();
        self.select_multiple(rest)
    }

    pub(crate) fn forget_relationship(&mut self, id: RelationshipId) -> bool {
        if self.relationship != Some(id) {
            return false;
        }
        self.clear()
    }

    pub(crate) fn replace(&mut self, next: Selection) -> bool {
        if *self == next {
            return false;
        }
        *self = next;
        true
    }
}

/// True when a drag rectangle is small enough to count as a click.
pub fn is_click_sized(rect: Rect, click_threshold: f32) -> bool {
    rect.width() < click_threshold && rect.height() < click_threshold
}

/// Ids of the elements overlapping `rect`, in diagram order.
///
/// A rectangle narrower and shorter than `click_threshold` selects nothing.
pub fn elements_in_rect<'a>(
    elements: impl IntoIterator<Item = &'a Element>,
    rect: Rect,
    click_threshold: f32,
) -> Vec<ElementId> {
    let rect = Rect::from_min_max(rect.min, rect.max);
    if is_click_sized(rect, click_threshold) {
        return Vec::new();
    }
    elements
        .into_iter()
        .filter(|e| rects_overlap(e.bounds(), rect))
        .map(|e| e.id)
        .collect()
}
