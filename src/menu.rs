use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::align::{AlignDirection, DistributeAxis};
use crate::model::{ElementId, ElementType, Position, RelationshipType};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MenuAction {
    StartRelationship {
        source: ElementId,
        relationship_type: RelationshipType,
    },
    CreateElement {
        element_type: ElementType,
        at: Position,
    },
    DeleteElement(ElementId),
    DeleteSelection,
    Align(AlignDirection),
    Distribute(DistributeAxis),
}

#[derive(Clone, Debug, PartialEq)]
pub struct MenuEntry {
    pub label: String,
    pub action: MenuAction,
}

impl MenuEntry {
    fn new(label: impl Into<String>, action: MenuAction) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// Menu opened by a secondary click, anchored at a diagram-space point.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextMenu {
    pub diagram_point: Position,
    pub element: Option<ElementId>,
    pub entries: Vec<MenuEntry>,
}

impl ContextMenu {
    /// Menu for a click on `element`; `selected` is the current element
    /// selection after the click.
    pub(crate) fn for_element(
        diagram_point: Position,
        element: ElementId,
        selected: usize,
    ) -> Self {
        let mut entries: Vec<MenuEntry> = RelationshipType::ALL
            .iter()
            .map(|&relationship_type| {
                MenuEntry::new(
                    format!("Create {relationship_type}"),
                    MenuAction::StartRelationship {
                        source: element,
                        relationship_type,
                    },
                )
            })
            .collect();
        if selected > 1 {
            entries.extend(
                AlignDirection::ALL
                    .iter()
                    .map(|&d| MenuEntry::new(d.label(), MenuAction::Align(d))),
            );
            if selected > 2 {
                entries.push(MenuEntry::new(
                    "Distribute horizontally",
                    MenuAction::Distribute(DistributeAxis::Horizontal),
                ));
                entries.push(MenuEntry::new(
                    "Distribute vertically",
                    MenuAction::Distribute(DistributeAxis::Vertical),
                ));
            }
            entries.push(MenuEntry::new(
                format!("Delete {selected} elements"),
                MenuAction::DeleteSelection,
            ));
        } else {
            entries.push(MenuEntry::new("Delete", MenuAction::DeleteElement(element)));
        }
        Self {
            diagram_point,
            element: Some(element),
            entries,
        }
    }

    /// Menu for a click on empty canvas: one entry per SysML element type.
    pub(crate) fn for_canvas(diagram_point: Position) -> Self {
        let entries = ElementType::SYSML
            .iter()
            .map(|&element_type| {
                MenuEntry::new(
                    format!("Add {element_type}"),
                    MenuAction::CreateElement {
                        element_type,
                        at: diagram_point,
                    },
                )
            })
            .collect();
        Self {
            diagram_point,
            element: None,
            entries,
        }
    }

    /// Entries whose label fuzzy-matches `query`, best match first. An empty
    /// query keeps every entry in menu order.
    pub fn matching(&self, query: &str) -> Vec<&MenuEntry> {
        let q = query.trim();
        if q.is_empty() {
            return self.entries.iter().collect();
        }
        let matcher = SkimMatcherV2::default();
        let mut scored: Vec<(&MenuEntry, i64)> = self
            .entries
            .iter()
            .filter_map(|e| matcher.fuzzy_match(&e.label, q).map(|score| (e, score)))
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.label.cmp(&b.0.label)));
        scored.into_iter().map(|(e, _)| e).collect()
    }
}
