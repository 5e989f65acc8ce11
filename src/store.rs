//! The single mutable source of truth: the project, the active diagram, the
//! selection and the pending notifications.
//!
//! Readers are public. Every mutator is crate-private, so code outside this
//! crate can only change the model through the engine, which routes all
//! changes through [`crate::history`].

use log::debug;

use crate::events::DiagramEvent;
use crate::model::{
    Diagram, DiagramId, DiagramKind, Element, ElementId, Position, Project, Relationship,
    RelationshipId, Size,
};
use crate::selection::Selection;

#[derive(Debug)]
pub struct DiagramStore {
    project: Project,
    active: DiagramId,
    selection: Selection,
    next_id: u64,
    outbox: Vec<DiagramEvent>,
}

impl DiagramStore {
    pub fn new(mut project: Project) -> Self {
        if project.diagrams.is_empty() {
            let id = DiagramId(project.max_id() + 1);
            project
                .diagrams
                .push(Diagram::new(id, "Main Diagram", DiagramKind::Structure));
        }
        let active = project.diagrams[0].id;
        let next_id = project.max_id() + 1;
        Self {
            project,
            active,
            selection: Selection::default(),
            next_id,
            outbox: Vec::new(),
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn active_id(&self) -> DiagramId {
        self.active
    }

    pub fn active_diagram(&self) -> &Diagram {
        // `active` always names an existing diagram and the project is never empty.
        self.project
            .diagram(self.active)
            .unwrap_or(&self.project.diagrams[0])
    }

    pub fn diagram(&self, id: DiagramId) -> Option<&Diagram> {
        self.project.diagram(id)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.active_diagram().element(id)
    }

    pub fn relationship(&self, id: RelationshipId) -> Option<&Relationship> {
        self.active_diagram().relationship(id)
    }

    pub(crate) fn into_project(self) -> Project {
        self.project
    }

    pub(crate) fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn take_events(&mut self) -> Vec<DiagramEvent> {
        std::mem::take(&mut self.outbox)
    }

    pub(crate) fn emit(&mut self, event: DiagramEvent) {
        self.outbox.push(event);
    }

    fn diagram_mut(&mut self, id: DiagramId) -> Option<&mut Diagram> {
        self.project.diagrams.iter_mut().find(|d| d.id == id)
    }

    // ---- diagrams ----

    pub(crate) fn add_diagram(&mut self, name: String, kind: DiagramKind) -> DiagramId {
        let id = DiagramId(self.allocate_id());
        self.project.diagrams.push(Diagram::new(id, name, kind));
        self.activate(id);
        id
    }

    pub(crate) fn activate(&mut self, id: DiagramId) -> bool {
        if self.active == id || self.project.diagram(id).is_none() {
            return false;
        }
        debug!(diagram_id:% = id; "Activating diagram");
        self.active = id;
        self.update_selection(Selection::clear);
        self.emit(DiagramEvent::DiagramChanged(id));
        true
    }

    /// Refuses to remove the last diagram.
    pub(crate) fn remove_diagram(&mut self, id: DiagramId) -> bool {
        if self.project.diagrams.len() <= 1 {
            return false;
        }
        let Some(idx) = self.project.diagrams.iter().position(|d| d.id == id) else {
            return false;
        };
        self.project.diagrams.remove(idx);
        if self.active == id {
            let first = self.project.diagrams[0].id;
            self.active = first;
            self.update_selection(Selection::clear);
            self.emit(DiagramEvent::DiagramChanged(first));
        }
        true
    }

    // ---- selection ----

    /// Runs a selection mutator and emits `SelectionChanged` if it changed anything.
    pub(crate) fn update_selection(&mut self, f: impl FnOnce(&mut Selection) -> bool) -> bool {
        let changed = f(&mut self.selection);
        if changed {
            self.emit(DiagramEvent::SelectionChanged);
        }
        changed
    }

    pub(crate) fn restore_selection(&mut self, selection: &Selection) -> bool {
        self.update_selection(|s| s.replace(selection.clone()))
    }

    // ---- elements ----

    pub(crate) fn insert_element(
        &mut self,
        diagram: DiagramId,
        element: Element,
        index: Option<usize>,
    ) -> bool {
        let id = element.id;
        let Some(d) = self.diagram_mut(diagram) else {
            return false;
        };
        if d.has_element(id) {
            return false;
        }
        let index = index.unwrap_or(d.elements.len()).min(d.elements.len());
        d.elements.insert(index, element);
        self.emit(DiagramEvent::ElementAdded(id));
        true
    }

    pub(crate) fn replace_element(&mut self, diagram: DiagramId, element: Element) -> bool {
        let id = element.id;
        let Some(slot) = self
            .diagram_mut(diagram)
            .and_then(|d| d.elements.iter_mut().find(|e| e.id == id))
        else {
            return false;
        };
        *slot = element;
        self.emit(DiagramEvent::ElementUpdated(id));
        true
    }

    pub(crate) fn set_element_geometry(
        &mut self,
        diagram: DiagramId,
        id: ElementId,
        position: Position,
        size: Option<Size>,
    ) -> bool {
        let Some(element) = self
            .diagram_mut(diagram)
            .and_then(|d| d.elements.iter_mut().find(|e| e.id == id))
        else {
            return false;
        };
        element.position = position;
        if let Some(size) = size {
            element.size = size;
        }
        self.emit(DiagramEvent::ElementUpdated(id));
        true
    }

    pub(crate) fn remove_element(&mut self, diagram: DiagramId, id: ElementId) -> Option<Element> {
        let d = self.diagram_mut(diagram)?;
        let idx = d.element_index(id)?;
        let element = d.elements.remove(idx);
        self.update_selection(|s| s.forget_element(id));
        self.emit(DiagramEvent::ElementRemoved(id));
        Some(element)
    }

    // ---- relationships ----

    pub(crate) fn insert_relationship(
        &mut self,
        diagram: DiagramId,
        relationship: Relationship,
        index: Option<usize>,
    ) -> bool {
        let id = relationship.id;
        let Some(d) = self.diagram_mut(diagram) else {
            return false;
        };
        if d.relationship(id).is_some() {
            return false;
        }
        let index = index
            .unwrap_or(d.relationships.len())
            .min(d.relationships.len());
        d.relationships.insert(index, relationship);
        self.emit(DiagramEvent::RelationshipAdded(id));
        true
    }

    pub(crate) fn replace_relationship(
        &mut self,
        diagram: DiagramId,
        relationship: Relationship,
    ) -> bool {
        let id = relationship.id;
        let Some(slot) = self
            .diagram_mut(diagram)
            .and_then(|d| d.relationships.iter_mut().find(|r| r.id == id))
        else {
            return false;
        };
        *slot = relationship;
        self.emit(DiagramEvent::RelationshipUpdated(id));
        true
    }

    pub(crate) fn remove_relationship(
        &mut self,
        diagram: DiagramId,
        id: RelationshipId,
    ) -> Option<Relationship> {
        let d = self.diagram_mut(diagram)?;
        let idx = d.relationship_index(id)?;
        let relationship = d.relationships.remove(idx);
        self.update_selection(|s| s.forget_relationship(id));
        self.emit(DiagramEvent::RelationshipRemoved(id));
        Some(relationship)
    }
}
