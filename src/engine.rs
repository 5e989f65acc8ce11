//! The interaction engine: the one object a host talks to.
//!
//! Every model change goes through [`CommandHistory`], pointer input drives
//! the [`InteractionMode`] state machine, and the notifications collected by
//! the store are published to subscribers before each public call returns.

use std::collections::BTreeMap;

use log::{debug, info, trace, warn};

use crate::align::{AlignDirection, DistributeAxis, plan_alignment, plan_distribution};
use crate::config::EngineConfig;
use crate::error::{EndpointProblem, EngineError};
use crate::events::{DiagramEvent, EventBus, SubscriptionId};
use crate::geometry::{connection_points, distance_to_polyline};
use crate::history::{Command, CommandHistory, Direction, ElementMove, Geometry};
use crate::interaction::{
    InteractionMode, ModeTag, Modifiers, PointerTarget, ResizeHandle, Viewport, resize_geometry,
};
use crate::menu::{ContextMenu, MenuAction};
use crate::model::{
    Diagram, DiagramId, DiagramKind, Element, ElementId, ElementType, ElementUpdate, Position,
    Project, Rect, Relationship, RelationshipId, RelationshipType, RelationshipUpdate, Size,
};
use crate::selection::{Selection, elements_in_rect};
use crate::store::DiagramStore;

/// Relationship being drawn from a source element toward the pointer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PendingRelationship {
    pub source_id: ElementId,
    pub relationship_type: RelationshipType,
    pub endpoint: Option<Position>,
}

/// Read-only view for renderers.
#[derive(Debug)]
pub struct Snapshot<'a> {
    pub diagram: &'a Diagram,
    pub selection: &'a Selection,
    pub mode: ModeTag,
    /// Live rubber-band rectangle, diagram units.
    pub selection_rect: Option<Rect>,
    /// Elements the rubber band would select if released now.
    pub box_preview: &'a [ElementId],
    pub pending_relationship: Option<PendingRelationship>,
    pub viewport: Viewport,
}

#[derive(Debug)]
pub struct Engine {
    store: DiagramStore,
    history: CommandHistory,
    mode: InteractionMode,
    viewport: Viewport,
    box_preview: Vec<ElementId>,
    bus: EventBus,
    config: EngineConfig,
}

impl Engine {
    pub fn init(project: Project, config: EngineConfig) -> Self {
        let config = config.normalized();
        let store = DiagramStore::new(project);
        info!(
            project = store.project().name.as_str(),
            diagrams = store.project().diagrams.len();
            "Engine initialized"
        );
        Self {
            viewport: Viewport::new(
                config.initial_scale,
                config.min_scale,
                config.max_scale,
                config.scale_step,
            ),
            history: CommandHistory::new(config.history_limit),
            mode: InteractionMode::Idle,
            box_preview: Vec::new(),
            bus: EventBus::new(),
            store,
            config,
        }
    }

    /// Tears the engine down and hands the project back to the caller.
    pub fn dispose(mut self) -> Project {
        self.bus.clear();
        info!(project = self.store.project().name.as_str(); "Engine disposed");
        self.store.into_project()
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&DiagramEvent) + 'static) -> SubscriptionId {
        self.bus.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    fn flush(&mut self) {
        for event in self.store.take_events() {
            self.bus.publish(&event);
        }
    }

    // ---- readers ----

    pub fn project(&self) -> &Project {
        self.store.project()
    }

    pub fn diagram(&self) -> &Diagram {
        self.store.active_diagram()
    }

    pub fn selection(&self) -> &Selection {
        self.store.selection()
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.store.element(id)
    }

    pub fn relationship(&self, id: RelationshipId) -> Option<&Relationship> {
        self.store.relationship(id)
    }

    pub fn mode(&self) -> &InteractionMode {
        &self.mode
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        let pending_relationship = match &self.mode {
            InteractionMode::CreatingRelationship {
                source_id,
                relationship_type,
                temp_endpoint,
            } => Some(PendingRelationship {
                source_id: *source_id,
                relationship_type: *relationship_type,
                endpoint: *temp_endpoint,
            }),
            _ => None,
        };
        Snapshot {
            diagram: self.store.active_diagram(),
            selection: self.store.selection(),
            mode: self.mode.tag(),
            selection_rect: self.mode.selection_rect(),
            box_preview: &self.box_preview,
            pending_relationship,
            viewport: self.viewport,
        }
    }

    // ---- elements ----

    /// Creates an element in the active diagram and makes it the sole selection.
    ///
    /// Missing size and name fall back to the type defaults; `properties` are
    /// merged over the type's default properties.
    pub fn create_element(
        &mut self,
        element_type: ElementType,
        position: Position,
        size: Option<Size>,
        name: Option<String>,
        properties: Option<BTreeMap<String, String>>,
    ) -> Element {
        self.settle_gesture();
        let mut merged = element_type.default_properties();
        merged.extend(properties.unwrap_or_default());
        let element = Element {
            id: ElementId(self.store.allocate_id()),
            element_type,
            name: name.unwrap_or_else(|| format!("New {element_type}")),
            description: None,
            position,
            size: size.unwrap_or_else(|| element_type.default_size()),
            stereotype: None,
            properties: merged,
        };
        debug!(element_id:% = element.id, element_type:% = element_type; "Creating element");
        let diagram = self.store.active_id();
        self.history.run(
            &mut self.store,
            Command::AddElement {
                diagram,
                element: element.clone(),
            },
        );
        self.flush();
        element
    }

    /// Returns false for unknown ids and for updates that change nothing.
    pub fn update_element(&mut self, id: ElementId, update: ElementUpdate) -> bool {
        self.settle_gesture();
        let Some(command) = Command::update_element(self.store.active_diagram(), id, &update)
        else {
            debug!(element_id:% = id; "Ignoring element update");
            return false;
        };
        self.history.run(&mut self.store, command);
        self.flush();
        true
    }

    /// Deletes the element and every relationship touching it as one step.
    pub fn delete_element(&mut self, id: ElementId) -> bool {
        self.settle_gesture();
        let Some(command) = Command::delete_element(self.store.active_diagram(), id) else {
            debug!(element_id:% = id; "Ignoring delete of unknown element");
            return false;
        };
        debug!(element_id:% = id; "Deleting element");
        self.history.run(&mut self.store, command);
        self.flush();
        true
    }

    // ---- relationships ----

    pub fn create_relationship(
        &mut self,
        relationship_type: RelationshipType,
        source_id: ElementId,
        target_id: ElementId,
        name: Option<String>,
        waypoints: Vec<Position>,
    ) -> Result<Relationship, EngineError> {
        self.settle_gesture();
        let diagram = self.store.active_diagram();
        let problem = if source_id == target_id {
            Some(EndpointProblem::SelfLoop)
        } else if !diagram.has_element(source_id) {
            Some(EndpointProblem::MissingSource)
        } else if !diagram.has_element(target_id) {
            Some(EndpointProblem::MissingTarget)
        } else {
            None
        };
        if let Some(problem) = problem {
            warn!(source_id:% = source_id, target_id:% = target_id, problem:% = problem; "Rejected relationship");
            return Err(EngineError::InvalidEndpoint {
                source_id,
                target_id,
                problem,
            });
        }

        let relationship = Relationship {
            id: RelationshipId(self.store.allocate_id()),
            relationship_type,
            source_id,
            target_id,
            name,
            label: None,
            description: None,
            waypoints,
            properties: None,
        };
        debug!(
            relationship_id:% = relationship.id,
            relationship_type:% = relationship_type;
            "Creating relationship"
        );
        let diagram = self.store.active_id();
        self.history.run(
            &mut self.store,
            Command::AddRelationship {
                diagram,
                relationship: relationship.clone(),
            },
        );
        self.flush();
        Ok(relationship)
    }

    pub fn update_relationship(&mut self, id: RelationshipId, update: RelationshipUpdate) -> bool {
        self.settle_gesture();
        let Some(command) =
            Command::update_relationship(self.store.active_diagram(), id, &update)
        else {
            debug!(relationship_id:% = id; "Ignoring relationship update");
            return false;
        };
        self.history.run(&mut self.store, command);
        self.flush();
        true
    }

    pub fn delete_relationship(&mut self, id: RelationshipId) -> bool {
        self.settle_gesture();
        let Some(command) = Command::delete_relationship(self.store.active_diagram(), id) else {
            debug!(relationship_id:% = id; "Ignoring delete of unknown relationship");
            return false;
        };
        self.history.run(&mut self.store, command);
        self.flush();
        true
    }

    /// Deletes the selected relationship, or every selected element, as one step.
    pub fn delete_selection(&mut self) -> bool {
        self.settle_gesture();
        if let Some(id) = self.store.selection().relationship() {
            return self.delete_relationship(id);
        }
        let ids = self.store.selection().element_ids();
        match ids.as_slice() {
            [] => false,
            [id] => self.delete_element(*id),
            _ => {
                let mut tx =
                    CommandHistory::begin(&self.store, format!("Delete {} elements", ids.len()));
                for &id in &ids {
                    if let Some(command) = Command::delete_element(self.store.active_diagram(), id)
                    {
                        tx.apply(&mut self.store, command);
                    }
                }
                let recorded = self.history.commit(&self.store, tx);
                self.flush();
                recorded
            }
        }
    }

    // ---- selection ----

    pub fn select_element(&mut self, id: Option<ElementId>) {
        if let Some(id) = id
            && !self.store.active_diagram().has_element(id)
        {
            debug!(element_id:% = id; "Ignoring selection of unknown element");
            return;
        }
        self.store.update_selection(|s| s.select_element(id));
        self.flush();
    }

    /// Unknown ids are dropped; an empty list clears the selection.
    pub fn select_multiple(&mut self, ids: &[ElementId]) {
        let diagram = self.store.active_diagram();
        let ids: Vec<ElementId> = ids
            .iter()
            .copied()
            .filter(|id| diagram.has_element(*id))
            .collect();
        self.store.update_selection(|s| s.select_multiple(ids));
        self.flush();
    }

    pub fn toggle_in_selection(&mut self, id: ElementId) {
        if !self.store.active_diagram().has_element(id) {
            return;
        }
        self.store.update_selection(|s| s.toggle(id));
        self.flush();
    }

    pub fn select_relationship(&mut self, id: Option<RelationshipId>) {
        if let Some(id) = id
            && self.store.relationship(id).is_none()
        {
            debug!(relationship_id:% = id; "Ignoring selection of unknown relationship");
            return;
        }
        self.store.update_selection(|s| s.select_relationship(id));
        self.flush();
    }

    // ---- pointer input ----

    fn set_mode(&mut self, mode: InteractionMode) {
        let (from, to) = (self.mode.tag(), mode.tag());
        if from != to {
            debug!(from:% = from, to:% = to; "Interaction mode changed");
        }
        self.mode = mode;
    }

    /// Rubber-band click threshold converted to diagram units.
    fn click_threshold(&self) -> f32 {
        self.config.click_threshold / self.viewport.scale()
    }

    pub fn on_pointer_down(
        &mut self,
        screen: Position,
        modifiers: Modifiers,
        target: PointerTarget,
    ) -> Result<(), EngineError> {
        let point = self.viewport.to_diagram(screen);

        if let InteractionMode::CreatingRelationship {
            source_id,
            relationship_type,
            ..
        } = &self.mode
        {
            let (source_id, relationship_type) = (*source_id, *relationship_type);
            self.set_mode(InteractionMode::Idle);
            let result = match target {
                PointerTarget::Element(id) | PointerTarget::Handle(id, _) if id != source_id => self
                    .create_relationship(relationship_type, source_id, id, None, Vec::new())
                    .map(|_| ()),
                _ => {
                    debug!(source_id:% = source_id; "Relationship creation cancelled");
                    Ok(())
                }
            };
            self.flush();
            return result;
        }

        if !self.mode.is_idle() {
            warn!(mode:% = self.mode.tag(); "Pointer down during an active gesture");
            self.finish_gesture(point, modifiers);
        }

        match target {
            PointerTarget::Handle(id, handle) if self.store.selection().primary() == Some(id) => {
                self.begin_resize(id, handle, point);
            }
            PointerTarget::Element(id) | PointerTarget::Handle(id, _) => {
                self.begin_drag(id, point, modifiers);
            }
            PointerTarget::Relationship(id) => self.select_relationship(Some(id)),
            PointerTarget::Canvas => {
                self.box_preview.clear();
                self.set_mode(InteractionMode::BoxSelecting {
                    start: point,
                    current: point,
                });
            }
        }
        self.flush();
        Ok(())
    }

    fn begin_drag(&mut self, id: ElementId, point: Position, modifiers: Modifiers) {
        let Some(position) = self.store.element(id).map(|e| e.position) else {
            debug!(element_id:% = id; "Pointer down on unknown element");
            return;
        };
        if modifiers.shift {
            self.store.update_selection(|s| s.toggle(id));
            return;
        }
        if !self.store.selection().contains(id) {
            self.store.update_selection(|s| s.select_element(Some(id)));
        }
        let selection = self.store.selection();
        let origins = self
            .store
            .active_diagram()
            .elements
            .iter()
            .filter(|e| selection.contains(e.id))
            .map(|e| (e.id, e.position))
            .collect();
        self.set_mode(InteractionMode::Dragging {
            element_id: id,
            pointer_offset: point.sub(position),
            origins,
        });
    }

    fn begin_resize(&mut self, id: ElementId, handle: ResizeHandle, point: Position) {
        let Some(start) = self.store.element(id).map(|e| Geometry {
            position: e.position,
            size: e.size,
        }) else {
            return;
        };
        self.set_mode(InteractionMode::Resizing {
            element_id: id,
            handle,
            start,
            start_pointer: point,
        });
    }

    pub fn on_pointer_move(&mut self, screen: Position, _modifiers: Modifiers, _target: PointerTarget) {
        let point = self.viewport.to_diagram(screen);
        let diagram = self.store.active_id();
        let threshold = self.click_threshold();
        match &mut self.mode {
            InteractionMode::Idle => return,
            InteractionMode::Dragging {
                element_id,
                pointer_offset,
                origins,
            } => {
                let Some(&(_, origin)) = origins.iter().find(|(id, _)| *id == *element_id) else {
                    return;
                };
                let delta = point.sub(*pointer_offset).sub(origin);
                trace!(dx = delta.x, dy = delta.y; "Dragging");
                let command = Command::MoveElements {
                    diagram,
                    moves: origins
                        .iter()
                        .map(|&(id, from)| ElementMove {
                            id,
                            from,
                            to: from.add(delta),
                        })
                        .collect(),
                };
                CommandHistory::preview(&mut self.store, &command, Direction::Forward);
            }
            InteractionMode::Resizing {
                element_id,
                handle,
                start,
                start_pointer,
            } => {
                let to = resize_geometry(
                    *start,
                    *handle,
                    point.sub(*start_pointer),
                    self.config.min_element_size,
                );
                trace!(width = to.size.width, height = to.size.height; "Resizing");
                let command = Command::ResizeElement {
                    diagram,
                    id: *element_id,
                    from: *start,
                    to,
                };
                CommandHistory::preview(&mut self.store, &command, Direction::Forward);
            }
            InteractionMode::BoxSelecting { start, current } => {
                *current = point;
                let rect = Rect::from_min_max(*start, point);
                self.box_preview =
                    elements_in_rect(&self.store.active_diagram().elements, rect, threshold);
            }
            InteractionMode::CreatingRelationship { temp_endpoint, .. } => {
                *temp_endpoint = Some(point);
            }
        }
        self.flush();
    }

    /// Ends a drag, resize or box selection. Relationship creation completes
    /// on pointer down, so it is unaffected.
    pub fn on_pointer_up(&mut self, screen: Position, modifiers: Modifiers, _target: PointerTarget) {
        if matches!(self.mode, InteractionMode::CreatingRelationship { .. }) {
            return;
        }
        let point = self.viewport.to_diagram(screen);
        self.finish_gesture(point, modifiers);
        self.flush();
    }

    /// Leaving the canvas keeps a drag or resize where it is and abandons a
    /// box selection.
    pub fn on_pointer_leave(&mut self, _screen: Position, _modifiers: Modifiers, _target: PointerTarget) {
        match self.mode.tag() {
            ModeTag::Dragging | ModeTag::Resizing => {
                self.finish_gesture(Position::ZERO, Modifiers::NONE);
            }
            ModeTag::BoxSelecting => {
                self.box_preview.clear();
                self.set_mode(InteractionMode::Idle);
            }
            ModeTag::Idle | ModeTag::CreatingRelationship => {}
        }
        self.flush();
    }

    fn finish_gesture(&mut self, point: Position, modifiers: Modifiers) {
        let mode = std::mem::take(&mut self.mode);
        debug!(mode:% = mode.tag(); "Gesture finished");
        match mode {
            InteractionMode::Idle => {}
            InteractionMode::Dragging { origins, .. } => self.commit_drag(origins),
            InteractionMode::Resizing {
                element_id, start, ..
            } => self.commit_resize(element_id, start),
            InteractionMode::BoxSelecting { start, .. } => {
                self.commit_box(Rect::from_min_max(start, point), modifiers);
            }
            mode @ InteractionMode::CreatingRelationship { .. } => self.mode = mode,
        }
        self.box_preview.clear();
    }

    /// Records one undo step for the whole drag.
    fn commit_drag(&mut self, origins: Vec<(ElementId, Position)>) {
        let diagram = self.store.active_diagram();
        let moves: Vec<ElementMove> = origins
            .into_iter()
            .filter_map(|(id, from)| {
                diagram.element(id).map(|e| ElementMove {
                    id,
                    from,
                    to: e.position,
                })
            })
            .filter(|m| !m.is_noop())
            .collect();
        if moves.is_empty() {
            return;
        }
        let command = Command::MoveElements {
            diagram: diagram.id,
            moves,
        };
        let selection = self.store.selection().clone();
        self.history.record(&self.store, command, selection);
    }

    fn commit_resize(&mut self, id: ElementId, start: Geometry) {
        let Some(to) = self.store.element(id).map(|e| Geometry {
            position: e.position,
            size: e.size,
        }) else {
            return;
        };
        if to == start {
            return;
        }
        let command = Command::ResizeElement {
            diagram: self.store.active_id(),
            id,
            from: start,
            to,
        };
        let selection = self.store.selection().clone();
        self.history.record(&self.store, command, selection);
    }

    /// Shift adds the hits to the selection; otherwise they replace it, so an
    /// empty box clears it.
    fn commit_box(&mut self, rect: Rect, modifiers: Modifiers) {
        let ids = elements_in_rect(
            &self.store.active_diagram().elements,
            rect,
            self.click_threshold(),
        );
        debug!(hits = ids.len(), additive = modifiers.shift; "Box selection");
        if modifiers.shift {
            if !ids.is_empty() {
                self.store.update_selection(|s| s.extend(ids));
            }
        } else {
            self.store.update_selection(|s| s.select_multiple(ids));
        }
    }

    /// Commits a live drag or resize so a following command sees settled
    /// geometry and the gesture gets its own undo step.
    fn settle_gesture(&mut self) {
        if matches!(self.mode.tag(), ModeTag::Dragging | ModeTag::Resizing) {
            debug!(mode:% = self.mode.tag(); "Settling gesture before command");
            self.finish_gesture(Position::ZERO, Modifiers::NONE);
        }
    }

    /// Abandons the active gesture without touching the history. A drag or
    /// resize snaps back to where it started.
    pub fn cancel_interaction(&mut self) {
        let diagram = self.store.active_id();
        let tag = self.mode.tag();
        let mode = std::mem::take(&mut self.mode);
        let revert = match mode {
            InteractionMode::Idle => return,
            InteractionMode::Dragging { origins, .. } => Some(Command::MoveElements {
                diagram,
                moves: origins
                    .into_iter()
                    .map(|(id, from)| ElementMove { id, from, to: from })
                    .collect(),
            }),
            InteractionMode::Resizing {
                element_id, start, ..
            } => Some(Command::ResizeElement {
                diagram,
                id: element_id,
                from: start,
                to: start,
            }),
            InteractionMode::BoxSelecting { .. } | InteractionMode::CreatingRelationship { .. } => {
                None
            }
        };
        debug!(mode:% = tag; "Interaction cancelled");
        if let Some(command) = revert {
            CommandHistory::preview(&mut self.store, &command, Direction::Forward);
        }
        self.box_preview.clear();
        self.flush();
    }

    /// Enters relationship creation from `source`; the next pointer down on a
    /// different element commits it.
    pub fn start_relationship(
        &mut self,
        source: ElementId,
        relationship_type: RelationshipType,
    ) -> Result<(), EngineError> {
        if !self.mode.is_idle() {
            return Err(EngineError::InteractionInProgress {
                active: self.mode.tag(),
            });
        }
        if !self.store.active_diagram().has_element(source) {
            return Err(EngineError::InvalidEndpoint {
                source_id: source,
                target_id: source,
                problem: EndpointProblem::MissingSource,
            });
        }
        self.set_mode(InteractionMode::CreatingRelationship {
            source_id: source,
            relationship_type,
            temp_endpoint: None,
        });
        Ok(())
    }

    /// Negative deltas zoom in, positive ones zoom out.
    pub fn on_wheel(&mut self, delta: f32, _modifiers: Modifiers) -> bool {
        if delta < 0.0 {
            self.zoom_in()
        } else if delta > 0.0 {
            self.zoom_out()
        } else {
            false
        }
    }

    /// Builds the context menu for a secondary click. Clicking an unselected
    /// element selects it first. Returns `None` for an unknown element.
    pub fn on_context_menu(
        &mut self,
        screen: Position,
        target: Option<ElementId>,
    ) -> Option<ContextMenu> {
        self.cancel_interaction();
        let point = self.viewport.to_diagram(screen);
        let menu = match target {
            None => ContextMenu::for_canvas(point),
            Some(id) => {
                if !self.store.active_diagram().has_element(id) {
                    return None;
                }
                if !self.store.selection().contains(id) {
                    self.store.update_selection(|s| s.select_element(Some(id)));
                }
                ContextMenu::for_element(point, id, self.store.selection().len())
            }
        };
        self.flush();
        Some(menu)
    }

    /// Runs a context-menu entry.
    pub fn choose(&mut self, action: MenuAction) -> Result<(), EngineError> {
        debug!(action:? = action; "Menu action");
        match action {
            MenuAction::StartRelationship {
                source,
                relationship_type,
            } => return self.start_relationship(source, relationship_type),
            MenuAction::CreateElement { element_type, at } => {
                self.create_element(element_type, at, None, None, None);
            }
            MenuAction::DeleteElement(id) => {
                self.delete_element(id);
            }
            MenuAction::DeleteSelection => {
                self.delete_selection();
            }
            MenuAction::Align(direction) => {
                let ids = self.store.selection().element_ids();
                self.align_elements(&ids, direction);
            }
            MenuAction::Distribute(axis) => {
                let ids = self.store.selection().element_ids();
                self.distribute_elements(&ids, axis);
            }
        }
        Ok(())
    }

    // ---- arrangement ----

    fn run_moves(&mut self, description: &str, moves: Vec<ElementMove>) -> bool {
        if moves.is_empty() {
            return false;
        }
        let diagram = self.store.active_id();
        debug!(description = description, moved = moves.len(); "Arranging elements");
        self.history.run(
            &mut self.store,
            Command::Batch {
                description: description.to_string(),
                commands: vec![Command::MoveElements { diagram, moves }],
            },
        );
        self.flush();
        true
    }

    /// Returns true when a command was recorded; an already aligned set records nothing.
    pub fn align_elements(&mut self, ids: &[ElementId], direction: AlignDirection) -> bool {
        self.settle_gesture();
        let moves = plan_alignment(self.store.active_diagram(), ids, direction);
        self.run_moves(direction.label(), moves)
    }

    pub fn distribute_elements(&mut self, ids: &[ElementId], axis: DistributeAxis) -> bool {
        self.settle_gesture();
        let moves = plan_distribution(self.store.active_diagram(), ids, axis);
        let description = match axis {
            DistributeAxis::Horizontal => "Distribute horizontally",
            DistributeAxis::Vertical => "Distribute vertically",
        };
        self.run_moves(description, moves)
    }

    // ---- viewport ----

    fn change_viewport(&mut self, f: impl FnOnce(&mut Viewport) -> bool) -> bool {
        let changed = f(&mut self.viewport);
        if changed {
            let scale = self.viewport.scale();
            debug!(scale = scale; "Viewport changed");
            self.store.emit(DiagramEvent::ViewportChanged { scale });
            self.flush();
        }
        changed
    }

    pub fn zoom_in(&mut self) -> bool {
        self.change_viewport(Viewport::zoom_in)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.change_viewport(Viewport::zoom_out)
    }

    pub fn reset_zoom(&mut self) -> bool {
        let scale = self.config.initial_scale;
        self.change_viewport(|v| v.set_scale(scale))
    }

    pub fn set_scale(&mut self, scale: f32) -> bool {
        self.change_viewport(|v| v.set_scale(scale))
    }

    /// Canvas scroll offset in screen pixels.
    pub fn set_scroll(&mut self, scroll: Position) -> bool {
        self.change_viewport(|v| v.set_scroll(scroll))
    }

    // ---- history ----

    pub fn undo(&mut self) -> bool {
        self.cancel_interaction();
        let undone = self.history.undo(&mut self.store);
        self.flush();
        undone
    }

    pub fn redo(&mut self) -> bool {
        self.cancel_interaction();
        let redone = self.history.redo(&mut self.store);
        self.flush();
        redone
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// `(description, applied)` for every step, oldest first.
    pub fn history_entries(&self) -> Vec<(String, bool)> {
        self.history.entries()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    // ---- diagrams ----

    /// Adds an empty diagram and makes it active.
    pub fn add_diagram(&mut self, name: impl Into<String>, kind: DiagramKind) -> DiagramId {
        self.cancel_interaction();
        let id = self.store.add_diagram(name.into(), kind);
        info!(diagram_id:% = id; "Diagram added");
        self.flush();
        id
    }

    pub fn select_diagram(&mut self, id: DiagramId) -> bool {
        self.cancel_interaction();
        let changed = self.store.activate(id);
        self.flush();
        changed
    }

    /// Refuses to remove the last diagram. Undo steps for the removed diagram
    /// are dropped from the history.
    pub fn remove_diagram(&mut self, id: DiagramId) -> bool {
        self.cancel_interaction();
        let removed = self.store.remove_diagram(id);
        if removed {
            let dropped = self.history.forget_diagram(id);
            info!(diagram_id:% = id, dropped_steps = dropped; "Diagram removed");
        }
        self.flush();
        removed
    }

    // ---- queries ----

    /// Border-to-border route of a relationship: source point, waypoints,
    /// target point.
    pub fn relationship_path(&self, id: RelationshipId) -> Option<Vec<Position>> {
        let diagram = self.store.active_diagram();
        let relationship = diagram.relationship(id)?;
        let source = diagram.element(relationship.source_id)?;
        let target = diagram.element(relationship.target_id)?;
        let points = connection_points(source.bounds(), target.bounds(), &relationship.waypoints);
        let mut path = Vec::with_capacity(relationship.waypoints.len() + 2);
        path.push(points.source);
        path.extend(relationship.waypoints.iter().copied());
        path.push(points.target);
        Some(path)
    }

    /// What lies under a screen point: a handle of the single selected
    /// element, then the topmost element, then a relationship line.
    pub fn hit_test(&self, screen: Position) -> PointerTarget {
        let point = self.viewport.to_diagram(screen);
        let diagram = self.store.active_diagram();

        if let Some(element) = self.store.selection().primary().and_then(|id| diagram.element(id)) {
            let half = self.config.handle_size * 0.5;
            let bounds = element.bounds();
            for handle in ResizeHandle::ALL {
                let anchor = self.viewport.to_screen(handle.anchor(bounds));
                if (screen.x - anchor.x).abs() <= half && (screen.y - anchor.y).abs() <= half {
                    return PointerTarget::Handle(element.id, handle);
                }
            }
        }

        if let Some(element) = diagram.elements.iter().rev().find(|e| e.bounds().contains(point)) {
            return PointerTarget::Element(element.id);
        }

        let tolerance = self.config.hit_tolerance / self.viewport.scale();
        diagram
            .relationships
            .iter()
            .rev()
            .find(|r| {
                self.relationship_path(r.id)
                    .is_some_and(|path| distance_to_polyline(point, &path) <= tolerance)
            })
            .map_or(PointerTarget::Canvas, |r| PointerTarget::Relationship(r.id))
    }
}
