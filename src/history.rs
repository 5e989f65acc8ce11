//! Undoable model mutations.
//!
//! A [`Command`] is plain data describing one change together with everything
//! needed to reverse it exactly. [`CommandHistory`] keeps a linear list of
//! applied commands with a cursor; running a new command drops everything
//! after the cursor.

use log::debug;

use crate::model::{
    Diagram, DiagramId, Element, ElementId, ElementUpdate, Position, Relationship,
    RelationshipId, RelationshipUpdate, Size,
};
use crate::selection::Selection;
use crate::store::DiagramStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementMove {
    pub id: ElementId,
    pub from: Position,
    pub to: Position,
}

impl ElementMove {
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    pub position: Position,
    pub size: Size,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    AddElement {
        diagram: DiagramId,
        element: Element,
    },
    UpdateElement {
        diagram: DiagramId,
        before: Element,
        after: Element,
    },
    /// Removing an element also removes every relationship touching it; the
    /// original indices are kept so undo restores the exact ordering.
    DeleteElement {
        diagram: DiagramId,
        index: usize,
        element: Element,
        relationships: Vec<(usize, Relationship)>,
    },
    AddRelationship {
        diagram: DiagramId,
        relationship: Relationship,
    },
    UpdateRelationship {
        diagram: DiagramId,
        before: Relationship,
        after: Relationship,
    },
    DeleteRelationship {
        diagram: DiagramId,
        index: usize,
        relationship: Relationship,
    },
    MoveElements {
        diagram: DiagramId,
        moves: Vec<ElementMove>,
    },
    ResizeElement {
        diagram: DiagramId,
        id: ElementId,
        from: Geometry,
        to: Geometry,
    },
    Batch {
        description: String,
        commands: Vec<Command>,
    },
}

impl Command {
    pub fn update_element(
        diagram: &Diagram,
        id: ElementId,
        update: &ElementUpdate,
    ) -> Option<Command> {
        let before = diagram.element(id)?.clone();
        let mut after = before.clone();
        update.apply_to(&mut after);
        (after != before).then(|| Command::UpdateElement {
            diagram: diagram.id,
            before,
            after,
        })
    }

    pub fn delete_element(diagram: &Diagram, id: ElementId) -> Option<Command> {
        let index = diagram.element_index(id)?;
        let relationships = diagram
            .relationships
            .iter()
            .enumerate()
            .filter(|(_, r)| r.touches(id))
            .map(|(i, r)| (i, r.clone()))
            .collect();
        Some(Command::DeleteElement {
            diagram: diagram.id,
            index,
            element: diagram.elements[index].clone(),
            relationships,
        })
    }

    pub fn update_relationship(
        diagram: &Diagram,
        id: RelationshipId,
        update: &RelationshipUpdate,
    ) -> Option<Command> {
        let before = diagram.relationship(id)?.clone();
        let mut after = before.clone();
        update.apply_to(&mut after);
        (after != before).then(|| Command::UpdateRelationship {
            diagram: diagram.id,
            before,
            after,
        })
    }

    pub fn delete_relationship(diagram: &Diagram, id: RelationshipId) -> Option<Command> {
        let index = diagram.relationship_index(id)?;
        Some(Command::DeleteRelationship {
            diagram: diagram.id,
            index,
            relationship: diagram.relationships[index].clone(),
        })
    }

    /// Diagram the command targets; for a batch, its first child's.
    pub fn diagram(&self) -> Option<DiagramId> {
        match self {
            Command::AddElement { diagram, .. }
            | Command::UpdateElement { diagram, .. }
            | Command::DeleteElement { diagram, .. }
            | Command::AddRelationship { diagram, .. }
            | Command::UpdateRelationship { diagram, .. }
            | Command::DeleteRelationship { diagram, .. }
            | Command::MoveElements { diagram, .. }
            | Command::ResizeElement { diagram, .. } => Some(*diagram),
            Command::Batch { commands, .. } => commands.iter().find_map(Command::diagram),
        }
    }

    pub fn description(&self) -> String {
        match self {
            Command::AddElement { element, .. } => format!("Add {}", element.element_type),
            Command::UpdateElement { after, .. } => format!("Edit {}", after.name),
            Command::DeleteElement { element, .. } => format!("Delete {}", element.name),
            Command::AddRelationship { relationship, .. } => {
                format!("Add {}", relationship.relationship_type)
            }
            Command::UpdateRelationship { after, .. } => {
                format!("Edit {}", after.relationship_type)
            }
            Command::DeleteRelationship { relationship, .. } => {
                format!("Delete {}", relationship.relationship_type)
            }
            Command::MoveElements { moves, .. } if moves.len() == 1 => "Move element".to_string(),
            Command::MoveElements { moves, .. } => format!("Move {} elements", moves.len()),
            Command::ResizeElement { .. } => "Resize element".to_string(),
            Command::Batch { description, .. } => description.clone(),
        }
    }

    /// Applies the command or its inverse. Ids that no longer exist are skipped.
    pub(crate) fn apply(&self, store: &mut DiagramStore, direction: Direction) {
        use Direction::{Backward, Forward};
        match (self, direction) {
            (Command::AddElement { diagram, element }, Forward) => {
                if store.insert_element(*diagram, element.clone(), None) {
                    store.update_selection(|s| s.select_element(Some(element.id)));
                }
            }
            (Command::AddElement { diagram, element }, Backward) => {
                store.remove_element(*diagram, element.id);
            }
            (Command::UpdateElement { diagram, after, .. }, Forward) => {
                store.replace_element(*diagram, after.clone());
            }
            (Command::UpdateElement { diagram, before, .. }, Backward) => {
                store.replace_element(*diagram, before.clone());
            }
            (
                Command::DeleteElement {
                    diagram,
                    element,
                    relationships,
                    ..
                },
                Forward,
            ) => {
                for (_, r) in relationships.iter().rev() {
                    store.remove_relationship(*diagram, r.id);
                }
                store.remove_element(*diagram, element.id);
            }
            (
                Command::DeleteElement {
                    diagram,
                    index,
                    element,
                    relationships,
                },
                Backward,
            ) => {
                store.insert_element(*diagram, element.clone(), Some(*index));
                for (i, r) in relationships {
                    store.insert_relationship(*diagram, r.clone(), Some(*i));
                }
            }
            (
                Command::AddRelationship {
                    diagram,
                    relationship,
                },
                Forward,
            ) => {
                if store.insert_relationship(*diagram, relationship.clone(), None) {
                    store.update_selection(|s| s.select_relationship(Some(relationship.id)));
                }
            }
            (
                Command::AddRelationship {
                    diagram,
                    relationship,
                },
                Backward,
            ) => {
                store.remove_relationship(*diagram, relationship.id);
            }
            (Command::UpdateRelationship { diagram, after, .. }, Forward) => {
                store.replace_relationship(*diagram, after.clone());
            }
            (Command::UpdateRelationship { diagram, before, .. }, Backward) => {
                store.replace_relationship(*diagram, before.clone());
            }
            (
                Command::DeleteRelationship {
                    diagram,
                    relationship,
                    ..
                },
                Forward,
            ) => {
                store.remove_relationship(*diagram, relationship.id);
            }
            (
                Command::DeleteRelationship {
                    diagram,
                    index,
                    relationship,
                },
                Backward,
            ) => {
                store.insert_relationship(*diagram, relationship.clone(), Some(*index));
            }
            (Command::MoveElements { diagram, moves }, direction) => {
                for m in moves {
                    let to = if direction == Forward { m.to } else { m.from };
                    store.set_element_geometry(*diagram, m.id, to, None);
                }
            }
            (
                Command::ResizeElement {
                    diagram,
                    id,
                    from,
                    to,
                },
                direction,
            ) => {
                let g = if direction == Forward { to } else { from };
                store.set_element_geometry(*diagram, *id, g.position, Some(g.size));
            }
            (Command::Batch { commands, .. }, Forward) => {
                for command in commands {
                    command.apply(store, Forward);
                }
            }
            (Command::Batch { commands, .. }, Backward) => {
                for command in commands.iter().rev() {
                    command.apply(store, Backward);
                }
            }
        }
    }
}

#[derive(Clone, Debug)]
struct HistoryEntry {
    command: Command,
    selection_before: Selection,
    selection_after: Selection,
}

/// Commands applied one at a time against the live store, recorded as a
/// single undo step when committed.
#[derive(Debug)]
pub(crate) struct Transaction {
    description: String,
    selection_before: Selection,
    commands: Vec<Command>,
}

impl Transaction {
    pub(crate) fn apply(&mut self, store: &mut DiagramStore, command: Command) {
        command.apply(store, Direction::Forward);
        self.commands.push(command);
    }
}

#[derive(Debug, Default)]
pub struct CommandHistory {
    entries: Vec<HistoryEntry>,
    cursor: usize,
    limit: Option<usize>,
}

impl CommandHistory {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Applies `command` and records it as the newest undo step.
    pub(crate) fn run(&mut self, store: &mut DiagramStore, command: Command) {
        let selection_before = store.selection().clone();
        command.apply(store, Direction::Forward);
        self.push(store, command, selection_before);
    }

    /// Records a command whose effect is already in the store, e.g. the end
    /// of a drag that was previewed live.
    pub(crate) fn record(
        &mut self,
        store: &DiagramStore,
        command: Command,
        selection_before: Selection,
    ) {
        self.push(store, command, selection_before);
    }

    /// Applies a command without recording it.
    pub(crate) fn preview(store: &mut DiagramStore, command: &Command, direction: Direction) {
        command.apply(store, direction);
    }

    pub(crate) fn begin(store: &DiagramStore, description: impl Into<String>) -> Transaction {
        Transaction {
            description: description.into(),
            selection_before: store.selection().clone(),
            commands: Vec::new(),
        }
    }

    /// Records a transaction; a single command is stored unwrapped. Returns
    /// false when the transaction did nothing.
    pub(crate) fn commit(&mut self, store: &DiagramStore, mut tx: Transaction) -> bool {
        let command = match tx.commands.len() {
            0 => return false,
            1 => tx.commands.remove(0),
            _ => Command::Batch {
                description: tx.description,
                commands: tx.commands,
            },
        };
        self.push(store, command, tx.selection_before);
        true
    }

    fn push(&mut self, store: &DiagramStore, command: Command, selection_before: Selection) {
        debug!(command = command.description(), cursor = self.cursor; "Recording command");
        self.entries.truncate(self.cursor);
        self.entries.push(HistoryEntry {
            command,
            selection_before,
            selection_after: store.selection().clone(),
        });
        if let Some(limit) = self.limit
            && self.entries.len() > limit
        {
            let overflow = self.entries.len() - limit;
            self.entries.drain(..overflow);
        }
        self.cursor = self.entries.len();
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    pub(crate) fn undo(&mut self, store: &mut DiagramStore) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.cursor -= 1;
        let entry = &self.entries[self.cursor];
        debug!(command = entry.command.description(); "Undo");
        if let Some(diagram) = entry.command.diagram() {
            store.activate(diagram);
        }
        entry.command.apply(store, Direction::Backward);
        store.restore_selection(&entry.selection_before);
        true
    }

    pub(crate) fn redo(&mut self, store: &mut DiagramStore) -> bool {
        if !self.can_redo() {
            return false;
        }
        let entry = &self.entries[self.cursor];
        debug!(command = entry.command.description(); "Redo");
        if let Some(diagram) = entry.command.diagram() {
            store.activate(diagram);
        }
        entry.command.apply(store, Direction::Forward);
        store.restore_selection(&entry.selection_after);
        self.cursor += 1;
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    /// Drops every step that targets `diagram`, keeping the cursor on the
    /// same surviving step. Returns how many steps were dropped.
    pub(crate) fn forget_diagram(&mut self, diagram: DiagramId) -> usize {
        let before = self.entries.len();
        let mut kept = Vec::with_capacity(before);
        let mut cursor = self.cursor;
        for (i, entry) in self.entries.drain(..).enumerate() {
            if entry.command.diagram() == Some(diagram) {
                if i < self.cursor {
                    cursor -= 1;
                }
            } else {
                kept.push(entry);
            }
        }
        self.entries = kept;
        self.cursor = cursor;
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Descriptions of all steps, oldest first, each flagged with whether it
    /// is currently applied.
    pub fn entries(&self) -> Vec<(String, bool)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.command.description(), i < self.cursor))
            .collect()
    }
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;
    use crate::model::{ElementType, Project, RelationshipType};
    use std::collections::BTreeMap;

    #[derive(Clone, Debug)]
    enum Op {
        Add(f32, f32),
        Move(usize, f32, f32),
        Resize(usize, f32, f32),
        Rename(usize, u8),
        Delete(usize),
        DeletePair(usize, usize),
        Connect(usize, usize, usize),
        Disconnect(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (-500.0f32..500.0, -500.0f32..500.0).prop_map(|(x, y)| Op::Add(x, y)),
            2 => (0usize..8, -50.0f32..50.0, -50.0f32..50.0)
                .prop_map(|(i, dx, dy)| Op::Move(i, dx, dy)),
            1 => (0usize..8, 50.0f32..300.0, 50.0f32..300.0)
                .prop_map(|(i, w, h)| Op::Resize(i, w, h)),
            1 => (0usize..8, 0u8..4).prop_map(|(i, n)| Op::Rename(i, n)),
            1 => (0usize..8).prop_map(Op::Delete),
            1 => (0usize..8, 0usize..8).prop_map(|(i, j)| Op::DeletePair(i, j)),
            2 => (0usize..8, 0usize..8, 0usize..RelationshipType::ALL.len())
                .prop_map(|(i, j, t)| Op::Connect(i, j, t)),
            1 => (0usize..8).prop_map(Op::Disconnect),
        ]
    }

    fn pick(diagram: &Diagram, i: usize) -> Option<Element> {
        (!diagram.elements.is_empty()).then(|| diagram.elements[i % diagram.elements.len()].clone())
    }

    fn build(store: &mut DiagramStore, op: &Op) -> Option<Command> {
        match op {
            Op::Add(x, y) => {
                let id = ElementId(store.allocate_id());
                Some(Command::AddElement {
                    diagram: store.active_id(),
                    element: Element {
                        id,
                        element_type: ElementType::Part,
                        name: id.to_string(),
                        description: None,
                        position: Position::new(*x, *y),
                        size: Size::new(80.0, 40.0),
                        stereotype: None,
                        properties: BTreeMap::new(),
                    },
                })
            }
            Op::Connect(i, j, t) => {
                let diagram = store.active_diagram();
                let (source, target) = (pick(diagram, *i)?, pick(diagram, *j)?);
                if source.id == target.id {
                    return None;
                }
                let diagram = diagram.id;
                let id = RelationshipId(store.allocate_id());
                Some(Command::AddRelationship {
                    diagram,
                    relationship: Relationship {
                        id,
                        relationship_type: RelationshipType::ALL[*t],
                        source_id: source.id,
                        target_id: target.id,
                        name: None,
                        label: None,
                        description: None,
                        waypoints: Vec::new(),
                        properties: None,
                    },
                })
            }
            Op::Move(i, dx, dy) => {
                let diagram = store.active_diagram();
                pick(diagram, *i).map(|e| Command::MoveElements {
                    diagram: diagram.id,
                    moves: vec![ElementMove {
                        id: e.id,
                        from: e.position,
                        to: e.position.add(Position::new(*dx, *dy)),
                    }],
                })
            }
            Op::Resize(i, w, h) => {
                let diagram = store.active_diagram();
                pick(diagram, *i).map(|e| Command::ResizeElement {
                    diagram: diagram.id,
                    id: e.id,
                    from: Geometry {
                        position: e.position,
                        size: e.size,
                    },
                    to: Geometry {
                        position: e.position,
                        size: Size::new(*w, *h),
                    },
                })
            }
            Op::Rename(i, n) => {
                let diagram = store.active_diagram();
                let e = pick(diagram, *i)?;
                Command::update_element(diagram, e.id, &ElementUpdate::name(format!("renamed {n}")))
            }
            Op::Delete(i) => {
                let diagram = store.active_diagram();
                pick(diagram, *i).and_then(|e| Command::delete_element(diagram, e.id))
            }
            Op::Disconnect(i) => {
                let diagram = store.active_diagram();
                let relationships = &diagram.relationships;
                if relationships.is_empty() {
                    return None;
                }
                let id = relationships[i % relationships.len()].id;
                Command::delete_relationship(diagram, id)
            }
            Op::DeletePair(..) => None,
        }
    }

    /// Runs `op` as one history step. Returns false when it recorded nothing.
    fn run_op(store: &mut DiagramStore, history: &mut CommandHistory, op: &Op) -> bool {
        if let Op::DeletePair(i, j) = op {
            let ids: Vec<ElementId> = [*i, *j]
                .iter()
                .filter_map(|&k| pick(store.active_diagram(), k).map(|e| e.id))
                .collect();
            let mut tx = CommandHistory::begin(store, "Delete pair");
            for id in ids {
                if let Some(command) = Command::delete_element(store.active_diagram(), id) {
                    tx.apply(store, command);
                }
            }
            return history.commit(store, tx);
        }
        match build(store, op) {
            Some(command) => {
                history.run(store, command);
                true
            }
            None => false,
        }
    }

    /// Every undo lands exactly on the state before its step and every redo
    /// on the state after it, selection included.
    fn check_undo_redo_round_trip(ops: Vec<Op>) -> Result<(), TestCaseError> {
        let mut store = DiagramStore::new(Project::new("p"));
        let mut history = CommandHistory::default();
        let mut states = vec![(store.active_diagram().clone(), store.selection().clone())];
        for op in &ops {
            if run_op(&mut store, &mut history, op) {
                states.push((store.active_diagram().clone(), store.selection().clone()));
            }
        }
        prop_assert_eq!(history.len(), states.len() - 1);

        for step in (0..states.len() - 1).rev() {
            prop_assert!(history.undo(&mut store));
            prop_assert_eq!(store.active_diagram(), &states[step].0);
            prop_assert_eq!(store.selection(), &states[step].1);
        }
        prop_assert!(!history.undo(&mut store));

        for step in 1..states.len() {
            prop_assert!(history.redo(&mut store));
            prop_assert_eq!(store.active_diagram(), &states[step].0);
            prop_assert_eq!(store.selection(), &states[step].1);
        }
        prop_assert!(!history.redo(&mut store));
        Ok(())
    }

    proptest! {
        #[test]
        fn undo_redo_round_trip(ops in prop::collection::vec(op_strategy(), 0..32)) {
            check_undo_redo_round_trip(ops)?;
        }
    }
}
