//! End-to-end scenarios driven only through the public engine API, the way a
//! canvas host would drive it.

use std::cell::RefCell;
use std::rc::Rc;

use sysml_canvas::{
    AlignDirection, DiagramEvent, ElementId, ElementType, Engine, EngineConfig, ModeTag,
    Modifiers, PointerTarget, Position, Project, RelationshipType, ResizeHandle, Size,
};

fn engine() -> Engine {
    Engine::init(Project::new("scenarios"), EngineConfig::default())
}

fn part(engine: &mut Engine, x: f32, y: f32) -> ElementId {
    engine
        .create_element(ElementType::Part, Position::new(x, y), None, None, None)
        .id
}

fn block(engine: &mut Engine, x: f32, y: f32, w: f32, h: f32) -> ElementId {
    engine
        .create_element(
            ElementType::Part,
            Position::new(x, y),
            Some(Size::new(w, h)),
            None,
            None,
        )
        .id
}

/// Pointer down, a few moves and pointer up, resolving targets like a host.
fn gesture(engine: &mut Engine, path: &[(f32, f32)], modifiers: Modifiers) {
    let Some((&(x, y), rest)) = path.split_first() else {
        return;
    };
    let start = Position::new(x, y);
    let target = engine.hit_test(start);
    engine
        .on_pointer_down(start, modifiers, target)
        .expect("pointer down accepted");
    let mut last = start;
    for &(x, y) in rest {
        last = Position::new(x, y);
        let target = engine.hit_test(last);
        engine.on_pointer_move(last, modifiers, target);
    }
    let target = engine.hit_test(last);
    engine.on_pointer_up(last, modifiers, target);
}

fn position(engine: &Engine, id: ElementId) -> Position {
    engine.element(id).expect("element exists").position
}

#[test]
fn draw_dependency_then_undo() {
    let mut engine = engine();
    let e1 = part(&mut engine, 100.0, 100.0);
    let e2 = part(&mut engine, 400.0, 100.0);
    assert_eq!(engine.selection().element_ids(), vec![e2]);

    engine
        .start_relationship(e1, RelationshipType::Dependency)
        .expect("idle engine accepts a new relationship");
    assert_eq!(engine.mode().tag(), ModeTag::CreatingRelationship);

    let hover = Position::new(400.0, 130.0);
    let target = engine.hit_test(hover);
    assert_eq!(target, PointerTarget::Element(e2));
    engine.on_pointer_move(hover, Modifiers::NONE, target);
    assert_eq!(
        engine.snapshot().pending_relationship.and_then(|p| p.endpoint),
        Some(hover)
    );

    let click = Position::new(450.0, 150.0);
    let target = engine.hit_test(click);
    engine
        .on_pointer_down(click, Modifiers::NONE, target)
        .expect("second element completes the relationship");
    engine.on_pointer_up(click, Modifiers::NONE, target);

    assert_eq!(engine.mode().tag(), ModeTag::Idle);
    let relationships = &engine.diagram().relationships;
    assert_eq!(relationships.len(), 1);
    let relationship = &relationships[0];
    assert_eq!(relationship.relationship_type, RelationshipType::Dependency);
    assert_eq!((relationship.source_id, relationship.target_id), (e1, e2));
    assert_eq!(engine.selection().relationship(), Some(relationship.id));

    assert!(engine.undo());
    assert!(engine.diagram().relationships.is_empty());
    assert_eq!(engine.selection().element_ids(), vec![e2]);
    assert_eq!(engine.selection().relationship(), None);
}

#[test]
fn deleting_an_element_takes_its_relationships_along() {
    let mut engine = engine();
    let a = part(&mut engine, 0.0, 0.0);
    let b = part(&mut engine, 300.0, 0.0);
    let c = part(&mut engine, 600.0, 0.0);
    engine
        .create_relationship(RelationshipType::Satisfy, a, b, None, Vec::new())
        .expect("valid endpoints");
    engine
        .create_relationship(RelationshipType::Allocate, b, c, None, Vec::new())
        .expect("valid endpoints");
    engine
        .create_relationship(RelationshipType::Verify, c, a, None, Vec::new())
        .expect("valid endpoints");
    let before = engine.diagram().clone();

    assert!(engine.delete_element(b));
    let diagram = engine.diagram();
    assert!(diagram.element(b).is_none());
    assert_eq!(diagram.relationships.len(), 1);
    assert!(diagram.relationships.iter().all(|r| !r.touches(b)));

    assert!(engine.undo());
    assert_eq!(engine.diagram(), &before);
}

#[test]
fn dragging_a_selection_preserves_relative_offsets() {
    let mut engine = engine();
    let a = block(&mut engine, 0.0, 0.0, 100.0, 100.0);
    let b = block(&mut engine, 200.0, 50.0, 100.0, 100.0);
    let c = block(&mut engine, 400.0, 300.0, 100.0, 100.0);
    engine.select_multiple(&[a, b, c]);

    gesture(
        &mut engine,
        &[(250.0, 100.0), (260.0, 110.0), (300.0, 140.0)],
        Modifiers::NONE,
    );

    assert_eq!(position(&engine, a), Position::new(50.0, 40.0));
    assert_eq!(position(&engine, b), Position::new(250.0, 90.0));
    assert_eq!(position(&engine, c), Position::new(450.0, 340.0));
    assert_eq!(engine.selection().len(), 3);

    let entries = engine.history_entries();
    assert_eq!(
        entries.last().map(|(d, applied)| (d.as_str(), *applied)),
        Some(("Move 3 elements", true))
    );
    assert!(engine.undo());
    assert_eq!(position(&engine, a), Position::new(0.0, 0.0));
    assert_eq!(position(&engine, c), Position::new(400.0, 300.0));
}

#[test]
fn undo_everything_then_redo_everything() {
    let mut engine = engine();
    let a = part(&mut engine, 0.0, 0.0);
    let b = part(&mut engine, 300.0, 200.0);
    engine
        .create_relationship(RelationshipType::Containment, a, b, None, Vec::new())
        .expect("valid endpoints");
    gesture(&mut engine, &[(10.0, 10.0), (60.0, 40.0)], Modifiers::NONE);
    let done = engine.diagram().clone();

    let mut undone = 0;
    while engine.undo() {
        undone += 1;
    }
    assert_eq!(undone, 4);
    assert!(engine.diagram().elements.is_empty());
    assert!(!engine.can_undo());

    while engine.redo() {}
    assert_eq!(engine.diagram(), &done);
    assert!(!engine.can_redo());
}

#[test]
fn box_selection_replaces_extends_and_clears() {
    let mut engine = engine();
    let a = block(&mut engine, 0.0, 0.0, 50.0, 50.0);
    let b = block(&mut engine, 200.0, 0.0, 50.0, 50.0);
    let c = block(&mut engine, 400.0, 0.0, 50.0, 50.0);

    gesture(&mut engine, &[(-20.0, -20.0), (100.0, 100.0)], Modifiers::NONE);
    assert_eq!(engine.selection().element_ids(), vec![a]);

    gesture(&mut engine, &[(380.0, -20.0), (500.0, 100.0)], Modifiers::SHIFT);
    assert_eq!(engine.selection().element_ids(), vec![a, c]);

    // an empty shift box keeps the selection
    gesture(&mut engine, &[(100.0, 200.0), (150.0, 260.0)], Modifiers::SHIFT);
    assert_eq!(engine.selection().element_ids(), vec![a, c]);

    // a plain click on the canvas clears it
    gesture(&mut engine, &[(100.0, 200.0)], Modifiers::NONE);
    assert!(engine.selection().is_empty());
    assert!(!engine.selection().contains(b));
}

#[test]
fn box_preview_tracks_the_rubber_band() {
    let mut engine = engine();
    let a = block(&mut engine, 0.0, 0.0, 50.0, 50.0);
    engine.select_element(None);

    let start = Position::new(100.0, 100.0);
    engine
        .on_pointer_down(start, Modifiers::NONE, PointerTarget::Canvas)
        .expect("canvas press");
    engine.on_pointer_move(Position::new(20.0, 20.0), Modifiers::NONE, PointerTarget::Canvas);
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.mode, ModeTag::BoxSelecting);
    assert_eq!(snapshot.box_preview, &[a]);
    assert!(snapshot.selection.is_empty());
}

#[test]
fn resizing_stops_at_the_minimum_size() {
    let mut engine = engine();
    let id = block(&mut engine, 100.0, 100.0, 200.0, 100.0);
    let nw = Position::new(100.0, 100.0);
    assert_eq!(engine.hit_test(nw), PointerTarget::Handle(id, ResizeHandle::NW));

    gesture(&mut engine, &[(100.0, 100.0), (600.0, 600.0)], Modifiers::NONE);
    let element = engine.element(id).expect("element exists");
    assert_eq!(element.size, Size::new(50.0, 50.0));
    assert_eq!(element.position, Position::new(250.0, 150.0));

    assert!(engine.undo());
    let element = engine.element(id).expect("element exists");
    assert_eq!(element.size, Size::new(200.0, 100.0));
    assert_eq!(element.position, Position::new(100.0, 100.0));
}

#[test]
fn aligning_is_one_undo_step_and_idempotent() {
    let mut engine = engine();
    let ids = [
        block(&mut engine, 10.0, 0.0, 80.0, 40.0),
        block(&mut engine, 35.0, 100.0, 60.0, 40.0),
        block(&mut engine, 70.0, 200.0, 90.0, 40.0),
    ];
    let steps = engine.history_entries().len();

    assert!(engine.align_elements(&ids, AlignDirection::Right));
    assert_eq!(engine.history_entries().len(), steps + 1);
    for id in ids {
        let element = engine.element(id).expect("element exists");
        assert_eq!(element.bounds().right(), 160.0);
    }
    assert!(!engine.align_elements(&ids, AlignDirection::Right));
    assert_eq!(engine.history_entries().len(), steps + 1);

    assert!(engine.undo());
    assert_eq!(position(&engine, ids[0]), Position::new(10.0, 0.0));
    assert_eq!(position(&engine, ids[1]), Position::new(35.0, 100.0));
}

#[test]
fn zoom_and_scroll_shift_the_pointer_mapping() {
    let mut engine = engine();
    let id = block(&mut engine, 100.0, 100.0, 100.0, 100.0);
    engine.select_element(None);
    assert!(engine.set_scale(2.0));
    assert!(engine.set_scroll(Position::new(100.0, 100.0)));

    // diagram (150, 150) is screen (200, 200)
    assert_eq!(engine.hit_test(Position::new(200.0, 200.0)), PointerTarget::Element(id));
    gesture(&mut engine, &[(200.0, 200.0), (240.0, 220.0)], Modifiers::NONE);
    assert_eq!(position(&engine, id), Position::new(120.0, 110.0));
}

#[test]
fn subscribers_see_every_change_in_order() {
    let mut engine = engine();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let subscription = engine.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    let id = part(&mut engine, 0.0, 0.0);
    engine.delete_element(id);
    assert_eq!(
        seen.borrow().as_slice(),
        &[
            DiagramEvent::ElementAdded(id),
            DiagramEvent::SelectionChanged,
            DiagramEvent::SelectionChanged,
            DiagramEvent::ElementRemoved(id),
        ]
    );

    assert!(engine.unsubscribe(subscription));
    seen.borrow_mut().clear();
    part(&mut engine, 0.0, 0.0);
    assert!(seen.borrow().is_empty());
}
