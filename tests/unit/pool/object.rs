use std::cell::Cell;

use super::*;
use crate::foundation::core::Color;
use crate::test_support::{Call, RecordingPainter};

fn filled(x: f64) -> DrawMethod {
    DrawMethod::FilledRect {
        dest: Rect::new(x, 0.0, x + 4.0, 4.0),
    }
}

#[test]
fn new_object_owns_its_geometry() {
    let obj = DrawObject::from_method(PainterState::default(), filled(0.0), DrawMode::Triangles);
    assert_eq!(obj.methods().len(), 1);
    assert!(!obj.has_shared_coords());
    assert_eq!(obj.coords().unwrap().len(), 1);
    assert_eq!(obj.bounds(), Some(Rect::new(0.0, 0.0, 4.0, 4.0)));
}

#[test]
fn push_method_extends_geometry_and_bounds() {
    let mut obj =
        DrawObject::from_method(PainterState::default(), filled(0.0), DrawMode::Triangles);
    obj.push_method(filled(10.0));
    assert_eq!(obj.methods().len(), 2);
    assert_eq!(obj.coords().unwrap().len(), 2);
    assert_eq!(obj.bounds(), Some(Rect::new(0.0, 0.0, 14.0, 4.0)));
}

#[test]
fn push_method_never_mutates_a_buffer_held_elsewhere() {
    let mut obj =
        DrawObject::from_method(PainterState::default(), filled(0.0), DrawMode::Triangles);
    let held = Rc::clone(obj.coords().unwrap());
    obj.push_method(filled(10.0));
    assert_eq!(held.len(), 1);
    assert_eq!(obj.coords().unwrap().len(), 2);
}

#[test]
fn merge_requires_exact_state_and_batchable_mode() {
    let state = PainterState::default();
    let obj = DrawObject::from_method(state.clone(), filled(0.0), DrawMode::Triangles);
    assert!(obj.can_merge(&state, DrawMode::Triangles));
    assert!(!obj.can_merge(&state, DrawMode::TriangleStrip));
    let other = PainterState {
        color: Color::BLACK,
        ..state.clone()
    };
    assert!(!obj.can_merge(&other, DrawMode::Triangles));

    let strip = DrawObject::from_method(state.clone(), filled(0.0), DrawMode::TriangleStrip);
    assert!(!strip.can_merge(&state, DrawMode::TriangleStrip));

    let shared = DrawObject::from_coords(
        state.clone(),
        Rc::new(CoordsBuffer::new()),
        DrawMethod::FillCoords,
        DrawMode::Triangles,
    );
    assert!(!shared.can_merge(&state, DrawMode::Triangles));
}

#[test]
fn action_objects_are_barriers_and_run_once() {
    let ran = Rc::new(Cell::new(0));
    let r = Rc::clone(&ran);
    let mut obj = DrawObject::from_action(Box::new(move |p: &mut dyn Painter| {
        r.set(r.get() + 1);
        p.clear(Color::BLACK);
    }));
    assert!(obj.is_reorder_barrier());
    assert!(!obj.can_merge(&PainterState::default(), DrawMode::Triangles));

    let mut painter = RecordingPainter::default();
    obj.replay(&mut painter);
    obj.replay(&mut painter);
    assert_eq!(ran.get(), 1);
    assert!(!obj.has_action());
    assert_eq!(painter.calls, vec![Call::Clear(Color::BLACK)]);
}

#[test]
fn dropping_an_unreplayed_action_releases_its_captures() {
    let token = Rc::new(());
    let captured = Rc::clone(&token);
    let obj = DrawObject::from_action(Box::new(move |_p: &mut dyn Painter| {
        let _keep = &captured;
    }));
    assert_eq!(Rc::strong_count(&token), 2);
    drop(obj);
    assert_eq!(Rc::strong_count(&token), 1);
}

#[test]
fn replay_submits_state_then_geometry_once() {
    let mut obj =
        DrawObject::from_method(PainterState::default(), filled(0.0), DrawMode::Triangles);
    obj.push_method(filled(10.0));
    let mut painter = RecordingPainter::default();
    obj.replay(&mut painter);
    assert_eq!(painter.calls.len(), 2);
    assert!(matches!(painter.calls[0], Call::State(_)));
    assert_eq!(painter.draw_count(), 1);
}

#[test]
fn empty_shared_buffer_is_a_noop() {
    let mut obj = DrawObject::from_coords(
        PainterState::default(),
        Rc::new(CoordsBuffer::new()),
        DrawMethod::FillCoords,
        DrawMode::Triangles,
    );
    assert!(obj.is_noop());
    assert!(obj.is_reorder_barrier());
    let mut painter = RecordingPainter::default();
    obj.replay(&mut painter);
    assert!(painter.calls.is_empty());
}
