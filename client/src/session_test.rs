use canvas::doc::Shape;
use frames::{ApplyMask, ElementPoint, RemoveElement, StartLine};

use super::*;

fn names(events: &[Event]) -> Vec<&'static str> {
    events.iter().map(Event::name).collect()
}

fn started_id(event: &Event) -> String {
    match event {
        Event::StartLine(StartLine { id, .. }) => id.clone(),
        other => panic!("expected start-line, got {other:?}"),
    }
}

fn draw_line(session: &mut Session, points: &[(f64, f64)]) -> String {
    session.set_tool(Tool::Pencil);
    let (x, y) = points[0];
    let id = started_id(&session.pointer_down(Point::new(x, y))[0]);
    for &(x, y) in &points[1..] {
        session.pointer_move(Point::new(x, y));
    }
    session.pointer_up();
    id
}

#[test]
fn pencil_gesture_starts_then_extends() {
    let mut session = Session::new("r1");
    let down = session.pointer_down(Point::new(10.0, 10.0));
    let id = started_id(&down[0]);
    let moves: Vec<Event> = [(20.0, 10.0), (20.0, 20.0)]
        .into_iter()
        .flat_map(|(x, y)| session.pointer_move(Point::new(x, y)))
        .collect();
    assert!(session.pointer_up().is_empty());

    assert_eq!(
        moves,
        vec![
            Event::DrawLine(ElementPoint { room_id: "r1".into(), id: id.clone(), point: Point::new(20.0, 10.0) }),
            Event::DrawLine(ElementPoint { room_id: "r1".into(), id: id.clone(), point: Point::new(20.0, 20.0) }),
        ]
    );
    assert_eq!(
        session.mirror().store().get(&id).expect("line").shape,
        Shape::Line { points: vec![Point::new(10.0, 10.0), Point::new(20.0, 10.0), Point::new(20.0, 20.0)] }
    );
    assert!(!session.is_busy());
}

#[test]
fn moves_without_gesture_send_nothing() {
    let mut session = Session::new("r1");
    assert!(session.pointer_move(Point::new(1.0, 1.0)).is_empty());
    assert!(session.pointer_up().is_empty());
}

#[test]
fn rect_gesture_is_one_undo_step() {
    let mut session = Session::new("r1");
    session.set_tool(Tool::Rect);
    let id = started_id(&session.pointer_down(Point::new(0.0, 0.0))[0]);
    session.pointer_move(Point::new(5.0, 5.0));
    session.pointer_move(Point::new(10.0, 8.0));
    session.pointer_up();

    assert_eq!(
        session.mirror().store().get(&id).expect("rect").shape,
        Shape::Rect { start: Point::new(0.0, 0.0), end: Point::new(10.0, 8.0) }
    );
    assert_eq!(session.undo().name(), "undo");
    assert!(session.mirror().elements().is_empty());
    session.redo();
    assert_eq!(session.mirror().elements().len(), 1);
}

#[test]
fn select_drag_checkpoints_then_moves() {
    let mut session = Session::new("r1");
    let id = draw_line(&mut session, &[(0.0, 0.0), (10.0, 0.0)]);

    session.set_tool(Tool::Select);
    let down = session.pointer_down(Point::new(5.0, 1.0));
    assert_eq!(names(&down), vec!["update-undoStack"]);

    let step = session.pointer_move(Point::new(105.0, 101.0));
    assert_eq!(
        step,
        vec![Event::MoveElement(ElementPoint { room_id: "r1".into(), id: id.clone(), point: Point::new(100.0, 100.0) })]
    );
    session.pointer_up();

    let el = session.mirror().store().get(&id).expect("line");
    assert_eq!(el.anchor(), Point::new(100.0, 100.0));
}

#[test]
fn select_on_empty_canvas_does_nothing() {
    let mut session = Session::new("r1");
    session.set_tool(Tool::Select);
    assert!(session.pointer_down(Point::new(5.0, 5.0)).is_empty());
    assert!(session.pointer_move(Point::new(6.0, 6.0)).is_empty());
}

#[test]
fn eraser_masks_touched_elements_and_removes_scratch() {
    let mut session = Session::new("r1");
    let target = draw_line(&mut session, &[(0.0, 50.0), (100.0, 50.0)]);
    let untouched = draw_line(&mut session, &[(0.0, 300.0), (100.0, 300.0)]);

    session.set_tool(Tool::Eraser);
    let down = session.pointer_down(Point::new(50.0, 0.0));
    let scratch = started_id(&down[0]);
    assert!(matches!(&down[0], Event::StartLine(s) if s.is_temp));

    let moved: Vec<Event> = [(50.0, 52.0), (50.0, 100.0)]
        .into_iter()
        .flat_map(|(x, y)| session.pointer_move(Point::new(x, y)))
        .collect();
    assert_eq!(names(&moved), vec!["draw-line", "draw-line"]);
    assert!(session.mirror().store().get(&scratch).is_some());

    let up = session.pointer_up();
    assert_eq!(
        up,
        vec![
            Event::ApplyMask(ApplyMask {
                room_id: "r1".into(),
                element_id: target.clone(),
                eraser_lines: vec![vec![Point::new(50.0, 0.0), Point::new(50.0, 52.0), Point::new(50.0, 100.0)]],
                stroke_widths: vec![2.0],
            }),
            Event::RemoveElement(RemoveElement { room_id: "r1".into(), id: scratch.clone() }),
        ]
    );

    let store = session.mirror().store();
    assert!(store.get(&scratch).is_none());
    assert!(store.get(&target).expect("target").has_mask());
    assert!(!store.get(&untouched).expect("untouched").has_mask());
}

#[test]
fn eraser_that_touches_nothing_only_removes_scratch() {
    let mut session = Session::new("r1");
    session.set_tool(Tool::Eraser);
    session.pointer_down(Point::new(500.0, 500.0));
    session.pointer_move(Point::new(510.0, 510.0));
    assert_eq!(names(&session.pointer_up()), vec!["remove-element"]);
    assert!(session.mirror().elements().is_empty());
}

#[test]
fn text_is_placed_then_edited() {
    let mut session = Session::new("r1");
    let (id, placed) = session.place_text(Point::new(20.0, 20.0), "");
    assert!(matches!(&placed, Event::StartLine(s) if s.tool == Tool::Text));

    let edit = session.edit_text(&id, "hello");
    assert_eq!(edit.name(), "text-change");
    assert_eq!(
        session.mirror().store().get(&id).expect("text").shape,
        Shape::Text { point: Point::new(20.0, 20.0), text: "hello".into() }
    );
}

#[test]
fn text_tool_ignores_pointer_gestures() {
    let mut session = Session::new("r1");
    session.set_tool(Tool::Text);
    assert!(session.pointer_down(Point::new(1.0, 1.0)).is_empty());
    assert!(!session.is_busy());
}

#[test]
fn reset_clears_and_is_undoable() {
    let mut session = Session::new("r1");
    draw_line(&mut session, &[(0.0, 0.0), (1.0, 1.0)]);
    assert_eq!(session.reset().name(), "reset-canvas");
    assert!(session.mirror().elements().is_empty());
    session.undo();
    assert_eq!(session.mirror().elements().len(), 1);
}
