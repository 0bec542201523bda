use std::cell::RefCell;
use std::rc::Rc;

use chart_viewport::api::{EventDispatcher, EventKind, ViewportEvent};
use chart_viewport::core::Viewport;

fn size(width: u32) -> ViewportEvent {
    ViewportEvent::SizeChanged {
        viewport: Viewport::new(width, 10),
    }
}

fn history(position: usize) -> ViewportEvent {
    ViewportEvent::BoundHistoryChanged { position, len: 3 }
}

#[test]
fn later_events_replace_queued_ones_of_the_same_kind() {
    let mut events = EventDispatcher::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    events.on(EventKind::SizeChanged, Box::new(move |event| sink.borrow_mut().push(event.clone())));
    let sink = Rc::clone(&seen);
    events.on(
        EventKind::BoundHistoryChanged,
        Box::new(move |event| sink.borrow_mut().push(event.clone())),
    );

    events.emit(size(10));
    events.emit(history(1));
    events.emit(size(20));
    assert_eq!(
        events.pending_kinds(),
        vec![EventKind::SizeChanged, EventKind::BoundHistoryChanged]
    );

    assert_eq!(events.flush(), 2);
    assert_eq!(seen.borrow().as_slice(), &[size(20), history(1)]);
    assert!(events.pending_kinds().is_empty());
    assert_eq!(events.flush(), 0);
}

#[test]
fn removed_listeners_stop_receiving() {
    let mut events = EventDispatcher::new();
    let calls = Rc::new(RefCell::new(0usize));
    let sink = Rc::clone(&calls);
    let id = events.on(EventKind::SizeChanged, Box::new(move |_| *sink.borrow_mut() += 1));
    assert_eq!(events.listener_count(), 1);

    events.emit(size(10));
    events.flush();
    assert!(events.off(id));
    assert!(!events.off(id));
    assert_eq!(events.listener_count(), 0);

    events.emit(size(20));
    events.flush();
    assert_eq!(*calls.borrow(), 1);
}

#[test]
fn clear_drops_listeners_and_queued_events() {
    let mut events = EventDispatcher::new();
    events.on(EventKind::SizeChanged, Box::new(|_| panic!("cleared listener called")));
    events.emit(size(10));

    events.clear();
    assert_eq!(events.listener_count(), 0);
    assert!(events.pending_kinds().is_empty());
    assert_eq!(events.flush(), 0);
}
