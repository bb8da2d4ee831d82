use super::*;

#[test]
fn room_name_counts_from_one() {
    assert_eq!(Room::new("a", 0, false).name, "Room 1");
    assert_eq!(Room::new("b", 4, false).name, "Room 5");
}

#[test]
fn new_room_is_active_and_empty() {
    let room = Room::new("a", 0, false);
    assert!(room.active);
    assert!(room.clients.is_empty());
    assert!(room.canvas.is_empty());
    assert!(room.idle_timer.is_none());
}

#[test]
fn private_and_inactive_rooms_are_hidden() {
    let mut room = Room::new("a", 0, true);
    assert!(!room.is_visible());
    room.private = false;
    assert!(room.is_visible());
    room.active = false;
    assert!(!room.is_visible());
}

#[test]
fn summary_carries_preview() {
    let mut room = Room::new("a", 2, false);
    room.preview = Some("data:image/png;base64,AAAA".into());
    let summary = room.summary();
    assert_eq!(summary.id, "a");
    assert_eq!(summary.name, "Room 3");
    assert_eq!(summary.preview.as_deref(), Some("data:image/png;base64,AAAA"));
}

#[tokio::test]
async fn cancel_idle_timer_aborts_task() {
    let mut room = Room::new("a", 0, false);
    let handle = tokio::spawn(async { tokio::time::sleep(std::time::Duration::from_secs(60)).await });
    room.idle_timer = Some(handle);
    room.cancel_idle_timer();
    assert!(room.idle_timer.is_none());
}

#[tokio::test]
async fn test_state_starts_empty() {
    let state = test_helpers::test_app_state();
    assert!(state.rooms.read().await.is_empty());
    assert!(state.ws_clients.read().await.is_empty());
}
