use events::{EventType, names};
use serde_json::json;

use super::*;

#[tokio::test]
async fn board_broadcast_wraps_message_envelope() {
    let rooms = RoomRegistry::new();
    let (viewer, mut rx) = rooms.connect().await;
    rooms.join(viewer, &Room::Board(7)).await;

    let message = WireMessage::new(EventType::NewApprovedPost, json!({"id": 42, "boardId": 7}));
    assert_eq!(emit_to_board(&rooms, 7, &message).await, 1);

    let envelope = rx.try_recv().expect("delivered");
    assert_eq!(envelope.event, names::MESSAGE);
    assert_eq!(envelope.data["type"], json!("NEW_APPROVED_POST"));
    assert_eq!(envelope.data["data"]["id"], json!(42));
}

#[tokio::test]
async fn admin_and_board_rooms_are_separate() {
    let rooms = RoomRegistry::new();
    let (admin, mut admin_rx) = rooms.connect().await;
    let (viewer, mut viewer_rx) = rooms.connect().await;
    rooms.join(admin, &Room::Admin).await;
    rooms.join(viewer, &Room::Board(1)).await;

    let message = WireMessage::new(EventType::NewPost, json!({"id": 1}));
    assert_eq!(emit_to_admin(&rooms, &message).await, 1);
    assert_eq!(emit_to_board(&rooms, 2, &message).await, 0);

    assert!(admin_rx.try_recv().is_ok());
    assert!(viewer_rx.try_recv().is_err());
}

#[tokio::test]
async fn broadcast_to_all_ignores_rooms() {
    let rooms = RoomRegistry::new();
    let (_a, mut rx_a) = rooms.connect().await;
    let (_b, mut rx_b) = rooms.connect().await;

    let message = WireMessage::new(EventType::BoardUpdate, json!({"id": 1}));
    assert_eq!(emit_to_all(&rooms, &message).await, 2);
    assert!(rx_a.try_recv().is_ok());
    assert!(rx_b.try_recv().is_ok());
}
