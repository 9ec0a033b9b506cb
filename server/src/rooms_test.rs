use serde_json::json;

use super::*;

fn envelope(n: i64) -> Envelope {
    Envelope::new("message", json!({ "type": "NEW_POST", "data": { "id": n } }))
}

#[tokio::test]
async fn emit_reaches_only_room_members() {
    let rooms = RoomRegistry::new();
    let (a, mut rx_a) = rooms.connect().await;
    let (_b, mut rx_b) = rooms.connect().await;
    assert!(rooms.join(a, &Room::Board(7)).await);

    assert_eq!(rooms.emit(&Room::Board(7), &envelope(1)).await, 1);
    assert_eq!(rx_a.try_recv().expect("member receives"), envelope(1));
    assert!(rx_b.try_recv().is_err());
}

#[tokio::test]
async fn emit_to_empty_room_is_noop() {
    let rooms = RoomRegistry::new();
    assert_eq!(rooms.emit(&Room::Admin, &envelope(1)).await, 0);
    assert_eq!(rooms.member_count(&Room::Admin).await, 0);
}

#[tokio::test]
async fn connection_can_join_several_rooms() {
    let rooms = RoomRegistry::new();
    let (id, mut rx) = rooms.connect().await;
    rooms.join(id, &Room::Admin).await;
    rooms.join(id, &Room::Board(1)).await;
    rooms.join(id, &Room::Board(1)).await;

    assert_eq!(rooms.rooms_of(id).await, vec!["admin".to_owned(), "board-1".to_owned()]);
    assert_eq!(rooms.member_count(&Room::Board(1)).await, 1);

    rooms.emit(&Room::Admin, &envelope(1)).await;
    rooms.emit(&Room::Board(1), &envelope(2)).await;
    assert_eq!(rx.try_recv().expect("first"), envelope(1));
    assert_eq!(rx.try_recv().expect("second"), envelope(2));
}

#[tokio::test]
async fn leave_stops_delivery() {
    let rooms = RoomRegistry::new();
    let (id, mut rx) = rooms.connect().await;
    rooms.join(id, &Room::Board(3)).await;
    assert!(rooms.leave(id, &Room::Board(3)).await);
    assert!(!rooms.leave(id, &Room::Board(3)).await);

    assert_eq!(rooms.emit(&Room::Board(3), &envelope(1)).await, 0);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn disconnect_drops_memberships() {
    let rooms = RoomRegistry::new();
    let (id, _rx) = rooms.connect().await;
    rooms.join(id, &Room::Admin).await;

    assert!(rooms.disconnect(id).await);
    assert!(!rooms.disconnect(id).await);
    assert_eq!(rooms.member_count(&Room::Admin).await, 0);
    assert_eq!(rooms.connection_count().await, 0);
    assert!(!rooms.join(id, &Room::Admin).await);
}

#[tokio::test]
async fn emit_all_reaches_every_connection() {
    let rooms = RoomRegistry::new();
    let (_a, mut rx_a) = rooms.connect().await;
    let (b, mut rx_b) = rooms.connect().await;
    rooms.join(b, &Room::Admin).await;

    assert_eq!(rooms.emit_all(&envelope(9)).await, 2);
    assert!(rx_a.try_recv().is_ok());
    assert!(rx_b.try_recv().is_ok());
}

#[tokio::test]
async fn full_queue_skips_slow_member() {
    let rooms = RoomRegistry::new();
    let (slow, _rx_slow) = rooms.connect().await;
    let (fast, mut rx_fast) = rooms.connect().await;
    rooms.join(slow, &Room::Admin).await;
    rooms.join(fast, &Room::Admin).await;

    for n in 0..CONNECTION_BUFFER {
        let n = i64::try_from(n).expect("small");
        rooms.emit(&Room::Admin, &envelope(n)).await;
        rx_fast.try_recv().expect("fast member drains");
    }
    assert_eq!(rooms.emit(&Room::Admin, &envelope(-1)).await, 1);
    assert_eq!(rx_fast.try_recv().expect("fast member"), envelope(-1));
}
