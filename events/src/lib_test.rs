use super::*;
use serde_json::json;

fn sample_post() -> Post {
    Post::deserialize(json!({
        "id": 42,
        "boardId": 7,
        "message": "hello",
        "nickname": "ann",
        "status": "APPROVED",
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": "2024-01-01T00:05:00Z"
    }))
    .expect("post should parse")
}

// =============================================================================
// ROOMS
// =============================================================================

#[test]
fn room_names_follow_fixed_convention() {
    assert_eq!(Room::Admin.name(), "admin");
    assert_eq!(Room::Board(7).name(), "board-7");
    assert_eq!(Room::Board(7).to_string(), "board-7");
}

#[test]
fn room_parse_inverts_name() {
    assert_eq!(Room::parse("admin"), Some(Room::Admin));
    assert_eq!(Room::parse("board-12"), Some(Room::Board(12)));
    assert_eq!(Room::parse("board-x"), None);
    assert_eq!(Room::parse("lobby"), None);
}

// =============================================================================
// WIRE MESSAGE
// =============================================================================

#[test]
fn event_type_serializes_screaming_case() {
    let msg = WireMessage::new(EventType::NewApprovedPost, Value::Null);
    let text = serde_json::to_string(&msg).expect("serialize");
    assert_eq!(text, r#"{"type":"NEW_APPROVED_POST"}"#);
    assert_eq!(EventType::PostStatusUpdated.as_str(), "POST_STATUS_UPDATED");
}

#[test]
fn wire_message_post_round_trip() {
    let post = sample_post();
    let msg = WireMessage::with_post(EventType::NewApprovedPost, &post);
    assert_eq!(msg.data["boardId"], json!(7));
    assert_eq!(msg.post().expect("post"), post);
}

#[test]
fn wire_message_post_rejects_non_post_data() {
    let msg = WireMessage::new(EventType::BoardUpdate, json!({"title": 3}));
    assert!(matches!(msg.post(), Err(CodecError::Json(_))));
}

// =============================================================================
// CLIENT EVENTS
// =============================================================================

#[test]
fn join_board_accepts_numeric_and_string_ids() {
    let numeric = Envelope::new(names::JOIN_BOARD, json!(5));
    let string = Envelope::new(names::JOIN_BOARD, json!("5"));
    assert_eq!(ClientEvent::from_envelope(&numeric).expect("numeric"), ClientEvent::JoinBoard(5));
    assert_eq!(ClientEvent::from_envelope(&string).expect("string"), ClientEvent::JoinBoard(5));
}

#[test]
fn join_board_rejects_non_numeric_id() {
    let env = Envelope::new(names::JOIN_BOARD, json!("abc"));
    let err = ClientEvent::from_envelope(&env).expect_err("should reject");
    assert!(matches!(err, CodecError::InvalidBoardId(ref s) if s == "abc"));
}

#[test]
fn join_admin_ignores_payload() {
    let env = Envelope::decode(r#"{"event":"join-admin"}"#).expect("decode");
    assert_eq!(ClientEvent::from_envelope(&env).expect("event"), ClientEvent::JoinAdmin);
}

#[test]
fn unknown_client_event_is_reported() {
    let env = Envelope::new("shout", Value::Null);
    assert!(matches!(
        ClientEvent::from_envelope(&env),
        Err(CodecError::UnknownEvent(ref e)) if e == "shout"
    ));
}

#[test]
fn client_event_envelope_round_trip() {
    for event in [
        ClientEvent::JoinAdmin,
        ClientEvent::JoinBoard(3),
        ClientEvent::LeaveBoard(3),
        ClientEvent::Message(WireMessage::new(EventType::RequestPosts, json!({"boardId": 3}))),
    ] {
        let text = event.to_envelope().encode();
        let env = Envelope::decode(&text).expect("decode");
        assert_eq!(ClientEvent::from_envelope(&env).expect("parse"), event);
    }
}

// =============================================================================
// SERVER EVENTS
// =============================================================================

#[test]
fn connected_envelope_carries_sid() {
    let env = ServerEvent::Connected { sid: "abc".into() }.to_envelope();
    assert_eq!(env.event, "connected");
    assert_eq!(
        ServerEvent::from_envelope(&env).expect("parse"),
        ServerEvent::Connected { sid: "abc".into() }
    );
}

#[test]
fn connected_without_sid_is_missing_field() {
    let env = Envelope::new(names::CONNECTED, json!({}));
    assert!(matches!(ServerEvent::from_envelope(&env), Err(CodecError::MissingField("sid"))));
}

#[test]
fn message_envelope_wraps_wire_payload() {
    let msg = WireMessage::new(EventType::NewPost, json!({"id": 1}));
    let env = ServerEvent::Message(msg.clone()).to_envelope();
    assert_eq!(env.data["type"], json!("NEW_POST"));
    assert_eq!(ServerEvent::from_envelope(&env).expect("parse"), ServerEvent::Message(msg));
}

// =============================================================================
// BATCHES
// =============================================================================

#[test]
fn decode_batch_accepts_array_and_single_object() {
    let many = Envelope::decode_batch(r#"[{"event":"join-admin"},{"event":"leave-board","data":2}]"#)
        .expect("array");
    assert_eq!(many.len(), 2);
    assert_eq!(many[1].data, json!(2));

    let one = Envelope::decode_batch(r#"{"event":"join-admin"}"#).expect("object");
    assert_eq!(one.len(), 1);
}

#[test]
fn decode_batch_rejects_garbage() {
    assert!(matches!(Envelope::decode_batch("not json"), Err(CodecError::Json(_))));
}

#[test]
fn encode_batch_of_nothing_is_empty_array() {
    assert_eq!(Envelope::encode_batch(&[]), "[]");
}

// =============================================================================
// RECORDS
// =============================================================================

#[test]
fn post_without_text_fields_still_parses() {
    let post = Post::deserialize(json!({"id": 1, "boardId": 2, "status": "PENDING"})).expect("parse");
    assert_eq!(post.message_text(), "");
    assert_eq!(post.nickname_text(), "");
    assert!(!post.is_approved());
}

#[test]
fn post_serializes_camel_case_and_skips_absent_fields() {
    let value = serde_json::to_value(sample_post()).expect("serialize");
    assert_eq!(value["boardId"], json!(7));
    assert_eq!(value["createdAt"], json!("2024-01-01T00:00:00Z"));
    assert!(value.get("imagePath").is_none());
    assert!(value.get("email").is_none());
}

#[test]
fn same_content_compares_message_and_nickname_only() {
    let a = sample_post();
    let mut b = sample_post();
    b.id = 43;
    b.status = PostStatus::Pending;
    assert!(a.same_content(&b));
    b.nickname = Some("bob".into());
    assert!(!a.same_content(&b));
}

#[test]
fn post_status_parses_from_query_strings() {
    assert_eq!("APPROVED".parse::<PostStatus>().expect("status"), PostStatus::Approved);
    assert_eq!(" PENDING ".parse::<PostStatus>().expect("status"), PostStatus::Pending);
    assert!(matches!("approved".parse::<PostStatus>(), Err(CodecError::InvalidStatus(_))));
}

#[test]
fn board_type_uses_wire_names() {
    let board = Board::deserialize(json!({
        "id": 1,
        "title": "Wall",
        "type": "NEWYEAR_RABBIT"
    }))
    .expect("board");
    assert_eq!(board.kind, BoardType::NewyearRabbit);
    assert!(!board.is_active);
    assert!(board.posts.is_none());
    let value = serde_json::to_value(&board).expect("serialize");
    assert_eq!(value["type"], json!("NEWYEAR_RABBIT"));
}
