use serde_json::json;

use super::*;

#[test]
fn base_url_must_be_http() {
    assert!(matches!(ApiClient::new("ws://x"), Err(ApiError::InvalidBaseUrl(_))));
    let client = ApiClient::new("http://127.0.0.1:3000/").expect("client");
    assert_eq!(client.base_url(), "http://127.0.0.1:3000");
}

#[test]
fn error_body_is_decoded() {
    let err = status_error(404, r#"{"error":"post 9 not found","code":"E_POST_NOT_FOUND"}"#);
    match err {
        ApiError::Status { status, code, message } => {
            assert_eq!(status, 404);
            assert_eq!(code, "E_POST_NOT_FOUND");
            assert_eq!(message, "post 9 not found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn plain_error_body_is_kept_verbatim() {
    let err = status_error(502, "bad gateway");
    assert!(matches!(err, ApiError::Status { status: 502, ref code, ref message }
        if code == "E_HTTP" && message == "bad gateway"));
}

#[test]
fn new_post_serializes_camel_case() {
    let post = NewPost {
        board_id: Some(7),
        message: Some("hello".into()),
        image_path: Some("/img/a.png".into()),
        ..NewPost::default()
    };
    let value = serde_json::to_value(&post).expect("serialize");
    assert_eq!(value, json!({"boardId": 7, "message": "hello", "imagePath": "/img/a.png"}));
}
