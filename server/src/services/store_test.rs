use super::*;

fn board_input(title: &str) -> NewBoard {
    NewBoard {
        title: title.to_owned(),
        kind: BoardType::PostIt,
        background_color: None,
        title_color: None,
        font_family: None,
        background_img: None,
    }
}

fn post_input(board_id: Option<BoardId>, message: &str) -> NewPost {
    NewPost { board_id, message: Some(message.to_owned()), nickname: Some("ann".into()), ..NewPost::default() }
}

#[tokio::test]
async fn first_board_becomes_active() {
    let store = Store::new();
    let first = store.create_board(board_input("One")).await.expect("board");
    let second = store.create_board(board_input("Two")).await.expect("board");
    assert!(first.is_active);
    assert!(!second.is_active);
    assert_eq!(store.active_board().await.expect("active").id, first.id);
}

#[tokio::test]
async fn activation_is_exclusive() {
    let store = Store::new();
    let first = store.create_board(board_input("One")).await.expect("board");
    let second = store.create_board(board_input("Two")).await.expect("board");

    store.activate_board(second.id).await.expect("activate");
    let boards = store.list_boards().await;
    assert_eq!(boards.iter().filter(|b| b.is_active).count(), 1);
    assert!(boards.iter().any(|b| b.id == second.id && b.is_active));
    assert!(boards.iter().any(|b| b.id == first.id && !b.is_active));
    assert_eq!(store.activate_board(99).await, Err(StoreError::BoardNotFound(99)));
}

#[tokio::test]
async fn posts_start_pending_on_active_board() {
    let store = Store::new();
    assert_eq!(store.create_post(post_input(None, "hi")).await, Err(StoreError::NoActiveBoard));

    let board = store.create_board(board_input("Wall")).await.expect("board");
    let post = store.create_post(post_input(None, "hi")).await.expect("post");
    assert_eq!(post.board_id, board.id);
    assert_eq!(post.status, PostStatus::Pending);
}

#[tokio::test]
async fn post_needs_message_or_image() {
    let store = Store::new();
    let board = store.create_board(board_input("Wall")).await.expect("board");
    assert_eq!(store.create_post(post_input(Some(board.id), "   ")).await, Err(StoreError::EmptyPost));

    let image_only = NewPost { board_id: Some(board.id), image_path: Some("/a.png".into()), ..NewPost::default() };
    assert!(store.create_post(image_only).await.is_ok());
    assert_eq!(store.create_post(post_input(Some(42), "hi")).await, Err(StoreError::BoardNotFound(42)));
}

#[tokio::test]
async fn board_lists_only_approved_posts_newest_first() {
    let store = Store::new();
    let board = store.create_board(board_input("Wall")).await.expect("board");
    let a = store.create_post(post_input(Some(board.id), "a")).await.expect("a");
    let b = store.create_post(post_input(Some(board.id), "b")).await.expect("b");
    let c = store.create_post(post_input(Some(board.id), "c")).await.expect("c");
    store.update_post_status(a.id, PostStatus::Approved).await.expect("approve a");
    store.update_post_status(c.id, PostStatus::Approved).await.expect("approve c");
    store.update_post_status(b.id, PostStatus::Rejected).await.expect("reject b");

    let posts = store.board(board.id).await.expect("board").posts.expect("posts");
    let ids: Vec<PostId> = posts.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![c.id, a.id]);
}

#[tokio::test]
async fn list_posts_filters_by_board_and_status() {
    let store = Store::new();
    let one = store.create_board(board_input("One")).await.expect("board");
    let two = store.create_board(board_input("Two")).await.expect("board");
    let p1 = store.create_post(post_input(Some(one.id), "x")).await.expect("post");
    store.create_post(post_input(Some(two.id), "y")).await.expect("post");
    store.update_post_status(p1.id, PostStatus::Approved).await.expect("approve");

    assert_eq!(store.list_posts(&PostFilter::default()).await.len(), 2);
    let filter = PostFilter { board_id: Some(one.id), status: Some(PostStatus::Approved) };
    assert_eq!(store.list_posts(&filter).await.len(), 1);
    let filter = PostFilter { board_id: Some(two.id), status: Some(PostStatus::Approved) };
    assert!(store.list_posts(&filter).await.is_empty());
}

#[tokio::test]
async fn status_change_reports_previous_status() {
    let store = Store::new();
    let board = store.create_board(board_input("Wall")).await.expect("board");
    let post = store.create_post(post_input(Some(board.id), "x")).await.expect("post");

    let approved = store.update_post_status(post.id, PostStatus::Approved).await.expect("approve");
    assert_eq!(approved.previous, PostStatus::Pending);
    assert!(!approved.left_approved());

    let rejected = store.update_post_status(post.id, PostStatus::Rejected).await.expect("reject");
    assert_eq!(rejected.previous, PostStatus::Approved);
    assert_eq!(rejected.post.status, PostStatus::Rejected);
    assert!(rejected.left_approved());

    let again = store.update_post_status(post.id, PostStatus::Rejected).await.expect("reject again");
    assert!(!again.left_approved());
}

#[tokio::test]
async fn missing_records_report_not_found() {
    let store = Store::new();
    assert_eq!(store.update_post_status(5, PostStatus::Approved).await, Err(StoreError::PostNotFound(5)));
    assert_eq!(store.delete_post(5).await, Err(StoreError::PostNotFound(5)));
    assert_eq!(store.board(5).await, Err(StoreError::BoardNotFound(5)));
    assert_eq!(StoreError::PostNotFound(5).error_code(), "E_POST_NOT_FOUND");
}

#[tokio::test]
async fn board_patch_keeps_absent_fields() {
    let store = Store::new();
    let board = store.create_board(board_input("Wall")).await.expect("board");
    let patch = BoardPatch { title_color: Some("#fff".into()), ..BoardPatch::default() };
    let updated = store.update_board(board.id, patch).await.expect("update");
    assert_eq!(updated.title, "Wall");
    assert_eq!(updated.kind, BoardType::PostIt);
    assert_eq!(updated.title_color.as_deref(), Some("#fff"));

    let blank = BoardPatch { title: Some(" ".into()), ..BoardPatch::default() };
    assert_eq!(store.update_board(board.id, blank).await, Err(StoreError::EmptyTitle));
}
