use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use tokio::time::{sleep, timeout};

use super::*;
use crate::entity::AnimationType;

fn post(id: i64, message: &str) -> Post {
    serde_json::from_value(json!({
        "id": id,
        "boardId": 7,
        "message": message,
        "nickname": "ann",
        "status": "APPROVED"
    }))
    .expect("post should parse")
}

fn quiet_scheduler() -> BoardScheduler {
    let config = LifecycleConfig { cross_chance: 0.0, ..LifecycleConfig::default() };
    BoardScheduler::spawn_with_rng(config, PlacementOptions::default(), StdRng::seed_from_u64(3))
}

async fn next_snapshot(rx: &mut watch::Receiver<Snapshot>) -> Snapshot {
    timeout(Duration::from_millis(500), rx.changed())
        .await
        .expect("snapshot timed out")
        .expect("scheduler stopped");
    rx.borrow_and_update().clone()
}

#[tokio::test(start_paused = true)]
async fn approved_post_is_displayed_then_removed() {
    let scheduler = quiet_scheduler();
    scheduler.push_approved(post(42, "hello"));

    sleep(Duration::from_millis(5500)).await;
    let snapshot = scheduler.snapshot();
    assert_eq!(snapshot.entities.len(), 1);
    let entity = &snapshot.entities[0];
    assert_eq!(entity.post.id, 42);
    assert!(!entity.is_exiting);
    let key = entity.key;

    // Displayed somewhere in [3s, 5s), so exit lands in [23s, 25s).
    sleep(Duration::from_millis(17_000)).await;
    assert!(scheduler.snapshot().entities.iter().any(|e| e.key == key && !e.is_exiting));

    sleep(Duration::from_millis(4_000)).await;
    assert!(!scheduler.snapshot().entities.iter().any(|e| e.key == key));
}

#[tokio::test(start_paused = true)]
async fn set_posts_publishes_queue_state() {
    let scheduler = quiet_scheduler();
    let mut rx = scheduler.subscribe();

    scheduler.set_posts(vec![post(1, "a"), post(2, "b")]);
    let snapshot = next_snapshot(&mut rx).await;
    assert_eq!(snapshot.live_posts, 2);
    assert_eq!(snapshot.queued, 2);
    assert!(snapshot.entities.is_empty());

    scheduler.withdraw(1);
    let snapshot = next_snapshot(&mut rx).await;
    assert_eq!(snapshot.live_posts, 1);
    assert_eq!(snapshot.queued, 1);
}

#[tokio::test(start_paused = true)]
async fn pending_posts_are_not_added() {
    let scheduler = quiet_scheduler();
    let mut rx = scheduler.subscribe();

    let mut pending = post(1, "a");
    pending.status = events::PostStatus::Pending;
    scheduler.push_approved(pending);
    assert_eq!(next_snapshot(&mut rx).await.live_posts, 0);
}

#[tokio::test(start_paused = true)]
async fn explicit_crossing_shows_immediately() {
    let scheduler = quiet_scheduler();
    let mut rx = scheduler.subscribe();

    scheduler.spawn_crossing(post(9, "zoom"));
    let snapshot = next_snapshot(&mut rx).await;
    assert_eq!(snapshot.entities.len(), 1);
    assert_eq!(snapshot.entities[0].animation, AnimationType::Cross);
}

#[tokio::test(start_paused = true)]
async fn dropping_handle_stops_task() {
    let scheduler = quiet_scheduler();
    let mut rx = scheduler.subscribe();
    drop(scheduler);

    let changed = timeout(Duration::from_secs(1), rx.changed()).await.expect("task should stop");
    assert!(changed.is_err());
}
