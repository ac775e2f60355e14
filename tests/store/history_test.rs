//! Tests for the SQLite history store.

use construct::engine::context::HistoryStore;
use construct::store::history::SqliteHistoryStore;
use construct::store::open_in_memory;

#[tokio::test]
async fn append_then_fetch_round_trips_in_order() {
    let pool = open_in_memory().await.expect("db");
    let store = SqliteHistoryStore::new(pool);

    store.append("c1", "Lena", false, "first").await.expect("append");
    store.append("c1", "Igor", false, "second").await.expect("append");
    store.append("c1", "Igor", true, "third auto").await.expect("append");

    let lines = store.fetch_recent("c1", 10).await.expect("fetch");
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0].text, "first");
    assert_eq!(lines[0].speaker, "Lena");
    assert!(!lines[0].is_generated);
    assert_eq!(lines[2].text, "third auto");
    assert!(lines[2].is_generated);
    assert!(!lines[0].timestamp_label.is_empty());
}

#[tokio::test]
async fn limit_keeps_the_most_recent_lines() {
    let pool = open_in_memory().await.expect("db");
    let store = SqliteHistoryStore::new(pool);

    for i in 0..5u32 {
        store
            .append("c1", "Igor", false, &format!("message {i}"))
            .await
            .expect("append");
    }

    let lines = store.fetch_recent("c1", 2).await.expect("fetch");
    assert_eq!(lines.len(), 2);
    // Oldest-to-newest ordering of the newest two.
    assert_eq!(lines[0].text, "message 3");
    assert_eq!(lines[1].text, "message 4");
}

#[tokio::test]
async fn conversations_are_isolated_by_counterpart() {
    let pool = open_in_memory().await.expect("db");
    let store = SqliteHistoryStore::new(pool);

    store.append("c1", "Igor", false, "for lena").await.expect("append");
    store.append("c2", "Igor", false, "for mark").await.expect("append");

    let lines = store.fetch_recent("c2", 10).await.expect("fetch");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].text, "for mark");
}

#[tokio::test]
async fn trait_object_serves_the_engine_seam() {
    let pool = open_in_memory().await.expect("db");
    let store = SqliteHistoryStore::new(pool);
    store.append("c1", "Igor", false, "hello").await.expect("append");

    let dyn_store: &dyn HistoryStore = &store;
    let lines = dyn_store.recent("c1", 10).await.expect("recent");
    assert_eq!(lines.len(), 1);
}

#[tokio::test]
async fn empty_conversation_yields_no_lines() {
    let pool = open_in_memory().await.expect("db");
    let store = SqliteHistoryStore::new(pool);
    let lines = store.fetch_recent("nobody", 10).await.expect("fetch");
    assert!(lines.is_empty());
}
