//! Store-contract tests driven against the in-memory implementation.
//!
//! These pin down the parts of the `StreakStore` contract the streak engine
//! depends on: upsert idempotence on (user, day), the bounded day-descending
//! read window, and the append-only audit log.

use chrono::{NaiveDate, Utc};
use lst_db::mem::MemStore;
use lst_db::StreakStore;
use lst_schemas::ProfileCounts;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn counts(username: &str, total: i64) -> ProfileCounts {
    ProfileCounts {
        username: username.to_string(),
        total_solved: total,
        easy_solved: 0,
        medium_solved: 0,
        hard_solved: 0,
        avatar_url: None,
    }
}

#[tokio::test]
async fn upsert_same_day_twice_keeps_one_row_with_latest_delta() {
    let store = MemStore::new();
    let id = store
        .create_user(&counts("alice", 10), 1, 1, Utc::now())
        .await
        .unwrap();

    let day = d(2025, 6, 10);
    store.upsert_day(id, day, 3, 13).await.unwrap();
    store.upsert_day(id, day, 5, 15).await.unwrap();

    let rows = store.load_recent_days(id, 30).await.unwrap();
    assert_eq!(rows.len(), 1, "exactly one row per (user, day)");
    assert_eq!(rows[0].solved_delta, 5);
    assert_eq!(rows[0].cumulative_snapshot, 15);
}

#[tokio::test]
async fn negative_delta_round_trips() {
    let store = MemStore::new();
    let id = store
        .create_user(&counts("alice", 10), 1, 1, Utc::now())
        .await
        .unwrap();

    store.upsert_day(id, d(2025, 6, 10), -2, 8).await.unwrap();

    let rows = store.load_recent_days(id, 30).await.unwrap();
    assert_eq!(rows[0].solved_delta, -2);
}

#[tokio::test]
async fn load_recent_days_is_day_descending_and_window_bounded() {
    let store = MemStore::new();
    let id = store
        .create_user(&counts("alice", 0), 0, 0, Utc::now())
        .await
        .unwrap();

    // 40 days of history; out-of-order inserts must not matter.
    let mut day = d(2025, 1, 1);
    let mut days = Vec::new();
    for i in 0..40 {
        days.push((day, i as i64));
        day = day.succ_opt().unwrap();
    }
    days.reverse();
    for (day, delta) in &days {
        store.upsert_day(id, *day, *delta, 0).await.unwrap();
    }

    let rows = store.load_recent_days(id, 30).await.unwrap();
    assert_eq!(rows.len(), 30, "window bounded at 30");
    for pair in rows.windows(2) {
        assert!(pair[0].day > pair[1].day, "strictly day-descending");
    }
    // The newest day must be first.
    assert_eq!(rows[0].day, d(2025, 2, 9));
}

#[tokio::test]
async fn fetch_log_is_append_only() {
    let store = MemStore::new();

    store.append_fetch_log(None, false, Some("boom")).await.unwrap();
    store.append_fetch_log(None, true, None).await.unwrap();

    let log = store.log_entries();
    assert_eq!(log.len(), 2);
    assert!(!log[0].success);
    assert_eq!(log[0].error_message.as_deref(), Some("boom"));
    assert!(log[1].success);
}

#[tokio::test]
async fn list_usernames_is_sorted() {
    let store = MemStore::new();
    for name in ["carol", "alice", "bob"] {
        store
            .create_user(&counts(name, 1), 1, 1, Utc::now())
            .await
            .unwrap();
    }

    let names = store.list_usernames().await.unwrap();
    assert_eq!(names, vec!["alice", "bob", "carol"]);
}

#[tokio::test]
async fn fail_writes_rejects_writes_but_not_reads() {
    let store = MemStore::new();
    let id = store
        .create_user(&counts("alice", 1), 1, 1, Utc::now())
        .await
        .unwrap();

    store.fail_writes(true);
    assert!(store.upsert_day(id, d(2025, 6, 10), 1, 2).await.is_err());
    assert!(store.load_user("alice").await.unwrap().is_some());

    store.fail_writes(false);
    store.upsert_day(id, d(2025, 6, 10), 1, 2).await.unwrap();
}
