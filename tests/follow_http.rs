//! End-to-end follow tests against a fake backend over HTTP.

mod common;

use std::time::Duration;

use common::{FakeBackend, Mode};
use logfollow::config::{FeedConfig, FilterConfig};
use logfollow::{
    FeedClient, FeedCursor, FeedSource, FetchOutcome, FollowError, HttpFeedSource, MemorySink,
    PollControl, PollScheduler, SchedulerOptions, SchedulerState,
};

fn options(max_entries: usize) -> SchedulerOptions {
    SchedulerOptions {
        delay: Duration::from_millis(10),
        max_entries,
        max_consecutive_errors: 3,
    }
}

fn source(backend: &FakeBackend) -> HttpFeedSource {
    HttpFeedSource::new(&backend.feed_config(), FilterConfig::default()).unwrap()
}

#[tokio::test]
async fn test_status_and_entries_decode() {
    let backend = FakeBackend::start().await;
    backend.push(1, 1000);
    backend.push(2, 1010);

    let source = source(&backend);
    let status = source.status(&FeedCursor::default()).await.unwrap();
    assert_eq!(status.last_id, 2);
    assert_eq!(status.last_modified, 1010);

    let page = source.entries(&FeedCursor::new(1, 1000)).await.unwrap();
    assert_eq!(page.log_entries.len(), 1);
    assert_eq!(page.log_entries[0].id, 2);
    assert_eq!(page.log_entries[0].fragment, "<td>entry 2</td>");
}

#[tokio::test]
async fn test_cursor_and_filter_sent_as_query() {
    let backend = FakeBackend::start().await;
    let filter = FilterConfig {
        environment: "2".to_string(),
        host: "4".to_string(),
        source: "9".to_string(),
        search: "disk full".to_string(),
        time_start: "2024-01-15 09:00:00".to_string(),
        time_end: "2024-01-15 11:00:00".to_string(),
        ..FilterConfig::default()
    };
    let source = HttpFeedSource::new(&backend.feed_config(), filter).unwrap();

    source.status(&FeedCursor::new(17, 1234)).await.unwrap();

    let query = backend.last_query();
    assert_eq!(query.get("last_id").map(String::as_str), Some("17"));
    assert_eq!(query.get("last_modified").map(String::as_str), Some("1234"));
    assert_eq!(query.get("host").map(String::as_str), Some("4"));
    assert_eq!(query.get("search").map(String::as_str), Some("disk full"));
    assert_eq!(query.get("environment").map(String::as_str), Some("2"));
    assert_eq!(query.get("source").map(String::as_str), Some("9"));
    assert_eq!(
        query.get("time_start").map(String::as_str),
        Some("2024-01-15 09:00:00")
    );
    assert_eq!(
        query.get("time_end").map(String::as_str),
        Some("2024-01-15 11:00:00")
    );
    assert!(!query.contains_key("priority"));
}

#[tokio::test]
async fn test_no_change_does_not_fetch_entries() {
    let backend = FakeBackend::start().await;
    backend.push(1, 1000);

    let client = FeedClient::new(source(&backend));
    let outcome = client.check_and_fetch(&FeedCursor::new(1, 1000)).await;

    assert_eq!(outcome, FetchOutcome::NoChange);
    assert_eq!(backend.status_calls(), 1);
    assert_eq!(backend.entries_calls(), 0);
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let backend = FakeBackend::start().await;
    backend.set_mode(Mode::ServerError);

    let client = FeedClient::new(source(&backend));
    let err = client
        .try_check_and_fetch(&FeedCursor::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FollowError::Fetch(_)));
    assert_eq!(
        client.check_and_fetch(&FeedCursor::default()).await,
        FetchOutcome::NoChange
    );
}

#[tokio::test]
async fn test_malformed_response_is_transient() {
    let backend = FakeBackend::start().await;
    backend.set_mode(Mode::Malformed);

    let client = FeedClient::new(source(&backend));
    let err = client
        .try_check_and_fetch(&FeedCursor::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FollowError::MalformedResponse(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_oversized_response_rejected() {
    let backend = FakeBackend::start().await;
    for id in 1..=20 {
        backend.push(id, 1000 + id as i64);
    }
    let config = FeedConfig {
        max_response_bytes: 64,
        ..backend.feed_config()
    };
    let source = HttpFeedSource::new(&config, FilterConfig::default()).unwrap();

    let err = source.entries(&FeedCursor::default()).await.unwrap_err();
    assert!(err.to_string().contains("too large"));
}

#[tokio::test]
async fn test_follow_merges_out_of_order_arrivals_and_trims() {
    let backend = FakeBackend::start().await;
    backend.push(1, 1000);
    backend.push(2, 1020);
    backend.push(3, 1010);

    let (_control, flag) = PollControl::new(true);
    let mut scheduler = PollScheduler::new(
        FeedClient::new(source(&backend)),
        MemorySink::new(),
        flag,
        options(4),
    );

    let report = scheduler.run_cycle().await;
    assert!(report.updated);
    assert_eq!(report.inserted, 3);
    assert_eq!(scheduler.view().ids(), vec![2, 3, 1]);
    assert_eq!(scheduler.cursor(), FeedCursor::new(3, 1020));

    // Nothing new: only the cheap query is made.
    let entries_calls = backend.entries_calls();
    let report = scheduler.run_cycle().await;
    assert!(!report.updated);
    assert_eq!(backend.entries_calls(), entries_calls);

    // A late entry lands in the middle, the oldest falls off the end.
    backend.push(4, 1015);
    backend.push(5, 1030);
    let report = scheduler.run_cycle().await;
    assert_eq!(report.inserted, 2);
    assert_eq!(report.removed, 1);
    assert_eq!(scheduler.view().ids(), vec![5, 2, 4, 3]);
    assert_eq!(scheduler.sink().ids(), &[5, 2, 4, 3]);
    assert!(scheduler.view().is_sorted());
    assert_eq!(scheduler.state(), SchedulerState::Polling);
}

#[tokio::test]
async fn test_follow_survives_backend_outage() {
    let backend = FakeBackend::start().await;
    backend.push(1, 1000);

    let (_control, flag) = PollControl::new(true);
    let mut scheduler = PollScheduler::new(
        FeedClient::new(source(&backend)),
        MemorySink::new(),
        flag,
        options(10),
    );
    scheduler.run_cycle().await;
    let cursor = scheduler.cursor();

    backend.set_mode(Mode::ServerError);
    backend.push(2, 1005);
    for _ in 0..3 {
        let report = scheduler.run_cycle().await;
        assert!(report.failed);
        assert_eq!(scheduler.cursor(), cursor);
        assert_eq!(scheduler.state(), SchedulerState::Polling);
    }
    assert_eq!(scheduler.consecutive_failures(), 3);

    backend.set_mode(Mode::Ok);
    let report = scheduler.run_cycle().await;
    assert!(report.updated);
    assert_eq!(scheduler.view().ids(), vec![2, 1]);
    assert_eq!(scheduler.consecutive_failures(), 0);
}

#[tokio::test]
async fn test_pause_and_resume_without_restart() {
    let backend = FakeBackend::start().await;
    backend.push(1, 1000);

    let (control, flag) = PollControl::new(true);
    let mut scheduler = PollScheduler::new(
        FeedClient::new(source(&backend)),
        MemorySink::new(),
        flag,
        options(10),
    );
    scheduler.run_cycle().await;

    control.set_active(false);
    scheduler.run_until_stopped().await;
    assert_eq!(scheduler.state(), SchedulerState::Stopped);

    let status_calls = backend.status_calls();
    backend.push(2, 1010);
    assert_eq!(scheduler.run_cycle().await.inserted, 0);
    assert_eq!(backend.status_calls(), status_calls);

    control.set_active(true);
    assert!(scheduler.resume());
    let report = scheduler.run_cycle().await;
    assert_eq!(report.inserted, 1);
    assert_eq!(scheduler.view().ids(), vec![2, 1]);
}
