//! Integration tests for the directory task.
//!
//! Drives the task through a session source channel and real interval ticks
//! on a paused clock, so no test waits on wall time.

use std::time::Duration;

use futures::{channel::mpsc, stream};
use lobby_client::{DirectoryTask, IntervalTicks, RecomputeCause};
use lobby_shared::{SessionFilter, SessionRecord, Snapshot};
use tokio::time::{self, Instant};

fn lobby() -> Snapshot {
    Snapshot::new(vec![
        SessionRecord::new("Room_42", "eu", 3, 10),
        SessionRecord::new("alpha", "us", 10, 10),
        SessionRecord::new("Beta", "eu", 1, 10),
    ])
}

#[tokio::test]
async fn region_filter_then_name_filter_then_resolve() {
    let (source_tx, source_rx) = mpsc::unbounded();
    let (directory, task) = DirectoryTask::spawn(
        SessionFilter::from_inputs("", "eu"),
        IntervalTicks::new(Duration::from_secs(2)),
        source_rx,
    );
    let mut views = directory.subscribe();

    source_tx.unbounded_send(lobby()).unwrap();
    let update = views
        .wait_for(|update| update.cause == RecomputeCause::Snapshot)
        .await
        .unwrap()
        .clone();
    assert_eq!(
        update.view.sessions(),
        &[
            SessionRecord::new("Beta", "eu", 1, 10),
            SessionRecord::new("Room_42", "eu", 3, 10),
        ]
    );

    directory
        .set_filter(SessionFilter::from_inputs("room", "All"))
        .unwrap();
    let view = directory.current_view().await.unwrap();
    assert_eq!(view.sessions(), &[SessionRecord::new("Room_42", "eu", 3, 10)]);

    assert_eq!(
        directory.resolve("alpha").await.unwrap(),
        Some(SessionRecord::new("alpha", "us", 10, 10))
    );

    task.shutdown().await;
}

#[tokio::test]
async fn later_snapshot_wins() {
    let second = Snapshot::new(vec![SessionRecord::new("Room_7", "kr", 2, 8)]);
    let (directory, task) = DirectoryTask::spawn(
        SessionFilter::any(),
        IntervalTicks::new(Duration::from_secs(2)),
        stream::iter(vec![lobby(), second]),
    );

    let mut views = directory.subscribe();
    let update = views
        .wait_for(|update| update.revision == 2)
        .await
        .unwrap()
        .clone();
    assert_eq!(update.view.names(), vec!["Room_7"]);
    assert_eq!(directory.resolve("Beta").await.unwrap(), None);

    task.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn interval_ticks_refresh_the_view() {
    let start = Instant::now();
    let (directory, task) = DirectoryTask::spawn(
        SessionFilter::any(),
        IntervalTicks::new(Duration::from_secs(2)),
        stream::pending(),
    );
    directory.ingest_snapshot(lobby()).unwrap();

    let mut views = directory.subscribe();
    let update = views
        .wait_for(|update| update.cause == RecomputeCause::Tick)
        .await
        .unwrap()
        .clone();
    assert!(start.elapsed() >= Duration::from_secs(2));
    assert_eq!(update.view.names(), vec!["Beta", "Room_42", "alpha"]);

    task.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn no_ticks_after_teardown() {
    let (directory, task) = DirectoryTask::spawn(
        SessionFilter::any(),
        IntervalTicks::new(Duration::from_secs(2)),
        stream::pending(),
    );
    directory.ingest_snapshot(lobby()).unwrap();
    let mut views = directory.subscribe();
    views.wait_for(|update| update.revision == 1).await.unwrap();

    task.shutdown().await;
    let revision = directory.latest().revision;

    time::sleep(Duration::from_secs(10)).await;
    assert_eq!(directory.latest().revision, revision);
    assert!(directory.is_closed());
    assert!(directory.refresh().is_err());
}
