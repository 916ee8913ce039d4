// tests/ticker_tests.rs

use std::sync::Arc;
use std::time::Duration;

use mock_exam::{
    config::Config,
    engine::{CompletionReason, Phase},
    models::question::Section,
    session::ExamSession,
    state::SessionStore,
    utils::sample_bank::sample_bank,
};
use tokio::time::sleep;

/// Helper to build a started session with a custom exam duration.
async fn started_session(exam_duration_secs: u32) -> ExamSession {
    let config = Config {
        exam_duration_secs,
        tick_interval: Duration::from_secs(1),
        ..Config::default()
    };
    let session = ExamSession::new(Arc::new(sample_bank().unwrap()), &config);
    session.attach_paper("paper.pdf").await.unwrap();
    session.start().await.unwrap();
    session
}

#[tokio::test(start_paused = true)]
async fn ticker_decrements_once_per_second() {
    let session = started_session(10_800).await;

    // Offset by half a period so the sleep never races a tick.
    sleep(Duration::from_millis(2_500)).await;

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.global_time_remaining_seconds, 10_798);
    assert_eq!(snapshot.question_time_remaining_seconds, 88);
}

#[tokio::test(start_paused = true)]
async fn ticker_locks_question_on_timeout() {
    let session = started_session(10_800).await;

    sleep(Duration::from_millis(90_500)).await;

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.locked_questions, vec![1]);
    assert_eq!(snapshot.current_question_index, 1);
    assert_eq!(snapshot.question_time_remaining_seconds, 90);
    assert_eq!(snapshot.active_section, Section::A);
}

#[tokio::test(start_paused = true)]
async fn ticker_auto_submits_and_stops() {
    let session = started_session(5).await;

    sleep(Duration::from_millis(5_500)).await;

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.phase, Phase::Completed);
    assert_eq!(snapshot.completion, Some(CompletionReason::TimeExpired));
    assert_eq!(snapshot.global_time_remaining_seconds, 0);
    assert!(!session.is_ticking().await);

    sleep(Duration::from_secs(10)).await;
    let later = session.snapshot().await;
    assert_eq!(later.question_time_remaining_seconds, snapshot.question_time_remaining_seconds);
}

#[tokio::test(start_paused = true)]
async fn ending_session_cancels_ticker() {
    let session = started_session(10_800).await;
    sleep(Duration::from_millis(1_500)).await;

    let snapshot = session.end().await;
    assert_eq!(snapshot.phase, Phase::Ready);
    assert!(!session.is_ticking().await);

    sleep(Duration::from_secs(5)).await;
    let later = session.snapshot().await;
    assert_eq!(later.global_time_remaining_seconds, 10_800);
}

#[tokio::test(start_paused = true)]
async fn clearing_paper_cancels_ticker() {
    let session = started_session(10_800).await;

    let snapshot = session.clear_paper().await;
    assert_eq!(snapshot.phase, Phase::Upload);
    assert!(snapshot.paper.is_none());
    assert!(!session.is_ticking().await);

    sleep(Duration::from_secs(3)).await;
    assert_eq!(session.snapshot().await.global_time_remaining_seconds, 10_800);
}

#[tokio::test(start_paused = true)]
async fn restart_after_end_uses_fresh_clock() {
    let session = started_session(10_800).await;
    sleep(Duration::from_millis(3_500)).await;
    session.end().await;

    let snapshot = session.start().await.unwrap();
    assert_eq!(snapshot.global_time_remaining_seconds, 10_800);
    assert_eq!(snapshot.attempts, 2);

    sleep(Duration::from_millis(1_500)).await;
    assert_eq!(session.snapshot().await.global_time_remaining_seconds, 10_799);
}

#[tokio::test(start_paused = true)]
async fn sweeper_evicts_idle_session_and_stops_its_ticker() {
    let store = SessionStore::new(10);
    let session = started_session(10_800).await;
    let id = session.id();
    store.insert(session.clone()).await.unwrap();

    let _sweeper = store.spawn_sweeper(
        Duration::from_secs(10),
        Duration::from_secs(60),
        Duration::from_secs(5),
    );

    sleep(Duration::from_millis(50_500)).await;
    assert!(store.get(id).await.is_ok());

    sleep(Duration::from_secs(25)).await;
    assert!(store.get(id).await.is_err());
    assert!(store.is_empty().await);
    assert!(!session.is_ticking().await);
    assert_eq!(session.snapshot().await.phase, Phase::Ready);
}

#[tokio::test(start_paused = true)]
async fn sweeper_evicts_completed_session_before_active_one() {
    let store = SessionStore::new(10);
    let finished = started_session(10_800).await;
    finished.submit().await.unwrap();
    let active = started_session(10_800).await;
    store.insert(finished.clone()).await.unwrap();
    store.insert(active.clone()).await.unwrap();

    let _sweeper = store.spawn_sweeper(
        Duration::from_secs(10),
        Duration::from_secs(60),
        Duration::from_secs(5),
    );

    // The learner keeps polling the running test.
    for _ in 0..6 {
        sleep(Duration::from_secs(20)).await;
        active.snapshot().await;
    }

    assert!(store.get(finished.id()).await.is_err());
    assert!(store.get(active.id()).await.is_ok());
    assert!(active.is_ticking().await);
    assert_eq!(active.snapshot().await.phase, Phase::Testing);
}
