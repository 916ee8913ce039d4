// src/session.rs

//! Hosting of one exam attempt: the engine behind a lock, the observers it
//! reports to, and the once-per-period ticker that drives its clocks.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::{sync::Mutex, task::JoinHandle, time::Instant};
use uuid::Uuid;

use crate::{
    config::Config,
    engine::{
        Advisory, Direction, ExamEvent, ExamTimerEngine, PaperRef, Phase,
        observer::{ExamObserver, TracingObserver, dispatch},
    },
    error::ExamError,
    models::{
        metrics::MockTestMetrics,
        question::{PublicQuestion, QuestionBank, Section},
        session::{IssuedAdvisory, SessionSnapshot},
    },
};

/// Keeps what the shell renders between requests: live toasts and the last metrics push.
pub struct SessionFeed {
    advisory_ttl: TimeDelta,
    advisories: Vec<IssuedAdvisory>,
    metrics: MockTestMetrics,
    attempts: u32,
}

impl SessionFeed {
    pub fn new(advisory_ttl: Duration) -> Self {
        Self {
            advisory_ttl: TimeDelta::from_std(advisory_ttl).unwrap_or(TimeDelta::seconds(3)),
            advisories: Vec::new(),
            metrics: MockTestMetrics::default(),
            attempts: 0,
        }
    }

    /// Drops expired advisories and returns the ones still on screen.
    pub fn live_advisories(&mut self, now: DateTime<Utc>) -> Vec<IssuedAdvisory> {
        let ttl = self.advisory_ttl;
        self.advisories.retain(|a| now - a.issued_at < ttl);
        self.advisories.clone()
    }

    pub fn metrics(&self) -> MockTestMetrics {
        self.metrics
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

impl ExamObserver for SessionFeed {
    fn on_start_attempt(&mut self) {
        self.attempts += 1;
    }

    fn on_metrics_update(&mut self, metrics: &MockTestMetrics) {
        self.metrics = *metrics;
    }

    fn on_advisory(&mut self, advisory: &Advisory) {
        self.advisories.push(IssuedAdvisory {
            advisory: advisory.clone(),
            issued_at: Utc::now(),
        });
    }
}

struct SessionInner {
    engine: ExamTimerEngine,
    feed: SessionFeed,
    observers: Vec<Box<dyn ExamObserver>>,
    ticker: Option<JoinHandle<()>>,
    /// Last client operation. Ticks do not count as activity.
    last_active: Instant,
}

impl SessionInner {
    fn publish(&mut self, events: &[ExamEvent]) {
        dispatch(events, &mut self.feed);
        for observer in &mut self.observers {
            dispatch(events, observer.as_mut());
        }
    }

    fn stop_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

/// Cloneable handle to one exam attempt.
#[derive(Clone)]
pub struct ExamSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    tick_interval: Duration,
    inner: Arc<Mutex<SessionInner>>,
}

impl ExamSession {
    /// Creates a session in the `upload` phase, logging its events through `tracing`.
    pub fn new(bank: Arc<QuestionBank>, config: &Config) -> Self {
        let id = Uuid::new_v4();
        let tracer = TracingObserver::new(id.to_string());
        Self::with_observers(id, bank, config, vec![Box::new(tracer)])
    }

    pub fn with_observers(
        id: Uuid,
        bank: Arc<QuestionBank>,
        config: &Config,
        observers: Vec<Box<dyn ExamObserver>>,
    ) -> Self {
        let engine = ExamTimerEngine::new(bank).with_exam_duration(config.exam_duration_secs);
        let mut feed = SessionFeed::new(config.advisory_ttl);
        feed.metrics = engine.metrics();

        Self {
            id,
            created_at: Utc::now(),
            tick_interval: config.tick_interval,
            inner: Arc::new(Mutex::new(SessionInner {
                engine,
                feed,
                observers,
                ticker: None,
                last_active: Instant::now(),
            })),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let mut inner = self.inner.lock().await;
        inner.last_active = Instant::now();
        self.capture(&mut inner)
    }

    pub async fn metrics(&self) -> MockTestMetrics {
        let mut inner = self.inner.lock().await;
        inner.last_active = Instant::now();
        inner.feed.metrics()
    }

    pub async fn attach_paper(&self, file_name: &str) -> Result<SessionSnapshot, ExamError> {
        let paper = PaperRef::new(file_name);
        self.apply(|engine| engine.attach_paper(paper)).await
    }

    pub async fn clear_paper(&self) -> SessionSnapshot {
        let mut inner = self.inner.lock().await;
        inner.last_active = Instant::now();
        inner.stop_ticker();
        let events = inner.engine.clear_paper();
        inner.publish(&events);
        self.capture(&mut inner)
    }

    /// Starts the test and spawns the ticker that drives both countdowns.
    pub async fn start(&self) -> Result<SessionSnapshot, ExamError> {
        let mut inner = self.inner.lock().await;
        inner.last_active = Instant::now();
        let events = inner.engine.start_test()?;
        inner.publish(&events);

        inner.stop_ticker();
        inner.ticker = Some(spawn_ticker(
            Arc::downgrade(&self.inner),
            self.tick_interval,
        ));

        Ok(self.capture(&mut inner))
    }

    pub async fn select_answer(
        &self,
        question_id: u32,
        value: String,
    ) -> Result<SessionSnapshot, ExamError> {
        self.apply(|engine| engine.select_answer(question_id, value))
            .await
    }

    pub async fn navigate(&self, direction: Direction) -> Result<SessionSnapshot, ExamError> {
        self.apply(|engine| engine.navigate(direction)).await
    }

    pub async fn switch_section(&self, section: Section) -> Result<SessionSnapshot, ExamError> {
        self.apply(|engine| engine.switch_section(section)).await
    }

    pub async fn submit(&self) -> Result<SessionSnapshot, ExamError> {
        self.apply(|engine| engine.submit()).await
    }

    /// Ends the attempt and stops the ticker. The paper stays attached.
    pub async fn end(&self) -> SessionSnapshot {
        let mut inner = self.inner.lock().await;
        inner.last_active = Instant::now();
        inner.stop_ticker();
        let events = inner.engine.end_session();
        inner.publish(&events);
        self.capture(&mut inner)
    }

    /// Whether a ticker task is currently attached to this session.
    pub async fn is_ticking(&self) -> bool {
        self.inner
            .lock()
            .await
            .ticker
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Whether the session can be evicted at `now`: idle past `idle_ttl`, or
    /// completed and idle past `completed_ttl`.
    pub async fn is_stale(
        &self,
        now: Instant,
        idle_ttl: Duration,
        completed_ttl: Duration,
    ) -> bool {
        let inner = self.inner.lock().await;
        let idle = now.saturating_duration_since(inner.last_active);
        idle > idle_ttl || (inner.engine.phase() == Phase::Completed && idle > completed_ttl)
    }

    async fn apply<F>(&self, op: F) -> Result<SessionSnapshot, ExamError>
    where
        F: FnOnce(&mut ExamTimerEngine) -> Result<Vec<ExamEvent>, ExamError>,
    {
        let mut inner = self.inner.lock().await;
        inner.last_active = Instant::now();
        let events = op(&mut inner.engine)?;
        inner.publish(&events);
        if inner.engine.phase() != Phase::Testing {
            inner.stop_ticker();
        }
        Ok(self.capture(&mut inner))
    }

    fn capture(&self, inner: &mut SessionInner) -> SessionSnapshot {
        let engine = &inner.engine;
        let current_question = matches!(engine.phase(), Phase::Testing | Phase::Completed)
            .then(|| {
                let question = engine.current_question();
                PublicQuestion::from_question(question, engine.is_locked(question.id))
            });

        SessionSnapshot {
            id: self.id,
            created_at: self.created_at,
            phase: engine.phase(),
            paper: engine.paper().cloned(),
            global_time_remaining_seconds: engine.global_time_remaining(),
            question_time_remaining_seconds: engine.question_time_remaining(),
            active_section: engine.active_section(),
            current_question_index: engine.current_question_index(),
            current_question,
            unlocked_sections: engine.unlocked_sections().iter().copied().collect(),
            answers: engine
                .answers()
                .iter()
                .map(|(id, value)| (*id, value.clone()))
                .collect(),
            locked_questions: engine.locked_question_ids(),
            metrics: engine.metrics(),
            completion: engine.completion(),
            advisories: inner.feed.live_advisories(Utc::now()),
            attempts: inner.feed.attempts(),
        }
    }
}

/// One interval drives both countdowns. The task only holds a weak reference,
/// so a dropped session stops it; leaving `testing` stops it too.
fn spawn_ticker(inner: Weak<Mutex<SessionInner>>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;

            let Some(inner) = inner.upgrade() else {
                break;
            };
            let mut guard = inner.lock().await;
            let events = guard.engine.tick();
            guard.publish(&events);

            if guard.engine.phase() != Phase::Testing {
                // Detach our own handle; aborting it here would be a no-op anyway.
                guard.ticker = None;
                tracing::debug!("Ticker stopped: exam no longer running");
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CompletionReason;
    use crate::utils::sample_bank::sample_bank;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    fn session() -> ExamSession {
        ExamSession::new(Arc::new(sample_bank().unwrap()), &Config::default())
    }

    /// Records every callback it receives into a shared log.
    #[derive(Clone, Default)]
    struct Recorder {
        calls: Arc<StdMutex<Vec<String>>>,
    }

    impl Recorder {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn count(&self, call: &str) -> usize {
            self.calls().iter().filter(|c| *c == call).count()
        }

        fn push(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl ExamObserver for Recorder {
        fn on_start_attempt(&mut self) {
            self.push("attempt".to_string());
        }

        fn on_start_timer(&mut self) {
            self.push("timer".to_string());
        }

        fn on_metrics_update(&mut self, metrics: &MockTestMetrics) {
            self.push(format!("metrics:{}", metrics.total_attempted));
        }

        fn on_advisory(&mut self, advisory: &Advisory) {
            self.push(format!("advisory:{}", advisory.message));
        }

        fn on_question_locked(&mut self, question_id: u32) {
            self.push(format!("locked:{}", question_id));
        }

        fn on_section_unlocked(&mut self, section: Section) {
            self.push(format!("unlocked:{}", section));
        }

        fn on_completed(&mut self, reason: CompletionReason, answers: &HashMap<u32, String>) {
            self.push(format!("completed:{:?}:{}", reason, answers.len()));
        }
    }

    fn recorded_session(recorder: &Recorder) -> ExamSession {
        ExamSession::with_observers(
            Uuid::new_v4(),
            Arc::new(sample_bank().unwrap()),
            &Config::default(),
            vec![Box::new(recorder.clone())],
        )
    }

    #[test]
    fn test_feed_expires_advisories() {
        let mut feed = SessionFeed::new(Duration::from_secs(3));
        feed.on_advisory(&Advisory::success("Section B unlocked!"));

        let issued = feed.advisories[0].issued_at;
        assert_eq!(feed.live_advisories(issued + TimeDelta::seconds(2)).len(), 1);
        assert!(feed.live_advisories(issued + TimeDelta::seconds(3)).is_empty());
    }

    #[test]
    fn test_feed_counts_attempts() {
        let mut feed = SessionFeed::new(Duration::from_secs(3));
        dispatch(
            &[ExamEvent::StartAttempt, ExamEvent::StartTimer],
            &mut feed,
        );
        assert_eq!(feed.attempts(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_hides_question_before_start() {
        let session = session();
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.phase, Phase::Upload);
        assert!(snapshot.current_question.is_none());
        assert_eq!(snapshot.metrics.remaining, 35);
    }

    #[tokio::test]
    async fn test_locked_section_advisory_is_visible() {
        let session = session();
        session.attach_paper("paper.pdf").await.unwrap();
        session.start().await.unwrap();

        let snapshot = session.switch_section(Section::B).await.unwrap();
        assert_eq!(snapshot.active_section, Section::A);
        assert_eq!(snapshot.advisories.len(), 1);
        assert!(
            snapshot.advisories[0]
                .advisory
                .message
                .starts_with("Please complete Section A first")
        );
    }

    #[tokio::test]
    async fn test_observers_receive_lifecycle_callbacks() {
        let recorder = Recorder::default();
        let session = recorded_session(&recorder);

        session.attach_paper("paper.pdf").await.unwrap();
        session.start().await.unwrap();
        let option = sample_bank().unwrap().by_id(1).unwrap().options[0].clone();
        session.select_answer(1, option).await.unwrap();
        session.submit().await.unwrap();

        assert_eq!(
            recorder.calls(),
            vec![
                "metrics:0",
                "attempt",
                "timer",
                "metrics:0",
                "metrics:1",
                "completed:Submitted:1",
                "metrics:1",
            ]
        );
    }

    #[tokio::test]
    async fn test_start_callbacks_fire_once_per_start() {
        let recorder = Recorder::default();
        let session = recorded_session(&recorder);

        session.attach_paper("paper.pdf").await.unwrap();
        session.start().await.unwrap();
        assert!(session.start().await.is_err());
        assert_eq!(recorder.count("attempt"), 1);
        assert_eq!(recorder.count("timer"), 1);

        session.end().await;
        session.start().await.unwrap();
        assert_eq!(recorder.count("attempt"), 2);
        assert_eq!(recorder.count("timer"), 2);
    }

    #[tokio::test]
    async fn test_clear_and_end_push_metrics() {
        let recorder = Recorder::default();
        let session = recorded_session(&recorder);

        session.attach_paper("paper.pdf").await.unwrap();
        session.start().await.unwrap();
        session
            .select_answer(21, "An answer".to_string())
            .await
            .unwrap();
        let before = recorder.calls().len();

        session.end().await;
        let calls = recorder.calls();
        assert_eq!(&calls[before..], ["metrics:0"]);

        session.clear_paper().await;
        let calls = recorder.calls();
        assert_eq!(&calls[before + 1..], ["metrics:0"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_reports_lock_and_unlock_to_observers() {
        let recorder = Recorder::default();
        let session = recorded_session(&recorder);
        let bank = sample_bank().unwrap();

        session.attach_paper("paper.pdf").await.unwrap();
        session.start().await.unwrap();
        // Everything in Section A except the current question.
        for id in 2..=20 {
            let option = bank.by_id(id).unwrap().options[0].clone();
            session.select_answer(id, option).await.unwrap();
        }
        assert_eq!(recorder.count("unlocked:B"), 0);

        tokio::time::sleep(Duration::from_millis(90_500)).await;

        let calls = recorder.calls();
        let tail: Vec<&str> = calls.iter().rev().take(4).rev().map(String::as_str).collect();
        assert_eq!(
            tail,
            vec![
                "locked:1",
                "advisory:Time is up for Question 1. It is now locked.",
                "unlocked:B",
                "advisory:Section B unlocked!",
            ]
        );

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.active_section, Section::A);
        assert_eq!(snapshot.current_question_index, 1);
        assert!(snapshot.unlocked_sections.contains(&Section::B));
    }

    #[tokio::test(start_paused = true)]
    async fn test_staleness_tracks_client_activity() {
        let session = session();
        let idle_ttl = Duration::from_secs(60);
        let completed_ttl = Duration::from_secs(5);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(!session.is_stale(Instant::now(), idle_ttl, completed_ttl).await);

        session.snapshot().await;
        tokio::time::sleep(Duration::from_secs(45)).await;
        assert!(!session.is_stale(Instant::now(), idle_ttl, completed_ttl).await);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(session.is_stale(Instant::now(), idle_ttl, completed_ttl).await);

        session.attach_paper("paper.pdf").await.unwrap();
        session.start().await.unwrap();
        session.submit().await.unwrap();
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(session.is_stale(Instant::now(), idle_ttl, completed_ttl).await);
    }

    #[tokio::test]
    async fn test_submit_stops_ticker() {
        let session = session();
        session.attach_paper("paper.pdf").await.unwrap();
        let snapshot = session.start().await.unwrap();
        assert_eq!(snapshot.attempts, 1);
        assert!(session.is_ticking().await);

        let snapshot = session.submit().await.unwrap();
        assert_eq!(snapshot.phase, Phase::Completed);
        assert!(!session.is_ticking().await);
    }
}
