// src/engine/mod.rs

//! Timed, section-gated mock test engine.
//!
//! One [`ExamTimerEngine`] owns the whole state of a single attempt. Every
//! operation is a synchronous transition that returns the events it produced;
//! the caller forwards them to an [`observer::ExamObserver`]. Both countdowns
//! are driven by [`ExamTimerEngine::tick`], which the host calls once per second.

pub mod observer;

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    config::EXAM_DURATION_SECS,
    error::ExamError,
    models::{
        metrics::{MockTestMetrics, compute_metrics, is_attempted},
        question::{Question, QuestionBank, QuestionType, Section},
    },
};

/// Lifecycle of an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Upload,
    Ready,
    Testing,
    Completed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Upload => write!(f, "upload"),
            Phase::Ready => write!(f, "ready"),
            Phase::Testing => write!(f, "testing"),
            Phase::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Previous,
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

/// Transient notification for the learner (a toast).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub message: String,
    pub severity: Severity,
}

impl Advisory {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    /// The global countdown reached zero.
    TimeExpired,
    /// The learner submitted.
    Submitted,
}

/// Opaque reference to the uploaded paper. Only its presence matters to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperRef {
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
}

impl PaperRef {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            uploaded_at: Utc::now(),
        }
    }
}

/// Something the engine wants the outside world to know about.
#[derive(Debug, Clone, PartialEq)]
pub enum ExamEvent {
    StartAttempt,
    StartTimer,
    MetricsUpdated(MockTestMetrics),
    Advisory(Advisory),
    QuestionLocked {
        question_id: u32,
    },
    SectionUnlocked(Section),
    Completed {
        reason: CompletionReason,
        answers: HashMap<u32, String>,
    },
}

pub struct ExamTimerEngine {
    bank: Arc<QuestionBank>,
    exam_duration_secs: u32,
    paper: Option<PaperRef>,
    phase: Phase,
    answers: HashMap<u32, String>,
    /// Lock flags indexed by global question position.
    locked: Vec<bool>,
    current_index: usize,
    active_section: Section,
    global_time_remaining: u32,
    question_time_remaining: u32,
    unlocked_sections: BTreeSet<Section>,
    completion: Option<CompletionReason>,
}

impl ExamTimerEngine {
    pub fn new(bank: Arc<QuestionBank>) -> Self {
        let locked = vec![false; bank.len()];
        Self {
            bank,
            exam_duration_secs: EXAM_DURATION_SECS,
            paper: None,
            phase: Phase::Upload,
            answers: HashMap::new(),
            locked,
            current_index: 0,
            active_section: Section::A,
            global_time_remaining: EXAM_DURATION_SECS,
            question_time_remaining: 0,
            unlocked_sections: BTreeSet::from([Section::A]),
            completion: None,
        }
    }

    /// Overrides the global exam duration applied at every `start_test`.
    pub fn with_exam_duration(mut self, secs: u32) -> Self {
        self.exam_duration_secs = secs.max(1);
        self.global_time_remaining = self.exam_duration_secs;
        self
    }

    // ----- lifecycle -----

    /// Supplies the uploaded paper: `upload -> ready`.
    pub fn attach_paper(&mut self, paper: PaperRef) -> Result<Vec<ExamEvent>, ExamError> {
        match self.phase {
            Phase::Upload => {
                self.paper = Some(paper);
                self.phase = Phase::Ready;
                Ok(vec![ExamEvent::MetricsUpdated(self.metrics())])
            }
            Phase::Ready => {
                self.paper = Some(paper);
                Ok(Vec::new())
            }
            phase => Err(ExamError::InvalidPhase(phase)),
        }
    }

    /// The paper reference was cleared externally: the attempt is destroyed.
    pub fn clear_paper(&mut self) -> Vec<ExamEvent> {
        self.paper = None;
        self.reset_attempt();
        self.phase = Phase::Upload;
        vec![ExamEvent::MetricsUpdated(self.metrics())]
    }

    /// The learner ends the session: the attempt is destroyed, the paper is kept.
    pub fn end_session(&mut self) -> Vec<ExamEvent> {
        self.reset_attempt();
        self.phase = if self.paper.is_some() {
            Phase::Ready
        } else {
            Phase::Upload
        };
        vec![ExamEvent::MetricsUpdated(self.metrics())]
    }

    pub fn start_test(&mut self) -> Result<Vec<ExamEvent>, ExamError> {
        if self.phase != Phase::Ready {
            return Err(ExamError::InvalidPhase(self.phase));
        }

        self.reset_attempt();
        self.phase = Phase::Testing;
        self.question_time_remaining = self.bank.get(0).map_or(0, |q| q.time_limit_seconds);

        Ok(vec![
            ExamEvent::StartAttempt,
            ExamEvent::StartTimer,
            ExamEvent::MetricsUpdated(self.metrics()),
        ])
    }

    pub fn submit(&mut self) -> Result<Vec<ExamEvent>, ExamError> {
        self.ensure_testing()?;
        let mut events = Vec::new();
        self.complete(CompletionReason::Submitted, &mut events);
        Ok(events)
    }

    // ----- clock -----

    /// One scheduler tick: advances the global and the per-question countdown.
    ///
    /// Does nothing outside `testing`.
    pub fn tick(&mut self) -> Vec<ExamEvent> {
        let mut events = Vec::new();
        if self.phase != Phase::Testing {
            return events;
        }

        self.global_time_remaining = self.global_time_remaining.saturating_sub(1);
        if self.global_time_remaining == 0 {
            self.complete(CompletionReason::TimeExpired, &mut events);
            return events;
        }

        if !self.locked[self.current_index] && self.question_time_remaining > 0 {
            self.question_time_remaining -= 1;
            if self.question_time_remaining == 0 {
                self.handle_timer_expired(&mut events);
            }
        }

        events
    }

    fn handle_timer_expired(&mut self, events: &mut Vec<ExamEvent>) {
        let index = self.current_index;
        self.locked[index] = true;

        let question_id = self.bank.questions()[index].id;
        events.push(ExamEvent::QuestionLocked { question_id });
        events.push(ExamEvent::Advisory(Advisory::error(format!(
            "Time is up for Question {}. It is now locked.",
            question_id
        ))));

        let next = index + 1;
        if let Some(section) = self.bank.get(next).map(|q| q.section) {
            self.land_on(next);
            if section != self.active_section {
                self.active_section = section;
            }
        }

        self.evaluate_unlocks(events);
    }

    // ----- learner actions -----

    /// Records an answer. Locked questions silently ignore the call.
    pub fn select_answer(
        &mut self,
        question_id: u32,
        value: impl Into<String>,
    ) -> Result<Vec<ExamEvent>, ExamError> {
        self.ensure_testing()?;

        let index = self
            .bank
            .index_of(question_id)
            .ok_or(ExamError::UnknownQuestion(question_id))?;

        if self.locked[index] {
            tracing::debug!(question_id, "Ignoring answer for locked question");
            return Ok(Vec::new());
        }

        let value = value.into();
        let question = &self.bank.questions()[index];
        if question.question_type == QuestionType::Mcq && !question.options.contains(&value) {
            return Err(ExamError::InvalidOption { question_id, value });
        }

        self.answers.insert(question_id, value);

        let mut events = vec![ExamEvent::MetricsUpdated(self.metrics())];
        self.evaluate_unlocks(&mut events);
        Ok(events)
    }

    /// Moves to the sibling question within the current section.
    /// Boundaries are no-ops.
    pub fn navigate(&mut self, direction: Direction) -> Result<Vec<ExamEvent>, ExamError> {
        self.ensure_testing()?;

        let range = self.bank.section_range(self.current_question().section);
        let target = match direction {
            Direction::Previous => self.current_index.checked_sub(1),
            Direction::Next => Some(self.current_index + 1),
        }
        .filter(|i| range.contains(i));

        if let Some(target) = target {
            self.land_on(target);
        }
        Ok(Vec::new())
    }

    /// Jumps to the first question of `target`, or emits an advisory when it is still locked.
    pub fn switch_section(&mut self, target: Section) -> Result<Vec<ExamEvent>, ExamError> {
        self.ensure_testing()?;

        if !self.unlocked_sections.contains(&target) {
            // Section A is always unlocked, so a locked section has a prerequisite.
            let prerequisite = target.prerequisite().unwrap_or(Section::A);
            return Ok(vec![ExamEvent::Advisory(Advisory::error(format!(
                "Please complete Section {} first to unlock Section {}",
                prerequisite, target
            )))]);
        }

        self.active_section = target;
        self.land_on(self.bank.section_range(target).start);
        Ok(Vec::new())
    }

    // ----- derived state -----

    /// Unlocks B once A is fully answered-or-locked, then C the same way from B.
    fn evaluate_unlocks(&mut self, events: &mut Vec<ExamEvent>) {
        for section in [Section::B, Section::C] {
            if self.unlocked_sections.contains(&section) {
                continue;
            }
            let Some(prerequisite) = section.prerequisite() else {
                continue;
            };
            if !self.unlocked_sections.contains(&prerequisite)
                || !self.is_section_complete(prerequisite)
            {
                break;
            }

            self.unlocked_sections.insert(section);
            events.push(ExamEvent::SectionUnlocked(section));
            events.push(ExamEvent::Advisory(Advisory::success(format!(
                "Section {} unlocked!",
                section
            ))));
        }
    }

    fn is_section_complete(&self, section: Section) -> bool {
        self.bank
            .section_range(section)
            .all(|i| self.locked[i] || is_attempted(&self.answers, self.bank.questions()[i].id))
    }

    pub fn metrics(&self) -> MockTestMetrics {
        compute_metrics(&self.bank, &self.answers)
    }

    // ----- internals -----

    fn ensure_testing(&self) -> Result<(), ExamError> {
        if self.phase == Phase::Testing {
            Ok(())
        } else {
            Err(ExamError::NotInProgress(self.phase))
        }
    }

    /// Makes `index` current. A locked question shows zero time and never restarts.
    fn land_on(&mut self, index: usize) {
        self.current_index = index;
        self.question_time_remaining = if self.locked[index] {
            0
        } else {
            self.bank.questions()[index].time_limit_seconds
        };
    }

    fn complete(&mut self, reason: CompletionReason, events: &mut Vec<ExamEvent>) {
        self.phase = Phase::Completed;
        self.completion = Some(reason);
        events.push(ExamEvent::Completed {
            reason,
            answers: self.answers.clone(),
        });
        events.push(ExamEvent::MetricsUpdated(self.metrics()));
    }

    fn reset_attempt(&mut self) {
        self.answers.clear();
        self.locked.iter_mut().for_each(|l| *l = false);
        self.current_index = 0;
        self.active_section = Section::A;
        self.global_time_remaining = self.exam_duration_secs;
        self.question_time_remaining = 0;
        self.unlocked_sections = BTreeSet::from([Section::A]);
        self.completion = None;
    }

    // ----- accessors -----

    pub fn bank(&self) -> &Arc<QuestionBank> {
        &self.bank
    }

    pub fn paper(&self) -> Option<&PaperRef> {
        self.paper.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn completion(&self) -> Option<CompletionReason> {
        self.completion
    }

    pub fn answers(&self) -> &HashMap<u32, String> {
        &self.answers
    }

    pub fn is_locked(&self, question_id: u32) -> bool {
        self.bank
            .index_of(question_id)
            .is_some_and(|i| self.locked[i])
    }

    pub fn locked_question_ids(&self) -> Vec<u32> {
        self.bank
            .questions()
            .iter()
            .zip(&self.locked)
            .filter(|(_, locked)| **locked)
            .map(|(q, _)| q.id)
            .collect()
    }

    pub fn current_question_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> &Question {
        &self.bank.questions()[self.current_index]
    }

    pub fn active_section(&self) -> Section {
        self.active_section
    }

    pub fn unlocked_sections(&self) -> &BTreeSet<Section> {
        &self.unlocked_sections
    }

    pub fn global_time_remaining(&self) -> u32 {
        self.global_time_remaining
    }

    pub fn question_time_remaining(&self) -> u32 {
        self.question_time_remaining
    }
}
