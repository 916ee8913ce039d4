// src/engine/observer.rs

use std::collections::HashMap;

use crate::{
    engine::{Advisory, CompletionReason, ExamEvent, Severity},
    models::{metrics::MockTestMetrics, question::Section},
};

/// Outbound callbacks of an exam attempt.
///
/// All methods are fire-and-forget and default to no-ops, so a shell only
/// implements what it renders.
pub trait ExamObserver: Send {
    fn on_start_attempt(&mut self) {}

    fn on_start_timer(&mut self) {}

    fn on_metrics_update(&mut self, _metrics: &MockTestMetrics) {}

    fn on_advisory(&mut self, _advisory: &Advisory) {}

    fn on_question_locked(&mut self, _question_id: u32) {}

    fn on_section_unlocked(&mut self, _section: Section) {}

    /// Receives the final answer map so it can be flushed before the attempt is torn down.
    fn on_completed(&mut self, _reason: CompletionReason, _answers: &HashMap<u32, String>) {}
}

/// Routes each event to the matching observer callback, in order.
pub fn dispatch(events: &[ExamEvent], observer: &mut dyn ExamObserver) {
    for event in events {
        match event {
            ExamEvent::StartAttempt => observer.on_start_attempt(),
            ExamEvent::StartTimer => observer.on_start_timer(),
            ExamEvent::MetricsUpdated(metrics) => observer.on_metrics_update(metrics),
            ExamEvent::Advisory(advisory) => observer.on_advisory(advisory),
            ExamEvent::QuestionLocked { question_id } => observer.on_question_locked(*question_id),
            ExamEvent::SectionUnlocked(section) => observer.on_section_unlocked(*section),
            ExamEvent::Completed { reason, answers } => observer.on_completed(*reason, answers),
        }
    }
}

/// Logs every engine event through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingObserver {
    /// Session label attached to each log line.
    pub label: String,
}

impl TracingObserver {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl ExamObserver for TracingObserver {
    fn on_start_attempt(&mut self) {
        tracing::info!(session = %self.label, "Mock test attempt started");
    }

    fn on_start_timer(&mut self) {
        tracing::debug!(session = %self.label, "Exam timer started");
    }

    fn on_metrics_update(&mut self, metrics: &MockTestMetrics) {
        tracing::debug!(
            session = %self.label,
            attempted = metrics.total_attempted,
            remaining = metrics.remaining,
            "Metrics updated"
        );
    }

    fn on_advisory(&mut self, advisory: &Advisory) {
        match advisory.severity {
            Severity::Success => tracing::info!(session = %self.label, "{}", advisory.message),
            Severity::Error => tracing::warn!(session = %self.label, "{}", advisory.message),
        }
    }

    fn on_question_locked(&mut self, question_id: u32) {
        tracing::info!(session = %self.label, question_id, "Question locked on timeout");
    }

    fn on_section_unlocked(&mut self, section: Section) {
        tracing::info!(session = %self.label, %section, "Section unlocked");
    }

    fn on_completed(&mut self, reason: CompletionReason, answers: &HashMap<u32, String>) {
        tracing::info!(
            session = %self.label,
            ?reason,
            answers = answers.len(),
            "Mock test completed"
        );
    }
}
