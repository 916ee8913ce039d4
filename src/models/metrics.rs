// src/models/metrics.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::question::{QuestionBank, Section};

/// Progress of a single section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionMetrics {
    pub attempted: usize,
    pub total: usize,
}

/// Progress snapshot pushed to the shell on every answer or phase change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockTestMetrics {
    pub section_a: SectionMetrics,
    pub section_b: SectionMetrics,
    pub section_c: SectionMetrics,
    pub total_attempted: usize,
    pub remaining: usize,
    /// Always 0: review marking is not offered by any operation.
    pub marked_for_review: usize,
}

impl MockTestMetrics {
    pub fn section(&self, section: Section) -> SectionMetrics {
        match section {
            Section::A => self.section_a,
            Section::B => self.section_b,
            Section::C => self.section_c,
        }
    }
}

/// "Attempted" means a recorded answer that is not blank after trimming.
pub fn is_attempted(answers: &HashMap<u32, String>, question_id: u32) -> bool {
    answers
        .get(&question_id)
        .is_some_and(|answer| !answer.trim().is_empty())
}

/// Pure projection of `(questions, answers)` into progress metrics.
pub fn compute_metrics(bank: &QuestionBank, answers: &HashMap<u32, String>) -> MockTestMetrics {
    let per_section = |section: Section| {
        let questions = bank.section_questions(section);
        SectionMetrics {
            attempted: questions
                .iter()
                .filter(|q| is_attempted(answers, q.id))
                .count(),
            total: questions.len(),
        }
    };

    let section_a = per_section(Section::A);
    let section_b = per_section(Section::B);
    let section_c = per_section(Section::C);
    let total_attempted = section_a.attempted + section_b.attempted + section_c.attempted;

    MockTestMetrics {
        section_a,
        section_b,
        section_c,
        total_attempted,
        remaining: bank.len() - total_attempted,
        marked_for_review: 0,
    }
}
