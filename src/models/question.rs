// src/models/question.rs

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    config::{
        LONG_ANSWER_CHAR_CAP, LONG_TIME_LIMIT_SECS, MCQ_OPTION_COUNT, MCQ_TIME_LIMIT_SECS,
        SECTION_A_SIZE, SECTION_B_SIZE, SECTION_C_SIZE, SHORT_ANSWER_CHAR_CAP,
        SHORT_TIME_LIMIT_SECS,
    },
    error::ExamError,
};

/// One of the three fixed question groups of a paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Section {
    A,
    B,
    C,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::A, Section::B, Section::C];

    /// The section that must be completed before this one unlocks.
    pub fn prerequisite(self) -> Option<Section> {
        match self {
            Section::A => None,
            Section::B => Some(Section::A),
            Section::C => Some(Section::B),
        }
    }

    pub fn size(self) -> usize {
        match self {
            Section::A => SECTION_A_SIZE,
            Section::B => SECTION_B_SIZE,
            Section::C => SECTION_C_SIZE,
        }
    }

    /// Question type every question of this section must have.
    pub fn question_type(self) -> QuestionType {
        match self {
            Section::A => QuestionType::Mcq,
            Section::B => QuestionType::Short,
            Section::C => QuestionType::Long,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::A => write!(f, "A"),
            Section::B => write!(f, "B"),
            Section::C => write!(f, "C"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Mcq,
    Short,
    Long,
}

impl QuestionType {
    pub fn time_limit_secs(self) -> u32 {
        match self {
            QuestionType::Mcq => MCQ_TIME_LIMIT_SECS,
            QuestionType::Short => SHORT_TIME_LIMIT_SECS,
            QuestionType::Long => LONG_TIME_LIMIT_SECS,
        }
    }

    /// Advisory UI character cap for free-text answers.
    pub fn char_cap(self) -> Option<usize> {
        match self {
            QuestionType::Mcq => None,
            QuestionType::Short => Some(SHORT_ANSWER_CHAR_CAP),
            QuestionType::Long => Some(LONG_ANSWER_CHAR_CAP),
        }
    }
}

/// A single question of the paper.
///
/// The per-attempt `locked` flag is not stored here; it belongs to the
/// engine so that a bank can be shared between attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Globally unique, 1-based and contiguous across sections.
    pub id: u32,

    pub section: Section,

    pub text: String,

    pub marks: u32,

    pub difficulty: Difficulty,

    /// Serialized as `type` to match the paper format.
    #[serde(rename = "type")]
    pub question_type: QuestionType,

    /// Exactly 4 entries for MCQ, empty otherwise.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    pub time_limit_seconds: u32,
}

impl Question {
    /// Builds a question, deriving the time limit from its type.
    pub fn new(
        id: u32,
        section: Section,
        text: impl Into<String>,
        marks: u32,
        difficulty: Difficulty,
        question_type: QuestionType,
        options: Vec<String>,
    ) -> Self {
        Self {
            id,
            section,
            text: text.into(),
            marks,
            difficulty,
            question_type,
            options,
            time_limit_seconds: question_type.time_limit_secs(),
        }
    }
}

/// DTO for sending a question to the client, with its attempt-local lock flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: u32,
    pub section: Section,
    pub text: String,
    pub marks: u32,
    pub difficulty: Difficulty,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub time_limit_seconds: u32,
    pub locked: bool,
}

impl PublicQuestion {
    pub fn from_question(question: &Question, locked: bool) -> Self {
        Self {
            id: question.id,
            section: question.section,
            text: question.text.clone(),
            marks: question.marks,
            difficulty: question.difficulty,
            question_type: question.question_type,
            options: question.options.clone(),
            time_limit_seconds: question.time_limit_seconds,
            locked,
        }
    }
}

/// An ordered, validated set of questions: 20 A (mcq), 10 B (short), 5 C (long).
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Validates the paper layout and returns the bank.
    pub fn new(questions: Vec<Question>) -> Result<Self, ExamError> {
        let mut expected_id = 1u32;
        let mut cursor = 0usize;

        for section in Section::ALL {
            let end = cursor + section.size();
            if questions.len() < end {
                return Err(ExamError::InvalidBank(format!(
                    "section {} needs {} questions",
                    section,
                    section.size()
                )));
            }

            for q in &questions[cursor..end] {
                if q.section != section {
                    return Err(ExamError::InvalidBank(format!(
                        "question {} belongs to section {}, expected {}",
                        q.id, q.section, section
                    )));
                }
                if q.id != expected_id {
                    return Err(ExamError::InvalidBank(format!(
                        "expected question id {}, found {}",
                        expected_id, q.id
                    )));
                }
                if q.question_type != section.question_type() {
                    return Err(ExamError::InvalidBank(format!(
                        "question {} has the wrong type for section {}",
                        q.id, section
                    )));
                }
                if q.time_limit_seconds != q.question_type.time_limit_secs() {
                    return Err(ExamError::InvalidBank(format!(
                        "question {} has time limit {}s, expected {}s",
                        q.id,
                        q.time_limit_seconds,
                        q.question_type.time_limit_secs()
                    )));
                }
                let options_ok = match q.question_type {
                    QuestionType::Mcq => q.options.len() == MCQ_OPTION_COUNT,
                    QuestionType::Short | QuestionType::Long => q.options.is_empty(),
                };
                if !options_ok {
                    return Err(ExamError::InvalidBank(format!(
                        "question {} has {} options",
                        q.id,
                        q.options.len()
                    )));
                }
                expected_id += 1;
            }
            cursor = end;
        }

        if questions.len() != cursor {
            return Err(ExamError::InvalidBank(format!(
                "expected {} questions, found {}",
                cursor,
                questions.len()
            )));
        }

        Ok(Self { questions })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Global index of a question id.
    pub fn index_of(&self, id: u32) -> Option<usize> {
        // Ids are 1-based and contiguous.
        let index = (id as usize).checked_sub(1)?;
        (index < self.questions.len()).then_some(index)
    }

    pub fn by_id(&self, id: u32) -> Option<&Question> {
        self.index_of(id).and_then(|i| self.questions.get(i))
    }

    /// Global index range `[start, end)` of a section's questions.
    pub fn section_range(&self, section: Section) -> std::ops::Range<usize> {
        let start = Section::ALL
            .iter()
            .take_while(|s| **s != section)
            .map(|s| s.size())
            .sum();
        start..start + section.size()
    }

    pub fn section_questions(&self, section: Section) -> &[Question] {
        &self.questions[self.section_range(section)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::sample_bank::sample_questions;

    #[test]
    fn test_sample_bank_is_valid() {
        let bank = QuestionBank::new(sample_questions()).unwrap();
        assert_eq!(bank.len(), 35);
        assert_eq!(bank.section_range(Section::A), 0..20);
        assert_eq!(bank.section_range(Section::B), 20..30);
        assert_eq!(bank.section_range(Section::C), 30..35);
        assert_eq!(bank.by_id(21).unwrap().section, Section::B);
        assert_eq!(bank.index_of(0), None);
        assert_eq!(bank.index_of(36), None);
    }

    #[test]
    fn test_time_limits_follow_type() {
        let bank = QuestionBank::new(sample_questions()).unwrap();
        for q in bank.questions() {
            let expected = match q.question_type {
                QuestionType::Mcq => 90,
                QuestionType::Short => 240,
                QuestionType::Long => 600,
            };
            assert_eq!(q.time_limit_seconds, expected);
        }
    }

    #[test]
    fn test_rejects_missing_questions() {
        let mut questions = sample_questions();
        questions.pop();
        assert!(matches!(
            QuestionBank::new(questions),
            Err(ExamError::InvalidBank(_))
        ));
    }

    #[test]
    fn test_rejects_non_contiguous_ids() {
        let mut questions = sample_questions();
        questions[5].id = 99;
        assert!(QuestionBank::new(questions).is_err());
    }

    #[test]
    fn test_rejects_mcq_with_three_options() {
        let mut questions = sample_questions();
        questions[0].options.pop();
        assert!(QuestionBank::new(questions).is_err());
    }

    #[test]
    fn test_rejects_extra_questions() {
        let mut questions = sample_questions();
        let mut extra = questions[34].clone();
        extra.id = 36;
        questions.push(extra);
        assert!(QuestionBank::new(questions).is_err());
    }

    #[test]
    fn test_question_type_wire_name() {
        let bank = QuestionBank::new(sample_questions()).unwrap();
        let json = serde_json::to_value(&bank.questions()[0]).unwrap();
        assert_eq!(json["type"], "mcq");
        assert_eq!(json["timeLimitSeconds"], 90);
        assert_eq!(json["options"].as_array().unwrap().len(), 4);
    }
}
