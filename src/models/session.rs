// src/models/session.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    engine::{Advisory, CompletionReason, Direction, PaperRef, Phase},
    models::{
        metrics::MockTestMetrics,
        question::{PublicQuestion, Section},
    },
};

/// A toast together with the moment it was raised.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedAdvisory {
    #[serde(flatten)]
    pub advisory: Advisory,
    pub issued_at: DateTime<Utc>,
}

/// Full view of one exam session, returned by every session endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub phase: Phase,
    pub paper: Option<PaperRef>,
    pub global_time_remaining_seconds: u32,
    pub question_time_remaining_seconds: u32,
    pub active_section: Section,
    pub current_question_index: usize,
    /// Only present while a test is running or has completed.
    pub current_question: Option<PublicQuestion>,
    pub unlocked_sections: Vec<Section>,
    /// Keyed by question id.
    pub answers: BTreeMap<u32, String>,
    pub locked_questions: Vec<u32>,
    pub metrics: MockTestMetrics,
    /// Advisories still within their display window.
    pub advisories: Vec<IssuedAdvisory>,
    pub completion: Option<CompletionReason>,
    /// Number of times a test has been started in this session.
    pub attempts: u32,
}

/// DTO for supplying the uploaded paper.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AttachPaperRequest {
    #[validate(length(min = 1, max = 255, message = "File name must be between 1 and 255 characters."))]
    pub file_name: String,
}

/// DTO for answering a question.
/// For MCQs `value` is the selected option text.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    #[validate(range(min = 1))]
    pub question_id: u32,
    #[validate(length(max = 3000))]
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub direction: Direction,
}

#[derive(Debug, Deserialize)]
pub struct SwitchSectionRequest {
    pub section: Section,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LONG_ANSWER_CHAR_CAP;

    #[test]
    fn test_answer_request_validation() {
        let ok = AnswerRequest {
            question_id: 21,
            value: "Force equals mass times acceleration".to_string(),
        };
        assert!(ok.validate().is_ok());

        let zero_id = AnswerRequest {
            question_id: 0,
            value: "x".to_string(),
        };
        assert!(zero_id.validate().is_err());

        let too_long = AnswerRequest {
            question_id: 31,
            value: "a".repeat(LONG_ANSWER_CHAR_CAP + 1),
        };
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn test_attach_paper_validation() {
        let empty = AttachPaperRequest {
            file_name: String::new(),
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_requests_parse_lowercase_enums() {
        let nav: NavigateRequest = serde_json::from_str(r#"{"direction":"previous"}"#).unwrap();
        assert_eq!(nav.direction, Direction::Previous);

        let switch: SwitchSectionRequest = serde_json::from_str(r#"{"section":"B"}"#).unwrap();
        assert_eq!(switch.section, Section::B);
    }
}
