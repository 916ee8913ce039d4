// src/handlers/questions.rs

use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::models::question::{PublicQuestion, QuestionBank};

/// Lists the paper's questions in global order.
pub async fn list_questions(State(bank): State<Arc<QuestionBank>>) -> impl IntoResponse {
    let questions: Vec<PublicQuestion> = bank
        .questions()
        .iter()
        .map(|q| PublicQuestion::from_question(q, false))
        .collect();

    Json(questions)
}
