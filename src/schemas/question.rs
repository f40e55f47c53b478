use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct QuestionSummary {
    pub(crate) id: String,
    pub(crate) duration_seconds: i64,
    pub(crate) submitted: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionListResponse {
    pub(crate) started: bool,
    pub(crate) current_question: Option<String>,
    pub(crate) questions: Vec<QuestionSummary>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionDetailResponse {
    pub(crate) id: String,
    pub(crate) text: Option<String>,
    pub(crate) time_left: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitResponse {
    pub(crate) message: String,
    pub(crate) next_question: Option<String>,
    pub(crate) size: i64,
    pub(crate) sha256: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AutoSubmitResponse {
    pub(crate) message: String,
    pub(crate) next_question: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReviewEntry {
    pub(crate) submitted: bool,
    pub(crate) started_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReviewResponse {
    pub(crate) submissions: BTreeMap<String, ReviewEntry>,
}
