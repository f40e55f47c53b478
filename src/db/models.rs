use sqlx::FromRow;
use time::PrimitiveDateTime;

/// One ledger row per (student, question) pair. Created when the question's
/// timer starts; `submitted` only ever flips false to true.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct SubmissionRow {
    pub(crate) username: String,
    pub(crate) question: String,
    pub(crate) submitted: bool,
    pub(crate) started_at: Option<PrimitiveDateTime>,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct LeaveRow {
    pub(crate) username: String,
    pub(crate) leave_count: i64,
    pub(crate) last_leave_at: PrimitiveDateTime,
}
