use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::events::{ErrorNotice, StatsSnapshot};

#[derive(Debug, Serialize)]
pub(crate) struct OverviewResponse {
    pub(crate) started_students: i64,
    pub(crate) questions: Vec<String>,
    pub(crate) submissions: BTreeMap<String, BTreeMap<String, bool>>,
    pub(crate) leave_counts: BTreeMap<String, i64>,
    pub(crate) recent_errors: Vec<ErrorNotice>,
    pub(crate) stats: StatsSnapshot,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResetResponse {
    pub(crate) message: String,
}
