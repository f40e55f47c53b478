use std::sync::Arc;
use std::time::Instant;

use sqlx::SqlitePool;
use tokio::sync::{Mutex, MutexGuard};

use crate::core::{config::Settings, events::EventHub};
use crate::services::questions::QuestionBank;
use crate::services::roster::Roster;
use crate::services::storage::SubmissionStore;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: SqlitePool,
    roster: Roster,
    questions: QuestionBank,
    store: SubmissionStore,
    events: EventHub,
    // Serializes all ledger and storage mutations; reads bypass it.
    write_lock: Mutex<()>,
    started_at: Instant,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        db: SqlitePool,
        roster: Roster,
        questions: QuestionBank,
        store: SubmissionStore,
    ) -> Self {
        Self {
            inner: Arc::new(InnerState {
                settings,
                db,
                roster,
                questions,
                store,
                events: EventHub::new(),
                write_lock: Mutex::new(()),
                started_at: Instant::now(),
            }),
        }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &SqlitePool {
        &self.inner.db
    }

    pub(crate) fn roster(&self) -> &Roster {
        &self.inner.roster
    }

    pub(crate) fn questions(&self) -> &QuestionBank {
        &self.inner.questions
    }

    pub(crate) fn store(&self) -> &SubmissionStore {
        &self.inner.store
    }

    pub(crate) fn events(&self) -> &EventHub {
        &self.inner.events
    }

    pub(crate) async fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.inner.write_lock.lock().await
    }

    pub(crate) fn uptime_seconds(&self) -> u64 {
        self.inner.started_at.elapsed().as_secs()
    }
}
