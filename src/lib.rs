pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;

#[cfg(test)]
mod test_support;

use std::path::Path;

use crate::core::{config::Settings, state::AppState, telemetry};
use crate::services::questions::QuestionBank;
use crate::services::roster::Roster;
use crate::services::storage::SubmissionStore;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let db_pool = db::init_pool(&settings).await?;
    db::run_migrations(&db_pool).await?;

    let roster = Roster::load(Path::new(&settings.exam().roster_path))?;
    tracing::info!(
        students = roster.student_count(),
        admins = roster.admin_count(),
        "Roster loaded"
    );

    let questions = QuestionBank::from_settings(&settings);
    let store = SubmissionStore::from_settings(&settings);
    store.ensure_root().await?;

    let state = AppState::new(settings, db_pool, roster, questions, store);
    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        "Proctor Rust API listening"
    );

    axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await?;

    Ok(())
}
