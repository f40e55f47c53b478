use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

#[tokio::test]
async fn migrations_apply_and_tables_exist() -> anyhow::Result<()> {
    let dir = std::env::temp_dir().join(format!("proctor-migrations-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;
    let db_path = dir.join("smoke.db");

    let options = SqliteConnectOptions::new().filename(&db_path).create_if_missing(true);
    let pool = SqlitePoolOptions::new().max_connections(1).connect_with(options).await?;

    let migrations_dir =
        std::env::var("PROCTOR_MIGRATIONS_DIR").unwrap_or_else(|_| "migrations".to_string());
    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(&migrations_dir)).await?;
    migrator.run(&pool).await?;

    for table in ["submissions", "leave_events"] {
        let found: Option<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
        )
        .bind(table)
        .fetch_optional(&pool)
        .await?;
        assert!(found.is_some(), "missing table {table}");
    }

    // Re-running is a no-op.
    migrator.run(&pool).await?;

    pool.close().await;
    std::fs::remove_dir_all(&dir)?;
    Ok(())
}
