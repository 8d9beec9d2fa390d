use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sqlx::postgres::PgPoolOptions;
use tokio::fs;

pub type DbPool = sqlx::PgPool;

const MIGRATIONS_DIR: &str = "migrations";

pub async fn create_pool(database_url: &str) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connecting to postgres")?;
    Ok(pool)
}

/// `.sql` files under `dir`, sorted by file name.
async fn migration_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("reading {}", dir.display()))?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Splits a script into single statements; prepared statements on Postgres
/// take one command each. Comment-only fragments are dropped.
fn split_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| {
            stmt.lines()
                .map(str::trim)
                .any(|line| !line.is_empty() && !line.starts_with("--"))
        })
        .map(|stmt| format!("{stmt};"))
        .collect()
}

/// Applies every migration script in filename order. Scripts are written to
/// be re-runnable (`IF NOT EXISTS`).
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<()> {
    let backend = conn.get_database_backend();
    for file in migration_files(Path::new(MIGRATIONS_DIR)).await? {
        let sql = fs::read_to_string(&file).await?;
        for statement in split_statements(&sql) {
            conn.execute(Statement::from_string(backend, statement))
                .await
                .with_context(|| format!("applying {}", file.display()))?;
        }
        tracing::debug!(file = %file.display(), "migration applied");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::split_statements;

    #[test]
    fn splits_and_drops_comment_fragments() {
        let sql = "CREATE TABLE a (id INT);\n-- trailing note\n;\n  CREATE INDEX i ON a (id);\n";
        assert_eq!(
            split_statements(sql),
            vec!["CREATE TABLE a (id INT);", "CREATE INDEX i ON a (id);"]
        );
    }
}
