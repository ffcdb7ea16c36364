//! Database Module
//!
//! 嵌入式 SurrealDB 存储层：连接管理 + models + repository

pub mod models;
pub mod repository;

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};

use crate::utils::AppError;

const NAMESPACE: &str = "tiffin";
const DATABASE: &str = "tiffin";

/// Database service — owns the embedded SurrealDB handle
#[derive(Clone, Debug)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the on-disk database at the given path
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let db: Surreal<Db> = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        Self::setup(db).await
    }

    /// Open an in-memory database (tests)
    pub async fn open_in_memory() -> Result<Self, AppError> {
        let db: Surreal<Db> = Surreal::new::<Mem>(())
            .await
            .map_err(|e| AppError::database(format!("Failed to open in-memory database: {e}")))?;

        Self::setup(db).await
    }

    async fn setup(db: Surreal<Db>) -> Result<Self, AppError> {
        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        // Schemaless tables; only the username lookup needs an index
        db.query(
            r#"
            DEFINE TABLE IF NOT EXISTS user SCHEMALESS;
            DEFINE INDEX IF NOT EXISTS user_username ON user FIELDS username UNIQUE;
            DEFINE TABLE IF NOT EXISTS restaurant SCHEMALESS;
            DEFINE TABLE IF NOT EXISTS order SCHEMALESS;
            DEFINE TABLE IF NOT EXISTS notification SCHEMALESS;
            "#,
        )
        .await
        .map_err(|e| AppError::database(format!("Failed to define schema: {e}")))?;

        tracing::info!("Database connection established (embedded SurrealDB)");

        Ok(Self { db })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_on_disk_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiffin.db");
        let service = DbService::new(&path.to_string_lossy()).await;
        assert!(service.is_ok());
    }

    #[tokio::test]
    async fn test_schema_setup_is_idempotent() {
        let service = DbService::open_in_memory().await.unwrap();
        // DEFINE ... IF NOT EXISTS 允许重复执行
        assert!(DbService::setup(service.db.clone()).await.is_ok());
    }
}
