//! Notification Repository
//!
//! 每用户持久化通知列表：定向通知按 recipient 存储，广播通知
//! recipient 为空、所有用户可见。列表按时间倒序，长度有上限。

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::NotificationDoc;
use shared::NotificationPayload;
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

const TABLE: &str = "notification";

#[derive(Clone)]
pub struct NotificationRepository {
    base: BaseRepository,
}

/// Row shape for prune queries
#[derive(Debug, serde::Deserialize)]
struct IdRow {
    id: RecordId,
}

impl NotificationRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Persist a notification and prune its history class beyond `limit`
    ///
    /// 定向通知按收件人裁剪，广播通知作为一类单独裁剪，两边都不会
    /// 无限增长。
    pub async fn append(&self, payload: &NotificationPayload, limit: usize) -> RepoResult<()> {
        let doc = NotificationDoc::from(payload);
        let created: Option<NotificationDoc> =
            self.base.db().create(TABLE).content(doc).await?;
        created.ok_or_else(|| RepoError::Database("Failed to persist notification".to_string()))?;

        match &payload.recipient {
            Some(recipient) => self.prune_targeted(recipient, limit).await?,
            None => self.prune_broadcasts(limit).await?,
        }
        Ok(())
    }

    /// Most recent notifications visible to a user (targeted + broadcasts),
    /// newest first, capped at `limit`
    pub async fn list_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> RepoResult<Vec<NotificationDoc>> {
        let docs: Vec<NotificationDoc> = self
            .base
            .db()
            .query(
                "SELECT * FROM notification \
                 WHERE recipient = $user OR recipient = NONE \
                 ORDER BY created_at DESC LIMIT $limit",
            )
            .bind(("user", user_id.to_string()))
            .bind(("limit", limit as i64))
            .await?
            .take(0)?;
        Ok(docs)
    }

    /// Drop a user's targeted notifications beyond the newest `limit`
    async fn prune_targeted(&self, recipient: &str, limit: usize) -> RepoResult<()> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT id, created_at FROM notification \
                 WHERE recipient = $recipient \
                 ORDER BY created_at DESC LIMIT 1000 START $start",
            )
            .bind(("recipient", recipient.to_string()))
            .bind(("start", limit as i64))
            .await?;
        let stale: Vec<IdRow> = result.take(0)?;
        self.delete_rows(stale).await
    }

    /// Drop broadcast notifications beyond the newest `limit`
    async fn prune_broadcasts(&self, limit: usize) -> RepoResult<()> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT id, created_at FROM notification \
                 WHERE recipient = NONE \
                 ORDER BY created_at DESC LIMIT 1000 START $start",
            )
            .bind(("start", limit as i64))
            .await?;
        let stale: Vec<IdRow> = result.take(0)?;
        self.delete_rows(stale).await
    }

    async fn delete_rows(&self, rows: Vec<IdRow>) -> RepoResult<()> {
        for row in rows {
            let _: Option<NotificationDoc> = self.base.db().delete(row.id).await?;
        }
        Ok(())
    }
}
