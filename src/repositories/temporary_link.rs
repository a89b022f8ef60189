use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::{LinkPurpose, NewTemporaryLink, TemporaryLink};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 同一ユーザーに有効期限内のリンクが既に存在する
    #[error("an unexpired link is already outstanding for user {0}")]
    OutstandingLink(Uuid),
}

/// 一時リンクの永続化
#[async_trait]
pub trait TemporaryLinkStore: Send + Sync {
    /// リンクを保存
    ///
    /// 同一ユーザーの期限切れリンクは置き換える。
    /// 期限内のリンクが残っている場合は `StoreError::OutstandingLink`
    async fn create(&self, link: &NewTemporaryLink) -> Result<TemporaryLink, StoreError>;

    /// url と用途が一致するリンクを取り出して削除（一度きりの消費）
    ///
    /// # Note
    /// 有効期限の検証は呼び出し側で行う
    async fn consume(
        &self,
        url: &str,
        purpose: LinkPurpose,
    ) -> Result<Option<TemporaryLink>, StoreError>;

    /// 期限切れリンクを削除
    ///
    /// # Returns
    /// 削除された行数
    async fn delete_expired(&self) -> Result<u64, StoreError>;
}

#[derive(Clone)]
pub struct TemporaryLinkRepository {
    pool: PgPool,
}

impl TemporaryLinkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemporaryLinkStore for TemporaryLinkRepository {
    async fn create(&self, link: &NewTemporaryLink) -> Result<TemporaryLink, StoreError> {
        let created = sqlx::query_as::<_, TemporaryLink>(
            r#"
            INSERT INTO temporary_links (id, url, purpose, expiration_time, email_info)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET url = EXCLUDED.url,
                purpose = EXCLUDED.purpose,
                expiration_time = EXCLUDED.expiration_time,
                email_info = EXCLUDED.email_info,
                created_at = NOW()
            WHERE temporary_links.expiration_time <= NOW()
            RETURNING id, url, purpose, expiration_time, email_info, created_at
            "#,
        )
        .bind(link.id)
        .bind(&link.url)
        .bind(link.purpose.as_str())
        .bind(link.expiration_time)
        .bind(Json(&link.email_info))
        .fetch_optional(&self.pool)
        .await?;

        created.ok_or(StoreError::OutstandingLink(link.id))
    }

    async fn consume(
        &self,
        url: &str,
        purpose: LinkPurpose,
    ) -> Result<Option<TemporaryLink>, StoreError> {
        let link = sqlx::query_as::<_, TemporaryLink>(
            r#"
            DELETE FROM temporary_links
            WHERE url = $1 AND purpose = $2
            RETURNING id, url, purpose, expiration_time, email_info, created_at
            "#,
        )
        .bind(url)
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(link)
    }

    async fn delete_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM temporary_links
            WHERE expiration_time <= NOW()
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
