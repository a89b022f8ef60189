use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::User;

/// 一時リンク発行時に必要なユーザー参照
#[async_trait]
pub trait UserStore: Send + Sync {
    /// ログインキー（メールアドレス）でユーザーを検索
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;

    /// ユーザーを削除（有効化リンクを発行できなかった新規登録の取り消し）
    async fn delete_user(&self, user_id: Uuid) -> Result<(), sqlx::Error>;
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 新しいユーザーを作成（未有効化状態）
    ///
    /// # Errors
    /// - UNIQUE制約違反時: `sqlx::Error::Database` (constraint = "users_email_key")
    ///   呼び出し側で `AppError::EmailAlreadyExists` に変換すること
    pub async fn create_user(
        &self,
        email: &str,
        user_name: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, user_name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, user_name, password_hash, active, last_login_at, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(user_name)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
    }

    /// アカウントを有効化
    pub async fn activate(&self, user_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET active = true, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// ユーザーのパスワードを更新
    ///
    /// # Note
    /// password_hash はログに出力しないこと
    pub async fn update_password(
        &self,
        user_id: Uuid,
        new_password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(new_password_hash)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, user_name, password_hash, active, last_login_at, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            DELETE FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
