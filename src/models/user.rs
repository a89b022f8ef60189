use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub user_name: String,
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub active: bool,
    pub last_login_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl User {
    /// 一度も有効化もログインもされていないアカウントか
    pub fn is_pending_activation(&self) -> bool {
        !self.active && self.last_login_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(active: bool, last_login_at: Option<OffsetDateTime>) -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            user_name: "Test".to_string(),
            password_hash: None,
            active,
            last_login_at,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_pending_activation() {
        assert!(user(false, None).is_pending_activation());
    }

    #[test]
    fn test_logged_in_user_is_not_pending() {
        // 有効化フラグが立っていなくてもログイン実績があれば対象外
        assert!(!user(false, Some(OffsetDateTime::now_utc())).is_pending_activation());
        assert!(!user(true, None).is_pending_activation());
    }
}
