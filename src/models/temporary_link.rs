use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// 一時リンクの用途
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkPurpose {
    /// アカウント有効化（有効期限24時間）
    Activate,
    /// パスワードリセット（有効期限2時間）
    Reset,
}

impl LinkPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Reset => "reset",
        }
    }

    /// 描画するテンプレート名（`<用途>_email`）
    pub fn template_name(&self) -> &'static str {
        match self {
            Self::Activate => "activate_email",
            Self::Reset => "reset_email",
        }
    }

    /// リンク先の画面パス
    pub fn path(&self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Reset => "password-reset",
        }
    }

    /// リンクの有効時間（時間単位）
    pub fn timespan_hours(&self) -> i64 {
        match self {
            Self::Activate => 24,
            Self::Reset => 2,
        }
    }

    pub fn timespan(&self) -> Duration {
        Duration::hours(self.timespan_hours())
    }
}

impl TryFrom<String> for LinkPurpose {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "activate" => Ok(Self::Activate),
            "reset" => Ok(Self::Reset),
            other => Err(format!("unknown link purpose: {other}")),
        }
    }
}

/// 送信メールのスナップショット
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailInfo {
    pub from: String,
    pub to: String,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
}

/// 保存前の一時リンク
#[derive(Debug, Clone)]
pub struct NewTemporaryLink {
    /// 対象ユーザーのID（リンクの主キーを兼ねる）
    pub id: Uuid,
    pub url: String,
    pub purpose: LinkPurpose,
    pub expiration_time: OffsetDateTime,
    pub email_info: EmailInfo,
}

/// 一時リンク
///
/// 主キーはユーザーIDと共有するため、1ユーザーにつき未使用リンクは1件のみ
/// url（トークン）はレスポンスに含めない
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TemporaryLink {
    pub id: Uuid,
    #[serde(skip)]
    pub url: String,
    #[sqlx(try_from = "String")]
    pub purpose: LinkPurpose,
    pub expiration_time: OffsetDateTime,
    pub email_info: Json<EmailInfo>,
    pub created_at: OffsetDateTime,
}

impl TemporaryLink {
    /// 指定時刻において有効期限切れか
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expiration_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timespans() {
        assert_eq!(LinkPurpose::Activate.timespan(), Duration::hours(24));
        assert_eq!(LinkPurpose::Reset.timespan(), Duration::hours(2));
    }

    #[test]
    fn test_template_names() {
        assert_eq!(LinkPurpose::Activate.template_name(), "activate_email");
        assert_eq!(LinkPurpose::Reset.template_name(), "reset_email");
    }

    #[test]
    fn test_purpose_from_string() {
        assert_eq!(
            LinkPurpose::try_from("reset".to_string()),
            Ok(LinkPurpose::Reset)
        );
        assert!(LinkPurpose::try_from("login".to_string()).is_err());
    }

    fn link(expiration_time: OffsetDateTime) -> TemporaryLink {
        TemporaryLink {
            id: Uuid::new_v4(),
            url: "token".to_string(),
            purpose: LinkPurpose::Activate,
            expiration_time,
            email_info: Json(EmailInfo {
                from: "admin@example.com".to_string(),
                to: "a@example.com".to_string(),
                cc: None,
                bcc: None,
                subject: "subject".to_string(),
                html: "<p>hi</p>".to_string(),
                text: None,
            }),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let now = OffsetDateTime::now_utc();
        let link = link(now);

        // 有効期限ちょうどの時刻は既に無効
        assert!(link.is_expired_at(now));
        assert!(!link.is_expired_at(now - Duration::seconds(1)));
    }

    #[test]
    fn test_serialize_hides_token() {
        let value = serde_json::to_value(link(OffsetDateTime::now_utc())).unwrap();

        assert!(value.get("url").is_none());
        assert_eq!(value["purpose"], "activate");
        assert_eq!(value["email_info"]["to"], "a@example.com");
    }
}
