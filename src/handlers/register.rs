use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;
use crate::services::ActivationLinkInfo;
use crate::models::LinkPurpose;
use crate::services::link_url::{generate_token, link_url_for};
use crate::services::password::hash_password;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub user_name: String,
    pub password: String, // SecretBox不要（Deserialize後すぐハッシュ化）
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// 有効化リンクの有効期限
    #[serde(with = "time::serde::rfc3339")]
    pub activation_expires_at: OffsetDateTime,
}

/// ユーザー登録ハンドラー
///
/// 未有効化のユーザーを作成し、有効化リンクをメールで送信する
///
/// # Security
/// - パスワードはログに出力しない
/// - パスワードは即座にハッシュ化
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    // バリデーション
    validate_register_request(&request)?;

    // パスワードハッシュ化
    let password_hash = hash_password(&request.password)?;

    // ユーザー作成
    let user = state
        .user_repo
        .create_user(&request.email, request.user_name.trim(), &password_hash)
        .await
        .map_err(|e| {
            // UNIQUE制約違反チェック
            if let sqlx::Error::Database(db_err) = &e
                && db_err.constraint() == Some("users_email_key")
            {
                return AppError::EmailAlreadyExists;
            }
            AppError::Database(e)
        })?;

    tracing::info!(email = %request.email, user_id = %user.id, "ユーザー登録成功");

    // 有効化リンク発行（失敗時はユーザーを削除）
    let token = generate_token();
    let url = link_url_for(&state.config.link_url_base, LinkPurpose::Activate, &token);
    let link = state
        .issuer
        .issue_activation_link_or_discard(ActivationLinkInfo {
            recipient_address: user.email.clone(),
            user_name: user.user_name.clone(),
            id: user.id,
            url,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
            activation_expires_at: link.expiration_time,
        }),
    ))
}

/// 登録リクエストのバリデーション
fn validate_register_request(request: &RegisterRequest) -> Result<(), AppError> {
    // email: 必須、メール形式
    if request.email.trim().is_empty() {
        return Err(AppError::Validation("メールアドレスは必須です".to_string()));
    }
    if !request.email.contains('@') {
        return Err(AppError::Validation(
            "有効なメールアドレスを入力してください".to_string(),
        ));
    }
    // user_name: 必須
    if request.user_name.trim().is_empty() {
        return Err(AppError::Validation("ユーザー名は必須です".to_string()));
    }
    // password: 8文字以上
    if request.password.len() < 8 {
        return Err(AppError::Validation(
            "パスワードは8文字以上で入力してください".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, user_name: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            user_name: user_name.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_validate_empty_email() {
        let result = validate_register_request(&request("", "Ann", "password123"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_invalid_email() {
        let result = validate_register_request(&request("invalid-email", "Ann", "password123"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_empty_user_name() {
        let result = validate_register_request(&request("test@example.com", "  ", "password123"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_short_password() {
        let result = validate_register_request(&request("test@example.com", "Ann", "short"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_valid_request() {
        let result = validate_register_request(&request("test@example.com", "Ann", "password123"));
        assert!(result.is_ok());
    }
}
