use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::LinkPurpose;
use crate::services::ResetLinkInfo;
use crate::services::link_url::{generate_token, link_url_for};
use crate::services::password::hash_password;
use crate::state::AppState;

// === リセットリクエスト ===

#[derive(Debug, Deserialize)]
pub struct ResetRequestRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ResetRequestResponse {
    pub message: String,
}

/// POST /api/password/reset-request
///
/// 未登録・未有効化のアカウントは 422 とメッセージを返す
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(request): Json<ResetRequestRequest>,
) -> Result<Json<ResetRequestResponse>, AppError> {
    // バリデーション
    validate_email(&request.email)?;

    let token = generate_token();
    let url = link_url_for(&state.config.link_url_base, LinkPurpose::Reset, &token);

    state
        .issuer
        .issue_reset_link(ResetLinkInfo {
            recipient_address: request.email,
            url,
        })
        .await?
        .into_result()?;

    Ok(Json(ResetRequestResponse {
        message: "パスワードリセット手順をメールで送信しました".to_string(),
    }))
}

// === パスワードリセット実行 ===

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordResponse {
    pub message: String,
}

/// POST /api/password/reset
///
/// # Security
/// - token, new_password はログに出力しない
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<ResetPasswordResponse>, AppError> {
    // バリデーション
    validate_reset_password_request(&request)?;

    // 発行時と同じ形式のURLで照合
    let url = link_url_for(&state.config.link_url_base, LinkPurpose::Reset, &request.token);
    let link = state.issuer.consume(&url, LinkPurpose::Reset).await?;

    // パスワードをargon2ハッシュ化して更新
    let password_hash = hash_password(&request.new_password)?;
    state
        .user_repo
        .update_password(link.id, &password_hash)
        .await?;

    tracing::info!(user_id = %link.id, "パスワードリセット完了");

    Ok(Json(ResetPasswordResponse {
        message: "パスワードが更新されました".to_string(),
    }))
}

/// メールアドレスのバリデーション
fn validate_email(email: &str) -> Result<(), AppError> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(AppError::Validation(
            "有効なメールアドレスを入力してください".to_string(),
        ));
    }
    Ok(())
}

/// リセットパスワードリクエストのバリデーション
fn validate_reset_password_request(request: &ResetPasswordRequest) -> Result<(), AppError> {
    if request.token.trim().is_empty() {
        return Err(AppError::Validation("トークンは必須です".to_string()));
    }
    if request.new_password.len() < 8 {
        return Err(AppError::Validation(
            "パスワードは8文字以上で入力してください".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_empty_email() {
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_validate_invalid_email() {
        assert!(validate_email("invalid-email").is_err());
    }

    #[test]
    fn test_validate_valid_email() {
        assert!(validate_email("test@example.com").is_ok());
    }

    #[test]
    fn test_validate_empty_token() {
        let request = ResetPasswordRequest {
            token: "".to_string(),
            new_password: "password123".to_string(),
        };
        assert!(validate_reset_password_request(&request).is_err());
    }

    #[test]
    fn test_validate_short_password() {
        let request = ResetPasswordRequest {
            token: "valid-token".to_string(),
            new_password: "short".to_string(),
        };
        assert!(validate_reset_password_request(&request).is_err());
    }

    #[test]
    fn test_validate_valid_reset_request() {
        let request = ResetPasswordRequest {
            token: "valid-token".to_string(),
            new_password: "password123".to_string(),
        };
        assert!(validate_reset_password_request(&request).is_ok());
    }
}
