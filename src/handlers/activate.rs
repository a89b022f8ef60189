use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::LinkPurpose;
use crate::services::link_url::link_url_for;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ActivateResponse {
    pub message: String,
}

/// POST /api/activate
///
/// 有効化リンクを消費してアカウントを有効化する
///
/// # Security
/// - token はログに出力しない
pub async fn activate_account(
    State(state): State<AppState>,
    Json(request): Json<ActivateRequest>,
) -> Result<Json<ActivateResponse>, AppError> {
    if request.token.trim().is_empty() {
        return Err(AppError::Validation("トークンは必須です".to_string()));
    }

    // 発行時と同じ形式のURLで照合
    let url = link_url_for(&state.config.link_url_base, LinkPurpose::Activate, &request.token);
    let link = state.issuer.consume(&url, LinkPurpose::Activate).await?;

    state.user_repo.activate(link.id).await?;

    tracing::info!(user_id = %link.id, "アカウント有効化完了");

    Ok(Json(ActivateResponse {
        message: "アカウントが有効化されました".to_string(),
    }))
}
