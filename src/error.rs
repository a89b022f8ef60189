use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::repositories::StoreError;
use crate::services::renderer::RenderError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    #[error("データベースエラー")]
    Database(#[from] sqlx::Error),

    #[error("テンプレート描画エラー")]
    Render(#[from] RenderError),

    #[error("内部エラー")]
    Internal(#[from] anyhow::Error),

    #[error("このメールアドレスは既に使用されています")]
    EmailAlreadyExists,

    #[error("無効または期限切れのリンクです")]
    TokenExpired,

    #[error("トークンが見つかりません")]
    TokenNotFound,

    /// 業務ルール上の拒否（未登録アカウント・未有効化など）
    #[error("{0}")]
    Rejected(String),

    /// 一時リンクを保存できなかった（詳細はログのみ）
    #[error("{0}")]
    LinkNotSaved(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Database(e) => Self::Database(e),
            other => Self::Internal(anyhow::anyhow!(other)),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Database(e) => {
                tracing::error!(error = ?e, "データベースエラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
            Self::Render(e) => {
                tracing::error!(error = ?e, "テンプレート描画エラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, "内部エラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
            Self::EmailAlreadyExists => (
                StatusCode::CONFLICT,
                "このメールアドレスは既に使用されています".to_string(),
            ),
            Self::TokenExpired => (
                StatusCode::BAD_REQUEST,
                "無効または期限切れのリンクです".to_string(),
            ),
            Self::TokenNotFound => (
                StatusCode::BAD_REQUEST,
                "無効なリクエストです".to_string(), // 存在有無の漏洩防止
            ),
            Self::Rejected(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            Self::LinkNotSaved(detail) => {
                tracing::error!(detail = %detail, "一時リンクの保存エラー");
                (
                    StatusCode::CONFLICT,
                    "リンクを発行できませんでした。しばらくしてから再度お試しください".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_maps_to_unprocessable_entity() {
        let response =
            AppError::Rejected("You must activate your account first.".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_token_errors_map_to_bad_request() {
        assert_eq!(
            AppError::TokenNotFound.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::TokenExpired.into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_database_error_is_internal() {
        let response = AppError::Database(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_link_not_saved_hides_store_detail() {
        let detail = "Could not save temporary link: an unexpired link is already outstanding for user 7f1c";
        let response = AppError::LinkNotSaved(detail.to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(!body.contains("outstanding"));
        assert!(!body.contains("7f1c"));
        assert!(body.contains("リンクを発行できませんでした"));
    }
}
