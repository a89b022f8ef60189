use axum::{Json, extract::State};
use serde::Serialize;

use crate::state::AppState;

/// ヘルスチェックレスポンス
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// メール送信手段（`log` の場合、リンクは実際には配送されない）
    pub mail_transport: &'static str,
}

/// GET /api/health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        mail_transport: state.mail_transport,
    })
}

#[cfg(test)]
mod tests {
    use sqlx::postgres::PgPoolOptions;

    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn test_health_reports_log_transport_without_smtp() {
        let vars = vec![(
            "DATABASE_URL".to_string(),
            "postgres://localhost/oxlink".to_string(),
        )];
        let config: Config = envy::from_iter(vars).unwrap();
        // 接続は実際に使われるまで確立されない
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/oxlink")
            .unwrap();
        let state = AppState::new(pool, config).unwrap();

        let response = health_check(State(state)).await;
        assert_eq!(response.status, "ok");
        assert_eq!(response.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(response.mail_transport, "log");
    }
}
