use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::error::AppError;
use crate::repositories::{TemporaryLinkRepository, UserRepository};
use crate::services::{AskamaRenderer, LogTransport, MailTransport, TemporaryLinkIssuer};

/// アプリケーション共有状態
///
/// axum の State として全ハンドラーで共有される。
/// Clone は必須（axum が内部で clone するため）。
#[derive(Clone)]
pub struct AppState {
    /// アプリケーション設定（Arc で共有）
    pub config: Arc<Config>,
    /// 使用中のメール送信手段（`log` / `smtp`）
    pub mail_transport: &'static str,
    /// ユーザーリポジトリ
    pub user_repo: UserRepository,
    /// 一時リンク発行サービス
    pub issuer: TemporaryLinkIssuer,
}

impl AppState {
    /// 新しい AppState を作成
    pub fn new(db_pool: PgPool, config: Config) -> Result<Self, AppError> {
        let config = Arc::new(config);
        let user_repo = UserRepository::new(db_pool.clone());
        let link_repo = TemporaryLinkRepository::new(db_pool);
        let transport = build_transport(&config)?;
        let mail_transport = transport.name();

        let issuer = TemporaryLinkIssuer::new(
            Arc::new(AskamaRenderer::new()),
            Arc::new(user_repo.clone()),
            Arc::new(link_repo),
            transport,
            config.mail_from_address.clone(),
            config.app_name.clone(),
        );

        Ok(Self {
            config,
            mail_transport,
            user_repo,
            issuer,
        })
    }
}

/// メール送信手段を選択（SMTP設定が揃っていれば SMTP、なければログ出力）
#[cfg(feature = "email")]
fn build_transport(config: &Config) -> Result<Arc<dyn MailTransport>, AppError> {
    use secrecy::ExposeSecret;

    use crate::services::mailer::SmtpTransport;

    match (
        &config.smtp_host,
        &config.smtp_username,
        &config.smtp_password,
    ) {
        (Some(host), Some(username), Some(password)) => {
            tracing::info!(smtp_host = %host, smtp_port = config.smtp_port, "SMTP 送信を初期化");
            let transport = SmtpTransport::new(
                host,
                config.smtp_port,
                username.expose_secret().clone(),
                password.expose_secret().clone(),
            )
            .map_err(|e| {
                tracing::error!(error = ?e, "SMTP トランスポートの初期化に失敗");
                AppError::Internal(anyhow::anyhow!("failed to build smtp transport: {e}"))
            })?;
            Ok(Arc::new(transport))
        }
        _ => {
            tracing::info!("SMTP 未設定（ログ出力のみ）");
            Ok(Arc::new(LogTransport))
        }
    }
}

#[cfg(not(feature = "email"))]
fn build_transport(config: &Config) -> Result<Arc<dyn MailTransport>, AppError> {
    if config.smtp_configured() {
        tracing::warn!("SMTP 設定がありますが email 機能が無効です（ログ出力のみ）");
    }
    Ok(Arc::new(LogTransport))
}
