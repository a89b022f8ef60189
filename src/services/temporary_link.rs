use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{EmailInfo, LinkPurpose, NewTemporaryLink, TemporaryLink};
use crate::repositories::{TemporaryLinkStore, UserStore};
use crate::services::mailer::{self, MailTransport};
use crate::services::renderer::{RenderContext, TemplateRenderer};

/// アカウント有効化リンクの発行依頼
#[derive(Debug, Clone)]
pub struct ActivationLinkInfo {
    pub recipient_address: String,
    pub user_name: String,
    pub id: Uuid,
    pub url: String,
}

/// パスワードリセットリンクの発行依頼
#[derive(Debug, Clone)]
pub struct ResetLinkInfo {
    pub recipient_address: String,
    pub url: String,
}

/// 描画内容の指定
#[derive(Debug, Clone)]
pub struct RenderSpec {
    pub purpose: LinkPurpose,
    pub user_name: Option<String>,
    pub url: String,
}

/// 送信メールの指定
#[derive(Debug, Clone)]
pub struct EmailSpec {
    /// 対象ユーザーのID
    pub subject_id: Uuid,
    /// 未指定時は管理用送信元アドレス
    pub from: Option<String>,
    pub to: String,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub subject: String,
    /// HTML を表示できないクライアント向けの平文
    pub text: Option<String>,
}

/// 業務ルール上の発行失敗（エラーではない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// テンプレートの描画結果が空
    EmptyRender,
    /// 該当アカウントなし
    AccountNotFound,
    /// 有効化もログインもされていないアカウント
    AccountNotActivated,
    /// リンクを保存できなかった（ストアのエラーメッセージを保持）
    NotSaved(String),
}

impl Rejection {
    pub fn message(&self) -> String {
        match self {
            Self::EmptyRender => "No content was rendered.".to_string(),
            Self::AccountNotFound => "Invalid account.".to_string(),
            Self::AccountNotActivated => "You must activate your account first.".to_string(),
            Self::NotSaved(e) => format!("Could not save temporary link: {e}"),
        }
    }
}

/// 発行結果
#[derive(Debug)]
pub enum IssueOutcome {
    Issued(TemporaryLink),
    Rejected(Rejection),
}

impl IssueOutcome {
    /// 拒否を `AppError` に変換し、発行済みリンクを返す
    ///
    /// 保存失敗のメッセージにはストア内部の情報が含まれるため
    /// `AppError::LinkNotSaved` としてレスポンスでは伏せる
    pub fn into_result(self) -> Result<TemporaryLink, AppError> {
        match self {
            Self::Issued(link) => Ok(link),
            Self::Rejected(rejection @ Rejection::NotSaved(_)) => {
                Err(AppError::LinkNotSaved(rejection.message()))
            }
            Self::Rejected(rejection) => Err(AppError::Rejected(rejection.message())),
        }
    }
}

/// 一時リンク発行サービス
///
/// 描画 → 保存 → 送信の順に処理する。送信は保存成功後にのみ行い、
/// 完了を待たずに結果を返す。
#[derive(Clone)]
pub struct TemporaryLinkIssuer {
    renderer: Arc<dyn TemplateRenderer>,
    user_store: Arc<dyn UserStore>,
    link_store: Arc<dyn TemporaryLinkStore>,
    transport: Arc<dyn MailTransport>,
    admin_from_address: String,
    app_name: String,
}

impl TemporaryLinkIssuer {
    /// 新しい TemporaryLinkIssuer を作成
    pub fn new(
        renderer: Arc<dyn TemplateRenderer>,
        user_store: Arc<dyn UserStore>,
        link_store: Arc<dyn TemporaryLinkStore>,
        transport: Arc<dyn MailTransport>,
        admin_from_address: String,
        app_name: String,
    ) -> Self {
        Self {
            renderer,
            user_store,
            link_store,
            transport,
            admin_from_address,
            app_name,
        }
    }

    /// アカウント有効化リンクを発行（有効期限24時間）
    pub async fn issue_activation_link(
        &self,
        info: ActivationLinkInfo,
    ) -> Result<IssueOutcome, AppError> {
        tracing::info!(user_id = %info.id, "有効化リンク発行");

        let text = format!(
            "Activate your {} account by opening this link: {}",
            self.app_name, info.url
        );
        let render = RenderSpec {
            purpose: LinkPurpose::Activate,
            user_name: Some(info.user_name),
            url: info.url,
        };
        let email = EmailSpec {
            subject_id: info.id,
            from: None,
            to: info.recipient_address,
            cc: None,
            bcc: None,
            subject: format!("Activate your {} account", self.app_name),
            text: Some(text),
        };

        self.compose(render, email).await
    }

    /// 新規登録ユーザーに有効化リンクを発行
    ///
    /// 発行できなかった場合はユーザーを削除する。未有効化のまま残ると
    /// 再登録もリセットもできなくなるため
    pub async fn issue_activation_link_or_discard(
        &self,
        info: ActivationLinkInfo,
    ) -> Result<TemporaryLink, AppError> {
        let user_id = info.id;
        let result = match self.issue_activation_link(info).await {
            Ok(outcome) => outcome.into_result(),
            Err(e) => Err(e),
        };

        if result.is_err() {
            tracing::warn!(user_id = %user_id, "有効化リンク発行失敗のためユーザーを削除");
            if let Err(e) = self.user_store.delete_user(user_id).await {
                tracing::error!(error = ?e, user_id = %user_id, "ユーザーの削除に失敗");
            }
        }

        result
    }

    /// パスワードリセットリンクを発行（有効期限2時間）
    ///
    /// 未登録アカウント、または一度も有効化・ログインされていないアカウントの場合は
    /// 描画・保存・送信を一切行わずに拒否する
    pub async fn issue_reset_link(&self, info: ResetLinkInfo) -> Result<IssueOutcome, AppError> {
        let user = match self.user_store.find_by_email(&info.recipient_address).await? {
            Some(u) => u,
            None => {
                tracing::info!(email = %info.recipient_address, "リセットリンク発行: ユーザー不在");
                return Ok(IssueOutcome::Rejected(Rejection::AccountNotFound));
            }
        };

        if user.is_pending_activation() {
            tracing::info!(user_id = %user.id, "リセットリンク発行: 未有効化アカウント");
            return Ok(IssueOutcome::Rejected(Rejection::AccountNotActivated));
        }

        tracing::info!(user_id = %user.id, "リセットリンク発行");

        let text = format!(
            "Reset your {} password by opening this link: {}",
            self.app_name, info.url
        );
        let render = RenderSpec {
            purpose: LinkPurpose::Reset,
            user_name: Some(user.user_name),
            url: info.url,
        };
        let email = EmailSpec {
            subject_id: user.id,
            from: None,
            to: info.recipient_address,
            cc: None,
            bcc: None,
            subject: format!("Reset your {} password", self.app_name),
            text: Some(text),
        };

        self.compose(render, email).await
    }

    /// メールを描画し、一時リンクを保存して送信する
    ///
    /// # Returns
    /// - 描画エラー: `Err(AppError::Render)`
    /// - 描画結果が空: `Rejection::EmptyRender`（保存・送信なし）
    /// - 保存失敗: `Rejection::NotSaved`（送信なし）
    /// - 成功: 保存されたリンク（送信は切り離して実行）
    pub async fn compose(
        &self,
        render: RenderSpec,
        email: EmailSpec,
    ) -> Result<IssueOutcome, AppError> {
        let context = RenderContext {
            app_name: self.app_name.clone(),
            recipient_address: email.to.clone(),
            user_name: render.user_name,
            url: render.url.clone(),
            timespan_hours: render.purpose.timespan_hours(),
        };

        let html = match self
            .renderer
            .render(render.purpose.template_name(), &context)
            .await?
        {
            Some(html) => html,
            None => {
                tracing::warn!(
                    template = render.purpose.template_name(),
                    "テンプレートの描画結果が空"
                );
                return Ok(IssueOutcome::Rejected(Rejection::EmptyRender));
            }
        };

        let new_link = NewTemporaryLink {
            id: email.subject_id,
            url: render.url,
            purpose: render.purpose,
            expiration_time: OffsetDateTime::now_utc() + render.purpose.timespan(),
            email_info: EmailInfo {
                from: email
                    .from
                    .unwrap_or_else(|| self.admin_from_address.clone()),
                to: email.to,
                cc: email.cc,
                bcc: email.bcc,
                subject: email.subject,
                html,
                text: email.text,
            },
        };

        let link = match self.link_store.create(&new_link).await {
            Ok(link) => link,
            Err(e) => {
                tracing::error!(error = ?e, user_id = %new_link.id, "一時リンクの保存に失敗");
                return Ok(IssueOutcome::Rejected(Rejection::NotSaved(e.to_string())));
            }
        };

        mailer::dispatch(self.transport.clone(), link.email_info.0.clone());

        tracing::info!(
            user_id = %link.id,
            purpose = link.purpose.as_str(),
            expiration_time = %link.expiration_time,
            "一時リンク発行完了"
        );

        Ok(IssueOutcome::Issued(link))
    }

    /// リンクを一度だけ消費する
    ///
    /// # Security
    /// - トークンはログに出力しない
    /// - 用途が異なるリンクは存在しないものとして扱う
    pub async fn consume(&self, url: &str, purpose: LinkPurpose) -> Result<TemporaryLink, AppError> {
        let link = self
            .link_store
            .consume(url, purpose)
            .await?
            .ok_or(AppError::TokenNotFound)?;

        if link.is_expired_at(OffsetDateTime::now_utc()) {
            tracing::warn!(user_id = %link.id, "期限切れリンク");
            return Err(AppError::TokenExpired);
        }

        tracing::info!(user_id = %link.id, purpose = purpose.as_str(), "リンク消費");

        Ok(link)
    }

    /// 期限切れリンクを削除
    pub async fn sweep_expired(&self) -> Result<u64, AppError> {
        let deleted = self.link_store.delete_expired().await?;
        if deleted > 0 {
            tracing::info!(deleted, "期限切れリンクを削除");
        }
        Ok(deleted)
    }
}
