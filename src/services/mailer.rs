use std::sync::Arc;

use async_trait::async_trait;

use crate::models::EmailInfo;

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("email builder error: {0}")]
    Builder(String),

    #[cfg(feature = "email")]
    #[error("email address error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[cfg(feature = "email")]
    #[error("email message error: {0}")]
    Message(#[from] lettre::error::Error),

    #[cfg(feature = "email")]
    #[error("email transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// メール送信手段
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// ヘルスチェックに表示する送信手段の名前
    fn name(&self) -> &'static str;

    async fn send(&self, email: &EmailInfo) -> Result<(), MailerError>;
}

/// メールを送信せずログ出力のみ行う（開発環境用）
#[derive(Debug, Clone, Default)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, email: &EmailInfo) -> Result<(), MailerError> {
        if email.to.trim().is_empty() {
            return Err(MailerError::Builder("recipient is required".to_string()));
        }

        // 本文にはトークンが含まれるためログに出力しない
        tracing::info!(
            from = %email.from,
            to = %email.to,
            subject = %email.subject,
            "メール送信（開発モード）"
        );

        Ok(())
    }
}

/// 送信をバックグラウンドタスクとして切り離して実行
///
/// 呼び出し側は完了を待たない。配送は最大1回のベストエフォートで、
/// 失敗はログに記録するのみ（再送なし）
pub fn dispatch(transport: Arc<dyn MailTransport>, email: EmailInfo) {
    tokio::spawn(async move {
        match transport.send(&email).await {
            Ok(()) => tracing::info!(to = %email.to, "メール送信完了"),
            Err(e) => tracing::error!(error = ?e, to = %email.to, "メール送信に失敗"),
        }
    });
}

#[cfg(feature = "email")]
pub use smtp::SmtpTransport;

#[cfg(feature = "email")]
mod smtp {
    use async_trait::async_trait;
    use lettre::message::{Mailbox, MultiPart, SinglePart, header::ContentType};
    use lettre::transport::smtp::authentication::Credentials;
    use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

    use super::{MailTransport, MailerError};
    use crate::models::EmailInfo;

    /// lettre による SMTP 送信
    #[derive(Clone)]
    pub struct SmtpTransport {
        transport: AsyncSmtpTransport<Tokio1Executor>,
    }

    impl SmtpTransport {
        /// STARTTLS で SMTP リレーに接続するトランスポートを作成
        pub fn new(
            host: &str,
            port: u16,
            username: String,
            password: String,
        ) -> Result<Self, MailerError> {
            let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
                .port(port)
                .credentials(Credentials::new(username, password))
                .build();

            Ok(Self { transport })
        }
    }

    #[async_trait]
    impl MailTransport for SmtpTransport {
        fn name(&self) -> &'static str {
            "smtp"
        }

        async fn send(&self, email: &EmailInfo) -> Result<(), MailerError> {
            let message = build_message(email)?;
            self.transport.send(message).await?;
            Ok(())
        }
    }

    pub(super) fn build_message(email: &EmailInfo) -> Result<Message, MailerError> {
        let mut builder = Message::builder()
            .from(email.from.parse::<Mailbox>()?)
            .to(email.to.parse::<Mailbox>()?)
            .subject(email.subject.clone());

        if let Some(cc) = &email.cc {
            builder = builder.cc(cc.parse::<Mailbox>()?);
        }
        if let Some(bcc) = &email.bcc {
            builder = builder.bcc(bcc.parse::<Mailbox>()?);
        }

        let message = match &email.text {
            Some(text) => builder.multipart(
                MultiPart::alternative()
                    .singlepart(SinglePart::plain(text.clone()))
                    .singlepart(SinglePart::html(email.html.clone())),
            )?,
            None => builder
                .header(ContentType::TEXT_HTML)
                .body(email.html.clone())?,
        };

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> EmailInfo {
        EmailInfo {
            from: "admin@example.com".to_string(),
            to: "a@example.com".to_string(),
            cc: None,
            bcc: None,
            subject: "Activate your account".to_string(),
            html: "<p>hi</p>".to_string(),
            text: Some("hi".to_string()),
        }
    }

    #[tokio::test]
    async fn test_log_transport_sends() {
        assert!(LogTransport.send(&email()).await.is_ok());
    }

    #[tokio::test]
    async fn test_log_transport_rejects_empty_recipient() {
        let mut email = email();
        email.to = " ".to_string();
        assert!(LogTransport.send(&email).await.is_err());
    }

    #[cfg(feature = "email")]
    #[test]
    fn test_build_message_with_copies() {
        let mut email = email();
        email.cc = Some("cc@example.com".to_string());
        email.bcc = Some("bcc@example.com".to_string());
        assert!(smtp::build_message(&email).is_ok());
    }

    #[cfg(feature = "email")]
    #[test]
    fn test_build_message_invalid_address() {
        let mut email = email();
        email.from = "not-an-address".to_string();
        assert!(smtp::build_message(&email).is_err());
    }
}
