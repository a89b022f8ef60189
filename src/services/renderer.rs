use askama::Template;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}

/// テンプレートへ渡す描画コンテキスト
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub app_name: String,
    pub recipient_address: String,
    pub user_name: Option<String>,
    pub url: String,
    pub timespan_hours: i64,
}

/// メール本文の描画
///
/// 描画結果が空の場合は `Ok(None)` を返す
#[async_trait]
pub trait TemplateRenderer: Send + Sync {
    async fn render(
        &self,
        template_name: &str,
        context: &RenderContext,
    ) -> Result<Option<String>, RenderError>;
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{{ app_name }}</title>
</head>
<body>
    <h1>{{ app_name }}</h1>
    <p>{% if let Some(name) = user_name %}Hello {{ name }},{% else %}Hello,{% endif %}</p>
    <p>Thanks for signing up. Click the link below to activate your account ({{ recipient_address }}).</p>
    <p><a href="{{ url }}">Activate account</a></p>
    <p>This link expires in {{ timespan_hours }} hours.</p>
</body>
</html>
"#,
    ext = "html"
)]
struct ActivateEmailTemplate<'a> {
    app_name: &'a str,
    recipient_address: &'a str,
    user_name: Option<&'a str>,
    url: &'a str,
    timespan_hours: i64,
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{{ app_name }}</title>
</head>
<body>
    <h1>{{ app_name }}</h1>
    <p>{% if let Some(name) = user_name %}Hello {{ name }},{% else %}Hello,{% endif %}</p>
    <p>A password reset was requested for {{ recipient_address }}. Click the link below to choose a new password.</p>
    <p><a href="{{ url }}">Reset password</a></p>
    <p>This link expires in {{ timespan_hours }} hours. If you did not request it, you can ignore this email.</p>
</body>
</html>
"#,
    ext = "html"
)]
struct ResetEmailTemplate<'a> {
    app_name: &'a str,
    recipient_address: &'a str,
    user_name: Option<&'a str>,
    url: &'a str,
    timespan_hours: i64,
}

/// askama によるコンパイル済みテンプレートの描画
#[derive(Debug, Clone, Default)]
pub struct AskamaRenderer;

impl AskamaRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TemplateRenderer for AskamaRenderer {
    async fn render(
        &self,
        template_name: &str,
        context: &RenderContext,
    ) -> Result<Option<String>, RenderError> {
        let html = match template_name {
            "activate_email" => ActivateEmailTemplate {
                app_name: &context.app_name,
                recipient_address: &context.recipient_address,
                user_name: context.user_name.as_deref(),
                url: &context.url,
                timespan_hours: context.timespan_hours,
            }
            .render()?,
            "reset_email" => ResetEmailTemplate {
                app_name: &context.app_name,
                recipient_address: &context.recipient_address,
                user_name: context.user_name.as_deref(),
                url: &context.url,
                timespan_hours: context.timespan_hours,
            }
            .render()?,
            other => return Err(RenderError::UnknownTemplate(other.to_string())),
        };

        if html.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> RenderContext {
        RenderContext {
            app_name: "TestApp".to_string(),
            recipient_address: "a@x.com".to_string(),
            user_name: Some("Ann".to_string()),
            url: "https://example.com/activate?token=abc".to_string(),
            timespan_hours: 24,
        }
    }

    #[tokio::test]
    async fn test_render_activate_email() {
        let html = AskamaRenderer::new()
            .render("activate_email", &context())
            .await
            .unwrap()
            .unwrap();

        assert!(html.contains("Hello Ann,"));
        assert!(html.contains("TestApp"));
        assert!(html.contains("24 hours"));
        assert!(html.contains("Activate account"));
    }

    #[tokio::test]
    async fn test_render_reset_email_without_name() {
        let mut ctx = context();
        ctx.user_name = None;
        ctx.timespan_hours = 2;

        let html = AskamaRenderer::new()
            .render("reset_email", &ctx)
            .await
            .unwrap()
            .unwrap();

        assert!(html.contains("Hello,"));
        assert!(html.contains("2 hours"));
        assert!(html.contains("Reset password"));
    }

    #[tokio::test]
    async fn test_render_unknown_template() {
        let result = AskamaRenderer::new().render("welcome_email", &context()).await;
        assert!(matches!(result, Err(RenderError::UnknownTemplate(name)) if name == "welcome_email"));
    }
}
