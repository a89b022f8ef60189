use secrecy::SecretBox;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub database_url: SecretBox<String>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    // SMTP設定（オプション - email機能有効時のみ使用）
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_username: Option<SecretBox<String>>,
    pub smtp_password: Option<SecretBox<String>>,

    /// 管理用送信元アドレス（from 未指定時に使用）
    #[serde(default = "default_mail_from_address")]
    pub mail_from_address: String,

    // 一時リンク設定
    /// メール本文に埋め込むリンクのベースURL
    #[serde(default = "default_link_url_base")]
    pub link_url_base: String,
    /// メールテンプレートに表示するアプリ名
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// 期限切れリンク削除の実行間隔（秒）
    #[serde(default = "default_link_sweep_interval_secs")]
    pub link_sweep_interval_secs: u64,
}

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_MAIL_FROM_ADDRESS: &str = "no-reply@localhost";
const DEFAULT_LINK_URL_BASE: &str = "http://localhost:3000";
const DEFAULT_APP_NAME: &str = "oxlink";
const DEFAULT_LINK_SWEEP_INTERVAL_SECS: u64 = 3600;

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

fn default_mail_from_address() -> String {
    DEFAULT_MAIL_FROM_ADDRESS.to_string()
}

fn default_link_url_base() -> String {
    DEFAULT_LINK_URL_BASE.to_string()
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

fn default_link_sweep_interval_secs() -> u64 {
    DEFAULT_LINK_SWEEP_INTERVAL_SECS
}

impl Config {
    pub fn load() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// SMTP送信に必要な設定が揃っているか
    pub fn smtp_configured(&self) -> bool {
        self.smtp_host.is_some() && self.smtp_username.is_some() && self.smtp_password.is_some()
    }
}
