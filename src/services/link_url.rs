use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

use crate::models::LinkPurpose;

/// 32バイトのランダムトークンを生成（URLセーフBase64、パディングなし）
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// メールに埋め込むリンクURLを構築
///
/// # Arguments
/// * `base` - リンクのベースURL（末尾のスラッシュは無視）
/// * `path` - 画面のパス（例: `activate`）
/// * `token` - `generate_token` で生成したトークン
pub fn build_link_url(base: &str, path: &str, token: &str) -> String {
    format!(
        "{}/{}?token={}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/'),
        token
    )
}

/// 用途ごとのリンクURLを構築
///
/// 発行時と消費時の両方で使い、保存される url と照合キーを一致させる
pub fn link_url_for(base: &str, purpose: LinkPurpose, token: &str) -> String {
    build_link_url(base, purpose.path(), token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token() {
        let token = generate_token();
        // 32バイト → パディングなしBase64で43文字
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_build_link_url() {
        assert_eq!(
            build_link_url("https://example.com/", "/activate", "abc"),
            "https://example.com/activate?token=abc"
        );
        assert_eq!(
            build_link_url("http://localhost:3000", "password-reset", "xyz"),
            "http://localhost:3000/password-reset?token=xyz"
        );
    }

    #[test]
    fn test_link_url_for_purpose() {
        assert_eq!(
            link_url_for("http://localhost:3000", LinkPurpose::Activate, "abc"),
            "http://localhost:3000/activate?token=abc"
        );
        assert_eq!(
            link_url_for("http://localhost:3000/", LinkPurpose::Reset, "abc"),
            "http://localhost:3000/password-reset?token=abc"
        );
    }
}
