//! WhatsApp deep link 构建
//!
//! 纯字符串工具：号码只保留数字，模板中的 `{{utm_*}}` 占位符替换为解析后的值，
//! 折叠空白后 URL 编码，拼接成 `https://wa.me/<digits>?text=<encoded>`。

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::utm::UtmParams;

/// 匹配 `{{utm_source}}`、`{{ UTM_Term }}` 等占位符（大小写不敏感）
static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\{\{\s*utm_(source|medium|campaign|content|term)\s*\}\}")
        .expect("placeholder regex is valid")
});

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

const WA_BASE_URL: &str = "https://wa.me/";

/// 去掉号码中所有非数字字符
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// 替换模板占位符，缺失的值替换为空串，然后折叠空白
pub fn render_message(template: &str, utm: &UtmParams) -> String {
    let replaced = PLACEHOLDER_RE.replace_all(template, |caps: &Captures| {
        let key = caps[1].to_ascii_lowercase();
        let value = match key.as_str() {
            "source" => utm.source.as_deref(),
            "medium" => utm.medium.as_deref(),
            "campaign" => utm.campaign.as_deref(),
            "content" => utm.content.as_deref(),
            "term" => utm.term.as_deref(),
            _ => None,
        };
        value.unwrap_or_default().to_string()
    });

    WHITESPACE_RE.replace_all(&replaced, " ").trim().to_string()
}

/// 构建 WhatsApp 跳转链接
pub fn build_whatsapp_url(phone: &str, template: &str, utm: &UtmParams) -> String {
    let digits = normalize_phone(phone);
    let message = render_message(template, utm);

    if message.is_empty() {
        return format!("{}{}", WA_BASE_URL, digits);
    }

    format!(
        "{}{}?text={}",
        WA_BASE_URL,
        digits,
        urlencoding::encode(&message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utm_with_source(source: &str) -> UtmParams {
        UtmParams {
            source: Some(source.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_url_with_source() {
        let url = build_whatsapp_url("11999998888", "Hi {{utm_source}}", &utm_with_source("fb"));
        assert_eq!(url, "https://wa.me/11999998888?text=Hi%20fb");
    }

    #[test]
    fn test_missing_value_is_removed_and_whitespace_collapsed() {
        let url = build_whatsapp_url(
            "11999998888",
            "Hi {{utm_source}} there",
            &UtmParams::default(),
        );
        assert_eq!(url, "https://wa.me/11999998888?text=Hi%20there");
        assert!(!url.contains("utm_source"));
    }

    #[test]
    fn test_placeholders_are_case_insensitive() {
        let utm = UtmParams {
            source: Some("ig".to_string()),
            campaign: Some("black-friday".to_string()),
            term: Some("shoes".to_string()),
            ..Default::default()
        };
        let message = render_message(
            "From {{UTM_SOURCE}} / {{ utm_Campaign }} / {{utm_term}}",
            &utm,
        );
        assert_eq!(message, "From ig / black-friday / shoes");
    }

    #[test]
    fn test_unknown_placeholders_are_kept() {
        let message = render_message("Hello {{name}}", &UtmParams::default());
        assert_eq!(message, "Hello {{name}}");
    }

    #[test]
    fn test_phone_punctuation_is_stripped() {
        let url = build_whatsapp_url("+55 (11) 99999-8888", "Oi", &UtmParams::default());
        assert_eq!(url, "https://wa.me/5511999998888?text=Oi");
    }

    #[test]
    fn test_empty_message_omits_text_param() {
        let url = build_whatsapp_url("5511999998888", "{{utm_source}}", &UtmParams::default());
        assert_eq!(url, "https://wa.me/5511999998888");
    }

    #[test]
    fn test_special_characters_are_encoded() {
        let url = build_whatsapp_url(
            "5511999998888",
            "Olá! Quero saber & mais?",
            &UtmParams::default(),
        );
        assert_eq!(
            url,
            "https://wa.me/5511999998888?text=Ol%C3%A1%21%20Quero%20saber%20%26%20mais%3F"
        );
    }

    #[test]
    fn test_newlines_collapse_to_single_space() {
        let message = render_message("Line one\n\n  line two\t", &UtmParams::default());
        assert_eq!(message, "Line one line two");
    }
}
