pub mod device;
pub mod ip;
pub mod utm;
pub mod whatsapp;

pub use device::{DeviceType, detect_device_type};
pub use utm::{MAX_UTM_LEN, UtmParams};
pub use whatsapp::{build_whatsapp_url, normalize_phone, render_message};

/// 自动生成 slug 的长度
pub const RANDOM_SLUG_LENGTH: usize = 7;

pub fn generate_random_code(length: usize) -> String {
    use std::iter;

    // 随机选择字母和数字
    let chars = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    iter::repeat_with(|| chars[rand::random_range(0..chars.len())] as char)
        .take(length)
        .collect()
}

/// 按字符截断到 `max` 个字符，不会切开多字节字符
pub fn truncate_chars(mut value: String, max: usize) -> String {
    if let Some((idx, _)) = value.char_indices().nth(max) {
        value.truncate(idx);
    }
    value
}

/// slug 只允许字母、数字、`-`、`_`，长度 3-50
#[inline]
pub fn is_valid_slug(slug: &str) -> bool {
    (3..=50).contains(&slug.len())
        && slug
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
