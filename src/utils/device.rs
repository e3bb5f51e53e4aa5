//! 设备类型识别
//!
//! 按顺序匹配 User-Agent：平板 → 手机 → 桌面 → OTHER。
//! 平板必须先于手机判断，Android 平板的 UA 不含 "mobile"。

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum DeviceType {
    Mobile,
    Desktop,
    Tablet,
    Other,
}

static TABLET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)tablet|ipad|playbook|silk|kindle").expect("tablet regex is valid")
});

static ANDROID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)android").expect("android regex is valid"));

static MOBILE_KEYWORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)mobile").expect("mobile keyword regex is valid"));

static MOBILE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)mobi|iphone|ipod|android|blackberry|opera mini|iemobile|windows phone|webos",
    )
    .expect("mobile regex is valid")
});

static DESKTOP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)windows nt|macintosh|mac os x|x11|linux|cros")
        .expect("desktop regex is valid")
});

/// 根据 User-Agent 判断设备类型
pub fn detect_device_type(user_agent: Option<&str>) -> DeviceType {
    let Some(ua) = user_agent.map(str::trim).filter(|ua| !ua.is_empty()) else {
        return DeviceType::Other;
    };

    let android_tablet = ANDROID_RE.is_match(ua) && !MOBILE_KEYWORD_RE.is_match(ua);

    if TABLET_RE.is_match(ua) || android_tablet {
        DeviceType::Tablet
    } else if MOBILE_RE.is_match(ua) {
        DeviceType::Mobile
    } else if DESKTOP_RE.is_match(ua) {
        DeviceType::Desktop
    } else {
        DeviceType::Other
    }
}
