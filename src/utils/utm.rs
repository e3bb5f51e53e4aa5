//! UTM 参数解析
//!
//! URL 中的非空值优先于链接上保存的默认值；`utm_term` 没有默认值。

use serde::{Deserialize, Serialize};

use migration::entities::link;

use super::truncate_chars;

/// clicks / leads 表中 UTM 列的长度上限
pub const MAX_UTM_LEN: usize = 255;

pub const UTM_KEYS: [&str; 5] = [
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_content",
    "utm_term",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtmParams {
    pub source: Option<String>,
    pub medium: Option<String>,
    pub campaign: Option<String>,
    pub content: Option<String>,
    pub term: Option<String>,
}

impl UtmParams {
    /// 从 query string 一次遍历提取全部 UTM 参数
    ///
    /// 同名参数只取第一次出现的值。
    pub fn from_query(query: &str) -> Self {
        let mut utm = Self::default();
        let mut seen = [false; UTM_KEYS.len()];

        for part in query.split('&') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            let Some(slot) = UTM_KEYS.iter().position(|k| *k == key) else {
                continue;
            };
            if std::mem::replace(&mut seen[slot], true) {
                continue;
            }
            let value = urlencoding::decode(&value.replace('+', " "))
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string());
            let value = non_empty(Some(value));

            match key {
                "utm_source" => utm.source = value,
                "utm_medium" => utm.medium = value,
                "utm_campaign" => utm.campaign = value,
                "utm_content" => utm.content = value,
                "utm_term" => utm.term = value,
                _ => {}
            }
        }

        utm
    }

    /// 每个值截断到列长度上限
    pub fn capped(self) -> Self {
        let cap = |v: Option<String>| v.map(|s| truncate_chars(s, MAX_UTM_LEN));
        Self {
            source: cap(self.source),
            medium: cap(self.medium),
            campaign: cap(self.campaign),
            content: cap(self.content),
            term: cap(self.term),
        }
    }

    /// 链接上保存的默认 UTM
    pub fn from_link_defaults(link: &link::Model) -> Self {
        Self {
            source: link.utm_source.clone(),
            medium: link.utm_medium.clone(),
            campaign: link.utm_campaign.clone(),
            content: link.utm_content.clone(),
            term: None,
        }
    }

    /// `self` 中的非空值优先，缺失时回退到 `fallback`
    pub fn or(self, fallback: &UtmParams) -> Self {
        Self {
            source: non_empty(self.source).or_else(|| fallback.source.clone()),
            medium: non_empty(self.medium).or_else(|| fallback.medium.clone()),
            campaign: non_empty(self.campaign).or_else(|| fallback.campaign.clone()),
            content: non_empty(self.content).or_else(|| fallback.content.clone()),
            term: non_empty(self.term).or_else(|| fallback.term.clone()),
        }
    }

    /// 解析最终 UTM：URL 值优先，其次链接默认值
    pub fn resolve(query: Option<&str>, link: &link::Model) -> Self {
        let from_url = query.map(Self::from_query).unwrap_or_default();
        from_url.or(&Self::from_link_defaults(link))
    }

    /// 生成 query string（用于把 UTM 带到 interstitial 页面）
    pub fn to_query_string(&self) -> String {
        let values = [
            &self.source,
            &self.medium,
            &self.campaign,
            &self.content,
            &self.term,
        ];

        UTM_KEYS
            .iter()
            .zip(values)
            .filter_map(|(key, value)| {
                value
                    .as_deref()
                    .map(|v| format!("{}={}", key, urlencoding::encode(v)))
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
