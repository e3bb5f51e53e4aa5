//! 存储层输入/输出模型
//!
//! 实体本身（`migration::entities::*::Model`）直接作为读模型使用，
//! 这里只定义写入参数和查询条件。

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::{DeviceType, UtmParams};

/// 新建链接
#[derive(Debug, Clone)]
pub struct NewLink {
    pub slug: String,
    pub user_id: String,
    pub destination_number: String,
    pub message_template: String,
    pub is_active: bool,
    pub ghost_mode: bool,
    pub default_utm: UtmParams,
}

/// 链接部分更新，`None` 表示不修改
#[derive(Debug, Clone, Default)]
pub struct LinkPatch {
    pub slug: Option<String>,
    pub destination_number: Option<String>,
    pub message_template: Option<String>,
    pub is_active: Option<bool>,
    pub ghost_mode: Option<bool>,
    pub default_utm: Option<UtmParams>,
}

impl LinkPatch {
    pub fn is_empty(&self) -> bool {
        self.slug.is_none()
            && self.destination_number.is_none()
            && self.message_template.is_none()
            && self.is_active.is_none()
            && self.ghost_mode.is_none()
            && self.default_utm.is_none()
    }
}

/// 一次跳转产生的点击记录
#[derive(Debug, Clone)]
pub struct NewClick {
    pub link_id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub device: DeviceType,
    pub utm: UtmParams,
    pub fbp: Option<String>,
    pub fbc: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// 一次表单提交产生的线索
#[derive(Debug, Clone)]
pub struct NewLead {
    pub link_id: String,
    pub user_id: String,
    /// digits only
    pub phone: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub utm: UtmParams,
    pub converted_at: DateTime<Utc>,
}

/// 链接状态过滤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Active,
    Inactive,
}

/// 链接列表过滤条件
#[derive(Default, Clone, Debug)]
pub struct LinkFilter {
    /// 模糊搜索 slug 或目标号码
    pub search: Option<String>,
    pub status: Option<LinkStatus>,
}

/// 半开时间区间 `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// 紧邻在前、长度相同的区间
    pub fn previous(&self, length: Duration) -> Self {
        Self {
            start: self.start - length,
            end: self.start,
        }
    }
}

/// 套餐
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr, strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Plan {
    Free,
    Pro,
    Business,
}
