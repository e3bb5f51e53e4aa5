//! Analytics service layer
//!
//! Aggregates clicks and leads for the dashboard endpoints
//! (`/api/overview`, `/api/analytics`, `/api/analytics/links`).
//!
//! # Periods
//!
//! 当前周期是 UTC 的最近 N 个自然日（`today-(N-1)` 零点到明天零点），
//! 上一周期是紧邻其前的 N 天。所有子查询并发执行后在内存中合并。

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::config::AnalyticsConfig;
use crate::errors::{Result, ZaplinkerError};
use crate::storage::backend::analytics::{BreakdownRow, DayRow};
use crate::storage::{SeaOrmStorage, TimeRange};

use migration::entities::click;

/// 分组明细（设备、来源等）最多返回的条目数
const BREAKDOWN_LIMIT: u64 = 10;

// ============ 日期范围 ============

/// 允许的统计周期（天）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateRange {
    Week,
    #[default]
    Month,
    Quarter,
}

impl DateRange {
    pub fn days(self) -> i64 {
        match self {
            DateRange::Week => 7,
            DateRange::Month => 30,
            DateRange::Quarter => 90,
        }
    }

    /// 解析 `dateRange` 查询参数，缺省为 30 天
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some("7") => Ok(DateRange::Week),
            Some("30") => Ok(DateRange::Month),
            Some("90") => Ok(DateRange::Quarter),
            Some(other) => Err(ZaplinkerError::validation_with_details(
                "dateRange must be one of 7, 30, 90",
                serde_json::json!({ "dateRange": other }),
            )),
        }
    }

    pub fn periods(self, now: DateTime<Utc>) -> Periods {
        let days = self.days();
        let today = now.date_naive();
        let first_day = today - Duration::days(days - 1);

        let start = first_day.and_time(NaiveTime::MIN).and_utc();
        let end = (today + Duration::days(1)).and_time(NaiveTime::MIN).and_utc();
        let current = TimeRange::new(start, end);

        Periods {
            current,
            previous: current.previous(Duration::days(days)),
            days: (0..days).map(|i| first_day + Duration::days(i)).collect(),
        }
    }
}

/// 当前周期、上一周期及当前周期的每一天
#[derive(Debug, Clone)]
pub struct Periods {
    pub current: TimeRange,
    pub previous: TimeRange,
    pub days: Vec<NaiveDate>,
}

impl Periods {
    /// 把稀疏的按天计数补齐为每天一个点
    fn fill<'a, I>(&self, rows: I) -> Vec<u64>
    where
        I: IntoIterator<Item = (&'a str, i64)>,
    {
        let counts: HashMap<&str, i64> = rows.into_iter().collect();
        self.days
            .iter()
            .map(|day| {
                let key = day.format("%Y-%m-%d").to_string();
                counts.get(key.as_str()).copied().unwrap_or(0).max(0) as u64
            })
            .collect()
    }

    fn labels(&self) -> Vec<String> {
        self.days
            .iter()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect()
    }
}

// ============ 计算工具 ============

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendValue {
    pub value: f64,
    pub is_positive: bool,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// 环比变化
pub fn calculate_trend(current: f64, previous: f64) -> TrendValue {
    if previous == 0.0 {
        return if current > 0.0 {
            TrendValue {
                value: 100.0,
                is_positive: true,
            }
        } else {
            TrendValue {
                value: 0.0,
                is_positive: false,
            }
        };
    }

    TrendValue {
        value: round1((current - previous).abs() / previous * 100.0),
        is_positive: current >= previous,
    }
}

/// `leads / clicks * 100`，保留一位小数；没有点击时为 0
pub fn conversion_rate(clicks: u64, leads: u64) -> f64 {
    if clicks == 0 {
        0.0
    } else {
        round1(leads as f64 / clicks as f64 * 100.0)
    }
}

fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        round1(part as f64 / total as f64 * 100.0)
    }
}

// ============ 返回结构 ============

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewTrends {
    pub clicks: TrendValue,
    pub leads: TrendValue,
    pub conversion_rate: TrendValue,
}

#[derive(Debug, Clone, Serialize)]
pub struct SparklinePoint {
    pub date: String,
    pub clicks: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopLink {
    pub id: String,
    pub slug: String,
    pub destination_number: String,
    pub is_active: bool,
    pub clicks: u64,
    pub sparkline: Vec<SparklinePoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunnelStage {
    pub stage: &'static str,
    pub value: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeoStat {
    pub city: String,
    pub clicks: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Click,
    Lead,
    LinkCreated,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub id: String,
    pub link_id: String,
    pub slug: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub date_range: i64,
    pub total_clicks: u64,
    pub total_leads: u64,
    pub conversion_rate: f64,
    pub active_links: u64,
    pub trends: OverviewTrends,
    pub top_links: Vec<TopLink>,
    pub funnel: Vec<FunnelStage>,
    pub geo: Vec<GeoStat>,
    pub recent_activity: Vec<ActivityItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyPoint {
    pub date: String,
    pub clicks: u64,
    pub leads: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryStat {
    pub name: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub date_range: i64,
    pub link_id: Option<String>,
    pub total_clicks: u64,
    pub total_leads: u64,
    pub conversion_rate: f64,
    pub daily: Vec<DailyPoint>,
    pub devices: Vec<CategoryStat>,
    pub sources: Vec<CategoryStat>,
    pub campaigns: Vec<CategoryStat>,
    pub countries: Vec<CategoryStat>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPerformance {
    pub id: String,
    pub slug: String,
    pub is_active: bool,
    pub clicks: u64,
    pub leads: u64,
    pub conversion_rate: f64,
    pub total_clicks: i64,
    pub total_leads: i64,
}

// ============ AnalyticsService ============

pub struct AnalyticsService {
    storage: Arc<SeaOrmStorage>,
    config: AnalyticsConfig,
}

impl AnalyticsService {
    pub fn new(storage: Arc<SeaOrmStorage>, config: AnalyticsConfig) -> Self {
        Self { storage, config }
    }

    /// GET /api/overview
    pub async fn overview(&self, user_id: &str, range: DateRange) -> Result<Overview> {
        let periods = range.periods(Utc::now());
        let (cur, prev) = (periods.current, periods.previous);
        let storage = &self.storage;
        let recent_limit = self.config.recent_activity_limit;

        let (
            clicks,
            leads,
            prev_clicks,
            prev_leads,
            active_links,
            top_links,
            geo_rows,
            recent_activity,
        ) = tokio::try_join!(
            storage.count_clicks(user_id, None, cur),
            storage.count_leads(user_id, None, cur),
            storage.count_clicks(user_id, None, prev),
            storage.count_leads(user_id, None, prev),
            storage.count_active_links(user_id),
            self.top_links(user_id, &periods),
            storage.clicks_by_city(user_id, cur, self.config.geo_limit),
            self.recent_activity(user_id, recent_limit),
        )?;

        debug!(
            "Overview for {}: clicks={} leads={} (prev {} / {})",
            user_id, clicks, leads, prev_clicks, prev_leads
        );

        let rate = conversion_rate(clicks, leads);
        let prev_rate = conversion_rate(prev_clicks, prev_leads);

        Ok(Overview {
            date_range: range.days(),
            total_clicks: clicks,
            total_leads: leads,
            conversion_rate: rate,
            active_links,
            trends: OverviewTrends {
                clicks: calculate_trend(clicks as f64, prev_clicks as f64),
                leads: calculate_trend(leads as f64, prev_leads as f64),
                conversion_rate: calculate_trend(rate, prev_rate),
            },
            top_links,
            funnel: build_funnel(clicks, leads),
            geo: build_geo(geo_rows),
            recent_activity,
        })
    }

    /// 先取 top-N 链接 ID，再用一次分组查询取它们的逐日点击
    async fn top_links(&self, user_id: &str, periods: &Periods) -> Result<Vec<TopLink>> {
        let ranked = self
            .storage
            .top_link_ids_by_clicks(user_id, periods.current, self.config.top_links_limit)
            .await?;
        if ranked.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = ranked.iter().map(|r| r.link_id.clone()).collect();
        let (links, daily) = tokio::try_join!(
            self.storage.find_links_by_ids(&ids),
            self.storage.daily_clicks_for_links(&ids, periods.current),
        )?;

        let mut per_link: HashMap<&str, Vec<(&str, i64)>> = HashMap::new();
        for row in &daily {
            per_link
                .entry(row.link_id.as_str())
                .or_default()
                .push((row.day.as_str(), row.count));
        }

        let labels = periods.labels();
        let top = ranked
            .iter()
            .filter_map(|row| {
                let link = links.iter().find(|l| l.id == row.link_id)?;
                let values = periods.fill(per_link.remove(row.link_id.as_str()).unwrap_or_default());
                Some(TopLink {
                    id: link.id.clone(),
                    slug: link.slug.clone(),
                    destination_number: link.destination_number.clone(),
                    is_active: link.is_active,
                    clicks: row.count.max(0) as u64,
                    sparkline: labels
                        .iter()
                        .zip(values)
                        .map(|(date, clicks)| SparklinePoint {
                            date: date.clone(),
                            clicks,
                        })
                        .collect(),
                })
            })
            .collect();

        Ok(top)
    }

    /// 最近的点击、线索和新建链接，按时间倒序合并
    async fn recent_activity(&self, user_id: &str, limit: u64) -> Result<Vec<ActivityItem>> {
        let (clicks, leads, links) = tokio::try_join!(
            self.storage.recent_clicks(user_id, limit),
            self.storage.recent_leads(user_id, limit),
            self.storage.recent_links(user_id, limit),
        )?;

        let mut items: Vec<ActivityItem> = Vec::with_capacity(clicks.len() + leads.len() + links.len());

        items.extend(clicks.into_iter().map(|(c, link)| {
            let slug = link.map(|l| l.slug);
            ActivityItem {
                kind: ActivityKind::Click,
                description: format!(
                    "Click on /{} from {}",
                    slug.as_deref().unwrap_or("?"),
                    c.city.as_deref().or(c.country.as_deref()).unwrap_or("unknown location")
                ),
                id: c.id,
                link_id: c.link_id,
                slug,
                timestamp: c.clicked_at,
            }
        }));

        items.extend(leads.into_iter().map(|(l, link)| {
            let slug = link.map(|lk| lk.slug);
            ActivityItem {
                kind: ActivityKind::Lead,
                description: format!(
                    "New lead {} via /{}",
                    l.name.as_deref().unwrap_or(&l.phone),
                    slug.as_deref().unwrap_or("?")
                ),
                id: l.id,
                link_id: l.link_id,
                slug,
                timestamp: l.converted_at,
            }
        }));

        items.extend(links.into_iter().map(|link| ActivityItem {
            kind: ActivityKind::LinkCreated,
            description: format!("Link /{} created", link.slug),
            id: link.id.clone(),
            link_id: link.id,
            slug: Some(link.slug),
            timestamp: link.created_at,
        }));

        items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        items.truncate(limit as usize);
        Ok(items)
    }

    /// GET /api/analytics
    ///
    /// `link_id` 的归属由调用方校验。
    pub async fn report(
        &self,
        user_id: &str,
        link_id: Option<&str>,
        range: DateRange,
    ) -> Result<AnalyticsReport> {
        let periods = range.periods(Utc::now());
        let cur = periods.current;
        let storage = &self.storage;

        let (clicks, leads, daily_clicks, daily_leads, devices, sources, campaigns, countries) = tokio::try_join!(
            storage.count_clicks(user_id, link_id, cur),
            storage.count_leads(user_id, link_id, cur),
            storage.daily_clicks(user_id, link_id, cur),
            storage.daily_leads(user_id, link_id, cur),
            storage.click_breakdown(user_id, link_id, cur, click::Column::Device, BREAKDOWN_LIMIT),
            storage.click_breakdown(user_id, link_id, cur, click::Column::UtmSource, BREAKDOWN_LIMIT),
            storage.click_breakdown(user_id, link_id, cur, click::Column::UtmCampaign, BREAKDOWN_LIMIT),
            storage.click_breakdown(user_id, link_id, cur, click::Column::Country, BREAKDOWN_LIMIT),
        )?;

        Ok(AnalyticsReport {
            date_range: range.days(),
            link_id: link_id.map(str::to_string),
            total_clicks: clicks,
            total_leads: leads,
            conversion_rate: conversion_rate(clicks, leads),
            daily: build_daily(&periods, &daily_clicks, &daily_leads),
            devices: build_categories(devices, "OTHER"),
            sources: build_categories(sources, "direct"),
            campaigns: build_categories(campaigns, "none"),
            countries: build_categories(countries, "unknown"),
        })
    }

    /// GET /api/analytics/links
    pub async fn links_performance(
        &self,
        user_id: &str,
        range: DateRange,
    ) -> Result<Vec<LinkPerformance>> {
        let cur = range.periods(Utc::now()).current;

        let (links, clicks, leads) = tokio::try_join!(
            self.storage.all_links_for_user(user_id),
            self.storage.clicks_per_link(user_id, cur),
            self.storage.leads_per_link(user_id, cur),
        )?;

        let clicks: HashMap<String, u64> = clicks
            .into_iter()
            .map(|r| (r.link_id, r.count.max(0) as u64))
            .collect();
        let leads: HashMap<String, u64> = leads
            .into_iter()
            .map(|r| (r.link_id, r.count.max(0) as u64))
            .collect();

        let mut rows: Vec<LinkPerformance> = links
            .into_iter()
            .map(|link| {
                let c = clicks.get(&link.id).copied().unwrap_or(0);
                let l = leads.get(&link.id).copied().unwrap_or(0);
                LinkPerformance {
                    conversion_rate: conversion_rate(c, l),
                    clicks: c,
                    leads: l,
                    total_clicks: link.click_count,
                    total_leads: link.lead_count,
                    id: link.id,
                    slug: link.slug,
                    is_active: link.is_active,
                }
            })
            .collect();

        // 稳定排序，点击数相同时保持创建时间倒序
        rows.sort_by(|a, b| b.clicks.cmp(&a.clicks));
        Ok(rows)
    }
}

// ============ 内存组装 ============

/// conversions 目前等于 leads
fn build_funnel(clicks: u64, leads: u64) -> Vec<FunnelStage> {
    [("clicks", clicks), ("leads", leads), ("conversions", leads)]
        .into_iter()
        .map(|(stage, value)| FunnelStage {
            stage,
            value,
            percentage: percentage(value, clicks),
        })
        .collect()
}

/// 百分比以列出的城市总数为基数
fn build_geo(rows: Vec<BreakdownRow>) -> Vec<GeoStat> {
    let total: u64 = rows.iter().map(|r| r.count.max(0) as u64).sum();
    rows.into_iter()
        .filter_map(|r| {
            let clicks = r.count.max(0) as u64;
            r.label.map(|city| GeoStat {
                city,
                clicks,
                percentage: percentage(clicks, total),
            })
        })
        .collect()
}

fn build_daily(periods: &Periods, clicks: &[DayRow], leads: &[DayRow]) -> Vec<DailyPoint> {
    let click_values = periods.fill(clicks.iter().map(|r| (r.day.as_str(), r.count)));
    let lead_values = periods.fill(leads.iter().map(|r| (r.day.as_str(), r.count)));

    periods
        .labels()
        .into_iter()
        .zip(click_values.into_iter().zip(lead_values))
        .map(|(date, (clicks, leads))| DailyPoint {
            date,
            clicks,
            leads,
        })
        .collect()
}

/// 空值归入 `fallback`（例如没有 utm_source 的点击计为 "direct"）
fn build_categories(rows: Vec<BreakdownRow>, fallback: &str) -> Vec<CategoryStat> {
    let mut merged: Vec<(String, u64)> = Vec::with_capacity(rows.len());
    for row in rows {
        let name = row
            .label
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());
        let count = row.count.max(0) as u64;
        match merged.iter_mut().find(|(n, _)| *n == name) {
            Some((_, c)) => *c += count,
            None => merged.push((name, count)),
        }
    }
    merged.sort_by(|a, b| b.1.cmp(&a.1));

    let total: u64 = merged.iter().map(|(_, c)| c).sum();
    merged
        .into_iter()
        .map(|(name, count)| CategoryStat {
            percentage: percentage(count, total),
            name,
            count,
        })
        .collect()
}
