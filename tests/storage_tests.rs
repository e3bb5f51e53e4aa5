//! Storage backend tests
//!
//! Tests for SeaOrmStorage using temporary SQLite databases.

mod common;

use chrono::{Duration, TimeZone, Utc};

use common::TestContext;
use migration::entities::link;
use zaplinker::errors::ZaplinkerError;
use zaplinker::storage::{LinkPatch, NewClick, Plan, TimeRange};
use zaplinker::utils::{DeviceType, UtmParams};

fn new_click(link: &link::Model, at: chrono::DateTime<Utc>) -> NewClick {
    NewClick {
        link_id: link.id.clone(),
        user_id: link.user_id.clone(),
        timestamp: at,
        ip_address: None,
        user_agent: None,
        referrer: None,
        device: DeviceType::Other,
        utm: UtmParams::default(),
        fbp: None,
        fbc: None,
        city: None,
        country: None,
    }
}

async fn owner(ctx: &TestContext) -> String {
    ctx.user("owner@example.com").await.0
}

#[actix_rt::test]
async fn test_record_click_increments_counter() {
    let ctx = common::setup().await;
    let user_id = owner(&ctx).await;
    let link = ctx.link(&user_id, "counter").await;

    for _ in 0..3 {
        ctx.storage
            .record_click(&new_click(&link, Utc::now()))
            .await
            .unwrap();
    }

    let stored = ctx.storage.find_link_by_id(&link.id).await.unwrap().unwrap();
    assert_eq!(stored.click_count, 3);
    assert_eq!(stored.lead_count, 0);
}

#[actix_rt::test]
async fn test_record_click_for_missing_link_fails_without_side_effects() {
    let ctx = common::setup().await;
    let user_id = owner(&ctx).await;
    let link = ctx.link(&user_id, "real").await;

    let mut orphan = new_click(&link, Utc::now());
    orphan.link_id = "missing-link".to_string();
    assert!(ctx.storage.record_click(&orphan).await.is_err());

    let range = TimeRange::new(Utc::now() - Duration::days(1), Utc::now() + Duration::days(1));
    assert_eq!(ctx.storage.count_clicks(&user_id, None, range).await.unwrap(), 0);
}

#[actix_rt::test]
async fn test_time_ranges_are_half_open() {
    let ctx = common::setup().await;
    let user_id = owner(&ctx).await;
    let link = ctx.link(&user_id, "edges").await;

    let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2026, 3, 8, 0, 0, 0).unwrap();
    for at in [
        start - Duration::seconds(1),
        start,
        end - Duration::seconds(1),
        end,
    ] {
        ctx.storage.record_click(&new_click(&link, at)).await.unwrap();
    }

    let range = TimeRange::new(start, end);
    assert_eq!(ctx.storage.count_clicks(&user_id, None, range).await.unwrap(), 2);
    assert_eq!(
        ctx.storage
            .count_clicks(&user_id, None, range.previous(Duration::days(7)))
            .await
            .unwrap(),
        1
    );

    let daily = ctx.storage.daily_clicks(&user_id, None, range).await.unwrap();
    let days: Vec<(&str, i64)> = daily.iter().map(|r| (r.day.as_str(), r.count)).collect();
    assert_eq!(days, vec![("2026-03-01", 1), ("2026-03-07", 1)]);
}

#[actix_rt::test]
async fn test_update_link_keeps_counters() {
    let ctx = common::setup().await;
    let user_id = owner(&ctx).await;
    let link = ctx.link(&user_id, "patchme").await;
    ctx.storage
        .record_click(&new_click(&link, Utc::now()))
        .await
        .unwrap();

    let current = ctx.storage.find_link_by_id(&link.id).await.unwrap().unwrap();
    let patch = LinkPatch {
        message_template: Some("New message".to_string()),
        default_utm: Some(UtmParams {
            campaign: Some("spring".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    };
    let updated = ctx.storage.update_link(current, &patch).await.unwrap();

    assert_eq!(updated.message_template, "New message");
    assert_eq!(updated.utm_campaign.as_deref(), Some("spring"));
    assert_eq!(updated.click_count, 1);
    assert!(updated.updated_at >= updated.created_at);
}

#[actix_rt::test]
async fn test_duplicate_slug_maps_to_conflict() {
    let ctx = common::setup().await;
    let user_id = owner(&ctx).await;
    let first = ctx.link(&user_id, "same").await;
    let second = ctx.link(&user_id, "other").await;

    let patch = LinkPatch {
        slug: Some(first.slug.clone()),
        ..Default::default()
    };
    let err = ctx.storage.update_link(second, &patch).await.unwrap_err();
    assert!(matches!(err, ZaplinkerError::DuplicateSlug(_)), "{:?}", err);
}

#[actix_rt::test]
async fn test_delete_missing_link_is_not_found() {
    let ctx = common::setup().await;
    let err = ctx.storage.delete_link("nope").await.unwrap_err();
    assert!(matches!(err, ZaplinkerError::NotFound(_)));
}

#[actix_rt::test]
async fn test_bulk_updates_only_touch_given_ids() {
    let ctx = common::setup().await;
    let user_id = owner(&ctx).await;
    let a = ctx.link(&user_id, "bulk-a").await;
    let b = ctx.link(&user_id, "bulk-b").await;

    let outcome = ctx
        .storage
        .set_links_active(&[a.id.clone()], false)
        .await
        .unwrap();
    assert_eq!(outcome.affected, 1);
    assert_eq!(ctx.storage.count_active_links(&user_id).await.unwrap(), 1);

    let outcome = ctx
        .storage
        .delete_links(&[a.id.clone(), b.id.clone()])
        .await
        .unwrap();
    assert_eq!(outcome.affected, 2);
    assert_eq!(ctx.storage.count_links_for_user(&user_id).await.unwrap(), 0);
}

#[actix_rt::test]
async fn test_users_and_usage_limits() {
    let ctx = common::setup().await;
    let user_id = owner(&ctx).await;

    let err = ctx
        .storage
        .create_user("owner@example.com", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ZaplinkerError::Validation { .. }));

    let found = ctx
        .storage
        .find_user_by_email("owner@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, user_id);

    assert!(ctx.storage.find_usage_limit(&user_id).await.unwrap().is_none());
    ctx.storage
        .upsert_usage_limit(&user_id, Plan::Pro, 50)
        .await
        .unwrap();
    ctx.storage
        .upsert_usage_limit(&user_id, Plan::Business, 500)
        .await
        .unwrap();

    let limit = ctx.storage.find_usage_limit(&user_id).await.unwrap().unwrap();
    assert_eq!(limit.plan, "BUSINESS");
    assert_eq!(limit.max_links, 500);
}

#[actix_rt::test]
async fn test_ping() {
    let ctx = common::setup().await;
    ctx.storage.ping().await.unwrap();
    assert_eq!(ctx.storage.get_backend_name(), "sqlite");
}
