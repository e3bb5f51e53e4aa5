//! Redirect tests
//!
//! `/l/{slug}` → 302 to WhatsApp (or the interstitial), recording one click per visit.

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::http::header::{CACHE_CONTROL, LOCATION};
use actix_web::test::{self, TestRequest};
use futures_util::future::join_all;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};

use migration::entities::{click, link};
use zaplinker::utils::MAX_UTM_LEN;

fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn click_rows(ctx: &common::TestContext, link_id: &str) -> u64 {
    click::Entity::find()
        .filter(click::Column::LinkId.eq(link_id))
        .count(ctx.storage.get_db())
        .await
        .unwrap()
}

async fn click_count(ctx: &common::TestContext, link_id: &str) -> i64 {
    link::Entity::find_by_id(link_id.to_string())
        .one(ctx.storage.get_db())
        .await
        .unwrap()
        .unwrap()
        .click_count
}

#[actix_rt::test]
async fn test_redirect_to_whatsapp_records_click() {
    let ctx = common::setup().await;
    let (user_id, _) = ctx.user("owner@example.com").await;
    let link = ctx.link(&user_id, "promo").await;
    let app = init_app!(ctx);

    let req = TestRequest::get()
        .uri("/l/promo?utm_source=fb&utm_campaign=summer")
        .insert_header(("User-Agent", "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Mobile/15E148"))
        .insert_header(("X-Forwarded-For", "203.0.113.9, 10.0.0.1"))
        .insert_header(("CF-IPCity", "Sao Paulo"))
        .insert_header(("CF-IPCountry", "BR"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "https://wa.me/5511999998888?text=Hi%20from%20fb");
    assert_eq!(
        resp.headers().get(CACHE_CONTROL).unwrap().to_str().unwrap(),
        "no-store"
    );

    let rows = click::Entity::find()
        .filter(click::Column::LinkId.eq(link.id.as_str()))
        .all(ctx.storage.get_db())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.user_id, user_id);
    assert_eq!(row.ip_address.as_deref(), Some("203.0.113.9"));
    assert_eq!(row.device, "MOBILE");
    assert_eq!(row.utm_source.as_deref(), Some("fb"));
    assert_eq!(row.utm_campaign.as_deref(), Some("summer"));
    assert_eq!(row.city.as_deref(), Some("Sao Paulo"));
    assert_eq!(row.country.as_deref(), Some("BR"));
    assert_eq!(click_count(&ctx, &link.id).await, 1);
}

#[actix_rt::test]
async fn test_link_default_utm_fills_missing_query_params() {
    let ctx = common::setup().await;
    let (user_id, _) = ctx.user("owner@example.com").await;
    ctx.link_with(&user_id, "defaults", |l| {
        l.default_utm.source = Some("instagram".to_string());
    })
    .await;
    let app = init_app!(ctx);

    let resp = test::call_service(&app, TestRequest::get().uri("/l/defaults").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        location(&resp),
        "https://wa.me/5511999998888?text=Hi%20from%20instagram"
    );
}

#[actix_rt::test]
async fn test_unknown_and_invalid_slugs_go_to_not_found_page() {
    let ctx = common::setup().await;
    let app = init_app!(ctx);

    for uri in ["/l/missing", "/l/ab", "/l/bad%20slug"] {
        let resp = test::call_service(&app, TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "{}", uri);
        assert_eq!(location(&resp), "/link-not-found", "{}", uri);
    }
}

#[actix_rt::test]
async fn test_inactive_link_redirects_without_recording() {
    let ctx = common::setup().await;
    let (user_id, _) = ctx.user("owner@example.com").await;
    let link = ctx
        .link_with(&user_id, "paused", |l| l.is_active = false)
        .await;
    let app = init_app!(ctx);

    let resp = test::call_service(&app, TestRequest::get().uri("/l/paused").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/link-inactive");
    assert_eq!(click_rows(&ctx, &link.id).await, 0);
    assert_eq!(click_count(&ctx, &link.id).await, 0);
}

#[actix_rt::test]
async fn test_ghost_mode_redirects_to_interstitial_with_utm() {
    let ctx = common::setup().await;
    let (user_id, _) = ctx.user("owner@example.com").await;
    let link = ctx
        .link_with(&user_id, "ghosty", |l| l.ghost_mode = true)
        .await;
    let app = init_app!(ctx);

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/l/ghosty?utm_source=google&utm_medium=cpc")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let target = location(&resp);
    assert!(target.starts_with("/interstitial/ghosty?"), "{}", target);
    assert!(target.contains("utm_source=google"));
    assert!(target.contains("utm_medium=cpc"));
    // ghost mode 也会记录点击
    assert_eq!(click_rows(&ctx, &link.id).await, 1);

    let resp = test::call_service(&app, TestRequest::get().uri(&target).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains(&format!(r#"name="linkId" value="{}""#, link.id)));
    assert!(html.contains(r#"name="utmSource" value="google""#));
}

#[actix_rt::test]
async fn test_click_count_matches_rows_under_concurrency() {
    let ctx = common::setup().await;
    let (user_id, _) = ctx.user("owner@example.com").await;
    let link = ctx.link(&user_id, "busy").await;
    let app = init_app!(ctx);

    let requests = (0..20).map(|i| {
        let req = TestRequest::get()
            .uri(&format!("/l/busy?utm_content=v{}", i))
            .to_request();
        test::call_service(&app, req)
    });
    let responses = join_all(requests).await;
    assert!(responses.iter().all(|r| r.status() == StatusCode::FOUND));

    let rows = click_rows(&ctx, &link.id).await;
    assert_eq!(rows, 20);
    assert_eq!(click_count(&ctx, &link.id).await, rows as i64);
}

#[actix_rt::test]
async fn test_oversized_values_are_capped_to_column_length() {
    let ctx = common::setup().await;
    let (user_id, _) = ctx.user("owner@example.com").await;
    let link = ctx.link(&user_id, "longutm").await;
    let app = init_app!(ctx);

    let long_source = "a".repeat(5000);
    let long_ip = "9".repeat(300);
    let req = TestRequest::get()
        .uri(&format!("/l/longutm?utm_source={}", long_source))
        .insert_header(("X-Forwarded-For", long_ip.as_str()))
        .insert_header(("CF-IPCity", "c".repeat(500)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with("https://wa.me/5511999998888?text=Hi%20from%20aaa"));

    let row = click::Entity::find()
        .filter(click::Column::LinkId.eq(link.id.as_str()))
        .one(ctx.storage.get_db())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.utm_source.as_deref(), Some("a".repeat(MAX_UTM_LEN).as_str()));
    assert_eq!(row.ip_address.map(|ip| ip.len()), Some(64));
    assert_eq!(row.city.map(|c| c.len()), Some(100));
}

#[actix_rt::test]
async fn test_failed_click_write_goes_to_error_page() {
    let ctx = common::setup().await;
    let (user_id, _) = ctx.user("owner@example.com").await;
    let link = ctx.link(&user_id, "broken").await;

    // 计数器更新之前让点击写入失败
    ctx.storage
        .get_db()
        .execute_unprepared(
            "CREATE TRIGGER fail_click_insert AFTER INSERT ON clicks \
             BEGIN SELECT RAISE(ABORT, 'click write failed'); END;",
        )
        .await
        .unwrap();

    let app = init_app!(ctx);
    let resp = test::call_service(&app, TestRequest::get().uri("/l/broken").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/error");

    assert_eq!(click_rows(&ctx, &link.id).await, 0);
    assert_eq!(click_count(&ctx, &link.id).await, 0);
}
