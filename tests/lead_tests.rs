//! Lead capture tests (`POST /api/leads`)

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use sea_orm::EntityTrait;
use serde_json::{Value, json};

use migration::entities::{lead, link};

#[actix_rt::test]
async fn test_lead_is_recorded_and_counter_incremented() {
    let ctx = common::setup().await;
    let (user_id, _) = ctx.user("owner@example.com").await;
    let created = ctx
        .link_with(&user_id, "capture", |l| {
            l.ghost_mode = true;
            l.default_utm.source = Some("instagram".to_string());
            l.default_utm.medium = Some("bio".to_string());
        })
        .await;
    let app = init_app!(ctx);

    let req = TestRequest::post()
        .uri("/api/leads")
        .set_json(json!({
            "linkId": created.id,
            "phone": "+55 (11) 98888-7777",
            "name": "Maria",
            "email": "maria@example.com",
            "utmSource": "facebook",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(
        body["whatsappUrl"],
        "https://wa.me/5511999998888?text=Hi%20from%20facebook"
    );

    let lead_id = body["leadId"].as_str().unwrap().to_string();
    let row = lead::Entity::find_by_id(lead_id)
        .one(ctx.storage.get_db())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.phone, "5511988887777");
    assert_eq!(row.user_id, user_id);
    assert_eq!(row.name.as_deref(), Some("Maria"));
    // 提交的值优先，缺失的回退到链接默认值
    assert_eq!(row.utm_source.as_deref(), Some("facebook"));
    assert_eq!(row.utm_medium.as_deref(), Some("bio"));

    let stored = link::Entity::find_by_id(created.id.clone())
        .one(ctx.storage.get_db())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.lead_count, 1);
}

#[actix_rt::test]
async fn test_lead_for_unknown_link_is_404() {
    let ctx = common::setup().await;
    let app = init_app!(ctx);

    let req = TestRequest::post()
        .uri("/api/leads")
        .set_json(json!({ "linkId": "does-not-exist", "phone": "11999998888" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert!(body["requestId"].as_str().is_some_and(|id| !id.is_empty()));
}

#[actix_rt::test]
async fn test_lead_for_inactive_link_is_410() {
    let ctx = common::setup().await;
    let (user_id, _) = ctx.user("owner@example.com").await;
    let created = ctx
        .link_with(&user_id, "closed", |l| l.is_active = false)
        .await;
    let app = init_app!(ctx);

    let req = TestRequest::post()
        .uri("/api/leads")
        .set_json(json!({ "linkId": created.id, "phone": "11999998888" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::GONE);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "LINK_INACTIVE");
}

#[actix_rt::test]
async fn test_invalid_lead_payloads_are_400() {
    let ctx = common::setup().await;
    let (user_id, _) = ctx.user("owner@example.com").await;
    let created = ctx.link(&user_id, "strict").await;
    let app = init_app!(ctx);

    let cases = [
        json!({ "linkId": created.id, "phone": "abc" }),
        json!({ "linkId": created.id, "phone": "11999998888", "email": "not-an-email" }),
        json!({ "linkId": created.id, "phone": "11999998888", "name": "x".repeat(101) }),
        json!({ "linkId": "", "phone": "11999998888" }),
        json!({ "phone": "11999998888" }),
    ];

    for payload in cases {
        let req = TestRequest::post()
            .uri("/api/leads")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", payload);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR", "{}", payload);
    }
}

#[actix_rt::test]
async fn test_lead_endpoint_does_not_require_session() {
    let ctx = common::setup().await;
    let (user_id, _) = ctx.user("owner@example.com").await;
    let created = ctx.link(&user_id, "public").await;
    let app = init_app!(ctx);

    // 没有 Authorization 头也能提交
    let req = TestRequest::post()
        .uri("/api/leads")
        .set_json(json!({ "linkId": created.id, "phone": "(11) 99999-0000" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}
