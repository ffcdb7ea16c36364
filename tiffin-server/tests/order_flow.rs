//! 端到端订单流程测试
//!
//! 用内存数据库 + `tower::ServiceExt::oneshot` 直接驱动完整路由，
//! 不开真实端口。

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use tiffin_server::auth::{JwtConfig, JwtService};
use tiffin_server::core::{Config, Server, ServerState};
use tiffin_server::db::DbService;
use tiffin_server::db::repository::{NotificationRepository, RestaurantRepository};
use tiffin_server::notify::NotificationHub;

async fn test_state() -> ServerState {
    let db_service = DbService::open_in_memory()
        .await
        .expect("in-memory db should open");

    let mut config = Config::from_env();
    config.jwt = JwtConfig {
        secret: "integration-test-secret-of-sufficient-length".to_string(),
        expiration_minutes: 60,
        issuer: "tiffin-server".to_string(),
        audience: "tiffin-clients".to_string(),
    };
    config.free_delivery_threshold = 500.0;
    config.delivery_fee = 40.0;
    config.notification_history_limit = 5;

    let jwt = Arc::new(JwtService::with_config(config.jwt.clone()));
    ServerState::new(config, db_service.db, jwt, Arc::new(NotificationHub::new()))
}

async fn test_app_with_state() -> (Router, ServerState) {
    let state = test_state().await;
    (Server::build_router(state.clone()), state)
}

async fn test_app() -> Router {
    test_app_with_state().await.0
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// 注册用户并返回 (token, user_id)
async fn register_full(app: &Router, username: &str, role: &str) -> (String, String) {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "password": "hunter2hunter2",
            "role": role,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {}", body);
    (
        body["data"]["token"].as_str().unwrap().to_string(),
        body["data"]["user"]["id"].as_str().unwrap().to_string(),
    )
}

/// 注册用户并返回 token
async fn register(app: &Router, username: &str, role: &str) -> String {
    register_full(app, username, role).await.0
}

/// 注册商家 + 餐厅，返回 (seller_token, restaurant_id)
async fn setup_restaurant(app: &Router, seller: &str, name: &str) -> (String, String) {
    let token = register(app, seller, "seller").await;
    let (status, body) = send(
        app,
        "POST",
        "/api/seller/restaurant",
        Some(&token),
        Some(json!({
            "name": name,
            "address": "12 MG Road",
            "cuisine": "South Indian",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "restaurant create failed: {}", body);
    let id = body["data"]["id"].as_str().unwrap().to_string();
    (token, id)
}

/// 下单，返回订单 JSON
async fn place_order(app: &Router, token: &str, restaurant: &str, unit_price: f64) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/orders",
        Some(token),
        Some(json!({
            "restaurant": restaurant,
            "items": [{ "name": "Thali", "unit_price": unit_price, "quantity": 1 }],
            "delivery_address": { "line1": "Flat 4B", "line2": null, "city": "Pune", "phone": "999" },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "order create failed: {}", body);
    body["data"].clone()
}

/// 把订单推进到 ready (商家侧三步)
async fn drive_to_ready(app: &Router, seller_token: &str, order_id: &str) {
    for status in ["confirmed", "preparing", "ready"] {
        let uri = format!("/api/seller/orders/{}", order_id);
        let (code, body) = send(
            app,
            "PATCH",
            &uri,
            Some(seller_token),
            Some(json!({ "status": status })),
        )
        .await;
        assert_eq!(code, StatusCode::OK, "seller transition to {} failed: {}", status, body);
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let app = test_app().await;
    let (status, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_register_then_login() {
    let app = test_app().await;
    register(&app, "asha", "customer").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "asha", "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["role"], "customer");

    // 错误密码和不存在的用户返回同一个错误
    let (status, wrong_pass) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "asha", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, no_user) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "ghost", "password": "whatever123" })),
    )
    .await;
    assert_eq!(wrong_pass["message"], no_user["message"]);
}

#[tokio::test]
async fn test_protected_endpoint_requires_token() {
    let app = test_app().await;
    let (status, _) = send(&app, "GET", "/api/orders", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_delivery_fee_threshold() {
    let app = test_app().await;
    let (_, restaurant_id) = setup_restaurant(&app, "seller_fee", "Fee Kitchen").await;
    let customer = register(&app, "fee_customer", "customer").await;

    // 450 < 500 门槛：收 40 配送费
    let below = place_order(&app, &customer, &restaurant_id, 450.0).await;
    assert_eq!(below["delivery_fee"], 40.0);
    assert_eq!(below["total_amount"], 490.0);

    // 600 >= 500 门槛：免配送费
    let above = place_order(&app, &customer, &restaurant_id, 600.0).await;
    assert_eq!(above["delivery_fee"], 0.0);
    assert_eq!(above["total_amount"], 600.0);
}

#[tokio::test]
async fn test_combined_checkout_waives_fee() {
    let app = test_app().await;
    let (_, restaurant_id) = setup_restaurant(&app, "seller_combined", "Combined Kitchen").await;
    let customer = register(&app, "combined_customer", "customer").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/orders",
        Some(&customer),
        Some(json!({
            "restaurant": restaurant_id,
            "items": [{ "name": "Lassi", "unit_price": 80.0, "quantity": 2 }],
            "delivery_address": { "line1": "Flat 4B", "city": "Pune" },
            "combined_total_amount": 720.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["delivery_fee"], 0.0);
    assert_eq!(body["data"]["total_amount"], 160.0);
}

#[tokio::test]
async fn test_full_lifecycle_reconciles_revenue() {
    let app = test_app().await;
    let (seller, restaurant_id) = setup_restaurant(&app, "seller_life", "Lifecycle Kitchen").await;
    let customer = register(&app, "life_customer", "customer").await;
    let partner = register(&app, "life_partner", "delivery").await;

    let order = place_order(&app, &customer, &restaurant_id, 600.0).await;
    let order_id = order["id"].as_str().unwrap();
    assert_eq!(order["status"], "pending");

    drive_to_ready(&app, &seller, order_id).await;

    // 骑手看到可接订单
    let (_, available) = send(&app, "GET", "/api/delivery/available", Some(&partner), None).await;
    assert_eq!(available["data"].as_array().unwrap().len(), 1);

    // 抢单：ready → out-for-delivery + 指派
    let accept_uri = format!("/api/delivery/accept-order/{}", order_id);
    let (status, accepted) = send(&app, "POST", &accept_uri, Some(&partner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["data"]["status"], "out-for-delivery");

    // 送达
    let update_uri = format!("/api/delivery/update-status/{}", order_id);
    let (status, delivered) = send(
        &app,
        "PATCH",
        &update_uri,
        Some(&partner),
        Some(json!({ "status": "delivered" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(delivered["data"]["status"], "delivered");

    // 聚合字段收敛：1 单，revenue = total_amount
    let (_, restaurant) = send(&app, "GET", "/api/seller/restaurant", Some(&seller), None).await;
    assert_eq!(restaurant["data"]["total_orders"], 1);
    assert_eq!(restaurant["data"]["revenue"], 600.0);

    // 顾客通知列表里恰好一条送达通知
    let (_, notifications) = send(&app, "GET", "/api/notifications", Some(&customer), None).await;
    let delivered_count = notifications["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|n| n["title"] == "Order delivered")
        .count();
    assert_eq!(delivered_count, 1);
}

#[tokio::test]
async fn test_cancel_semantics() {
    let app = test_app().await;
    let (seller, restaurant_id) = setup_restaurant(&app, "seller_cancel", "Cancel Kitchen").await;
    let customer = register(&app, "cancel_customer", "customer").await;
    let other = register(&app, "other_customer", "customer").await;

    let order = place_order(&app, &customer, &restaurant_id, 300.0).await;
    let order_id = order["id"].as_str().unwrap();
    let cancel_uri = format!("/api/orders/{}", order_id);

    // 别人的订单当作不存在
    let (status, _) = send(
        &app,
        "PUT",
        &cancel_uri,
        Some(&other),
        Some(json!({ "status": "cancelled" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // pending 阶段可以取消
    let (status, body) = send(
        &app,
        "PUT",
        &cancel_uri,
        Some(&customer),
        Some(json!({ "status": "cancelled" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelled");

    // 重复取消报 400
    let (status, _) = send(
        &app,
        "PUT",
        &cancel_uri,
        Some(&customer),
        Some(json!({ "status": "cancelled" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // 取消的订单不计入聚合
    let (_, restaurant) = send(&app, "GET", "/api/seller/restaurant", Some(&seller), None).await;
    assert_eq!(restaurant["data"]["total_orders"], 0);
}

#[tokio::test]
async fn test_cancel_window_closes_after_pickup() {
    let app = test_app().await;
    let (seller, restaurant_id) = setup_restaurant(&app, "seller_window", "Window Kitchen").await;
    let customer = register(&app, "window_customer", "customer").await;
    let partner = register(&app, "window_partner", "delivery").await;

    let order = place_order(&app, &customer, &restaurant_id, 300.0).await;
    let order_id = order["id"].as_str().unwrap();

    drive_to_ready(&app, &seller, order_id).await;
    let accept_uri = format!("/api/delivery/accept-order/{}", order_id);
    let (status, _) = send(&app, "POST", &accept_uri, Some(&partner), None).await;
    assert_eq!(status, StatusCode::OK);

    // 已出餐配送，取消窗口关闭
    let cancel_uri = format!("/api/orders/{}", order_id);
    let (status, _) = send(
        &app,
        "PUT",
        &cancel_uri,
        Some(&customer),
        Some(json!({ "status": "cancelled" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_accept_race_has_single_winner() {
    let app = test_app().await;
    let (seller, restaurant_id) = setup_restaurant(&app, "seller_race", "Race Kitchen").await;
    let customer = register(&app, "race_customer", "customer").await;
    let partner_a = register(&app, "race_partner_a", "delivery").await;
    let partner_b = register(&app, "race_partner_b", "delivery").await;

    let order = place_order(&app, &customer, &restaurant_id, 300.0).await;
    let order_id = order["id"].as_str().unwrap();
    drive_to_ready(&app, &seller, order_id).await;

    let accept_uri = format!("/api/delivery/accept-order/{}", order_id);
    let (first, _) = send(&app, "POST", &accept_uri, Some(&partner_a), None).await;
    let (second, _) = send(&app, "POST", &accept_uri, Some(&partner_b), None).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::CONFLICT);

    // 赢家是 partner_a：partner_b 推进状态报 404
    let update_uri = format!("/api/delivery/update-status/{}", order_id);
    let (status, _) = send(
        &app,
        "PATCH",
        &update_uri,
        Some(&partner_b),
        Some(json!({ "status": "delivered" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_role_boundaries() {
    let app = test_app().await;
    let customer = register(&app, "role_customer", "customer").await;
    let partner = register(&app, "role_partner", "delivery").await;

    // 顾客访问商家接口
    let (status, _) = send(&app, "GET", "/api/seller/orders", Some(&customer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // 骑手下单
    let (status, _) = send(
        &app,
        "POST",
        "/api/orders",
        Some(&partner),
        Some(json!({
            "restaurant": "restaurant:nowhere",
            "items": [{ "name": "x", "unit_price": 10.0, "quantity": 1 }],
            "delivery_address": { "line1": "a", "city": "b" },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // 顾客访问管理接口
    let (status, _) = send(&app, "GET", "/api/admin/orders", Some(&customer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_seller_cannot_touch_other_restaurants_orders() {
    let app = test_app().await;
    let (_, restaurant_a) = setup_restaurant(&app, "seller_own", "Own Kitchen").await;
    let (seller_b, _) = setup_restaurant(&app, "seller_other", "Other Kitchen").await;
    let customer = register(&app, "boundary_customer", "customer").await;

    let order = place_order(&app, &customer, &restaurant_a, 300.0).await;
    let order_id = order["id"].as_str().unwrap();

    let uri = format!("/api/seller/orders/{}", order_id);
    let (status, _) = send(
        &app,
        "PATCH",
        &uri,
        Some(&seller_b),
        Some(json!({ "status": "confirmed" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_force_status_and_listing() {
    let app = test_app().await;
    let (seller, restaurant_id) = setup_restaurant(&app, "seller_admin", "Admin Kitchen").await;
    let customer = register(&app, "admin_customer", "customer").await;
    let admin = register(&app, "platform_admin", "admin").await;

    let order = place_order(&app, &customer, &restaurant_id, 600.0).await;
    let order_id = order["id"].as_str().unwrap();

    // 管理员翻单
    let (status, listing) = send(&app, "GET", "/api/admin/orders?limit=10", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["data"].as_array().unwrap().len(), 1);

    // 强制跳到 delivered (不走状态机)
    let uri = format!("/api/admin/orders/{}", order_id);
    let (status, body) = send(
        &app,
        "PATCH",
        &uri,
        Some(&admin),
        Some(json!({ "status": "delivered" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "delivered");

    // 强制送达后 revenue 收敛
    let (_, restaurant) = send(&app, "GET", "/api/seller/restaurant", Some(&seller), None).await;
    assert_eq!(restaurant["data"]["revenue"], 600.0);
}

#[tokio::test]
async fn test_legacy_display_name_reference() {
    let app = test_app().await;
    let (seller, restaurant_id) = setup_restaurant(&app, "seller_legacy", "Legacy Kitchen").await;
    let customer = register(&app, "legacy_customer", "customer").await;

    // 用展示名下单 (旧客户端行为)，落库应归一化为 id 形式
    let order = place_order(&app, &customer, "Legacy Kitchen", 300.0).await;
    assert_eq!(order["restaurant"].as_str().unwrap(), restaurant_id);

    // 商家照常看到这单
    let (_, orders) = send(&app, "GET", "/api/seller/orders", Some(&seller), None).await;
    assert_eq!(orders["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_seller_transition_repairs_stale_aggregates() {
    let (app, state) = test_app_with_state().await;
    let (seller, restaurant_id) = setup_restaurant(&app, "seller_repair", "Repair Kitchen").await;
    let customer = register(&app, "repair_customer", "customer").await;

    let order = place_order(&app, &customer, &restaurant_id, 300.0).await;
    let order_id = order["id"].as_str().unwrap();

    // 人为制造缓存漂移 (模拟早前一次对账失败被吞掉)
    let repo = RestaurantRepository::new(state.get_db());
    let restaurant = repo
        .find_by_name("Repair Kitchen")
        .await
        .unwrap()
        .unwrap();
    repo.update_aggregates(restaurant.id.as_ref().unwrap(), 99, 9999.0)
        .await
        .unwrap();

    // 普通 (非取消) 的商家推进也要把缓存修回派生值
    let uri = format!("/api/seller/orders/{}", order_id);
    let (status, _) = send(
        &app,
        "PATCH",
        &uri,
        Some(&seller),
        Some(json!({ "status": "confirmed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let repaired = repo
        .find_by_name("Repair Kitchen")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(repaired.total_orders, Some(1));
    assert_eq!(repaired.revenue, Some(0.0));
}

#[tokio::test]
async fn test_accept_emits_no_notification() {
    let app = test_app().await;
    let (seller, restaurant_id) = setup_restaurant(&app, "seller_quiet", "Quiet Kitchen").await;
    let customer = register(&app, "quiet_customer", "customer").await;
    let partner = register(&app, "quiet_partner", "delivery").await;

    let order = place_order(&app, &customer, &restaurant_id, 300.0).await;
    let order_id = order["id"].as_str().unwrap();
    drive_to_ready(&app, &seller, order_id).await;

    let accept_uri = format!("/api/delivery/accept-order/{}", order_id);
    let (status, _) = send(&app, "POST", &accept_uri, Some(&partner), None).await;
    assert_eq!(status, StatusCode::OK);

    // 抢单只指派，不通知；顾客列表里不应出现 delivery 类通知
    let (_, notifications) = send(&app, "GET", "/api/notifications", Some(&customer), None).await;
    let delivery_count = notifications["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|n| n["kind"] == "delivery")
        .count();
    assert_eq!(delivery_count, 0);
}

#[tokio::test]
async fn test_notification_history_cap_and_order() {
    let (app, state) = test_app_with_state().await;
    let (token, user_id) = register_full(&app, "prune_user", "customer").await;

    // 超过上限 (5) 的定向通知，时间戳逐条变新
    let repo = NotificationRepository::new(state.get_db());
    let base = chrono::Utc::now();
    for i in 1..=8i64 {
        let mut payload = shared::NotificationPayload::to_user(
            &user_id,
            shared::NotificationKind::System,
            format!("n{}", i),
            "msg",
        );
        payload.timestamp = base - chrono::Duration::seconds(8 - i);
        repo.append(&payload, state.config.notification_history_limit)
            .await
            .unwrap();
    }

    let (status, body) = send(&app, "GET", "/api/notifications", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap())
        .collect();
    // 上限 5 条，最新在前
    assert_eq!(titles, vec!["n8", "n7", "n6", "n5", "n4"]);
}

#[tokio::test]
async fn test_broadcast_history_is_pruned() {
    let state = test_state().await;
    let repo = NotificationRepository::new(state.get_db());

    let base = chrono::Utc::now();
    for i in 1..=8i64 {
        let mut payload = shared::NotificationPayload::broadcast(
            shared::NotificationKind::Promotion,
            format!("b{}", i),
            "msg",
        );
        payload.timestamp = base - chrono::Duration::seconds(8 - i);
        repo.append(&payload, state.config.notification_history_limit)
            .await
            .unwrap();
    }

    // 广播类也裁剪到上限，表不会无限增长
    let mut result = state
        .get_db()
        .query("SELECT count() AS total FROM notification WHERE recipient = NONE GROUP ALL")
        .await
        .unwrap();
    let rows: Vec<Value> = result.take(0).unwrap();
    assert_eq!(rows[0]["total"], 5);
}

#[tokio::test]
async fn test_unknown_restaurant_rejected() {
    let app = test_app().await;
    let customer = register(&app, "unknown_rest_customer", "customer").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/orders",
        Some(&customer),
        Some(json!({
            "restaurant": "No Such Kitchen",
            "items": [{ "name": "x", "unit_price": 10.0, "quantity": 1 }],
            "delivery_address": { "line1": "a", "city": "b" },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
