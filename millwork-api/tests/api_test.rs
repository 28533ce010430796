use std::sync::Arc;

use axum::{body::Body, http::{Request, StatusCode}, Router};
use http_body_util::BodyExt as _;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt; // for Router::oneshot

use millwork_api::{app, middleware::auth::UserClaims, state::AuthConfig, AppState};
use millwork_catalog::{FormulaStep, Operator, PresetValues, PricingRule};
use millwork_core::Role;
use millwork_store::{InMemoryRuleRepository, RuleRepository, RuleSnapshot};

const SECRET: &str = "test-secret";

fn markup_rule() -> PricingRule {
    PricingRule::new(
        "displayed_price",
        vec![FormulaStep::factor(Some("base_price"), Operator::Multiply, "material_markup")],
    )
}

fn test_app(rules: Vec<PricingRule>) -> Router {
    let state = AppState::new(
        RuleSnapshot::new(rules.clone()),
        Arc::new(InMemoryRuleRepository::new(rules)),
        PresetValues::default(),
        AuthConfig { secret: SECRET.to_string() },
    );
    app(state)
}

fn token(role: Role) -> String {
    let claims = UserClaims {
        sub: format!("user-{}", role),
        email: Some(format!("{}@shop.test", role)),
        role,
        exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

fn request(method: &str, uri: &str, role: Option<Role>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(role) = role {
        builder = builder.header("authorization", format!("Bearer {}", token(role)));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

fn quote_json(status: &str) -> Value {
    json!({
        "client_name": "Lucia Mendez",
        "email": "lucia@example.com",
        "phone": "555-0101",
        "project_name": "Kitchen remodel",
        "installation_address": "12 Cedar St",
        "status": status,
        "adjustment_type": "discount",
        "adjustment_percentage": 10,
        "spaces": [
            {
                "name": "Kitchen",
                "items": [
                    {"width": 36, "height": 34.5, "depth": 24, "price": 400, "quantity": 2},
                    {"width": 18, "height": 84, "depth": 24, "price": 200}
                ]
            }
        ]
    })
}

#[tokio::test]
async fn health_is_public() {
    let app = test_app(vec![]);
    let (status, body) = send(&app, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn v1_requires_valid_token() {
    let app = test_app(vec![]);

    let (status, _) = send(&app, request("GET", "/v1/pricing/rules", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .uri("/v1/pricing/rules")
        .header("authorization", "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn price_endpoint_applies_rules() {
    let app = test_app(vec![markup_rule()]);
    let body = json!({"base_price": 100, "width": 30, "height": 40, "depth": 24});

    let (status, resp) = send(&app, request("POST", "/v1/pricing/price", Some(Role::Visitor), Some(body))).await;
    assert_eq!(status, StatusCode::OK);
    assert!((resp["displayed_price"].as_f64().unwrap() - 130.0).abs() < 1e-9);
    assert_eq!(resp["values"]["area"], 1200.0);
    assert_eq!(resp["values"]["storage_fee"], 25.0);
}

#[tokio::test]
async fn price_without_rules_is_base_price() {
    let app = test_app(vec![]);
    let body = json!({"base_price": 87.5, "width": 1, "height": 1, "depth": 1});

    let (_, resp) = send(&app, request("POST", "/v1/pricing/price", Some(Role::Sales), Some(body))).await;
    assert_eq!(resp["displayed_price"], 87.5);
}

#[tokio::test]
async fn replacing_rules_requires_admin_and_valid_rules() {
    let app = test_app(vec![]);
    let rules = json!([{
        "formula": [
            {"leftOperand": "base_price", "operator": "+", "rightOperand": "storage_fee", "rightOperandType": "factor"},
            {"operator": "*", "rightOperand": "2", "rightOperandType": "literal"}
        ],
        "result": "final_price"
    }]);

    let (status, _) = send(&app, request("PUT", "/v1/pricing/rules", Some(Role::Sales), Some(rules.clone()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, request("PUT", "/v1/pricing/rules", Some(Role::Admin), Some(rules))).await;
    assert_eq!(status, StatusCode::OK);

    let price = json!({"base_price": 100, "width": 1, "height": 1, "depth": 1});
    let (_, resp) = send(&app, request("POST", "/v1/pricing/price", Some(Role::Sales), Some(price))).await;
    assert_eq!(resp["displayed_price"], 250.0);

    let bad = json!([{
        "formula": [{"leftOperand": "base_price", "operator": "^", "rightOperand": "2", "rightOperandType": "literal"}],
        "result": "displayed_price"
    }]);
    let (status, resp) = send(&app, request("PUT", "/v1/pricing/rules", Some(Role::Admin), Some(bad))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(resp["error"].as_str().unwrap().contains("unrecognized operator"));

    let (_, listed) = send(&app, request("GET", "/v1/pricing/rules", Some(Role::Visitor), None)).await;
    assert_eq!(listed[0]["result"], "final_price");
}

#[tokio::test]
async fn presets_update_is_validated() {
    let app = test_app(vec![]);
    let mut presets = serde_json::to_value(PresetValues::default()).unwrap();
    presets["tax_rate"] = json!(8.0);

    let (status, _) = send(&app, request("PUT", "/v1/settings/presets", Some(Role::Admin), Some(presets.clone()))).await;
    assert_eq!(status, StatusCode::OK);

    presets["tax_rate"] = json!(180.0);
    let (status, _) = send(&app, request("PUT", "/v1/settings/presets", Some(Role::Admin), Some(presets))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, current) = send(&app, request("GET", "/v1/settings/presets", Some(Role::Sales), None)).await;
    assert_eq!(current["tax_rate"], 8.0);
}

#[tokio::test]
async fn quote_summary_returns_totals_or_issues() {
    let app = test_app(vec![]);

    let (status, resp) = send(&app, request("POST", "/v1/quotes/summary", Some(Role::Sales), Some(quote_json("draft")))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["totals"]["subtotal"], 1000.0);
    assert!((resp["totals"]["adjusted_subtotal"].as_f64().unwrap() - 900.0).abs() < 1e-9);
    assert!((resp["totals"]["tax"].as_f64().unwrap() - 144.0).abs() < 1e-9);

    let mut invalid = quote_json("draft");
    invalid["email"] = json!("nope");
    invalid["spaces"][0]["items"][1]["width"] = json!(0);
    let (status, resp) = send(&app, request("POST", "/v1/quotes/summary", Some(Role::Sales), Some(invalid))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let paths: Vec<&str> = resp["issues"].as_array().unwrap().iter().map(|i| i["path"].as_str().unwrap()).collect();
    assert_eq!(paths, vec!["email", "spaces.0.items.1.width"]);

    let (status, _) = send(&app, request("POST", "/v1/quotes/summary", Some(Role::Visitor), Some(quote_json("draft")))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn order_and_receipt_flow() {
    let app = test_app(vec![]);

    // Only approved quotes convert
    let (status, _) = send(&app, request("POST", "/v1/orders", Some(Role::Sales), Some(quote_json("pending")))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, order) = send(&app, request("POST", "/v1/orders", Some(Role::Sales), Some(quote_json("approved")))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["client_name"], "Lucia Mendez");
    assert_eq!(order["balance_due"], 900.0);
    let order_id = order["id"].as_str().unwrap().to_string();

    // 50% deposit
    let uri = format!("/v1/orders/{}/receipts", order_id);
    let (status, receipt) = send(&app, request("POST", &uri, Some(Role::Sales), Some(json!({"payment_percentage": 50})))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["amount"], 450.0);
    assert_eq!(receipt["status"], "draft");
    let receipt_id = receipt["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, request("POST", &uri, Some(Role::Sales), Some(json!({"payment_percentage": 60})))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, request("POST", &uri, Some(Role::Sales), Some(json!({"payment_percentage": 0})))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let send_uri = format!("/v1/orders/{}/receipts/{}/send", order_id, receipt_id);
    let (status, sent) = send(&app, request("POST", &send_uri, Some(Role::Sales), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent["status"], "sent");
    assert!(sent["sent_at"].is_string());

    // Status transitions
    let status_uri = format!("/v1/orders/{}/status", order_id);
    let (status, _) = send(&app, request("PATCH", &status_uri, Some(Role::Sales), Some(json!({"status": "completed"})))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, updated) = send(&app, request("PATCH", &status_uri, Some(Role::Sales), Some(json!({"status": "in_progress"})))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "in_progress");

    let (_, fetched) = send(&app, request("GET", &format!("/v1/orders/{}", order_id), Some(Role::Visitor), None)).await;
    assert_eq!(fetched["balance_due"], 450.0);
    assert_eq!(fetched["receipts"].as_array().unwrap().len(), 1);

    let (_, listed) = send(&app, request("GET", "/v1/orders", Some(Role::Visitor), None)).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // Visitors cannot touch orders
    let (status, _) = send(&app, request("DELETE", &format!("/v1/orders/{}", order_id), Some(Role::Visitor), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let app = test_app(vec![]);
    let uri = format!("/v1/orders/{}", uuid::Uuid::new_v4());
    let (status, _) = send(&app, request("GET", &uri, Some(Role::Admin), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_quote_returns_fresh_draft() {
    let app = test_app(vec![]);
    let (status, copy) = send(&app, request("POST", "/v1/quotes/duplicate", Some(Role::Sales), Some(quote_json("approved")))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(copy["client_name"], "Lucia Mendez (Copy)");
    assert_eq!(copy["project_name"], "Kitchen remodel (Copy)");
    assert_eq!(copy["status"], "draft");
    assert_eq!(copy["spaces"][0]["items"].as_array().unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_rule_replacements_keep_store_and_live_rules_in_sync() {
    let repo = Arc::new(InMemoryRuleRepository::default());
    let app = app(AppState::new(
        RuleSnapshot::default(),
        repo.clone(),
        PresetValues::default(),
        AuthConfig { secret: SECRET.to_string() },
    ));

    for round in 0..10 {
        let handles: Vec<_> = (0..6)
            .map(|n| {
                let app = app.clone();
                let rules = json!([{
                    "formula": [{"leftOperand": "base_price", "operator": "+", "rightOperand": n.to_string(), "rightOperandType": "literal"}],
                    "result": format!("round_{}_{}", round, n)
                }]);
                tokio::spawn(async move {
                    send(&app, request("PUT", "/v1/pricing/rules", Some(Role::Admin), Some(rules))).await.0
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), StatusCode::OK);
        }

        let persisted = serde_json::to_value(repo.load_rules().await.unwrap()).unwrap();
        let (_, live) = send(&app, request("GET", "/v1/pricing/rules", Some(Role::Visitor), None)).await;
        assert_eq!(persisted, live);
    }
}

#[tokio::test]
async fn catalog_prices_products_with_live_rules() {
    let app = test_app(vec![markup_rule()]);
    let category_id = uuid::Uuid::new_v4();
    let product_id = uuid::Uuid::new_v4();
    let retired_id = uuid::Uuid::new_v4();
    let material_id = uuid::Uuid::new_v4();
    let catalog = json!({
        "categories": [{"id": category_id, "name": "Base cabinets"}],
        "products": [
            {
                "id": product_id,
                "name": "Sink base",
                "category_id": category_id,
                "unit_cost": 200,
                "materials": [{"id": material_id, "name": "Maple"}]
            },
            {"id": retired_id, "name": "Corner lazy susan", "unit_cost": 150, "is_active": false}
        ],
        "materials": []
    });

    let (status, _) = send(&app, request("PUT", "/v1/catalog", Some(Role::Sales), Some(catalog.clone()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, request("PUT", "/v1/catalog", Some(Role::Admin), Some(catalog))).await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/v1/catalog/categories/{}/products", category_id);
    let (_, products) = send(&app, request("GET", &uri, Some(Role::Visitor), None)).await;
    assert_eq!(products.as_array().unwrap().len(), 1);
    assert_eq!(products[0]["name"], "Sink base");

    let body = json!({"product_id": product_id, "width": 36, "height": 34.5, "depth": 24});
    let (status, resp) = send(&app, request("POST", "/v1/catalog/price", Some(Role::Sales), Some(body))).await;
    assert_eq!(status, StatusCode::OK);
    assert!((resp["selection"]["price"].as_f64().unwrap() - 260.0).abs() < 1e-9);
    assert_eq!(resp["selection"]["material_id"], json!(material_id));
    assert_eq!(resp["item"]["name"], "Sink base");
    assert_eq!(resp["item"]["width"], 36.0);

    let body = json!({"product_id": retired_id, "width": 36, "height": 34.5, "depth": 24});
    let (status, _) = send(&app, request("POST", "/v1/catalog/price", Some(Role::Sales), Some(body))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let body = json!({"product_id": uuid::Uuid::new_v4(), "width": 36, "height": 34.5, "depth": 24});
    let (status, _) = send(&app, request("POST", "/v1/catalog/price", Some(Role::Sales), Some(body))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
