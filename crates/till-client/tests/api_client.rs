//! HTTP-level tests for `ApiClient` and `NewSaleSession` against a mock API.

use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use std::time::Duration;

use till_client::config::SearchSettings;
use till_client::credentials::TokenClaims;
use till_client::{
    ApiClient, ClientConfig, ClientError, Credential, NewSaleSession, SearchResults, SubmitError,
};
use till_core::{DraftRejection, ExchangeRate, Money, Product};
use tokio::sync::watch;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Helpers
// =============================================================================

fn config_for(server: &MockServer) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.api.base_url = server.uri();
    config
}

fn token_for_shop(shop_id: &str) -> String {
    let claims = TokenClaims {
        shop_id: Some(shop_id.to_string()),
        user_id: Some("u1".to_string()),
        role: Some("OWNER".to_string()),
        exp: None,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"k")).unwrap()
}

fn client(server: &MockServer, token: Option<&str>) -> ApiClient {
    ApiClient::new(&config_for(server), token.map(Credential::new)).unwrap()
}

async fn mount_lookups(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "D1", "label": "Front"}, {"id": "D2", "label": "Back"}]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/cash-sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "S0", "device_id": "D1", "opened_at": "2026-01-01T07:00:00Z",
             "closed_at": "2026-01-01T07:30:00Z"},
            {"id": "S1", "device_id": "D1", "opened_at": "2026-01-01T08:00:00Z"}
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/stores"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "ST1", "name": "Main", "type": "SHOP"}
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/currencies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "currencies": [{"code": "USD", "name": "US Dollar"}, {"code": "SOS", "name": "Shilling"}]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/accounts"))
        .and(query_param("limit", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "A-USD", "name": "Cash Drawer USD", "AccountType": {"name": "CASH_ON_HAND"}},
                {"id": "A-SOS", "name": "Cash Drawer SOS", "AccountType": {"name": "CASH_ON_HAND"}},
                {"id": "A-BANK", "name": "Bank", "AccountType": {"name": "BANK"}}
            ]
        })))
        .mount(server)
        .await;
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_returns_credential_and_shop() {
    let server = MockServer::start().await;
    let token = token_for_shop("shop-1");

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_partial_json(json!({"username": "owner", "password": "owner123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "token": token,
            "user": {"id": "u1", "username": "owner", "role": "OWNER", "shop_id": "shop-1"},
            "shop": {"id": "shop-1", "name": "Corner Shop", "slug": "corner"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server, None).login("owner", "owner123").await.unwrap();

    assert_eq!(response.user.username, "owner");
    assert_eq!(response.credential.token(), token);
    assert_eq!(response.credential.shop_id(), Some("shop-1"));
    assert_eq!(response.shop.unwrap().name, "Corner Shop");
}

#[tokio::test]
async fn test_login_failure_uses_server_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"ok": false, "error": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let err = client(&server, None).login("owner", "wrong").await.unwrap_err();
    assert!(matches!(&err, ClientError::LoginFailed(m) if m == "Invalid credentials"));
}

#[tokio::test]
async fn test_login_failure_without_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server, None).login("owner", "x").await.unwrap_err();
    assert_eq!(err.to_string(), "Login failed");
}

// =============================================================================
// Lookups and Lists
// =============================================================================

#[tokio::test]
async fn test_requests_carry_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/stores"))
        .and(header("authorization", "Bearer tkn"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "ST1", "name": "Main", "type": "WAREHOUSE"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let stores = client(&server, Some("tkn")).stores().await.unwrap();
    assert_eq!(stores.len(), 1);
    assert_eq!(stores[0].kind, "WAREHOUSE");
}

#[tokio::test]
async fn test_product_search_sends_query_and_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("q", "coke"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "P1", "sku": "COKE", "name": "Coke", "price_usd": "1.25"}]
        })))
        .mount(&server)
        .await;

    let products = client(&server, Some("tkn")).search_products("coke").await.unwrap();
    assert_eq!(products[0].price_usd, Some(Money::from_cents(125)));
}

#[tokio::test]
async fn test_non_array_data_reads_as_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/sales"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"rows": []}})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/customers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let api = client(&server, Some("tkn"));
    assert!(api.list_sales().await.unwrap().is_empty());
    assert!(api.search_customers("").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_sales_parses_rows() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/sales"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "sale-1", "total_usd": "13.5", "status": "COMPLETED",
                 "created_at": "2026-03-01T10:00:00Z"},
                {"id": "sale-2"}
            ]
        })))
        .mount(&server)
        .await;

    let sales = client(&server, Some("tkn")).list_sales().await.unwrap();
    assert_eq!(sales.len(), 2);
    assert_eq!(sales[0].total_usd, Some(Money::from_cents(1350)));
    assert_eq!(sales[1].status, None);
}

#[tokio::test]
async fn test_error_body_becomes_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden for role"))
        .mount(&server)
        .await;

    let err = client(&server, Some("tkn")).devices().await.unwrap_err();
    assert!(err.is_auth_error());
    assert_eq!(err.to_string(), "forbidden for role");
}

#[tokio::test]
async fn test_empty_error_body_reports_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server, Some("tkn")).devices().await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(err.to_string(), "HTTP 500");
}

// =============================================================================
// Reports
// =============================================================================

#[tokio::test]
async fn test_today_report() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/reports/today"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "date_utc": "2026-03-01",
            "sales": {"count": 3, "usd_sales_usd": 10, "sos_sales_usd_equiv": 5.5, "total_usd": 15.5},
            "cogs_usd": 7,
            "gross_margin_usd": 8.5,
            "cash": {"USD": 10, "SOS_usd_equiv": 5.5}
        })))
        .mount(&server)
        .await;

    let report = client(&server, Some("tkn")).today_report().await.unwrap();
    assert_eq!(report.sales.count, 3);
    assert_eq!(report.sales.total_usd, Money::from_cents(1550));
    assert_eq!(report.cash.sos_usd_equiv, Money::from_cents(550));
}

#[tokio::test]
async fn test_today_report_not_ok() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/reports/today"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": false})))
        .mount(&server)
        .await;

    let err = client(&server, Some("tkn")).today_report().await.unwrap_err();
    assert!(matches!(&err, ClientError::Rejected(m) if m == "Failed to load"));
}

// =============================================================================
// Sale Creation
// =============================================================================

#[tokio::test]
async fn test_create_sale_reads_either_id_shape() {
    for body in [json!({"sale": {"id": "sale-9"}}), json!({"sale_id": "sale-9"})] {
        let server = MockServer::start().await;
        mount_lookups(&server).await;

        Mock::given(method("POST"))
            .and(path("/api/sales"))
            .respond_with(ResponseTemplate::new(201).set_body_json(body))
            .mount(&server)
            .await;

        let api = client(&server, Some(token_for_shop("shop-1").as_str()));
        let mut session = NewSaleSession::new(api, ExchangeRate::default());
        session.load().await.unwrap();
        session.pick_product(Product {
            id: "P1".into(),
            sku: "COKE".into(),
            name: "Coke".into(),
            price_usd: Some(Money::from_cents(100)),
        });
        session.pick_customer(till_core::Customer {
            id: "C1".into(),
            name: "Amina".into(),
            phone: None,
        });

        assert_eq!(session.submit().await.unwrap(), "sale-9");
    }
}

#[tokio::test]
async fn test_session_load_applies_defaults_and_submits() {
    let server = MockServer::start().await;
    mount_lookups(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/sales"))
        .and(body_partial_json(json!({
            "shop_id": "shop-1",
            "device_id": "D1",
            "cash_session_id": "S1",
            "store_id": "ST1",
            "customer_id": "C1",
            "lines": [{"product_id": "P1", "qty": 2, "unit_price_usd": 1.25}],
            "pay": {"method": "CASH_SOS", "currency": "SOS", "amount_usd": 2.5,
                    "customer_rate_used": 27000.0},
            "status": "COMPLETED"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"sale": {"id": "sale-1"}})))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, Some(token_for_shop("shop-1").as_str()));
    let mut session = NewSaleSession::new(api, ExchangeRate::default());
    session.load().await.unwrap();

    assert_eq!(session.draft().device_id(), Some("D1"));
    assert_eq!(session.draft().cash_session_id(), Some("S1"));
    assert_eq!(session.draft().store_id(), Some("ST1"));
    assert_eq!(session.open_sessions().count(), 1);

    let coke = Product {
        id: "P1".into(),
        sku: "COKE".into(),
        name: "Coke".into(),
        price_usd: Some(Money::from_cents(125)),
    };
    session.pick_product(coke.clone());
    session.pick_product(coke);
    session.pick_customer(till_core::Customer {
        id: "C1".into(),
        name: "Amina".into(),
        phone: None,
    });

    let draft = session.draft_mut();
    draft.set_currency(till_core::Currency::Sos);
    draft.set_amount_tendered(Money::from_cents(250)).unwrap();
    assert_eq!(draft.selected_account().map(|a| a.id.as_str()), Some("A-SOS"));

    let sale_id = session.submit().await.unwrap();
    assert_eq!(sale_id, "sale-1");

    // Per-sale fields reset, point of sale kept.
    assert!(session.draft().lines().is_empty());
    assert!(session.draft().customer().is_none());
    assert_eq!(session.draft().device_id(), Some("D1"));
}

#[tokio::test]
async fn test_submit_rejected_draft_sends_nothing() {
    let server = MockServer::start().await;
    mount_lookups(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/sales"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"sale_id": "x"})))
        .expect(0)
        .mount(&server)
        .await;

    let api = client(&server, Some(token_for_shop("shop-1").as_str()));
    let mut session = NewSaleSession::new(api, ExchangeRate::default());
    session.load().await.unwrap();

    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, SubmitError::Rejected(DraftRejection::MissingCustomer)));
}

#[tokio::test]
async fn test_server_rejection_keeps_draft() {
    let server = MockServer::start().await;
    mount_lookups(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/sales"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Insufficient stock for COKE"))
        .mount(&server)
        .await;

    let api = client(&server, Some(token_for_shop("shop-1").as_str()));
    let mut session = NewSaleSession::new(api, ExchangeRate::default());
    session.load().await.unwrap();
    session.pick_product(Product {
        id: "P1".into(),
        sku: "COKE".into(),
        name: "Coke".into(),
        price_usd: None,
    });
    session.pick_customer(till_core::Customer {
        id: "C1".into(),
        name: "Amina".into(),
        phone: None,
    });

    let err = session.submit().await.unwrap_err();
    assert_eq!(err.to_string(), "Insufficient stock for COKE");
    assert_eq!(session.draft().lines().len(), 1);
}

#[tokio::test]
async fn test_session_load_failure_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
        .mount(&server)
        .await;

    let api = client(&server, Some(token_for_shop("shop-1").as_str()));
    let mut session = NewSaleSession::new(api, ExchangeRate::default());

    let err = session.load().await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to load dropdowns: db down");
    assert!(session.draft().device_id().is_none());
}

// =============================================================================
// Debounced Search
// =============================================================================

fn fast_search() -> SearchSettings {
    SearchSettings {
        debounce_ms: 10,
        min_chars: 2,
    }
}

/// Waits until the published results satisfy `done`.
async fn wait_for<T: Clone>(
    rx: &mut watch::Receiver<SearchResults<T>>,
    done: impl Fn(&SearchResults<T>) -> bool,
) -> SearchResults<T> {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let current = rx.borrow_and_update().clone();
            if done(&current) {
                return current;
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_product_search_waits_for_min_chars() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("q", "co"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "P1", "sku": "COKE", "name": "Coke", "price_usd": 1.25}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = NewSaleSession::new(client(&server, Some("tkn")), ExchangeRate::default());
    let search = session.product_search(&fast_search());
    let mut rx = search.subscribe();

    let short = search.submit("c");
    let cleared = wait_for(&mut rx, |r| r.ticket == Some(short)).await;
    assert!(cleared.items.is_empty());

    let ticket = search.submit("co");
    let results = wait_for(&mut rx, |r| r.ticket == Some(ticket)).await;
    assert_eq!(results.query, "co");
    assert_eq!(results.items[0].sku, "COKE");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.query(), Some("q=co&limit=20"));
}

#[tokio::test]
async fn test_customer_search_sends_empty_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/customers"))
        .and(query_param("q", ""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "C1", "name": "Amina"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = NewSaleSession::new(client(&server, Some("tkn")), ExchangeRate::default());
    let search = session.customer_search(&fast_search());
    let mut rx = search.subscribe();

    let ticket = search.submit("");
    let results = wait_for(&mut rx, |r| r.ticket == Some(ticket)).await;
    assert_eq!(results.items.len(), 1);
    assert_eq!(results.items[0].id, "C1");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("q="));
}
