mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp, PASSWORD};
use depot_api::errors::{DEACTIVATED_ACCOUNT_MESSAGE, DELETED_ACCOUNT_MESSAGE};
use serde_json::json;

#[tokio::test]
async fn catalogue_reads_are_public_and_writes_are_not() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/inventory", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory",
            Some(json!({"item_name": "Hex bolt", "category": "Hardware", "uom": "pcs",
                        "cost_price": "1.00", "selling_price": "2.00"})),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(Method::GET, "/api/v1/inventory/low-stock", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.request(Method::GET, "/api/v1/suppliers", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(Method::GET, "/api/v1/suppliers", None, Some("not-a-token"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.request(Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["checks"]["database"], "healthy");
}

#[tokio::test]
async fn staff_administration_requires_admin_role() {
    let app = TestApp::new().await;
    let manager = app.seed_staff("maria", "Manager").await;
    let manager_token = manager.id.to_string();

    let response = app
        .request(Method::GET, "/api/v1/staff-profiles", None, Some(&manager_token))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request(Method::GET, "/api/v1/suppliers", None, Some(&manager_token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let staff = app
        .expect(Method::GET, "/api/v1/staff-profiles", None, StatusCode::OK)
        .await;
    assert_eq!(staff["pagination"]["total"], 2);
    assert_eq!(manager.staff_id.as_deref(), Some("EMP-0002"));
}

#[tokio::test]
async fn login_returns_token_and_account() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"email": "admin@depot.test", "password": PASSWORD})),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["access_token"], app.token());
    assert_eq!(body["data"]["account"]["account_type"], "staff");
    assert_eq!(body["data"]["account"]["profile"]["role"], "Admin");

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"email": "admin@depot.test", "password": "wrong"})),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deactivated_staff_cannot_sign_in() {
    let app = TestApp::new().await;
    let driver = app.seed_staff("dan", "Driver").await;

    app.expect(
        Method::POST,
        &format!("/api/v1/staff-profiles/{}/deactivate", driver.id),
        None,
        StatusCode::OK,
    )
    .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"email": "dan@depot.test", "password": PASSWORD})),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = response_json(response).await;
    assert_eq!(body["message"], DEACTIVATED_ACCOUNT_MESSAGE);
    assert!(body.get("access_token").is_none());
    assert!(app.identity.is_revoked(&driver.id.to_string()));

    // A token issued before deactivation stops working as well
    let response = app
        .request(
            Method::GET,
            "/api/v1/orders",
            None,
            Some(&driver.id.to_string()),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Reactivation restores access
    app.expect(
        Method::PATCH,
        &format!("/api/v1/staff-profiles/{}/activate", driver.id),
        None,
        StatusCode::OK,
    )
    .await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"email": "dan@depot.test", "password": PASSWORD})),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn deleted_accounts_are_terminal() {
    let app = TestApp::new().await;
    let clerk = app.seed_staff("cleo", "Inventory Clerk").await;

    let deleted = app
        .expect(
            Method::DELETE,
            &format!("/api/v1/staff-profiles/{}", clerk.id),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(deleted["status"], "Deleted");
    assert!(deleted["deleted_at"].is_string());

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/staff-profiles/{}/activate", clerk.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"email": "cleo@depot.test", "password": PASSWORD})),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response_json(response).await["message"], DELETED_ACCOUNT_MESSAGE);
}

#[tokio::test]
async fn customers_are_gated_on_their_status() {
    let app = TestApp::new().await;
    let customer_id = app.identity.register("carla@example.com");

    let profile = app
        .expect(
            Method::POST,
            "/api/v1/profiles",
            Some(json!({
                "id": customer_id,
                "name": "Carla Cruz",
                "email": "carla@example.com",
                "contact": "09171234567",
                "shippingAddress": "7 Harbor View",
            })),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(profile["customer_id"], "CUS-0001");
    assert_eq!(profile["shipping_address"], "7 Harbor View");

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"email": "carla@example.com", "password": PASSWORD})),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["account"]["account_type"], "customer");

    // Status changes are an admin action, addressed by either key
    let clerk = app.seed_staff("cleo", "Inventory Clerk").await;
    let response = app
        .request(
            Method::PATCH,
            "/api/v1/customers/CUS-0001",
            Some(json!({"action": "deactivate"})),
            Some(&clerk.id.to_string()),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let deactivated = app
        .expect(
            Method::PATCH,
            "/api/v1/customers/CUS-0001",
            Some(json!({"action": "deactivate"})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(deactivated["status"], "Deactivated");

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"email": "carla@example.com", "password": PASSWORD})),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn profile_writes_are_limited_to_owner_or_admin() {
    let app = TestApp::new().await;
    let carla = app.identity.register("carla@example.com");
    let carla_token = carla.to_string();
    let cashier = app.seed_staff("cora", "Cashier").await;
    let cashier_token = cashier.id.to_string();
    let stranger_token = uuid::Uuid::new_v4().to_string();

    // Customers may only register a profile under their own identity
    let response = app
        .request(
            Method::POST,
            "/api/v1/profiles",
            Some(json!({
                "id": uuid::Uuid::new_v4(),
                "name": "Carla Cruz",
                "email": "carla@example.com",
                "contact": "09171234567",
            })),
            Some(&carla_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request(
            Method::POST,
            "/api/v1/profiles",
            Some(json!({
                "name": "Carla Cruz",
                "email": "carla@example.com",
                "contact": "09171234567",
            })),
            Some(&carla_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = response_json(response).await;
    assert_eq!(created["data"]["id"], carla_token.as_str());

    let rename = json!({"company": "Cruz Trading", "status": "Deleted"});
    for token in [&cashier_token, &stranger_token] {
        let response = app
            .request(
                Method::PUT,
                "/api/v1/profiles/CUS-0001",
                Some(rename.clone()),
                Some(token.as_str()),
            )
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .request(Method::DELETE, "/api/v1/profiles/CUS-0001", None, Some(token.as_str()))
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    let response = app
        .request(Method::GET, "/api/v1/profiles", None, Some(&cashier_token))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = app
        .request(Method::GET, "/api/v1/profiles/CUS-0001", None, Some(&cashier_token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = app
        .request(Method::GET, "/api/v1/profiles/CUS-0001", None, Some(&stranger_token))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The owner edits details, but a status in the body is not applied
    let response = app
        .request(
            Method::PUT,
            "/api/v1/profiles/CUS-0001",
            Some(rename),
            Some(&carla_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = response_json(response).await;
    assert_eq!(updated["data"]["company"], "Cruz Trading");
    assert_eq!(updated["data"]["status"], "Active");
}

#[tokio::test]
async fn logout_revokes_the_session() {
    let app = TestApp::new().await;
    let manager = app.seed_staff("maria", "Manager").await;
    let token = manager.id.to_string();

    let response = app
        .request(Method::POST, "/api/v1/auth/logout", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(Method::GET, "/api/v1/suppliers", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn responses_carry_request_ids() {
    let app = TestApp::new().await;
    let response = app
        .request(Method::GET, "/api/v1/suppliers/SUI-0404", None, Some(app.token()))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().contains_key("x-request-id"));
    let body = response_json(response).await;
    assert!(body["request_id"].is_string());
}
