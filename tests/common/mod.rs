#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use depot_api::{
    auth::{IdentityProvider, IdentityUser, SessionTokens},
    config::AppConfig,
    db,
    errors::ServiceError,
    models::staff_profile,
    services::staff::CreateStaff,
    AppState,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

/// Password every fake identity accepts.
pub const PASSWORD: &str = "correct-horse";

/// In-process stand-in for the identity provider.
///
/// Access tokens are the user's id; revoked tokens stop verifying.
#[derive(Default)]
pub struct FakeIdentity {
    users: Mutex<HashMap<String, Uuid>>,
    revoked: Mutex<HashSet<String>>,
}

impl FakeIdentity {
    pub fn register(&self, email: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.users.lock().unwrap().insert(email.to_string(), id);
        id
    }

    pub fn is_revoked(&self, token: &str) -> bool {
        self.revoked.lock().unwrap().contains(token)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn verify_token(&self, token: &str) -> Result<IdentityUser, ServiceError> {
        if self.is_revoked(token) {
            return Err(ServiceError::Unauthorized("Session revoked".into()));
        }
        let id = Uuid::parse_str(token)
            .map_err(|_| ServiceError::Unauthorized("Invalid or expired token".into()))?;
        Ok(IdentityUser { id, email: None })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionTokens, ServiceError> {
        let id = self.users.lock().unwrap().get(email).copied();
        match id {
            Some(id) if password == PASSWORD => Ok(SessionTokens {
                access_token: id.to_string(),
                token_type: "bearer".into(),
                expires_in: Some(3600),
                refresh_token: None,
                user: IdentityUser {
                    id,
                    email: Some(email.to_string()),
                },
            }),
            _ => Err(ServiceError::Unauthorized("Invalid login credentials".into())),
        }
    }

    async fn invite_user(&self, email: &str, _metadata: Value) -> Result<IdentityUser, ServiceError> {
        let existing = self.users.lock().unwrap().get(email).copied();
        let id = existing.unwrap_or_else(|| self.register(email));
        Ok(IdentityUser {
            id,
            email: Some(email.to_string()),
        })
    }

    async fn sign_out(&self, token: &str) -> Result<(), ServiceError> {
        self.revoked.lock().unwrap().insert(token.to_string());
        Ok(())
    }
}

/// Application wired to a throwaway SQLite file and the fake identity provider.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub identity: Arc<FakeIdentity>,
    admin_token: String,
    _db_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Builds the app after letting the caller adjust configuration.
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let db_dir = tempfile::tempdir().expect("temp dir for test database");
        let db_path = db_dir.path().join("depot_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "http://identity.test".to_string(),
            "service-key".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.cors_allow_any_origin = true;
        adjust(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let identity = Arc::new(FakeIdentity::default());
        let state = AppState::new(Arc::new(pool), cfg, identity.clone());

        let admin = state
            .services
            .staff
            .create_staff(CreateStaff {
                email: "admin@depot.test".into(),
                username: "admin".into(),
                name: Some("Ada Admin".into()),
                contact: "09171234567".into(),
                address: None,
                role: Some("Admin".into()),
                license_number: None,
            })
            .await
            .expect("seed admin");

        let router = depot_api::app_router(
            state.clone(),
            depot_api::logging::plain_logger(std::io::sink()),
        );

        Self {
            router,
            state,
            identity,
            admin_token: admin.id.to_string(),
            _db_dir: db_dir,
        }
    }

    /// Bearer token for the seeded admin.
    pub fn token(&self) -> &str {
        &self.admin_token
    }

    /// Seeds a staff member with the given role and returns the profile; the
    /// profile id doubles as its bearer token.
    pub async fn seed_staff(&self, username: &str, role: &str) -> staff_profile::Model {
        self.state
            .services
            .staff
            .create_staff(CreateStaff {
                email: format!("{}@depot.test", username),
                username: username.into(),
                name: Some(format!("{} Tester", username)),
                contact: "09181234567".into(),
                address: None,
                role: Some(role.into()),
                license_number: None,
            })
            .await
            .expect("seed staff")
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for requests made as the seeded admin.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(self.token())).await
    }

    /// Sends an admin request, asserts the status and returns the `data` payload.
    pub async fn expect(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        status: StatusCode,
    ) -> Value {
        let response = self.request_authenticated(method.clone(), uri, body).await;
        let actual = response.status();
        let json = response_json(response).await;
        assert_eq!(actual, status, "{} {} returned {}", method, uri, json);
        json.get("data").cloned().unwrap_or(json)
    }

    pub async fn create_supplier(&self, name: &str) -> Value {
        self.expect(
            Method::POST,
            "/api/v1/suppliers",
            Some(json!({
                "supplier_name": name,
                "contact_no": "09171234567",
                "email": format!("{}@suppliers.test", name.to_lowercase().replace(' ', "")),
                "address": "12 Wharf Road",
            })),
            StatusCode::CREATED,
        )
        .await
    }

    pub async fn create_item(&self, name: &str, quantity: i32, supplier_id: &str) -> Value {
        self.expect(
            Method::POST,
            "/api/v1/inventory",
            Some(json!({
                "item_name": name,
                "category": "Hardware",
                "quantity": quantity,
                "uom": "pcs",
                "cost_price": "5.00",
                "selling_price": "8.50",
                "supplier": supplier_id,
            })),
            StatusCode::CREATED,
        )
        .await
    }

    pub async fn create_order(&self, name: &str) -> Value {
        self.expect(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "contact": "09171234567",
                "customer_email": "buyer@example.com",
                "customer_name": name,
                "company": "Buyer Co",
                "shipping_address": "1 Market Street",
                "items": [{"item": "ITM-001", "quantity": 2}],
                "total_amount": "17.00",
            })),
            StatusCode::CREATED,
        )
        .await
    }
}

pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("response body is JSON")
}

/// Reads a decimal that may be serialized as a string or a number.
pub fn decimal(value: &Value) -> rust_decimal::Decimal {
    use std::str::FromStr;
    match value {
        Value::String(s) => rust_decimal::Decimal::from_str(s).expect("decimal string"),
        other => rust_decimal::Decimal::from_str(&other.to_string()).expect("decimal number"),
    }
}
