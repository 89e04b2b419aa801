/*!
 * # Authentication and Authorization Module
 *
 * Bearer tokens are verified against the external identity provider and
 * resolved to a local staff or customer profile. Accounts that are not
 * Active are refused. Staff management routes additionally require the
 * Admin role.
 */

pub mod identity;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
    routing::post,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::ServiceError,
    models::{
        customer_profile, staff_profile,
        status::{LifecycleStatus, StaffRole},
    },
    ApiResponse, AppState,
};

pub use identity::{HttpIdentityProvider, IdentityProvider, IdentityUser, SessionTokens};

/// The local account behind an identity-provider user.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "account_type", content = "profile", rename_all = "lowercase")]
pub enum Account {
    Staff(staff_profile::Model),
    Customer(customer_profile::Model),
    /// Signed in upstream but without a local profile.
    Unregistered,
}

impl Account {
    pub fn status(&self) -> Option<LifecycleStatus> {
        match self {
            Account::Staff(staff) => Some(staff.status),
            Account::Customer(customer) => Some(customer.status),
            Account::Unregistered => None,
        }
    }

    pub fn ensure_active(&self) -> Result<(), ServiceError> {
        match self.status().and_then(LifecycleStatus::access_error) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Authenticated caller, inserted into request extensions by [`auth_middleware`].
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Option<StaffRole>,
    pub is_staff: bool,
}

impl AuthUser {
    fn from_account(user: IdentityUser, account: &Account) -> Self {
        let (role, is_staff) = match account {
            Account::Staff(staff) => (staff.role, true),
            _ => (None, false),
        };
        Self {
            user_id: user.id,
            email: user.email,
            role,
            is_staff,
        }
    }

    pub fn has_role(&self, role: StaffRole) -> bool {
        self.role == Some(role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(StaffRole::Admin)
    }

    pub fn ensure_admin(&self) -> Result<(), ServiceError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ServiceError::Forbidden("Admin role required".to_string()))
        }
    }

    /// Admins may act on any account; everyone else only on their own.
    pub fn ensure_admin_or_owner(&self, owner: Uuid) -> Result<(), ServiceError> {
        if self.is_admin() || self.user_id == owner {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "Only an admin or the account owner may do this".to_string(),
            ))
        }
    }

    /// Staff may read any account; everyone else only their own.
    pub fn ensure_staff_or_owner(&self, owner: Uuid) -> Result<(), ServiceError> {
        if self.is_staff {
            Ok(())
        } else {
            self.ensure_admin_or_owner(owner)
        }
    }

    /// The caller's staff profile id, used for audit columns.
    pub fn staff_id(&self) -> Option<Uuid> {
        self.is_staff.then_some(self.user_id)
    }
}

/// Extracts the token from an `Authorization: Bearer ...` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

async fn load_account(state: &AppState, id: Uuid) -> Result<Account, ServiceError> {
    if let Some(staff) = state.services.staff.find_staff(id).await? {
        return Ok(Account::Staff(staff));
    }
    if let Some(customer) = state.services.customers.find_customer(id).await? {
        return Ok(Account::Customer(customer));
    }
    Ok(Account::Unregistered)
}

/// Authentication middleware that verifies the bearer token and loads the caller's account
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| ServiceError::Unauthorized("Authentication required".to_string()))?
        .to_string();

    let user = state.identity.verify_token(&token).await?;
    let account = load_account(&state, user.id).await?;
    if let Err(err) = account.ensure_active() {
        warn!(user_id = %user.id, "request refused for inactive account");
        return Err(err);
    }

    request
        .extensions_mut()
        .insert(AuthUser::from_account(user, &account));
    Ok(next.run(request).await)
}

/// Admin-role gate; must run after [`auth_middleware`]
pub async fn admin_middleware(request: Request, next: Next) -> Result<Response, ServiceError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ServiceError::Unauthorized("Authentication required".to_string()))?;
    if !user.is_admin() {
        return Err(ServiceError::Forbidden("Admin role required".to_string()));
    }
    Ok(next.run(request).await)
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self, state: &AppState) -> Self;
    fn with_admin(self, state: &AppState) -> Self;
}

impl AuthRouterExt for Router<AppState> {
    fn with_auth(self, state: &AppState) -> Self {
        self.route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
    }

    fn with_admin(self, state: &AppState) -> Self {
        self.route_layer(axum::middleware::from_fn(admin_middleware))
            .with_auth(state)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: Option<i64>,
    pub refresh_token: Option<String>,
    #[schema(value_type = Object)]
    pub account: Account,
}

/// Authentication routes
pub fn auth_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/auth/logout", post(logout_handler))
        .with_auth(state);

    Router::new()
        .route("/auth/login", post(login_handler))
        .merge(protected)
}

/// Password sign-in. Deactivated and deleted accounts get an explicit error and no token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account deactivated or deleted"),
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<AppState>,
    Json(credentials): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ServiceError> {
    credentials.validate()?;
    let tokens = state
        .identity
        .sign_in(&credentials.email, &credentials.password)
        .await?;

    let account = load_account(&state, tokens.user.id).await?;
    if let Err(err) = account.ensure_active() {
        warn!(user_id = %tokens.user.id, "login refused for inactive account");
        if let Err(revoke) = state.identity.sign_out(&tokens.access_token).await {
            warn!(error = %revoke, "failed to revoke session of refused login");
        }
        return Err(err);
    }

    info!(user_id = %tokens.user.id, "signed in");
    Ok(Json(ApiResponse::success(LoginResponse {
        access_token: tokens.access_token,
        token_type: tokens.token_type,
        expires_in: tokens.expires_in,
        refresh_token: tokens.refresh_token,
        account,
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses((status = 200, description = "Signed out")),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Value>>, ServiceError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ServiceError::Unauthorized("Authentication required".to_string()))?;
    state.identity.sign_out(token).await?;
    info!(user_id = %user.user_id, "signed out");
    Ok(Json(ApiResponse::success(json!({ "message": "Logout successful" }))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;
    use chrono::Utc;

    fn staff(status: LifecycleStatus, role: StaffRole) -> staff_profile::Model {
        staff_profile::Model {
            id: Uuid::new_v4(),
            staff_id: Some("EMP-0001".into()),
            email: "ana@example.com".into(),
            username: "ana".into(),
            name: Some("Ana".into()),
            contact: "+63 917 123 4567".into(),
            address: None,
            role: Some(role),
            license_number: None,
            created_at: Utc::now(),
            status,
            deactivated_at: None,
            deleted_at: None,
        }
    }

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn inactive_accounts_are_refused() {
        let deactivated = Account::Staff(staff(LifecycleStatus::Deactivated, StaffRole::Driver));
        assert_matches!(deactivated.ensure_active(), Err(ServiceError::AccountDeactivated));

        let deleted = Account::Staff(staff(LifecycleStatus::Deleted, StaffRole::Admin));
        assert_matches!(deleted.ensure_active(), Err(ServiceError::AccountDeleted));

        assert!(Account::Unregistered.ensure_active().is_ok());
    }

    #[test]
    fn admin_role_comes_from_staff_profile() {
        let profile = staff(LifecycleStatus::Active, StaffRole::Admin);
        let user = IdentityUser {
            id: profile.id,
            email: Some(profile.email.clone()),
        };
        let auth = AuthUser::from_account(user.clone(), &Account::Staff(profile));
        assert!(auth.is_admin());
        assert_eq!(auth.staff_id(), Some(user.id));

        let unregistered = AuthUser::from_account(user, &Account::Unregistered);
        assert!(!unregistered.is_admin());
        assert_eq!(unregistered.staff_id(), None);
    }

    #[test]
    fn ownership_checks() {
        let cashier_profile = staff(LifecycleStatus::Active, StaffRole::Cashier);
        let cashier = AuthUser::from_account(
            IdentityUser {
                id: cashier_profile.id,
                email: None,
            },
            &Account::Staff(cashier_profile),
        );
        let someone_else = Uuid::new_v4();

        assert_matches!(cashier.ensure_admin(), Err(ServiceError::Forbidden(_)));
        assert_matches!(
            cashier.ensure_admin_or_owner(someone_else),
            Err(ServiceError::Forbidden(_))
        );
        assert!(cashier.ensure_admin_or_owner(cashier.user_id).is_ok());
        assert!(cashier.ensure_staff_or_owner(someone_else).is_ok());

        let stranger = AuthUser::from_account(
            IdentityUser {
                id: Uuid::new_v4(),
                email: None,
            },
            &Account::Unregistered,
        );
        assert_matches!(
            stranger.ensure_staff_or_owner(someone_else),
            Err(ServiceError::Forbidden(_))
        );
    }
}
