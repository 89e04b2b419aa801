use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

/// Registers the bearer-token scheme referenced by protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Depot API",
        version = "0.1.0",
        description = r#"
# Depot back-office API

Suppliers, inventory, purchase orders, stock-in, staff and customer profiles,
orders, deliveries, vehicles and expenses.

## Authentication

Tokens are issued by the identity provider through `POST /api/v1/auth/login`.
Send them on every call except the public catalogue reads:

```
Authorization: Bearer <access-token>
```

Deactivated and deleted accounts are refused with `403`.

## Pagination

List endpoints accept `page` (1-based) and `per_page` (capped by configuration).
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers((url = "http://localhost:8080", description = "Local development")),
    tags(
        (name = "suppliers", description = "Supplier directory"),
        (name = "inventory", description = "Stock items and quantity adjustments"),
        (name = "purchase-orders", description = "Purchasing with computed totals"),
        (name = "stock-in", description = "Received stock"),
        (name = "staff", description = "Staff accounts (admin only)"),
        (name = "customers", description = "Customer profiles"),
        (name = "orders", description = "Customer orders"),
        (name = "deliveries", description = "Order deliveries"),
        (name = "vehicles", description = "Delivery fleet"),
        (name = "expenses", description = "Operating expenses"),
        (name = "auth", description = "Sign-in and sign-out")
    ),
    paths(
        crate::handlers::suppliers::list_suppliers,
        crate::handlers::suppliers::create_supplier,
        crate::handlers::suppliers::get_supplier,
        crate::handlers::suppliers::update_supplier,
        crate::handlers::suppliers::delete_supplier,

        crate::handlers::inventory::list_inventory,
        crate::handlers::inventory::get_inventory,
        crate::handlers::inventory::get_low_stock_items,
        crate::handlers::inventory::create_inventory,
        crate::handlers::inventory::update_inventory,
        crate::handlers::inventory::delete_inventory,
        crate::handlers::inventory::decrease_inventory,

        crate::handlers::purchase_orders::list_purchase_orders,
        crate::handlers::purchase_orders::create_purchase_order,
        crate::handlers::purchase_orders::get_purchase_order,
        crate::handlers::purchase_orders::update_purchase_order,
        crate::handlers::purchase_orders::update_purchase_order_status,
        crate::handlers::purchase_orders::delete_purchase_order,
        crate::handlers::purchase_orders::add_purchase_order_line,
        crate::handlers::purchase_orders::update_purchase_order_line,
        crate::handlers::purchase_orders::remove_purchase_order_line,

        crate::handlers::stock_in::list_stock_ins,
        crate::handlers::stock_in::create_stock_in,
        crate::handlers::stock_in::get_stock_in,
        crate::handlers::stock_in::update_stock_in,
        crate::handlers::stock_in::delete_stock_in,

        crate::handlers::staff::list_staff,
        crate::handlers::staff::create_staff,
        crate::handlers::staff::get_staff,
        crate::handlers::staff::update_staff,
        crate::handlers::staff::delete_staff,
        crate::handlers::staff::activate_staff,
        crate::handlers::staff::deactivate_staff,
        crate::handlers::staff::resend_invite,

        crate::handlers::customers::list_profiles,
        crate::handlers::customers::create_profile,
        crate::handlers::customers::get_profile,
        crate::handlers::customers::update_profile,
        crate::handlers::customers::delete_profile,
        crate::handlers::customers::change_customer_status,

        crate::handlers::orders::list_orders,
        crate::handlers::orders::create_order,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::delete_order,

        crate::handlers::deliveries::list_deliveries,
        crate::handlers::deliveries::create_delivery,
        crate::handlers::deliveries::get_delivery,
        crate::handlers::deliveries::update_delivery,
        crate::handlers::deliveries::update_delivery_status,
        crate::handlers::deliveries::delete_delivery,

        crate::handlers::vehicles::list_vehicles,
        crate::handlers::vehicles::create_vehicle,
        crate::handlers::vehicles::get_vehicle,
        crate::handlers::vehicles::update_vehicle,
        crate::handlers::vehicles::update_vehicle_status,
        crate::handlers::vehicles::delete_vehicle,

        crate::handlers::expenses::list_expenses,
        crate::handlers::expenses::create_expense,
        crate::handlers::expenses::get_expense,
        crate::handlers::expenses::update_expense,
        crate::handlers::expenses::delete_expense,

        crate::auth::login_handler,
        crate::auth::logout_handler,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,
            crate::handlers::common::StatusUpdate,
            crate::handlers::common::PaginationMeta,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_resources_and_auth() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Depot API"));
        assert!(json.contains("/api/v1/purchase-orders/{id}/items/{line_id}"));
        assert!(json.contains("/api/v1/deliveries/{id}/update_status"));
        assert!(json.contains("bearer_auth"));
    }
}
