mod common;

use axum::http::{Method, StatusCode};
use chrono::{Datelike, Utc};
use common::{decimal, TestApp};
use depot_api::models::status::OrderStatusVocabulary;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

fn vehicle_body(plate: &str, driver: Option<&str>) -> Value {
    json!({
        "plate_number": plate,
        "model": "Hiace",
        "brand": "Toyota",
        "year_manufactured": 2019,
        "type": "Van",
        "date_acquired": "2020-01-15",
        "assigned_driver": driver,
        "insurance_expiry": "2030-01-15",
        "registration_expiry": "2030-06-30",
    })
}

#[tokio::test]
async fn order_status_changes_stamp_once() {
    let app = TestApp::new().await;
    let order = app.create_order("Bea Santos").await;
    assert_eq!(order["order_id"], "ORD-0001");
    assert_eq!(order["status"], "Pending");
    assert!(order["date_ordered"].is_string());
    assert_eq!(decimal(&order["total_amount"]), dec!(17));

    let packed = app
        .expect(
            Method::PUT,
            "/api/v1/orders/ORD-0001/update_status",
            Some(json!({"status": "Packed"})),
            StatusCode::OK,
        )
        .await;
    let packed_at = packed["packed_at"].clone();
    assert!(packed_at.is_string());

    app.expect(
        Method::PUT,
        "/api/v1/orders/ORD-0001/update_status",
        Some(json!({"status": "In Transit"})),
        StatusCode::OK,
    )
    .await;
    let repacked = app
        .expect(
            Method::PUT,
            "/api/v1/orders/ORD-0001/update_status",
            Some(json!({"status": "Packed"})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(repacked["packed_at"], packed_at);
    assert!(repacked["in_transit_at"].is_string());

    let response = app
        .request_authenticated(
            Method::PUT,
            "/api/v1/orders/ORD-0001/update_status",
            Some(json!({"status": "Shipped"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let order = app
        .expect(Method::GET, "/api/v1/orders/ORD-0001", None, StatusCode::OK)
        .await;
    assert_eq!(order["status"], "Packed");
}

#[tokio::test]
async fn confirmation_vocabulary_is_configurable() {
    let app =
        TestApp::with_config(|cfg| cfg.order_status_vocabulary = OrderStatusVocabulary::Confirmation)
            .await;
    app.create_order("Bea Santos").await;

    let confirmed = app
        .expect(
            Method::PUT,
            "/api/v1/orders/ORD-0001/update_status",
            Some(json!({"status": "Order Confirmed"})),
            StatusCode::OK,
        )
        .await;
    assert!(confirmed["confirmed_at"].is_string());

    let response = app
        .request_authenticated(
            Method::PUT,
            "/api/v1/orders/ORD-0001/update_status",
            Some(json!({"status": "Packed"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deliveries_belong_to_one_order_and_a_driver() {
    let app = TestApp::new().await;
    app.create_order("Bea Santos").await;
    let driver = app.seed_staff("dan", "Driver").await;
    let cashier = app.seed_staff("cass", "Cashier").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/deliveries",
            Some(json!({"order": "ORD-0001", "driver": cashier.id})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/deliveries",
            Some(json!({"order": "ORD-9999"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let delivery = app
        .expect(
            Method::POST,
            "/api/v1/deliveries",
            Some(json!({"order": "ORD-0001", "driver": driver.id, "delivery_date": "2030-03-01"})),
            StatusCode::CREATED,
        )
        .await;
    let today = Utc::now().date_naive().format("%Y%m%d").to_string();
    assert_eq!(delivery["delivery_id"], format!("DEL-{}-0001", today));
    assert_eq!(delivery["status"], "Pending");

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/deliveries",
            Some(json!({"order": "ORD-0001"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let delivery_id = delivery["delivery_id"].as_str().unwrap().to_string();
    let delivered = app
        .expect(
            Method::PUT,
            &format!("/api/v1/deliveries/{}/update_status", delivery_id),
            Some(json!({"status": "Delivered"})),
            StatusCode::OK,
        )
        .await;
    assert!(delivered["date_delivered"].is_string());

    let fetched = app
        .expect(
            Method::GET,
            &format!("/api/v1/deliveries/{}", delivery_id),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(fetched["driver_name"], "dan Tester");

    // Removing the order removes its delivery
    app.expect(
        Method::DELETE,
        "/api/v1/orders/ORD-0001",
        None,
        StatusCode::NO_CONTENT,
    )
    .await;
    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/deliveries/{}", delivery_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn vehicles_validate_dates_plates_and_drivers() {
    let app = TestApp::new().await;
    let driver = app.seed_staff("dan", "Driver").await;
    let manager = app.seed_staff("maria", "Manager").await;
    let driver_id = driver.id.to_string();

    let vehicle = app
        .expect(
            Method::POST,
            "/api/v1/vehicles",
            Some(vehicle_body(" abc 1234 ", Some(&driver_id))),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(vehicle["vehicle_id"], "VIN-001");
    assert_eq!(vehicle["plate_number"], "ABC 1234");
    assert_eq!(vehicle["status"], "Active");
    assert_eq!(vehicle["type"], "Van");

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/vehicles",
            Some(vehicle_body("ABC 1234", None)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let mut future_year = vehicle_body("XYZ 9876", None);
    future_year["year_manufactured"] = json!(Utc::now().year() + 1);
    let response = app
        .request_authenticated(Method::POST, "/api/v1/vehicles", Some(future_year))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/vehicles",
            Some(vehicle_body("XYZ 9876", Some(&manager.id.to_string()))),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // An update is checked against the stored dates it does not replace
    let response = app
        .request_authenticated(
            Method::PUT,
            "/api/v1/vehicles/VIN-001",
            Some(json!({"insurance_expiry": "2019-12-31"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let maintained = app
        .expect(
            Method::PATCH,
            "/api/v1/vehicles/VIN-001/update_status",
            Some(json!({"status": "Under Maintenance"})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(maintained["status"], "Under Maintenance");

    let fetched = app
        .expect(Method::GET, "/api/v1/vehicles/VIN-001", None, StatusCode::OK)
        .await;
    assert_eq!(fetched["assigned_driver_name"], "dan Tester");
}

#[tokio::test]
async fn deleting_a_vehicle_unlinks_deliveries() {
    let app = TestApp::new().await;
    app.create_order("Bea Santos").await;
    app.expect(
        Method::POST,
        "/api/v1/vehicles",
        Some(vehicle_body("ABC 1234", None)),
        StatusCode::CREATED,
    )
    .await;
    let delivery = app
        .expect(
            Method::POST,
            "/api/v1/deliveries",
            Some(json!({"order": "ORD-0001", "vehicle": "VIN-001"})),
            StatusCode::CREATED,
        )
        .await;
    let delivery_id = delivery["delivery_id"].as_str().unwrap().to_string();

    app.expect(
        Method::DELETE,
        "/api/v1/vehicles/VIN-001",
        None,
        StatusCode::NO_CONTENT,
    )
    .await;

    let fetched = app
        .expect(
            Method::GET,
            &format!("/api/v1/deliveries/{}", delivery_id),
            None,
            StatusCode::OK,
        )
        .await;
    assert!(fetched["vehicle_id"].is_null());
}

#[tokio::test]
async fn expenses_filter_by_category() {
    let app = TestApp::new().await;
    for (category, amount) in [("Fuel", "1500.00"), ("Rent", "20000.00"), ("Fuel", "900.50")] {
        app.expect(
            Method::POST,
            "/api/v1/expenses",
            Some(json!({
                "category": category,
                "amount": amount,
                "date": "2024-03-01",
                "paid_to": "Vendor",
            })),
            StatusCode::CREATED,
        )
        .await;
    }

    let fuel = app
        .expect(Method::GET, "/api/v1/expenses?category=Fuel", None, StatusCode::OK)
        .await;
    assert_eq!(fuel["pagination"]["total"], 2);

    let page = app
        .expect(
            Method::GET,
            "/api/v1/expenses?page=2&per_page=2",
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
    assert_eq!(page["pagination"]["total_pages"], 2);

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/expenses",
            Some(json!({
                "category": "Fuel",
                "amount": "0",
                "date": "2024-03-01",
                "paid_to": "Vendor",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
