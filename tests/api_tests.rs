use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

use intercity_rides::build_app;
use intercity_rides::config::EnvironmentConfig;
use intercity_rides::repositories::Repositories;
use intercity_rides::state::AppState;
use intercity_rides::utils::clock::SystemClock;

fn create_test_app() -> Router {
    let state = AppState::new(Repositories::in_memory(), EnvironmentConfig::default(), Arc::new(SystemClock));
    build_app(state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        other => other.to_string().parse().unwrap(),
    }
}

/// Configuración de 4 plazas a 400 y ruta de 180 minutos
async fn seed_catalog(app: &Router) -> (String, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/vehicle-configs",
        Some(json!({
            "vehicle_type": "SHARED_CAR",
            "display_name": "Shared Sedan",
            "total_price": "400",
            "min_seats": 2,
            "max_seats": 4
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let config_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        app,
        Method::POST,
        "/api/routes",
        Some(json!({
            "origin": { "name": "Bengaluru", "lat": 12.9716, "lng": 77.5946 },
            "destination": { "name": "Mysuru", "lat": 12.2958, "lng": 76.6394 },
            "distance_km": 145.0,
            "duration_minutes": 180
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let route_id = body["data"]["id"].as_str().unwrap().to_string();
    (config_id, route_id)
}

/// Viaje sobre el catálogo de prueba dentro de 48 horas
async fn seed_trip(app: &Router) -> String {
    let (config_id, route_id) = seed_catalog(app).await;
    let departure = Utc::now() + Duration::hours(48);
    let (status, body) = send(
        app,
        Method::POST,
        "/api/trips",
        Some(json!({
            "vehicle_config_id": config_id,
            "route_id": route_id,
            "scheduled_departure": departure.to_rfc3339()
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["status"], "SCHEDULED");
    assert_eq!(body["data"]["available_seats"], 4);
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn book(app: &Router, trip_id: &str, seats: i32) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        &format!("/api/trips/{}/bookings", trip_id),
        Some(json!({ "user_id": uuid::Uuid::new_v4(), "seat_count": seats })),
    )
    .await
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();
    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_shared_fare_scenario_over_http() {
    let app = create_test_app();
    let trip_id = seed_trip(&app).await;

    let (status, a) = book(&app, &trip_id, 2).await;
    assert_eq!(status, StatusCode::CREATED, "{}", a);
    assert_eq!(a["data"]["status"], "HOLD");
    assert_eq!(decimal(&a["data"]["price_per_seat"]), Decimal::new(200, 0));
    let booking_a = a["data"]["id"].as_str().unwrap().to_string();

    let (status, b) = book(&app, &trip_id, 2).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(decimal(&b["data"]["price_per_seat"]), Decimal::new(100, 0));

    let (status, c) = book(&app, &trip_id, 1).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(c["code"], "CAPACITY_EXCEEDED");

    let (status, cancelled) = send(&app, Method::POST, &format!("/api/bookings/{}/cancel", booking_a), None).await;
    assert_eq!(status, StatusCode::OK, "{}", cancelled);
    assert_eq!(cancelled["data"]["status"], "CANCELLED");

    let (status, trip) = send(&app, Method::GET, &format!("/api/trips/{}", trip_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trip["booked_seats"], 2);
    assert_eq!(trip["status"], "FILLING");
    assert_eq!(decimal(&trip["current_per_head_price"]), Decimal::new(200, 0));

    let (status, page) = send(&app, Method::GET, &format!("/api/trips/{}/bookings", trip_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 2);
    assert_eq!(page["page"], 1);
    assert_eq!(page["size"], 20);
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let app = create_test_app();
    let missing = uuid::Uuid::new_v4();

    let (status, body) = send(&app, Method::GET, &format!("/api/trips/{}", missing), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = send(&app, Method::POST, &format!("/api/bookings/{}/confirm", missing), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, &format!("/api/trips/{}/bookings", missing), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dispatch_requires_min_seats_unless_override() {
    let app = create_test_app();
    let trip_id = seed_trip(&app).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/drivers",
        Some(json!({
            "full_name": "Ravi Kumar",
            "phone": "+919876543210",
            "vehicle_number": "KA01AB1234",
            "current_lat": 12.97,
            "current_lng": 77.59
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, booking) = book(&app, &trip_id, 1).await;
    assert_eq!(booking["data"]["status"], "HOLD");

    let dispatch_uri = format!("/api/trips/{}/dispatch", trip_id);
    let (status, body) = send(&app, Method::POST, &dispatch_uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_STATE_TRANSITION");

    let (status, body) = send(&app, Method::POST, &dispatch_uri, Some(json!({ "override": true }))).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "DISPATCHED");
    assert_eq!(body["data"]["dispatch_override"], true);
    assert!(body["data"]["driver_id"].is_string());

    let (status, body) = send(&app, Method::POST, &dispatch_uri, Some(json!({ "override": true }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_STATE_TRANSITION");
}

#[tokio::test]
async fn test_malformed_action_bodies_are_rejected_without_side_effects() {
    let app = create_test_app();
    let trip_id = seed_trip(&app).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/drivers",
        Some(json!({ "full_name": "Ravi Kumar", "phone": "+919876543210", "vehicle_number": "KA01AB1234" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, booking) = book(&app, &trip_id, 2).await;
    let booking_id = booking["data"]["id"].as_str().unwrap().to_string();

    let dispatch_uri = format!("/api/trips/{}/dispatch", trip_id);
    let (status, body) = send(&app, Method::POST, &dispatch_uri, Some(json!({ "driver_id": "not-a-uuid" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) =
        send(&app, Method::POST, &format!("/api/trips/{}/cancel", trip_id), Some(json!({ "reason": 42 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) =
        send(&app, Method::POST, &format!("/api/bookings/{}/cancel", booking_id), Some(json!({ "reason": [] }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/bookings/{}/confirm", booking_id),
        Some(json!({ "payment_reference": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);

    let (_, trip) = send(&app, Method::GET, &format!("/api/trips/{}", trip_id), None).await;
    assert_eq!(trip["status"], "FILLING");
    assert!(trip["driver_id"].is_null());
    let (_, stored) = send(&app, Method::GET, &format!("/api/bookings/{}", booking_id), None).await;
    assert_eq!(stored["status"], "HOLD");

    // Sin cuerpo se aplican los valores por defecto
    let (status, body) = send(&app, Method::POST, &dispatch_uri, None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "DISPATCHED");
}

#[tokio::test]
async fn test_departure_beyond_scheduling_horizon_is_rejected() {
    let app = create_test_app();
    let (config_id, route_id) = seed_catalog(&app).await;

    for departure in ["+262142-12-31T23:00:00Z".to_string(), (Utc::now() + Duration::days(400)).to_rfc3339()] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/trips",
            Some(json!({
                "vehicle_config_id": config_id,
                "route_id": route_id,
                "scheduled_departure": departure
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn test_confirm_and_board_with_otp() {
    let app = create_test_app();
    let trip_id = seed_trip(&app).await;

    let (_, booking) = book(&app, &trip_id, 2).await;
    let booking_id = booking["data"]["id"].as_str().unwrap().to_string();

    let (status, paying) = send(
        &app,
        Method::POST,
        &format!("/api/bookings/{}/payment", booking_id),
        Some(json!({ "payment_reference": "pay_123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paying["data"]["status"], "PENDING");
    assert_eq!(paying["data"]["payment_status"], "INITIATED");

    let (status, confirmed) =
        send(&app, Method::POST, &format!("/api/bookings/{}/confirm", booking_id), None).await;
    assert_eq!(status, StatusCode::OK, "{}", confirmed);
    assert_eq!(confirmed["data"]["status"], "CONFIRMED");
    assert_eq!(confirmed["data"]["payment_status"], "PAID");
    assert!(confirmed["data"]["booking_code"].as_str().unwrap().starts_with("ICB"));
    let otp = confirmed["data"]["otp"].as_str().unwrap().to_string();
    assert_eq!(otp.len(), 4);

    // Embarcar antes del despacho no está permitido
    let board_uri = format!("/api/bookings/{}/board", booking_id);
    let (status, _) = send(&app, Method::POST, &board_uri, Some(json!({ "otp": otp }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    send(
        &app,
        Method::POST,
        "/api/drivers",
        Some(json!({ "full_name": "Asha", "phone": "9876543210", "vehicle_number": "KA05MN4321" })),
    )
    .await;
    let (status, body) =
        send(&app, Method::POST, &format!("/api/bookings/{}/assign-driver", booking_id), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "DISPATCHED");

    let wrong = if otp == "0000" { "1111" } else { "0000" };
    let (status, body) = send(&app, Method::POST, &board_uri, Some(json!({ "otp": wrong }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_OTP");

    let (status, body) = send(&app, Method::POST, &board_uri, Some(json!({ "otp": otp, "passengers": 1 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["passengers_onboarded"], 1);
    assert_eq!(body["data"]["status"], "CONFIRMED");

    let (status, body) = send(&app, Method::POST, &board_uri, Some(json!({ "otp": otp, "passengers": 2 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = send(&app, Method::POST, &board_uri, Some(json!({ "otp": otp }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "COMPLETED");
}

#[tokio::test]
async fn test_trip_listing_filters_by_status() {
    let app = create_test_app();
    let trip_id = seed_trip(&app).await;
    book(&app, &trip_id, 1).await;

    let (status, page) = send(&app, Method::GET, "/api/trips?status=filling", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"], trip_id);

    let (_, page) = send(&app, Method::GET, "/api/trips?status=SCHEDULED", None).await;
    assert_eq!(page["total"], 0);

    let (status, body) = send(&app, Method::GET, "/api/trips?status=BOARDING", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, page) = send(&app, Method::GET, "/api/bookings?status=HOLD&size=500", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["size"], 100);
}

#[tokio::test]
async fn test_catalog_and_pricing_endpoints() {
    let app = create_test_app();
    seed_trip(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/vehicle-configs",
        Some(json!({
            "vehicle_type": "SHARED_CAR",
            "display_name": "Duplicate",
            "total_price": "500",
            "min_seats": 1,
            "max_seats": 4
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, found) = send(&app, Method::GET, "/api/routes/lookup?origin=mysuru&destination=BENGALURU", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["reverse"], true);

    let (status, pricing) = send(&app, Method::GET, "/api/pricing-config", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&pricing["commission_percent"]), Decimal::new(10, 0));

    let (status, updated) = send(
        &app,
        Method::PUT,
        "/api/pricing-config",
        Some(json!({ "night_fare_enabled": true, "night_start_hour": 23 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["night_fare_enabled"], true);
    assert_eq!(updated["data"]["night_start_hour"], 23);

    let (status, dashboard) = send(&app, Method::GET, "/api/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["trips_by_status"]["SCHEDULED"], 1);
    assert_eq!(dashboard["active_routes"], 1);
}
