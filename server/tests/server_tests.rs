//! Adapter and wiring tests that need no external services.

#![allow(clippy::unwrap_used)]

use axum::{
    Json, Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
    routing::post,
};
use chrono::{Duration, NaiveDate};
use serde_json::{Value, json};
use showtime_core::mocks::{
    InMemoryStore, MockPaymentGateway, RecordingNotifier, sign_payment, test_clock,
};
use showtime_core::providers::{OrderRequest, PaymentGateway};
use showtime_core::{
    Actor, BookingError, Clock, Movie, MovieId, Role, Show, ShowId, Theatre, TheatreId, User,
    UserId,
};
use showtime_server::config::PaymentConfig;
use showtime_server::razorpay::RazorpayGateway;
use showtime_server::{Adapters, Config, build_state, serve_until};
use showtime_web::{TokenSigner, build_router, cors_layer};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceExt;

// base64("rzp_test:secret")
const EXPECTED_AUTH: &str = "Basic cnpwX3Rlc3Q6c2VjcmV0";

async fn fake_orders(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(EXPECTED_AUTH);
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "description": "Authentication failed" } })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "id": "order_test_1",
            "entity": "order",
            "amount": body["amount"],
            "currency": body["currency"],
            "receipt": body["receipt"],
            "status": "created",
        })),
    )
}

async fn spawn_fake_razorpay() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/v1/orders", post(fake_orders));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn payment_config(base_url: String, secret: &str) -> PaymentConfig {
    PaymentConfig {
        api_key: "rzp_test".to_string(),
        api_secret: secret.to_string(),
        base_url,
        currency: "INR".to_string(),
    }
}

fn order() -> OrderRequest {
    OrderRequest {
        amount_minor: 50_000,
        currency: "INR".to_string(),
        receipt: "receipt_order_1".to_string(),
    }
}

#[tokio::test]
async fn test_razorpay_creates_order() {
    let base_url = spawn_fake_razorpay().await;
    let gateway = RazorpayGateway::new(&payment_config(base_url, "secret")).unwrap();

    let created = gateway.create_order(order()).await.unwrap();

    assert_eq!(created.order_id, "order_test_1");
    assert_eq!(created.amount_minor, 50_000);
}

#[tokio::test]
async fn test_razorpay_rejection_is_gateway_error() {
    let base_url = spawn_fake_razorpay().await;
    let gateway = RazorpayGateway::new(&payment_config(base_url, "wrong")).unwrap();

    let err = gateway.create_order(order()).await.unwrap_err();

    assert!(matches!(err, BookingError::Gateway(_)));
}

fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "RAZORPAY_API_KEY" => Some("rzp_test".to_string()),
        "RAZORPAY_API_SECRET" => Some("secret".to_string()),
        "JWT_KEY" => Some("jwt-key".to_string()),
        _ => None,
    })
}

fn test_app(config: &Config) -> Router {
    let store = Arc::new(InMemoryStore::new());
    let adapters = Adapters {
        gateway: Arc::new(MockPaymentGateway::new()),
        notifier: Arc::new(RecordingNotifier::new()),
        clock: Arc::new(test_clock()),
    };
    let state = build_state(&store, adapters, config).unwrap();
    build_router(state, cors_layer(&config.server.frontend_url).unwrap())
}

#[tokio::test]
async fn test_wired_router_authenticates_with_configured_key() {
    let config = test_config();
    let app = test_app(&config);
    let actor = Actor::new(UserId::new(), Role::User);
    let token = TokenSigner::new(config.auth.token_key.clone())
        .sign(&actor, test_clock().now() + Duration::hours(1))
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/bookings")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let forged = TokenSigner::new("other-key")
        .sign(&actor, test_clock().now() + Duration::hours(1))
        .unwrap();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/bookings")
                .header(header::AUTHORIZATION, format!("Bearer {forged}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wired_verification_mails_a_pdf_ticket() {
    let config = test_config();
    let store = Arc::new(InMemoryStore::new());
    let notifier = RecordingNotifier::new();
    let clock = test_clock();
    let actor = Actor::new(UserId::new(), Role::User);

    store.seed_user(User {
        id: actor.user_id,
        name: "asha".to_string(),
        email: "asha@example.com".to_string(),
        role: Role::User,
    });
    let movie = Movie {
        id: MovieId::new(),
        title: "Dune".to_string(),
        description: "Spice".to_string(),
        duration_minutes: 155,
        genres: vec!["Sci-Fi".to_string()],
        languages: vec!["English".to_string()],
        release_date: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
        certificate: "UA".to_string(),
    };
    store.seed_movie(movie.clone());
    let theatre = Theatre {
        id: TheatreId::new(),
        name: "PVR Orion".to_string(),
        address: "MG Road".to_string(),
        owner_id: UserId::new(),
        phone: "080-1234".to_string(),
        is_approved: true,
    };
    store.seed_theatre(theatre.clone());
    let start = clock.now() + Duration::days(1);
    let show = Show {
        id: ShowId::new(),
        movie_id: movie.id,
        theatre_id: theatre.id,
        language: "English".to_string(),
        start,
        end: start + Duration::hours(3),
        ticket_price: 250,
        total_seats: 40,
        booked_seats: Vec::new(),
        version: 0,
    };
    store.seed_show(show.clone());

    let adapters = Adapters {
        gateway: Arc::new(MockPaymentGateway::new()),
        notifier: Arc::new(notifier.clone()),
        clock: Arc::new(clock.clone()),
    };
    let state = build_state(&store, adapters, &config).unwrap();
    let app = build_router(state, cors_layer(&config.server.frontend_url).unwrap());
    let token = TokenSigner::new(config.auth.token_key.clone())
        .sign(&actor, clock.now() + Duration::hours(1))
        .unwrap();

    let body = json!({
        "showId": show.id,
        "selectedSeats": [0, 1],
        "amount": 500,
        "orderId": "order_1",
        "paymentId": "pay_1",
        "signature": sign_payment(&config.payment.api_secret, "order_1", "pay_1"),
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/bookings/verify-payment")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    let attachment = sent[0].attachment.clone().unwrap();
    assert_eq!(attachment.filename, "booking.pdf");
    assert_eq!(attachment.content_type, "application/pdf");
    assert!(attachment.content.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_serve_until_stops_on_signal() {
    let config = test_config();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(serve_until(
        listener,
        test_app(&config),
        async move {
            let _ = stop_rx.await;
        },
        std::time::Duration::from_secs(5),
    ));

    let health: Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["data"]["status"], "ok");

    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}
