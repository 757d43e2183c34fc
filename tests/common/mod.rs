#![allow(dead_code)]

use std::sync::Arc;

use actix_cors::Cors;
use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::middleware::Logger;
use actix_web::{test, web, App, HttpResponse};
use async_trait::async_trait;
use serde_json::{json, Value};

use taskmanager::auth::oauth::{ExternalProfile, OAuthProvider, ProfileExchange};
use taskmanager::config::YandexConfig;
use taskmanager::routes::{self, health};
use taskmanager::store::MemoryStore;
use taskmanager::{AppError, AppState, Config};

pub const TEST_SECRET: &str = "integration-test-secret";

/// Configuration for tests: throwaway secret and the cheapest bcrypt cost.
pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://unused/test".to_string()),
        "JWT_SECRET" => Some(TEST_SECRET.to_string()),
        "BCRYPT_COST" => Some("4".to_string()),
        _ => None,
    })
    .expect("test configuration should be valid")
}

/// Application state over a fresh in-memory store.
pub fn test_state() -> web::Data<AppState> {
    let store = Arc::new(MemoryStore::new());
    web::Data::new(AppState::new(&test_config(), store.clone(), store))
}

/// Stands in for the Yandex endpoints: code `bad` is rejected, any other code
/// resolves to the fixed provider id.
pub struct StubExchange {
    pub provider_user_id: String,
}

#[async_trait]
impl ProfileExchange for StubExchange {
    async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, AppError> {
        if code == "bad" {
            return Err(AppError::UpstreamFailure(
                "Could not exchange the code for a Yandex token".to_string(),
            ));
        }
        Ok(ExternalProfile {
            provider_user_id: self.provider_user_id.clone(),
        })
    }
}

pub fn yandex_config() -> YandexConfig {
    YandexConfig {
        client_id: "test-client".to_string(),
        client_secret: None,
        redirect_uri: "http://localhost:5173/".to_string(),
    }
}

/// Application state with OAuth wired to [`StubExchange`].
pub fn oauth_state(provider_user_id: &str) -> web::Data<AppState> {
    let store = Arc::new(MemoryStore::new());
    let exchange = Arc::new(StubExchange {
        provider_user_id: provider_user_id.to_string(),
    });
    let state = AppState::new(&test_config(), store.clone(), store).with_oauth(Some(
        OAuthProvider::with_exchange(yandex_config(), exchange),
    ));
    web::Data::new(state)
}

pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600)
}

/// The full application, wired the same way as the server binary.
pub async fn init_app(
    state: web::Data<AppState>,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(state)
            .wrap(cors())
            .wrap(Logger::default())
            .service(health::index)
            .service(health::health)
            .service(web::scope("/api/v1").configure(routes::config)),
    )
    .await
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub async fn register<S, B>(app: &S, username: &str, password: &str) -> ServiceResponse<B>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    test::call_service(app, req).await
}

pub async fn try_login<S, B>(app: &S, username: &str, password: &str) -> ServiceResponse<B>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_form([("username", username), ("password", password)])
        .to_request();
    test::call_service(app, req).await
}

/// Logs in and returns the access token.
pub async fn login<S, B>(app: &S, username: &str, password: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = try_login(app, username, password).await;
    assert_eq!(resp.status(), StatusCode::OK, "login as {} failed", username);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["token_type"], "bearer");
    body["access_token"]
        .as_str()
        .expect("access_token should be a string")
        .to_string()
}

/// Registers a fresh account and returns its access token.
pub async fn register_and_login<S, B>(app: &S, username: &str, password: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = register(app, username, password).await;
    assert_eq!(resp.status(), StatusCode::CREATED, "registering {} failed", username);
    login(app, username, password).await
}

/// Ensures the configured admin exists and returns an admin token.
pub async fn admin_token<S, B>(app: &S, state: &web::Data<AppState>) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let config = test_config();
    state
        .accounts
        .ensure_admin(&config.admin)
        .await
        .expect("admin should be provisioned");
    login(app, &config.admin.username, &config.admin.password).await
}

/// Sends a request the auth middleware is expected to refuse and returns the
/// response the server would write for that refusal.
pub async fn call_rejected<S, B>(app: &S, req: Request) -> HttpResponse
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
{
    match test::try_call_service(app, req).await {
        Ok(resp) => panic!("request was let through with status {}", resp.status()),
        Err(err) => err.error_response(),
    }
}
