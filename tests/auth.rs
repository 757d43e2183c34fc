mod common;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use common::{bearer, init_app, login, oauth_state, register, test_state, try_login};
use taskmanager::models::Role;

#[test_log::test(actix_rt::test)]
async fn test_register_and_login_flow() {
    let state = test_state();
    let app = init_app(state.clone()).await;

    // Register a new user
    let resp = register(&app, "integration_user", "Password123!").await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["username"], "integration_user");
    assert_eq!(body["role"], "user");
    assert!(body["id"].is_string());
    assert!(body.get("password_hash").is_none());
    assert!(body.get("access_token").is_none(), "registration must not log in");

    // Registering the same username again is a conflict
    let resp = register(&app, "integration_user", "Another123!").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());

    // Login yields a token the server itself accepts
    let token = login(&app, "integration_user", "Password123!").await;
    let identity = state.tokens.verify(&token).expect("issued token should verify");
    assert_eq!(identity.username, "integration_user");
    assert_eq!(identity.role, Role::User);

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&token))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["username"], "integration_user");
    assert_eq!(me["id"], identity.id.to_string());
}

#[actix_rt::test]
async fn test_login_with_wrong_password() {
    let app = init_app(test_state()).await;
    let resp = register(&app, "wrong_pw_user", "Password123!").await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    for (username, password) in [("wrong_pw_user", "nope-nope"), ("no_such_user", "Password123!")] {
        let resp = try_login(&app, username, password).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            resp.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }
}

#[actix_rt::test]
async fn test_register_validation() {
    let app = init_app(test_state()).await;

    let too_short_username = register(&app, "ab", "Password123!").await;
    assert_eq!(too_short_username.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let too_short_password = register(&app, "valid_name", "12345").await;
    assert_eq!(too_short_password.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Names under the OAuth prefix cannot be claimed with a password.
    let reserved = register(&app, "ya_42", "Password123!").await;
    assert_eq!(reserved.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({ "username": "missing_password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_client_error());
}

#[actix_rt::test]
async fn test_me_rejects_bad_tokens() {
    let app = init_app(test_state()).await;

    let req = test::TestRequest::get().uri("/api/v1/auth/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer("definitely.not.valid"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_admin_login_carries_admin_role() {
    let state = test_state();
    let app = init_app(state.clone()).await;

    let token = common::admin_token(&app, &state).await;
    let identity = state.tokens.verify(&token).unwrap();
    assert_eq!(identity.role, Role::Admin);
    assert!(taskmanager::auth::authorize_admin(identity).is_ok());

    let user_token = common::register_and_login(&app, "plain_user", "Password123!").await;
    let user = state.tokens.verify(&user_token).unwrap();
    assert!(taskmanager::auth::authorize_admin(user).is_err());
}

#[actix_rt::test]
async fn test_yandex_routes_when_unconfigured() {
    let app = init_app(test_state()).await;

    for uri in ["/api/v1/auth/yandex/config", "/api/v1/auth/yandex/login"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
    }

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/yandex/callback?code=abc")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_rt::test]
async fn test_yandex_config_and_login_url() {
    let app = init_app(oauth_state("42")).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/yandex/config")
        .to_request();
    let config: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(config["client_id"], "test-client");
    assert_eq!(config["redirect_uri"], "http://localhost:5173/");
    assert_eq!(config["authorize_url"], "https://oauth.yandex.ru/authorize");

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/yandex/login")
        .to_request();
    let login: Value = test::call_and_read_body_json(&app, req).await;
    let redirect_to = login["redirect_to"].as_str().unwrap();
    assert!(redirect_to.starts_with("https://oauth.yandex.ru/authorize?"));
    assert!(redirect_to.contains("response_type=code"));
    assert!(redirect_to.contains("client_id=test-client"));
    assert!(redirect_to.contains("redirect_uri=http%3A%2F%2Flocalhost%3A5173%2F"));
}

#[test_log::test(actix_rt::test)]
async fn test_yandex_callback_provisions_account_once() {
    let state = oauth_state("42");
    let app = init_app(state.clone()).await;

    let mut ids = Vec::new();
    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/yandex/callback?code=good")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["token_type"], "bearer");

        let identity = state
            .tokens
            .verify(body["access_token"].as_str().unwrap())
            .unwrap();
        assert_eq!(identity.username, "ya_42");
        assert_eq!(identity.role, Role::User);
        ids.push(identity.id);
    }
    assert_eq!(ids[0], ids[1]);

    // The placeholder password is never usable for password login.
    let resp = try_login(&app, "ya_42", "").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_yandex_callback_upstream_failure() {
    let app = init_app(oauth_state("42")).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/yandex/callback?code=bad")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/yandex/callback")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_health_and_banner() {
    let app = init_app(test_state()).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let health: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(health["status"], "ok");

    let req = test::TestRequest::get().uri("/").to_request();
    let banner: Value = test::call_and_read_body_json(&app, req).await;
    assert!(banner["version"].is_string());
}
