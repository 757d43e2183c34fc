use crate::{
    auth::{Identity, TokenResponse},
    error::AppError,
    state::AppState,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: String,
}

/// Public OAuth parameters for the frontend.
///
/// ## Responses:
/// - `200 OK`: `{client_id, redirect_uri, authorize_url}`.
/// - `500 Internal Server Error`: OAuth is not configured.
#[get("/yandex/config")]
pub async fn yandex_config(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let provider = state.oauth_provider()?;
    Ok(HttpResponse::Ok().json(provider.public_config()))
}

/// The provider consent URL the browser should be sent to.
#[get("/yandex/login")]
pub async fn yandex_login(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let redirect_to = state.oauth_provider()?.authorize_url()?;
    Ok(HttpResponse::Ok().json(json!({ "redirect_to": redirect_to })))
}

/// Completes the authorization-code flow.
///
/// Exchanges `code` with the provider, links or creates the local `ya_<id>`
/// account, and returns a token shaped like the password-login response.
///
/// ## Responses:
/// - `200 OK`: `{access_token, token_type}`.
/// - `400 Bad Request`: the provider rejected the code or returned no profile id.
/// - `500 Internal Server Error`: OAuth is not configured.
#[post("/yandex/callback")]
pub async fn yandex_callback(
    state: web::Data<AppState>,
    params: web::Query<CallbackParams>,
) -> Result<impl Responder, AppError> {
    let provider = state.oauth_provider()?;
    let profile = provider.exchange_code(&params.code).await?;
    let user = state.accounts.login_external(&profile).await?;
    let token = state.tokens.issue(&Identity::from(&user))?;
    Ok(HttpResponse::Ok().json(TokenResponse::bearer(token)))
}
