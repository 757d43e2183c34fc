use crate::{
    auth::{Identity, LoginRequest, RegisterRequest, TokenResponse},
    error::AppError,
    models::UserOut,
    state::AppState,
};
use actix_web::{get, post, web, HttpResponse, Responder};

/// Register a new user
///
/// Creates a regular account and returns its public view. No token is issued;
/// the client logs in separately.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let user = state.accounts.register(&register_data).await?;
    Ok(HttpResponse::Created().json(UserOut::from(&user)))
}

/// Login user
///
/// Accepts form-encoded `username` and `password` and returns a bearer token.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Form<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let user = state
        .accounts
        .login(&login_data.username, &login_data.password)
        .await?;
    let token = state.tokens.issue(&Identity::from(&user))?;
    Ok(HttpResponse::Ok().json(TokenResponse::bearer(token)))
}

/// The identity carried by the caller's token.
#[get("/me")]
pub async fn me(identity: Identity) -> impl Responder {
    HttpResponse::Ok().json(UserOut {
        id: identity.id,
        username: identity.username,
        role: identity.role,
    })
}
