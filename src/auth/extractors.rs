use actix_web::dev::Payload;
use actix_web::{web, Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::{authenticate_request, Identity};
use crate::error::AppError;
use crate::state::AppState;

/// Resolves the caller for a request.
///
/// Routes behind `AuthMiddleware` find the identity already in the request
/// extensions; anywhere else the `Authorization` header is verified here.
fn resolve_identity(req: &HttpRequest) -> Result<Identity, AppError> {
    if let Some(identity) = req.extensions().get::<Identity>().cloned() {
        return Ok(identity);
    }

    match req.app_data::<web::Data<AppState>>() {
        Some(state) => authenticate_request(req.headers(), &state.tokens),
        None => Err(AppError::Unauthenticated(
            "Could not validate credentials".to_string(),
        )),
    }
}

/// Admits only administrators.
pub fn authorize_admin(identity: Identity) -> Result<Identity, AppError> {
    if identity.is_admin() {
        Ok(identity)
    } else {
        Err(AppError::Forbidden(
            "Administrator privileges required".to_string(),
        ))
    }
}

impl FromRequest for Identity {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(resolve_identity(req).map_err(Into::into))
    }
}

/// An [`Identity`] that has been checked to hold the admin role.
#[derive(Debug, Clone)]
pub struct AdminIdentity(pub Identity);

impl FromRequest for AdminIdentity {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = resolve_identity(req)
            .and_then(authorize_admin)
            .map(AdminIdentity);
        ready(result.map_err(Into::into))
    }
}
