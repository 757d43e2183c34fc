use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, AUTHORIZATION},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::{Identity, TokenIssuer};
use crate::error::AppError;
use crate::state::AppState;

/// Pulls the bearer credential out of an `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}

/// Resolves the caller from the request headers.
///
/// A missing header and a bad token both surface as `Unauthenticated`.
pub fn authenticate_request(headers: &HeaderMap, tokens: &TokenIssuer) -> Result<Identity, AppError> {
    let token = bearer_token(headers)
        .ok_or_else(|| AppError::Unauthenticated("Missing bearer token".to_string()))?;
    tokens.verify(token)
}

/// Rejects unauthenticated requests and stores the verified [`Identity`] in the
/// request extensions for downstream extractors.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let identity = match req.app_data::<web::Data<AppState>>() {
            Some(state) => authenticate_request(req.headers(), &state.tokens),
            None => Err(AppError::InternalServerError(
                "Application state is not registered".to_string(),
            )),
        };

        match identity {
            Ok(identity) => {
                log::debug!("authenticated {} for {}", identity.username, req.path());
                req.extensions_mut().insert(identity);
                Box::pin(self.service.call(req))
            }
            Err(app_err) => Box::pin(async move { Err(app_err.into()) }),
        }
    }
}
