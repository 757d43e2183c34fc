//! Yandex OAuth 2.0 authorization-code login.
//!
//! The HTTP exchange sits behind [`ProfileExchange`] so handlers and tests can
//! swap in a different provider client.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::YandexConfig;
use crate::error::AppError;

pub const YANDEX_AUTHORIZE_URL: &str = "https://oauth.yandex.ru/authorize";
pub const YANDEX_TOKEN_URL: &str = "https://oauth.yandex.ru/token";
pub const YANDEX_USERINFO_URL: &str = "https://login.yandex.ru/info";

/// Username prefix reserved for accounts provisioned through Yandex login.
pub const EXTERNAL_USERNAME_PREFIX: &str = "ya_";

/// The part of a provider profile the service cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalProfile {
    pub provider_user_id: String,
}

impl ExternalProfile {
    /// Local username for accounts created through this provider.
    pub fn username(&self) -> String {
        format!("{}{}", EXTERNAL_USERNAME_PREFIX, self.provider_user_id)
    }
}

/// Trades an authorization code for the caller's provider profile.
#[async_trait]
pub trait ProfileExchange: Send + Sync {
    async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, AppError>;
}

/// Public parameters a frontend needs to start the flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicOAuthConfig {
    pub client_id: String,
    pub redirect_uri: String,
    pub authorize_url: String,
}

/// Builds the provider consent URL with properly encoded query parameters.
pub fn authorize_url(config: &YandexConfig) -> Result<String, AppError> {
    Url::parse_with_params(
        YANDEX_AUTHORIZE_URL,
        &[
            ("response_type", "code"),
            ("client_id", config.client_id.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
        ],
    )
    .map(String::from)
    .map_err(|e| AppError::InternalServerError(format!("Failed to build authorize URL: {}", e)))
}

/// Picks the account id out of a userinfo document: `id`, then `uid`, then `client_id`.
pub fn profile_id(profile: &Value) -> Option<String> {
    ["id", "uid", "client_id"]
        .iter()
        .filter_map(|key| match profile.get(*key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .next()
}

#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: Option<String>,
}

/// [`ProfileExchange`] backed by the real Yandex endpoints.
pub struct YandexOAuth {
    config: YandexConfig,
    client: reqwest::Client,
}

impl YandexOAuth {
    pub fn new(config: YandexConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    async fn fetch_access_token(&self, code: &str) -> Result<String, AppError> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];
        if let Some(secret) = self.config.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let response = self.client.post(YANDEX_TOKEN_URL).form(&form).send().await?;
        if response.status() != StatusCode::OK {
            log::warn!("Yandex token endpoint returned {}", response.status());
            return Err(AppError::UpstreamFailure(
                "Could not exchange the code for a Yandex token".to_string(),
            ));
        }

        let grant: TokenGrant = response.json().await?;
        grant
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::UpstreamFailure("Yandex token is missing".to_string()))
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<Value, AppError> {
        let response = self
            .client
            .get(YANDEX_USERINFO_URL)
            .query(&[("format", "json")])
            .header(AUTHORIZATION, format!("OAuth {}", access_token))
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            log::warn!("Yandex userinfo endpoint returned {}", response.status());
            return Err(AppError::UpstreamFailure(
                "Could not fetch the Yandex profile".to_string(),
            ));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ProfileExchange for YandexOAuth {
    async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, AppError> {
        let access_token = self.fetch_access_token(code).await?;
        let profile = self.fetch_profile(&access_token).await?;
        let provider_user_id = profile_id(&profile).ok_or_else(|| {
            AppError::UpstreamFailure("Yandex profile has no user id".to_string())
        })?;
        Ok(ExternalProfile { provider_user_id })
    }
}

/// A configured provider: public parameters plus the exchange client.
#[derive(Clone)]
pub struct OAuthProvider {
    config: YandexConfig,
    exchange: Arc<dyn ProfileExchange>,
}

impl OAuthProvider {
    pub fn yandex(config: YandexConfig) -> Self {
        let exchange = Arc::new(YandexOAuth::new(config.clone()));
        Self { config, exchange }
    }

    pub fn with_exchange(config: YandexConfig, exchange: Arc<dyn ProfileExchange>) -> Self {
        Self { config, exchange }
    }

    pub fn public_config(&self) -> PublicOAuthConfig {
        PublicOAuthConfig {
            client_id: self.config.client_id.clone(),
            redirect_uri: self.config.redirect_uri.clone(),
            authorize_url: YANDEX_AUTHORIZE_URL.to_string(),
        }
    }

    pub fn authorize_url(&self) -> Result<String, AppError> {
        authorize_url(&self.config)
    }

    pub async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, AppError> {
        if code.trim().is_empty() {
            return Err(AppError::BadRequest("Authorization code is required".to_string()));
        }
        self.exchange.exchange_code(code).await
    }
}
