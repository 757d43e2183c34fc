use std::sync::Arc;

use crate::auth::oauth::OAuthProvider;
use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::error::AppError;
use crate::services::{AccountService, TaskService};
use crate::store::{MemoryStore, TaskStore, UserStore};

/// Shared application state, registered once as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub tokens: TokenIssuer,
    pub accounts: AccountService,
    pub tasks: TaskService,
    pub oauth: Option<OAuthProvider>,
}

impl AppState {
    /// Wires services over the given stores. OAuth is enabled when the
    /// configuration carries a Yandex client id.
    pub fn new(config: &Config, users: Arc<dyn UserStore>, tasks: Arc<dyn TaskStore>) -> Self {
        Self {
            tokens: TokenIssuer::new(&config.jwt),
            accounts: AccountService::new(users, config.bcrypt_cost),
            tasks: TaskService::new(tasks),
            oauth: config.yandex.clone().map(OAuthProvider::yandex),
        }
    }

    /// State over a fresh [`MemoryStore`], without OAuth.
    pub fn in_memory(tokens: TokenIssuer, bcrypt_cost: u32) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            tokens,
            accounts: AccountService::new(store.clone(), bcrypt_cost),
            tasks: TaskService::new(store),
            oauth: None,
        }
    }

    pub fn with_oauth(mut self, provider: Option<OAuthProvider>) -> Self {
        self.oauth = provider;
        self
    }

    /// The configured OAuth provider, or `Unconfigured`.
    pub fn oauth_provider(&self) -> Result<&OAuthProvider, AppError> {
        self.oauth
            .as_ref()
            .ok_or_else(|| AppError::Unconfigured("Yandex OAuth is not configured".to_string()))
    }
}
