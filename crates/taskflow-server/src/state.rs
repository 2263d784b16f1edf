//! Shared application state

use crate::auth::{
    AccountService, FederatedLoginDisabled, FederatedVerifier, LogResetTokens, ResetTokenSink,
    TokenIssuer,
};
use crate::config::ServerConfig;
use chrono::Duration;
use std::sync::Arc;
use taskflow_core::{RoomRegistry, Services, Store};

/// Everything a handler needs, cloned per request
#[derive(Debug, Clone)]
pub struct AppState {
    pub services: Services,
    pub accounts: AccountService,
    /// Live socket rooms; also the publisher behind `services`
    pub rooms: Arc<RoomRegistry>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// State with federated login disabled and reset tokens logged
    #[must_use]
    pub fn new(config: ServerConfig, store: Arc<dyn Store>) -> Self {
        Self::with_auth_providers(
            config,
            store,
            Arc::new(FederatedLoginDisabled),
            Arc::new(LogResetTokens),
        )
    }

    /// State with explicit identity-provider and reset-delivery seams
    #[must_use]
    pub fn with_auth_providers(
        config: ServerConfig,
        store: Arc<dyn Store>,
        federated: Arc<dyn FederatedVerifier>,
        reset_sink: Arc<dyn ResetTokenSink>,
    ) -> Self {
        let rooms = Arc::new(RoomRegistry::new());
        let services = Services::new(Arc::clone(&store), rooms.clone(), config.workflow());
        let tokens = TokenIssuer::new(
            config.jwt_secret.as_bytes(),
            Duration::days(config.token_ttl_days),
        );
        let accounts = AccountService::new(
            store,
            tokens,
            federated,
            reset_sink,
            Duration::minutes(config.reset_token_ttl_minutes),
        );
        Self {
            services,
            accounts,
            rooms,
            config: Arc::new(config),
        }
    }
}
