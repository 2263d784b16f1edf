//! Account flows: registration, login, federated login, password reset,
//! and bearer-token resolution

use super::password::{hash_password_blocking, verify_password_blocking};
use super::token::TokenIssuer;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::RngCore;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use taskflow_core::{Actor, Role, Store, User, UserSummary, WorkflowError, WorkflowResult};

/// Identity asserted by an external provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedIdentity {
    /// Provider-side subject
    pub subject: String,
    pub email: String,
    pub name: String,
}

/// Verifies a credential issued by an external identity provider
#[async_trait]
pub trait FederatedVerifier: Send + Sync {
    /// # Errors
    /// - `Authentication` when the credential is rejected
    /// - `Internal` when the provider cannot be reached
    async fn verify(&self, credential: &str) -> WorkflowResult<FederatedIdentity>;
}

/// Verifier used when no provider is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct FederatedLoginDisabled;

#[async_trait]
impl FederatedVerifier for FederatedLoginDisabled {
    async fn verify(&self, _credential: &str) -> WorkflowResult<FederatedIdentity> {
        Err(WorkflowError::Authentication(
            "Federated login is not configured".to_string(),
        ))
    }
}

/// Delivers a plaintext password-reset token to its owner
#[async_trait]
pub trait ResetTokenSink: Send + Sync {
    async fn deliver(&self, user: &User, token: &str);
}

/// Records that a reset token was issued; the token itself is never logged
#[derive(Debug, Default, Clone, Copy)]
pub struct LogResetTokens;

#[async_trait]
impl ResetTokenSink for LogResetTokens {
    async fn deliver(&self, user: &User, _token: &str) {
        tracing::info!(user = %user.id, "password reset token issued, no delivery channel configured");
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub password: Option<String>,
}

/// Session established by a successful login
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn invalid_credentials() -> WorkflowError {
    WorkflowError::Authentication("Invalid email or password".to_string())
}

fn invalid_reset_token() -> WorkflowError {
    WorkflowError::validation("Token is invalid or has expired")
}

/// Account operations over the user store
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    tokens: TokenIssuer,
    federated: Arc<dyn FederatedVerifier>,
    reset_sink: Arc<dyn ResetTokenSink>,
    reset_ttl: Duration,
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService")
            .field("tokens", &self.tokens)
            .field("reset_ttl", &self.reset_ttl)
            .finish_non_exhaustive()
    }
}

impl AccountService {
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        tokens: TokenIssuer,
        federated: Arc<dyn FederatedVerifier>,
        reset_sink: Arc<dyn ResetTokenSink>,
        reset_ttl: Duration,
    ) -> Self {
        Self {
            store,
            tokens,
            federated,
            reset_sink,
            reset_ttl,
        }
    }

    /// Create an account; the display name is `firstName lastName`
    ///
    /// # Errors
    /// - `Validation` if email or password is missing
    /// - `Conflict` if the email is taken
    pub async fn register(&self, request: RegisterRequest) -> WorkflowResult<User> {
        let (Some(email), Some(password)) = (required(request.email), request.password.filter(|p| !p.is_empty()))
        else {
            return Err(WorkflowError::validation("Please provide email and password"));
        };
        if self.store.user_by_email(&email).await?.is_some() {
            return Err(WorkflowError::Conflict("User already exists".to_string()));
        }

        let name = format!(
            "{} {}",
            request.first_name.unwrap_or_default().trim(),
            request.last_name.unwrap_or_default().trim()
        )
        .trim()
        .to_string();
        let mut user = User::new(name, email, request.role.unwrap_or_default());
        user.password_hash = Some(hash_password_blocking(password).await?);

        let user = self.store.insert_user(user).await?;
        tracing::info!(user = %user.id, role = user.role.as_str(), "user registered");
        Ok(user)
    }

    /// Exchange email and password for an access token
    ///
    /// # Errors
    /// - `Authentication` "Invalid email or password" for unknown email or
    ///   wrong password alike
    pub async fn login(&self, request: LoginRequest) -> WorkflowResult<Session> {
        let (Some(email), Some(password)) = (required(request.email), request.password) else {
            return Err(invalid_credentials());
        };
        let user = self
            .store
            .user_by_email(&email)
            .await?
            .ok_or_else(invalid_credentials)?;
        let Some(hash) = user.password_hash.clone() else {
            return Err(invalid_credentials());
        };
        if !verify_password_blocking(password, hash).await {
            return Err(invalid_credentials());
        }

        let token = self.tokens.issue(&user)?;
        tracing::info!(user = %user.id, "user logged in");
        Ok(Session { token, user })
    }

    /// Log in with an external provider credential
    ///
    /// Matches by provider subject, then links an existing account by email,
    /// then creates a verified account without a password.
    ///
    /// # Errors
    /// - `Validation` if the credential is missing
    /// - whatever the verifier reports
    pub async fn federated_login(&self, credential: Option<String>) -> WorkflowResult<Session> {
        let credential = required(credential)
            .ok_or_else(|| WorkflowError::validation("Please provide a credential"))?;
        let identity = self.federated.verify(&credential).await?;

        let user = if let Some(user) = self.store.user_by_google_id(&identity.subject).await? {
            user
        } else if let Some(mut user) = self.store.user_by_email(&identity.email).await? {
            user.google_id = Some(identity.subject);
            user.is_verified = true;
            let user = self.store.update_user(user).await?;
            tracing::info!(user = %user.id, "federated identity linked");
            user
        } else {
            let mut user = User::new(identity.name, identity.email, Role::User);
            user.google_id = Some(identity.subject);
            user.is_verified = true;
            let user = self.store.insert_user(user).await?;
            tracing::info!(user = %user.id, "user registered via federated login");
            user
        };

        let token = self.tokens.issue(&user)?;
        Ok(Session { token, user })
    }

    /// Start a password reset; silent when the email is unknown
    ///
    /// # Errors
    /// - `Validation` if the email is missing
    pub async fn forgot_password(&self, email: Option<String>) -> WorkflowResult<()> {
        let email = required(email).ok_or_else(|| WorkflowError::validation("Please provide an email"))?;
        let Some(mut user) = self.store.user_by_email(&email).await? else {
            tracing::debug!("password reset requested for unknown email");
            return Ok(());
        };

        let mut raw = [0u8; 32];
        rand::rng().fill_bytes(&mut raw);
        let token = hex::encode(raw);
        user.reset_token_hash = Some(hash_reset_token(&token));
        user.reset_token_expires_at = Some(Utc::now() + self.reset_ttl);
        let user = self.store.update_user(user).await?;

        self.reset_sink.deliver(&user, &token).await;
        Ok(())
    }

    /// Check that a reset token is outstanding and unexpired
    ///
    /// # Errors
    /// - `Validation` if the token is unknown or expired
    pub async fn validate_reset_token(&self, token: &str) -> WorkflowResult<()> {
        self.reset_candidate(token).await.map(|_| ())
    }

    /// Replace the password using a reset token; the account becomes verified
    ///
    /// # Errors
    /// - `Validation` if a field is missing or the token is unknown or expired
    pub async fn reset_password(&self, request: ResetPasswordRequest) -> WorkflowResult<()> {
        let (Some(token), Some(password)) = (required(request.token), request.password.filter(|p| !p.is_empty()))
        else {
            return Err(WorkflowError::validation("Please provide token and password"));
        };
        let mut user = self.reset_candidate(&token).await?;

        user.password_hash = Some(hash_password_blocking(password).await?);
        user.reset_token_hash = None;
        user.reset_token_expires_at = None;
        user.is_verified = true;
        let user = self.store.update_user(user).await?;
        tracing::info!(user = %user.id, "password reset");
        Ok(())
    }

    /// Display fields of every account
    pub async fn list_users(&self) -> WorkflowResult<Vec<UserSummary>> {
        Ok(self
            .store
            .users()
            .await?
            .iter()
            .map(User::summary)
            .collect())
    }

    /// Resolve a bearer token to the acting user
    ///
    /// # Errors
    /// - `Authentication` if the token is invalid or its user is gone
    pub async fn authenticate(&self, token: &str) -> WorkflowResult<Actor> {
        let claims = self.tokens.verify(token)?;
        let user = self.store.user(claims.sub).await?.ok_or_else(|| {
            WorkflowError::Authentication(
                "The user belonging to this token no longer exists.".to_string(),
            )
        })?;
        Ok(Actor::new(user.id, user.role))
    }

    async fn reset_candidate(&self, token: &str) -> WorkflowResult<User> {
        let user = self
            .store
            .user_by_reset_token(&hash_reset_token(token))
            .await?
            .ok_or_else(invalid_reset_token)?;
        match user.reset_token_expires_at {
            Some(expires) if expires > Utc::now() => Ok(user),
            _ => Err(invalid_reset_token()),
        }
    }
}
