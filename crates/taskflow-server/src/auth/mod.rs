//! Identity context
//!
//! - Argon2 password hashing
//! - HS256 access tokens carrying `{sub, role, name}`
//! - Account flows (register, login, federated login, password reset)
//! - The [`Authenticated`] extractor resolving a bearer token to an actor

mod account;
mod extract;
mod password;
mod token;

pub use account::{
    AccountService, FederatedIdentity, FederatedLoginDisabled, FederatedVerifier, LoginRequest,
    LogResetTokens, RegisterRequest, ResetPasswordRequest, ResetTokenSink, Session,
};
pub use extract::Authenticated;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenIssuer};
