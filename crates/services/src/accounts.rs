//! Registration, login and bearer-token authentication.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use domains::{AppError, AuthUser, PasswordHasher, Result, Role, TokenService, User, UserRepository};

pub const MIN_PASSWORD_LEN: usize = 8;
const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=32;

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user: AuthUser,
}

pub struct AccountService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self { users, hasher, tokens }
    }

    /// Creates a reader account and signs it in.
    pub async fn register(&self, credentials: Credentials) -> Result<Session> {
        let user = self.create_user(credentials, Role::User).await?;
        self.session_for(&user)
    }

    /// Creates the configured admin account unless the username is taken.
    /// Returns the new account, or `None` when it already existed.
    pub async fn ensure_admin(&self, credentials: Credentials) -> Result<Option<User>> {
        let username = credentials.username.clone();
        match self.create_user(credentials, Role::Admin).await {
            Ok(user) => Ok(Some(user)),
            Err(AppError::Conflict(_)) => {
                info!(%username, "admin account already present");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Creates an account with an explicit role.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn create_user(&self, credentials: Credentials, role: Role) -> Result<User> {
        let username = credentials.username.trim().to_string();
        validate_username(&username)?;
        if credentials.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let user = User {
            id: Uuid::now_v7(),
            username,
            password_hash: self.hasher.hash_password(&credentials.password).await?,
            role,
            created_at: Utc::now(),
        };
        self.users.insert_user(&user).await?;
        info!(user_id = %user.id, role = %user.role, "account created");
        Ok(user)
    }

    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: Credentials) -> Result<Session> {
        let rejected = || AppError::Unauthorized("invalid username or password".into());
        let Some(user) = self
            .users
            .find_user_by_username(credentials.username.trim())
            .await?
        else {
            warn!("login for unknown user");
            return Err(rejected());
        };
        if !self
            .hasher
            .verify_password(&credentials.password, &user.password_hash)
            .await?
        {
            warn!(user_id = %user.id, "login with wrong password");
            return Err(rejected());
        }
        self.session_for(&user)
    }

    /// Resolves a bearer token to its principal.
    pub fn authenticate(&self, token: &str) -> Result<AuthUser> {
        self.tokens.verify(token)
    }

    fn session_for(&self, user: &User) -> Result<Session> {
        let principal = user.principal();
        Ok(Session {
            token: self.tokens.issue(&principal)?,
            user: principal,
        })
    }
}

fn validate_username(username: &str) -> Result<()> {
    let valid = USERNAME_LEN.contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::validation(
            "username must be 3 to 32 letters, digits or underscores",
        ))
    }
}
