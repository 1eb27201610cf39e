//! Creates the first admin account in the configured Postgres database.
//!
//! ```sh
//! INKWELL_ADMIN_PASSWORD='...' seed <username>
//! ```
//!
//! Migrations are applied first, so this also prepares an empty database.
//! The in-memory store takes its admin from the `admin` settings instead.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use secrecy::ExposeSecret;
use tracing::info;
use tracing_subscriber::EnvFilter;

use auth_adapters::{Argon2PasswordHasher, JwtTokenService};
use configs::Settings;
use services::{AccountService, Credentials};
use storage_adapters::PgStore;

const PASSWORD_VAR: &str = "INKWELL_ADMIN_PASSWORD";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let Some(username) = std::env::args().nth(1) else {
        bail!("usage: {PASSWORD_VAR}=<password> seed <username>");
    };
    let password = std::env::var(PASSWORD_VAR).with_context(|| format!("{PASSWORD_VAR} is not set"))?;

    let settings = Settings::load().context("loading settings")?;
    let store = Arc::new(
        PgStore::connect(
            settings.database.url.expose_secret(),
            settings.database.max_connections,
        )
        .await
        .context("connecting to postgres")?,
    );
    store.migrate().await.context("running migrations")?;

    let accounts = AccountService::new(
        store,
        Arc::new(Argon2PasswordHasher::new()),
        Arc::new(JwtTokenService::new(
            &settings.auth.jwt_secret,
            settings.auth.issuer.clone(),
            settings.auth.token_ttl_minutes,
        )),
    );

    if let Some(user) = accounts
        .ensure_admin(Credentials { username, password })
        .await
        .context("creating admin account")?
    {
        info!(user_id = %user.id, username = %user.username, "admin account created");
    }
    Ok(())
}
