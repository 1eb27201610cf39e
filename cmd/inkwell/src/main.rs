//! Inkwell server: loads settings, wires the adapters selected by
//! configuration into the services, and serves the HTTP API until Ctrl-C or
//! SIGTERM.

#[cfg(not(all(feature = "web-axum", feature = "auth-jwt")))]
compile_error!("the inkwell server needs the `web-axum` and `auth-jwt` features");

use std::sync::Arc;

use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use api_adapters::{build_router, AppState, PageLimits, Ports};
use auth_adapters::{Argon2PasswordHasher, JwtTokenService};
use configs::{AdminSettings, LogFormat, LogSettings, Settings, StorageBackend};
use domains::{
    ChapterRepository, CommentRepository, PasswordHasher, StoryRepository, TokenService,
    UserRepository,
};
use services::Credentials;
use storage_adapters::MemoryStore;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load().context("loading settings")?;
    init_tracing(&settings.log);

    let ports = build_ports(&settings).await?;
    let state = AppState::new(
        ports,
        PageLimits {
            default_page_size: settings.catalog.default_page_size,
            max_page_size: settings.catalog.max_page_size,
        },
    );
    if let Some(admin) = &settings.admin {
        bootstrap_admin(&state, admin).await?;
    }
    let app = build_router(state);

    let address = settings.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!(%address, storage = ?settings.storage, "inkwell listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("inkwell stopped");
    Ok(())
}

/// Works against whichever store was selected, so a fresh in-memory server
/// can be administered too.
async fn bootstrap_admin(state: &AppState, admin: &AdminSettings) -> Result<()> {
    let credentials = Credentials {
        username: admin.username.clone(),
        password: admin.password.expose_secret().to_string(),
    };
    if let Some(user) = state
        .accounts
        .ensure_admin(credentials)
        .await
        .context("creating the configured admin account")?
    {
        info!(user_id = %user.id, username = %user.username, "admin account created");
    }
    Ok(())
}

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let registry = tracing_subscriber::registry().with(filter);
    match log.format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

async fn build_ports(settings: &Settings) -> Result<Ports> {
    let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher::new());
    let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(
        &settings.auth.jwt_secret,
        settings.auth.issuer.clone(),
        settings.auth.token_ttl_minutes,
    ));

    match settings.storage {
        StorageBackend::Memory => {
            info!("using the in-memory store; data is lost on exit");
            Ok(ports_from(Arc::new(MemoryStore::new()), hasher, tokens))
        }
        StorageBackend::Postgres => postgres_ports(settings, hasher, tokens).await,
    }
}

#[cfg(feature = "db-postgres")]
async fn postgres_ports(
    settings: &Settings,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
) -> Result<Ports> {
    use storage_adapters::PgStore;

    let store = PgStore::connect(
        settings.database.url.expose_secret(),
        settings.database.max_connections,
    )
    .await
    .context("connecting to postgres")?;
    store.migrate().await.context("running migrations")?;
    Ok(ports_from(Arc::new(store), hasher, tokens))
}

#[cfg(not(feature = "db-postgres"))]
async fn postgres_ports(
    _settings: &Settings,
    _hasher: Arc<dyn PasswordHasher>,
    _tokens: Arc<dyn TokenService>,
) -> Result<Ports> {
    anyhow::bail!("storage = \"postgres\" needs a build with the `db-postgres` feature")
}

fn ports_from<S>(
    store: Arc<S>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
) -> Ports
where
    S: StoryRepository + ChapterRepository + CommentRepository + UserRepository + 'static,
{
    Ports {
        stories: store.clone(),
        chapters: store.clone(),
        comments: store.clone(),
        users: store,
        hasher,
        tokens,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "could not listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("received SIGTERM, shutting down");
            }
            Err(e) => {
                error!(error = %e, "could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
