//! Darkroom server binary.
//!
//! Serves the store API. With a database URL configured it uses `PostgreSQL`
//! (migrations are run separately with `darkroom migrate`); without one it
//! keeps everything in memory, which is only suitable for development.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use darkroom_server::config::ServerConfig;
use darkroom_server::db::{self, Clock, Repositories, SystemClock};
use darkroom_server::payments::{PaymentGateway, StripeClient};
use darkroom_server::routes;
use darkroom_server::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ServerConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = ServerConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "darkroom_server=info,tower_http=debug".into());

    let json_layer = config
        .json_logs
        .then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!config.json_logs).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let repos = if let Some(database_url) = &config.database_url {
        let pool = db::create_pool(database_url)
            .await
            .expect("Failed to create database pool");
        tracing::info!("Database pool created");
        Repositories::postgres(&pool, &clock)
    } else {
        tracing::warn!("No database configured, using the in-memory store");
        Repositories::in_memory(Arc::clone(&clock))
    };

    if config.admin_token.is_none() {
        tracing::warn!("DARKROOM_ADMIN_TOKEN is not set, admin routes are unauthenticated");
    }
    if config.stripe.webhook_secret.is_none() {
        tracing::warn!("STRIPE_WEBHOOK_SECRET is not set, every webhook will be rejected");
    }

    let gateway: Arc<dyn PaymentGateway> = Arc::new(
        StripeClient::new(&config.stripe).expect("Failed to create Stripe client"),
    );

    let state = AppState::new(&config, repos, gateway, clock);
    let app = routes::app(state);

    let addr = config.socket_addr();
    tracing::info!("darkroom listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
