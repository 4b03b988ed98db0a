//! LoanDesk Backend Server
//!
//! Serves the loan application API: applicants submit requests, admins review,
//! approve, reject or delete them, and applicants are emailed on every decision.

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use loandesk_server::account_service::AccountService;
use loandesk_server::auth::TokenVerifier;
use loandesk_server::config::Config;
use loandesk_server::loan_service::{LoanService, LoanServiceConfig};
use loandesk_server::notify::{HttpMailNotifier, LogNotifier, Notifier};
use loandesk_server::state::AppState;
use loandesk_server::store::{self, PgLoanStore, PgUserStore};
use loandesk_server::{middleware, routes};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    if let Err(e) = run(config).await {
        tracing::error!(error = %format!("{:#}", e), "Server terminated with error");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        environment = config.environment.as_str(),
        "Starting LoanDesk API server"
    );

    let db_pool = store::connect(&config)
        .await
        .context("loan database setup failed")?;

    let loans = Arc::new(PgLoanStore::new(db_pool.clone()));
    let users = Arc::new(PgUserStore::new(db_pool.clone()));

    // One notifier for the whole process
    let notifier: Arc<dyn Notifier> =
        match HttpMailNotifier::from_config(&config.mail, config.notify_timeout())
            .context("mail relay client setup failed")?
        {
            Some(mailer) => {
                tracing::info!("Mail relay notifier configured");
                Arc::new(mailer)
            }
            None => {
                tracing::warn!("MAIL_API_URL not set, notifications will only be logged");
                Arc::new(LogNotifier)
            }
        };

    let loan_service = Arc::new(LoanService::new(
        loans,
        users.clone(),
        notifier.clone(),
        LoanServiceConfig {
            support_phone: config.support_phone.clone(),
            notify_timeout: config.notify_timeout(),
            allow_retransition: config.allow_retransition,
        },
    ));
    let account_service = Arc::new(AccountService::new(
        users,
        notifier,
        config.notify_timeout(),
    ));
    let token_verifier = Arc::new(TokenVerifier::new(config.jwt_secret.clone()));

    let app_state = AppState::new(loan_service, account_service, token_verifier);

    let mut app = routes::app(app_state)
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_tracing));

    if config.environment.is_production() {
        app = app.layer(axum::middleware::from_fn(middleware::hsts_header));
    }

    let app = app.layer(configure_cors(config.cors_allowed_origins.as_deref()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let allowed_origins_str = allowed_origins.unwrap_or_default();

    if allowed_origins_str.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins_str
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
