//! HTTP server
//!
//! Serves the onboarding pages and the form API:
//! - Form pages rendered against the signed-in member's record
//! - Form submission through the validate, reconcile, merge pipeline
//! - Raw form documents for client-side use
//! - A sudo-gated admin API over member records

pub mod admin;
pub mod page;
pub mod routes;
pub mod session;

use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tokio::sync::Mutex;
use tower_http::services::ServeDir;
use tracing::{error, info};

use crate::auth::SessionKeys;
use crate::config::Config;
use crate::error::Result;
use crate::kennelish::FormLoader;
use crate::member::MemberStore;

pub use session::{Admin, Member};

/// State shared across handlers
pub struct AppState {
    pub config: Config,
    pub forms: FormLoader,
    pub store: Mutex<MemberStore>,
    pub sessions: SessionKeys,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Open the forms directory, the member store and the session keys.
    pub fn new(config: Config) -> Result<Self> {
        let forms = FormLoader::new(&config.forms.dir)?;
        let store = MemberStore::open(&config.store.path)?;
        info!(members = store.count()?, "Member store ready");

        let sessions = SessionKeys::new(&config.auth.jwt_secret, config.auth.lifetime_secs)?
            .with_sudo_lifetime(config.auth.sudo_lifetime_secs);

        Ok(Self {
            config,
            forms,
            store: Mutex::new(store),
            sessions,
        })
    }
}

/// Create the application router
pub fn create_router(state: SharedState) -> Router {
    let static_files = ServeDir::new(&state.config.server.static_dir);

    Router::new()
        // Pages
        .route("/join", get(routes::join_start))
        .route("/join/:step", get(routes::join_page))
        .route("/profile", get(routes::profile))
        .route("/final", get(routes::final_page))
        .route("/logout", get(routes::logout))
        // API endpoints
        .route("/api", get(routes::api_info))
        .route(
            "/api/form/:step",
            get(routes::form_document).post(routes::submit_form),
        )
        // Admin API
        .route(
            "/admin/get",
            get(admin::get_member).post(admin::edit_member),
        )
        .route("/admin/get_by_snowflake", get(admin::get_by_snowflake))
        .route("/admin/list", get(admin::list_members))
        // Health check
        .route("/health", get(routes::health))
        // Static files
        .nest_service("/static", static_files)
        .with_state(state)
}

/// Serve until Ctrl+C or SIGTERM.
pub async fn run(config: Config) -> Result<()> {
    let listen = config.server.listen.clone();
    let state = Arc::new(AppState::new(config)?);
    let app = create_router(state);

    let listener = TcpListener::bind(&listen).await?;
    info!("Onboarding server listening on http://{}", listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
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
