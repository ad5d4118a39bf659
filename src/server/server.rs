use crate::cli::ServeOpts;
use crate::config::Config;
use crate::server::routes;
use crate::store::DbManager;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};

/// Shared state for the API server.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: DbManager,
    pub http: reqwest::Client,
    pub files_root: PathBuf,
    pub shutdown_tx: broadcast::Sender<()>,
    pub start_time: std::time::Instant,
    pub version: String,
}

impl AppState {
    /// Assemble state around an already opened store.
    pub fn new(config: Config, db: DbManager) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.server.model_test_timeout_secs))
            .build()
            .context("building HTTP client")?;
        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            files_root: config.files_root(),
            config: Arc::new(config),
            db,
            http,
            shutdown_tx,
            start_time: std::time::Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }
}

/// The API server.
pub struct StudioServer {
    state: AppState,
    addr: SocketAddr,
}

impl StudioServer {
    /// Open the store, create its tables and resolve the bind address.
    pub async fn start(mut config: Config, opts: &ServeOpts) -> Result<Self> {
        if let Some(port) = opts.port {
            config.server.port = port;
        }
        if let Some(host) = opts.host.as_deref() {
            config.server.host = host.to_string();
        }

        let db_path = config.database_path();
        info!("Opening database at {}", db_path.display());
        let db = DbManager::open(&db_path)?;
        db.create_db_and_tables()
            .context("creating database tables")?;

        let addr = resolve_bind_address(&config.server.host, config.server.port).await?;
        let state = AppState::new(config, db)?;

        info!("Studio server binding to {}", addr);
        Ok(Self { state, addr })
    }

    /// Run the server until a shutdown signal is received.
    pub async fn run_until_shutdown(self) -> Result<()> {
        let app = routes::build_routes(self.state.clone());

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("binding {}", self.addr))?;
        info!(
            "agentstudio v{} listening on {}",
            self.state.version, self.addr
        );
        print_startup_banner(&self.state, &self.addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(self.state.shutdown_tx.clone()))
            .await?;

        info!("Studio server shut down gracefully");
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Trigger graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.state.shutdown_tx.send(());
    }
}

/// Wait for Ctrl+C, SIGTERM, or an explicit shutdown request.
async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    let mut requested = shutdown_tx.subscribe();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
        _ = requested.recv() => {
            info!("Shutdown requested");
            return;
        }
    }

    let _ = shutdown_tx.send(());
}

/// Resolve `host:port` to a socket address; host names are looked up.
async fn resolve_bind_address(host: &str, port: u16) -> Result<SocketAddr> {
    if let Ok(ip) = host.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }
    tokio::net::lookup_host((host, port))
        .await
        .with_context(|| format!("resolving bind host '{host}'"))?
        .next()
        .ok_or_else(|| anyhow::anyhow!("bind host '{host}' resolved to no addresses"))
}

fn print_startup_banner(state: &AppState, addr: &SocketAddr) {
    info!("-------------------------------------------");
    info!("  agentstudio v{}", state.version);
    info!("  Listening on: http://{}", addr);
    info!("  API: http://{}/api", addr);
    info!("  Health: http://{}/api/health", addr);
    info!("  Files: {}", state.files_root.display());
    info!("-------------------------------------------");
}
