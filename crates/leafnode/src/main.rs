//! leafnode - metadata enrichment service for a book and film library

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::{Config, LoggingConfig};
use leafnode_api::{AppState, create_router};
use leafnode_auth::{InternalSecret, JwtManager, hash_password};
use leafnode_core::{FanOut, SystemClock};
use leafnode_db::{Database, NewUser, UserRole};
use leafnode_jobs::{JobCatalog, ProviderSet};
use leafnode_providers::{HttpJobInvoker, build_invoker_client};

/// leafnode - enriches library rows with covers, posters, trailers and links
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "LEAFNODE_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "LEAFNODE_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_logging(&config.logging);

    info!("Starting leafnode v{}", env!("CARGO_PKG_VERSION"));

    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    // Initialize database
    if let Some(parent) = std::path::Path::new(&config.database.path).parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    let db_url = format!("sqlite:{}?mode=rwc", config.database.path);
    let db = Database::new(&db_url).await?;

    ensure_admin_user(&db, &config).await?;

    // Initialize providers and jobs
    let provider_config = config.provider_set_config();
    let providers = Arc::new(ProviderSet::build(&provider_config, Arc::new(SystemClock))?);
    let jobs = JobCatalog::new(db.clone(), providers, config.job_settings()?);

    let internal_secret = InternalSecret::new(&config.auth.internal_secret);
    let fanout = create_fanout(&config, &provider_config.http)?;

    let jwt = Arc::new(JwtManager::new(
        &config.auth.jwt_secret,
        config.auth.token_expiry_hours,
    ));

    let state = AppState::new(
        db,
        jobs,
        fanout,
        jwt,
        internal_secret,
        config.auth.enabled,
    );

    let app = create_router(state, Some(Arc::new(metrics_handle)));

    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .context("Invalid bind address")?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Create the admin user on first start
async fn ensure_admin_user(db: &Database, config: &Config) -> Result<()> {
    if db.has_users().await? {
        return Ok(());
    }

    let password = match &config.auth.admin_password {
        Some(password) if !password.is_empty() => password.clone(),
        _ => {
            warn!("auth.admin_password not set, creating admin user with password 'admin'");
            "admin".to_string()
        }
    };

    info!("Creating default admin user");
    db.insert_user(NewUser {
        username: "admin".to_string(),
        password_hash: hash_password(&password)?,
        role: UserRole::Admin,
    })
    .await?;
    Ok(())
}

/// Fan-out posts to the job endpoints with the internal secret, so it
/// needs that secret configured
fn create_fanout(config: &Config, http: &leafnode_providers::HttpConfig) -> Result<FanOut> {
    if !config.fanout.enabled {
        info!("Fan-out disabled by configuration");
        return Ok(FanOut::disabled());
    }
    if config.auth.internal_secret.is_empty() {
        warn!("auth.internal_secret not set, fan-out to sibling jobs is disabled");
        return Ok(FanOut::disabled());
    }

    let client = build_invoker_client(http).context("Failed to build fan-out HTTP client")?;
    let base_url = config.fanout_base_url();
    info!("Fan-out enabled via {}", base_url);

    Ok(FanOut::new(Arc::new(HttpJobInvoker::new(
        client,
        base_url,
        config.auth.internal_secret.clone(),
    ))))
}

/// Initialize logging
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format.eq_ignore_ascii_case("json") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
