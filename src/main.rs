use mimalloc::MiMalloc;
use qualimed::config::Config;
use qualimed::db::Database;
use qualimed::router::{QualimedState, cookie_key, qualimed_router};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        listen_addr = %cfg.listen_addr,
        loglevel = %cfg.loglevel,
        password_scheme = ?cfg.password_scheme
    );

    // Init before serve: a broken schema must never take requests.
    let db = Database::connect(&cfg.database_url, cfg.max_connections)
        .await
        .inspect_err(|e| error!(error = %e, "failed to open database"))?;
    db.initialize(cfg.password_scheme)
        .await
        .inspect_err(|e| error!(error = %e, "database initialization failed"))?;

    if cfg.cookie_key.is_none() {
        warn!("QUALIMED_COOKIE_KEY not set; sessions will not survive a restart");
    }
    let key = cookie_key(cfg.cookie_key.as_deref())?;

    let state = QualimedState::new(db.customers(cfg.password_scheme), key);
    let app = qualimed_router(state);

    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.pool().close().await;
    info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
