use clap::Parser;
use solmate_core::chain::{ActivityProvider, SolanaRpcProvider, TrustingVerifier};
use solmate_core::config::AppConfig;
use solmate_core::{init_logging, SystemClock};
use solmate_io::{AssetCatalog, SqliteStore};
use solmate_lib::{jobs, router, AppState, SolmateService};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Parser, Debug)]
#[command(author, version, about = "Solmate virtual pet backend", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Overrides the configured listen port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging();

    let mut config = AppConfig::load(&args.config)?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;
    tracing::info!(fingerprint = %config.fingerprint(), "Configuration loaded");

    let store = match SqliteStore::open(&config.database.path) {
        Ok(s) => {
            tracing::info!(path = %config.database.path.display(), "Database ready");
            s
        }
        Err(e) => {
            tracing::error!("Failed to initialize storage: {}", e);
            std::process::exit(1);
        }
    };

    let service = Arc::new(SolmateService::new(
        Arc::new(store),
        Arc::new(SystemClock),
        AssetCatalog::new(&config.assets.dir),
    ));

    if config.chain.recipient_pubkey.is_none() {
        tracing::warn!("No RECIPIENT_PUBLIC_KEY set, purchases are accepted without on-chain checks");
    }
    let state = Arc::new(AppState {
        service: Arc::clone(&service),
        verifier: Arc::new(TrustingVerifier),
    });

    let provider = config.chain.rpc_url.as_ref().map(|url| {
        Arc::new(SolanaRpcProvider::new(url.clone(), config.jobs.max_tx_to_check))
            as Arc<dyn ActivityProvider>
    });
    let _jobs = jobs::spawn_scheduler(Arc::clone(&service), config.jobs.clone(), provider);

    let app = router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Solmate server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
