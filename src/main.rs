use anyhow::Context;
use hypevault::{
    api, open_store, ActivitySource, BalanceFetcher, Config, HyperEvmClient, HyperliquidClient,
    PriceCache, PriceSource, Repository, SnapshotScheduler, ValuationService,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("Configuration error")?;
    let port = config.port;

    let store = open_store(&config)
        .await
        .with_context(|| format!("Failed to open store at {}", config.data_path))?;
    let repo = Arc::new(Repository::new(store));

    let hyperliquid = Arc::new(HyperliquidClient::new(
        config.hyperliquid_api_url.clone(),
        config.request_timeout,
    ));
    let hyperevm: Arc<dyn BalanceFetcher> = Arc::new(HyperEvmClient::new(
        config.hyperevm_rpc_url.clone(),
        config.hyperevm_token_contracts.clone(),
        config.request_timeout,
    ));
    let price_source: Arc<dyn PriceSource> = hyperliquid.clone();
    let prices = Arc::new(PriceCache::new(price_source, config.price_ttl));
    let valuation = Arc::new(ValuationService::new(
        hyperliquid.clone(),
        hyperevm,
        prices,
    ));
    let activity: Arc<dyn ActivitySource> = hyperliquid;

    let scheduler = Arc::new(SnapshotScheduler::new(
        repo.clone(),
        valuation.clone(),
        config.snapshot_interval,
        config.snapshot_warmup,
    ));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_task = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.run(shutdown_rx).await })
    };

    let state = api::AppState::new(repo, config, valuation, activity)
        .with_scheduler_state(scheduler.subscribe_state());
    let app = api::create_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    let _ = shutdown_tx.send(true);
    scheduler_task.await.context("Scheduler task panicked")?;
    Ok(())
}
