use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use cardex::{gc, http, Config, QuadStore, SparqlClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = match std::env::var("CARDEX_CONFIG") {
        Ok(path) => Config::from_file(&path)?,
        Err(_) => Config::default(),
    };
    let layout = config.layout()?;
    info!(
        records_graph = %layout.records_graph(),
        endpoint = %config.query_endpoint,
        "starting cardex v{}",
        cardex::VERSION
    );

    let store: Arc<dyn QuadStore> = Arc::new(SparqlClient::new(
        &config.query_endpoint,
        &config.update_endpoint,
    ));

    // Scheduled sweep: one background task beside the request
    // handlers. A failed sweep is retried wholesale on the next tick;
    // the sweep is idempotent, so that is all the recovery needed.
    let sweep_store = Arc::clone(&store);
    let sweep_layout = layout.clone();
    let sweep_config = config.clone();
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(sweep_config.sweep_interval_secs));
        interval.tick().await;
        loop {
            interval.tick().await;
            let cutoff = sweep_config.default_cutoff();
            match gc::collect_garbage(&*sweep_store, &sweep_layout, cutoff).await {
                Ok(()) => {}
                Err(e) => warn!(error = %e, "scheduled sweep failed, retrying next run"),
            }
        }
    });

    http::serve(config, layout, store).await
}
