#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use gantt_store::{GanttStore, StoreConfig, http_api, logging};

    let _logger = logging::init_logging(logging::DEFAULT_LOG_SPEC)?;

    let addr: SocketAddr = std::env::var("GANTT_STORE_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;

    let config = StoreConfig::from_env()?;
    let store = GanttStore::from_config(&config)?;
    log::info!(
        "event=http_start addr={} key={} tasks={}",
        addr,
        config.storage_key,
        store.tasks().len()
    );

    println!("gantt-store HTTP API listening on http://{addr}");
    http_api::serve(addr, store).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
