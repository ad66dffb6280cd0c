use anyhow::Result;
use linkledger::{config::Config, http::HttpServer, store::RecordStore};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

pub async fn serve(config: Config, listen: Option<String>) -> Result<()> {
    let mut http_config = config.http.clone();
    if let Some(listen) = listen {
        http_config.listen_addr = listen;
    }

    let store = Arc::new(RecordStore::new(&config.storage.table_path));
    let server = HttpServer::new(http_config, store);

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C");
            let _ = shutdown_tx.send(());
        }
    });

    server.run(shutdown_rx).await
}
