use anyhow::Result;
use linkledger::{
    config::Config,
    scraping::{browser::ChromeConfig, ChromeBrowser, ExtractionCoordinator},
    store::RecordStore,
};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn run_extraction(config: Config, selected: Vec<String>) -> Result<()> {
    if config.sources.is_empty() {
        anyhow::bail!("No sources configured; add a [sources.NAME] section");
    }

    let store = Arc::new(RecordStore::new(&config.storage.table_path));
    let browser = Arc::new(ChromeBrowser::new(ChromeConfig::from(&config.browser)));
    let coordinator = ExtractionCoordinator::new(config.sources.clone(), browser, store);

    info!("Extracting into {}", config.storage.table_path.display());
    let summary = if selected.is_empty() {
        coordinator.process_all().await?
    } else {
        coordinator.process_selected(&selected).await?
    };

    print!("{}", summary);
    let failed = summary.failed();
    if !failed.is_empty() {
        warn!("{} of {} sources failed", failed.len(), summary.attempted());
    }

    Ok(())
}
