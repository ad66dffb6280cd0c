use anyhow::{Context, Result};
use linkledger::{
    config::Config,
    store::{table::Table, RecordStore},
    sync::{GistClient, RemoteSync},
};
use tracing::{info, warn};

pub async fn push(config: &Config) -> Result<()> {
    let store = RecordStore::new(&config.storage.table_path);
    let text = store.read_text()?;
    let client = GistClient::new(&config.sync)?;

    let gist_id = client.push(&text).await.context("Failed to push table")?;
    println!("Pushed {} to gist {}", config.storage.table_path.display(), gist_id);
    if config.sync.gist_id.is_none() {
        println!("Set `gist_id = \"{}\"` under [sync] to keep updating this gist", gist_id);
    }
    Ok(())
}

pub async fn pull(config: &Config, force: bool) -> Result<()> {
    let client = GistClient::new(&config.sync)?;
    let text = client.fetch().await.context("Failed to fetch table")?;

    let store = RecordStore::new(&config.storage.table_path);
    let count = replace_local(&store, &text, force)?;

    info!("Pulled {} records", count);
    println!(
        "Replaced {} with {} records from the gist",
        config.storage.table_path.display(),
        count
    );
    Ok(())
}

/// Replace the local table with `remote_text`. Refuses a remote table that
/// holds fewer records or a lower highest id than the local one, since that
/// would delete records, unless `force` is set.
fn replace_local(store: &RecordStore, remote_text: &str, force: bool) -> Result<usize> {
    let remote = Table::parse(remote_text);
    let local = store.read_table()?;

    let (remote_count, local_count) = (remote.record_count(), local.record_count());
    let (remote_max, local_max) = (remote.highest_id(), local.highest_id());
    if remote_count < local_count || remote_max < local_max {
        if !force {
            anyhow::bail!(
                "Remote table is behind the local one ({} records up to id {}, local has {} up to id {}); \
                 push first or pass --force to overwrite",
                remote_count,
                remote_max,
                local_count,
                local_max
            );
        }
        warn!(
            "Overwriting {} local records with {} remote records (--force)",
            local_count, remote_count
        );
    }

    store.write_table(&remote)?;
    Ok(remote_count)
}
