use anyhow::Result;
use linkledger::{
    config::Config,
    store::RecordStore,
    util::{format_timestamp, truncate_str},
};

pub fn list_records(config: &Config, source: Option<&str>, all: bool) -> Result<()> {
    let store = RecordStore::new(&config.storage.table_path);
    let records: Vec<_> = store
        .read_all()?
        .into_iter()
        .filter(|r| all || !r.archived)
        .filter(|r| source.map_or(true, |s| r.source == s))
        .collect();

    if records.is_empty() {
        println!("No records.");
        return Ok(());
    }

    println!(
        "{:>6}  {:<16}  {:<16}  {:<5}  {}",
        "ID", "SOURCE", "ADDED", "FLAGS", "URL"
    );
    for record in &records {
        let flags: String = [
            (record.seen, 's'),
            (record.ok, 'o'),
            (record.called, 'c'),
            (record.active, 'a'),
            (record.archived, 'x'),
        ]
        .iter()
        .map(|&(set, c)| if set { c } else { '.' })
        .collect();

        println!(
            "{:>6}  {:<16}  {:<16}  {:<5}  {}",
            record.id,
            truncate_str(&record.source, 16),
            format_timestamp(record.date_added),
            flags,
            truncate_str(&record.url, 100)
        );
    }
    println!("\n{} records", records.len());

    Ok(())
}
