//! Integration tests for linkledger
//!
//! These tests drive the extraction pipeline end to end against a table in a
//! temp directory, with an in-memory browser in place of Chrome.

use async_trait::async_trait;
use linkledger::{
    config::{Config, SourceSpec},
    scraping::{Browser, ExtractionCoordinator, ExtractionError},
    store::{table, RecordStore},
    types::RecordDraft,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tempfile::TempDir;

/// Browser returning canned links per entry URL
struct CannedBrowser {
    pages: HashMap<String, Vec<String>>,
}

impl CannedBrowser {
    fn new(pages: Vec<(&str, Vec<&str>)>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|(url, links)| (url.to_string(), links.iter().map(|l| l.to_string()).collect()))
                .collect(),
        }
    }
}

#[async_trait]
impl Browser for CannedBrowser {
    async fn run(&self, source_url: &str, _script: &str) -> Result<Vec<String>, ExtractionError> {
        self.pages
            .get(source_url)
            .cloned()
            .ok_or_else(|| ExtractionError::Script(format!("no page at {}", source_url)))
    }
}

fn sources(entries: Vec<(&str, SourceSpec)>) -> BTreeMap<String, SourceSpec> {
    entries
        .into_iter()
        .map(|(name, spec)| (name.to_string(), spec))
        .collect()
}

#[tokio::test]
async fn test_normalized_duplicates_collapse_into_one_record() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(RecordStore::new(dir.path().join("links.csv")));
    let browser = CannedBrowser::new(vec![(
        "https://board.example/search",
        vec!["https://x/1?searchId=a", "https://x/1?searchId=b", "https://x/2"],
    )]);
    let coordinator = ExtractionCoordinator::new(
        sources(vec![(
            "board",
            SourceSpec::new("https://board.example/search", "links()").with_normalization_params(["searchId"]),
        )]),
        Arc::new(browser),
        store.clone(),
    );

    let summary = coordinator.process_all().await.unwrap();
    assert_eq!(summary.total_new(), 2);
    assert!(summary.failed().is_empty());

    let records = store.read_all().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, 1);
    assert_eq!(records[0].url, "https://x/1?searchId=a");
    assert_eq!(records[1].id, 2);
    assert_eq!(records[1].url, "https://x/2");
    assert!(records.iter().all(|r| r.source == "board" && !r.archived && r.cost.is_empty()));
}

#[tokio::test]
async fn test_extraction_extends_legacy_table() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("links.csv");
    std::fs::write(
        &path,
        "id,source,cost,url,dateAdded,seen,ok,called,active,archived\n\
         3,board,,https://x/3,1600000000,true,false,false,false,false\n\
         7,board,10,https://x/7?sid=old,1600000100,true,true,false,false,true\n",
    )
    .unwrap();
    let store = Arc::new(RecordStore::new(&path));
    assert_eq!(store.highest_id().unwrap(), 7);

    let browser = CannedBrowser::new(vec![(
        "https://board.example/",
        vec!["https://x/7?sid=new", "https://x/3", "https://x/8", "mailto:someone@x", "https://x/9"],
    )]);
    let coordinator = ExtractionCoordinator::new(
        sources(vec![(
            "board",
            SourceSpec::new("https://board.example/", "links()").with_normalization_params(["sid"]),
        )]),
        Arc::new(browser),
        store.clone(),
    );

    let summary = coordinator.process_all().await.unwrap();
    assert_eq!(summary.total_new(), 2);

    let records = store.read_all().unwrap();
    let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![3, 7, 8, 9]);
    assert_eq!(records[2].url, "https://x/8");
    assert_eq!(records[3].url, "https://x/9");
    // existing rows come back untouched
    assert!(records[1].archived);
    assert_eq!(records[1].cost, "10");
}

#[tokio::test]
async fn test_failed_source_leaves_table_unchanged() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(RecordStore::new(dir.path().join("links.csv")));
    store
        .append_new(vec![RecordDraft::new("manual", "https://x/1", 1_600_000_000)])
        .unwrap();
    let before = std::fs::read_to_string(store.path()).unwrap();

    let coordinator = ExtractionCoordinator::new(
        sources(vec![("gone", SourceSpec::new("https://gone.example/", "links()"))]),
        Arc::new(CannedBrowser::new(vec![])),
        store.clone(),
    );

    let summary = coordinator.process_all().await.unwrap();
    assert_eq!(summary.attempted(), 1);
    assert_eq!(summary.failed().len(), 1);
    assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
}

#[tokio::test]
async fn test_review_edits_survive_the_next_run() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(RecordStore::new(dir.path().join("links.csv")));
    let browser = CannedBrowser::new(vec![("https://board.example/", vec!["https://x/1", "https://x/2"])]);
    let coordinator = ExtractionCoordinator::new(
        sources(vec![("board", SourceSpec::new("https://board.example/", "links()"))]),
        Arc::new(browser),
        store.clone(),
    );
    coordinator.process_all().await.unwrap();

    let mut reviewed = store.read_all().unwrap()[0].clone();
    reviewed.seen = true;
    reviewed.archived = true;
    store.upsert_by_key(vec![reviewed.clone()]).unwrap();

    let summary = coordinator.process_all().await.unwrap();
    assert_eq!(summary.total_new(), 0);
    assert_eq!(store.read_all().unwrap()[0], reviewed);
}

#[test]
fn test_table_text_round_trips_through_store() {
    let dir = TempDir::new().unwrap();
    let store = RecordStore::new(dir.path().join("links.csv"));
    store
        .append_new(vec![
            RecordDraft::new("board", "https://x/1?q=a,b", 1_700_000_000),
            RecordDraft::new("feed \"main\"", "https://y/1", 1_700_000_001),
        ])
        .unwrap();

    let text = store.read_text().unwrap();
    let mirror = RecordStore::new(dir.path().join("mirror.csv"));
    mirror.write_all(&table::parse_table(&text)).unwrap();
    assert_eq!(mirror.read_all().unwrap(), store.read_all().unwrap());
}

#[test]
fn test_sample_sources_validate() {
    let config: Config = toml::from_str(
        r#"
[sources.board]
url = "https://board.example/search"
extraction_command = "links()"
normalization_params = ["searchId"]
"#,
    )
    .unwrap();
    config.validate().unwrap();
    assert_eq!(config.source("board").unwrap().normalization_params, vec!["searchId"]);
}
