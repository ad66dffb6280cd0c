//! Core types for linkledger

use serde::{Deserialize, Serialize};

/// Record identifier, assigned by the store
pub type RecordId = u64;

/// One tracked link and its review flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Unique, never reused
    pub id: RecordId,
    /// Name of the source that produced the link
    pub source: String,
    /// Free-form note edited by reviewers
    #[serde(default)]
    pub cost: String,
    /// The link as extracted (not normalized)
    pub url: String,
    /// Unix timestamp (seconds) of creation
    pub date_added: i64,
    #[serde(default)]
    pub seen: bool,
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub called: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub archived: bool,
}

impl Record {
    /// Attach an id to a draft
    pub fn from_draft(id: RecordId, draft: RecordDraft) -> Self {
        Self {
            id,
            source: draft.source,
            cost: draft.cost,
            url: draft.url,
            date_added: draft.date_added,
            seen: draft.seen,
            ok: draft.ok,
            called: draft.called,
            active: draft.active,
            archived: draft.archived,
        }
    }
}

/// A record before id assignment
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordDraft {
    pub source: String,
    pub cost: String,
    pub url: String,
    pub date_added: i64,
    pub seen: bool,
    pub ok: bool,
    pub called: bool,
    pub active: bool,
    pub archived: bool,
}

impl RecordDraft {
    /// Draft for a freshly discovered link: empty cost, all flags cleared
    pub fn new(source: impl Into<String>, url: impl Into<String>, date_added: i64) -> Self {
        Self {
            source: source.into(),
            url: url.into(),
            date_added,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_draft_defaults() {
        let draft = RecordDraft::new("board", "https://x/1", 1_700_000_000);
        assert_eq!(draft.cost, "");
        assert!(!draft.seen && !draft.ok && !draft.called && !draft.active && !draft.archived);

        let record = Record::from_draft(4, draft);
        assert_eq!(record.id, 4);
        assert_eq!(record.source, "board");
        assert_eq!(record.date_added, 1_700_000_000);
    }

    #[test]
    fn test_json_field_names() {
        let record = Record::from_draft(1, RecordDraft::new("board", "https://x/1", 10));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["dateAdded"], 10);
        assert_eq!(value["archived"], false);

        let parsed: Record = serde_json::from_str(
            r#"{"id": 2, "source": "board", "url": "https://x/2", "dateAdded": 5, "seen": true}"#,
        )
        .unwrap();
        assert!(parsed.seen);
        assert!(!parsed.ok);
        assert_eq!(parsed.cost, "");
    }
}
