//! Comma-separated table codec for records
//!
//! The table is one header row followed by one row per record, columns in
//! [`COLUMNS`] order, booleans as lowercase `true`/`false`. Fields are written
//! bare unless they contain a comma, a double quote or a line break, in which
//! case they are quoted with inner quotes doubled. Plain data therefore stays
//! byte-identical to tables written without any quoting.
//!
//! Reading is lenient: columns are located by header name, extra columns are
//! ignored, missing columns take their defaults, and unknown boolean tokens
//! read as `false`. Rows without a usable id are not records, but they are
//! kept in place and written back with their fields intact.

use std::collections::HashMap;
use std::mem::take;

use tracing::warn;

use crate::types::{Record, RecordId};

/// Column names, in on-disk order
pub const COLUMNS: [&str; 10] = [
    "id", "source", "cost", "url", "dateAdded", "seen", "ok", "called", "active", "archived",
];

/// Header row as written to disk (including the line break)
pub fn header_line() -> String {
    let mut line = COLUMNS.join(",");
    line.push('\n');
    line
}

/* ---------------- Parsing ---------------- */

/// Split text into rows of fields. Quotes and CRLF tolerant; blank lines are
/// skipped and an unterminated quote runs to the end of the input.
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row: Vec<String> = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if matches!(chars.peek(), Some('"')) {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            ',' if !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(take(&mut field));
                if is_blank(&row) {
                    row.clear();
                } else {
                    rows.push(take(&mut row));
                }
            }
            _ => field.push(ch),
        }
    }

    row.push(field);
    if !is_blank(&row) {
        rows.push(row);
    }

    rows
}

fn is_blank(row: &[String]) -> bool {
    row.len() == 1 && row[0].trim().is_empty()
}

/// Position of each known column within a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    positions: [Option<usize>; 10],
}

impl ColumnMap {
    fn canonical() -> Self {
        let mut positions = [None; 10];
        for (i, slot) in positions.iter_mut().enumerate() {
            *slot = Some(i);
        }
        Self { positions }
    }

    /// Build a map from a header row, or `None` if the row is not a header
    fn from_header(row: &[String]) -> Option<Self> {
        let find = |name: &str| row.iter().position(|cell| cell.trim().eq_ignore_ascii_case(name));
        find("id")?;
        find("url")?;

        let mut positions = [None; 10];
        for (slot, name) in positions.iter_mut().zip(COLUMNS) {
            *slot = find(name);
        }
        Some(Self { positions })
    }

    fn get<'a>(&self, row: &'a [String], column: usize) -> Option<&'a str> {
        self.positions[column]
            .and_then(|i| row.get(i))
            .map(String::as_str)
    }
}

/// One data row of the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableRow {
    Record(Record),
    /// Row without a positive integer id, fields in [`COLUMNS`] order
    Unparsed(Vec<String>),
}

/// A parsed table, row order preserved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    rows: Vec<TableRow>,
}

impl Table {
    /// Parse table text. Never fails; rows without a valid id are kept as
    /// [`TableRow::Unparsed`] with a warning.
    pub fn parse(text: &str) -> Self {
        let mut rows = parse_rows(text).into_iter().peekable();

        let columns = match rows.peek().and_then(|first| ColumnMap::from_header(first)) {
            Some(map) => {
                rows.next();
                map
            }
            None => ColumnMap::canonical(),
        };

        let rows = rows
            .enumerate()
            .map(|(index, row)| match parse_record(&row, &columns) {
                Some(record) => TableRow::Record(record),
                None => {
                    warn!("Table row {} has no valid id, keeping it as-is: {:?}", index + 1, row);
                    TableRow::Unparsed(
                        (0..COLUMNS.len())
                            .map(|c| columns.get(&row, c).unwrap_or_default().to_string())
                            .collect(),
                    )
                }
            })
            .collect();

        Self { rows }
    }

    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            rows: records.into_iter().map(TableRow::Record).collect(),
        }
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Records in table order
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.rows.iter().filter_map(|row| match row {
            TableRow::Record(record) => Some(record),
            TableRow::Unparsed(_) => None,
        })
    }

    pub fn into_records(self) -> Vec<Record> {
        self.rows
            .into_iter()
            .filter_map(|row| match row {
                TableRow::Record(record) => Some(record),
                TableRow::Unparsed(_) => None,
            })
            .collect()
    }

    pub fn record_count(&self) -> usize {
        self.records().count()
    }

    /// Every non-empty url in the table, unparsed rows included
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(|row| match row {
                TableRow::Record(record) => record.url.as_str(),
                TableRow::Unparsed(fields) => fields.get(3).map_or("", String::as_str),
            })
            .filter(|url| !url.is_empty())
    }

    /// Largest record id, or 0 when there are no records
    pub fn highest_id(&self) -> RecordId {
        self.records().map(|r| r.id).max().unwrap_or(0)
    }

    pub fn push(&mut self, record: Record) {
        self.rows.push(TableRow::Record(record));
    }

    /// Replace records sharing an id with `updates`, keeping the stored
    /// `date_added`; append the rest. Returns (replaced, inserted).
    pub fn upsert(&mut self, updates: Vec<Record>) -> (usize, usize) {
        let mut positions: HashMap<RecordId, usize> = self
            .rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| match row {
                TableRow::Record(record) => Some((record.id, i)),
                TableRow::Unparsed(_) => None,
            })
            .collect();

        let (mut replaced, mut inserted) = (0, 0);
        for mut update in updates {
            match positions.get(&update.id) {
                Some(&i) => {
                    if let TableRow::Record(stored) = &self.rows[i] {
                        update.date_added = stored.date_added;
                    }
                    self.rows[i] = TableRow::Record(update);
                    replaced += 1;
                }
                None => {
                    positions.insert(update.id, self.rows.len());
                    self.rows.push(TableRow::Record(update));
                    inserted += 1;
                }
            }
        }
        (replaced, inserted)
    }

    /// Render header plus every row, in order
    pub fn render(&self) -> String {
        let mut out = header_line();
        for row in &self.rows {
            match row {
                TableRow::Record(record) => push_record(&mut out, record),
                TableRow::Unparsed(fields) => push_fields(&mut out, fields),
            }
        }
        out
    }
}

/// Parse a whole table into its records, dropping rows without a valid id
pub fn parse_table(text: &str) -> Vec<Record> {
    Table::parse(text).into_records()
}

fn parse_record(row: &[String], columns: &ColumnMap) -> Option<Record> {
    let text = |column: usize| columns.get(row, column).unwrap_or_default().to_string();
    let flag = |column: usize| parse_bool(columns.get(row, column));

    let id = columns
        .get(row, 0)
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|id| *id > 0)?;

    let date_added = columns
        .get(row, 4)
        .and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(0);

    Some(Record {
        id,
        source: text(1),
        cost: text(2),
        url: text(3),
        date_added,
        seen: flag(5),
        ok: flag(6),
        called: flag(7),
        active: flag(8),
        archived: flag(9),
    })
}

/// Only the literal `true` is true
fn parse_bool(token: Option<&str>) -> bool {
    token.map(str::trim) == Some("true")
}

/* ---------------- Writing ---------------- */

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn push_field(out: &mut String, field: &str) {
    if needs_quotes(field) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

fn push_record(out: &mut String, record: &Record) {
    let fields = [
        record.id.to_string(),
        record.source.clone(),
        record.cost.clone(),
        record.url.clone(),
        record.date_added.to_string(),
        record.seen.to_string(),
        record.ok.to_string(),
        record.called.to_string(),
        record.active.to_string(),
        record.archived.to_string(),
    ];
    push_fields(out, &fields);
}

fn push_fields(out: &mut String, fields: &[String]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, field);
    }
    out.push('\n');
}

/// Render the full table: header plus one row per record, in order
pub fn render_table(records: &[Record]) -> String {
    let mut out = header_line();
    for record in records {
        push_record(&mut out, record);
    }
    out
}
