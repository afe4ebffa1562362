//! CSV record codec for the flat-file record lists.
//!
//! Record files are single flat CSV objects: one header line naming the
//! columns, one line per record, every value double-quoted on write. The
//! decoder tolerates files written by older versions of the service —
//! missing columns, reordered headers, headerless files, and values that
//! were stored already-wrapped in quotes — and never fails on malformed
//! quoting; it degrades to best-effort field boundaries.
//!
//! A record's `id` is its 0-based position in decode order. It is never
//! persisted and is recomputed on every decode, so it is only a valid
//! address within one read-modify-write cycle.

// ─── Columns ──────────────────────────────────────────────────────────────────

pub const COL_SCOUT_NAME: &str = "scout_name";
pub const COL_REAL_NAME: &str = "real_name";
pub const COL_SCOUT_GROUP: &str = "scout_group";
pub const COL_PASSWORD_HASH: &str = "password_hash";

/// Canonical column order for record files.
pub const RECORD_COLUMNS: [&str; 4] = [
    COL_SCOUT_NAME,
    COL_REAL_NAME,
    COL_SCOUT_GROUP,
    COL_PASSWORD_HASH,
];

/// Column order of files written before the password column existed.
pub const LEGACY_COLUMNS: [&str; 3] = [COL_SCOUT_NAME, COL_REAL_NAME, COL_SCOUT_GROUP];

// ─── Record ───────────────────────────────────────────────────────────────────

/// One admin or scorer entry.
///
/// `password_hash` is empty for records that have never had a password set,
/// including every record of a legacy 3-column file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    /// Transient 0-based position in the list. Not a stored field.
    pub id: usize,
    pub scout_name: String,
    pub real_name: String,
    pub scout_group: String,
    pub password_hash: String,
}

impl Record {
    /// Value of the named column, empty for unknown column names.
    pub fn field(&self, column: &str) -> &str {
        match column {
            COL_SCOUT_NAME => &self.scout_name,
            COL_REAL_NAME => &self.real_name,
            COL_SCOUT_GROUP => &self.scout_group,
            COL_PASSWORD_HASH => &self.password_hash,
            _ => "",
        }
    }

    fn set_field(&mut self, column: &str, value: String) {
        match column {
            COL_SCOUT_NAME => self.scout_name = value,
            COL_REAL_NAME => self.real_name = value,
            COL_SCOUT_GROUP => self.scout_group = value,
            COL_PASSWORD_HASH => self.password_hash = value,
            _ => {}
        }
    }
}

// ─── Decode ───────────────────────────────────────────────────────────────────

/// Decode `text` into records, populating the fields listed in `columns`.
///
/// If the first row's cells (lower-cased, quote-stripped) include the first
/// expected column name, row 0 is a header and fields resolve by column name;
/// a field absent from the header is always empty. Otherwise all rows are
/// data and fields map positionally in `columns` order. Rows shorter than the
/// resolved column count pad with empty strings.
pub fn decode(text: &str, columns: &[&str]) -> Vec<Record> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let rows: Vec<Vec<String>> = text.lines().map(scan_line).collect();

    let first_column = columns.first().copied().unwrap_or(COL_SCOUT_NAME);
    let has_header = rows[0]
        .iter()
        .any(|cell| unwrap_legacy(cell).to_lowercase() == first_column);

    // Column index for each expected field: by header name when a header is
    // present, by position in `columns` otherwise. None decodes to empty.
    let resolved: Vec<(&str, Option<usize>)> = if has_header {
        let header: Vec<String> = rows[0]
            .iter()
            .map(|cell| unwrap_legacy(cell).to_lowercase())
            .collect();
        columns
            .iter()
            .map(|&col| (col, header.iter().position(|h| h.as_str() == col)))
            .collect()
    } else {
        columns
            .iter()
            .enumerate()
            .map(|(i, &col)| (col, Some(i)))
            .collect()
    };

    let data_rows = if has_header { &rows[1..] } else { &rows[..] };

    data_rows
        .iter()
        .enumerate()
        .map(|(id, row)| {
            let mut record = Record {
                id,
                ..Record::default()
            };
            for &(col, index) in &resolved {
                let value = index
                    .and_then(|i| row.get(i))
                    .map(|cell| unwrap_legacy(cell))
                    .unwrap_or_default();
                record.set_field(col, value);
            }
            record
        })
        .collect()
}

/// Split one physical line into trimmed fields.
///
/// Outside quotes a `,` ends the field. A `"` toggles quoted mode wherever it
/// appears, even mid-field — this mis-parses data like `abc"def`, but the
/// behavior is load-bearing for files already in storage and is kept as is.
/// Inside quotes `""` is a literal quote and `,` is data. A line ending while
/// still inside quotes closes the field; there is no multi-line field
/// support.
fn scan_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                fields.push(field.trim().to_string());
                field.clear();
            }
            _ => field.push(c),
        }
    }
    fields.push(field.trim().to_string());
    fields
}

/// Strip one wrapping quote pair left over from already-quoted stored values,
/// then collapse any remaining doubled quotes.
///
/// Only a field that both starts and ends with `"` is unwrapped, so a genuine
/// trailing quote in a value (`Robinson, "Jim"`) survives.
fn unwrap_legacy(value: &str) -> String {
    let unwrapped = if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    };
    unwrapped.replace("\"\"", "\"")
}

// ─── Encode ───────────────────────────────────────────────────────────────────

/// Encode records under the given column order.
///
/// Emits the literal column names as the header line, then one line per
/// record with every value quoted. Lines are joined with `\n` and there is no
/// trailing newline.
pub fn encode(records: &[Record], columns: &[&str]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(columns.join(","));
    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|&col| escape(record.field(col)))
            .collect();
        lines.push(row.join(","));
    }
    lines.join("\n")
}

/// Double embedded quotes, then wrap in quotes unconditionally.
fn escape(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

// ─── Tests ────────────────────────────────────────────────────────────────────
