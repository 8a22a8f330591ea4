use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CellValue – a single cell of a fetched row
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the JSON scalars the API returns.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl CellValue {
    /// Textual form used by every textual predicate.
    ///
    /// Integral floats print without a fractional part (`30.0` → `"30"`) and
    /// `Null` is the empty string.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::String(s) => s.clone(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(v) => v.to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Null => String::new(),
        }
    }

    /// Numeric view of the cell. Strings read their leading number, so
    /// `"30 anos"` is 30.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if !v.is_nan() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::String(s) => leading_number(s),
            _ => None,
        }
    }

    /// `Null` or an empty string.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "-"),
            other => write!(f, "{}", other.as_text()),
        }
    }
}

/// Read the longest numeric prefix of `raw` after leading whitespace.
///
/// Accepts an optional sign, digits with at most one `.`, an optional
/// exponent and the literal `Infinity`. Text after the number is ignored;
/// `None` when no digits start the input.
pub fn leading_number(raw: &str) -> Option<f64> {
    let text = raw.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    if text[end..].starts_with("Infinity") {
        let sign = if bytes.first() == Some(&b'-') { -1.0 } else { 1.0 };
        return Some(sign * f64::INFINITY);
    }

    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut mantissa = digits_from(end);
    end += mantissa;
    if bytes.get(end) == Some(&b'.') {
        let fraction = digits_from(end + 1);
        mantissa += fraction;
        if fraction > 0 || mantissa > 0 {
            end += 1 + fraction;
        }
    }
    if mantissa == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let count = digits_from(exp);
        if count > 0 {
            end = exp + count;
        }
    }

    text[..end].parse::<f64>().ok()
}

/// One fetched record: column name → value. Missing keys read as `Null`.
pub type Row = BTreeMap<String, CellValue>;

/// Opaque dataset identifier assigned by the backend.
pub type DatasetId = u64;

// ---------------------------------------------------------------------------
// ColumnKind / ColumnMetadata
// ---------------------------------------------------------------------------

/// Semantic column type; selects the predicate branch and filter widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    #[default]
    String,
    Number,
    Integer,
    Float,
    Boolean,
    Category,
    Date,
    Datetime,
}

impl ColumnKind {
    /// Parse a backend `filter_type` tag. Unknown tags fall back to `String`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "number" => ColumnKind::Number,
            "integer" => ColumnKind::Integer,
            "float" => ColumnKind::Float,
            "boolean" => ColumnKind::Boolean,
            "category" => ColumnKind::Category,
            "date" => ColumnKind::Date,
            "datetime" => ColumnKind::Datetime,
            _ => ColumnKind::String,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::String => "string",
            ColumnKind::Number => "number",
            ColumnKind::Integer => "integer",
            ColumnKind::Float => "float",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Category => "category",
            ColumnKind::Date => "date",
            ColumnKind::Datetime => "datetime",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Number | ColumnKind::Integer | ColumnKind::Float)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-supplied description of one dataset column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMetadata {
    pub name: String,
    /// Raw backend storage type, shown in the column list.
    pub declared_type: String,
    pub kind: ColumnKind,
    /// Selectable values; only populated for categorical columns.
    pub distinct_values: Vec<String>,
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            declared_type: kind.as_str().to_string(),
            kind,
            distinct_values: Vec::new(),
        }
    }

    /// Derive column metadata from the rows themselves.
    ///
    /// Used when the metadata endpoint fails but rows arrived. A column is
    /// numeric when every non-blank value is numeric, boolean when every
    /// non-blank value is a boolean, and a plain string otherwise.
    pub fn infer_from_rows(rows: &[Row]) -> Vec<ColumnMetadata> {
        let mut names: BTreeSet<&str> = BTreeSet::new();
        for row in rows {
            names.extend(row.keys().map(String::as_str));
        }

        names
            .into_iter()
            .map(|name| {
                let mut numeric = true;
                let mut boolean = true;
                let mut seen = false;
                for value in rows.iter().filter_map(|r| r.get(name)) {
                    if value.is_blank() {
                        continue;
                    }
                    seen = true;
                    numeric &= matches!(value, CellValue::Integer(_) | CellValue::Float(_));
                    boolean &= matches!(value, CellValue::Bool(_));
                }
                let kind = match (seen, numeric, boolean) {
                    (true, true, _) => ColumnKind::Number,
                    (true, _, true) => ColumnKind::Boolean,
                    _ => ColumnKind::String,
                };
                ColumnMetadata::new(name, kind)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Catalogue entries
// ---------------------------------------------------------------------------

/// One entry of the public dataset catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub id: DatasetId,
    pub table_name: String,
    pub status: String,
    pub status_display: String,
    pub record_count: u64,
    pub column_count: usize,
    pub created_at: Option<String>,
}

impl DatasetSummary {
    /// Minimal summary for datasets reached through search results.
    pub fn bare(id: DatasetId, table_name: impl Into<String>) -> Self {
        Self {
            id,
            table_name: table_name.into(),
            status: String::new(),
            status_display: String::new(),
            record_count: 0,
            column_count: 0,
            created_at: None,
        }
    }
}

/// A dataset matching a public search query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub process_id: DatasetId,
    pub table_name: String,
    pub columns: Vec<String>,
    pub count: u64,
}
