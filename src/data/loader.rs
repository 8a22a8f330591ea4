use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{CellValue, ColumnKind, ColumnMetadata, DatasetSummary, Row, SearchHit};

/// The backend answered with `success: false`.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct Rejected(pub String);

// ---------------------------------------------------------------------------
// Envelope handling
// ---------------------------------------------------------------------------

/// Parse a `{ "success": bool, ... }` body and return the root object.
fn envelope(text: &str) -> Result<serde_json::Map<String, JsonValue>> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let JsonValue::Object(obj) = root else {
        bail!("Expected top-level JSON object");
    };

    let success = obj.get("success").and_then(JsonValue::as_bool).unwrap_or(false);
    if !success {
        let message = obj
            .get("error")
            .and_then(JsonValue::as_str)
            .unwrap_or("request was not successful")
            .to_string();
        return Err(Rejected(message).into());
    }
    Ok(obj)
}

/// Deserialize an optional array field of the envelope. Absent or null → empty.
fn field<T: DeserializeOwned>(
    obj: &mut serde_json::Map<String, JsonValue>,
    key: &str,
) -> Result<Vec<T>> {
    match obj.remove(key) {
        None | Some(JsonValue::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value).with_context(|| format!("decoding '{key}'")),
    }
}

// ---------------------------------------------------------------------------
// Catalogue
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RawDataset {
    id: u64,
    table_name: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    status_display: String,
    #[serde(default)]
    record_count: u64,
    #[serde(default)]
    column_structure: Option<serde_json::Map<String, JsonValue>>,
    #[serde(default)]
    created_at: Option<String>,
}

/// Decode the body of `public-datasets/`.
pub fn decode_datasets(text: &str) -> Result<Vec<DatasetSummary>> {
    let mut obj = envelope(text)?;
    let raw: Vec<RawDataset> = field(&mut obj, "results")?;
    Ok(raw
        .into_iter()
        .map(|d| DatasetSummary {
            id: d.id,
            table_name: d.table_name,
            status: d.status,
            status_display: d.status_display,
            record_count: d.record_count,
            column_count: d.column_structure.map_or(0, |c| c.len()),
            created_at: d.created_at,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Column metadata
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RawColumn {
    name: String,
    #[serde(default, rename = "type")]
    declared_type: String,
    #[serde(default)]
    filter_type: Option<String>,
    #[serde(default)]
    unique_values: Option<Vec<JsonValue>>,
}

/// Decode the body of `public-metadata/{id}/`.
///
/// `filter_type` selects the column kind; when absent the storage `type` is
/// used instead. Distinct values are stringified.
pub fn decode_metadata(text: &str) -> Result<Vec<ColumnMetadata>> {
    let mut obj = envelope(text)?;
    let raw: Vec<RawColumn> = field(&mut obj, "columns")?;
    Ok(raw
        .into_iter()
        .map(|c| {
            let kind = ColumnKind::from_tag(c.filter_type.as_deref().unwrap_or(&c.declared_type));
            let distinct_values = c
                .unique_values
                .unwrap_or_default()
                .iter()
                .map(|v| json_to_cell(v).as_text())
                .collect();
            ColumnMetadata {
                name: c.name,
                declared_type: c.declared_type,
                kind,
                distinct_values,
            }
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// Decode the body of `public-data/{id}/`.
///
/// Expected schema:
///
/// ```json
/// { "success": true, "data": [ { "name": "Alice", "age": 30 }, ... ] }
/// ```
pub fn decode_rows(text: &str) -> Result<Vec<Row>> {
    let mut obj = envelope(text)?;
    let records: Vec<JsonValue> = field(&mut obj, "data")?;

    records
        .iter()
        .enumerate()
        .map(|(i, rec)| -> Result<Row> {
            let obj = rec
                .as_object()
                .with_context(|| format!("Row {i} is not a JSON object"))?;
            Ok(obj
                .iter()
                .map(|(key, val)| (key.clone(), json_to_cell(val)))
                .collect::<BTreeMap<_, _>>())
        })
        .collect()
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RawSearchHit {
    process_id: u64,
    table_name: String,
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    count: u64,
}

/// Decode the body of `public-search/?q=`.
pub fn decode_search(text: &str) -> Result<Vec<SearchHit>> {
    let mut obj = envelope(text)?;
    let raw: Vec<RawSearchHit> = field(&mut obj, "results")?;
    Ok(raw
        .into_iter()
        .map(|h| SearchHit {
            process_id: h.process_id,
            table_name: h.table_name,
            columns: h.columns,
            count: h.count,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_keep_scalar_types() {
        let rows = decode_rows(
            r#"{"success":true,"data":[
                {"name":"Alice","age":30,"score":9.5,"active":true,"note":null}
            ]}"#,
        )
        .unwrap();
        let row = &rows[0];
        assert_eq!(row["name"], CellValue::String("Alice".into()));
        assert_eq!(row["age"], CellValue::Integer(30));
        assert_eq!(row["score"], CellValue::Float(9.5));
        assert_eq!(row["active"], CellValue::Bool(true));
        assert_eq!(row["note"], CellValue::Null);
    }

    #[test]
    fn non_object_rows_are_errors() {
        let err = decode_rows(r#"{"success":true,"data":[1]}"#).unwrap_err();
        assert!(format!("{err:#}").contains("Row 0"));
    }

    #[test]
    fn unsuccessful_envelopes_are_rejected() {
        let err = decode_rows(r#"{"success":false,"error":"dataset is private"}"#).unwrap_err();
        let rejected = err.downcast_ref::<Rejected>().unwrap();
        assert_eq!(rejected.0, "dataset is private");
    }

    #[test]
    fn metadata_maps_filter_types() {
        let columns = decode_metadata(
            r#"{"success":true,"columns":[
                {"name":"status","type":"object","filter_type":"category","unique_values":["Active","Closed"]},
                {"name":"age","type":"int64","filter_type":"integer","unique_values":[]},
                {"name":"created","type":"datetime"},
                {"name":"notes","type":"object","filter_type":"text"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(columns[0].kind, ColumnKind::Category);
        assert_eq!(columns[0].distinct_values, vec!["Active", "Closed"]);
        assert_eq!(columns[1].kind, ColumnKind::Integer);
        assert_eq!(columns[1].declared_type, "int64");
        assert_eq!(columns[2].kind, ColumnKind::Datetime);
        assert_eq!(columns[3].kind, ColumnKind::String);
    }

    #[test]
    fn catalogue_counts_columns() {
        let datasets = decode_datasets(
            r#"{"success":true,"results":[
                {"id":3,"table_name":"vehicles","status":"completed","status_display":"Completed",
                 "record_count":120,"column_structure":{"plate":"object","year":"int64"},
                 "created_at":"2024-05-01T10:00:00Z"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(datasets[0].id, 3);
        assert_eq!(datasets[0].column_count, 2);
        assert_eq!(datasets[0].record_count, 120);
    }

    #[test]
    fn search_results_without_hits() {
        assert!(decode_search(r#"{"success":true,"results":[]}"#).unwrap().is_empty());
        let hits = decode_search(
            r#"{"success":true,"results":[{"process_id":9,"table_name":"fleet","columns":["plate"],"data":[],"count":4}]}"#,
        )
        .unwrap();
        assert_eq!(hits[0].process_id, 9);
        assert_eq!(hits[0].count, 4);
    }
}
