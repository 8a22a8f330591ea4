use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use super::model::DatasetId;
use crate::api::Endpoints;

/// Errors raised while preparing a download, before any request is sent.
#[derive(Debug, Error)]
pub enum ExportError {
    /// No column is selected.
    #[error("select at least one column to export")]
    EmptySelection,

    /// The export URL could not be built from the configured API address.
    #[error("invalid export URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported export format: {0}")]
    UnknownFormat(String),
}

/// File format offered by the download endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Csv, ExportFormat::Xlsx];

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Xlsx => "XLSX",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" => Ok(ExportFormat::Xlsx),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

/// A validated download of a subset of a dataset's columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub dataset_id: DatasetId,
    pub table_name: String,
    pub format: ExportFormat,
    pub columns: Vec<String>,
}

impl ExportRequest {
    /// Rejects an empty column list with [`ExportError::EmptySelection`].
    pub fn new(
        dataset_id: DatasetId,
        table_name: impl Into<String>,
        format: ExportFormat,
        columns: Vec<String>,
    ) -> Result<Self, ExportError> {
        if columns.is_empty() {
            return Err(ExportError::EmptySelection);
        }
        Ok(Self {
            dataset_id,
            table_name: table_name.into(),
            format,
            columns,
        })
    }

    /// `{table_name}.{format}`, with path separators replaced.
    pub fn suggested_filename(&self) -> String {
        let stem: String = self
            .table_name
            .trim()
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
            .collect();
        let stem = if stem.is_empty() { "dataset" } else { stem.as_str() };
        format!("{stem}.{}", self.format.extension())
    }

    /// Query parameters understood by the download endpoint.
    pub fn query_pairs(&self) -> [(&'static str, String); 2] {
        [
            ("file_format", self.format.extension().to_string()),
            ("columns", self.columns.join(",")),
        ]
    }
}

/// Everything needed to perform a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPlan {
    pub request: ExportRequest,
    pub url: Url,
    pub suggested_filename: String,
}

/// Validate the selection and resolve the download URL.
pub fn build_request(
    endpoints: &Endpoints,
    dataset_id: DatasetId,
    table_name: &str,
    format: ExportFormat,
    selected_columns: Vec<String>,
) -> Result<ExportPlan, ExportError> {
    let request = ExportRequest::new(dataset_id, table_name, format, selected_columns)?;
    let url = endpoints.download(&request)?;
    let suggested_filename = request.suggested_filename();
    Ok(ExportPlan {
        request,
        url,
        suggested_filename,
    })
}
