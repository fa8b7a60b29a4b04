//! Ad hoc SQL query models.
//!
//! Contains the payloads for natural-language SQL generation and query
//! execution against the selected database, plus chart series derivation
//! from the returned rows.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::record::{FieldValue, Record};

/// Request body for generating SQL from a question.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct GenerateSqlRequest {
    /// Natural-language question about the data.
    #[validate(length(min = 1, message = "Question is required"))]
    pub question: String,
}

/// Generated SQL.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerateSqlResponse {
    #[serde(default)]
    pub sql: Option<String>,
}

/// Request body for executing a SQL query.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExecuteQueryRequest {
    /// SQL statement to execute.
    pub query: String,
}

/// Rows returned by a query execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResults {
    #[serde(default)]
    pub data: Vec<Record>,
}

/// Supported chart renderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
    Pie,
}

/// Label/value pairs extracted from query rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// One pie chart slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub id: String,
    pub label: String,
    pub value: f64,
}

impl QueryResults {
    /// Creates an empty result set.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Column names, taken from the first row.
    pub fn columns(&self) -> Vec<String> {
        self.data
            .first()
            .map(|row| row.keys().map(String::from).collect())
            .unwrap_or_default()
    }

    /// Builds a chart series from a label column and a value column.
    ///
    /// Missing labels render as empty strings; values that are missing or
    /// not numeric count as 0.
    pub fn chart_series(&self, kind: ChartKind, label_column: &str, value_column: &str) -> ChartSeries {
        let labels = self
            .data
            .iter()
            .map(|row| row.get(label_column).map(FieldValue::to_string).unwrap_or_default())
            .collect();
        let values = self
            .data
            .iter()
            .map(|row| row.get(value_column).map(FieldValue::to_number_lossy).unwrap_or(0.0))
            .collect();
        ChartSeries { kind, labels, values }
    }
}

impl ChartSeries {
    /// Whether there is anything to draw.
    pub fn is_drawable(&self) -> bool {
        !self.labels.is_empty() && !self.values.is_empty()
    }

    /// Pairs labels with values for pie rendering.
    pub fn pie_slices(&self) -> Vec<PieSlice> {
        self.labels
            .iter()
            .zip(&self.values)
            .map(|(label, value)| PieSlice {
                id: label.clone(),
                label: label.clone(),
                value: *value,
            })
            .collect()
    }
}
