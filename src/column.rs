//! Column classification: decides once per table which columns get a filter
//! widget and which can feed the pie chart.

use color_eyre::Result;
use polars::prelude::*;

/// Broad kind of a column, derived from its polars dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Free text / categorical values (anything that is not one of the others).
    Text,
    Numeric,
    Temporal,
    Boolean,
}

impl ColumnKind {
    pub fn from_dtype(dtype: &DataType) -> Self {
        if dtype.is_numeric() {
            ColumnKind::Numeric
        } else if dtype.is_temporal() {
            ColumnKind::Temporal
        } else if matches!(dtype, DataType::Boolean) {
            ColumnKind::Boolean
        } else {
            ColumnKind::Text
        }
    }

    pub fn is_categorical(self) -> bool {
        self == ColumnKind::Text
    }
}

/// Name tokens that make a column filterable regardless of its kind.
const FILTER_NAME_TOKENS: [&str; 2] = ["Date", "Month"];
/// Name tokens that make a column chartable regardless of its kind.
const CHART_NAME_TOKENS: [&str; 2] = ["Month", "Branch"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: ColumnKind,
    /// Eligible for a multi-select filter (before the distinct-count check).
    pub filterable: bool,
    /// Eligible as the pie chart column.
    pub chartable: bool,
}

impl ColumnInfo {
    pub fn new(name: &str, kind: ColumnKind) -> Self {
        let categorical = kind.is_categorical();
        Self {
            name: name.to_string(),
            kind,
            filterable: categorical || FILTER_NAME_TOKENS.iter().any(|t| name.contains(t)),
            chartable: categorical || CHART_NAME_TOKENS.iter().any(|t| name.contains(t)),
        }
    }
}

/// Classify every column of `df`, in table order.
pub fn classify(df: &DataFrame) -> Vec<ColumnInfo> {
    df.get_columns()
        .iter()
        .map(|c| ColumnInfo::new(c.name().as_str(), ColumnKind::from_dtype(c.dtype())))
        .collect()
}

/// Cell values of one column rendered as strings; `None` for missing cells.
pub fn column_strings(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(values)
}

/// Distinct non-missing values of a column in first-appearance order.
pub fn distinct_values(values: &[Option<String>]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .iter()
        .flatten()
        .filter(|v| seen.insert(v.as_str()))
        .cloned()
        .collect()
}
