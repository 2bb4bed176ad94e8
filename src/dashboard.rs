//! The dashboard as a pure function of its inputs.
//!
//! Every interaction (sheet pick, filter change, chart column change) rebuilds
//! the visible state from the immutable [`Workbook`] and the explicit
//! [`DashboardState`] through [`compute_view`].

use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::DataFrame;

use crate::distribution::{chart_candidates, Distribution};
use crate::filter::FilterSet;
use crate::workbook::Workbook;

/// Everything the user can change.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub active_sheet: usize,
    pub filters: FilterSet,
    /// Requested pie chart column; falls back to the first candidate.
    pub chart_column: Option<String>,
}

impl DashboardState {
    /// Initial state for a sheet: every filter value selected, default chart column.
    pub fn for_sheet(workbook: &Workbook, active_sheet: usize) -> Result<Self> {
        let sheet = workbook
            .sheet(active_sheet)
            .ok_or_else(|| eyre!("No sheet at index {}", active_sheet))?;
        Ok(Self {
            active_sheet,
            filters: FilterSet::from_table(&sheet.df, &sheet.columns)?,
            chart_column: None,
        })
    }
}

/// What gets rendered and exported.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub sheet_name: String,
    pub filtered: DataFrame,
    pub chart_columns: Vec<String>,
    /// `None` when no column can be charted.
    pub distribution: Option<Distribution>,
}

impl DashboardView {
    pub fn chart_column(&self) -> Option<&str> {
        self.distribution.as_ref().map(|d| d.column.as_str())
    }
}

pub fn compute_view(workbook: &Workbook, state: &DashboardState) -> Result<DashboardView> {
    let sheet = workbook
        .sheet(state.active_sheet)
        .ok_or_else(|| eyre!("No sheet at index {}", state.active_sheet))?;

    let filtered = state.filters.apply(&sheet.df)?;
    let chart_columns = chart_candidates(&filtered);
    let chart_column = state
        .chart_column
        .as_ref()
        .filter(|c| chart_columns.contains(c))
        .or_else(|| chart_columns.first());
    let distribution = chart_column
        .map(|c| Distribution::from_table(&filtered, c))
        .transpose()?;

    tracing::debug!(
        sheet = %sheet.name,
        rows = filtered.height(),
        chart = ?distribution.as_ref().map(|d| d.column.as_str()),
        "recomputed view"
    );

    Ok(DashboardView {
        sheet_name: sheet.name.clone(),
        filtered,
        chart_columns,
        distribution,
    })
}
