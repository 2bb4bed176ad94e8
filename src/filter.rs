//! Multi-select filters over the active table.
//!
//! A [`FilterSet`] is derived from a table's columns: one generic filter per
//! filterable column with a manageable number of distinct values, plus the
//! dedicated vendor and party filters located by a normalized header match.
//! Applying the set keeps a row only when every active filter accepts it.

use std::collections::HashSet;

use color_eyre::Result;
use polars::prelude::*;

use crate::column::{column_strings, distinct_values, ColumnInfo};

/// A column gets a filter only when its distinct count is strictly between these.
pub const MIN_DISTINCT: usize = 1;
pub const MAX_DISTINCT: usize = 100;

const VENDOR_HEADER: &str = "vendor name";
const PARTY_HEADER: &str = "party name";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Filterable by column type or name.
    Column,
    /// The column whose normalized header is "vendor name".
    Vendor,
    /// The column whose normalized header is "party name".
    Party,
}

#[derive(Debug, Clone)]
pub struct ColumnFilter {
    pub column: String,
    pub label: String,
    pub kind: FilterKind,
    /// Distinct non-missing values in first-appearance order.
    pub options: Vec<String>,
    selected: HashSet<String>,
}

impl ColumnFilter {
    fn new(column: &str, kind: FilterKind, options: Vec<String>) -> Self {
        let label = match kind {
            FilterKind::Column => format!("Filter by {}", column),
            FilterKind::Vendor => "Filter by Vendor Name".to_string(),
            FilterKind::Party => "Filter by Party Name".to_string(),
        };
        let selected = options.iter().cloned().collect();
        Self {
            column: column.to_string(),
            label,
            kind,
            options,
            selected,
        }
    }

    pub fn is_selected(&self, value: &str) -> bool {
        self.selected.contains(value)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn all_selected(&self) -> bool {
        self.selected.len() == self.options.len()
    }

    /// Selected values in option order.
    pub fn selected_values(&self) -> Vec<String> {
        self.options
            .iter()
            .filter(|o| self.selected.contains(o.as_str()))
            .cloned()
            .collect()
    }

    pub fn toggle(&mut self, value: &str) {
        if !self.selected.remove(value) && self.options.iter().any(|o| o == value) {
            self.selected.insert(value.to_string());
        }
    }

    pub fn select_all(&mut self) {
        self.selected = self.options.iter().cloned().collect();
    }

    pub fn select_none(&mut self) {
        self.selected.clear();
    }

    /// Replace the selection; values that are not options are ignored.
    pub fn set_selected<S: AsRef<str>>(&mut self, values: &[S]) {
        self.selected = values
            .iter()
            .map(|v| v.as_ref())
            .filter(|v| self.options.iter().any(|o| o == v))
            .map(str::to_string)
            .collect();
    }

    /// An emptied generic filter stops filtering; vendor and party filters always apply.
    pub fn is_active(&self) -> bool {
        match self.kind {
            FilterKind::Column => !self.selected.is_empty(),
            FilterKind::Vendor | FilterKind::Party => true,
        }
    }

    fn accepts(&self, value: Option<&str>) -> bool {
        value.is_some_and(|v| self.selected.contains(v))
    }
}

/// All filters for one table.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    pub filters: Vec<ColumnFilter>,
}

fn has_filterable_cardinality(options: &[String]) -> bool {
    options.len() > MIN_DISTINCT && options.len() < MAX_DISTINCT
}

fn normalized_header(name: &str) -> String {
    name.trim().to_lowercase()
}

impl FilterSet {
    /// Build the filters for `df`, every filter starting with all values selected.
    pub fn from_table(df: &DataFrame, columns: &[ColumnInfo]) -> Result<Self> {
        let mut filters = Vec::new();

        for info in columns.iter().filter(|c| c.filterable) {
            let options = distinct_values(&column_strings(df, &info.name)?);
            if has_filterable_cardinality(&options) {
                filters.push(ColumnFilter::new(&info.name, FilterKind::Column, options));
            }
        }

        for (kind, header) in [
            (FilterKind::Vendor, VENDOR_HEADER),
            (FilterKind::Party, PARTY_HEADER),
        ] {
            let Some(info) = columns
                .iter()
                .find(|c| normalized_header(&c.name) == header)
            else {
                continue;
            };
            let options = distinct_values(&column_strings(df, &info.name)?);
            if has_filterable_cardinality(&options) {
                filters.push(ColumnFilter::new(&info.name, kind, options));
            }
        }

        tracing::debug!(
            filters = filters.len(),
            columns = ?filters.iter().map(|f| f.column.as_str()).collect::<Vec<_>>(),
            "built filters"
        );
        Ok(Self { filters })
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn get(&self, index: usize) -> Option<&ColumnFilter> {
        self.filters.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ColumnFilter> {
        self.filters.get_mut(index)
    }

    pub fn find(&self, kind: FilterKind, column: &str) -> Option<&ColumnFilter> {
        self.filters
            .iter()
            .find(|f| f.kind == kind && f.column == column)
    }

    pub fn find_mut(&mut self, kind: FilterKind, column: &str) -> Option<&mut ColumnFilter> {
        self.filters
            .iter_mut()
            .find(|f| f.kind == kind && f.column == column)
    }

    /// Select every value of every filter.
    pub fn reset(&mut self) {
        for filter in &mut self.filters {
            filter.select_all();
        }
    }

    /// Keep the rows every active filter accepts, preserving row order.
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        let active: Vec<&ColumnFilter> = self.filters.iter().filter(|f| f.is_active()).collect();
        if active.is_empty() {
            return Ok(df.clone());
        }

        let mut mask = vec![true; df.height()];
        for filter in active {
            let values = column_strings(df, &filter.column)?;
            for (keep, value) in mask.iter_mut().zip(values.iter()) {
                if *keep && !filter.accepts(value.as_deref()) {
                    *keep = false;
                }
            }
        }

        let mask = BooleanChunked::from_slice(PlSmallStr::from_static("mask"), &mask);
        let filtered = df.filter(&mask)?;
        tracing::debug!(rows_in = df.height(), rows_out = filtered.height(), "applied filters");
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::classify;

    fn purchase() -> DataFrame {
        df!(
            "Branch" => ["A", "A", "B", "C"],
            "Vendor Name" => ["Acme", "Zen", "Acme", "Zen"],
            "Bill No." => [1i64, 2, 3, 4],
        )
        .unwrap()
    }

    fn filters_for(df: &DataFrame) -> FilterSet {
        FilterSet::from_table(df, &classify(df)).unwrap()
    }

    fn column_values(df: &DataFrame, name: &str) -> Vec<Option<String>> {
        column_strings(df, name).unwrap()
    }

    #[test]
    fn test_defaults_select_everything() {
        let df = purchase();
        let filters = filters_for(&df);
        // Branch, Vendor Name (generic), Vendor Name (vendor)
        assert_eq!(filters.len(), 3);
        assert!(filters.filters.iter().all(|f| f.all_selected()));
        assert!(filters.apply(&df).unwrap().equals(&df));
    }

    #[test]
    fn test_numeric_columns_get_no_generic_filter() {
        let filters = filters_for(&purchase());
        assert!(filters.filters.iter().all(|f| f.column != "Bill No."));
    }

    #[test]
    fn test_vendor_filter_labels_and_options() {
        let filters = filters_for(&purchase());
        let vendor = filters.find(FilterKind::Vendor, "Vendor Name").unwrap();
        assert_eq!(vendor.label, "Filter by Vendor Name");
        assert_eq!(vendor.options, vec!["Acme", "Zen"]);
        let branch = filters.find(FilterKind::Column, "Branch").unwrap();
        assert_eq!(branch.label, "Filter by Branch");
        assert_eq!(branch.options, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_conjunction_of_filters() {
        let df = purchase();
        let mut filters = filters_for(&df);
        filters
            .find_mut(FilterKind::Column, "Branch")
            .unwrap()
            .set_selected(&["A", "B"]);
        filters
            .find_mut(FilterKind::Vendor, "Vendor Name")
            .unwrap()
            .set_selected(&["Acme"]);
        let out = filters.apply(&df).unwrap();
        assert_eq!(
            column_values(&out, "Bill No."),
            vec![Some("1".to_string()), Some("3".to_string())]
        );
    }

    #[test]
    fn test_result_is_ordered_subsequence_and_idempotent() {
        let df = purchase();
        let mut filters = filters_for(&df);
        filters
            .find_mut(FilterKind::Column, "Branch")
            .unwrap()
            .set_selected(&["C", "A"]);
        let once = filters.apply(&df).unwrap();
        let twice = filters.apply(&once).unwrap();
        assert!(once.equals(&twice));
        assert_eq!(
            column_values(&once, "Bill No."),
            vec![
                Some("1".to_string()),
                Some("2".to_string()),
                Some("4".to_string())
            ]
        );
    }

    #[test]
    fn test_party_options_ignore_vendor_selection() {
        let df = df!(
            "Vendor Name" => ["Acme", "Zen", "Acme"],
            "Party Name" => ["Star", "Delta", "Orbit"],
        )
        .unwrap();
        let mut filters = filters_for(&df);
        filters
            .find_mut(FilterKind::Vendor, "Vendor Name")
            .unwrap()
            .set_selected(&["Acme"]);

        let party = filters.find(FilterKind::Party, "Party Name").unwrap();
        assert_eq!(party.options, vec!["Star", "Delta", "Orbit"]);
        let filtered = filters.apply(&df).unwrap();
        assert_eq!(
            column_values(&filtered, "Party Name"),
            vec![Some("Star".to_string()), Some("Orbit".to_string())]
        );
    }

    #[test]
    fn test_emptied_generic_filter_is_inactive() {
        let df = purchase();
        let mut filters = filters_for(&df);
        filters
            .find_mut(FilterKind::Column, "Branch")
            .unwrap()
            .select_none();
        assert_eq!(filters.apply(&df).unwrap().height(), 4);
    }

    #[test]
    fn test_emptied_vendor_filter_removes_everything() {
        let df = purchase();
        let mut filters = filters_for(&df);
        filters
            .find_mut(FilterKind::Vendor, "Vendor Name")
            .unwrap()
            .select_none();
        assert_eq!(filters.apply(&df).unwrap().height(), 0);
    }

    #[test]
    fn test_vendor_header_is_normalized() {
        let df = df!(
            "  VENDOR NAME " => ["Acme", "Zen", "Acme"],
            "Bill No." => [1i64, 2, 3],
        )
        .unwrap();
        let columns = classify(&df);
        let filters = FilterSet::from_table(&df, &columns).unwrap();
        let vendor = filters.find(FilterKind::Vendor, "  VENDOR NAME ").unwrap();

        let exact = df!("Vendor Name" => ["Acme", "Zen", "Acme"]).unwrap();
        let exact_filters = filters_for(&exact);
        let exact_vendor = exact_filters.find(FilterKind::Vendor, "Vendor Name").unwrap();

        assert_eq!(vendor.label, exact_vendor.label);
        assert_eq!(vendor.options, exact_vendor.options);
    }

    #[test]
    fn test_party_filter() {
        let df = df!(
            "party Name" => ["P1", "P2", "P1"],
            "Return Value" => [10.5f64, 20.0, 30.25],
        )
        .unwrap();
        let mut filters = filters_for(&df);
        let party = filters.find_mut(FilterKind::Party, "party Name").unwrap();
        party.toggle("P1");
        assert_eq!(party.selected_values(), vec!["P2"]);
        let out = filters.apply(&df).unwrap();
        assert_eq!(out.height(), 1);
    }

    #[test]
    fn test_cardinality_limits() {
        let wide: Vec<String> = (0..150).map(|i| format!("SN{i}")).collect();
        let single = vec!["Only"; 150];
        let df = df!("Serial No" => wide, "Model No." => single).unwrap();
        let filters = filters_for(&df);
        assert!(filters.is_empty());
        assert_eq!(filters.apply(&df).unwrap().height(), 150);

        let just_under: Vec<String> = (0..99).map(|i| format!("M{i}")).collect();
        let df = df!("Model No." => just_under).unwrap();
        assert_eq!(filters_for(&df).len(), 1);

        let at_limit: Vec<String> = (0..100).map(|i| format!("M{i}")).collect();
        let df = df!("Model No." => at_limit).unwrap();
        assert!(filters_for(&df).is_empty());
    }

    #[test]
    fn test_missing_values_never_pass_an_active_filter() {
        let df = df!(
            "Branch" => [Some("A"), None, Some("B")],
            "Bill No." => [1i64, 2, 3],
        )
        .unwrap();
        let filters = filters_for(&df);
        let branch = filters.find(FilterKind::Column, "Branch").unwrap();
        assert_eq!(branch.options, vec!["A", "B"]);
        let out = filters.apply(&df).unwrap();
        assert_eq!(
            column_values(&out, "Bill No."),
            vec![Some("1".to_string()), Some("3".to_string())]
        );
    }

    #[test]
    fn test_date_and_month_columns_are_filterable_even_when_numeric() {
        let df = df!(
            "Month" => [4i64, 5, 4],
            "Price (Excuding GST)" => [100i64, 200, 300],
        )
        .unwrap();
        let mut filters = filters_for(&df);
        assert_eq!(filters.len(), 1);
        let month = filters.find_mut(FilterKind::Column, "Month").unwrap();
        month.set_selected(&["5", "not-an-option"]);
        assert_eq!(month.selected_count(), 1);
        assert_eq!(filters.apply(&df).unwrap().height(), 1);
    }

    #[test]
    fn test_reset_restores_all_values() {
        let df = purchase();
        let mut filters = filters_for(&df);
        filters.get_mut(0).unwrap().set_selected(&["B"]);
        filters.reset();
        assert!(filters.apply(&df).unwrap().equals(&df));
    }

    #[test]
    fn test_no_filters_returns_input() {
        let df = df!("Bill No." => [1i64, 2]).unwrap();
        let filters = filters_for(&df);
        assert!(filters.is_empty());
        assert!(filters.apply(&df).unwrap().equals(&df));
    }
}
