//! Value counts of one column, the data behind the pie chart.

use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, TAU};

use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;

use crate::column::{classify, column_strings};

/// Slice colors, shared by the terminal pie and the PNG export.
pub const SLICE_RGB: [(u8, u8, u8); 10] = [
    (0x63, 0x6e, 0xfa),
    (0xef, 0x55, 0x3b),
    (0x00, 0xcc, 0x96),
    (0xab, 0x63, 0xfa),
    (0xff, 0xa1, 0x5a),
    (0x19, 0xd3, 0xf3),
    (0xff, 0x66, 0x92),
    (0xb6, 0xe8, 0x80),
    (0xff, 0x97, 0xff),
    (0xfe, 0xcb, 0x52),
];

pub fn slice_rgb(index: usize) -> (u8, u8, u8) {
    SLICE_RGB[index % SLICE_RGB.len()]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    pub column: String,
    pub slices: Vec<Slice>,
}

/// Columns of `df` that can be charted (categorical, or named like a month/branch).
pub fn chart_candidates(df: &DataFrame) -> Vec<String> {
    classify(df)
        .into_iter()
        .filter(|c| c.chartable)
        .map(|c| c.name)
        .collect()
}

impl Distribution {
    /// Count non-missing values of `column`. Slices are ordered by descending
    /// count; equal counts keep first-appearance order.
    pub fn from_table(df: &DataFrame, column: &str) -> Result<Self> {
        if df.column(column).is_err() {
            return Err(eyre!("Column '{}' is not in the table", column));
        }

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut slices: Vec<Slice> = Vec::new();
        for value in column_strings(df, column)?.into_iter().flatten() {
            match index.get(&value) {
                Some(&i) => slices[i].count += 1,
                None => {
                    index.insert(value.clone(), slices.len());
                    slices.push(Slice {
                        label: value,
                        count: 1,
                    });
                }
            }
        }
        slices.sort_by(|a, b| b.count.cmp(&a.count));

        Ok(Self {
            column: column.to_string(),
            slices,
        })
    }

    pub fn title(&self) -> String {
        format!("Distribution by {}", self.column)
    }

    pub fn total(&self) -> usize {
        self.slices.iter().map(|s| s.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Share of slice `index` in the whole, 0.0 when there is no data.
    pub fn fraction(&self, index: usize) -> f64 {
        let total = self.total();
        match self.slices.get(index) {
            Some(slice) if total > 0 => slice.count as f64 / total as f64,
            _ => 0.0,
        }
    }

    /// `(start, end)` angle of each slice in radians (math orientation),
    /// starting at 12 o'clock and running clockwise.
    pub fn sectors(&self) -> Vec<(f64, f64)> {
        let mut start = FRAC_PI_2;
        (0..self.slices.len())
            .map(|i| {
                let end = start - self.fraction(i) * TAU;
                let sector = (start, end);
                start = end;
                sector
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_counts() {
        let df = df!("Branch" => ["A", "A", "B"]).unwrap();
        let dist = Distribution::from_table(&df, "Branch").unwrap();
        assert_eq!(
            dist.slices,
            vec![
                Slice {
                    label: "A".to_string(),
                    count: 2
                },
                Slice {
                    label: "B".to_string(),
                    count: 1
                },
            ]
        );
        assert_eq!(dist.title(), "Distribution by Branch");
    }

    #[test]
    fn test_counts_sum_to_non_missing_values() {
        let df = df!("Month" => [Some("Apr"), None, Some("May"), Some("Apr"), None]).unwrap();
        let dist = Distribution::from_table(&df, "Month").unwrap();
        assert_eq!(dist.total(), 3);
    }

    #[test]
    fn test_ties_keep_first_appearance() {
        let df = df!("Branch" => ["B", "A", "C", "A", "B"]).unwrap();
        let dist = Distribution::from_table(&df, "Branch").unwrap();
        let labels: Vec<&str> = dist.slices.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_unknown_column() {
        let df = df!("Branch" => ["A"]).unwrap();
        assert!(Distribution::from_table(&df, "Month").is_err());
    }

    #[test]
    fn test_sectors_cover_circle() {
        let df = df!("Branch" => ["A", "A", "B", "C"]).unwrap();
        let dist = Distribution::from_table(&df, "Branch").unwrap();
        let sectors = dist.sectors();
        assert_eq!(sectors.len(), 3);
        assert!((sectors[0].0 - FRAC_PI_2).abs() < 1e-12);
        assert!((sectors[0].0 - sectors[0].1 - std::f64::consts::PI).abs() < 1e-12);
        let last = sectors.last().unwrap().1;
        assert!((FRAC_PI_2 - last - TAU).abs() < 1e-9);
    }

    #[test]
    fn test_empty_table_has_no_slices() {
        let df = df!("Branch" => Vec::<String>::new()).unwrap();
        let dist = Distribution::from_table(&df, "Branch").unwrap();
        assert!(dist.is_empty());
        assert_eq!(dist.fraction(0), 0.0);
        assert!(dist.sectors().is_empty());
    }

    #[test]
    fn test_candidates() {
        let df = df!(
            "Branch" => [1i64, 2],
            "Month" => [4i64, 5],
            "Model No." => ["X1", "X2"],
            "Return Value" => [1.0f64, 2.0],
            "Date of Purchase" => [1i64, 2],
        )
        .unwrap();
        assert_eq!(chart_candidates(&df), vec!["Branch", "Month", "Model No."]);
    }
}
