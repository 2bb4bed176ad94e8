//! Workbook loading: reads the configured sheets with calamine and turns each
//! into a typed polars `DataFrame` holding only the allow-listed columns.

use std::collections::HashSet;
use std::path::Path;

use calamine::{open_workbook_auto, Data, DataType as _, Reader};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;

use crate::column::{classify, ColumnInfo};
use crate::config::SheetConfig;

/// One loaded sheet: its name, its table and the classification of its columns.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub df: DataFrame,
    pub columns: Vec<ColumnInfo>,
}

impl Sheet {
    pub fn new(name: &str, df: DataFrame) -> Self {
        let columns = classify(&df);
        Self {
            name: name.to_string(),
            df,
            columns,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.df.height()
    }
}

/// The configured sheets that were found in the workbook, in configuration order.
/// Built once per session and never mutated.
#[derive(Debug, Clone)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    /// Open `path` and load every sheet named in `config` that the file contains.
    pub fn open(path: &Path, config: &[SheetConfig]) -> Result<Self> {
        let mut workbook = open_workbook_auto(path)
            .map_err(|e| eyre!("Could not open workbook {}: {}", path.display(), e))?;
        let available = workbook.sheet_names().to_vec();
        tracing::info!(path = %path.display(), sheets = ?available, "opened workbook");

        let mut ranges = Vec::with_capacity(config.len());
        for sheet in config {
            if !available.iter().any(|name| name == &sheet.name) {
                tracing::debug!(sheet = %sheet.name, "configured sheet not in workbook, skipping");
                continue;
            }
            let range = workbook
                .worksheet_range(&sheet.name)
                .map_err(|e| eyre!("Could not read sheet '{}': {}", sheet.name, e))?;
            let rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();
            ranges.push((sheet.name.clone(), rows));
        }

        Self::from_ranges(ranges, config)
    }

    /// Build a workbook from already-read sheet rows (first row = headers).
    /// Sheets not named in `config` are ignored; the result follows `config` order.
    pub fn from_ranges(
        ranges: Vec<(String, Vec<Vec<Data>>)>,
        config: &[SheetConfig],
    ) -> Result<Self> {
        let mut sheets = Vec::new();
        for sheet_config in config {
            let Some((_, rows)) = ranges.iter().find(|(name, _)| name == &sheet_config.name)
            else {
                continue;
            };
            let df = sheet_to_frame(rows, sheet_config)?;
            tracing::info!(
                sheet = %sheet_config.name,
                rows = df.height(),
                columns = df.width(),
                "loaded sheet"
            );
            sheets.push(Sheet::new(&sheet_config.name, df));
        }

        if sheets.is_empty() {
            let expected: Vec<&str> = config.iter().map(|s| s.name.as_str()).collect();
            return Err(eyre!(
                "Workbook contains none of the configured sheets ({})",
                expected.join(", ")
            ));
        }

        Ok(Self { sheets })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    pub fn get(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

/// Turn sheet rows into a frame keeping only allow-listed headers, in sheet order.
fn sheet_to_frame(rows: &[Vec<Data>], config: &SheetConfig) -> Result<DataFrame> {
    let Some(header_row) = rows.first() else {
        return Ok(DataFrame::new(vec![])?);
    };

    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for (col_idx, cell) in header_row.iter().enumerate() {
        let header = cell.as_string().unwrap_or_else(|| cell.to_string());
        if !config.allows(&header) || !seen.insert(header.clone()) {
            continue;
        }
        let cells: Vec<Option<&Data>> =
            rows[1..].iter().map(|row| row.get(col_idx)).collect();
        let series = cells_to_series(&header, &cells, infer_cell_type(&cells))?;
        columns.push(series.into());
    }

    Ok(DataFrame::new(columns)?)
}

/// Inferred type for a worksheet column (keeps numbers and dates typed instead of stringifying).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellType {
    Int64,
    Float64,
    Boolean,
    Utf8,
    Date,
    Datetime,
}

/// Any text cell makes the column text, unless every non-empty cell parses as a date.
/// Whole-number floats become Int64; Excel date serials become Date when all at midnight.
fn infer_cell_type(cells: &[Option<&Data>]) -> CellType {
    let mut has_string = false;
    let mut has_float = false;
    let mut has_int = false;
    let mut has_bool = false;
    let mut has_datetime = false;
    for cell in cells.iter().flatten() {
        if cell.is_string() {
            has_string = true;
            break;
        }
        if cell.is_float() {
            has_float = true;
        }
        if cell.is_int() {
            has_int = true;
        }
        if cell.is_bool() {
            has_bool = true;
        }
        if cell.is_datetime() || cell.is_datetime_iso() {
            has_datetime = true;
        }
    }

    if has_string {
        let non_empty: Vec<&Data> = cells
            .iter()
            .flatten()
            .copied()
            .filter(|c| !c.is_empty())
            .collect();
        let all_dates = !non_empty.is_empty()
            && non_empty.iter().all(|c| cell_to_naive_datetime(c).is_some());
        if all_dates {
            date_or_datetime(cells)
        } else {
            CellType::Utf8
        }
    } else if has_datetime {
        date_or_datetime(cells)
    } else if has_int || has_float {
        // Int cells are whole; a single fractional float keeps the column Float64
        let all_whole = cells.iter().flatten().all(|cell| {
            cell.as_f64()
                .is_none_or(|f| f.is_finite() && (f - f.trunc()).abs() < 1e-10)
        });
        if all_whole {
            CellType::Int64
        } else {
            CellType::Float64
        }
    } else if has_bool {
        CellType::Boolean
    } else {
        CellType::Utf8
    }
}

fn date_or_datetime(cells: &[Option<&Data>]) -> CellType {
    let midnight = NaiveTime::MIN;
    let all_midnight = cells
        .iter()
        .flatten()
        .filter_map(|c| cell_to_naive_datetime(c))
        .all(|dt| dt.time() == midnight);
    if all_midnight {
        CellType::Date
    } else {
        CellType::Datetime
    }
}

/// Excel serial, ISO datetime cell, or a string in one of the accepted layouts.
fn cell_to_naive_datetime(cell: &Data) -> Option<NaiveDateTime> {
    if let Some(dt) = cell.as_datetime() {
        return Some(dt);
    }
    let s = cell.get_datetime_iso().or_else(|| cell.get_string())?;
    parse_naive_datetime_str(s)
}

fn parse_naive_datetime_str(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y"];

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

fn cells_to_series(name: &str, cells: &[Option<&Data>], cell_type: CellType) -> Result<Series> {
    let series = match cell_type {
        CellType::Int64 => {
            let v: Vec<Option<i64>> = cells
                .iter()
                .map(|c| c.filter(|cell| !cell.is_empty()).and_then(|cell| cell.as_i64()))
                .collect();
            Series::new(name.into(), v)
        }
        CellType::Float64 => {
            let v: Vec<Option<f64>> = cells
                .iter()
                .map(|c| c.filter(|cell| !cell.is_empty()).and_then(|cell| cell.as_f64()))
                .collect();
            Series::new(name.into(), v)
        }
        CellType::Boolean => {
            let v: Vec<Option<bool>> = cells
                .iter()
                .map(|c| c.and_then(|cell| cell.get_bool()))
                .collect();
            Series::new(name.into(), v)
        }
        CellType::Utf8 => {
            let v: Vec<Option<String>> = cells
                .iter()
                .map(|c| {
                    c.and_then(|cell| cell.as_string())
                        .filter(|text| !text.is_empty())
                })
                .collect();
            Series::new(name.into(), v)
        }
        CellType::Date => {
            let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
                .ok_or_else(|| eyre!("invalid epoch date"))?;
            let v: Vec<Option<i32>> = cells
                .iter()
                .map(|c| {
                    c.and_then(cell_to_naive_datetime)
                        .map(|dt| (dt.date() - epoch).num_days() as i32)
                })
                .collect();
            Series::new(name.into(), v).cast(&DataType::Date)?
        }
        CellType::Datetime => {
            let v: Vec<Option<i64>> = cells
                .iter()
                .map(|c| {
                    c.and_then(cell_to_naive_datetime)
                        .map(|dt| dt.and_utc().timestamp_micros())
                })
                .collect();
            Series::new(name.into(), v).cast(&DataType::Datetime(TimeUnit::Microseconds, None))?
        }
    };
    Ok(series)
}
