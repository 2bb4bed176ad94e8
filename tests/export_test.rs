use ggcdash::column::column_strings;
use ggcdash::config::default_sheets;
use ggcdash::{compute_view, DashboardState, ExportArtifact, FilterKind, Workbook};
use polars::prelude::*;
use tempfile::TempDir;

mod common;
use common::sample_workbook;

fn read_csv(path: &std::path::Path) -> DataFrame {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .unwrap()
        .finish()
        .unwrap()
}

#[test]
fn test_csv_round_trip_of_filtered_table() {
    let dir = TempDir::new().unwrap();
    let path = sample_workbook(dir.path());
    let workbook = Workbook::open(&path, &default_sheets()).unwrap();
    let mut state = DashboardState::for_sheet(&workbook, 1).unwrap();
    state
        .filters
        .find_mut(FilterKind::Column, "Branch")
        .unwrap()
        .set_selected(&["B"]);
    let view = compute_view(&workbook, &state).unwrap();

    let artifact = ExportArtifact::csv(&view.sheet_name, &view.filtered).unwrap();
    assert_eq!(artifact.file_name, "Return_filtered.csv");
    assert_eq!(artifact.mime, "text/csv");

    let saved = artifact.save(&dir.path().join("exports")).unwrap();
    let decoded = read_csv(&saved);

    assert_eq!(decoded.get_column_names(), view.filtered.get_column_names());
    assert_eq!(decoded.height(), 2);
    for name in view.filtered.get_column_names() {
        assert_eq!(
            column_strings(&decoded, name).unwrap(),
            column_strings(&view.filtered, name).unwrap(),
            "column {}",
            name
        );
    }
}

#[test]
fn test_header_row_without_index_column() {
    let dir = TempDir::new().unwrap();
    let path = sample_workbook(dir.path());
    let workbook = Workbook::open(&path, &default_sheets()).unwrap();
    let state = DashboardState::for_sheet(&workbook, 0).unwrap();
    let view = compute_view(&workbook, &state).unwrap();

    let artifact = ExportArtifact::csv(&view.sheet_name, &view.filtered).unwrap();
    let text = String::from_utf8(artifact.bytes).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("Month,Branch,Vendor Name,Model No.,Bill No.,Date of Purchase")
    );
    assert_eq!(
        lines.next(),
        Some("April,A,Acme Traders,HP 250 G8,101,2024-04-01")
    );
    assert_eq!(lines.count(), 2);
}

#[test]
fn test_empty_selection_exports_header_only() {
    let dir = TempDir::new().unwrap();
    let path = sample_workbook(dir.path());
    let workbook = Workbook::open(&path, &default_sheets()).unwrap();
    let mut state = DashboardState::for_sheet(&workbook, 0).unwrap();
    state
        .filters
        .find_mut(FilterKind::Vendor, "Vendor Name")
        .unwrap()
        .select_none();
    let view = compute_view(&workbook, &state).unwrap();
    assert_eq!(view.filtered.height(), 0);

    let artifact = ExportArtifact::csv(&view.sheet_name, &view.filtered).unwrap();
    let text = String::from_utf8(artifact.bytes).unwrap();
    assert_eq!(text.lines().count(), 1);
}

#[test]
fn test_date_column_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = sample_workbook(dir.path());
    let workbook = Workbook::open(&path, &default_sheets()).unwrap();
    let mut state = DashboardState::for_sheet(&workbook, 0).unwrap();
    state
        .filters
        .find_mut(FilterKind::Column, "Date of Purchase")
        .unwrap()
        .set_selected(&["2024-04-15", "2024-05-02"]);
    let view = compute_view(&workbook, &state).unwrap();
    assert_eq!(view.filtered.height(), 2);

    let saved = ExportArtifact::csv(&view.sheet_name, &view.filtered)
        .unwrap()
        .save(dir.path())
        .unwrap();
    let decoded = read_csv(&saved);
    assert_eq!(
        column_strings(&decoded, "Date of Purchase").unwrap(),
        vec![Some("2024-04-15".to_string()), Some("2024-05-02".to_string())]
    );
    assert_eq!(
        column_strings(&decoded, "Date of Purchase").unwrap(),
        column_strings(&view.filtered, "Date of Purchase").unwrap()
    );
}
