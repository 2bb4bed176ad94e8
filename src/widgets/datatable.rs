//! Scrollable view of the filtered table.

use polars::prelude::DataFrame;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, BorderType, Borders, Paragraph, Row, StatefulWidget, Table, Widget},
};

use crate::column::column_strings;

const COLUMN_SPACING: u16 = 2;

#[derive(Debug, Clone, Default)]
pub struct TableViewState {
    /// First visible row.
    pub row_offset: usize,
    /// First visible column.
    pub col_offset: usize,
    /// Data rows that fit, updated on every render.
    pub visible_rows: usize,
}

impl TableViewState {
    pub fn reset(&mut self) {
        self.row_offset = 0;
        self.col_offset = 0;
    }

    fn max_row_offset(&self, num_rows: usize) -> usize {
        num_rows.saturating_sub(self.visible_rows.max(1))
    }

    pub fn scroll_rows(&mut self, delta: isize, num_rows: usize) {
        let target = (self.row_offset as isize + delta).max(0) as usize;
        self.row_offset = target.min(self.max_row_offset(num_rows));
    }

    pub fn page_down(&mut self, num_rows: usize) {
        self.scroll_rows(self.visible_rows.max(1) as isize, num_rows);
    }

    pub fn page_up(&mut self, num_rows: usize) {
        self.scroll_rows(-(self.visible_rows.max(1) as isize), num_rows);
    }

    pub fn scroll_to_start(&mut self) {
        self.row_offset = 0;
    }

    pub fn scroll_to_end(&mut self, num_rows: usize) {
        self.row_offset = self.max_row_offset(num_rows);
    }

    pub fn scroll_cols(&mut self, delta: isize, num_cols: usize) {
        let target = (self.col_offset as isize + delta).max(0) as usize;
        self.col_offset = target.min(num_cols.saturating_sub(1));
    }

    /// Keep offsets valid after the table shrank (e.g. a filter change).
    pub fn clamp(&mut self, num_rows: usize, num_cols: usize) {
        self.row_offset = self.row_offset.min(self.max_row_offset(num_rows));
        self.col_offset = self.col_offset.min(num_cols.saturating_sub(1));
    }
}

pub struct DataTableView<'a> {
    pub df: &'a DataFrame,
    pub title: String,
    pub focused: bool,
    pub border_color: Color,
    pub active_color: Color,
    pub header_color: Color,
    pub dimmed_color: Color,
    pub max_column_width: u16,
}

impl StatefulWidget for DataTableView<'_> {
    type State = TableViewState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let border_style = if self.focused {
            Style::default().fg(self.active_color)
        } else {
            Style::default().fg(self.border_color)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(format!(" {} ", self.title))
            .border_style(border_style);
        let inner = block.inner(area);
        block.render(area, buf);

        if self.df.width() == 0 {
            Paragraph::new("No columns to show")
                .style(Style::default().fg(self.dimmed_color))
                .render(inner, buf);
            return;
        }

        state.visible_rows = inner.height.saturating_sub(1) as usize;
        state.clamp(self.df.height(), self.df.width());

        let window = self.df.slice(state.row_offset as i64, state.visible_rows);
        let names: Vec<String> = window
            .get_column_names()
            .iter()
            .skip(state.col_offset)
            .map(|n| n.to_string())
            .collect();

        let mut headers = Vec::new();
        let mut columns: Vec<Vec<String>> = Vec::new();
        let mut widths = Vec::new();
        let mut used: u16 = 0;
        for name in names {
            let cells: Vec<String> = column_strings(&window, &name)
                .unwrap_or_else(|_| vec![None; window.height()])
                .into_iter()
                .map(Option::unwrap_or_default)
                .collect();
            let width = column_width(&name, &cells, self.max_column_width);
            if used > 0 && used.saturating_add(width) > inner.width {
                break;
            }
            used = used.saturating_add(width + COLUMN_SPACING);
            headers.push(name);
            columns.push(cells);
            widths.push(Constraint::Length(width));
        }

        let rows: Vec<Row> = (0..window.height())
            .map(|r| Row::new(columns.iter().map(|c| c[r].clone())))
            .collect();
        let header_style = Style::default()
            .fg(self.header_color)
            .add_modifier(Modifier::BOLD);

        Widget::render(
            Table::new(rows, widths)
                .column_spacing(COLUMN_SPACING)
                .header(Row::new(headers).style(header_style)),
            inner,
            buf,
        );

        if self.df.height() == 0 && inner.height > 1 {
            let message_area = Rect {
                y: inner.y + 1,
                height: 1,
                ..inner
            };
            Paragraph::new("No rows match the current filters")
                .style(Style::default().fg(self.dimmed_color))
                .render(message_area, buf);
        }
    }
}

/// Widest of header and cells, clamped to `1..=max` before narrowing to `u16`.
fn column_width(name: &str, cells: &[String], max: u16) -> u16 {
    let natural = cells
        .iter()
        .map(|c| c.chars().count())
        .chain(std::iter::once(name.chars().count()))
        .max()
        .unwrap_or(1);
    natural.clamp(1, usize::from(max.max(1))) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    fn render(df: &DataFrame, state: &mut TableViewState, width: u16, height: u16) -> Buffer {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        DataTableView {
            df,
            title: "Data from Purchase Sheet".to_string(),
            focused: false,
            border_color: Color::Reset,
            active_color: Color::Cyan,
            header_color: Color::White,
            dimmed_color: Color::DarkGray,
            max_column_width: 12,
        }
        .render(area, &mut buf, state);
        buf
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut state = TableViewState {
            visible_rows: 10,
            ..Default::default()
        };
        state.scroll_rows(-5, 100);
        assert_eq!(state.row_offset, 0);
        state.page_down(100);
        assert_eq!(state.row_offset, 10);
        state.scroll_to_end(100);
        assert_eq!(state.row_offset, 90);
        state.scroll_rows(50, 100);
        assert_eq!(state.row_offset, 90);
        state.page_up(100);
        assert_eq!(state.row_offset, 80);
        state.clamp(5, 3);
        assert_eq!(state.row_offset, 0);
        state.scroll_cols(7, 3);
        assert_eq!(state.col_offset, 2);
    }

    #[test]
    fn test_renders_header_and_rows() {
        let df = df!(
            "Branch" => ["A", "B"],
            "Bill No." => [Some(7i64), None],
        )
        .unwrap();
        let mut state = TableViewState::default();
        let buf = render(&df, &mut state, 40, 6);
        assert_eq!(state.visible_rows, 3);
        assert!(row_text(&buf, 0).contains("Data from Purchase Sheet"));
        assert!(row_text(&buf, 1).contains("Branch  Bill No."));
        assert!(row_text(&buf, 2).contains("A       7"));
        assert!(row_text(&buf, 3).contains("B"));
    }

    #[test]
    fn test_horizontal_scroll_skips_columns() {
        let df = df!(
            "Branch" => ["A"],
            "Model" => ["X1"],
        )
        .unwrap();
        let mut state = TableViewState::default();
        state.scroll_cols(1, df.width());
        let buf = render(&df, &mut state, 40, 5);
        let header = row_text(&buf, 1);
        assert!(header.contains("Model"));
        assert!(!header.contains("Branch"));
    }

    #[test]
    fn test_column_width_clamps_huge_cells() {
        // 65536 chars would wrap to 0 if narrowed before clamping
        let cells = vec!["x".repeat(65_536)];
        assert_eq!(column_width("Remarks", &cells, 30), 30);
        assert_eq!(column_width("Branch", &["A".to_string()], 30), 6);
        assert_eq!(column_width("", &[], 0), 1);
    }

    #[test]
    fn test_empty_table_message() {
        let df = df!("Branch" => Vec::<String>::new()).unwrap();
        let mut state = TableViewState::default();
        let buf = render(&df, &mut state, 50, 6);
        assert!(row_text(&buf, 2).contains("No rows match the current filters"));
    }
}
