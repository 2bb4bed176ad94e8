//! Left-hand sidebar: the sheet picker and the filter checklists.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, StatefulWidget, Widget},
};

use crate::filter::FilterSet;

/// Sheet names as radio options (● active, ○ others).
pub struct SheetList<'a> {
    pub names: &'a [String],
    pub active: usize,
    pub focused: bool,
    pub border_color: Color,
    pub active_color: Color,
}

impl Widget for SheetList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(self.active_color)
        } else {
            Style::default().fg(self.border_color)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(" Select Data Sheet ")
            .border_style(border_style);
        let inner = block.inner(area);
        block.render(area, buf);

        let lines: Vec<Line> = self
            .names
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                if idx == self.active {
                    let mut style = Style::default().fg(self.active_color);
                    if self.focused {
                        style = style.add_modifier(Modifier::BOLD);
                    }
                    Line::from(Span::styled(format!("● {}", name), style))
                } else {
                    Line::from(format!("○ {}", name))
                }
            })
            .collect();
        Paragraph::new(lines).render(inner, buf);
    }
}

/// One line of the filter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterItem {
    /// Filter index.
    Heading(usize),
    /// Filter index, option index.
    Value(usize, usize),
}

/// Flatten every filter into its heading followed by its options.
pub fn filter_items(filters: &FilterSet) -> Vec<FilterItem> {
    let mut items = Vec::new();
    for (f, filter) in filters.filters.iter().enumerate() {
        items.push(FilterItem::Heading(f));
        items.extend((0..filter.options.len()).map(|o| FilterItem::Value(f, o)));
    }
    items
}

#[derive(Debug, Clone, Default)]
pub struct FilterListState {
    pub cursor: usize,
    pub offset: usize,
}

impl FilterListState {
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.offset = 0;
    }

    /// Move the cursor, clamped to `0..len`.
    pub fn move_by(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let target = self.cursor as isize + delta;
        self.cursor = target.clamp(0, len as isize - 1) as usize;
    }

    pub fn current(&self, items: &[FilterItem]) -> Option<FilterItem> {
        items.get(self.cursor).copied()
    }

    /// Index of the filter the cursor is in.
    pub fn current_filter(&self, items: &[FilterItem]) -> Option<usize> {
        self.current(items).map(|item| match item {
            FilterItem::Heading(f) | FilterItem::Value(f, _) => f,
        })
    }

    fn scroll_into_view(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + height {
            self.offset = self.cursor + 1 - height;
        }
    }
}

pub struct FilterList<'a> {
    pub filters: &'a FilterSet,
    pub focused: bool,
    pub border_color: Color,
    pub active_color: Color,
    pub heading_color: Color,
    pub dimmed_color: Color,
}

impl StatefulWidget for FilterList<'_> {
    type State = FilterListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let border_style = if self.focused {
            Style::default().fg(self.active_color)
        } else {
            Style::default().fg(self.border_color)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(" Filter Options ")
            .border_style(border_style);
        let inner = block.inner(area);
        block.render(area, buf);

        if self.filters.is_empty() {
            Paragraph::new("No filterable columns")
                .style(Style::default().fg(self.dimmed_color))
                .render(inner, buf);
            return;
        }

        let items = filter_items(self.filters);
        state.move_by(0, items.len());
        state.scroll_into_view(inner.height as usize);

        let lines: Vec<Line> = items
            .iter()
            .enumerate()
            .skip(state.offset)
            .take(inner.height as usize)
            .map(|(idx, item)| {
                let line = match *item {
                    FilterItem::Heading(f) => {
                        let filter = &self.filters.filters[f];
                        Line::from(vec![
                            Span::styled(
                                filter.label.clone(),
                                Style::default()
                                    .fg(self.heading_color)
                                    .add_modifier(Modifier::BOLD),
                            ),
                            Span::styled(
                                format!(
                                    " ({}/{})",
                                    filter.selected_count(),
                                    filter.options.len()
                                ),
                                Style::default().fg(self.dimmed_color),
                            ),
                        ])
                    }
                    FilterItem::Value(f, o) => {
                        let filter = &self.filters.filters[f];
                        let value = &filter.options[o];
                        let mark = if filter.is_selected(value) {
                            "[x]"
                        } else {
                            "[ ]"
                        };
                        Line::from(format!("  {} {}", mark, value))
                    }
                };
                if self.focused && idx == state.cursor {
                    line.style(Style::default().add_modifier(Modifier::REVERSED))
                } else {
                    line
                }
            })
            .collect();
        Paragraph::new(lines).render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::classify;
    use polars::prelude::*;

    fn filters() -> FilterSet {
        let df = df!(
            "Branch" => ["A", "B", "A"],
            "Model" => ["X1", "Y2", "Y2"],
        )
        .unwrap();
        FilterSet::from_table(&df, &classify(&df)).unwrap()
    }

    #[test]
    fn test_items_flatten_headings_and_values() {
        let items = filter_items(&filters());
        assert_eq!(
            items,
            vec![
                FilterItem::Heading(0),
                FilterItem::Value(0, 0),
                FilterItem::Value(0, 1),
                FilterItem::Heading(1),
                FilterItem::Value(1, 0),
                FilterItem::Value(1, 1),
            ]
        );
    }

    #[test]
    fn test_cursor_is_clamped() {
        let items = filter_items(&filters());
        let mut state = FilterListState::default();
        state.move_by(-3, items.len());
        assert_eq!(state.cursor, 0);
        state.move_by(100, items.len());
        assert_eq!(state.cursor, 5);
        assert_eq!(state.current(&items), Some(FilterItem::Value(1, 1)));
        assert_eq!(state.current_filter(&items), Some(1));
        state.move_by(1, 0);
        assert_eq!(state.cursor, 0);
    }

    #[test]
    fn test_render_scrolls_cursor_into_view() {
        let set = filters();
        let mut state = FilterListState {
            cursor: 5,
            offset: 0,
        };
        let area = Rect::new(0, 0, 30, 5);
        let mut buf = Buffer::empty(area);
        FilterList {
            filters: &set,
            focused: true,
            border_color: Color::Reset,
            active_color: Color::Cyan,
            heading_color: Color::Yellow,
            dimmed_color: Color::DarkGray,
        }
        .render(area, &mut buf, &mut state);
        // three visible lines inside the border
        assert_eq!(state.offset, 3);
        let row: String = (0..30).map(|x| buf[(x, 3)].symbol().to_string()).collect();
        assert!(row.contains("[x] Y2"));
    }
}
