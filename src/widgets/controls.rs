use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Paragraph, Widget},
};

/// Bottom bar: key hints on the left, filtered/total row count on the right.
pub struct Controls {
    pub rows: Option<(usize, usize)>,
    pub controls: Vec<(&'static str, &'static str)>,
    pub bg_color: Color,
    pub key_color: Color,
    pub label_color: Color,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            rows: None,
            controls: DEFAULT_CONTROLS.to_vec(),
            bg_color: Color::Indexed(236),
            key_color: Color::Cyan,
            label_color: Color::White,
        }
    }
}

const DEFAULT_CONTROLS: [(&str, &str); 6] = [
    ("Tab", "Focus"),
    ("e", "Export CSV"),
    ("p", "Save Pie"),
    ("r", "Reset"),
    ("?", "Help"),
    ("q", "Quit"),
];

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    /// `shown` rows out of `total` in the active sheet.
    pub fn with_rows(mut self, shown: usize, total: usize) -> Self {
        self.rows = Some((shown, total));
        self
    }

    /// Focus-specific hints go in front of the global ones.
    pub fn with_context_controls(mut self, controls: &[(&'static str, &'static str)]) -> Self {
        let mut all = controls.to_vec();
        all.extend(DEFAULT_CONTROLS);
        self.controls = all;
        self
    }

    pub fn with_colors(mut self, bg_color: Color, key_color: Color, label_color: Color) -> Self {
        self.bg_color = bg_color;
        self.key_color = key_color;
        self.label_color = label_color;
        self
    }
}

impl Widget for &Controls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let no_bg = self.bg_color == Color::Reset;
        if !no_bg {
            Block::default()
                .style(Style::default().bg(self.bg_color))
                .render(area, buf);
        }

        // Key: key.len() + 1. Label: action.len() + 1 (gap before the next key).
        let pair_width = |(key, action): &(&str, &str)| -> u16 {
            (key.chars().count() as u16 + 1) + (action.chars().count() as u16 + 1)
        };

        let rows_text = self.rows.map(|(shown, total)| {
            format!(
                "Rows: {} / {}",
                format_number_with_commas(shown),
                format_number_with_commas(total)
            )
        });
        let right_reserved = rows_text
            .as_ref()
            .map(|t| t.chars().count() as u16 + 1)
            .unwrap_or(1);
        let mut available = area.width.saturating_sub(right_reserved);

        let mut n_show = 0;
        for pair in self.controls.iter() {
            let need = pair_width(pair);
            if available >= need {
                available -= need;
                n_show += 1;
            } else {
                break;
            }
        }

        let mut constraints: Vec<Constraint> = self
            .controls
            .iter()
            .take(n_show)
            .flat_map(|(key, action)| {
                [
                    Constraint::Length(key.chars().count() as u16 + 1),
                    Constraint::Length(action.chars().count() as u16 + 1),
                ]
            })
            .collect();
        constraints.push(Constraint::Fill(1));
        if let Some(text) = &rows_text {
            constraints.push(Constraint::Length(text.chars().count() as u16 + 1));
        }

        let layout = Layout::new(Direction::Horizontal, constraints).split(area);

        let (key_style, label_style) = if no_bg {
            (
                Style::default().fg(self.key_color),
                Style::default().fg(self.label_color),
            )
        } else {
            let base = Style::default().bg(self.bg_color);
            (base.fg(self.key_color), base.fg(self.label_color))
        };

        for (i, (key, action)) in self.controls.iter().take(n_show).enumerate() {
            let j = i * 2;
            Paragraph::new(*key).style(key_style).render(layout[j], buf);
            Paragraph::new(*action)
                .style(label_style)
                .render(layout[j + 1], buf);
        }

        if let Some(text) = rows_text {
            Paragraph::new(text)
                .style(label_style)
                .right_aligned()
                .render(layout[n_show * 2 + 1], buf);
        }
    }
}

pub fn format_number_with_commas(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let chars: Vec<char> = s.chars().rev().collect();

    for (i, ch) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*ch);
    }

    result.chars().rev().collect()
}
