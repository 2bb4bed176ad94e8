//! Terminal pie chart: braille canvas plus a legend.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Points},
        Paragraph, Widget,
    },
};

use crate::distribution::{slice_rgb, Distribution};

/// Radial rings used to fill each sector.
const RINGS: usize = 40;
/// Points per radian on the outer ring.
const DENSITY: f64 = 60.0;
/// Canvas margin around the unit circle.
const MARGIN: f64 = 1.05;

pub fn slice_color(index: usize) -> Color {
    let (r, g, b) = slice_rgb(index);
    Color::Rgb(r, g, b)
}

/// Sample points filling the sector between `start` and `end` (radians) of
/// the unit circle.
pub fn sector_points(start: f64, end: f64) -> Vec<(f64, f64)> {
    let sweep = end - start;
    let mut points = Vec::new();
    for ring in 1..=RINGS {
        let radius = ring as f64 / RINGS as f64;
        let steps = (sweep.abs() * radius * DENSITY).ceil().max(1.0) as usize;
        for step in 0..=steps {
            let angle = start + sweep * step as f64 / steps as f64;
            points.push((radius * angle.cos(), radius * angle.sin()));
        }
    }
    points
}

/// Canvas bounds that keep the circle round. Terminal cells are about twice
/// as tall as they are wide.
pub fn canvas_bounds(width: u16, height: u16) -> ([f64; 2], [f64; 2]) {
    let ratio = if height == 0 {
        1.0
    } else {
        width as f64 / (2.0 * height as f64)
    };
    if ratio >= 1.0 {
        ([-MARGIN * ratio, MARGIN * ratio], [-MARGIN, MARGIN])
    } else {
        ([-MARGIN, MARGIN], [-MARGIN / ratio, MARGIN / ratio])
    }
}

pub struct PieChart<'a> {
    pub distribution: &'a Distribution,
    pub text_color: Color,
    pub dimmed_color: Color,
}

impl Widget for PieChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.distribution.is_empty() {
            Paragraph::new("No data")
                .style(Style::default().fg(self.dimmed_color))
                .centered()
                .render(area, buf);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Fill(1)])
            .split(area);

        let sectors: Vec<(Vec<(f64, f64)>, Color)> = self
            .distribution
            .sectors()
            .into_iter()
            .enumerate()
            .map(|(idx, (start, end))| (sector_points(start, end), slice_color(idx)))
            .collect();

        let (x_bounds, y_bounds) = canvas_bounds(chunks[0].width, chunks[0].height);
        Canvas::default()
            .marker(Marker::Braille)
            .x_bounds(x_bounds)
            .y_bounds(y_bounds)
            .paint(|ctx| {
                for (coords, color) in &sectors {
                    ctx.draw(&Points {
                        coords: coords.as_slice(),
                        color: *color,
                    });
                }
            })
            .render(chunks[0], buf);

        let total = self.distribution.total();
        let lines: Vec<Line> = self
            .distribution
            .slices
            .iter()
            .enumerate()
            .map(|(idx, slice)| {
                let pct = slice.count as f64 * 100.0 / total as f64;
                Line::from(vec![
                    Span::styled("■ ", Style::default().fg(slice_color(idx))),
                    Span::styled(
                        format!("{}  {}  {:.1}%", slice.label, slice.count, pct),
                        Style::default().fg(self.text_color),
                    ),
                ])
            })
            .collect();
        Paragraph::new(lines).render(chunks[1], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::Slice;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_sector_points_stay_in_sector() {
        // right half, clockwise from 12 o'clock to 6 o'clock
        let points = sector_points(FRAC_PI_2, FRAC_PI_2 - PI);
        assert!(!points.is_empty());
        for (x, y) in points {
            assert!(x >= -1e-9);
            assert!(x * x + y * y <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn test_bounds_keep_aspect() {
        let (x, y) = canvas_bounds(40, 10);
        assert!((x[1] - 2.0 * MARGIN).abs() < 1e-9);
        assert!((y[1] - MARGIN).abs() < 1e-9);
        let (x, y) = canvas_bounds(10, 10);
        assert!((x[1] - MARGIN).abs() < 1e-9);
        assert!((y[1] - 2.0 * MARGIN).abs() < 1e-9);
    }

    #[test]
    fn test_legend_shows_counts_and_percentages() {
        let dist = Distribution {
            column: "Branch".to_string(),
            slices: vec![
                Slice {
                    label: "A".to_string(),
                    count: 2,
                },
                Slice {
                    label: "B".to_string(),
                    count: 1,
                },
            ],
        };
        let area = Rect::new(0, 0, 60, 10);
        let mut buf = Buffer::empty(area);
        PieChart {
            distribution: &dist,
            text_color: Color::White,
            dimmed_color: Color::DarkGray,
        }
        .render(area, &mut buf);
        assert!(row_text(&buf, 0).contains("A  2  66.7%"));
        assert!(row_text(&buf, 1).contains("B  1  33.3%"));
    }

    #[test]
    fn test_empty_distribution_says_no_data() {
        let dist = Distribution {
            column: "Branch".to_string(),
            slices: vec![],
        };
        let area = Rect::new(0, 0, 30, 3);
        let mut buf = Buffer::empty(area);
        PieChart {
            distribution: &dist,
            text_color: Color::White,
            dimmed_color: Color::DarkGray,
        }
        .render(area, &mut buf);
        assert!(row_text(&buf, 0).contains("No data"));
    }
}
