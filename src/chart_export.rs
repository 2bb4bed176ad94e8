//! Pie chart export to PNG (plotters bitmap backend).

use color_eyre::Result;
use std::path::Path;

use crate::distribution::{slice_rgb, Distribution};

const PNG_SIZE: (u32, u32) = (900, 600);
/// Arc segments per full turn; each sector gets a share of these.
const ARC_STEPS: f64 = 360.0;

/// `"{sheet}_{column}_pie.png"`, with path-unfriendly characters replaced.
pub fn pie_file_name(sheet: &str, column: &str) -> String {
    let clean = |s: &str| -> String {
        s.chars()
            .map(|c| {
                if c.is_alphanumeric() || matches!(c, '-' | '_' | ' ' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    };
    format!("{}_{}_pie.png", clean(sheet), clean(column))
}

/// Polygon outline (center + arc) of the sector between two angles,
/// in pixel coordinates (y grows downward).
pub fn sector_polygon(center: (i32, i32), radius: f64, start: f64, end: f64) -> Vec<(i32, i32)> {
    let sweep = (start - end).abs();
    let steps = ((sweep / std::f64::consts::TAU) * ARC_STEPS).ceil().max(1.0) as usize;
    let mut points = Vec::with_capacity(steps + 2);
    points.push(center);
    for step in 0..=steps {
        let angle = start + (end - start) * step as f64 / steps as f64;
        points.push((
            center.0 + (radius * angle.cos()).round() as i32,
            center.1 - (radius * angle.sin()).round() as i32,
        ));
    }
    points
}

/// Write the pie chart with its legend to a PNG file.
pub fn write_pie_png(path: &Path, distribution: &Distribution) -> Result<()> {
    use plotters::prelude::*;

    if distribution.is_empty() {
        return Err(color_eyre::eyre::eyre!("No data to export"));
    }

    let root = BitMapBackend::new(path, PNG_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(&distribution.title(), ("sans-serif", 28))?;

    let (width, height) = root.dim_in_pixel();
    let (pie_area, legend_area) = root.split_horizontally(width * 3 / 5);

    let (pie_w, _) = pie_area.dim_in_pixel();
    let center = ((pie_w / 2) as i32, (height / 2) as i32);
    let radius = (pie_w.min(height) as f64 / 2.0 - 20.0).max(10.0);

    for (idx, (start, end)) in distribution.sectors().into_iter().enumerate() {
        let (r, g, b) = slice_rgb(idx);
        let color = RGBColor(r, g, b);
        pie_area.draw(&Polygon::new(
            sector_polygon(center, radius, start, end),
            color.filled(),
        ))?;
    }

    let total = distribution.total();
    for (idx, slice) in distribution.slices.iter().enumerate() {
        let (r, g, b) = slice_rgb(idx);
        let y = 20 + idx as i32 * 24;
        if y + 20 > height as i32 {
            break;
        }
        legend_area.draw(&Rectangle::new(
            [(10, y), (26, y + 16)],
            RGBColor(r, g, b).filled(),
        ))?;
        let pct = if total > 0 {
            slice.count as f64 * 100.0 / total as f64
        } else {
            0.0
        };
        legend_area.draw(&Text::new(
            format!("{}  {} ({:.1}%)", slice.label, slice.count, pct),
            (34, y),
            ("sans-serif", 16).into_font(),
        ))?;
    }

    root.present()?;
    tracing::info!(path = %path.display(), column = %distribution.column, "exported pie chart");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_pie_file_name() {
        assert_eq!(pie_file_name("Purchase", "Branch"), "Purchase_Branch_pie.png");
        assert_eq!(
            pie_file_name("Return", "Actual Profit/Los"),
            "Return_Actual Profit_Los_pie.png"
        );
    }

    #[test]
    fn test_sector_polygon_starts_at_center_and_top() {
        let points = sector_polygon((100, 100), 50.0, FRAC_PI_2, FRAC_PI_2 - PI);
        assert_eq!(points[0], (100, 100));
        assert_eq!(points[1], (100, 50));
        assert_eq!(*points.last().unwrap(), (100, 150));
        // clockwise from 12 o'clock goes through the right half
        assert!(points.iter().all(|&(x, _)| x >= 100));
    }

    #[test]
    fn test_empty_distribution_is_not_exported() {
        let dist = Distribution {
            column: "Branch".to_string(),
            slices: vec![],
        };
        let dir = tempfile::tempdir().unwrap();
        assert!(write_pie_png(&dir.path().join("pie.png"), &dist).is_err());
    }
}
