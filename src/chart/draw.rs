//! Chart painters
//!
//! One function per chart kind. Each takes already-validated data and a
//! per-call [`Theme`], and paints onto the drawing area it is given.

use std::error::Error;
use std::ops::Range;

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::canvas::{Area, DrawResult, FONT_FAMILY};
use super::theme::{Theme, blues, coolwarm, normalize};
use super::{HistogramBins, Series, mean, median, min_max};

const MARGIN: u32 = 20;
const X_LABEL_AREA: u32 = 50;
const Y_LABEL_AREA: u32 = 65;

/// Widest span the mesh can place tick marks on
const MAX_AXIS_SPAN: f64 = 1e300;

/// Axis range covering every value with 10% padding on both ends
///
/// The padding is dropped when it would overflow. Values too far apart to
/// share an axis are an error.
fn padded_range(values: impl Iterator<Item = f64>) -> Result<Range<f64>, Box<dyn Error>> {
    let Some((lo, hi)) = min_max(values) else {
        return Ok(0.0..1.0);
    };
    let pad = if hi > lo {
        (hi - lo) * 0.1
    } else {
        (lo.abs() * 0.1).max(1.0)
    };
    plottable(lo - pad, hi + pad).or_else(|_| plottable(lo, hi))
}

/// `start..end` when it has a finite, non-empty span the mesh can lay out
fn plottable(start: f64, end: f64) -> Result<Range<f64>, Box<dyn Error>> {
    let span = end - start;
    if span > 0.0 && span <= MAX_AXIS_SPAN {
        Ok(start..end)
    } else {
        Err(format!("axis range {:e}..{:e} cannot be plotted", start, end).into())
    }
}

pub fn scatter(root: &Area<'_>, theme: &Theme, points: &[(f64, f64)], values: Option<&[f64]>) -> DrawResult {
    root.fill(&theme.background)?;

    let mut chart = ChartBuilder::on(root)
        .caption(
            "Distance Analysis - Point Distribution",
            (FONT_FAMILY, 24).into_font().color(&theme.text),
        )
        .margin(MARGIN)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(
            padded_range(points.iter().map(|p| p.0))?,
            padded_range(points.iter().map(|p| p.1))?,
        )?;

    chart
        .configure_mesh()
        .x_desc("X Coordinate")
        .y_desc("Y Coordinate")
        .axis_desc_style((FONT_FAMILY, 16).into_font().color(&theme.text))
        .label_style((FONT_FAMILY, 13).into_font().color(&theme.text))
        .axis_style(theme.text.stroke_width(1))
        .bold_line_style(theme.grid.mix(0.5).stroke_width(1))
        .light_line_style(theme.grid.mix(0.15).stroke_width(1))
        .draw()?;

    let range = values.and_then(|v| min_max(v.iter().copied()));
    let fill = |i: usize| match (values, range) {
        (Some(values), Some((lo, hi))) => blues(normalize(values[i], lo, hi)),
        _ => theme.primary,
    };
    let label_style = (FONT_FAMILY, 14).into_font().color(&theme.text);

    chart.draw_series(points.iter().enumerate().map(|(i, &(x, y))| {
        EmptyElement::at((x, y))
            + Circle::new((0, 0), 9, fill(i).filled())
            + Text::new(format!("P{}", i), (10, -18), label_style.clone())
    }))?;

    Ok(())
}

pub fn heatmap(root: &Area<'_>, theme: &Theme, matrix: &[Vec<f64>]) -> DrawResult {
    root.fill(&theme.background)?;

    let rows = matrix.len();
    let cols = matrix.iter().map(Vec::len).max().unwrap_or(0);
    let (lo, hi) = min_max(matrix.iter().flatten().copied()).unwrap_or((0.0, 0.0));

    // Cell (r, c) is centered on (c, rows - 1 - r) so row 0 sits at the top
    let mut chart = ChartBuilder::on(root)
        .caption("Distance Matrix Heatmap", (FONT_FAMILY, 24).into_font().color(&theme.text))
        .margin(MARGIN)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(-0.5..cols as f64 - 0.5, -0.5..rows as f64 - 0.5)?;

    let x_label = |v: &f64| index_label(*v, cols).map(|c| format!("P{}", c)).unwrap_or_default();
    let y_label = |v: &f64| {
        index_label(*v, rows)
            .map(|r| format!("P{}", rows - 1 - r))
            .unwrap_or_default()
    };

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(cols)
        .y_labels(rows)
        .x_label_formatter(&x_label)
        .y_label_formatter(&y_label)
        .x_desc("Point Index")
        .y_desc("Point Index")
        .axis_desc_style((FONT_FAMILY, 16).into_font().color(&theme.text))
        .label_style((FONT_FAMILY, 13).into_font().color(&theme.text))
        .axis_style(theme.text.stroke_width(1))
        .draw()?;

    let cell = |r: usize, c: usize| {
        let x = c as f64;
        let y = (rows - 1 - r) as f64;
        (x, y)
    };

    chart.draw_series(matrix.iter().enumerate().flat_map(|(r, row)| {
        row.iter().enumerate().map(move |(c, &value)| {
            let (x, y) = cell(r, c);
            Rectangle::new(
                [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                coolwarm(normalize(value, lo, hi)).filled(),
            )
        })
    }))?;

    // Annotations stop being legible on large matrices
    if rows <= 20 && cols <= 20 {
        let annotation = (FONT_FAMILY, 13)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        chart.draw_series(matrix.iter().enumerate().flat_map(|(r, row)| {
            let annotation = annotation.clone();
            row.iter()
                .enumerate()
                .map(move |(c, &value)| Text::new(format!("{:.2}", value), cell(r, c), annotation.clone()))
        }))?;
    }

    Ok(())
}

/// Index of the cell a tick at `v` is centered on, if any
fn index_label(v: f64, count: usize) -> Option<usize> {
    let rounded = v.round();
    if (v - rounded).abs() > 1e-6 || rounded < 0.0 || rounded >= count as f64 {
        return None;
    }
    Some(rounded as usize)
}

pub fn network(
    root: &Area<'_>,
    theme: &Theme,
    nodes: &[(f64, f64)],
    edges: &[(usize, usize)],
    threshold: f64,
) -> DrawResult {
    root.fill(&theme.background)?;

    let mut chart = ChartBuilder::on(root)
        .caption(
            format!("Network Plot (Connection Threshold: {})", threshold),
            (FONT_FAMILY, 24).into_font().color(&theme.text),
        )
        .margin(MARGIN)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(
            padded_range(nodes.iter().map(|p| p.0))?,
            padded_range(nodes.iter().map(|p| p.1))?,
        )?;

    chart
        .configure_mesh()
        .x_desc("X Coordinate")
        .y_desc("Y Coordinate")
        .axis_desc_style((FONT_FAMILY, 16).into_font().color(&theme.text))
        .label_style((FONT_FAMILY, 13).into_font().color(&theme.text))
        .axis_style(theme.text.stroke_width(1))
        .bold_line_style(theme.grid.mix(0.5).stroke_width(1))
        .light_line_style(theme.grid.mix(0.15).stroke_width(1))
        .draw()?;

    chart.draw_series(
        edges
            .iter()
            .map(|&(i, j)| PathElement::new(vec![nodes[i], nodes[j]], theme.text.mix(0.6).stroke_width(1))),
    )?;

    let label_style = (FONT_FAMILY, 13)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));

    chart.draw_series(nodes.iter().enumerate().map(|(i, &p)| {
        EmptyElement::at(p)
            + Circle::new((0, 0), 16, theme.node.mix(0.9).filled())
            + Text::new(format!("P{}", i), (0, 0), label_style.clone())
    }))?;

    Ok(())
}

pub fn histogram(root: &Area<'_>, theme: &Theme, values: &[f64], bins: usize) -> DrawResult {
    root.fill(&theme.background)?;

    let HistogramBins { start, width, counts } = HistogramBins::new(values, bins);
    let end = start + width * counts.len() as f64;
    let tallest = counts.iter().copied().max().unwrap_or(0).max(1) as f64;
    let x_range = plottable(start - width * 0.5, end + width * 0.5).or_else(|_| plottable(start, end))?;

    let mut chart = ChartBuilder::on(root)
        .caption("Distance Distribution Histogram", (FONT_FAMILY, 24).into_font().color(&theme.text))
        .margin(MARGIN)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(x_range, 0.0..tallest * 1.15)?;

    chart
        .configure_mesh()
        .x_desc("Distance")
        .y_desc("Frequency")
        .axis_desc_style((FONT_FAMILY, 16).into_font().color(&theme.text))
        .label_style((FONT_FAMILY, 13).into_font().color(&theme.text))
        .axis_style(theme.text.stroke_width(1))
        .bold_line_style(theme.grid.mix(0.5).stroke_width(1))
        .light_line_style(theme.grid.mix(0.15).stroke_width(1))
        .draw()?;

    let bar = |i: usize, count: usize| {
        let left = start + width * i as f64;
        [(left, 0.0), (left + width, count as f64)]
    };
    chart.draw_series(
        counts
            .iter()
            .enumerate()
            .map(|(i, &count)| Rectangle::new(bar(i, count), theme.primary.mix(0.7).filled())),
    )?;
    chart.draw_series(
        counts
            .iter()
            .enumerate()
            .map(|(i, &count)| Rectangle::new(bar(i, count), theme.text.stroke_width(1))),
    )?;

    let top = tallest * 1.15;
    let mut reference_line = |value: f64, label: String, color: RGBColor| {
        chart
            .draw_series(LineSeries::new(
                vec![(value, 0.0), (value, top)],
                color.stroke_width(2),
            ))
            .map(|series| {
                series
                    .label(label)
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
            })
    };
    if let Some(mean) = mean(values).filter(|m| m.is_finite()) {
        reference_line(mean, format!("Mean: {:.3}", mean), theme.mean)?;
    }
    if let Some(median) = median(values).filter(|m| m.is_finite()) {
        reference_line(median, format!("Median: {:.3}", median), theme.median)?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(theme.background.mix(0.85).filled())
        .border_style(theme.text.stroke_width(1))
        .label_font((FONT_FAMILY, 14).into_font().color(&theme.text))
        .draw()?;

    Ok(())
}

pub fn line(root: &Area<'_>, theme: &Theme, series: &Series) -> DrawResult {
    root.fill(&theme.background)?;

    let values = &series.values;
    let count = values.len();

    let mut chart = ChartBuilder::on(root)
        .caption("Distance Trend Analysis", (FONT_FAMILY, 24).into_font().color(&theme.text))
        .margin(MARGIN)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(-0.5..count as f64 - 0.5, padded_range(values.iter().copied())?)?;

    let x_label = |v: &f64| match index_label(*v, count) {
        Some(i) => series
            .labels
            .as_ref()
            .map(|labels| labels[i].clone())
            .unwrap_or_else(|| i.to_string()),
        None => String::new(),
    };

    chart
        .configure_mesh()
        .x_labels(count.min(20))
        .x_label_formatter(&x_label)
        .x_desc("Data Points")
        .y_desc("Distance")
        .axis_desc_style((FONT_FAMILY, 16).into_font().color(&theme.text))
        .label_style((FONT_FAMILY, 13).into_font().color(&theme.text))
        .axis_style(theme.text.stroke_width(1))
        .bold_line_style(theme.grid.mix(0.5).stroke_width(1))
        .light_line_style(theme.grid.mix(0.15).stroke_width(1))
        .draw()?;

    let coords = values.iter().enumerate().map(|(i, &v)| (i as f64, v));
    chart.draw_series(LineSeries::new(coords.clone(), theme.primary.stroke_width(2)))?;
    chart.draw_series(coords.map(|p| Circle::new(p, 6, theme.primary.mix(0.8).filled())))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range([0.0, 10.0].into_iter()).unwrap(), -1.0..11.0);
        assert_eq!(padded_range([2.0, 2.0].into_iter()).unwrap(), 1.0..3.0);
        assert_eq!(padded_range(std::iter::empty()).unwrap(), 0.0..1.0);
    }

    #[test]
    fn test_padding_dropped_when_it_would_overflow() {
        let range = padded_range([0.0, 1e300].into_iter()).unwrap();
        assert_eq!(range, 0.0..1e300);
        assert!(padded_range([0.0, 1e200].into_iter()).unwrap().end.is_finite());
    }

    #[test]
    fn test_unplottable_spans() {
        assert!(padded_range([0.0, 1.7e308].into_iter()).is_err());
        assert!(padded_range([-1e308, 1e308].into_iter()).is_err());
        assert!(padded_range([f64::MAX, f64::MAX].into_iter()).is_err());
        assert!(plottable(1.0, 1.0).is_err());
        assert!(plottable(0.0, f64::INFINITY).is_err());
    }
}
