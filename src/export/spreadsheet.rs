//! Excel workbook export
//!
//! Produces a `Summary` sheet always, plus `Distance_Matrix` and
//! `Calculation_Pairs` sheets when those sections are present. The workbook
//! bytes are returned base64 encoded.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, Worksheet};
use serde_json::Value;

use super::{ExportContext, ExportError, matrix_section, numeric_matrix, numeric_pairs, pairs_section};

pub fn to_xlsx(results: &Value, ctx: &ExportContext<'_>) -> Result<String, ExportError> {
    let matrix = matrix_section(results)?.as_deref().map(numeric_matrix).transpose()?;
    let pairs = pairs_section(results)?.as_deref().map(numeric_pairs).transpose()?;
    let header = Format::new().set_bold();

    let mut workbook = Workbook::new();

    let mut summary = Worksheet::new();
    summary.set_name("Summary")?;
    summary.write_string_with_format(0, 0, "Metric", &header)?;
    summary.write_string_with_format(0, 1, "Value", &header)?;
    summary.write_string(1, 0, "Export Timestamp")?;
    summary.write_string(1, 1, &ctx.timestamp)?;
    summary.write_string(2, 0, "Data Type")?;
    summary.write_string(2, 1, "Distance Analysis Results")?;
    summary.write_string(3, 0, "Record Count")?;
    summary.write_number(3, 1, ctx.original_size as f64)?;
    summary.set_column_width(0, 20)?;
    summary.set_column_width(1, 36)?;
    workbook.push_worksheet(summary);

    if let Some(matrix) = matrix {
        let mut sheet = Worksheet::new();
        sheet.set_name("Distance_Matrix")?;
        for i in 0..matrix.len() {
            let (row, col) = cell(i + 1, i + 1)?;
            sheet.write_string_with_format(0, col, format!("P{}", i), &header)?;
            sheet.write_string_with_format(row, 0, format!("P{}", i), &header)?;
        }
        for (i, values) in matrix.iter().enumerate() {
            for (j, &value) in values.iter().enumerate() {
                let (row, col) = cell(i + 1, j + 1)?;
                sheet.write_number(row, col, value)?;
            }
        }
        workbook.push_worksheet(sheet);
    }

    if let Some(pairs) = pairs {
        let mut sheet = Worksheet::new();
        sheet.set_name("Calculation_Pairs")?;
        sheet.write_string_with_format(0, 0, "Point_A", &header)?;
        sheet.write_string_with_format(0, 1, "Point_B", &header)?;
        sheet.write_string_with_format(0, 2, "Distance", &header)?;
        for (i, pair) in pairs.iter().enumerate() {
            let (row, _) = cell(i + 1, 0)?;
            sheet.write_string(row, 0, format!("P{}", pair.a))?;
            sheet.write_string(row, 1, format!("P{}", pair.b))?;
            sheet.write_number(row, 2, pair.distance)?;
        }
        workbook.push_worksheet(sheet);
    }

    let bytes = workbook.save_to_buffer()?;
    Ok(BASE64.encode(bytes))
}

/// Worksheet coordinates for zero-based indices
fn cell(row: usize, col: usize) -> Result<(RowNum, ColNum), ExportError> {
    let too_large = || ExportError::Encode(format!("cell ({}, {}) exceeds worksheet limits", row, col));
    Ok((
        RowNum::try_from(row).map_err(|_| too_large())?,
        ColNum::try_from(col).map_err(|_| too_large())?,
    ))
}
