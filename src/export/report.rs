//! Human-readable text and HTML reports

use std::io::{self, Write};

use quick_xml::escape::escape;
use serde_json::{Map, Value};

use super::{
    ExportContext, ExportError, NumericPair, display_value, matrix_section, metadata_section, numeric_matrix,
    numeric_pairs, pairs_section,
};

const RULE: &str = "==================================================";
const SUB_RULE: &str = "------------------------------";

/// Everything a report shows, already validated
pub struct ReportData<'a> {
    pub timestamp: &'a str,
    pub matrix: Option<Vec<Vec<f64>>>,
    pub pairs: Option<Vec<NumericPair>>,
    pub metadata: Option<&'a Map<String, Value>>,
}

impl<'a> ReportData<'a> {
    fn read(results: &'a Value, ctx: &'a ExportContext<'_>) -> Result<Self, ExportError> {
        Ok(Self {
            timestamp: &ctx.timestamp,
            matrix: matrix_section(results)?.as_deref().map(numeric_matrix).transpose()?,
            pairs: pairs_section(results)?.as_deref().map(numeric_pairs).transpose()?,
            metadata: metadata_section(results)?,
        })
    }
}

pub fn to_text(results: &Value, ctx: &ExportContext<'_>) -> Result<String, ExportError> {
    let data = ReportData::read(results, ctx)?;
    let mut out = Vec::new();
    write_text_report(&data, &mut out).map_err(|e| ExportError::Encode(e.to_string()))?;
    String::from_utf8(out).map_err(|e| ExportError::Encode(e.to_string()))
}

pub fn to_html(results: &Value, ctx: &ExportContext<'_>) -> Result<String, ExportError> {
    let data = ReportData::read(results, ctx)?;
    let mut out = Vec::new();
    write_html_report(&data, &mut out).map_err(|e| ExportError::Encode(e.to_string()))?;
    String::from_utf8(out).map_err(|e| ExportError::Encode(e.to_string()))
}

/// Fixed-width plain text report
pub fn write_text_report<W: Write>(data: &ReportData<'_>, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "DISTANCE ANALYSIS RESULTS")?;
    writeln!(writer, "{}", RULE)?;
    writeln!(writer, "Export Timestamp: {}", data.timestamp)?;
    writeln!(writer)?;

    if let Some(matrix) = &data.matrix {
        writeln!(writer, "DISTANCE MATRIX:")?;
        writeln!(writer, "{}", SUB_RULE)?;

        write!(writer, "{:6}", "")?;
        for i in 0..matrix.len() {
            write!(writer, "{:>8}", format!("P{}", i))?;
        }
        writeln!(writer)?;

        for (i, row) in matrix.iter().enumerate() {
            write!(writer, "{:<6}", format!("P{}", i))?;
            for value in row {
                write!(writer, "{:>8.3}", value)?;
            }
            writeln!(writer)?;
        }
        writeln!(writer)?;
    }

    if let Some(pairs) = &data.pairs {
        writeln!(writer, "CALCULATION PAIRS:")?;
        writeln!(writer, "{}", SUB_RULE)?;
        for pair in pairs {
            writeln!(writer, "P{} <-> P{}: {:.6}", pair.a, pair.b, pair.distance)?;
        }
        writeln!(writer)?;
    }

    if let Some(metadata) = data.metadata {
        writeln!(writer, "METADATA:")?;
        writeln!(writer, "{}", SUB_RULE)?;
        for (key, value) in metadata {
            writeln!(writer, "{}: {}", key, display_value(value))?;
        }
    }

    Ok(())
}

const STYLE: &str = "\
        body { font-family: Arial, sans-serif; margin: 40px; color: #2c3e50; }
        h1 { border-bottom: 2px solid #3498db; padding-bottom: 8px; }
        table { border-collapse: collapse; margin: 16px 0; }
        th, td { border: 1px solid #ddd; padding: 6px 10px; text-align: right; }
        th { background: #3498db; color: #fff; }
        .timestamp { color: #7f8c8d; }
        .section { margin-top: 28px; }";

/// Self-contained HTML report
pub fn write_html_report<W: Write>(data: &ReportData<'_>, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "<!DOCTYPE html>")?;
    writeln!(writer, "<html>")?;
    writeln!(writer, "<head>")?;
    writeln!(writer, "    <meta charset=\"utf-8\">")?;
    writeln!(writer, "    <title>Distance Analysis Results</title>")?;
    writeln!(writer, "    <style>")?;
    writeln!(writer, "{}", STYLE)?;
    writeln!(writer, "    </style>")?;
    writeln!(writer, "</head>")?;
    writeln!(writer, "<body>")?;
    writeln!(writer, "    <h1>Distance Analysis Results</h1>")?;
    writeln!(
        writer,
        "    <p class=\"timestamp\">Export Timestamp: {}</p>",
        escape(data.timestamp)
    )?;

    if let Some(matrix) = &data.matrix {
        writeln!(writer, "    <div class=\"section\">")?;
        writeln!(writer, "    <h2>Distance Matrix</h2>")?;
        writeln!(writer, "    <table>")?;
        write!(writer, "        <tr><th></th>")?;
        for i in 0..matrix.len() {
            write!(writer, "<th>P{}</th>", i)?;
        }
        writeln!(writer, "</tr>")?;
        for (i, row) in matrix.iter().enumerate() {
            write!(writer, "        <tr><th>P{}</th>", i)?;
            for value in row {
                write!(writer, "<td>{:.3}</td>", value)?;
            }
            writeln!(writer, "</tr>")?;
        }
        writeln!(writer, "    </table>")?;
        writeln!(writer, "    </div>")?;
    }

    if let Some(pairs) = &data.pairs {
        writeln!(writer, "    <div class=\"section\">")?;
        writeln!(writer, "    <h2>Calculation Pairs</h2>")?;
        writeln!(writer, "    <table>")?;
        writeln!(writer, "        <tr><th>Point A</th><th>Point B</th><th>Distance</th></tr>")?;
        for pair in pairs {
            writeln!(
                writer,
                "        <tr><td>P{}</td><td>P{}</td><td>{:.6}</td></tr>",
                pair.a, pair.b, pair.distance
            )?;
        }
        writeln!(writer, "    </table>")?;
        writeln!(writer, "    </div>")?;
    }

    if let Some(metadata) = data.metadata {
        writeln!(writer, "    <div class=\"section\">")?;
        writeln!(writer, "    <h2>Metadata</h2>")?;
        writeln!(writer, "    <table>")?;
        for (key, value) in metadata {
            writeln!(
                writer,
                "        <tr><th>{}</th><td>{}</td></tr>",
                escape(key.as_str()),
                escape(display_value(value).as_str())
            )?;
        }
        writeln!(writer, "    </table>")?;
        writeln!(writer, "    </div>")?;
    }

    writeln!(writer, "</body>")?;
    writeln!(writer, "</html>")?;
    Ok(())
}
