//! Result export in common file formats
//!
//! Takes an arbitrary JSON result structure (typically a batch result with
//! `distance_matrix`, `calculation_pairs` and `metadata`) and serializes it
//! as one of:
//!
//! | Format  | Output                                     | Extension |
//! |---------|--------------------------------------------|-----------|
//! | `json`  | envelope with export info + original data  | `.json`   |
//! | `csv`   | matrix, pair list or key/value dump        | `.csv`    |
//! | `xml`   | nested elements, `item_N` for sequences    | `.xml`    |
//! | `excel` | base64 workbook with summary/matrix/pairs  | `.xlsx`   |
//! | `txt`   | fixed-width plain report                   | `.txt`    |
//! | `html`  | self-contained styled report               | `.html`   |

mod markup;
mod report;
mod spreadsheet;
mod tabular;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::config::ExportSettings;
use crate::metadata::{format_timestamp, new_id};

pub use markup::element_name;

/// Errors raised while exporting results
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("Malformed results: {0}")]
    MalformedResults(String),

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet encoding failed: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
    Xml,
    Excel,
    Txt,
    Html,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 6] = [
        ExportFormat::Json,
        ExportFormat::Csv,
        ExportFormat::Xml,
        ExportFormat::Excel,
        ExportFormat::Txt,
        ExportFormat::Html,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Xml => "xml",
            ExportFormat::Excel => "excel",
            ExportFormat::Txt => "txt",
            ExportFormat::Html => "html",
        }
    }

    /// File extension used for generated filenames
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Excel => "xlsx",
            other => other.name(),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExportFormat::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| ExportError::UnsupportedFormat(s.to_string()))
    }
}

/// Export-wide values shared by every format writer
pub(crate) struct ExportContext<'a> {
    pub timestamp: String,
    pub version: &'a str,
    /// Length of the compact JSON form of the results
    pub original_size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportMetadata {
    pub timestamp: String,
    pub export_id: String,
    pub original_data_size: usize,
}

/// Response body for an export
#[derive(Debug, Clone, Serialize)]
pub struct ExportResponse {
    pub format: ExportFormat,
    pub data: String,
    pub filename: String,
    pub metadata: ExportMetadata,
}

/// Export results with default settings
pub fn export_results(results: &Value, format: &str) -> Result<ExportResponse, ExportError> {
    export_results_with_settings(results, format, &ExportSettings::default())
}

/// Export results with custom settings
pub fn export_results_with_settings(
    results: &Value,
    format: &str,
    settings: &ExportSettings,
) -> Result<ExportResponse, ExportError> {
    let format: ExportFormat = format.parse()?;
    export_at(results, format, settings, &Local::now())
}

/// Export results as of a fixed point in time
pub fn export_at(
    results: &Value,
    format: ExportFormat,
    settings: &ExportSettings,
    at: &DateTime<Local>,
) -> Result<ExportResponse, ExportError> {
    let ctx = ExportContext {
        timestamp: format_timestamp(at),
        version: &settings.version,
        original_size: results.to_string().len(),
    };

    let data = match format {
        ExportFormat::Json => to_json(results, &ctx)?,
        ExportFormat::Csv => tabular::to_csv(results)?,
        ExportFormat::Xml => markup::to_xml(results, &ctx)?,
        ExportFormat::Excel => spreadsheet::to_xlsx(results, &ctx)?,
        ExportFormat::Txt => report::to_text(results, &ctx)?,
        ExportFormat::Html => report::to_html(results, &ctx)?,
    };
    debug!(%format, bytes = data.len(), "exported results");

    Ok(ExportResponse {
        format,
        data,
        filename: export_filename(format, at),
        metadata: ExportMetadata {
            timestamp: ctx.timestamp,
            export_id: new_id(),
            original_data_size: ctx.original_size,
        },
    })
}

/// `distance_analysis_YYYYMMDD_HHMMSS.<ext>`
pub fn export_filename(format: ExportFormat, at: &DateTime<Local>) -> String {
    format!(
        "distance_analysis_{}.{}",
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

#[derive(Serialize)]
struct ExportInfo<'a> {
    format: &'static str,
    timestamp: &'a str,
    version: &'a str,
}

#[derive(Serialize)]
struct JsonEnvelope<'a> {
    export_info: ExportInfo<'a>,
    results: &'a Value,
}

fn to_json(results: &Value, ctx: &ExportContext<'_>) -> Result<String, ExportError> {
    let envelope = JsonEnvelope {
        export_info: ExportInfo {
            format: ExportFormat::Json.name(),
            timestamp: &ctx.timestamp,
            version: ctx.version,
        },
        results,
    };
    serde_json::to_string_pretty(&envelope).map_err(|e| ExportError::Encode(e.to_string()))
}

/// Leaf text: strings verbatim, everything else as compact JSON
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One `calculation_pairs` entry, values as supplied
pub(crate) struct PairEntry<'a> {
    pub a: &'a Value,
    pub b: &'a Value,
    pub distance: &'a Value,
}

/// A pair entry with numeric fields
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NumericPair {
    pub a: u64,
    pub b: u64,
    pub distance: f64,
}

/// `distance_matrix` rows, when present
pub(crate) fn matrix_section(results: &Value) -> Result<Option<Vec<&[Value]>>, ExportError> {
    results
        .get("distance_matrix")
        .map(|value| {
            let rows = value
                .as_array()
                .ok_or_else(|| malformed("distance_matrix must be a list of rows"))?;
            rows.iter()
                .enumerate()
                .map(|(i, row)| {
                    row.as_array()
                        .map(Vec::as_slice)
                        .ok_or_else(|| malformed(format!("distance_matrix row {} is not a list", i)))
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()
}

/// `calculation_pairs` entries, when present
pub(crate) fn pairs_section(results: &Value) -> Result<Option<Vec<PairEntry<'_>>>, ExportError> {
    results
        .get("calculation_pairs")
        .map(|value| {
            let entries = value
                .as_array()
                .ok_or_else(|| malformed("calculation_pairs must be a list"))?;
            entries
                .iter()
                .enumerate()
                .map(|(i, entry)| pair_entry(i, entry))
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()
}

/// The `metadata` mapping, when present
pub(crate) fn metadata_section(results: &Value) -> Result<Option<&Map<String, Value>>, ExportError> {
    results
        .get("metadata")
        .map(|value| value.as_object().ok_or_else(|| malformed("metadata must be a mapping")))
        .transpose()
}

/// Matrix cells as numbers
pub(crate) fn numeric_matrix(rows: &[&[Value]]) -> Result<Vec<Vec<f64>>, ExportError> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            row.iter()
                .enumerate()
                .map(|(j, cell)| {
                    cell.as_f64()
                        .ok_or_else(|| malformed(format!("distance_matrix[{}][{}] is not a number", i, j)))
                })
                .collect::<Result<Vec<f64>, _>>()
        })
        .collect()
}

/// Pair entries with integer indices and numeric distances
pub(crate) fn numeric_pairs(pairs: &[PairEntry<'_>]) -> Result<Vec<NumericPair>, ExportError> {
    pairs
        .iter()
        .enumerate()
        .map(|(i, pair)| {
            let bad = || malformed(format!("calculation_pairs[{}] is not numeric", i));
            Ok(NumericPair {
                a: pair.a.as_u64().ok_or_else(bad)?,
                b: pair.b.as_u64().ok_or_else(bad)?,
                distance: pair.distance.as_f64().ok_or_else(bad)?,
            })
        })
        .collect()
}

fn pair_entry(index: usize, entry: &Value) -> Result<PairEntry<'_>, ExportError> {
    let bad = || malformed(format!("calculation_pairs[{}] needs point_indices [a, b] and distance", index));

    let indices = entry
        .get("point_indices")
        .and_then(Value::as_array)
        .filter(|indices| indices.len() >= 2)
        .ok_or_else(bad)?;
    let distance = entry.get("distance").ok_or_else(bad)?;

    Ok(PairEntry {
        a: &indices[0],
        b: &indices[1],
        distance,
    })
}

fn malformed(message: impl Into<String>) -> ExportError {
    ExportError::MalformedResults(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 2, 14, 30, 5).unwrap()
    }

    fn batch_results() -> Value {
        json!({
            "distance_matrix": [[0.0, 5.0], [5.0, 0.0]],
            "calculation_type": "euclidean",
            "calculation_pairs": [{"point_indices": [0, 1], "distance": 5.0}],
            "metadata": {"batch_id": "abc", "point_count": 2}
        })
    }

    #[test]
    fn test_format_parse_and_extension() {
        assert_eq!("excel".parse::<ExportFormat>().unwrap(), ExportFormat::Excel);
        assert_eq!(ExportFormat::Excel.extension(), "xlsx");
        assert_eq!(ExportFormat::Txt.extension(), "txt");
        assert!(matches!(
            "pdf".parse::<ExportFormat>(),
            Err(ExportError::UnsupportedFormat(f)) if f == "pdf"
        ));
    }

    #[test]
    fn test_unsupported_format() {
        let err = export_results(&json!({}), "yaml").unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_filename_is_derived_from_time() {
        assert_eq!(
            export_filename(ExportFormat::Csv, &fixed_time()),
            "distance_analysis_20250602_143005.csv"
        );
        assert_eq!(
            export_filename(ExportFormat::Excel, &fixed_time()),
            "distance_analysis_20250602_143005.xlsx"
        );
    }

    #[test]
    fn test_json_round_trip() {
        let results = batch_results();
        let response = export_at(
            &results,
            ExportFormat::Json,
            &ExportSettings::default(),
            &fixed_time(),
        )
        .unwrap();

        let parsed: Value = serde_json::from_str(&response.data).unwrap();
        assert_eq!(parsed["results"], results);
        assert_eq!(parsed["export_info"]["format"], "json");
        assert_eq!(parsed["export_info"]["version"], "1.0");
        assert_eq!(parsed["export_info"]["timestamp"], response.metadata.timestamp.as_str());
    }

    #[test]
    fn test_json_uses_configured_version() {
        let settings = ExportSettings {
            version: "2.1".to_string(),
        };
        let response = export_results_with_settings(&json!({"a": 1}), "json", &settings).unwrap();
        let parsed: Value = serde_json::from_str(&response.data).unwrap();
        assert_eq!(parsed["export_info"]["version"], "2.1");
    }

    #[test]
    fn test_response_metadata() {
        let results = json!({"x": [1, 2, 3]});
        let response = export_results(&results, "csv").unwrap();
        assert_eq!(response.format, ExportFormat::Csv);
        assert!(response.filename.starts_with("distance_analysis_"));
        assert!(response.filename.ends_with(".csv"));
        assert_eq!(response.metadata.original_data_size, results.to_string().len());
        assert_eq!(response.metadata.export_id.len(), 36);
    }

    #[test]
    fn test_every_format_exports_batch_results() {
        let results = batch_results();
        for format in ExportFormat::ALL {
            let response = export_at(&results, format, &ExportSettings::default(), &fixed_time()).unwrap();
            assert!(!response.data.is_empty(), "{} produced no data", format);
        }
    }

    #[test]
    fn test_sections_shape_checks() {
        let bad_matrix = json!({"distance_matrix": [1, 2]});
        assert!(matches!(
            matrix_section(&bad_matrix),
            Err(ExportError::MalformedResults(_))
        ));

        let bad_pairs = json!({"calculation_pairs": [{"distance": 1.0}]});
        assert!(pairs_section(&bad_pairs).is_err());
        assert!(metadata_section(&json!({"metadata": [1]})).is_err());

        let results = batch_results();
        let matrix = matrix_section(&results).unwrap().unwrap();
        assert_eq!(numeric_matrix(&matrix).unwrap(), vec![vec![0.0, 5.0], vec![5.0, 0.0]]);
        let pairs = pairs_section(&results).unwrap().unwrap();
        assert_eq!(
            numeric_pairs(&pairs).unwrap(),
            vec![NumericPair {
                a: 0,
                b: 1,
                distance: 5.0
            }]
        );
        assert_eq!(metadata_section(&results).unwrap().map(Map::len), Some(2));
    }

    #[test]
    fn test_sections_are_read_independently() {
        let results = json!({"distance": 5.0, "metadata": "note"});
        assert!(matrix_section(&results).unwrap().is_none());
        assert!(pairs_section(&results).unwrap().is_none());
        assert!(metadata_section(&results).is_err());

        for format in ["json", "csv", "xml", "excel"] {
            assert!(export_results(&results, format).is_ok(), "{} rejected plain metadata", format);
        }
    }

    #[test]
    fn test_non_numeric_matrix_is_malformed_for_reports() {
        let results = json!({"distance_matrix": [["a", "b"], ["c", "d"]]});
        assert!(matches!(
            export_results(&results, "txt"),
            Err(ExportError::MalformedResults(_))
        ));
        // CSV writes cells as given
        assert!(export_results(&results, "csv").is_ok());
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("text")), "text");
        assert_eq!(display_value(&json!(0)), "0");
        assert_eq!(display_value(&json!(1.5)), "1.5");
        assert_eq!(display_value(&json!([1, 2])), "[1,2]");
        assert_eq!(display_value(&Value::Null), "null");
    }
}
