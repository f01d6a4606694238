//! CSV export
//!
//! The first recognized section decides the layout:
//! a distance matrix becomes a labeled grid, a pair list becomes one row per
//! pair, anything else is dumped as top-level key/value rows.

use serde_json::Value;

use super::{ExportError, display_value, matrix_section, pairs_section};

pub fn to_csv(results: &Value) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());

    if let Some(matrix) = matrix_section(results)? {
        let mut header = vec!["Point".to_string()];
        header.extend((0..matrix.len()).map(|i| format!("P{}", i)));
        writer.write_record(&header)?;

        for (i, row) in matrix.iter().enumerate() {
            let mut record = vec![format!("P{}", i)];
            record.extend(row.iter().map(display_value));
            writer.write_record(&record)?;
        }
    } else if let Some(pairs) = pairs_section(results)? {
        writer.write_record(["Point_A_Index", "Point_B_Index", "Distance"])?;
        for pair in &pairs {
            writer.write_record([
                display_value(pair.a),
                display_value(pair.b),
                display_value(pair.distance),
            ])?;
        }
    } else {
        writer.write_record(["Key", "Value"])?;
        match results {
            Value::Object(map) => {
                for (key, value) in map {
                    writer.write_record([key.as_str(), display_value(value).as_str()])?;
                }
            }
            other => writer.write_record(["value", display_value(other).as_str()])?,
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_matrix_grid() {
        let csv = to_csv(&json!({"distance_matrix": [[0, 1], [1, 0]]})).unwrap();
        assert_eq!(csv, "Point,P0,P1\nP0,0,1\nP1,1,0\n");
    }

    #[test]
    fn test_matrix_wins_over_pairs() {
        let results = json!({
            "calculation_pairs": [{"point_indices": [0, 1], "distance": 2.5}],
            "distance_matrix": [[0.0, 2.5], [2.5, 0.0]]
        });
        let csv = to_csv(&results).unwrap();
        assert!(csv.starts_with("Point,P0,P1\n"));
        assert!(csv.contains("P0,0.0,2.5\n"));
    }

    #[test]
    fn test_pair_rows() {
        let results = json!({
            "calculation_pairs": [
                {"point_indices": [0, 1], "distance": 2.5},
                {"point_indices": [0, 2], "distance": 4.0}
            ]
        });
        let csv = to_csv(&results).unwrap();
        assert_eq!(
            csv,
            "Point_A_Index,Point_B_Index,Distance\n0,1,2.5\n0,2,4.0\n"
        );
    }

    #[test]
    fn test_key_value_fallback() {
        let results = json!({"distance": 5.0, "calculation_type": "euclidean", "point_a": [0, 0]});
        let csv = to_csv(&results).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Key,Value");
        assert_eq!(lines[1], "distance,5.0");
        assert_eq!(lines[2], "calculation_type,euclidean");
        // nested values are quoted because they contain commas
        assert_eq!(lines[3], "point_a,\"[0,0]\"");
    }

    #[test]
    fn test_plain_metadata_is_dumped() {
        let csv = to_csv(&json!({"distance": 5.0, "metadata": "note"})).unwrap();
        assert_eq!(csv, "Key,Value\ndistance,5.0\nmetadata,note\n");
    }

    #[test]
    fn test_empty_matrix() {
        let csv = to_csv(&json!({"distance_matrix": []})).unwrap();
        assert_eq!(csv, "Point\n");
    }
}
