//! XML export

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use serde_json::Value;

use super::{ExportContext, ExportError, ExportFormat, display_value};

const ROOT: &str = "distance_analysis_results";

type XmlWriter = Writer<Vec<u8>>;

pub fn to_xml(results: &Value, ctx: &ExportContext<'_>) -> Result<String, ExportError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    open(&mut writer, ROOT)?;

    open(&mut writer, "metadata")?;
    leaf(&mut writer, "export_timestamp", &ctx.timestamp)?;
    leaf(&mut writer, "format", ExportFormat::Xml.name())?;
    leaf(&mut writer, "version", ctx.version)?;
    close(&mut writer, "metadata")?;

    open(&mut writer, "results")?;
    write_value(&mut writer, results)?;
    close(&mut writer, "results")?;

    close(&mut writer, ROOT)?;

    String::from_utf8(writer.into_inner()).map_err(|e| ExportError::Encode(e.to_string()))
}

/// Mappings become child elements, sequences become `item_N` children,
/// null leaves the element empty
fn write_value(writer: &mut XmlWriter, value: &Value) -> Result<(), ExportError> {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let name = element_name(key);
                open(writer, &name)?;
                write_value(writer, child)?;
                close(writer, &name)?;
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let name = format!("item_{}", i);
                open(writer, &name)?;
                write_value(writer, item)?;
                close(writer, &name)?;
            }
        }
        Value::Null => {}
        other => text(writer, &display_value(other))?,
    }
    Ok(())
}

/// Turn an arbitrary mapping key into a valid element name
pub fn element_name(key: &str) -> String {
    let mut name: String = key
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if !name.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        name.insert(0, '_');
    }
    name
}

fn open(writer: &mut XmlWriter, name: &str) -> Result<(), ExportError> {
    emit(writer, Event::Start(BytesStart::new(name)))
}

fn close(writer: &mut XmlWriter, name: &str) -> Result<(), ExportError> {
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn text(writer: &mut XmlWriter, content: &str) -> Result<(), ExportError> {
    emit(writer, Event::Text(BytesText::new(content)))
}

fn leaf(writer: &mut XmlWriter, name: &str, content: &str) -> Result<(), ExportError> {
    open(writer, name)?;
    text(writer, content)?;
    close(writer, name)
}

fn emit(writer: &mut XmlWriter, event: Event<'_>) -> Result<(), ExportError> {
    writer
        .write_event(event)
        .map_err(|e| ExportError::Encode(format!("XML: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> ExportContext<'static> {
        ExportContext {
            timestamp: "2025-06-02T14:30:05.000000+00:00".to_string(),
            version: "1.0",
            original_size: 0,
        }
    }

    #[test]
    fn test_document_layout() {
        let xml = to_xml(&json!({"distance_matrix": [[0, 1], [1, 0]]}), &ctx()).unwrap();

        assert!(xml.starts_with("<distance_analysis_results>"));
        assert!(xml.trim_end().ends_with("</distance_analysis_results>"));
        assert!(xml.contains("<export_timestamp>2025-06-02T14:30:05.000000+00:00</export_timestamp>"));
        assert!(xml.contains("<format>xml</format>"));
        assert!(xml.contains("<version>1.0</version>"));
        assert!(xml.contains("<distance_matrix>"));
        assert!(xml.contains("<item_1>1</item_1>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let xml = to_xml(&json!({"note": "a < b & c"}), &ctx()).unwrap();
        assert!(xml.contains("<note>a &lt; b &amp; c</note>"));
    }

    #[test]
    fn test_null_is_empty_element() {
        let xml = to_xml(&json!({"missing": null}), &ctx()).unwrap();
        assert!(xml.contains("<missing>"));
        assert!(xml.contains("</missing>"));
        assert!(!xml.contains("null"));
    }

    #[test]
    fn test_element_names_are_sanitized() {
        assert_eq!(element_name("point_count"), "point_count");
        assert_eq!(element_name("point count"), "point_count");
        assert_eq!(element_name("1st"), "_1st");
        assert_eq!(element_name(""), "_");
        assert_eq!(element_name("a<b>"), "a_b_");
    }

    #[test]
    fn test_sanitized_keys_in_document() {
        let xml = to_xml(&json!({"2d points": [1]}), &ctx()).unwrap();
        assert!(xml.contains("<_2d_points>"));
        assert!(xml.contains("</_2d_points>"));
    }
}
