//! Mock descriptor generation.
//!
//! The generated "program" is a self-contained TOML descriptor: a
//! timestamped header comment, then a `[mock]` table assigning every
//! configuration field the mock process runner needs. The child process
//! re-executes the current binary, reads this file, and resolves the
//! named service factory at startup - no source code is embedded.

use std::fs;
use std::path::Path;

use crate::error::{MockError, Result};

/// How a configuration value is rendered into the descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Inherited string configuration; rendered quoted.
    Quoted,
    /// Raw value (the integer version); rendered bare.
    Raw,
}

/// A tagged configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    pub kind: FieldKind,
    pub value: String,
}

impl FieldValue {
    pub fn quoted(value: impl Into<String>) -> Self {
        FieldValue {
            kind: FieldKind::Quoted,
            value: value.into(),
        }
    }

    pub fn raw(value: impl ToString) -> Self {
        FieldValue {
            kind: FieldKind::Raw,
            value: value.to_string(),
        }
    }
}

/// The ordered configuration field set written into a descriptor.
///
/// Built once at orchestrator construction and immutable afterwards.
#[derive(Debug, Clone)]
pub struct MockInfo {
    entries: Vec<(&'static str, FieldValue)>,
}

impl MockInfo {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        address: &str,
        vendor: &str,
        product: &str,
        version: i64,
        url: &str,
        interface_name: &str,
        interface_file: &Path,
        service_to_mock: &str,
    ) -> Self {
        MockInfo {
            entries: vec![
                ("address", FieldValue::quoted(address)),
                ("vendor", FieldValue::quoted(vendor)),
                ("product", FieldValue::quoted(product)),
                ("version", FieldValue::raw(version)),
                ("url", FieldValue::quoted(url)),
                ("interface_name", FieldValue::quoted(interface_name)),
                ("interface_file", FieldValue::quoted(interface_file.display().to_string())),
                ("service_to_mock", FieldValue::quoted(service_to_mock)),
            ],
        }
    }

    /// Fields in assignment order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.entries.iter().map(|(key, value)| (*key, value))
    }

    /// Look up one field's rendered value.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Render the descriptor text for the given configuration.
pub fn render_program(info: &MockInfo) -> String {
    let mut out = String::new();
    out.push_str("# Generated by the mocklink mocking harness\n");
    out.push_str(&format!("# {}\n", chrono::Utc::now().to_rfc3339()));
    out.push_str("# Only for testing purposes and unit testing\n");
    out.push('\n');
    out.push_str("[mock]\n");
    for (key, field) in info.entries() {
        match field.kind {
            FieldKind::Quoted => {
                out.push_str(&format!("{} = \"{}\"\n", key, toml_escape(&field.value)));
            }
            FieldKind::Raw => {
                out.push_str(&format!("{} = {}\n", key, field.value));
            }
        }
    }
    out
}

/// Write the descriptor to `path`, overwriting any previous file.
pub fn write_program(info: &MockInfo, path: &Path) -> Result<()> {
    let content = render_program(info);
    fs::write(path, content).map_err(|e| MockError::io("failed to write mock descriptor", path, e))
}

/// Escape a value for a basic TOML string.
///
/// Control characters are not valid in basic strings, so they get the
/// `\n`/`\r`/`\t` short forms or a `\uXXXX` escape.
fn toml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                out.push_str(&format!("\\u{:04X}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_info() -> MockInfo {
        MockInfo::new(
            "unix:@foo",
            "mocklink",
            "mock",
            1,
            "http://localhost",
            "org.service.com",
            Path::new("/tmp/org.service.com"),
            "EchoService",
        )
    }

    #[test]
    fn renders_header_and_fields_in_order() {
        let text = render_program(&sample_info());
        assert!(text.starts_with("# Generated by the mocklink mocking harness\n"));
        assert!(text.contains("# Only for testing purposes and unit testing\n"));

        let keys: Vec<&str> = text
            .lines()
            .filter_map(|line| line.split_once(" = ").map(|(k, _)| k))
            .collect();
        assert_eq!(
            keys,
            [
                "address",
                "vendor",
                "product",
                "version",
                "url",
                "interface_name",
                "interface_file",
                "service_to_mock"
            ]
        );
    }

    #[test]
    fn quotes_by_field_kind() {
        let text = render_program(&sample_info());
        assert!(text.contains("address = \"unix:@foo\""));
        // Raw kind: the version number is unquoted.
        assert!(text.contains("version = 1"));
        assert!(!text.contains("version = \"1\""));
        assert!(text.contains("service_to_mock = \"EchoService\""));
    }

    #[test]
    fn escapes_quotes_and_backslashes() {
        assert_eq!(toml_escape(r#"a"b\c"#), r#"a\"b\\c"#);
    }

    #[test]
    fn escapes_control_characters() {
        assert_eq!(toml_escape("a\nb\tc\rd"), r"a\nb\tc\rd");
        assert_eq!(toml_escape("bell\u{07}"), r"bell\u0007");
    }

    #[test]
    fn control_characters_in_values_still_yield_valid_toml() {
        let info = MockInfo::new(
            "unix:@line\nbreak",
            "mocklink",
            "mock",
            1,
            "http://localhost",
            "org.service.com",
            Path::new("/tmp/tab\there"),
            "EchoService",
        );
        let text = render_program(&info);
        let value: toml::Value = toml::from_str(&text).unwrap();
        assert_eq!(value["mock"]["address"].as_str(), Some("unix:@line\nbreak"));
        assert_eq!(value["mock"]["interface_file"].as_str(), Some("/tmp/tab\there"));
    }

    #[test]
    fn writes_and_overwrites_the_target_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("descriptor");
        std::fs::write(&path, "stale").unwrap();

        write_program(&sample_info(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains("stale"));
        assert!(text.contains("[mock]"));
    }

    #[test]
    fn descriptor_is_valid_toml() {
        let text = render_program(&sample_info());
        let value: toml::Value = toml::from_str(&text).unwrap();
        assert_eq!(value["mock"]["version"].as_integer(), Some(1));
        assert_eq!(value["mock"]["interface_file"].as_str(), Some("/tmp/org.service.com"));
        let _ = PathBuf::from(value["mock"]["interface_file"].as_str().unwrap());
    }
}
