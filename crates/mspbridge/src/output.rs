use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ReplyOutput<'a, T: Serialize> {
    message: &'a str,
    code: u8,
    data: &'a T,
}

/// Print a decoded reply.
pub fn print_reply<T: Serialize>(message: &str, code: u8, data: &T, format: OutputFormat) {
    let data = serde_json::to_value(data).unwrap_or(Value::Null);
    match format {
        OutputFormat::Json => {
            let out = ReplyOutput {
                message,
                code,
                data: &data,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Pretty => {
            println!("{message} ({code})");
            println!(
                "{}",
                serde_json::to_string_pretty(&data).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (field, value) in rows(&data) {
                table.add_row(vec![field, value]);
            }
            println!("{message} ({code})");
            println!("{table}");
        }
    }
}

/// Print an undecoded reply payload.
pub fn print_payload(code: u8, payload: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", payload_json(code, payload)),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CODE", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    code.to_string(),
                    payload.len().to_string(),
                    hex::encode(payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("code={code} size={} payload={}", payload.len(), hex::encode(payload));
        }
    }
}

/// One row per top-level field; nested values are shown as compact JSON.
fn rows(data: &Value) -> Vec<(String, String)> {
    match data {
        Value::Object(fields) => fields
            .iter()
            .map(|(name, value)| (name.clone(), cell(value)))
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, value)| (index.to_string(), cell(value)))
            .collect(),
        other => vec![("value".to_string(), cell(other))],
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[derive(Serialize)]
struct PayloadOutput {
    code: u8,
    size: usize,
    payload: String,
}

fn payload_json(code: u8, payload: &[u8]) -> String {
    let out = PayloadOutput {
        code,
        size: payload.len(),
        payload: hex::encode(payload),
    };
    serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn object_fields_become_rows() {
        let data = json!({ "angx": -12, "heading": 270 });
        let rows = rows(&data);
        assert_eq!(rows.len(), 2);
        assert!(rows.contains(&("angx".to_string(), "-12".to_string())));
        assert!(rows.contains(&("heading".to_string(), "270".to_string())));
    }

    #[test]
    fn arrays_are_indexed() {
        let rows = rows(&json!(["ARM", "ANGLE"]));
        assert_eq!(rows[1], ("1".to_string(), "ANGLE".to_string()));
    }

    #[test]
    fn payload_json_is_lowercase_unseparated_hex() {
        assert_eq!(
            payload_json(101, &[0x24, 0x4d, 0x3c, 0x00]),
            r#"{"code":101,"size":4,"payload":"244d3c00"}"#
        );
        assert_eq!(payload_json(1, &[]), r#"{"code":1,"size":0,"payload":""}"#);
    }
}
