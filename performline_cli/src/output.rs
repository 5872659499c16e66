use std::str::FromStr;

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Yaml,
    Json,
    Table,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            "table" => Ok(Self::Table),
            other => anyhow::bail!("unknown output format '{}' (expected yaml, json or table)", other),
        }
    }
}

/// Prints any serializable value in the requested format.
pub fn print<T: Serialize + ?Sized>(data: &T, format: &OutputFormat) -> Result<()> {
    let value = serde_json::to_value(data)?;
    println!("{}", render(&value, format)?);
    Ok(())
}

pub fn render(value: &Value, format: &OutputFormat) -> Result<String> {
    let text = match format {
        OutputFormat::Yaml => serde_yml::to_string(value)?.trim_end().to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Table => render_table(value),
    };
    Ok(text)
}

/// Lays records out as rows. Columns are the union of top-level keys, in
/// the order they are first seen.
fn render_table(value: &Value) -> String {
    let rows: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    let mut columns: Vec<&str> = Vec::new();
    for row in &rows {
        if let Value::Object(map) = row {
            for key in map.keys() {
                if !columns.contains(&key.as_str()) {
                    columns.push(key);
                }
            }
        }
    }

    let mut builder = Builder::default();
    if columns.is_empty() {
        builder.push_record(["Value".to_string()]);
        for row in &rows {
            builder.push_record([cell(row)]);
        }
    } else {
        builder.push_record(columns.iter().map(|c| c.to_string()));
        for row in &rows {
            builder.push_record(
                columns
                    .iter()
                    .map(|c| row.get(*c).map(cell).unwrap_or_default()),
            );
        }
    }

    let mut table = builder.build();
    table.with(Style::sharp());
    table.to_string()
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
