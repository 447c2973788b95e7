//! Result output: a printable text table, CSV and JSON.

use crate::access::{Record, Value};
use anyhow::{Context, Result};
use indexmap::IndexSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Union of the field names of all records, in first-seen order
pub fn columns(relation: &[Record]) -> Vec<&str> {
    let mut seen: IndexSet<&str> = IndexSet::new();
    for record in relation {
        seen.extend(record.field_names());
    }
    seen.into_iter().collect()
}

fn cell(record: &Record, column: &str, null_text: &str) -> String {
    match record.get(column) {
        None => String::new(),
        Some(Value::Null) => null_text.to_string(),
        Some(value) => value.to_string(),
    }
}

/// Format a relation as a text table.
///
/// Columns are left-aligned and padded to their widest cell. Missing fields
/// are blank and nulls show as `NULL`.
pub fn format_table(relation: &[Record]) -> String {
    let columns = columns(relation);
    if relation.is_empty() || columns.is_empty() {
        return "(empty result)".to_string();
    }

    let rows: Vec<Vec<String>> = relation
        .iter()
        .map(|record| columns.iter().map(|c| cell(record, c, "NULL")).collect())
        .collect();

    // Compute column widths
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in &rows {
        for (i, val) in row.iter().enumerate() {
            widths[i] = widths[i].max(val.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format_line(columns.iter().copied(), &widths));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in &rows {
        lines.push(format_line(row.iter().map(String::as_str), &widths));
    }
    lines.join("\n")
}

fn format_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(c, w)| format!("{:<width$}", c, width = *w))
        .collect();
    padded.join(" | ").trim_end().to_string()
}

/// Write a relation as CSV: a header row of [`columns`], then one row per
/// record. Missing fields and nulls are empty cells. A relation without
/// any fields (including the empty relation) writes nothing at all.
pub fn write_csv<W: Write>(relation: &[Record], writer: W) -> Result<()> {
    let columns = columns(relation);
    if columns.is_empty() {
        return Ok(());
    }

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer
        .write_record(&columns)
        .context("failed to write header")?;
    for record in relation {
        csv_writer
            .write_record(columns.iter().map(|c| cell(record, c, "")))
            .context("failed to write record")?;
    }
    csv_writer.flush().context("failed to flush")?;
    Ok(())
}

/// Write a relation as CSV to a file, replacing any existing file
pub fn write_csv_file(relation: &[Record], path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;
    write_csv(relation, file).with_context(|| format!("Failed to write {}", path.display()))
}

/// Format a relation as a pretty-printed JSON array of objects
pub fn format_json(relation: &[Record]) -> Result<String> {
    serde_json::to_string_pretty(relation).context("Failed to serialize result")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn relation() -> Vec<Record> {
        vec![
            Record::from_iter([("name", Value::from("Ann")), ("salary", Value::Int(100))]),
            Record::from_iter([("name", Value::from("Bob")), ("bonus", Value::Null)]),
        ]
    }

    #[test]
    fn test_columns_first_seen_order() {
        assert_eq!(columns(&relation()), vec!["name", "salary", "bonus"]);
        assert!(columns(&[]).is_empty());
    }

    #[test]
    fn test_format_table() {
        assert_eq!(
            format_table(&relation()),
            "name | salary | bonus\n\
             -----+--------+------\n\
             Ann  | 100    |\n\
             Bob  |        | NULL"
        );
    }

    #[test]
    fn test_format_empty_table() {
        assert_eq!(format_table(&[]), "(empty result)");
    }

    #[test]
    fn test_write_csv() -> Result<()> {
        let mut out = Vec::new();
        write_csv(&relation(), &mut out)?;
        assert_eq!(
            String::from_utf8(out)?,
            "name,salary,bonus\nAnn,100,\nBob,,\n"
        );
        Ok(())
    }

    #[test]
    fn test_write_csv_quotes_and_floats() -> Result<()> {
        let relation = vec![Record::from_iter([
            ("note", Value::from("a, b")),
            ("avg", Value::Float(2.0)),
            ("ok", Value::Boolean(true)),
        ])];
        let mut out = Vec::new();
        write_csv(&relation, &mut out)?;
        assert_eq!(String::from_utf8(out)?, "note,avg,ok\n\"a, b\",2.0,true\n");
        Ok(())
    }

    #[test]
    fn test_write_csv_empty_relation() -> Result<()> {
        let mut out = Vec::new();
        write_csv(&[], &mut out)?;
        assert!(out.is_empty());
        Ok(())
    }

    #[test]
    fn test_write_csv_file() -> Result<()> {
        let file = NamedTempFile::new()?;
        write_csv_file(&relation(), file.path())?;
        let text = std::fs::read_to_string(file.path())?;
        assert!(text.starts_with("name,salary,bonus\n"));
        Ok(())
    }

    #[test]
    fn test_format_json() -> Result<()> {
        let json: serde_json::Value = serde_json::from_str(&format_json(&relation())?)?;
        assert_eq!(
            json,
            serde_json::json!([
                {"name": "Ann", "salary": 100},
                {"name": "Bob", "bonus": null}
            ])
        );
        Ok(())
    }
}
