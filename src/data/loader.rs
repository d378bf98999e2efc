use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value as JsonValue;

use super::model::{Dataset, FieldValue, Record};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a vehicle dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`  – header row followed by one record per line (the default source)
/// * `.json` – `[{ "Make": "...", "Model Year": 2021, ... }, ...]`
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening CSV {}", path.display()))?;
            load_csv(file)?
        }
        "json" => load_json(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    log::info!(
        "Loaded {} records with {} columns from {}",
        dataset.len(),
        dataset.columns.len(),
        path.display()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, then one record per line.
///
/// Every cell is type-coerced with [`FieldValue::parse`]. Rows the reader
/// rejects (wrong field count, invalid UTF-8) are skipped with a warning;
/// only an unreadable or empty header fails the load.
pub fn load_csv<R: Read>(input: R) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        bail!("CSV has no header row");
    }

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (row_no, result) in reader.records().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                log::warn!("Skipping malformed CSV row {}: {e}", row_no + 1);
                skipped += 1;
                continue;
            }
        };

        let fields: BTreeMap<String, FieldValue> = headers
            .iter()
            .zip(row.iter())
            .map(|(col, value)| (col.clone(), FieldValue::parse(value)))
            .collect();

        records.push(Record::new(fields));
    }

    if skipped > 0 {
        log::warn!("{skipped} malformed CSV rows skipped");
    }

    Ok(Dataset::new(records, headers))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented):
///
/// ```json
/// [
///   { "Make": "TESLA", "Model": "MODEL 3", "Model Year": 2020, "Base MSRP": 0 },
///   ...
/// ]
/// ```
///
/// Entries that are not objects are skipped, mirroring the CSV loader.
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading JSON {}", path.display()))?;
    parse_json(&text)
}

pub fn parse_json(text: &str) -> Result<Dataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let entries = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    let mut records = Vec::with_capacity(entries.len());

    for (i, entry) in entries.iter().enumerate() {
        let Some(obj) = entry.as_object() else {
            log::warn!("Skipping JSON entry {i}: not an object");
            continue;
        };

        let mut fields = BTreeMap::new();
        for (key, val) in obj {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
            fields.insert(key.clone(), json_to_field(val));
        }
        records.push(Record::new(fields));
    }

    Ok(Dataset::new(records, columns))
}

fn json_to_field(val: &JsonValue) -> FieldValue {
    match val {
        JsonValue::String(s) => FieldValue::parse(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                FieldValue::float(f)
            } else {
                FieldValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => FieldValue::Bool(*b),
        JsonValue::Null => FieldValue::Null,
        other => FieldValue::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::data::model::{BASE_MSRP, MAKE, MODEL_YEAR};

    const SAMPLE: &str = "\
Make,Model,Model Year,Base MSRP,County
TESLA,MODEL 3,2020,0,King
NISSAN,LEAF,2019,,Snohomish
";

    #[test]
    fn csv_values_are_coerced() {
        let ds = load_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.columns, vec!["Make", "Model", "Model Year", "Base MSRP", "County"]);
        let first = &ds.records[0];
        assert_eq!(first.get(MAKE), Some(&FieldValue::String("TESLA".into())));
        assert_eq!(first.get(MODEL_YEAR), Some(&FieldValue::Integer(2020)));
        assert_eq!(ds.records[1].get(BASE_MSRP), Some(&FieldValue::Null));
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let text = "Make,Model\nTESLA,MODEL Y\nBROKEN\nKIA,EV6\n";
        let ds = load_csv(text.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[1].text(MAKE), "KIA");
    }

    #[test]
    fn blank_lines_are_ignored() {
        let text = "Make,Model\n\nTESLA,MODEL Y\n\n";
        let ds = load_csv(text.as_bytes()).unwrap();
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn empty_input_fails() {
        assert!(load_csv("".as_bytes()).is_err());
    }

    #[test]
    fn load_file_reads_csv_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn load_file_reads_json_records() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(br#"[{"Make":"FORD","Base MSRP":45000.5}, 7, {"Make":"KIA"}]"#)
            .unwrap();
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].number(BASE_MSRP), Some(45000.5));
        assert_eq!(ds.records[1].text(MAKE), "KIA");
    }

    #[test]
    fn missing_file_and_unknown_extension_fail() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_file(&dir.path().join("missing.csv")).is_err());
        assert!(load_file(&dir.path().join("data.parquet")).is_err());
    }
}
