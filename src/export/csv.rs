use ::csv::WriterBuilder;

use super::ExportError;
use crate::data::model::Record;
use crate::data::table::Column;

/// Serialize `rows` as CSV: one header line of column labels, then one line
/// per record in column order. Quoting of commas, quotes and line breaks is
/// left to the `csv` writer; missing cells are written as empty fields.
pub fn to_csv(rows: &[&Record], columns: &[Column]) -> Result<String, ExportError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    writer.write_record(columns.iter().map(|c| c.label.as_str()))?;
    for rec in rows {
        writer.write_record(columns.iter().map(|c| rec.text(&c.key)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::data::loader::load_csv;
    use crate::data::model::{BASE_MSRP, Dataset, FieldValue, MAKE, MODEL};
    use crate::data::table::{display_columns, rows, source_columns};

    fn record(pairs: &[(&str, FieldValue)]) -> Record {
        Record::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn header_only_for_empty_rows() {
        let text = to_csv(&[], &display_columns()).unwrap();
        assert_eq!(
            text,
            "Make,Model,Year,Type,Range (mi),MSRP ($),County\n"
        );
    }

    #[test]
    fn special_characters_are_quoted() {
        let rec = record(&[
            (MAKE, FieldValue::String("Acme, Inc.".into())),
            (MODEL, FieldValue::String("The \"Volt\"\nII".into())),
            (BASE_MSRP, FieldValue::Null),
        ]);
        let cols = vec![
            Column::verbatim(MAKE),
            Column::verbatim(MODEL),
            Column::verbatim(BASE_MSRP),
        ];
        let text = to_csv(&[&rec], &cols).unwrap();
        assert_eq!(
            text,
            "Make,Model,Base MSRP\n\"Acme, Inc.\",\"The \"\"Volt\"\"\nII\",\n"
        );
    }

    #[test]
    fn full_export_round_trips_through_loader() {
        let source = "\
Make,Model,Model Year,Electric Range,Base MSRP,County
TESLA,\"MODEL 3, LR\",2020,322,0,King
NISSAN,LEAF,2019,,31950.5,Snohomish
\"KIA \"\"EV\"\"\",EV6,2022,310,,Pierce
";
        let original = load_csv(source.as_bytes()).unwrap();
        let all: Vec<usize> = (0..original.len()).collect();
        let text = to_csv(&rows(&original, &all), &source_columns(&original)).unwrap();

        let reparsed: Dataset = load_csv(text.as_bytes()).unwrap();
        assert_eq!(reparsed.columns, original.columns);
        assert_eq!(reparsed.records, original.records);
    }
}
