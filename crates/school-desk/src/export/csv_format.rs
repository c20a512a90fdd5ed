use super::{ExportError, ExportTable, Serializer};

/// RFC 4180-style CSV: fields containing commas, quotes, or newlines are
/// quoted with internal quotes doubled (the csv crate's default behavior).
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvSerializer;

impl Serializer for CsvSerializer {
    fn serialize(&self, table: &ExportTable) -> Result<Vec<u8>, ExportError> {
        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());

        writer
            .write_record(&table.headers)
            .map_err(|err| ExportError::Serialize(err.to_string()))?;
        for row in &table.rows {
            writer
                .write_record(row)
                .map_err(|err| ExportError::Serialize(err.to_string()))?;
        }

        writer
            .into_inner()
            .map_err(|err| ExportError::Serialize(err.to_string()))
    }

    fn extension(&self) -> &'static str {
        "csv"
    }

    fn mime_type(&self) -> &'static str {
        "text/csv"
    }
}
