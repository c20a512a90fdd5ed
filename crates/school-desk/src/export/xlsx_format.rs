use rust_xlsxwriter::Workbook;

use super::{ExportError, ExportTable, Serializer};

const SHEET_NAME: &str = "School Years";
const COLUMN_PAD: usize = 2;

/// One-sheet workbook with columns sized to their longest value.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxSerializer;

impl Serializer for XlsxSerializer {
    fn serialize(&self, table: &ExportTable) -> Result<Vec<u8>, ExportError> {
        let to_err = |err: rust_xlsxwriter::XlsxError| ExportError::Serialize(err.to_string());

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME).map_err(to_err)?;

        for (col, header) in table.headers.iter().enumerate() {
            worksheet
                .write_string(0, col as u16, *header)
                .map_err(to_err)?;
        }
        for (row, values) in table.rows.iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                worksheet
                    .write_string(row as u32 + 1, col as u16, value)
                    .map_err(to_err)?;
            }
        }

        for (col, header) in table.headers.iter().enumerate() {
            let longest = table
                .rows
                .iter()
                .filter_map(|row| row.get(col))
                .map(|value| value.chars().count())
                .max()
                .unwrap_or(0)
                .max(header.chars().count());
            worksheet
                .set_column_width(col as u16, (longest + COLUMN_PAD) as f64)
                .map_err(to_err)?;
        }

        workbook.save_to_buffer().map_err(to_err)
    }

    fn extension(&self) -> &'static str {
        "xlsx"
    }

    fn mime_type(&self) -> &'static str {
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    }
}
