mod csv_format;
mod xlsx_format;

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::SchoolYear;
use crate::notify::{Notice, Notifier};

pub use csv_format::CsvSerializer;
pub use xlsx_format::XlsxSerializer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Xlsx => "XLSX",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub include_audit: bool,
    pub include_deleted: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Csv,
            include_audit: false,
            include_deleted: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no school years to export")]
    NothingToExport,
    #[error("failed to serialize export: {0}")]
    Serialize(String),
    #[error("failed to deliver export: {0}")]
    Delivery(String),
}

/// Flattened tabular form handed to a serializer. Headers come from the
/// first record's present fields; later rows align to them, absent values
/// rendering empty.
#[derive(Debug, Clone)]
pub struct ExportTable {
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

/// One strategy per output format.
pub trait Serializer {
    fn serialize(&self, table: &ExportTable) -> Result<Vec<u8>, ExportError>;
    fn extension(&self) -> &'static str;
    fn mime_type(&self) -> &'static str;
}

pub fn serializer_for(format: ExportFormat) -> Box<dyn Serializer> {
    match format {
        ExportFormat::Csv => Box::new(CsvSerializer),
        ExportFormat::Xlsx => Box::new(XlsxSerializer),
    }
}

/// Where the produced bytes go; the browser-download analog.
pub trait DownloadSink: Send + Sync {
    fn deliver(&self, filename: &str, mime_type: &str, bytes: &[u8]) -> Result<(), ExportError>;
}

/// Writes exports into a directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DownloadSink for FileSink {
    fn deliver(&self, filename: &str, _mime_type: &str, bytes: &[u8]) -> Result<(), ExportError> {
        fs::create_dir_all(&self.dir).map_err(|err| ExportError::Delivery(err.to_string()))?;
        let path = self.dir.join(filename);
        fs::write(&path, bytes).map_err(|err| ExportError::Delivery(err.to_string()))?;
        tracing::info!(path = %path.display(), "export written");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Delivery {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Captures deliveries in memory; used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    deliveries: Mutex<Vec<Delivery>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().expect("sink mutex poisoned").clone()
    }
}

impl DownloadSink for MemorySink {
    fn deliver(&self, filename: &str, mime_type: &str, bytes: &[u8]) -> Result<(), ExportError> {
        let mut guard = self.deliveries.lock().expect("sink mutex poisoned");
        guard.push(Delivery {
            filename: filename.to_string(),
            mime_type: mime_type.to_string(),
            bytes: bytes.to_vec(),
        });
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub filename: String,
    pub count: usize,
    pub format: ExportFormat,
}

fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

fn format_stamp(stamp: DateTime<Utc>) -> String {
    format_date(stamp.date_naive())
}

fn flatten(year: &SchoolYear, include_audit: bool) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("Name", year.name.clone()),
        ("Code", year.code.clone()),
        ("Start Date", format_date(year.start_date)),
        ("End Date", format_date(year.end_date)),
        ("Status", year.status.label().to_string()),
        (
            "Is Default",
            if year.is_default { "Yes" } else { "No" }.to_string(),
        ),
    ];

    if include_audit {
        let audit: [(&'static str, Option<String>); 6] = [
            ("Created At", year.created_at.map(format_stamp)),
            ("Created By", year.created_by.clone()),
            ("Updated At", year.updated_at.map(format_stamp)),
            ("Updated By", year.updated_by.clone()),
            ("Deleted At", year.deleted_at.map(format_stamp)),
            ("Deleted By", year.deleted_by.clone()),
        ];
        // Absent audit values are dropped rather than emitted as blanks.
        for (header, value) in audit {
            if let Some(value) = value {
                fields.push((header, value));
            }
        }
    }

    fields
}

/// Filters and flattens the record set. Fails with
/// [`ExportError::NothingToExport`] when nothing survives the filter.
pub fn build_table(
    records: &[SchoolYear],
    options: &ExportOptions,
) -> Result<ExportTable, ExportError> {
    let filtered: Vec<&SchoolYear> = records
        .iter()
        .filter(|year| options.include_deleted || !year.is_deleted())
        .collect();

    let first = filtered.first().ok_or(ExportError::NothingToExport)?;
    let headers: Vec<&'static str> = flatten(first, options.include_audit)
        .into_iter()
        .map(|(header, _)| header)
        .collect();

    let rows = filtered
        .iter()
        .map(|year| {
            let flat = flatten(year, options.include_audit);
            headers
                .iter()
                .map(|header| {
                    flat.iter()
                        .find(|(key, _)| key == header)
                        .map(|(_, value)| value.clone())
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    Ok(ExportTable { headers, rows })
}

pub fn filename(format: ExportFormat, today: NaiveDate) -> String {
    let ext = serializer_for(format).extension();
    format!("school-years-{}.{}", today.format("%Y-%m-%d"), ext)
}

/// Full export pipeline: filter, flatten, serialize, deliver, notify.
///
/// Every failure is reported through the notifier; the caller only needs the
/// `Result` to decide whether its dialog closes.
pub fn export(
    records: &[SchoolYear],
    options: &ExportOptions,
    sink: &dyn DownloadSink,
    notifier: &dyn Notifier,
    today: NaiveDate,
) -> Result<ExportOutcome, ExportError> {
    let table = match build_table(records, options) {
        Ok(table) => table,
        Err(ExportError::NothingToExport) => {
            notifier.publish(Notice::info("No school years to export"));
            return Err(ExportError::NothingToExport);
        }
        Err(other) => return Err(other),
    };

    let serializer = serializer_for(options.format);
    let count = table.rows.len();
    let name = filename(options.format, today);

    let delivered = serializer
        .serialize(&table)
        .and_then(|bytes| sink.deliver(&name, serializer.mime_type(), &bytes));

    match delivered {
        Ok(()) => {
            notifier.publish(Notice::success(format!(
                "Exported {count} school years as {}",
                options.format.label()
            )));
            Ok(ExportOutcome {
                filename: name,
                count,
                format: options.format,
            })
        }
        Err(err) => {
            tracing::error!(error = %err, "export failed");
            notifier.publish(Notice::error("Export failed. Try again."));
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SchoolYearStatus;
    use crate::notify::{NoticeLevel, NoticeQueue};
    use chrono::TimeZone;

    pub(super) fn year(id: &str, deleted: bool) -> SchoolYear {
        SchoolYear {
            id: id.to_string(),
            tenant_id: "t1".to_string(),
            name: format!("Year {id}"),
            code: format!("SY-{id}"),
            start_date: NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date"),
            end_date: NaiveDate::from_ymd_opt(2026, 6, 30).expect("valid date"),
            status: SchoolYearStatus::Active,
            is_default: false,
            description: None,
            enrollment_start: None,
            enrollment_end: None,
            grading_deadline: None,
            graduation_date: None,
            student_count: 0,
            staff_count: 0,
            class_count: 0,
            term_count: 0,
            created_at: Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).single(),
            created_by: Some("admin".to_string()),
            updated_at: None,
            updated_by: None,
            deleted_at: if deleted {
                Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).single()
            } else {
                None
            },
            deleted_by: if deleted {
                Some("admin".to_string())
            } else {
                None
            },
        }
    }

    #[test]
    fn excluding_deleted_matches_live_record_count() {
        let records = vec![year("a", false), year("b", true), year("c", false)];
        let options = ExportOptions::default();
        let table = build_table(&records, &options).expect("table builds");
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn including_deleted_keeps_every_record() {
        let records = vec![year("a", false), year("b", true)];
        let options = ExportOptions {
            include_deleted: true,
            ..ExportOptions::default()
        };
        let table = build_table(&records, &options).expect("table builds");
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn audit_off_emits_no_audit_columns() {
        let table =
            build_table(&[year("a", false)], &ExportOptions::default()).expect("table builds");
        assert_eq!(
            table.headers,
            vec!["Name", "Code", "Start Date", "End Date", "Status", "Is Default"]
        );
    }

    #[test]
    fn audit_columns_follow_the_first_record() {
        let options = ExportOptions {
            include_audit: true,
            ..ExportOptions::default()
        };
        let table = build_table(&[year("a", false)], &options).expect("table builds");
        assert!(table.headers.contains(&"Created At"));
        assert!(table.headers.contains(&"Created By"));
        // Never updated or deleted, so those columns are dropped entirely.
        assert!(!table.headers.contains(&"Updated At"));
        assert!(!table.headers.contains(&"Deleted At"));
    }

    #[test]
    fn dates_render_in_display_format() {
        let table =
            build_table(&[year("a", false)], &ExportOptions::default()).expect("table builds");
        assert_eq!(table.rows[0][2], "Sep 1, 2025");
        assert_eq!(table.rows[0][3], "Jun 30, 2026");
    }

    #[test]
    fn empty_set_fails_without_download_and_notifies() {
        let sink = MemorySink::new();
        let notices = NoticeQueue::new();
        let records = vec![year("a", true)];
        let today = NaiveDate::from_ymd_opt(2026, 2, 1).expect("valid date");

        let result = export(
            &records,
            &ExportOptions::default(),
            &sink,
            &notices,
            today,
        );

        assert!(matches!(result, Err(ExportError::NothingToExport)));
        assert!(sink.deliveries().is_empty());
        let drained = notices.drain();
        assert_eq!(drained.len(), 1);
        assert!(drained[0].message.contains("No school years to export"));
    }

    #[test]
    fn successful_export_names_count_and_format() {
        let sink = MemorySink::new();
        let notices = NoticeQueue::new();
        let records = vec![year("a", false), year("b", false)];
        let today = NaiveDate::from_ymd_opt(2026, 2, 1).expect("valid date");

        let outcome = export(
            &records,
            &ExportOptions::default(),
            &sink,
            &notices,
            today,
        )
        .expect("export succeeds");

        assert_eq!(outcome.count, 2);
        assert_eq!(outcome.filename, "school-years-2026-02-01.csv");
        let deliveries = sink.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].mime_type, "text/csv");

        let drained = notices.drain();
        assert_eq!(drained[0].level, NoticeLevel::Success);
        assert!(drained[0].message.contains("Exported 2 school years as CSV"));
    }

    struct FailingSink;

    impl DownloadSink for FailingSink {
        fn deliver(&self, _: &str, _: &str, _: &[u8]) -> Result<(), ExportError> {
            Err(ExportError::Delivery("disk full".to_string()))
        }
    }

    #[test]
    fn delivery_failure_reports_generic_notice() {
        let notices = NoticeQueue::new();
        let records = vec![year("a", false)];
        let today = NaiveDate::from_ymd_opt(2026, 2, 1).expect("valid date");

        let result = export(
            &records,
            &ExportOptions::default(),
            &FailingSink,
            &notices,
            today,
        );

        assert!(matches!(result, Err(ExportError::Delivery(_))));
        let drained = notices.drain();
        assert_eq!(drained[0].level, NoticeLevel::Error);
        assert!(drained[0].message.contains("Export failed"));
    }
}
