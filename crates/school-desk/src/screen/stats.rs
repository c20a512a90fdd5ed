use crate::api::school_years::SchoolYearStatistics;
use crate::domain::{SchoolYear, SchoolYearStatus};

/// Header-card numbers for the management screen.
///
/// Server aggregates win when present; otherwise the counts fall back to the
/// currently loaded page. The default-year name is always derived locally
/// since the statistics endpoint does not carry it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenStats {
    pub total: u64,
    pub draft: u64,
    pub active: u64,
    pub archived: u64,
    pub deleted: u64,
    pub default_year: Option<String>,
}

impl ScreenStats {
    pub fn derive(server: Option<&SchoolYearStatistics>, records: &[SchoolYear]) -> Self {
        let default_year = records
            .iter()
            .find(|year| year.is_live_default())
            .map(|year| year.name.clone());

        match server {
            Some(stats) => Self {
                total: stats.total,
                draft: stats.by_status.draft,
                active: stats.by_status.active,
                archived: stats.by_status.archived,
                deleted: stats.deleted,
                default_year,
            },
            None => {
                let mut local = Self {
                    total: records.len() as u64,
                    default_year,
                    ..Self::default()
                };
                for year in records {
                    if year.is_deleted() {
                        local.deleted += 1;
                        continue;
                    }
                    match year.status {
                        SchoolYearStatus::Draft => local.draft += 1,
                        SchoolYearStatus::Active => local.active += 1,
                        SchoolYearStatus::Archived => local.archived += 1,
                    }
                }
                local
            }
        }
    }

    pub fn default_display(&self) -> &str {
        self.default_year.as_deref().unwrap_or("none")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::school_years::StatusCounts;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn year(id: &str, status: SchoolYearStatus, is_default: bool, deleted: bool) -> SchoolYear {
        SchoolYear {
            id: id.to_string(),
            tenant_id: "t1".to_string(),
            name: format!("Year {id}"),
            code: format!("SY-{id}"),
            start_date: NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date"),
            end_date: NaiveDate::from_ymd_opt(2026, 6, 30).expect("valid date"),
            status,
            is_default,
            description: None,
            enrollment_start: None,
            enrollment_end: None,
            grading_deadline: None,
            graduation_date: None,
            student_count: 0,
            staff_count: 0,
            class_count: 0,
            term_count: 0,
            created_at: None,
            created_by: None,
            updated_at: None,
            updated_by: None,
            deleted_at: if deleted {
                Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).single()
            } else {
                None
            },
            deleted_by: None,
        }
    }

    #[test]
    fn local_fallback_counts_by_status_and_deleted() {
        let records = vec![
            year("a", SchoolYearStatus::Draft, false, false),
            year("b", SchoolYearStatus::Active, true, false),
            year("c", SchoolYearStatus::Active, false, true),
            year("d", SchoolYearStatus::Archived, false, false),
        ];

        let stats = ScreenStats::derive(None, &records);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.draft, 1);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.archived, 1);
        assert_eq!(stats.deleted, 1);
        assert_eq!(stats.default_display(), "Year b");
    }

    #[test]
    fn deleted_default_does_not_count_as_default() {
        let records = vec![year("a", SchoolYearStatus::Active, true, true)];
        let stats = ScreenStats::derive(None, &records);
        assert_eq!(stats.default_display(), "none");
    }

    #[test]
    fn server_counts_win_when_present() {
        let server = SchoolYearStatistics {
            total: 12,
            by_status: StatusCounts {
                draft: 3,
                active: 7,
                archived: 2,
            },
            deleted: 4,
        };
        let records = vec![year("a", SchoolYearStatus::Active, true, false)];

        let stats = ScreenStats::derive(Some(&server), &records);
        assert_eq!(stats.total, 12);
        assert_eq!(stats.active, 7);
        assert_eq!(stats.deleted, 4);
        // Name still comes from the loaded page.
        assert_eq!(stats.default_display(), "Year a");
    }
}
