use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an academic year record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchoolYearStatus {
    Draft,
    Active,
    Archived,
}

impl SchoolYearStatus {
    pub const fn ordered() -> [Self; 3] {
        [Self::Draft, Self::Active, Self::Archived]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Active => "Active",
            Self::Archived => "Archived",
        }
    }

    /// Wire value used in query strings and bulk payloads.
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }
}

/// One academic year scoped to a tenant.
///
/// Soft deletion is expressed through `deleted_at`/`deleted_by`; a record with
/// `deleted_at` set stays out of default listings until restored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolYear {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub code: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: SchoolYearStatus,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollment_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollment_end: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grading_deadline: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graduation_date: Option<NaiveDate>,
    #[serde(default)]
    pub student_count: u32,
    #[serde(default)]
    pub staff_count: u32,
    #[serde(default)]
    pub class_count: u32,
    #[serde(default)]
    pub term_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<String>,
}

impl SchoolYear {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// True for the single record a tenant treats as its working year.
    pub fn is_live_default(&self) -> bool {
        self.is_default && !self.is_deleted()
    }

    pub fn to_ref(&self) -> SchoolYearRef {
        SchoolYearRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

/// Minimal handle stored by the selection store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolYearRef {
    pub id: String,
    pub name: String,
}

/// Inline error attached to a single form field before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Editable form backing the create/edit dialogs.
#[derive(Debug, Clone, Default)]
pub struct SchoolYearForm {
    pub name: String,
    pub code: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<SchoolYearStatus>,
    pub is_default: bool,
    pub description: String,
}

impl SchoolYearForm {
    pub fn from_year(year: &SchoolYear) -> Self {
        Self {
            name: year.name.clone(),
            code: year.code.clone(),
            start_date: Some(year.start_date),
            end_date: Some(year.end_date),
            status: Some(year.status),
            is_default: year.is_default,
            description: year.description.clone().unwrap_or_default(),
        }
    }

    /// Local validation, reported inline before anything is sent.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        }
        if self.code.trim().is_empty() {
            errors.push(FieldError::new("code", "Code is required"));
        }
        match (self.start_date, self.end_date) {
            (None, _) => errors.push(FieldError::new("startDate", "Start date is required")),
            (_, None) => errors.push(FieldError::new("endDate", "End date is required")),
            (Some(start), Some(end)) if start >= end => {
                errors.push(FieldError::new(
                    "endDate",
                    "End date must be after the start date",
                ));
            }
            _ => {}
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
