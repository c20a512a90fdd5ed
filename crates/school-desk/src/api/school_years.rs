use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::domain::{Paginated, SchoolYear, SchoolYearStatus};

use super::{ApiClient, ApiError, QueryParams};

/// Fields the list endpoint accepts for ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Name,
    Code,
    StartDate,
    EndDate,
    Status,
}

impl SortField {
    pub const fn param(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Code => "code",
            Self::StartDate => "startDate",
            Self::EndDate => "endDate",
            Self::Status => "status",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub const fn param(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }

    pub const fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Filter set for `GET /school-years`. Empty and `None` fields never reach
/// the query string.
#[derive(Debug, Clone, Default)]
pub struct SchoolYearListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub statuses: Vec<SchoolYearStatus>,
    pub tenant_id: Option<String>,
    pub is_default: Option<bool>,
    pub include_deleted: Option<bool>,
    pub start_after: Option<NaiveDate>,
    pub end_before: Option<NaiveDate>,
    pub sort_by: Option<SortField>,
    pub sort_dir: Option<SortDirection>,
}

impl SchoolYearListQuery {
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.push_u32("page", self.page);
        params.push_u32("limit", self.limit);
        params.push_opt_str("search", self.search.as_deref());
        params.push_list(
            "status",
            self.statuses.iter().map(|status| status.as_param()),
        );
        params.push_opt_str("tenantId", self.tenant_id.as_deref());
        params.push_bool("isDefault", self.is_default);
        params.push_bool("includeDeleted", self.include_deleted);
        params.push_date("startAfter", self.start_after);
        params.push_date("endBefore", self.end_before);
        params.push_opt_str("sortBy", self.sort_by.map(SortField::param));
        params.push_opt_str("sortDir", self.sort_dir.map(SortDirection::param));
        params
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSchoolYear {
    pub tenant_id: String,
    pub name: String,
    pub code: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SchoolYearStatus>,
    pub is_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSchoolYear {
    pub name: String,
    pub code: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: SchoolYearStatus,
    pub is_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Partial update; absent fields are left untouched by the server.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchSchoolYear {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SchoolYearStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SoftDeleteBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    deleted_by: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusUpdate {
    pub ids: Vec<String>,
    pub status: SchoolYearStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDelete {
    pub ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<String>,
}

/// Aggregate outcome of a bulk endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkResult {
    pub success: bool,
    pub count: u64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StatusCounts {
    #[serde(default)]
    pub draft: u64,
    #[serde(default)]
    pub active: u64,
    #[serde(default)]
    pub archived: u64,
}

/// Server-side aggregate counts for a tenant's school years.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolYearStatistics {
    pub total: u64,
    #[serde(default)]
    pub by_status: StatusCounts,
    #[serde(default)]
    pub deleted: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantYears {
    pub data: Vec<SchoolYear>,
    #[serde(default)]
    pub statistics: Option<SchoolYearStatistics>,
}

/// Typed wrapper over the `/school-years` REST family. Stateless; errors
/// propagate unchanged as [`ApiError`].
#[derive(Debug, Clone)]
pub struct SchoolYearApi {
    client: Arc<ApiClient>,
}

impl SchoolYearApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(
        &self,
        query: &SchoolYearListQuery,
    ) -> Result<Paginated<SchoolYear>, ApiError> {
        self.client
            .get_json("/school-years", &query.to_params())
            .await
    }

    pub async fn get(&self, id: &str, include_deleted: bool) -> Result<SchoolYear, ApiError> {
        let mut params = QueryParams::new();
        if include_deleted {
            params.push_bool("includeDeleted", Some(true));
        }
        self.client
            .get_json(&format!("/school-years/{id}"), &params)
            .await
    }

    pub async fn for_tenant(&self, tenant_id: &str) -> Result<TenantYears, ApiError> {
        self.client
            .get_json(
                &format!("/school-years/tenant/{tenant_id}"),
                &QueryParams::new(),
            )
            .await
    }

    pub async fn create(&self, input: &CreateSchoolYear) -> Result<SchoolYear, ApiError> {
        self.client
            .send_json(Method::POST, "/school-years", input)
            .await
    }

    pub async fn update(&self, id: &str, input: &UpdateSchoolYear) -> Result<SchoolYear, ApiError> {
        self.client
            .send_json(Method::PUT, &format!("/school-years/{id}"), input)
            .await
    }

    pub async fn patch(&self, id: &str, input: &PatchSchoolYear) -> Result<SchoolYear, ApiError> {
        self.client
            .send_json(Method::PATCH, &format!("/school-years/{id}"), input)
            .await
    }

    pub async fn set_default(&self, id: &str) -> Result<SchoolYear, ApiError> {
        self.client
            .send_empty(Method::POST, &format!("/school-years/{id}/set-default"))
            .await
    }

    pub async fn activate(&self, id: &str) -> Result<SchoolYear, ApiError> {
        self.client
            .send_empty(Method::PATCH, &format!("/school-years/{id}/activate"))
            .await
    }

    pub async fn archive(&self, id: &str) -> Result<SchoolYear, ApiError> {
        self.client
            .send_empty(Method::PATCH, &format!("/school-years/{id}/archive"))
            .await
    }

    pub async fn toggle_status(&self, id: &str) -> Result<SchoolYear, ApiError> {
        self.client
            .send_empty(Method::PATCH, &format!("/school-years/{id}/toggle-status"))
            .await
    }

    /// Soft delete; reversible through [`SchoolYearApi::restore`].
    pub async fn soft_delete(&self, id: &str, deleted_by: Option<&str>) -> Result<(), ApiError> {
        let body = SoftDeleteBody {
            deleted_by: deleted_by.map(str::to_string),
        };
        self.client
            .send_unit(Method::DELETE, &format!("/school-years/{id}"), Some(&body))
            .await
    }

    /// Irreversible, privileged; not reachable from the management screen.
    pub async fn hard_delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .send_unit::<()>(Method::DELETE, &format!("/school-years/{id}/hard"), None)
            .await
    }

    pub async fn restore(&self, id: &str) -> Result<SchoolYear, ApiError> {
        self.client
            .send_empty(Method::POST, &format!("/school-years/{id}/restore"))
            .await
    }

    pub async fn bulk_update_status(
        &self,
        input: &BulkStatusUpdate,
    ) -> Result<BulkResult, ApiError> {
        self.client
            .send_json(Method::POST, "/school-years/bulk/update-status", input)
            .await
    }

    pub async fn bulk_delete(&self, input: &BulkDelete) -> Result<BulkResult, ApiError> {
        self.client
            .send_json(Method::POST, "/school-years/bulk/delete", input)
            .await
    }

    pub async fn statistics(
        &self,
        tenant_id: Option<&str>,
    ) -> Result<SchoolYearStatistics, ApiError> {
        let mut params = QueryParams::new();
        params.push_opt_str("tenantId", tenant_id);
        self.client
            .get_json("/school-years/statistics", &params)
            .await
    }
}
