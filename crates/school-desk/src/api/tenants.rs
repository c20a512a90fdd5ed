use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;

use crate::domain::{AccessRequest, AccessRequestStatus, Paginated, Tenant, UserRole};

use super::{ApiClient, ApiError, QueryParams};

#[derive(Debug, Clone, Default)]
pub struct TenantListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

impl TenantListQuery {
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.push_u32("page", self.page);
        params.push_u32("limit", self.limit);
        params.push_opt_str("search", self.search.as_deref());
        params
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenant {
    pub name: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Read-mostly client for `/tenants`.
#[derive(Debug, Clone)]
pub struct TenantApi {
    client: Arc<ApiClient>,
}

impl TenantApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &TenantListQuery) -> Result<Paginated<Tenant>, ApiError> {
        self.client.get_json("/tenants", &query.to_params()).await
    }

    pub async fn get(&self, id: &str) -> Result<Tenant, ApiError> {
        self.client
            .get_json(&format!("/tenants/{id}"), &QueryParams::new())
            .await
    }

    pub async fn create(&self, input: &CreateTenant) -> Result<Tenant, ApiError> {
        self.client.send_json(Method::POST, "/tenants", input).await
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccessRequest {
    pub tenant_id: String,
    pub requested_role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAccessRequest {
    pub status: AccessRequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_notes: Option<String>,
}

/// Client for `/tenant-access`: join requests and their admin review.
#[derive(Debug, Clone)]
pub struct AccessRequestApi {
    client: Arc<ApiClient>,
}

impl AccessRequestApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn submit(&self, input: &CreateAccessRequest) -> Result<AccessRequest, ApiError> {
        self.client
            .send_json(Method::POST, "/tenant-access", input)
            .await
    }

    pub async fn for_tenant(&self, tenant_id: &str) -> Result<Vec<AccessRequest>, ApiError> {
        let mut params = QueryParams::new();
        params.push_str("tenantId", tenant_id);
        self.client.get_json("/tenant-access", &params).await
    }

    pub async fn review(
        &self,
        id: &str,
        input: &ReviewAccessRequest,
    ) -> Result<AccessRequest, ApiError> {
        self.client
            .send_json(Method::PATCH, &format!("/tenant-access/{id}/review"), input)
            .await
    }

    pub async fn cancel(&self, id: &str) -> Result<AccessRequest, ApiError> {
        self.client
            .send_empty(Method::POST, &format!("/tenant-access/{id}/cancel"))
            .await
    }
}
