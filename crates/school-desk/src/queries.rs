use std::sync::Arc;

use crate::api::school_years::{
    BulkDelete, BulkResult, BulkStatusUpdate, CreateSchoolYear, PatchSchoolYear, SchoolYearApi,
    SchoolYearListQuery, SchoolYearStatistics, TenantYears, UpdateSchoolYear,
};
use crate::api::tenants::{
    AccessRequestApi, CreateAccessRequest, CreateTenant, ReviewAccessRequest, TenantApi,
    TenantListQuery,
};
use crate::api::ApiError;
use crate::cache::{stale, KeyFamily, QueryCache, QueryKey};
use crate::domain::{AccessRequest, Paginated, SchoolYear, SchoolYearStatus, Tenant};
use crate::notify::{Notice, Notifier};
use crate::session::SessionHandle;
use crate::store::SelectionStore;

/// Cached query and mutation layer for the school-year family.
///
/// Queries serve fresh cache hits without touching the network; mutations
/// invalidate the whole family (lists, details, tenant views, stats) on
/// success and publish a transient notice either way. Failed mutations leave
/// the cache untouched so stale reads never mask a rejected write.
pub struct SchoolYearQueries {
    api: SchoolYearApi,
    cache: Arc<QueryCache>,
    notifier: Arc<dyn Notifier>,
    session: Arc<SessionHandle>,
    store: Arc<SelectionStore>,
}

impl SchoolYearQueries {
    pub fn new(
        api: SchoolYearApi,
        cache: Arc<QueryCache>,
        notifier: Arc<dyn Notifier>,
        session: Arc<SessionHandle>,
        store: Arc<SelectionStore>,
    ) -> Self {
        Self {
            api,
            cache,
            notifier,
            session,
            store,
        }
    }

    /// Query gate: a tenant must be selected and the caller authenticated.
    pub fn enabled(&self) -> bool {
        self.session.is_authenticated() && self.store.selected_tenant().is_some()
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub async fn list(
        &self,
        query: &SchoolYearListQuery,
    ) -> Result<Paginated<SchoolYear>, ApiError> {
        let key = QueryKey::SchoolYearList(query.to_params().into_pairs());
        // Search-as-you-type results go stale faster than plain lists.
        let max_age = if query.search.is_some() {
            stale::SEARCH
        } else {
            stale::LIST
        };
        if let Some(hit) = self.cache.lookup(&key, max_age) {
            return Ok(hit);
        }
        let page = self.api.list(query).await?;
        self.cache.put(key, &page);
        Ok(page)
    }

    pub async fn detail(&self, id: &str, include_deleted: bool) -> Result<SchoolYear, ApiError> {
        let key = QueryKey::SchoolYearDetail(id.to_string());
        if !include_deleted {
            if let Some(hit) = self.cache.lookup(&key, stale::DETAIL) {
                return Ok(hit);
            }
        }
        let year = self.api.get(id, include_deleted).await?;
        if !include_deleted {
            self.cache.put(key, &year);
        }
        Ok(year)
    }

    pub async fn tenant_years(&self, tenant_id: &str) -> Result<TenantYears, ApiError> {
        let key = QueryKey::TenantYearList(tenant_id.to_string());
        if let Some(hit) = self.cache.lookup(&key, stale::LIST) {
            return Ok(hit);
        }
        let years = self.api.for_tenant(tenant_id).await?;
        self.cache.put(key, &years);
        Ok(years)
    }

    pub async fn statistics(
        &self,
        tenant_id: Option<&str>,
    ) -> Result<SchoolYearStatistics, ApiError> {
        let key = QueryKey::SchoolYearStats(tenant_id.map(str::to_string));
        if let Some(hit) = self.cache.lookup(&key, stale::STATS) {
            return Ok(hit);
        }
        let stats = self.api.statistics(tenant_id).await?;
        self.cache.put(key, &stats);
        Ok(stats)
    }

    pub async fn create(&self, input: &CreateSchoolYear) -> Result<SchoolYear, ApiError> {
        match self.api.create(input).await {
            Ok(year) => {
                self.after_write();
                self.notifier.publish(Notice::success(format!(
                    "School year \"{}\" created",
                    year.name
                )));
                Ok(year)
            }
            Err(err) => Err(self.report(err, "create the school year")),
        }
    }

    pub async fn update(&self, id: &str, input: &UpdateSchoolYear) -> Result<SchoolYear, ApiError> {
        match self.api.update(id, input).await {
            Ok(year) => {
                self.after_write();
                self.notifier.publish(Notice::success(format!(
                    "School year \"{}\" updated",
                    year.name
                )));
                Ok(year)
            }
            Err(err) => Err(self.report(err, "update the school year")),
        }
    }

    pub async fn patch(&self, id: &str, input: &PatchSchoolYear) -> Result<SchoolYear, ApiError> {
        match self.api.patch(id, input).await {
            Ok(year) => {
                self.after_write();
                self.notifier.publish(Notice::success(format!(
                    "School year \"{}\" updated",
                    year.name
                )));
                Ok(year)
            }
            Err(err) => Err(self.report(err, "update the school year")),
        }
    }

    pub async fn soft_delete(&self, id: &str) -> Result<(), ApiError> {
        let deleted_by = self.session.current_user().map(|user| user.id);
        match self.api.soft_delete(id, deleted_by.as_deref()).await {
            Ok(()) => {
                self.after_write();
                self.notifier
                    .publish(Notice::success("School year deleted"));
                Ok(())
            }
            Err(err) => Err(self.report(err, "delete the school year")),
        }
    }

    pub async fn restore(&self, id: &str) -> Result<SchoolYear, ApiError> {
        match self.api.restore(id).await {
            Ok(year) => {
                self.after_write();
                self.notifier.publish(Notice::success(format!(
                    "School year \"{}\" restored",
                    year.name
                )));
                Ok(year)
            }
            Err(err) => Err(self.report(err, "restore the school year")),
        }
    }

    pub async fn activate(&self, id: &str) -> Result<SchoolYear, ApiError> {
        match self.api.activate(id).await {
            Ok(year) => {
                self.after_write();
                self.notifier.publish(Notice::success(format!(
                    "School year \"{}\" activated",
                    year.name
                )));
                Ok(year)
            }
            Err(err) => Err(self.report(err, "activate the school year")),
        }
    }

    pub async fn archive(&self, id: &str) -> Result<SchoolYear, ApiError> {
        match self.api.archive(id).await {
            Ok(year) => {
                self.after_write();
                self.notifier.publish(Notice::success(format!(
                    "School year \"{}\" archived",
                    year.name
                )));
                Ok(year)
            }
            Err(err) => Err(self.report(err, "archive the school year")),
        }
    }

    pub async fn set_default(&self, id: &str) -> Result<SchoolYear, ApiError> {
        match self.api.set_default(id).await {
            Ok(year) => {
                self.after_write();
                self.notifier.publish(Notice::success(format!(
                    "\"{}\" is now the default school year",
                    year.name
                )));
                Ok(year)
            }
            Err(err) => Err(self.report(err, "set the default school year")),
        }
    }

    pub async fn bulk_update_status(
        &self,
        ids: Vec<String>,
        status: SchoolYearStatus,
    ) -> Result<BulkResult, ApiError> {
        let input = BulkStatusUpdate { ids, status };
        match self.api.bulk_update_status(&input).await {
            Ok(result) => {
                self.after_write();
                let message = if result.message.trim().is_empty() {
                    format!(
                        "{} school years moved to {}",
                        result.count,
                        status.label()
                    )
                } else {
                    result.message.clone()
                };
                self.notifier.publish(Notice::success(message));
                Ok(result)
            }
            Err(err) => Err(self.report(err, "update the selected school years")),
        }
    }

    pub async fn bulk_delete(&self, ids: Vec<String>) -> Result<BulkResult, ApiError> {
        let deleted_by = self.session.current_user().map(|user| user.id);
        let input = BulkDelete { ids, deleted_by };
        match self.api.bulk_delete(&input).await {
            Ok(result) => {
                self.after_write();
                let message = if result.message.trim().is_empty() {
                    format!("{} school years deleted", result.count)
                } else {
                    result.message.clone()
                };
                self.notifier.publish(Notice::success(message));
                Ok(result)
            }
            Err(err) => Err(self.report(err, "delete the selected school years")),
        }
    }

    fn after_write(&self) {
        self.cache.invalidate_family(KeyFamily::SchoolYears);
    }

    fn report(&self, err: ApiError, action: &str) -> ApiError {
        tracing::error!(error = %err, "failed to {action}");
        self.notifier.publish(Notice::error(err.user_message()));
        err
    }
}

/// Cached reads plus tenant creation for the tenant family.
pub struct TenantQueries {
    api: TenantApi,
    access: AccessRequestApi,
    cache: Arc<QueryCache>,
    notifier: Arc<dyn Notifier>,
}

impl TenantQueries {
    pub fn new(
        api: TenantApi,
        access: AccessRequestApi,
        cache: Arc<QueryCache>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            access,
            cache,
            notifier,
        }
    }

    pub async fn list(&self, query: &TenantListQuery) -> Result<Paginated<Tenant>, ApiError> {
        let key = QueryKey::TenantList(query.to_params().into_pairs());
        let max_age = if query.search.is_some() {
            stale::SEARCH
        } else {
            stale::LIST
        };
        if let Some(hit) = self.cache.lookup(&key, max_age) {
            return Ok(hit);
        }
        let page = self.api.list(query).await?;
        self.cache.put(key, &page);
        Ok(page)
    }

    pub async fn get(&self, id: &str) -> Result<Tenant, ApiError> {
        let key = QueryKey::TenantDetail(id.to_string());
        if let Some(hit) = self.cache.lookup(&key, stale::DETAIL) {
            return Ok(hit);
        }
        let tenant = self.api.get(id).await?;
        self.cache.put(key, &tenant);
        Ok(tenant)
    }

    pub async fn create(&self, input: &CreateTenant) -> Result<Tenant, ApiError> {
        match self.api.create(input).await {
            Ok(tenant) => {
                self.cache.invalidate_family(KeyFamily::Tenants);
                self.notifier.publish(Notice::success(format!(
                    "School \"{}\" created",
                    tenant.name
                )));
                Ok(tenant)
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to create the school");
                self.notifier.publish(Notice::error(err.user_message()));
                Err(err)
            }
        }
    }

    pub async fn access_requests(&self, tenant_id: &str) -> Result<Vec<AccessRequest>, ApiError> {
        let key = QueryKey::AccessRequestList(tenant_id.to_string());
        if let Some(hit) = self.cache.lookup(&key, stale::LIST) {
            return Ok(hit);
        }
        let requests = self.access.for_tenant(tenant_id).await?;
        self.cache.put(key, &requests);
        Ok(requests)
    }

    pub async fn submit_access_request(
        &self,
        input: &CreateAccessRequest,
    ) -> Result<AccessRequest, ApiError> {
        match self.access.submit(input).await {
            Ok(request) => {
                self.cache.invalidate_family(KeyFamily::AccessRequests);
                self.notifier
                    .publish(Notice::success("Access request submitted"));
                Ok(request)
            }
            Err(err) => {
                self.notifier.publish(Notice::error(err.user_message()));
                Err(err)
            }
        }
    }

    pub async fn cancel_access_request(&self, id: &str) -> Result<AccessRequest, ApiError> {
        match self.access.cancel(id).await {
            Ok(request) => {
                self.cache.invalidate_family(KeyFamily::AccessRequests);
                self.notifier
                    .publish(Notice::success("Access request cancelled"));
                Ok(request)
            }
            Err(err) => {
                self.notifier.publish(Notice::error(err.user_message()));
                Err(err)
            }
        }
    }

    pub async fn review_access_request(
        &self,
        id: &str,
        input: &ReviewAccessRequest,
    ) -> Result<AccessRequest, ApiError> {
        match self.access.review(id, input).await {
            Ok(request) => {
                self.cache.invalidate_family(KeyFamily::AccessRequests);
                self.notifier.publish(Notice::success(format!(
                    "Access request {}",
                    request.status.label().to_lowercase()
                )));
                Ok(request)
            }
            Err(err) => {
                self.notifier.publish(Notice::error(err.user_message()));
                Err(err)
            }
        }
    }
}
