mod dialogs;
mod state;
mod stats;

pub use dialogs::{Dialog, DialogKind};
pub use state::{ListFilter, RowSelection, SortState, StatusFilter};
pub use stats::ScreenStats;

use std::sync::Arc;

use chrono::Local;

use crate::api::school_years::{
    CreateSchoolYear, SchoolYearListQuery, SchoolYearStatistics, SortField, UpdateSchoolYear,
};
use crate::api::ApiError;
use crate::domain::{ListMeta, SchoolYear, SchoolYearForm, SchoolYearStatus};
use crate::export::{self, DownloadSink, ExportOptions};
use crate::notify::Notifier;
use crate::queries::SchoolYearQueries;
use crate::session::SessionHandle;
use crate::shell::Shell;
use crate::store::SelectionStore;

const DEFAULT_PAGE_SIZE: u32 = 20;

/// Record-set phase, independent of whatever dialog is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListPhase {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// The school-year management screen: filterable, paginated list plus
/// create/edit/delete/restore/export actions behind modal dialogs.
///
/// All mutating actions follow one error policy: the failure is logged and
/// noticed, the dialog stays open with its pending flag cleared, and the
/// screen itself never leaves the `Ready` phase.
pub struct SchoolYearScreen {
    queries: Arc<SchoolYearQueries>,
    shell: Arc<Shell>,
    store: Arc<SelectionStore>,
    session: Arc<SessionHandle>,
    notifier: Arc<dyn Notifier>,
    pub filter: ListFilter,
    pub sort: SortState,
    pub selection: RowSelection,
    pub dialog: Option<Dialog>,
    pub phase: ListPhase,
    pub page: u32,
    pub page_size: u32,
    row_pending: Option<String>,
    records: Vec<SchoolYear>,
    meta: Option<ListMeta>,
    server_stats: Option<SchoolYearStatistics>,
}

impl SchoolYearScreen {
    pub fn new(
        queries: Arc<SchoolYearQueries>,
        shell: Arc<Shell>,
        store: Arc<SelectionStore>,
        session: Arc<SessionHandle>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            queries,
            shell,
            store,
            session,
            notifier,
            filter: ListFilter::default(),
            sort: SortState::default(),
            selection: RowSelection::default(),
            dialog: None,
            phase: ListPhase::Idle,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            row_pending: None,
            records: Vec::new(),
            meta: None,
            server_stats: None,
        }
    }

    pub fn records(&self) -> &[SchoolYear] {
        &self.records
    }

    pub fn meta(&self) -> Option<&ListMeta> {
        self.meta.as_ref()
    }

    pub fn stats(&self) -> ScreenStats {
        ScreenStats::derive(self.server_stats.as_ref(), &self.records)
    }

    pub fn row_pending(&self) -> Option<&str> {
        self.row_pending.as_deref()
    }

    fn build_query(&self) -> SchoolYearListQuery {
        SchoolYearListQuery {
            page: Some(self.page),
            limit: Some(self.page_size),
            search: self.filter.search_term().map(str::to_string),
            statuses: self.filter.status.statuses(),
            tenant_id: self.store.selected_tenant().map(|tenant| tenant.id),
            include_deleted: if self.filter.show_deleted {
                Some(true)
            } else {
                None
            },
            sort_by: Some(self.sort.field),
            sort_dir: Some(self.sort.direction),
            ..SchoolYearListQuery::default()
        }
    }

    /// Fetches the current page. Gated on "tenant selected and signed in";
    /// otherwise the screen stays idle.
    pub async fn load(&mut self) {
        if !self.queries.enabled() {
            self.phase = ListPhase::Idle;
            return;
        }

        self.phase = ListPhase::Loading;
        let query = self.build_query();
        match self.queries.list(&query).await {
            Ok(page) => {
                self.records = page.data;
                self.meta = Some(page.meta);
                self.phase = ListPhase::Ready;

                let tenant_id = self.store.selected_tenant().map(|tenant| tenant.id);
                self.server_stats = self
                    .queries
                    .statistics(tenant_id.as_deref())
                    .await
                    .ok();

                self.sync_year_selection();
                self.maybe_auto_open_create();
            }
            Err(err) => {
                self.shell.absorb_api_error(&err);
                self.phase = ListPhase::Failed(err.user_message());
            }
        }
    }

    /// Manual refresh exposed to the user; semantics identical to `load`.
    pub async fn refresh(&mut self) {
        self.load().await;
    }

    /// Auto-select the tenant's working year when none is chosen yet:
    /// the live default first, else the first active year.
    fn sync_year_selection(&self) {
        if self.store.selected_year().is_some() {
            return;
        }
        let pick = self
            .records
            .iter()
            .find(|year| year.is_live_default())
            .or_else(|| {
                self.records
                    .iter()
                    .find(|year| !year.is_deleted() && year.status == SchoolYearStatus::Active)
            });
        if let Some(year) = pick {
            self.store.set_selected_year(Some(year.to_ref()));
        }
    }

    /// An admin landing on a tenant with no school years at all goes
    /// straight into creation.
    fn maybe_auto_open_create(&mut self) {
        let total = self.meta.as_ref().map(|meta| meta.total).unwrap_or(0);
        if total == 0
            && self.filter.is_pristine()
            && self.session.is_admin()
            && self.dialog.is_none()
        {
            self.open_create();
        }
    }

    // ---- filters, sort, paging -------------------------------------------

    pub async fn set_search(&mut self, search: impl Into<String>) {
        self.filter.search = search.into();
        self.page = 1;
        self.load().await;
    }

    pub async fn set_status_filter(&mut self, status: StatusFilter) {
        self.filter.status = status;
        self.page = 1;
        self.load().await;
    }

    pub async fn set_show_deleted(&mut self, show_deleted: bool) {
        self.filter.show_deleted = show_deleted;
        self.page = 1;
        self.load().await;
    }

    pub async fn toggle_sort(&mut self, field: SortField) {
        self.sort.toggle(field);
        self.load().await;
    }

    pub async fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
        self.load().await;
    }

    // ---- dialogs ----------------------------------------------------------

    pub fn open_create(&mut self) {
        self.dialog = Some(Dialog::open(DialogKind::Create {
            form: SchoolYearForm::default(),
        }));
    }

    pub fn open_edit(&mut self, id: &str) {
        if let Some(year) = self.records.iter().find(|year| year.id == id) {
            self.dialog = Some(Dialog::open(DialogKind::Edit {
                id: id.to_string(),
                form: SchoolYearForm::from_year(year),
            }));
        }
    }

    pub fn open_delete(&mut self, id: &str) {
        self.dialog = Some(Dialog::open(DialogKind::Delete { id: id.to_string() }));
    }

    pub fn open_restore(&mut self, id: &str) {
        self.dialog = Some(Dialog::open(DialogKind::Restore { id: id.to_string() }));
    }

    pub fn open_bulk_delete(&mut self) {
        if !self.selection.is_empty() {
            self.dialog = Some(Dialog::open(DialogKind::BulkDelete));
        }
    }

    pub fn open_bulk_status(&mut self, status: SchoolYearStatus) {
        if !self.selection.is_empty() {
            self.dialog = Some(Dialog::open(DialogKind::BulkStatus { status }));
        }
    }

    pub fn open_export(&mut self) {
        self.dialog = Some(Dialog::open(DialogKind::Export {
            options: ExportOptions::default(),
        }));
    }

    pub fn close_dialog(&mut self) {
        self.dialog = None;
    }

    pub fn form_mut(&mut self) -> Option<&mut SchoolYearForm> {
        self.dialog.as_mut().and_then(Dialog::form_mut)
    }

    pub fn export_options_mut(&mut self) -> Option<&mut ExportOptions> {
        self.dialog.as_mut().and_then(Dialog::export_options_mut)
    }

    // ---- submissions ------------------------------------------------------

    pub async fn submit_create(&mut self) {
        let Some(tenant) = self.store.selected_tenant() else {
            return;
        };
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        let DialogKind::Create { form } = &dialog.kind else {
            return;
        };
        let form = form.clone();

        if let Err(errors) = form.validate() {
            dialog.reject(errors);
            return;
        }
        let (Some(start_date), Some(end_date)) = (form.start_date, form.end_date) else {
            return;
        };
        dialog.begin();

        let input = CreateSchoolYear {
            tenant_id: tenant.id,
            name: form.name.trim().to_string(),
            code: form.code.trim().to_string(),
            start_date,
            end_date,
            status: form.status,
            is_default: form.is_default,
            description: non_empty(&form.description),
        };

        match self.queries.create(&input).await {
            Ok(_) => {
                self.dialog = None;
                self.load().await;
            }
            Err(err) => self.fail_dialog(err),
        }
    }

    pub async fn submit_edit(&mut self) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        let DialogKind::Edit { id, form } = &dialog.kind else {
            return;
        };
        let id = id.clone();
        let form = form.clone();

        if let Err(errors) = form.validate() {
            dialog.reject(errors);
            return;
        }
        let (Some(start_date), Some(end_date)) = (form.start_date, form.end_date) else {
            return;
        };
        dialog.begin();

        let input = UpdateSchoolYear {
            name: form.name.trim().to_string(),
            code: form.code.trim().to_string(),
            start_date,
            end_date,
            status: form.status.unwrap_or(SchoolYearStatus::Draft),
            is_default: form.is_default,
            description: non_empty(&form.description),
        };

        match self.queries.update(&id, &input).await {
            Ok(_) => {
                self.dialog = None;
                self.load().await;
            }
            Err(err) => self.fail_dialog(err),
        }
    }

    pub async fn confirm_delete(&mut self) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        let DialogKind::Delete { id } = &dialog.kind else {
            return;
        };
        let id = id.clone();
        dialog.begin();

        match self.queries.soft_delete(&id).await {
            Ok(()) => {
                self.dialog = None;
                self.load().await;
            }
            Err(err) => self.fail_dialog(err),
        }
    }

    pub async fn confirm_restore(&mut self) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        let DialogKind::Restore { id } = &dialog.kind else {
            return;
        };
        let id = id.clone();
        dialog.begin();

        match self.queries.restore(&id).await {
            Ok(_) => {
                self.dialog = None;
                self.load().await;
            }
            Err(err) => self.fail_dialog(err),
        }
    }

    pub async fn confirm_bulk_status(&mut self) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        let DialogKind::BulkStatus { status } = &dialog.kind else {
            return;
        };
        let status = *status;
        let ids = self.selection.ids();
        if ids.is_empty() {
            self.dialog = None;
            return;
        }
        dialog.begin();

        match self.queries.bulk_update_status(ids, status).await {
            Ok(_) => {
                self.selection.clear();
                self.dialog = None;
                self.load().await;
            }
            Err(err) => self.fail_dialog(err),
        }
    }

    pub async fn confirm_bulk_delete(&mut self) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        if !matches!(dialog.kind, DialogKind::BulkDelete) {
            return;
        }
        let ids = self.selection.ids();
        if ids.is_empty() {
            self.dialog = None;
            return;
        }
        dialog.begin();

        match self.queries.bulk_delete(ids).await {
            Ok(_) => {
                self.selection.clear();
                self.dialog = None;
                self.load().await;
            }
            Err(err) => self.fail_dialog(err),
        }
    }

    /// Export the current record set through the export dialog.
    ///
    /// When the dialog asks for deleted rows the current filter hides, a
    /// fresh list including them is fetched as the input set.
    pub async fn run_export(&mut self, sink: &dyn DownloadSink) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        let DialogKind::Export { options } = &dialog.kind else {
            return;
        };
        let options = *options;
        dialog.begin();

        let records = if options.include_deleted && !self.filter.show_deleted {
            let mut query = self.build_query();
            query.include_deleted = Some(true);
            match self.queries.list(&query).await {
                Ok(page) => page.data,
                Err(err) => {
                    self.fail_dialog(err);
                    return;
                }
            }
        } else {
            self.records.clone()
        };

        let today = Local::now().date_naive();
        match export::export(
            &records,
            &options,
            sink,
            self.notifier.as_ref(),
            today,
        ) {
            Ok(_) => {
                self.dialog = None;
            }
            Err(err) => {
                if let Some(dialog) = self.dialog.as_mut() {
                    dialog.fail(err.to_string());
                }
            }
        }
    }

    // ---- direct row actions ----------------------------------------------

    pub async fn set_default(&mut self, id: &str) {
        self.row_action(id, RowAction::SetDefault).await;
    }

    pub async fn activate(&mut self, id: &str) {
        self.row_action(id, RowAction::Activate).await;
    }

    pub async fn archive(&mut self, id: &str) {
        self.row_action(id, RowAction::Archive).await;
    }

    async fn row_action(&mut self, id: &str, action: RowAction) {
        // The triggering control is disabled while its own mutation is
        // pending; unrelated actions stay available.
        if self.row_pending.as_deref() == Some(id) {
            return;
        }
        self.row_pending = Some(id.to_string());

        let result = match action {
            RowAction::SetDefault => self.queries.set_default(id).await.map(|_| ()),
            RowAction::Activate => self.queries.activate(id).await.map(|_| ()),
            RowAction::Archive => self.queries.archive(id).await.map(|_| ()),
        };

        self.row_pending = None;
        match result {
            Ok(()) => self.load().await,
            Err(err) => self.shell.absorb_api_error(&err),
        }
    }

    fn fail_dialog(&mut self, err: ApiError) {
        self.shell.absorb_api_error(&err);
        if let Some(dialog) = self.dialog.as_mut() {
            dialog.fail(err.user_message());
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum RowAction {
    SetDefault,
    Activate,
    Archive,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
