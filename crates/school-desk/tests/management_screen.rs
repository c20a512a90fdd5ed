//! End-to-end tests for the school-year management screen against an
//! in-process stub of the backend REST API.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Local;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use school_desk::api::school_years::SchoolYearApi;
use school_desk::api::ApiClient;
use school_desk::cache::QueryCache;
use school_desk::domain::{TenantRef, User, UserRole};
use school_desk::export::FileSink;
use school_desk::notify::{NoticeLevel, NoticeQueue};
use school_desk::queries::SchoolYearQueries;
use school_desk::screen::{DialogKind, ListPhase, SchoolYearScreen};
use school_desk::session::{Session, SessionHandle};
use school_desk::shell::{Route, Shell};
use school_desk::store::SelectionStore;

#[derive(Clone, Default)]
struct Backend {
    years: Arc<Mutex<Vec<Value>>>,
    list_calls: Arc<AtomicUsize>,
    delete_rejection: Arc<Mutex<Option<(u16, String)>>>,
    force_unauthorized: Arc<AtomicBool>,
}

impl Backend {
    fn seeded(years: Vec<Value>) -> Self {
        let backend = Self::default();
        *backend.years.lock().expect("years mutex") = years;
        backend
    }

    fn reject_deletes(&self, status: u16, message: &str) {
        *self.delete_rejection.lock().expect("rejection mutex") =
            Some((status, message.to_string()));
    }
}

fn year_value(id: &str, name: &str, code: &str, status: &str, is_default: bool) -> Value {
    json!({
        "id": id,
        "tenantId": "t1",
        "name": name,
        "code": code,
        "startDate": "2025-09-01",
        "endDate": "2026-06-30",
        "status": status,
        "isDefault": is_default,
    })
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "token expired" })),
    )
}

async fn list_years(
    State(backend): State<Backend>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    if backend.force_unauthorized.load(Ordering::SeqCst) {
        return unauthorized();
    }
    backend.list_calls.fetch_add(1, Ordering::SeqCst);

    let include_deleted = params
        .get("includeDeleted")
        .is_some_and(|value| value == "true");
    let data: Vec<Value> = backend
        .years
        .lock()
        .expect("years mutex")
        .iter()
        .filter(|year| include_deleted || year.get("deletedAt").is_none())
        .cloned()
        .collect();
    let total = data.len();
    let body = json!({
        "data": data,
        "meta": { "total": total, "page": 1, "limit": 20, "totalPages": 1 },
    });
    (StatusCode::OK, Json(body))
}

async fn create_year(
    State(backend): State<Backend>,
    Json(input): Json<Value>,
) -> impl IntoResponse {
    let mut years = backend.years.lock().expect("years mutex");
    let mut year = input;
    year["id"] = json!(format!("y{}", years.len() + 1));
    if year.get("status").is_none() {
        year["status"] = json!("draft");
    }
    if year["isDefault"] == json!(true) {
        for existing in years.iter_mut() {
            existing["isDefault"] = json!(false);
        }
    }
    years.push(year.clone());
    (StatusCode::CREATED, Json(year))
}

async fn delete_year(
    State(backend): State<Backend>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if let Some((status, message)) = backend
        .delete_rejection
        .lock()
        .expect("rejection mutex")
        .clone()
    {
        let code = StatusCode::from_u16(status).expect("valid status");
        return (code, Json(json!({ "message": message })));
    }

    let mut years = backend.years.lock().expect("years mutex");
    if let Some(year) = years.iter_mut().find(|year| year["id"] == json!(id)) {
        year["deletedAt"] = json!("2026-02-01T08:00:00Z");
        (StatusCode::OK, Json(json!({})))
    } else {
        (StatusCode::NOT_FOUND, Json(json!({ "message": "" })))
    }
}

async fn patch_year(
    State(backend): State<Backend>,
    Path(id): Path<String>,
    Json(input): Json<Value>,
) -> impl IntoResponse {
    let mut years = backend.years.lock().expect("years mutex");
    match years.iter_mut().find(|year| year["id"] == json!(id)) {
        Some(year) => {
            for (key, value) in input.as_object().expect("patch object") {
                year[key] = value.clone();
            }
            (StatusCode::OK, Json(year.clone()))
        }
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "" }))),
    }
}

async fn restore_year(
    State(backend): State<Backend>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let mut years = backend.years.lock().expect("years mutex");
    match years.iter_mut().find(|year| year["id"] == json!(id)) {
        Some(year) => {
            year.as_object_mut().expect("year object").remove("deletedAt");
            (StatusCode::OK, Json(year.clone()))
        }
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "" }))),
    }
}

async fn set_default_year(
    State(backend): State<Backend>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let mut years = backend.years.lock().expect("years mutex");
    for year in years.iter_mut() {
        year["isDefault"] = json!(year["id"] == json!(id));
    }
    match years.iter().find(|year| year["id"] == json!(id)) {
        Some(year) => (StatusCode::OK, Json(year.clone())),
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "" }))),
    }
}

async fn bulk_update_status(
    State(backend): State<Backend>,
    Json(input): Json<Value>,
) -> impl IntoResponse {
    let ids: Vec<String> = input["ids"]
        .as_array()
        .expect("ids array")
        .iter()
        .map(|id| id.as_str().expect("id string").to_string())
        .collect();
    let status = input["status"].clone();

    let mut years = backend.years.lock().expect("years mutex");
    let mut count = 0;
    for year in years.iter_mut() {
        if ids.iter().any(|id| year["id"] == json!(id)) {
            year["status"] = status.clone();
            count += 1;
        }
    }
    (
        StatusCode::OK,
        Json(json!({ "success": true, "count": count, "message": "" })),
    )
}

async fn statistics(State(backend): State<Backend>) -> impl IntoResponse {
    if backend.force_unauthorized.load(Ordering::SeqCst) {
        return unauthorized();
    }
    let years = backend.years.lock().expect("years mutex");
    let (mut draft, mut active, mut archived, mut deleted) = (0u64, 0u64, 0u64, 0u64);
    for year in years.iter() {
        if year.get("deletedAt").is_some() {
            deleted += 1;
            continue;
        }
        match year["status"].as_str() {
            Some("draft") => draft += 1,
            Some("active") => active += 1,
            Some("archived") => archived += 1,
            _ => {}
        }
    }
    let body = json!({
        "total": years.len(),
        "byStatus": { "draft": draft, "active": active, "archived": archived },
        "deleted": deleted,
    });
    (StatusCode::OK, Json(body))
}

async fn spawn_backend(backend: Backend) -> String {
    let app = Router::new()
        .route("/school-years", get(list_years).post(create_year))
        .route("/school-years/:id", delete(delete_year).patch(patch_year))
        .route("/school-years/:id/restore", post(restore_year))
        .route("/school-years/:id/set-default", post(set_default_year))
        .route("/school-years/bulk/update-status", post(bulk_update_status))
        .route("/school-years/statistics", get(statistics))
        .with_state(backend);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}")
}

struct Harness {
    session: Arc<SessionHandle>,
    shell: Arc<Shell>,
    store: Arc<SelectionStore>,
    notices: Arc<NoticeQueue>,
    queries: Arc<SchoolYearQueries>,
    _state_dir: tempfile::TempDir,
}

async fn harness(backend: Backend) -> (Harness, SchoolYearScreen) {
    let base_url = spawn_backend(backend).await;

    let state_dir = tempfile::tempdir().expect("state dir");
    let session = Arc::new(SessionHandle::new());
    session.set(Session {
        token: "test-token".to_string(),
        user: User {
            id: "u1".to_string(),
            email: "admin@example.edu".to_string(),
            display_name: "Admin".to_string(),
            role: UserRole::Admin,
            email_verified: true,
        },
    });

    let store = Arc::new(SelectionStore::open(state_dir.path()));
    store.set_selected_tenant(Some(TenantRef {
        id: "t1".to_string(),
        name: "Northside Academy".to_string(),
    }));

    let client = Arc::new(
        ApiClient::new(base_url, Duration::from_secs(5), session.clone()).expect("client"),
    );
    let notices = Arc::new(NoticeQueue::new());
    let shell = Arc::new(Shell::new(session.clone()));
    let queries = Arc::new(SchoolYearQueries::new(
        SchoolYearApi::new(client),
        Arc::new(QueryCache::new()),
        notices.clone(),
        session.clone(),
        store.clone(),
    ));

    let screen = SchoolYearScreen::new(
        queries.clone(),
        shell.clone(),
        store.clone(),
        session.clone(),
        notices.clone(),
    );
    (
        Harness {
            session,
            shell,
            store,
            notices,
            queries,
            _state_dir: state_dir,
        },
        screen,
    )
}

fn seeded_pair() -> Vec<Value> {
    vec![
        year_value("y1", "2024-2025", "SY-2425", "active", true),
        year_value("y2", "2025-2026", "SY-2526", "draft", false),
    ]
}

#[tokio::test]
async fn list_is_served_from_cache_until_a_write() {
    let backend = Backend::seeded(seeded_pair());
    let (_harness, mut screen) = harness(backend.clone()).await;

    screen.load().await;
    assert_eq!(screen.phase, ListPhase::Ready);
    assert_eq!(screen.records().len(), 2);
    assert_eq!(backend.list_calls.load(Ordering::SeqCst), 1);

    screen.load().await;
    assert_eq!(backend.list_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn create_refetches_the_list_and_notifies() {
    let backend = Backend::seeded(seeded_pair());
    let (harness, mut screen) = harness(backend.clone()).await;

    screen.load().await;
    assert_eq!(backend.list_calls.load(Ordering::SeqCst), 1);

    screen.open_create();
    let form = screen.form_mut().expect("create form");
    form.name = "2026-2027".to_string();
    form.code = "SY-2627".to_string();
    form.start_date = chrono::NaiveDate::from_ymd_opt(2026, 9, 1);
    form.end_date = chrono::NaiveDate::from_ymd_opt(2027, 6, 30);
    screen.submit_create().await;

    assert!(screen.dialog.is_none());
    assert_eq!(backend.list_calls.load(Ordering::SeqCst), 2);
    assert!(screen
        .records()
        .iter()
        .any(|year| year.name == "2026-2027"));

    let notices = harness.notices.drain();
    let created = notices
        .iter()
        .find(|notice| notice.level == NoticeLevel::Success)
        .expect("success notice");
    assert!(created.message.contains("2026-2027"));
    assert!(created.message.contains("created"));
}

#[tokio::test]
async fn local_validation_rejects_before_any_request() {
    let backend = Backend::seeded(seeded_pair());
    let (_harness, mut screen) = harness(backend.clone()).await;

    screen.load().await;
    screen.open_create();
    screen.submit_create().await;

    let dialog = screen.dialog.as_ref().expect("dialog stays open");
    assert!(!dialog.pending);
    let fields: Vec<&str> = dialog
        .field_errors
        .iter()
        .map(|err| err.field.as_str())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"code"));
    // Nothing was created on the backend.
    assert_eq!(backend.years.lock().expect("years mutex").len(), 2);
}

#[tokio::test]
async fn rejected_delete_keeps_dialog_open_and_cache_intact() {
    let backend = Backend::seeded(seeded_pair());
    backend.reject_deletes(409, "Cannot delete active school year");
    let (harness, mut screen) = harness(backend.clone()).await;

    screen.load().await;
    assert_eq!(backend.list_calls.load(Ordering::SeqCst), 1);

    screen.open_delete("y1");
    screen.confirm_delete().await;

    let dialog = screen.dialog.as_ref().expect("dialog stays open");
    assert!(!dialog.pending);
    assert_eq!(
        dialog.error.as_deref(),
        Some("Cannot delete active school year")
    );

    // The cached list is still fresh, so no refetch happened.
    screen.close_dialog();
    screen.load().await;
    assert_eq!(backend.list_calls.load(Ordering::SeqCst), 1);

    let notices = harness.notices.drain();
    assert!(notices.iter().any(|notice| {
        notice.level == NoticeLevel::Error
            && notice.message == "Cannot delete active school year"
    }));
}

#[tokio::test]
async fn setting_a_new_default_clears_the_previous_one() {
    let backend = Backend::seeded(seeded_pair());
    let (harness, mut screen) = harness(backend).await;

    screen.load().await;
    screen.set_default("y2").await;

    let by_id = |records: &[school_desk::domain::SchoolYear], id: &str| {
        records
            .iter()
            .find(|year| year.id == id)
            .expect("record present")
            .is_default
    };
    assert!(by_id(screen.records(), "y2"));
    assert!(!by_id(screen.records(), "y1"));

    let notices = harness.notices.drain();
    assert!(notices
        .iter()
        .any(|notice| notice.message.contains("is now the default school year")));
}

#[tokio::test]
async fn unauthorized_list_signs_out_and_redirects() {
    let backend = Backend::seeded(seeded_pair());
    backend.force_unauthorized.store(true, Ordering::SeqCst);
    let (harness, mut screen) = harness(backend).await;
    harness.shell.navigate(Route::Dashboard);

    screen.load().await;

    assert!(matches!(screen.phase, ListPhase::Failed(_)));
    assert!(!harness.session.is_authenticated());
    assert_eq!(harness.shell.current_route(), Route::SignIn);
}

#[tokio::test]
async fn admin_with_no_years_lands_in_the_create_dialog() {
    let backend = Backend::seeded(Vec::new());
    let (_harness, mut screen) = harness(backend).await;

    screen.load().await;

    assert_eq!(screen.phase, ListPhase::Ready);
    let dialog = screen.dialog.as_ref().expect("create dialog auto-opens");
    assert!(matches!(dialog.kind, DialogKind::Create { .. }));
}

#[tokio::test]
async fn first_load_selects_the_default_year() {
    let backend = Backend::seeded(seeded_pair());
    let (harness, mut screen) = harness(backend).await;
    assert!(harness.store.selected_year().is_none());

    screen.load().await;

    let selected = harness.store.selected_year().expect("year auto-selected");
    assert_eq!(selected.id, "y1");
}

#[tokio::test]
async fn bulk_status_update_clears_selection_and_notifies() {
    let backend = Backend::seeded(seeded_pair());
    let (harness, mut screen) = harness(backend).await;

    screen.load().await;
    screen.selection.select_all(["y1", "y2"]);
    screen.open_bulk_status(school_desk::domain::SchoolYearStatus::Archived);
    screen.confirm_bulk_status().await;

    assert!(screen.dialog.is_none());
    assert!(screen.selection.is_empty());
    assert!(screen
        .records()
        .iter()
        .all(|year| year.status == school_desk::domain::SchoolYearStatus::Archived));

    let notices = harness.notices.drain();
    assert!(notices
        .iter()
        .any(|notice| notice.message.contains("2 school years moved to Archived")));
}

#[tokio::test]
async fn deleted_year_can_be_restored_from_the_deleted_view() {
    let mut deleted = year_value("y3", "2023-2024", "SY-2324", "archived", false);
    deleted["deletedAt"] = json!("2026-01-15T08:00:00Z");
    let mut years = seeded_pair();
    years.push(deleted);
    let backend = Backend::seeded(years);
    let (_harness, mut screen) = harness(backend).await;

    screen.filter.show_deleted = true;
    screen.load().await;
    assert_eq!(screen.records().len(), 3);

    screen.open_restore("y3");
    screen.confirm_restore().await;

    assert!(screen.dialog.is_none());
    let restored = screen
        .records()
        .iter()
        .find(|year| year.id == "y3")
        .expect("record present");
    assert!(!restored.is_deleted());
}

#[tokio::test]
async fn partial_update_changes_only_the_sent_field() {
    let backend = Backend::seeded(seeded_pair());
    let (harness, mut screen) = harness(backend).await;
    screen.load().await;

    let input = school_desk::api::school_years::PatchSchoolYear {
        name: Some("2024-2025 (revised)".to_string()),
        ..Default::default()
    };
    let updated = harness
        .queries
        .patch("y1", &input)
        .await
        .expect("patch succeeds");

    assert_eq!(updated.name, "2024-2025 (revised)");
    assert_eq!(updated.code, "SY-2425");

    // The write invalidated the list, so the next load refetches.
    screen.load().await;
    assert!(screen
        .records()
        .iter()
        .any(|year| year.name == "2024-2025 (revised)"));
}

#[tokio::test]
async fn export_writes_a_dated_csv_through_the_screen() {
    let backend = Backend::seeded(seeded_pair());
    let (_harness, mut screen) = harness(backend).await;

    screen.load().await;
    screen.open_export();
    let out_dir = tempfile::tempdir().expect("out dir");
    let sink = FileSink::new(out_dir.path());
    screen.run_export(&sink).await;

    assert!(screen.dialog.is_none());
    let expected = out_dir.path().join(format!(
        "school-years-{}.csv",
        Local::now().date_naive().format("%Y-%m-%d")
    ));
    let contents = std::fs::read_to_string(&expected).expect("export file written");
    assert!(contents.starts_with("Name,Code,Start Date,End Date,Status,Is Default"));
    assert!(contents.contains("2025-2026"));
}
