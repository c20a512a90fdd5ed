use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use school_desk::api::auth::AuthApi;
use school_desk::api::school_years::SchoolYearApi;
use school_desk::api::tenants::{AccessRequestApi, TenantApi};
use school_desk::api::waitlist::WaitlistApi;
use school_desk::api::ApiClient;
use school_desk::cache::QueryCache;
use school_desk::config::AppConfig;
use school_desk::domain::SchoolYearStatus;
use school_desk::export::ExportFormat;
use school_desk::notify::{NoticeLevel, NoticeQueue};
use school_desk::queries::{SchoolYearQueries, TenantQueries};
use school_desk::screen::SchoolYearScreen;
use school_desk::session::{Session, SessionHandle};
use school_desk::shell::Shell;
use school_desk::store::SelectionStore;
use school_desk::AppError;

/// Fixed file name the signed-in session is persisted under, next to the
/// selection file in the state directory.
pub(crate) const SESSION_FILE: &str = "school-desk.session.json";

/// Everything a command needs, wired once per invocation.
pub(crate) struct Context {
    pub(crate) session: Arc<SessionHandle>,
    pub(crate) store: Arc<SelectionStore>,
    pub(crate) notices: Arc<NoticeQueue>,
    pub(crate) shell: Arc<Shell>,
    pub(crate) auth: AuthApi,
    pub(crate) waitlist: WaitlistApi,
    pub(crate) years: Arc<SchoolYearQueries>,
    pub(crate) tenants: TenantQueries,
    state_dir: PathBuf,
}

impl Context {
    pub(crate) fn new(config: &AppConfig) -> Result<Self, AppError> {
        let state_dir = config.storage.state_dir.clone();
        fs::create_dir_all(&state_dir)?;

        let session = Arc::new(SessionHandle::new());
        if let Some(saved) = load_session(&state_dir) {
            session.set(saved);
        }

        let client = Arc::new(ApiClient::new(
            config.api.base_url.clone(),
            config.api.timeout,
            session.clone(),
        )?);

        let notices = Arc::new(NoticeQueue::new());
        let cache = Arc::new(QueryCache::new());
        let store = Arc::new(SelectionStore::open(&state_dir));
        let shell = Arc::new(Shell::new(session.clone()));

        let years = Arc::new(SchoolYearQueries::new(
            SchoolYearApi::new(client.clone()),
            cache.clone(),
            notices.clone(),
            session.clone(),
            store.clone(),
        ));
        let tenants = TenantQueries::new(
            TenantApi::new(client.clone()),
            AccessRequestApi::new(client.clone()),
            cache,
            notices.clone(),
        );
        let auth = AuthApi::new(client.clone());
        let waitlist = WaitlistApi::new(client);

        Ok(Self {
            session,
            store,
            notices,
            shell,
            auth,
            waitlist,
            years,
            tenants,
            state_dir,
        })
    }

    pub(crate) fn screen(&self) -> SchoolYearScreen {
        SchoolYearScreen::new(
            self.years.clone(),
            self.shell.clone(),
            self.store.clone(),
            self.session.clone(),
            self.notices.clone(),
        )
    }

    pub(crate) fn save_session(&self, session: &Session) {
        persist_session(&self.state_dir, session);
    }

    pub(crate) fn discard_session(&self) {
        let path = self.state_dir.join(SESSION_FILE);
        if let Err(err) = fs::remove_file(&path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(error = %err, path = %path.display(), "failed to remove session file");
            }
        }
    }

    /// Renders and empties the notice queue. Called once at the end of every
    /// command so feedback from the query layer reaches the terminal.
    pub(crate) fn flush_notices(&self) {
        for notice in self.notices.drain() {
            let tag = match notice.level {
                NoticeLevel::Success => "ok",
                NoticeLevel::Error => "error",
                NoticeLevel::Info => "info",
            };
            println!("[{tag}] {}", notice.message);
        }
    }
}

fn load_session(dir: &Path) -> Option<Session> {
    let bytes = fs::read(dir.join(SESSION_FILE)).ok()?;
    match serde_json::from_slice(&bytes) {
        Ok(session) => Some(session),
        Err(err) => {
            tracing::warn!(error = %err, "corrupt session file, ignoring");
            None
        }
    }
}

fn persist_session(dir: &Path, session: &Session) {
    let path = dir.join(SESSION_FILE);
    let result = serde_json::to_vec_pretty(session)
        .map_err(|err| err.to_string())
        .and_then(|bytes| fs::write(&path, bytes).map_err(|err| err.to_string()));
    if let Err(err) = result {
        tracing::warn!(error = %err, path = %path.display(), "failed to persist session");
    }
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("'{value}' is not a valid YYYY-MM-DD date"))
}

pub(crate) fn parse_status(value: &str) -> Result<SchoolYearStatus, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "draft" => Ok(SchoolYearStatus::Draft),
        "active" => Ok(SchoolYearStatus::Active),
        "archived" => Ok(SchoolYearStatus::Archived),
        other => Err(format!(
            "'{other}' is not a status (expected draft, active, or archived)"
        )),
    }
}

pub(crate) fn parse_format(value: &str) -> Result<ExportFormat, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "csv" => Ok(ExportFormat::Csv),
        "xlsx" => Ok(ExportFormat::Xlsx),
        other => Err(format!("'{other}' is not a format (expected csv or xlsx)")),
    }
}
