use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::domain::{SchoolYearRef, TenantRef};

/// Fixed file name the selection is persisted under.
pub const SELECTION_FILE: &str = "school-desk.selection.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Selection {
    selected_tenant: Option<TenantRef>,
    selected_year: Option<SchoolYearRef>,
}

/// The only durable client-side state: the active tenant and school year.
///
/// Rehydrated synchronously on open; a missing or corrupt file yields an
/// empty selection. Setting a new tenant deliberately leaves the year in
/// place: consuming screens re-derive it on tenant change.
#[derive(Debug)]
pub struct SelectionStore {
    path: PathBuf,
    state: Mutex<Selection>,
}

impl SelectionStore {
    pub fn open(dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref().join(SELECTION_FILE);
        let state = Self::rehydrate(&path);
        Self {
            path,
            state: Mutex::new(state),
        }
    }

    fn rehydrate(path: &Path) -> Selection {
        match fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                tracing::warn!(error = %err, path = %path.display(), "corrupt selection file, starting empty");
                Selection::default()
            }),
            Err(_) => Selection::default(),
        }
    }

    pub fn selected_tenant(&self) -> Option<TenantRef> {
        self.state
            .lock()
            .expect("selection mutex poisoned")
            .selected_tenant
            .clone()
    }

    pub fn selected_year(&self) -> Option<SchoolYearRef> {
        self.state
            .lock()
            .expect("selection mutex poisoned")
            .selected_year
            .clone()
    }

    pub fn set_selected_tenant(&self, tenant: Option<TenantRef>) {
        let mut guard = self.state.lock().expect("selection mutex poisoned");
        guard.selected_tenant = tenant;
        self.persist(&guard);
    }

    pub fn set_selected_year(&self, year: Option<SchoolYearRef>) {
        let mut guard = self.state.lock().expect("selection mutex poisoned");
        guard.selected_year = year;
        self.persist(&guard);
    }

    pub fn reset(&self) {
        let mut guard = self.state.lock().expect("selection mutex poisoned");
        *guard = Selection::default();
        self.persist(&guard);
    }

    /// Best effort, like browser storage: a failed write is logged, never
    /// surfaced to the screen.
    fn persist(&self, selection: &Selection) {
        let result = serde_json::to_vec_pretty(selection)
            .map_err(|err| err.to_string())
            .and_then(|bytes| fs::write(&self.path, bytes).map_err(|err| err.to_string()));
        if let Err(err) = result {
            tracing::warn!(error = %err, path = %self.path.display(), "failed to persist selection");
        }
    }
}
