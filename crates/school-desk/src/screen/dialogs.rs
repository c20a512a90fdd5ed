use crate::domain::{FieldError, SchoolYearForm, SchoolYearStatus};
use crate::export::ExportOptions;

/// Which modal is on screen and the payload it edits.
#[derive(Debug, Clone)]
pub enum DialogKind {
    Create { form: SchoolYearForm },
    Edit { id: String, form: SchoolYearForm },
    Delete { id: String },
    Restore { id: String },
    BulkDelete,
    BulkStatus { status: SchoolYearStatus },
    Export { options: ExportOptions },
}

/// One open dialog: `closed → open → submitting → closed`, where a failed
/// submit drops back to open with the error attached so the user can retry.
#[derive(Debug, Clone)]
pub struct Dialog {
    pub kind: DialogKind,
    pub pending: bool,
    pub error: Option<String>,
    pub field_errors: Vec<FieldError>,
}

impl Dialog {
    pub fn open(kind: DialogKind) -> Self {
        Self {
            kind,
            pending: false,
            error: None,
            field_errors: Vec::new(),
        }
    }

    /// Enter the submitting state, clearing stale errors from a prior try.
    pub fn begin(&mut self) {
        self.pending = true;
        self.error = None;
        self.field_errors.clear();
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.pending = false;
        self.error = Some(message.into());
    }

    pub fn reject(&mut self, field_errors: Vec<FieldError>) {
        self.pending = false;
        self.field_errors = field_errors;
    }

    pub fn form_mut(&mut self) -> Option<&mut SchoolYearForm> {
        match &mut self.kind {
            DialogKind::Create { form } | DialogKind::Edit { form, .. } => Some(form),
            _ => None,
        }
    }

    pub fn export_options_mut(&mut self) -> Option<&mut ExportOptions> {
        match &mut self.kind {
            DialogKind::Export { options } => Some(options),
            _ => None,
        }
    }
}
