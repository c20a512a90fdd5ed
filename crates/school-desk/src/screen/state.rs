use std::collections::BTreeSet;

use crate::api::school_years::{SortDirection, SortField};
use crate::domain::SchoolYearStatus;

/// Status facet of the list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(SchoolYearStatus),
}

impl StatusFilter {
    pub fn statuses(self) -> Vec<SchoolYearStatus> {
        match self {
            Self::All => Vec::new(),
            Self::Only(status) => vec![status],
        }
    }
}

/// Local filter state; any change re-queries the list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub search: String,
    pub status: StatusFilter,
    pub show_deleted: bool,
}

impl ListFilter {
    pub fn search_term(&self) -> Option<&str> {
        let trimmed = self.search.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }

    /// True when no facet deviates from the default view.
    pub fn is_pristine(&self) -> bool {
        self.search_term().is_none() && self.status == StatusFilter::All && !self.show_deleted
    }
}

/// Client-held sort state passed through as query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            field: SortField::StartDate,
            direction: SortDirection::Ascending,
        }
    }
}

impl SortState {
    /// Same field flips the direction; a new field starts ascending.
    pub fn toggle(&mut self, field: SortField) {
        if self.field == field {
            self.direction = self.direction.flipped();
        } else {
            self.field = field;
            self.direction = SortDirection::Ascending;
        }
    }
}

/// Accumulated per-row checkbox state for bulk operations.
#[derive(Debug, Clone, Default)]
pub struct RowSelection {
    ids: BTreeSet<String>,
}

impl RowSelection {
    pub fn toggle(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
    }

    /// Set-unions every currently visible id into the selection.
    pub fn select_all<'a>(&mut self, visible: impl IntoIterator<Item = &'a str>) {
        self.ids.extend(visible.into_iter().map(str::to_string));
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }
}
