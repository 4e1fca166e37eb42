use crate::core::{
    self, ApplicationFilter, ApplicationForm, ExportError, ExporterOperations, FieldError,
    IpoApplication, IpoName, IpoStoreOperations, IpoSummary, PortfolioSummary, SortDirection,
    SortField, SortState, StoreError, ValidationErrors,
};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug)]
pub enum LogicError {
    Validation(ValidationErrors),
    InvalidIpoName(FieldError),
    Store(StoreError),
    Export(ExportError),
    NothingToExport,
}

impl From<ValidationErrors> for LogicError {
    fn from(err: ValidationErrors) -> Self {
        LogicError::Validation(err)
    }
}

impl From<StoreError> for LogicError {
    fn from(err: StoreError) -> Self {
        LogicError::Store(err)
    }
}

impl From<ExportError> for LogicError {
    fn from(err: ExportError) -> Self {
        LogicError::Export(err)
    }
}

impl std::fmt::Display for LogicError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogicError::Validation(errors) => write!(f, "Application rejected: {errors}"),
            LogicError::InvalidIpoName(error) => {
                write!(f, "{}", error.message_for(core::ApplicationField::IpoName))
            }
            LogicError::Store(e) => write!(f, "{e}"),
            LogicError::Export(e) => write!(f, "{e}"),
            LogicError::NothingToExport => write!(f, "No applications match, nothing to export"),
        }
    }
}

impl std::error::Error for LogicError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LogicError::Validation(e) => Some(e),
            LogicError::Store(e) => Some(e),
            LogicError::Export(e) => Some(e),
            LogicError::InvalidIpoName(_) | LogicError::NothingToExport => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, LogicError>;

/// Rows of the applications table plus the footer total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationView {
    pub rows: Vec<IpoApplication>,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    pub summary: PortfolioSummary,
    pub ipo_summaries: Vec<IpoSummary>,
    pub recent: Vec<IpoApplication>,
}

/*
 * Presentation-facing logic of the tracker. Every operation re-reads the
 * collections from the injected store before acting, so the views it returns
 * are never based on a stale snapshot. Validation always runs before a write;
 * a rejected input never reaches the store.
 *
 * It also holds the applications table's sort state, which is UI state and is
 * not persisted.
 */
pub struct IpoTrackerLogic {
    store: Arc<dyn IpoStoreOperations>,
    exporter: Arc<dyn ExporterOperations>,
    sort_state: SortState,
}

impl IpoTrackerLogic {
    pub fn new(store: Arc<dyn IpoStoreOperations>, exporter: Arc<dyn ExporterOperations>) -> Self {
        IpoTrackerLogic {
            store,
            exporter,
            sort_state: SortState::default(),
        }
    }

    pub fn ipo_names(&self) -> Vec<IpoName> {
        self.store.get_ipo_names()
    }

    /*
     * Validates the form against the currently registered IPO names and, when
     * it passes, stores the normalized record.
     */
    pub fn submit_application(&self, form: &ApplicationForm) -> Result<IpoApplication> {
        let names = self.store.get_ipo_names();
        let new_application = core::validate_application_form(form, Some(names.as_slice()))?;
        let added = self.store.add_application(new_application)?;
        log::debug!("AppLogic: Application '{}' stored.", added.id);
        Ok(added)
    }

    pub fn submit_ipo_name(&self, candidate: &str) -> Result<IpoName> {
        let existing = self.store.get_ipo_names();
        let name = core::validate_ipo_name(candidate, &existing).map_err(|error| {
            log::debug!("AppLogic: IPO name '{candidate}' rejected: {error:?}");
            LogicError::InvalidIpoName(error)
        })?;
        Ok(self.store.add_ipo_name(&name)?)
    }

    pub fn remove_application(&self, id: &str) -> Result<()> {
        Ok(self.store.delete_application(id)?)
    }

    /*
     * Removes an IPO name. Applications that reference it keep their label; the
     * count of such applications is returned so callers can point them out.
     */
    pub fn remove_ipo_name(&self, id: &str) -> Result<usize> {
        let orphaned = match self.store.get_ipo_names().iter().find(|n| n.id == id) {
            Some(name) => self
                .store
                .get_applications()
                .iter()
                .filter(|application| application.ipo_name == name.name)
                .count(),
            None => 0,
        };
        self.store.delete_ipo_name(id)?;
        if orphaned > 0 {
            log::info!("AppLogic: {orphaned} application(s) now reference a removed IPO name.");
        }
        Ok(orphaned)
    }

    pub fn sort_state(&self) -> SortState {
        self.sort_state
    }

    /// Same effect as clicking a column header in the table.
    pub fn select_sort_field(&mut self, field: SortField) {
        self.sort_state.select(field);
    }

    pub fn set_sort_direction(&mut self, direction: SortDirection) {
        self.sort_state.direction = direction;
    }

    pub fn application_view(&self, filter: &ApplicationFilter) -> ApplicationView {
        let filtered = filter.apply(&self.store.get_applications());
        let rows = self.sort_state.apply(&filtered);
        let total_amount = core::query::total_amount(&rows);
        ApplicationView { rows, total_amount }
    }

    pub fn dashboard(&self, recent_limit: usize) -> Dashboard {
        let names = self.store.get_ipo_names();
        let applications = self.store.get_applications();
        Dashboard {
            summary: core::query::portfolio_summary(&names, &applications),
            ipo_summaries: core::query::group_by_ipo_name(&names, &applications),
            recent: core::query::recent_applications(&applications, recent_limit),
        }
    }

    /*
     * Exports the filtered applications in storage order. An empty selection is
     * refused instead of producing a header-only file.
     */
    pub fn export(&self, filter: &ApplicationFilter, target_dir: &Path) -> Result<PathBuf> {
        let selected = filter.apply(&self.store.get_applications());
        if selected.is_empty() {
            return Err(LogicError::NothingToExport);
        }
        Ok(self.exporter.export_applications(&selected, target_dir)?)
    }
}
