/*
 * This module consolidates the platform-agnostic data layer of the tracker: the
 * record schema, the persistence store (`IpoStoreOperations` over a
 * `KeyValueStorage` medium), the validation rules applied before writes, the
 * query functions behind list and dashboard views, CSV export, display
 * formatting, and user settings (`ConfigManagerOperations`).
 */
pub mod config;
pub mod export;
pub mod format;
pub mod models;
pub mod path_utils;
pub mod query;
pub mod store;
pub mod validation;

// Re-export key structures
pub use models::{IpoApplication, IpoName};
#[cfg(test)]
pub use models::NewIpoApplication;

// Re-export store related items
pub use store::{CoreIpoStore, FileKeyValueStorage, IpoStoreOperations, StoreError};
#[cfg(test)]
pub use store::InMemoryKeyValueStorage;

// Re-export validation related items
pub use validation::{
    ApplicationField, ApplicationForm, FieldError, ValidationErrors, validate_application_form,
    validate_ipo_name,
};

// Re-export query related items
pub use query::{
    ApplicationFilter, IpoSummary, PortfolioSummary, SortDirection, SortField, SortState,
};

// Re-export export related items
pub use export::{CoreExporter, ExportError, ExporterOperations};

// Re-export config related items
pub use config::{ConfigManagerOperations, CoreConfigManager, Settings};
