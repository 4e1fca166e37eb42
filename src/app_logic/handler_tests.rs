use super::handler::*;
use std::result::Result;

use crate::core::{
    ApplicationField, ApplicationFilter, ApplicationForm, CoreIpoStore, ExportError,
    ExporterOperations, FieldError, InMemoryKeyValueStorage, IpoApplication, IpoName,
    IpoStoreOperations, NewIpoApplication, SortDirection, SortField, StoreError,
};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;
use time::macros::datetime;

/*
 * Unit tests for `IpoTrackerLogic`. Most tests run against a real `CoreIpoStore`
 * over in-memory storage; `MockIpoStore` and `MockExporter` cover call
 * recording and failure paths that the real implementations cannot produce on
 * demand.
 */

// --- Mock Structures (IpoStore, Exporter) ---
struct MockIpoStore {
    applications: Mutex<Vec<IpoApplication>>,
    names: Mutex<Vec<IpoName>>,
    fail_writes: Mutex<bool>,
    add_application_calls: Mutex<Vec<NewIpoApplication>>,
    delete_name_calls: Mutex<Vec<String>>,
}

impl MockIpoStore {
    fn new() -> Self {
        MockIpoStore {
            applications: Mutex::new(Vec::new()),
            names: Mutex::new(Vec::new()),
            fail_writes: Mutex::new(false),
            add_application_calls: Mutex::new(Vec::new()),
            delete_name_calls: Mutex::new(Vec::new()),
        }
    }

    fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }

    fn set_names(&self, names: Vec<IpoName>) {
        *self.names.lock().unwrap() = names;
    }

    fn set_applications(&self, applications: Vec<IpoApplication>) {
        *self.applications.lock().unwrap() = applications;
    }

    fn add_application_calls(&self) -> Vec<NewIpoApplication> {
        self.add_application_calls.lock().unwrap().clone()
    }

    fn delete_name_calls(&self) -> Vec<String> {
        self.delete_name_calls.lock().unwrap().clone()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if *self.fail_writes.lock().unwrap() {
            Err(StoreError::Io(io::Error::new(
                io::ErrorKind::StorageFull,
                "mocked quota exceeded",
            )))
        } else {
            Ok(())
        }
    }
}

impl IpoStoreOperations for MockIpoStore {
    fn get_applications(&self) -> Vec<IpoApplication> {
        self.applications.lock().unwrap().clone()
    }

    fn save_applications(&self, applications: &[IpoApplication]) -> Result<(), StoreError> {
        self.check_writable()?;
        *self.applications.lock().unwrap() = applications.to_vec();
        Ok(())
    }

    fn add_application(
        &self,
        new_application: NewIpoApplication,
    ) -> Result<IpoApplication, StoreError> {
        self.add_application_calls
            .lock()
            .unwrap()
            .push(new_application.clone());
        self.check_writable()?;
        let count = self.applications.lock().unwrap().len();
        let application = IpoApplication::from_new(
            new_application,
            format!("mock-app-{count}"),
            datetime!(2024-06-01 12:00:00 UTC),
        );
        self.applications.lock().unwrap().push(application.clone());
        Ok(application)
    }

    fn delete_application(&self, id: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.applications.lock().unwrap().retain(|a| a.id != id);
        Ok(())
    }

    fn get_ipo_names(&self) -> Vec<IpoName> {
        self.names.lock().unwrap().clone()
    }

    fn save_ipo_names(&self, names: &[IpoName]) -> Result<(), StoreError> {
        self.check_writable()?;
        *self.names.lock().unwrap() = names.to_vec();
        Ok(())
    }

    fn add_ipo_name(&self, name: &str) -> Result<IpoName, StoreError> {
        self.check_writable()?;
        let ipo_name = ipo_name_record(name);
        self.names.lock().unwrap().push(ipo_name.clone());
        Ok(ipo_name)
    }

    fn delete_ipo_name(&self, id: &str) -> Result<(), StoreError> {
        self.delete_name_calls.lock().unwrap().push(id.to_string());
        self.check_writable()?;
        self.names.lock().unwrap().retain(|n| n.id != id);
        Ok(())
    }
}
// --- End MockIpoStore ---

struct MockExporter {
    export_calls: Mutex<Vec<(Vec<String>, PathBuf)>>,
    fail: Mutex<bool>,
}

impl MockExporter {
    fn new() -> Self {
        MockExporter {
            export_calls: Mutex::new(Vec::new()),
            fail: Mutex::new(false),
        }
    }

    fn set_fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    fn export_calls(&self) -> Vec<(Vec<String>, PathBuf)> {
        self.export_calls.lock().unwrap().clone()
    }
}

impl ExporterOperations for MockExporter {
    fn export_applications(
        &self,
        applications: &[IpoApplication],
        target_dir: &Path,
    ) -> Result<PathBuf, ExportError> {
        if *self.fail.lock().unwrap() {
            return Err(ExportError::InvalidExportDirectory(target_dir.to_path_buf()));
        }
        let numbers = applications
            .iter()
            .map(|a| a.application_number.clone())
            .collect();
        self.export_calls
            .lock()
            .unwrap()
            .push((numbers, target_dir.to_path_buf()));
        Ok(target_dir.join("ipo-applications-2024-06-01.csv"))
    }
}
// --- End MockExporter ---

fn ipo_name_record(name: &str) -> IpoName {
    IpoName {
        id: format!("name-{}", name.to_lowercase().replace(' ', "-")),
        name: name.to_string(),
        created_at: datetime!(2024-01-01 00:00:00 UTC),
    }
}

fn stored_application(
    id: &str,
    number: &str,
    ipo_name: &str,
    ipo_price: Decimal,
    timestamp: OffsetDateTime,
) -> IpoApplication {
    IpoApplication {
        id: id.to_string(),
        applicant_name: "Kiran".to_string(),
        application_number: number.to_string(),
        pan: "ABCDE1234F".to_string(),
        ipo_name: ipo_name.to_string(),
        ipo_price,
        other_price: None,
        timestamp,
    }
}

fn form_for(ipo_name: &str) -> ApplicationForm {
    ApplicationForm {
        applicant_name: "Kiran".to_string(),
        application_number: "AN-1".to_string(),
        pan: "abcde1234f".to_string(),
        ipo_name: ipo_name.to_string(),
        ipo_price: "15000".to_string(),
        other_price: String::new(),
    }
}

fn setup_logic_with_memory_store() -> (IpoTrackerLogic, Arc<CoreIpoStore<InMemoryKeyValueStorage>>)
{
    let store = Arc::new(CoreIpoStore::new(InMemoryKeyValueStorage::new()));
    let logic = IpoTrackerLogic::new(store.clone(), Arc::new(MockExporter::new()));
    (logic, store)
}

fn setup_logic_with_mocks() -> (IpoTrackerLogic, Arc<MockIpoStore>, Arc<MockExporter>) {
    let store = Arc::new(MockIpoStore::new());
    let exporter = Arc::new(MockExporter::new());
    let logic = IpoTrackerLogic::new(store.clone(), exporter.clone());
    (logic, store, exporter)
}

#[test]
fn test_submit_application_stores_normalized_record() {
    let (logic, store) = setup_logic_with_memory_store();
    logic.submit_ipo_name("Acme").unwrap();

    let added = logic.submit_application(&form_for("Acme")).unwrap();

    assert_eq!(added.pan, "ABCDE1234F");
    assert_eq!(added.ipo_price, dec!(15000));
    assert_eq!(store.get_applications(), vec![added]);
}

#[test]
fn test_submitted_prices_read_back_exactly_as_returned() {
    let (logic, store) = setup_logic_with_memory_store();
    logic.submit_ipo_name("Acme").unwrap();

    for (ipo_price, other_price) in [
        ("1.23456789012345678", "0.1"),
        ("999999999999.99", "123456789.015"),
        ("1e3", ""),
    ] {
        let form = ApplicationForm {
            ipo_price: ipo_price.to_string(),
            other_price: other_price.to_string(),
            ..form_for("Acme")
        };
        let added = logic.submit_application(&form).unwrap();
        let stored = store.get_applications().pop().unwrap();
        assert_eq!(stored, added, "{ipo_price} / {other_price}");
    }
}

#[test]
fn test_oversized_prices_are_rejected_and_views_stay_usable() {
    let (logic, store) = setup_logic_with_memory_store();
    logic.submit_ipo_name("Acme").unwrap();
    let form = ApplicationForm {
        ipo_price: "50000000000000000000000000000".to_string(),
        other_price: "50000000000000000000000000000".to_string(),
        ..form_for("Acme")
    };

    match logic.submit_application(&form) {
        Err(LogicError::Validation(errors)) => {
            assert_eq!(errors.get(ApplicationField::IpoPrice), Some(FieldError::Invalid));
            assert_eq!(errors.get(ApplicationField::OtherPrice), Some(FieldError::Invalid));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(store.get_applications().is_empty());
    assert_eq!(logic.application_view(&ApplicationFilter::default()).total_amount, Decimal::ZERO);
}

#[test]
fn test_submit_application_with_negative_price_persists_nothing() {
    let (logic, store, _exporter) = setup_logic_with_mocks();
    store.set_names(vec![ipo_name_record("Acme")]);
    let form = ApplicationForm {
        ipo_price: "-5".to_string(),
        ..form_for("Acme")
    };

    let result = logic.submit_application(&form);

    match result {
        Err(LogicError::Validation(errors)) => {
            assert_eq!(errors.get(ApplicationField::IpoPrice), Some(FieldError::Invalid));
        }
        other => panic!("Expected a validation error, got {other:?}"),
    }
    assert!(store.add_application_calls().is_empty());
    assert!(store.get_applications().is_empty());
}

#[test]
fn test_submit_application_for_unregistered_ipo_is_rejected() {
    let (logic, store) = setup_logic_with_memory_store();
    logic.submit_ipo_name("Acme").unwrap();

    let result = logic.submit_application(&form_for("Bolt"));

    assert!(matches!(
        result,
        Err(LogicError::Validation(ref errors))
            if errors.get(ApplicationField::IpoName) == Some(FieldError::UnknownIpo)
    ));
    assert!(store.get_applications().is_empty());
}

#[test]
fn test_duplicate_ipo_name_is_rejected_case_insensitively() {
    let (logic, store) = setup_logic_with_memory_store();

    logic.submit_ipo_name("Acme Ltd").unwrap();
    let second = logic.submit_ipo_name("acme ltd");

    assert!(matches!(
        second,
        Err(LogicError::InvalidIpoName(FieldError::Duplicate))
    ));
    assert_eq!(store.get_ipo_names().len(), 1);
}

#[test]
fn test_blank_ipo_name_is_required_error() {
    let (logic, store) = setup_logic_with_memory_store();
    let result = logic.submit_ipo_name("   ");
    assert!(matches!(
        result,
        Err(LogicError::InvalidIpoName(FieldError::Required))
    ));
    assert!(store.get_ipo_names().is_empty());
}

#[test]
fn test_store_write_failure_surfaces_as_store_error() {
    let (logic, store, _exporter) = setup_logic_with_mocks();
    store.set_names(vec![ipo_name_record("Acme")]);
    store.set_fail_writes(true);

    let result = logic.submit_application(&form_for("Acme"));

    assert!(matches!(result, Err(LogicError::Store(StoreError::Io(_)))));
    assert_eq!(store.add_application_calls().len(), 1);
}

#[test]
fn test_remove_ipo_name_reports_orphaned_applications_without_cascading() {
    let (logic, store, _exporter) = setup_logic_with_mocks();
    let acme = ipo_name_record("Acme");
    store.set_names(vec![acme.clone(), ipo_name_record("Bolt")]);
    store.set_applications(vec![
        stored_application("a1", "N1", "Acme", dec!(10), datetime!(2024-01-01 0:00 UTC)),
        stored_application("a2", "N2", "Acme", dec!(10), datetime!(2024-01-02 0:00 UTC)),
        stored_application("a3", "N3", "Bolt", dec!(10), datetime!(2024-01-03 0:00 UTC)),
    ]);

    let orphaned = logic.remove_ipo_name(&acme.id).unwrap();

    assert_eq!(orphaned, 2);
    assert_eq!(store.delete_name_calls(), vec![acme.id.clone()]);
    assert_eq!(store.get_applications().len(), 3);
    assert_eq!(logic.ipo_names().len(), 1);
}

#[test]
fn test_remove_application_twice_is_harmless() {
    let (logic, store) = setup_logic_with_memory_store();
    logic.submit_ipo_name("Acme").unwrap();
    let added = logic.submit_application(&form_for("Acme")).unwrap();

    logic.remove_application(&added.id).unwrap();
    logic.remove_application(&added.id).unwrap();

    assert!(store.get_applications().is_empty());
}

#[test]
fn test_application_view_filters_sorts_and_totals() {
    let (mut logic, store, _exporter) = setup_logic_with_mocks();
    store.set_applications(vec![
        stored_application("a1", "N1", "Acme", dec!(300), datetime!(2024-01-01 0:00 UTC)),
        stored_application("a2", "N2", "Bolt", dec!(100), datetime!(2024-01-02 0:00 UTC)),
        stored_application("a3", "N3", "Acme", dec!(200), datetime!(2024-01-03 0:00 UTC)),
    ]);

    let default_view = logic.application_view(&ApplicationFilter::new("", "Acme"));
    let ids: Vec<&str> = default_view.rows.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, ["a3", "a1"]);
    assert_eq!(default_view.total_amount, dec!(500));

    logic.select_sort_field(SortField::IpoPrice);
    let by_price = logic.application_view(&ApplicationFilter::default());
    let ids: Vec<&str> = by_price.rows.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, ["a2", "a3", "a1"]);

    logic.set_sort_direction(SortDirection::Descending);
    assert_eq!(logic.sort_state().field, SortField::IpoPrice);
    let by_price_desc = logic.application_view(&ApplicationFilter::default());
    assert_eq!(by_price_desc.rows[0].id, "a1");
}

#[test]
fn test_dashboard_combines_summary_groups_and_recent() {
    let (logic, store, _exporter) = setup_logic_with_mocks();
    store.set_names(vec![ipo_name_record("Acme"), ipo_name_record("Unused")]);
    store.set_applications(vec![
        stored_application("a1", "N1", "Acme", dec!(300), datetime!(2024-01-01 0:00 UTC)),
        stored_application("a2", "N2", "Gone", dec!(100), datetime!(2024-01-02 0:00 UTC)),
        stored_application("a3", "N3", "Acme", dec!(200), datetime!(2024-01-03 0:00 UTC)),
    ]);

    let dashboard = logic.dashboard(2);

    assert_eq!(dashboard.summary.total_applications, 3);
    assert_eq!(dashboard.summary.total_investment, dec!(600));
    assert_eq!(dashboard.summary.unique_ipos, 2);
    assert_eq!(dashboard.summary.registered_ipo_names, 2);
    assert_eq!(dashboard.ipo_summaries.len(), 2);
    assert_eq!(dashboard.ipo_summaries[0].application_count, 2);
    assert_eq!(dashboard.ipo_summaries[1].application_count, 0);
    let recent: Vec<&str> = dashboard.recent.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(recent, ["a3", "a2"]);
}

#[test]
fn test_export_passes_filtered_rows_in_storage_order() {
    let (logic, store, exporter) = setup_logic_with_mocks();
    store.set_applications(vec![
        stored_application("a1", "N1", "Acme", dec!(300), datetime!(2024-01-03 0:00 UTC)),
        stored_application("a2", "N2", "Bolt", dec!(100), datetime!(2024-01-02 0:00 UTC)),
        stored_application("a3", "N3", "Acme", dec!(200), datetime!(2024-01-01 0:00 UTC)),
    ]);
    let target = PathBuf::from("/mock/exports");

    let path = logic
        .export(&ApplicationFilter::new("", "Acme"), &target)
        .unwrap();

    assert_eq!(path, target.join("ipo-applications-2024-06-01.csv"));
    assert_eq!(
        exporter.export_calls(),
        vec![(vec!["N1".to_string(), "N3".to_string()], target)]
    );
}

#[test]
fn test_export_refuses_empty_selection() {
    let (logic, _store, exporter) = setup_logic_with_mocks();

    let result = logic.export(&ApplicationFilter::default(), Path::new("/mock/exports"));

    assert!(matches!(result, Err(LogicError::NothingToExport)));
    assert!(exporter.export_calls().is_empty());
}

#[test]
fn test_export_failure_surfaces_as_export_error() {
    let (logic, store, exporter) = setup_logic_with_mocks();
    store.set_applications(vec![stored_application(
        "a1",
        "N1",
        "Acme",
        dec!(300),
        datetime!(2024-01-03 0:00 UTC),
    )]);
    exporter.set_fail(true);

    let result = logic.export(&ApplicationFilter::default(), Path::new("/mock/exports"));

    assert!(matches!(result, Err(LogicError::Export(_))));
}
