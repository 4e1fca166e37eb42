/*
 * Field-level rules applied to the "add application" and "add IPO name" inputs
 * before anything reaches the store. Validation is a pure function of the raw
 * input: it either yields a normalized record ready for `add_application`, or a
 * map from field to error with every failing field reported at once.
 */
use super::models::{IpoName, NewIpoApplication};
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::LazyLock;

static PAN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]{1}$").expect("PAN pattern is a valid regex")
});

/// Raw, unvalidated text as typed into the application form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationForm {
    pub applicant_name: String,
    pub application_number: String,
    pub pan: String,
    pub ipo_name: String,
    pub ipo_price: String,
    pub other_price: String,
}

// Declaration order is the order errors are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ApplicationField {
    ApplicantName,
    ApplicationNumber,
    Pan,
    IpoName,
    IpoPrice,
    OtherPrice,
}

impl ApplicationField {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationField::ApplicantName => "applicantName",
            ApplicationField::ApplicationNumber => "applicationNumber",
            ApplicationField::Pan => "pan",
            ApplicationField::IpoName => "ipoName",
            ApplicationField::IpoPrice => "ipoPrice",
            ApplicationField::OtherPrice => "otherPrice",
        }
    }

    fn label(self) -> &'static str {
        match self {
            ApplicationField::ApplicantName => "Applicant name",
            ApplicationField::ApplicationNumber => "Application number",
            ApplicationField::Pan => "PAN",
            ApplicationField::IpoName => "IPO name",
            ApplicationField::IpoPrice => "IPO price",
            ApplicationField::OtherPrice => "other price",
        }
    }
}

impl std::fmt::Display for ApplicationField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    Required,
    Format,
    Invalid,
    Duplicate,
    UnknownIpo,
}

impl FieldError {
    /// User-facing message for this failure on `field`.
    pub fn message_for(self, field: ApplicationField) -> String {
        match (self, field) {
            (FieldError::Required, field) => format!("{} is required", field.label()),
            (FieldError::Format, ApplicationField::Pan) => {
                "Invalid PAN format (e.g., ABCDE1234F)".to_string()
            }
            (FieldError::Format | FieldError::Invalid, field) => {
                format!("Invalid {}", field.label())
            }
            (FieldError::Duplicate, ApplicationField::IpoName) => {
                "This IPO name already exists".to_string()
            }
            (FieldError::Duplicate, field) => format!("This {} already exists", field.label()),
            (FieldError::UnknownIpo, _) => "IPO name is not registered".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<ApplicationField, FieldError>,
}

impl ValidationErrors {
    fn insert(&mut self, field: ApplicationField, error: FieldError) {
        self.errors.insert(field, error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: ApplicationField) -> Option<FieldError> {
        self.errors.get(&field).copied()
    }

    /// Field/message pairs in form order.
    pub fn messages(&self) -> Vec<(ApplicationField, String)> {
        self.errors
            .iter()
            .map(|(field, error)| (*field, error.message_for(*field)))
            .collect()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .messages()
            .into_iter()
            .map(|(_, message)| message)
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{joined}")
    }
}

impl std::error::Error for ValidationErrors {}

// Largest magnitude accepted for a single price, in rupees.
const MAX_AMOUNT_RUPEES: i64 = 1_000_000_000_000;
const AMOUNT_DECIMAL_PLACES: u32 = 2;

/*
 * Parses an amount the way a numeric form input does: surrounding whitespace is
 * ignored and both plain decimals and scientific notation are accepted.
 *
 * Amounts are bounded by `MAX_AMOUNT_RUPEES` and rounded to the paisa. Stored
 * prices are JSON numbers, and at this size and precision every accepted value
 * reads back exactly as it was written.
 */
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()?;
    if parsed.abs() > Decimal::new(MAX_AMOUNT_RUPEES, 0) {
        log::debug!("Validation: Amount '{trimmed}' is out of range.");
        return None;
    }
    let rounded =
        parsed.round_dp_with_strategy(AMOUNT_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        Some(Decimal::ZERO)
    } else {
        Some(rounded)
    }
}

pub fn normalize_pan(raw: &str) -> String {
    raw.trim().to_uppercase()
}

pub fn is_valid_pan(raw: &str) -> bool {
    PAN_PATTERN.is_match(&normalize_pan(raw))
}

/*
 * Applies every field rule independently and, if none fails, returns the
 * normalized record: text trimmed, PAN upper-cased, prices converted to
 * decimals, and an empty other price dropped rather than stored as zero.
 *
 * When `known_names` is given, an IPO name that is not among them is rejected
 * with `FieldError::UnknownIpo`.
 */
pub fn validate_application_form(
    form: &ApplicationForm,
    known_names: Option<&[IpoName]>,
) -> Result<NewIpoApplication, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let applicant_name = form.applicant_name.trim();
    if applicant_name.is_empty() {
        errors.insert(ApplicationField::ApplicantName, FieldError::Required);
    }

    let application_number = form.application_number.trim();
    if application_number.is_empty() {
        errors.insert(ApplicationField::ApplicationNumber, FieldError::Required);
    }

    let pan = normalize_pan(&form.pan);
    if pan.is_empty() {
        errors.insert(ApplicationField::Pan, FieldError::Required);
    } else if !is_valid_pan(&pan) {
        errors.insert(ApplicationField::Pan, FieldError::Format);
    }

    let ipo_name = form.ipo_name.trim();
    if ipo_name.is_empty() {
        errors.insert(ApplicationField::IpoName, FieldError::Required);
    } else if let Some(names) = known_names
        && !names.iter().any(|known| known.name == ipo_name)
    {
        errors.insert(ApplicationField::IpoName, FieldError::UnknownIpo);
    }

    let ipo_price = if form.ipo_price.trim().is_empty() {
        errors.insert(ApplicationField::IpoPrice, FieldError::Required);
        None
    } else {
        match parse_amount(&form.ipo_price) {
            Some(price) if price > Decimal::ZERO => Some(price),
            _ => {
                errors.insert(ApplicationField::IpoPrice, FieldError::Invalid);
                None
            }
        }
    };

    let other_price = if form.other_price.trim().is_empty() {
        None
    } else {
        match parse_amount(&form.other_price) {
            Some(price) if price >= Decimal::ZERO => Some(price),
            _ => {
                errors.insert(ApplicationField::OtherPrice, FieldError::Invalid);
                None
            }
        }
    };

    match ipo_price {
        Some(ipo_price) if errors.is_empty() => Ok(NewIpoApplication {
            applicant_name: applicant_name.to_string(),
            application_number: application_number.to_string(),
            pan,
            ipo_name: ipo_name.to_string(),
            ipo_price,
            other_price,
        }),
        _ => {
            log::debug!(
                "Validation: Application form rejected with {} field error(s).",
                errors.len()
            );
            Err(errors)
        }
    }
}

/*
 * Rule for registering a new IPO name: non-empty after trimming and not equal,
 * ignoring case, to any existing name. Returns the trimmed name.
 */
pub fn validate_ipo_name(candidate: &str, existing: &[IpoName]) -> Result<String, FieldError> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Required);
    }
    let lowered = trimmed.to_lowercase();
    if existing
        .iter()
        .any(|name| name.name.trim().to_lowercase() == lowered)
    {
        log::debug!("Validation: IPO name '{trimmed}' already exists.");
        return Err(FieldError::Duplicate);
    }
    Ok(trimmed.to_string())
}
