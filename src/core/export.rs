/*
 * Encodes application records as comma-separated text and writes the result
 * as `ipo-applications-<YYYY-MM-DD>.csv` into an export directory, which stands
 * in for a browser download. Records are encoded in the order given; callers
 * decide filtering and ordering beforehand.
 *
 * The header row is written bare; each data field is wrapped in double quotes
 * with embedded quotes doubled.
 */
use super::format;
use super::models::IpoApplication;
use rust_decimal::Decimal;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use time::{OffsetDateTime, UtcOffset};

pub const CSV_HEADERS: [&str; 6] = [
    "Application Number",
    "PAN",
    "IPO Name",
    "IPO Price",
    "Fixed Price",
    "Applied Date",
];
pub const CSV_MIME_TYPE: &str = "text/csv";
const EXPORT_FILE_PREFIX: &str = "ipo-applications";

#[derive(Debug)]
pub enum ExportError {
    Io(io::Error),
    InvalidExportDirectory(PathBuf),
}

impl From<io::Error> for ExportError {
    fn from(err: io::Error) -> Self {
        ExportError::Io(err)
    }
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "Export I/O error: {e}"),
            ExportError::InvalidExportDirectory(path) => {
                write!(f, "Export directory is not usable: {}", path.display())
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Io(e) => Some(e),
            ExportError::InvalidExportDirectory(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;

fn quote_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn format_amount(amount: Decimal) -> String {
    amount.normalize().to_string()
}

// A zero fixed price is left blank, same as a missing one.
fn format_fixed_price(other_price: Option<Decimal>) -> String {
    match other_price {
        Some(price) if !price.is_zero() => format_amount(price),
        _ => String::new(),
    }
}

/*
 * Builds the CSV text: the header row followed by one row per record, lines
 * separated by `\n` with no trailing newline. An empty input still yields the
 * header row.
 */
pub fn encode_applications_csv(applications: &[IpoApplication], offset: UtcOffset) -> String {
    let mut lines = Vec::with_capacity(applications.len() + 1);
    lines.push(CSV_HEADERS.join(","));
    for application in applications {
        let fields = [
            application.application_number.clone(),
            application.pan.clone(),
            application.ipo_name.clone(),
            format_amount(application.ipo_price),
            format_fixed_price(application.other_price),
            format::format_export_date(application.timestamp, offset),
        ];
        lines.push(
            fields
                .iter()
                .map(|field| quote_field(field))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    lines.join("\n")
}

/// `ipo-applications-YYYY-MM-DD.csv` for the date of `now`.
pub fn export_file_name(now: OffsetDateTime) -> String {
    format!("{EXPORT_FILE_PREFIX}-{}.csv", format::format_file_date(now))
}

pub trait ExporterOperations: Send + Sync {
    /*
     * Encodes `applications` and writes them into `target_dir`, returning the
     * path of the written file. An existing file of the same name is replaced.
     */
    fn export_applications(
        &self,
        applications: &[IpoApplication],
        target_dir: &Path,
    ) -> Result<PathBuf>;
}

pub struct CoreExporter {}

impl CoreExporter {
    pub fn new() -> Self {
        CoreExporter {}
    }
}

impl Default for CoreExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ExporterOperations for CoreExporter {
    fn export_applications(
        &self,
        applications: &[IpoApplication],
        target_dir: &Path,
    ) -> Result<PathBuf> {
        if target_dir.exists() && !target_dir.is_dir() {
            return Err(ExportError::InvalidExportDirectory(target_dir.to_path_buf()));
        }
        fs::create_dir_all(target_dir)?;

        let file_path = target_dir.join(export_file_name(OffsetDateTime::now_utc()));
        let content = encode_applications_csv(applications, format::local_offset());

        let file = File::create(&file_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
        log::info!(
            "CoreExporter: Exported {} application(s) as {CSV_MIME_TYPE} to {file_path:?}.",
            applications.len()
        );
        Ok(file_path)
    }
}
