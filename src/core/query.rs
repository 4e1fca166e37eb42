/*
 * Derived views over the in-memory collections: search/IPO filtering, stable
 * sorting by a chosen column, per-IPO-name summaries, the recent-activity list
 * and the dashboard totals. Everything here is a pure function recomputed from
 * the latest snapshot on each call; nothing is cached or persisted.
 */
use super::models::{IpoApplication, IpoName};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::HashSet;
use time::OffsetDateTime;

/// Selector value that disables IPO filtering, alongside the empty string.
pub const ALL_IPOS_SELECTOR: &str = "all";
pub const DEFAULT_RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub search_term: String,
    pub ipo_selector: String,
}

impl ApplicationFilter {
    pub fn new(search_term: impl Into<String>, ipo_selector: impl Into<String>) -> Self {
        ApplicationFilter {
            search_term: search_term.into(),
            ipo_selector: ipo_selector.into(),
        }
    }

    /*
     * A record matches when the search term is empty or is a case-insensitive
     * substring of its PAN, application number or IPO name, and the selector is
     * empty, "all", or exactly equal to its IPO name.
     */
    pub fn matches(&self, application: &IpoApplication) -> bool {
        self.matches_search(application) && self.matches_ipo(application)
    }

    fn matches_search(&self, application: &IpoApplication) -> bool {
        if self.search_term.is_empty() {
            return true;
        }
        let needle = self.search_term.to_lowercase();
        [
            &application.pan,
            &application.application_number,
            &application.ipo_name,
        ]
        .iter()
        .any(|haystack| haystack.to_lowercase().contains(&needle))
    }

    fn matches_ipo(&self, application: &IpoApplication) -> bool {
        self.ipo_selector.is_empty()
            || self.ipo_selector == ALL_IPOS_SELECTOR
            || application.ipo_name == self.ipo_selector
    }

    /// Matching records, in input order.
    pub fn apply(&self, applications: &[IpoApplication]) -> Vec<IpoApplication> {
        applications
            .iter()
            .filter(|application| self.matches(application))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Timestamp,
    IpoName,
    Pan,
    IpoPrice,
    ApplicationNumber,
}

impl SortField {
    fn compare(self, a: &IpoApplication, b: &IpoApplication) -> Ordering {
        match self {
            SortField::Timestamp => a.timestamp.cmp(&b.timestamp),
            SortField::IpoPrice => a.ipo_price.cmp(&b.ipo_price),
            SortField::IpoName => compare_text(&a.ipo_name, &b.ipo_name),
            SortField::Pan => compare_text(&a.pan, &b.pan),
            SortField::ApplicationNumber => {
                compare_text(&a.application_number, &b.application_number)
            }
        }
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/*
 * Column sort state of the applications table. Starts at newest first;
 * selecting the active column flips the direction, selecting another column
 * switches to it in ascending order.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortState {
    #[cfg(test)]
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        SortState { field, direction }
    }

    pub fn select(&mut self, field: SortField) {
        if self.field == field {
            self.direction = self.direction.reversed();
        } else {
            self.field = field;
            self.direction = SortDirection::Ascending;
        }
    }

    pub fn apply(&self, applications: &[IpoApplication]) -> Vec<IpoApplication> {
        sort_applications(applications, self.field, self.direction)
    }
}

/*
 * Stable sort: records that compare equal on `field` keep their input order in
 * both directions.
 */
pub fn sort_applications(
    applications: &[IpoApplication],
    field: SortField,
    direction: SortDirection,
) -> Vec<IpoApplication> {
    let mut sorted = applications.to_vec();
    match direction {
        SortDirection::Ascending => sorted.sort_by(|a, b| field.compare(a, b)),
        SortDirection::Descending => sorted.sort_by(|a, b| field.compare(b, a)),
    }
    sorted
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpoSummary {
    pub name: String,
    pub created_at: OffsetDateTime,
    pub application_count: usize,
    pub total_amount: Decimal,
}

/*
 * One summary per registered IPO name, in name storage order. Names nobody
 * applied for still appear with a zero count and total. Applications whose IPO
 * name is not registered are not counted anywhere.
 */
pub fn group_by_ipo_name(names: &[IpoName], applications: &[IpoApplication]) -> Vec<IpoSummary> {
    names
        .iter()
        .map(|ipo| {
            let (application_count, total_amount) = applications
                .iter()
                .filter(|application| application.ipo_name == ipo.name)
                .fold((0usize, Decimal::ZERO), |(count, total), application| {
                    (count + 1, total.saturating_add(application.total_amount()))
                });
            IpoSummary {
                name: ipo.name.clone(),
                created_at: ipo.created_at,
                application_count,
                total_amount,
            }
        })
        .collect()
}

/// The `limit` newest records by timestamp, newest first.
pub fn recent_applications(applications: &[IpoApplication], limit: usize) -> Vec<IpoApplication> {
    let mut recent = sort_applications(
        applications,
        SortField::Timestamp,
        SortDirection::Descending,
    );
    recent.truncate(limit);
    recent
}

/// Sum of `ipoPrice + otherPrice` over the given records, saturating at the `Decimal` bounds.
pub fn total_amount(applications: &[IpoApplication]) -> Decimal {
    applications
        .iter()
        .map(IpoApplication::total_amount)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioSummary {
    pub total_applications: usize,
    pub total_investment: Decimal,
    // Distinct IPO names referenced by applications, registered or not.
    pub unique_ipos: usize,
    pub registered_ipo_names: usize,
}

pub fn portfolio_summary(names: &[IpoName], applications: &[IpoApplication]) -> PortfolioSummary {
    let unique_ipos = applications
        .iter()
        .map(|application| application.ipo_name.as_str())
        .collect::<HashSet<_>>()
        .len();
    PortfolioSummary {
        total_applications: applications.len(),
        total_investment: total_amount(applications),
        unique_ipos,
        registered_ipo_names: names.len(),
    }
}
