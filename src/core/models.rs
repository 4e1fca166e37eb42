/*
 * Defines the two persisted record shapes: an IPO application submitted by the
 * user and the IPO name it refers to. Field names serialize in camelCase so the
 * on-disk JSON matches the collection layout documented for the store.
 *
 * `id` and `timestamp`/`createdAt` are never chosen by callers; the store fills
 * them in when a record is added. Records are deleted, never edited in place.
 */
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpoApplication {
    pub id: String,
    pub applicant_name: String,
    pub application_number: String,
    pub pan: String,
    // Soft reference to `IpoName::name`, matched by value.
    pub ipo_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub ipo_price: Decimal,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub other_price: Option<Decimal>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl IpoApplication {
    /*
     * Builds a stored record from a validated partial record plus the identity
     * and creation time assigned by the store.
     */
    pub fn from_new(
        new_application: NewIpoApplication,
        id: String,
        timestamp: OffsetDateTime,
    ) -> Self {
        IpoApplication {
            id,
            applicant_name: new_application.applicant_name,
            application_number: new_application.application_number,
            pan: new_application.pan,
            ipo_name: new_application.ipo_name,
            ipo_price: new_application.ipo_price,
            other_price: new_application.other_price,
            timestamp,
        }
    }

    /*
     * Amount paid for this application: the IPO price plus the fixed price, if
     * any. Saturates at the `Decimal` bounds, which only hand-edited data can
     * reach.
     */
    pub fn total_amount(&self) -> Decimal {
        self.ipo_price
            .saturating_add(self.other_price.unwrap_or(Decimal::ZERO))
    }
}

/*
 * An application as accepted by `add_application`: everything except the
 * store-assigned `id` and `timestamp`. Produced by the validation engine after
 * normalization, so values here are already trimmed and upper-cased.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIpoApplication {
    pub applicant_name: String,
    pub application_number: String,
    pub pan: String,
    pub ipo_name: String,
    pub ipo_price: Decimal,
    pub other_price: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpoName {
    pub id: String,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
