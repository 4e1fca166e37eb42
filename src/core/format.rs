/*
 * Display helpers for amounts and timestamps, following the Indian (en-IN)
 * conventions the tracker's users expect: rupee amounts with lakh/crore digit
 * grouping and day-first dates with a 12-hour clock.
 */
use rust_decimal::{Decimal, RoundingStrategy};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

const RUPEE_SIGN: char = '₹';

const DISPLAY_DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[day padding:none] [month repr:short] [year], [hour repr:12]:[minute] [period case:lower]"
);

const EXPORT_DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[day padding:none]/[month padding:none]/[year], [hour repr:12 padding:none]:[minute]:[second] [period case:lower]"
);

const FILE_DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/*
 * Groups the integer digits Indian style: the last three digits together, then
 * pairs (12,34,56,789).
 */
fn group_indian_digits(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}

/// Whole-rupee currency text, e.g. `₹1,23,457` (halves round away from zero).
pub fn format_inr(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{RUPEE_SIGN}{}", group_indian_digits(&digits))
}

/// The user's local UTC offset, or UTC when it cannot be determined safely.
pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

fn format_with(
    timestamp: OffsetDateTime,
    offset: UtcOffset,
    format: &[BorrowedFormatItem<'static>],
) -> String {
    /*
     * Shifting a timestamp at the edge of the supported range can leave it; such
     * a value is rendered in UTC, or failing that in its own offset.
     */
    let local = timestamp
        .checked_to_offset(offset)
        .or_else(|| timestamp.checked_to_offset(UtcOffset::UTC))
        .unwrap_or(timestamp);
    local.format(format).unwrap_or_else(|e| {
        log::warn!("Format: Could not format timestamp {timestamp}: {e}");
        timestamp.to_string()
    })
}

/// Short date and time for listings, e.g. `5 Mar 2024, 03:45 pm`.
pub fn format_display_date(timestamp: OffsetDateTime, offset: UtcOffset) -> String {
    format_with(timestamp, offset, DISPLAY_DATE_FORMAT)
}

/// Full date and time used in exported files, e.g. `5/3/2024, 3:45:00 pm`.
pub fn format_export_date(timestamp: OffsetDateTime, offset: UtcOffset) -> String {
    format_with(timestamp, offset, EXPORT_DATE_FORMAT)
}

/// `YYYY-MM-DD`, as used in export file names.
pub fn format_file_date(timestamp: OffsetDateTime) -> String {
    format_with(timestamp, timestamp.offset(), FILE_DATE_FORMAT)
}
