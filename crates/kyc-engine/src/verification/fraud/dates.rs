use chrono::{Datelike, NaiveDate};

/// Formats tried in priority order; the first one that parses wins.
pub(crate) const DOCUMENT_DATE_FORMATS: [&str; 5] =
    ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%m-%d-%Y"];

pub(crate) fn parse_document_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DOCUMENT_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

/// Whole years elapsed between `born` and `today`; negative for dates in the future.
pub(crate) fn age_on(born: NaiveDate, today: NaiveDate) -> i32 {
    let before_birthday = (today.month(), today.day()) < (born.month(), born.day());
    today.year() - born.year() - i32::from(before_birthday)
}
