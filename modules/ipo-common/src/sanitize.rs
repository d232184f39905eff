use chrono::NaiveDate;

use crate::normalize::{clean_text, is_generic_company, normalize_company_name, parse_date, parse_lot_size};
use crate::types::{IpoRecord, IpoStatus, RawIpo, SourceRef};

const MAX_SUMMARY_CHARS: usize = 600;
const MAX_FIELD_CHARS: usize = 120;

/// Turn one model-reported IPO into a typed record, or `None` when the
/// company can't be identified.
pub fn sanitize_raw(raw: RawIpo, source: &SourceRef, today: NaiveDate) -> Option<IpoRecord> {
    let company = clean_text(raw.company.as_deref())?;
    let company = strip_trailing_ipo(&company);
    if is_generic_company(&normalize_company_name(&company)) {
        return None;
    }

    let date = |v: &Option<String>| clean_text(v.as_deref()).and_then(|s| parse_date(&s));
    let text = |v: &Option<String>| clean_text(v.as_deref()).map(|s| truncate_chars(&s, MAX_FIELD_CHARS));

    let mut record = IpoRecord::new(truncate_chars(&company, MAX_FIELD_CHARS), IpoStatus::Unknown);
    record.status = clean_text(raw.status.as_deref())
        .map(|s| IpoStatus::from_str_loose(&s))
        .unwrap_or_default();
    record.exchange = text(&raw.exchange).map(|s| s.to_uppercase());
    record.issue_type = text(&raw.issue_type).map(|s| normalize_issue_type(&s));
    record.open_date = date(&raw.open_date);
    record.close_date = date(&raw.close_date);
    record.allotment_date = date(&raw.allotment_date);
    record.listing_date = date(&raw.listing_date);
    record.price_band = text(&raw.price_band);
    record.issue_size = text(&raw.issue_size);
    record.lot_size = clean_text(raw.lot_size.as_deref()).and_then(|s| parse_lot_size(&s));
    record.gmp = text(&raw.gmp);
    record.sector = text(&raw.sector);
    record.summary = clean_text(raw.summary.as_deref()).map(|s| truncate_chars(&s, MAX_SUMMARY_CHARS));
    record.sources = vec![source.clone()];

    if record.status == IpoStatus::Unknown {
        record.status = infer_status(&record, today);
    }
    Some(record)
}

/// Best guess at a lifecycle stage from the known dates.
fn infer_status(record: &IpoRecord, today: NaiveDate) -> IpoStatus {
    if record.listing_date.is_some_and(|d| d <= today) {
        return IpoStatus::Listed;
    }
    if record.allotment_date.is_some_and(|d| d <= today) {
        return IpoStatus::Allotted;
    }
    match (record.open_date, record.close_date) {
        (_, Some(close)) if close < today => IpoStatus::Closed,
        (Some(open), Some(close)) if open <= today && today <= close => IpoStatus::Open,
        (Some(open), None) if open == today => IpoStatus::Open,
        (Some(open), _) if open > today => IpoStatus::Upcoming,
        _ if record.listing_date.is_some() => IpoStatus::Upcoming,
        _ => IpoStatus::Unknown,
    }
}

fn normalize_issue_type(value: &str) -> String {
    let lower = value.to_lowercase();
    if lower.contains("sme") {
        "sme".to_string()
    } else if lower.contains("main") {
        "mainboard".to_string()
    } else {
        lower
    }
}

/// "Acme Solutions IPO" reads better without the trailing "IPO" in a table.
fn strip_trailing_ipo(company: &str) -> String {
    let trimmed = company.trim_end();
    match trimmed.len().checked_sub(4) {
        Some(cut)
            if trimmed.is_char_boundary(cut)
                && trimmed[cut..].eq_ignore_ascii_case(" ipo") =>
        {
            trimmed[..cut].trim_end().to_string()
        }
        _ => trimmed.to_string(),
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", s[..idx].trim_end()),
        None => s.to_string(),
    }
}
