use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use dioxus::prelude::VirtualDom;
use url::Url;

use ipo_common::{Digest, IpoRecord, IpoStatus};

pub mod digest_table;
pub mod layout;
pub mod text;

use digest_table::{DigestEmail, DigestEmailProps};

/// IST, the timezone readers of the digest live in.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Subject, HTML and plain-text bodies for one digest email.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDigest {
    pub subject: String,
    pub html: String,
    pub text: String,
}

// --- View Models ---

#[derive(Clone, PartialEq)]
pub struct DigestView {
    pub title: String,
    pub generated_label: String,
    pub summary: String,
    pub article_count: u32,
    pub window_hours: u32,
    pub rows: Vec<IpoRow>,
}

#[derive(Clone, PartialEq)]
pub struct IpoRow {
    pub company: String,
    pub sector: String,
    pub status_label: String,
    pub status_colour: &'static str,
    pub dates: Vec<String>,
    pub price_band: String,
    pub lot: String,
    pub issue_size: String,
    pub gmp: String,
    pub exchange: String,
    pub note: String,
    pub sources: Vec<SourceLink>,
}

#[derive(Clone, PartialEq)]
pub struct SourceLink {
    pub url: String,
    pub label: String,
}

/// Background colour of the status pill.
pub fn status_colour(status: IpoStatus) -> &'static str {
    match status {
        IpoStatus::Open => "#16a34a",
        IpoStatus::Upcoming => "#2563eb",
        IpoStatus::Approved => "#7c3aed",
        IpoStatus::Filed => "#64748b",
        IpoStatus::Closed => "#d97706",
        IpoStatus::Allotted => "#0891b2",
        IpoStatus::Listed => "#0f766e",
        IpoStatus::Withdrawn => "#dc2626",
        IpoStatus::Unknown => "#9ca3af",
    }
}

pub fn subject(digest: &Digest) -> String {
    let n = digest.ipos.len();
    let noun = if n == 1 { "IPO" } else { "IPOs" };
    format!(
        "India IPO digest: {} ({n} {noun})",
        local_time(digest.generated_at).format("%d %b %Y")
    )
}

pub fn render_digest(digest: &Digest) -> RenderedDigest {
    let view = digest_to_view(digest);
    RenderedDigest {
        subject: view.title.clone(),
        html: render_html(view),
        text: text::render_text(digest),
    }
}

pub fn render_html(view: DigestView) -> String {
    let mut dom = VirtualDom::new_with_props(DigestEmail, DigestEmailProps { view });
    dom.rebuild_in_place();
    format!(
        "<!DOCTYPE html><html lang=\"en\">{}</html>",
        dioxus::ssr::render(&dom)
    )
}

pub fn digest_to_view(digest: &Digest) -> DigestView {
    DigestView {
        title: subject(digest),
        generated_label: local_time(digest.generated_at)
            .format("%d %b %Y, %H:%M IST")
            .to_string(),
        summary: digest.summary.clone().unwrap_or_default(),
        article_count: digest.article_count,
        window_hours: digest.window_hours,
        rows: digest.ipos.iter().map(record_to_row).collect(),
    }
}

fn record_to_row(record: &IpoRecord) -> IpoRow {
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();
    IpoRow {
        company: record.company.clone(),
        sector: opt(&record.sector),
        status_label: record.status.to_string(),
        status_colour: status_colour(record.status),
        dates: date_lines(record),
        price_band: opt(&record.price_band),
        lot: record.lot_size.map(|n| format!("{n} shares")).unwrap_or_default(),
        issue_size: opt(&record.issue_size),
        gmp: opt(&record.gmp),
        exchange: match (&record.exchange, &record.issue_type) {
            (Some(ex), Some(kind)) if kind == "sme" && !ex.contains("SME") => format!("{ex} SME"),
            (Some(ex), _) => ex.clone(),
            (None, Some(kind)) if kind == "sme" => "SME".to_string(),
            _ => String::new(),
        },
        note: opt(&record.summary),
        sources: record
            .sources
            .iter()
            .enumerate()
            .map(|(i, s)| SourceLink {
                url: s.url.clone(),
                label: host_label(&s.url).unwrap_or_else(|| format!("Source {}", i + 1)),
            })
            .collect(),
    }
}

fn date_lines(record: &IpoRecord) -> Vec<String> {
    let mut lines = Vec::new();
    match (record.open_date, record.close_date) {
        (Some(open), Some(close)) => lines.push(format!("{} to {}", short(open), short(close))),
        (Some(open), None) => lines.push(format!("Opens {}", short(open))),
        (None, Some(close)) => lines.push(format!("Closes {}", short(close))),
        (None, None) => {}
    }
    if let Some(d) = record.allotment_date {
        lines.push(format!("Allotment {}", short(d)));
    }
    if let Some(d) = record.listing_date {
        lines.push(format!("Listing {}", short(d)));
    }
    lines
}

pub(crate) fn short(date: NaiveDate) -> String {
    date.format("%d %b").to_string()
}

/// "https://www.example.com/a/b" → "example.com".
fn host_label(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let host = url.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    (!host.is_empty()).then(|| host.to_string())
}

pub(crate) fn local_time(at: DateTime<Utc>) -> DateTime<FixedOffset> {
    match FixedOffset::east_opt(IST_OFFSET_SECS) {
        Some(ist) => at.with_timezone(&ist),
        None => at.fixed_offset(),
    }
}
