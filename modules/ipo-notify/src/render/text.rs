use std::fmt::Write;

use ipo_common::{Digest, IpoRecord};

use super::{short, subject};

/// Plain-text body: one line per IPO, for mail clients without HTML and
/// for the webhook message.
pub fn render_text(digest: &Digest) -> String {
    let mut out = subject(digest);
    out.push('\n');
    if let Some(summary) = &digest.summary {
        out.push('\n');
        out.push_str(summary);
        out.push('\n');
    }
    out.push('\n');
    if digest.ipos.is_empty() {
        out.push_str("No IPO activity in this window.\n");
        return out;
    }
    for record in &digest.ipos {
        out.push_str(&record_line(record));
        out.push('\n');
    }
    out
}

fn record_line(record: &IpoRecord) -> String {
    let mut line = format!("- {} [{}]", record.company, record.status);
    let mut parts: Vec<String> = Vec::new();
    if let Some(exchange) = &record.exchange {
        parts.push(exchange.clone());
    }
    match (record.open_date, record.close_date) {
        (Some(open), Some(close)) => parts.push(format!("{} to {}", short(open), short(close))),
        (Some(open), None) => parts.push(format!("opens {}", short(open))),
        (None, Some(close)) => parts.push(format!("closes {}", short(close))),
        (None, None) => {}
    }
    if let Some(listing) = record.listing_date {
        parts.push(format!("lists {}", short(listing)));
    }
    if let Some(band) = &record.price_band {
        parts.push(format!("band {band}"));
    }
    if let Some(lot) = record.lot_size {
        parts.push(format!("lot {lot}"));
    }
    if let Some(gmp) = &record.gmp {
        parts.push(format!("GMP {gmp}"));
    }
    if !parts.is_empty() {
        let _ = write!(line, ": {}", parts.join(", "));
    }
    if let Some(source) = record.sources.first() {
        let _ = write!(line, " ({})", source.url);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use ipo_common::{IpoStatus, SourceRef};
    use uuid::Uuid;

    #[test]
    fn one_line_per_ipo() {
        let mut acme = IpoRecord::new("Acme Solutions", IpoStatus::Open);
        acme.exchange = Some("NSE".to_string());
        acme.open_date = NaiveDate::from_ymd_opt(2026, 10, 14);
        acme.close_date = NaiveDate::from_ymd_opt(2026, 10, 17);
        acme.price_band = Some("₹340-360".to_string());
        acme.sources.push(SourceRef {
            url: "https://news.example.com/acme".to_string(),
            title: None,
            published_at: None,
        });
        let beta = IpoRecord::new("Beta Foods", IpoStatus::Filed);

        let digest = Digest {
            run_id: Uuid::nil(),
            generated_at: Utc.with_ymd_and_hms(2026, 10, 16, 3, 0, 0).unwrap(),
            window_hours: 48,
            article_count: 3,
            summary: None,
            ipos: vec![acme, beta],
        };

        let text = render_text(&digest);
        let lines: Vec<&str> = text.lines().filter(|l| l.starts_with("- ")).collect();
        assert_eq!(
            lines,
            vec![
                "- Acme Solutions [Open]: NSE, 14 Oct to 17 Oct, band ₹340-360 (https://news.example.com/acme)",
                "- Beta Foods [Filed]",
            ]
        );
        assert!(text.starts_with("India IPO digest: 16 Oct 2026 (2 IPOs)"));
    }
}
