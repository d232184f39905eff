use std::collections::{HashMap, HashSet};

use crate::normalize::normalize_company_name;
use crate::types::IpoRecord;
use crate::validate::MAX_SOURCES;

/// Collapse per-article records into one record per company.
///
/// Within a group the most advanced status wins (ties go to the record
/// with the freshest source). Missing fields on the winner are filled from
/// the other records in the order they were seen.
pub fn merge_records(records: Vec<IpoRecord>) -> Vec<IpoRecord> {
    let mut groups: Vec<Vec<IpoRecord>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let key = normalize_company_name(&record.company);
        match index.get(&key) {
            Some(&i) => groups[i].push(record),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![record]);
            }
        }
    }

    let mut merged: Vec<IpoRecord> = groups.into_iter().filter_map(merge_group).collect();
    merged.sort_by(|a, b| {
        b.status
            .priority()
            .cmp(&a.status.priority())
            .then_with(|| a.company.to_lowercase().cmp(&b.company.to_lowercase()))
    });
    merged
}

fn merge_group(group: Vec<IpoRecord>) -> Option<IpoRecord> {
    let winner_idx = group
        .iter()
        .enumerate()
        .max_by(|(ia, a), (ib, b)| {
            a.status
                .priority()
                .cmp(&b.status.priority())
                .then_with(|| a.latest_source_at().cmp(&b.latest_source_at()))
                // Earlier record wins a full tie.
                .then_with(|| ib.cmp(ia))
        })
        .map(|(i, _)| i)?;

    let mut winner = group[winner_idx].clone();
    let mut seen: HashSet<String> = HashSet::new();
    let mut sources = Vec::new();

    for record in &group {
        for source in &record.sources {
            if sources.len() < MAX_SOURCES && seen.insert(source.url.clone()) {
                sources.push(source.clone());
            }
        }
    }

    for (i, other) in group.into_iter().enumerate() {
        if i == winner_idx {
            continue;
        }
        fill(&mut winner.exchange, other.exchange);
        fill(&mut winner.issue_type, other.issue_type);
        fill(&mut winner.open_date, other.open_date);
        fill(&mut winner.close_date, other.close_date);
        fill(&mut winner.allotment_date, other.allotment_date);
        fill(&mut winner.listing_date, other.listing_date);
        fill(&mut winner.price_band, other.price_band);
        fill(&mut winner.issue_size, other.issue_size);
        fill(&mut winner.lot_size, other.lot_size);
        fill(&mut winner.gmp, other.gmp);
        fill(&mut winner.sector, other.sector);
        fill(&mut winner.summary, other.summary);
    }

    winner.sources = sources;
    Some(winner)
}

fn fill<T>(slot: &mut Option<T>, candidate: Option<T>) {
    if slot.is_none() {
        *slot = candidate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IpoStatus, SourceRef};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn record(company: &str, status: IpoStatus, url: &str, hour: u32) -> IpoRecord {
        let mut r = IpoRecord::new(company, status);
        r.sources.push(SourceRef {
            url: url.to_string(),
            title: None,
            published_at: Some(Utc.with_ymd_and_hms(2026, 10, 15, hour, 0, 0).unwrap()),
        });
        r
    }

    #[test]
    fn highest_priority_status_wins() {
        let mut filed = record("Acme Solutions Ltd", IpoStatus::Filed, "https://a.example/1", 12);
        filed.sector = Some("IT services".to_string());
        let mut open = record("ACME SOLUTIONS LIMITED", IpoStatus::Open, "https://a.example/2", 8);
        open.price_band = Some("₹340-360".to_string());

        let merged = merge_records(vec![filed, open]);
        assert_eq!(merged.len(), 1);
        let acme = &merged[0];
        assert_eq!(acme.status, IpoStatus::Open);
        assert_eq!(acme.company, "ACME SOLUTIONS LIMITED");
        assert_eq!(acme.price_band.as_deref(), Some("₹340-360"));
        assert_eq!(acme.sector.as_deref(), Some("IT services"));
        assert_eq!(acme.sources.len(), 2);
    }

    #[test]
    fn ties_go_to_most_recent_source() {
        let mut older = record("Acme", IpoStatus::Open, "https://a.example/old", 6);
        older.gmp = Some("₹10".to_string());
        let mut newer = record("Acme Ltd", IpoStatus::Open, "https://a.example/new", 18);
        newer.gmp = Some("₹45".to_string());

        let merged = merge_records(vec![older, newer]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].gmp.as_deref(), Some("₹45"));
        assert_eq!(merged[0].company, "Acme Ltd");
    }

    #[test]
    fn missing_fields_fall_back_in_order() {
        let winner = record("Acme", IpoStatus::Listed, "https://a.example/1", 10);
        let mut first = record("Acme", IpoStatus::Open, "https://a.example/2", 9);
        first.open_date = NaiveDate::from_ymd_opt(2026, 10, 1);
        first.lot_size = Some(40);
        let mut second = record("Acme", IpoStatus::Upcoming, "https://a.example/3", 8);
        second.open_date = NaiveDate::from_ymd_opt(2026, 10, 2);
        second.issue_size = Some("₹500 crore".to_string());

        let merged = merge_records(vec![winner, first, second]);
        let acme = &merged[0];
        assert_eq!(acme.status, IpoStatus::Listed);
        assert_eq!(acme.open_date, NaiveDate::from_ymd_opt(2026, 10, 1));
        assert_eq!(acme.lot_size, Some(40));
        assert_eq!(acme.issue_size.as_deref(), Some("₹500 crore"));
    }

    #[test]
    fn sources_are_deduplicated_by_url() {
        let a = record("Acme", IpoStatus::Open, "https://a.example/same", 10);
        let b = record("Acme", IpoStatus::Open, "https://a.example/same", 11);
        let c = record("Acme", IpoStatus::Open, "https://a.example/other", 12);

        let merged = merge_records(vec![a, b, c]);
        let urls: Vec<&str> = merged[0].sources.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.example/same", "https://a.example/other"]);
    }

    #[test]
    fn output_sorted_by_priority_then_name() {
        let merged = merge_records(vec![
            record("Zeta", IpoStatus::Filed, "https://a.example/z", 1),
            record("beta", IpoStatus::Open, "https://a.example/b", 1),
            record("Alpha", IpoStatus::Open, "https://a.example/a", 1),
            record("Gamma", IpoStatus::Listed, "https://a.example/g", 1),
        ]);
        let names: Vec<&str> = merged.iter().map(|r| r.company.as_str()).collect();
        assert_eq!(names, vec!["Gamma", "Alpha", "beta", "Zeta"]);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(merge_records(Vec::new()).is_empty());
    }
}
