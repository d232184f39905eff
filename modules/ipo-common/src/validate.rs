use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;
use uuid::Uuid;

use crate::types::{Digest, IpoStatus};

pub const MAX_IPOS: usize = 500;
pub const MAX_SOURCES: usize = 50;
const MAX_SUMMARY_LEN: usize = 4_000;
const MAX_FIELD_LEN: usize = 200;
const MAX_RECORD_SUMMARY_LEN: usize = 2_000;
pub const MAX_URL_LEN: usize = 2_048;
const MAX_LOT_SIZE: u64 = 10_000_000;

/// One problem found in a submitted digest. `path` is JSON-pointer style,
/// e.g. `/ipos/3/open_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

/// JSON Schema of the digest payload.
pub fn digest_json_schema() -> Value {
    let schema = schemars::schema_for!(Digest);
    serde_json::to_value(schema).unwrap_or(Value::Null)
}

/// Check a submitted digest and collect every issue rather than stopping
/// at the first. Unknown fields are ignored.
pub fn validate_digest(value: &Value) -> Result<Digest, Vec<ValidationIssue>> {
    let mut v = Validator::default();

    let Some(root) = value.as_object() else {
        v.issue("", "digest must be a JSON object");
        return Err(v.issues);
    };

    match root.get("run_id") {
        Some(Value::String(s)) if Uuid::parse_str(s).is_ok() => {}
        Some(Value::String(_)) => v.issue("/run_id", "must be a UUID"),
        Some(_) => v.issue("/run_id", "must be a string"),
        None => v.issue("/run_id", "is required"),
    }

    match root.get("generated_at") {
        Some(Value::String(s)) if DateTime::parse_from_rfc3339(s).is_ok() => {}
        Some(Value::String(_)) => v.issue("/generated_at", "must be an RFC 3339 timestamp"),
        Some(_) => v.issue("/generated_at", "must be a string"),
        None => v.issue("/generated_at", "is required"),
    }

    v.optional_count(root, "", "window_hours", u64::from(u32::MAX));
    v.optional_count(root, "", "article_count", u64::from(u32::MAX));
    v.optional_string(root, "", "summary", MAX_SUMMARY_LEN);

    match root.get("ipos") {
        Some(Value::Array(ipos)) => {
            if ipos.len() > MAX_IPOS {
                v.issue("/ipos", &format!("at most {MAX_IPOS} IPOs are allowed"));
            }
            for (i, ipo) in ipos.iter().enumerate().take(MAX_IPOS) {
                v.ipo(&format!("/ipos/{i}"), ipo);
            }
        }
        Some(_) => v.issue("/ipos", "must be an array"),
        None => v.issue("/ipos", "is required"),
    }

    if !v.issues.is_empty() {
        return Err(v.issues);
    }

    serde_json::from_value::<Digest>(value.clone()).map_err(|e| {
        vec![ValidationIssue {
            path: String::new(),
            message: e.to_string(),
        }]
    })
}

#[derive(Default)]
struct Validator {
    issues: Vec<ValidationIssue>,
}

impl Validator {
    fn issue(&mut self, path: &str, message: &str) {
        self.issues.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
        });
    }

    fn ipo(&mut self, path: &str, value: &Value) {
        let Some(obj) = value.as_object() else {
            self.issue(path, "must be an object");
            return;
        };

        match obj.get("company") {
            Some(Value::String(s)) if s.trim().is_empty() => {
                self.issue(&format!("{path}/company"), "must not be empty")
            }
            Some(Value::String(s)) if s.chars().count() > MAX_FIELD_LEN => self.issue(
                &format!("{path}/company"),
                &format!("must be at most {MAX_FIELD_LEN} characters"),
            ),
            Some(Value::String(_)) => {}
            Some(_) => self.issue(&format!("{path}/company"), "must be a string"),
            None => self.issue(&format!("{path}/company"), "is required"),
        }

        match obj.get("status") {
            Some(Value::String(s)) if IpoStatus::ALL.iter().any(|st| st.as_str() == s) => {}
            Some(Value::String(s)) => self.issue(
                &format!("{path}/status"),
                &format!("unknown status {s:?}"),
            ),
            Some(_) => self.issue(&format!("{path}/status"), "must be a string"),
            None => self.issue(&format!("{path}/status"), "is required"),
        }

        for field in ["exchange", "issue_type", "price_band", "issue_size", "gmp", "sector"] {
            self.optional_string(obj, path, field, MAX_FIELD_LEN);
        }
        self.optional_string(obj, path, "summary", MAX_RECORD_SUMMARY_LEN);

        for field in ["open_date", "close_date", "allotment_date", "listing_date"] {
            match obj.get(field) {
                None | Some(Value::Null) => {}
                Some(Value::String(s)) if NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() => {}
                Some(_) => self.issue(&format!("{path}/{field}"), "must be a YYYY-MM-DD date"),
            }
        }

        self.optional_count(obj, path, "lot_size", MAX_LOT_SIZE);

        match obj.get("sources") {
            None | Some(Value::Null) => {}
            Some(Value::Array(sources)) => {
                if sources.len() > MAX_SOURCES {
                    self.issue(
                        &format!("{path}/sources"),
                        &format!("at most {MAX_SOURCES} sources are allowed"),
                    );
                }
                for (j, source) in sources.iter().enumerate().take(MAX_SOURCES) {
                    self.source(&format!("{path}/sources/{j}"), source);
                }
            }
            Some(_) => self.issue(&format!("{path}/sources"), "must be an array"),
        }
    }

    fn source(&mut self, path: &str, value: &Value) {
        let Some(obj) = value.as_object() else {
            self.issue(path, "must be an object");
            return;
        };

        match obj.get("url") {
            Some(Value::String(s)) if s.len() > MAX_URL_LEN => self.issue(
                &format!("{path}/url"),
                &format!("must be at most {MAX_URL_LEN} bytes"),
            ),
            Some(Value::String(s)) if is_source_url(s) => {}
            Some(Value::String(_)) => self.issue(&format!("{path}/url"), "must be an http(s) URL"),
            Some(_) => self.issue(&format!("{path}/url"), "must be a string"),
            None => self.issue(&format!("{path}/url"), "is required"),
        }

        self.optional_string(obj, path, "title", 500);

        match obj.get("published_at") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) if DateTime::parse_from_rfc3339(s).is_ok() => {}
            Some(_) => self.issue(
                &format!("{path}/published_at"),
                "must be an RFC 3339 timestamp",
            ),
        }
    }

    fn optional_string(&mut self, obj: &Map<String, Value>, path: &str, field: &str, max: usize) {
        match obj.get(field) {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) if s.chars().count() > max => self.issue(
                &format!("{path}/{field}"),
                &format!("must be at most {max} characters"),
            ),
            Some(Value::String(_)) => {}
            Some(_) => self.issue(&format!("{path}/{field}"), "must be a string"),
        }
    }

    fn optional_count(&mut self, obj: &Map<String, Value>, path: &str, field: &str, max: u64) {
        match obj.get(field) {
            None | Some(Value::Null) => {}
            Some(Value::Number(n)) => match n.as_u64() {
                Some(n) if n <= max => {}
                Some(_) => self.issue(&format!("{path}/{field}"), &format!("must be at most {max}")),
                None => self.issue(
                    &format!("{path}/{field}"),
                    "must be a non-negative integer",
                ),
            },
            Some(_) => self.issue(
                &format!("{path}/{field}"),
                "must be a non-negative integer",
            ),
        }
    }
}

/// A source link the digest accepts: an absolute http(s) URL with a host,
/// no whitespace, at most `MAX_URL_LEN` bytes.
pub fn is_source_url(s: &str) -> bool {
    if s.len() > MAX_URL_LEN || s.chars().any(char::is_whitespace) {
        return false;
    }
    match Url::parse(s) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "run_id": "6f1c2f4e-8a57-4d3b-9a51-0f9a3c2b7e11",
            "generated_at": "2026-10-16T06:30:00Z",
            "window_hours": 48,
            "article_count": 12,
            "summary": "Two mainboard IPOs open this week.",
            "ipos": [{
                "company": "Acme Solutions",
                "status": "open",
                "exchange": "NSE",
                "open_date": "2026-10-14",
                "close_date": "2026-10-17",
                "lot_size": 40,
                "sources": [{"url": "https://news.example.com/acme", "title": "Acme opens"}]
            }]
        })
    }

    #[test]
    fn accepts_valid_digest() {
        let digest = validate_digest(&valid()).unwrap();
        assert_eq!(digest.ipos.len(), 1);
        assert_eq!(digest.ipos[0].status, IpoStatus::Open);
        assert_eq!(digest.ipos[0].lot_size, Some(40));
        assert_eq!(digest.window_hours, 48);
    }

    #[test]
    fn ignores_unknown_fields() {
        let mut value = valid();
        value["extra"] = json!({"anything": true});
        value["ipos"][0]["rating"] = json!(5);
        assert!(validate_digest(&value).is_ok());
    }

    #[test]
    fn optional_counters_default_to_zero() {
        let mut value = valid();
        let obj = value.as_object_mut().unwrap();
        obj.remove("window_hours");
        obj.remove("article_count");
        obj.remove("summary");
        let digest = validate_digest(&value).unwrap();
        assert_eq!(digest.article_count, 0);
        assert_eq!(digest.summary, None);
    }

    #[test]
    fn null_counters_and_sources_are_accepted() {
        let mut value = valid();
        value["window_hours"] = Value::Null;
        value["article_count"] = Value::Null;
        value["ipos"][0]["sources"] = Value::Null;
        let digest = validate_digest(&value).unwrap();
        assert_eq!(digest.window_hours, 0);
        assert_eq!(digest.article_count, 0);
        assert!(digest.ipos[0].sources.is_empty());
    }

    #[test]
    fn source_urls_must_parse_with_a_host() {
        assert!(is_source_url("https://news.example.com/acme-ipo?ref=rss"));
        assert!(is_source_url("http://example.in/a"));
        assert!(!is_source_url("https://news.example.com/acme ipo"));
        assert!(!is_source_url("https://"));
        assert!(!is_source_url("javascript:alert(1)"));
        assert!(!is_source_url("ftp://files.example.com/x"));
        assert!(!is_source_url("not a url"));
        assert!(!is_source_url(&format!("https://example.com/{}", "a".repeat(MAX_URL_LEN))));
    }

    #[test]
    fn rejects_non_object() {
        let issues = validate_digest(&json!([1, 2])).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "");
    }

    #[test]
    fn collects_every_issue_with_paths() {
        let value = json!({
            "run_id": "not-a-uuid",
            "ipos": [
                {"company": "", "status": "booming", "open_date": "14/10/2026"},
                {"company": "Beta", "status": "listed", "lot_size": -5,
                 "sources": [{"url": "ftp://files.example.com/x"}]},
                "oops"
            ]
        });
        let issues = validate_digest(&value).unwrap_err();
        let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/run_id",
                "/generated_at",
                "/ipos/0/company",
                "/ipos/0/status",
                "/ipos/0/open_date",
                "/ipos/1/lot_size",
                "/ipos/1/sources/0/url",
                "/ipos/2",
            ]
        );
    }

    #[test]
    fn rejects_too_many_ipos() {
        let mut value = valid();
        let ipo = value["ipos"][0].clone();
        value["ipos"] = Value::Array(vec![ipo; MAX_IPOS + 1]);
        let issues = validate_digest(&value).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "/ipos");
    }

    #[test]
    fn rejects_overlong_strings() {
        let mut value = valid();
        value["ipos"][0]["sector"] = json!("x".repeat(MAX_FIELD_LEN + 1));
        let issues = validate_digest(&value).unwrap_err();
        assert_eq!(issues[0].path, "/ipos/0/sector");
    }

    #[test]
    fn schema_describes_digest() {
        let schema = digest_json_schema();
        assert_eq!(schema["title"], "Digest");
        let required = schema["required"].as_array().unwrap();
        assert!(required.contains(&json!("ipos")));
        assert!(required.contains(&json!("run_id")));
    }
}
