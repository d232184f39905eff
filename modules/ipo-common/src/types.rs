use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Status ---

/// Lifecycle stage of an IPO. Later stages outrank earlier ones when
/// several articles disagree about the same company.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum IpoStatus {
    #[default]
    Unknown,
    Filed,
    Approved,
    Upcoming,
    Open,
    Closed,
    Allotted,
    Listed,
    Withdrawn,
}

impl IpoStatus {
    pub const ALL: [IpoStatus; 9] = [
        IpoStatus::Unknown,
        IpoStatus::Filed,
        IpoStatus::Approved,
        IpoStatus::Upcoming,
        IpoStatus::Open,
        IpoStatus::Closed,
        IpoStatus::Allotted,
        IpoStatus::Listed,
        IpoStatus::Withdrawn,
    ];

    pub fn priority(self) -> u8 {
        match self {
            IpoStatus::Unknown => 0,
            IpoStatus::Filed => 1,
            IpoStatus::Approved => 2,
            IpoStatus::Upcoming => 3,
            IpoStatus::Open => 4,
            IpoStatus::Closed => 5,
            IpoStatus::Allotted => 6,
            IpoStatus::Listed => 7,
            IpoStatus::Withdrawn => 8,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IpoStatus::Unknown => "unknown",
            IpoStatus::Filed => "filed",
            IpoStatus::Approved => "approved",
            IpoStatus::Upcoming => "upcoming",
            IpoStatus::Open => "open",
            IpoStatus::Closed => "closed",
            IpoStatus::Allotted => "allotted",
            IpoStatus::Listed => "listed",
            IpoStatus::Withdrawn => "withdrawn",
        }
    }

    /// Map free text from news copy or a model reply onto a status.
    ///
    /// Canonical names match exactly. Otherwise keyword groups are tried
    /// from the latest lifecycle stage to the earliest, so "listed after
    /// allotment" resolves to `Listed`.
    pub fn from_str_loose(s: &str) -> IpoStatus {
        let lower = s.trim().to_lowercase();
        if let Some(status) = IpoStatus::ALL.iter().find(|st| st.as_str() == lower) {
            return *status;
        }

        const GROUPS: &[(IpoStatus, &[&str])] = &[
            (
                IpoStatus::Withdrawn,
                &["withdraw", "shelved", "scrapped", "called off", "cancel"],
            ),
            (
                IpoStatus::Listed,
                &["listed", "listing gain", "listing pop", "debut", "shares trading", "trading at a premium", "trading at a discount"],
            ),
            (IpoStatus::Allotted, &["allot"]),
            (
                IpoStatus::Closed,
                &["closed", "closes", "subscription ended", "bidding ended", "final day"],
            ),
            (
                IpoStatus::Upcoming,
                &["upcoming", "to open", "opens on", "will open", "announced", "price band fixed", "price band set", "launch", "scheduled"],
            ),
            (
                IpoStatus::Open,
                &["open", "live", "ongoing", "subscribed", "bidding", "gmp", "grey market"],
            ),
            (
                IpoStatus::Approved,
                &["approv", "sebi nod", "nod", "observation", "clearance", "green light"],
            ),
            (
                IpoStatus::Filed,
                &["drhp", "filed", "files", "filing", "draft", "prospectus"],
            ),
        ];

        GROUPS
            .iter()
            .find(|(_, needles)| needles.iter().any(|n| lower.contains(n)))
            .map(|(status, _)| *status)
            .unwrap_or(IpoStatus::Unknown)
    }
}

impl std::fmt::Display for IpoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            IpoStatus::Unknown => "Unknown",
            IpoStatus::Filed => "Filed",
            IpoStatus::Approved => "Approved",
            IpoStatus::Upcoming => "Upcoming",
            IpoStatus::Open => "Open",
            IpoStatus::Closed => "Closed",
            IpoStatus::Allotted => "Allotted",
            IpoStatus::Listed => "Listed",
            IpoStatus::Withdrawn => "Withdrawn",
        };
        write!(f, "{label}")
    }
}

// --- Records ---

/// An article an IPO record was extracted from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SourceRef {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// A cleaned, typed IPO record. Dates are `YYYY-MM-DD` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IpoRecord {
    pub company: String,
    pub status: IpoStatus,
    /// NSE, BSE, NSE SME or BSE SME.
    #[serde(default)]
    pub exchange: Option<String>,
    /// "mainboard" or "sme".
    #[serde(default)]
    pub issue_type: Option<String>,
    #[serde(default)]
    pub open_date: Option<NaiveDate>,
    #[serde(default)]
    pub close_date: Option<NaiveDate>,
    #[serde(default)]
    pub allotment_date: Option<NaiveDate>,
    #[serde(default)]
    pub listing_date: Option<NaiveDate>,
    #[serde(default)]
    pub price_band: Option<String>,
    #[serde(default)]
    pub issue_size: Option<String>,
    #[serde(default)]
    pub lot_size: Option<u32>,
    /// Grey market premium as quoted, e.g. "₹45 (12%)".
    #[serde(default)]
    pub gmp: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Vec<SourceRef>")]
    pub sources: Vec<SourceRef>,
}

impl IpoRecord {
    pub fn new(company: impl Into<String>, status: IpoStatus) -> Self {
        Self {
            company: company.into(),
            status,
            exchange: None,
            issue_type: None,
            open_date: None,
            close_date: None,
            allotment_date: None,
            listing_date: None,
            price_band: None,
            issue_size: None,
            lot_size: None,
            gmp: None,
            sector: None,
            summary: None,
            sources: Vec::new(),
        }
    }

    /// Most recent publication time across this record's sources.
    pub fn latest_source_at(&self) -> Option<DateTime<Utc>> {
        self.sources.iter().filter_map(|s| s.published_at).max()
    }
}

/// The payload the scout posts to the notify server after every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Digest {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Lookback window the articles were collected over.
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "u32")]
    pub window_hours: u32,
    /// Articles that passed the relevance filter this run.
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "u32")]
    pub article_count: u32,
    #[serde(default)]
    pub summary: Option<String>,
    pub ipos: Vec<IpoRecord>,
}

/// Explicit `null` reads the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Digest {
    pub fn is_empty(&self) -> bool {
        self.ipos.is_empty()
    }
}

// --- LLM extraction shapes ---

/// One IPO as the model reports it. Everything is loosely typed text;
/// `sanitize_raw` turns it into an `IpoRecord`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawIpo {
    /// Company name as written in the article, without "IPO".
    #[serde(default)]
    pub company: Option<String>,
    /// One of: filed, approved, upcoming, open, closed, allotted, listed, withdrawn, unknown
    #[serde(default)]
    pub status: Option<String>,
    /// NSE, BSE, NSE SME or BSE SME
    #[serde(default)]
    pub exchange: Option<String>,
    /// "mainboard" or "sme"
    #[serde(default)]
    pub issue_type: Option<String>,
    /// Subscription open date, YYYY-MM-DD
    #[serde(default)]
    pub open_date: Option<String>,
    /// Subscription close date, YYYY-MM-DD
    #[serde(default)]
    pub close_date: Option<String>,
    /// Basis of allotment date, YYYY-MM-DD
    #[serde(default)]
    pub allotment_date: Option<String>,
    /// Listing date, YYYY-MM-DD
    #[serde(default)]
    pub listing_date: Option<String>,
    /// Price band per share, e.g. "₹340-360"
    #[serde(default)]
    pub price_band: Option<String>,
    /// Total issue size, e.g. "₹1,200 crore"
    #[serde(default)]
    pub issue_size: Option<String>,
    /// Minimum shares per application
    #[serde(default, deserialize_with = "deserialize_lot_size")]
    #[schemars(with = "Option<String>")]
    pub lot_size: Option<String>,
    /// Grey market premium if quoted
    #[serde(default)]
    pub gmp: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    /// One sentence on what the article says about this IPO
    #[serde(default)]
    pub summary: Option<String>,
}

/// Models return lot size as either `1200` or `"1,200 shares"`.
fn deserialize_lot_size<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s)),
        serde_json::Value::Number(n) => Ok(Some(n.to_string())),
        _ => Err(de::Error::custom("lot_size must be a number or string")),
    }
}

/// The full extraction response from the LLM.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ExtractionResponse {
    #[serde(default, deserialize_with = "deserialize_ipos")]
    pub ipos: Vec<RawIpo>,
}

/// Handle the model returning `ipos` as a proper array or a stringified one.
fn deserialize_ipos<'de, D>(deserializer: D) -> std::result::Result<Vec<RawIpo>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Array(_) => serde_json::from_value(value).map_err(de::Error::custom),
        serde_json::Value::String(ref s) => serde_json::from_str(s).map_err(de::Error::custom),
        serde_json::Value::Null => Ok(Vec::new()),
        _ => Err(de::Error::custom("ipos must be an array or JSON string")),
    }
}
