use chrono::NaiveDate;

use crate::collector::Article;

pub fn extraction_system_prompt(today: NaiveDate) -> String {
    format!(
        r#"You extract structured facts about Indian IPOs from news articles.

Today's date is {today}.

Report every company whose IPO the article discusses: mainboard and SME issues on NSE or BSE, DRHP filings, SEBI approvals, announced price bands, subscription updates, allotment, listing performance, and withdrawn or shelved issues.

Rules:
- Use only facts stated in the article. Never guess. Use null for anything not stated.
- company: the issuer's name as written, without the word "IPO".
- status: exactly one of filed, approved, upcoming, open, closed, allotted, listed, withdrawn, unknown.
  filed = DRHP submitted; approved = SEBI observation or nod received; upcoming = dates or price band announced but bidding not started;
  open = bidding in progress; closed = bidding ended, allotment pending; allotted = basis of allotment finalised; listed = shares trading;
  withdrawn = issue cancelled, shelved or lapsed.
- Dates as YYYY-MM-DD. Resolve relative dates ("next Tuesday") against today's date only when unambiguous.
- price_band, issue_size and gmp: keep the currency and units as written, e.g. "₹340-360", "₹1,200 crore", "₹45 (12%)".
- lot_size: number of shares in one lot.
- exchange: NSE, BSE, NSE SME or BSE SME.
- issue_type: "mainboard" or "sme".
- summary: one sentence on what this article reports about the IPO.

Articles about the IPO market in general with no specific company yield an empty list.
Respond with JSON of the form {{"ipos": [...]}}."#
    )
}

pub fn extraction_user_prompt(article: &Article, content: &str) -> String {
    let published = article
        .published_at
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string());
    let source = article.source_name.as_deref().unwrap_or("unknown");
    format!(
        "Title: {}\nSource: {source}\nPublished: {published}\nURL: {}\n\n---\n\n{content}",
        article.title, article.link
    )
}

pub const SUMMARY_SYSTEM_PROMPT: &str = "You write the opening paragraph of a daily email digest about the Indian IPO market. \
Write 2 to 4 plain sentences covering the most notable activity: issues open now, upcoming openings, \
listings and their performance, and new filings. Mention company names. \
No greetings, no headings, no bullet points, no investment advice.";

/// One compact line per record, so the model sees everything in the digest.
pub fn summary_user_prompt(lines: &[String]) -> String {
    format!("IPO activity in this digest:\n\n{}", lines.join("\n"))
}
