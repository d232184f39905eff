use dioxus::prelude::*;

use super::layout::EmailLayout;
use super::{DigestView, IpoRow};

const COLUMNS: &[&str] = &[
    "Company",
    "Status",
    "Dates",
    "Price band",
    "Lot",
    "Issue size",
    "GMP",
    "Exchange",
    "Sources",
];

const TH_STYLE: &str = "text-align:left;padding:8px;border-bottom:2px solid #e5e7eb;font-size:12px;text-transform:uppercase;color:#6b7280;white-space:nowrap;";
const TD_STYLE: &str = "padding:8px;border-bottom:1px solid #f3f4f6;font-size:13px;vertical-align:top;";

fn pill_style(colour: &str) -> String {
    format!(
        "display:inline-block;padding:2px 8px;border-radius:9999px;font-size:11px;font-weight:600;color:#ffffff;background:{colour};"
    )
}

#[allow(non_snake_case)]
#[component]
pub fn DigestEmail(view: DigestView) -> Element {
    let meta = format!(
        "Generated {} from {} articles over the last {} hours",
        view.generated_label, view.article_count, view.window_hours
    );
    rsx! {
        EmailLayout { title: view.title.clone(),
            h2 { style: "font-size:20px;margin:0 0 4px 0;", "{view.title}" }
            p { style: "font-size:12px;color:#6b7280;margin:0 0 16px 0;", "{meta}" }
            if !view.summary.is_empty() {
                p { style: "font-size:14px;line-height:1.5;background:#f9fafb;border-left:3px solid #2563eb;padding:10px 12px;margin:0 0 16px 0;",
                    "{view.summary}"
                }
            }
            if view.rows.is_empty() {
                p { style: "color:#9ca3af;text-align:center;padding:32px 0;",
                    "No IPO activity in this window."
                }
            } else {
                table { style: "width:100%;border-collapse:collapse;",
                    thead {
                        tr {
                            for column in COLUMNS.iter() {
                                th { style: TH_STYLE, "{column}" }
                            }
                        }
                    }
                    tbody {
                        for row in view.rows.iter() {
                            IpoTableRow { row: row.clone() }
                        }
                    }
                }
            }
        }
    }
}

#[allow(non_snake_case)]
#[component]
fn IpoTableRow(row: IpoRow) -> Element {
    rsx! {
        tr {
            td { style: TD_STYLE,
                div { style: "font-weight:600;", "{row.company}" }
                if !row.sector.is_empty() {
                    div { style: "font-size:11px;color:#6b7280;", "{row.sector}" }
                }
                if !row.note.is_empty() {
                    div { style: "font-size:12px;color:#4b5563;margin-top:4px;", "{row.note}" }
                }
            }
            td { style: TD_STYLE,
                span { style: pill_style(row.status_colour), "{row.status_label}" }
            }
            td { style: "{TD_STYLE}white-space:nowrap;",
                for line in row.dates.iter() {
                    div { "{line}" }
                }
            }
            td { style: TD_STYLE, "{row.price_band}" }
            td { style: TD_STYLE, "{row.lot}" }
            td { style: TD_STYLE, "{row.issue_size}" }
            td { style: TD_STYLE, "{row.gmp}" }
            td { style: TD_STYLE, "{row.exchange}" }
            td { style: TD_STYLE,
                for source in row.sources.iter() {
                    div {
                        a { href: "{source.url}", style: "color:#2563eb;text-decoration:none;",
                            target: "_blank", rel: "noopener",
                            "{source.label}"
                        }
                    }
                }
            }
        }
    }
}
