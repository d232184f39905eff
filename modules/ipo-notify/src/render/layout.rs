use dioxus::prelude::*;

/// Email shell. Mail clients strip `<style>` blocks and external CSS, so
/// every style is inline.
#[allow(non_snake_case)]
#[component]
pub fn EmailLayout(title: String, children: Element) -> Element {
    rsx! {
        head {
            meta { charset: "utf-8" }
            meta { name: "viewport", content: "width=device-width, initial-scale=1" }
            title { "{title}" }
        }
        body { style: "margin:0;padding:0;background:#f3f4f6;font-family:-apple-system,Segoe UI,Helvetica,Arial,sans-serif;color:#111827;",
            div { style: "max-width:960px;margin:0 auto;padding:24px 16px;",
                div { style: "background:#111827;color:#ffffff;padding:16px 20px;border-radius:8px 8px 0 0;font-size:18px;font-weight:600;",
                    "IPO Radar"
                }
                div { style: "background:#ffffff;padding:20px;border:1px solid #e5e7eb;border-top:none;border-radius:0 0 8px 8px;",
                    {children}
                }
                p { style: "font-size:12px;color:#9ca3af;text-align:center;margin-top:16px;",
                    "Compiled automatically from news coverage. Figures may be incomplete; check the linked sources before acting."
                }
            }
        }
    }
}
