//! Server-side HTML for the comparison page.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use gam_core::{Comparison, FeaturePanel, Notice, Reference};
use gam_types::sentinel;

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 0; }
.main-header { background-color: #1e4d5b; color: white; padding: 1rem; display: flex; justify-content: space-between; align-items: center; }
.main-header a { color: white; text-decoration: none; margin-left: 2rem; }
.layout { display: grid; grid-template-columns: 1fr 3fr; gap: 1.5rem; padding: 1rem; }
.notice { background: #f8d7da; color: #721c24; padding: 0.5rem 1rem; margin: 0.5rem 1rem; }
.loaded { color: #666; font-size: 0.8rem; padding: 0 1rem 1rem 1rem; }
.section-header { background-color: #1e4d5b; color: white; padding: 0.5rem; text-align: center; font-weight: bold; margin: 1rem 0 0.5rem 0; }
.columns { display: grid; grid-template-columns: 1fr 1fr; gap: 1rem; }
.feature-header { text-align: center; font-size: 1.5rem; font-weight: bold; padding: 1rem; color: white; }
.feature-1 { background-color: #a0916a; }
.feature-2 { background-color: #c4949c; }
.section-container { background-color: rgba(128, 128, 128, 0.1); padding: 1rem; }
.constraint-subheading { font-weight: bold; margin-top: 0.5rem; }
.constraint-pill { display: inline-block; border-radius: 1rem; padding: 0.2rem 0.7rem; margin: 0.15rem; font-size: 0.85rem; }
.geo-constraint-pill { background-color: #d9e7d2; }
.eng-constraint-pill { background-color: #d2dde7; }
.empty { font-style: italic; opacity: 0.6; }
.higher-constraint { color: #b02a37; }
.moderate-constraint { color: #b8860b; }
.lower-constraint { color: #2e7d32; }
"#;

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Query-string encoding for the report link.
fn encode_query(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for b in text.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            _ => {
                let _ = write!(out, "%{b:02X}");
            }
        }
    }
    out
}

pub struct PageInput<'a> {
    pub names: &'a [String],
    pub comparison: &'a Comparison,
    pub notices: &'a [Notice],
    pub references: &'a [Reference],
    pub loaded_at: DateTime<Utc>,
}

pub fn render_page(input: &PageInput<'_>) -> String {
    let [a, b] = &input.comparison.panels;
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<title>EGDI - Geo-Assessment Matrix</title>\n<style>");
    out.push_str(STYLE);
    out.push_str("</style>\n</head>\n<body>\n");

    out.push_str("<div class=\"main-header\"><h2>EGDI - Geo-Assessment Matrix</h2><nav>");
    for r in input.references {
        let _ = write!(
            out,
            "<a href=\"{}\" target=\"_blank\">{}</a>",
            escape_html(&r.url),
            escape_html(&r.title)
        );
    }
    out.push_str("</nav></div>\n");

    for notice in input.notices {
        let _ = writeln!(out, "<div class=\"notice\">{}</div>", escape_html(&notice.message));
    }

    out.push_str("<div class=\"layout\">\n<form method=\"get\" action=\"/\">\n");
    out.push_str("<h2>Geological Comparison</h2>\n<p>Compare two geological features and their engineering constraints for offshore windfarm development.</p>\n");
    out.push_str("<h3>Feature Selection</h3>\n");
    select(&mut out, "feature1", "Geological Feature 1", input.names, &a.name);
    select(&mut out, "feature2", "Geological Feature 2", input.names, &b.name);
    out.push_str("<p><button type=\"submit\">Compare</button></p>\n");
    let _ = writeln!(
        out,
        "<p><a href=\"/report?feature1={}&amp;feature2={}\">Download report</a></p>",
        encode_query(&a.name),
        encode_query(&b.name)
    );
    out.push_str("</form>\n<main>\n");

    row(&mut out, None, input.comparison, |out, p| {
        let _ = write!(
            out,
            "<div class=\"feature-header feature-{}\">{}</div>",
            p.slot,
            escape_html(&p.name)
        );
    });

    row(&mut out, Some("Geological Characteristics"), input.comparison, characteristics);
    row(&mut out, Some("Constraints Analysis"), input.comparison, constraints);
    row(&mut out, Some("Foundation Assessment Comparison"), input.comparison, assessments);
    row(&mut out, Some("Engineering Comments"), input.comparison, |out, p| {
        let text = p
            .details
            .as_ref()
            .map_or(sentinel::NO_ENGINEERING_COMMENTS, |d| d.comments.as_str());
        let _ = write!(out, "<div class=\"section-container\"><p>{}</p></div>", escape_html(text));
    });
    row(&mut out, Some("References"), input.comparison, references);

    out.push_str("</main>\n</div>\n");
    let _ = writeln!(
        out,
        "<footer class=\"loaded\">Data loaded {}</footer>",
        input.loaded_at.format("%Y-%m-%d %H:%M UTC")
    );
    out.push_str("</body>\n</html>\n");
    out
}

fn select(out: &mut String, id: &str, label: &str, names: &[String], selected: &str) {
    let _ = writeln!(out, "<p><label for=\"{id}\"><strong>{label}</strong></label><br>");
    let _ = writeln!(out, "<select id=\"{id}\" name=\"{id}\">");
    if names.is_empty() {
        let _ = writeln!(out, "<option>{}</option>", sentinel::NO_FEATURES);
    }
    for name in names {
        let mark = if name == selected { " selected" } else { "" };
        let escaped = escape_html(name);
        let _ = writeln!(out, "<option value=\"{escaped}\"{mark}>{escaped}</option>");
    }
    out.push_str("</select></p>\n");
}

fn row(
    out: &mut String,
    title: Option<&str>,
    comparison: &Comparison,
    cell: impl Fn(&mut String, &FeaturePanel),
) {
    if let Some(title) = title {
        let _ = writeln!(out, "<div class=\"section-header\">{title}</div>");
    }
    out.push_str("<div class=\"columns\">");
    for panel in &comparison.panels {
        out.push_str("<div>");
        cell(out, panel);
        out.push_str("</div>");
    }
    out.push_str("</div>\n");
}

fn characteristics(out: &mut String, p: &FeaturePanel) {
    out.push_str("<div class=\"section-container\">");
    match &p.details {
        Some(d) => {
            for (label, value) in [
                ("Setting", &d.setting),
                ("Process", &d.process),
                ("Constraint Type", &d.constraint_type),
                ("Dominant Constraint", &d.dominant_constraint),
                ("Definition", &d.definition),
            ] {
                let _ = write!(out, "<p><strong>{label}:</strong> {}</p>", escape_html(value));
            }
        }
        None => {
            let _ = write!(
                out,
                "<p><strong>{}</strong></p>",
                escape_html(&p.characteristics_placeholder())
            );
        }
    }
    out.push_str("</div>");
}

fn constraints(out: &mut String, p: &FeaturePanel) {
    out.push_str("<div class=\"section-container\">");
    match &p.details {
        Some(d) => {
            for list in &d.constraints {
                let _ = write!(
                    out,
                    "<div class=\"constraint-subheading\">{} Constraints</div>",
                    list.domain.label()
                );
                if list.items.is_empty() {
                    let _ = write!(out, "<p class=\"empty\">{}</p>", list.domain.none_identified());
                    continue;
                }
                let pill = match list.domain {
                    gam_types::ConstraintDomain::Geological => "geo-constraint-pill",
                    gam_types::ConstraintDomain::Engineering => "eng-constraint-pill",
                };
                out.push_str("<div>");
                for item in &list.items {
                    let _ = write!(
                        out,
                        "<span class=\"constraint-pill {pill}\">{}</span> ",
                        escape_html(item)
                    );
                }
                out.push_str("</div>");
            }
        }
        None => {
            let _ = write!(out, "<p class=\"empty\">{}</p>", sentinel::NO_CONSTRAINT_DATA);
        }
    }
    out.push_str("</div>");
}

fn assessments(out: &mut String, p: &FeaturePanel) {
    out.push_str("<div class=\"section-container\">");
    for line in &p.assessments {
        match line.rating {
            Some(rating) => {
                let _ = write!(
                    out,
                    "<p><strong>{}:</strong> <span class=\"{}\">{}</span></p>",
                    line.foundation,
                    rating.css_class(),
                    line.text
                );
            }
            None => {
                let _ = write!(out, "<p><strong>{}:</strong> {}</p>", line.foundation, line.text);
            }
        }
    }
    out.push_str("</div>");
}

fn references(out: &mut String, p: &FeaturePanel) {
    out.push_str("<div class=\"section-container\">");
    match p.details.as_ref().map(|d| d.references.as_slice()) {
        Some(refs) if !refs.is_empty() => {
            out.push_str("<ul>");
            for r in refs {
                let _ = write!(out, "<li>{}</li>", escape_html(r));
            }
            out.push_str("</ul>");
        }
        _ => {
            let _ = write!(out, "<p class=\"empty\">{}</p>", sentinel::NO_REFERENCES);
        }
    }
    out.push_str("</div>");
}
