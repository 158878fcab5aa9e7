use std::fmt::Write;

use chrono::{DateTime, Utc};
use gam_types::sentinel;

use crate::comparison::{Comparison, FeaturePanel};

/// Plain-text rendering of a comparison, offered as the downloadable report.
pub fn render_text(comparison: &Comparison, generated_at: DateTime<Utc>) -> String {
    let [a, b] = &comparison.panels;
    let mut out = String::new();
    let _ = writeln!(out, "EGDI - Geo-Assessment Matrix");
    let _ = writeln!(out, "Comparison: {} vs {}", a.name, b.name);
    let _ = writeln!(out, "Generated: {}", generated_at.format("%Y-%m-%d %H:%M UTC"));
    for panel in &comparison.panels {
        out.push('\n');
        write_panel(&mut out, panel);
    }
    out
}

fn write_panel(out: &mut String, panel: &FeaturePanel) {
    let title = format!("Feature {}: {}", panel.slot, panel.name);
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "=".repeat(title.chars().count()));

    let _ = writeln!(out, "\nGeological Characteristics");
    match &panel.details {
        Some(d) => {
            let _ = writeln!(out, "  Setting: {}", d.setting);
            let _ = writeln!(out, "  Process: {}", d.process);
            let _ = writeln!(out, "  Constraint Type: {}", d.constraint_type);
            let _ = writeln!(out, "  Dominant Constraint: {}", d.dominant_constraint);
            let _ = writeln!(out, "  Definition: {}", d.definition);
        }
        None => {
            let _ = writeln!(out, "  {}", panel.characteristics_placeholder());
        }
    }

    let _ = writeln!(out, "\nConstraints Analysis");
    match &panel.details {
        Some(d) => {
            for list in &d.constraints {
                let _ = writeln!(out, "  {} Constraints", list.domain.label());
                for line in list.lines() {
                    let _ = writeln!(out, "    - {line}");
                }
            }
        }
        None => {
            let _ = writeln!(out, "  {}", sentinel::NO_CONSTRAINT_DATA);
        }
    }

    let _ = writeln!(out, "\nFoundation Assessment");
    for line in &panel.assessments {
        match line.complexity() {
            Some(level) => {
                let _ = writeln!(out, "  {}: {} ({level} complexity)", line.foundation, line.text);
            }
            None => {
                let _ = writeln!(out, "  {}: {}", line.foundation, line.text);
            }
        }
    }

    let _ = writeln!(out, "\nEngineering Comments");
    let comments = panel
        .details
        .as_ref()
        .map_or(sentinel::NO_ENGINEERING_COMMENTS, |d| d.comments.as_str());
    let _ = writeln!(out, "  {comments}");

    let _ = writeln!(out, "\nReferences");
    match panel.details.as_ref().map(|d| d.references.as_slice()) {
        Some(refs) if !refs.is_empty() => {
            for r in refs {
                let _ = writeln!(out, "  - {r}");
            }
        }
        _ => {
            let _ = writeln!(out, "  {}", sentinel::NO_REFERENCES);
        }
    }
}
