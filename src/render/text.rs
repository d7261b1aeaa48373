//! Plain text rendering of reconstructed documents.

use std::fmt::Write;

use crate::model::DocumentReport;

/// Render a report as plain text, page by page in reading order.
pub fn to_text(report: &DocumentReport) -> String {
    let mut out = String::new();

    for page in &report.pages {
        let _ = writeln!(out, "=== Page {} ===", page.page_no);

        for region in &page.regions {
            out.push('\n');
            if region.has_context() {
                for line in region.context_lines() {
                    let _ = writeln!(out, "{}", line);
                }
            }
            let _ = writeln!(out, "[{}]", region.kind);
            for line in region.content.lines() {
                let _ = writeln!(out, "  {}", line);
            }
        }
        out.push('\n');
    }

    out.trim_end().to_string()
}
