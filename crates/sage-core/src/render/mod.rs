//! Deterministic HTML rendering for validated plans.
//!
//! Unlike the pipeline's model-driven render stage, this produces the same
//! page for the same plan every time, with no capability call. The HTTP
//! surface uses it for the `html` field of generation responses.

use crate::schema::StudyPlan;

/// Days of schedule shown before the page truncates.
const SCHEDULE_PREVIEW_DAYS: usize = 7;

const PAGE_STYLE: &str = "\
body { font-family: system-ui, sans-serif; margin: 2rem auto; max-width: 48rem; color: #1f2937; }
header { border-bottom: 2px solid #e5e7eb; padding-bottom: 1rem; }
h1 { margin-bottom: 0.25rem; }
.chip { display: inline-block; border-radius: 9999px; padding: 0.25rem 0.75rem; margin: 0.15rem; color: #fff; font-size: 0.85rem; }
table { border-collapse: collapse; width: 100%; margin-bottom: 1rem; }
th, td { border: 1px solid #e5e7eb; padding: 0.4rem 0.6rem; text-align: left; font-size: 0.9rem; }
th { background: #f9fafb; }
ul { padding-left: 1.25rem; }
";

/// Render a plan as a self-contained HTML document.
pub fn plan_page(plan: &StudyPlan) -> String {
    let mut page = String::with_capacity(4096);

    page.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    page.push_str("<meta charset=\"utf-8\">\n");
    page.push_str(&format!("<title>{}</title>\n", escape(&plan.title)));
    page.push_str(&format!("<style>\n{PAGE_STYLE}</style>\n"));
    page.push_str("</head>\n<body>\n");

    page.push_str("<header>\n");
    page.push_str(&format!("<h1>{}</h1>\n", escape(&plan.title)));
    page.push_str(&format!(
        "<p>{} to {}</p>\n",
        escape(&plan.start_date),
        escape(&plan.end_date)
    ));
    page.push_str("</header>\n");

    page.push_str("<section>\n<h2>Subjects</h2>\n<p>\n");
    for subject in &plan.subjects {
        // Colors are schema-validated hex, safe to interpolate.
        page.push_str(&format!(
            "<span class=\"chip\" style=\"background: {}\">{} ({}, {}h)</span>\n",
            subject.color,
            escape(&subject.name),
            subject.priority,
            subject.total_hours
        ));
    }
    page.push_str("</p>\n</section>\n");

    page.push_str("<section>\n<h2>Schedule</h2>\n");
    for day in plan.schedule.iter().take(SCHEDULE_PREVIEW_DAYS) {
        page.push_str(&format!(
            "<h3>{} {}</h3>\n",
            escape(&day.day_of_week),
            escape(&day.date)
        ));
        page.push_str("<table>\n<tr><th>Time</th><th>Subject</th><th>Task</th><th>Type</th></tr>\n");
        for session in &day.sessions {
            page.push_str(&format!(
                "<tr><td>{} to {}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape(&session.start_time),
                escape(&session.end_time),
                escape(&session.subject),
                escape(&session.task),
                session.kind
            ));
        }
        page.push_str("</table>\n");
    }
    if plan.schedule.len() > SCHEDULE_PREVIEW_DAYS {
        page.push_str(&format!(
            "<p>Plus {} more scheduled days.</p>\n",
            plan.schedule.len() - SCHEDULE_PREVIEW_DAYS
        ));
    }
    page.push_str("</section>\n");

    if !plan.milestones.is_empty() {
        page.push_str("<section>\n<h2>Milestones</h2>\n<ul>\n");
        for milestone in &plan.milestones {
            page.push_str(&format!(
                "<li><strong>{}</strong>: {}",
                escape(&milestone.date),
                escape(&milestone.title)
            ));
            if let Some(description) = &milestone.description {
                page.push_str(&format!(" ({})", escape(description)));
            }
            page.push_str("</li>\n");
        }
        page.push_str("</ul>\n</section>\n");
    }

    if !plan.tips.is_empty() {
        page.push_str("<section>\n<h2>Tips</h2>\n<ul>\n");
        for tip in &plan.tips {
            page.push_str(&format!("<li>{}</li>\n", escape(tip)));
        }
        page.push_str("</ul>\n</section>\n");
    }

    page.push_str("</body>\n</html>\n");
    page
}

/// Escape text for interpolation into HTML content or attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
