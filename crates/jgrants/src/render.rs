// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text rendering of results for the terminal.

use std::fmt::Write as _;

use jgrants_core::types::{Amount, Overview, SearchQuery, SubsidyDetail, SubsidySummary};

const MISSING: &str = "-";

/// Formats yen amounts in 万円 units once they reach ten thousand.
pub fn format_amount(amount: Option<&Amount>) -> String {
    match amount {
        None => MISSING.to_string(),
        Some(Amount::Unparsed(raw)) => raw.clone(),
        Some(Amount::Number(n)) if *n >= 10_000.0 => {
            let man = (*n / 10_000.0).round() as u64;
            format!("{}万円", group_thousands(man))
        }
        Some(Amount::Number(n)) => format!("{}円", n.round() as u64),
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// One line describing the conditions a query searches with.
pub fn query_line(query: &SearchQuery) -> String {
    let mut parts = vec![format!("keyword={}", query.keyword)];
    if let Some(industry) = query.industry {
        parts.push(format!("industry={industry}"));
    }
    if let Some(band) = query.employee_band {
        parts.push(format!("employees={band}"));
    }
    if let Some(area) = query.area_region {
        parts.push(format!("area={area}"));
    }
    if let Some(purpose) = query.use_purpose {
        parts.push(format!("purpose={purpose}"));
    }
    parts.push(format!("sort={} {}", query.sort_field, query.sort_order));
    if !query.accepting_only {
        parts.push("including closed".to_string());
    }
    parts.join("  ")
}

/// A compact table: id, deadline, ceiling, title.
pub fn summary_table(items: &[SubsidySummary]) -> String {
    if items.is_empty() {
        return "No subsidies matched.\n".to_string();
    }
    let mut out = String::new();
    for item in items {
        let deadline = item
            .acceptance_end
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| MISSING.to_string());
        let _ = writeln!(
            out,
            "{:<20} {:<10} {:>12}  {}",
            item.id.as_deref().unwrap_or(MISSING),
            deadline,
            format_amount(item.max_limit_amount.as_ref()),
            item.title.as_deref().unwrap_or(MISSING),
        );
    }
    let _ = writeln!(out, "\n{} result(s)", items.len());
    out
}

pub fn detail_text(detail: &SubsidyDetail) -> String {
    let s = &detail.summary;
    let mut out = String::new();
    let _ = writeln!(out, "{}", s.title.as_deref().unwrap_or(MISSING));
    let _ = writeln!(out, "  id:         {}", s.id.as_deref().unwrap_or(MISSING));
    let _ = writeln!(out, "  status:     {}", detail.status);
    let period = match (s.acceptance_start, s.acceptance_end) {
        (None, None) => MISSING.to_string(),
        (start, end) => format!(
            "{} .. {}",
            start.map(|d| d.format("%Y-%m-%d %H:%M").to_string()).unwrap_or_default(),
            end.map(|d| d.format("%Y-%m-%d %H:%M").to_string()).unwrap_or_default(),
        ),
    };
    let _ = writeln!(out, "  accepting:  {period}");
    let _ = writeln!(
        out,
        "  ceiling:    {}",
        format_amount(s.max_limit_amount.as_ref())
    );
    for (label, value) in [
        ("area", s.target_area.as_deref()),
        ("industry", s.target_industry.as_deref()),
        ("employees", detail.target_employees.as_deref()),
        ("purpose", detail.use_purpose.as_deref()),
        ("apply at", detail.application_url.as_deref()),
    ] {
        if let Some(value) = value {
            let _ = writeln!(out, "  {:<11} {value}", format!("{label}:"));
        }
    }
    if let Some(description) = detail.description.as_deref() {
        let _ = writeln!(out, "\n{}", description.trim());
    }
    if !detail.attachments.is_empty() {
        let _ = writeln!(out, "\nAttachments:");
        for (i, a) in detail.attachments.iter().enumerate() {
            let size = a.size.map(|b| format!(" ({b} bytes)")).unwrap_or_default();
            let _ = writeln!(out, "  [{i}] {} / {}{size}", a.category, a.name);
        }
    }
    out
}

pub fn overview_text(overview: &Overview) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Accepting subsidies: {}", overview.total_count);
    let d = &overview.by_deadline_period;
    let _ = writeln!(
        out,
        "Deadlines: this month {}, next month {}, later {}",
        d.this_month, d.next_month, d.after_next_month
    );
    let a = &overview.by_amount_range;
    let _ = writeln!(
        out,
        "Ceilings: <=100万円 {}, <=1,000万円 {}, <=1億円 {}, >1億円 {}",
        a.under_1m, a.under_10m, a.under_100m, a.over_100m
    );
    if !overview.urgent_deadlines.is_empty() {
        let _ = writeln!(out, "Closing soon:");
        for u in &overview.urgent_deadlines {
            let _ = writeln!(out, "  {:>3}d  {}  {}", u.days_left, u.id, u.title);
        }
    }
    out
}
