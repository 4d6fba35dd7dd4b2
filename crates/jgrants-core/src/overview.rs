// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local aggregation of catalog statistics from search results.
//!
//! Used by transports that cannot ask the server for an overview.

use chrono::{DateTime, Datelike, FixedOffset};

use crate::types::{Amount, Overview, SubsidySummary, UrgentDeadline};

/// Deadlines this close (in days) are reported as urgent.
pub const URGENT_WITHIN_DAYS: i64 = 14;

/// Builds an [`Overview`] as seen at `now`.
///
/// Closed or undated subsidies count toward `total_count` only.
pub fn summarize(items: &[SubsidySummary], now: DateTime<FixedOffset>) -> Overview {
    let mut overview = Overview {
        total_count: items.len() as u64,
        ..Overview::default()
    };

    for item in items {
        if let Some(Amount::Number(amount)) = item.max_limit_amount {
            let buckets = &mut overview.by_amount_range;
            if amount <= 1_000_000.0 {
                buckets.under_1m += 1;
            } else if amount <= 10_000_000.0 {
                buckets.under_10m += 1;
            } else if amount <= 100_000_000.0 {
                buckets.under_100m += 1;
            } else {
                buckets.over_100m += 1;
            }
        }

        let Some(end) = item.acceptance_end else {
            continue;
        };
        if end < now {
            continue;
        }

        let end_local = end.with_timezone(now.offset());
        let months_ahead = (end_local.year() - now.year()) * 12 + end_local.month() as i32
            - now.month() as i32;
        let periods = &mut overview.by_deadline_period;
        match months_ahead {
            0 => periods.this_month += 1,
            1 => periods.next_month += 1,
            _ => periods.after_next_month += 1,
        }

        let days_left = (end - now).num_days();
        if days_left <= URGENT_WITHIN_DAYS {
            overview.urgent_deadlines.push(UrgentDeadline {
                id: item.id.clone().unwrap_or_default(),
                title: item.title.clone().unwrap_or_default(),
                days_left,
            });
        }
    }

    overview.urgent_deadlines.sort_by_key(|u| u.days_left);
    overview
}
