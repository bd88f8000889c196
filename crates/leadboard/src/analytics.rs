//! Dashboard statistics and pipeline analytics.
//!
//! Everything here is a pure function of a [`Snapshot`] and a reference
//! time. Functions that care about calendar days take the time zone to
//! judge them in.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::kanban::Snapshot;
use crate::model::{Activity, Lead, DEFAULT_STAGE_COLOR};

/// Label of the bucket for leads without an interest.
pub const NO_INTEREST_LABEL: &str = "No interest";

/// Share of `part` in `total` as a whole percentage, rounded half up.
/// Zero when `total` is zero.
#[must_use]
pub fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let rounded = (part.saturating_mul(200) + total) / (total * 2);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    /// Leads created inside the recent window.
    pub new_leads: usize,
    /// All leads.
    pub total_leads: usize,
    /// Activities not yet completed.
    pub pending_activities: usize,
    /// `pending_activities` as a share of all activities.
    pub pending_percent: u32,
    /// Completed activities.
    pub completed_activities: usize,
    /// `completed_activities` as a share of all activities.
    pub completed_percent: u32,
    /// Share of leads sitting in the final stage.
    pub conversion_rate: u32,
}

/// Compute the dashboard numbers. A lead is new when it was created
/// strictly after `now - window`.
#[must_use]
pub fn dashboard_stats(snapshot: &Snapshot, now: DateTime<Utc>, window: Duration) -> DashboardStats {
    let cutoff = now - window;
    let new_leads = snapshot
        .leads
        .iter()
        .filter(|l| l.created_at > cutoff)
        .count();

    let total_activities = snapshot.activities.len();
    let completed_activities = snapshot.activities.iter().filter(|a| a.completed).count();
    let pending_activities = total_activities - completed_activities;

    let converted = snapshot
        .final_stage()
        .map_or(0, |stage| snapshot.leads_in_stage(&stage.id).count());

    DashboardStats {
        new_leads,
        total_leads: snapshot.leads.len(),
        pending_activities,
        pending_percent: percent(pending_activities, total_activities),
        completed_activities,
        completed_percent: percent(completed_activities, total_activities),
        conversion_rate: percent(converted, snapshot.leads.len()),
    }
}

/// Lead count of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageCount<'a> {
    /// Stage id.
    pub stage_id: &'a str,
    /// Stage name.
    pub name: &'a str,
    /// Stage color, or the default.
    pub color: &'a str,
    /// Leads in the stage.
    pub count: usize,
}

/// Lead count per stage, in pipeline order.
#[must_use]
pub fn stage_distribution(snapshot: &Snapshot) -> Vec<StageCount<'_>> {
    let mut stages: Vec<_> = snapshot.stages.iter().collect();
    stages.sort_by_key(|s| s.order);
    stages
        .into_iter()
        .map(|stage| StageCount {
            stage_id: &stage.id,
            name: &stage.name,
            color: stage.color.as_deref().unwrap_or(DEFAULT_STAGE_COLOR),
            count: snapshot.leads_in_stage(&stage.id).count(),
        })
        .collect()
}

/// Lead count of one interest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterestShare<'a> {
    /// Interest id; `None` for the uncategorized bucket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_id: Option<&'a str>,
    /// Interest name.
    pub name: &'a str,
    /// Leads carrying the interest.
    pub count: usize,
    /// `count` as a share of all leads.
    pub percent: u32,
}

/// Leads per interest. Interests without leads are left out; uncategorized
/// leads (including ones pointing at a missing interest) come last.
#[must_use]
pub fn interest_distribution(snapshot: &Snapshot) -> Vec<InterestShare<'_>> {
    let total = snapshot.leads.len();
    let mut shares: Vec<InterestShare<'_>> = snapshot
        .interests
        .iter()
        .map(|interest| {
            let count = snapshot
                .leads
                .iter()
                .filter(|l| l.interest_id.as_deref() == Some(interest.id.as_str()))
                .count();
            InterestShare {
                interest_id: Some(&interest.id),
                name: &interest.name,
                count,
                percent: percent(count, total),
            }
        })
        .filter(|share| share.count > 0)
        .collect();

    let known: HashSet<&str> = snapshot.interests.iter().map(|i| i.id.as_str()).collect();
    let uncategorized = snapshot
        .leads
        .iter()
        .filter(|l| {
            l.interest_id
                .as_deref()
                .map_or(true, |id| !known.contains(id))
        })
        .count();
    if uncategorized > 0 {
        shares.push(InterestShare {
            interest_id: None,
            name: NO_INTEREST_LABEL,
            count: uncategorized,
            percent: percent(uncategorized, total),
        });
    }
    shares
}

/// One step of the conversion funnel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunnelStep<'a> {
    /// Stage id.
    pub stage_id: &'a str,
    /// Stage name.
    pub name: &'a str,
    /// Stage color, or the default.
    pub color: &'a str,
    /// Leads in this stage or a later one.
    pub reached: usize,
    /// `reached` as a share of all leads on the board.
    pub percent: u32,
}

/// How far leads got: for each stage, the leads that sit in it or in any
/// later stage.
#[must_use]
pub fn funnel(snapshot: &Snapshot) -> Vec<FunnelStep<'_>> {
    let distribution = stage_distribution(snapshot);
    let total: usize = distribution.iter().map(|s| s.count).sum();

    let mut reached = total;
    distribution
        .into_iter()
        .map(|stage| {
            let step = FunnelStep {
                stage_id: stage.stage_id,
                name: stage.name,
                color: stage.color,
                reached,
                percent: percent(reached, total),
            };
            reached -= stage.count;
            step
        })
        .collect()
}

/// Leads created inside the recent window, newest first.
#[must_use]
pub fn recent_leads(
    snapshot: &Snapshot,
    now: DateTime<Utc>,
    window: Duration,
    limit: usize,
) -> Vec<&Lead> {
    let cutoff = now - window;
    let mut leads: Vec<&Lead> = snapshot
        .leads
        .iter()
        .filter(|l| l.created_at > cutoff)
        .collect();
    leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    leads.truncate(limit);
    leads
}

/// An activity on the dashboard list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentActivity<'a> {
    /// The activity.
    pub activity: &'a Activity,
    /// Name of its lead, if the lead is loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_name: Option<&'a str>,
    /// Pending and past its due time.
    pub overdue: bool,
    /// Pending and due on the current calendar day.
    pub due_today: bool,
}

/// The dashboard's activity list: pending activities by due date, then
/// (when `show_completed`) completed ones most recently created first.
#[must_use]
pub fn recent_activities<'a, Tz: TimeZone>(
    snapshot: &'a Snapshot,
    now: DateTime<Utc>,
    tz: &Tz,
    show_completed: bool,
    limit: usize,
) -> Vec<RecentActivity<'a>> {
    let today = now.with_timezone(tz).date_naive();

    let mut activities: Vec<&Activity> = snapshot
        .activities
        .iter()
        .filter(|a| show_completed || !a.completed)
        .collect();
    activities.sort_by(|a, b| match (a.completed, b.completed) {
        (false, false) => a.due_date.cmp(&b.due_date),
        (true, true) => b.created_at.cmp(&a.created_at),
        (done, _) => done.cmp(&b.completed),
    });
    activities.truncate(limit);

    activities
        .into_iter()
        .map(|activity| RecentActivity {
            activity,
            lead_name: snapshot.lead(&activity.lead_id).map(|l| l.name.as_str()),
            overdue: !activity.completed && activity.due_date < now,
            due_today: !activity.completed
                && activity.due_date.with_timezone(tz).date_naive() == today,
        })
        .collect()
}

/// Leads won in one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyPerformance {
    /// First day of the month.
    pub month: NaiveDate,
    /// Leads created in the month.
    pub leads: usize,
    /// Of those, the ones now in the final stage.
    pub conversions: usize,
}

/// Leads created and converted per month over the last `months` months,
/// oldest first, ending with the month containing `now`.
#[must_use]
pub fn monthly_performance<Tz: TimeZone>(
    snapshot: &Snapshot,
    now: DateTime<Utc>,
    tz: &Tz,
    months: u32,
) -> Vec<MonthlyPerformance> {
    let final_stage = snapshot.final_stage().map(|s| s.id.as_str());

    let mut rows = Vec::new();
    let mut month = first_of_month(now.with_timezone(tz).date_naive());
    for _ in 0..months {
        rows.push(MonthlyPerformance {
            month,
            leads: 0,
            conversions: 0,
        });
        match month.checked_sub_months(Months::new(1)) {
            Some(previous) => month = previous,
            None => break,
        }
    }
    rows.reverse();

    for lead in &snapshot.leads {
        let created = first_of_month(lead.created_at.with_timezone(tz).date_naive());
        if let Some(row) = rows.iter_mut().find(|r| r.month == created) {
            row.leads += 1;
            if Some(lead.stage_id.as_str()) == final_stage {
                row.conversions += 1;
            }
        }
    }
    rows
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}
