//! The pipeline board.
//!
//! One column per stage in pipeline order, each listing its leads a page at
//! a time.

use std::collections::HashMap;

use serde::Serialize;

use crate::kanban::Snapshot;
use crate::model::{Lead, Stage};

/// How many leads each column shows.
///
/// Every column starts with one page; [`Paging::load_more`] adds another to
/// a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paging {
    page_size: usize,
    pages: HashMap<String, usize>,
}

impl Paging {
    /// Paging with the given page size (at least 1).
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            pages: HashMap::new(),
        }
    }

    /// Show one more page in a column.
    pub fn load_more(&mut self, stage_id: &str) {
        *self.pages.entry(stage_id.to_string()).or_insert(1) += 1;
    }

    /// Show every lead in every column.
    pub fn show_all(&mut self) {
        self.page_size = usize::MAX;
    }

    /// Number of leads a column may show.
    #[must_use]
    pub fn visible(&self, stage_id: &str) -> usize {
        let pages = self.pages.get(stage_id).copied().unwrap_or(1);
        self.page_size.saturating_mul(pages)
    }
}

impl Default for Paging {
    fn default() -> Self {
        Self::new(10)
    }
}

/// One stage column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardColumn<'a> {
    /// The stage.
    pub stage: &'a Stage,
    /// Leads shown in the column.
    pub leads: Vec<&'a Lead>,
    /// Leads in the stage that pass the filter.
    pub total: usize,
    /// Leads left for "load more".
    pub hidden: usize,
}

impl BoardColumn<'_> {
    /// Whether more leads can be loaded.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.hidden > 0
    }
}

/// The whole board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardView<'a> {
    /// Columns in pipeline order.
    pub columns: Vec<BoardColumn<'a>>,
    /// The interest the leads are filtered on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_filter: Option<&'a str>,
    /// Leads on the board after filtering.
    pub total_leads: usize,
}

/// Build the board from a snapshot.
#[must_use]
pub fn board_view<'a>(
    snapshot: &'a Snapshot,
    interest_filter: Option<&'a str>,
    paging: &Paging,
) -> BoardView<'a> {
    let leads = filter_by_interest(&snapshot.leads, interest_filter);

    let mut stages: Vec<&Stage> = snapshot.stages.iter().collect();
    stages.sort_by_key(|s| s.order);

    let columns: Vec<BoardColumn<'a>> = stages
        .into_iter()
        .map(|stage| {
            let in_stage: Vec<&Lead> = leads
                .iter()
                .copied()
                .filter(|l| l.stage_id == stage.id)
                .collect();
            let total = in_stage.len();
            let shown: Vec<&Lead> = in_stage
                .into_iter()
                .take(paging.visible(&stage.id))
                .collect();
            BoardColumn {
                stage,
                hidden: total - shown.len(),
                leads: shown,
                total,
            }
        })
        .collect();

    BoardView {
        total_leads: columns.iter().map(|c| c.total).sum(),
        columns,
        interest_filter,
    }
}

/// Leads carrying an interest, or every lead when `interest_id` is `None`.
#[must_use]
pub fn filter_by_interest<'a>(leads: &'a [Lead], interest_id: Option<&str>) -> Vec<&'a Lead> {
    leads
        .iter()
        .filter(|l| interest_id.map_or(true, |id| l.interest_id.as_deref() == Some(id)))
        .collect()
}

/// Leads whose name contains `query`, ignoring case. A blank query matches
/// every lead.
#[must_use]
pub fn search_leads<'a>(leads: &'a [Lead], query: &str) -> Vec<&'a Lead> {
    leads.iter().filter(|l| matches_query(l, query)).collect()
}

/// Whether a lead's name contains `query`, ignoring case.
#[must_use]
pub fn matches_query(lead: &Lead, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    needle.is_empty() || lead.name.to_lowercase().contains(&needle)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn stage(id: &str, order: i64) -> Stage {
        Stage {
            id: id.to_string(),
            name: id.to_uppercase(),
            order,
            company_id: "cmp-1".to_string(),
            color: None,
            created_at: Utc::now(),
        }
    }

    fn lead(id: &str, name: &str, stage_id: &str, interest: Option<&str>) -> Lead {
        let ts = Utc::now();
        Lead {
            id: id.to_string(),
            name: name.to_string(),
            email: None,
            phone: None,
            company_id: "cmp-1".to_string(),
            stage_id: stage_id.to_string(),
            interest_id: interest.map(String::from),
            assigned_to: None,
            created_at: ts - Duration::minutes(1),
            updated_at: ts,
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            stages: vec![stage("won", 2), stage("new", 0), stage("call", 1)],
            leads: vec![
                lead("led-1", "Ana Souza", "new", Some("int-solar")),
                lead("led-2", "Bruno Lima", "new", None),
                lead("led-3", "Carla Dias", "call", Some("int-wind")),
                lead("led-4", "Diego Ana", "won", Some("int-solar")),
            ],
            ..Snapshot::default()
        }
    }

    #[test]
    fn test_columns_follow_stage_order() {
        let snapshot = snapshot();
        let view = board_view(&snapshot, None, &Paging::default());

        let ids: Vec<&str> = view.columns.iter().map(|c| c.stage.id.as_str()).collect();
        assert_eq!(ids, ["new", "call", "won"]);
        assert_eq!(view.columns[0].total, 2);
        assert_eq!(view.total_leads, 4);
    }

    #[test]
    fn test_board_respects_interest_filter() {
        let snapshot = snapshot();
        let view = board_view(&snapshot, Some("int-solar"), &Paging::default());

        let counts: Vec<usize> = view.columns.iter().map(|c| c.total).collect();
        assert_eq!(counts, [1, 0, 1]);
        assert_eq!(view.total_leads, 2);
        assert_eq!(view.interest_filter, Some("int-solar"));
    }

    #[test]
    fn test_paging_hides_and_loads_more() {
        let mut snapshot = snapshot();
        for i in 0..5 {
            snapshot
                .leads
                .push(lead(&format!("led-x{i}"), "Extra", "call", None));
        }

        let mut paging = Paging::new(2);
        let view = board_view(&snapshot, None, &paging);
        let call = &view.columns[1];
        assert_eq!(call.leads.len(), 2);
        assert_eq!(call.total, 6);
        assert_eq!(call.hidden, 4);
        assert!(call.has_more());

        paging.load_more("call");
        paging.load_more("call");
        let view = board_view(&snapshot, None, &paging);
        assert_eq!(view.columns[1].leads.len(), 6);
        assert!(!view.columns[1].has_more());
        assert_eq!(view.columns[0].leads.len(), 2);
    }

    #[test]
    fn test_paging_show_all() {
        let mut paging = Paging::new(1);
        paging.load_more("new");
        paging.show_all();
        assert_eq!(paging.visible("new"), usize::MAX);
        assert_eq!(Paging::new(0).visible("x"), 1);
    }

    #[test]
    fn test_filter_by_interest() {
        let snapshot = snapshot();
        assert_eq!(filter_by_interest(&snapshot.leads, None).len(), 4);
        assert_eq!(filter_by_interest(&snapshot.leads, Some("int-wind")).len(), 1);
        assert!(filter_by_interest(&snapshot.leads, Some("int-none")).is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let snapshot = snapshot();
        let names: Vec<&str> = search_leads(&snapshot.leads, "ANA")
            .iter()
            .map(|l| l.name.as_str())
            .collect();
        assert_eq!(names, ["Ana Souza", "Diego Ana"]);
        assert_eq!(search_leads(&snapshot.leads, "  ").len(), 4);
        assert!(search_leads(&snapshot.leads, "zzz").is_empty());
    }

    #[test]
    fn test_matches_query_trims() {
        let lead = lead("led-1", "Carla Dias", "new", None);
        assert!(matches_query(&lead, "  dias "));
        assert!(!matches_query(&lead, "diaz"));
    }
}
