//! View state machine.
//!
//! [`ViewState`] owns everything the screen is derived from: the selected
//! group field, the last grouping and summary, per-card expansion, the shared
//! loading flag and the last fetch error. The orchestrator never holds any of
//! this itself; it asks for a ticket before a request and hands the result
//! back with that ticket when the request settles.
//!
//! # Phases
//!
//! ```text
//!  Idle ──submit──▶ GroupsLoading ──▶ GroupsReady ──select──▶ SummaryLoading ──▶ SummaryReady
//!                        ▲                 │                        ▲                  │
//!                        └──field change───┘                        └──select again────┘
//! ```
//!
//! There is no terminal phase. [`ViewState::phase`] derives the current one
//! from the in-flight counters and held results.
//!
//! # Tickets
//!
//! Every request is stamped with a generation number. A ticket is consumed
//! when its result is handed back, so each request decrements the in-flight
//! count exactly once. With `discard_stale_responses` enabled, a result
//! whose generation is older than the newest request of the same kind is
//! dropped instead of installed.

use std::collections::HashSet;

use crate::backend::{SummaryPayload, SummaryScope};
use crate::config::ViewConfig;
use crate::error::{ErrorKind, FetchError};
use crate::models::{GroupField, GroupingResult, ItemKey, SummaryResult};

/// Issued by [`ViewState::begin_groups_fetch`]; redeemed by
/// [`ViewState::finish_groups`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a ticket must be handed back or the loading flag stays set"]
pub struct GroupsTicket {
    generation: u64,
}

/// Issued by [`ViewState::begin_summary_fetch`]; redeemed by
/// [`ViewState::finish_summary`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a ticket must be handed back or the loading flag stays set"]
pub struct SummaryTicket {
    generation: u64,
    /// Group the request was scoped to; `None` for an unscoped summary.
    group: Option<String>,
}

impl GroupsTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl SummaryTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What happened to a settled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The new value replaced the held one.
    Installed,
    /// The request failed; the held value is unchanged.
    Failed(ErrorKind),
    /// A newer request of the same kind was issued; the response was dropped.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    GroupsLoading,
    GroupsReady,
    SummaryLoading,
    SummaryReady,
}

#[derive(Debug, Clone)]
pub struct ViewState {
    group_field: GroupField,
    require_search: bool,
    discard_stale: bool,

    search_query: Option<String>,
    search_submitted: bool,

    groups: Option<GroupingResult>,
    summary: Option<SummaryResult>,
    summary_count: Option<u64>,
    /// Group whose summary is installed, not the last one clicked.
    selected_group: Option<String>,
    expanded: HashSet<ItemKey>,
    last_error: Option<ErrorKind>,

    groups_in_flight: usize,
    summary_in_flight: usize,
    groups_generation: u64,
    summary_generation: u64,
}

impl ViewState {
    pub fn new(config: &ViewConfig) -> Self {
        Self {
            group_field: config.default_group_field,
            require_search: config.require_search,
            discard_stale: config.discard_stale_responses,
            search_query: None,
            search_submitted: false,
            groups: None,
            summary: None,
            summary_count: None,
            selected_group: None,
            expanded: HashSet::new(),
            last_error: None,
            groups_in_flight: 0,
            summary_in_flight: 0,
            groups_generation: 0,
            summary_generation: 0,
        }
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn group_field(&self) -> GroupField {
        self.group_field
    }

    pub fn search_query(&self) -> Option<&str> {
        self.search_query.as_deref()
    }

    pub fn search_submitted(&self) -> bool {
        self.search_submitted
    }

    pub fn groups(&self) -> Option<&GroupingResult> {
        self.groups.as_ref()
    }

    pub fn summary(&self) -> Option<&SummaryResult> {
        self.summary.as_ref()
    }

    pub fn summary_count(&self) -> Option<u64> {
        self.summary_count
    }

    pub fn selected_group(&self) -> Option<&str> {
        self.selected_group.as_deref()
    }

    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    /// The shared loading flag: true while any request of either kind is
    /// outstanding.
    pub fn is_loading(&self) -> bool {
        self.groups_in_flight + self.summary_in_flight > 0
    }

    pub fn in_flight(&self) -> usize {
        self.groups_in_flight + self.summary_in_flight
    }

    /// Whether the groups panel is shown at all.
    pub fn groups_visible(&self) -> bool {
        !self.require_search || self.search_submitted
    }

    pub fn phase(&self) -> Phase {
        if !self.groups_visible() {
            return Phase::Idle;
        }
        if self.summary_in_flight > 0 {
            Phase::SummaryLoading
        } else if self.groups_in_flight > 0 {
            Phase::GroupsLoading
        } else if self.summary.is_some() {
            Phase::SummaryReady
        } else if self.groups.is_some() {
            Phase::GroupsReady
        } else {
            Phase::Idle
        }
    }

    // ── User transitions ───────────────────────────────────────────────

    /// Grouping to fetch when the view first appears. Only the ungated
    /// view fetches before a search is submitted.
    pub fn initial_fetch(&self) -> Option<GroupField> {
        if self.require_search {
            None
        } else {
            Some(self.group_field)
        }
    }

    /// Record a search phrase and open the groups panel.
    ///
    /// Returns the field whose grouping should be fetched. A blank phrase is
    /// ignored. The phrase itself is never sent to the backend.
    pub fn submit_search(&mut self, query: &str) -> Option<GroupField> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        self.search_query = Some(query.to_string());
        self.search_submitted = true;
        Some(self.group_field)
    }

    /// Switch the grouping attribute.
    ///
    /// Returns the field to refetch when the groups panel is visible and the
    /// field actually changed. Held groups and summary are left in place
    /// until the refetch replaces them.
    pub fn change_group_field(&mut self, field: GroupField) -> Option<GroupField> {
        if field == self.group_field {
            return None;
        }
        self.group_field = field;
        if self.groups_visible() {
            Some(field)
        } else {
            None
        }
    }

    /// Scope for a click on group `key`, or `None` for an empty key.
    ///
    /// The selection only changes once the summary for it is installed, so
    /// the header always names the group the cards belong to.
    pub fn select_group(&self, key: &str) -> Option<SummaryScope> {
        SummaryScope::new(self.group_field, key)
    }

    /// Flip the expansion of the card at `index`. Returns the new state, or
    /// `None` when there is no such card.
    pub fn toggle_expansion(&mut self, index: usize) -> Option<bool> {
        let key = self.summary.as_ref()?.get(index)?.key.clone();
        if self.expanded.remove(&key) {
            Some(false)
        } else {
            self.expanded.insert(key);
            Some(true)
        }
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.summary
            .as_ref()
            .and_then(|s| s.get(index))
            .map(|item| self.expanded.contains(&item.key))
            .unwrap_or(false)
    }

    // ── Fetch bookkeeping ──────────────────────────────────────────────

    pub fn begin_groups_fetch(&mut self) -> GroupsTicket {
        self.groups_generation += 1;
        self.groups_in_flight += 1;
        GroupsTicket {
            generation: self.groups_generation,
        }
    }

    pub fn begin_summary_fetch(&mut self, scope: Option<&SummaryScope>) -> SummaryTicket {
        self.summary_generation += 1;
        self.summary_in_flight += 1;
        SummaryTicket {
            generation: self.summary_generation,
            group: scope.map(|s| s.value.clone()),
        }
    }

    pub fn finish_groups(
        &mut self,
        ticket: GroupsTicket,
        result: Result<GroupingResult, FetchError>,
    ) -> Applied {
        self.groups_in_flight = self.groups_in_flight.saturating_sub(1);

        if self.discard_stale && ticket.generation != self.groups_generation {
            return Applied::Stale;
        }

        match result {
            Ok(groups) => {
                self.groups = Some(groups);
                self.last_error = None;
                Applied::Installed
            }
            Err(e) => {
                let kind = e.kind();
                self.last_error = Some(kind);
                Applied::Failed(kind)
            }
        }
    }

    pub fn finish_summary(
        &mut self,
        ticket: SummaryTicket,
        result: Result<SummaryPayload, FetchError>,
    ) -> Applied {
        self.summary_in_flight = self.summary_in_flight.saturating_sub(1);

        if self.discard_stale && ticket.generation != self.summary_generation {
            return Applied::Stale;
        }

        match result {
            Ok(payload) => {
                let summary = SummaryResult::from_texts(payload.summary);
                // Expansion follows content; drop keys that no longer exist.
                self.expanded.retain(|key| summary.contains_key(key));
                self.summary = Some(summary);
                self.summary_count = payload.count;
                self.selected_group = ticket.group;
                self.last_error = None;
                Applied::Installed
            }
            Err(e) => {
                let kind = e.kind();
                self.last_error = Some(kind);
                Applied::Failed(kind)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentId, Group};

    fn gated() -> ViewState {
        ViewState::new(&ViewConfig::default())
    }

    fn ungated() -> ViewState {
        ViewState::new(&ViewConfig {
            require_search: false,
            ..ViewConfig::default()
        })
    }

    fn grouping(keys: &[(&str, usize)]) -> GroupingResult {
        GroupingResult::new(
            keys.iter()
                .map(|(k, n)| Group {
                    key: k.to_string(),
                    documents: (0..*n as i64).map(DocumentId::Number).collect(),
                })
                .collect(),
        )
    }

    fn payload(texts: &[&str]) -> SummaryPayload {
        SummaryPayload {
            summary: texts.iter().map(|t| t.to_string()).collect(),
            count: None,
        }
    }

    fn server_error() -> FetchError {
        FetchError::HttpStatus {
            status: 500,
            body: "boom".into(),
        }
    }

    #[test]
    fn test_gated_starts_idle() {
        let state = gated();
        assert_eq!(state.phase(), Phase::Idle);
        assert!(!state.groups_visible());
        assert_eq!(state.initial_fetch(), None);
    }

    #[test]
    fn test_ungated_fetches_on_start() {
        let state = ungated();
        assert!(state.groups_visible());
        assert_eq!(state.initial_fetch(), Some(GroupField::Source));
    }

    #[test]
    fn test_submit_search_opens_groups() {
        let mut state = gated();
        assert_eq!(state.submit_search("  "), None);
        assert!(!state.search_submitted());

        assert_eq!(state.submit_search(" ai research "), Some(GroupField::Source));
        assert_eq!(state.search_query(), Some("ai research"));
        assert!(state.groups_visible());
    }

    #[test]
    fn test_field_change_refetch_rule() {
        let mut state = gated();
        // Hidden panel: no refetch.
        assert_eq!(state.change_group_field(GroupField::PublishedAt), None);
        assert_eq!(state.group_field(), GroupField::PublishedAt);

        state.submit_search("news");
        assert_eq!(state.change_group_field(GroupField::PublishedAt), None);
        assert_eq!(
            state.change_group_field(GroupField::Unknown),
            Some(GroupField::Unknown)
        );
    }

    #[test]
    fn test_groups_fetch_lifecycle() {
        let mut state = gated();
        state.submit_search("news");

        let ticket = state.begin_groups_fetch();
        assert!(state.is_loading());
        assert_eq!(state.phase(), Phase::GroupsLoading);

        let applied = state.finish_groups(ticket, Ok(grouping(&[("Reuters", 2), ("AP", 1)])));
        assert_eq!(applied, Applied::Installed);
        assert!(!state.is_loading());
        assert_eq!(state.phase(), Phase::GroupsReady);
        assert_eq!(state.groups().unwrap().len(), 2);
    }

    #[test]
    fn test_failed_groups_fetch_keeps_previous() {
        let mut state = ungated();
        let t = state.begin_groups_fetch();
        state.finish_groups(t, Ok(grouping(&[("AP", 1)])));

        let t = state.begin_groups_fetch();
        let applied = state.finish_groups(t, Err(server_error()));
        assert_eq!(applied, Applied::Failed(ErrorKind::HttpStatus(500)));
        assert!(!state.is_loading());
        assert_eq!(state.groups().unwrap().nth(0).unwrap().key, "AP");
        assert_eq!(state.last_error(), Some(ErrorKind::HttpStatus(500)));

        let t = state.begin_groups_fetch();
        state.finish_groups(t, Ok(grouping(&[("BBC", 3)])));
        assert_eq!(state.last_error(), None);
    }

    #[test]
    fn test_loading_flag_shared_across_kinds() {
        let mut state = ungated();
        let g = state.begin_groups_fetch();
        let s = state.begin_summary_fetch(None);
        assert_eq!(state.in_flight(), 2);

        state.finish_groups(g, Ok(grouping(&[])));
        assert!(state.is_loading());
        assert_eq!(state.phase(), Phase::SummaryLoading);

        state.finish_summary(s, Err(FetchError::Transport("reset".into())));
        assert!(!state.is_loading());
    }

    #[test]
    fn test_stale_summary_discarded() {
        let mut state = ungated();
        let a = state.select_group("A");
        let first = state.begin_summary_fetch(a.as_ref());
        let b = state.select_group("B");
        let second = state.begin_summary_fetch(b.as_ref());

        assert_eq!(state.finish_summary(second, Ok(payload(&["B."]))), Applied::Installed);
        assert_eq!(state.finish_summary(first, Ok(payload(&["A."]))), Applied::Stale);
        assert_eq!(state.summary().unwrap().get(0).unwrap().text, "B.");
        assert_eq!(state.selected_group(), Some("B"));
        assert!(!state.is_loading());
    }

    #[test]
    fn test_stale_failure_does_not_set_error() {
        let mut state = ungated();
        let first = state.begin_groups_fetch();
        let second = state.begin_groups_fetch();
        state.finish_groups(second, Ok(grouping(&[("AP", 1)])));
        assert_eq!(state.finish_groups(first, Err(server_error())), Applied::Stale);
        assert_eq!(state.last_error(), None);
    }

    #[test]
    fn test_last_settled_wins_when_not_discarding() {
        let mut state = ViewState::new(&ViewConfig {
            require_search: false,
            discard_stale_responses: false,
            ..ViewConfig::default()
        });
        let first = state.begin_summary_fetch(None);
        let second = state.begin_summary_fetch(None);
        state.finish_summary(second, Ok(payload(&["B."])));
        assert_eq!(state.finish_summary(first, Ok(payload(&["A."]))), Applied::Installed);
        assert_eq!(state.summary().unwrap().get(0).unwrap().text, "A.");
    }

    #[test]
    fn test_toggle_expansion_is_per_card_and_reversible() {
        let mut state = ungated();
        let t = state.begin_summary_fetch(None);
        state.finish_summary(t, Ok(payload(&["Point one.", "Point two."])));

        assert!(!state.is_expanded(0));
        assert_eq!(state.toggle_expansion(0), Some(true));
        assert!(state.is_expanded(0));
        assert!(!state.is_expanded(1));
        assert_eq!(state.toggle_expansion(0), Some(false));
        assert!(!state.is_expanded(0));
        assert_eq!(state.toggle_expansion(5), None);
    }

    #[test]
    fn test_toggle_without_summary() {
        let mut state = ungated();
        assert_eq!(state.toggle_expansion(0), None);
        assert!(!state.is_expanded(0));
    }

    #[test]
    fn test_expansion_follows_content_across_refetch() {
        let mut state = ungated();
        let t = state.begin_summary_fetch(None);
        state.finish_summary(t, Ok(payload(&["One.", "Two."])));
        state.toggle_expansion(0);

        let t = state.begin_summary_fetch(None);
        state.finish_summary(t, Ok(payload(&["Two.", "One.", "Three."])));
        assert!(!state.is_expanded(0));
        assert!(state.is_expanded(1));
        assert!(!state.is_expanded(2));

        let t = state.begin_summary_fetch(None);
        state.finish_summary(t, Ok(payload(&["Four."])));
        let t = state.begin_summary_fetch(None);
        state.finish_summary(t, Ok(payload(&["One."])));
        assert!(!state.is_expanded(0), "pruned key must not come back");
    }

    #[test]
    fn test_summary_count_recorded() {
        let mut state = ungated();
        let t = state.begin_summary_fetch(None);
        state.finish_summary(
            t,
            Ok(SummaryPayload {
                summary: vec!["a".into()],
                count: Some(12),
            }),
        );
        assert_eq!(state.summary_count(), Some(12));
        assert_eq!(state.phase(), Phase::SummaryReady);
    }

    fn select_and_begin(state: &mut ViewState, key: &str) -> SummaryTicket {
        let scope = state.select_group(key);
        state.begin_summary_fetch(scope.as_ref())
    }

    #[test]
    fn test_select_group_scopes_by_current_field() {
        let mut state = ungated();
        state.change_group_field(GroupField::PublishedAt);
        assert_eq!(
            state.select_group("2024-05-01"),
            SummaryScope::new(GroupField::PublishedAt, "2024-05-01")
        );
        assert_eq!(state.select_group(""), None);
        // Nothing is selected until a summary arrives.
        assert_eq!(state.selected_group(), None);
    }

    #[test]
    fn test_selection_follows_installed_summary() {
        let mut state = ungated();
        let t = select_and_begin(&mut state, "Reuters");
        assert_eq!(state.selected_group(), None);
        state.finish_summary(t, Ok(payload(&["Reuters point."])));
        assert_eq!(state.selected_group(), Some("Reuters"));

        let t = state.begin_summary_fetch(None);
        state.finish_summary(t, Ok(payload(&["Everything."])));
        assert_eq!(state.selected_group(), None);
    }

    #[test]
    fn test_failed_summary_fetch_keeps_previous() {
        let mut state = ungated();
        let t = select_and_begin(&mut state, "Reuters");
        state.finish_summary(
            t,
            Ok(SummaryPayload {
                summary: vec!["Reuters point.".into()],
                count: Some(2),
            }),
        );

        let t = select_and_begin(&mut state, "AP");
        let applied = state.finish_summary(t, Err(server_error()));
        assert_eq!(applied, Applied::Failed(ErrorKind::HttpStatus(500)));
        assert!(!state.is_loading());
        assert_eq!(state.last_error(), Some(ErrorKind::HttpStatus(500)));
        assert_eq!(state.summary().unwrap().get(0).unwrap().text, "Reuters point.");
        assert_eq!(state.summary_count(), Some(2));
        assert_eq!(state.selected_group(), Some("Reuters"));
    }

    #[test]
    fn test_last_settled_selection_matches_cards_when_not_discarding() {
        let mut state = ViewState::new(&ViewConfig {
            require_search: false,
            discard_stale_responses: false,
            ..ViewConfig::default()
        });
        let first = select_and_begin(&mut state, "A");
        let second = select_and_begin(&mut state, "B");
        state.finish_summary(second, Ok(payload(&["B."])));
        state.finish_summary(first, Ok(payload(&["A."])));
        assert_eq!(state.summary().unwrap().get(0).unwrap().text, "A.");
        assert_eq!(state.selected_group(), Some("A"));
    }
}
