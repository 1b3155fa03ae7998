//! What the screen shows for a given [`ViewState`].
//!
//! [`view_model`] derives plain data (group lines, summary cards, markers);
//! [`render`] lays it out as text for the terminal.

use std::fmt;

use crate::excerpt::excerpt;
use crate::models::GroupField;
use crate::state::ViewState;

pub const LOADING_TEXT: &str = "Loading...";
pub const EMPTY_SUMMARY_TEXT: &str = "No summary to display";
pub const SEARCH_PROMPT_TEXT: &str = "Submit a search to see groups.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupLine {
    pub key: String,
    pub doc_count: usize,
}

impl GroupLine {
    pub fn label(&self) -> String {
        format!("{} ({} docs)", self.key, self.doc_count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryCard {
    pub expanded: bool,
    /// Full text when expanded, excerpt otherwise.
    pub shown: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    pub group_field: GroupField,
    pub search_query: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
    /// `None` while the groups panel is hidden behind the search gate.
    pub groups: Option<Vec<GroupLine>>,
    pub selected_group: Option<String>,
    pub summary_count: Option<u64>,
    pub cards: Vec<SummaryCard>,
}

pub fn view_model(state: &ViewState) -> ViewModel {
    let groups: Option<Vec<GroupLine>> = if state.groups_visible() {
        Some(
            state
                .groups()
                .map(|g| {
                    g.iter()
                        .map(|group| GroupLine {
                            key: group.key.clone(),
                            doc_count: group.documents.len(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        )
    } else {
        None
    };

    let cards: Vec<SummaryCard> = state
        .summary()
        .map(|summary| {
            summary
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let expanded = state.is_expanded(i);
                    SummaryCard {
                        expanded,
                        shown: if expanded {
                            item.text.clone()
                        } else {
                            excerpt(Some(&item.text))
                        },
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    ViewModel {
        group_field: state.group_field(),
        search_query: state.search_query().map(str::to_string),
        loading: state.is_loading(),
        error: state.last_error().map(|e| e.to_string()),
        groups,
        selected_group: state.selected_group().map(str::to_string),
        summary_count: state.summary_count(),
        cards,
    }
}

pub fn render(state: &ViewState) -> String {
    view_model(state).to_string()
}

impl fmt::Display for ViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "News Dashboard")?;
        writeln!(
            f,
            "Group by: {} ({})",
            self.group_field.label(),
            self.group_field
        )?;
        if let Some(query) = &self.search_query {
            writeln!(f, "Search: {}", query)?;
        }
        if let Some(error) = &self.error {
            writeln!(f, "Error: {}", error)?;
        }

        writeln!(f)?;
        writeln!(f, "Groups")?;
        if self.loading {
            writeln!(f, "{}", LOADING_TEXT)?;
        }
        match &self.groups {
            None => writeln!(f, "{}", SEARCH_PROMPT_TEXT)?,
            Some(lines) => {
                for (i, line) in lines.iter().enumerate() {
                    writeln!(f, "{:>3}. {}", i + 1, line.label())?;
                }
            }
        }

        writeln!(f)?;
        match (&self.selected_group, self.summary_count) {
            (Some(group), Some(count)) => {
                writeln!(f, "Summary: {} ({} matching documents)", group, count)?
            }
            (Some(group), None) => writeln!(f, "Summary: {}", group)?,
            (None, Some(count)) => writeln!(f, "Summary ({} documents)", count)?,
            (None, None) => writeln!(f, "Summary")?,
        }
        if self.cards.is_empty() {
            writeln!(f, "{}", EMPTY_SUMMARY_TEXT)?;
        }
        for (i, card) in self.cards.iter().enumerate() {
            let marker = if card.expanded { "-" } else { "+" };
            writeln!(f, "{:>3}. [{}] {}", i + 1, marker, card.shown)?;
        }
        Ok(())
    }
}
