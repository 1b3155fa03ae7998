//! Fetch orchestration.
//!
//! [`Orchestrator`] connects user actions to backend requests. Each request
//! follows the same protocol:
//!
//! 1. Take a ticket from the [`ViewState`] (sets the loading flag).
//! 2. Release the state lock and await the backend.
//! 3. Re-take the lock and hand the result back with the ticket (clears
//!    the loading flag, installs or drops the result).
//!
//! The state lock is never held across a network await, so overlapping
//! requests proceed independently. Whether an overtaken response may still
//! be installed is decided by the view state (`discard_stale_responses`).
//!
//! Failures are logged here and recorded as the view's last error; they are
//! never returned to the caller as `Err`.

use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info};

use crate::backend::{Backend, SummaryScope};
use crate::config::ViewConfig;
use crate::models::GroupField;
use crate::state::{Applied, ViewState};

#[derive(Clone)]
pub struct Orchestrator {
    backend: Arc<dyn Backend>,
    state: Arc<Mutex<ViewState>>,
    revision: Arc<watch::Sender<u64>>,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn Backend>, view: &ViewConfig) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            backend,
            state: Arc::new(Mutex::new(ViewState::new(view))),
            revision: Arc::new(revision),
        }
    }

    /// Copy of the current view state.
    pub async fn snapshot(&self) -> ViewState {
        self.state.lock().await.clone()
    }

    /// Receiver that observes a new revision after every state change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
    }

    // ── User entry points ──────────────────────────────────────────────

    /// Fetch the initial grouping when the view is not gated on a search.
    pub async fn start(&self) -> Option<Applied> {
        let field = self.state.lock().await.initial_fetch()?;
        Some(self.fetch_groups(field).await)
    }

    pub async fn submit_search(&self, query: &str) -> Option<Applied> {
        let field = self.state.lock().await.submit_search(query);
        self.bump();
        match field {
            Some(field) => Some(self.fetch_groups(field).await),
            None => None,
        }
    }

    pub async fn change_group_field(&self, field: GroupField) -> Option<Applied> {
        let refetch = self.state.lock().await.change_group_field(field);
        self.bump();
        match refetch {
            Some(field) => Some(self.fetch_groups(field).await),
            None => None,
        }
    }

    pub async fn select_group(&self, key: &str) -> Applied {
        let scope = self.state.lock().await.select_group(key);
        self.request_summary(scope).await
    }

    pub async fn toggle_expansion(&self, index: usize) -> Option<bool> {
        let expanded = self.state.lock().await.toggle_expansion(index);
        if expanded.is_some() {
            self.bump();
        }
        expanded
    }

    // ── Requests ───────────────────────────────────────────────────────

    /// Fetch the grouping for `field` and install it.
    pub async fn fetch_groups(&self, field: GroupField) -> Applied {
        let ticket = self.state.lock().await.begin_groups_fetch();
        let generation = ticket.generation();
        self.bump();

        info!(%field, generation, "fetching groups");
        let result = self.backend.group_by(field).await;
        if let Err(e) = &result {
            error!(%field, generation, error = %e, "error fetching or parsing groups");
        }

        let applied = self.state.lock().await.finish_groups(ticket, result);
        match applied {
            Applied::Installed => info!(%field, generation, "groups installed"),
            Applied::Stale => debug!(%field, generation, "discarding stale groups response"),
            Applied::Failed(_) => {}
        }
        self.bump();
        applied
    }

    /// Fetch a summary and install it.
    ///
    /// Scoped to `field = value` when both are present and `value` is
    /// non-empty; otherwise the backend's unscoped summary is requested.
    pub async fn fetch_summary(&self, field: Option<GroupField>, value: Option<&str>) -> Applied {
        let scope = match (field, value) {
            (Some(field), Some(value)) => SummaryScope::new(field, value),
            _ => None,
        };
        self.request_summary(scope).await
    }

    async fn request_summary(&self, scope: Option<SummaryScope>) -> Applied {
        let ticket = self.state.lock().await.begin_summary_fetch(scope.as_ref());
        let generation = ticket.generation();
        self.bump();

        info!(?scope, generation, "fetching summary");
        let result = self.backend.summarize(scope.as_ref()).await;
        match &result {
            Ok(payload) => debug!(generation, items = payload.summary.len(), "summary received"),
            Err(e) => error!(?scope, generation, error = %e, "error fetching or parsing summary"),
        }

        let applied = self.state.lock().await.finish_summary(ticket, result);
        if applied == Applied::Stale {
            debug!(?scope, generation, "discarding stale summary response");
        }
        self.bump();
        applied
    }
}
