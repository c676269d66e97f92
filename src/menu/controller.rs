use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

use crate::error::AppError;
use crate::storage::Database;

use super::debounce::Debouncer;
use super::planner::{group_by_category, run_query, QueryState, Section};

/// Results published to the display layer.
#[derive(Debug)]
pub enum MenuEvent {
    /// Replace the displayed list with these sections
    Sections(Vec<Section>),
    /// Show an alert; the previously displayed sections stay on screen
    QueryFailed(AppError),
}

/// Single state container for the menu screen.
///
/// Search text goes through a debouncer; filter toggles query immediately.
/// Every query runs against an immutable [`QueryState`] snapshot taken from
/// the watch channel at the moment it executes. There is no cancellation of
/// in-flight queries: whichever finishes last wins the display.
pub struct MenuController {
    db: Database,
    categories: Arc<[String]>,
    state_tx: Arc<watch::Sender<QueryState>>,
    event_tx: mpsc::Sender<MenuEvent>,
    search: Debouncer<String>,
}

impl MenuController {
    pub fn new(
        db: Database,
        categories: Vec<String>,
        debounce: Duration,
        event_tx: mpsc::Sender<MenuEvent>,
    ) -> Self {
        let categories: Arc<[String]> = categories.into();
        let (state_tx, _) = watch::channel(QueryState::new(categories.len()));
        let state_tx = Arc::new(state_tx);

        let search = {
            let db = db.clone();
            let categories = Arc::clone(&categories);
            let state_tx = Arc::clone(&state_tx);
            let event_tx = event_tx.clone();
            Debouncer::new(debounce, move |text: String| {
                let db = db.clone();
                let categories = Arc::clone(&categories);
                let state_tx = Arc::clone(&state_tx);
                let event_tx = event_tx.clone();
                async move {
                    state_tx.send_modify(|state| *state = state.with_search_text(text));
                    let snapshot = state_tx.borrow().clone();
                    execute(&db, &categories, &snapshot, &event_tx).await;
                }
            })
        };

        Self {
            db,
            categories,
            state_tx,
            event_tx,
            search,
        }
    }

    /// Current snapshot of search text and toggles.
    pub fn state(&self) -> QueryState {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState> {
        self.state_tx.subscribe()
    }

    /// Search bar keystroke. The query fires once typing pauses for the
    /// debounce window.
    pub fn on_search_text_changed(&mut self, text: impl Into<String>) {
        self.search.call(text.into());
    }

    /// Filter chip tapped. Not debounced.
    pub async fn on_filter_toggled(&self, index: usize) {
        if index >= self.categories.len() {
            tracing::warn!(index = index, "Ignoring toggle for unknown filter");
            return;
        }
        self.state_tx
            .send_modify(|state| *state = state.with_toggled(index));
        self.refresh().await;
    }

    /// Run the query for the current snapshot and publish the result.
    pub async fn refresh(&self) {
        let snapshot = self.state();
        execute(&self.db, &self.categories, &snapshot, &self.event_tx).await;
    }
}

async fn execute(
    db: &Database,
    categories: &[String],
    state: &QueryState,
    event_tx: &mpsc::Sender<MenuEvent>,
) {
    let event = match run_query(db, state, categories).await {
        Ok(items) => MenuEvent::Sections(group_by_category(items, categories)),
        Err(e) => {
            tracing::warn!(error = %e, search = %state.search_text, "Menu query failed");
            MenuEvent::QueryFailed(e.into())
        }
    };

    if let Err(e) = event_tx.send(event).await {
        tracing::warn!(error = %e, "Menu event channel closed (receiver dropped)");
    }
}
