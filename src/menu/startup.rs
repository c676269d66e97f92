use crate::error::AppError;
use crate::storage::Database;

use super::source::MenuSource;

/// Phases of the once-per-session menu population.
///
/// `Uninitialized -> TableReady -> (Empty -> Populating -> Populated | Failed) | NonEmpty`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupState {
    Uninitialized,
    TableReady,
    Empty,
    Populating,
    Populated,
    NonEmpty,
    Failed,
}

impl StartupState {
    /// `Populated` and `NonEmpty` both feed the first render.
    pub fn is_ready(self) -> bool {
        matches!(self, StartupState::Populated | StartupState::NonEmpty)
    }
}

/// How the menu became available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupOutcome {
    /// Rows were already cached; the remote source was not contacted
    AlreadyPopulated,
    /// The remote menu was fetched and `count` rows stored
    Populated { count: usize },
}

/// Drives the menu store from unopened to ready, fetching the remote menu
/// only when the cache is empty.
#[derive(Debug)]
pub struct StartupSequence {
    state: StartupState,
}

impl Default for StartupSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl StartupSequence {
    pub fn new() -> Self {
        Self {
            state: StartupState::Uninitialized,
        }
    }

    pub fn state(&self) -> StartupState {
        self.state
    }

    fn transition(&mut self, next: StartupState) {
        tracing::debug!(from = ?self.state, to = ?next, "Startup transition");
        self.state = next;
    }

    /// Run the sequence against `db`.
    ///
    /// # Errors
    ///
    /// - [`AppError::StorageUnavailable`] if the table cannot be created
    /// - [`AppError::Network`] / [`AppError::Parse`] if the remote fetch fails
    /// - [`AppError::StorageWrite`] if the bulk insert fails
    ///
    /// On any failure after `TableReady` the store is left empty.
    pub async fn run<S: MenuSource>(
        &mut self,
        db: &Database,
        source: &S,
    ) -> Result<StartupOutcome, AppError> {
        self.state = StartupState::Uninitialized;

        if let Err(e) = db.initialize().await {
            self.transition(StartupState::Failed);
            return Err(e.into());
        }
        self.transition(StartupState::TableReady);

        let empty = match db.is_empty().await {
            Ok(empty) => empty,
            Err(e) => {
                self.transition(StartupState::Failed);
                return Err(e.into());
            }
        };

        if !empty {
            self.transition(StartupState::NonEmpty);
            tracing::info!("Menu cache already populated, skipping remote fetch");
            return Ok(StartupOutcome::AlreadyPopulated);
        }

        self.transition(StartupState::Empty);
        self.transition(StartupState::Populating);

        let result = match source.fetch_menu().await {
            Ok(items) => db
                .bulk_insert(&items)
                .await
                .map(|()| items.len())
                .map_err(AppError::from),
            Err(e) => Err(AppError::from(e)),
        };

        match result {
            Ok(count) => {
                self.transition(StartupState::Populated);
                tracing::info!(count = count, "Menu cache populated from remote source");
                Ok(StartupOutcome::Populated { count })
            }
            Err(e) => {
                self.transition(StartupState::Failed);
                tracing::warn!(error = %e, "Menu population failed");
                Err(e)
            }
        }
    }
}
