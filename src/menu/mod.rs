//! Menu search/filter cache.
//!
//! This module holds everything between the remote menu and the section list:
//!
//! - **Source**: one-shot HTTP download and decoding of the menu document
//! - **Planner**: filter toggles, active-category resolution, grouping into sections
//! - **Debounce**: coalescing search-bar keystrokes into a single query
//! - **Startup**: populating the local store once per session when it is empty
//! - **Controller**: the state container that wires UI events to queries
//!
//! # Example
//!
//! ```ignore
//! use little_lemon::menu::{HttpMenuSource, StartupSequence, run_query, group_by_category};
//!
//! let mut startup = StartupSequence::new();
//! startup.run(&db, &source).await?;
//!
//! let items = run_query(&db, &state, &categories).await?;
//! let sections = group_by_category(items, &categories);
//! ```

mod controller;
mod debounce;
mod planner;
mod source;
mod startup;

pub use controller::{MenuController, MenuEvent};
pub use debounce::{Debouncer, DEFAULT_DEBOUNCE};
pub use planner::{
    default_categories, group_by_category, resolve_active_categories, run_query,
    FilterSelection, QueryState, Section, DEFAULT_CATEGORIES,
};
pub use source::{parse_menu, FetchError, HttpMenuSource, MenuSource};
pub use startup::{StartupOutcome, StartupSequence, StartupState};
