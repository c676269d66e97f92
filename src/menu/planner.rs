use std::collections::{BTreeSet, HashMap};

use crate::storage::{Database, DatabaseError, MenuItem};

/// Categories the filter bar and section list know about, in display order.
pub const DEFAULT_CATEGORIES: [&str; 3] = ["starters", "mains", "desserts"];

pub fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

// ============================================================================
// Filter selection
// ============================================================================

/// One toggle per known category, parallel to the category list.
///
/// All toggles off means "no restriction", not "match nothing".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection(Vec<bool>);

impl FilterSelection {
    /// All toggles off.
    pub fn cleared(len: usize) -> Self {
        Self(vec![false; len])
    }

    /// A copy with the toggle at `index` flipped. Out-of-range indexes
    /// return an unchanged copy.
    pub fn toggled(&self, index: usize) -> Self {
        let mut next = self.0.clone();
        if let Some(flag) = next.get_mut(index) {
            *flag = !*flag;
        }
        Self(next)
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    pub fn none_active(&self) -> bool {
        self.0.iter().all(|active| !active)
    }
}

impl From<Vec<bool>> for FilterSelection {
    fn from(flags: Vec<bool>) -> Self {
        Self(flags)
    }
}

/// Resolve toggles into the set of categories a query should match.
///
/// If every toggle is off, every category in `all_categories` is active.
/// Otherwise exactly the categories whose toggle is on. Toggles past the end
/// of `all_categories` are ignored.
pub fn resolve_active_categories(
    selections: &FilterSelection,
    all_categories: &[String],
) -> BTreeSet<String> {
    if selections.none_active() {
        return all_categories.iter().cloned().collect();
    }

    all_categories
        .iter()
        .enumerate()
        .filter(|(index, _)| selections.is_active(*index))
        .map(|(_, category)| category.clone())
        .collect()
}

// ============================================================================
// Query state
// ============================================================================

/// Immutable snapshot of the search bar and filter toggles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    pub search_text: String,
    pub selections: FilterSelection,
}

impl QueryState {
    pub fn new(category_count: usize) -> Self {
        Self {
            search_text: String::new(),
            selections: FilterSelection::cleared(category_count),
        }
    }

    pub fn with_search_text(&self, text: impl Into<String>) -> Self {
        Self {
            search_text: text.into(),
            selections: self.selections.clone(),
        }
    }

    pub fn with_toggled(&self, index: usize) -> Self {
        Self {
            search_text: self.search_text.clone(),
            selections: self.selections.toggled(index),
        }
    }
}

/// Resolve the toggles and run the combined store query.
pub async fn run_query(
    db: &Database,
    state: &QueryState,
    all_categories: &[String],
) -> Result<Vec<MenuItem>, DatabaseError> {
    let active = resolve_active_categories(&state.selections, all_categories);
    db.query_menu(&state.search_text, &active).await
}

// ============================================================================
// Sections
// ============================================================================

/// A category-grouped bucket of items for list display.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub data: Vec<MenuItem>,
}

impl Section {
    /// Title with its first letter capitalised ("starters" -> "Starters").
    pub fn display_title(&self) -> String {
        let mut chars = self.title.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// Partition `items` into sections following `category_order`.
///
/// Categories without items are omitted, items keep their relative input
/// order, and categories absent from `category_order` are dropped.
pub fn group_by_category(items: Vec<MenuItem>, category_order: &[String]) -> Vec<Section> {
    let mut buckets: HashMap<String, Vec<MenuItem>> = HashMap::new();
    for item in items {
        buckets.entry(item.category.clone()).or_default().push(item);
    }

    let sections: Vec<Section> = category_order
        .iter()
        .filter_map(|category| {
            buckets.remove(category).map(|data| Section {
                title: category.clone(),
                data,
            })
        })
        .collect();

    if !buckets.is_empty() {
        tracing::debug!(
            dropped = ?buckets.keys().collect::<Vec<_>>(),
            "Items in unknown categories left out of sections"
        );
    }

    sections
}
