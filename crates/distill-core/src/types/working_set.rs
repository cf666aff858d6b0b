//! Ordered working set of summary items.

use derive_more::{Deref, IntoIterator};
use serde::{Deserialize, Serialize};

use super::SummaryItem;

/// The evolving, ordered collection of items being reduced toward the budget.
///
/// A working set is replaced wholesale at round boundaries and never mutated
/// in place by worker tasks.
#[derive(Debug, Clone, Default, PartialEq, Deref, IntoIterator, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkingSet {
    #[into_iterator(owned, ref)]
    items: Vec<SummaryItem>,
}

impl WorkingSet {
    /// Creates a working set from ordered items.
    pub fn new(items: Vec<SummaryItem>) -> Self {
        Self { items }
    }

    /// Returns the items in order.
    pub fn items(&self) -> &[SummaryItem] {
        &self.items
    }

    /// Consumes the set and returns its items.
    pub fn into_items(self) -> Vec<SummaryItem> {
        self.items
    }
}

impl From<Vec<SummaryItem>> for WorkingSet {
    fn from(items: Vec<SummaryItem>) -> Self {
        Self::new(items)
    }
}

impl FromIterator<SummaryItem> for WorkingSet {
    fn from_iter<T: IntoIterator<Item = SummaryItem>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
