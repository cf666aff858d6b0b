//! Greedy, order-preserving batch splitting.

use crate::types::SummaryItem;

/// A run of consecutive items whose total weight is at or under budget,
/// or a single item that alone exceeds it.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch<T = SummaryItem> {
    items: Vec<T>,
    weights: Vec<u64>,
}

impl<T> Batch<T> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            weights: Vec::new(),
        }
    }

    fn push(&mut self, item: T, weight: u64) {
        self.items.push(item);
        self.weights.push(weight);
    }

    /// Returns the items in input order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Returns the per-item weights in input order.
    pub fn weights(&self) -> &[u64] {
        &self.weights
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the batch is empty. Split batches never are.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the total weight of the batch.
    pub fn weight(&self) -> u64 {
        self.weights.iter().sum()
    }

    /// Returns true if the batch holds exactly one item.
    pub fn is_singleton(&self) -> bool {
        self.items.len() == 1
    }

    /// Returns true if the batch is a single item heavier than the budget.
    pub fn is_oversized(&self, budget: u64) -> bool {
        self.is_singleton() && self.weight() > budget
    }
}

/// Partitions weighted items into consecutive batches.
///
/// Items are accumulated in input order; when adding the next item would push
/// the running total over `budget`, the current batch is closed and the item
/// starts a new one. A single item is never split, so an item heavier than the
/// budget ends up alone in an oversized batch.
pub fn split_batches<T, I>(items: I, budget: u64) -> Vec<Batch<T>>
where
    I: IntoIterator<Item = (T, u64)>,
{
    let mut batches = Vec::new();
    let mut current = Batch::new();
    let mut running = 0u64;

    for (item, weight) in items {
        if !current.is_empty() && running.saturating_add(weight) > budget {
            batches.push(std::mem::replace(&mut current, Batch::new()));
            running = 0;
        }
        running = running.saturating_add(weight);
        current.push(item, weight);
    }

    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(batches: &[Batch<&'static str>]) -> Vec<Vec<&'static str>> {
        batches.iter().map(|b| b.items().to_vec()).collect()
    }

    #[test]
    fn test_split_greedy_in_order() {
        let items = [("a", 10), ("b", 10), ("c", 10), ("d", 10)];
        let batches = split_batches(items, 25);
        assert_eq!(labels(&batches), vec![vec!["a", "b"], vec!["c", "d"]]);
        assert!(batches.iter().all(|b| b.weight() <= 25));
    }

    #[test]
    fn test_split_exact_budget_fits() {
        let batches = split_batches([("a", 5), ("b", 20), ("c", 1)], 25);
        assert_eq!(labels(&batches), vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn test_oversized_item_is_isolated() {
        let batches = split_batches([("a", 5), ("big", 40), ("b", 5), ("c", 5)], 25);
        assert_eq!(labels(&batches), vec![vec!["a"], vec!["big"], vec!["b", "c"]]);
        assert!(batches[1].is_oversized(25));
        assert!(!batches[0].is_oversized(25));
    }

    #[test]
    fn test_leading_oversized_item() {
        let batches = split_batches([("big", 40), ("a", 1)], 25);
        assert_eq!(labels(&batches), vec![vec!["big"], vec!["a"]]);
    }

    #[test]
    fn test_budget_invariant_and_order() {
        let weights = [3u64, 9, 14, 1, 7, 22, 30, 2, 2, 11, 6, 18];
        let items: Vec<_> = weights.iter().copied().enumerate().collect();
        let batches = split_batches(items, 20);

        let flattened: Vec<usize> = batches.iter().flat_map(|b| b.items().to_vec()).collect();
        assert_eq!(flattened, (0..weights.len()).collect::<Vec<_>>());

        for batch in &batches {
            assert!(!batch.is_empty());
            assert!(batch.weight() <= 20 || batch.is_oversized(20));
        }
    }

    #[test]
    fn test_empty_input() {
        let batches = split_batches(Vec::<(u8, u64)>::new(), 10);
        assert!(batches.is_empty());
    }
}
