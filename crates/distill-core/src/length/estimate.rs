//! Local, deterministic length oracles.

use std::num::NonZeroU32;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::LengthOracle;
use crate::Result;

/// Default number of characters per token.
pub const DEFAULT_CHARS_PER_TOKEN: u32 = 4;

/// Token count estimate based on character count.
///
/// Counts Unicode scalar values and divides by `chars_per_token`, rounding
/// up so that any non-empty text weighs at least one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEstimate {
    chars_per_token: NonZeroU32,
}

impl TokenEstimate {
    /// Creates an estimator with a custom ratio.
    pub fn new(chars_per_token: NonZeroU32) -> Self {
        Self { chars_per_token }
    }

    /// Returns the configured ratio.
    pub fn chars_per_token(&self) -> NonZeroU32 {
        self.chars_per_token
    }

    /// Estimates synchronously.
    pub fn estimate(&self, text: &str) -> u64 {
        (text.chars().count() as u64).div_ceil(u64::from(self.chars_per_token.get()))
    }
}

impl Default for TokenEstimate {
    fn default() -> Self {
        Self::new(NonZeroU32::new(DEFAULT_CHARS_PER_TOKEN).unwrap_or(NonZeroU32::MIN))
    }
}

#[async_trait]
impl LengthOracle for TokenEstimate {
    async fn weigh(&self, text: &str) -> Result<u64> {
        Ok(self.estimate(text))
    }
}

/// Counts whitespace-separated words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount;

#[async_trait]
impl LengthOracle for WordCount {
    async fn weigh(&self, text: &str) -> Result<u64> {
        Ok(text.split_whitespace().count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SummaryItem;

    #[test]
    fn test_estimate_rounds_up() {
        let oracle = TokenEstimate::default();
        assert_eq!(oracle.estimate(""), 0);
        assert_eq!(oracle.estimate("hello"), 2);
        assert_eq!(oracle.estimate("abcd"), 1);
        assert_eq!(oracle.estimate("héllo wörld"), 3);
    }

    #[tokio::test]
    async fn test_weight_is_additive() {
        let oracle = WordCount;
        let a = vec![SummaryItem::new("one two three"), SummaryItem::new("four")];
        let b = vec![SummaryItem::new("five six")];
        let union: Vec<_> = a.iter().chain(b.iter()).cloned().collect();

        let total = oracle.weigh_total(&union).await.unwrap();
        let parts = oracle.weigh_total(&a).await.unwrap() + oracle.weigh_total(&b).await.unwrap();
        assert_eq!(total, parts);
        assert_eq!(total, 6);
    }

    #[tokio::test]
    async fn test_token_estimate_is_additive() {
        let oracle = TokenEstimate::default();
        let items = vec![SummaryItem::new("abcde"), SummaryItem::new("fgh")];
        let weights = oracle.weigh_items(&items).await.unwrap();
        assert_eq!(weights, vec![2, 1]);
        assert_eq!(oracle.weigh_total(&items).await.unwrap(), 3);
    }
}
