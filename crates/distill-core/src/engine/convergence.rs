//! Convergence controller: collapse again or finalize.

use crate::{RunError, RunResult};

/// Routing decision taken after every gather or collapse round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The working set is over budget: run another collapse round.
    Collapse,
    /// The working set fits the budget: run the final reduce.
    Finalize,
}

/// Size of a working set at a round boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measure {
    /// Number of items.
    pub items: usize,
    /// Total weight.
    pub weight: u64,
}

impl Measure {
    /// Measures a working set from its per-item weights.
    pub fn of(weights: &[u64]) -> Self {
        Self {
            items: weights.len(),
            weight: weights.iter().sum(),
        }
    }
}

/// Decides between another collapse round and the final reduce, and turns
/// non-termination into a reportable failure.
#[derive(Debug, Clone, Copy)]
pub struct ConvergenceController {
    budget: u64,
    max_rounds: u32,
}

impl ConvergenceController {
    /// Creates a controller.
    pub fn new(budget: u64, max_rounds: u32) -> Self {
        Self { budget, max_rounds }
    }

    /// Pure routing decision on the current measure.
    pub fn decide(&self, measure: Measure) -> Decision {
        if measure.weight > self.budget {
            Decision::Collapse
        } else {
            Decision::Finalize
        }
    }

    /// Fails if `completed` rounds already exhaust the round limit.
    pub fn admit_round(&self, completed: u32, measure: Measure) -> RunResult<()> {
        if completed >= self.max_rounds {
            return Err(RunError::NonConvergence {
                rounds: completed,
                weight: measure.weight,
                budget: self.budget,
            });
        }
        Ok(())
    }

    /// Fails if a round reduced neither the item count nor the total weight.
    ///
    /// Re-applying collapse to such a set would repeat the same round forever.
    pub fn check_progress(&self, round: u32, before: Measure, after: Measure) -> RunResult<()> {
        if after.items >= before.items && after.weight >= before.weight {
            return Err(RunError::NonConvergence {
                rounds: round,
                weight: after.weight,
                budget: self.budget,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RunErrorKind;

    #[test]
    fn test_decide_against_budget() {
        let controller = ConvergenceController::new(25, 4);
        assert_eq!(controller.decide(Measure::of(&[10, 10, 10, 10])), Decision::Collapse);
        assert_eq!(controller.decide(Measure::of(&[10, 15])), Decision::Finalize);
        assert_eq!(controller.decide(Measure::of(&[5])), Decision::Finalize);
    }

    #[test]
    fn test_round_limit() {
        let controller = ConvergenceController::new(25, 2);
        let measure = Measure::of(&[30]);
        assert!(controller.admit_round(1, measure).is_ok());

        let error = controller.admit_round(2, measure).unwrap_err();
        assert_eq!(error.kind(), RunErrorKind::NonConvergence);
        assert_eq!(error.round(), Some(2));
    }

    #[test]
    fn test_progress() {
        let controller = ConvergenceController::new(25, 8);
        let before = Measure::of(&[20, 20]);
        assert!(controller.check_progress(1, before, Measure::of(&[10, 10])).is_ok());
        assert!(controller.check_progress(1, before, Measure::of(&[30])).is_ok());
        assert!(controller.check_progress(1, before, Measure::of(&[20, 20])).is_err());
    }
}
