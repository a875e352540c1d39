//! Skip deciders: the pluggable source of a plan's external skip set.
//!
//! Any planner, heuristic or otherwise, feeds the workflow through
//! [`SkipDecider`]. The plan applies the result, so command-mode runs stay
//! unaffected whatever a decider returns.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use filing_core::domain::{RunOptions, StepName};

pub trait SkipDecider: Send {
    fn decide(&mut self, options: &RunOptions) -> BTreeSet<StepName>;
}

/// Never skips anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSkip;

impl SkipDecider for NoSkip {
    fn decide(&mut self, _options: &RunOptions) -> BTreeSet<StepName> {
        BTreeSet::new()
    }
}

/// Skips a fixed set, e.g. from `--skip validate,generate`.
#[derive(Debug, Clone, Default)]
pub struct FixedSkip {
    steps: BTreeSet<StepName>,
}

impl FixedSkip {
    pub fn new<I: IntoIterator<Item = StepName>>(steps: I) -> Self {
        Self {
            steps: steps.into_iter().collect(),
        }
    }
}

impl SkipDecider for FixedSkip {
    fn decide(&mut self, _options: &RunOptions) -> BTreeSet<StepName> {
        self.steps.clone()
    }
}

/// Per-step skip probabilities for [`ProbabilisticSkip`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkipProbabilities {
    pub validate: f64,
    pub generate: f64,
}

impl Default for SkipProbabilities {
    fn default() -> Self {
        Self {
            validate: 0.3,
            generate: 0.2,
        }
    }
}

impl SkipProbabilities {
    fn for_step(&self, step: StepName) -> f64 {
        match step {
            StepName::Validate => self.validate,
            StepName::Generate => self.generate,
            _ => 0.0,
        }
    }
}

/// Seeded random skipping of best-effort steps.
///
/// Identical seeds yield identical decision sequences.
#[derive(Debug, Clone)]
pub struct ProbabilisticSkip {
    rng: StdRng,
    probabilities: SkipProbabilities,
}

impl ProbabilisticSkip {
    pub fn new(seed: u64, probabilities: SkipProbabilities) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            probabilities,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(seed, SkipProbabilities::default())
    }
}

impl SkipDecider for ProbabilisticSkip {
    fn decide(&mut self, options: &RunOptions) -> BTreeSet<StepName> {
        let mut skipped = BTreeSet::new();
        if options.mode.is_strict() {
            return skipped;
        }
        for step in [StepName::Validate, StepName::Generate] {
            let roll: f64 = self.rng.random();
            if roll < self.probabilities.for_step(step) {
                skipped.insert(step);
            }
        }
        debug!(skipped = ?skipped, "Probabilistic skip decision");
        skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filing_core::domain::RunMode;

    fn lenient() -> RunOptions {
        RunOptions::new("MSFT", 2022, RunMode::Lenient)
    }

    #[test]
    fn test_same_seed_same_decisions() {
        let mut a = ProbabilisticSkip::with_seed(7);
        let mut b = ProbabilisticSkip::with_seed(7);
        for _ in 0..20 {
            assert_eq!(a.decide(&lenient()), b.decide(&lenient()));
        }
    }

    #[test]
    fn test_certain_probabilities() {
        let always = SkipProbabilities {
            validate: 1.0,
            generate: 1.0,
        };
        let mut decider = ProbabilisticSkip::new(1, always);
        assert_eq!(
            decider.decide(&lenient()),
            BTreeSet::from([StepName::Validate, StepName::Generate])
        );

        let never = SkipProbabilities {
            validate: 0.0,
            generate: 0.0,
        };
        let mut decider = ProbabilisticSkip::new(1, never);
        assert!(decider.decide(&lenient()).is_empty());
    }

    #[test]
    fn test_strict_mode_never_skips() {
        let always = SkipProbabilities {
            validate: 1.0,
            generate: 1.0,
        };
        let mut decider = ProbabilisticSkip::new(3, always);
        let strict = RunOptions::new("MSFT", 2022, RunMode::Strict);
        assert!(decider.decide(&strict).is_empty());
    }

    #[test]
    fn test_fixed_and_no_skip() {
        let mut fixed = FixedSkip::new([StepName::Generate]);
        assert_eq!(fixed.decide(&lenient()), BTreeSet::from([StepName::Generate]));
        assert!(NoSkip.decide(&lenient()).is_empty());
    }
}
