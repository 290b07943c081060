//! Confidence scoring.

/// Accumulates boolean predicates and reports the fraction that held.
///
/// ```
/// use stagehand_parser::Scorer;
///
/// let mut scorer = Scorer::new();
/// scorer.add(true).add(false).add(true).add(true);
/// assert_eq!(scorer.rate(), 0.75);
/// assert_eq!(Scorer::new().rate(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scorer {
    asserted: u32,
    succeeded: u32,
}

impl Scorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one predicate.
    pub fn add(&mut self, holds: bool) -> &mut Self {
        self.asserted += 1;
        if holds {
            self.succeeded += 1;
        }
        self
    }

    pub fn asserted(&self) -> u32 {
        self.asserted
    }

    pub fn succeeded(&self) -> u32 {
        self.succeeded
    }

    /// Fraction of predicates that held; 0 when none were asserted.
    pub fn rate(&self) -> f64 {
        if self.asserted == 0 {
            return 0.0;
        }
        f64::from(self.succeeded) / f64::from(self.asserted)
    }

    /// Combine `(weight, rate)` pairs into a single score in [0, 1].
    pub fn weighted(parts: &[(f64, f64)]) -> f64 {
        parts
            .iter()
            .map(|(weight, rate)| weight * rate)
            .sum::<f64>()
            .clamp(0.0, 1.0)
    }
}

impl FromIterator<bool> for Scorer {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut scorer = Scorer::new();
        for holds in iter {
            scorer.add(holds);
        }
        scorer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_rate_is_zero() {
        let scorer = Scorer::new();
        assert_eq!(scorer.asserted(), 0);
        assert_eq!(scorer.rate(), 0.0);
    }

    #[test]
    fn test_rate_bounds() {
        for n in 0..6u32 {
            for ok in 0..=n {
                let scorer: Scorer = (0..n).map(|i| i < ok).collect();
                let rate = scorer.rate();
                assert!((0.0..=1.0).contains(&rate));
                assert_eq!(rate, scorer.rate());
            }
        }
    }

    #[test]
    fn test_from_iter() {
        let scorer: Scorer = [true, false, true].into_iter().collect();
        assert_eq!(scorer.asserted(), 3);
        assert_eq!(scorer.succeeded(), 2);
        assert!((scorer.rate() - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_weighted() {
        assert_eq!(Scorer::weighted(&[(0.5, 1.0), (0.5, 0.5)]), 0.75);
        assert_eq!(Scorer::weighted(&[(0.3, 0.0), (0.7, 1.0)]), 0.7);
        assert_eq!(Scorer::weighted(&[]), 0.0);
        assert_eq!(Scorer::weighted(&[(1.0, 1.0), (1.0, 1.0)]), 1.0);
    }
}
