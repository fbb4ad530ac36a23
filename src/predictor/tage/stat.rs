
use crate::Outcome;
use crate::predictor::tage::*;

/// Container for [`TAGEPredictor`] runtime stats.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TAGEStats {
    /// Successful allocations
    pub alcs: usize,

    /// Failed allocations
    pub failed_alcs: usize,

    /// Correct predictions provided by the base component
    pub base_hits: usize,

    /// Misses provided by the base component
    pub base_miss: usize,

    /// Correct predictions provided by each tagged component
    pub comp_hits: Vec<usize>,

    /// Misses provided by each tagged component
    pub comp_miss: Vec<usize>,

    /// Predictions where the alternate overrode a weak provider
    pub alt_overrides: usize,

    /// Number of passes that aged the 'useful' counters
    pub resets: usize,

    /// Number of updates
    pub clk: usize,
}
impl TAGEStats {
    pub fn new(num_comp: usize) -> Self {
        Self {
            alcs: 0,
            failed_alcs: 0,
            base_hits: 0,
            base_miss: 0,
            comp_hits: vec![0; num_comp],
            comp_miss: vec![0; num_comp],
            alt_overrides: 0,
            resets: 0,
            clk: 0,
        }
    }

    /// Account for a resolved prediction.
    pub fn record(&mut self, prediction: &TAGEPrediction, outcome: Outcome) {
        let hit = prediction.outcome == outcome;
        match (prediction.provider, hit) {
            (TAGEProvider::Base, true) => self.base_hits += 1,
            (TAGEProvider::Base, false) => self.base_miss += 1,
            (TAGEProvider::Tagged(n), true) => self.comp_hits[n - 1] += 1,
            (TAGEProvider::Tagged(n), false) => self.comp_miss[n - 1] += 1,
        }
        if prediction.used_alternate() {
            self.alt_overrides += 1;
        }
        self.clk += 1;
    }

    /// Total number of mispredictions.
    pub fn misses(&self) -> usize {
        self.base_miss + self.comp_miss.iter().sum::<usize>()
    }
}

impl std::fmt::Display for TAGEStats {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "  Base component:")?;
        writeln!(f, "    {} misses, {} hits", self.base_miss, self.base_hits)?;
        for (idx, (miss, hits)) in self.comp_miss.iter()
            .zip(self.comp_hits.iter()).enumerate()
        {
            writeln!(f, "  Component[{:2}]:", idx + 1)?;
            writeln!(f, "    {} misses, {} hits", miss, hits)?;
        }
        writeln!(f, "  Alternate overrides: {}", self.alt_overrides)?;
        writeln!(f, "  Allocations: {} ({} failed)", self.alcs, self.failed_alcs)?;
        write!(f, "  'Useful' aging passes: {}", self.resets)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn prediction(provider: TAGEProvider, outcome: Outcome, provider_outcome: Outcome)
        -> TAGEPrediction
    {
        TAGEPrediction {
            outcome,
            provider,
            provider_outcome,
            idx: 0,
            strong: false,
            alt_provider: TAGEProvider::Base,
            alt_outcome: outcome,
            alt_idx: 0,
        }
    }

    #[test]
    fn record_attributes_to_provider() {
        let mut stat = TAGEStats::new(4);
        stat.record(&prediction(TAGEProvider::Base, Outcome::T, Outcome::T), Outcome::T);
        stat.record(&prediction(TAGEProvider::Tagged(2), Outcome::N, Outcome::N), Outcome::T);
        stat.record(&prediction(TAGEProvider::Tagged(4), Outcome::N, Outcome::T), Outcome::N);

        assert_eq!(stat.base_hits, 1);
        assert_eq!(stat.comp_miss, vec![0, 1, 0, 0]);
        assert_eq!(stat.comp_hits, vec![0, 0, 0, 1]);
        assert_eq!(stat.alt_overrides, 1);
        assert_eq!(stat.misses(), 1);
        assert_eq!(stat.clk, 3);
    }
}
