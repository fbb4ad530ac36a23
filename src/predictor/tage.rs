//! Implementation of a "TAgged GEometric history length" (TAGE) predictor.

pub mod component;
pub mod config;
pub mod module;
pub mod stat;

pub use component::*;
pub use config::*;
pub use module::*;
pub use stat::*;

use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::RngCore;

use crate::history::*;
use crate::Outcome;
use crate::predictor::*;

/// Initial value of each bimodal counter (weakly not-taken).
pub const BIMODAL_INIT: u8 = 1;

/// Initial value of each tagged direction counter (weakly taken).
pub const TAGE_INIT_CTR: u8 = 4;

/// Initial value of each 'useful' counter.
pub const TAGE_INIT_USEFUL: u8 = 0;

/// Initial value of the 'use_alt' meta-counter. Values below this trust
/// the provider on weak predictions.
pub const USE_ALT_INIT: u8 = 8;

/// 4-bit meta-counter deciding whether weak providers defer to the alternate.
pub type UseAltCounter = SaturatingCounter<4>;


/// Identifies a particular component in a [`TAGEPredictor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TAGEProvider {
    /// The base component
    Base,

    /// A tagged component (numbered from 1, in order of increasing
    /// history length)
    Tagged(usize),
}
impl TAGEProvider {
    /// The component number, where the base component is 0.
    pub fn number(self) -> usize {
        match self {
            Self::Base => 0,
            Self::Tagged(n) => n,
        }
    }
}

/// Container for output from [`TAGEPredictor::predict`], including the
/// predicted outcome and other metadata about how the prediction was made.
///
/// The same value must be passed back to [`TAGEPredictor::update`] when the
/// branch resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TAGEPrediction {
    /// The final predicted direction
    pub outcome: Outcome,

    /// The component providing the prediction
    pub provider: TAGEProvider,

    /// Predicted direction from the provider
    pub provider_outcome: Outcome,

    /// The index identifying the entry used to make this prediction
    pub idx: usize,

    /// Whether the provider's counter was strictly above its threshold
    pub strong: bool,

    /// Alternate component used to provide a prediction
    pub alt_provider: TAGEProvider,

    /// Predicted direction from the alternate component
    pub alt_outcome: Outcome,

    /// The index identifying the entry from the alternate component
    pub alt_idx: usize,
}
impl TAGEPrediction {
    /// Returns 'true' when the final outcome was taken from the alternate
    /// component instead of the provider.
    pub fn used_alternate(&self) -> bool {
        self.provider != TAGEProvider::Base
            && self.outcome != self.provider_outcome
    }
}


/// The "TAgged GEometric history length" predictor.
///
/// See the following:
///  - "A case for (partially) TAgged GEometric history length branch prediction"
///  (Seznec, 2006).
///
/// Allocation on a misprediction draws from `R`, which can be seeded to make
/// the predictor fully deterministic.
pub struct TAGEPredictor<R = StdRng> {
    /// The configuration used to create this object
    pub cfg: TAGEConfig,

    pub stat: TAGEStats,

    /// Base component
    pub base: TAGEBaseComponent,

    /// Tagged components, in order of increasing history length
    pub comp: Vec<TAGEComponent>,

    /// Global history of branch outcomes
    ghr: HistoryRegister,

    /// Path history (low bit of each branch address)
    phr: HistoryRegister,

    /// Meta-counter deciding when to trust the alternate prediction
    use_alt: UseAltCounter,

    /// Number of updates since the 'useful' counters were last aged
    num_branches: usize,

    rng: R,
}

impl<R: RngCore> TAGEPredictor<R> {
    pub(crate) fn from_parts(cfg: TAGEConfig, rng: R) -> Self {
        let base = cfg.base_config().build();
        let comp: Vec<TAGEComponent> = cfg.component_configs().into_iter()
            .map(|c| c.build())
            .collect();
        info!("TAGE: {} tagged components, history lengths {:?}, {} entries",
            comp.len(), cfg.history_lengths(), cfg.total_entries()
        );
        Self {
            stat: TAGEStats::new(comp.len()),
            ghr: HistoryRegister::new(cfg.global_history_bits),
            phr: HistoryRegister::new(cfg.path_history_bits),
            use_alt: UseAltCounter::new(USE_ALT_INIT),
            num_branches: 0,
            base,
            comp,
            cfg,
            rng,
        }
    }

    fn inputs(&self, pc: u64) -> TAGEInputs<'_> {
        TAGEInputs { pc, ghr: &self.ghr, phr: &self.phr }
    }

    /// Find the tagged component with the longest history below component
    /// `n` whose entry matches the tag for this input.
    ///
    /// Returns [`TAGEProvider::Base`] if no such component exists.
    fn match_below_n(&self, input: &TAGEInputs, n: usize) -> TAGEProvider {
        for number in (1..n).rev() {
            let c = &self.comp[number - 1];
            let idx = c.get_index(input);
            if c.get_entry(idx).tag_matches(c.get_tag(input)) {
                return TAGEProvider::Tagged(number);
            }
        }
        TAGEProvider::Base
    }

    /// Read the entry selected by `provider`.
    ///
    /// Returns the index, the predicted outcome, and whether the counter is
    /// strictly above its threshold.
    fn lookup(&self, input: &TAGEInputs, provider: TAGEProvider)
        -> (usize, Outcome, bool)
    {
        match provider {
            TAGEProvider::Base => {
                let idx = self.base.get_index(input);
                (idx, self.base.get_entry(idx).predict(), false)
            },
            TAGEProvider::Tagged(n) => {
                let c = &self.comp[n - 1];
                let idx = c.get_index(input);
                let entry = c.get_entry(idx);
                (idx, entry.predict(), entry.ctr.is_strong_taken())
            },
        }
    }

    /// Move the entry selected by `provider` towards the outcome.
    fn train(&mut self, provider: TAGEProvider, idx: usize, outcome: Outcome) {
        match provider {
            TAGEProvider::Base => self.base.get_entry_mut(idx).update(outcome),
            TAGEProvider::Tagged(n) => {
                self.comp[n - 1].get_entry_mut(idx).ctr.update(outcome)
            },
        }
    }

    /// Given the provider of an incorrect prediction, try to claim an entry
    /// in one of the components with a longer history.
    ///
    /// The search starts one, two, or three components above the provider,
    /// chosen at random. When no candidate entry is free, the entry in the
    /// starting component is forcibly freed. At most one entry is allocated.
    ///
    /// Returns the number of the component that received the new entry.
    fn allocate(&mut self, pc: u64, provider: TAGEProvider) -> Option<usize> {
        let provider = provider.number();
        let num_comp = self.comp.len();

        // Early return: there is no component with a longer history.
        if provider >= num_comp {
            return None;
        }

        let rand_val = self.rng.next_u64() & ((1 << (num_comp - provider - 1)) - 1);
        let mut start = provider + 1;
        if rand_val & 1 != 0 {
            start += 1;
            if rand_val & 2 != 0 {
                start += 1;
            }
        }

        let ghr = &self.ghr;
        let phr = &self.phr;
        let input = TAGEInputs { pc, ghr, phr };

        let is_free = self.comp[provider..].iter()
            .any(|c| c.get_entry(c.get_index(&input)).is_free());

        if !is_free && start <= num_comp {
            let c = &mut self.comp[start - 1];
            let idx = c.get_index(&input);
            c.get_entry_mut(idx).useful.set(0);
        }

        for c in self.comp.iter_mut().skip(start - 1) {
            let idx = c.get_index(&input);
            let tag = c.get_tag(&input);
            let entry = c.get_entry_mut(idx);
            if entry.is_free() {
                entry.allocate(tag);
                trace!("TAGE: allocated {:#x} in component {} (idx={:#x}, tag={:#x})",
                    pc, c.number(), idx, tag
                );
                return Some(c.number());
            }
        }
        None
    }

    /// Halve every 'useful' counter so that stale entries eventually become
    /// eligible for replacement.
    pub fn age_useful(&mut self) {
        self.num_branches = 0;
        for comp in self.comp.iter_mut() {
            comp.age_useful_bits();
        }
        self.stat.resets += 1;
        info!("TAGE: aged 'useful' counters (pass {})", self.stat.resets);
    }
}

/// The public interface to a [`TAGEPredictor`].
impl<R: RngCore> TAGEPredictor<R> {
    /// Return the number of tagged components.
    pub fn num_tagged_components(&self) -> usize {
        self.comp.len()
    }

    /// Current value of the 'use_alt' meta-counter.
    pub fn use_alt(&self) -> u8 { self.use_alt.value() }

    /// Number of updates since the 'useful' counters were last aged.
    pub fn num_branches(&self) -> usize { self.num_branches }

    pub fn ghr(&self) -> &HistoryRegister { &self.ghr }
    pub fn phr(&self) -> &HistoryRegister { &self.phr }

    /// Index of `pc` in the tagged component numbered `n`, under the
    /// current history. Component 0 is the base component.
    ///
    /// # Panics
    ///
    /// Panics if `n` is greater than [`TAGEPredictor::num_tagged_components`].
    pub fn compute_index(&self, pc: u64, n: usize) -> usize {
        assert!(n <= self.comp.len(),
            "no component {} (have {} tagged components)", n, self.comp.len()
        );
        let input = self.inputs(pc);
        match n {
            0 => self.base.get_index(&input),
            n => self.comp[n - 1].get_index(&input),
        }
    }

    /// Tag of `pc` in the tagged component numbered `n`, under the current
    /// history. The base component is untagged and always yields 0.
    ///
    /// # Panics
    ///
    /// Panics if `n` is greater than [`TAGEPredictor::num_tagged_components`].
    pub fn compute_tag(&self, pc: u64, n: usize) -> u64 {
        assert!(n <= self.comp.len(),
            "no component {} (have {} tagged components)", n, self.comp.len()
        );
        let input = self.inputs(pc);
        match n {
            0 => 0,
            n => self.comp[n - 1].get_tag(&input),
        }
    }

    /// Return all state to how it was when the predictor was built.
    pub fn reset(&mut self) {
        self.base = self.cfg.base_config().build();
        self.comp = self.cfg.component_configs().into_iter()
            .map(|c| c.build())
            .collect();
        self.ghr.reset();
        self.phr.reset();
        self.use_alt = UseAltCounter::new(USE_ALT_INIT);
        self.num_branches = 0;
        self.stat = TAGEStats::new(self.comp.len());
    }

    /// Make a prediction for the branch at `pc`.
    pub fn predict(&self, pc: u64) -> TAGEPrediction {
        let input = self.inputs(pc);
        let provider = self.match_below_n(&input, self.comp.len() + 1);
        let alt_provider = self.match_below_n(&input, provider.number());

        let (idx, provider_outcome, strong) = self.lookup(&input, provider);
        let (alt_idx, alt_outcome, _) = self.lookup(&input, alt_provider);

        // Weak providers defer to the alternate while 'use_alt' says the
        // alternate has been more accurate.
        let outcome = match provider {
            TAGEProvider::Base => provider_outcome,
            TAGEProvider::Tagged(_) => {
                if strong || self.use_alt.value() < USE_ALT_INIT {
                    provider_outcome
                } else {
                    alt_outcome
                }
            },
        };

        TAGEPrediction {
            outcome,
            provider,
            provider_outcome,
            idx,
            strong,
            alt_provider,
            alt_outcome,
            alt_idx,
        }
    }

    /// Given a prediction for the branch at `pc` and the resolved outcome,
    /// update the state of the predictor and shift the outcome into history.
    ///
    /// `prediction` must be the value returned by [`TAGEPredictor::predict`]
    /// for this branch.
    pub fn update(&mut self,
        pc: u64,
        prediction: &TAGEPrediction,
        outcome: Outcome
    )
    {
        let p = prediction;
        self.stat.record(p, outcome);

        match p.provider {
            TAGEProvider::Tagged(n) => {
                let provider_hit = p.provider_outcome == outcome;
                let disagree = p.provider_outcome != p.alt_outcome;

                if !p.strong && disagree {
                    if provider_hit {
                        self.use_alt.decrement();
                    } else {
                        self.use_alt.increment();
                    }
                }

                // An unproven provider doesn't stop the alternate from
                // learning this branch too.
                if self.comp[n - 1].get_entry(p.idx).is_free() {
                    self.train(p.alt_provider, p.alt_idx, outcome);
                }

                let entry = self.comp[n - 1].get_entry_mut(p.idx);
                if disagree {
                    if provider_hit {
                        entry.useful.increment();
                    } else {
                        entry.useful.decrement();
                    }
                }
                entry.ctr.update(outcome);
            },
            TAGEProvider::Base => {
                self.train(TAGEProvider::Base, p.idx, outcome);
            },
        }

        if p.outcome != outcome {
            match self.allocate(pc, p.provider) {
                Some(_) => self.stat.alcs += 1,
                None => {
                    debug!("TAGE: failed to allocate for {:#x} (provider {:?})",
                        pc, p.provider
                    );
                    self.stat.failed_alcs += 1;
                },
            }
        }

        self.ghr.shift_in(outcome.is_taken());
        self.phr.shift_in(pc & 1 != 0);

        self.num_branches += 1;
        if self.num_branches >= self.cfg.reset_useful_interval {
            self.age_useful();
        }
    }
}
