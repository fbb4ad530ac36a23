
use crate::Outcome;
use crate::history::*;
use crate::predictor::*;

/// Container for inputs passed to the components of a [`TAGEPredictor`].
#[derive(Clone, Copy)]
pub struct TAGEInputs<'a> {
    /// Program counter associated with a predicted branch
    pub pc: u64,

    /// Global history of branch outcomes
    pub ghr: &'a HistoryRegister,

    /// Path history (one address bit per branch)
    pub phr: &'a HistoryRegister,
}


/// The base component in a [`TAGEPredictor`]: a bimodal table of 2-bit
/// counters indexed only by the program counter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TAGEBaseComponent {
    pub cfg: TAGEBaseConfig,

    /// A table of saturating counters
    pub data: Vec<BimodalCounter>,
}
impl TAGEBaseComponent {
    /// Index into the table by program counter alone.
    pub fn index_of(&self, pc: u64) -> usize {
        (pc % self.cfg.size as u64) as usize
    }
}
impl PredictorTable for TAGEBaseComponent {
    type Input<'a> = TAGEInputs<'a>;
    type Entry = BimodalCounter;

    fn size(&self) -> usize { self.cfg.size }

    fn get_index(&self, input: &TAGEInputs) -> usize {
        self.index_of(input.pc)
    }

    fn get_entry(&self, idx: usize) -> &BimodalCounter {
        &self.data[idx % self.cfg.size]
    }
    fn get_entry_mut(&mut self, idx: usize) -> &mut BimodalCounter {
        &mut self.data[idx % self.cfg.size]
    }
}


/// An entry in some [`TAGEComponent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TAGEEntry {
    /// State machine tracking a branch outcome
    pub ctr: DirectionCounter,

    /// The 'useful' counter, used to determine when the entry is
    /// eligible to be replaced
    pub useful: UsefulCounter,

    /// Tag associated with this entry. Entries that were never allocated
    /// don't match any tag.
    pub tag: Option<u64>,
}
impl Default for TAGEEntry {
    fn default() -> Self { Self::new() }
}
impl TAGEEntry {
    pub fn new() -> Self {
        Self {
            ctr: DirectionCounter::new(TAGE_INIT_CTR),
            useful: UsefulCounter::new(TAGE_INIT_USEFUL),
            tag: None,
        }
    }

    /// Get the current predicted outcome.
    pub fn predict(&self) -> Outcome {
        self.ctr.predict()
    }

    /// Returns true if the provided tag matches this entry.
    pub fn tag_matches(&self, tag: u64) -> bool {
        self.tag == Some(tag)
    }

    /// Returns true if this entry can be replaced.
    pub fn is_free(&self) -> bool {
        self.useful.value() == 0
    }

    /// Claim this entry for a new tag. The direction counter returns to its
    /// weakly-taken initial state.
    pub fn allocate(&mut self, tag: u64) {
        self.tag = Some(tag);
        self.ctr.reset();
    }
}

/// A tagged component in the TAGE predictor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TAGEComponent {
    pub cfg: TAGEComponentConfig,

    /// Table of entries
    pub data: Vec<TAGEEntry>,
}
impl TAGEComponent {
    /// The position of this component, starting at 1.
    pub fn number(&self) -> usize { self.cfg.number }

    pub fn history_length(&self) -> usize { self.cfg.history_length }

    pub fn num_useful_entries(&self) -> usize {
        self.data.iter().filter(|e| !e.is_free()).count()
    }

    /// Calculate what percentage of entries have been allocated.
    pub fn utilization(&self) -> f64 {
        let used = self.data.iter().filter(|e| e.tag.is_some()).count() as f64;
        (used / self.data.len() as f64) * 100.0
    }

    /// Halve the 'useful' counter for all entries in this component.
    pub fn age_useful_bits(&mut self) {
        for entry in self.data.iter_mut() {
            entry.useful.halve();
        }
    }

    /// Hash recent path history into a value that differs per component.
    ///
    /// The newest `min(history_length, max_path_bits)` path bits are split
    /// at the index width. The upper half is rotated by the component number
    /// and folded into the lower half, then the result is rotated again.
    pub fn path_hash(&self, phr: &HistoryRegister) -> u64 {
        let size = self.cfg.history_length.min(self.cfg.max_path_bits);
        let hash = phr.prefix(size);

        let width = self.cfg.index_bits;
        let comp  = self.cfg.number;
        let mask  = (1u64 << width) - 1;
        let back  = width.abs_diff(comp);

        let lo = hash & mask;
        let hi = hash >> width;
        let hi = ((hi << comp) & mask) + (hi >> back);

        let hash = lo ^ hi;
        ((hash << comp) & mask) + (hash >> back)
    }
}

impl PredictorTable for TAGEComponent {
    type Input<'a> = TAGEInputs<'a>;
    type Entry = TAGEEntry;

    fn size(&self) -> usize { self.data.len() }

    fn get_index(&self, input: &TAGEInputs) -> usize {
        let width = self.cfg.index_bits;
        let pc = input.pc;
        let ghist_bits = input.ghr.fold(self.cfg.history_length, width);
        let phist_bits = self.path_hash(input.phr);
        let shift = width.abs_diff(self.cfg.number) + 1;
        let index = ghist_bits ^ pc ^ (pc >> shift) ^ phist_bits;
        (index as usize) & self.index_mask()
    }

    fn get_entry(&self, idx: usize) -> &TAGEEntry {
        let index = idx & self.index_mask();
        &self.data[index]
    }
    fn get_entry_mut(&mut self, idx: usize) -> &mut TAGEEntry {
        let index = idx & self.index_mask();
        &mut self.data[index]
    }
}

impl TaggedPredictorTable for TAGEComponent {
    fn get_tag(&self, input: &TAGEInputs) -> u64 {
        let width = self.cfg.tag_bits;
        let len = self.cfg.history_length;
        let ghist0_bits = input.ghr.fold(len, width);
        let ghist1_bits = input.ghr.fold(len, width - 1);
        (ghist0_bits ^ ghist1_bits ^ input.pc) & ((1u64 << width) - 1)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    fn component(number: usize) -> TAGEComponent {
        TAGEConfig::default().component_configs()[number - 1].build()
    }

    #[test]
    fn fresh_entries_never_match() {
        let entry = TAGEEntry::new();
        assert!(!entry.tag_matches(0));
        assert_eq!(entry.ctr.value(), TAGE_INIT_CTR);
        assert!(entry.is_free());
    }

    #[test]
    fn allocate_resets_direction() {
        let mut entry = TAGEEntry::new();
        entry.ctr.set(0);
        entry.allocate(0x5a);
        assert!(entry.tag_matches(0x5a));
        assert_eq!(entry.ctr.value(), TAGE_INIT_CTR);
    }

    #[test]
    fn base_index_is_pc_modulo_size() {
        let base = TAGEConfig::default().base_config().build();
        assert_eq!(base.index_of(0x1000), 0x1000);
        assert_eq!(base.index_of(16384 + 7), 7);
        assert_eq!(base.get_entry(3).value(), BIMODAL_INIT);
    }

    #[test]
    fn empty_history_index_and_tag() {
        let ghr = HistoryRegister::new(1024);
        let phr = HistoryRegister::new(32);
        let input = TAGEInputs { pc: 0x1234, ghr: &ghr, phr: &phr };

        // Component 1: index width 10, tag width 7
        let c = component(1);
        assert_eq!(c.path_hash(&phr), 0);
        let expected = (0x1234 ^ (0x1234 >> 10)) & 0x3ff;
        assert_eq!(c.get_index(&input), expected as usize);
        assert_eq!(c.get_tag(&input), 0x1234 & 0x7f);
    }

    #[test]
    fn path_hash_rotates_per_component() {
        let mut phr = HistoryRegister::new(32);
        for _ in 0..16 {
            phr.shift_in(true);
        }

        // Component 8: history length 107, clamp to 16 path bits, width 10.
        // hash = 0xffff, lo = 0x3ff, hi = 0x3f
        // hi' = ((0x3f << 8) & 0x3ff) + (0x3f >> 2) = 0x300 + 0xf
        // h   = 0x3ff ^ 0x30f = 0x0f0
        // out = ((0xf0 << 8) & 0x3ff) + (0xf0 >> 2) = 0 + 0x3c
        let c = component(8);
        assert_eq!(c.path_hash(&phr), 0x3c);

        // Component 1: history length 4, so only four path bits are read.
        // hash = 0xf, hi = 0
        // out = ((0xf << 1) & 0x3ff) + (0xf >> 9) = 0x1e
        let c = component(1);
        assert_eq!(c.path_hash(&phr), 0x1e);
    }

    #[test]
    fn aging_halves_useful_bits() {
        let mut c = component(2);
        for (i, e) in c.data.iter_mut().enumerate() {
            e.useful.set((i % 4) as u8);
        }
        c.age_useful_bits();
        for (i, e) in c.data.iter().enumerate() {
            assert_eq!(e.useful.value(), (i % 4) as u8 >> 1);
        }
    }

    proptest! {
        #[test]
        fn index_and_tag_fit_their_widths(
            pc in any::<u64>(),
            ghist in proptest::collection::vec(any::<bool>(), 0..200),
            phist in proptest::collection::vec(any::<bool>(), 0..40),
        ) {
            let mut ghr = HistoryRegister::new(1024);
            let mut phr = HistoryRegister::new(32);
            for b in ghist { ghr.shift_in(b); }
            for b in phist { phr.shift_in(b); }
            let input = TAGEInputs { pc, ghr: &ghr, phr: &phr };

            for cfg in TAGEConfig::default().component_configs() {
                let c = cfg.build();
                prop_assert!(c.get_index(&input) < (1 << cfg.index_bits));
                prop_assert!(c.get_tag(&input) < (1 << cfg.tag_bits));
            }
        }
    }
}
