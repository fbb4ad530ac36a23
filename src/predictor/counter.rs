//! Implementation of a saturating counter.

use crate::Outcome;
use crate::predictor::StatefulPredictor;

/// Move `ctr` towards the outcome, clamped to `[low, high]`.
///
/// Increments when `taken` and below `high`, decrements when not-taken and
/// above `low`, and otherwise leaves the value alone.
pub fn ctr_update(ctr: &mut u8, taken: bool, low: u8, high: u8) {
    if taken && *ctr < high {
        *ctr += 1;
    } else if !taken && *ctr > low {
        *ctr -= 1;
    }
}

/// A `BITS`-bit unsigned saturating counter.
///
/// The value is always in `[0, 2^BITS - 1]`. When used to follow the behavior
/// of a branch, the upper half of the range predicts 'taken'.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SaturatingCounter<const BITS: u32> {
    init: u8,
    value: u8,
}

/// 3-bit direction counter used by tagged entries.
pub type DirectionCounter = SaturatingCounter<3>;

/// 2-bit 'useful' counter used by tagged entries.
pub type UsefulCounter = SaturatingCounter<2>;

/// 2-bit counter used by the bimodal table.
pub type BimodalCounter = SaturatingCounter<2>;

impl<const BITS: u32> SaturatingCounter<BITS> {
    /// The largest representable value.
    pub const MAX: u8 = ((1u16 << BITS) - 1) as u8;

    /// Values at or above this predict 'taken'.
    pub const THRESHOLD: u8 = 1 << (BITS - 1);

    /// Create a counter holding `init`, clamped into range.
    pub fn new(init: u8) -> Self {
        let init = init.min(Self::MAX);
        Self { init, value: init }
    }

    pub fn value(&self) -> u8 { self.value }

    /// Overwrite the current value, clamped into range.
    pub fn set(&mut self, val: u8) {
        self.value = val.min(Self::MAX);
    }

    pub fn increment(&mut self) {
        self.value = self.value.saturating_add(1).min(Self::MAX);
    }

    pub fn decrement(&mut self) {
        self.value = self.value.saturating_sub(1);
    }

    /// Shift the value right by one bit.
    pub fn halve(&mut self) {
        self.value >>= 1;
    }

    /// Move the counter towards an outcome, saturating at `[low, high]`.
    pub fn update_within(&mut self, outcome: Outcome, low: u8, high: u8) {
        ctr_update(&mut self.value, outcome.is_taken(), low, high.min(Self::MAX));
    }

    /// Returns 'true' when the counter is strictly above the threshold.
    pub fn is_strong_taken(&self) -> bool {
        self.value > Self::THRESHOLD
    }
}

impl<const BITS: u32> StatefulPredictor for SaturatingCounter<BITS> {
    fn name(&self) -> &'static str { "SaturatingCounter" }
    fn predict(&self) -> Outcome {
        Outcome::from_bool(self.value >= Self::THRESHOLD)
    }
    fn reset(&mut self) {
        self.value = self.init;
    }
    fn update(&mut self, outcome: Outcome) {
        self.update_within(outcome, 0, Self::MAX);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn thresholds() {
        assert_eq!(DirectionCounter::MAX, 7);
        assert_eq!(DirectionCounter::THRESHOLD, 4);
        assert_eq!(BimodalCounter::MAX, 3);
        assert_eq!(BimodalCounter::THRESHOLD, 2);
        assert_eq!(SaturatingCounter::<4>::MAX, 15);
        assert_eq!(SaturatingCounter::<4>::THRESHOLD, 8);

        assert_eq!(BimodalCounter::new(1).predict(), Outcome::N);
        assert_eq!(BimodalCounter::new(2).predict(), Outcome::T);
        assert_eq!(DirectionCounter::new(4).predict(), Outcome::T);
        assert!(!DirectionCounter::new(4).is_strong_taken());
        assert!(DirectionCounter::new(5).is_strong_taken());
    }

    #[test]
    fn ctr_update_respects_bounds() {
        let mut c = 3;
        ctr_update(&mut c, true, 0, 3);
        assert_eq!(c, 3);
        ctr_update(&mut c, false, 2, 3);
        assert_eq!(c, 2);
        ctr_update(&mut c, false, 2, 3);
        assert_eq!(c, 2);
    }

    #[test]
    fn new_clamps_and_reset_restores() {
        let mut c = UsefulCounter::new(9);
        assert_eq!(c.value(), 3);
        c.decrement();
        c.decrement();
        assert_eq!(c.value(), 1);
        c.reset();
        assert_eq!(c.value(), 3);
    }

    #[test]
    fn halve_shifts_right() {
        let mut c = UsefulCounter::new(3);
        c.halve();
        assert_eq!(c.value(), 1);
        c.halve();
        assert_eq!(c.value(), 0);
        c.halve();
        assert_eq!(c.value(), 0);
    }

    proptest! {
        #[test]
        fn direction_counter_saturates(init in 0u8..8, n in 8usize..64, taken in any::<bool>()) {
            let mut c = DirectionCounter::new(init);
            for _ in 0..n {
                c.update(Outcome::from_bool(taken));
                prop_assert!(c.value() <= DirectionCounter::MAX);
            }
            let expected = if taken { DirectionCounter::MAX } else { 0 };
            prop_assert_eq!(c.value(), expected);
        }

        #[test]
        fn bimodal_counter_saturates(init in 0u8..4, n in 4usize..64, taken in any::<bool>()) {
            let mut c = BimodalCounter::new(init);
            for _ in 0..n {
                c.update(Outcome::from_bool(taken));
            }
            let expected = if taken { BimodalCounter::MAX } else { 0 };
            prop_assert_eq!(c.value(), expected);
            prop_assert_eq!(c.predict(), Outcome::from_bool(taken));
        }

        #[test]
        fn counters_stay_in_range(ops in proptest::collection::vec(0u8..3, 0..200)) {
            let mut c = SaturatingCounter::<4>::new(8);
            for op in ops {
                match op {
                    0 => c.increment(),
                    1 => c.decrement(),
                    _ => c.halve(),
                }
                prop_assert!(c.value() <= 15);
            }
        }
    }
}
