
use log::debug;
use rand::rngs::StdRng;
use rand::RngCore;

use crate::branch::*;
use crate::predictor::*;

/// Adapter presenting a [`TAGEPredictor`] to a host through
/// [`DirectionPredictor`].
///
/// Only one prediction is kept in flight. The host must resolve each branch
/// with [`DirectionPredictor::last_branch_result`] before predicting the
/// next one; if it doesn't, the context for the resolving branch is
/// recomputed from the current state of the predictor.
pub struct TAGEModule<R = StdRng> {
    pub tage: TAGEPredictor<R>,

    /// The most recent prediction and the address it was made for
    in_flight: Option<(u64, TAGEPrediction)>,
}

impl<R: RngCore> TAGEModule<R> {
    pub fn new(tage: TAGEPredictor<R>) -> Self {
        Self { tage, in_flight: None }
    }

    /// The prediction waiting to be resolved, if any.
    pub fn in_flight(&self) -> Option<&TAGEPrediction> {
        self.in_flight.as_ref().map(|(_, p)| p)
    }
}

impl<R: RngCore> DirectionPredictor for TAGEModule<R> {
    fn name(&self) -> &'static str { "TAGE" }

    fn predict_branch(&mut self, ip: u64) -> bool {
        let prediction = self.tage.predict(ip);
        self.in_flight = Some((ip, prediction));
        prediction.outcome.is_taken()
    }

    // The target and branch type don't affect direction prediction.
    fn last_branch_result(&mut self,
        ip: u64,
        _target: u64,
        taken: bool,
        _branch_type: BranchKind,
    )
    {
        let prediction = match self.in_flight.take() {
            Some((pc, p)) if pc == ip => p,
            other => {
                debug!("TAGE: no prediction in flight for {:#x} (have {:x?})",
                    ip, other.map(|(pc, _)| pc)
                );
                self.tage.predict(ip)
            },
        };
        self.tage.update(ip, &prediction, Outcome::from_bool(taken));
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::SeedableRng;

    fn module() -> TAGEModule {
        let tage = TAGEConfig::default()
            .build_with_rng(StdRng::seed_from_u64(0))
            .unwrap();
        TAGEModule::new(tage)
    }

    #[test]
    fn fresh_module_predicts_not_taken() {
        let mut m = module();
        assert!(!m.predict_branch(0x1000));
        assert!(m.in_flight().is_some());
    }

    #[test]
    fn resolving_consumes_in_flight_prediction() {
        let mut m = module();
        m.predict_branch(0x1000);
        m.last_branch_result(0x1000, 0x2000, true, BranchKind::DirectBranch);
        assert!(m.in_flight().is_none());
        assert_eq!(m.tage.stat.clk, 1);
        assert_eq!(m.tage.stat.base_miss, 1);
    }

    #[test]
    fn resolving_without_prediction_still_updates() {
        let mut m = module();
        m.predict_branch(0x1000);
        m.last_branch_result(0x2000, 0x3000, false, BranchKind::DirectBranch);
        assert_eq!(m.tage.stat.clk, 1);
        assert_eq!(m.tage.ghr().prefix(1), 0);
        assert_eq!(m.tage.num_branches(), 1);
    }

    #[test]
    fn always_taken_converges() {
        let mut m = module();
        let mut last = false;
        for _ in 0..64 {
            last = m.predict_branch(0x1000);
            m.last_branch_result(0x1000, 0x1100, true, BranchKind::DirectBranch);
        }
        assert!(last);
        let idx = m.tage.base.index_of(0x1000);
        assert_eq!(m.tage.base.get_entry(idx).value(), 3);
    }
}
