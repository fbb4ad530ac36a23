//! Branch direction predictors and the interfaces they present to a host.

pub mod table;
pub mod counter;
pub mod tage;

pub use table::*;
pub use counter::*;
pub use tage::*;

use crate::branch::*;


/// Interface to a predictor with some internal state which is only subject to
/// change by the correct branch outcome.
pub trait StatefulPredictor {
    fn name(&self) -> &'static str;

    /// Reset the internal state of the predictor.
    fn reset(&mut self);

    /// Return the current predicted outcome.
    fn predict(&self) -> Outcome;

    /// Update the internal state of the predictor with the correct outcome.
    fn update(&mut self, outcome: Outcome);
}

/// Interface between a host pipeline and a conditional branch direction
/// predictor.
///
/// The host calls [`DirectionPredictor::predict_branch`] once when a branch
/// is fetched, and [`DirectionPredictor::last_branch_result`] once when the
/// same branch resolves.
pub trait DirectionPredictor {
    fn name(&self) -> &'static str;

    /// Predict the direction of the branch at `ip`.
    fn predict_branch(&mut self, ip: u64) -> bool;

    /// Report the resolved outcome for the branch at `ip`.
    fn last_branch_result(&mut self,
        ip: u64,
        target: u64,
        taken: bool,
        branch_type: BranchKind,
    );
}
