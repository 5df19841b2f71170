//! What a sweep needs from the thing it sweeps.

use wf_flowsheet::Case;
use wf_model::Model;

/// Access to the model behind a sweepable case.
pub trait SweepCase {
    fn model(&self) -> &Model;
    fn model_mut(&mut self) -> &mut Model;
}

impl SweepCase for Model {
    fn model(&self) -> &Model {
        self
    }

    fn model_mut(&mut self) -> &mut Model {
        self
    }
}

impl SweepCase for Case {
    fn model(&self) -> &Model {
        Case::model(self)
    }

    fn model_mut(&mut self) -> &mut Model {
        Case::model_mut(self)
    }
}
