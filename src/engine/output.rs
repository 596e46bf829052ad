//! The shared output path all voices mix into.

use crate::body::DerivedCoefficients;
use crate::dsp::Saturator;

/// Master gain plus the optional oversized-body saturation stage.
///
/// Rebuilt wholesale whenever the body changes while built; never mutated
/// piecemeal. The saturator is `Some` iff the volume factor was above the
/// threshold at derivation time, so "zero or one saturation stage" holds by
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OutputStage {
    master_gain: f32,
    saturator: Option<Saturator>,
}

impl OutputStage {
    pub(crate) fn from_coefficients(coeffs: &DerivedCoefficients) -> Self {
        Self {
            master_gain: coeffs.master_gain,
            saturator: coeffs.saturation_drive.map(Saturator::new),
        }
    }

    pub(crate) fn master_gain(&self) -> f32 {
        self.master_gain
    }

    pub(crate) fn saturation_active(&self) -> bool {
        self.saturator.is_some()
    }

    /// Applies gain then saturation in place over the mixed block.
    pub(crate) fn process(&self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample *= self.master_gain;
        }
        if let Some(saturator) = &self.saturator {
            saturator.process(buffer);
        }
    }
}
