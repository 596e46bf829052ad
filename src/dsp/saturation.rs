//! Soft-clip saturation for oversized bodies.
//!
//! When the body's volume factor passes the saturation threshold, the engine
//! inserts this stage after the master gain: big boxes don't just get louder,
//! they start to growl. The transfer function is the classic warm waveshaper
//!
//! ```text
//! f(x) = x * drive / (1 + |x * drive|)
//! ```
//!
//! which compresses peaks gradually (no hard corner, no fold), so inserting
//! or removing the stage between blocks cannot click. Drive 1.0 is nearly
//! clean; the coefficient mapping caps it at 6.0, well inside "obvious
//! saturation" but short of fuzz.

/// Soft clipping of a single sample.
#[inline]
pub fn soft_clip(sample: f32, drive: f32) -> f32 {
    let x = sample * drive;
    x / (1.0 + x.abs())
}

/// The optional output-path stage. Present iff the current volume factor is
/// above the saturation threshold; rebuilt whenever parameters change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Saturator {
    drive: f32,
}

impl Saturator {
    pub fn new(drive: f32) -> Self {
        Self {
            drive: drive.max(1.0),
        }
    }

    pub fn drive(&self) -> f32 {
        self.drive
    }

    /// Shape `buffer` in place.
    pub fn process(&self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = soft_clip(*sample, self.drive);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unity_drive_barely_touches_small_signals() {
        // f(0.1) = 0.1 / 1.1
        let out = soft_clip(0.1, 1.0);
        assert!((out - 0.0909).abs() < 0.001);
    }

    #[test]
    fn high_drive_approaches_but_never_exceeds_unity() {
        let out = soft_clip(1.0, 10.0);
        assert!(out > 0.9 && out < 1.0);

        let out = soft_clip(-1.0, 100.0);
        assert!(out < -0.9 && out > -1.0);
    }

    #[test]
    fn stage_bounds_every_sample() {
        let sat = Saturator::new(6.0);
        let mut buffer = vec![2.0, -2.0, 0.5, -0.5, 0.0];

        sat.process(&mut buffer);

        assert!(buffer.iter().all(|s| s.abs() < 1.0));
        assert_eq!(buffer[4], 0.0);
    }

    #[test]
    fn drive_floor_is_unity() {
        assert_eq!(Saturator::new(0.2).drive(), 1.0);
    }
}
