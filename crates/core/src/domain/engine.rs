//! Per-block orchestration of the stereo equalizer
//!
//! The engine owns one filter chain per channel and drives them from a
//! settings snapshot each block: rebuild the coefficients and topologies
//! first, then run the samples. Coefficients are computed once per block
//! and distributed to both chains, so the two channels can never drift
//! apart numerically.

use crate::domain::audio::{BlockSpec, EqError, Result};
use crate::domain::dsp::{
    db_to_gain, design_high_cut, design_low_cut, BiquadCoeffs, CutBand, FilterChain,
};
use crate::domain::params::EqSettings;
use tracing::debug;

/// Stereo parametric equalizer engine
///
/// Lifecycle: construct, `prepare` with the host's block contract, then
/// call `process_block` once per audio callback. `process_block` before
/// `prepare` is a caller error and fails fast; it never mis-renders.
pub struct EqualizerEngine {
    sample_rate: f32,
    left: FilterChain,
    right: FilterChain,
    prepared: bool,
}

impl EqualizerEngine {
    pub fn new() -> Self {
        Self {
            sample_rate: 0.0,
            left: FilterChain::new(),
            right: FilterChain::new(),
            prepared: false,
        }
    }

    /// Prepare both chains for a processing session
    ///
    /// Validates the block contract and the initial settings, resets all
    /// filter memory, and performs one full coefficient pass so the very
    /// first block is already correct.
    pub fn prepare(&mut self, spec: &BlockSpec, settings: &EqSettings) -> Result<()> {
        if spec.max_block_size == 0 {
            return Err(EqError::InvalidConfiguration(
                "max_block_size must be at least 1".to_string(),
            ));
        }
        if spec.sample_rate.hz() == 0 {
            return Err(EqError::InvalidConfiguration(
                "sample rate must be positive".to_string(),
            ));
        }
        settings.validate()?;

        self.sample_rate = spec.sample_rate.hz() as f32;
        self.left.prepare(spec);
        self.right.prepare(spec);
        self.prepared = true;
        self.apply_settings(settings);

        debug!(
            "Equalizer prepared: {} Hz, max block {}, {} channel(s)",
            spec.sample_rate.hz(),
            spec.max_block_size,
            spec.channels.count()
        );
        Ok(())
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Process one block of planar channel buffers in place
    ///
    /// Channel 0 and 1 are filtered as left and right; any further output
    /// channels are cleared to silence rather than left with stale data.
    /// The snapshot is applied in full every block, so parameter changes
    /// take effect on the block after they land in the store. This path
    /// never allocates and never blocks.
    pub fn process_block(
        &mut self,
        channels: &mut [&mut [f32]],
        settings: &EqSettings,
    ) -> Result<()> {
        if !self.prepared {
            return Err(EqError::NotPrepared);
        }
        // Snapshots from the store are clamped at the write side
        debug_assert!(settings.validate().is_ok());

        self.apply_settings(settings);

        match channels {
            [] => {}
            [mono] => self.left.process(mono),
            [left, right, rest @ ..] => {
                self.left.process(left);
                self.right.process(right);
                for extra in rest.iter_mut() {
                    extra.fill(0.0);
                }
            }
        }
        Ok(())
    }

    /// Clear both chains' filter memory (playback stop)
    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }

    /// Recompute all coefficients from a snapshot and push them into both
    /// chains
    fn apply_settings(&mut self, settings: &EqSettings) {
        let peak = BiquadCoeffs::peaking(
            self.sample_rate,
            settings.peak_freq,
            settings.peak_quality,
            db_to_gain(settings.peak_gain_db),
        );
        self.left.set_peak_coefficients(peak);
        self.right.set_peak_coefficients(peak);

        let low_cut = design_low_cut(
            settings.low_cut_freq,
            self.sample_rate,
            settings.low_cut_slope.sections(),
        );
        self.left.set_cut_topology(CutBand::LowCut, &low_cut);
        self.right.set_cut_topology(CutBand::LowCut, &low_cut);

        let high_cut = design_high_cut(
            settings.high_cut_freq,
            self.sample_rate,
            settings.high_cut_slope.sections(),
        );
        self.left.set_cut_topology(CutBand::HighCut, &high_cut);
        self.right.set_cut_topology(CutBand::HighCut, &high_cut);
    }
}

impl Default for EqualizerEngine {
    fn default() -> Self {
        Self::new()
    }
}
