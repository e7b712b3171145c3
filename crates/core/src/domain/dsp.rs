//! Realtime filtering primitives for the equalizer
//!
//! This module provides the signal path building blocks:
//! - Biquad coefficient design (RBJ peaking bell, Butterworth cut cascades)
//! - A single second-order IIR stage with bypass
//! - The per-channel filter chain: low-cut group, peak, high-cut group
//!
//! Everything on the per-sample path is allocation-free and lock-free.
//! Coefficient sets are recomputed every block from the current settings
//! snapshot and distributed into the stages; stage delay memory persists
//! across blocks and is cleared only on prepare/reset.

use crate::domain::audio::BlockSpec;
use num_complex::Complex32;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use tracing::trace;

/// Convert decibels to a linear amplitude factor
pub fn db_to_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert a linear amplitude factor to decibels
pub fn gain_to_db(gain: f32) -> f32 {
    20.0 * gain.log10()
}

// ============================================================================
// BIQUAD COEFFICIENTS
// ============================================================================

/// Normalized biquad coefficients
///
/// Five taps with `a0` already divided out. The default is unity gain
/// (no filtering).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiquadCoeffs {
    /// Numerator coefficients
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    /// Denominator coefficients (a0 is normalized to 1.0)
    pub a1: f32,
    pub a2: f32,
}

impl Default for BiquadCoeffs {
    fn default() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        }
    }
}

impl BiquadCoeffs {
    /// Calculate coefficients for a peaking (bell) filter
    ///
    /// `linear_gain` is the amplitude factor at the center frequency
    /// (1.0 is unity, in which case the section is the identity within
    /// float tolerance). Callers working in dB convert once via
    /// [`db_to_gain`].
    #[must_use]
    pub fn peaking(sample_rate: f32, freq: f32, q: f32, linear_gain: f32) -> Self {
        let a = linear_gain.sqrt();
        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let sin_w0 = w0.sin();
        let alpha = sin_w0 / (2.0 * q);

        let b0 = 1.0 + alpha * a;
        let b1 = -2.0 * cos_w0;
        let b2 = 1.0 - alpha * a;

        let a0 = 1.0 + alpha / a;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha / a;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Evaluate the transfer function at `freq` Hz
    pub fn response(&self, sample_rate: f32, freq: f32) -> Complex32 {
        let w = 2.0 * PI * freq / sample_rate;
        let z1 = Complex32::from_polar(1.0, -w);
        let z2 = z1 * z1;

        let num = Complex32::new(self.b0, 0.0) + z1 * self.b1 + z2 * self.b2;
        let den = Complex32::new(1.0, 0.0) + z1 * self.a1 + z2 * self.a2;
        num / den
    }

    /// Magnitude response in dB at `freq` Hz
    pub fn magnitude_db(&self, sample_rate: f32, freq: f32) -> f32 {
        gain_to_db(self.response(sample_rate, freq).norm())
    }
}

// ============================================================================
// CUT FILTER DESIGN (Butterworth cascades)
// ============================================================================

/// Maximum number of second-order sections in a cut group (48 dB/octave)
pub const MAX_CUT_SECTIONS: usize = 4;

/// Ordered coefficient sets for one cut band
///
/// Fixed capacity so per-block recomputation never allocates. Section `i`
/// always feeds cut-group stage `i`, and `len` equals the section count the
/// designer was asked for, so a length/order mismatch is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutCoefficients {
    sections: [BiquadCoeffs; MAX_CUT_SECTIONS],
    len: usize,
}

impl CutCoefficients {
    /// Active sections, in cascade order
    pub fn sections(&self) -> &[BiquadCoeffs] {
        &self.sections[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Combined magnitude response of the cascade in dB at `freq` Hz
    pub fn magnitude_db(&self, sample_rate: f32, freq: f32) -> f32 {
        self.sections()
            .iter()
            .map(|c| c.magnitude_db(sample_rate, freq))
            .sum()
    }
}

/// Design the low-cut band: a Butterworth high-pass cascade
///
/// `sections` second-order sections form a high-pass of analog order
/// `2 * sections`, i.e. 12 dB/octave per section, -3 dB at `freq`.
#[must_use]
pub fn design_low_cut(freq: f32, sample_rate: f32, sections: usize) -> CutCoefficients {
    butterworth_cascade(freq, sample_rate, sections, CutBand::LowCut)
}

/// Design the high-cut band: a Butterworth low-pass cascade
///
/// Same shape as [`design_low_cut`] mirrored around the cutoff. The
/// high-cut band is a genuine low-pass design, not a reused high-pass.
#[must_use]
pub fn design_high_cut(freq: f32, sample_rate: f32, sections: usize) -> CutCoefficients {
    butterworth_cascade(freq, sample_rate, sections, CutBand::HighCut)
}

/// Which cut group of a filter chain a topology update targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutBand {
    /// High-pass group at the front of the chain
    LowCut,
    /// Low-pass group at the back of the chain
    HighCut,
}

/// Butterworth pole-pair decomposition via bilinear transform
///
/// For analog order N = 2 * sections, the k-th conjugate pole pair sits at
/// angle theta = pi * (2k + 1) / (2N); each pair becomes one second-order
/// section. The cutoff is prewarped for the bilinear transform.
fn butterworth_cascade(
    freq: f32,
    sample_rate: f32,
    sections: usize,
    band: CutBand,
) -> CutCoefficients {
    debug_assert!(
        (1..=MAX_CUT_SECTIONS).contains(&sections),
        "cut section count {sections} outside 1..={MAX_CUT_SECTIONS}"
    );
    let sections = sections.clamp(1, MAX_CUT_SECTIONS);

    let wc = (PI * freq / sample_rate).tan();
    let wc2 = wc * wc;
    let order = 2 * sections;

    let mut out = CutCoefficients {
        sections: [BiquadCoeffs::default(); MAX_CUT_SECTIONS],
        len: sections,
    };

    for k in 0..sections {
        let theta = PI * (2 * k + 1) as f32 / (2 * order) as f32;
        let two_sin_theta = 2.0 * theta.sin();
        let d = 1.0 + two_sin_theta * wc + wc2;
        let inv_d = 1.0 / d;

        let (b0, b1, b2) = match band {
            // High-pass numerator: (1 - z^-1)^2
            CutBand::LowCut => (inv_d, -2.0 * inv_d, inv_d),
            // Low-pass numerator: wc^2 * (1 + z^-1)^2
            CutBand::HighCut => (wc2 * inv_d, 2.0 * wc2 * inv_d, wc2 * inv_d),
        };
        let a1 = 2.0 * (wc2 - 1.0) * inv_d;
        let a2 = (1.0 - two_sin_theta * wc + wc2) * inv_d;

        out.sections[k] = BiquadCoeffs { b0, b1, b2, a1, a2 };
    }

    out
}

// ============================================================================
// BIQUAD STAGE
// ============================================================================

/// One second-order IIR section with its own delay state
///
/// Transposed direct form II: exactly two delay slots, owned exclusively by
/// the stage and never shared across channels. A disabled stage passes
/// samples through untouched and does not advance its state.
#[derive(Debug, Clone)]
pub struct BiquadStage {
    coeffs: BiquadCoeffs,
    z1: f32,
    z2: f32,
    enabled: bool,
}

impl BiquadStage {
    /// Create an enabled stage with unity coefficients and cleared state
    pub fn new() -> Self {
        Self {
            coeffs: BiquadCoeffs::default(),
            z1: 0.0,
            z2: 0.0,
            enabled: true,
        }
    }

    /// Replace the coefficient set wholesale
    ///
    /// Delay state is deliberately left running so parameter sweeps stay
    /// click-free; abrupt coefficient jumps may still produce audible
    /// transients, which is an accepted limitation.
    pub fn set_coefficients(&mut self, coeffs: BiquadCoeffs) {
        self.coeffs = coeffs;
    }

    pub fn coefficients(&self) -> BiquadCoeffs {
        self.coeffs
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Process a single sample
    #[inline]
    pub fn process_sample(&mut self, x: f32) -> f32 {
        if !self.enabled {
            return x;
        }
        let y = self.coeffs.b0 * x + self.z1;
        self.z1 = self.coeffs.b1 * x - self.coeffs.a1 * y + self.z2;
        self.z2 = self.coeffs.b2 * x - self.coeffs.a2 * y;
        y
    }

    /// Process a buffer of samples in place
    pub fn process(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    /// Zero the delay state
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

impl Default for BiquadStage {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// FILTER CHAIN (one audio channel)
// ============================================================================

/// Ordered processing stages for a single audio channel
///
/// Samples flow through the low-cut group, then the peak stage, then the
/// high-cut group. Both cut groups are sized to the maximum supported slope
/// and toggled by enable flags, so changing the slope never reallocates.
/// A chain owns exactly one channel's worth of state; the engine holds one
/// per channel.
#[derive(Debug, Clone)]
pub struct FilterChain {
    low_cut: [BiquadStage; MAX_CUT_SECTIONS],
    peak: BiquadStage,
    high_cut: [BiquadStage; MAX_CUT_SECTIONS],
}

impl FilterChain {
    /// Create a chain with both cut groups fully bypassed and a unity peak
    pub fn new() -> Self {
        let bypassed = || {
            let mut stage = BiquadStage::new();
            stage.set_enabled(false);
            stage
        };
        Self {
            low_cut: std::array::from_fn(|_| bypassed()),
            peak: BiquadStage::new(),
            high_cut: std::array::from_fn(|_| bypassed()),
        }
    }

    /// Reset every stage for a new processing session
    ///
    /// Must be called before the first `process` and again whenever the
    /// sample rate changes. `process` allocates nothing afterwards.
    pub fn prepare(&mut self, spec: &BlockSpec) {
        self.reset();
        trace!(
            "Filter chain prepared: {} Hz, max block {}",
            spec.sample_rate.hz(),
            spec.max_block_size
        );
    }

    /// Install a cut band's coefficient cascade
    ///
    /// Enables stages `0..coeffs.len()` with `sections[i]` assigned to
    /// stage `i`, and disables the rest of the group. The enabled stages
    /// are always contiguous from index 0.
    pub fn set_cut_topology(&mut self, band: CutBand, coeffs: &CutCoefficients) {
        let group = match band {
            CutBand::LowCut => &mut self.low_cut,
            CutBand::HighCut => &mut self.high_cut,
        };
        for (i, stage) in group.iter_mut().enumerate() {
            if let Some(&c) = coeffs.sections().get(i) {
                stage.set_coefficients(c);
                stage.set_enabled(true);
            } else {
                stage.set_enabled(false);
            }
        }
    }

    /// Set the peak stage's coefficients; the peak stage is always enabled
    pub fn set_peak_coefficients(&mut self, coeffs: BiquadCoeffs) {
        self.peak.set_coefficients(coeffs);
    }

    /// Number of enabled stages in a cut group
    pub fn active_sections(&self, band: CutBand) -> usize {
        let group = match band {
            CutBand::LowCut => &self.low_cut,
            CutBand::HighCut => &self.high_cut,
        };
        group.iter().filter(|s| s.is_enabled()).count()
    }

    /// Run every sample through each enabled stage, in declared order
    pub fn process(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            let mut s = *sample;
            for stage in &mut self.low_cut {
                s = stage.process_sample(s);
            }
            s = self.peak.process_sample(s);
            for stage in &mut self.high_cut {
                s = stage.process_sample(s);
            }
            *sample = s;
        }
    }

    /// Clear all stage delay memory
    pub fn reset(&mut self) {
        for stage in &mut self.low_cut {
            stage.reset();
        }
        self.peak.reset();
        for stage in &mut self.high_cut {
            stage.reset();
        }
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
