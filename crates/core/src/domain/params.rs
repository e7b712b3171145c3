//! User-facing parameters and the cross-thread settings snapshot
//!
//! The parameter store is the only state shared between the control thread
//! (UI, automation) and the audio callback. Each parameter lives in its own
//! atomic cell; the audio thread reads all of them once per block into an
//! immutable [`EqSettings`] snapshot. Per-field atomicity is sufficient
//! here: a write landing between two field reads skews the snapshot by one
//! block at most, and the next block recomputes everything anyway.

use crate::domain::audio::EqError;
use crossbeam::utils::CachePadded;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::trace;

pub type Result<T> = std::result::Result<T, EqError>;

/// Cut-filter steepness in dB per octave
///
/// Ordinal-encoded 0..3. Each step adds one cascaded second-order section,
/// and every section contributes 12 dB/octave. The mapping is the same for
/// the low-cut and high-cut bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slope {
    Db12,
    Db24,
    Db36,
    Db48,
}

impl Slope {
    /// All slopes in ordinal order
    pub const ALL: [Slope; 4] = [Slope::Db12, Slope::Db24, Slope::Db36, Slope::Db48];

    /// Number of active second-order sections for this slope
    pub fn sections(self) -> usize {
        self.index() + 1
    }

    /// Ordinal encoding, 0..3
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Slope> {
        Self::ALL.get(index).copied()
    }

    pub fn db_per_octave(self) -> u32 {
        12 * (self.index() as u32 + 1)
    }
}

impl Default for Slope {
    fn default() -> Self {
        Slope::Db12
    }
}

impl fmt::Display for Slope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} dB/Oct", self.db_per_octave())
    }
}

/// Immutable snapshot of every user-facing parameter
///
/// Built once per audio block by [`ParameterStore::snapshot`]. Values are
/// already clamped to their declared ranges by the store, so the realtime
/// path consumes them without further checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EqSettings {
    /// Low-cut corner frequency in Hz
    pub low_cut_freq: f32,
    /// High-cut corner frequency in Hz
    pub high_cut_freq: f32,
    /// Peak band center frequency in Hz
    pub peak_freq: f32,
    /// Peak band gain in dB
    pub peak_gain_db: f32,
    /// Peak band Q factor, must be positive
    pub peak_quality: f32,
    pub low_cut_slope: Slope,
    pub high_cut_slope: Slope,
}

impl Default for EqSettings {
    fn default() -> Self {
        Self {
            low_cut_freq: ParamId::LowCutFreq.spec().default,
            high_cut_freq: ParamId::HighCutFreq.spec().default,
            peak_freq: ParamId::PeakFreq.spec().default,
            peak_gain_db: ParamId::PeakGain.spec().default,
            peak_quality: ParamId::PeakQuality.spec().default,
            low_cut_slope: Slope::default(),
            high_cut_slope: Slope::default(),
        }
    }
}

impl EqSettings {
    /// Check every field against its declared range
    ///
    /// Snapshots taken from a [`ParameterStore`] always pass. This exists
    /// for settings assembled by hand (presets, tests), which enter the
    /// engine through `prepare` where violations must fail fast.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (ParamId::LowCutFreq, self.low_cut_freq),
            (ParamId::HighCutFreq, self.high_cut_freq),
            (ParamId::PeakFreq, self.peak_freq),
            (ParamId::PeakGain, self.peak_gain_db),
            (ParamId::PeakQuality, self.peak_quality),
        ];
        for (id, value) in checks {
            let spec = id.spec();
            if !value.is_finite() || value < spec.min || value > spec.max {
                return Err(EqError::InvalidConfiguration(format!(
                    "{} = {} outside [{}, {}]",
                    spec.name, value, spec.min, spec.max
                )));
            }
        }
        if self.peak_quality <= 0.0 {
            return Err(EqError::InvalidConfiguration(format!(
                "Peak Quality must be positive, got {}",
                self.peak_quality
            )));
        }
        Ok(())
    }
}

/// Identifier for one of the seven equalizer parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamId {
    LowCutFreq,
    HighCutFreq,
    PeakFreq,
    PeakGain,
    PeakQuality,
    LowCutSlope,
    HighCutSlope,
}

/// Declared range and default for a parameter
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

const PARAM_COUNT: usize = 7;

/// Parameter registry: host-visible names, ranges, and defaults
///
/// Slope parameters store their ordinal (0..3) as a float, the same
/// encoding hosts use for choice parameters.
const PARAMS: [ParamSpec; PARAM_COUNT] = [
    ParamSpec { name: "LowCut Freq", min: 20.0, max: 20000.0, default: 20.0 },
    ParamSpec { name: "HighCut Freq", min: 20.0, max: 20000.0, default: 20000.0 },
    ParamSpec { name: "Peak Freq", min: 20.0, max: 20000.0, default: 750.0 },
    ParamSpec { name: "Peak Gain", min: -24.0, max: 24.0, default: 0.0 },
    ParamSpec { name: "Peak Quality", min: 0.1, max: 10.0, default: 1.0 },
    ParamSpec { name: "LowCut Slope", min: 0.0, max: 3.0, default: 0.0 },
    ParamSpec { name: "HighCut Slope", min: 0.0, max: 3.0, default: 0.0 },
];

impl ParamId {
    pub const ALL: [ParamId; PARAM_COUNT] = [
        ParamId::LowCutFreq,
        ParamId::HighCutFreq,
        ParamId::PeakFreq,
        ParamId::PeakGain,
        ParamId::PeakQuality,
        ParamId::LowCutSlope,
        ParamId::HighCutSlope,
    ];

    pub fn spec(self) -> &'static ParamSpec {
        &PARAMS[self as usize]
    }

    /// Look a parameter up by its host-visible name
    pub fn from_name(name: &str) -> Option<ParamId> {
        Self::ALL.iter().copied().find(|id| id.spec().name == name)
    }
}

/// Lock-free store of the current parameter values
///
/// One cache-padded atomic f32 cell per parameter, so control-thread writes
/// to one parameter never contend with audio-thread reads of another.
/// Writers clamp to the declared range; readers therefore never observe an
/// out-of-range value.
pub struct ParameterStore {
    cells: [CachePadded<AtomicU32>; PARAM_COUNT],
}

impl ParameterStore {
    /// Create a store with every parameter at its default
    pub fn new() -> Self {
        Self {
            cells: std::array::from_fn(|i| {
                CachePadded::new(AtomicU32::new(PARAMS[i].default.to_bits()))
            }),
        }
    }

    /// Write a parameter value, clamped to its declared range
    ///
    /// Non-finite input falls back to the parameter's default rather than
    /// poisoning the audio path.
    pub fn set(&self, id: ParamId, value: f32) {
        let spec = id.spec();
        let clamped = if value.is_finite() {
            value.clamp(spec.min, spec.max)
        } else {
            spec.default
        };
        self.cells[id as usize].store(clamped.to_bits(), Ordering::Release);
        trace!("Parameter {} set to {}", spec.name, clamped);
    }

    /// Write a parameter by its host-visible name
    pub fn set_by_name(&self, name: &str, value: f32) -> Result<()> {
        let id = ParamId::from_name(name).ok_or_else(|| {
            EqError::InvalidConfiguration(format!("Unknown parameter: {name}"))
        })?;
        self.set(id, value);
        Ok(())
    }

    /// Write a slope parameter from its enum value
    pub fn set_slope(&self, id: ParamId, slope: Slope) {
        self.set(id, slope.index() as f32);
    }

    pub fn get(&self, id: ParamId) -> f32 {
        f32::from_bits(self.cells[id as usize].load(Ordering::Acquire))
    }

    /// Take an immutable snapshot of all parameters
    ///
    /// One atomic load per field; each named parameter lands in its
    /// correspondingly named field.
    pub fn snapshot(&self) -> EqSettings {
        EqSettings {
            low_cut_freq: self.get(ParamId::LowCutFreq),
            high_cut_freq: self.get(ParamId::HighCutFreq),
            peak_freq: self.get(ParamId::PeakFreq),
            peak_gain_db: self.get(ParamId::PeakGain),
            peak_quality: self.get(ParamId::PeakQuality),
            low_cut_slope: slope_from_cell(self.get(ParamId::LowCutSlope)),
            high_cut_slope: slope_from_cell(self.get(ParamId::HighCutSlope)),
        }
    }

    /// Write a whole settings bundle (preset load, state restore)
    pub fn apply(&self, settings: &EqSettings) {
        self.set(ParamId::LowCutFreq, settings.low_cut_freq);
        self.set(ParamId::HighCutFreq, settings.high_cut_freq);
        self.set(ParamId::PeakFreq, settings.peak_freq);
        self.set(ParamId::PeakGain, settings.peak_gain_db);
        self.set(ParamId::PeakQuality, settings.peak_quality);
        self.set_slope(ParamId::LowCutSlope, settings.low_cut_slope);
        self.set_slope(ParamId::HighCutSlope, settings.high_cut_slope);
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a slope cell; the cell is clamped to [0, 3] so this cannot miss
fn slope_from_cell(value: f32) -> Slope {
    Slope::from_index(value.round().clamp(0.0, 3.0) as usize).unwrap_or_default()
}
