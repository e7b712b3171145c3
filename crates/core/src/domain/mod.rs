//! Domain entities and business rules

pub mod audio;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod params;

// Re-export specific items to avoid ambiguous glob imports
pub use audio::{BlockSpec, ChannelCount, EqError, SampleRate};
pub use config::{ConfigError, EqPreset};
pub use dsp::{
    db_to_gain, design_high_cut, design_low_cut, gain_to_db, BiquadCoeffs, BiquadStage, CutBand,
    CutCoefficients, FilterChain, MAX_CUT_SECTIONS,
};
pub use engine::EqualizerEngine;
pub use params::{EqSettings, ParamId, ParamSpec, ParameterStore, Slope};
