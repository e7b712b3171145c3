//! Audio stream value types and the equalizer error taxonomy
//!
//! These types define the prepare-time contract between the host's audio
//! callback and the equalizer engine. Device negotiation and bus layout
//! handling live in the host, not here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur in the equalizer core
///
/// The per-block processing path is infallible given valid inputs; every
/// variant here is raised at the orchestration boundary, before any sample
/// is touched.
#[derive(Debug, Error)]
pub enum EqError {
    /// `process_block` was called before `prepare`
    #[error("Engine not prepared: call prepare() before process_block()")]
    NotPrepared,

    /// A configuration or contract violation (out-of-range parameter,
    /// zero-sized block, non-positive Q)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type Result<T> = std::result::Result<T, EqError>;

/// Audio sample rate in Hz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleRate {
    Hz44100,
    Hz48000,
    Hz96000,
    Hz192000,
    Custom(u32),
}

impl SampleRate {
    pub fn hz(&self) -> u32 {
        match self {
            SampleRate::Hz44100 => 44100,
            SampleRate::Hz48000 => 48000,
            SampleRate::Hz96000 => 96000,
            SampleRate::Hz192000 => 192000,
            SampleRate::Custom(hz) => *hz,
        }
    }

    pub fn from_hz(hz: u32) -> Self {
        match hz {
            44100 => SampleRate::Hz44100,
            48000 => SampleRate::Hz48000,
            96000 => SampleRate::Hz96000,
            192000 => SampleRate::Hz192000,
            hz => SampleRate::Custom(hz),
        }
    }
}

/// Number of audio channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelCount {
    Mono,
    Stereo,
    Surround(u16),
}

impl ChannelCount {
    pub fn count(&self) -> u16 {
        match self {
            ChannelCount::Mono => 1,
            ChannelCount::Stereo => 2,
            ChannelCount::Surround(n) => *n,
        }
    }
}

/// Prepare-time contract for a processing session
///
/// The host supplies this before the first block and again whenever the
/// sample rate or maximum block size changes. `channels` describes the
/// buffer layout the engine will be handed; the engine filters the first
/// two channels and silences the rest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BlockSpec {
    pub sample_rate: SampleRate,
    pub max_block_size: u32,
    pub channels: ChannelCount,
}

impl Default for BlockSpec {
    fn default() -> Self {
        Self {
            sample_rate: SampleRate::Hz48000,
            max_block_size: 512,
            channels: ChannelCount::Stereo,
        }
    }
}
