//! Integration tests for the equalizer engine
//!
//! These tests drive the complete path a host would: parameter store to
//! settings snapshot to coefficient update to block processing, with the
//! signal split into host-sized blocks.

use madrigal_core::domain::audio::{BlockSpec, ChannelCount, EqError, SampleRate};
use madrigal_core::domain::config::EqPreset;
use madrigal_core::domain::dsp::gain_to_db;
use madrigal_core::domain::engine::EqualizerEngine;
use madrigal_core::domain::params::{EqSettings, ParamId, ParameterStore, Slope};

const SAMPLE_RATE: u32 = 48000;
const BLOCK_SIZE: usize = 512;

fn generate_sine(frequency: f32, samples: usize) -> Vec<f32> {
    (0..samples)
        .map(|i| 2.0 * std::f32::consts::PI * frequency * i as f32 / SAMPLE_RATE as f32)
        .map(|phase| phase.sin())
        .collect()
}

fn rms(samples: &[f32]) -> f32 {
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

fn prepared_engine(settings: &EqSettings) -> EqualizerEngine {
    let spec = BlockSpec {
        sample_rate: SampleRate::from_hz(SAMPLE_RATE),
        max_block_size: BLOCK_SIZE as u32,
        channels: ChannelCount::Stereo,
    };
    let mut engine = EqualizerEngine::new();
    engine.prepare(&spec, settings).unwrap();
    engine
}

/// Process a mono signal through the engine in host-sized blocks
fn process_blocks(engine: &mut EqualizerEngine, settings: &EqSettings, signal: &mut [f32]) {
    for chunk in signal.chunks_mut(BLOCK_SIZE) {
        let mut channels: [&mut [f32]; 1] = [chunk];
        engine.process_block(&mut channels, settings).unwrap();
    }
}

/// Steady-state gain of a one-second probe sine, in dB
fn measure_gain_db(settings: &EqSettings, frequency: f32) -> f32 {
    let mut engine = prepared_engine(settings);
    let input = generate_sine(frequency, SAMPLE_RATE as usize);
    let mut output = input.clone();
    process_blocks(&mut engine, settings, &mut output);

    let tail = input.len() / 2;
    gain_to_db(rms(&output[tail..]) / rms(&input[tail..]))
}

// ============================================================================
// END-TO-END SCENARIOS
// ============================================================================

#[test]
fn test_passband_transparency() {
    // Cuts parked at the band edges, peak at 0 dB: a full-scale 1 kHz sine
    // must pass through with less than 0.5 dB of change
    let settings = EqSettings {
        low_cut_freq: 20.0,
        low_cut_slope: Slope::Db12,
        high_cut_freq: 20000.0,
        high_cut_slope: Slope::Db12,
        peak_gain_db: 0.0,
        ..EqSettings::default()
    };

    let gain = measure_gain_db(&settings, 1000.0);
    assert!(
        gain.abs() < 0.5,
        "1 kHz through a neutral EQ: expected < 0.5 dB change, got {gain:.3} dB"
    );
}

#[test]
fn test_steep_low_cut_attenuation() {
    // Same neutral settings but a 48 dB/oct low cut: 10 Hz must sit at
    // least 40 dB below a 1 kHz reference of equal input amplitude
    let settings = EqSettings {
        low_cut_freq: 20.0,
        low_cut_slope: Slope::Db48,
        high_cut_freq: 20000.0,
        high_cut_slope: Slope::Db12,
        peak_gain_db: 0.0,
        ..EqSettings::default()
    };

    let reference = measure_gain_db(&settings, 1000.0);
    let rumble = measure_gain_db(&settings, 10.0);
    assert!(
        reference - rumble >= 40.0,
        "10 Hz vs 1 kHz under a 48 dB/oct low cut: expected >= 40 dB, got {:.1} dB",
        reference - rumble
    );
}

#[test]
fn test_consecutive_blocks_follow_their_snapshots() {
    // Two snapshots, one block each: every block must fully reflect its own
    // snapshot's coefficients; only delay-state memory carries over
    let open = EqSettings {
        low_cut_freq: 20.0,
        low_cut_slope: Slope::Db12,
        ..EqSettings::default()
    };
    let closed = EqSettings {
        low_cut_freq: 8000.0,
        low_cut_slope: Slope::Db48,
        ..EqSettings::default()
    };

    let mut engine = prepared_engine(&open);
    let block_len = 9600;
    let input = generate_sine(1000.0, block_len);

    let mut first = input.clone();
    process_blocks(&mut engine, &open, &mut first);
    let first_peak = first[block_len / 2..]
        .iter()
        .fold(0.0_f32, |m, s| m.max(s.abs()));

    let mut second = input.clone();
    process_blocks(&mut engine, &closed, &mut second);
    let second_peak = second[block_len / 2..]
        .iter()
        .fold(0.0_f32, |m, s| m.max(s.abs()));

    assert!(
        first_peak > 0.9,
        "open snapshot should pass 1 kHz, peak {first_peak}"
    );
    assert!(
        second_peak < 0.02,
        "closed snapshot should crush 1 kHz in its own block, peak {second_peak}"
    );
}

// ============================================================================
// STORE-DRIVEN PIPELINE
// ============================================================================

#[test]
fn test_parameter_store_drives_engine() {
    let store = ParameterStore::new();
    let mut engine = prepared_engine(&store.snapshot());

    let input = generate_sine(750.0, SAMPLE_RATE as usize);

    // Defaults: 750 Hz passes untouched
    let mut flat = input.clone();
    process_blocks(&mut engine, &store.snapshot(), &mut flat);
    let flat_gain = gain_to_db(rms(&flat[flat.len() / 2..]) / rms(&input[input.len() / 2..]));
    assert!(flat_gain.abs() < 0.5);

    // A control-thread write lands; the next snapshot picks it up
    store.set_by_name("Peak Gain", 12.0).unwrap();
    store.set_by_name("Peak Quality", 1.0).unwrap();

    engine.reset();
    let mut boosted = input.clone();
    process_blocks(&mut engine, &store.snapshot(), &mut boosted);
    let boost_gain = gain_to_db(rms(&boosted[boosted.len() / 2..]) / rms(&input[input.len() / 2..]));
    assert!(
        (boost_gain - 12.0).abs() < 1.0,
        "+12 dB peak at its center: got {boost_gain:.2} dB"
    );
}

#[test]
fn test_writes_between_blocks_take_effect_next_block() {
    let store = ParameterStore::new();
    let mut engine = prepared_engine(&store.snapshot());

    let input = generate_sine(100.0, 9600);

    let mut before = input.clone();
    process_blocks(&mut engine, &store.snapshot(), &mut before);
    let before_peak = before[4800..].iter().fold(0.0_f32, |m, s| m.max(s.abs()));
    assert!(before_peak > 0.9, "100 Hz passes with defaults");

    // Automation moves the low cut above the probe tone
    store.set(ParamId::LowCutFreq, 1000.0);
    store.set_slope(ParamId::LowCutSlope, Slope::Db48);

    let mut after = input.clone();
    process_blocks(&mut engine, &store.snapshot(), &mut after);
    let after_peak = after[4800..].iter().fold(0.0_f32, |m, s| m.max(s.abs()));
    assert!(
        after_peak < 0.01,
        "100 Hz under the moved low cut, peak {after_peak}"
    );
}

#[test]
fn test_preset_to_store_to_engine() {
    let toml = r#"
        name = "Rumble Guard"

        [settings]
        low_cut_freq = 120.0
        high_cut_freq = 20000.0
        peak_freq = 750.0
        peak_gain_db = 0.0
        peak_quality = 1.0
        low_cut_slope = "Db36"
        high_cut_slope = "Db12"
    "#;
    let preset = EqPreset::from_toml_str(toml).unwrap();

    let store = ParameterStore::new();
    store.apply(&preset.settings);
    let settings = store.snapshot();
    assert_eq!(settings.low_cut_slope, Slope::Db36);

    // 30 Hz is two octaves under the 120 Hz cut: a 36 dB/oct slope should
    // take it down by roughly 72 dB
    let gain = measure_gain_db(&settings, 30.0);
    assert!(
        gain < -60.0,
        "30 Hz under a 120 Hz 36 dB/oct low cut: got {gain:.1} dB"
    );
}

// ============================================================================
// STEREO AND BUFFER LAYOUT
// ============================================================================

#[test]
fn test_stereo_channels_keep_independent_state() {
    let settings = EqSettings {
        low_cut_freq: 1000.0,
        low_cut_slope: Slope::Db24,
        ..EqSettings::default()
    };
    let mut engine = prepared_engine(&settings);

    // Different material per side, same filter curve
    let mut left = generate_sine(100.0, SAMPLE_RATE as usize);
    let mut right = generate_sine(5000.0, SAMPLE_RATE as usize);

    for (left_chunk, right_chunk) in left
        .chunks_mut(BLOCK_SIZE)
        .zip(right.chunks_mut(BLOCK_SIZE))
    {
        let mut channels: [&mut [f32]; 2] = [left_chunk, right_chunk];
        engine.process_block(&mut channels, &settings).unwrap();
    }

    let left_peak = left[24000..].iter().fold(0.0_f32, |m, s| m.max(s.abs()));
    let right_peak = right[24000..].iter().fold(0.0_f32, |m, s| m.max(s.abs()));

    assert!(left_peak < 0.01, "100 Hz left should be cut, peak {left_peak}");
    assert!(right_peak > 0.9, "5 kHz right should pass, peak {right_peak}");
}

#[test]
fn test_extra_output_channels_are_silenced() {
    let settings = EqSettings::default();
    let mut engine = prepared_engine(&settings);

    let mut left = vec![0.5f32; BLOCK_SIZE];
    let mut right = vec![0.5f32; BLOCK_SIZE];
    let mut aux = vec![0.9f32; BLOCK_SIZE];
    let mut channels: [&mut [f32]; 3] = [&mut left, &mut right, &mut aux];
    engine.process_block(&mut channels, &settings).unwrap();

    assert!(aux.iter().all(|&s| s == 0.0));
}

#[test]
fn test_unprepared_engine_refuses_blocks() {
    let mut engine = EqualizerEngine::new();
    let mut block = vec![0.0f32; BLOCK_SIZE];
    let mut channels: [&mut [f32]; 1] = [&mut block];
    assert!(matches!(
        engine.process_block(&mut channels, &EqSettings::default()),
        Err(EqError::NotPrepared)
    ));
}

#[test]
fn test_peak_band_shapes_only_its_neighborhood() {
    let settings = EqSettings {
        peak_freq: 2000.0,
        peak_gain_db: -18.0,
        peak_quality: 2.0,
        ..EqSettings::default()
    };

    let notch = measure_gain_db(&settings, 2000.0);
    let below = measure_gain_db(&settings, 200.0);
    let above = measure_gain_db(&settings, 10000.0);

    assert!(
        (notch + 18.0).abs() < 1.0,
        "-18 dB peak at center: got {notch:.2} dB"
    );
    assert!(below.abs() < 1.0, "200 Hz should be untouched, got {below:.2} dB");
    assert!(above.abs() < 1.0, "10 kHz should be untouched, got {above:.2} dB");
}
