//! Madrigal CLI Application
//!
//! Offline driver for the equalizer core: loads an optional preset, runs
//! probe tones through the engine, and prints the measured band response
//! next to the analytic one.

use anyhow::Context;
use clap::Parser;
use madrigal_core::domain::audio::{BlockSpec, ChannelCount, SampleRate};
use madrigal_core::domain::config::EqPreset;
use madrigal_core::domain::dsp::{
    db_to_gain, design_high_cut, design_low_cut, gain_to_db, BiquadCoeffs,
};
use madrigal_core::domain::engine::EqualizerEngine;
use madrigal_core::domain::params::{EqSettings, ParameterStore};
use std::path::PathBuf;

const PROBE_FREQS: [f32; 8] = [30.0, 60.0, 120.0, 250.0, 750.0, 2000.0, 8000.0, 16000.0];

#[derive(Parser)]
#[command(name = "madrigal")]
#[command(about = "A parametric equalizer core, driven offline", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// TOML preset to load before measuring
    #[arg(short, long)]
    preset: Option<PathBuf>,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 48000)]
    sample_rate: u32,

    /// Processing block size in samples
    #[arg(long, default_value_t = 512)]
    block_size: u32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    tracing::info!("🎚 Madrigal starting...");

    let store = ParameterStore::new();
    if let Some(path) = &cli.preset {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading preset {}", path.display()))?;
        let preset = EqPreset::from_toml_str(&text)
            .with_context(|| format!("parsing preset {}", path.display()))?;
        tracing::info!("Applying preset '{}'", preset.name);
        store.apply(&preset.settings);
    }

    let spec = BlockSpec {
        sample_rate: SampleRate::from_hz(cli.sample_rate),
        max_block_size: cli.block_size,
        channels: ChannelCount::Stereo,
    };
    let settings = store.snapshot();

    let mut engine = EqualizerEngine::new();
    engine.prepare(&spec, &settings)?;

    println!("Settings: {settings:?}");
    println!();
    println!("{:>10}  {:>12}  {:>12}", "freq (Hz)", "measured", "analytic");
    for freq in PROBE_FREQS {
        engine.reset();
        let measured = measure_gain_db(&mut engine, &store, freq, &cli)?;
        let analytic = analytic_gain_db(&settings, cli.sample_rate as f32, freq);
        println!("{freq:>10.0}  {measured:>9.2} dB  {analytic:>9.2} dB");
    }

    Ok(())
}

/// Run a one-second probe sine through the engine in host-sized blocks and
/// measure the steady-state gain
fn measure_gain_db(
    engine: &mut EqualizerEngine,
    store: &ParameterStore,
    freq: f32,
    cli: &Cli,
) -> anyhow::Result<f32> {
    let sample_rate = cli.sample_rate as f32;
    let samples = cli.sample_rate as usize;
    let input: Vec<f32> = (0..samples)
        .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin())
        .collect();

    let mut output = input.clone();
    for chunk in output.chunks_mut(cli.block_size as usize) {
        // One snapshot per block, the same cadence a host would use
        let settings = store.snapshot();
        let mut channels: [&mut [f32]; 1] = [chunk];
        engine.process_block(&mut channels, &settings)?;
    }

    let tail = samples / 2;
    Ok(gain_to_db(rms(&output[tail..]) / rms(&input[tail..])))
}

/// Combined analytic magnitude of the three bands at `freq`
fn analytic_gain_db(settings: &EqSettings, sample_rate: f32, freq: f32) -> f32 {
    let low_cut = design_low_cut(
        settings.low_cut_freq,
        sample_rate,
        settings.low_cut_slope.sections(),
    );
    let high_cut = design_high_cut(
        settings.high_cut_freq,
        sample_rate,
        settings.high_cut_slope.sections(),
    );
    let peak = BiquadCoeffs::peaking(
        sample_rate,
        settings.peak_freq,
        settings.peak_quality,
        db_to_gain(settings.peak_gain_db),
    );

    low_cut.magnitude_db(sample_rate, freq)
        + peak.magnitude_db(sample_rate, freq)
        + high_cut.magnitude_db(sample_rate, freq)
}

fn rms(samples: &[f32]) -> f32 {
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}
