//! CLI Command Implementations

use std::path::{Path, PathBuf};

use log::info;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::dsp::EffectSpec;
use crate::engine::{AudioSource, ExportFormat, MixSession};
use crate::error::Result;

/// Arguments of the `mix` command
#[derive(Debug, Clone)]
pub struct MixRequest {
    pub inputs: Vec<PathBuf>,
    pub ratios: Vec<f32>,
    pub effect: String,
    pub params: Option<String>,
    pub output: String,
    pub format: ExportFormat,
    pub output_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// Load the config file, or the defaults when none is given
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    }
}

/// Parse the `--params` JSON; absent means every parameter at its default
fn parse_params(params: Option<&str>) -> Result<Value> {
    match params {
        None => Ok(Value::Null),
        Some(text) => Ok(serde_json::from_str(text)?),
    }
}

/// Fill in the default ratio when the caller gave none
fn resolve_ratios(ratios: &[f32], streams: usize, config: &EngineConfig) -> Vec<f32> {
    if ratios.is_empty() {
        vec![config.default_mix_ratio; streams.saturating_sub(1)]
    } else {
        ratios.to_vec()
    }
}

/// Decode, mix, apply the effect and export.
pub fn mix(request: &MixRequest) -> Result<PathBuf> {
    let mut config = load_config(request.config.as_deref())?;
    if let Some(dir) = &request.output_dir {
        config.output_dir = dir.clone();
    }

    let effect = EffectSpec::from_name(&request.effect, &parse_params(request.params.as_deref())?)?;
    let ratios = resolve_ratios(&request.ratios, request.inputs.len(), &config);
    let sources: Vec<AudioSource> = request.inputs.iter().cloned().map(AudioSource::Path).collect();

    info!(
        "Mixing {} files with ratios {:?}, effect {}",
        sources.len(),
        ratios,
        effect.name()
    );

    let mut session = MixSession::from_sources(&sources, &ratios, &config)?;
    session.apply_effect(effect)?;
    let report = session.export(&request.output, request.format, &config)?;

    println!("Exported: {}", report.path.display());
    println!(
        "  {} samples @ {} Hz ({})",
        report.num_samples, report.sample_rate, report.format
    );
    println!("  sha256 {}", report.sha256);

    Ok(report.path)
}

/// Print every effect and its parameter domains.
pub fn list_effects() -> Result<()> {
    for info in EffectSpec::catalog() {
        println!("{}", info.name);
        for param in &info.params {
            println!("  {:<14} {}", param.name, param.domain);
        }
    }
    Ok(())
}
