//! Mix sessions
//!
//! A session holds the state of one mixing operation: the decoded streams at
//! a common rate, their ratios, the dry mix and the mix with its effect.
//! It lives only as long as the caller keeps it; exporting consumes it.

use chrono::{DateTime, Utc};
use log::{debug, info};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::dsp::EffectSpec;
use crate::engine::buffer::{MixRatio, SampleBuffer};
use crate::engine::decoder::{decode, AudioSource};
use crate::engine::encoder::{encode, ExportFormat, ExportReport};
use crate::engine::mixer;
use crate::engine::resampler::resample;
use crate::error::{Result, StemmixError};

/// State for a single mix, from decoded streams to exported file
#[derive(Debug, Clone)]
pub struct MixSession {
    id: String,
    created_at: DateTime<Utc>,
    buffers: Vec<SampleBuffer>,
    ratios: Vec<MixRatio>,
    mixed: Option<SampleBuffer>,
    effect: EffectSpec,
    processed: Option<SampleBuffer>,
}

impl MixSession {
    /// Start a session from already decoded buffers
    ///
    /// Every buffer is brought to `sample_rate`. Ratios are checked here so a
    /// bad request fails before any mixing work.
    pub fn new(buffers: Vec<SampleBuffer>, ratios: &[f32], sample_rate: u32) -> Result<Self> {
        if buffers.len() < 2 {
            return Err(StemmixError::TooFewStreams {
                count: buffers.len(),
            });
        }
        if ratios.len() != buffers.len() - 1 {
            return Err(StemmixError::MixArity {
                buffers: buffers.len(),
                ratios: ratios.len(),
            });
        }
        let ratios = MixRatio::from_slice(ratios)?;

        let buffers = buffers
            .into_iter()
            .map(|buffer| resample(buffer, sample_rate))
            .collect::<Result<Vec<_>>>()?;

        let session = Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            buffers,
            ratios,
            mixed: None,
            effect: EffectSpec::None,
            processed: None,
        };
        debug!(
            "Session {}: {} streams @ {} Hz",
            session.id,
            session.buffers.len(),
            sample_rate
        );
        Ok(session)
    }

    /// Decode every source at the configured rate and start a session
    pub fn from_sources(
        sources: &[AudioSource],
        ratios: &[f32],
        config: &EngineConfig,
    ) -> Result<Self> {
        if sources.len() < 2 {
            return Err(StemmixError::TooFewStreams {
                count: sources.len(),
            });
        }
        let options = config.decode_options();
        let buffers = sources
            .iter()
            .map(|source| decode(source, &options))
            .collect::<Result<Vec<_>>>()?;
        Self::new(buffers, ratios, config.sample_rate)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Number of input streams
    pub fn stream_count(&self) -> usize {
        self.buffers.len()
    }

    /// Rate shared by every stream and the mix
    pub fn sample_rate(&self) -> u32 {
        self.buffers[0].sample_rate()
    }

    /// The effect currently applied to the mix
    pub fn effect(&self) -> &EffectSpec {
        &self.effect
    }

    /// Mix the streams, reusing an earlier result
    pub fn mix(&mut self) -> Result<&SampleBuffer> {
        if self.mixed.is_none() {
            let mixed = mixer::mix(&self.buffers, &self.ratios)?;
            info!(
                "Session {}: mixed {} streams into {:.2}s",
                self.id,
                self.buffers.len(),
                mixed.duration_secs()
            );
            self.mixed = Some(mixed);
        }
        self.dry()
    }

    fn dry(&self) -> Result<&SampleBuffer> {
        self.mixed.as_ref().ok_or_else(|| StemmixError::InvalidBuffer {
            reason: "session has not been mixed".to_string(),
        })
    }

    /// Apply `effect` to the dry mix, replacing any earlier effect
    pub fn apply_effect(&mut self, effect: EffectSpec) -> Result<&SampleBuffer> {
        self.mix()?;
        let processed = effect.apply(self.dry()?)?;
        debug!("Session {}: applied {}", self.id, effect.name());
        self.effect = effect;
        self.processed = Some(processed);
        self.output()
    }

    /// Drop the effect and go back to the dry mix
    pub fn clear_effect(&mut self) {
        self.effect = EffectSpec::None;
        self.processed = None;
    }

    /// The buffer that would be exported: processed if an effect is set,
    /// otherwise the dry mix
    pub fn output(&self) -> Result<&SampleBuffer> {
        match &self.processed {
            Some(buffer) => Ok(buffer),
            None => self.dry(),
        }
    }

    /// Write the output to `<output_dir>/<stem>.<ext>` and end the session
    pub fn export(
        mut self,
        stem: &str,
        format: ExportFormat,
        config: &EngineConfig,
    ) -> Result<ExportReport> {
        self.mix()?;
        let path = config
            .output_dir
            .join(format!("{}.{}", stem, format.extension()));
        let report = encode(self.output()?, &path, format, &config.encode_options())?;
        debug!(
            "Session {}: exported {} ({} samples)",
            self.id,
            report.path.display(),
            report.num_samples
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{Delay, Distortion};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn tone(freq: f32, secs: f32, rate: u32) -> SampleBuffer {
        SampleBuffer::sine(freq, 0.5, secs, rate).unwrap()
    }

    fn two_stream_session() -> MixSession {
        MixSession::new(
            vec![tone(440.0, 0.5, 44100), tone(660.0, 0.5, 44100)],
            &[0.5],
            44100,
        )
        .unwrap()
    }

    #[test]
    fn test_new_resamples_to_common_rate() {
        let session = MixSession::new(
            vec![tone(440.0, 1.0, 44100), tone(440.0, 1.0, 22050)],
            &[0.5],
            44100,
        )
        .unwrap();
        assert_eq!(session.sample_rate(), 44100);
        assert_eq!(session.stream_count(), 2);
    }

    #[test]
    fn test_new_rejects_bad_arity() {
        let buffers = vec![tone(440.0, 0.1, 44100); 3];
        let err = MixSession::new(buffers, &[0.5], 44100).unwrap_err();
        assert!(matches!(err, StemmixError::MixArity { buffers: 3, ratios: 1 }));

        let err = MixSession::new(vec![tone(440.0, 0.1, 44100)], &[], 44100).unwrap_err();
        assert!(matches!(err, StemmixError::TooFewStreams { count: 1 }));
    }

    #[test]
    fn test_new_rejects_out_of_range_ratio() {
        let buffers = vec![tone(440.0, 0.1, 44100); 2];
        let err = MixSession::new(buffers, &[1.5], 44100).unwrap_err();
        assert!(matches!(err, StemmixError::RatioOutOfRange { index: 0, .. }));
    }

    #[test]
    fn test_output_before_mix_fails() {
        let session = two_stream_session();
        assert!(session.output().is_err());
    }

    #[test]
    fn test_effect_always_starts_from_dry_mix() {
        let mut session = two_stream_session();
        let dry = session.mix().unwrap().clone();

        let distortion = EffectSpec::Distortion(Distortion::new(0.8).unwrap());
        let once = session.apply_effect(distortion.clone()).unwrap().clone();
        let twice = session.apply_effect(distortion).unwrap().clone();
        assert_eq!(once, twice);
        assert_ne!(once, dry);

        session.apply_effect(EffectSpec::Delay(Delay::default())).unwrap();
        assert_eq!(session.effect().name(), "delay");

        session.clear_effect();
        assert_eq!(session.output().unwrap(), &dry);
        assert_eq!(session.effect(), &EffectSpec::None);
    }

    #[test]
    fn test_apply_effect_mixes_first() {
        let mut session = two_stream_session();
        let output = session.apply_effect(EffectSpec::None).unwrap();
        assert_eq!(output.len(), 22050);
    }

    #[test]
    fn test_failed_effect_keeps_previous_output() {
        let mut session = two_stream_session();
        session
            .apply_effect(EffectSpec::Distortion(Distortion::new(0.3).unwrap()))
            .unwrap();
        let before = session.output().unwrap().clone();

        let bad = EffectSpec::Delay(Delay {
            delay_time_ms: -1.0,
            decay_ratio: 0.5,
        });
        assert!(session.apply_effect(bad).is_err());
        assert_eq!(session.output().unwrap(), &before);
        assert_eq!(session.effect().name(), "distortion");
    }

    #[test]
    fn test_export_writes_into_output_dir() {
        let dir = tempdir().unwrap();
        let config = EngineConfig {
            output_dir: dir.path().to_path_buf(),
            ..EngineConfig::default()
        };

        let session = two_stream_session();
        let id = session.id().to_string();
        assert!(!id.is_empty());

        let report = session.export("mixed_audio", ExportFormat::Wav, &config).unwrap();
        assert_eq!(report.path, dir.path().join("mixed_audio.wav"));
        assert_eq!(report.num_samples, 22050);
        assert!(report.path.exists());
    }
}
