use log::*;

use super::AudioOutput;
use crate::abi::SAMPLE_RATE;
use crate::emu::{EmulationCore, Equalizer};

/// Samples pulled from the core per read.
pub const SAMPLE_CHUNK: usize = 2048;

/// Upper bound on reads per frame. A core that still has a full chunk waiting after this many
/// reads is producing far more than one frame of audio.
const MAX_CHUNKS_PER_FRAME: usize = 4;

/// Audio mode as exposed in the host's option menu.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AudioMode {
    #[default]
    Nonlinear,
    Linear,
    StereoPanning,
}

/// Which of the core's sample sinks is bound.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BufferKind {
    Silent,
    Mono,
    /// Nonlinear NES mixing, mono output.
    Nes,
    /// Panning, echo and reverb; produces interleaved stereo.
    Effects,
}

/// Settings for the effects sink.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectsConfig {
    pub pan_left: f32,
    pub pan_right: f32,
    pub delay_variance: f32,
    pub reverb_delay: f32,
    pub echo_delay: f32,
    pub reverb_level: f32,
    pub echo_level: f32,
    pub effects_enabled: bool,
}

impl EffectsConfig {
    /// Partial panning with a little echo and reverb for depth.
    pub const STEREO_PANNING: Self = Self {
        pan_left: -0.6,
        pan_right: 0.6,
        delay_variance: 18.0,
        reverb_delay: 88.0,
        echo_delay: 61.0,
        reverb_level: 0.2,
        echo_level: 0.2,
        effects_enabled: true,
    };
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self::STEREO_PANNING
    }
}

/// The post-processing applied to the core's samples before they reach the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AudioStrategy {
    Silent,
    Mono,
    Nes,
    Effects(EffectsConfig),
}

impl AudioStrategy {
    /// Hard mute wins over whatever mode is configured.
    pub fn resolve(mode: AudioMode, hard_mute: bool) -> Self {
        if hard_mute {
            return Self::Silent;
        }
        match mode {
            AudioMode::Nonlinear => Self::Nes,
            AudioMode::Linear => Self::Mono,
            AudioMode::StereoPanning => Self::Effects(EffectsConfig::STEREO_PANNING),
        }
    }

    pub fn kind(&self) -> BufferKind {
        match self {
            Self::Silent => BufferKind::Silent,
            Self::Mono => BufferKind::Mono,
            Self::Nes => BufferKind::Nes,
            Self::Effects(_) => BufferKind::Effects,
        }
    }

    /// Whether the bound sink already interleaves stereo.
    pub fn is_stereo(&self) -> bool {
        matches!(self, Self::Effects(_))
    }
}

/// Owns the active [`AudioStrategy`] and the scratch buffers used to shape samples.
#[derive(Debug)]
pub struct AudioPipeline {
    active: Option<AudioStrategy>,
    raw: Vec<i16>,
    stereo: Vec<i16>,
}

impl Default for AudioPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioPipeline {
    pub fn new() -> Self {
        Self {
            active: None,
            raw: vec![0; SAMPLE_CHUNK],
            stereo: Vec::with_capacity(SAMPLE_CHUNK * 2),
        }
    }

    pub fn active_kind(&self) -> Option<BufferKind> {
        self.active.map(|s| s.kind())
    }

    /// Resolve `mode`/`hard_mute` to a strategy and make it active.
    ///
    /// The core's sink (and its sample rate) is rebound only when the resolved kind differs
    /// from the active one, since rebinding resets the sink. Returns whether a rebind happened.
    pub fn select_strategy<C: EmulationCore>(
        &mut self,
        core: &mut C,
        mode: AudioMode,
        hard_mute: bool,
    ) -> anyhow::Result<bool> {
        let resolved = AudioStrategy::resolve(mode, hard_mute);
        let rebind = self.active_kind() != Some(resolved.kind());

        if rebind {
            core.set_sample_rate(SAMPLE_RATE, resolved.kind())?;
            debug!(
                "audio sink rebound: {:?} -> {:?}",
                self.active_kind(),
                resolved.kind()
            );
        }

        if let AudioStrategy::Effects(config) = &resolved {
            core.configure_effects(config);
        }

        self.active = Some(resolved);
        Ok(rebind)
    }

    pub fn apply_equalizer<C: EmulationCore>(&self, core: &mut C, eq: Equalizer) {
        core.set_equalizer(eq);
    }

    /// Pull up to `max_samples` raw samples and forward them as interleaved stereo.
    ///
    /// Mono sinks are duplicated into both channels; the effects sink already delivers pairs.
    /// Returns the number of raw samples pulled from the core.
    pub fn read_and_shape<C: EmulationCore>(
        &mut self,
        core: &mut C,
        max_samples: usize,
        out: &mut dyn AudioOutput,
    ) -> usize {
        if self.raw.len() < max_samples {
            self.raw.resize(max_samples, 0);
        }
        let read = core
            .read_samples(&mut self.raw[..max_samples])
            .min(max_samples);
        let samples = &self.raw[..read];

        if self.active.is_some_and(|s| s.is_stereo()) {
            let frames = read / 2;
            if frames != 0 {
                out.upload_audio(&samples[..frames * 2]);
            }
        } else if read != 0 {
            self.stereo.clear();
            self.stereo.extend(samples.iter().flat_map(|&s| [s, s]));
            out.upload_audio(&self.stereo);
        }

        read
    }

    /// Discard up to `max_samples` so the core's buffer cannot back up.
    pub fn drain<C: EmulationCore>(&mut self, core: &mut C, max_samples: usize) -> usize {
        core.skip_samples(max_samples)
    }

    /// Per-frame audio step: forward everything the core produced, or drop it when audio is
    /// disabled for this frame. Either way the core's buffer ends the frame empty.
    pub fn pump<C: EmulationCore>(
        &mut self,
        core: &mut C,
        out: &mut dyn AudioOutput,
        enabled: bool,
    ) -> usize {
        let mut total = 0;
        for _ in 0..MAX_CHUNKS_PER_FRAME {
            let pulled = if enabled {
                self.read_and_shape(core, SAMPLE_CHUNK, out)
            } else {
                self.drain(core, SAMPLE_CHUNK)
            };
            total += pulled;
            if pulled < SAMPLE_CHUNK {
                return total;
            }
        }
        warn!("core still has audio queued after {total} samples this frame");
        total
    }

    /// Capture the active sink's internal buffers (fast save states only).
    pub fn snapshot<C: EmulationCore>(&self, core: &mut C) {
        if self.active.is_some() {
            core.save_audio_buffer_state();
        }
    }

    pub fn restore<C: EmulationCore>(&self, core: &mut C) {
        if self.active.is_some() {
            core.restore_audio_buffer_state();
        }
    }
}
