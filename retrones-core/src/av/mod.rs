//! Audio/Video bridging for retrones-core.
//!
//! - Video: the core renders an indexed plane plus a palette. [`video::FrameConverter`] packs it
//!   to RGB565 through a per-frame lookup table, crops overscan and hands a strided view to a
//!   [`VideoOutput`].
//!
//! - Audio: [`audio::AudioPipeline`] picks which of the core's sample sinks is bound, then
//!   drains samples each frame and hands interleaved stereo i16 to an [`AudioOutput`].
//!
//! Notes:
//! - Output buffers are owned here and reused frame to frame; hosts only borrow them for the
//!   duration of the publish call.
//! - The core's sample sink is only rebound when the resolved strategy actually changes.

pub mod audio;
pub mod video;


pub use audio::{AudioMode, AudioPipeline, AudioStrategy, BufferKind, EffectsConfig};
pub use video::{AspectMode, FrameConverter, FrameView, Geometry, Overscan, compute_geometry};

/// Sink for converted video frames.
///
/// `pixels` starts at the top-left visible pixel; rows are `pitch_bytes` apart.
pub trait VideoOutput {
    fn publish(&mut self, pixels: &[u16], width: usize, height: usize, pitch_bytes: usize);
}

/// Sink for interleaved stereo samples (`L, R, L, R, ...`).
pub trait AudioOutput {
    fn upload_audio(&mut self, interleaved: &[i16]);
}

/// Timing and geometry advertised to the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AvInfo {
    pub geometry: Geometry,
    pub fps: f64,
    pub sample_rate: f64,
}
