//! Interface to the emulation core.
//!
//! The core (CPU, PPU, APU, mappers) lives outside this crate. Everything the bridging layer
//! needs from it is expressed by [`EmulationCore`]; a concrete core crate implements the trait
//! and invokes [`crate::retrones_core!`] to become a loadable libretro core.

use std::ffi::CStr;
use std::io::Write;

use crate::av::audio::{BufferKind, EffectsConfig};
use crate::input::Buttons;

/// Static description reported through `retro_get_system_info`.
#[derive(Clone, Copy, Debug)]
pub struct CoreInfo {
    pub library_name: &'static CStr,
    pub library_version: &'static CStr,
    /// `|`-separated list of extensions, e.g. `c"nes"`.
    pub valid_extensions: &'static CStr,
}

impl CoreInfo {
    pub const fn new(library_name: &'static CStr, library_version: &'static CStr) -> Self {
        Self {
            library_name,
            library_version,
            valid_extensions: c"nes",
        }
    }

    pub const fn supports_roms_with_extensions(mut self, extensions: &'static CStr) -> Self {
        self.valid_extensions = extensions;
        self
    }
}

/// Sprite-per-scanline behaviour.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SpriteMode {
    /// Hardware-accurate 8-sprite limit (flicker).
    Visible,
    /// Limit lifted.
    #[default]
    Enhanced,
}

/// Audio equalizer presets offered by the core.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Equalizer {
    #[default]
    Nes,
    Famicom,
    Tv,
    Flat,
    Crisp,
    Tinny,
}

/// One entry of the core's master color table.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// The core's output for one step. Borrowed from the core; valid until the next step.
#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    /// Indexed plane starting at the first visible pixel. Rows are `pitch` bytes apart; the
    /// extra columns past `IMAGE_WIDTH` are border used by the core's renderer.
    pub pixels: &'a [u8],
    pub pitch: usize,
    /// Maps each pixel value to an index into `colors`.
    pub palette: &'a [u16; 256],
    /// Master color table.
    pub colors: &'a [Rgb],
}

/// The external emulation core.
pub trait EmulationCore: Default + Send {
    /// Visible picture width before any overscan crop.
    const IMAGE_WIDTH: usize = 256;
    /// Visible picture height before any overscan crop.
    const IMAGE_HEIGHT: usize = 240;
    const FRAME_RATE: f64;
    /// Length of the system (work) RAM region published at address 0x0000.
    const SYSTEM_RAM_SIZE: usize;
    /// Length of the cartridge RAM region published at address 0x6000.
    const SAVE_RAM_SIZE: usize;

    fn info() -> CoreInfo;

    fn load_ines(&mut self, rom: &[u8]) -> anyhow::Result<()>;
    fn close(&mut self);
    fn reset(&mut self, full_reset: bool, erase_battery_ram: bool);

    fn set_sprite_mode(&mut self, mode: SpriteMode);
    fn set_palette_range(&mut self, begin: u8);
    fn set_equalizer(&mut self, eq: Equalizer);

    /// Rebind the core's sample sink. Resets the sink's internal state.
    fn set_sample_rate(&mut self, rate: u32, sink: BufferKind) -> anyhow::Result<()>;
    fn configure_effects(&mut self, config: &EffectsConfig);

    fn emulate_frame(&mut self, pad0: Buttons, pad1: Buttons) -> anyhow::Result<()>;
    /// Step one frame without rendering a picture.
    fn emulate_skip_frame(&mut self, pad0: Buttons, pad1: Buttons) -> anyhow::Result<()>;
    fn frame(&self) -> Frame<'_>;

    /// Copy up to `out.len()` samples out of the active sink; returns how many were written.
    /// Effects sinks produce interleaved stereo, every other sink mono.
    fn read_samples(&mut self, out: &mut [i16]) -> usize;
    /// Drop up to `count` samples; returns how many were dropped.
    fn skip_samples(&mut self, count: usize) -> usize;

    fn save_state(&self, out: &mut dyn Write) -> anyhow::Result<()>;
    fn load_state(&mut self, data: &[u8]) -> anyhow::Result<()>;
    /// Snapshot the active sink's buffered samples and delay lines.
    fn save_audio_buffer_state(&mut self);
    fn restore_audio_buffer_state(&mut self);

    fn system_ram(&mut self) -> &mut [u8];
    fn save_ram(&mut self) -> &mut [u8];
    fn has_battery_ram(&self) -> bool;
}
