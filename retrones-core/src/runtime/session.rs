//! One loaded game.
//!
//! A [`Session`] owns the emulation core together with everything derived from the host's
//! options. It lives from a successful `retro_load_game` to `retro_unload_game`; there is no
//! state outside it besides the callback table.

use anyhow::Context;
use log::*;

use crate::abi::SAMPLE_RATE;
use crate::av::{AudioPipeline, AvInfo, FrameConverter, compute_geometry};
use crate::config::{ConfigBridge, Settings};
use crate::emu::EmulationCore;
use crate::error::{BridgeError, Result};
use crate::host::{AvFlags, Host};
use crate::input;
use crate::loader;
use crate::state::{self, MemoryKind, MemoryRegion};

pub struct Session<C: EmulationCore> {
    core: C,
    config: ConfigBridge,
    audio: AudioPipeline,
    video: FrameConverter,
    hard_mute: bool,
}

/// Geometry and timing for `settings`, whether or not a game is loaded.
pub fn av_info_for<C: EmulationCore>(settings: &Settings) -> AvInfo {
    AvInfo {
        geometry: compute_geometry(
            C::IMAGE_WIDTH,
            C::IMAGE_HEIGHT,
            settings.overscan(),
            settings.aspect,
        ),
        fps: C::FRAME_RATE,
        sample_rate: SAMPLE_RATE as f64,
    }
}

impl<C: EmulationCore> Session<C> {
    /// Negotiate output with the host, configure a fresh core and load `rom` into it.
    ///
    /// Nothing is kept on failure. The memory map is not published here: the regions point into
    /// the core, so the caller publishes it once the session has reached its final address.
    pub fn load<H: Host>(host: &mut H, rom: &[u8]) -> Result<Self> {
        if !host.set_pixel_format_rgb565() {
            return Err(BridgeError::UnsupportedPixelFormat);
        }
        if !host.set_input_descriptors(&input::descriptors()) {
            debug!("host ignored input descriptors");
        }

        let header = loader::sniff(rom)?;
        info!(
            "iNES image: mapper {}, {} KiB PRG, {} KiB CHR, {} mirroring, battery: {}",
            header.mapper,
            header.prg_banks as usize * 16,
            header.chr_banks as usize * 8,
            header.mirroring(),
            header.battery,
        );

        let mut session = Self {
            core: C::default(),
            config: ConfigBridge::default(),
            audio: AudioPipeline::new(),
            video: FrameConverter::new(C::IMAGE_WIDTH, C::IMAGE_HEIGHT),
            hard_mute: host.av_flags().contains(AvFlags::HARD_DISABLE_AUDIO),
        };

        session.config.refresh(host);
        let settings = *session.config.settings();
        session.core.set_sprite_mode(settings.sprite_mode);
        session.configure_audio().map_err(BridgeError::CoreLoad)?;
        session.core.set_palette_range(0);

        session.core.load_ines(rom).map_err(BridgeError::CoreLoad)?;
        Ok(session)
    }

    /// Bind the audio sink for the current settings and re-apply the equalizer.
    fn configure_audio(&mut self) -> anyhow::Result<()> {
        let settings = self.config.settings();
        let (mode, eq) = (settings.audio_mode, settings.equalizer);
        self.audio
            .select_strategy(&mut self.core, mode, self.hard_mute)
            .context("rebinding audio sink")?;
        self.audio.apply_equalizer(&mut self.core, eq);
        Ok(())
    }

    fn refresh_config<H: Host>(&mut self, host: &mut H) -> anyhow::Result<()> {
        let diff = self.config.refresh(host);
        let settings = *self.config.settings();

        if diff.sprite_mode {
            self.core.set_sprite_mode(settings.sprite_mode);
        }
        self.configure_audio()?;

        if diff.video_changed() {
            let av = self.av_info();
            debug!(
                "republishing geometry: {}x{} @ {:.4}",
                av.geometry.base_width, av.geometry.base_height, av.geometry.aspect_ratio
            );
            if !host.set_geometry(&av) {
                warn!("host rejected geometry update");
            }
        }
        Ok(())
    }

    /// Publish System RAM and Save RAM to the host.
    pub fn publish_memory_map<H: Host>(&mut self, host: &mut H) {
        let regions = self.memory_map();
        if !host.set_memory_maps(&regions) {
            debug!("host ignored memory map");
        }
    }

    pub fn memory_map(&mut self) -> [MemoryRegion; 2] {
        state::memory_map(&mut self.core)
    }

    /// Advance one frame: options, input, core step, video, audio.
    pub fn run_frame<H: Host>(&mut self, host: &mut H) -> anyhow::Result<()> {
        let flags = host.av_flags();
        let hard_mute = flags.contains(AvFlags::HARD_DISABLE_AUDIO);
        let mute_changed = hard_mute != self.hard_mute;
        self.hard_mute = hard_mute;

        if host.variables_updated() {
            self.refresh_config(host)?;
        } else if mute_changed {
            self.configure_audio()?;
        }

        let settings = *self.config.settings();
        let [pad0, pad1] = input::poll(host, settings.allow_opposing);

        let stepped = if flags.contains(AvFlags::ENABLE_VIDEO) {
            let stepped = self.core.emulate_frame(pad0, pad1);
            if stepped.is_ok() {
                let frame = self.core.frame();
                let view = self.video.convert(&frame, settings.overscan());
                host.publish(view.pixels, view.width, view.height, view.pitch_bytes);
            }
            stepped
        } else {
            self.core.emulate_skip_frame(pad0, pad1)
        };

        // Whatever the core queued before failing still has to leave its buffer.
        let audio_enabled = flags.contains(AvFlags::ENABLE_AUDIO) && !self.hard_mute;
        self.audio.pump(&mut self.core, host, audio_enabled);
        stepped
    }

    /// Soft reset, as from the console's reset button.
    pub fn reset(&mut self) {
        self.core.reset(false, false);
    }

    pub fn av_info(&self) -> AvInfo {
        av_info_for::<C>(self.config.settings())
    }

    pub fn serialized_size(&self) -> usize {
        state::serialized_size(&self.core)
    }

    pub fn save<H: Host>(&mut self, host: &mut H, buf: &mut [u8]) -> Result<usize> {
        let fast = host.av_flags().contains(AvFlags::FAST_SAVESTATES);
        state::save(&mut self.core, &self.audio, buf, fast)
    }

    pub fn load_state<H: Host>(&mut self, host: &mut H, data: &[u8]) -> Result<()> {
        let fast = host.av_flags().contains(AvFlags::FAST_SAVESTATES);
        state::load(&mut self.core, &self.audio, data, fast)
    }

    pub fn memory_data(&mut self, kind: MemoryKind) -> Option<&mut [u8]> {
        state::memory_data(&mut self.core, kind)
    }

    pub fn close(mut self) {
        self.core.close();
    }

    pub fn core(&self) -> &C {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut C {
        &mut self.core
    }

    pub fn settings(&self) -> &Settings {
        self.config.settings()
    }
}
