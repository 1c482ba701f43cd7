// Test-pattern core for retrones-core.
//
// Accepts any iNES image, ignores its contents, and produces:
// - eight vertical color bars scrolling one pixel per frame (holding Left on pad 1 reverses them),
// - a 440 Hz square wave (A on pad 1 drops it an octave).
//
// Useful to check a frontend setup (overscan, aspect, audio modes, save states, rewind)
// without a real emulator behind the bridge.

use std::collections::VecDeque;
use std::io::Write;

use anyhow::ensure;
use log::*;

use retrones_core::{
    BufferKind, Buttons, CoreInfo, EffectsConfig, EmulationCore, Equalizer, Frame, Rgb, SpriteMode,
};

const PITCH: usize = 272;
const STATE_MAGIC: &[u8; 4] = b"TPAT";
const AMPLITUDE: i16 = 4000;

const BAR_COLORS: [Rgb; 8] = [
    Rgb::new(0xff, 0xff, 0xff),
    Rgb::new(0xf8, 0xd8, 0x78),
    Rgb::new(0x58, 0xd8, 0x54),
    Rgb::new(0x3c, 0xbc, 0xfc),
    Rgb::new(0xd8, 0x00, 0xcc),
    Rgb::new(0xe4, 0x00, 0x58),
    Rgb::new(0x00, 0x58, 0xf8),
    Rgb::new(0x00, 0x00, 0x00),
];

pub struct TestPatternCore {
    pixels: Vec<u8>,
    palette: [u16; 256],
    scroll: usize,
    frame_count: u64,

    sink: Option<BufferKind>,
    sample_rate: u32,
    /// Fractional samples carried between frames, in 1/1000 sample units.
    sample_debt: u64,
    phase: u32,
    queue: VecDeque<i16>,
    queue_snapshot: Option<VecDeque<i16>>,
    /// Stereo position of the tone, -1.0 (left) to 1.0 (right).
    pan: f32,

    equalizer: Equalizer,
    battery: bool,
    system_ram: Vec<u8>,
    save_ram: Vec<u8>,
}

impl Default for TestPatternCore {
    fn default() -> Self {
        let mut palette = [0u16; 256];
        for (i, entry) in palette.iter_mut().enumerate() {
            *entry = (i % BAR_COLORS.len()) as u16;
        }
        Self {
            pixels: vec![0; PITCH * Self::IMAGE_HEIGHT],
            palette,
            scroll: 0,
            frame_count: 0,
            sink: None,
            sample_rate: 0,
            sample_debt: 0,
            phase: 0,
            queue: VecDeque::new(),
            queue_snapshot: None,
            pan: 0.0,
            equalizer: Equalizer::default(),
            battery: false,
            system_ram: vec![0; Self::SYSTEM_RAM_SIZE],
            save_ram: vec![0; Self::SAVE_RAM_SIZE],
        }
    }
}

impl TestPatternCore {
    fn step(&mut self, pad: Buttons) {
        self.frame_count += 1;
        self.system_ram[..8].copy_from_slice(&self.frame_count.to_le_bytes());

        if pad.contains(Buttons::LEFT) {
            self.scroll = (self.scroll + Self::IMAGE_WIDTH - 1) % Self::IMAGE_WIDTH;
        } else {
            self.scroll = (self.scroll + 1) % Self::IMAGE_WIDTH;
        }

        let tone = if pad.contains(Buttons::A) { 220 } else { 440 };
        self.produce_audio(tone);
    }

    fn render(&mut self) {
        let bar_width = Self::IMAGE_WIDTH / BAR_COLORS.len();
        for row in self.pixels.chunks_exact_mut(PITCH) {
            for (x, px) in row[..Self::IMAGE_WIDTH].iter_mut().enumerate() {
                *px = (((x + self.scroll) / bar_width) % BAR_COLORS.len()) as u8;
            }
        }
    }

    fn produce_audio(&mut self, tone: u32) {
        let Some(sink) = self.sink else {
            return;
        };
        if self.sample_rate == 0 {
            return;
        }

        // Samples per frame in thousandths, so the fraction carries over.
        self.sample_debt += (self.sample_rate as f64 * 1000.0 / Self::FRAME_RATE) as u64;
        let count = (self.sample_debt / 1000) as usize;
        self.sample_debt %= 1000;

        let half_period = (self.sample_rate / (tone * 2)).max(1);
        let amplitude = match self.equalizer {
            Equalizer::Tinny => AMPLITUDE / 2,
            _ => AMPLITUDE,
        };

        for _ in 0..count {
            let level = if (self.phase / half_period) % 2 == 0 {
                amplitude
            } else {
                -amplitude
            };
            self.phase = self.phase.wrapping_add(1);

            match sink {
                BufferKind::Silent => self.queue.push_back(0),
                BufferKind::Mono | BufferKind::Nes => self.queue.push_back(level),
                BufferKind::Effects => {
                    let level = level as f32;
                    self.queue.push_back((level * (1.0 - self.pan) / 2.0) as i16);
                    self.queue.push_back((level * (1.0 + self.pan) / 2.0) as i16);
                }
            }
        }
    }
}

impl EmulationCore for TestPatternCore {
    const FRAME_RATE: f64 = 60.098_813_897_440_515;
    const SYSTEM_RAM_SIZE: usize = 0x800;
    const SAVE_RAM_SIZE: usize = 0x2000;

    fn info() -> CoreInfo {
        CoreInfo::new(c"retrones test pattern", c"0.1.0")
    }

    fn load_ines(&mut self, rom: &[u8]) -> anyhow::Result<()> {
        ensure!(rom.len() >= 16, "image too short");
        self.battery = rom[6] & 0x02 != 0;
        self.render();
        info!("test pattern loaded ({} byte image)", rom.len());
        Ok(())
    }

    fn close(&mut self) {
        self.queue.clear();
    }

    fn reset(&mut self, full_reset: bool, erase_battery_ram: bool) {
        self.scroll = 0;
        self.phase = 0;
        if full_reset {
            self.frame_count = 0;
            self.system_ram.fill(0);
        }
        if erase_battery_ram {
            self.save_ram.fill(0);
        }
    }

    fn set_sprite_mode(&mut self, mode: SpriteMode) {
        debug!("sprite mode {mode:?} has no effect on the test pattern");
    }

    fn set_palette_range(&mut self, _begin: u8) {}

    fn set_equalizer(&mut self, eq: Equalizer) {
        self.equalizer = eq;
    }

    fn set_sample_rate(&mut self, rate: u32, sink: BufferKind) -> anyhow::Result<()> {
        ensure!(rate > 0, "sample rate must be non-zero");
        self.sample_rate = rate;
        self.sink = Some(sink);
        self.sample_debt = 0;
        self.queue.clear();
        Ok(())
    }

    fn configure_effects(&mut self, config: &EffectsConfig) {
        // The tone is a single voice; place it where the left voice would sit.
        self.pan = if config.effects_enabled {
            config.pan_left
        } else {
            0.0
        };
    }

    fn emulate_frame(&mut self, pad0: Buttons, _pad1: Buttons) -> anyhow::Result<()> {
        self.step(pad0);
        self.render();
        Ok(())
    }

    fn emulate_skip_frame(&mut self, pad0: Buttons, _pad1: Buttons) -> anyhow::Result<()> {
        self.step(pad0);
        Ok(())
    }

    fn frame(&self) -> Frame<'_> {
        Frame {
            pixels: &self.pixels,
            pitch: PITCH,
            palette: &self.palette,
            colors: &BAR_COLORS,
        }
    }

    fn read_samples(&mut self, out: &mut [i16]) -> usize {
        let n = out.len().min(self.queue.len());
        for (dst, src) in out.iter_mut().zip(self.queue.drain(..n)) {
            *dst = src;
        }
        n
    }

    fn skip_samples(&mut self, count: usize) -> usize {
        let n = count.min(self.queue.len());
        self.queue.drain(..n);
        n
    }

    fn save_state(&self, out: &mut dyn Write) -> anyhow::Result<()> {
        out.write_all(STATE_MAGIC)?;
        out.write_all(&self.frame_count.to_le_bytes())?;
        out.write_all(&(self.scroll as u32).to_le_bytes())?;
        out.write_all(&self.phase.to_le_bytes())?;
        out.write_all(&self.system_ram)?;
        out.write_all(&self.save_ram)?;
        Ok(())
    }

    fn load_state(&mut self, data: &[u8]) -> anyhow::Result<()> {
        let header = 4 + 8 + 4 + 4;
        ensure!(
            data.len() == header + self.system_ram.len() + self.save_ram.len(),
            "state has wrong size ({} bytes)",
            data.len()
        );
        ensure!(&data[..4] == STATE_MAGIC, "not a test pattern state");

        self.frame_count = u64::from_le_bytes(data[4..12].try_into()?);
        self.scroll = u32::from_le_bytes(data[12..16].try_into()?) as usize % Self::IMAGE_WIDTH;
        self.phase = u32::from_le_bytes(data[16..20].try_into()?);
        let (system, save) = data[header..].split_at(self.system_ram.len());
        self.system_ram.copy_from_slice(system);
        self.save_ram.copy_from_slice(save);
        self.render();
        Ok(())
    }

    fn save_audio_buffer_state(&mut self) {
        self.queue_snapshot = Some(self.queue.clone());
    }

    fn restore_audio_buffer_state(&mut self) {
        if let Some(queue) = &self.queue_snapshot {
            self.queue = queue.clone();
        }
    }

    fn system_ram(&mut self) -> &mut [u8] {
        &mut self.system_ram
    }

    fn save_ram(&mut self) -> &mut [u8] {
        &mut self.save_ram
    }

    fn has_battery_ram(&self) -> bool {
        self.battery
    }
}

retrones_core::retrones_core!(TestPatternCore);
