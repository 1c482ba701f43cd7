//! Scripted stand-ins for the emulation core and the frontend, shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::ffi::CStr;
use std::io::Write;

use anyhow::{bail, ensure};

use crate::av::{AudioOutput, AvInfo, BufferKind, EffectsConfig, VideoOutput};
use crate::emu::{CoreInfo, EmulationCore, Equalizer, Frame, Rgb, SpriteMode};
use crate::host::{AvFlags, Host};
use crate::input::{ButtonDescriptor, Buttons, JoypadButton, PORTS};
use crate::state::MemoryRegion;

const STATE_MAGIC: &[u8; 4] = b"FAKE";
/// Row pitch of the fake picture: 256 visible columns plus a border.
pub const FAKE_PITCH: usize = 272;

/// Minimal valid iNES image: one PRG bank, one CHR bank, optional battery.
pub fn ines_image(battery: bool) -> Vec<u8> {
    let mut rom = vec![0u8; 16 + 16 * 1024 + 8 * 1024];
    rom[0..4].copy_from_slice(b"NES\x1a");
    rom[4] = 1;
    rom[5] = 1;
    if battery {
        rom[6] |= 0x02;
    }
    rom
}

/// A deterministic core. Every emulated frame queues `samples_per_frame` samples from a
/// counter (twice that for the stereo effects sink) and bumps the first byte of system RAM.
pub struct FakeCore {
    pub loaded: bool,
    pub fail_save: bool,
    pub fail_load: bool,
    /// Frames still run (and queue audio) but report an error.
    pub fail_step: bool,
    pub battery: bool,

    pub rebinds: Vec<BufferKind>,
    pub sink: Option<BufferKind>,
    pub sample_rate: u32,
    pub effects: Option<EffectsConfig>,
    pub equalizer: Option<Equalizer>,
    pub sprite_mode: Option<SpriteMode>,
    pub palette_range: Option<u8>,
    pub resets: Vec<(bool, bool)>,

    pub frames: u32,
    pub skipped: u32,
    pub last_pads: [Buttons; PORTS],

    pub samples_per_frame: usize,
    pub next_sample: i16,
    pub queue: VecDeque<i16>,
    pub audio_snapshot: Option<VecDeque<i16>>,
    pub audio_saves: usize,
    pub audio_restores: usize,

    pub pixels: Vec<u8>,
    pub palette: [u16; 256],
    pub colors: Vec<Rgb>,
    pub system_ram: Vec<u8>,
    pub save_ram: Vec<u8>,
}

impl Default for FakeCore {
    fn default() -> Self {
        let height = <Self as EmulationCore>::IMAGE_HEIGHT;
        let pixels = (0..FAKE_PITCH * height)
            .map(|i| ((i % FAKE_PITCH) + (i / FAKE_PITCH)) as u8)
            .collect();
        let mut palette = [0u16; 256];
        for (i, entry) in palette.iter_mut().enumerate() {
            *entry = (i % 64) as u16;
        }
        let colors = (0..64u8)
            .map(|i| Rgb::new(i * 4, 255 - i * 4, i))
            .collect();

        Self {
            loaded: false,
            fail_save: false,
            fail_load: false,
            fail_step: false,
            battery: false,
            rebinds: Vec::new(),
            sink: None,
            sample_rate: 0,
            effects: None,
            equalizer: None,
            sprite_mode: None,
            palette_range: None,
            resets: Vec::new(),
            frames: 0,
            skipped: 0,
            last_pads: [Buttons::empty(); PORTS],
            samples_per_frame: 735,
            next_sample: 1,
            queue: VecDeque::new(),
            audio_snapshot: None,
            audio_saves: 0,
            audio_restores: 0,
            pixels,
            palette,
            colors,
            system_ram: vec![0; <Self as EmulationCore>::SYSTEM_RAM_SIZE],
            save_ram: vec![0; <Self as EmulationCore>::SAVE_RAM_SIZE],
        }
    }
}

impl FakeCore {
    fn produce_audio(&mut self) {
        let count = match self.sink {
            None => 0,
            Some(BufferKind::Effects) => self.samples_per_frame * 2,
            Some(_) => self.samples_per_frame,
        };
        for _ in 0..count {
            let sample = match self.sink {
                Some(BufferKind::Silent) => 0,
                _ => self.next_sample,
            };
            self.next_sample = self.next_sample.wrapping_add(1);
            self.queue.push_back(sample);
        }
    }

    fn step(&mut self, pad0: Buttons, pad1: Buttons) {
        self.frames += 1;
        self.last_pads = [pad0, pad1];
        self.system_ram[0] = self.frames as u8;
        self.produce_audio();
    }
}

impl EmulationCore for FakeCore {
    const FRAME_RATE: f64 = 60.098_813_897_440_515;
    const SYSTEM_RAM_SIZE: usize = 0x800;
    const SAVE_RAM_SIZE: usize = 0x2000;

    fn info() -> CoreInfo {
        CoreInfo::new(c"FakeNES", c"0.0.1")
    }

    fn load_ines(&mut self, rom: &[u8]) -> anyhow::Result<()> {
        ensure!(rom.len() >= 16, "short image");
        let mapper = (rom[6] >> 4) | (rom[7] & 0xf0);
        ensure!(mapper < 0xf0, "mapper {mapper} not supported");
        self.battery = rom[6] & 0x02 != 0;
        self.loaded = true;
        Ok(())
    }

    fn close(&mut self) {
        self.loaded = false;
    }

    fn reset(&mut self, full_reset: bool, erase_battery_ram: bool) {
        self.resets.push((full_reset, erase_battery_ram));
    }

    fn set_sprite_mode(&mut self, mode: SpriteMode) {
        self.sprite_mode = Some(mode);
    }

    fn set_palette_range(&mut self, begin: u8) {
        self.palette_range = Some(begin);
    }

    fn set_equalizer(&mut self, eq: Equalizer) {
        self.equalizer = Some(eq);
    }

    fn set_sample_rate(&mut self, rate: u32, sink: BufferKind) -> anyhow::Result<()> {
        self.rebinds.push(sink);
        self.sink = Some(sink);
        self.sample_rate = rate;
        self.queue.clear();
        Ok(())
    }

    fn configure_effects(&mut self, config: &EffectsConfig) {
        self.effects = Some(*config);
    }

    fn emulate_frame(&mut self, pad0: Buttons, pad1: Buttons) -> anyhow::Result<()> {
        self.step(pad0, pad1);
        ensure!(!self.fail_step, "cpu jammed");
        Ok(())
    }

    fn emulate_skip_frame(&mut self, pad0: Buttons, pad1: Buttons) -> anyhow::Result<()> {
        self.skipped += 1;
        self.step(pad0, pad1);
        ensure!(!self.fail_step, "cpu jammed");
        Ok(())
    }

    fn frame(&self) -> Frame<'_> {
        Frame {
            pixels: &self.pixels,
            pitch: FAKE_PITCH,
            palette: &self.palette,
            colors: &self.colors,
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
        if self.fail_save {
            bail!("save refused");
        }
        out.write_all(STATE_MAGIC)?;
        out.write_all(&self.frames.to_le_bytes())?;
        out.write_all(&self.next_sample.to_le_bytes())?;
        out.write_all(&self.system_ram)?;
        out.write_all(&self.save_ram)?;
        Ok(())
    }

    fn load_state(&mut self, data: &[u8]) -> anyhow::Result<()> {
        ensure!(!self.fail_load, "load refused");
        let expected = 4 + 4 + 2 + self.system_ram.len() + self.save_ram.len();
        ensure!(data.len() == expected, "state is {} bytes, want {expected}", data.len());
        ensure!(&data[..4] == STATE_MAGIC, "bad magic");

        let (frames, rest) = data[4..].split_at(4);
        let (sample, rest) = rest.split_at(2);
        let (system, save) = rest.split_at(self.system_ram.len());
        self.frames = u32::from_le_bytes(frames.try_into()?);
        self.next_sample = i16::from_le_bytes(sample.try_into()?);
        self.system_ram.copy_from_slice(system);
        self.save_ram.copy_from_slice(save);
        Ok(())
    }

    fn save_audio_buffer_state(&mut self) {
        self.audio_saves += 1;
        self.audio_snapshot = Some(self.queue.clone());
    }

    fn restore_audio_buffer_state(&mut self) {
        self.audio_restores += 1;
        if let Some(queue) = &self.audio_snapshot {
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

/// One `publish` call as seen by [`FakeHost`].
#[derive(Clone, Debug)]
pub struct PublishedFrame {
    pub ptr: *const u16,
    pub width: usize,
    pub height: usize,
    pub pitch_bytes: usize,
    /// Visible rows, de-strided.
    pub rows: Vec<Vec<u16>>,
}

/// A frontend that records everything the bridge asks of it.
pub struct FakeHost {
    pub options: HashMap<String, String>,
    pub updated: bool,
    pub av: Option<AvFlags>,
    pub rgb565_supported: bool,

    pub geometry: Vec<AvInfo>,
    pub descriptors: Vec<ButtonDescriptor>,
    pub memory_maps: Vec<Vec<MemoryRegion>>,

    pub polls: usize,
    pub held: [Buttons; PORTS],

    pub frames: Vec<PublishedFrame>,
    pub audio: Vec<i16>,
    pub audio_batches: usize,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            options: HashMap::new(),
            updated: false,
            av: None,
            rgb565_supported: true,
            geometry: Vec::new(),
            descriptors: Vec::new(),
            memory_maps: Vec::new(),
            polls: 0,
            held: [Buttons::empty(); PORTS],
            frames: Vec::new(),
            audio: Vec::new(),
            audio_batches: 0,
        }
    }
}

impl FakeHost {
    /// Set an option and raise the update flag.
    pub fn set_option(&mut self, key: &CStr, value: &str) {
        self.options
            .insert(key.to_str().unwrap().to_owned(), value.to_owned());
        self.updated = true;
    }
}

impl VideoOutput for FakeHost {
    fn publish(&mut self, pixels: &[u16], width: usize, height: usize, pitch_bytes: usize) {
        let stride = pitch_bytes / 2;
        let rows = (0..height)
            .map(|y| pixels[y * stride..y * stride + width].to_vec())
            .collect();
        self.frames.push(PublishedFrame {
            ptr: pixels.as_ptr(),
            width,
            height,
            pitch_bytes,
            rows,
        });
    }
}

impl AudioOutput for FakeHost {
    fn upload_audio(&mut self, interleaved: &[i16]) {
        self.audio.extend_from_slice(interleaved);
        self.audio_batches += 1;
    }
}

impl Host for FakeHost {
    fn variables_updated(&mut self) -> bool {
        std::mem::take(&mut self.updated)
    }

    fn variable(&mut self, key: &CStr) -> Option<String> {
        self.options.get(key.to_str().ok()?).cloned()
    }

    fn av_enable(&mut self) -> Option<AvFlags> {
        self.av
    }

    fn set_pixel_format_rgb565(&mut self) -> bool {
        self.rgb565_supported
    }

    fn set_geometry(&mut self, av: &AvInfo) -> bool {
        self.geometry.push(*av);
        true
    }

    fn set_input_descriptors(&mut self, descriptors: &[ButtonDescriptor]) -> bool {
        self.descriptors = descriptors.to_vec();
        true
    }

    fn set_memory_maps(&mut self, regions: &[MemoryRegion]) -> bool {
        self.memory_maps.push(regions.to_vec());
        true
    }

    fn poll_input(&mut self) {
        self.polls += 1;
    }

    fn joypad_pressed(&mut self, port: u32, button: JoypadButton) -> bool {
        self.held
            .get(port as usize)
            .is_some_and(|pad| pad.contains(Buttons::from_joypad(button)))
    }
}
