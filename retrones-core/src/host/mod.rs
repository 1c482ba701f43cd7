//! Host side of the bridge.
//!
//! [`Host`] is everything the frame pump needs from the frontend: option values, the
//! audio/video enable flags, input, and the A/V sinks. [`LibretroHost`] implements it on top of
//! the callbacks the frontend registers through the `retro_set_*` entry points.
//!
//! The callbacks are process-wide: libretro hands them over before any game is loaded and they
//! stay valid until `retro_deinit`. They are kept in a mutex-guarded global, and each entry point
//! takes a copy in a [`LibretroHost`] for the duration of the call.

use std::ffi::{CStr, c_uint, c_void};
use std::sync::{Mutex, OnceLock, PoisonError};

use bitflags::bitflags;
use log::*;

use crate::abi::{self, InputDescriptor, MemoryDescriptor, MemoryMap};
use crate::av::{AudioOutput, AvInfo, VideoOutput};
use crate::input::{ButtonDescriptor, JoypadButton};
use crate::state::MemoryRegion;

bitflags! {
    /// `RETRO_ENVIRONMENT_GET_AUDIO_VIDEO_ENABLE` bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AvFlags: u32 {
        const ENABLE_VIDEO = 1;
        const ENABLE_AUDIO = 2;
        /// Save/load is part of rewind or run-ahead.
        const FAST_SAVESTATES = 4;
        /// Audio will never be played; the core may skip producing it.
        const HARD_DISABLE_AUDIO = 8;
    }
}

impl AvFlags {
    /// Assumed when the host cannot answer the query.
    pub const DEFAULT: Self = Self::ENABLE_VIDEO.union(Self::ENABLE_AUDIO);
}

impl Default for AvFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The frontend, as seen by the frame pump.
pub trait Host: VideoOutput + AudioOutput {
    /// Whether any option changed since the last call.
    fn variables_updated(&mut self) -> bool;
    fn variable(&mut self, key: &CStr) -> Option<String>;
    /// `None` when the host does not support the query.
    fn av_enable(&mut self) -> Option<AvFlags>;

    fn av_flags(&mut self) -> AvFlags {
        self.av_enable().unwrap_or_default()
    }

    fn set_pixel_format_rgb565(&mut self) -> bool;
    fn set_geometry(&mut self, av: &AvInfo) -> bool;
    fn set_input_descriptors(&mut self, descriptors: &[ButtonDescriptor]) -> bool;
    fn set_memory_maps(&mut self, regions: &[MemoryRegion]) -> bool;

    fn poll_input(&mut self);
    fn joypad_pressed(&mut self, port: u32, button: JoypadButton) -> bool;
}

/// Callbacks registered by the frontend.
#[derive(Clone, Copy, Default)]
pub struct Callbacks {
    pub environment: Option<abi::EnvironmentFn>,
    pub video_refresh: Option<abi::VideoRefreshFn>,
    pub audio_sample: Option<abi::AudioSampleFn>,
    pub audio_sample_batch: Option<abi::AudioSampleBatchFn>,
    pub input_poll: Option<abi::InputPollFn>,
    pub input_state: Option<abi::InputStateFn>,
}

static CALLBACKS: OnceLock<Mutex<Callbacks>> = OnceLock::new();

/// The process-wide callback table.
pub fn callbacks() -> &'static Mutex<Callbacks> {
    CALLBACKS.get_or_init(|| Mutex::new(Callbacks::default()))
}

/// Update the callback table in place.
pub fn update_callbacks(f: impl FnOnce(&mut Callbacks)) {
    let mut cbs = callbacks().lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut cbs);
}

/// [`Host`] over the registered libretro callbacks.
#[derive(Clone, Copy)]
pub struct LibretroHost {
    cbs: Callbacks,
}

impl LibretroHost {
    /// Snapshot the currently registered callbacks.
    pub fn current() -> Self {
        let cbs = *callbacks().lock().unwrap_or_else(PoisonError::into_inner);
        Self { cbs }
    }

    fn environment(&mut self, cmd: c_uint, data: *mut c_void) -> bool {
        let Some(env) = self.cbs.environment else {
            return false;
        };
        // SAFETY: `data` points at the struct libretro.h documents for `cmd`, alive for the call.
        unsafe { env(cmd, data) }
    }

    /// Register the option table with `SET_VARIABLES`.
    pub fn register_options(&mut self) -> bool {
        let vars = abi::option_variables();
        self.environment(
            abi::ENVIRONMENT_SET_VARIABLES,
            vars.as_ptr() as *mut c_void,
        )
    }
}

impl Host for LibretroHost {
    fn variables_updated(&mut self) -> bool {
        let mut updated = false;
        self.environment(
            abi::ENVIRONMENT_GET_VARIABLE_UPDATE,
            &mut updated as *mut bool as *mut c_void,
        ) && updated
    }

    fn variable(&mut self, key: &CStr) -> Option<String> {
        let mut var = abi::Variable {
            key: key.as_ptr(),
            value: std::ptr::null(),
        };
        if !self.environment(
            abi::ENVIRONMENT_GET_VARIABLE,
            &mut var as *mut abi::Variable as *mut c_void,
        ) || var.value.is_null()
        {
            return None;
        }
        // SAFETY: non-null value is a NUL-terminated string owned by the frontend.
        let value = unsafe { CStr::from_ptr(var.value) };
        Some(value.to_string_lossy().into_owned())
    }

    fn av_enable(&mut self) -> Option<AvFlags> {
        let mut bits: abi::AvEnableBits = 0;
        self.environment(
            abi::ENVIRONMENT_GET_AUDIO_VIDEO_ENABLE,
            &mut bits as *mut abi::AvEnableBits as *mut c_void,
        )
        .then(|| AvFlags::from_bits_truncate(bits as u32))
    }

    fn set_pixel_format_rgb565(&mut self) -> bool {
        let mut format = abi::PixelFormat::RGB565;
        self.environment(
            abi::ENVIRONMENT_SET_PIXEL_FORMAT,
            &mut format as *mut abi::PixelFormat as *mut c_void,
        )
    }

    fn set_geometry(&mut self, av: &AvInfo) -> bool {
        let mut info = system_av_info(av);
        self.environment(
            abi::ENVIRONMENT_SET_GEOMETRY,
            &mut info as *mut abi::SystemAvInfo as *mut c_void,
        )
    }

    fn set_input_descriptors(&mut self, descriptors: &[ButtonDescriptor]) -> bool {
        let mut raw: Vec<InputDescriptor> = descriptors
            .iter()
            .map(|d| InputDescriptor {
                port: d.port,
                device: abi::DEVICE_JOYPAD,
                index: 0,
                id: d.button as c_uint,
                description: d.label.as_ptr(),
            })
            .collect();
        raw.push(InputDescriptor::END);
        self.environment(
            abi::ENVIRONMENT_SET_INPUT_DESCRIPTORS,
            raw.as_mut_ptr() as *mut c_void,
        )
    }

    fn set_memory_maps(&mut self, regions: &[MemoryRegion]) -> bool {
        let descriptors: Vec<MemoryDescriptor> = regions
            .iter()
            .map(|r| MemoryDescriptor {
                flags: 0,
                ptr: r.as_ptr() as *mut c_void,
                offset: 0,
                start: r.start,
                select: r.select,
                disconnect: 0,
                len: r.len,
                addrspace: std::ptr::null(),
            })
            .collect();
        let mut map = MemoryMap {
            descriptors: descriptors.as_ptr(),
            num_descriptors: descriptors.len() as c_uint,
        };
        self.environment(
            abi::ENVIRONMENT_SET_MEMORY_MAPS,
            &mut map as *mut MemoryMap as *mut c_void,
        )
    }

    fn poll_input(&mut self) {
        debug_assert!(
            self.cbs.input_poll.is_some(),
            "retro_run before retro_set_input_poll"
        );
        match self.cbs.input_poll {
            // SAFETY: registered by the frontend, no arguments.
            Some(poll) => unsafe { poll() },
            None => error!("input poll callback not registered"),
        }
    }

    fn joypad_pressed(&mut self, port: u32, button: JoypadButton) -> bool {
        let Some(state) = self.cbs.input_state else {
            return false;
        };
        // SAFETY: plain-value query into the frontend.
        unsafe { state(port, abi::DEVICE_JOYPAD, 0, button as c_uint) != 0 }
    }
}

impl VideoOutput for LibretroHost {
    fn publish(&mut self, pixels: &[u16], width: usize, height: usize, pitch_bytes: usize) {
        let Some(video) = self.cbs.video_refresh else {
            return;
        };
        // SAFETY: `pixels` covers `height` rows of `pitch_bytes`, valid for the call.
        unsafe {
            video(
                pixels.as_ptr() as *const c_void,
                width as c_uint,
                height as c_uint,
                pitch_bytes,
            )
        }
    }
}

impl AudioOutput for LibretroHost {
    fn upload_audio(&mut self, interleaved: &[i16]) {
        let Some(batch) = self.cbs.audio_sample_batch else {
            return;
        };
        // SAFETY: `interleaved` holds `len / 2` stereo frames, valid for the call.
        unsafe {
            batch(interleaved.as_ptr(), interleaved.len() / 2);
        }
    }
}

/// Fill libretro's `retro_system_av_info` from an [`AvInfo`].
pub fn system_av_info(av: &AvInfo) -> abi::SystemAvInfo {
    abi::SystemAvInfo {
        geometry: abi::GameGeometry {
            base_width: av.geometry.base_width,
            base_height: av.geometry.base_height,
            max_width: av.geometry.max_width,
            max_height: av.geometry.max_height,
            aspect_ratio: av.geometry.aspect_ratio,
        },
        timing: abi::SystemTiming {
            fps: av.fps,
            sample_rate: av.sample_rate,
        },
    }
}
