//! retrones-core ABI module
//!
//! This module pins down the C contract between:
//! - **Host**: the libretro frontend (RetroArch or similar)
//! - **Core**: this bridging layer plus the emulation core it wraps
//!
//! ## Layouts
//! Structs and callback types that `libretro-sys` already models are re-exported from it.
//! Anything the frontend expects that postdates the `libretro-sys` 0.1 header snapshot
//! (audio/video enable query, memory maps, log interface, input descriptors) is declared here
//! with `#[repr(C)]` layouts matching `libretro.h`.
//!
//! ## Ownership
//! Every pointer stored in these structs is borrowed: the frontend copies what it needs during
//! the environment call, so the backing storage only has to outlive that call.

use std::ffi::{CStr, c_char, c_int, c_uint, c_void};

pub use libretro_sys::{
    AudioSampleBatchFn, AudioSampleFn, EnvironmentFn, GameGeometry, GameInfo, InputPollFn,
    InputStateFn, PixelFormat, SystemAvInfo, SystemInfo, SystemTiming, Variable, VideoRefreshFn,
};

pub use libretro_sys::{
    API_VERSION, DEVICE_JOYPAD, ENVIRONMENT_GET_LOG_INTERFACE, ENVIRONMENT_GET_VARIABLE,
    ENVIRONMENT_GET_VARIABLE_UPDATE, ENVIRONMENT_SET_GEOMETRY, ENVIRONMENT_SET_INPUT_DESCRIPTORS,
    ENVIRONMENT_SET_MEMORY_MAPS, ENVIRONMENT_SET_PIXEL_FORMAT, ENVIRONMENT_SET_VARIABLES,
    MEMORY_SAVE_RAM, MEMORY_SYSTEM_RAM,
};

/// `RETRO_ENVIRONMENT_EXPERIMENTAL`
pub const ENVIRONMENT_EXPERIMENTAL: c_uint = 0x10000;

/// `RETRO_ENVIRONMENT_GET_AUDIO_VIDEO_ENABLE`: `int *` bitmask, see [`crate::host::AvFlags`].
pub const ENVIRONMENT_GET_AUDIO_VIDEO_ENABLE: c_uint = 47 | ENVIRONMENT_EXPERIMENTAL;

/// Fixed output sample rate handed to the core whenever its sample sink is rebound.
pub const SAMPLE_RATE: u32 = 44_100;

/// `RETRO_REGION_NTSC`, reported by `retro_get_region`.
pub const REGION_NTSC: c_uint = 0;

/// `struct retro_input_descriptor`
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct InputDescriptor {
    pub port: c_uint,
    pub device: c_uint,
    pub index: c_uint,
    pub id: c_uint,
    pub description: *const c_char,
}

impl InputDescriptor {
    /// Array terminator expected by `SET_INPUT_DESCRIPTORS`.
    pub const END: Self = Self {
        port: 0,
        device: 0,
        index: 0,
        id: 0,
        description: std::ptr::null(),
    };
}

/// `struct retro_memory_descriptor`
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct MemoryDescriptor {
    pub flags: u64,
    pub ptr: *mut c_void,
    pub offset: usize,
    pub start: usize,
    pub select: usize,
    pub disconnect: usize,
    pub len: usize,
    pub addrspace: *const c_char,
}

/// `struct retro_memory_map`
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct MemoryMap {
    pub descriptors: *const MemoryDescriptor,
    pub num_descriptors: c_uint,
}

/// `enum retro_log_level`
#[repr(C)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

/// `retro_log_printf_t`
pub type LogPrintfFn = unsafe extern "C" fn(level: LogLevel, fmt: *const c_char, ...);

/// `struct retro_log_callback`
#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct LogCallback {
    pub log: Option<LogPrintfFn>,
}

/// One host-visible core option: `key` plus `"Label; default|other|..."`.
#[derive(Clone, Copy, Debug)]
pub struct OptionDef {
    pub key: &'static CStr,
    pub label: &'static CStr,
}

pub mod option_keys {
    use std::ffi::CStr;

    pub const UP_DOWN_ALLOWED: &CStr = c"retrones_up_down_allowed";
    pub const ASPECT_RATIO_PAR: &CStr = c"retrones_aspect_ratio_par";
    pub const USE_OVERSCAN_H: &CStr = c"retrones_use_overscan_h";
    pub const USE_OVERSCAN_V: &CStr = c"retrones_use_overscan_v";
    pub const NO_SPRITE_LIMIT: &CStr = c"retrones_no_sprite_limit";
    pub const AUDIO_MODE: &CStr = c"retrones_audio_nonlinear";
    pub const AUDIO_EQ: &CStr = c"retrones_audio_eq";
}

/// Options registered with `SET_VARIABLES`. The first listed value is the default.
pub const OPTIONS: &[OptionDef] = &[
    OptionDef {
        key: option_keys::UP_DOWN_ALLOWED,
        label: c"Allow Opposing Directions; disabled|enabled",
    },
    OptionDef {
        key: option_keys::ASPECT_RATIO_PAR,
        label: c"Aspect ratio; PAR|4:3",
    },
    OptionDef {
        key: option_keys::USE_OVERSCAN_H,
        label: c"Show horizontal overscan; enabled|disabled",
    },
    OptionDef {
        key: option_keys::USE_OVERSCAN_V,
        label: c"Show vertical overscan; disabled|enabled",
    },
    OptionDef {
        key: option_keys::NO_SPRITE_LIMIT,
        label: c"No sprite limit; enabled|disabled",
    },
    OptionDef {
        key: option_keys::AUDIO_MODE,
        label: c"Audio mode; nonlinear|linear|stereo panning",
    },
    OptionDef {
        key: option_keys::AUDIO_EQ,
        label: c"Audio equalizer preset; default|famicom|tv|flat|crisp|tinny",
    },
];

/// Build the null-terminated `retro_variable` array for `SET_VARIABLES`.
pub fn option_variables() -> Vec<Variable> {
    OPTIONS
        .iter()
        .map(|opt| Variable {
            key: opt.key.as_ptr(),
            value: opt.label.as_ptr(),
        })
        .chain(std::iter::once(Variable {
            key: std::ptr::null(),
            value: std::ptr::null(),
        }))
        .collect()
}

/// Plain C `int` used by the audio/video enable query.
pub type AvEnableBits = c_int;

#[cfg(test)]
mod tests {
    use super::*;

    /// `"Label; a|b|c"` -> `["a", "b", "c"]`
    fn option_values(def: &OptionDef) -> Vec<&'static str> {
        let label = def.label.to_str().unwrap_or("");
        label
            .split_once("; ")
            .map(|(_, values)| values.split('|').collect())
            .unwrap_or_default()
    }

    #[test]
    fn option_table_is_null_terminated() {
        let vars = option_variables();
        assert_eq!(vars.len(), OPTIONS.len() + 1);
        let last = vars.last().unwrap();
        assert!(last.key.is_null());
        assert!(last.value.is_null());
    }

    #[test]
    fn option_values_lists_default_first() {
        let eq = OPTIONS
            .iter()
            .find(|o| o.key == option_keys::AUDIO_EQ)
            .unwrap();
        assert_eq!(
            option_values(eq),
            vec!["default", "famicom", "tv", "flat", "crisp", "tinny"]
        );

        let mode = OPTIONS
            .iter()
            .find(|o| o.key == option_keys::AUDIO_MODE)
            .unwrap();
        assert_eq!(option_values(mode)[2], "stereo panning");
    }

    #[test]
    fn every_option_key_is_unique() {
        for (i, a) in OPTIONS.iter().enumerate() {
            for b in &OPTIONS[i + 1..] {
                assert_ne!(a.key, b.key);
            }
        }
    }
}
