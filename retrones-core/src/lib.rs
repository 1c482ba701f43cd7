//! retrones-core: the libretro presentation layer for an NES emulation core.
//!
//! The crate sits between a frontend (RetroArch or similar), which drives emulation one frame per
//! `retro_run`, and an emulation core, which knows nothing about libretro. It covers:
//! - option handling and audio sink selection,
//! - indexed-color frame conversion with per-axis overscan cropping,
//! - controller polling,
//! - save states and memory exposure.
//!
//! A core crate implements [`EmulationCore`] and invokes [`retrones_core!`] once:
//!
//! ```ignore
//! #[derive(Default)]
//! struct MyNes { /* ... */ }
//!
//! impl retrones_core::EmulationCore for MyNes { /* ... */ }
//!
//! retrones_core::retrones_core!(MyNes);
//! ```

pub mod abi;
pub mod av;
pub mod config;
pub mod emu;
pub mod error;
pub mod host;
pub mod input;
pub mod loader;
pub mod logging;
pub mod runtime;
pub mod state;

#[cfg(test)]
mod testing;

pub use av::{BufferKind, EffectsConfig};
pub use emu::{CoreInfo, EmulationCore, Equalizer, Frame, Rgb, SpriteMode};
pub use error::BridgeError;
pub use input::Buttons;

/// Export the libretro C API for an [`EmulationCore`] implementation.
///
/// Declares the process-wide frontend state and every `retro_*` symbol. Invoke it exactly once,
/// at the root of a `cdylib` crate.
#[macro_export]
macro_rules! retrones_core {
    ($core:ty) => {
        static RETRONES_FRONTEND: $crate::runtime::entry::Slot<$core> =
            ::std::sync::Mutex::new($crate::runtime::Frontend::new());

        #[unsafe(no_mangle)]
        pub extern "C" fn retro_api_version() -> ::std::ffi::c_uint {
            $crate::abi::API_VERSION
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn retro_init() {}

        #[unsafe(no_mangle)]
        pub extern "C" fn retro_deinit() {
            $crate::runtime::entry::deinit(&RETRONES_FRONTEND);
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn retro_set_environment(cb: $crate::abi::EnvironmentFn) {
            $crate::runtime::entry::set_environment(cb);
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn retro_set_video_refresh(cb: $crate::abi::VideoRefreshFn) {
            $crate::runtime::entry::set_video_refresh(cb);
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn retro_set_audio_sample(cb: $crate::abi::AudioSampleFn) {
            $crate::runtime::entry::set_audio_sample(cb);
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn retro_set_audio_sample_batch(cb: $crate::abi::AudioSampleBatchFn) {
            $crate::runtime::entry::set_audio_sample_batch(cb);
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn retro_set_input_poll(cb: $crate::abi::InputPollFn) {
            $crate::runtime::entry::set_input_poll(cb);
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn retro_set_input_state(cb: $crate::abi::InputStateFn) {
            $crate::runtime::entry::set_input_state(cb);
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn retro_set_controller_port_device(
            _port: ::std::ffi::c_uint,
            _device: ::std::ffi::c_uint,
        ) {
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn retro_get_system_info(info: *mut $crate::abi::SystemInfo) {
            unsafe { $crate::runtime::entry::get_system_info::<$core>(info) }
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn retro_get_system_av_info(
            info: *mut $crate::abi::SystemAvInfo,
        ) {
            unsafe { $crate::runtime::entry::get_system_av_info(&RETRONES_FRONTEND, info) }
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn retro_reset() {
            $crate::runtime::entry::reset(&RETRONES_FRONTEND);
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn retro_run() {
            $crate::runtime::entry::run(&RETRONES_FRONTEND);
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn retro_serialize_size() -> usize {
            $crate::runtime::entry::serialize_size(&RETRONES_FRONTEND)
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn retro_serialize(
            data: *mut ::std::ffi::c_void,
            size: usize,
        ) -> bool {
            unsafe { $crate::runtime::entry::serialize(&RETRONES_FRONTEND, data, size) }
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn retro_unserialize(
            data: *const ::std::ffi::c_void,
            size: usize,
        ) -> bool {
            unsafe { $crate::runtime::entry::unserialize(&RETRONES_FRONTEND, data, size) }
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn retro_cheat_reset() {}

        #[unsafe(no_mangle)]
        pub extern "C" fn retro_cheat_set(
            _index: ::std::ffi::c_uint,
            _enabled: bool,
            _code: *const ::std::ffi::c_char,
        ) {
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn retro_load_game(game: *const $crate::abi::GameInfo) -> bool {
            unsafe { $crate::runtime::entry::load_game(&RETRONES_FRONTEND, game) }
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn retro_load_game_special(
            _game_type: ::std::ffi::c_uint,
            _info: *const $crate::abi::GameInfo,
            _num_info: usize,
        ) -> bool {
            false
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn retro_unload_game() {
            $crate::runtime::entry::unload_game(&RETRONES_FRONTEND);
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn retro_get_region() -> ::std::ffi::c_uint {
            $crate::runtime::entry::get_region()
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn retro_get_memory_data(id: ::std::ffi::c_uint) -> *mut ::std::ffi::c_void {
            $crate::runtime::entry::get_memory_data(&RETRONES_FRONTEND, id)
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn retro_get_memory_size(id: ::std::ffi::c_uint) -> usize {
            $crate::runtime::entry::get_memory_size(&RETRONES_FRONTEND, id)
        }
    };
}
