//! Bodies of the `retro_*` exports.
//!
//! Everything here is generic over the core type so the exporting macro stays a list of one-line
//! forwards. Errors stop at this layer: they are logged and the frontend sees `false`, 0 or null.

use std::ffi::{c_uint, c_void};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::*;

use super::Frontend;
use crate::abi;
use crate::emu::EmulationCore;
use crate::host::{self, LibretroHost};
use crate::logging;
use crate::state::MemoryKind;

/// The process-wide frontend instance declared by the exporting macro.
pub type Slot<C> = Mutex<Frontend<C>>;

fn lock<C: EmulationCore>(slot: &Slot<C>) -> MutexGuard<'_, Frontend<C>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn deinit<C: EmulationCore>(slot: &Slot<C>) {
    lock(slot).unload_game();
}

pub fn set_environment(cb: abi::EnvironmentFn) {
    host::update_callbacks(|cbs| cbs.environment = Some(cb));
    logging::init(cb);
    if !LibretroHost::current().register_options() {
        warn!("frontend did not accept core options");
    }
}

pub fn set_video_refresh(cb: abi::VideoRefreshFn) {
    host::update_callbacks(|cbs| cbs.video_refresh = Some(cb));
}

pub fn set_audio_sample(cb: abi::AudioSampleFn) {
    host::update_callbacks(|cbs| cbs.audio_sample = Some(cb));
}

pub fn set_audio_sample_batch(cb: abi::AudioSampleBatchFn) {
    host::update_callbacks(|cbs| cbs.audio_sample_batch = Some(cb));
}

pub fn set_input_poll(cb: abi::InputPollFn) {
    host::update_callbacks(|cbs| cbs.input_poll = Some(cb));
}

pub fn set_input_state(cb: abi::InputStateFn) {
    host::update_callbacks(|cbs| cbs.input_state = Some(cb));
}

/// # Safety
/// `info` must be null or point to writable storage for a `retro_system_info`.
pub unsafe fn get_system_info<C: EmulationCore>(info: *mut abi::SystemInfo) {
    if info.is_null() {
        return;
    }
    let core = C::info();
    let value = abi::SystemInfo {
        library_name: core.library_name.as_ptr(),
        library_version: core.library_version.as_ptr(),
        valid_extensions: core.valid_extensions.as_ptr(),
        need_fullpath: false,
        block_extract: false,
    };
    // SAFETY: non-null and writable per the caller contract.
    unsafe { info.write(value) };
}

/// # Safety
/// `info` must be null or point to writable storage for a `retro_system_av_info`.
pub unsafe fn get_system_av_info<C: EmulationCore>(slot: &Slot<C>, info: *mut abi::SystemAvInfo) {
    if info.is_null() {
        return;
    }
    let value = host::system_av_info(&lock(slot).av_info());
    // SAFETY: non-null and writable per the caller contract.
    unsafe { info.write(value) };
}

pub fn reset<C: EmulationCore>(slot: &Slot<C>) {
    lock(slot).reset();
}

pub fn run<C: EmulationCore>(slot: &Slot<C>) {
    let mut host = LibretroHost::current();
    if let Err(err) = lock(slot).run(&mut host) {
        error!("frame failed: {err:#}");
    }
}

pub fn serialize_size<C: EmulationCore>(slot: &Slot<C>) -> usize {
    lock(slot).serialized_size()
}

/// # Safety
/// `data` must be null or valid for writes of `size` bytes.
pub unsafe fn serialize<C: EmulationCore>(slot: &Slot<C>, data: *mut c_void, size: usize) -> bool {
    if data.is_null() {
        return false;
    }
    // SAFETY: checked non-null; length per the caller contract.
    let buf = unsafe { std::slice::from_raw_parts_mut(data.cast::<u8>(), size) };
    let mut host = LibretroHost::current();
    match lock(slot).save(&mut host, buf) {
        Ok(_) => true,
        Err(err) => {
            warn!("{err}");
            false
        }
    }
}

/// # Safety
/// `data` must be null or valid for reads of `size` bytes.
pub unsafe fn unserialize<C: EmulationCore>(
    slot: &Slot<C>,
    data: *const c_void,
    size: usize,
) -> bool {
    if data.is_null() {
        return false;
    }
    // SAFETY: checked non-null; length per the caller contract.
    let buf = unsafe { std::slice::from_raw_parts(data.cast::<u8>(), size) };
    let mut host = LibretroHost::current();
    match lock(slot).load_state(&mut host, buf) {
        Ok(()) => true,
        Err(err) => {
            warn!("{err}");
            false
        }
    }
}

/// # Safety
/// `game` must be null or point to a `retro_game_info` whose `data`/`size` describe a readable
/// buffer for the duration of the call.
pub unsafe fn load_game<C: EmulationCore>(slot: &Slot<C>, game: *const abi::GameInfo) -> bool {
    // SAFETY: null-checked by `as_ref`; valid per the caller contract.
    let Some(game) = (unsafe { game.as_ref() }) else {
        error!("load_game called without game info");
        return false;
    };
    let rom: &[u8] = if game.data.is_null() {
        &[]
    } else {
        // SAFETY: the frontend keeps `data` alive for the call; `need_fullpath` is false.
        unsafe { std::slice::from_raw_parts(game.data.cast::<u8>(), game.size) }
    };

    let mut host = LibretroHost::current();
    match lock(slot).load_game(&mut host, rom) {
        Ok(()) => true,
        Err(err) => {
            error!("failed to load game: {err}");
            false
        }
    }
}

pub fn unload_game<C: EmulationCore>(slot: &Slot<C>) {
    lock(slot).unload_game();
}

pub fn get_region() -> c_uint {
    abi::REGION_NTSC
}

/// Pointer into the core's memory for `id`, or null. Valid until the game is unloaded.
pub fn get_memory_data<C: EmulationCore>(slot: &Slot<C>, id: c_uint) -> *mut c_void {
    let Some(kind) = MemoryKind::from_id(id) else {
        return std::ptr::null_mut();
    };
    lock(slot)
        .memory_data(kind)
        .map_or(std::ptr::null_mut(), |mem| mem.as_mut_ptr().cast())
}

pub fn get_memory_size<C: EmulationCore>(slot: &Slot<C>, id: c_uint) -> usize {
    let Some(kind) = MemoryKind::from_id(id) else {
        return 0;
    };
    lock(slot).memory_data(kind).map_or(0, |mem| mem.len())
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;
    use std::mem::MaybeUninit;

    use super::*;
    use crate::testing::{FakeCore, FakeHost, ines_image};

    // No test registers frontend callbacks, so every LibretroHost here is empty.
    fn slot() -> Slot<FakeCore> {
        Mutex::new(Frontend::new())
    }

    fn loaded(battery: bool) -> Slot<FakeCore> {
        let slot = slot();
        lock(&slot)
            .load_game(&mut FakeHost::default(), &ines_image(battery))
            .expect("load");
        slot
    }

    fn game_info(rom: &[u8]) -> abi::GameInfo {
        abi::GameInfo {
            path: std::ptr::null(),
            data: rom.as_ptr().cast(),
            size: rom.len(),
            meta: std::ptr::null(),
        }
    }

    #[test]
    fn state_calls_fail_without_buffer_or_game() {
        let slot = slot();
        let mut buf = [0u8; 64];

        assert_eq!(serialize_size(&slot), 0);
        unsafe {
            assert!(!serialize(&slot, std::ptr::null_mut(), 64));
            assert!(!serialize(&slot, buf.as_mut_ptr().cast(), buf.len()));
            assert!(!unserialize(&slot, std::ptr::null(), 64));
            assert!(!unserialize(&slot, buf.as_ptr().cast(), buf.len()));
        }
    }

    #[test]
    fn state_round_trips_through_raw_buffers() {
        let slot = loaded(false);
        let size = serialize_size(&slot);
        assert!(size > 0);

        let mut buf = vec![0u8; size];
        unsafe {
            assert!(serialize(&slot, buf.as_mut_ptr().cast(), buf.len()));
            assert!(!serialize(&slot, buf.as_mut_ptr().cast(), size - 1));
            assert!(unserialize(&slot, buf.as_ptr().cast(), buf.len()));
            assert!(!unserialize(&slot, buf.as_ptr().cast(), size - 1));
        }
    }

    #[test]
    fn memory_queries_collapse_to_null() {
        let slot = slot();
        assert!(get_memory_data(&slot, abi::MEMORY_SYSTEM_RAM).is_null());
        assert_eq!(get_memory_size(&slot, abi::MEMORY_SYSTEM_RAM), 0);

        let slot = loaded(false);
        assert!(get_memory_data(&slot, 99).is_null());
        assert_eq!(get_memory_size(&slot, 99), 0);
        assert!(get_memory_data(&slot, abi::MEMORY_SAVE_RAM).is_null());
        assert_eq!(get_memory_size(&slot, abi::MEMORY_SAVE_RAM), 0);

        assert!(!get_memory_data(&slot, abi::MEMORY_SYSTEM_RAM).is_null());
        assert_eq!(get_memory_size(&slot, abi::MEMORY_SYSTEM_RAM), 0x800);
    }

    #[test]
    fn battery_cartridge_exposes_save_ram() {
        let slot = loaded(true);
        let ptr = get_memory_data(&slot, abi::MEMORY_SAVE_RAM);
        let expected = lock(&slot)
            .memory_data(MemoryKind::SaveRam)
            .map(|mem| mem.as_mut_ptr());
        assert_eq!(Some(ptr.cast::<u8>()), expected);
        assert_eq!(get_memory_size(&slot, abi::MEMORY_SAVE_RAM), 0x2000);
    }

    #[test]
    fn load_game_rejects_missing_info() {
        let slot = slot();
        assert!(!unsafe { load_game(&slot, std::ptr::null()) });
        assert!(!lock(&slot).is_loaded());
    }

    #[test]
    fn load_game_fails_when_frontend_refuses_rgb565() {
        let slot = slot();
        let rom = ines_image(false);
        let info = game_info(&rom);

        assert!(!unsafe { load_game(&slot, &info) });
        assert!(!lock(&slot).is_loaded());

        let empty = game_info(&[]);
        assert!(!unsafe { load_game(&slot, &empty) });
    }

    #[test]
    fn av_info_without_game_reports_defaults() {
        let slot = slot();
        unsafe { get_system_av_info(&slot, std::ptr::null_mut()) };

        let mut info = MaybeUninit::<abi::SystemAvInfo>::uninit();
        let info = unsafe {
            get_system_av_info(&slot, info.as_mut_ptr());
            info.assume_init()
        };
        assert_eq!(
            (info.geometry.base_width, info.geometry.base_height),
            (256, 224)
        );
        assert_eq!(info.timing.sample_rate, 44_100.0);
    }

    #[test]
    fn system_info_names_core() {
        let mut info = MaybeUninit::<abi::SystemInfo>::uninit();
        let info = unsafe {
            get_system_info::<FakeCore>(info.as_mut_ptr());
            info.assume_init()
        };
        let name = unsafe { CStr::from_ptr(info.library_name) };
        assert_eq!(name, c"FakeNES");
        assert!(!info.need_fullpath);
        assert_eq!(get_region(), abi::REGION_NTSC);
    }

    #[test]
    fn frontend_calls_without_game_are_no_ops() {
        let slot = slot();
        run(&slot);
        reset(&slot);
        unload_game(&slot);
        deinit(&slot);
        assert!(!lock(&slot).is_loaded());
    }

    #[test]
    fn unload_releases_memory() {
        let slot = loaded(true);
        unload_game(&slot);
        assert!(get_memory_data(&slot, abi::MEMORY_SYSTEM_RAM).is_null());
        assert_eq!(serialize_size(&slot), 0);
    }
}
