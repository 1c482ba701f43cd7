//! Save states and raw memory exposure.
//!
//! Save states:
//! - The blob format belongs to the core; this layer only sizes, writes and reads it.
//! - Sizing is a dry run into a counting writer.
//! - In fast mode (rewind, run-ahead) the active audio sink's buffers are snapshotted and
//!   restored alongside, so the seam is inaudible. That audio state lives in the core, not in the
//!   blob, and is only meaningful within the same process.
//!
//! Memory:
//! - System RAM is always exposed; save RAM only when the cartridge is battery backed.
//! - Regions are live views into the core. The host may read them between frames but must not
//!   keep them across a game unload.

use std::ffi::c_uint;
use std::io::{self, Write};
use std::ptr::NonNull;

use crate::abi;
use crate::av::AudioPipeline;
use crate::emu::EmulationCore;
use crate::error::BridgeError;

/// Logical address of system RAM in the published memory map.
pub const SYSTEM_RAM_START: usize = 0x0000;
/// Logical address of cartridge RAM in the published memory map.
pub const SAVE_RAM_START: usize = 0x6000;

/// Writer that only counts bytes.
#[derive(Debug, Default)]
pub struct SizeCounter {
    len: usize,
}

impl SizeCounter {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Write for SizeCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.len += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Size of a full save state, or 0 when the core cannot produce one. 0 means "unknown".
pub fn serialized_size<C: EmulationCore>(core: &C) -> usize {
    let mut counter = SizeCounter::default();
    match core.save_state(&mut counter) {
        Ok(()) => counter.len(),
        Err(err) => {
            log::warn!("save state dry run failed: {err:#}");
            0
        }
    }
}

/// Write a full save state into `buf`. Returns the number of bytes written.
pub fn save<C: EmulationCore>(
    core: &mut C,
    audio: &AudioPipeline,
    buf: &mut [u8],
    fast: bool,
) -> Result<usize, BridgeError> {
    let capacity = buf.len();
    let mut out: &mut [u8] = buf;
    core.save_state(&mut out).map_err(BridgeError::StateSave)?;
    let written = capacity - out.len();

    if fast {
        audio.snapshot(core);
    }
    Ok(written)
}

/// Restore a save state produced by [`save`].
pub fn load<C: EmulationCore>(
    core: &mut C,
    audio: &AudioPipeline,
    data: &[u8],
    fast: bool,
) -> Result<(), BridgeError> {
    core.load_state(data).map_err(BridgeError::StateLoad)?;

    if fast {
        audio.restore(core);
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MemoryKind {
    SaveRam,
    SystemRam,
}

impl MemoryKind {
    /// Map a `RETRO_MEMORY_*` id.
    pub fn from_id(id: c_uint) -> Option<Self> {
        match id {
            abi::MEMORY_SAVE_RAM => Some(Self::SaveRam),
            abi::MEMORY_SYSTEM_RAM => Some(Self::SystemRam),
            _ => None,
        }
    }
}

/// Live view of a core memory region; see the module docs for lifetime rules.
pub fn memory_data<C: EmulationCore>(core: &mut C, kind: MemoryKind) -> Option<&mut [u8]> {
    match kind {
        MemoryKind::SystemRam => Some(core.system_ram()),
        MemoryKind::SaveRam if core.has_battery_ram() => Some(core.save_ram()),
        MemoryKind::SaveRam => None,
    }
}

/// Non-owning descriptor of one published memory region.
#[derive(Clone, Copy, Debug)]
pub struct MemoryRegion {
    pub kind: MemoryKind,
    pub start: usize,
    pub select: usize,
    pub len: usize,
    ptr: NonNull<u8>,
}

impl MemoryRegion {
    fn new(kind: MemoryKind, start: usize, mem: &mut [u8]) -> Self {
        Self {
            kind,
            start,
            select: 0,
            len: mem.len(),
            ptr: NonNull::from(mem).cast(),
        }
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }
}

/// The fixed memory map: system RAM at 0x0000, cartridge RAM at 0x6000.
///
/// The pointers stay valid only while `core` does not move.
pub fn memory_map<C: EmulationCore>(core: &mut C) -> [MemoryRegion; 2] {
    let system = MemoryRegion::new(MemoryKind::SystemRam, SYSTEM_RAM_START, core.system_ram());
    let save = MemoryRegion::new(MemoryKind::SaveRam, SAVE_RAM_START, core.save_ram());
    [system, save]
}
