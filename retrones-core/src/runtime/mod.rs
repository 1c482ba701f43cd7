//! Runtime glue for retrones-core.
//!
//! Responsibilities:
//! - [`Session`]: the per-game frame pump (options -> input -> core step -> video -> audio).
//! - [`Frontend`]: the optional session behind the C entry points, plus what those entry points
//!   report while no game is loaded.
//! - [`entry`]: the bodies of the `retro_*` exports, generic over the core type, called by the
//!   [`crate::retrones_core!`] macro.

pub mod entry;
pub mod session;


pub use session::{Session, av_info_for};

use crate::av::AvInfo;
use crate::config::Settings;
use crate::emu::EmulationCore;
use crate::error::{BridgeError, Result};
use crate::host::Host;
use crate::state::MemoryKind;

/// The loaded game, if any.
pub struct Frontend<C: EmulationCore> {
    session: Option<Session<C>>,
}

impl<C: EmulationCore> Default for Frontend<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: EmulationCore> Frontend<C> {
    pub const fn new() -> Self {
        Self { session: None }
    }

    pub fn session(&self) -> Option<&Session<C>> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session<C>> {
        self.session.as_mut()
    }

    pub fn is_loaded(&self) -> bool {
        self.session.is_some()
    }

    /// Replace any running game with `rom`.
    pub fn load_game<H: Host>(&mut self, host: &mut H, rom: &[u8]) -> Result<()> {
        self.unload_game();
        let session = self.session.insert(Session::load(host, rom)?);
        session.publish_memory_map(host);
        Ok(())
    }

    pub fn unload_game(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
        }
    }

    /// Run one frame; a no-op while nothing is loaded.
    pub fn run<H: Host>(&mut self, host: &mut H) -> anyhow::Result<()> {
        match &mut self.session {
            Some(session) => session.run_frame(host),
            None => Ok(()),
        }
    }

    pub fn reset(&mut self) {
        if let Some(session) = &mut self.session {
            session.reset();
        }
    }

    /// Current geometry and timing; defaults until a game is loaded.
    pub fn av_info(&self) -> AvInfo {
        match &self.session {
            Some(session) => session.av_info(),
            None => av_info_for::<C>(&Settings::default()),
        }
    }

    pub fn serialized_size(&self) -> usize {
        self.session
            .as_ref()
            .map_or(0, |session| session.serialized_size())
    }

    pub fn save<H: Host>(&mut self, host: &mut H, buf: &mut [u8]) -> Result<usize> {
        self.session
            .as_mut()
            .ok_or(BridgeError::NotLoaded)?
            .save(host, buf)
    }

    pub fn load_state<H: Host>(&mut self, host: &mut H, data: &[u8]) -> Result<()> {
        self.session
            .as_mut()
            .ok_or(BridgeError::NotLoaded)?
            .load_state(host, data)
    }

    pub fn memory_data(&mut self, kind: MemoryKind) -> Option<&mut [u8]> {
        self.session.as_mut()?.memory_data(kind)
    }
}
