//! Loader utilities for retrones-core.
//!
//! Responsibilities:
//! - Sanity-check the ROM bytes the frontend hands over before the core sees them.
//! - Decode the iNES header for logging (mapper, bank counts, battery).
//!
//! Notes:
//! - The core does the authoritative parse; this only rejects images that cannot possibly be
//!   iNES so the failure is reported with a useful message.
//! - NES 2.0 extensions are not interpreted.

const INES_MAGIC: &[u8; 4] = b"NES\x1a";
const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;
const PRG_BANK_LEN: usize = 16 * 1024;
const CHR_BANK_LEN: usize = 8 * 1024;

/// Error returned by [`sniff`].
#[derive(thiserror::Error, Debug, Eq, PartialEq)]
pub enum LoadError {
    #[error("empty ROM image")]
    Empty,
    #[error("image is {0} bytes, too short for an iNES header")]
    Truncated(usize),
    #[error("missing iNES magic")]
    NotInes,
    #[error("header declares {declared} bytes but the image holds {actual}")]
    ShortPayload { declared: usize, actual: usize },
}

/// Fields of interest from an iNES header.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InesHeader {
    pub prg_banks: u8,
    pub chr_banks: u8,
    pub mapper: u8,
    pub battery: bool,
    pub trainer: bool,
    pub vertical_mirroring: bool,
    pub four_screen: bool,
}

impl InesHeader {
    /// Image size implied by the header.
    pub fn declared_len(&self) -> usize {
        HEADER_LEN
            + if self.trainer { TRAINER_LEN } else { 0 }
            + self.prg_banks as usize * PRG_BANK_LEN
            + self.chr_banks as usize * CHR_BANK_LEN
    }

    /// Nametable layout, for logging.
    pub fn mirroring(&self) -> &'static str {
        match (self.four_screen, self.vertical_mirroring) {
            (true, _) => "four-screen",
            (false, true) => "vertical",
            (false, false) => "horizontal",
        }
    }
}

/// Validate the header and check the image is long enough for it.
pub fn sniff(rom: &[u8]) -> Result<InesHeader, LoadError> {
    if rom.is_empty() {
        return Err(LoadError::Empty);
    }
    if rom.len() < HEADER_LEN {
        return Err(LoadError::Truncated(rom.len()));
    }
    if &rom[0..4] != INES_MAGIC {
        return Err(LoadError::NotInes);
    }

    let flags6 = rom[6];
    let flags7 = rom[7];
    let header = InesHeader {
        prg_banks: rom[4],
        chr_banks: rom[5],
        mapper: (flags6 >> 4) | (flags7 & 0xf0),
        battery: flags6 & 0x02 != 0,
        trainer: flags6 & 0x04 != 0,
        vertical_mirroring: flags6 & 0x01 != 0,
        four_screen: flags6 & 0x08 != 0,
    };

    let declared = header.declared_len();
    if rom.len() < declared {
        return Err(LoadError::ShortPayload {
            declared,
            actual: rom.len(),
        });
    }

    Ok(header)
}
