//! Core options.
//!
//! Options are plain strings on the host side. [`ConfigBridge::refresh`] reads the whole table
//! when the host signals a change, coerces each value (falling back to the option's default when
//! a value is missing or unrecognised) and reports what changed.

use std::ffi::CStr;

use crate::abi::option_keys;
use crate::av::{AspectMode, AudioMode, Overscan};
use crate::emu::{Equalizer, SpriteMode};
use crate::host::Host;

/// Typed view of every option.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Settings {
    pub sprite_mode: SpriteMode,
    pub aspect: AspectMode,
    pub overscan_h: bool,
    pub overscan_v: bool,
    pub allow_opposing: bool,
    pub audio_mode: AudioMode,
    pub equalizer: Equalizer,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sprite_mode: SpriteMode::Enhanced,
            aspect: AspectMode::Par,
            overscan_h: true,
            overscan_v: false,
            allow_opposing: false,
            audio_mode: AudioMode::Nonlinear,
            equalizer: Equalizer::Nes,
        }
    }
}

impl Settings {
    pub fn overscan(&self) -> Overscan {
        Overscan::new(self.overscan_h, self.overscan_v)
    }

    /// Read every option from the host. Missing or unknown values take their defaults.
    pub fn read<H: Host + ?Sized>(host: &mut H) -> Self {
        let defaults = Self::default();
        let mut get = |key: &CStr| host.variable(key);

        Self {
            sprite_mode: match get(option_keys::NO_SPRITE_LIMIT).as_deref() {
                Some("enabled") => SpriteMode::Enhanced,
                Some("disabled") => SpriteMode::Visible,
                _ => defaults.sprite_mode,
            },
            aspect: parse_aspect(get(option_keys::ASPECT_RATIO_PAR).as_deref())
                .unwrap_or(defaults.aspect),
            overscan_h: parse_toggle(get(option_keys::USE_OVERSCAN_H).as_deref())
                .unwrap_or(defaults.overscan_h),
            overscan_v: parse_toggle(get(option_keys::USE_OVERSCAN_V).as_deref())
                .unwrap_or(defaults.overscan_v),
            allow_opposing: parse_toggle(get(option_keys::UP_DOWN_ALLOWED).as_deref())
                .unwrap_or(defaults.allow_opposing),
            audio_mode: parse_audio_mode(get(option_keys::AUDIO_MODE).as_deref())
                .unwrap_or(defaults.audio_mode),
            equalizer: parse_equalizer(get(option_keys::AUDIO_EQ).as_deref())
                .unwrap_or(defaults.equalizer),
        }
    }
}

pub fn parse_toggle(value: Option<&str>) -> Option<bool> {
    match value? {
        "enabled" => Some(true),
        "disabled" => Some(false),
        _ => None,
    }
}

pub fn parse_aspect(value: Option<&str>) -> Option<AspectMode> {
    match value? {
        "PAR" => Some(AspectMode::Par),
        "4:3" => Some(AspectMode::FourThree),
        _ => None,
    }
}

pub fn parse_audio_mode(value: Option<&str>) -> Option<AudioMode> {
    match value? {
        "nonlinear" => Some(AudioMode::Nonlinear),
        "linear" => Some(AudioMode::Linear),
        "stereo panning" => Some(AudioMode::StereoPanning),
        _ => None,
    }
}

pub fn parse_equalizer(value: Option<&str>) -> Option<Equalizer> {
    match value? {
        "default" | "nes" => Some(Equalizer::Nes),
        "famicom" => Some(Equalizer::Famicom),
        "tv" => Some(Equalizer::Tv),
        "flat" => Some(Equalizer::Flat),
        "crisp" => Some(Equalizer::Crisp),
        "tinny" => Some(Equalizer::Tinny),
        _ => None,
    }
}

/// Which settings differ from the previous refresh.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SettingsDiff {
    pub sprite_mode: bool,
    pub aspect: bool,
    pub overscan_h: bool,
    pub overscan_v: bool,
    pub allow_opposing: bool,
}

impl SettingsDiff {
    pub fn between(old: &Settings, new: &Settings) -> Self {
        Self {
            sprite_mode: old.sprite_mode != new.sprite_mode,
            aspect: old.aspect != new.aspect,
            overscan_h: old.overscan_h != new.overscan_h,
            overscan_v: old.overscan_v != new.overscan_v,
            allow_opposing: old.allow_opposing != new.allow_opposing,
        }
    }

    /// Geometry has to be republished.
    pub fn video_changed(&self) -> bool {
        self.aspect || self.overscan_h || self.overscan_v
    }

    pub fn any(&self) -> bool {
        self.video_changed() || self.sprite_mode || self.allow_opposing
    }
}

#[derive(Debug, Default)]
pub struct ConfigBridge {
    settings: Settings,
}

impl ConfigBridge {
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Re-read every option. Only call when the host reports an update.
    pub fn refresh<H: Host + ?Sized>(&mut self, host: &mut H) -> SettingsDiff {
        let new = Settings::read(host);
        let diff = SettingsDiff::between(&self.settings, &new);
        self.settings = new;
        diff
    }
}
