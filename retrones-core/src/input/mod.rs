//! Controller input for retrones-core.
//!
//! Responsibilities:
//! - Poll the host exactly once per frame and fold the eight NES buttons of each port into a
//!   [`Buttons`] mask.
//! - Resolve simultaneous opposite directions (Up+Down, Left+Right) unless the user allows them.
//! - Describe the button layout to the host for its remapping UI.
//!
//! Nothing is cached between frames: every frame samples the host fresh.

use std::ffi::CStr;

use bitflags::bitflags;

use crate::host::Host;

/// Number of controller ports.
pub const PORTS: usize = 2;

bitflags! {
    /// Standard controller shift-register bits, as the core expects them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Buttons: u8 {
        const A = 0x01;
        const B = 0x02;
        const SELECT = 0x04;
        const START = 0x08;
        const UP = 0x10;
        const DOWN = 0x20;
        const LEFT = 0x40;
        const RIGHT = 0x80;
    }
}

/// libretro joypad ids used by the NES pad.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum JoypadButton {
    B = libretro_sys::DEVICE_ID_JOYPAD_B,
    Select = libretro_sys::DEVICE_ID_JOYPAD_SELECT,
    Start = libretro_sys::DEVICE_ID_JOYPAD_START,
    Up = libretro_sys::DEVICE_ID_JOYPAD_UP,
    Down = libretro_sys::DEVICE_ID_JOYPAD_DOWN,
    Left = libretro_sys::DEVICE_ID_JOYPAD_LEFT,
    Right = libretro_sys::DEVICE_ID_JOYPAD_RIGHT,
    A = libretro_sys::DEVICE_ID_JOYPAD_A,
}

const BINDINGS: [(JoypadButton, Buttons); 8] = [
    (JoypadButton::A, Buttons::A),
    (JoypadButton::B, Buttons::B),
    (JoypadButton::Select, Buttons::SELECT),
    (JoypadButton::Start, Buttons::START),
    (JoypadButton::Up, Buttons::UP),
    (JoypadButton::Down, Buttons::DOWN),
    (JoypadButton::Left, Buttons::LEFT),
    (JoypadButton::Right, Buttons::RIGHT),
];

impl Buttons {
    pub fn from_joypad(button: JoypadButton) -> Self {
        BINDINGS
            .iter()
            .find(|(b, _)| *b == button)
            .map(|(_, mask)| *mask)
            .unwrap_or_default()
    }
}

/// Clear both bits of any opposing pair unless opposing directions are allowed.
pub fn resolve_opposing(mut pad: Buttons, allow_opposing: bool) -> Buttons {
    if allow_opposing {
        return pad;
    }
    for pair in [Buttons::UP | Buttons::DOWN, Buttons::LEFT | Buttons::RIGHT] {
        if pad.contains(pair) {
            pad.remove(pair);
        }
    }
    pad
}

/// Poll the host once and build the masks for both ports.
pub fn poll<H: Host + ?Sized>(host: &mut H, allow_opposing: bool) -> [Buttons; PORTS] {
    host.poll_input();

    let mut pads = [Buttons::empty(); PORTS];
    for (port, pad) in pads.iter_mut().enumerate() {
        for (button, mask) in BINDINGS {
            if host.joypad_pressed(port as u32, button) {
                pad.insert(mask);
            }
        }
        *pad = resolve_opposing(*pad, allow_opposing);
    }
    pads
}

/// One labelled button for the host's input descriptor list.
#[derive(Clone, Copy, Debug)]
pub struct ButtonDescriptor {
    pub port: u32,
    pub button: JoypadButton,
    pub label: &'static CStr,
}

static LABELS: [(JoypadButton, &CStr); 8] = [
    (JoypadButton::Left, c"D-Pad Left"),
    (JoypadButton::Up, c"D-Pad Up"),
    (JoypadButton::Down, c"D-Pad Down"),
    (JoypadButton::Right, c"D-Pad Right"),
    (JoypadButton::B, c"B"),
    (JoypadButton::A, c"A"),
    (JoypadButton::Select, c"Select"),
    (JoypadButton::Start, c"Start"),
];

/// Descriptors for every button on every port.
pub fn descriptors() -> Vec<ButtonDescriptor> {
    (0..PORTS as u32)
        .flat_map(|port| {
            LABELS.iter().map(move |&(button, label)| ButtonDescriptor {
                port,
                button,
                label,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHost;

    #[test]
    fn opposing_pairs_cancel_when_disallowed() {
        let pad = Buttons::UP | Buttons::DOWN | Buttons::A;
        assert_eq!(resolve_opposing(pad, false), Buttons::A);

        let pad = Buttons::LEFT | Buttons::RIGHT | Buttons::UP;
        assert_eq!(resolve_opposing(pad, false), Buttons::UP);
    }

    #[test]
    fn opposing_pairs_pass_through_when_allowed() {
        let pad = Buttons::UP | Buttons::DOWN | Buttons::LEFT | Buttons::RIGHT;
        assert_eq!(resolve_opposing(pad, true), pad);
    }

    #[test]
    fn single_direction_is_kept() {
        assert_eq!(resolve_opposing(Buttons::DOWN, false), Buttons::DOWN);
        assert_eq!(
            resolve_opposing(Buttons::LEFT | Buttons::UP, false),
            Buttons::LEFT | Buttons::UP
        );
    }

    #[test]
    fn poll_calls_host_once_and_reads_both_ports() {
        let mut host = FakeHost::default();
        host.held[0] = Buttons::A | Buttons::START;
        host.held[1] = Buttons::B | Buttons::LEFT;

        let pads = poll(&mut host, false);

        assert_eq!(host.polls, 1);
        assert_eq!(pads[0], Buttons::A | Buttons::START);
        assert_eq!(pads[1], Buttons::B | Buttons::LEFT);
    }

    #[test]
    fn poll_applies_policy_per_port() {
        let mut host = FakeHost::default();
        host.held[0] = Buttons::UP | Buttons::DOWN;
        host.held[1] = Buttons::UP | Buttons::DOWN;

        assert_eq!(poll(&mut host, false), [Buttons::empty(); PORTS]);
        assert_eq!(
            poll(&mut host, true),
            [Buttons::UP | Buttons::DOWN, Buttons::UP | Buttons::DOWN]
        );
        assert_eq!(host.polls, 2);
    }

    #[test]
    fn every_binding_maps_to_a_distinct_bit() {
        let all = BINDINGS
            .iter()
            .fold(Buttons::empty(), |acc, (b, _)| acc | Buttons::from_joypad(*b));
        assert_eq!(all, Buttons::all());
    }

    #[test]
    fn descriptors_cover_both_ports() {
        let descs = descriptors();
        assert_eq!(descs.len(), 16);
        assert!(descs.iter().filter(|d| d.port == 1).count() == 8);
        assert_eq!(descs[0].label, c"D-Pad Left");
    }
}
