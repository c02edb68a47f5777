//! Plugin descriptor and port table.
//!
//! The granular unit exposes fourteen ports: a stereo audio pair in each
//! direction and ten scalar controls. Hint flags and descriptor bits use the
//! LADSPA numeric values so the C ABI layer can hand them through untouched.
//!
//! Range hints are advisory; the parameter resolver clamps independently.

use tapgrain_core::dsp::{lerp, log_lerp};

// --------------------------------- Descriptor bits -------------------------------

pub const PORT_INPUT: u32 = 0x1;
pub const PORT_OUTPUT: u32 = 0x2;
pub const PORT_CONTROL: u32 = 0x4;
pub const PORT_AUDIO: u32 = 0x8;

pub const HINT_BOUNDED_BELOW: u32 = 0x1;
pub const HINT_BOUNDED_ABOVE: u32 = 0x2;
pub const HINT_LOGARITHMIC: u32 = 0x10;
pub const HINT_INTEGER: u32 = 0x20;
pub const HINT_DEFAULT_MASK: u32 = 0x3C0;
pub const HINT_DEFAULT_MINIMUM: u32 = 0x40;
pub const HINT_DEFAULT_LOW: u32 = 0x80;
pub const HINT_DEFAULT_MIDDLE: u32 = 0xC0;
pub const HINT_DEFAULT_HIGH: u32 = 0x100;
pub const HINT_DEFAULT_MAXIMUM: u32 = 0x140;

const BOUNDED: u32 = HINT_BOUNDED_BELOW | HINT_BOUNDED_ABOVE;

// --------------------------------- Ports -----------------------------------------

/// Number of declared ports.
pub const PORT_COUNT: usize = 14;

/// Port indices, in declaration order.
#[repr(usize)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Port {
    LeftInput = 0,
    RightInput,
    LeftOutput,
    RightOutput,
    MinDelay,
    MaxDelay,
    MinLength,
    MaxLength,
    MinCooldown,
    MaxCooldown,
    MinGain,
    MaxGain,
    Slots,
    MasterGain,
}

impl Port {
    pub const ALL: [Port; PORT_COUNT] = [
        Port::LeftInput,
        Port::RightInput,
        Port::LeftOutput,
        Port::RightOutput,
        Port::MinDelay,
        Port::MaxDelay,
        Port::MinLength,
        Port::MaxLength,
        Port::MinCooldown,
        Port::MaxCooldown,
        Port::MinGain,
        Port::MaxGain,
        Port::Slots,
        Port::MasterGain,
    ];

    #[inline]
    pub fn from_index(index: usize) -> Option<Port> {
        Self::ALL.get(index).copied()
    }

    #[inline] pub fn index(self) -> usize { self as usize }

    #[inline] pub fn descriptor(self) -> &'static PortDescriptor { &PORTS[self.index()] }

    #[inline] pub fn name(self) -> &'static str { self.descriptor().name }

    #[inline] pub fn kind(self) -> PortKind { self.descriptor().kind }
}

/// What a port carries and in which direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PortKind {
    AudioIn,
    AudioOut,
    Control,
}

impl PortKind {
    /// LADSPA-style descriptor bits.
    #[inline]
    pub fn bits(self) -> u32 {
        match self {
            PortKind::AudioIn => PORT_INPUT | PORT_AUDIO,
            PortKind::AudioOut => PORT_OUTPUT | PORT_AUDIO,
            PortKind::Control => PORT_INPUT | PORT_CONTROL,
        }
    }
}

/// Advisory numeric range of a port plus its hint flags.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RangeHint {
    pub flags: u32,
    pub lower: f32,
    pub upper: f32,
}

impl RangeHint {
    const NONE: RangeHint = RangeHint { flags: 0, lower: 0.0, upper: 0.0 };

    const fn bounded(flags: u32, lower: f32, upper: f32) -> Self {
        Self { flags: BOUNDED | flags, lower, upper }
    }

    #[inline] pub fn is_logarithmic(&self) -> bool { self.flags & HINT_LOGARITHMIC != 0 }

    #[inline] pub fn is_integer(&self) -> bool { self.flags & HINT_INTEGER != 0 }

    /// Default value implied by the `DEFAULT_*` hint, if any.
    ///
    /// `low`/`high` sit a quarter of the way in from the respective bound,
    /// measured geometrically on logarithmic ports with a positive lower bound.
    pub fn default_value(&self) -> Option<f32> {
        let t = match self.flags & HINT_DEFAULT_MASK {
            HINT_DEFAULT_MINIMUM => 0.0,
            HINT_DEFAULT_LOW => 0.25,
            HINT_DEFAULT_MIDDLE => 0.5,
            HINT_DEFAULT_HIGH => 0.75,
            HINT_DEFAULT_MAXIMUM => 1.0,
            _ => return None,
        };
        let v = if self.is_logarithmic() {
            log_lerp(self.lower, self.upper, t)
        } else {
            lerp(self.lower, self.upper, t)
        };
        Some(if self.is_integer() { v.round() } else { v })
    }
}

/// One entry of the port table.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PortDescriptor {
    pub name: &'static str,
    pub kind: PortKind,
    pub hint: RangeHint,
}

const fn audio(name: &'static str, kind: PortKind) -> PortDescriptor {
    PortDescriptor { name, kind, hint: RangeHint::NONE }
}

const fn control(name: &'static str, hint: RangeHint) -> PortDescriptor {
    PortDescriptor { name, kind: PortKind::Control, hint }
}

const SECONDS_LOW: RangeHint = RangeHint::bounded(HINT_LOGARITHMIC | HINT_DEFAULT_LOW, 0.001, 2.0);
const SECONDS_HIGH: RangeHint = RangeHint::bounded(HINT_LOGARITHMIC | HINT_DEFAULT_HIGH, 0.001, 2.0);

/// The granular unit's ports, indexed by [`Port`].
pub static PORTS: [PortDescriptor; PORT_COUNT] = [
    audio("Left input", PortKind::AudioIn),
    audio("Right input", PortKind::AudioIn),
    audio("Left output", PortKind::AudioOut),
    audio("Right output", PortKind::AudioOut),
    control("Min. delay", SECONDS_LOW),
    control("Max. delay", SECONDS_HIGH),
    control("Min. length", SECONDS_LOW),
    control("Max. length", SECONDS_HIGH),
    control("Min. cooldown", SECONDS_LOW),
    control("Max. cooldown", SECONDS_HIGH),
    control("Min. gain", RangeHint::bounded(HINT_LOGARITHMIC | HINT_DEFAULT_LOW, 0.0, 1.0)),
    control("Max. gain", RangeHint::bounded(HINT_LOGARITHMIC | HINT_DEFAULT_HIGH, 0.0, 1.0)),
    control("Slots", RangeHint::bounded(HINT_INTEGER | HINT_DEFAULT_MINIMUM, 1.0, 64.0)),
    control("Master gain", RangeHint::bounded(HINT_DEFAULT_LOW, 0.0, 1.0)),
];

// --------------------------------- Plugin descriptor -----------------------------

/// Static metadata a host reads before instantiating.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PluginDescriptor {
    pub unique_id: u32,
    pub label: &'static str,
    pub name: &'static str,
    pub maker: &'static str,
    pub copyright: &'static str,
    pub ports: &'static [PortDescriptor],
}

pub static GRANULAR: PluginDescriptor = PluginDescriptor {
    unique_id: 4,
    label: "audio",
    name: "Granular",
    maker: "Ludvig Gunne Lindström",
    copyright: "None",
    ports: &PORTS,
};

/// Descriptor enumeration: the granular unit is the only entry, at index 0.
#[inline]
pub fn descriptor(index: usize) -> Option<&'static PluginDescriptor> {
    match index {
        0 => Some(&GRANULAR),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ports_are_declared_in_index_order() {
        for (i, port) in Port::ALL.iter().enumerate() {
            assert_eq!(port.index(), i);
            assert_eq!(Port::from_index(i), Some(*port));
        }
        assert_eq!(Port::from_index(PORT_COUNT), None);
        assert_eq!(Port::Slots.name(), "Slots");
        assert_eq!(Port::RightOutput.kind(), PortKind::AudioOut);
    }

    #[test]
    fn descriptor_bits_match_direction() {
        assert_eq!(Port::LeftInput.kind().bits(), 0x9);
        assert_eq!(Port::LeftOutput.kind().bits(), 0xA);
        assert_eq!(Port::MasterGain.kind().bits(), 0x5);
    }

    #[test]
    fn defaults_follow_hints() {
        let v = |p: Port| p.descriptor().hint.default_value().unwrap();
        // geometric quarter points of [0.001, 2]
        assert!((v(Port::MinDelay) - 0.006_687).abs() < 1e-5);
        assert!((v(Port::MaxDelay) - 0.299_07).abs() < 1e-4);
        // zero lower bound: linear even though flagged logarithmic
        assert!((v(Port::MinGain) - 0.25).abs() < 1e-6);
        assert!((v(Port::MaxGain) - 0.75).abs() < 1e-6);
        assert_eq!(v(Port::Slots), 1.0);
        assert!((v(Port::MasterGain) - 0.25).abs() < 1e-6);
        assert_eq!(Port::LeftInput.descriptor().hint.default_value(), None);
    }

    #[test]
    fn only_one_descriptor_is_exposed() {
        let d = descriptor(0).unwrap();
        assert_eq!(d.unique_id, 4);
        assert_eq!(d.name, "Granular");
        assert_eq!(d.ports.len(), PORT_COUNT);
        assert!(descriptor(1).is_none());
    }
}
