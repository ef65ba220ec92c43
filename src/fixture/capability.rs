use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::dmx_value::{scale_range, Resolution};

use super::key::Key;

/// Inclusive DMX value range, expressed at the resolution of whatever
/// declares it. Serialized as a two-element array `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct DmxRange {
    pub start: u32,
    pub end: u32,
}

impl DmxRange {
    pub fn new(start: u32, end: u32) -> Self {
        DmxRange { start, end }
    }

    /// The full range of a channel at `resolution`.
    pub fn full(resolution: Resolution) -> Self {
        DmxRange {
            start: 0,
            end: resolution.max_value(),
        }
    }

    pub fn contains(&self, value: u32) -> bool {
        (self.start..=self.end).contains(&value)
    }

    /// Both bounds scaled independently from `from` to `to` resolution.
    pub fn at_resolution(&self, from: Resolution, to: Resolution) -> DmxRange {
        let (start, end) = scale_range(self.start, self.end, from, to);
        DmxRange { start, end }
    }

    /// The value in the middle of the range, rounded down. Used as menu
    /// value for centered capabilities.
    pub fn center(&self) -> u32 {
        self.start + (self.end - self.start) / 2
    }
}

impl From<[u32; 2]> for DmxRange {
    fn from([start, end]: [u32; 2]) -> Self {
        DmxRange { start, end }
    }
}

impl From<DmxRange> for [u32; 2] {
    fn from(range: DmxRange) -> Self {
        [range.start, range.end]
    }
}

/// How a lighting program menu should present a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MenuClick {
    #[default]
    Start,
    Center,
    End,
    Hidden,
}

/// A single color an intensity channel can control.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
pub enum Color {
    Red,
    Green,
    Blue,
    Cyan,
    Magenta,
    Yellow,
    Amber,
    White,
    #[serde(rename = "Warm White")]
    #[strum(serialize = "Warm White")]
    WarmWhite,
    #[serde(rename = "Cold White")]
    #[strum(serialize = "Cold White")]
    ColdWhite,
    #[serde(rename = "UV")]
    #[strum(serialize = "UV")]
    Uv,
    Lime,
    Indigo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShutterEffect {
    Open,
    Closed,
    Strobe,
    Pulse,
    RampUp,
    RampDown,
    Lightning,
}

/// Typed behavior data of a capability, keyed by the `type` tag of the JSON
/// document. Each variant only carries the fields relevant for its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "PascalCase")]
pub enum CapabilityKind {
    NoFunction,
    Intensity,
    #[serde(rename_all = "camelCase")]
    ColorIntensity { color: Color },
    #[serde(rename_all = "camelCase")]
    ColorPreset {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        colors: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Pan { angle_start: f64, angle_end: f64 },
    #[serde(rename_all = "camelCase")]
    Tilt { angle_start: f64, angle_end: f64 },
    #[serde(rename_all = "camelCase")]
    PanContinuous { speed_start: f64, speed_end: f64 },
    #[serde(rename_all = "camelCase")]
    TiltContinuous { speed_start: f64, speed_end: f64 },
    #[serde(rename_all = "camelCase")]
    ShutterStrobe {
        shutter_effect: ShutterEffect,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speed_start: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speed_end: Option<f64>,
        #[serde(default)]
        sound_controlled: bool,
        #[serde(default)]
        random_timing: bool,
    },
    #[serde(rename_all = "camelCase")]
    StrobeSpeed { speed_start: f64, speed_end: f64 },
    #[serde(rename_all = "camelCase")]
    WheelSlot {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        wheel: Option<String>,
        slot_number: f64,
    },
    #[serde(rename_all = "camelCase")]
    WheelRotation {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        wheel: Option<String>,
        speed_start: f64,
        speed_end: f64,
    },
    #[serde(rename_all = "camelCase")]
    Effect {
        effect_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speed_start: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speed_end: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    EffectSpeed { speed_start: f64, speed_end: f64 },
    #[serde(rename_all = "camelCase")]
    Focus { distance_start: f64, distance_end: f64 },
    #[serde(rename_all = "camelCase")]
    Zoom { angle_start: f64, angle_end: f64 },
    #[serde(rename_all = "camelCase")]
    Iris {
        open_percent_start: f64,
        open_percent_end: f64,
    },
    Prism,
    #[serde(rename_all = "camelCase")]
    Speed { speed_start: f64, speed_end: f64 },
    #[serde(rename_all = "camelCase")]
    Maintenance {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hold_seconds: Option<f64>,
    },
    Generic,
}

/// One typed, DMX-range-bound behavior entry of a coarse channel.
///
/// `dmx_range` is expressed at the owning channel's declared value
/// resolution. Within one channel, capability ranges must be strictly
/// ordered and non-overlapping; that invariant is checked when the channel
/// is built, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct Capability {
    pub dmx_range: DmxRange,
    pub kind: CapabilityKind,
    pub comment: Option<String>,
    pub menu_click: MenuClick,
    /// Switching channel alias to the channel this capability switches it to.
    pub switch_channels: BTreeMap<Key, Key>,
}

impl Capability {
    /// Capability covering a channel's whole value domain, used when the
    /// document declares the single-capability shorthand (or nothing, which
    /// defaults to a 0-100% intensity).
    pub fn implicit(kind: CapabilityKind, resolution: Resolution) -> Self {
        Capability {
            dmx_range: DmxRange::full(resolution),
            kind,
            comment: None,
            menu_click: MenuClick::default(),
            switch_channels: BTreeMap::new(),
        }
    }

    /// The capability's range scaled from the channel's declared resolution
    /// to `resolution`.
    pub fn dmx_range_at(&self, declared: Resolution, resolution: Resolution) -> DmxRange {
        self.dmx_range.at_resolution(declared, resolution)
    }

    /// The value a menu should jump to for this capability, at the channel's
    /// declared resolution. `None` for hidden capabilities.
    pub fn menu_value(&self) -> Option<u32> {
        match self.menu_click {
            MenuClick::Start => Some(self.dmx_range.start),
            MenuClick::Center => Some(self.dmx_range.center()),
            MenuClick::End => Some(self.dmx_range.end),
            MenuClick::Hidden => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_scaling() {
        let range = DmxRange::new(16, 79);
        let scaled = range.at_resolution(Resolution::EIGHT_BIT, Resolution::SIXTEEN_BIT);
        assert_eq!(scaled, DmxRange::new(4112, 20303));
        let back = scaled.at_resolution(Resolution::SIXTEEN_BIT, Resolution::EIGHT_BIT);
        assert_eq!(back, range);
    }

    #[test]
    fn full_range_and_center() {
        assert_eq!(
            DmxRange::full(Resolution::SIXTEEN_BIT),
            DmxRange::new(0, 65535)
        );
        assert_eq!(DmxRange::new(10, 20).center(), 15);
        assert_eq!(DmxRange::new(10, 21).center(), 15);
    }

    #[test]
    fn kind_parses_from_tagged_json() {
        let kind: CapabilityKind = serde_json::from_value(serde_json::json!({
            "type": "ColorIntensity",
            "color": "Warm White",
        }))
        .unwrap();
        assert_eq!(
            kind,
            CapabilityKind::ColorIntensity {
                color: Color::WarmWhite
            }
        );

        let kind: CapabilityKind = serde_json::from_value(serde_json::json!({
            "type": "ShutterStrobe",
            "shutterEffect": "strobe",
            "speedStart": 0.5,
            "speedEnd": 10.0,
        }))
        .unwrap();
        assert!(matches!(
            kind,
            CapabilityKind::ShutterStrobe {
                shutter_effect: ShutterEffect::Strobe,
                sound_controlled: false,
                ..
            }
        ));
    }

    #[test]
    fn menu_values() {
        let mut capability = Capability::implicit(CapabilityKind::Intensity, Resolution::EIGHT_BIT);
        assert_eq!(capability.menu_value(), Some(0));
        capability.menu_click = MenuClick::Center;
        assert_eq!(capability.menu_value(), Some(127));
        capability.menu_click = MenuClick::End;
        assert_eq!(capability.menu_value(), Some(255));
        capability.menu_click = MenuClick::Hidden;
        assert_eq!(capability.menu_value(), None);
    }
}
