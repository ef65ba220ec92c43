use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dmx_value::{scale_value, Resolution};

use super::capability::{Capability, CapabilityKind, DmxRange};
use super::key::Key;

/// HTP/LTP merge precedence of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Precedence {
    /// Highest takes precedence (typically intensities).
    HTP,
    /// Latest takes precedence.
    #[default]
    LTP,
}

/// A channel owning the most significant byte of a logical value, together
/// with its capabilities and the aliases of its extra precision bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct CoarseChannel {
    pub key: Key,
    pub name: String,
    /// Total resolution the channel can reach when all its fine channels are
    /// used in a mode: 1 byte + one per fine channel alias.
    pub resolution: Resolution,
    /// Resolution that `capabilities`, `default_value` and `highlight_value`
    /// are expressed at. Defaults to `resolution`.
    pub value_resolution: Resolution,
    /// Aliases of the fine channels, ordered from most to least significant.
    pub fine_channel_aliases: Vec<Key>,
    pub default_value: u32,
    pub highlight_value: Option<u32>,
    pub precedence: Precedence,
    /// Non-empty, ordered by ascending DMX range.
    pub capabilities: Vec<Capability>,
}

impl CoarseChannel {
    /// The single capability, if the channel has exactly one (the
    /// single-capability shorthand of the document format).
    pub fn capability(&self) -> Option<&Capability> {
        match self.capabilities.as_slice() {
            [single] => Some(single),
            _ => None,
        }
    }

    /// Looks up the capability whose range contains `value` expressed at
    /// `resolution`. Ranges are checked in ascending order; the ordering
    /// invariant makes the first match the only one.
    pub fn capability_at(&self, value: u32, resolution: Resolution) -> Option<&Capability> {
        self.capabilities.iter().find(|capability| {
            capability
                .dmx_range_at(self.value_resolution, resolution)
                .contains(value)
        })
    }

    pub fn default_value_at(&self, resolution: Resolution) -> u32 {
        scale_value(self.default_value, self.value_resolution, resolution)
    }

    pub fn highlight_value_at(&self, resolution: Resolution) -> Option<u32> {
        self.highlight_value
            .map(|value| scale_value(value, self.value_resolution, resolution))
    }

    /// All switching channel aliases any of this channel's capabilities
    /// declare, in declaration order of the first capability mentioning them.
    pub fn switching_channel_aliases(&self) -> Vec<&Key> {
        let mut aliases: Vec<&Key> = vec![];
        for capability in &self.capabilities {
            for alias in capability.switch_channels.keys() {
                if !aliases.contains(&alias) {
                    aliases.push(alias);
                }
            }
        }
        aliases
    }
}

/// A view of one coarse channel at one extra byte of precision.
///
/// Fine channels have no capabilities of their own; a synthetic fine
/// adjustment capability is generated on demand for export.
#[derive(Debug, Clone, PartialEq)]
pub struct FineChannel {
    /// The alias this fine channel is referenced by in mode channel lists.
    pub key: Key,
    pub coarse_key: Key,
    /// 1 = first fine byte after the coarse byte, 2 = second, ...
    pub fineness: u8,
}

impl FineChannel {
    pub fn name(&self) -> String {
        match self.fineness {
            1 => format!("{} fine", self.coarse_key),
            f => format!("{} fine^{f}", self.coarse_key),
        }
    }

    /// Synthetic capability covering the fine channel's whole byte.
    pub fn fine_adjustment_capability(&self) -> Capability {
        let mut capability = Capability::implicit(CapabilityKind::Generic, Resolution::EIGHT_BIT);
        capability.comment = Some(format!("Fine adjustment for {}", self.coarse_key));
        capability
    }
}

/// Signals that a trigger value lies outside every declared switch range.
///
/// Validation should prevent this state; resolution reports it to the caller
/// instead of panicking, and the caller falls back to the default target.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("trigger value {value} lies outside every switch range of '{key}'")]
pub struct AmbiguousSwitch {
    pub key: Key,
    pub value: u32,
}

/// A named alias that resolves to one of several target channels depending
/// on the current value of a trigger channel.
///
/// Not an independent DMX slot: it occupies the slot of whichever target is
/// currently selected.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchingChannel {
    pub key: Key,
    /// The channel whose current value governs which target is active.
    pub trigger_key: Key,
    /// Trigger value ranges (at the trigger's declared value resolution) to
    /// the target channel active in that range, in ascending range order.
    pub ranges: Vec<(DmxRange, Key)>,
    /// The target active at the trigger channel's default value.
    pub default_target: Key,
}

impl SwitchingChannel {
    /// The target channel active while the trigger channel holds
    /// `trigger_value` (at the trigger's declared value resolution).
    pub fn target_at(&self, trigger_value: u32) -> Result<&Key, AmbiguousSwitch> {
        self.ranges
            .iter()
            .find(|(range, _)| range.contains(trigger_value))
            .map(|(_, target)| target)
            .ok_or_else(|| AmbiguousSwitch {
                key: self.key.clone(),
                value: trigger_value,
            })
    }

    /// All distinct channels this alias can switch to, in range order.
    pub fn switch_to_channel_keys(&self) -> Vec<&Key> {
        let mut keys: Vec<&Key> = vec![];
        for (_, target) in &self.ranges {
            if !keys.contains(&target) {
                keys.push(target);
            }
        }
        keys
    }
}

/// Placeholder for a DMX slot a mode declares as present but unused.
#[derive(Debug, Clone, PartialEq)]
pub struct NullChannel {
    pub key: Key,
}

/// Index of a channel in its fixture's channel stores. Stable for the
/// lifetime of the fixture; key equality follows from id equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
    Coarse(usize),
    Fine(usize),
    Switching(usize),
    Null(usize),
}

/// Borrowed view of a resolved channel. The closed set of channel kinds;
/// consumers match exhaustively instead of probing types at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelRef<'a> {
    Coarse(&'a CoarseChannel),
    Fine(&'a FineChannel),
    Switching(&'a SwitchingChannel),
    Null(&'a NullChannel),
}

impl<'a> ChannelRef<'a> {
    pub fn key(&self) -> &'a Key {
        match self {
            ChannelRef::Coarse(channel) => &channel.key,
            ChannelRef::Fine(channel) => &channel.key,
            ChannelRef::Switching(channel) => &channel.key,
            ChannelRef::Null(channel) => &channel.key,
        }
    }

    pub fn as_coarse(&self) -> Option<&'a CoarseChannel> {
        match self {
            ChannelRef::Coarse(channel) => Some(channel),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::super::capability::MenuClick;
    use super::super::key::IntoValidKey;
    use super::*;

    fn strobe_channel() -> CoarseChannel {
        CoarseChannel {
            key: "Strobe".into_valid(),
            name: "Strobe".into(),
            resolution: Resolution::EIGHT_BIT,
            value_resolution: Resolution::EIGHT_BIT,
            fine_channel_aliases: vec![],
            default_value: 0,
            highlight_value: None,
            precedence: Precedence::LTP,
            capabilities: vec![
                Capability {
                    dmx_range: DmxRange::new(0, 127),
                    kind: CapabilityKind::NoFunction,
                    comment: None,
                    menu_click: MenuClick::default(),
                    switch_channels: BTreeMap::from([(
                        "Speed".into_valid(),
                        "Rotation Speed".into_valid(),
                    )]),
                },
                Capability {
                    dmx_range: DmxRange::new(128, 255),
                    kind: CapabilityKind::Intensity,
                    comment: None,
                    menu_click: MenuClick::default(),
                    switch_channels: BTreeMap::from([(
                        "Speed".into_valid(),
                        "Strobe Speed".into_valid(),
                    )]),
                },
            ],
        }
    }

    #[test]
    fn capability_lookup_by_value() {
        let channel = strobe_channel();
        assert!(matches!(
            channel.capability_at(127, Resolution::EIGHT_BIT),
            Some(Capability {
                kind: CapabilityKind::NoFunction,
                ..
            })
        ));
        assert!(matches!(
            channel.capability_at(128, Resolution::EIGHT_BIT),
            Some(Capability {
                kind: CapabilityKind::Intensity,
                ..
            })
        ));
        // lookup at a different resolution than the declared one
        assert!(matches!(
            channel.capability_at(32639, Resolution::SIXTEEN_BIT),
            Some(Capability {
                kind: CapabilityKind::NoFunction,
                ..
            })
        ));
        assert!(matches!(
            channel.capability_at(32895, Resolution::SIXTEEN_BIT),
            Some(Capability {
                kind: CapabilityKind::Intensity,
                ..
            })
        ));
        // up-scaled ranges are not gapless between capabilities
        assert_eq!(channel.capability_at(32700, Resolution::SIXTEEN_BIT), None);
    }

    #[test]
    fn capability_lookup_is_total_over_gapless_ranges() {
        let channel = strobe_channel();
        for value in 0..=255 {
            assert!(
                channel.capability_at(value, Resolution::EIGHT_BIT).is_some(),
                "no capability for value {value}"
            );
        }
    }

    #[test]
    fn singleton_capability_shorthand() {
        let mut channel = strobe_channel();
        assert_eq!(channel.capability(), None);
        channel.capabilities.truncate(1);
        assert!(channel.capability().is_some());
    }

    #[test]
    fn switching_aliases_in_declaration_order() {
        let channel = strobe_channel();
        let aliases = channel.switching_channel_aliases();
        assert_eq!(aliases, ["Speed"]);
    }

    #[test]
    fn switching_target_lookup() {
        let switching = SwitchingChannel {
            key: "Speed".into_valid(),
            trigger_key: "Strobe".into_valid(),
            ranges: vec![
                (DmxRange::new(0, 127), "Rotation Speed".into_valid()),
                (DmxRange::new(128, 250), "Strobe Speed".into_valid()),
            ],
            default_target: "Rotation Speed".into_valid(),
        };
        assert_eq!(switching.target_at(0).unwrap(), "Rotation Speed");
        assert_eq!(switching.target_at(200).unwrap(), "Strobe Speed");
        assert_eq!(
            switching.target_at(255),
            Err(AmbiguousSwitch {
                key: "Speed".into_valid(),
                value: 255
            })
        );
        assert_eq!(
            switching.switch_to_channel_keys(),
            ["Rotation Speed", "Strobe Speed"]
        );
    }

    #[test]
    fn fine_channel_names_and_synthetic_capability() {
        let fine = FineChannel {
            key: "Pan fine".into_valid(),
            coarse_key: "Pan".into_valid(),
            fineness: 1,
        };
        assert_eq!(fine.name(), "Pan fine");
        let capability = fine.fine_adjustment_capability();
        assert_eq!(capability.dmx_range, DmxRange::new(0, 255));
        assert_eq!(capability.comment.as_deref(), Some("Fine adjustment for Pan"));
    }
}
