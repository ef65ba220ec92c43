//! Post-assembly semantic checks for a single fixture.
//!
//! Structural and channel-level problems are already collected while the
//! fixture is assembled; this pass adds the checks that need the finished
//! aggregate: metadata consistency, physical data sanity, unused channels
//! and ambiguous color metadata.

use std::collections::HashSet;

use crate::fixture::capability::CapabilityKind;
use crate::fixture::channel::ChannelId;
use crate::fixture::fixture::Fixture;
use crate::parse::ParsedFixture;
use crate::problems::{Problem, Problems};

/// A fixture that went through all semantic checks, with every recorded
/// problem of both the assembly and the validation pass.
#[derive(Debug)]
pub struct ValidatedFixture {
    pub fixture: Fixture,
    pub problems: Problems,
}

impl ValidatedFixture {
    pub fn has_errors(&self) -> bool {
        self.problems
            .iter()
            .any(|p| p.severity() == crate::problems::Severity::Error)
    }
}

pub fn validate(parsed: ParsedFixture) -> ValidatedFixture {
    let ParsedFixture {
        fixture,
        mut problems,
    } = parsed;

    check_meta(&fixture, &mut problems);
    check_physical(&fixture, &mut problems);
    check_unused_channels(&fixture, &mut problems);
    check_color_metadata(&fixture, &mut problems);

    ValidatedFixture { fixture, problems }
}

fn check_meta(fixture: &Fixture, problems: &mut Problems) {
    if fixture.meta.last_modify_date < fixture.meta.create_date {
        Problem::LastModifyBeforeCreate {
            create: fixture.meta.create_date,
            last_modify: fixture.meta.last_modify_date,
        }
        .at("meta")
        .handled_by("keeping both dates", problems);
    }
}

fn check_physical(fixture: &Fixture, problems: &mut Problems) {
    let lenses = fixture
        .physical
        .iter()
        .chain(fixture.modes().iter().filter_map(|m| m.physical_override.as_ref()))
        .filter_map(|physical| physical.lens.as_ref());
    for lens in lenses {
        if let Some([min, max]) = lens.degrees_min_max {
            if min > max || min < 0.0 {
                Problem::InvalidLensDegrees { min, max }
                    .at("physical/lens/degreesMinMax")
                    .handled_by("keeping the declared range", problems);
            }
        }
    }
}

/// A channel is used if any mode occupies a slot with it, or if a switching
/// channel used in a mode can switch to it.
fn check_unused_channels(fixture: &Fixture, problems: &mut Problems) {
    let mut used: HashSet<ChannelId> = fixture
        .modes()
        .iter()
        .flat_map(|mode| mode.channels.iter().copied())
        .collect();

    for id in used.clone() {
        if let ChannelId::Switching(i) = id {
            if let Some(switching) = fixture.switching_channels().get(i) {
                for target in switching.switch_to_channel_keys() {
                    if let Some(target_id) = fixture.channel_id_by_key(target) {
                        used.insert(target_id);
                    }
                }
                if let Some(trigger_id) = fixture.channel_id_by_key(&switching.trigger_key) {
                    used.insert(trigger_id);
                }
            }
        }
    }

    for id in &fixture.channel_order {
        if used.contains(id) {
            continue;
        }
        if let Some(channel) = fixture.channel(*id) {
            Problem::UnusedChannel(channel.key().clone())
                .at(format!("availableChannels/{}", channel.key()))
                .handled_by("keeping the unused channel", problems);
        }
    }
}

/// Color intensity channels mixing different colors across their
/// capabilities are ambiguous for consumers that group channels by color.
fn check_color_metadata(fixture: &Fixture, problems: &mut Problems) {
    for channel in fixture.coarse_channels() {
        let mut colors = channel.capabilities.iter().filter_map(|capability| {
            match &capability.kind {
                CapabilityKind::ColorIntensity { color } => Some(*color),
                _ => None,
            }
        });
        let Some(first) = colors.next() else {
            continue;
        };
        if let Some(second) = colors.find(|color| *color != first) {
            Problem::AmbiguousColorMetadata {
                channel: channel.key.clone(),
                first: first.to_string(),
                second: second.to_string(),
            }
            .at(format!("availableChannels/{}", channel.key))
            .handled_by("keeping the declared colors", problems);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::fixture::key::IntoValidKey;
    use crate::fixture::manufacturer::Manufacturer;
    use crate::parse::{assemble_fixture, raw};
    use crate::problems::Severity;

    use super::*;

    fn manufacturer() -> Arc<Manufacturer> {
        Arc::new(Manufacturer {
            key: "acme".into_valid(),
            name: "Acme".into(),
            website: None,
            comment: None,
            rdm_id: None,
        })
    }

    fn parse(document: serde_json::Value) -> ParsedFixture {
        let doc: raw::FixtureDocument = serde_json::from_value(document).unwrap();
        assemble_fixture(manufacturer(), "test-fixture".into_valid(), doc)
    }

    #[test]
    fn last_modify_before_create_is_an_error() {
        let validated = validate(parse(serde_json::json!({
            "name": "Backwards",
            "meta": {
                "authors": [],
                "createDate": "2023-05-01",
                "lastModifyDate": "2022-01-01",
            },
        })));
        assert!(validated
            .problems
            .iter()
            .any(|p| matches!(p.problem(), Problem::LastModifyBeforeCreate { .. })));
        assert!(validated.has_errors());
    }

    #[test]
    fn unused_channel_is_a_warning() {
        let validated = validate(parse(serde_json::json!({
            "name": "Lonely Channel",
            "meta": {
                "authors": [],
                "createDate": "2022-01-01",
                "lastModifyDate": "2022-01-01",
            },
            "availableChannels": {
                "Dimmer": { "capability": { "type": "Intensity" } },
                "Strobe": { "capability": { "type": "NoFunction" } },
            },
            "modes": [{ "name": "1ch", "channels": ["Dimmer"] }],
        })));
        let unused: Vec<_> = validated
            .problems
            .iter()
            .filter(|p| matches!(p.problem(), Problem::UnusedChannel(..)))
            .collect();
        assert_eq!(unused.len(), 1);
        assert_eq!(unused[0].severity(), Severity::Warning);
        assert!(!validated.has_errors());
    }

    #[test]
    fn switched_to_channels_count_as_used() {
        let validated = validate(parse(serde_json::json!({
            "name": "Switcher",
            "meta": {
                "authors": [],
                "createDate": "2022-01-01",
                "lastModifyDate": "2022-01-01",
            },
            "availableChannels": {
                "Control": {
                    "capabilities": [
                        {
                            "type": "NoFunction",
                            "dmxRange": [0, 127],
                            "switchChannels": { "Speed": "Slow Speed" },
                        },
                        {
                            "type": "NoFunction",
                            "dmxRange": [128, 255],
                            "switchChannels": { "Speed": "Fast Speed" },
                        },
                    ],
                },
                "Slow Speed": { "capability": { "type": "Speed", "speedStart": 0.0, "speedEnd": 0.5 } },
                "Fast Speed": { "capability": { "type": "Speed", "speedStart": 0.5, "speedEnd": 1.0 } },
            },
            "modes": [{ "name": "2ch", "channels": ["Control", "Speed"] }],
        })));
        assert!(
            !validated
                .problems
                .iter()
                .any(|p| matches!(p.problem(), Problem::UnusedChannel(..))),
            "problems: {:?}",
            validated.problems
        );
    }

    #[test]
    fn mixed_color_intensities_warn() {
        let validated = validate(parse(serde_json::json!({
            "name": "Confused Color",
            "meta": {
                "authors": [],
                "createDate": "2022-01-01",
                "lastModifyDate": "2022-01-01",
            },
            "availableChannels": {
                "Red": {
                    "capabilities": [
                        { "type": "ColorIntensity", "color": "Red", "dmxRange": [0, 127] },
                        { "type": "ColorIntensity", "color": "Green", "dmxRange": [128, 255] },
                    ],
                },
            },
            "modes": [{ "name": "1ch", "channels": ["Red"] }],
        })));
        assert!(validated
            .problems
            .iter()
            .any(|p| matches!(p.problem(), Problem::AmbiguousColorMetadata { .. })));
    }
}
