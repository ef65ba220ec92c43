//! Builds the channel taxonomy of a fixture: coarse channels with validated
//! capabilities, the fine channels their aliases generate and the switching
//! channels their capabilities declare.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::dmx_value::Resolution;
use crate::fixture::capability::Capability;
use crate::fixture::channel::{ChannelId, CoarseChannel, FineChannel, SwitchingChannel};
use crate::fixture::key::{IntoValidKey, Key};
use crate::fixture::matrix::Matrix;
use crate::problems::{HandleProblem, Problem, Problems};

use super::raw::{CapabilityDocument, ChannelDocument, ImplicitCapabilityDocument};

/// All channels of one fixture plus the derived indices, ready to move into
/// the fixture aggregate.
#[derive(Debug, Default)]
pub(crate) struct ChannelSet {
    pub coarse: Vec<CoarseChannel>,
    pub fine: Vec<FineChannel>,
    pub switching: Vec<SwitchingChannel>,
    pub by_key: HashMap<Key, ChannelId>,
    pub channel_order: Vec<ChannelId>,
}

/// Converts a raw key, recording invalid characters as a problem and
/// continuing with the fixed key.
pub(crate) fn valid_key(s: &str, path: &str, problems: &mut Problems) -> Key {
    match Key::try_from(s) {
        Ok(key) => key,
        Err(e) => {
            let fixed = e.fixed.clone();
            Problem::InvalidKey(s.to_owned(), e.invalid_chars)
                .at(path)
                .handled_by("replacing invalid chars with '□'", problems);
            fixed
        }
    }
}

pub(crate) fn build_channels(
    available: &Map<String, Value>,
    template: &Map<String, Value>,
    matrix: Option<&Matrix>,
    problems: &mut Problems,
) -> ChannelSet {
    let mut set = ChannelSet::default();

    for (key_str, value) in available {
        let path = format!("availableChannels/{key_str}");
        add_channel_entry(&mut set, key_str, value.clone(), &path, problems);
    }

    match matrix {
        Some(matrix) => {
            for (template_key, template_value) in template {
                let path = format!("templateChannels/{template_key}");
                if !template_key.contains("$pixelKey") {
                    Problem::TemplateChannelWithoutPixelKey(template_key.as_str().into_valid())
                        .at(&path)
                        .handled_by("instantiating it once per pixel anyway", problems);
                }
                for pixel in matrix.template_keys() {
                    let key_str = template_key.replace("$pixelKey", pixel.as_str());
                    let value = render_template_value(template_value, pixel);
                    add_channel_entry(&mut set, &key_str, value, &path, problems);
                }
            }
        }
        None if !template.is_empty() => {
            Problem::TemplateChannelsWithoutMatrix
                .at("templateChannels")
                .handled_by("ignoring template channels", problems);
        }
        None => {}
    }

    build_switching_channels(&mut set, problems);
    set.channel_order = channel_order(&set);
    set
}

/// Replaces the `$pixelKey` variable in every string of the subtree,
/// including object keys.
fn render_template_value(value: &Value, pixel: &Key) -> Value {
    match value {
        Value::String(s) => Value::String(s.replace("$pixelKey", pixel.as_str())),
        Value::Array(entries) => Value::Array(
            entries
                .iter()
                .map(|entry| render_template_value(entry, pixel))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    (
                        k.replace("$pixelKey", pixel.as_str()),
                        render_template_value(v, pixel),
                    )
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

fn add_channel_entry(
    set: &mut ChannelSet,
    key_str: &str,
    value: Value,
    path: &str,
    problems: &mut Problems,
) {
    let key = valid_key(key_str, path, problems);
    if set.by_key.contains_key(&key) {
        Problem::DuplicateChannelKey(key)
            .at(path)
            .handled_by("ignoring duplicate definition", problems);
        return;
    }

    let doc: ChannelDocument = match serde_json::from_value(value) {
        Ok(doc) => doc,
        Err(source) => {
            Problem::InvalidDocumentPart {
                what: format!("channel '{key}'"),
                source,
            }
            .at(path)
            .handled_by("omitting channel", problems);
            return;
        }
    };

    add_coarse_channel(set, key, doc, path, problems);
}

fn add_coarse_channel(
    set: &mut ChannelSet,
    key: Key,
    doc: ChannelDocument,
    path: &str,
    problems: &mut Problems,
) {
    let mut aliases: Vec<Key> = doc
        .fine_channel_aliases
        .iter()
        .map(|alias| valid_key(alias, path, problems))
        .collect();
    if aliases.len() > 3 {
        Problem::UnsupportedByteCount(key.clone())
            .at(path)
            .handled_by("using only 4 most significant bytes", problems);
        aliases.truncate(3);
    }
    let resolution =
        Resolution::try_from(aliases.len() as u8 + 1).unwrap_or(Resolution::THIRTY_TWO_BIT);

    let value_resolution = doc
        .dmx_value_resolution
        .as_deref()
        .and_then(|s| {
            s.parse::<Resolution>()
                .map_err(|source| {
                    Problem::InvalidResolution {
                        channel: key.clone(),
                        source,
                    }
                    .at(path)
                })
                .ok_or_handled_by("using the resolution implied by the aliases", problems)
        })
        .unwrap_or(resolution);

    let capabilities = build_capabilities(&key, &doc, value_resolution, path, problems);
    let capabilities = validate_ranges(&key, capabilities, value_resolution, path, problems);

    let max = value_resolution.max_value();
    let default_value = doc.default_value.unwrap_or(0);
    let default_value = if default_value > max {
        Problem::ValueOutOfRange {
            channel: key.clone(),
            value: default_value,
            max,
        }
        .at(path)
        .handled_by("using default 0", problems);
        0
    } else {
        default_value
    };
    let highlight_value = doc.highlight_value.and_then(|value| {
        if value > max {
            Problem::ValueOutOfRange {
                channel: key.clone(),
                value,
                max,
            }
            .at(path)
            .handled_by("ignoring highlight value", problems);
            None
        } else {
            Some(value)
        }
    });

    let channel = CoarseChannel {
        name: doc.name.unwrap_or_else(|| key.to_string()),
        key: key.clone(),
        resolution,
        value_resolution,
        fine_channel_aliases: aliases.clone(),
        default_value,
        highlight_value,
        precedence: doc.precedence.unwrap_or_default(),
        capabilities,
    };

    set.coarse.push(channel);
    set.by_key.insert(key.clone(), ChannelId::Coarse(set.coarse.len() - 1));

    for (i, alias) in aliases.into_iter().enumerate() {
        if set.by_key.contains_key(&alias) {
            Problem::DuplicateChannelKey(alias)
                .at(path)
                .handled_by("ignoring duplicate fine channel alias", problems);
            continue;
        }
        set.fine.push(FineChannel {
            key: alias.clone(),
            coarse_key: key.clone(),
            fineness: i as u8 + 1,
        });
        set.by_key.insert(alias, ChannelId::Fine(set.fine.len() - 1));
    }
}

fn build_capabilities(
    key: &Key,
    doc: &ChannelDocument,
    value_resolution: Resolution,
    path: &str,
    problems: &mut Problems,
) -> Vec<Capability> {
    use crate::fixture::capability::CapabilityKind;

    if doc.capability.is_some() && doc.capabilities.is_some() {
        Problem::ConflictingCapabilityShorthand(key.clone())
            .at(path)
            .handled_by("using the explicit capabilities list", problems);
    }

    let mut capabilities = vec![];
    match (&doc.capabilities, &doc.capability) {
        (Some(list), _) => {
            for (i, value) in list.iter().enumerate() {
                let capability_path = format!("{path}/capabilities/{i}");
                match serde_json::from_value::<CapabilityDocument>(value.clone()) {
                    Ok(capability) => {
                        capabilities.push(into_capability(capability, &capability_path, problems))
                    }
                    Err(source) => Problem::InvalidDocumentPart {
                        what: format!("capability {i} of channel '{key}'"),
                        source,
                    }
                    .at(&capability_path)
                    .handled_by("omitting capability", problems),
                }
            }
        }
        (None, Some(value)) => {
            let capability_path = format!("{path}/capability");
            match serde_json::from_value::<ImplicitCapabilityDocument>(value.clone()) {
                Ok(capability) => capabilities.push(into_implicit_capability(
                    capability,
                    value_resolution,
                    &capability_path,
                    problems,
                )),
                Err(source) => Problem::InvalidDocumentPart {
                    what: format!("capability of channel '{key}'"),
                    source,
                }
                .at(&capability_path)
                .handled_by("falling back to a 0-100% intensity", problems),
            }
        }
        (None, None) => {}
    }

    if capabilities.is_empty() {
        // uniform lookup contract: every channel has at least one capability
        capabilities.push(Capability::implicit(
            CapabilityKind::Intensity,
            value_resolution,
        ));
    }
    capabilities
}

fn into_capability(doc: CapabilityDocument, path: &str, problems: &mut Problems) -> Capability {
    Capability {
        dmx_range: doc.dmx_range,
        kind: doc.kind,
        comment: doc.comment,
        menu_click: doc.menu_click.unwrap_or_default(),
        switch_channels: doc
            .switch_channels
            .iter()
            .map(|(alias, target)| {
                (
                    valid_key(alias, path, problems),
                    valid_key(target, path, problems),
                )
            })
            .collect(),
    }
}

fn into_implicit_capability(
    doc: ImplicitCapabilityDocument,
    value_resolution: Resolution,
    path: &str,
    problems: &mut Problems,
) -> Capability {
    let mut capability = Capability::implicit(doc.kind, value_resolution);
    capability.comment = doc.comment;
    capability.menu_click = doc.menu_click.unwrap_or_default();
    capability.switch_channels = doc
        .switch_channels
        .iter()
        .map(|(alias, target)| {
            (
                valid_key(alias, path, problems),
                valid_key(target, path, problems),
            )
        })
        .collect();
    capability
}

/// Enforces the range invariant `start_i <= end_i < start_{i+1}` at the
/// construction boundary: inverted or overlapping ranges are dropped as
/// errors, gaps are kept but recorded as warnings.
fn validate_ranges(
    key: &Key,
    capabilities: Vec<Capability>,
    value_resolution: Resolution,
    path: &str,
    problems: &mut Problems,
) -> Vec<Capability> {
    let max = value_resolution.max_value();
    let mut kept: Vec<Capability> = vec![];
    let mut last_end: Option<u32> = None;

    for capability in capabilities {
        let range = capability.dmx_range;
        if range.start > range.end {
            Problem::InvertedCapabilityRange {
                channel: key.clone(),
                start: range.start,
                end: range.end,
            }
            .at(path)
            .handled_by("omitting capability", problems);
            continue;
        }
        if range.end > max {
            Problem::ValueOutOfRange {
                channel: key.clone(),
                value: range.end,
                max,
            }
            .at(path)
            .handled_by("omitting capability", problems);
            continue;
        }
        match last_end {
            Some(previous_end) if range.start <= previous_end => {
                Problem::OverlappingCapabilityRanges {
                    channel: key.clone(),
                    start: range.start,
                    end: range.end,
                    previous_end,
                }
                .at(path)
                .handled_by("omitting capability", problems);
                continue;
            }
            Some(previous_end) if range.start > previous_end + 1 => {
                Problem::CapabilityRangeGap {
                    channel: key.clone(),
                    gap_start: previous_end + 1,
                    gap_end: range.start - 1,
                }
                .at(path)
                .handled_by("accepting gap", problems);
            }
            None if range.start > 0 => {
                Problem::CapabilityRangeGap {
                    channel: key.clone(),
                    gap_start: 0,
                    gap_end: range.start - 1,
                }
                .at(path)
                .handled_by("accepting gap", problems);
            }
            _ => {}
        }
        last_end = Some(range.end);
        kept.push(capability);
    }

    if let Some(end) = last_end {
        if end < max {
            Problem::CapabilityRangeGap {
                channel: key.clone(),
                gap_start: end + 1,
                gap_end: max,
            }
            .at(path)
            .handled_by("accepting gap", problems);
        }
    }

    kept
}

fn build_switching_channels(set: &mut ChannelSet, problems: &mut Problems) {
    let mut candidates: Vec<SwitchingChannel> = vec![];

    for trigger in &set.coarse {
        let path = format!("availableChannels/{}/capabilities", trigger.key);
        for alias in trigger.switching_channel_aliases() {
            let mut ranges = vec![];
            for capability in &trigger.capabilities {
                match capability.switch_channels.get(alias) {
                    Some(target) => ranges.push((capability.dmx_range, target.clone())),
                    None => Problem::MissingSwitchTarget {
                        key: alias.clone(),
                        trigger: trigger.key.clone(),
                        start: capability.dmx_range.start,
                        end: capability.dmx_range.end,
                    }
                    .at(&path)
                    .handled_by("leaving range unswitched", problems),
                }
            }
            let Some((_, first_target)) = ranges.first() else {
                continue;
            };

            let mut switching = SwitchingChannel {
                key: alias.clone(),
                trigger_key: trigger.key.clone(),
                default_target: first_target.clone(),
                ranges,
            };
            match switching.target_at(trigger.default_value) {
                Ok(target) => switching.default_target = target.clone(),
                Err(ambiguous) => {
                    Problem::AmbiguousSwitchDefault {
                        key: ambiguous.key,
                        trigger: trigger.key.clone(),
                        value: ambiguous.value,
                    }
                    .at(&path)
                    .handled_by("using the first switch target as default", problems);
                }
            }
            candidates.push(switching);
        }
    }

    for switching in candidates {
        let path = format!("availableChannels/{}/capabilities", switching.trigger_key);
        if set.by_key.contains_key(&switching.key) {
            Problem::DuplicateChannelKey(switching.key)
                .at(&path)
                .handled_by("ignoring duplicate switching channel alias", problems);
            continue;
        }
        set.by_key
            .insert(switching.key.clone(), ChannelId::Switching(set.switching.len()));
        set.switching.push(switching);
    }

    // switch targets must resolve to a channel of this fixture
    for switching in &set.switching {
        let path = format!("availableChannels/{}/capabilities", switching.trigger_key);
        for target in switching.switch_to_channel_keys() {
            if !set.by_key.contains_key(target) {
                Problem::SwitchToUnknownChannel {
                    key: switching.key.clone(),
                    target: target.clone(),
                }
                .at(&path)
                .handled_by("leaving reference unresolved", problems);
            }
        }
    }
}

/// Stable view order: each coarse channel in declaration order, directly
/// followed by its fine aliases, then the switching aliases it triggers.
fn channel_order(set: &ChannelSet) -> Vec<ChannelId> {
    let mut order = vec![];
    for (i, channel) in set.coarse.iter().enumerate() {
        order.push(ChannelId::Coarse(i));
        for alias in &channel.fine_channel_aliases {
            if let Some(id) = set.by_key.get(alias) {
                if matches!(id, ChannelId::Fine(_)) {
                    order.push(*id);
                }
            }
        }
        for alias in channel.switching_channel_aliases() {
            if let Some(ChannelId::Switching(si)) = set.by_key.get(alias) {
                let triggered_here = set
                    .switching
                    .get(*si)
                    .is_some_and(|s| s.trigger_key == channel.key);
                if triggered_here {
                    order.push(ChannelId::Switching(*si));
                }
            }
        }
    }
    order
}
