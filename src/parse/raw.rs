//! Serde document structs for the flat JSON contracts.
//!
//! Channel and capability entries deliberately stay as [`serde_json::Value`]
//! inside order-preserving maps: one malformed channel then degrades to a
//! recorded problem instead of failing the whole fixture document.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::fixture::capability::{CapabilityKind, DmxRange, MenuClick};
use crate::fixture::channel::Precedence;
use crate::fixture::manufacturer::Manufacturer;
use crate::fixture::meta::Meta;
use crate::fixture::physical::Physical;
use crate::fixture::Rdm;
use crate::register::RedirectReason;

/// Top-level fixture document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureDocument {
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub meta: Meta,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub rdm: Option<Rdm>,
    #[serde(default)]
    pub physical: Option<Physical>,
    #[serde(default)]
    pub matrix: Option<MatrixDocument>,
    /// Channel key to channel document, in declaration order.
    #[serde(default)]
    pub available_channels: Map<String, Value>,
    /// Like `available_channels`, but keys and string values may contain the
    /// `$pixelKey` variable and are instantiated per matrix pixel.
    #[serde(default)]
    pub template_channels: Map<String, Value>,
    #[serde(default)]
    pub modes: Vec<ModeDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixDocument {
    #[serde(default)]
    pub pixel_count: Option<[u32; 3]>,
    /// Z planes of Y rows of X cells; `null` cells are holes.
    #[serde(default)]
    pub pixel_keys: Option<Vec<Vec<Vec<Option<String>>>>>,
    #[serde(default)]
    pub pixel_groups: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeDocument {
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub physical: Option<Physical>,
    /// Channel keys in DMX order; `null` marks an unused slot.
    pub channels: Vec<Option<String>>,
}

/// One entry of `availableChannels`/`templateChannels`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelDocument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fine_channel_aliases: Vec<String>,
    /// `"8bit"`, `"16bit"`, `"24bit"` or `"32bit"`. Defaults to the
    /// resolution implied by the fine channel alias count.
    #[serde(default)]
    pub dmx_value_resolution: Option<String>,
    #[serde(default)]
    pub default_value: Option<u32>,
    #[serde(default)]
    pub highlight_value: Option<u32>,
    #[serde(default)]
    pub precedence: Option<Precedence>,
    /// Single-capability shorthand, implicitly covering the full range.
    #[serde(default)]
    pub capability: Option<Value>,
    /// Explicit capability list, each entry carrying its own `dmxRange`.
    #[serde(default)]
    pub capabilities: Option<Vec<Value>>,
}

/// One entry of a `capabilities` list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityDocument {
    pub dmx_range: DmxRange,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub menu_click: Option<MenuClick>,
    #[serde(default)]
    pub switch_channels: BTreeMap<String, String>,
    #[serde(flatten)]
    pub kind: CapabilityKind,
}

/// The single-capability shorthand: same as [`CapabilityDocument`] but
/// without a `dmxRange`, it always spans the channel's whole domain.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplicitCapabilityDocument {
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub menu_click: Option<MenuClick>,
    #[serde(default)]
    pub switch_channels: BTreeMap<String, String>,
    #[serde(flatten)]
    pub kind: CapabilityKind,
}

/// The manufacturers document: manufacturer key to record.
pub type ManufacturersDocument = BTreeMap<String, Manufacturer>;

/// A fixture file that only points at another fixture.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectDocument {
    /// `manufacturerKey/fixtureKey` of the target.
    pub redirect_to: String,
    pub reason: RedirectReason,
}
