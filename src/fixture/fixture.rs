use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::channel::{ChannelId, ChannelRef, CoarseChannel, FineChannel, NullChannel, SwitchingChannel};
use super::key::Key;
use super::manufacturer::Manufacturer;
use super::matrix::Matrix;
use super::meta::Meta;
use super::mode::Mode;
use super::physical::Physical;

/// Category tag of a fixture. The first category of a fixture is its main
/// category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
pub enum Category {
    Blinder,
    #[serde(rename = "Color Changer")]
    #[strum(serialize = "Color Changer")]
    ColorChanger,
    Dimmer,
    Effect,
    Fan,
    Flower,
    Hazer,
    Laser,
    Matrix,
    #[serde(rename = "Moving Head")]
    #[strum(serialize = "Moving Head")]
    MovingHead,
    #[serde(rename = "Pixel Bar")]
    #[strum(serialize = "Pixel Bar")]
    PixelBar,
    Scanner,
    Smoke,
    Stand,
    Strobe,
    Other,
}

/// RDM device data of a fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rdm {
    /// Unique within the manufacturer.
    pub model_id: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub software_version: Option<String>,
}

/// A fixture definition with all derived channel views built eagerly at
/// assembly time. Immutable afterwards, safe to share across threads.
#[derive(Debug)]
pub struct Fixture {
    pub key: Key,
    pub name: String,
    pub short_name: Option<String>,
    pub manufacturer: Arc<Manufacturer>,
    pub categories: Vec<Category>,
    pub meta: Meta,
    pub comment: Option<String>,
    pub rdm: Option<Rdm>,
    pub physical: Option<Physical>,
    pub matrix: Option<Matrix>,

    pub(crate) coarse: Vec<CoarseChannel>,
    pub(crate) fine: Vec<FineChannel>,
    pub(crate) switching: Vec<SwitchingChannel>,
    pub(crate) null: Vec<NullChannel>,
    /// All channels in stable order: each coarse channel in declaration
    /// order, directly followed by its fine aliases, then its switching
    /// aliases.
    pub(crate) channel_order: Vec<ChannelId>,
    pub(crate) by_key: HashMap<Key, ChannelId>,
    pub(crate) modes: Vec<Mode>,
}

impl Fixture {
    pub fn main_category(&self) -> Option<Category> {
        self.categories.first().copied()
    }

    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    pub fn mode(&self, name: &str) -> Option<&Mode> {
        self.modes
            .iter()
            .find(|mode| mode.name == name || mode.short_name() == name)
    }

    /// Resolves a channel id to the channel object. Ids handed out by this
    /// fixture always resolve.
    pub fn channel(&self, id: ChannelId) -> Option<ChannelRef<'_>> {
        match id {
            ChannelId::Coarse(i) => self.coarse.get(i).map(ChannelRef::Coarse),
            ChannelId::Fine(i) => self.fine.get(i).map(ChannelRef::Fine),
            ChannelId::Switching(i) => self.switching.get(i).map(ChannelRef::Switching),
            ChannelId::Null(i) => self.null.get(i).map(ChannelRef::Null),
        }
    }

    /// O(1) key lookup against the index built at assembly time. Returns the
    /// already-constructed channel, callers rely on key equality.
    pub fn channel_by_key(&self, key: &Key) -> Option<ChannelRef<'_>> {
        self.by_key.get(key).and_then(|id| self.channel(*id))
    }

    pub(crate) fn channel_id_by_key(&self, key: &Key) -> Option<ChannelId> {
        self.by_key.get(key).copied()
    }

    /// Every channel of the fixture: available channels, the fine channels
    /// they generate and their switching aliases, in stable declaration
    /// order. Null channels only exist per mode slot and are not part of
    /// this view.
    pub fn all_channels(&self) -> impl Iterator<Item = ChannelRef<'_>> {
        self.channel_order
            .iter()
            .filter_map(|id| self.channel(*id))
    }

    pub fn coarse_channels(&self) -> &[CoarseChannel] {
        &self.coarse
    }

    pub fn fine_channels(&self) -> &[FineChannel] {
        &self.fine
    }

    pub fn switching_channels(&self) -> &[SwitchingChannel] {
        &self.switching
    }

    /// The resolved channels of `mode` in DMX slot order.
    pub fn mode_channels<'a>(&'a self, mode: &'a Mode) -> impl Iterator<Item = ChannelRef<'a>> {
        mode.channels.iter().filter_map(|id| self.channel(*id))
    }

    /// Physical data of a mode: its override merged over the fixture-wide
    /// defaults.
    pub fn physical_for_mode(&self, mode: &Mode) -> Option<Physical> {
        match (&mode.physical_override, &self.physical) {
            (Some(over), Some(base)) => Some(over.merged_over(base)),
            (Some(over), None) => Some(over.clone()),
            (None, base) => base.clone(),
        }
    }

    /// Whether any mode uses the same channel in more than one slot.
    pub fn uses_repeated_channels(&self) -> bool {
        self.modes.iter().any(Mode::has_repeated_channels)
    }

    /// Coarse channels instantiated from matrix template channels, i.e.
    /// those whose key names a pixel or pixel group.
    pub fn matrix_channels(&self) -> Vec<&CoarseChannel> {
        let Some(matrix) = &self.matrix else {
            return vec![];
        };
        let template_keys = matrix.template_keys();
        self.coarse
            .iter()
            .filter(|channel| {
                template_keys
                    .iter()
                    .any(|pixel| channel.key.as_str().contains(pixel.as_str()))
            })
            .collect()
    }
}
