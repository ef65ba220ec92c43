use super::channel::ChannelId;
use super::physical::Physical;

/// One way to patch a fixture: an ordered list of resolved channel slots.
///
/// Slot index 0 is DMX channel 1 relative to the mode's start address. The
/// raw channel key list of the document is resolved into [`ChannelId`]s when
/// the fixture is assembled; resolving the same document twice yields the
/// same ids in the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct Mode {
    pub name: String,
    pub short_name: Option<String>,
    /// Resolved channel slots in DMX order. Duplicate ids are permitted, a
    /// channel may legitimately occupy several slots.
    pub channels: Vec<ChannelId>,
    /// Physical data overriding the fixture-wide defaults field by field.
    pub physical_override: Option<Physical>,
}

impl Mode {
    /// The short name, falling back to the name.
    pub fn short_name(&self) -> &str {
        self.short_name.as_deref().unwrap_or(&self.name)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub(crate) fn has_repeated_channels(&self) -> bool {
        self.channels
            .iter()
            .enumerate()
            .any(|(i, id)| self.channels.get(..i).is_some_and(|head| head.contains(id)))
    }
}
