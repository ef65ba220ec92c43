//! Resolves the raw channel key lists of modes against a fixture's channel
//! taxonomy into concrete, ordered channel assignments.

use crate::fixture::channel::{ChannelId, NullChannel};
use crate::fixture::key::IntoValidKey;
use crate::fixture::mode::Mode;
use crate::problems::{Problem, Problems};

use super::channels::{valid_key, ChannelSet};
use super::raw::ModeDocument;

pub(crate) fn resolve_modes(
    docs: &[ModeDocument],
    set: &ChannelSet,
    null: &mut Vec<NullChannel>,
    problems: &mut Problems,
) -> Vec<Mode> {
    let mut modes = vec![];
    let mut null_counter = 0usize;

    for (mode_index, doc) in docs.iter().enumerate() {
        let mut channels = vec![];
        for (slot_index, slot) in doc.channels.iter().enumerate() {
            let path = format!("modes/{mode_index}/channels/{slot_index}");
            let id = match slot {
                None => add_null_channel(null, &mut null_counter),
                Some(key_str) => {
                    let key = valid_key(key_str, &path, problems);
                    match set.by_key.get(&key) {
                        Some(id) => *id,
                        None => {
                            Problem::UnresolvedChannelReference {
                                key,
                                mode: doc.name.clone(),
                            }
                            .at(&path)
                            .handled_by("occupying slot with a null channel", problems);
                            add_null_channel(null, &mut null_counter)
                        }
                    }
                }
            };
            channels.push(id);
        }

        modes.push(Mode {
            name: doc.name.clone(),
            short_name: doc.short_name.clone(),
            channels,
            physical_override: doc.physical.clone(),
        });
    }

    modes
}

fn add_null_channel(null: &mut Vec<NullChannel>, counter: &mut usize) -> ChannelId {
    *counter += 1;
    null.push(NullChannel {
        key: format!("Unused {counter}").into_valid(),
    });
    ChannelId::Null(null.len() - 1)
}
