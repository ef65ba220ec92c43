use std::str::FromStr;

use derive_more::{DebugCustom, Display};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Key type for manufacturers, fixtures and channels.
///
/// A Key is a non-empty UTF-8 string with restricted characters. Disallowed
/// code points are:
/// - U+0000..=U+001F (<control>)
/// - U+002F (/), reserved as the manufacturer/fixture separator in the
///   register
/// - U+007F (<control>)
#[derive(
    PartialOrd,
    PartialEq,
    Eq,
    Ord,
    Clone,
    Hash,
    Display,
    DebugCustom,
    Default,
    Serialize,
    Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Key(String);

impl TryFrom<&str> for Key {
    type Error = KeyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut invalid_chars = String::new();

        let key = Self(
            value
                .chars()
                .map(|c| match c {
                    '/' | '\x00'..='\x1f' | '\x7f' => {
                        invalid_chars.push(c);
                        '□'
                    }
                    _ => c,
                })
                .collect::<String>(),
        );

        if invalid_chars.is_empty() {
            Ok(key)
        } else {
            Err(KeyError {
                fixed: key,
                invalid_chars,
            })
        }
    }
}

impl TryFrom<String> for Key {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.as_str().try_into()
    }
}

impl FromStr for Key {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.try_into()
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.0
    }
}

impl PartialEq<str> for Key {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Key {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

pub(crate) trait IntoValidKey {
    fn into_valid(self) -> Key;
}

impl IntoValidKey for &str {
    /// Creates a Key from self, with invalid chars replaced by '□'
    fn into_valid(self) -> Key {
        self.try_into().unwrap_or_else(|e: KeyError| e.fixed)
    }
}

impl IntoValidKey for String {
    fn into_valid(self) -> Key {
        self.as_str().into_valid()
    }
}

impl Key {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Replaces every occurrence of the `$pixelKey` template variable,
    /// used when instantiating template channels per matrix pixel.
    pub(crate) fn with_pixel_key(&self, pixel_key: &Key) -> Key {
        Key(self.0.replace("$pixelKey", pixel_key.as_str()))
    }

    pub(crate) fn is_template(&self) -> bool {
        self.0.contains("$pixelKey")
    }
}

#[derive(Error, Debug)]
#[error("invalid key due to chars '{invalid_chars}'; replaced with '□'")]
pub struct KeyError {
    /// Key where all invalid chars were replaced with '□'
    pub fixed: Key,
    pub invalid_chars: String,
}
