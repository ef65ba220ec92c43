//! The problems system is the core error handling mechanism of the fixture
//! model. A fixture document with semantic defects still yields a usable
//! model; every defect is recorded as a [`HandledProblem`] carrying the JSON
//! location it occurred at and the recovery action that was taken.

use std::fmt;

use crate::fixture::key::Key;
use thiserror::Error;

pub type Problems = Vec<HandledProblem>;

/// A recoverable problem in a fixture document, with location information and
/// info on the action taken to recover from it.
#[derive(Error, Debug)]
#[error("{p}; {action}")]
pub struct HandledProblem {
    p: ProblemAt,
    pub action: String,
}

/// A recoverable problem in a fixture document, with location information.
#[derive(Error, Debug)]
#[error("{p} (at {at})")]
pub struct ProblemAt {
    p: Problem,
    at: String,
}

/// How severe a [`Problem`] is.
///
/// `Error` problems make a fixture logically inconsistent, `Warning` problems
/// are quality issues that do not invalidate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A recoverable kind of problem in a fixture document.
#[derive(Error, Debug)]
pub enum Problem {
    #[error("could not parse {what}: {source}")]
    InvalidDocumentPart {
        what: String,
        source: serde_json::Error,
    },
    #[error("invalid key '{0}' due to chars '{1}'")]
    InvalidKey(String, String),
    #[error("channel '{0}' uses more than 4 bytes")]
    UnsupportedByteCount(Key),
    #[error("invalid dmxValueResolution of channel '{channel}': {source}")]
    InvalidResolution {
        channel: Key,
        source: crate::dmx_value::ResolutionError,
    },
    #[error("channel '{0}' declares both the capability shorthand and a capabilities list")]
    ConflictingCapabilityShorthand(Key),
    #[error("template channels declared but the fixture has no matrix")]
    TemplateChannelsWithoutMatrix,
    #[error("template channel '{0}' does not contain the $pixelKey variable")]
    TemplateChannelWithoutPixelKey(Key),
    #[error("matrix declares both pixelCount and pixelKeys")]
    ConflictingMatrixDefinition,
    #[error("matrix declares neither pixelCount nor pixelKeys")]
    MissingMatrixPixels,
    #[error("value {value} exceeds maximum {max} of channel '{channel}'")]
    ValueOutOfRange { channel: Key, value: u32, max: u32 },
    #[error("capability range [{start}, {end}] of channel '{channel}' is inverted")]
    InvertedCapabilityRange { channel: Key, start: u32, end: u32 },
    #[error(
        "capability range [{start}, {end}] of channel '{channel}' overlaps its predecessor \
        ending at {previous_end}"
    )]
    OverlappingCapabilityRanges {
        channel: Key,
        start: u32,
        end: u32,
        previous_end: u32,
    },
    #[error(
        "capability ranges of channel '{channel}' leave a gap between {gap_start} and {gap_end}"
    )]
    CapabilityRangeGap {
        channel: Key,
        gap_start: u32,
        gap_end: u32,
    },
    #[error("duplicate channel key '{0}'")]
    DuplicateChannelKey(Key),
    #[error("channel '{key}' referenced in mode '{mode}' does not exist")]
    UnresolvedChannelReference { key: Key, mode: String },
    #[error("switching channel '{key}' switches to unknown channel '{target}'")]
    SwitchToUnknownChannel { key: Key, target: Key },
    #[error(
        "default value {value} of trigger channel '{trigger}' lies outside every switch range \
        of switching channel '{key}'"
    )]
    AmbiguousSwitchDefault { key: Key, trigger: Key, value: u32 },
    #[error(
        "capability [{start}, {end}] of channel '{trigger}' does not declare a target for \
        switching channel '{key}'"
    )]
    MissingSwitchTarget {
        key: Key,
        trigger: Key,
        start: u32,
        end: u32,
    },
    #[error("unknown category '{0}'")]
    UnknownCategory(String),
    #[error("unknown pixel key '{key}' referenced in {referenced_in}")]
    UnknownPixelKey { key: Key, referenced_in: String },
    #[error("lastModifyDate {last_modify} is before createDate {create}")]
    LastModifyBeforeCreate {
        create: chrono::NaiveDate,
        last_modify: chrono::NaiveDate,
    },
    #[error("lens degree range [{min}, {max}] is invalid")]
    InvalidLensDegrees { min: f64, max: f64 },
    #[error("duplicate fixture key '{fixture}' under manufacturer '{manufacturer}'")]
    DuplicateFixtureKey { manufacturer: Key, fixture: Key },
    #[error("duplicate fixture name '{name}' under manufacturer '{manufacturer}'")]
    DuplicateFixtureName { manufacturer: Key, name: String },
    #[error("duplicate RDM model id {model_id} under manufacturer '{manufacturer}'")]
    DuplicateRdmModelId { manufacturer: Key, model_id: u16 },
    #[error("duplicate manufacturer name '{0}'")]
    DuplicateManufacturerName(String),
    #[error("duplicate manufacturer RDM id {0}")]
    DuplicateManufacturerRdmId(u16),
    #[error("redirect '{key}' points to unknown fixture '{target}'")]
    RedirectToUnknownFixture { key: String, target: String },
    #[error("channel '{0}' is defined but never used in any mode")]
    UnusedChannel(Key),
    #[error("channel '{channel}' mixes color intensities {first} and {second}")]
    AmbiguousColorMetadata {
        channel: Key,
        first: String,
        second: String,
    },
}

impl Problem {
    /// Adds the JSON location the problem occurred at, e.g.
    /// `availableChannels/Pan/capabilities/2`.
    pub(crate) fn at(self, path: impl fmt::Display) -> ProblemAt {
        ProblemAt {
            p: self,
            at: path.to_string(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Problem::CapabilityRangeGap { .. }
            | Problem::UnusedChannel(..)
            | Problem::AmbiguousColorMetadata { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl ProblemAt {
    /// Specify what action was taken to resolve the problem and then push it
    /// onto the problems.
    pub fn handled_by<T: Into<String>>(self, action: T, problems: &mut Problems) {
        problems.push(HandledProblem {
            p: self,
            action: action.into(),
        });
    }
}

pub(crate) trait HandleProblem<T, S: Into<String>> {
    fn ok_or_handled_by(self, action: S, problems: &mut Problems) -> Option<T>;
}

impl<T, S: Into<String>> HandleProblem<T, S> for Result<T, ProblemAt> {
    /// Specify what action will be taken to resolve a possible Err(Problem),
    /// push it onto problems and return None. If the result is Ok(v), Some(v)
    /// is returned instead.
    fn ok_or_handled_by(self, action: S, problems: &mut Problems) -> Option<T> {
        match self {
            Ok(t) => Some(t),
            Err(p) => {
                p.handled_by(action, problems);
                None
            }
        }
    }
}

impl HandledProblem {
    pub fn problem(&self) -> &Problem {
        &self.p.p
    }

    pub fn severity(&self) -> Severity {
        self.p.p.severity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_of_problem_handling() {
        let mut problems = Problems::new();

        Problem::UnresolvedChannelReference {
            key: "Pan Speed".try_into().unwrap(),
            mode: "16ch".into(),
        }
        .at("modes/0/channels/3")
        .handled_by("occupying slot with a null channel", &mut problems);

        assert_eq!(problems.len(), 1);
        assert!(matches!(
            problems[0].problem(),
            Problem::UnresolvedChannelReference { .. }
        ));
        assert_eq!(problems[0].severity(), Severity::Error);
        assert_eq!(
            format!("{}", problems[0]),
            "channel 'Pan Speed' referenced in mode '16ch' does not exist \
            (at modes/0/channels/3); occupying slot with a null channel"
        );
    }

    #[test]
    fn warnings_are_not_errors() {
        let p = Problem::UnusedChannel("Strobe".try_into().unwrap());
        assert_eq!(p.severity(), Severity::Warning);
    }
}
