use serde::{Deserialize, Serialize};

use super::key::Key;

/// One manufacturer from the manufacturers document. Shared by all of its
/// fixtures via `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manufacturer {
    #[serde(skip)]
    pub key: Key,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// ESTA RDM manufacturer id, unique across the whole corpus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdm_id: Option<u16>,
}
