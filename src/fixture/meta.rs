use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Authorship and provenance metadata of a fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub authors: Vec<String>,
    pub create_date: NaiveDate,
    pub last_modify_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_plugin: Option<ImportPlugin>,
}

/// Set when the fixture was converted from a foreign format instead of being
/// authored by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPlugin {
    pub plugin: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}
