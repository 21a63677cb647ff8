use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ID_NUMBER: &str = "ID Number";
pub const DOB: &str = "DOB";
pub const NAME: &str = "Name";
pub const INFO: &str = "Info";

/// A first-class "no match" value, distinct from any real extraction.
pub const NOT_FOUND: &str = "Not Found";

/// Name extraction needs layout analysis that does not exist yet; Aadhaar
/// and PAN report this fixed value instead.
pub const NAME_PLACEHOLDER: &str = "Name Extraction (Beta)";

pub const RAW_TEXT_ONLY: &str = "Raw Text Only";

/// Field name → extracted value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<String, String>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a field. Used both by extraction and by user edits.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    /// Record the outcome of a pattern match, substituting [`NOT_FOUND`].
    pub fn set_match(&mut self, field: &str, found: Option<&str>) {
        self.set(field, found.unwrap_or(NOT_FOUND));
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Whether `field` holds a real value rather than [`NOT_FOUND`].
    pub fn is_found(&self, field: &str) -> bool {
        self.get(field).is_some_and(|v| v != NOT_FOUND)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_json(&self) -> String {
        // A string → string map cannot fail to serialize.
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
