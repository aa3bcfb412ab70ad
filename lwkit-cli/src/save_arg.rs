//! Argument handed from the save preview to the save action.

use serde::{Deserialize, Serialize};

use crate::query::SaveInput;

const ENHANCED_PREFIX: &str = "save_enhanced:";
const URL_PREFIX: &str = "save_url:";

/// What to save, as decoded from the launcher argument.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveData {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub collections: Vec<String>,
}

impl SaveData {
    /// Only the first collection is used.
    pub fn collection(&self) -> Option<&str> {
        self.collections
            .iter()
            .map(|c| c.trim())
            .find(|c| !c.is_empty())
    }
}

impl From<SaveInput> for SaveData {
    fn from(input: SaveInput) -> Self {
        Self {
            url: input.url,
            tags: input.tags,
            collections: input.collections,
            ..Self::default()
        }
    }
}

/// Decode `save_enhanced:{json}`, `save_url:<url>`, or a bare URL.
pub fn decode(arg: &str) -> Result<SaveData, serde_json::Error> {
    let arg = arg.trim();
    if let Some(json) = arg.strip_prefix(ENHANCED_PREFIX) {
        return serde_json::from_str(json);
    }
    let url = arg.strip_prefix(URL_PREFIX).unwrap_or(arg);
    Ok(SaveData {
        url: url.trim().to_string(),
        ..SaveData::default()
    })
}

/// Encode as `save_enhanced:{json}`.
pub fn encode(data: &SaveData) -> Result<String, serde_json::Error> {
    Ok(format!("{ENHANCED_PREFIX}{}", serde_json::to_string(data)?))
}
