//! Normalized item schema shared by every provider's listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a normalized item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Contacts,
    Companies,
    Deals,
    Bases,
    Tables,
    Pages,
    Databases,
    #[default]
    Unknown,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Contacts => "contacts",
            ItemType::Companies => "companies",
            ItemType::Deals => "deals",
            ItemType::Bases => "bases",
            ItemType::Tables => "tables",
            ItemType::Pages => "pages",
            ItemType::Databases => "databases",
            ItemType::Unknown => "unknown",
        }
    }

    /// Parse a provider's object-type string, falling back to `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value {
            "contacts" => ItemType::Contacts,
            "companies" => ItemType::Companies,
            "deals" => ItemType::Deals,
            "bases" => ItemType::Bases,
            "tables" => ItemType::Tables,
            "pages" => ItemType::Pages,
            "databases" => ItemType::Databases,
            _ => ItemType::Unknown,
        }
    }
}

/// A provider resource flattened into the common schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationItem {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub directory: bool,
    pub parent_path_or_name: Option<String>,
    pub parent_id: Option<String>,
    pub name: Option<String>,
    pub creation_time: Option<DateTime<Utc>>,
    pub last_modified_time: Option<DateTime<Utc>>,
    pub url: Option<String>,
    pub children: Option<Vec<String>>,
    pub mime_type: Option<String>,
    pub delta: Option<String>,
    pub drive_id: Option<String>,
    pub visibility: Option<bool>,
}

impl Default for IntegrationItem {
    fn default() -> Self {
        Self {
            id: None,
            item_type: ItemType::Unknown,
            directory: false,
            parent_path_or_name: None,
            parent_id: None,
            name: None,
            creation_time: None,
            last_modified_time: None,
            url: None,
            children: None,
            mime_type: None,
            delta: None,
            drive_id: None,
            visibility: Some(true),
        }
    }
}
