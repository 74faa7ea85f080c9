//! Persisted form of the folder tree: the nested JSON written under the
//! `"asset-store"` record.
//!
//! Entries are untagged on the wire. An asset is whatever carries a
//! `url`; a folder is whatever carries `children`. The selected folder is
//! deliberately not part of the snapshot, it re-derives to root on load.

use serde::{Deserialize, Serialize};

/// Envelope for the persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedStore {
    pub tree: FolderSnapshot,
}

/// One tree entry, discriminated by shape rather than a tag field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntrySnapshot {
    Asset(AssetSnapshot),
    Folder(FolderSnapshot),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSnapshot {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderSnapshot {
    pub id: String,
    pub name: String,
    pub children: Vec<EntrySnapshot>,
    #[serde(rename = "isExpanded", default)]
    pub expanded: bool,
}
