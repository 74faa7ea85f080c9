//! Folder-tree asset store: an arena of folders and asset leaves with a
//! selected folder, change listeners, and snapshot persistence.
//!
//! Folders and assets live in two id-keyed maps; each folder holds an
//! ordered list of [`EntryId`] children, so lookups never walk the tree.
//! Every structural mutation persists the snapshot under `"asset-store"`
//! and notifies subscribers. Id misses are silent no-ops with a debug
//! breadcrumb, never errors.

use std::collections::HashMap;

use tracing::debug;

use crate::session::{ByteStore, Persistence};
use crate::snapshot::{AssetSnapshot, EntrySnapshot, FolderSnapshot, PersistedStore};

/// Id of the root folder. It always exists and is never deletable.
pub const ROOT_ID: &str = "root";

/// Record name the tree snapshot persists under.
pub const STORE_KEY: &str = "asset-store";

/// Tagged child reference held in a folder's ordered child list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryId {
    Folder(String),
    Asset(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FolderNode {
    pub id: String,
    pub name: String,
    pub parent: Option<String>,
    pub children: Vec<EntryId>,
    pub expanded: bool,
}

/// An asset leaf. `url` is the byte-store key for uploaded files, or a
/// literal location for external references.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetNode {
    pub id: String,
    pub name: String,
    pub url: String,
    pub kind: Option<String>,
    pub parent: Option<String>,
}

impl AssetNode {
    /// A leaf ready for [`AssetStore::add_asset`]; the store fills `parent`.
    pub fn new(id: &str, name: &str, url: &str, kind: Option<&str>) -> Self {
        Self {
            id: id.to_owned(),
            name: name.to_owned(),
            url: url.to_owned(),
            kind: kind.map(str::to_owned),
            parent: None,
        }
    }
}

type Listener = Box<dyn FnMut() + Send>;

/// The store owns the tree, the selection, and its persistence backend.
/// Hosts read through the accessors and mutate through the operations;
/// both stay cheap because the arena gives O(1) id lookups.
pub struct AssetStore {
    folders: HashMap<String, FolderNode>,
    assets: HashMap<String, AssetNode>,
    current: String,
    listeners: Vec<(usize, Listener)>,
    next_listener: usize,
    folder_seq: u64,
    persistence: Box<dyn Persistence>,
}

impl AssetStore {
    /// Opens the store, hydrating the tree from the persisted record when
    /// one parses, otherwise starting from a bare root named "Root". The
    /// selected folder always starts at root, whatever was persisted.
    pub fn new(persistence: Box<dyn Persistence>) -> Self {
        let mut store = Self {
            folders: HashMap::new(),
            assets: HashMap::new(),
            current: ROOT_ID.to_owned(),
            listeners: Vec::new(),
            next_listener: 0,
            folder_seq: 0,
            persistence,
        };
        match store.persistence.load(STORE_KEY) {
            Some(raw) => match serde_json::from_str::<PersistedStore>(&raw) {
                Ok(snapshot) if snapshot.tree.id == ROOT_ID => store.hydrate(snapshot.tree),
                Ok(snapshot) => {
                    debug!(id = %snapshot.tree.id, "persisted tree has a foreign root, starting fresh");
                    store.install_root();
                }
                Err(err) => {
                    debug!(%err, "persisted tree did not parse, starting fresh");
                    store.install_root();
                }
            },
            None => store.install_root(),
        }
        store
    }

    /// Id of the selected folder.
    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn folder(&self, id: &str) -> Option<&FolderNode> {
        self.folders.get(id)
    }

    pub fn asset(&self, id: &str) -> Option<&AssetNode> {
        self.assets.get(id)
    }

    /// Ordered children of a folder; unknown ids read as empty.
    pub fn children(&self, folder_id: &str) -> &[EntryId] {
        self.folders
            .get(folder_id)
            .map(|folder| folder.children.as_slice())
            .unwrap_or(&[])
    }

    /// The persisted form of the current tree.
    pub fn snapshot(&self) -> PersistedStore {
        PersistedStore {
            tree: self.folder_snapshot(ROOT_ID).unwrap_or_else(|| FolderSnapshot {
                id: ROOT_ID.to_owned(),
                name: "Root".to_owned(),
                children: Vec::new(),
                expanded: true,
            }),
        }
    }

    /// Repoints the selected folder. Unknown ids leave it alone.
    pub fn set_current(&mut self, folder_id: &str) {
        if !self.folders.contains_key(folder_id) {
            debug!(folder_id, "set_current: no such folder");
            return;
        }
        self.current = folder_id.to_owned();
        self.notify();
    }

    /// Creates an empty, collapsed folder under `parent_id`, returning the
    /// generated id. Parent misses and id collisions are refused.
    pub fn add_folder(&mut self, parent_id: &str, name: &str) -> Option<String> {
        if !self.folders.contains_key(parent_id) {
            debug!(parent_id, "add_folder: no such parent");
            return None;
        }
        let id = self.next_folder_id();
        if self.folders.contains_key(&id) || self.assets.contains_key(&id) {
            debug!(%id, "add_folder: id already taken");
            return None;
        }
        self.folders.insert(
            id.clone(),
            FolderNode {
                id: id.clone(),
                name: name.to_owned(),
                parent: Some(parent_id.to_owned()),
                children: Vec::new(),
                expanded: false,
            },
        );
        if let Some(parent) = self.folders.get_mut(parent_id) {
            parent.children.push(EntryId::Folder(id.clone()));
        }
        self.commit();
        Some(id)
    }

    /// Appends an asset under `parent_id` and resynchronizes the selected
    /// folder to root so hosts re-read the tree from the top.
    pub fn add_asset(&mut self, parent_id: &str, mut asset: AssetNode) {
        if !self.folders.contains_key(parent_id) {
            debug!(parent_id, "add_asset: no such parent");
            return;
        }
        if self.assets.contains_key(&asset.id) || self.folders.contains_key(&asset.id) {
            debug!(id = %asset.id, "add_asset: id already taken");
            return;
        }
        asset.parent = Some(parent_id.to_owned());
        let id = asset.id.clone();
        self.assets.insert(id.clone(), asset);
        if let Some(parent) = self.folders.get_mut(parent_id) {
            parent.children.push(EntryId::Asset(id));
        }
        self.current = ROOT_ID.to_owned();
        self.commit();
    }

    /// Removes a folder and its whole subtree. Root is refused. A
    /// selection inside the removed subtree falls back to root.
    pub fn delete_folder(&mut self, folder_id: &str) {
        if folder_id == ROOT_ID {
            debug!("delete_folder: root is not deletable");
            return;
        }
        let Some(parent_id) = self
            .folders
            .get(folder_id)
            .and_then(|folder| folder.parent.clone())
        else {
            debug!(folder_id, "delete_folder: no such folder");
            return;
        };
        let reset_current = self.is_beneath(&self.current, folder_id);
        if let Some(parent) = self.folders.get_mut(&parent_id) {
            let needle = EntryId::Folder(folder_id.to_owned());
            parent.children.retain(|child| child != &needle);
        }
        let mut queue = vec![folder_id.to_owned()];
        while let Some(id) = queue.pop() {
            let Some(folder) = self.folders.remove(&id) else {
                continue;
            };
            for child in folder.children {
                match child {
                    EntryId::Folder(child_id) => queue.push(child_id),
                    EntryId::Asset(asset_id) => {
                        self.assets.remove(&asset_id);
                    }
                }
            }
        }
        if reset_current {
            self.current = ROOT_ID.to_owned();
        }
        self.commit();
    }

    /// Flips a folder's expansion flag.
    pub fn toggle_folder(&mut self, folder_id: &str) {
        let Some(folder) = self.folders.get_mut(folder_id) else {
            debug!(folder_id, "toggle_folder: no such folder");
            return;
        };
        folder.expanded = !folder.expanded;
        self.commit();
    }

    /// Renames a folder in place. Root can be renamed, just not removed.
    pub fn rename_folder(&mut self, folder_id: &str, name: &str) {
        let Some(folder) = self.folders.get_mut(folder_id) else {
            debug!(folder_id, "rename_folder: no such folder");
            return;
        };
        folder.name = name.to_owned();
        self.commit();
    }

    /// Drops every asset whose byte-store key no longer resolves. Folders
    /// stay even when this empties them.
    pub fn cleanup_orphaned_assets(&mut self, bytes: &dyn ByteStore) {
        let orphaned: Vec<String> = self
            .assets
            .values()
            .filter(|asset| !bytes.contains(&asset.url))
            .map(|asset| asset.id.clone())
            .collect();
        if orphaned.is_empty() {
            return;
        }
        for id in &orphaned {
            let Some(asset) = self.assets.remove(id) else {
                continue;
            };
            let Some(parent_id) = asset.parent else {
                continue;
            };
            if let Some(parent) = self.folders.get_mut(&parent_id) {
                let needle = EntryId::Asset(asset.id);
                parent.children.retain(|child| child != &needle);
            }
        }
        debug!(removed = orphaned.len(), "dropped orphaned assets");
        self.commit();
    }

    /// Registers a change listener, returning a token for
    /// [`Self::unsubscribe`]. Listeners fire after every mutation.
    pub fn subscribe(&mut self, listener: impl FnMut() + Send + 'static) -> usize {
        let token = self.next_listener;
        self.next_listener += 1;
        self.listeners.push((token, Box::new(listener)));
        token
    }

    pub fn unsubscribe(&mut self, token: usize) {
        self.listeners.retain(|(id, _)| *id != token);
    }

    fn install_root(&mut self) {
        self.folders.insert(
            ROOT_ID.to_owned(),
            FolderNode {
                id: ROOT_ID.to_owned(),
                name: "Root".to_owned(),
                parent: None,
                children: Vec::new(),
                expanded: true,
            },
        );
    }

    fn hydrate(&mut self, tree: FolderSnapshot) {
        self.hydrate_folder(tree, None);
    }

    fn hydrate_folder(&mut self, snap: FolderSnapshot, parent: Option<String>) {
        let id = snap.id;
        let mut children = Vec::new();
        for child in snap.children {
            match child {
                EntrySnapshot::Asset(asset) => {
                    children.push(EntryId::Asset(asset.id.clone()));
                    self.assets.insert(
                        asset.id.clone(),
                        AssetNode {
                            id: asset.id,
                            name: asset.name,
                            url: asset.url,
                            kind: asset.kind,
                            parent: Some(id.clone()),
                        },
                    );
                }
                EntrySnapshot::Folder(folder) => {
                    children.push(EntryId::Folder(folder.id.clone()));
                    self.hydrate_folder(folder, Some(id.clone()));
                }
            }
        }
        self.folders.insert(
            id.clone(),
            FolderNode {
                id,
                name: snap.name,
                parent,
                children,
                expanded: snap.expanded,
            },
        );
    }

    fn folder_snapshot(&self, id: &str) -> Option<FolderSnapshot> {
        let folder = self.folders.get(id)?;
        let mut children = Vec::new();
        for child in &folder.children {
            match child {
                EntryId::Asset(asset_id) => {
                    if let Some(asset) = self.assets.get(asset_id) {
                        children.push(EntrySnapshot::Asset(AssetSnapshot {
                            id: asset.id.clone(),
                            name: asset.name.clone(),
                            url: asset.url.clone(),
                            kind: asset.kind.clone(),
                        }));
                    }
                }
                EntryId::Folder(folder_id) => {
                    if let Some(snap) = self.folder_snapshot(folder_id) {
                        children.push(EntrySnapshot::Folder(snap));
                    }
                }
            }
        }
        Some(FolderSnapshot {
            id: folder.id.clone(),
            name: folder.name.clone(),
            children,
            expanded: folder.expanded,
        })
    }

    fn is_beneath(&self, id: &str, ancestor: &str) -> bool {
        let mut cursor = Some(id.to_owned());
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self
                .folders
                .get(&current)
                .and_then(|folder| folder.parent.clone());
        }
        false
    }

    fn next_folder_id(&mut self) -> String {
        self.folder_seq += 1;
        format!(
            "folder-{}-{}",
            chrono::Utc::now().timestamp_millis(),
            self.folder_seq
        )
    }

    fn commit(&mut self) {
        match serde_json::to_string(&self.snapshot()) {
            Ok(raw) => self.persistence.save(STORE_KEY, &raw),
            Err(err) => debug!(%err, "snapshot serialization failed"),
        }
        self.notify();
    }

    fn notify(&mut self) {
        for (_, listener) in &mut self.listeners {
            listener();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::session::{MemoryByteStore, MemoryPersistence};

    fn fresh() -> AssetStore {
        AssetStore::new(Box::new(MemoryPersistence::new()))
    }

    fn tree_json(store: &AssetStore) -> String {
        serde_json::to_string(&store.snapshot()).unwrap()
    }

    #[test]
    fn add_then_delete_restores_prior_tree() {
        let mut store = fresh();
        store.add_folder(ROOT_ID, "Keep");
        let before = tree_json(&store);

        let id = store.add_folder(ROOT_ID, "Drafts").unwrap();
        assert_ne!(tree_json(&store), before);
        store.delete_folder(&id);
        assert_eq!(tree_json(&store), before);
    }

    #[test]
    fn root_deletion_is_refused() {
        let mut store = fresh();
        store.add_folder(ROOT_ID, "Drafts");
        store.delete_folder(ROOT_ID);
        assert!(store.folder(ROOT_ID).is_some());
        assert_eq!(store.children(ROOT_ID).len(), 1);
    }

    #[test]
    fn delete_resets_current_inside_subtree() {
        let mut store = fresh();
        let outer = store.add_folder(ROOT_ID, "Outer").unwrap();
        let inner = store.add_folder(&outer, "Inner").unwrap();
        let sibling = store.add_folder(ROOT_ID, "Sibling").unwrap();

        store.set_current(&inner);
        store.delete_folder(&outer);
        assert_eq!(store.current(), ROOT_ID);
        assert!(store.folder(&inner).is_none());

        store.set_current(&sibling);
        let other = store.add_folder(ROOT_ID, "Other").unwrap();
        store.delete_folder(&other);
        assert_eq!(store.current(), sibling);
    }

    #[test]
    fn delete_drops_nested_assets_from_the_arena() {
        let mut store = fresh();
        let folder = store.add_folder(ROOT_ID, "Media").unwrap();
        store.add_asset(
            &folder,
            AssetNode::new("asset-1-pic.png", "pic.png", "asset-1-pic.png", Some("image/png")),
        );
        store.delete_folder(&folder);
        assert!(store.asset("asset-1-pic.png").is_none());
        assert!(store.children(ROOT_ID).is_empty());
    }

    #[test]
    fn add_asset_resyncs_current_to_root() {
        let mut store = fresh();
        let folder = store.add_folder(ROOT_ID, "Media").unwrap();
        store.set_current(&folder);
        assert_eq!(store.current(), folder);

        store.add_asset(
            &folder,
            AssetNode::new("asset-1-pic.png", "pic.png", "asset-1-pic.png", Some("image/png")),
        );
        assert_eq!(store.current(), ROOT_ID);
        assert_eq!(
            store.children(&folder),
            &[EntryId::Asset("asset-1-pic.png".to_owned())]
        );
        assert_eq!(
            store.asset("asset-1-pic.png").unwrap().parent.as_deref(),
            Some(folder.as_str())
        );
    }

    #[test]
    fn cleanup_removes_byte_orphans_keeps_backed_and_folders() {
        let mut store = fresh();
        let bytes = MemoryByteStore::new();
        bytes.put("asset-1-kept.png", "data:image/png;base64,AA==");

        let empty = store.add_folder(ROOT_ID, "Empty").unwrap();
        store.add_asset(
            ROOT_ID,
            AssetNode::new("asset-1-kept.png", "kept.png", "asset-1-kept.png", Some("image/png")),
        );
        store.add_asset(
            ROOT_ID,
            AssetNode::new("asset-2-lost.png", "lost.png", "asset-2-lost.png", Some("image/png")),
        );

        store.cleanup_orphaned_assets(&bytes);
        assert!(store.asset("asset-1-kept.png").is_some());
        assert!(store.asset("asset-2-lost.png").is_none());
        assert!(store.folder(&empty).is_some());
        assert_eq!(store.children(ROOT_ID).len(), 2);
    }

    #[test]
    fn persistence_round_trip() -> anyhow::Result<()> {
        let records = MemoryPersistence::new();
        {
            let mut store = AssetStore::new(Box::new(records.clone()));
            let folder = store.add_folder(ROOT_ID, "Media").ok_or_else(|| anyhow::anyhow!("no id"))?;
            store.toggle_folder(&folder);
            store.add_asset(
                &folder,
                AssetNode::new("asset-1-pic.png", "pic.png", "asset-1-pic.png", Some("image/png")),
            );
            store.set_current(&folder);
        }

        let reloaded = AssetStore::new(Box::new(records));
        assert_eq!(reloaded.current(), ROOT_ID);
        let root_children = reloaded.children(ROOT_ID);
        assert_eq!(root_children.len(), 1);
        let EntryId::Folder(folder_id) = &root_children[0] else {
            anyhow::bail!("expected a folder under root");
        };
        let folder = reloaded.folder(folder_id).ok_or_else(|| anyhow::anyhow!("folder lost"))?;
        assert_eq!(folder.name, "Media");
        assert!(folder.expanded);
        let asset = reloaded
            .asset("asset-1-pic.png")
            .ok_or_else(|| anyhow::anyhow!("asset lost"))?;
        assert_eq!(asset.kind.as_deref(), Some("image/png"));
        assert_eq!(asset.parent.as_deref(), Some(folder_id.as_str()));
        Ok(())
    }

    #[test]
    fn corrupt_persisted_payload_starts_fresh() {
        let records = MemoryPersistence::new();
        records.save(STORE_KEY, "not json at all");
        let store = AssetStore::new(Box::new(records));
        assert!(store.folder(ROOT_ID).is_some());
        assert!(store.children(ROOT_ID).is_empty());
    }

    #[test]
    fn subscribe_notifies_every_mutation() {
        let mut store = fresh();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let token = store.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let folder = store.add_folder(ROOT_ID, "Media").unwrap();
        store.set_current(&folder);
        store.rename_folder(&folder, "Pictures");
        assert_eq!(fired.load(Ordering::SeqCst), 3);

        store.unsubscribe(token);
        store.toggle_folder(&folder);
        assert_eq!(fired.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn misses_are_silent_noops() {
        let mut store = fresh();
        let before = tree_json(&store);

        store.set_current("ghost");
        assert_eq!(store.current(), ROOT_ID);
        assert_eq!(store.add_folder("ghost", "Orphan"), None);
        store.delete_folder("ghost");
        store.toggle_folder("ghost");
        store.rename_folder("ghost", "Nobody");
        store.add_asset("ghost", AssetNode::new("a", "a.png", "a", None));

        assert_eq!(tree_json(&store), before);
        assert!(store.asset("a").is_none());
    }

    #[test]
    fn duplicate_asset_id_is_refused() {
        let mut store = fresh();
        store.add_asset(ROOT_ID, AssetNode::new("asset-1-a.png", "a.png", "asset-1-a.png", None));
        store.add_asset(ROOT_ID, AssetNode::new("asset-1-a.png", "other.png", "elsewhere", None));
        assert_eq!(store.children(ROOT_ID).len(), 1);
        assert_eq!(store.asset("asset-1-a.png").unwrap().name, "a.png");
    }
}
