//! Folder-tree asset management: an arena-indexed folder/asset hierarchy
//! with injected session storage, snapshot persistence, and batched file
//! uploads.
//!
//! The tree never holds file bytes. Uploads read files into data-URL
//! strings kept in a [`ByteStore`] keyed by generated asset ids; each
//! asset's `url` records its key. Every structural mutation persists a
//! JSON snapshot of the tree under the `"asset-store"` record through the
//! injected [`Persistence`] backend and notifies subscribers.

pub mod session;
pub mod snapshot;
pub mod store;
pub mod upload;

pub use session::{ByteStore, MemoryByteStore, MemoryPersistence, Persistence};
pub use snapshot::{AssetSnapshot, EntrySnapshot, FolderSnapshot, PersistedStore};
pub use store::{AssetNode, AssetStore, EntryId, FolderNode, ROOT_ID, STORE_KEY};
pub use upload::{upload_batch, PendingFile, UploadError};
