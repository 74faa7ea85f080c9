//! Batched file uploads: independent reads joined into an all-or-nothing
//! commit against the byte store and the folder tree.

use std::future::Future;
use std::pin::Pin;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, instrument};

use crate::session::ByteStore;
use crate::store::{AssetNode, AssetStore};

type ReadFuture = Pin<Box<dyn Future<Output = std::io::Result<Vec<u8>>> + Send + 'static>>;

/// One file queued for upload: a display name, its MIME type, and a
/// deferred read producing the raw bytes.
pub struct PendingFile {
    name: String,
    mime: String,
    read: ReadFuture,
}

impl PendingFile {
    pub fn new(
        name: &str,
        mime: &str,
        read: impl Future<Output = std::io::Result<Vec<u8>>> + Send + 'static,
    ) -> Self {
        Self {
            name: name.to_owned(),
            mime: mime.to_owned(),
            read: Box::pin(read),
        }
    }

    /// A file whose contents are already in memory.
    pub fn from_bytes(name: &str, mime: &str, bytes: Vec<u8>) -> Self {
        Self::new(name, mime, async move { Ok(bytes) })
    }
}

/// A batch that could not be committed. Nothing was stored.
#[derive(Debug, Error)]
#[error("{failed} of {total} uploads failed: {detail}")]
pub struct UploadError {
    pub failed: usize,
    pub total: usize,
    pub detail: String,
}

/// Reads every file, stores each payload as a data URL under a generated
/// key, and appends the resulting assets under `parent_id` in the order
/// given. One failing read rejects the whole batch: no byte-store entries,
/// no tree entries. Returns the new asset ids.
#[instrument(skip(store, bytes, files), fields(count = files.len()))]
pub async fn upload_batch(
    store: &mut AssetStore,
    bytes: &dyn ByteStore,
    parent_id: &str,
    files: Vec<PendingFile>,
) -> Result<Vec<String>, UploadError> {
    let total = files.len();
    if store.folder(parent_id).is_none() {
        return Err(UploadError {
            failed: total,
            total,
            detail: format!("unknown parent folder {parent_id}"),
        });
    }

    let mut meta = Vec::with_capacity(total);
    let mut tasks = JoinSet::new();
    for (index, file) in files.into_iter().enumerate() {
        let PendingFile { name, mime, read } = file;
        meta.push((name, mime));
        tasks.spawn(async move { (index, read.await) });
    }

    let mut payloads: Vec<Option<Vec<u8>>> = vec![None; total];
    let mut failures: Vec<String> = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Ok(data))) => payloads[index] = Some(data),
            Ok((index, Err(err))) => failures.push(format!("{}: {err}", meta[index].0)),
            Err(err) => failures.push(format!("read task failed: {err}")),
        }
    }
    if !failures.is_empty() {
        failures.sort();
        return Err(UploadError {
            failed: failures.len(),
            total,
            detail: failures.join("; "),
        });
    }

    let stamp = chrono::Utc::now().timestamp_millis();
    let mut ids = Vec::with_capacity(total);
    for (index, (name, mime)) in meta.into_iter().enumerate() {
        let Some(data) = payloads[index].take() else {
            continue;
        };
        let key = format!("asset-{stamp}-{name}");
        let url = format!("data:{mime};base64,{}", STANDARD.encode(&data));
        bytes.put(&key, &url);
        store.add_asset(parent_id, AssetNode::new(&key, &name, &key, Some(&mime)));
        ids.push(key);
    }
    debug!(count = ids.len(), "upload batch committed");
    Ok(ids)
}
