use crate::common_types::ObjectUrl;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{LazyLock, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

const OBJECT_URL_PREFIX: &str = "blob:pdf2png/";

/// Process-local store of blobs addressable by `blob:` URLs.
///
/// URLs stay resolvable until [`ObjectUrlRegistry::revoke_object_url`] is
/// called; nothing is released automatically.
#[derive(Debug, Default)]
pub struct ObjectUrlRegistry {
    next_id: AtomicU64,
    blobs: RwLock<HashMap<ObjectUrl, Bytes>>,
}

static GLOBAL_REGISTRY: LazyLock<ObjectUrlRegistry> = LazyLock::new(ObjectUrlRegistry::new);

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> &'static ObjectUrlRegistry {
        &GLOBAL_REGISTRY
    }

    pub fn create_object_url(&self, blob: Bytes) -> ObjectUrl {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let url = ObjectUrl(format!("{}{}", OBJECT_URL_PREFIX, Self::url_token(id, &blob)));
        self.blobs
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(url.clone(), blob);
        url
    }

    pub fn resolve(&self, url: &ObjectUrl) -> Option<Bytes> {
        self.blobs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(url)
            .cloned()
    }

    pub fn revoke_object_url(&self, url: &ObjectUrl) -> bool {
        self.blobs
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(url)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.blobs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_object_url(url: &str) -> bool {
        url.starts_with(OBJECT_URL_PREFIX)
    }

    // 128 bits of a digest over the sequence number, the clock and the blob size.
    fn url_token(id: u64, blob: &Bytes) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(id.to_le_bytes());
        hasher.update(nanos.to_le_bytes());
        hasher.update((blob.len() as u64).to_le_bytes());
        hex::encode(&hasher.finalize()[..16])
    }
}
