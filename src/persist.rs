//! Versioned, best-effort blob persistence shared by both engines.
//!
//! Loading never fails: an absent, unreadable, unparsable or wrong-version
//! blob comes back as `None` and the engine rebuilds from empty. Saving never
//! fails either: write errors are logged and the in-memory state stays
//! authoritative until the next successful write.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::store::KvStore;

pub const WORD_PROGRESS_KEY: &str = "word_progress";
pub const PARTICLE_PROGRESS_KEY: &str = "particle_progress";

/// Bumped whenever a persisted record shape changes incompatibly.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: u32,
    data: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    version: u32,
    data: T,
}

pub fn encode<T: Serialize>(data: &T) -> serde_json::Result<String> {
    serde_json::to_string(&EnvelopeRef {
        version: SCHEMA_VERSION,
        data,
    })
}

pub fn decode<T: DeserializeOwned>(raw: &str) -> anyhow::Result<T> {
    let envelope: Envelope<T> = serde_json::from_str(raw)?;
    if envelope.version != SCHEMA_VERSION {
        anyhow::bail!(
            "schema version {} does not match expected {}",
            envelope.version,
            SCHEMA_VERSION
        );
    }
    Ok(envelope.data)
}

pub async fn load<S: KvStore, T: DeserializeOwned>(store: &S, key: &str) -> Option<T> {
    let raw = match store.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            log::debug!("no persisted state under '{}'", key);
            return None;
        }
        Err(e) => {
            log::warn!("failed to read '{}': {:#}; starting from empty state", key, e);
            return None;
        }
    };

    match decode(&raw) {
        Ok(data) => Some(data),
        Err(e) => {
            log::warn!("corrupt persisted state under '{}': {:#}; rebuilding", key, e);
            None
        }
    }
}

/// Returns whether the write reached the store.
pub async fn save<S: KvStore, T: Serialize>(store: &S, key: &str, data: &T) -> bool {
    let payload = match encode(data) {
        Ok(payload) => payload,
        Err(e) => {
            log::error!("failed to serialize '{}': {}", key, e);
            return false;
        }
    };

    match store.set(key, &payload).await {
        Ok(()) => true,
        Err(e) => {
            log::error!("failed to persist '{}': {:#}", key, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn unparsable_blob_loads_as_none() {
        let store = MemoryStore::new();
        store.put_raw(WORD_PROGRESS_KEY, "{not json");
        let loaded: Option<HashMap<String, u32>> = load(&store, WORD_PROGRESS_KEY).await;
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn other_schema_version_loads_as_none() {
        let store = MemoryStore::new();
        store.put_raw(WORD_PROGRESS_KEY, r#"{"version":99,"data":{"a":1}}"#);
        let loaded: Option<HashMap<String, u32>> = load(&store, WORD_PROGRESS_KEY).await;
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn saved_blob_is_enveloped() {
        let store = MemoryStore::new();
        let data: HashMap<String, u32> = [("猫".to_string(), 3)].into_iter().collect();
        assert!(save(&store, WORD_PROGRESS_KEY, &data).await);

        let raw = store.get_raw(WORD_PROGRESS_KEY).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], SCHEMA_VERSION);
        assert_eq!(value["data"]["猫"], 3);
    }

    #[tokio::test]
    async fn failed_write_is_reported_not_raised() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        assert!(!save(&store, WORD_PROGRESS_KEY, &vec![1, 2, 3]).await);
    }
}
