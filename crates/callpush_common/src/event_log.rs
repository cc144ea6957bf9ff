//! Append-only event log.
//!
//! One line per event, `"{Y-m-d H:i:s} - {message}\n"`, with the timestamp in
//! a fixed IANA timezone. The log is informational; nothing reads it back.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{info, warn};

use callpush_config::StorageConfig;

use crate::error::{config_error, CallpushError};
use crate::store::BlobStore;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone)]
pub struct EventLog {
    store: Arc<dyn BlobStore>,
    key: String,
    tz: Tz,
}

impl EventLog {
    pub fn new(store: Arc<dyn BlobStore>, key: impl Into<String>, tz: Tz) -> Self {
        Self {
            store,
            key: key.into(),
            tz,
        }
    }

    /// Builds the log from the storage section; fails on an unknown timezone.
    pub fn from_config(
        store: Arc<dyn BlobStore>,
        storage: &StorageConfig,
    ) -> Result<Self, CallpushError> {
        let tz: Tz = storage.log_timezone.parse().map_err(|_| {
            config_error(format!("unknown log timezone: {}", storage.log_timezone))
        })?;
        Ok(Self::new(store, storage.event_log_file.clone(), tz))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Renders one log line for `at`.
    pub fn format_line(&self, at: DateTime<Utc>, message: &str) -> String {
        format!(
            "{} - {}\n",
            at.with_timezone(&self.tz).format(TIMESTAMP_FORMAT),
            message
        )
    }

    /// Appends `message`. A failed write is reported through `tracing` only.
    pub async fn append(&self, message: &str) {
        self.append_at(Utc::now(), message).await;
    }

    pub async fn append_at(&self, at: DateTime<Utc>, message: &str) {
        info!(target: "callpush::event", "{}", message);

        let line = self.format_line(at, message);
        if let Err(e) = self.store.append(&self.key, line.as_bytes()).await {
            warn!("Failed to append to event log {}: {}", self.key, e);
        }
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("key", &self.key)
            .field("tz", &self.tz)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBlobStore;
    use async_trait::async_trait;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_lines_use_configured_timezone() {
        let store = Arc::new(MemoryBlobStore::new());
        let log = EventLog::new(store.clone(), "events.txt", chrono_tz::Asia::Dhaka);

        // 18:30 UTC is 00:30 the next day in Dhaka (UTC+6).
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 18, 30, 5).unwrap();
        log.append_at(at, "first").await;
        log.append_at(at, "second").await;

        assert_eq!(
            store.get_string("events.txt").await.unwrap(),
            "2024-03-02 00:30:05 - first\n2024-03-02 00:30:05 - second\n"
        );
    }

    #[test]
    fn test_from_config_rejects_unknown_timezone() {
        let storage = StorageConfig {
            log_timezone: "Mars/Olympus".to_string(),
            ..StorageConfig::default()
        };
        let err = EventLog::from_config(Arc::new(MemoryBlobStore::new()), &storage).unwrap_err();
        assert!(matches!(err, CallpushError::ConfigError(_)));
    }

    #[test]
    fn test_from_config_defaults() {
        let log =
            EventLog::from_config(Arc::new(MemoryBlobStore::new()), &StorageConfig::default())
                .unwrap();
        assert_eq!(log.key(), "fcm_log.txt");
    }

    struct FailingStore;

    #[async_trait]
    impl BlobStore for FailingStore {
        async fn read(&self, _key: &str) -> Result<Option<Vec<u8>>, CallpushError> {
            Ok(None)
        }
        async fn write(&self, _key: &str, _data: &[u8]) -> Result<(), CallpushError> {
            Err(config_error("read-only"))
        }
        async fn exists(&self, _key: &str) -> Result<bool, CallpushError> {
            Ok(false)
        }
        async fn append(&self, _key: &str, _data: &[u8]) -> Result<(), CallpushError> {
            Err(config_error("read-only"))
        }
    }

    #[tokio::test]
    async fn test_append_failure_is_not_fatal() {
        let log = EventLog::new(Arc::new(FailingStore), "events.txt", chrono_tz::UTC);
        log.append("ignored").await;
    }
}
