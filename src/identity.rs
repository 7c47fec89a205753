//! Cached lookups of the server machine identifier and player addresses.
//!
//! Both values are stable for the life of the process, so the first
//! successful lookup is kept. Two requests resolving at the same time may
//! both fetch; the last write wins and both writes carry the same value.

use crate::api::{MediaServer, media_container};
use crate::error::{AppError, Result};
use log::debug;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Memoized identity lookups, shared across requests.
#[derive(Debug, Default)]
pub struct IdentityCache {
    machine_identifier: RwLock<Option<String>>,
    /// Fixed address for every player, from `PLEXPLAYER_IP` or config.
    address_override: Option<String>,
    addresses: RwLock<HashMap<String, String>>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cache pre-seeded from configuration overrides.
    pub fn with_overrides(
        machine_identifier: Option<String>,
        address_override: Option<String>,
    ) -> Self {
        Self {
            machine_identifier: RwLock::new(machine_identifier),
            address_override,
            addresses: RwLock::new(HashMap::new()),
        }
    }

    /// The server's machine identifier, fetched from `/` on first use.
    pub async fn machine_identifier<S: MediaServer + ?Sized>(&self, server: &S) -> Result<String> {
        if let Some(id) = self.machine_identifier.read().await.clone() {
            return Ok(id);
        }

        let body = server.query("/").await?;
        let id = media_container(&body)
            .get("machineIdentifier")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::Parse("server root did not report a machineIdentifier".to_string())
            })?;

        debug!("Resolved server machine identifier {}", id);
        *self.machine_identifier.write().await = Some(id.clone());
        Ok(id)
    }

    /// The network address of the player called `name`.
    ///
    /// A configured override wins over any lookup. Otherwise `/clients` is
    /// searched by name and the first match's address is used.
    pub async fn client_address<S: MediaServer + ?Sized>(
        &self,
        server: &S,
        name: &str,
    ) -> Result<String> {
        if let Some(address) = &self.address_override {
            return Ok(address.clone());
        }
        if let Some(address) = self.addresses.read().await.get(name).cloned() {
            return Ok(address);
        }

        let clients = server.find("/clients", &[("name", name)]).await?;
        let address = clients
            .first()
            .and_then(|client| client.get("address"))
            .and_then(Value::as_str)
            .filter(|address| !address.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::NotFound(format!("player '{}'", name)))?;

        debug!("Resolved player '{}' to {}", name, address);
        self.addresses
            .write()
            .await
            .insert(name.to_string(), address.clone());
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Serves a fixed root and client list, counting queries.
    struct FakeServer {
        root: Value,
        clients: Value,
        queries: Mutex<Vec<String>>,
    }

    impl FakeServer {
        fn new(root: Value, clients: Value) -> Self {
            Self {
                root,
                clients,
                queries: Mutex::new(Vec::new()),
            }
        }

        fn query_count(&self) -> usize {
            self.queries.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl MediaServer for FakeServer {
        async fn query(&self, path: &str) -> Result<Value> {
            self.queries.lock().unwrap().push(path.to_string());
            match path {
                "/" => Ok(self.root.clone()),
                "/clients" => Ok(self.clients.clone()),
                other => Err(AppError::Network(format!("unexpected path {}", other))),
            }
        }

        async fn post_query(&self, path: &str) -> Result<Value> {
            Err(AppError::Network(format!("unexpected POST {}", path)))
        }

        async fn perform(&self, path: &str) -> Result<Value> {
            Err(AppError::Network(format!("unexpected command {}", path)))
        }
    }

    fn clients() -> Value {
        json!({"MediaContainer": {"Server": [
            {"name": "Bedroom", "address": "10.0.0.5", "protocolCapabilities": "playback"},
            {"name": "Living Room", "address": "10.0.0.7", "protocolCapabilities": "playback"},
            {"name": "Living Room", "address": "10.0.0.8", "protocolCapabilities": "playback"}
        ]}})
    }

    #[tokio::test]
    async fn test_machine_identifier_fetched_once() {
        let server = FakeServer::new(json!({"MediaContainer": {"machineIdentifier": "abc123"}}), clients());
        let cache = IdentityCache::new();

        assert_eq!(cache.machine_identifier(&server).await.unwrap(), "abc123");
        assert_eq!(cache.machine_identifier(&server).await.unwrap(), "abc123");
        assert_eq!(server.query_count(), 1);
    }

    #[tokio::test]
    async fn test_machine_identifier_override_skips_fetch() {
        let server = FakeServer::new(json!({}), clients());
        let cache = IdentityCache::with_overrides(Some("from-env".to_string()), None);

        assert_eq!(cache.machine_identifier(&server).await.unwrap(), "from-env");
        assert_eq!(server.query_count(), 0);
    }

    #[tokio::test]
    async fn test_machine_identifier_missing_is_parse_error() {
        let server = FakeServer::new(json!({"MediaContainer": {}}), clients());
        let cache = IdentityCache::new();

        let err = cache.machine_identifier(&server).await.unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[tokio::test]
    async fn test_client_address_first_match() {
        let server = FakeServer::new(json!({}), clients());
        let cache = IdentityCache::new();

        let address = cache.client_address(&server, "Living Room").await.unwrap();
        assert_eq!(address, "10.0.0.7");

        // second lookup comes from the cache
        cache.client_address(&server, "Living Room").await.unwrap();
        assert_eq!(server.query_count(), 1);
    }

    #[tokio::test]
    async fn test_client_address_unknown_player() {
        let server = FakeServer::new(json!({}), clients());
        let cache = IdentityCache::new();

        let err = cache.client_address(&server, "Kitchen").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(err.to_string().contains("Kitchen"));
    }

    #[tokio::test]
    async fn test_client_address_override() {
        let server = FakeServer::new(json!({}), clients());
        let cache = IdentityCache::with_overrides(None, Some("192.168.1.50".to_string()));

        assert_eq!(
            cache.client_address(&server, "Kitchen").await.unwrap(),
            "192.168.1.50"
        );
        assert_eq!(server.query_count(), 0);
    }
}
