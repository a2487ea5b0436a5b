//! Main Plex Media Server client.

use crate::error::{diagnose, PlexClientError, Result, TransportError};
use crate::retry::{Idempotency, RetryPolicy};
use crate::transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};
use crate::types::{
    media_uri, ClientConfig, CreatePlaylist, DirectoryList, Envelope, Library, MetadataList,
    Playlist, PlaylistItem, SearchResult,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Lightweight paths used only to check reachability, tried in order.
pub const PROBE_ENDPOINTS: [&str; 3] = ["/", "/identity", "/library/sections"];

/// Client for one Plex Media Server.
///
/// Holds only its fixed configuration, so a single instance can be shared
/// between tasks. Every operation re-fetches from the server and applies
/// the retry policy independently.
///
/// # Example
///
/// ```ignore
/// use plex_client::{ClientConfig, PlexClient};
///
/// let client = PlexClient::new(ClientConfig::new("http://localhost:32400", token))?;
/// client.test_connection().await?;
///
/// for playlist in client.list_playlists().await? {
///     println!("{} ({} items)", playlist.title, playlist.leaf_count);
/// }
/// ```
#[derive(Clone)]
pub struct PlexClient {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
    policy: RetryPolicy,
}

impl std::fmt::Debug for PlexClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlexClient")
            .field("config", &self.config)
            .field("policy", &self.policy)
            .finish()
    }
}

impl PlexClient {
    /// Create a client that talks HTTP through `reqwest`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let config = normalize(config)?;
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::from_parts(config, Arc::new(transport)))
    }

    /// Create a client over a custom transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let config = normalize(config)?;
        Ok(Self::from_parts(config, transport))
    }

    fn from_parts(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let policy = RetryPolicy::new(config.retry_attempts, config.retry_delay)
            .with_retry_writes(config.retry_writes);

        debug!(
            url = %config.url,
            timeout_ms = config.timeout.as_millis() as u64,
            retry_attempts = policy.attempts(),
            retry_delay_ms = config.retry_delay.as_millis() as u64,
            "PlexClient initialized"
        );

        Self {
            transport,
            config,
            policy,
        }
    }

    /// Normalized base URL (no trailing slash).
    pub fn url(&self) -> &str {
        &self.config.url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Test the connection to the server.
    ///
    /// Each attempt probes [`PROBE_ENDPOINTS`] in order and succeeds on the
    /// first HTTP 200. When every attempt fails, the last probe failure is
    /// classified into a [`PlexClientError::Connection`] with hints.
    pub async fn test_connection(&self) -> Result<bool> {
        info!(
            url = %self.config.url,
            timeout_ms = self.config.timeout.as_millis() as u64,
            "Testing connection"
        );

        self.policy
            .run("connection test", Idempotency::Idempotent, || self.probe())
            .await
            .map(|_| true)
            .map_err(|source| {
                let diagnosis = diagnose(&source);
                PlexClientError::Connection {
                    message: diagnosis.message,
                    troubleshooting: diagnosis.troubleshooting,
                    code: source.code(),
                    status: source.http_status(),
                    url: self.config.url.clone(),
                    source,
                }
            })
    }

    /// One sweep over the probe endpoints.
    async fn probe(&self) -> std::result::Result<&'static str, TransportError> {
        let mut last_error = None;

        for endpoint in PROBE_ENDPOINTS {
            match self.transport.send(&ApiRequest::get(endpoint)).await {
                Ok(response) if response.status == 200 => {
                    info!(
                        endpoint,
                        status = response.status,
                        server_version = response.header("x-plex-version").unwrap_or("unknown"),
                        server_platform = response.header("x-plex-platform").unwrap_or("unknown"),
                        "Connection successful"
                    );
                    return Ok(endpoint);
                }
                Ok(response) => {
                    debug!(endpoint, status = response.status, "Probe failed");
                    last_error = Some(status_error(response));
                }
                Err(err) => {
                    debug!(endpoint, error = %err, "Probe failed");
                    last_error = Some(err);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| TransportError::Request("No responsive endpoints found".into())))
    }

    /// List library sections.
    pub async fn list_libraries(&self) -> Result<Vec<Library>> {
        let envelope: Envelope<DirectoryList<Library>> = self
            .fetch("get libraries", ApiRequest::get("/library/sections"))
            .await?;
        Ok(envelope.into_directory())
    }

    /// List all playlists.
    pub async fn list_playlists(&self) -> Result<Vec<Playlist>> {
        let envelope: Envelope<MetadataList<Playlist>> = self
            .fetch("get playlists", ApiRequest::get("/playlists"))
            .await?;
        Ok(envelope.into_metadata())
    }

    /// List the items of a playlist in server order.
    pub async fn list_playlist_items(&self, playlist_id: &str) -> Result<Vec<PlaylistItem>> {
        let envelope: Envelope<MetadataList<PlaylistItem>> = self
            .fetch(
                "get playlist items",
                ApiRequest::get(format!("/playlists/{}/items", playlist_id)),
            )
            .await?;
        Ok(envelope.into_metadata())
    }

    /// Create a playlist of the given type with default flags.
    pub async fn create_playlist(&self, title: &str, kind: &str) -> Result<serde_json::Value> {
        self.create_playlist_with(&CreatePlaylist::new(title).kind(kind))
            .await
    }

    /// Create a playlist. Returns the server's response body unchanged.
    pub async fn create_playlist_with(
        &self,
        playlist: &CreatePlaylist,
    ) -> Result<serde_json::Value> {
        let request = playlist
            .query()
            .into_iter()
            .fold(ApiRequest::post("/playlists"), |request, (key, value)| {
                request.query(key, value)
            });

        self.send_value("create playlist", request, Idempotency::NonIdempotent)
            .await
    }

    /// Add items by rating key, all in one request.
    pub async fn add_to_playlist<I, S>(
        &self,
        playlist_id: &str,
        rating_keys: I,
    ) -> Result<serde_json::Value>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let uris: Vec<String> = rating_keys
            .into_iter()
            .map(|key| media_uri(key.as_ref()))
            .collect();

        if uris.is_empty() {
            return Err(PlexClientError::Validation(
                "No items to add to playlist".into(),
            ));
        }

        let request = ApiRequest::put(format!("/playlists/{}/items", playlist_id))
            .query("uri", uris.join(","));

        self.send_value(
            "add items to playlist",
            request,
            Idempotency::NonIdempotent,
        )
        .await
    }

    /// Remove one membership, identified by its playlist item id.
    pub async fn remove_from_playlist(
        &self,
        playlist_id: &str,
        playlist_item_id: &str,
    ) -> Result<serde_json::Value> {
        let request = ApiRequest::delete(format!(
            "/playlists/{}/items/{}",
            playlist_id, playlist_item_id
        ));

        self.send_value(
            "remove item from playlist",
            request,
            Idempotency::Idempotent,
        )
        .await
    }

    /// Remove the item at a 0-based position in the playlist's current order.
    ///
    /// Re-fetches the items first so the index is resolved against fresh
    /// server state. Out-of-range indexes fail before any DELETE is sent;
    /// negative indexes fail before anything is sent.
    pub async fn remove_item_at(&self, playlist_id: &str, index: i64) -> Result<PlaylistItem> {
        let position = usize::try_from(index).map_err(|_| invalid_index(index))?;

        let mut items = self.list_playlist_items(playlist_id).await?;
        if position >= items.len() {
            return Err(invalid_index(index));
        }
        let item = items.swap_remove(position);

        debug!(
            playlist_id,
            index,
            playlist_item_id = %item.playlist_item_id,
            title = %item.title,
            "Removing playlist item"
        );

        self.remove_from_playlist(playlist_id, &item.playlist_item_id)
            .await?;
        Ok(item)
    }

    /// Delete a playlist by rating key.
    pub async fn delete_playlist(&self, playlist_id: &str) -> Result<serde_json::Value> {
        self.send_value(
            "delete playlist",
            ApiRequest::delete(format!("/playlists/{}", playlist_id)),
            Idempotency::Idempotent,
        )
        .await
    }

    /// Search a library section.
    pub async fn search_library(&self, library_id: &str, query: &str) -> Result<Vec<SearchResult>> {
        let envelope: Envelope<MetadataList<SearchResult>> = self
            .fetch(
                "search library",
                ApiRequest::get(format!("/library/sections/{}/search", library_id))
                    .query("query", query),
            )
            .await?;
        Ok(envelope.into_metadata())
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        action: &'static str,
        request: ApiRequest,
    ) -> Result<T> {
        self.execute(action, &request, Idempotency::Idempotent)
            .await
            .and_then(|response| response.json())
            .map_err(PlexClientError::operation(action))
    }

    async fn send_value(
        &self,
        action: &'static str,
        request: ApiRequest,
        idempotency: Idempotency,
    ) -> Result<serde_json::Value> {
        self.execute(action, &request, idempotency)
            .await
            .and_then(|response| response.value())
            .map_err(PlexClientError::operation(action))
    }

    async fn execute(
        &self,
        action: &'static str,
        request: &ApiRequest,
        idempotency: Idempotency,
    ) -> std::result::Result<ApiResponse, TransportError> {
        self.policy
            .run(action, idempotency, || self.attempt(request))
            .await
    }

    async fn attempt(&self, request: &ApiRequest) -> std::result::Result<ApiResponse, TransportError> {
        let response = self.transport.send(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(status_error(response))
        }
    }
}

fn status_error(response: ApiResponse) -> TransportError {
    TransportError::Status {
        status: response.status,
        body: response.body,
    }
}

fn invalid_index(index: i64) -> PlexClientError {
    PlexClientError::Validation(format!("Invalid item index: {}", index))
}

/// Trim, strip one trailing slash, and require an absolute http(s) URL.
fn normalize(mut config: ClientConfig) -> Result<ClientConfig> {
    let trimmed = config.url.trim();
    let url = trimmed.strip_suffix('/').unwrap_or(trimmed).to_string();

    let parsed = Url::parse(&url)
        .map_err(|e| PlexClientError::Config(format!("Invalid server URL '{}': {}", url, e)))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(PlexClientError::Config(format!(
            "Invalid server URL '{}': must start with http:// or https://",
            url
        )));
    }

    config.url = url;
    config.token = config.token.trim().to_string();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use serde_json::json;
    use std::time::Duration;

    fn config() -> ClientConfig {
        ClientConfig::new("http://plex.local:32400/", " token ")
            .with_retry_attempts(2)
            .with_retry_delay(Duration::ZERO)
    }

    #[test]
    fn test_url_validation() {
        assert!(PlexClient::new(ClientConfig::new("https://example.com", "t")).is_ok());
        assert!(PlexClient::new(ClientConfig::new("http://localhost:32400", "t")).is_ok());

        for bad in ["", "not a url", "ftp://example.com", "localhost:32400"] {
            assert!(
                matches!(
                    PlexClient::new(ClientConfig::new(bad, "t")),
                    Err(PlexClientError::Config(_))
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_normalization_strips_one_slash_and_trims() {
        let client = PlexClient::new(config()).unwrap();
        assert_eq!(client.url(), "http://plex.local:32400");
        assert_eq!(client.config().token, "token");

        let client =
            PlexClient::new(ClientConfig::new("  http://plex.local:32400//", "t")).unwrap();
        assert_eq!(client.url(), "http://plex.local:32400/");
    }

    #[tokio::test]
    async fn test_negative_index_sends_nothing() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(0);

        let client = PlexClient::with_transport(config(), Arc::new(transport)).unwrap();
        let result = client.remove_item_at("10", -1).await;

        assert!(matches!(result, Err(PlexClientError::Validation(_))));
    }

    #[tokio::test]
    async fn test_index_past_end_never_deletes() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|request| request.method == reqwest::Method::GET)
            .times(1)
            .returning(|_| {
                Ok(ApiResponse::json_body(&json!({
                    "MediaContainer": {
                        "Metadata": [
                            { "ratingKey": "1", "title": "One", "playlistItemID": 100 }
                        ]
                    }
                })))
            });

        let client = PlexClient::with_transport(config(), Arc::new(transport)).unwrap();
        let result = client.remove_item_at("10", 1).await;

        match result {
            Err(PlexClientError::Validation(msg)) => assert!(msg.contains("index")),
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_add_nothing_is_rejected_locally() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(0);

        let client = PlexClient::with_transport(config(), Arc::new(transport)).unwrap();
        let result = client.add_to_playlist("10", Vec::<String>::new()).await;

        assert!(matches!(result, Err(PlexClientError::Validation(_))));
    }

    #[tokio::test]
    async fn test_decode_failure_is_operation_error() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(ApiResponse::new(200, "<MediaContainer/>")));

        let client = PlexClient::with_transport(config(), Arc::new(transport)).unwrap();
        let err = client.list_playlists().await.unwrap_err();

        assert!(err.to_string().starts_with("Failed to get playlists: "));
        assert!(matches!(
            err,
            PlexClientError::Operation {
                source: TransportError::Decode(_),
                ..
            }
        ));
    }
}
