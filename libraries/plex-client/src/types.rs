//! Types for Plex Media Server requests and responses.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);
/// Default number of attempts per operation.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
/// Default base delay for linear backoff.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2_000);

/// Prefix the server expects in front of a rating key when adding items.
pub const MEDIA_URI_PREFIX: &str = "server://localhost/com.plexapp.plugins.library/library/metadata/";

/// Build the media reference for a rating key.
pub fn media_uri(rating_key: &str) -> String {
    format!("{}{}", MEDIA_URI_PREFIX, rating_key)
}

/// Configuration for connecting to a Plex Media Server.
///
/// Defaults are resolved by the caller (environment, config file) before
/// the client is built; the client itself never reads ambient state.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the server (e.g., "http://192.168.1.10:32400")
    pub url: String,
    /// Value sent as `X-Plex-Token` on every request
    pub token: String,
    /// Per-request transport timeout
    pub timeout: Duration,
    /// Attempts per operation, including the first
    pub retry_attempts: u32,
    /// Base delay; attempt `n` waits `retry_delay * n` before attempt `n + 1`
    pub retry_delay: Duration,
    /// Retry playlist creation and item additions on any failure, not only
    /// on failures where the request never left the client
    pub retry_writes: bool,
}

impl ClientConfig {
    /// Create a config with default timeout and retry settings.
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            retry_writes: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_retry_writes(mut self, retry_writes: bool) -> Self {
        self.retry_writes = retry_writes;
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_delay", &self.retry_delay)
            .field("retry_writes", &self.retry_writes)
            .finish()
    }
}

// =============================================================================
// Library Types
// =============================================================================

/// Kind of content a library section holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryType {
    Movie,
    Show,
    /// Music libraries are typed by their top-level entity
    Artist,
    Photo,
    #[serde(other)]
    Other,
}

impl LibraryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LibraryType::Movie => "movie",
            LibraryType::Show => "show",
            LibraryType::Artist => "artist",
            LibraryType::Photo => "photo",
            LibraryType::Other => "other",
        }
    }
}

/// A library section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Library {
    #[serde(deserialize_with = "deserialize_string_or_number")]
    pub key: String,
    pub title: String,
    #[serde(rename = "type")]
    pub library_type: LibraryType,
}

// =============================================================================
// Playlist Types
// =============================================================================

/// Playlist metadata. Identity is the rating key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    #[serde(deserialize_with = "deserialize_string_or_number")]
    pub rating_key: String,
    pub title: String,
    /// Number of items in the playlist
    #[serde(default)]
    pub leaf_count: u64,
    #[serde(default)]
    pub playlist_type: Option<String>,
    #[serde(default)]
    pub smart: bool,
    /// Total duration in milliseconds
    #[serde(default)]
    pub duration: Option<u64>,
}

/// One membership of an item in a playlist, in server order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    #[serde(deserialize_with = "deserialize_string_or_number")]
    pub rating_key: String,
    #[serde(default)]
    pub title: String,
    /// Artist for tracks
    #[serde(default)]
    pub grandparent_title: Option<String>,
    /// Album for tracks
    #[serde(default)]
    pub parent_title: Option<String>,
    /// Identifies this membership; required to remove it. Not the rating key.
    #[serde(
        rename = "playlistItemID",
        deserialize_with = "deserialize_string_or_number"
    )]
    pub playlist_item_id: String,
}

/// A search hit, used to build add-to-playlist requests.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(deserialize_with = "deserialize_string_or_number")]
    pub rating_key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub grandparent_title: Option<String>,
    #[serde(default)]
    pub parent_title: Option<String>,
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,
}

impl SearchResult {
    /// Media reference for this result.
    pub fn media_uri(&self) -> String {
        media_uri(&self.rating_key)
    }
}

/// Parameters for creating a playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePlaylist {
    pub title: String,
    /// Playlist type ("audio", "video", "photo")
    pub kind: String,
    pub smart: bool,
    /// Source media reference; empty creates an empty playlist
    pub uri: String,
}

impl CreatePlaylist {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind: "audio".to_string(),
            smart: false,
            uri: String::new(),
        }
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn smart(mut self, smart: bool) -> Self {
        self.smart = smart;
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    pub(crate) fn query(&self) -> [(&'static str, String); 4] {
        [
            ("title", self.title.clone()),
            ("type", self.kind.clone()),
            ("smart", if self.smart { "1" } else { "0" }.to_string()),
            ("uri", self.uri.clone()),
        ]
    }
}

// =============================================================================
// Response Envelopes
// =============================================================================

/// Top-level `MediaContainer` wrapper.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<C> {
    #[serde(rename = "MediaContainer")]
    pub media_container: Option<C>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DirectoryList<T> {
    #[serde(rename = "Directory")]
    pub directory: Option<Vec<T>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MetadataList<T> {
    #[serde(rename = "Metadata")]
    pub metadata: Option<Vec<T>>,
}

impl<T> Envelope<DirectoryList<T>> {
    pub fn into_directory(self) -> Vec<T> {
        self.media_container
            .and_then(|c| c.directory)
            .unwrap_or_default()
    }
}

impl<T> Envelope<MetadataList<T>> {
    pub fn into_metadata(self) -> Vec<T> {
        self.media_container
            .and_then(|c| c.metadata)
            .unwrap_or_default()
    }
}

/// Plex sends identifiers as numbers in some endpoints and strings in others.
fn deserialize_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Int(i64),
        Float(f64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Int(i) => i.to_string(),
        StringOrNumber::Float(f) => f.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_media_uri() {
        assert_eq!(
            media_uri("1234"),
            "server://localhost/com.plexapp.plugins.library/library/metadata/1234"
        );
    }

    #[test]
    fn test_playlist_item_id_accepts_numbers() {
        let item: PlaylistItem = serde_json::from_value(json!({
            "ratingKey": "55",
            "title": "Song",
            "grandparentTitle": "Artist",
            "playlistItemID": 9001
        }))
        .unwrap();

        assert_eq!(item.playlist_item_id, "9001");
        assert_eq!(item.rating_key, "55");
        assert_eq!(item.grandparent_title.as_deref(), Some("Artist"));
        assert!(item.parent_title.is_none());
    }

    #[test]
    fn test_unknown_library_type() {
        let library: Library = serde_json::from_value(json!({
            "key": 3,
            "title": "Home Videos",
            "type": "clip"
        }))
        .unwrap();

        assert_eq!(library.key, "3");
        assert_eq!(library.library_type, LibraryType::Other);
    }

    #[test]
    fn test_envelope_without_list_is_empty() {
        let envelope: Envelope<MetadataList<Playlist>> =
            serde_json::from_value(json!({ "MediaContainer": { "size": 0 } })).unwrap();
        assert!(envelope.into_metadata().is_empty());

        let envelope: Envelope<DirectoryList<Library>> =
            serde_json::from_value(json!({})).unwrap();
        assert!(envelope.into_directory().is_empty());
    }

    #[test]
    fn test_create_playlist_defaults() {
        let query = CreatePlaylist::new("My Mix").query();
        assert_eq!(query[0], ("title", "My Mix".to_string()));
        assert_eq!(query[1], ("type", "audio".to_string()));
        assert_eq!(query[2], ("smart", "0".to_string()));
        assert_eq!(query[3], ("uri", String::new()));
    }

    #[test]
    fn test_config_debug_hides_token() {
        let config = ClientConfig::new("http://localhost:32400", "secret-token");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-token"));
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.retry_delay, Duration::from_millis(2000));
        assert_eq!(config.timeout, Duration::from_secs(10));
    }
}
