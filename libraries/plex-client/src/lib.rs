//! Plex Media Server Client
//!
//! Resilient HTTP client for the playlist and library endpoints of a Plex
//! Media Server.
//!
//! # Features
//!
//! - **Connectivity test**: probes several endpoints and classifies failures
//!   into troubleshooting hints
//! - **Retries**: linear backoff on every operation; creates and additions
//!   are only repeated when the request never reached the server
//! - **Playlists**: list, create, delete, add and remove items
//! - **Library**: list sections, search
//!
//! # Example
//!
//! ```ignore
//! use plex_client::{ClientConfig, PlexClient, PlaylistManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("http://localhost:32400", "my-token");
//!     let client = PlexClient::new(config)?;
//!
//!     client.test_connection().await?;
//!
//!     let manager = PlaylistManager::new(client);
//!     let added = manager.search_and_add("12345", "Daft Punk", None).await?;
//!     println!("Added {} tracks", added.len());
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod manager;
mod retry;
mod transport;
mod types;

pub use client::{PlexClient, PROBE_ENDPOINTS};
pub use error::{ErrorCode, PlexClientError, Result, TransportError};
pub use manager::{PlaylistDetails, PlaylistManager};
pub use retry::{Idempotency, RetryPolicy};
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport, TOKEN_HEADER};
pub use types::{
    media_uri, ClientConfig, CreatePlaylist, Library, LibraryType, Playlist, PlaylistItem,
    SearchResult, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT, MEDIA_URI_PREFIX,
};
