//! Playlist workflows built from several client calls.

use crate::client::PlexClient;
use crate::error::{PlexClientError, Result};
use crate::types::{Library, LibraryType, Playlist, PlaylistItem, SearchResult};
use tracing::{debug, info};

/// A playlist together with its current items.
#[derive(Debug, Clone)]
pub struct PlaylistDetails {
    pub playlist: Playlist,
    pub items: Vec<PlaylistItem>,
}

/// Multi-step playlist operations. Returns data; rendering is up to the caller.
#[derive(Debug, Clone)]
pub struct PlaylistManager {
    client: PlexClient,
}

impl PlaylistManager {
    pub fn new(client: PlexClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &PlexClient {
        &self.client
    }

    /// Verify the server is reachable.
    pub async fn connect(&self) -> Result<()> {
        self.client.test_connection().await?;
        info!(url = %self.client.url(), "Connected to Plex server");
        Ok(())
    }

    /// Look up a playlist by rating key among the server's playlists.
    pub async fn find_playlist(&self, playlist_id: &str) -> Result<Playlist> {
        self.client
            .list_playlists()
            .await?
            .into_iter()
            .find(|p| p.rating_key == playlist_id)
            .ok_or_else(|| PlexClientError::NotFound(format!("Playlist not found: {}", playlist_id)))
    }

    pub async fn playlist_details(&self, playlist_id: &str) -> Result<PlaylistDetails> {
        let playlist = self.find_playlist(playlist_id).await?;
        let items = self.client.list_playlist_items(playlist_id).await?;
        Ok(PlaylistDetails { playlist, items })
    }

    /// Delete a playlist after checking it exists. Returns what was deleted.
    pub async fn delete_playlist(&self, playlist_id: &str) -> Result<Playlist> {
        let playlist = self.find_playlist(playlist_id).await?;
        self.client.delete_playlist(playlist_id).await?;
        info!(playlist_id, title = %playlist.title, "Playlist deleted");
        Ok(playlist)
    }

    /// First library holding music.
    pub async fn music_library(&self) -> Result<Library> {
        self.client
            .list_libraries()
            .await?
            .into_iter()
            .find(|lib| lib.library_type == LibraryType::Artist)
            .ok_or_else(|| PlexClientError::NotFound("No music library found".into()))
    }

    /// Search a library and add every hit to the playlist in one request.
    ///
    /// Without `library_id` the first music library is searched. An empty
    /// result adds nothing.
    pub async fn search_and_add(
        &self,
        playlist_id: &str,
        query: &str,
        library_id: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        let library_id = match library_id {
            Some(id) => id.to_string(),
            None => self.music_library().await?.key,
        };

        let results = self.client.search_library(&library_id, query).await?;
        debug!(library_id = %library_id, query, results = results.len(), "Search complete");

        if results.is_empty() {
            return Ok(results);
        }

        self.client
            .add_to_playlist(playlist_id, results.iter().map(|r| r.rating_key.as_str()))
            .await?;
        info!(playlist_id, added = results.len(), "Added items to playlist");

        Ok(results)
    }

    /// Remove the item at a 0-based position.
    pub async fn remove_at(&self, playlist_id: &str, index: i64) -> Result<PlaylistItem> {
        let item = self.client.remove_item_at(playlist_id, index).await?;
        info!(playlist_id, title = %item.title, "Item removed from playlist");
        Ok(item)
    }
}
