use crate::config::Config;
use crate::models::{RandomSongsResponse, Song, StatusResponse};
use crate::training::export::MediaSource;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::fs::File;
use std::path::Path;
use ureq::Agent;
use urlencoding::encode;

const API_VERSION: &str = "1.16.1";
const CLIENT_NAME: &str = "training-mix";

/// A simple Subsonic API client using MD5 authentication
pub struct SubsonicClient {
    agent: Agent,
    base_url: String,
    username: String,
    password: String,
}

impl SubsonicClient {
    /// Create a new client with configuration from environment
    pub fn new(config: Config) -> Self {
        let agent = Agent::new();

        SubsonicClient {
            agent,
            base_url: config.base_url,
            username: config.username,
            password: config.password,
        }
    }

    /// Generate authentication parameters using salt + token method
    fn generate_auth_params(&self) -> (String, String) {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();

        // Random salt, at least 6 characters
        let salt = format!("{:x}", md5::compute(format!("{nanos}{CLIENT_NAME}")))[..8].to_string();

        // token = md5(password + salt)
        let token = format!("{:x}", md5::compute(format!("{}{}", self.password, salt)));

        (salt, token)
    }

    /// Authenticated URL for `endpoint`, with `params` already encoded
    fn api_url(&self, endpoint: &str, params: &str) -> String {
        let (salt, token) = self.generate_auth_params();
        let mut url = format!(
            "{}/rest/{}?u={}&t={}&s={}&v={}&c={}",
            self.base_url.trim_end_matches('/'),
            endpoint,
            encode(&self.username),
            token,
            salt,
            API_VERSION,
            CLIENT_NAME
        );
        if !params.is_empty() {
            url.push('&');
            url.push_str(params);
        }
        url
    }

    /// Call an endpoint that only answers with a status
    fn call_status(&self, endpoint: &str, params: &str) -> Result<()> {
        let url = self.api_url(endpoint, &format!("f=json&{params}"));
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| anyhow::anyhow!("{endpoint} request failed: {}", e))?;

        let response_text = response.into_string()?;
        let parsed: StatusResponse = serde_json::from_str(&response_text)
            .with_context(|| format!("Invalid response format from {endpoint}"))?;

        if parsed.subsonic_response.status != "ok" {
            let reason = parsed
                .subsonic_response
                .error
                .map(|e| format!("{} (code {})", e.message.unwrap_or_default(), e.code))
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(anyhow::anyhow!("API error on {endpoint}: {reason}"));
        }

        Ok(())
    }

    /// Test the API connection with a simple ping
    pub fn ping(&self) -> Result<()> {
        self.call_status("ping", "")
    }

    /// Fetch random songs from the Subsonic API
    /// If count > 500, makes multiple requests to accumulate unique songs
    pub fn fetch_songs(&self, count: Option<u32>) -> Result<Vec<Song>> {
        let desired_count = count.unwrap_or(100);
        let max_per_request = 500;

        if desired_count <= max_per_request {
            return self.fetch_songs_batch(desired_count);
        }

        let mut all_songs = Vec::new();
        let mut seen_ids = std::collections::HashSet::new();
        let mut attempts = 0;
        let max_attempts = 20; // Prevent infinite loops if library is smaller than requested

        info!(
            "Fetching {desired_count} songs (making multiple requests of {max_per_request} songs each)..."
        );

        while all_songs.len() < desired_count as usize && attempts < max_attempts {
            attempts += 1;
            let batch = self.fetch_songs_batch(max_per_request)?;

            let initial_count = all_songs.len();
            let batch_size = batch.len();

            for song in batch {
                if seen_ids.insert(song.id.clone()) {
                    all_songs.push(song);

                    if all_songs.len() >= desired_count as usize {
                        break;
                    }
                }
            }

            let added = all_songs.len() - initial_count;
            debug!(
                "Batch {attempts}: got {batch_size} songs, {added} new (total: {}/{desired_count})",
                all_songs.len()
            );

            // Few new songs: the library is probably exhausted
            if added == 0 {
                break;
            }
            if added < 50 && all_songs.len() < desired_count as usize {
                warn!(
                    "Only got {added} new songs in this batch. Library may be smaller than requested count."
                );
            }
        }

        if all_songs.len() < desired_count as usize {
            info!(
                "Retrieved {} songs, less than requested {desired_count} (library may be smaller)",
                all_songs.len()
            );
        }

        Ok(all_songs)
    }

    /// Internal helper to fetch a single batch of random songs
    fn fetch_songs_batch(&self, size: u32) -> Result<Vec<Song>> {
        let url = self.api_url("getRandomSongs", &format!("f=json&size={size}"));

        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| anyhow::anyhow!("HTTP request failed: {}", e))?;

        let response_text = response.into_string()?;

        let parsed_response: RandomSongsResponse = serde_json::from_str(&response_text)
            .map_err(|e| anyhow::anyhow!("Failed to parse JSON response: {}", e))?;

        if parsed_response.subsonic_response.status != "ok" {
            return Err(anyhow::anyhow!(
                "API returned error status: {}",
                parsed_response.subsonic_response.status
            ));
        }

        match parsed_response.subsonic_response.random_songs {
            Some(random_songs) => Ok(random_songs.song),
            None => Ok(vec![]),
        }
    }

    /// Stream the original file of a song to `destination`
    pub fn download_song(&self, song: &Song, destination: &Path) -> Result<u64> {
        let url = self.api_url("download", &format!("id={}", encode(&song.id)));

        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| anyhow::anyhow!("Download of '{}' failed: {}", song.id, e))?;

        // Errors come back as a JSON/XML body instead of audio
        let content_type = response.content_type().to_string();
        if content_type.contains("json") || content_type.contains("xml") {
            let body = response.into_string()?;
            return Err(anyhow::anyhow!(
                "Download of '{}' was refused: {}",
                song.id,
                body.trim()
            ));
        }

        let mut file = File::create(destination)
            .with_context(|| format!("Cannot create {}", destination.display()))?;
        let bytes = std::io::copy(&mut response.into_reader(), &mut file)
            .with_context(|| format!("Cannot write {}", destination.display()))?;

        debug!("Downloaded {bytes} bytes to {}", destination.display());
        Ok(bytes)
    }

    /// Register a completed play, which increments the server side play count
    pub fn scrobble(&self, song: &Song) -> Result<()> {
        self.call_status("scrobble", &format!("id={}&submission=true", encode(&song.id)))
    }
}

impl MediaSource for SubsonicClient {
    fn fetch_to(&self, song: &Song, destination: &Path) -> Result<()> {
        self.download_song(song, destination).map(|_| ())
    }

    fn increment_play_count(&self, song: &Song) -> Result<()> {
        self.scrobble(song)
    }
}
