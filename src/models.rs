use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A library track as returned by the OpenSubsonic API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: Option<String>,      // Single genre field (legacy)
    pub genres: Option<Vec<Genre>>, // Multiple genres array (OpenSubsonic extension)
    pub bpm: Option<u32>,
    pub duration: Option<f64>, // seconds
    pub year: Option<u32>,
    pub track: Option<u32>,
    #[serde(rename = "playCount")]
    pub play_count: Option<u32>,
    pub played: Option<String>, // Last played timestamp
    pub path: Option<String>,
    pub suffix: Option<String>,
    #[serde(rename = "bitRate")]
    pub bit_rate: Option<u32>,
    #[serde(rename = "contentType")]
    pub content_type: Option<String>,
    /// Every other attribute the server sent along (ratings, custom tags, ...)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Genre structure for multiple genres support
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genre {
    pub name: String,
}

/// Response structure for getRandomSongs API call
#[derive(Debug, Deserialize)]
pub struct RandomSongsResponse {
    #[serde(rename = "subsonic-response")]
    pub subsonic_response: SubsonicResponse,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct SubsonicResponse {
    pub status: String,
    /// allow undefined version for flexibility
    pub version: String,
    #[serde(rename = "randomSongs")]
    pub random_songs: Option<RandomSongs>,
}

#[derive(Debug, Deserialize)]
pub struct RandomSongs {
    pub song: Vec<Song>,
}

/// Response envelope for calls that only report a status (ping, scrobble)
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    #[serde(rename = "subsonic-response")]
    pub subsonic_response: StatusBody,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: String,
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: u32,
    pub message: Option<String>,
}

impl Song {
    /// Get all genres for this song, combining both single genre and genres array
    pub fn get_all_genres(&self) -> Vec<String> {
        let mut all_genres = Vec::new();

        if let Some(ref genre) = self.genre {
            all_genres.push(genre.to_lowercase());
        }

        if let Some(ref genres) = self.genres {
            for genre in genres {
                all_genres.push(genre.name.to_lowercase());
            }
        }

        all_genres.sort();
        all_genres.dedup();
        all_genres
    }

    /// Play count with missing values treated as never played
    pub fn play_count_or_zero(&self) -> u32 {
        self.play_count.unwrap_or(0)
    }

    /// Duration in seconds, `None` when absent or not a usable number
    pub fn length(&self) -> Option<f64> {
        self.duration.filter(|d| d.is_finite() && *d >= 0.0)
    }

    /// Coerce a named field to a float.
    ///
    /// Known attributes are read from their typed fields; anything else is
    /// looked up in `extra`, where numbers and numeric strings are accepted.
    pub fn field_value(&self, field: &str) -> Option<f64> {
        let value = match field {
            "bpm" | "tempo" => self.bpm.map(f64::from),
            "length" | "duration" => self.length(),
            "year" => self.year.map(f64::from),
            "track" => self.track.map(f64::from),
            "play_count" | "playCount" => Some(f64::from(self.play_count_or_zero())),
            "bit_rate" | "bitRate" => self.bit_rate.map(f64::from),
            _ => match self.extra.get(field)? {
                serde_json::Value::Number(n) => n.as_f64(),
                serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
                serde_json::Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
                _ => None,
            },
        };
        value.filter(|v| v.is_finite())
    }

    /// Text representation of a named field, used by substring queries
    pub fn field_text(&self, field: &str) -> Option<String> {
        match field {
            "title" => Some(self.title.clone()),
            "artist" => Some(self.artist.clone()),
            "album" => Some(self.album.clone()),
            "genre" => {
                let genres = self.get_all_genres();
                if genres.is_empty() {
                    None
                } else {
                    Some(genres.join(", "))
                }
            }
            "path" => self.path.clone(),
            "suffix" | "format" => self.suffix.clone(),
            _ => match self.extra.get(field) {
                Some(serde_json::Value::String(s)) => Some(s.clone()),
                Some(serde_json::Value::Null) | None => {
                    self.field_value(field).map(|v| v.to_string())
                }
                Some(other) => Some(other.to_string()),
            },
        }
    }

    /// File extension used when the song is exported
    pub fn file_extension(&self) -> String {
        if let Some(suffix) = self.suffix.as_deref().filter(|s| !s.is_empty()) {
            return suffix.to_lowercase();
        }

        self.path
            .as_deref()
            .and_then(|p| std::path::Path::new(p).extension())
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "mp3".to_string())
    }
}

impl Default for Song {
    fn default() -> Self {
        Song {
            id: String::new(),
            title: "Unknown".to_string(),
            artist: "Unknown".to_string(),
            album: "Unknown".to_string(),
            genre: None,
            genres: None,
            bpm: None,
            duration: None,
            year: None,
            track: None,
            play_count: None,
            played: None,
            path: None,
            suffix: None,
            bit_rate: None,
            content_type: None,
            extra: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_reads_typed_and_extra_fields() {
        let mut song = Song {
            bpm: Some(172),
            duration: Some(215.5),
            year: Some(2019),
            ..Default::default()
        };
        song.extra
            .insert("averageRating".to_string(), serde_json::json!(4.5));
        song.extra
            .insert("energy".to_string(), serde_json::json!(" 0.83 "));
        song.extra
            .insert("mood".to_string(), serde_json::json!("happy"));

        assert_eq!(song.field_value("bpm"), Some(172.0));
        assert_eq!(song.field_value("tempo"), Some(172.0));
        assert_eq!(song.field_value("length"), Some(215.5));
        assert_eq!(song.field_value("year"), Some(2019.0));
        assert_eq!(song.field_value("averageRating"), Some(4.5));
        assert_eq!(song.field_value("energy"), Some(0.83));
        assert_eq!(song.field_value("mood"), None);
        assert_eq!(song.field_value("missing"), None);
    }

    #[test]
    fn test_play_count_defaults_to_zero() {
        let song = Song::default();
        assert_eq!(song.play_count_or_zero(), 0);
        assert_eq!(song.field_value("play_count"), Some(0.0));
    }

    #[test]
    fn test_deserializes_subsonic_song_with_extra_attributes() {
        let json = r#"{
            "id": "42",
            "title": "Tempo Run",
            "artist": "Pacers",
            "album": "Intervals",
            "bpm": 168,
            "duration": 201,
            "playCount": 3,
            "suffix": "flac",
            "userRating": 5
        }"#;

        let song: Song = serde_json::from_str(json).unwrap();
        assert_eq!(song.duration, Some(201.0));
        assert_eq!(song.play_count, Some(3));
        assert_eq!(song.field_value("userRating"), Some(5.0));
        assert_eq!(song.file_extension(), "flac");
    }

    #[test]
    fn test_file_extension_falls_back_to_path() {
        let song = Song {
            path: Some("Artist/Album/01 Track.OGG".to_string()),
            ..Default::default()
        };
        assert_eq!(song.file_extension(), "ogg");
        assert_eq!(Song::default().file_extension(), "mp3");
    }
}
