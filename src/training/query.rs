use crate::models::Song;
use log::debug;
use std::collections::HashSet;

/// How a query element compares a song field
#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
    /// Inclusive numeric range, open on either side
    Range { min: Option<f64>, max: Option<f64> },
    /// Case-insensitive substring
    Text(String),
}

/// One `field:value` element of a library query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryElement {
    /// `None` for bare terms, which search title, artist and album
    pub key: Option<String>,
    pub matcher: Matcher,
}

impl QueryElement {
    /// Parse `bpm:120..150`, `year:2010..`, `genre:rock` or a bare term
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (key, value) = match raw.split_once(':') {
            Some((key, value)) if !key.trim().is_empty() => {
                (Some(key.trim().to_string()), value.trim())
            }
            _ => (None, raw),
        };

        let matcher = Self::parse_range(value).unwrap_or_else(|| Matcher::Text(value.to_lowercase()));

        QueryElement { key, matcher }
    }

    fn parse_range(value: &str) -> Option<Matcher> {
        let (low, high) = value.split_once("..")?;
        let bound = |s: &str| -> Result<Option<f64>, ()> {
            let s = s.trim();
            if s.is_empty() {
                Ok(None)
            } else {
                s.parse::<f64>().map(Some).map_err(|_| ())
            }
        };

        let min = bound(low).ok()?;
        let max = bound(high).ok()?;
        if min.is_none() && max.is_none() {
            return None;
        }
        Some(Matcher::Range { min, max })
    }

    pub fn matches(&self, song: &Song) -> bool {
        match (&self.key, &self.matcher) {
            (Some(key), Matcher::Range { min, max }) => match song.field_value(key) {
                Some(value) => {
                    min.is_none_or(|m| value >= m) && max.is_none_or(|m| value <= m)
                }
                None => false,
            },
            (Some(key), Matcher::Text(needle)) => song
                .field_text(key)
                .is_some_and(|text| text.to_lowercase().contains(needle.as_str())),
            (None, Matcher::Text(needle)) => [&song.title, &song.artist, &song.album]
                .iter()
                .any(|text| text.to_lowercase().contains(needle.as_str())),
            (None, Matcher::Range { .. }) => false,
        }
    }

    /// Key used to drop weaker duplicates when query sources are combined
    fn dedup_key(&self, raw: &str) -> String {
        self.key.clone().unwrap_or_else(|| raw.trim().to_string())
    }
}

/// Library query assembled from all sources of a training run
#[derive(Debug, Clone, Default)]
pub struct TrainingQuery {
    /// The raw elements that survived de-duplication, strongest first
    pub raw: Vec<String>,
    pub elements: Vec<QueryElement>,
}

impl TrainingQuery {
    /// Combine query sources given strongest first (command line, training,
    /// flavours). Only the first element for each key is kept.
    pub fn combine(sources: &[Vec<String>]) -> Self {
        let mut used_keys = HashSet::new();
        let mut query = TrainingQuery::default();

        for part in sources.iter().flatten() {
            if part.trim().is_empty() {
                continue;
            }
            let element = QueryElement::parse(part);
            if used_keys.insert(element.dedup_key(part)) {
                query.raw.push(part.trim().to_string());
                query.elements.push(element);
            }
        }

        debug!("Combined query elements: {:?}", query.raw);
        query
    }

    /// Field names referenced by the query, for display
    pub fn keys(&self) -> Vec<String> {
        self.elements
            .iter()
            .filter_map(|element| element.key.clone())
            .collect()
    }

    pub fn matches(&self, song: &Song) -> bool {
        self.elements.iter().all(|element| element.matches(song))
    }

    /// Keep the songs matching every element
    pub fn filter(&self, songs: Vec<Song>) -> Vec<Song> {
        songs.into_iter().filter(|song| self.matches(song)).collect()
    }
}

/// Render a configured query entry as query strings
pub fn format_query_elements(key: &str, value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Array(values) => values
            .iter()
            .flat_map(|v| format_query_elements(key, v))
            .collect(),
        serde_json::Value::String(s) => vec![format!("{key}:{s}")],
        serde_json::Value::Null => Vec::new(),
        other => vec![format!("{key}:{other}")],
    }
}
