use chrono::{DateTime, FixedOffset};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// Identifier of a configured Sonarr/Radarr server, as given in the config file.
pub type ServerId = u32;

#[derive(Debug, Clone, PartialEq)]
pub struct MovieRecord {
    pub tmdb_id: i64,
    pub title_slug: String,
    pub title: String,
    pub year: i64,
    pub monitored: bool,
    pub has_file: bool,
    pub is_available: bool,
}

impl MovieRecord {
    /// `"{title} ({year})"`, the name used for tags and hashing.
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.title, self.year)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeRecord {
    pub id: i64,
    pub series_id: i64,
    pub series_title: String,
    pub season_number: u32,
    pub episode_number: u32,
    pub episode_title: String,
    pub air_date_utc: Option<String>,
    pub monitored: bool,
    pub has_file: bool,
}

impl EpisodeRecord {
    pub fn sxe(&self) -> String {
        sxe(self.season_number, self.episode_number)
    }
}

/// Season/episode display code, e.g. `S01E02`.
pub fn sxe(season: u32, episode: u32) -> String {
    format!("S{:02}E{:02}", season, episode)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Usenet,
    Torrent,
    Unknown,
}

impl Protocol {
    /// Parses the upstream protocol string case-insensitively.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "USENET" => Protocol::Usenet,
            "TORRENT" => Protocol::Torrent,
            _ => Protocol::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Usenet => "USENET",
            Protocol::Torrent => "TORRENT",
            Protocol::Unknown => "UNKNOWN",
        }
    }

    /// 1 for usenet, 0 for everything else.
    pub fn id(&self) -> i64 {
        match self {
            Protocol::Usenet => 1,
            _ => 0,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Series/episode reference carried by a Sonarr queue entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeRef {
    pub series_title: String,
    pub season_number: u32,
    pub episode_number: u32,
    pub episode_title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueueSubject {
    Movie(MovieRecord),
    Episode(EpisodeRef),
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueItemRecord {
    pub id: i64,
    pub protocol: Protocol,
    pub quality: String,
    pub subject: QueueSubject,
}

impl QueueItemRecord {
    /// Movie `"{title} ({year})"` or the series title.
    pub fn parent_title(&self) -> String {
        match &self.subject {
            QueueSubject::Movie(movie) => movie.display_name(),
            QueueSubject::Episode(episode) => episode.series_title.clone(),
        }
    }

    /// Movie slug or the season/episode code.
    pub fn display_key(&self) -> String {
        match &self.subject {
            QueueSubject::Movie(movie) => movie.title_slug.clone(),
            QueueSubject::Episode(episode) => sxe(episode.season_number, episode.episode_number),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Measurement {
    Radarr,
    Sonarr,
}

impl Measurement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Measurement::Radarr => "Radarr",
            Measurement::Sonarr => "Sonarr",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TagValue {
    Bool(bool),
    Int(i64),
    Str(String),
    Null,
}

impl From<bool> for TagValue {
    fn from(value: bool) -> Self {
        TagValue::Bool(value)
    }
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        TagValue::Int(value)
    }
}

impl From<u32> for TagValue {
    fn from(value: u32) -> Self {
        TagValue::Int(i64::from(value))
    }
}

impl From<u8> for TagValue {
    fn from(value: u8) -> Self {
        TagValue::Int(i64::from(value))
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::Str(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        TagValue::Str(value)
    }
}

impl<T: Into<TagValue>> From<Option<T>> for TagValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(TagValue::Null)
    }
}

/// Insertion-ordered tag set with unique keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tags(Vec<(String, TagValue)>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tag, replacing the value in place if the key already exists.
    pub fn with(mut self, key: &str, value: impl Into<TagValue>) -> Self {
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key.to_string(), value)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&TagValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> Vec<&str> {
        self.0.iter().map(|(k, _)| k.as_str()).collect()
    }
}

impl Serialize for Tags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fields {
    pub hash: String,
}

/// One point ready for the metrics database.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricPoint {
    pub measurement: Measurement,
    pub tags: Tags,
    #[serde(rename = "time")]
    pub timestamp: DateTime<FixedOffset>,
    pub fields: Fields,
}
