//! Maps raw Sonarr/Radarr JSON onto the canonical records in [`crate::models`].
//!
//! Field names and nesting drift between major API versions, so every field is
//! resolved through an ordered list of JSON-pointer candidates. The first
//! candidate that is present and of the expected type wins; otherwise the
//! documented default is used. Fields without a default are required, and an
//! item missing one is rejected with [`SchemaMismatch`].

use crate::error::{RecordKind, SchemaMismatch};
use crate::models::{
    EpisodeRecord, EpisodeRef, MovieRecord, Protocol, QueueItemRecord, QueueSubject,
};
use serde_json::Value;

const UNKNOWN_QUALITY: &str = "Unknown";
const UNKNOWN_SERIES: &str = "Unknown Series";
const UNKNOWN_EPISODE: &str = "Unknown Episode";

/// Which service a queue response came from. Decides the nested sub-object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    Radarr,
    Sonarr,
}

/// Tries each pointer in order and returns the first value `extract` accepts.
pub fn lookup<'v, T>(
    value: &'v Value,
    pointers: &[&str],
    extract: impl Fn(&'v Value) -> Option<T>,
) -> Option<T> {
    pointers
        .iter()
        .filter_map(|pointer| value.pointer(pointer))
        .find_map(extract)
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

fn as_u32(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|n| u32::try_from(n).ok())
}

/// Unwraps a list response: either a bare array or a paged `{records: [...]}`
/// envelope. Anything else carries no usable items.
pub fn items(raw: &Value) -> Option<&[Value]> {
    match raw {
        Value::Array(items) => Some(items),
        Value::Object(_) => raw.get("records").and_then(Value::as_array).map(Vec::as_slice),
        _ => None,
    }
}

fn expect_object(value: &Value, kind: RecordKind) -> Result<(), SchemaMismatch> {
    if value.is_object() {
        Ok(())
    } else {
        Err(SchemaMismatch::new(kind, format!("expected an object, got {}", type_name(value))))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Optional nested object: absent or null is `None`, any other non-object is an error.
fn sub_object<'v>(
    value: &'v Value,
    key: &str,
    kind: RecordKind,
) -> Result<Option<&'v Value>, SchemaMismatch> {
    match value.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(nested @ Value::Object(_)) => Ok(Some(nested)),
        Some(other) => Err(SchemaMismatch::new(
            kind,
            format!("`{}` should be an object, got {}", key, type_name(other)),
        )),
    }
}

pub fn adapt_movie(value: &Value) -> Result<MovieRecord, SchemaMismatch> {
    let kind = RecordKind::Movie;
    expect_object(value, kind)?;

    let title = lookup(value, &["/title"], Value::as_str)
        .ok_or_else(|| SchemaMismatch::new(kind, "missing string `title`"))?;
    let tmdb_id = lookup(value, &["/tmdbId"], Value::as_i64)
        .ok_or_else(|| SchemaMismatch::new(kind, "missing integer `tmdbId`"))?;

    Ok(MovieRecord {
        tmdb_id,
        title: title.to_string(),
        title_slug: lookup(value, &["/titleSlug"], Value::as_str)
            .unwrap_or_default()
            .to_string(),
        year: lookup(value, &["/year"], Value::as_i64).unwrap_or(0),
        monitored: lookup(value, &["/monitored"], Value::as_bool).unwrap_or(false),
        // Radarr v5 dropped `hasFile` from some payloads in favour of `downloaded`.
        has_file: lookup(value, &["/hasFile", "/downloaded"], Value::as_bool).unwrap_or(false),
        is_available: lookup(value, &["/isAvailable"], Value::as_bool).unwrap_or(false),
    })
}

pub fn adapt_episode(value: &Value) -> Result<EpisodeRecord, SchemaMismatch> {
    let kind = RecordKind::Episode;
    expect_object(value, kind)?;

    let season_number = lookup(value, &["/seasonNumber"], as_u32)
        .ok_or_else(|| SchemaMismatch::new(kind, "missing non-negative `seasonNumber`"))?;
    let episode_number = lookup(value, &["/episodeNumber"], as_u32)
        .ok_or_else(|| SchemaMismatch::new(kind, "missing non-negative `episodeNumber`"))?;
    let series = sub_object(value, "series", kind)?;

    Ok(EpisodeRecord {
        id: lookup(value, &["/id"], Value::as_i64).unwrap_or(0),
        series_id: lookup(value, &["/seriesId", "/series/id"], Value::as_i64).unwrap_or(0),
        series_title: series
            .and_then(|s| lookup(s, &["/title"], Value::as_str))
            .unwrap_or(UNKNOWN_SERIES)
            .to_string(),
        season_number,
        episode_number,
        episode_title: lookup(value, &["/title"], Value::as_str)
            .unwrap_or(UNKNOWN_EPISODE)
            .to_string(),
        air_date_utc: lookup(value, &["/airDateUtc"], Value::as_str).map(str::to_string),
        monitored: lookup(value, &["/monitored"], Value::as_bool).unwrap_or(false),
        has_file: lookup(value, &["/hasFile"], Value::as_bool).unwrap_or(false),
    })
}

/// Resolves the display name of a queue entry's quality.
///
/// Radarr v5 nests it as `{quality: {quality: {name}}}`, older versions as
/// `{quality: {name}}`, and some clients send the name directly.
pub fn resolve_quality(
    quality: Option<&Value>,
    kind: RecordKind,
) -> Result<String, SchemaMismatch> {
    match quality {
        None | Some(Value::Null) => Ok(UNKNOWN_QUALITY.to_string()),
        Some(nested @ Value::Object(_)) => {
            Ok(lookup(nested, &["/quality/name", "/name"], non_empty_str)
                .unwrap_or(UNKNOWN_QUALITY)
                .to_string())
        }
        Some(Value::String(name)) => Ok(name.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        // Matches the `True`/`False` spelling already stored in existing hashes.
        Some(Value::Bool(true)) => Ok("True".to_string()),
        Some(Value::Bool(false)) => Ok("False".to_string()),
        Some(other) => Err(SchemaMismatch::new(
            kind,
            format!("`quality` should be an object or scalar, got {}", type_name(other)),
        )),
    }
}

fn adapt_episode_ref(entry: &Value, kind: RecordKind) -> Result<EpisodeRef, SchemaMismatch> {
    let series = sub_object(entry, "series", kind)?;
    let episode = sub_object(entry, "episode", kind)?;

    let episode_field = |pointer: &str| episode.and_then(|e| e.pointer(pointer));

    Ok(EpisodeRef {
        series_title: series
            .and_then(|s| lookup(s, &["/title"], Value::as_str))
            .unwrap_or(UNKNOWN_SERIES)
            .to_string(),
        season_number: episode_field("/seasonNumber").and_then(as_u32).unwrap_or(0),
        episode_number: episode_field("/episodeNumber").and_then(as_u32).unwrap_or(0),
        episode_title: episode_field("/title")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_EPISODE)
            .to_string(),
    })
}

pub fn adapt_queue_item(
    value: &Value,
    queue: QueueKind,
) -> Result<QueueItemRecord, SchemaMismatch> {
    let kind = match queue {
        QueueKind::Radarr => RecordKind::RadarrQueueItem,
        QueueKind::Sonarr => RecordKind::SonarrQueueItem,
    };
    expect_object(value, kind)?;

    let id = lookup(value, &["/id"], Value::as_i64)
        .ok_or_else(|| SchemaMismatch::new(kind, "missing integer `id`"))?;
    let quality = resolve_quality(value.get("quality"), kind)?;
    let protocol = lookup(value, &["/protocol"], Value::as_str)
        .map(Protocol::parse)
        .unwrap_or(Protocol::Unknown);

    let subject = match queue {
        QueueKind::Radarr => {
            let movie = sub_object(value, "movie", kind)?
                .ok_or_else(|| SchemaMismatch::new(kind, "missing `movie` object"))?;
            let movie = adapt_movie(movie)
                .map_err(|e| SchemaMismatch::new(kind, format!("nested movie: {}", e.reason)))?;
            QueueSubject::Movie(movie)
        }
        QueueKind::Sonarr => QueueSubject::Episode(adapt_episode_ref(value, kind)?),
    };

    Ok(QueueItemRecord {
        id,
        protocol,
        quality,
        subject,
    })
}
