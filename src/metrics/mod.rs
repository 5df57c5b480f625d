//! Builds the tagged points written to InfluxDB. The tag keys here are what
//! existing dashboards query on, so their names and value types are fixed.

use crate::classify::{CalendarEpisode, CalendarMode, MissingMovie, QueuedItem};
use crate::hash::hashit;
use crate::models::{Fields, Measurement, MetricPoint, ServerId, Tags};
use chrono::{DateTime, FixedOffset};

fn point(
    measurement: Measurement,
    tags: Tags,
    hash: String,
    now: DateTime<FixedOffset>,
) -> MetricPoint {
    MetricPoint {
        measurement,
        tags,
        timestamp: now,
        fields: Fields { hash },
    }
}

pub fn radarr_missing_point(
    server: ServerId,
    movie: &MissingMovie,
    now: DateTime<FixedOffset>,
) -> MetricPoint {
    let hash = hashit(&[server.to_string(), movie.name.clone(), movie.tmdb_id.to_string()]);
    let tags = Tags::new()
        .with("Missing", true)
        .with("Missing_Available", movie.missing_available)
        .with("tmdbId", movie.tmdb_id)
        .with("server", server)
        .with("name", movie.name.as_str())
        .with("titleSlug", movie.title_slug.as_str());

    point(Measurement::Radarr, tags, hash, now)
}

/// `tmdbId` carries the queue entry id here; dashboards built on earlier
/// releases group Radarr queue series by it.
pub fn radarr_queue_point(
    server: ServerId,
    item: &QueuedItem,
    now: DateTime<FixedOffset>,
) -> MetricPoint {
    let hash = hashit(&[server.to_string(), item.name.clone(), item.quality.clone()]);
    let tags = Tags::new()
        .with("type", "Queue")
        .with("tmdbId", item.id)
        .with("server", server)
        .with("name", item.name.as_str())
        .with("quality", item.quality.as_str())
        .with("protocol", item.protocol.as_str())
        .with("protocol_id", item.protocol_id())
        .with("titleSlug", item.display_key.as_str());

    point(Measurement::Radarr, tags, hash, now)
}

pub fn sonarr_calendar_point(
    server: ServerId,
    mode: CalendarMode,
    episode: &CalendarEpisode,
    now: DateTime<FixedOffset>,
) -> MetricPoint {
    let hash = hashit(&[server.to_string(), episode.series_title.clone(), episode.sxe.clone()]);
    let tags = Tags::new()
        .with("type", mode.as_str())
        .with("sonarrId", episode.sonarr_id)
        .with("server", server)
        .with("name", episode.series_title.as_str())
        .with("epname", episode.episode_title.as_str())
        .with("sxe", episode.sxe.as_str())
        .with("airsUTC", episode.air_date_utc.clone())
        .with("downloaded", episode.downloaded);

    point(Measurement::Sonarr, tags, hash, now)
}

pub fn sonarr_queue_point(
    server: ServerId,
    item: &QueuedItem,
    now: DateTime<FixedOffset>,
) -> MetricPoint {
    let hash = hashit(&[server.to_string(), item.name.clone(), item.display_key.clone()]);
    let tags = Tags::new()
        .with("type", "Queue")
        .with("sonarrId", item.id)
        .with("server", server)
        .with("name", item.name.as_str())
        .with("epname", item.episode_title.clone())
        .with("sxe", item.display_key.as_str())
        .with("protocol", item.protocol.as_str())
        .with("protocol_id", item.protocol_id())
        .with("quality", item.quality.as_str());

    point(Measurement::Sonarr, tags, hash, now)
}
