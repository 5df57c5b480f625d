use crate::models::{EpisodeRecord, MovieRecord, Protocol, QueueItemRecord, QueueSubject};
use chrono::{Duration, NaiveDate};
use std::fmt;

/// Which Sonarr calendar query a poll is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarMode {
    Missing,
    Upcoming,
}

impl CalendarMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarMode::Missing => "Missing",
            CalendarMode::Upcoming => "Upcoming",
        }
    }

    /// Inclusive `(start, end)` dates requested upstream.
    pub fn window(
        &self,
        today: NaiveDate,
        missing_days: u32,
        future_days: u32,
    ) -> (NaiveDate, NaiveDate) {
        match self {
            CalendarMode::Missing => (today - Duration::days(i64::from(missing_days)), today),
            CalendarMode::Upcoming => (today, today + Duration::days(i64::from(future_days))),
        }
    }
}

impl fmt::Display for CalendarMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MissingMovie {
    pub name: String,
    /// 0 when the movie is already available for release, 1 when it is not.
    pub missing_available: u8,
    pub tmdb_id: i64,
    pub title_slug: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEpisode {
    pub series_title: String,
    pub episode_title: String,
    pub sxe: String,
    pub air_date_utc: Option<String>,
    pub sonarr_id: i64,
    pub downloaded: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueuedItem {
    pub id: i64,
    pub name: String,
    /// Only set for Sonarr entries.
    pub episode_title: Option<String>,
    pub display_key: String,
    pub protocol: Protocol,
    pub quality: String,
}

impl QueuedItem {
    pub fn protocol_id(&self) -> i64 {
        self.protocol.id()
    }
}

pub fn classify_missing_movies(movies: &[MovieRecord]) -> Vec<MissingMovie> {
    movies
        .iter()
        .filter(|movie| movie.monitored && !movie.has_file)
        .map(|movie| MissingMovie {
            name: movie.display_name(),
            missing_available: if movie.is_available { 0 } else { 1 },
            tmdb_id: movie.tmdb_id,
            title_slug: movie.title_slug.clone(),
        })
        .collect()
}

/// Missing mode keeps monitored episodes without a file; upcoming keeps everything.
pub fn classify_calendar(episodes: &[EpisodeRecord], mode: CalendarMode) -> Vec<CalendarEpisode> {
    episodes
        .iter()
        .filter(|episode| match mode {
            CalendarMode::Missing => episode.monitored && !episode.has_file,
            CalendarMode::Upcoming => true,
        })
        .map(|episode| CalendarEpisode {
            series_title: episode.series_title.clone(),
            episode_title: episode.episode_title.clone(),
            sxe: episode.sxe(),
            air_date_utc: episode.air_date_utc.clone(),
            sonarr_id: episode.id,
            downloaded: u8::from(episode.has_file),
        })
        .collect()
}

pub fn classify_queue(items: &[QueueItemRecord]) -> Vec<QueuedItem> {
    items
        .iter()
        .map(|item| QueuedItem {
            id: item.id,
            name: item.parent_title(),
            episode_title: match &item.subject {
                QueueSubject::Movie(_) => None,
                QueueSubject::Episode(episode) => Some(episode.episode_title.clone()),
            },
            display_key: item.display_key(),
            protocol: item.protocol,
            quality: item.quality.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EpisodeRef;

    fn movie(monitored: bool, has_file: bool, is_available: bool) -> MovieRecord {
        MovieRecord {
            tmdb_id: 438631,
            title_slug: "dune-438631".to_string(),
            title: "Dune".to_string(),
            year: 2021,
            monitored,
            has_file,
            is_available,
        }
    }

    fn episode(monitored: bool, has_file: bool) -> EpisodeRecord {
        EpisodeRecord {
            id: 99,
            series_id: 7,
            series_title: "Severance".to_string(),
            season_number: 2,
            episode_number: 3,
            episode_title: "Who Is Alive?".to_string(),
            air_date_utc: Some("2025-01-31T02:00:00Z".to_string()),
            monitored,
            has_file,
        }
    }

    #[test]
    fn missing_movie_availability_is_inverted() {
        let unavailable = classify_missing_movies(&[movie(true, false, false)]);
        assert_eq!(unavailable.len(), 1);
        assert_eq!(unavailable[0].missing_available, 1);
        assert_eq!(unavailable[0].name, "Dune (2021)");

        let available = classify_missing_movies(&[movie(true, false, true)]);
        assert_eq!(available[0].missing_available, 0);
    }

    #[test]
    fn unmonitored_or_downloaded_movies_are_not_missing() {
        let movies = [movie(false, false, true), movie(true, true, true)];
        assert!(classify_missing_movies(&movies).is_empty());
    }

    #[test]
    fn missing_mode_filters_but_upcoming_does_not() {
        let wanted = episode(true, false);
        let unmonitored = episode(false, false);
        let downloaded = episode(true, true);

        assert_eq!(classify_calendar(&[wanted.clone()], CalendarMode::Missing).len(), 1);
        assert!(classify_calendar(&[unmonitored.clone()], CalendarMode::Missing).is_empty());
        assert!(classify_calendar(&[downloaded.clone()], CalendarMode::Missing).is_empty());

        let upcoming = classify_calendar(&[unmonitored, downloaded], CalendarMode::Upcoming);
        assert_eq!(upcoming.len(), 2);
        assert_eq!(upcoming[0].downloaded, 0);
        assert_eq!(upcoming[1].downloaded, 1);
        assert_eq!(upcoming[0].sxe, "S02E03");
        assert_eq!(upcoming[0].sonarr_id, 99);
    }

    #[test]
    fn upcoming_with_no_episodes_is_empty() {
        assert!(classify_calendar(&[], CalendarMode::Upcoming).is_empty());
    }

    #[test]
    fn queue_is_not_filtered_and_keeps_order() {
        let items = vec![
            QueueItemRecord {
                id: 1,
                protocol: Protocol::Usenet,
                quality: "HDTV-1080p".to_string(),
                subject: QueueSubject::Episode(EpisodeRef {
                    series_title: "Severance".to_string(),
                    season_number: 1,
                    episode_number: 9,
                    episode_title: "The We We Are".to_string(),
                }),
            },
            QueueItemRecord {
                id: 2,
                protocol: Protocol::Torrent,
                quality: "Bluray-1080p".to_string(),
                subject: QueueSubject::Movie(movie(false, true, true)),
            },
        ];

        let queued = classify_queue(&items);
        assert_eq!(queued.len(), 2);
        assert_eq!(queued[0].display_key, "S01E09");
        assert_eq!(queued[0].protocol_id(), 1);
        assert_eq!(queued[0].episode_title.as_deref(), Some("The We We Are"));
        assert_eq!(queued[1].name, "Dune (2021)");
        assert_eq!(queued[1].display_key, "dune-438631");
        assert_eq!(queued[1].protocol_id(), 0);
        assert_eq!(queued[1].episode_title, None);
    }

    #[test]
    fn calendar_windows() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let (start, end) = CalendarMode::Missing.window(today, 7, 1);
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 2, 23).unwrap());
        assert_eq!(end, today);

        let (start, end) = CalendarMode::Upcoming.window(today, 7, 1);
        assert_eq!(start, today);
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
    }
}
