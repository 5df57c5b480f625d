//! Runs one feed for one server: fetch, adapt, classify, hash, build, write.
//!
//! The network and the database are reached only through [`ConnectionHandler`]
//! and [`PointSink`]. Every invocation is independent; nothing is remembered
//! between calls.

use crate::classify::{classify_calendar, classify_missing_movies, classify_queue, CalendarMode};
use crate::error::{CollectError, SchemaMismatch};
use crate::metrics;
use crate::models::{MetricPoint, ServerId};
use crate::schema::{self, QueueKind};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Description of one upstream GET call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub base_url: String,
    pub path: String,
    pub api_key: String,
    pub params: Vec<(String, String)>,
    pub verify_ssl: bool,
}

impl ApiRequest {
    pub fn new(base_url: &str, path: &str, api_key: &str, verify_ssl: bool) -> Self {
        Self {
            base_url: base_url.to_string(),
            path: path.to_string(),
            api_key: api_key.to_string(),
            params: Vec::new(),
            verify_ssl,
        }
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }
}

/// Fetches and decodes one upstream response. `None` means no data this cycle.
#[async_trait]
pub trait ConnectionHandler: Send + Sync {
    async fn fetch(&self, request: &ApiRequest) -> Option<Value>;
}

/// Persists a batch of points.
#[async_trait]
pub trait PointSink: Send + Sync {
    async fn write_points(&self, points: Vec<MetricPoint>) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    RadarrMissing,
    RadarrQueue,
    SonarrCalendar(CalendarMode),
    SonarrQueue,
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feed::RadarrMissing => f.write_str("radarr missing"),
            Feed::RadarrQueue => f.write_str("radarr queue"),
            Feed::SonarrCalendar(mode) => write!(f, "sonarr {}", mode.as_str().to_lowercase()),
            Feed::SonarrQueue => f.write_str("sonarr queue"),
        }
    }
}

/// Adapts every item, logging and dropping the ones that do not fit.
fn adapt_all<T>(
    items: &[Value],
    feed: Feed,
    server: ServerId,
    adapt: impl Fn(&Value) -> Result<T, SchemaMismatch>,
) -> Vec<T> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match adapt(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(%feed, server, index, "Skipping item: {}", e);
                None
            }
        })
        .collect()
}

/// The pure part of a collection pass. Output order follows input order.
pub fn run_pipeline(
    server: ServerId,
    feed: Feed,
    raw: &Value,
    now: DateTime<FixedOffset>,
) -> Result<Vec<MetricPoint>, CollectError> {
    let items = schema::items(raw)
        .filter(|items| !items.is_empty())
        .ok_or(CollectError::EmptyUpstream)?;

    let points: Vec<MetricPoint> = match feed {
        Feed::RadarrMissing => {
            let movies = adapt_all(items, feed, server, schema::adapt_movie);
            classify_missing_movies(&movies)
                .iter()
                .map(|movie| metrics::radarr_missing_point(server, movie, now))
                .collect()
        }
        Feed::RadarrQueue => {
            let queue = adapt_all(items, feed, server, |item| {
                schema::adapt_queue_item(item, QueueKind::Radarr)
            });
            classify_queue(&queue)
                .iter()
                .map(|item| metrics::radarr_queue_point(server, item, now))
                .collect()
        }
        Feed::SonarrCalendar(mode) => {
            let episodes = adapt_all(items, feed, server, schema::adapt_episode);
            classify_calendar(&episodes, mode)
                .iter()
                .map(|episode| metrics::sonarr_calendar_point(server, mode, episode, now))
                .collect()
        }
        Feed::SonarrQueue => {
            let queue = adapt_all(items, feed, server, |item| {
                schema::adapt_queue_item(item, QueueKind::Sonarr)
            });
            classify_queue(&queue)
                .iter()
                .map(|item| metrics::sonarr_queue_point(server, item, now))
                .collect()
        }
    };

    if points.is_empty() {
        return Err(CollectError::EmptyBatch);
    }
    Ok(points)
}

#[derive(Clone)]
pub struct Collector {
    handler: Arc<dyn ConnectionHandler>,
    sink: Arc<dyn PointSink>,
}

impl Collector {
    pub fn new(handler: Arc<dyn ConnectionHandler>, sink: Arc<dyn PointSink>) -> Self {
        Self { handler, sink }
    }

    /// Fetches, transforms and writes one feed. Returns the number of points written.
    pub async fn try_collect(
        &self,
        server: ServerId,
        feed: Feed,
        request: &ApiRequest,
        now: DateTime<FixedOffset>,
    ) -> Result<usize, CollectError> {
        let raw = self
            .handler
            .fetch(request)
            .await
            .ok_or(CollectError::EmptyUpstream)?;

        let points = run_pipeline(server, feed, &raw, now)?;
        let count = points.len();
        self.sink.write_points(points).await?;
        Ok(count)
    }

    /// Like [`try_collect`](Self::try_collect) with the timestamp taken now,
    /// but every failure is logged here and reported as zero points.
    pub async fn collect(&self, server: ServerId, feed: Feed, request: &ApiRequest) -> usize {
        let now = Local::now().fixed_offset();

        match self.try_collect(server, feed, request, now).await {
            Ok(count) => {
                info!(%feed, server, "Wrote {} points", count);
                count
            }
            Err(CollectError::EmptyUpstream) => {
                trace!(%feed, server, "No upstream data");
                0
            }
            Err(CollectError::EmptyBatch) => {
                debug!(%feed, server, "No {} data to send to InfluxDB", feed);
                0
            }
            Err(e) => {
                error!(%feed, server, "Collection failed: {}", e);
                0
            }
        }
    }
}
