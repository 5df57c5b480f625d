use crate::classify::CalendarMode;
use crate::collector::{ApiRequest, Collector, Feed};
use crate::config::SonarrConfig;
use chrono::{Local, NaiveDate};
use tracing::instrument;

const PAGE_SIZE: u32 = 1000;

pub struct SonarrClient {
    collector: Collector,
    config: SonarrConfig,
}

impl SonarrClient {
    pub fn new(collector: Collector, config: SonarrConfig) -> Self {
        Self { collector, config }
    }

    pub fn id(&self) -> u32 {
        self.config.server.id
    }

    fn request(&self, path: &str) -> ApiRequest {
        let server = &self.config.server;
        ApiRequest::new(&server.base_url(), path, &server.api_key, server.verify_ssl)
            .param("pageSize", PAGE_SIZE)
    }

    pub fn calendar_request(&self, mode: CalendarMode, today: NaiveDate) -> ApiRequest {
        let (start, end) = mode.window(today, self.config.missing_days, self.config.future_days);
        self.request("/api/v3/calendar/")
            .param("start", start.format("%Y-%m-%d"))
            .param("end", end.format("%Y-%m-%d"))
            .param("includeSeries", true)
    }

    pub fn queue_request(&self) -> ApiRequest {
        self.request("/api/v3/queue")
            .param("includeSeries", true)
            .param("includeEpisode", true)
    }

    #[instrument(skip(self), fields(server = self.config.server.id))]
    pub async fn get_calendar(&self, mode: CalendarMode) -> usize {
        let today = Local::now().date_naive();
        self.collector
            .collect(self.id(), Feed::SonarrCalendar(mode), &self.calendar_request(mode, today))
            .await
    }

    #[instrument(skip(self), fields(server = self.config.server.id))]
    pub async fn get_queue(&self) -> usize {
        self.collector
            .collect(self.id(), Feed::SonarrQueue, &self.queue_request())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{ConnectionHandler, PointSink};
    use crate::config::ServerConfig;
    use crate::models::{MetricPoint, TagValue};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    struct Calendar;

    #[async_trait]
    impl ConnectionHandler for Calendar {
        async fn fetch(&self, _request: &ApiRequest) -> Option<Value> {
            Some(json!([
                {
                    "id": 101,
                    "seriesId": 7,
                    "seasonNumber": 1,
                    "episodeNumber": 4,
                    "title": "The You You Are",
                    "airDateUtc": "2022-03-11T02:00:00Z",
                    "monitored": true,
                    "hasFile": false,
                    "series": {"title": "Severance"}
                },
                {
                    "id": 102,
                    "seasonNumber": 1,
                    "episodeNumber": 5,
                    "monitored": false,
                    "hasFile": false,
                    "series": {"title": "Severance"}
                }
            ]))
        }
    }

    #[derive(Default)]
    struct Sink(Mutex<Vec<MetricPoint>>);

    #[async_trait]
    impl PointSink for Sink {
        async fn write_points(&self, points: Vec<MetricPoint>) -> anyhow::Result<()> {
            self.0.lock().unwrap().extend(points);
            Ok(())
        }
    }

    fn config() -> SonarrConfig {
        SonarrConfig {
            server: ServerConfig {
                id: 1,
                url: "https://sonarr.local".to_string(),
                api_key: "secret".to_string(),
                ssl: true,
                verify_ssl: true,
            },
            missing_days: 7,
            missing_days_run_seconds: 300,
            future_days: 2,
            future_days_run_seconds: 300,
            queue: true,
            queue_run_seconds: 300,
        }
    }

    fn client(sink: Arc<Sink>) -> SonarrClient {
        SonarrClient::new(Collector::new(Arc::new(Calendar), sink), config())
    }

    #[test]
    fn calendar_request_carries_window() {
        let client = client(Arc::new(Sink::default()));
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();

        let missing = client.calendar_request(CalendarMode::Missing, today);
        assert_eq!(missing.path, "/api/v3/calendar/");
        assert!(missing.verify_ssl);
        assert!(missing.params.contains(&("start".to_string(), "2024-05-03".to_string())));
        assert!(missing.params.contains(&("end".to_string(), "2024-05-10".to_string())));
        assert!(missing.params.contains(&("pageSize".to_string(), "1000".to_string())));

        let upcoming = client.calendar_request(CalendarMode::Upcoming, today);
        assert!(upcoming.params.contains(&("start".to_string(), "2024-05-10".to_string())));
        assert!(upcoming.params.contains(&("end".to_string(), "2024-05-12".to_string())));
    }

    #[tokio::test]
    async fn missing_and_upcoming_emit_different_sets() {
        let sink = Arc::new(Sink::default());
        let client = client(sink.clone());

        assert_eq!(client.get_calendar(CalendarMode::Missing).await, 1);
        assert_eq!(client.get_calendar(CalendarMode::Upcoming).await, 2);

        let points = sink.0.lock().unwrap();
        assert_eq!(points[0].tags.get("sxe"), Some(&TagValue::Str("S01E04".into())));
        assert_eq!(points[0].tags.get("type"), Some(&TagValue::Str("Missing".into())));
        assert_eq!(points[2].tags.get("epname"), Some(&TagValue::Str("Unknown Episode".into())));
        assert_eq!(points[2].tags.get("type"), Some(&TagValue::Str("Upcoming".into())));
    }
}
